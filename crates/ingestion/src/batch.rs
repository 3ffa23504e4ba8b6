//! Filing page assembly.
//!
//! Pages arrive as `{prefix}_{from}_{to}.json` files covering request offsets
//! `[from, to)`. The ledger cannot be rebuilt with a hole in filing order, so
//! any uncovered offset range is a fatal [`Error::MissingBatch`].

use crate::wire::{FilingPage, RawFiling};
use insider_core::config::IngestionConfig;
use insider_core::{Error, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// File name of the page covering `[from, from + page_size)`.
pub fn page_file_name(prefix: &str, from: usize, page_size: usize) -> String {
    format!("{prefix}_{from}_{}.json", from + page_size)
}

/// Parse `{prefix}_{from}_{to}.json` back into its offsets.
fn parse_page_file_name(prefix: &str, name: &str) -> Option<(usize, usize)> {
    let rest = name.strip_prefix(prefix)?.strip_prefix('_')?;
    let rest = rest.strip_suffix(".json")?;
    let (from, to) = rest.split_once('_')?;
    Some((from.parse().ok()?, to.parse().ok()?))
}

/// A page with its offset range.
#[derive(Debug, Clone)]
struct Page {
    to: usize,
    filings: Vec<RawFiling>,
}

/// Collected filing pages, keyed by starting offset.
#[derive(Debug, Clone, Default)]
pub struct BatchSet {
    pages: BTreeMap<usize, Page>,
}

impl BatchSet {
    /// Create an empty batch set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the page covering offsets `[from, to)`.
    pub fn insert(&mut self, from: usize, to: usize, filings: Vec<RawFiling>) -> Result<()> {
        if to <= from {
            return Err(Error::data(format!("empty page range {from}..{to}")));
        }
        if filings.len() > to - from {
            return Err(Error::data(format!(
                "page {from}..{to} holds {} filings",
                filings.len()
            )));
        }

        // Neighbours in offset order must not overlap the new range.
        if let Some((&prev_from, prev)) = self.pages.range(..=from).next_back() {
            if prev.to > from {
                return Err(Error::data(format!(
                    "page {from}..{to} overlaps page {prev_from}..{}",
                    prev.to
                )));
            }
        }
        if let Some((&next_from, next)) = self.pages.range(from + 1..).next() {
            if next_from < to {
                return Err(Error::data(format!(
                    "page {from}..{to} overlaps page {next_from}..{}",
                    next.to
                )));
            }
        }

        self.pages.insert(from, Page { to, filings });
        Ok(())
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no page was added.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Concatenate pages in offset order.
    ///
    /// Pages must tile `[0, expected_total)` (or `[0, last page end)` when no
    /// total is given) without a gap.
    pub fn assemble(self, expected_total: Option<usize>) -> Result<Vec<RawFiling>> {
        let mut cursor = 0usize;
        let mut filings = Vec::new();
        let page_count = self.pages.len();

        for (i, (from, page)) in self.pages.into_iter().enumerate() {
            if from > cursor {
                return Err(Error::MissingBatch { from: cursor, to: from });
            }
            let capacity = page.to - from;
            if page.filings.len() < capacity && i + 1 < page_count {
                warn!(from, to = page.to, len = page.filings.len(), "short page before end of batch");
            }
            cursor = page.to;
            filings.extend(page.filings);
        }

        if let Some(total) = expected_total {
            if cursor < total {
                return Err(Error::MissingBatch { from: cursor, to: total });
            }
        }

        info!(pages = page_count, filings = filings.len(), "assembled filing batch");
        Ok(filings)
    }
}

/// Load filing pages from `dir`.
///
/// With `expected_total`, every page `[0, page_size)`, `[page_size, 2*page_size)`...
/// up to the total must exist. Without it, every file matching the prefix is loaded
/// and gaps are detected by [`BatchSet::assemble`].
pub fn load_dir(dir: impl AsRef<Path>, config: &IngestionConfig) -> Result<BatchSet> {
    let dir = dir.as_ref();
    let mut set = BatchSet::new();

    match config.expected_total {
        Some(total) => {
            let mut from = 0;
            while from < total {
                let to = from + config.page_size;
                let path = dir.join(page_file_name(&config.prefix, from, config.page_size));
                if !path.is_file() {
                    return Err(Error::MissingBatch { from, to });
                }
                set.insert(from, to, read_page(&path)?)?;
                from = to;
            }
        }
        None => {
            for entry in std::fs::read_dir(dir)? {
                let entry = entry?;
                let name = entry.file_name();
                let Some((from, to)) = name
                    .to_str()
                    .and_then(|n| parse_page_file_name(&config.prefix, n))
                else {
                    continue;
                };
                set.insert(from, to, read_page(&entry.path())?)?;
            }
        }
    }

    Ok(set)
}

fn read_page(path: &Path) -> Result<Vec<RawFiling>> {
    debug!(path = %path.display(), "reading filing page");
    let text = std::fs::read_to_string(path)?;
    let page = FilingPage::from_json(&text)?;
    Ok(page.into_filings())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn filing(accession: &str) -> RawFiling {
        RawFiling {
            accession_no: Some(accession.to_string()),
            ..RawFiling::default()
        }
    }

    fn write_page(dir: &Path, name: &str, accessions: &[&str]) {
        let filings: Vec<_> = accessions
            .iter()
            .map(|a| serde_json::json!({ "accessionNo": a }))
            .collect();
        let body = serde_json::json!({ "total": { "value": 3 }, "transactions": filings });
        fs::write(dir.join(name), body.to_string()).unwrap();
    }

    #[test]
    fn test_page_file_name_round_trip() {
        assert_eq!(page_file_name("cvna_filings", 50, 50), "cvna_filings_50_100.json");
        assert_eq!(
            parse_page_file_name("cvna_filings", "cvna_filings_50_100.json"),
            Some((50, 100))
        );
        assert_eq!(parse_page_file_name("cvna_filings", "other_0_50.json"), None);
        assert_eq!(parse_page_file_name("cvna_filings", "cvna_filings_0_50.txt"), None);
    }

    #[test]
    fn test_assemble_in_offset_order() {
        let mut set = BatchSet::new();
        set.insert(2, 4, vec![filing("c"), filing("d")]).unwrap();
        set.insert(0, 2, vec![filing("a"), filing("b")]).unwrap();

        let filings = set.assemble(Some(4)).unwrap();
        let ids: Vec<_> = filings.iter().map(|f| f.accession_no.as_deref().unwrap()).collect();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_assemble_detects_gap() {
        let mut set = BatchSet::new();
        set.insert(0, 2, vec![filing("a")]).unwrap();
        set.insert(4, 6, vec![filing("e")]).unwrap();

        match set.assemble(None) {
            Err(Error::MissingBatch { from, to }) => {
                assert_eq!((from, to), (2, 4));
            }
            other => panic!("expected missing batch, got {other:?}"),
        }
    }

    #[test]
    fn test_assemble_detects_missing_tail() {
        let mut set = BatchSet::new();
        set.insert(0, 2, vec![filing("a"), filing("b")]).unwrap();
        assert!(matches!(
            set.assemble(Some(6)),
            Err(Error::MissingBatch { from: 2, to: 6 })
        ));
    }

    #[test]
    fn test_insert_rejects_overlap() {
        let mut set = BatchSet::new();
        set.insert(0, 50, vec![]).unwrap();
        assert!(matches!(set.insert(25, 75, vec![]), Err(Error::Data(_))));
        assert!(matches!(set.insert(0, 50, vec![]), Err(Error::Data(_))));
        set.insert(50, 100, vec![]).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_load_dir_with_total() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "filings_0_2.json", &["a", "b"]);
        write_page(dir.path(), "filings_2_4.json", &["c"]);
        let config = IngestionConfig {
            prefix: "filings".to_string(),
            page_size: 2,
            expected_total: Some(4),
        };

        let filings = load_dir(dir.path(), &config).unwrap().assemble(Some(4)).unwrap();
        assert_eq!(filings.len(), 3);
        assert_eq!(filings[2].accession_no.as_deref(), Some("c"));
    }

    #[test]
    fn test_load_dir_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "filings_0_2.json", &["a", "b"]);
        let config = IngestionConfig {
            prefix: "filings".to_string(),
            page_size: 2,
            expected_total: Some(4),
        };

        let err = load_dir(dir.path(), &config).unwrap_err();
        assert!(matches!(err, Error::MissingBatch { from: 2, to: 4 }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_dir_scan_ignores_unrelated_files() {
        let dir = tempfile::tempdir().unwrap();
        write_page(dir.path(), "filings_0_2.json", &["a", "b"]);
        write_page(dir.path(), "filings_2_4.json", &["c", "d"]);
        fs::write(dir.path().join("notes.txt"), "ignore me").unwrap();
        let config = IngestionConfig {
            prefix: "filings".to_string(),
            page_size: 2,
            expected_total: None,
        };

        let set = load_dir(dir.path(), &config).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.assemble(None).unwrap().len(), 4);
    }

    #[test]
    fn test_load_dir_rejects_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("filings_0_2.json"), "{ not json").unwrap();
        let config = IngestionConfig {
            prefix: "filings".to_string(),
            page_size: 2,
            expected_total: Some(2),
        };
        assert!(matches!(load_dir(dir.path(), &config), Err(Error::Json(_))));
    }
}
