//! Delimited text output.
//!
//! Header: the date column followed by one label per column. One line per
//! row, values in column order. Fields containing the delimiter or quotes are
//! quoted by the `csv` writer.

use insider_core::config::ExportConfig;
use insider_core::{Error, Result, Shares, WideTable};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Render a share count with the shortest representation that round-trips.
pub fn format_shares(shares: Shares) -> String {
    if shares == 0.0 {
        // Avoid "-0".
        return "0".to_string();
    }
    shares.to_string()
}

fn csv_err(err: csv::Error) -> Error {
    Error::export(err.to_string())
}

fn delimiter_byte(config: &ExportConfig) -> Result<u8> {
    if !config.delimiter.is_ascii() {
        return Err(Error::config("export.delimiter must be an ASCII character"));
    }
    Ok(config.delimiter as u8)
}

/// Write `table` as delimited text.
pub fn write_csv<W: Write>(table: &WideTable, writer: W, config: &ExportConfig) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter_byte(config)?)
        .flexible(false)
        .from_writer(writer);

    let header = std::iter::once(config.date_header.as_str()).chain(table.labels());
    out.write_record(header).map_err(csv_err)?;

    for row in &table.rows {
        if row.values.len() != table.num_columns() {
            return Err(Error::export(format!(
                "row {} has {} values for {} columns",
                row.label,
                row.values.len(),
                table.num_columns()
            )));
        }
        let fields = std::iter::once(row.label.clone()).chain(row.values.iter().map(|v| format_shares(*v)));
        out.write_record(fields).map_err(csv_err)?;
    }

    out.flush()?;
    Ok(())
}

/// Render `table` as a delimited string.
pub fn to_csv_string(table: &WideTable, config: &ExportConfig) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, &mut buf, config)?;
    String::from_utf8(buf).map_err(|e| Error::export(e.to_string()))
}

/// Write `table` as delimited text to `path`.
pub fn write_csv_file(table: &WideTable, path: impl AsRef<Path>, config: &ExportConfig) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file), config)?;
    info!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = table.num_columns(),
        "wrote csv"
    );
    Ok(())
}
