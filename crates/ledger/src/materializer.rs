//! Forward-fill materialization of the wide table.

use crate::timeline::PeriodSnapshot;
use insider_core::{OwnershipKey, Shares, WideColumn, WideRow, WideTable};
use std::collections::HashMap;
use tracing::debug;

/// Column position of every tracked key.
pub type ColumnIndex<'a> = HashMap<&'a OwnershipKey, usize>;

/// Build the column index for a key universe.
pub fn column_index(universe: &[OwnershipKey]) -> ColumnIndex<'_> {
    universe.iter().enumerate().map(|(i, k)| (k, i)).collect()
}

/// Running value of every column, threaded through the forward-fill.
#[derive(Debug, Clone, PartialEq)]
pub struct FillState {
    values: Vec<Shares>,
}

impl FillState {
    /// All columns start at zero.
    pub fn new(width: usize) -> Self {
        Self {
            values: vec![0.0; width],
        }
    }

    /// Current running values, in column order.
    pub fn values(&self) -> &[Shares] {
        &self.values
    }

    /// Take the snapshot's value for every key it reports and keep the running
    /// value for every other key.
    pub fn advance(mut self, snapshot: &PeriodSnapshot, index: &ColumnIndex<'_>) -> Self {
        for (key, &shares) in &snapshot.holdings {
            match index.get(key) {
                Some(&col) => self.values[col] = shares,
                None => debug!(column = %key.label(), "untracked key in period snapshot"),
            }
        }
        self
    }
}

/// Forward-fill the ordered period snapshots into a wide table.
///
/// Emits exactly one row per snapshot and one column per universe key.
pub fn materialize(periods: &[PeriodSnapshot], universe: &[OwnershipKey]) -> WideTable {
    let index = column_index(universe);

    let (_, rows) = periods.iter().fold(
        (FillState::new(universe.len()), Vec::with_capacity(periods.len())),
        |(state, mut rows), snapshot| {
            let state = state.advance(snapshot, &index);
            rows.push(WideRow {
                period: snapshot.period,
                label: snapshot.label.clone(),
                values: state.values().to_vec(),
            });
            (state, rows)
        },
    );

    let columns = universe
        .iter()
        .map(|key| WideColumn {
            key: key.clone(),
            label: key.label(),
        })
        .collect();

    WideTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use insider_core::{OwnershipCategory, OwnershipNature, ReportPeriod};
    use proptest::prelude::*;

    fn key(person: &str) -> OwnershipKey {
        OwnershipKey {
            person: person.to_string(),
            category: OwnershipCategory::DirectHolding,
            nature: OwnershipNature::PersonallyOwned,
            security_title: "Common Stock".to_string(),
            underlying_title: String::new(),
        }
    }

    fn period(day: u32, entries: &[(&OwnershipKey, f64)]) -> PeriodSnapshot {
        PeriodSnapshot {
            period: ReportPeriod::new(2021, 1, day),
            label: format!("2021-01-{day:02}"),
            holdings: entries.iter().map(|(k, v)| ((*k).clone(), *v)).collect(),
        }
    }

    #[test]
    fn test_advance_keeps_unreported_values() {
        let a = key("A");
        let b = key("B");
        let universe = vec![a.clone(), b.clone()];
        let index = column_index(&universe);

        let state = FillState::new(2)
            .advance(&period(1, &[(&a, 100.0), (&b, 5.0)]), &index)
            .advance(&period(2, &[(&a, 150.0)]), &index);

        assert_relative_eq!(state.values()[0], 150.0);
        assert_relative_eq!(state.values()[1], 5.0);
    }

    #[test]
    fn test_never_reported_is_zero() {
        let a = key("A");
        let b = key("B");
        let table = materialize(&[period(1, &[(&a, 100.0)])], &[a.clone(), b.clone()]);

        assert_eq!(table.rows.len(), 1);
        assert_relative_eq!(table.rows[0].values[0], 100.0);
        assert_relative_eq!(table.rows[0].values[1], 0.0);
    }

    #[test]
    fn test_explicit_zero_overrides_running_value() {
        let a = key("A");
        let table = materialize(
            &[period(1, &[(&a, 100.0)]), period(2, &[(&a, 0.0)]), period(3, &[])],
            &[a.clone()],
        );
        let col: Vec<_> = table.rows.iter().map(|r| r.values[0]).collect();
        assert_eq!(col, vec![100.0, 0.0, 0.0]);
    }

    #[test]
    fn test_columns_follow_universe_order() {
        let a = key("A");
        let b = key("B");
        let table = materialize(&[], &[b.clone(), a.clone()]);
        assert!(table.rows.is_empty());
        let labels: Vec<_> = table.labels().collect();
        assert_eq!(labels, vec!["B_personally_owned_Common Stock", "A_personally_owned_Common Stock"]);
    }

    proptest! {
        #[test]
        fn property_forward_fill_matches_latest_report(
            reports in proptest::collection::vec(
                proptest::collection::vec(proptest::option::of(0.0f64..1e6), 3),
                0..20,
            )
        ) {
            let universe = vec![key("A"), key("B"), key("C")];
            let periods: Vec<_> = reports
                .iter()
                .enumerate()
                .map(|(i, row)| PeriodSnapshot {
                    period: ReportPeriod::new(2000 + i as i32, 1, 1),
                    label: format!("{}-01-01", 2000 + i),
                    holdings: row
                        .iter()
                        .zip(&universe)
                        .filter_map(|(v, k)| v.map(|v| (k.clone(), v)))
                        .collect(),
                })
                .collect();

            let table = materialize(&periods, &universe);
            prop_assert_eq!(table.rows.len(), periods.len());

            for (i, row) in table.rows.iter().enumerate() {
                for col in 0..universe.len() {
                    let expected = reports[..=i]
                        .iter()
                        .rev()
                        .find_map(|r| r[col])
                        .unwrap_or(0.0);
                    prop_assert_eq!(row.values[col], expected);
                }
            }
        }
    }
}
