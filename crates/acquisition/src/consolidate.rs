use std::collections::BTreeMap;

use serde::Serialize;

use crate::{CloudinessReport, SummaryStats, Timestamp, WeatherDataset, SOLAR_RADIATION};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedRow<K> {
    pub key: K,
    /// One cell per table column, `None` where that column has no reading
    pub values: Vec<Option<f64>>,
}

/// Wide table produced by a full outer join on the row key
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignedTable<K> {
    pub columns: Vec<String>,
    pub rows: Vec<AlignedRow<K>>,
}

impl<K> AlignedTable<K> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().map(|row| row.values[index]).collect())
    }
}

/// Full outer join of keyed columns.
///
/// Rows are the sorted union of every key. When a column repeats a key the
/// first non-null reading is kept.
pub fn align<K, S>(columns: impl IntoIterator<Item = (String, S)>) -> AlignedTable<K>
where
    K: Ord + Clone,
    S: IntoIterator<Item = (K, Option<f64>)>,
{
    let columns: Vec<(String, Vec<(K, Option<f64>)>)> = columns
        .into_iter()
        .map(|(name, cells)| (name, cells.into_iter().collect()))
        .collect();
    let width = columns.len();

    let mut rows: BTreeMap<K, Vec<Option<f64>>> = BTreeMap::new();
    for (index, (_, cells)) in columns.iter().enumerate() {
        for (key, value) in cells {
            let cell = &mut rows.entry(key.clone()).or_insert_with(|| vec![None; width])[index];
            if cell.is_none() {
                *cell = *value;
            }
        }
    }

    AlignedTable {
        columns: columns.into_iter().map(|(name, _)| name).collect(),
        rows: rows
            .into_iter()
            .map(|(key, values)| AlignedRow { key, values })
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consolidated {
    pub table: AlignedTable<Timestamp>,
    /// Per variable, over its own non-null readings
    pub stats: BTreeMap<String, SummaryStats>,
    pub cloudiness: Option<CloudinessReport>,
}

/// Align every fetched variable on timestamp and summarize each one.
/// Columns come out ordered by variable name.
pub fn consolidate(dataset: &WeatherDataset) -> Consolidated {
    let table = align(dataset.iter().map(|(name, data)| {
        (
            name.clone(),
            data.series.iter().map(|r| (r.time, r.value)),
        )
    }));

    let stats = dataset
        .iter()
        .filter_map(|(name, data)| {
            SummaryStats::from_series(&data.series).map(|stats| (name.clone(), stats))
        })
        .collect();

    let cloudiness = dataset
        .get(SOLAR_RADIATION)
        .and_then(|data| CloudinessReport::from_series(&data.series));

    Consolidated {
        table,
        stats,
        cloudiness,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{find_variable, SeriesMetadata, TimeSeries, VariableData};
    use time::macros::datetime;

    fn variable(name: &str, readings: Vec<(Timestamp, Option<f64>)>) -> VariableData {
        let descriptor = find_variable(name).unwrap();
        VariableData {
            metadata: SeriesMetadata::Granules {
                collection: descriptor.collection.clone(),
                variable: descriptor.granule_variable.clone(),
                granules_used: 1,
            },
            descriptor,
            series: readings.into_iter().collect::<TimeSeries>(),
        }
    }

    #[test]
    fn outer_join_keeps_every_timestamp() {
        let t0 = datetime!(2024-04-10 00:00 UTC);
        let t1 = datetime!(2024-04-10 03:00 UTC);
        let t2 = datetime!(2024-04-10 06:00 UTC);

        let mut dataset = WeatherDataset::default();
        dataset.insert(
            "temperatura",
            variable("temperatura", vec![(t1, Some(290.0)), (t0, Some(288.0))]),
        );
        dataset.insert(
            "humedad",
            variable("humedad", vec![(t1, Some(0.01)), (t2, None)]),
        );

        let consolidated = consolidate(&dataset);
        let table = &consolidated.table;
        assert_eq!(table.columns, vec!["humedad", "temperatura"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows[0].key, t0);
        assert_eq!(table.rows[0].values, vec![None, Some(288.0)]);
        assert_eq!(table.rows[1].values, vec![Some(0.01), Some(290.0)]);
        assert_eq!(table.rows[2].values, vec![None, None]);

        // non-null cells per column match the source series
        for (name, data) in &dataset {
            let cells = table.column(name).unwrap();
            assert_eq!(
                cells.iter().flatten().count(),
                data.series.values().count()
            );
        }
        assert_eq!(consolidated.stats["temperatura"].mean, 289.0);
        assert!(consolidated.cloudiness.is_none());
    }

    #[test]
    fn duplicate_keys_keep_first_occurrence() {
        let t0 = datetime!(2024-04-10 00:00 UTC);
        let table = align(vec![(
            "temperatura".to_string(),
            vec![(t0, Some(1.0)), (t0, Some(2.0))],
        )]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].values, vec![Some(1.0)]);
    }

    #[test]
    fn duplicate_null_does_not_hide_later_reading() {
        let t0 = datetime!(2024-04-10 00:00 UTC);
        let t1 = datetime!(2024-04-10 03:00 UTC);
        let table = align(vec![(
            "temperatura".to_string(),
            vec![(t0, None), (t1, None), (t0, Some(2.0)), (t0, Some(3.0))],
        )]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("temperatura").unwrap(), vec![Some(2.0), None]);
    }

    #[test]
    fn aligns_string_keys() {
        let table = align(vec![
            (
                "a".to_string(),
                vec![("2024-01-02".to_string(), Some(2.0))],
            ),
            (
                "b".to_string(),
                vec![("2024-01-01".to_string(), Some(1.0))],
            ),
        ]);
        let keys: Vec<_> = table.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["2024-01-01", "2024-01-02"]);
        assert_eq!(table.column("a").unwrap(), vec![None, Some(2.0)]);
    }

    #[test]
    fn solar_radiation_drives_cloudiness() {
        let mut dataset = WeatherDataset::default();
        dataset.insert(
            SOLAR_RADIATION,
            variable(
                SOLAR_RADIATION,
                vec![
                    (datetime!(2024-04-10 00:00 UTC), Some(100.0)),
                    (datetime!(2024-04-10 03:00 UTC), Some(300.0)),
                ],
            ),
        );
        let cloudiness = consolidate(&dataset).cloudiness.unwrap();
        assert_eq!(cloudiness.mean_radiation, 200.0);
        assert_eq!(cloudiness.bucket.label(), "cloudy");
    }
}
