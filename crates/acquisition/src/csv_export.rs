use std::io;

use time::macros::format_description;

use crate::{AlignedTable, GeoPoint, Timestamp};

pub const KEY_COLUMN: &str = "Timestamp";

/// Row keys that can be rendered in the first CSV column
pub trait CsvKey {
    fn to_cell(&self) -> String;
}

impl CsvKey for Timestamp {
    fn to_cell(&self) -> String {
        self.to_offset(time::UtcOffset::UTC)
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_else(|_| self.to_string())
    }
}

impl CsvKey for String {
    fn to_cell(&self) -> String {
        self.clone()
    }
}

/// Write `Timestamp,<columns...>` then one line per row, empty cells for nulls
pub fn write_csv<K: CsvKey, W: io::Write>(
    table: &AlignedTable<K>,
    writer: W,
) -> Result<(), csv::Error> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = Vec::with_capacity(table.columns.len() + 1);
    header.push(KEY_COLUMN);
    header.extend(table.columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.key.to_cell());
        record.extend(
            row.values
                .iter()
                .map(|value| value.map(|v| v.to_string()).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn to_csv_string<K: CsvKey>(table: &AlignedTable<K>) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    write_csv(table, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// File name used by the command line fetcher
pub fn consolidated_filename(point: GeoPoint) -> String {
    format!(
        "datos_meteorologicos_consolidados_lat{}_lon{}.csv",
        point.lat, point.lon
    )
}

/// File name offered by the HTTP export
pub fn export_filename(lat: f64, lon: f64) -> String {
    format!("datos_meteorologicos_lat{}_lon{}.csv", lat, lon)
}
