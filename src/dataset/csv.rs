//! CSV ingest and output for [`Table`].

use super::{Table, Value};
use crate::error::Result;
use std::io;
use std::path::Path;

/// Read a headed CSV document into a table.
///
/// Every cell goes through [`Value::parse`]; no column types are decided here.
pub fn read_csv<R: io::Read>(reader: R) -> Result<Table> {
    let mut rdr = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut table = Table::new(columns)?;

    for record in rdr.records() {
        let record = record?;
        table.push_row(record.iter().map(Value::parse).collect())?;
    }

    tracing::debug!(
        rows = table.n_rows(),
        columns = table.columns().len(),
        "loaded csv table"
    );
    Ok(table)
}

/// Read a CSV file into a table.
pub fn read_csv_path<P: AsRef<Path>>(path: P) -> Result<Table> {
    let file = std::fs::File::open(path)?;
    read_csv(io::BufReader::new(file))
}

/// Write a table as headed CSV. Missing cells are written empty.
pub fn write_csv<W: io::Write>(table: &Table, writer: W) -> Result<()> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row.iter().map(|v| v.to_string()))?;
    }
    wtr.flush()?;
    Ok(())
}
