//! Tabular data: cells, records and tables.
//!
//! A [`Table`] is an ordered sequence of rows over a fixed set of named
//! columns. Each cell is a [`Value`]: a number, a piece of text, or missing.
//! Column types are not stored here; they are decided once by
//! [`FeatureSchema`](crate::schema::FeatureSchema) and carried as data.
//!
//! # Example
//!
//! ```rust
//! use churnkit::dataset::{Table, Value};
//!
//! let mut table = Table::new(vec!["tenure".into(), "Contract".into()]).unwrap();
//! table.push_row(vec![Value::Number(12.0), Value::from("Month-to-month")]).unwrap();
//! assert_eq!(table.n_rows(), 1);
//! assert_eq!(table.get(0, "tenure"), Some(&Value::Number(12.0)));
//! ```

use crate::error::{ChurnError, Result};
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

pub mod csv;
pub mod split;

pub use self::csv::{read_csv, read_csv_path, write_csv};
pub use self::split::{stratified_k_fold, stratified_split, Fold, TrainTestSplit};

/// Tokens treated as missing when parsing raw cells.
const MISSING_TOKENS: [&str; 6] = ["", "NA", "N/A", "NaN", "nan", "null"];

/// A single cell.
///
/// Cells read from text stay [`Value::Text`] with their original spelling;
/// the numeric view is parsed on demand, so identifiers such as `"0042"` and
/// amounts such as `"29.850"` are written back unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Missing,
}

impl Value {
    /// Parse a raw cell: blank or NA-like tokens are missing, everything else
    /// is kept as trimmed text.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if MISSING_TOKENS.contains(&trimmed) {
            return Value::Missing;
        }
        Value::Text(trimmed.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Numeric view of the cell: numbers, and text that parses as a finite
    /// number. Anything else is `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Value::Missing => None,
        }
    }

    /// Category key for one-hot encoding and identifiers. Text is used as
    /// written; constructed numbers are keyed by their display form.
    pub fn category(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Missing => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", n),
            Value::Text(s) => f.write_str(s),
            Value::Missing => Ok(()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Missing)
    }
}

/// Row-major table with named columns.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table. Column names must be unique.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            if index.insert(name.clone(), i).is_some() {
                return Err(ChurnError::schema(name.clone(), "duplicate column name"));
            }
        }
        Ok(Self {
            columns,
            index,
            rows: Vec::new(),
        })
    }

    /// Create a table from rows; every row must match the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns)?;
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ChurnError::InvalidParameter(format!(
                "row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Iterate over the cells of one column, or `None` if it is absent.
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    pub fn record(&self, row: usize) -> Option<Record<'_>> {
        (row < self.rows.len()).then_some(Record { table: self, row })
    }

    pub fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        (0..self.rows.len()).map(move |row| Record { table: self, row })
    }

    /// New table holding the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            index: self.index.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// New table without the named columns. Unknown names are ignored.
    pub fn without_columns(&self, names: &[String]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !names.contains(&self.columns[i]))
            .collect();
        let columns: Vec<String> = keep.iter().map(|&i| self.columns[i].clone()).collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
            .collect();
        Table {
            columns,
            index,
            rows,
        }
    }

    /// New table with an extra column appended.
    pub fn with_column(&self, name: impl Into<String>, values: Vec<Value>) -> Result<Table> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(ChurnError::schema(name, "duplicate column name"));
        }
        self.check_column_len(&name, &values)?;
        let mut out = self.clone();
        out.index.insert(name.clone(), out.columns.len());
        out.columns.push(name);
        for (row, value) in out.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(out)
    }

    /// New table with the named column's cells replaced, keeping its
    /// position; the column is appended when absent.
    pub fn set_column(&self, name: impl Into<String>, values: Vec<Value>) -> Result<Table> {
        let name = name.into();
        let Some(idx) = self.column_index(&name) else {
            return self.with_column(name, values);
        };
        self.check_column_len(&name, &values)?;
        let mut out = self.clone();
        for (row, value) in out.rows.iter_mut().zip(values) {
            row[idx] = value;
        }
        Ok(out)
    }

    fn check_column_len(&self, name: &str, values: &[Value]) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(ChurnError::InvalidParameter(format!(
                "column `{}` has {} values, table has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }
        Ok(())
    }

    pub(crate) fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

/// Borrowed view of one row, addressed by column name.
#[derive(Clone, Copy, Debug)]
pub struct Record<'a> {
    table: &'a Table,
    row: usize,
}

impl<'a> Record<'a> {
    pub fn index(&self) -> usize {
        self.row
    }

    pub fn get(&self, name: &str) -> Option<&'a Value> {
        self.table.get(self.row, name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a Value)> + 'a {
        let table = self.table;
        let row = &table.rows[self.row];
        table
            .columns
            .iter()
            .map(String::as_str)
            .zip(row.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".into(), "b".into(), "c".into()],
            vec![
                vec![Value::Number(1.0), Value::from("x"), Value::Missing],
                vec![Value::Number(2.0), Value::from("y"), Value::Number(3.5)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("42"), Value::from("42"));
        assert_eq!(Value::parse(" 29.85 "), Value::from("29.85"));
        assert_eq!(Value::parse(" "), Value::Missing);
        assert_eq!(Value::parse("NA"), Value::Missing);
        assert_eq!(Value::parse("Yes"), Value::Text("Yes".into()));
        assert_eq!(Value::parse("inf"), Value::Text("inf".into()));
    }

    #[test]
    fn test_value_as_number() {
        assert_eq!(Value::parse("42").as_number(), Some(42.0));
        assert_eq!(Value::parse("1e3").as_number(), Some(1000.0));
        assert_eq!(Value::from("12.5").as_number(), Some(12.5));
        assert_eq!(Value::Number(3.0).as_number(), Some(3.0));
        assert_eq!(Value::from("abc").as_number(), None);
        assert_eq!(Value::from("inf").as_number(), None);
        assert_eq!(Value::Missing.as_number(), None);
    }

    #[test]
    fn test_parsed_text_keeps_spelling() {
        for raw in ["0042", "29.850", "1e3", "-0"] {
            let v = Value::parse(raw);
            assert_eq!(v.category().as_deref(), Some(raw));
            assert_eq!(v.to_string(), raw);
        }
    }

    #[test]
    fn test_value_category_of_number() {
        assert_eq!(Value::Number(1.0).category().as_deref(), Some("1"));
        assert_eq!(Value::Number(0.5).category().as_deref(), Some("0.5"));
        assert_eq!(Value::Missing.category(), None);
    }

    #[test]
    fn test_table_duplicate_columns_rejected() {
        let result = Table::new(vec!["a".into(), "a".into()]);
        assert!(matches!(result, Err(ChurnError::Schema { .. })));
    }

    #[test]
    fn test_table_row_width_checked() {
        let mut table = Table::new(vec!["a".into()]).unwrap();
        assert!(table.push_row(vec![Value::Missing, Value::Missing]).is_err());
    }

    #[test]
    fn test_table_column_access() {
        let table = sample();
        let b: Vec<&Value> = table.column("b").unwrap().collect();
        assert_eq!(b, vec![&Value::from("x"), &Value::from("y")]);
        assert!(table.column("zzz").is_none());
        assert_eq!(table.get(1, "c"), Some(&Value::Number(3.5)));
    }

    #[test]
    fn test_table_select_rows_and_drop_columns() {
        let table = sample();
        let picked = table.select_rows(&[1]);
        assert_eq!(picked.n_rows(), 1);
        assert_eq!(picked.get(0, "a"), Some(&Value::Number(2.0)));

        let dropped = table.without_columns(&["b".to_string(), "nope".to_string()]);
        assert_eq!(dropped.columns(), &["a".to_string(), "c".to_string()]);
        assert_eq!(dropped.get(1, "c"), Some(&Value::Number(3.5)));
        // Source table is untouched.
        assert!(table.has_column("b"));
    }

    #[test]
    fn test_table_with_column() {
        let table = sample();
        let out = table
            .with_column("d", vec![Value::from("p"), Value::from("q")])
            .unwrap();
        assert_eq!(out.get(1, "d"), Some(&Value::from("q")));
        assert!(!table.has_column("d"));
        assert!(table.with_column("d", vec![]).is_err());
    }

    #[test]
    fn test_table_set_column_replaces_in_place() {
        let table = sample();
        let out = table
            .set_column("b", vec![Value::from("p"), Value::from("q")])
            .unwrap();
        assert_eq!(out.columns(), table.columns());
        assert_eq!(out.get(0, "b"), Some(&Value::from("p")));
        assert_eq!(out.get(1, "a"), Some(&Value::Number(2.0)));

        let appended = table.set_column("d", vec![Value::Missing, Value::Missing]).unwrap();
        assert_eq!(appended.columns().last().map(String::as_str), Some("d"));
        assert!(table.set_column("b", vec![]).is_err());
    }

    #[test]
    fn test_record_iter() {
        let table = sample();
        let record = table.record(0).unwrap();
        let pairs: Vec<(&str, &Value)> = record.iter().collect();
        assert_eq!(pairs[1], ("b", &Value::from("x")));
        assert!(table.record(5).is_none());
    }
}
