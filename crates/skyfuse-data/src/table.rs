//! Column-oriented in-memory tables
//!
//! Every stage consumes a table and hands back a new one. Row selection and
//! derived columns are written as ordinary Rust closures over typed columns
//! instead of query strings.

use crate::error::{PipelineError, Result};
use skyfuse_core::constants::SENTINEL;

/// One typed, nullable column
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Float(Vec<Option<f64>>),
    Int(Vec<Option<i64>>),
    Text(Vec<Option<String>>),
    Bool(Vec<Option<bool>>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Column::Float(_) => "float",
            Column::Int(_) => "int",
            Column::Text(_) => "text",
            Column::Bool(_) => "bool",
        }
    }

    /// Float column where every cell is the sentinel
    pub fn sentinel(n: usize) -> Self {
        Column::Float(vec![Some(SENTINEL); n])
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Float(_) | Column::Int(_))
    }

    /// Numeric view of one cell; ints are widened
    pub fn number(&self, row: usize) -> Option<f64> {
        match self {
            Column::Float(v) => v.get(row).copied().flatten(),
            Column::Int(v) => v.get(row).copied().flatten().map(|i| i as f64),
            _ => None,
        }
    }

    /// Text rendering of one cell, `None` for null
    pub fn render(&self, row: usize) -> Option<String> {
        match self {
            Column::Float(v) => v.get(row).copied().flatten().map(format_float),
            Column::Int(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
            Column::Text(v) => v.get(row).cloned().flatten(),
            Column::Bool(v) => v.get(row).copied().flatten().map(|x| x.to_string()),
        }
    }

    /// Gather rows by index; `None` yields an unmatched cell
    ///
    /// Unmatched float cells become the sentinel, other types become null.
    pub fn gather(&self, indices: &[Option<usize>]) -> Column {
        fn pick<T: Clone>(v: &[Option<T>], indices: &[Option<usize>], missing: Option<T>) -> Vec<Option<T>> {
            indices
                .iter()
                .map(|idx| match idx {
                    Some(i) => v.get(*i).cloned().flatten(),
                    None => missing.clone(),
                })
                .collect()
        }

        match self {
            Column::Float(v) => Column::Float(pick(v, indices, Some(SENTINEL))),
            Column::Int(v) => Column::Int(pick(v, indices, None)),
            Column::Text(v) => Column::Text(pick(v, indices, None)),
            Column::Bool(v) => Column::Bool(pick(v, indices, None)),
        }
    }

    fn retain(&self, mask: &[bool]) -> Column {
        fn keep<T: Clone>(v: &[Option<T>], mask: &[bool]) -> Vec<Option<T>> {
            v.iter().zip(mask).filter(|(_, m)| **m).map(|(x, _)| x.clone()).collect()
        }

        match self {
            Column::Float(v) => Column::Float(keep(v, mask)),
            Column::Int(v) => Column::Int(keep(v, mask)),
            Column::Text(v) => Column::Text(keep(v, mask)),
            Column::Bool(v) => Column::Bool(keep(v, mask)),
        }
    }

    /// True when no cell holds a value
    pub fn is_all_null(&self) -> bool {
        match self {
            Column::Float(v) => v.iter().all(Option::is_none),
            Column::Int(v) => v.iter().all(Option::is_none),
            Column::Text(v) => v.iter().all(Option::is_none),
            Column::Bool(v) => v.iter().all(Option::is_none),
        }
    }

    /// All-null column of the same type with `n` cells
    fn nulls_like(&self, n: usize) -> Column {
        match self {
            Column::Float(_) => Column::Float(vec![None; n]),
            Column::Int(_) => Column::Int(vec![None; n]),
            Column::Text(_) => Column::Text(vec![None; n]),
            Column::Bool(_) => Column::Bool(vec![None; n]),
        }
    }

    /// Numeric view; a column without values reads as all null whatever its type
    fn to_float(&self) -> Option<Vec<Option<f64>>> {
        match self {
            Column::Float(v) => Some(v.clone()),
            Column::Int(v) => Some(v.iter().map(|x| x.map(|i| i as f64)).collect()),
            other if other.is_all_null() => Some(vec![None; other.len()]),
            _ => None,
        }
    }

    /// Append `other` below `self`, widening int to float where the partitions disagree
    ///
    /// An all-null side takes the type of the other side.
    fn append(self, other: Column, name: &str) -> Result<Column> {
        let (a, b) = if self.is_all_null() && !other.is_all_null() {
            (other.nulls_like(self.len()), other)
        } else if other.is_all_null() && !self.is_all_null() {
            let filler = self.nulls_like(other.len());
            (self, filler)
        } else {
            (self, other)
        };

        match (a, b) {
            (Column::Float(mut a), Column::Float(b)) => { a.extend(b); Ok(Column::Float(a)) }
            (Column::Int(mut a), Column::Int(b)) => { a.extend(b); Ok(Column::Int(a)) }
            (Column::Text(mut a), Column::Text(b)) => { a.extend(b); Ok(Column::Text(a)) }
            (Column::Bool(mut a), Column::Bool(b)) => { a.extend(b); Ok(Column::Bool(a)) }
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let mut left = a.to_float().unwrap_or_default();
                left.extend(b.to_float().unwrap_or_default());
                Ok(Column::Float(left))
            }
            (a, b) => Err(PipelineError::Schema(format!(
                "column '{}' is {} in one partition and {} in another",
                name,
                a.type_name(),
                b.type_name()
            ))),
        }
    }
}

/// Shortest round-tripping text for a float; flux densities use exponent notation
/// and integral values keep a decimal point so they read back as floats
fn format_float(x: f64) -> String {
    if x != 0.0 && x.is_finite() && (x.abs() < 1e-4 || x.abs() >= 1e15) {
        return format!("{:e}", x);
    }
    let s = x.to_string();
    if x.is_finite() && !s.contains('.') { format!("{}.0", s) } else { s }
}

/// Named table with equally long columns in a fixed order
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    n_rows: usize,
    columns: Vec<(String, Column)>,
}

impl Table {
    /// Table with a known row count and no columns yet
    pub fn empty(name: impl Into<String>, n_rows: usize) -> Self {
        Self { name: name.into(), n_rows, columns: Vec::new() }
    }

    pub fn from_columns(name: impl Into<String>, columns: Vec<(String, Column)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut table = Self::empty(name, n_rows);
        for (col_name, col) in columns {
            table = table.with_column(col_name, col)?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn n_rows(&self) -> usize { self.n_rows }
    pub fn n_columns(&self) -> usize { self.columns.len() }
    pub fn is_empty(&self) -> bool { self.n_rows == 0 }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// Exact match first, then a case-insensitive one
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .or_else(|| self.columns.iter().find(|(n, _)| n.eq_ignore_ascii_case(name)))
            .map(|(n, _)| n.as_str())
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.position(name)
            .map(|i| &self.columns[i].1)
            .ok_or_else(|| PipelineError::missing_column(&self.name, name))
    }

    pub fn float(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            Column::Float(v) => Ok(v),
            other => Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: "float",
                found: other.type_name(),
            }),
        }
    }

    pub fn text(&self, name: &str) -> Result<&[Option<String>]> {
        match self.column(name)? {
            Column::Text(v) => Ok(v),
            other => Err(PipelineError::ColumnType {
                column: name.to_string(),
                expected: "text",
                found: other.type_name(),
            }),
        }
    }

    /// Numeric values of a float or int column, ints widened
    pub fn numbers(&self, name: &str) -> Result<Vec<Option<f64>>> {
        let column = self.column(name)?;
        column.to_float().ok_or_else(|| PipelineError::ColumnType {
            column: name.to_string(),
            expected: "float",
            found: column.type_name(),
        })
    }

    /// Append a column, or replace one of the same name in place
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        let name = name.into();
        if self.columns.is_empty() && self.n_rows == 0 {
            self.n_rows = column.len();
        }
        if column.len() != self.n_rows {
            return Err(PipelineError::ColumnLength { column: name, expected: self.n_rows, found: column.len() });
        }
        match self.position(&name) {
            Some(i) => self.columns[i].1 = column,
            None => self.columns.push((name, column)),
        }
        Ok(self)
    }

    /// Derive a float column row by row
    pub fn with_float_column<F>(self, name: impl Into<String>, f: F) -> Result<Self>
    where
        F: FnMut(usize) -> f64,
    {
        let values = (0..self.n_rows).map(f).map(Some).collect();
        self.with_column(name, Column::Float(values))
    }

    pub fn without_columns(mut self, names: &[&str]) -> Self {
        self.columns.retain(|(n, _)| !names.contains(&n.as_str()));
        self
    }

    /// Rename columns; `old` is matched case-insensitively, absent names are an error
    pub fn rename_columns(mut self, pairs: &[(&str, &str)]) -> Result<Self> {
        for (old, new) in pairs {
            let actual = self
                .resolve(old)
                .map(str::to_string)
                .ok_or_else(|| PipelineError::missing_column(&self.name, *old))?;
            if let Some(i) = self.position(&actual) {
                self.columns[i].0 = (*new).to_string();
            }
        }
        Ok(self)
    }

    /// Keep exactly the named columns, in the given order
    pub fn keep_columns<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        let mut kept = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let actual = self
                .resolve(name)
                .map(str::to_string)
                .ok_or_else(|| PipelineError::missing_column(&self.name, name))?;
            if let Some(i) = self.position(&actual) {
                let (_, column) = self.columns.remove(i);
                kept.push((name.to_string(), column));
            }
        }
        self.columns = kept;
        Ok(self)
    }

    /// Keep the rows where `mask` is true
    pub fn filter_rows(self, mask: &[bool]) -> Self {
        let n_rows = mask.iter().filter(|m| **m).count();
        let columns = self.columns.iter().map(|(n, c)| (n.clone(), c.retain(mask))).collect();
        Self { name: self.name, n_rows, columns }
    }

    /// Keep the rows satisfying a predicate over the row index
    pub fn filter_by<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(usize) -> bool,
    {
        let mask: Vec<bool> = (0..self.n_rows).map(&mut predicate).collect();
        self.filter_rows(&mask)
    }

    /// Build a new table whose rows are gathered from this one
    pub fn gather(&self, indices: &[Option<usize>]) -> Self {
        let columns = self.columns.iter().map(|(n, c)| (n.clone(), c.gather(indices))).collect();
        Self { name: self.name.clone(), n_rows: indices.len(), columns }
    }

    /// Stack two tables with the same columns (matched by name, order of `self`)
    pub fn concat(self, other: Table) -> Result<Self> {
        if self.columns.is_empty() {
            return Ok(other.renamed(self.name));
        }
        if self.n_columns() != other.n_columns() {
            return Err(PipelineError::Schema(format!(
                "{} has {} columns, {} has {}",
                self.name, self.n_columns(), other.name, other.n_columns()
            )));
        }

        let mut other_columns = other.columns;
        let mut columns = Vec::with_capacity(self.columns.len());
        for (name, column) in self.columns {
            let pos = other_columns
                .iter()
                .position(|(n, _)| *n == name)
                .ok_or_else(|| PipelineError::missing_column(&other.name, &name))?;
            let (_, tail) = other_columns.remove(pos);
            let merged = column.append(tail, &name)?;
            columns.push((name, merged));
        }

        Ok(Self { name: self.name, n_rows: self.n_rows + other.n_rows, columns })
    }

    /// Count rows where a float column holds a present (non-null, non-sentinel) value
    pub fn count_present(&self, name: &str) -> Result<usize> {
        Ok(self.float(name)?.iter().filter(|v| skyfuse_core::photometry::is_present(**v)).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_columns(
            "sample",
            vec![
                ("ra".to_string(), Column::Float(vec![Some(1.0), Some(2.0), None])),
                ("TYPE".to_string(), Column::Text(vec![Some("PSF".into()), Some("REX".into()), None])),
                ("objid".to_string(), Column::Int(vec![Some(7), None, Some(9)])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_from_columns_rejects_ragged() {
        let result = Table::from_columns(
            "bad",
            vec![
                ("a".to_string(), Column::Float(vec![Some(1.0)])),
                ("b".to_string(), Column::Float(vec![Some(1.0), Some(2.0)])),
            ],
        );
        assert!(matches!(result, Err(PipelineError::ColumnLength { .. })));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let table = sample();
        assert_eq!(table.resolve("type"), Some("TYPE"));
        assert_eq!(table.resolve("ra"), Some("ra"));
        assert_eq!(table.resolve("dec"), None);
    }

    #[test]
    fn test_keep_and_rename() {
        let table = sample()
            .keep_columns(&["type", "ra"])
            .unwrap()
            .rename_columns(&[("ra", "ra_kids")])
            .unwrap();
        let names: Vec<_> = table.column_names().collect();
        assert_eq!(names, vec!["type", "ra_kids"]);
        assert!(sample().keep_columns(&["missing"]).is_err());
    }

    #[test]
    fn test_gather_fills_unmatched() {
        let gathered = sample().gather(&[Some(1), None]);
        assert_eq!(gathered.n_rows(), 2);
        assert_eq!(gathered.float("ra").unwrap(), &[Some(2.0), Some(SENTINEL)]);
        assert_eq!(gathered.text("TYPE").unwrap(), &[Some("REX".to_string()), None]);
        assert_eq!(gathered.column("objid").unwrap(), &Column::Int(vec![None, None]));
    }

    #[test]
    fn test_filter_by() {
        let table = sample();
        let ra = table.float("ra").unwrap().to_vec();
        let filtered = table.filter_by(|i| ra[i].is_some());
        assert_eq!(filtered.n_rows(), 2);
        assert_eq!(filtered.column("objid").unwrap(), &Column::Int(vec![Some(7), None]));
    }

    #[test]
    fn test_concat_widens_int_to_float() {
        let a = Table::from_columns("a", vec![("x".to_string(), Column::Int(vec![Some(1)]))]).unwrap();
        let b = Table::from_columns("b", vec![("x".to_string(), Column::Float(vec![Some(2.5)]))]).unwrap();
        let joined = a.concat(b).unwrap();
        assert_eq!(joined.n_rows(), 2);
        assert_eq!(joined.float("x").unwrap(), &[Some(1.0), Some(2.5)]);
    }

    #[test]
    fn test_concat_takes_type_of_filled_partition() {
        let blank = Table::from_columns("a", vec![("ref_cat".to_string(), Column::Text(vec![None, None]))]).unwrap();
        let filled = Table::from_columns("b", vec![("ref_cat".to_string(), Column::Int(vec![Some(4411)]))]).unwrap();
        let joined = blank.concat(filled.clone()).unwrap();
        assert_eq!(joined.column("ref_cat").unwrap(), &Column::Int(vec![None, None, Some(4411)]));

        let empty_float = Table::from_columns("c", vec![("ref_cat".to_string(), Column::Float(vec![None]))]).unwrap();
        let joined = filled.concat(empty_float).unwrap();
        assert_eq!(joined.column("ref_cat").unwrap(), &Column::Int(vec![Some(4411), None]));
    }

    #[test]
    fn test_blank_column_reads_as_null_numbers() {
        let table = Table::from_columns("t", vec![("nuv_flux".to_string(), Column::Text(vec![None, None]))]).unwrap();
        assert_eq!(table.numbers("nuv_flux").unwrap(), vec![None, None]);
    }

    #[test]
    fn test_concat_rejects_mismatched_types() {
        let a = Table::from_columns("a", vec![("x".to_string(), Column::Text(vec![Some("s".into())]))]).unwrap();
        let b = Table::from_columns("b", vec![("x".to_string(), Column::Float(vec![Some(2.5)]))]).unwrap();
        assert!(matches!(a.concat(b), Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_with_column_replaces_in_place() {
        let table = sample().with_column("ra", Column::sentinel(3)).unwrap();
        assert_eq!(table.column_names().next(), Some("ra"));
        assert_eq!(table.count_present("ra").unwrap(), 0);
    }
}
