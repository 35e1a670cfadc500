//! Type-indexed numeric tables.
//!
//! A [`TypeTable`] is a thin wrapper around a polars [`DataFrame`]: one
//! row-label column (the generator type) followed by named `Float64` columns,
//! kept sorted by label, plus an optional `TOTAL` row held beside the frame.
//! It backs the generation-mix, request-summary and result-summary tables.
//! Missing cells are nulls in the frame and read back as `NaN`; sums skip them.

use crate::error::{CoreError, CoreResult};
use polars::prelude::*;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Label of the summary row appended by [`TypeTable::push_total`].
pub const TOTAL_ROW: &str = "TOTAL";

/// Row-label column of the backing frame.
const LABEL: &str = "__type";

/// Row-labeled table of `f64` columns. Rows iterate in ascending label order.
#[derive(Debug, Clone)]
pub struct TypeTable {
    frame: DataFrame,
    total: Option<Vec<f64>>,
}

impl TypeTable {
    /// Create an empty table with the given columns.
    pub fn new<I, S>(columns: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut series = vec![Series::new_empty(LABEL, &DataType::Utf8)];
        for name in columns {
            let name = name.into();
            if name == LABEL || series.iter().any(|s| s.name() == name) {
                return Err(CoreError::DuplicateColumn(name));
            }
            series.push(Series::new_empty(&name, &DataType::Float64));
        }
        Ok(Self::from_frame(DataFrame::new(series)?))
    }

    /// Single-column table holding the sum of `entries` per label.
    pub fn pivot_sum<I, S>(column: &str, entries: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        if column == LABEL {
            return Err(CoreError::DuplicateColumn(column.to_string()));
        }
        let (labels, values): (Vec<String>, Vec<f64>) = entries
            .into_iter()
            .map(|(label, value)| (label.into(), value))
            .unzip();
        let frame = DataFrame::new(vec![
            Series::new(LABEL, labels),
            float_series(column, values),
        ])?;
        let frame = frame
            .lazy()
            .group_by([col(LABEL)])
            .agg([col(column).sum()])
            .sort(LABEL, SortOptions::default())
            .collect()?;
        Ok(Self::from_frame(frame))
    }

    fn from_frame(frame: DataFrame) -> Self {
        Self { frame, total: None }
    }

    /// Value column names, in order.
    pub fn columns(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .skip(1)
            .map(str::to_string)
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        name != LABEL && self.frame.get_column_names().contains(&name)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns().iter().position(|c| c == name)
    }

    /// Row labels, excluding `TOTAL`.
    pub fn row_labels(&self) -> Vec<String> {
        self.frame
            .column(LABEL)
            .and_then(|series| series.utf8())
            .map(|labels| {
                labels
                    .into_iter()
                    .map(|label| label.unwrap_or_default().to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn position(&self, label: &str) -> Option<usize> {
        self.row_labels().iter().position(|l| l == label)
    }

    /// Cells of one column with nulls as `NaN`.
    fn values(&self, name: &str) -> Option<Vec<f64>> {
        if name == LABEL {
            return None;
        }
        let series = self.frame.column(name).ok()?.cast(&DataType::Float64).ok()?;
        let values = series
            .f64()
            .ok()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        Some(values)
    }

    /// Rows as `(label, values)` pairs, excluding `TOTAL`.
    pub fn rows(&self) -> Vec<(String, Vec<f64>)> {
        let columns: Vec<Vec<f64>> = self
            .columns()
            .iter()
            .map(|c| self.values(c).unwrap_or_default())
            .collect();
        self.row_labels()
            .into_iter()
            .enumerate()
            .map(|(i, label)| {
                let values = columns
                    .iter()
                    .map(|c| c.get(i).copied().unwrap_or(f64::NAN))
                    .collect();
                (label, values)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.height() == 0
    }

    pub fn contains_row(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Cell lookup. `row == "TOTAL"` reads the total row when present.
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        if row == TOTAL_ROW {
            let idx = self.column_index(column)?;
            return self.total.as_ref().map(|t| t[idx]);
        }
        let pos = self.position(row)?;
        self.values(column)?.get(pos).copied()
    }

    /// Set one cell, creating the row (null-filled) if needed. Clears the total row.
    pub fn set(&mut self, row: &str, column: &str, value: f64) -> CoreResult<()> {
        if !self.has_column(column) {
            return Err(CoreError::UnknownColumn(column.to_string()));
        }
        if !self.contains_row(row) {
            let new_row = DataFrame::new(vec![Series::new(LABEL, &[row])])?;
            self.frame = sorted(self.frame.outer_join(&new_row, [LABEL], [LABEL])?)?;
        }
        let pos = self
            .position(row)
            .ok_or_else(|| CoreError::UnknownRow(row.to_string()))?;
        let mut values = self.values(column).unwrap_or_default();
        if let Some(cell) = values.get_mut(pos) {
            *cell = value;
        }
        self.frame.with_column(float_series(column, values))?;
        self.total = None;
        Ok(())
    }

    /// Append a column. Rows missing from `values` are null; labels missing
    /// from the table become new rows; repeated labels are summed. Clears the
    /// total row.
    pub fn push_column<I, S>(&mut self, name: impl Into<String>, values: I) -> CoreResult<()>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let name = name.into();
        if self.has_column(&name) {
            return Err(CoreError::DuplicateColumn(name));
        }
        let column = Self::pivot_sum(&name, values)?;
        self.frame = sorted(self.frame.outer_join(&column.frame, [LABEL], [LABEL])?)?;
        self.total = None;
        Ok(())
    }

    /// Append `name` = `source` / column sum of `source`. A zero sum gives
    /// null shares.
    pub fn push_share(&mut self, source: &str, name: &str) -> CoreResult<()> {
        if !self.has_column(source) {
            return Err(CoreError::UnknownColumn(source.to_string()));
        }
        if self.has_column(name) {
            return Err(CoreError::DuplicateColumn(name.to_string()));
        }
        let total = col(source).sum();
        let share = when(total.clone().eq(lit(0.0)))
            .then(lit(NULL))
            .otherwise(col(source) / total)
            .alias(name);
        self.frame = self.frame.clone().lazy().with_column(share).collect()?;
        self.total = None;
        Ok(())
    }

    /// Values of one column as `(label, value)` pairs, excluding `TOTAL`.
    pub fn column(&self, name: &str) -> Option<Vec<(String, f64)>> {
        let values = self.values(name)?;
        Some(self.row_labels().into_iter().zip(values).collect())
    }

    /// Null-skipping sum of a column over the non-total rows.
    pub fn column_sum(&self, name: &str) -> Option<f64> {
        if name == LABEL {
            return None;
        }
        let series = self.frame.column(name).ok()?;
        Some(series.f64().ok()?.sum().unwrap_or(0.0))
    }

    /// Remove a column if present. Returns whether it existed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        if self.frame.drop_in_place(name).is_err() {
            return false;
        }
        if let Some(total) = self.total.as_mut() {
            total.remove(idx);
        }
        true
    }

    /// Keep only rows whose label satisfies `keep`. Clears the total row.
    pub fn retain_rows<F: FnMut(&str) -> bool>(&mut self, mut keep: F) -> CoreResult<()> {
        let mask: BooleanChunked = self
            .row_labels()
            .iter()
            .map(|label| keep(label))
            .collect();
        self.frame = self.frame.filter(&mask)?;
        self.total = None;
        Ok(())
    }

    /// Multiply every cell (including the total row) by `factor`.
    pub fn scale(&mut self, factor: f64) -> CoreResult<()> {
        let scaled: Vec<Expr> = self
            .columns()
            .iter()
            .map(|c| col(c) * lit(factor))
            .collect();
        self.frame = self.frame.clone().lazy().with_columns(scaled).collect()?;
        if let Some(total) = self.total.as_mut() {
            total.iter_mut().for_each(|v| *v *= factor);
        }
        Ok(())
    }

    /// Replace every missing cell with `value`.
    pub fn fill_missing(&mut self, value: f64) -> CoreResult<()> {
        let filled: Vec<Expr> = self
            .columns()
            .iter()
            .map(|c| col(c).fill_null(lit(value)))
            .collect();
        self.frame = self.frame.clone().lazy().with_columns(filled).collect()?;
        if let Some(total) = self.total.as_mut() {
            total.iter_mut().filter(|v| v.is_nan()).for_each(|v| *v = value);
        }
        Ok(())
    }

    /// Outer join on row labels: columns of `self` followed by those of `other`.
    /// Cells absent on either side are null. The result has no total row.
    pub fn outer_merge(&self, other: &TypeTable) -> CoreResult<TypeTable> {
        if let Some(dup) = other.columns().into_iter().find(|c| self.has_column(c)) {
            return Err(CoreError::DuplicateColumn(dup));
        }
        let joined = self.frame.outer_join(&other.frame, [LABEL], [LABEL])?;
        Ok(Self::from_frame(sorted(joined)?))
    }

    /// Append (or recompute) the `TOTAL` row as null-skipping column sums.
    pub fn push_total(&mut self) -> CoreResult<()> {
        let columns = self.columns();
        let sums = self
            .frame
            .clone()
            .lazy()
            .select(columns.iter().map(|c| col(c).sum()).collect::<Vec<_>>())
            .collect()?;
        let totals = columns
            .iter()
            .map(|c| {
                sums.column(c)
                    .ok()
                    .and_then(|s| s.f64().ok())
                    .and_then(|s| s.get(0))
                    .unwrap_or(0.0)
            })
            .collect();
        self.total = Some(totals);
        Ok(())
    }

    pub fn total(&self) -> Option<&[f64]> {
        self.total.as_deref()
    }

    /// Rows followed by the total row, if any.
    fn rows_with_total(&self) -> Vec<(String, Vec<f64>)> {
        let mut rows = self.rows();
        if let Some(total) = &self.total {
            rows.push((TOTAL_ROW.to_string(), total.clone()));
        }
        rows
    }

    /// Write as CSV with the row labels in a leading `index_label` column.
    pub fn write_csv<W: Write>(&self, writer: W, index_label: &str) -> CoreResult<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![index_label.to_string()];
        header.extend(self.columns());
        wtr.write_record(&header)?;
        for (label, values) in self.rows_with_total() {
            let mut record = vec![label];
            record.extend(values.iter().map(|v| format_cell(*v)));
            wtr.write_record(&record)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path, index_label: &str) -> CoreResult<()> {
        let file = File::create(path)?;
        self.write_csv(file, index_label)
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::from_frame(DataFrame::new_no_checks(vec![Series::new_empty(
            LABEL,
            &DataType::Utf8,
        )]))
    }
}

/// Tables are equal when labels, columns and cells match; missing cells
/// compare equal to each other.
impl PartialEq for TypeTable {
    fn eq(&self, other: &Self) -> bool {
        let same = |a: &[f64], b: &[f64]| {
            a.len() == b.len()
                && a.iter()
                    .zip(b)
                    .all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
        };
        let (ours, theirs) = (self.rows_with_total(), other.rows_with_total());
        self.columns() == other.columns()
            && ours.len() == theirs.len()
            && ours
                .iter()
                .zip(&theirs)
                .all(|((la, va), (lb, vb))| la == lb && same(va.as_slice(), vb.as_slice()))
    }
}

impl Serialize for TypeTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows: BTreeMap<String, Vec<f64>> = self.rows().into_iter().collect();
        let mut state = serializer.serialize_struct("TypeTable", 3)?;
        state.serialize_field("columns", &self.columns())?;
        state.serialize_field("rows", &rows)?;
        state.serialize_field("total", &self.total)?;
        state.end()
    }
}

fn float_series(name: &str, values: Vec<f64>) -> Series {
    let cells: Vec<Option<f64>> = values
        .into_iter()
        .map(|v| (!v.is_nan()).then_some(v))
        .collect();
    Series::new(name, cells)
}

fn sorted(frame: DataFrame) -> PolarsResult<DataFrame> {
    frame.lazy().sort(LABEL, SortOptions::default()).collect()
}

fn format_cell(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

impl fmt::Display for TypeTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = self.rows_with_total();
        let columns = self.columns();
        let label_width = rows
            .iter()
            .map(|(label, _)| label.len())
            .chain([TOTAL_ROW.len()])
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = columns.iter().map(|c| c.len().max(12)).collect();

        write!(f, "{:<label_width$}", "")?;
        for (column, width) in columns.iter().zip(widths.iter().copied()) {
            write!(f, "  {:>width$}", column)?;
        }
        writeln!(f)?;

        for (label, values) in &rows {
            write!(f, "{:<label_width$}", label)?;
            for (value, width) in values.iter().zip(widths.iter().copied()) {
                if value.is_nan() {
                    write!(f, "  {:>width$}", "NaN")?;
                } else {
                    write!(f, "  {:>width$.3}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TypeTable {
        let mut table = TypeTable::new(["Capacity (GW)"]).unwrap();
        table.set("Wind", "Capacity (GW)", 100.0).unwrap();
        table.set("Coal", "Capacity (GW)", 50.0).unwrap();
        table
    }

    #[test]
    fn rows_iterate_sorted() {
        let table = sample();
        assert_eq!(table.row_labels(), vec!["Coal", "Wind"]);
        assert_eq!(table.get("Wind", "Capacity (GW)"), Some(100.0));
    }

    #[test]
    fn push_column_fills_missing_with_nan() {
        let mut table = sample();
        table
            .push_column("Generation (TWh)", [("Wind", 0.3), ("Curtailment", 0.1)])
            .unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.get("Coal", "Generation (TWh)").unwrap().is_nan());
        assert!(table.get("Curtailment", "Capacity (GW)").unwrap().is_nan());
        assert!((table.column_sum("Generation (TWh)").unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut table = sample();
        let err = table
            .push_column("Capacity (GW)", Vec::<(String, f64)>::new())
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicateColumn(_)));
        assert!(matches!(
            TypeTable::new(["a", "a"]).unwrap_err(),
            CoreError::DuplicateColumn(_)
        ));
    }

    #[test]
    fn total_row_skips_missing_cells() {
        let mut table = sample();
        table.push_column("Other", [("Wind", 2.0)]).unwrap();
        table.push_total().unwrap();
        assert_eq!(table.get(TOTAL_ROW, "Capacity (GW)"), Some(150.0));
        assert_eq!(table.get(TOTAL_ROW, "Other"), Some(2.0));
        // structural edits invalidate the total
        table.retain_rows(|label| label == "Wind").unwrap();
        assert!(table.total().is_none());
        assert_eq!(table.row_labels(), vec!["Wind"]);
    }

    #[test]
    fn pivot_sum_accumulates_per_label() {
        let table = TypeTable::pivot_sum(
            "Current Capacity (MW)",
            [("Wind", 5.0), ("Coal", 10.0), ("Coal", 2.5)],
        )
        .unwrap();
        assert_eq!(table.row_labels(), vec!["Coal", "Wind"]);
        assert_eq!(table.get("Coal", "Current Capacity (MW)"), Some(12.5));
        assert_eq!(table.get("Wind", "Current Capacity (MW)"), Some(5.0));
    }

    #[test]
    fn outer_merge_unions_rows() {
        let current = TypeTable::pivot_sum("Current", [("Coal", 10.0), ("Hydro", 3.0)]).unwrap();
        let desired = TypeTable::pivot_sum("Desired", [("Coal", 8.0), ("Wind", 4.0)]).unwrap();
        let mut merged = current.outer_merge(&desired).unwrap();
        assert_eq!(merged.columns(), vec!["Current", "Desired"]);
        assert_eq!(merged.row_labels(), vec!["Coal", "Hydro", "Wind"]);
        assert!(merged.get("Wind", "Current").unwrap().is_nan());
        merged.fill_missing(0.0).unwrap();
        assert_eq!(merged.get("Wind", "Current"), Some(0.0));
        assert_eq!(merged.get("Hydro", "Desired"), Some(0.0));
        assert!(current.outer_merge(&current).is_err());
    }

    #[test]
    fn shares_of_zero_sum_are_missing() {
        let mut table = sample();
        table.push_share("Capacity (GW)", "Capacity Fraction").unwrap();
        let wind = table.get("Wind", "Capacity Fraction").unwrap();
        assert!((wind - 2.0 / 3.0).abs() < 1e-12);

        let mut zeros = TypeTable::pivot_sum("Generation (TWh)", [("Coal", 0.0), ("Wind", 0.0)]).unwrap();
        zeros.push_share("Generation (TWh)", "Generation Fraction").unwrap();
        assert!(zeros.get("Coal", "Generation Fraction").unwrap().is_nan());
        zeros.push_total().unwrap();
        assert_eq!(zeros.get(TOTAL_ROW, "Generation Fraction"), Some(0.0));
    }

    #[test]
    fn scale_and_drop_column() {
        let mut table = sample();
        table.push_column("Fraction", [("Wind", 0.5)]).unwrap();
        table.push_total().unwrap();
        table.scale(0.1).unwrap();
        assert!((table.get("Wind", "Capacity (GW)").unwrap() - 10.0).abs() < 1e-12);
        assert!(table.get("Coal", "Fraction").unwrap().is_nan());
        assert!((table.get(TOTAL_ROW, "Capacity (GW)").unwrap() - 15.0).abs() < 1e-12);
        assert!(table.drop_column("Fraction"));
        assert!(!table.drop_column("Fraction"));
        assert_eq!(table.total().unwrap().len(), 1);
    }

    #[test]
    fn writes_csv_with_total_row() {
        let mut table = sample();
        table.push_total().unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf, "generator type").unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "generator type,Capacity (GW)");
        assert_eq!(lines[1], "Coal,50");
        assert_eq!(lines[3], "TOTAL,150");
    }

    #[test]
    fn equality_treats_missing_cells_alike() {
        let mut a = sample();
        a.push_column("Other", [("Wind", 1.0)]).unwrap();
        let mut b = sample();
        b.push_column("Other", [("Wind", 1.0)]).unwrap();
        assert_eq!(a, b);
        b.set("Coal", "Other", 3.0).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn display_renders_nan_cells() {
        let mut table = sample();
        table.push_column("Other", [("Wind", 1.0)]).unwrap();
        let text = table.to_string();
        assert!(text.contains("NaN"));
        assert!(text.contains("Wind"));
    }
}
