//! Output helpers shared across commands.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use mixmatch_core::TypeTable;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tabwriter::TabWriter;

/// Output format for tabular data.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable aligned table (default for interactive use)
    #[default]
    Table,
    /// JSON (pipe-friendly, structured)
    Json,
    /// Comma-separated values
    Csv,
}

#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

impl OutputArgs {
    pub fn writer(&self) -> Result<Box<dyn Write>> {
        Ok(match &self.out {
            Some(path) => Box::new(BufWriter::new(
                File::create(path).with_context(|| format!("creating {}", path.display()))?,
            )),
            None => Box::new(io::stdout().lock()),
        })
    }
}

/// Write a one-column list under `header`.
pub fn write_list<S: AsRef<str> + Serialize>(
    items: &[S],
    header: &str,
    output: &OutputArgs,
) -> Result<()> {
    let mut writer = output.writer()?;
    match output.format {
        OutputFormat::Table => {
            for item in items {
                writeln!(writer, "{}", item.as_ref())?;
            }
        }
        OutputFormat::Json => write_json(items, &mut writer)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut writer);
            wtr.write_record([header])?;
            for item in items {
                wtr.write_record([item.as_ref()])?;
            }
            wtr.flush()?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write serializable records; `Table` renders `columns` with a tab writer.
pub fn write_records<T: Serialize>(
    records: &[T],
    columns: &[&str],
    output: &OutputArgs,
) -> Result<()> {
    let mut writer = output.writer()?;
    match output.format {
        OutputFormat::Table => {
            let mut tw = TabWriter::new(&mut writer).padding(2);
            writeln!(tw, "{}", columns.join("\t"))?;
            for record in records {
                let value = serde_json::to_value(record)?;
                let cells: Vec<String> = columns
                    .iter()
                    .map(|c| match &value[*c] {
                        serde_json::Value::String(s) => s.clone(),
                        serde_json::Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                writeln!(tw, "{}", cells.join("\t"))?;
            }
            tw.flush()?;
        }
        OutputFormat::Json => write_json(records, &mut writer)?,
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(&mut writer);
            for record in records {
                wtr.serialize(record)?;
            }
            wtr.flush()?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Write a per-type table with its row labels under `index_label`.
pub fn write_type_table(table: &TypeTable, index_label: &str, output: &OutputArgs) -> Result<()> {
    let mut writer = output.writer()?;
    match output.format {
        OutputFormat::Table => write!(writer, "{table}")?,
        OutputFormat::Json => write_json(table, &mut writer)?,
        OutputFormat::Csv => table.write_csv(&mut writer, index_label)?,
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write, T: Serialize + ?Sized>(data: &T, writer: &mut W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *writer, data).map_err(io::Error::other)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_output_ends_with_newline() {
        let mut buf = Vec::new();
        write_json(&["Coal", "Wind"], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.ends_with("]\n"));
        assert!(text.contains("\"Coal\""));
    }

    #[test]
    fn table_and_csv_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.csv");
        let table =
            TypeTable::pivot_sum("Capacity (GW)", [("Coal", 50.0), ("Wind", 100.0)]).unwrap();
        let output = OutputArgs {
            format: OutputFormat::Csv,
            out: Some(path.clone()),
        };
        write_type_table(&table, "generator type", &output).unwrap();
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "generator type,Capacity (GW)\nCoal,50\nWind,100\n"
        );
    }
}
