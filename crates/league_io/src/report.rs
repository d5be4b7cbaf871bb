//! Flat tabular output: CSV rows or a JSON document with run metadata.

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Json => "json",
        })
    }
}

/// Context attached to JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub season: String,
    pub trials: Option<usize>,
    pub seed: Option<u64>,
    pub cancelled: bool,
    /// RFC3339
    pub generated_at: String,
}

impl RunMetadata {
    pub fn new(season: &str) -> Self {
        Self {
            season: season.to_string(),
            trials: None,
            seed: None,
            cancelled: false,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_trials(mut self, trials: usize, cancelled: bool) -> Self {
        self.trials = Some(trials);
        self.cancelled = cancelled;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

#[derive(Serialize)]
struct Document<'a, T: Serialize> {
    metadata: &'a RunMetadata,
    rows: &'a [T],
}

/// Write `rows` in `format`. CSV output carries no metadata.
pub fn write_rows<T, W>(writer: W, rows: &[T], format: OutputFormat, metadata: &RunMetadata) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for row in rows {
                csv_writer.serialize(row).map_err(|source| LoadError::Csv {
                    path: "<output>".to_string(),
                    source,
                })?;
            }
            csv_writer.flush().map_err(|source| LoadError::Io {
                path: "<output>".to_string(),
                source,
            })
        }
        OutputFormat::Json => {
            let mut writer = writer;
            serde_json::to_writer_pretty(&mut writer, &Document { metadata, rows }).map_err(|source| {
                LoadError::Json {
                    path: "<output>".to_string(),
                    source,
                }
            })?;
            writeln!(writer).map_err(|source| LoadError::Io {
                path: "<output>".to_string(),
                source,
            })
        }
    }
}

pub fn write_rows_to_path<T: Serialize>(
    path: &Path,
    rows: &[T],
    format: OutputFormat,
    metadata: &RunMetadata,
) -> Result<()> {
    let file = File::create(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_rows(BufWriter::new(file), rows, format, metadata)
}
