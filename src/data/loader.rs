//! Data loading utilities
//!
//! Reads the input table from CSV or spreadsheet files and turns it into an
//! [`ObservationSeries`]. Input arriving on a stream (stdin, an upload) is
//! first staged into a temporary file that is removed when the staging
//! handle goes out of scope.

use super::types::ObservationSeries;
use crate::config::ForecastConfig;
use crate::error::{ForecastError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Largest cycle count a spreadsheet float holds exactly (2^53)
const MAX_EXACT_CYCLE: f64 = 9_007_199_254_740_992.0;

/// Supported input formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Comma separated text
    Csv,
    /// Excel or OpenDocument workbook (first worksheet is read)
    Workbook,
}

impl InputFormat {
    /// Guess the format from a file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("csv") | Some("txt") => Ok(InputFormat::Csv),
            Some("xlsx") | Some("xlsm") | Some("xlsb") | Some("xls") | Some("ods") => {
                Ok(InputFormat::Workbook)
            }
            other => Err(ForecastError::MalformedInput(format!(
                "unsupported file type {:?} for {}",
                other.unwrap_or(""),
                path.as_ref().display()
            ))),
        }
    }

    /// File suffix used when staging a stream of this format
    pub fn suffix(&self) -> &'static str {
        match self {
            InputFormat::Csv => ".csv",
            InputFormat::Workbook => ".xlsx",
        }
    }
}

/// A single cell of the raw table
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            Cell::Empty
        } else if let Ok(v) = raw.parse::<f64>() {
            Cell::Number(v)
        } else {
            Cell::Text(raw.to_string())
        }
    }

    fn from_workbook(data: &Data) -> Self {
        match data {
            Data::Float(v) => Cell::Number(*v),
            Data::Int(v) => Cell::Number(*v as f64),
            Data::String(s) => Cell::parse(s),
            Data::Empty => Cell::Empty,
            other => Cell::Text(other.to_string()),
        }
    }

    fn header_name(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// Rectangular table as read from disk, before column interpretation
#[derive(Debug, Clone)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    /// Position of a column by header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Interpret the table as an observation series
    ///
    /// The measurement column is required and every one of its cells must be
    /// numeric. The cycle column is optional; when present every cell must be
    /// an integer.
    pub fn into_series(self, config: &ForecastConfig) -> Result<ObservationSeries> {
        let value_idx = self.column(&config.measurement_column).ok_or_else(|| {
            ForecastError::MalformedInput(format!(
                "missing required column '{}' (found: {})",
                config.measurement_column,
                self.headers.join(", ")
            ))
        })?;
        let cycle_idx = self.column(&config.cycle_column);

        let mut values = Vec::with_capacity(self.rows.len());
        let mut cycles = Vec::with_capacity(self.rows.len());

        for (i, row) in self.rows.iter().enumerate() {
            // header is line 1
            let line = i + 2;
            if row.iter().all(|c| *c == Cell::Empty) {
                continue;
            }

            let value = match row.get(value_idx).unwrap_or(&Cell::Empty) {
                Cell::Number(v) if v.is_finite() => *v,
                Cell::Number(v) => {
                    return Err(ForecastError::MalformedInput(format!(
                        "row {}: '{}' is not finite ({})",
                        line, config.measurement_column, v
                    )))
                }
                Cell::Text(s) => {
                    return Err(ForecastError::MalformedInput(format!(
                        "row {}: '{}' is not numeric ({:?})",
                        line, config.measurement_column, s
                    )))
                }
                Cell::Empty => {
                    return Err(ForecastError::MalformedInput(format!(
                        "row {}: '{}' is empty",
                        line, config.measurement_column
                    )))
                }
            };
            values.push(value);

            if let Some(idx) = cycle_idx {
                let cycle = match row.get(idx).unwrap_or(&Cell::Empty) {
                    Cell::Number(v)
                        if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT_CYCLE =>
                    {
                        *v as i64
                    }
                    other => {
                        return Err(ForecastError::MalformedInput(format!(
                            "row {}: '{}' is not an integer cycle count ({:?})",
                            line, config.cycle_column, other
                        )))
                    }
                };
                cycles.push(cycle);
            }
        }

        if cycle_idx.is_some() {
            if cycles.windows(2).any(|w| w[1] <= w[0]) {
                warn!(
                    "'{}' is not strictly increasing; rows are used in file order",
                    config.cycle_column
                );
            }
            ObservationSeries::with_cycles(values, cycles).ok_or_else(|| {
                ForecastError::MalformedInput("cycle and measurement counts differ".to_string())
            })
        } else {
            debug!("no '{}' column; using row positions for display", config.cycle_column);
            Ok(ObservationSeries::new(values))
        }
    }
}

/// Data loader for tabular input files
pub struct DataLoader;

impl DataLoader {
    /// Load an observation series from a file, picking the format by extension
    pub fn load_series<P: AsRef<Path>>(path: P, config: &ForecastConfig) -> Result<ObservationSeries> {
        let format = InputFormat::from_path(&path)?;
        Self::load_series_as(path, format, config)
    }

    /// Load an observation series from a file in a known format
    pub fn load_series_as<P: AsRef<Path>>(
        path: P,
        format: InputFormat,
        config: &ForecastConfig,
    ) -> Result<ObservationSeries> {
        let table = Self::load_table(&path, format)?;
        info!(
            "Loaded {} rows with columns [{}] from {}",
            table.rows.len(),
            table.headers.join(", "),
            path.as_ref().display()
        );
        table.into_series(config)
    }

    /// Read the raw table from a file
    pub fn load_table<P: AsRef<Path>>(path: P, format: InputFormat) -> Result<RawTable> {
        match format {
            InputFormat::Csv => {
                let file = File::open(&path)?;
                Self::read_csv(BufReader::new(file))
            }
            InputFormat::Workbook => Self::read_workbook(path),
        }
    }

    /// Read a CSV table from any reader
    pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();

        let mut rows: Vec<Vec<Cell>> = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(record.iter().map(Cell::parse).collect());
        }

        Ok(RawTable { headers, rows })
    }

    /// Read the first worksheet of a workbook
    pub fn read_workbook<P: AsRef<Path>>(path: P) -> Result<RawTable> {
        let mut workbook = open_workbook_auto(&path)?;
        let range = workbook.worksheet_range_at(0).ok_or_else(|| {
            ForecastError::Workbook(format!("{} has no worksheets", path.as_ref().display()))
        })??;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .map(|c| Cell::from_workbook(c).header_name())
                .collect(),
            None => Vec::new(),
        };
        let rows: Vec<Vec<Cell>> = rows
            .map(|row| row.iter().map(Cell::from_workbook).collect())
            .collect();

        Ok(RawTable { headers, rows })
    }
}

/// Stream contents copied into a temporary file for the duration of a run
///
/// The file is deleted when the value is dropped, whether the run that used
/// it succeeded or failed.
pub struct StagedInput {
    file: NamedTempFile,
    format: InputFormat,
}

impl StagedInput {
    /// Copy `reader` to a fresh temporary file
    pub fn stage<R: Read>(mut reader: R, format: InputFormat) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("egt-upload-")
            .suffix(format.suffix())
            .tempfile()?;
        let bytes = io::copy(&mut reader, &mut file)?;
        file.flush()?;
        debug!("Staged {} bytes at {}", bytes, file.path().display());
        Ok(Self { file, format })
    }

    /// Path of the staged file
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Load the staged file as an observation series
    pub fn load_series(&self, config: &ForecastConfig) -> Result<ObservationSeries> {
        DataLoader::load_series_as(self.path(), self.format, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(csv: &str) -> Result<ObservationSeries> {
        DataLoader::read_csv(csv.as_bytes())?.into_series(&ForecastConfig::default())
    }

    #[test]
    fn test_load_with_cycles() {
        let series = parse("CSN,EGT Margin,Engine\n10,41.5,A\n11,41.2,A\n12,40.9,A\n").unwrap();
        assert_eq!(series.values(), &[41.5, 41.2, 40.9]);
        assert_eq!(series.cycles(), Some(&[10, 11, 12][..]));
    }

    #[test]
    fn test_load_without_cycles() {
        let series = parse("EGT Margin\n41.5\n41.2\n").unwrap();
        assert!(!series.has_cycles());
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn test_missing_measurement_column() {
        let err = parse("CSN,EGT\n1,40.0\n").unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput(_)));
    }

    #[test]
    fn test_non_numeric_measurement() {
        let err = parse("CSN,EGT Margin\n1,40.0\n2,n/a\n").unwrap_err();
        match err {
            ForecastError::MalformedInput(msg) => assert!(msg.contains("row 3")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_measurement_is_rejected() {
        let err = parse("CSN,EGT Margin\n1,40.0\n2,\n").unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput(_)));
    }

    #[test]
    fn test_fractional_cycle_is_rejected() {
        let err = parse("CSN,EGT Margin\n1.5,40.0\n").unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput(_)));
    }

    #[test]
    fn test_out_of_range_cycle_is_rejected() {
        let err = parse("CSN,EGT Margin\n1e19,40.0\n").unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput(_)));

        let err = parse("CSN,EGT Margin\n-9007199254740994,40.0\n").unwrap_err();
        assert!(matches!(err, ForecastError::MalformedInput(_)));

        let series = parse("CSN,EGT Margin\n9007199254740992,40.0\n").unwrap();
        assert_eq!(series.last_cycle(), Some(9_007_199_254_740_992));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(InputFormat::from_path("a.CSV").unwrap(), InputFormat::Csv);
        assert_eq!(InputFormat::from_path("b.xlsx").unwrap(), InputFormat::Workbook);
        assert!(InputFormat::from_path("c.parquet").is_err());
    }

    #[test]
    fn test_staged_input_is_removed_on_drop() {
        let staged = StagedInput::stage("CSN,EGT Margin\n1,40.0\n".as_bytes(), InputFormat::Csv).unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());
        assert_eq!(staged.load_series(&ForecastConfig::default()).unwrap().len(), 1);
        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_load_series_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.csv");
        std::fs::write(&path, "CSN,EGT Margin\n1,40.0\n2,39.8\n").unwrap();

        let series = DataLoader::load_series(&path, &ForecastConfig::default()).unwrap();
        assert_eq!(series.last_cycle(), Some(2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DataLoader::load_series("/nonexistent/engine.csv", &ForecastConfig::default())
            .unwrap_err();
        assert!(matches!(err, ForecastError::Io(_)));
    }
}
