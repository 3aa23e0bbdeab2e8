//! Dataset loader for the insurance charges CSV.
//!
//! Reads `age,sex,bmi,children,smoker,region,charges` rows into typed
//! [`InsuranceRecord`]s and rejects rows that cannot be used for fitting.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use insurance_structs::InsuranceRecord;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed CSV at line {line}: {source}")]
    Csv { line: u64, source: csv::Error },

    #[error("invalid value at line {line}: {message}")]
    Invalid { line: u64, message: String },

    #[error("dataset contains no rows")]
    Empty,
}

/// The loaded insurance dataset, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<InsuranceRecord>,
}

impl Dataset {
    /// Creates a dataset from already parsed records.
    #[must_use]
    pub const fn new(records: Vec<InsuranceRecord>) -> Self {
        Self { records }
    }

    #[must_use]
    pub fn records(&self) -> &[InsuranceRecord] {
        &self.records
    }

    /// Returns the charges column.
    #[must_use]
    pub fn targets(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.charges).collect()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Loads the dataset from a CSV file with a header row.
///
/// # Errors
///
/// Returns an error if the file cannot be opened, a row is malformed, or the
/// file has no data rows.
pub fn load_dataset(path: &Path) -> Result<Dataset, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let dataset = parse_dataset(file)?;
    debug!(path = %path.display(), rows = dataset.len(), "Loaded dataset");
    Ok(dataset)
}

/// Parses a dataset from any CSV source with a header row.
///
/// Columns are matched by header name, so their order does not matter and
/// extra columns are ignored.
///
/// # Errors
///
/// Returns an error if a row is malformed or the source has no data rows.
pub fn parse_dataset<R: Read>(reader: R) -> Result<Dataset, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.deserialize::<InsuranceRecord>() {
        let record = result.map_err(|source| LoadError::Csv {
            line: source.position().map_or(0, csv::Position::line),
            source,
        })?;

        // Header is line 1.
        let line = records.len() as u64 + 2;
        validate_record(&record).map_err(|message| LoadError::Invalid { line, message })?;
        records.push(record);
    }

    if records.is_empty() {
        return Err(LoadError::Empty);
    }

    Ok(Dataset::new(records))
}

fn validate_record(record: &InsuranceRecord) -> Result<(), String> {
    if !record.age.is_finite() || record.age < 0.0 {
        return Err(format!("age must be a non-negative number, got {}", record.age));
    }
    if !record.bmi.is_finite() || record.bmi <= 0.0 {
        return Err(format!("bmi must be a positive number, got {}", record.bmi));
    }
    if !record.charges.is_finite() {
        return Err(format!("charges must be finite, got {}", record.charges));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use insurance_structs::{Region, Sex, Smoker};

    use super::*;

    const SAMPLE: &str = "\
age,sex,bmi,children,smoker,region,charges
19,female,27.9,0,yes,southwest,16884.924
18,male,33.77,1,no,southeast,1725.5523
28,male,33,3,no,southeast,4449.462
";

    #[test]
    fn test_parse_sample() {
        let dataset = parse_dataset(SAMPLE.as_bytes()).unwrap();
        assert_eq!(dataset.len(), 3);

        let first = &dataset.records()[0];
        assert!((first.age - 19.0).abs() < f64::EPSILON);
        assert_eq!(first.sex, Sex::Female);
        assert_eq!(first.smoker, Smoker::Yes);
        assert_eq!(first.region, Region::Southwest);
        assert_eq!(first.children, 0);

        assert_eq!(dataset.targets(), vec![16884.924, 1725.5523, 4449.462]);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let csv = "charges,region,smoker,children,bmi,sex,age\n100.5,northwest,no,2,30.1,male,40\n";
        let dataset = parse_dataset(csv.as_bytes()).unwrap();
        assert_eq!(dataset.records()[0].region, Region::Northwest);
        assert_eq!(dataset.records()[0].children, 2);
    }

    #[test]
    fn test_unknown_category_is_rejected() {
        let csv = "age,sex,bmi,children,smoker,region,charges\n19,female,27.9,0,yes,midwest,100\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, LoadError::Csv { .. }), "got {err:?}");
        assert!(err.to_string().contains("midwest"));
    }

    #[test]
    fn test_missing_column_is_rejected() {
        let csv = "age,sex,bmi,children,smoker,region\n19,female,27.9,0,yes,southwest\n";
        assert!(matches!(
            parse_dataset(csv.as_bytes()),
            Err(LoadError::Csv { .. })
        ));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let csv = "age,sex,bmi,children,smoker,region,charges\n19,female,27.9,0,yes,southwest,100\n20,male,-3,0,no,northeast,200\n";
        let err = parse_dataset(csv.as_bytes()).unwrap_err();
        match err {
            LoadError::Invalid { line, message } => {
                assert_eq!(line, 3);
                assert!(message.contains("bmi"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = "age,sex,bmi,children,smoker,region,charges\n";
        assert!(matches!(parse_dataset(csv.as_bytes()), Err(LoadError::Empty)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let dataset = load_dataset(file.path()).unwrap();
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let err = load_dataset(Path::new("/nonexistent/insurance.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
