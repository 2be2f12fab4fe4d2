use std::path::PathBuf;
use thiserror::Error;

/// Row-level failures while walking a tokenized file.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("row {row}: expected {expected} fields, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row}, column {column}: '{value}' is not a number")]
    InvalidNumber {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("row {row}: label '{value}' is not of the form category,biotype")]
    MalformedLabel { row: usize, value: String },

    #[error("expected at least {expected} numeric values, found {found}")]
    MissingValues { expected: usize, found: usize },
}

/// Arithmetic failures of the percentage and enrichment calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeriveError {
    #[error("sample '{sample}' has a zero total")]
    ZeroTotal { sample: String },

    #[error("sample '{sample}': genomic share of '{label}' is zero")]
    ZeroGenomicShare { sample: String, label: String },

    #[error("sample '{sample}': enrichment ratio of '{label}' is not positive")]
    NonPositiveRatio { sample: String, label: String },
}

#[derive(Error, Debug)]
pub enum ModuleError {
    /// No file matched the module's search patterns.
    #[error("{module}: no matching files found")]
    NoData { module: &'static str },

    #[error("{module}: failed to parse {}: {source}", .file.display())]
    Parse {
        module: &'static str,
        file: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{module}: {source}")]
    Derive {
        module: &'static str,
        #[source]
        source: DeriveError,
    },
}

impl ModuleError {
    pub fn is_no_data(&self) -> bool {
        matches!(self, ModuleError::NoData { .. })
    }
}
