//! Error taxonomy for the shipment cleaning pipeline.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// The pipeline stage an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    Derive,
    Aggregate,
    Write,
    Report,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load",
            Stage::Derive => "derive",
            Stage::Aggregate => "aggregate",
            Stage::Write => "write",
            Stage::Report => "report",
        };
        f.write_str(name)
    }
}

/// Coarse classification of a [`PipelineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    FileNotFound,
    Parse,
    MissingColumn,
    InvalidDate,
    InvalidValue,
    Io,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[{stage}] input file not found: {}", .path.display())]
    FileNotFound { stage: Stage, path: PathBuf },

    #[error("[{stage}] malformed CSV in {}: {message}", .path.display())]
    Parse {
        stage: Stage,
        path: PathBuf,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    #[error("[{stage}] required column '{column}' is missing")]
    MissingColumn { stage: Stage, column: String },

    #[error("[{stage}] row {row}: {reason}")]
    InvalidDate {
        stage: Stage,
        row: usize,
        reason: String,
    },

    #[error("[{stage}] row {row}: column '{column}' has non-numeric value '{value}'")]
    InvalidValue {
        stage: Stage,
        row: usize,
        column: String,
        value: String,
    },

    #[error("[{stage}] I/O failure on {}: {source}", .path.display())]
    Io {
        stage: Stage,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::FileNotFound { .. } => ErrorKind::FileNotFound,
            PipelineError::Parse { .. } => ErrorKind::Parse,
            PipelineError::MissingColumn { .. } => ErrorKind::MissingColumn,
            PipelineError::InvalidDate { .. } => ErrorKind::InvalidDate,
            PipelineError::InvalidValue { .. } => ErrorKind::InvalidValue,
            PipelineError::Io { .. } => ErrorKind::Io,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::FileNotFound { stage, .. }
            | PipelineError::Parse { stage, .. }
            | PipelineError::MissingColumn { stage, .. }
            | PipelineError::InvalidDate { stage, .. }
            | PipelineError::InvalidValue { stage, .. }
            | PipelineError::Io { stage, .. } => *stage,
        }
    }

    pub(crate) fn io(stage: Stage, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            stage,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
