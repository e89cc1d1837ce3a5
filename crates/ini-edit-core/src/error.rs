use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    NotFound = 1,
    FileMissing = 2,
    InvalidArguments = 3,
    Io = 4,
    InvalidValue = 5,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::NotFound),
            2 => Some(Self::FileMissing),
            3 => Some(Self::InvalidArguments),
            4 => Some(Self::Io),
            5 => Some(Self::InvalidValue),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum EditError {
    #[error("configuration file '{}' does not exist", .path.display())]
    FileMissing { path: PathBuf },

    #[error("section '[{section}]' not found")]
    SectionNotFound { section: String },

    #[error("key '{key}' not found in section '[{section}]'")]
    KeyNotFound { section: String, key: String },

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid value: {0}")]
    InvalidValue(String),
}

impl EditError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::FileMissing { .. } => ExitCode::FileMissing,
            Self::SectionNotFound { .. } | Self::KeyNotFound { .. } => ExitCode::NotFound,
            Self::InvalidArguments(_) => ExitCode::InvalidArguments,
            Self::Io { .. } => ExitCode::Io,
            Self::InvalidValue(_) => ExitCode::InvalidValue,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
