use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Error type shared by the analysis pipeline and its collaborators
#[derive(Debug)]
pub enum SmartCartError {
    /// File I/O error
    Io(io::Error),
    /// Malformed order dump or saved result
    JsonParse {
        file_path: String,
        source: serde_json::Error,
    },
    /// Date that could not be read (used for CLI overrides, orders are skipped instead)
    DateParse {
        input: String,
        expected_format: String,
    },
    /// Configuration error
    Config { message: String },
    /// Heuristic knob with an unusable value
    Validation { field: String, message: String },
    /// Order history source could not be read
    OrderSource { message: String },
    /// The result artifact could not be written
    OutputWrite { path: PathBuf, source: io::Error },
    /// Anything else
    Other { message: String },
}

impl fmt::Display for SmartCartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SmartCartError::Io(err) => write!(f, "I/O error: {}", err),
            SmartCartError::JsonParse { file_path, source } => {
                write!(f, "JSON parse error in {}: {}", file_path, source)
            }
            SmartCartError::DateParse {
                input,
                expected_format,
            } => write!(
                f,
                "Date parse error: '{}' (expected format: {})",
                input, expected_format
            ),
            SmartCartError::Config { message } => write!(f, "Configuration error: {}", message),
            SmartCartError::Validation { field, message } => {
                write!(f, "Validation error in field '{}': {}", field, message)
            }
            SmartCartError::OrderSource { message } => {
                write!(f, "Order history unavailable: {}", message)
            }
            SmartCartError::OutputWrite { path, source } => write!(
                f,
                "Failed to write smart cart result to {}: {}",
                path.display(),
                source
            ),
            SmartCartError::Other { message } => write!(f, "Error: {}", message),
        }
    }
}

impl std::error::Error for SmartCartError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SmartCartError::Io(err) => Some(err),
            SmartCartError::JsonParse { source, .. } => Some(source),
            SmartCartError::OutputWrite { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<io::Error> for SmartCartError {
    fn from(err: io::Error) -> Self {
        SmartCartError::Io(err)
    }
}

impl From<serde_json::Error> for SmartCartError {
    fn from(err: serde_json::Error) -> Self {
        SmartCartError::JsonParse {
            file_path: "unknown".to_string(),
            source: err,
        }
    }
}

impl From<serde_yaml::Error> for SmartCartError {
    fn from(err: serde_yaml::Error) -> Self {
        SmartCartError::Config {
            message: err.to_string(),
        }
    }
}

impl From<csv::Error> for SmartCartError {
    fn from(err: csv::Error) -> Self {
        SmartCartError::Other {
            message: format!("CSV error: {}", err),
        }
    }
}

pub type Result<T> = std::result::Result<T, SmartCartError>;

impl SmartCartError {
    pub fn json_parse_error(file_path: &Path, source: serde_json::Error) -> Self {
        Self::JsonParse {
            file_path: file_path.display().to_string(),
            source,
        }
    }

    pub fn date_parse_error(input: &str, expected_format: &str) -> Self {
        Self::DateParse {
            input: input.to_string(),
            expected_format: expected_format.to_string(),
        }
    }

    pub fn validation_error(field: &str, message: &str) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.to_string(),
        }
    }

    pub fn order_source(message: &str) -> Self {
        Self::OrderSource {
            message: message.to_string(),
        }
    }

    pub fn output_write(path: &Path, source: io::Error) -> Self {
        Self::OutputWrite {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl SmartCartError {
    pub fn detailed_message(&self) -> String {
        match self {
            SmartCartError::JsonParse { file_path, source } => format!(
                "Failed to parse JSON in '{}'\nError: {}\nThis usually means the order dump is truncated or was produced by another tool.",
                file_path, source
            ),
            SmartCartError::OrderSource { message } => format!(
                "Order history unavailable: {}\nExport your order history first, or point --orders at an existing dump.",
                message
            ),
            SmartCartError::OutputWrite { path, source } => format!(
                "Could not save the smart cart to '{}'\nError: {}\nCheck that the directory is writable or choose another path with --output.",
                path.display(),
                source
            ),
            _ => self.to_string(),
        }
    }
}
