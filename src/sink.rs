use crate::error::{Result, SmartCartError};
use crate::models::AnalysisResult;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the smart cart document in the user's home directory
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "smart_cart_calculation.json";

/// Where a finished analysis is persisted
pub trait ResultSink {
    fn write(&self, result: &AnalysisResult) -> Result<()>;

    /// Human-readable location shown in the run summary
    fn location(&self) -> String;
}

/// Writes the document as pretty-printed JSON to a fixed path
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl ResultSink for JsonFileSink {
    fn write(&self, result: &AnalysisResult) -> Result<()> {
        let content = serde_json::to_string_pretty(result)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| SmartCartError::output_write(&self.path, e))?;
            }
        }

        fs::write(&self.path, content).map_err(|e| SmartCartError::output_write(&self.path, e))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// Text served for the smart cart resource.
///
/// The saved document is returned verbatim; when nothing has been calculated
/// yet, a JSON object with an `error` field is returned instead.
pub fn read_saved_result(path: &Path) -> Result<String> {
    if !path.exists() {
        return Ok(json!({ "error": "No smart cart calculation found." }).to_string());
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse a previously saved document
pub fn load_saved_result(path: &Path) -> Result<Option<AnalysisResult>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let result =
        serde_json::from_str(&content).map_err(|e| SmartCartError::json_parse_error(path, e))?;
    Ok(Some(result))
}
