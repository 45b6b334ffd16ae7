use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    #[error("malformed input: {0}")]
    MalformedInput(String),
    #[error("Error reading from '{path}': {message}")]
    ReadError { path: PathBuf, message: String },
    #[error("Error writing to '{path}': {message}")]
    WriteError { path: PathBuf, message: String },
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
