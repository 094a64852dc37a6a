use std::path::PathBuf;

use thiserror::Error;

use crate::router::Page;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("file not found: {}", .0.display())]
    MissingAsset(PathBuf),

    #[error("CSV line {line}: {message}")]
    Csv { line: usize, message: String },

    #[error("invalid value for {field}: {message}")]
    InvalidInput { field: &'static str, message: String },

    #[error("unknown {field} value '{value}'")]
    UnknownCategory { field: &'static str, value: String },

    #[error("dataset contains no usable rows")]
    EmptyDataset,

    #[error("feature row has {got} columns, model expects {expected}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("model error: {0}")]
    Model(String),

    #[error("invalid model bundle: {0}")]
    InvalidBundle(String),

    #[error("cannot {action} from the {page:?} page")]
    InvalidTransition { page: Page, action: &'static str },

    #[error("input closed before the form was complete")]
    InputClosed,
}
