//! Obesity level checker.
//!
//! Collects physical data and lifestyle habits, derives BMI, encodes a fixed
//! feature row and classifies it with a random forest trained on the
//! obesity-levels dataset.

pub mod app;
pub mod assets;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod error;
pub mod form;
pub mod model;
pub mod predictor;
pub mod report;
pub mod router;

pub use error::{AppError, Result};
