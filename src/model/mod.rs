//! Scaler and classifier used by the predictor, built on `linfa`.

mod forest;
mod scaler;

pub use forest::{argmax, ForestParams, RandomForest};
pub use scaler::StandardScaler;
