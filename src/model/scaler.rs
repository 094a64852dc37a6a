use linfa::prelude::*;
use linfa_preprocessing::linear_scaling::LinearScaler;
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Standard scaler fitted on a subset of the feature columns. Columns not
/// listed pass through untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    columns: Vec<usize>,
    fitted: Option<LinearScaler<f64>>,
}

impl StandardScaler {
    /// Scaler that leaves every column untouched.
    pub fn identity() -> Self {
        Self {
            columns: Vec::new(),
            fitted: None,
        }
    }

    /// Fits mean and standard deviation for each listed column.
    pub fn fit(features: &Array2<f64>, columns: &[usize]) -> Result<Self> {
        if columns.is_empty() {
            return Ok(Self::identity());
        }
        if let Some(&col) = columns.iter().find(|&&c| c >= features.ncols()) {
            return Err(AppError::FeatureMismatch {
                expected: features.ncols(),
                got: col + 1,
            });
        }

        let subset = DatasetBase::from(features.select(Axis(1), columns));
        let fitted = LinearScaler::standard()
            .fit(&subset)
            .map_err(|e| AppError::Model(e.to_string()))?;
        Ok(Self {
            columns: columns.to_vec(),
            fitted: Some(fitted),
        })
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Verifies the scaler fits a row of `width` columns.
    pub fn check(&self, width: usize) -> Result<()> {
        if let Some(&col) = self.columns.iter().find(|&&c| c >= width) {
            return Err(AppError::InvalidBundle(format!(
                "scaled column {col} is outside a {width}-column row"
            )));
        }
        match &self.fitted {
            None if self.columns.is_empty() => Ok(()),
            None => Err(AppError::InvalidBundle(format!(
                "{} scaled columns but no fitted scaler",
                self.columns.len()
            ))),
            Some(fitted) => {
                let n = self.columns.len();
                if fitted.offsets().len() != n || fitted.scales().len() != n {
                    return Err(AppError::InvalidBundle(format!(
                        "scaler holds {} offsets and {} scales for {n} columns",
                        fitted.offsets().len(),
                        fitted.scales().len()
                    )));
                }
                Ok(())
            }
        }
    }

    pub fn transform_row(&self, row: &mut [f64]) -> Result<()> {
        self.check(row.len())?;
        let Some(fitted) = &self.fitted else {
            return Ok(());
        };

        let subset = Array2::from_shape_fn((1, self.columns.len()), |(_, j)| row[self.columns[j]]);
        let scaled = fitted.transform(subset);
        for (j, &col) in self.columns.iter().enumerate() {
            row[col] = finite(scaled[[0, j]]);
        }
        Ok(())
    }

    pub fn transform(&self, mut features: Array2<f64>) -> Result<Array2<f64>> {
        self.check(features.ncols())?;
        let Some(fitted) = &self.fitted else {
            return Ok(features);
        };

        let scaled = fitted.transform(features.select(Axis(1), &self.columns));
        for (j, &col) in self.columns.iter().enumerate() {
            features
                .column_mut(col)
                .assign(&scaled.column(j).mapv(finite));
        }
        Ok(features)
    }
}

// constant training columns map to zero
fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}
