//! Random forest classifier.
//!
//! Bags `linfa_trees` decision trees, each grown on a bootstrap sample of the
//! training rows with Gini splits. Class probabilities are the share of trees
//! voting for each class.

use linfa::prelude::*;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub seed: Option<u64>,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree<f64, usize>>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fits the forest on `features` (one row per sample) and class indices
    /// in `0..n_classes`.
    pub fn fit(
        features: &Array2<f64>,
        labels: &[usize],
        n_classes: usize,
        params: &ForestParams,
    ) -> Result<Self> {
        let n = features.nrows();
        if n == 0 || n_classes == 0 {
            return Err(AppError::EmptyDataset);
        }
        if labels.len() != n {
            return Err(AppError::FeatureMismatch {
                expected: n,
                got: labels.len(),
            });
        }
        if let Some(&label) = labels.iter().find(|&&l| l >= n_classes) {
            return Err(AppError::Model(format!(
                "class index {label} outside {n_classes} classes"
            )));
        }

        let seed = params.seed.unwrap_or_else(|| rand::rng().random());
        let mut rng = StdRng::seed_from_u64(seed);
        debug!(seed, trees = params.n_trees.max(1), "growing forest");

        let mut trees = Vec::with_capacity(params.n_trees.max(1));
        for _ in 0..params.n_trees.max(1) {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
            let records = features.select(Axis(0), &bootstrap);
            let targets: Array1<usize> = bootstrap.iter().map(|&i| labels[i]).collect();

            let tree = DecisionTree::<f64, usize>::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(params.max_depth)
                .min_weight_split(params.min_samples_split.max(1) as f32)
                .fit(&Dataset::new(records, targets))
                .map_err(|e| AppError::Model(e.to_string()))?;
            trees.push(tree);
        }

        Ok(Self {
            trees,
            n_classes,
            n_features: features.ncols(),
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Verifies a deserialized forest against the row width and class count
    /// it will be used with.
    pub fn check(&self, width: usize, n_classes: usize) -> Result<()> {
        if self.trees.is_empty() {
            return Err(AppError::InvalidBundle("forest has no trees".into()));
        }
        if self.n_features != width {
            return Err(AppError::FeatureMismatch {
                expected: width,
                got: self.n_features,
            });
        }
        if self.n_classes != n_classes {
            return Err(AppError::InvalidBundle(format!(
                "forest predicts {} classes, bundle names {n_classes}",
                self.n_classes
            )));
        }
        for tree in &self.trees {
            if let Some(feature) = tree.features().into_iter().find(|&f| f >= width) {
                return Err(AppError::InvalidBundle(format!(
                    "tree splits on feature {feature} of a {width}-column row"
                )));
            }
        }
        Ok(())
    }

    /// Share of trees voting for each class.
    pub fn predict_proba(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_features {
            return Err(AppError::FeatureMismatch {
                expected: self.n_features,
                got: row.len(),
            });
        }

        let x = Array2::from_shape_fn((1, row.len()), |(_, j)| row[j]);
        let mut votes = vec![0.0; self.n_classes];
        for tree in &self.trees {
            let predicted: Array1<usize> = tree.predict(&x);
            for &class in predicted.iter() {
                let slot = votes.get_mut(class).ok_or_else(|| {
                    AppError::InvalidBundle(format!(
                        "tree voted for class {class} of {}",
                        self.n_classes
                    ))
                })?;
                *slot += 1.0;
            }
        }

        let n_trees = self.trees.len().max(1) as f64;
        votes.iter_mut().for_each(|v| *v /= n_trees);
        Ok(votes)
    }

    /// Most probable class; ties go to the lowest index.
    pub fn predict(&self, row: &[f64]) -> Result<usize> {
        let proba = self.predict_proba(row)?;
        Ok(argmax(&proba))
    }
}

pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}
