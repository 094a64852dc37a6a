use crate::assets::ModelBundle;
use crate::encoder::{Answers, FeatureSchema};
use crate::error::Result;
use crate::model::argmax;

#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub bmi: f64,
    pub class_index: usize,
    /// Dataset label of the predicted class, e.g. `Obesity_Type_I`.
    pub class_name: String,
    pub probabilities: Vec<f64>,
    /// Highest class probability as a percentage.
    pub confidence: f64,
}

pub struct Predictor {
    bundle: ModelBundle,
}

impl Predictor {
    pub fn new(bundle: ModelBundle) -> Self {
        Self { bundle }
    }

    pub fn schema(&self) -> FeatureSchema {
        self.bundle.schema
    }

    pub fn classes(&self) -> &[String] {
        &self.bundle.classes
    }

    /// Encodes the answers, scales the numeric subset and classifies.
    pub fn predict(&self, answers: &Answers) -> Result<Prediction> {
        let bmi = answers.bmi()?;
        let mut row = self.bundle.schema.encode(answers)?;
        self.bundle.scaler.transform_row(&mut row)?;

        let probabilities = self.bundle.forest.predict_proba(&row)?;
        let class_index = argmax(&probabilities);
        let confidence = probabilities.get(class_index).copied().unwrap_or(0.0) * 100.0;
        let class_name = self
            .bundle
            .classes
            .get(class_index)
            .cloned()
            .unwrap_or_default();

        Ok(Prediction {
            bmi,
            class_index,
            class_name,
            probabilities,
            confidence,
        })
    }
}
