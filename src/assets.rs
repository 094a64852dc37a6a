//! Model bundle persistence and the train-on-the-fly cache.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::dataset::{self, TrainingSet};
use crate::encoder::FeatureSchema;
use crate::error::{AppError, Result};
use crate::model::{ForestParams, RandomForest, StandardScaler};

/// Everything needed to turn a feature row into a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub schema: FeatureSchema,
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    /// Dataset label per class index.
    pub classes: Vec<String>,
    /// Forest parameters the model was trained with.
    #[serde(default)]
    pub params: ForestParams,
    pub trained_at: String,
    pub data_hash: Option<String>,
}

impl ModelBundle {
    /// Fits the scaler on the schema's numeric columns, then the forest on
    /// the scaled matrix.
    pub fn train(set: &TrainingSet, schema: FeatureSchema, params: &ForestParams) -> Result<Self> {
        if set.features.ncols() != schema.width() {
            return Err(AppError::FeatureMismatch {
                expected: schema.width(),
                got: set.features.ncols(),
            });
        }

        let started = Instant::now();
        let scaler = StandardScaler::fit(&set.features, schema.numeric_columns())?;
        let features = scaler.transform(set.features.clone())?;

        let forest = RandomForest::fit(&features, &set.labels, set.classes.len(), params)?;
        info!(
            schema = schema.name(),
            rows = features.nrows(),
            trees = forest.n_trees(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "trained random forest"
        );

        Ok(Self {
            schema,
            scaler,
            forest,
            classes: set.classes.clone(),
            params: params.clone(),
            trained_at: chrono::Utc::now().to_rfc3339(),
            data_hash: None,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        info!(path = %path.display(), "model saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::MissingAsset(path.to_path_buf()));
        }
        let reader = BufReader::new(File::open(path)?);
        let bundle: Self = serde_json::from_reader(reader)?;
        bundle.check()?;
        info!(path = %path.display(), schema = bundle.schema.name(), "model loaded");
        Ok(bundle)
    }

    /// Checks that the scaler and forest fit the schema's row and the class
    /// list, so a damaged file fails here instead of at prediction time.
    pub fn check(&self) -> Result<()> {
        let width = self.schema.width();
        self.scaler.check(width)?;
        self.forest.check(width, self.classes.len())?;
        if self.classes.is_empty() {
            return Err(AppError::InvalidBundle("bundle names no classes".into()));
        }
        Ok(())
    }
}

/// md5 of the file contents, hex encoded.
pub fn file_hash(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(format!("{:x}", md5::compute(bytes)))
}

/// Cache file for a schema, dataset hash and forest parameters:
/// `<schema>_model_<data hash>_<params hash>.json`.
pub fn cache_path(
    models_dir: &Path,
    schema: FeatureSchema,
    data_hash: &str,
    params: &ForestParams,
) -> Result<PathBuf> {
    let params_hash = format!("{:x}", md5::compute(serde_json::to_vec(params)?));
    Ok(models_dir.join(format!(
        "{}_model_{}_{}.json",
        schema.name(),
        data_hash,
        &params_hash[..8]
    )))
}

/// Returns the cached model for the configured dataset, training and caching
/// one when no usable cache file exists.
pub fn load_or_train(config: &Config, schema: FeatureSchema) -> Result<ModelBundle> {
    let data_path = config.dataset_path.as_path();
    if !data_path.exists() {
        return Err(AppError::MissingAsset(data_path.to_path_buf()));
    }

    let hash = file_hash(data_path)?;
    let cached = cache_path(&config.models_dir, schema, &hash, &config.forest)?;

    if cached.exists() {
        match ModelBundle::load(&cached) {
            Ok(bundle) if bundle.schema == schema && bundle.params == config.forest => {
                debug!(path = %cached.display(), "using cached model");
                return Ok(bundle);
            }
            Ok(_) => warn!(path = %cached.display(), "cached model was trained differently, retraining"),
            Err(e) => warn!(path = %cached.display(), error = %e, "could not load cached model, retraining"),
        }
    }

    let records = dataset::load_csv(data_path)?;
    let set = dataset::encode(&records, schema)?;
    let mut bundle = ModelBundle::train(&set, schema, &config.forest)?;
    bundle.data_hash = Some(hash);

    if let Err(e) = bundle.save(&cached) {
        warn!(path = %cached.display(), error = %e, "could not cache trained model");
    }
    Ok(bundle)
}

/// Deletes cached `<schema>_model_*.json` files, returning how many were removed.
pub fn clear_cache(models_dir: &Path) -> Result<usize> {
    let entries = match std::fs::read_dir(models_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let is_cache = name.ends_with(".json")
            && (name.starts_with("full_model_") || name.starts_with("compact_model_"));
        if is_cache {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!(file = name, "removed cached model");
                    removed += 1;
                }
                Err(e) => warn!(file = name, error = %e, "could not remove cached model"),
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::Answers;
    use crate::dataset::Record;

    fn tiny_set(schema: FeatureSchema) -> TrainingSet {
        let records = vec![
            Record {
                answers: Answers {
                    weight: 50.0,
                    ..Answers::default()
                },
                label: "Normal_Weight".into(),
            },
            Record {
                answers: Answers {
                    weight: 120.0,
                    ..Answers::default()
                },
                label: "Obesity_Type_II".into(),
            },
        ];
        dataset::encode(&records, schema).unwrap()
    }

    fn params() -> ForestParams {
        ForestParams {
            n_trees: 5,
            seed: Some(1),
            ..ForestParams::default()
        }
    }

    #[test]
    fn save_then_load_restores_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/model.json");
        let bundle = ModelBundle::train(&tiny_set(FeatureSchema::Full), FeatureSchema::Full, &params())
            .unwrap();

        bundle.save(&path).unwrap();
        let loaded = ModelBundle::load(&path).unwrap();
        assert_eq!(loaded.classes, bundle.classes);
        assert_eq!(loaded.schema, FeatureSchema::Full);
        assert_eq!(loaded.scaler.columns(), bundle.scaler.columns());
        assert_eq!(loaded.forest.n_trees(), 5);
        assert_eq!(loaded.params, params());
        assert_eq!(
            serde_json::to_string(&loaded).unwrap(),
            serde_json::to_string(&bundle).unwrap()
        );
    }

    fn damaged(edit: impl FnOnce(&mut serde_json::Value)) -> Result<ModelBundle> {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let bundle = ModelBundle::train(&tiny_set(FeatureSchema::Full), FeatureSchema::Full, &params())
            .unwrap();
        let mut json = serde_json::to_value(&bundle).unwrap();
        edit(&mut json);
        std::fs::write(&path, serde_json::to_vec(&json).unwrap()).unwrap();
        ModelBundle::load(&path)
    }

    #[test]
    fn scaler_column_outside_row_fails_to_load() {
        let result = damaged(|json| json["scaler"]["columns"][0] = 99.into());
        assert!(matches!(result, Err(AppError::InvalidBundle(_))));
    }

    #[test]
    fn scaler_with_missing_columns_fails_to_load() {
        let result = damaged(|json| {
            json["scaler"]["columns"].as_array_mut().unwrap().pop();
        });
        assert!(matches!(result, Err(AppError::InvalidBundle(_))));
    }

    #[test]
    fn class_list_must_match_forest() {
        let result = damaged(|json| {
            json["classes"].as_array_mut().unwrap().push("Extra".into());
        });
        assert!(matches!(result, Err(AppError::InvalidBundle(_))));
    }

    #[test]
    fn forest_without_trees_fails_to_load() {
        let result = damaged(|json| json["forest"]["trees"] = serde_json::json!([]));
        assert!(matches!(result, Err(AppError::InvalidBundle(_))));
    }

    #[test]
    fn schema_swap_fails_to_load() {
        let result = damaged(|json| json["schema"] = "compact".into());
        assert!(result.is_err());
    }

    #[test]
    fn cache_path_depends_on_forest_params() {
        let dir = Path::new("models");
        let a = cache_path(dir, FeatureSchema::Full, "abc", &params()).unwrap();
        let b = cache_path(
            dir,
            FeatureSchema::Full,
            "abc",
            &ForestParams {
                n_trees: 3,
                ..params()
            },
        )
        .unwrap();
        assert_ne!(a, b);
        assert_eq!(a, cache_path(dir, FeatureSchema::Full, "abc", &params()).unwrap());
        let name = a.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("full_model_abc_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn missing_model_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(matches!(ModelBundle::load(&path), Err(AppError::MissingAsset(p)) if p == path));
    }

    #[test]
    fn compact_bundle_has_identity_scaler() {
        let bundle =
            ModelBundle::train(&tiny_set(FeatureSchema::Compact), FeatureSchema::Compact, &params())
                .unwrap();
        assert!(bundle.scaler.columns().is_empty());
    }

    #[test]
    fn schema_width_mismatch_is_rejected() {
        let set = tiny_set(FeatureSchema::Compact);
        assert!(matches!(
            ModelBundle::train(&set, FeatureSchema::Full, &params()),
            Err(AppError::FeatureMismatch { expected: 17, got: 11 })
        ));
    }

    #[test]
    fn clear_cache_only_touches_cached_models() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("full_model_abc.json"), "{}").unwrap();
        std::fs::write(dir.path().join("compact_model_def.json"), "{}").unwrap();
        std::fs::write(dir.path().join("obesity_model.json"), "{}").unwrap();

        assert_eq!(clear_cache(dir.path()).unwrap(), 2);
        assert!(dir.path().join("obesity_model.json").exists());
        assert_eq!(clear_cache(&dir.path().join("missing")).unwrap(), 0);
    }
}
