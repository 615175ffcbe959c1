use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::classifier::{Classifier, LogisticModel};

pub const DEFAULT_MODELS_DIR: &str = "models";

const MODEL_SUFFIX: &str = "_model.json";
const FEATURES_SUFFIX: &str = "_features.json";

/// Disease types that get placeholder artifacts on first startup, with their
/// feature schemas in model input order.
const KNOWN_DISEASE_TYPES: [(&str, &[&str]); 3] = [
    (
        "diabetes",
        &[
            "age",
            "bloodPressure",
            "bmi",
            "diabetesPedigreeFunction",
            "glucose",
            "insulin",
            "pregnancies",
            "skinThickness",
        ],
    ),
    (
        "heart",
        &[
            "age", "sex", "cp", "trestbps", "chol", "fbs", "restecg", "thalach",
            "exang", "oldpeak", "slope", "ca", "thal",
        ],
    ),
    (
        "kidney",
        &[
            "age", "al", "ane", "appet", "ba", "bgr", "bp", "bu", "cad", "dm",
            "hemo", "htn", "pc", "pcc", "pcv", "pe", "pot", "rbc", "sc", "sg",
            "sod", "su", "wc",
        ],
    ),
];

/// One disease type's classifier plus the feature names it expects, in the
/// exact order the model consumes them.
pub struct ModelEntry {
    classifier: Arc<dyn Classifier>,
    feature_names: Vec<String>,
}

impl ModelEntry {
    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

/// Immutable disease-type -> (classifier, feature list) lookup, built once at
/// startup from the artifacts directory and shared read-only across requests.
pub struct ModelStore {
    entries: HashMap<String, ModelEntry>,
}

impl ModelStore {
    /// Startup path: seed placeholder artifacts for the known disease types,
    /// then load every artifact pair present on disk.
    pub fn bootstrap(dir: &Path) -> anyhow::Result<Self> {
        ensure_placeholder_artifacts(dir)?;
        Self::load(dir)
    }

    /// Load every `<type>_features.json` / `<type>_model.json` pair under
    /// `dir`. Types with only half the pair are skipped, surfacing later as
    /// not-found at request time.
    pub fn load(dir: &Path) -> anyhow::Result<Self> {
        let mut entries = HashMap::new();

        let listing = fs::read_dir(dir)
            .with_context(|| format!("reading models directory {}", dir.display()))?;
        for dirent in listing {
            let path = dirent?.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(disease_type) = file_name.strip_suffix(FEATURES_SUFFIX) else {
                continue;
            };

            let model_path = dir.join(format!("{disease_type}{MODEL_SUFFIX}"));
            if !model_path.exists() {
                log::warn!("{disease_type}: feature list present but model artifact missing, skipping");
                continue;
            }

            let feature_names: Vec<String> = read_json(&path)?;
            let model: LogisticModel = read_json(&model_path)?;

            log::info!(
                "loaded {disease_type} model ({} features, trained: {})",
                feature_names.len(),
                model.is_trained(),
            );
            entries.insert(
                disease_type.to_string(),
                ModelEntry {
                    classifier: Arc::new(model),
                    feature_names,
                },
            );
        }

        Ok(Self { entries })
    }

    pub fn entry(&self, disease_type: &str) -> Option<&ModelEntry> {
        self.entries.get(disease_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ModelEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Create the models directory and, for each known disease type, write the
/// feature-list artifact and an untrained model artifact — each only if
/// missing. Existing artifacts are never overwritten.
pub fn ensure_placeholder_artifacts(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating models directory {}", dir.display()))?;

    for (disease_type, feature_names) in KNOWN_DISEASE_TYPES {
        let features_path = dir.join(format!("{disease_type}{FEATURES_SUFFIX}"));
        if !features_path.exists() {
            let payload = serde_json::to_string_pretty(&feature_names)?;
            fs::write(&features_path, payload)
                .with_context(|| format!("writing {}", features_path.display()))?;
            log::info!("created placeholder feature list for {disease_type}");
        }

        let model_path = dir.join(format!("{disease_type}{MODEL_SUFFIX}"));
        if !model_path.exists() {
            let placeholder = LogisticModel::untrained(feature_names.len());
            let payload = serde_json::to_string_pretty(&placeholder)?;
            fs::write(&model_path, payload)
                .with_context(|| format!("writing {}", model_path.display()))?;
            log::info!("created placeholder model for {disease_type}");
        }
    }

    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading artifact {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing artifact {}", path.display()))
}
