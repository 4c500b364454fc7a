//! Model registry: the immutable set of loaded classifier/vectorizer pairs.
//!
//! Built once at startup from a models directory and shared read-only behind
//! an `Arc`. A model whose artifacts fail to load is logged and left out; the
//! remaining models still serve.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use intentd_core::{HealthState, catalog};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::classifier::{ClassifierArtifact, IntentModel};
use crate::vectorizer::{Features, TfidfVectorizer};
use crate::{ArtifactError, ModelNotFound};

/// Vectorizer shared by all models that lack a dedicated one.
pub const SHARED_VECTORIZER_FILE: &str = "tfidf_vectorizer.json";

/// Locations of one model's artifact pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub vectorizer: PathBuf,
}

impl ArtifactPaths {
    /// `<dir>/<id>_model.json` plus `<dir>/<id>_vectorizer.json`, falling back
    /// to the shared `<dir>/tfidf_vectorizer.json`.
    pub fn resolve(dir: &Path, id: &str) -> Self {
        let dedicated = dir.join(format!("{id}_vectorizer.json"));
        let vectorizer = if dedicated.exists() {
            dedicated
        } else {
            dir.join(SHARED_VECTORIZER_FILE)
        };
        Self {
            classifier: dir.join(format!("{id}_model.json")),
            vectorizer,
        }
    }
}

/// A loaded model: classifier plus the vectorizer it was trained with.
pub struct ModelDescriptor {
    id: String,
    description: String,
    classifier: Arc<dyn IntentModel>,
    vectorizer: Arc<TfidfVectorizer>,
    source: Option<ArtifactPaths>,
    loaded_at: DateTime<Utc>,
}

impl ModelDescriptor {
    /// Pair a classifier with its vectorizer, checking their feature widths agree.
    pub fn new(
        id: impl Into<String>,
        classifier: Arc<dyn IntentModel>,
        vectorizer: Arc<TfidfVectorizer>,
    ) -> Result<Self, ArtifactError> {
        if vectorizer.n_features() != classifier.n_features() {
            return Err(ArtifactError::FeatureMismatch {
                vectorizer: vectorizer.n_features(),
                classifier: classifier.n_features(),
            });
        }
        let id = id.into();
        Ok(Self {
            description: catalog::describe(&id),
            id,
            classifier,
            vectorizer,
            source: None,
            loaded_at: Utc::now(),
        })
    }

    fn with_source(mut self, source: ArtifactPaths) -> Self {
        self.source = Some(source);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn classifier(&self) -> &dyn IntentModel {
        self.classifier.as_ref()
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn source(&self) -> Option<&ArtifactPaths> {
        self.source.as_ref()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Normalize text with this model's own vectorizer.
    pub fn transform(&self, text: &str) -> Features {
        self.vectorizer.transform(text)
    }
}

impl fmt::Debug for ModelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDescriptor")
            .field("id", &self.id)
            .field("kind", &self.classifier.kind())
            .field("classes", &self.classifier.classes().len())
            .field("features", &self.vectorizer.n_features())
            .finish()
    }
}

/// Outcome of loading a models directory.
#[derive(Debug, Default)]
pub struct LoadSummary {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, ArtifactError)>,
}

/// Immutable set of loaded models, in load order.
#[derive(Debug, Default)]
pub struct ModelRegistry {
    models: Vec<Arc<ModelDescriptor>>,
}

impl ModelRegistry {
    /// Build a registry from already-constructed descriptors.
    ///
    /// Later descriptors with a duplicate identifier are dropped.
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = ModelDescriptor>) -> Self {
        let mut models: Vec<Arc<ModelDescriptor>> = Vec::new();
        for d in descriptors {
            if models.iter().any(|m| m.id == d.id) {
                warn!(model = %d.id, "duplicate model identifier, keeping first");
                continue;
            }
            models.push(Arc::new(d));
        }
        Self { models }
    }

    /// Load every identifier in `ids` from `dir`.
    ///
    /// Per-model failures are logged and reported in the summary; they never
    /// abort the load.
    pub fn load_dir<S: AsRef<str>>(dir: &Path, ids: &[S]) -> (Self, LoadSummary) {
        let mut vectorizers: HashMap<PathBuf, Arc<TfidfVectorizer>> = HashMap::new();
        let mut descriptors = Vec::new();
        let mut summary = LoadSummary::default();

        for id in ids {
            let id = id.as_ref();
            let paths = ArtifactPaths::resolve(dir, id);
            match load_descriptor(id, &paths, &mut vectorizers) {
                Ok(descriptor) => {
                    info!(
                        model = id,
                        kind = descriptor.classifier.kind(),
                        classes = descriptor.classifier.classes().len(),
                        features = descriptor.vectorizer.n_features(),
                        "loaded model"
                    );
                    summary.loaded.push(id.to_string());
                    descriptors.push(descriptor);
                }
                Err(e) => {
                    warn!(model = id, error = %e, "failed to load model, skipping");
                    summary.failed.push((id.to_string(), e));
                }
            }
        }

        info!(
            loaded = summary.loaded.len(),
            failed = summary.failed.len(),
            dir = %dir.display(),
            "model registry ready"
        );
        (Self::from_descriptors(descriptors), summary)
    }

    /// Look up a model by identifier.
    pub fn load(&self, id: &str) -> Result<Arc<ModelDescriptor>, ModelNotFound> {
        self.models
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ModelNotFound {
                name: id.to_string(),
                available: self.list().into_iter().map(str::to_string).collect(),
            })
    }

    /// Identifiers of all available models, in load order.
    pub fn list(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelDescriptor>> {
        self.models.iter()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// `Degraded` when no model is available.
    pub fn health(&self) -> HealthState {
        if self.is_empty() {
            HealthState::Degraded
        } else {
            HealthState::Ok
        }
    }
}

fn load_descriptor(
    id: &str,
    paths: &ArtifactPaths,
    vectorizers: &mut HashMap<PathBuf, Arc<TfidfVectorizer>>,
) -> Result<ModelDescriptor, ArtifactError> {
    let artifact: ClassifierArtifact = read_json(&paths.classifier)?;
    let classifier = artifact.into_model()?;

    let vectorizer = match vectorizers.get(&paths.vectorizer) {
        Some(v) => Arc::clone(v),
        None => {
            let v: TfidfVectorizer = read_json(&paths.vectorizer)?;
            v.validate()?;
            let v = Arc::new(v);
            vectorizers.insert(paths.vectorizer.clone(), Arc::clone(&v));
            v
        }
    };

    Ok(ModelDescriptor::new(id, classifier, vectorizer)?.with_source(paths.clone()))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LinearSvm;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    fn shared_vectorizer(dir: &Path) {
        write(
            dir,
            SHARED_VECTORIZER_FILE,
            json!({
                "vocabulary": {"cancel": 0, "order": 1, "hello": 2},
                "idf": [1.0, 1.0, 1.0]
            }),
        );
    }

    fn svm_artifact() -> serde_json::Value {
        json!({
            "kind": "linear_svm",
            "classes": ["cancel_order", "greeting"],
            "coef": [[1.0, 1.0], [0.0, 0.0]],
            "intercept": [0.0, 0.0]
        })
    }

    fn nb_artifact(width: usize) -> serde_json::Value {
        json!({
            "kind": "multinomial_nb",
            "classes": ["cancel_order", "greeting"],
            "class_log_prior": [-0.69, -0.69],
            "feature_log_prob": [vec![-1.0; width], vec![-2.0; width]]
        })
    }

    fn svm_descriptor(id: &str) -> ModelDescriptor {
        let vectorizer = Arc::new(TfidfVectorizer::from_vocabulary(["cancel", "hello"]));
        let classifier = Arc::new(LinearSvm {
            classes: vec!["cancel_order".into(), "greeting".into()],
            coef: vec![vec![1.0, -1.0]],
            intercept: vec![0.0],
        });
        ModelDescriptor::new(id, classifier, vectorizer).unwrap()
    }

    #[test]
    fn resolve_prefers_dedicated_vectorizer() {
        let tmp = TempDir::new().unwrap();
        let shared = ArtifactPaths::resolve(tmp.path(), "naive_bayes");
        assert_eq!(shared.vectorizer, tmp.path().join("tfidf_vectorizer.json"));
        assert_eq!(shared.classifier, tmp.path().join("naive_bayes_model.json"));

        write(tmp.path(), "naive_bayes_vectorizer.json", json!({}));
        let dedicated = ArtifactPaths::resolve(tmp.path(), "naive_bayes");
        assert_eq!(
            dedicated.vectorizer,
            tmp.path().join("naive_bayes_vectorizer.json")
        );
    }

    #[test]
    fn load_dir_tolerates_partial_failure() {
        let tmp = TempDir::new().unwrap();
        shared_vectorizer(tmp.path());
        write(tmp.path(), "naive_bayes_model.json", nb_artifact(3));
        // Width 2 does not match the 3-term vectorizer.
        write(tmp.path(), "linear_svm_model.json", svm_artifact());

        let (registry, summary) = ModelRegistry::load_dir(
            tmp.path(),
            &["naive_bayes", "logistic_regression", "linear_svm"],
        );

        assert_eq!(registry.list(), ["naive_bayes"]);
        assert_eq!(summary.loaded, ["naive_bayes"]);
        assert_eq!(summary.failed.len(), 2);
        assert!(matches!(
            summary.failed[0],
            (ref id, ArtifactError::NotFound(_)) if id == "logistic_regression"
        ));
        assert!(matches!(
            summary.failed[1].1,
            ArtifactError::FeatureMismatch { vectorizer: 3, classifier: 2 }
        ));
        assert_eq!(registry.health(), HealthState::Ok);
    }

    #[test]
    fn load_dir_reports_parse_errors() {
        let tmp = TempDir::new().unwrap();
        shared_vectorizer(tmp.path());
        std::fs::write(tmp.path().join("naive_bayes_model.json"), b"not json").unwrap();

        let (registry, summary) = ModelRegistry::load_dir(tmp.path(), &["naive_bayes"]);
        assert!(registry.is_empty());
        assert!(matches!(summary.failed[0].1, ArtifactError::Parse { .. }));
    }

    #[test]
    fn load_dir_shares_one_vectorizer_handle_per_file() {
        let tmp = TempDir::new().unwrap();
        shared_vectorizer(tmp.path());
        write(tmp.path(), "naive_bayes_model.json", nb_artifact(3));
        write(tmp.path(), "other_nb_model.json", nb_artifact(3));

        let (registry, _) = ModelRegistry::load_dir(tmp.path(), &["naive_bayes", "other_nb"]);
        let a = registry.load("naive_bayes").unwrap();
        let b = registry.load("other_nb").unwrap();
        assert!(Arc::ptr_eq(&a.vectorizer, &b.vectorizer));
        assert_eq!(
            a.source().unwrap().vectorizer,
            tmp.path().join(SHARED_VECTORIZER_FILE)
        );
    }

    #[test]
    fn load_dir_empty_is_degraded() {
        let tmp = TempDir::new().unwrap();
        let (registry, summary) = ModelRegistry::load_dir(tmp.path(), &["naive_bayes"]);
        assert!(registry.is_empty());
        assert_eq!(registry.health(), HealthState::Degraded);
        assert_eq!(summary.failed.len(), 1);
    }

    #[test]
    fn unknown_identifier_is_model_not_found() {
        let registry = ModelRegistry::from_descriptors([svm_descriptor("linear_svm")]);
        let err = registry.load("unknown_model_xyz").unwrap_err();
        assert_eq!(err.name, "unknown_model_xyz");
        assert_eq!(err.available, ["linear_svm"]);
        assert!(err.to_string().contains("unknown_model_xyz"));
    }

    #[test]
    fn duplicate_identifiers_keep_first() {
        let mut first = svm_descriptor("linear_svm");
        first.description = "first".into();
        let mut second = svm_descriptor("linear_svm");
        second.description = "second".into();
        let registry = ModelRegistry::from_descriptors([first, second]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.load("linear_svm").unwrap().description(), "first");
    }

    #[test]
    fn descriptor_rejects_width_mismatch() {
        let vectorizer = Arc::new(TfidfVectorizer::from_vocabulary(["a", "b", "c"]));
        let classifier = Arc::new(LinearSvm {
            classes: vec!["x".into(), "y".into()],
            coef: vec![vec![1.0, -1.0]],
            intercept: vec![0.0],
        });
        assert!(matches!(
            ModelDescriptor::new("m", classifier, vectorizer),
            Err(ArtifactError::FeatureMismatch { vectorizer: 3, classifier: 2 })
        ));
    }

    #[test]
    fn descriptor_uses_catalog_description() {
        let d = svm_descriptor("linear_svm");
        assert_eq!(d.description(), "Linear Support Vector Machine");
        assert_eq!(d.transform("cancel it").entries(), &[(0, 1.0)]);
    }
}
