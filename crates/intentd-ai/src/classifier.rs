//! Linear intent classifiers.
//!
//! Each serialized classifier carries its class labels and fitted weights.
//! The three supported variants share the [`IntentModel`] capability so the
//! prediction service never needs to know which one it holds:
//!
//! - multinomial naive Bayes (probabilistic)
//! - logistic regression, binary / multinomial / one-vs-rest (probabilistic)
//! - linear SVM (decision scores only, no probabilities)
//!
//! Ties between classes resolve to the class listed first in the artifact.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::vectorizer::Features;
use crate::{ArtifactError, ModelError};

/// Scoring capability shared by every classifier variant.
pub trait IntentModel: Send + Sync {
    /// Short variant name, e.g. `"multinomial_nb"`.
    fn kind(&self) -> &'static str;

    /// Class labels in artifact order.
    fn classes(&self) -> &[String];

    /// Width of the feature vectors this model accepts.
    fn n_features(&self) -> usize;

    /// Predict the single best label.
    fn predict_label(&self, features: &Features) -> Result<String, ModelError>;

    /// Per-class probabilities aligned with [`classes`](Self::classes), or `None`
    /// when the model has no probability output.
    fn predict_probabilities(&self, features: &Features) -> Result<Option<Vec<f64>>, ModelError> {
        let _ = features;
        Ok(None)
    }
}

/// On-disk classifier artifact, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierArtifact {
    MultinomialNb(MultinomialNb),
    LogisticRegression(LogisticRegression),
    LinearSvm(LinearSvm),
}

impl ClassifierArtifact {
    /// Validate shapes and wrap as a shareable model handle.
    pub fn into_model(self) -> Result<Arc<dyn IntentModel>, ArtifactError> {
        let model: Arc<dyn IntentModel> = match self {
            Self::MultinomialNb(m) => {
                m.validate()?;
                Arc::new(m)
            }
            Self::LogisticRegression(m) => {
                m.validate()?;
                Arc::new(m)
            }
            Self::LinearSvm(m) => {
                m.validate()?;
                Arc::new(m)
            }
        };
        Ok(model)
    }
}

// ── Multinomial naive Bayes ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultinomialNb {
    pub classes: Vec<String>,
    /// log P(class), one per class.
    pub class_log_prior: Vec<f64>,
    /// log P(feature | class), `[n_classes][n_features]`.
    pub feature_log_prob: Vec<Vec<f64>>,
}

impl MultinomialNb {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        check_classes(&self.classes)?;
        check_len("class_log_prior", self.class_log_prior.len(), self.classes.len())?;
        check_len("feature_log_prob", self.feature_log_prob.len(), self.classes.len())?;
        check_rectangular("feature_log_prob", &self.feature_log_prob)
    }

    fn joint_log_likelihood(&self, features: &Features) -> Result<Vec<f64>, ModelError> {
        self.feature_log_prob
            .iter()
            .zip(&self.class_log_prior)
            .map(|(row, prior)| Ok(prior + features.dot(row)?))
            .collect()
    }
}

impl IntentModel for MultinomialNb {
    fn kind(&self) -> &'static str {
        "multinomial_nb"
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        row_width(&self.feature_log_prob)
    }

    fn predict_label(&self, features: &Features) -> Result<String, ModelError> {
        let jll = self.joint_log_likelihood(features)?;
        label_at(&self.classes, argmax(&jll))
    }

    fn predict_probabilities(&self, features: &Features) -> Result<Option<Vec<f64>>, ModelError> {
        let jll = self.joint_log_likelihood(features)?;
        Ok(Some(softmax(&jll)))
    }
}

// ── Logistic regression ──

/// How multiclass logistic regression scores were fitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    #[default]
    Multinomial,
    Ovr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub classes: Vec<String>,
    /// `[1][n_features]` for binary problems, `[n_classes][n_features]` otherwise.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
    #[serde(default)]
    pub multi_class: MultiClass,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        check_classes(&self.classes)?;
        check_linear_shape(&self.classes, &self.coef, &self.intercept)
    }

    fn probabilities(&self, features: &Features) -> Result<Vec<f64>, ModelError> {
        let scores = decision_function(&self.coef, &self.intercept, features)?;
        if is_binary(&self.coef) {
            let p = sigmoid(scores[0]);
            return Ok(vec![1.0 - p, p]);
        }
        Ok(match self.multi_class {
            MultiClass::Multinomial => softmax(&scores),
            MultiClass::Ovr => {
                let raw: Vec<f64> = scores.iter().map(|&s| sigmoid(s)).collect();
                let total: f64 = raw.iter().sum();
                if total > 0.0 {
                    raw.iter().map(|p| p / total).collect()
                } else {
                    vec![1.0 / raw.len() as f64; raw.len()]
                }
            }
        })
    }
}

impl IntentModel for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        row_width(&self.coef)
    }

    fn predict_label(&self, features: &Features) -> Result<String, ModelError> {
        let scores = decision_function(&self.coef, &self.intercept, features)?;
        label_at(&self.classes, linear_choice(&self.coef, &scores))
    }

    fn predict_probabilities(&self, features: &Features) -> Result<Option<Vec<f64>>, ModelError> {
        self.probabilities(features).map(Some)
    }
}

// ── Linear SVM ──

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSvm {
    pub classes: Vec<String>,
    /// `[1][n_features]` for binary problems, `[n_classes][n_features]` otherwise.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

impl LinearSvm {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        check_classes(&self.classes)?;
        check_linear_shape(&self.classes, &self.coef, &self.intercept)
    }
}

impl IntentModel for LinearSvm {
    fn kind(&self) -> &'static str {
        "linear_svm"
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn n_features(&self) -> usize {
        row_width(&self.coef)
    }

    fn predict_label(&self, features: &Features) -> Result<String, ModelError> {
        let scores = decision_function(&self.coef, &self.intercept, features)?;
        label_at(&self.classes, linear_choice(&self.coef, &scores))
    }
}

// ── Scoring helpers ──

fn decision_function(
    coef: &[Vec<f64>],
    intercept: &[f64],
    features: &Features,
) -> Result<Vec<f64>, ModelError> {
    coef.iter()
        .zip(intercept)
        .map(|(row, b)| Ok(features.dot(row)? + b))
        .collect()
}

fn is_binary(coef: &[Vec<f64>]) -> bool {
    coef.len() == 1
}

/// Binary models pick the second class only on a strictly positive score.
fn linear_choice(coef: &[Vec<f64>], scores: &[f64]) -> Option<usize> {
    if is_binary(coef) {
        scores.first().map(|&s| usize::from(s > 0.0))
    } else {
        argmax(scores)
    }
}

/// Index of the first maximum.
fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

fn label_at(classes: &[String], idx: Option<usize>) -> Result<String, ModelError> {
    idx.and_then(|i| classes.get(i))
        .cloned()
        .ok_or(ModelError::NoScores)
}

/// Log-sum-exp stabilized softmax.
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let total: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

fn row_width(rows: &[Vec<f64>]) -> usize {
    rows.first().map(Vec::len).unwrap_or(0)
}

// ── Shape validation ──

fn check_classes(classes: &[String]) -> Result<(), ArtifactError> {
    if classes.is_empty() {
        return Err(ArtifactError::Invalid("classifier has no classes".into()));
    }
    Ok(())
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<(), ArtifactError> {
    if actual != expected {
        return Err(ArtifactError::Invalid(format!(
            "{field} has {actual} rows, expected {expected}"
        )));
    }
    Ok(())
}

fn check_rectangular(field: &str, rows: &[Vec<f64>]) -> Result<(), ArtifactError> {
    let width = row_width(rows);
    if width == 0 {
        return Err(ArtifactError::Invalid(format!("{field} has no features")));
    }
    if let Some(i) = rows.iter().position(|r| r.len() != width) {
        return Err(ArtifactError::Invalid(format!(
            "{field} row {i} has {} features, expected {width}",
            rows[i].len()
        )));
    }
    Ok(())
}

fn check_linear_shape(
    classes: &[String],
    coef: &[Vec<f64>],
    intercept: &[f64],
) -> Result<(), ArtifactError> {
    if is_binary(coef) {
        if classes.len() != 2 {
            return Err(ArtifactError::Invalid(format!(
                "single coef row requires 2 classes, found {}",
                classes.len()
            )));
        }
    } else {
        check_len("coef", coef.len(), classes.len())?;
    }
    check_len("intercept", intercept.len(), coef.len())?;
    check_rectangular("coef", coef)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classes(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn nb() -> MultinomialNb {
        let prior = (1.0f64 / 3.0).ln();
        MultinomialNb {
            classes: classes(&["shipping_inquiry", "cancel_order", "greeting"]),
            class_log_prior: vec![prior; 3],
            feature_log_prob: vec![
                vec![-0.5, -3.0, -3.0],
                vec![-3.0, -0.5, -3.0],
                vec![-3.0, -3.0, -0.5],
            ],
        }
    }

    fn svm() -> LinearSvm {
        LinearSvm {
            classes: classes(&["shipping_inquiry", "cancel_order", "greeting"]),
            coef: vec![
                vec![1.0, -0.5, -0.5],
                vec![-0.5, 1.0, -0.5],
                vec![-0.5, -0.5, 1.0],
            ],
            intercept: vec![0.0, 0.0, 0.0],
        }
    }

    #[test]
    fn argmax_first_maximum_wins() {
        assert_eq!(argmax(&[1.0, 3.0, 3.0]), Some(1));
        assert_eq!(argmax(&[0.0, 0.0]), Some(0));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn softmax_sums_to_one_and_is_stable() {
        let p = softmax(&[1000.0, 1000.0, 999.0]);
        let total: f64 = p.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!((p[0] - p[1]).abs() < 1e-12);
        assert!(p[2] < p[0]);
    }

    #[test]
    fn sigmoid_symmetric() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(3.0) + sigmoid(-3.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(-800.0) >= 0.0);
    }

    #[test]
    fn naive_bayes_picks_dominant_feature() {
        let m = nb();
        let f = Features::from_dense(&[0.0, 1.0, 0.0]);
        assert_eq!(m.predict_label(&f).unwrap(), "cancel_order");

        let p = m.predict_probabilities(&f).unwrap().unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        assert!(p[1] > p[0] && p[1] > p[2]);
    }

    #[test]
    fn naive_bayes_empty_features_tie_break_to_first_class() {
        let m = nb();
        let f = Features::from_dense(&[0.0, 0.0, 0.0]);
        assert_eq!(m.predict_label(&f).unwrap(), "shipping_inquiry");
        let p = m.predict_probabilities(&f).unwrap().unwrap();
        assert!(p.iter().all(|x| (x - 1.0 / 3.0).abs() < 1e-9));
    }

    #[test]
    fn naive_bayes_rejects_wrong_width() {
        let m = nb();
        let f = Features::from_dense(&[1.0, 0.0]);
        assert!(matches!(
            m.predict_label(&f),
            Err(ModelError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn logistic_binary_uses_sigmoid() {
        let m = LogisticRegression {
            classes: classes(&["negative", "positive"]),
            coef: vec![vec![2.0, -2.0]],
            intercept: vec![0.0],
            multi_class: MultiClass::Multinomial,
        };
        m.validate().unwrap();

        let pos = Features::from_dense(&[1.0, 0.0]);
        assert_eq!(m.predict_label(&pos).unwrap(), "positive");
        let p = m.predict_probabilities(&pos).unwrap().unwrap();
        assert!((p[1] - sigmoid(2.0)).abs() < 1e-12);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-12);

        let neg = Features::from_dense(&[0.0, 1.0]);
        assert_eq!(m.predict_label(&neg).unwrap(), "negative");

        // Zero score falls to the first class.
        let zero = Features::from_dense(&[0.0, 0.0]);
        assert_eq!(m.predict_label(&zero).unwrap(), "negative");
    }

    #[test]
    fn logistic_multinomial_label_matches_max_probability() {
        let m = LogisticRegression {
            classes: classes(&["a", "b", "c"]),
            coef: vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.5, 0.5]],
            intercept: vec![0.0, 0.0, 0.1],
            multi_class: MultiClass::Multinomial,
        };
        let f = Features::from_dense(&[0.2, 0.9]);
        let label = m.predict_label(&f).unwrap();
        let p = m.predict_probabilities(&f).unwrap().unwrap();
        assert_eq!(label, m.classes[argmax(&p).unwrap()]);
        assert_eq!(label, "b");
    }

    #[test]
    fn logistic_ovr_normalizes() {
        let m = LogisticRegression {
            classes: classes(&["a", "b", "c"]),
            coef: vec![vec![3.0], vec![-1.0], vec![0.0]],
            intercept: vec![0.0, 0.0, 0.0],
            multi_class: MultiClass::Ovr,
        };
        let p = m
            .predict_probabilities(&Features::from_dense(&[1.0]))
            .unwrap()
            .unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!(p[0] > p[2] && p[2] > p[1]);
    }

    #[test]
    fn svm_has_no_probabilities() {
        let m = svm();
        let f = Features::from_dense(&[0.0, 0.0, 1.0]);
        assert_eq!(m.predict_label(&f).unwrap(), "greeting");
        assert!(m.predict_probabilities(&f).unwrap().is_none());
    }

    #[test]
    fn svm_binary_threshold() {
        let m = LinearSvm {
            classes: classes(&["no", "yes"]),
            coef: vec![vec![1.0]],
            intercept: vec![-0.5],
        };
        assert_eq!(m.predict_label(&Features::from_dense(&[1.0])).unwrap(), "yes");
        assert_eq!(m.predict_label(&Features::from_dense(&[0.5])).unwrap(), "no");
    }

    #[test]
    fn validate_rejects_bad_shapes() {
        let mut m = svm();
        m.intercept.pop();
        assert!(matches!(m.validate(), Err(ArtifactError::Invalid(_))));

        let mut m = svm();
        m.coef[2].push(0.0);
        assert!(m.validate().is_err());

        let m = LinearSvm {
            classes: classes(&["a", "b", "c"]),
            coef: vec![vec![1.0]],
            intercept: vec![0.0],
        };
        assert!(m.validate().is_err());

        let mut m = nb();
        m.classes.clear();
        assert!(m.validate().is_err());
    }

    #[test]
    fn artifact_tagged_by_kind() {
        let json = r#"{
            "kind": "linear_svm",
            "classes": ["no", "yes"],
            "coef": [[1.0, -1.0]],
            "intercept": [0.0]
        }"#;
        let artifact: ClassifierArtifact = serde_json::from_str(json).unwrap();
        let model = artifact.into_model().unwrap();
        assert_eq!(model.kind(), "linear_svm");
        assert_eq!(model.n_features(), 2);
        assert_eq!(model.classes(), ["no", "yes"]);
    }

    #[test]
    fn artifact_logistic_defaults_to_multinomial() {
        let json = r#"{
            "kind": "logistic_regression",
            "classes": ["a", "b", "c"],
            "coef": [[1.0], [0.0], [-1.0]],
            "intercept": [0.0, 0.0, 0.0]
        }"#;
        let artifact: ClassifierArtifact = serde_json::from_str(json).unwrap();
        match &artifact {
            ClassifierArtifact::LogisticRegression(m) => {
                assert_eq!(m.multi_class, MultiClass::Multinomial)
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
        assert!(artifact.into_model().is_ok());
    }

    #[test]
    fn artifact_unknown_kind_fails() {
        let json = r#"{"kind": "random_forest", "classes": ["a"]}"#;
        assert!(serde_json::from_str::<ClassifierArtifact>(json).is_err());
    }
}
