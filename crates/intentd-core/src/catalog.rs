//! Known model identifiers and their human-readable descriptions.

/// Model identifiers the browser UI knows about, with their display names.
pub const KNOWN_MODELS: &[KnownModel] = &[
    KnownModel {
        id: "naive_bayes",
        description: "Naive Bayes Classifier",
    },
    KnownModel {
        id: "logistic_regression",
        description: "Logistic Regression Classifier",
    },
    KnownModel {
        id: "linear_svm",
        description: "Linear Support Vector Machine",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownModel {
    pub id: &'static str,
    pub description: &'static str,
}

/// Display name for a model identifier, falling back to the identifier itself.
pub fn describe(id: &str) -> String {
    KNOWN_MODELS
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.description.to_string())
        .unwrap_or_else(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_models_cover_ui_set() {
        let ids: Vec<&str> = KNOWN_MODELS.iter().map(|m| m.id).collect();
        assert_eq!(ids, ["naive_bayes", "logistic_regression", "linear_svm"]);
    }

    #[test]
    fn describe_known_and_unknown() {
        assert_eq!(describe("linear_svm"), "Linear Support Vector Machine");
        assert_eq!(describe("random_forest"), "random_forest");
    }
}
