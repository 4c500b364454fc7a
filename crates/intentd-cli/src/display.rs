//! Plain-text rendering of predictions, model listings and load summaries.

use intentd_ai::{LoadSummary, ModelRegistry};
use intentd_core::{HealthResponse, ModelOutcome, ModelsResponse, PredictAllResponse, PredictionResult};

const LABEL_WIDTH: usize = 20;

/// Print a single prediction as a vertical card.
pub fn print_prediction(result: &PredictionResult) {
    println!("=== {} ===", result.model_used);
    println!("  {:<LABEL_WIDTH$} {}", "text", result.text);
    println!("  {:<LABEL_WIDTH$} {}", "predicted_intent", result.predicted_intent);
    println!("  {:<LABEL_WIDTH$} {}", "confidence", format_confidence(result.confidence));
}

/// Print every model's outcome for one text.
pub fn print_predict_all(resp: &PredictAllResponse) {
    println!("{}", resp.text);
    for (model, outcome) in &resp.results {
        match outcome {
            ModelOutcome::Prediction {
                predicted_intent,
                confidence,
            } => println!(
                "  {model:<LABEL_WIDTH$} {predicted_intent} ({})",
                format_confidence(*confidence)
            ),
            ModelOutcome::Failed { error } => {
                println!("  {model:<LABEL_WIDTH$} error: {error}")
            }
        }
    }
}

/// Print locally loaded models with their shapes and sources.
pub fn print_registry(registry: &ModelRegistry) {
    if registry.is_empty() {
        println!("no models loaded");
        return;
    }
    for m in registry.iter() {
        let clf = m.classifier();
        println!("{} ({})", m.id(), m.description());
        println!("  {:<LABEL_WIDTH$} {}", "kind", clf.kind());
        println!("  {:<LABEL_WIDTH$} {}", "classes", clf.classes().join(", "));
        println!("  {:<LABEL_WIDTH$} {}", "features", m.vectorizer().n_features());
        if let Some(src) = m.source() {
            println!("  {:<LABEL_WIDTH$} {}", "classifier", src.classifier.display());
            println!("  {:<LABEL_WIDTH$} {}", "vectorizer", src.vectorizer.display());
        }
        println!("  {:<LABEL_WIDTH$} {}", "loaded_at", m.loaded_at().to_rfc3339());
        println!();
    }
}

/// Print failed loads, one per line.
pub fn print_load_failures(summary: &LoadSummary) {
    for (id, err) in &summary.failed {
        eprintln!("  {id:<LABEL_WIDTH$} not loaded: {err}");
    }
}

/// Print a remote server's model listing.
pub fn print_models(resp: &ModelsResponse) {
    if resp.models.is_empty() {
        println!("no models available");
        return;
    }
    for id in &resp.models {
        let desc = resp.description.get(id).map(String::as_str).unwrap_or("");
        println!("  {id:<LABEL_WIDTH$} {desc}");
    }
}

pub fn print_health(resp: &HealthResponse) {
    println!(
        "status: {} ({} model{} loaded)",
        resp.status.as_str(),
        resp.models_loaded,
        if resp.models_loaded == 1 { "" } else { "s" }
    );
}

fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(c) => format!("{:.1}%", c * 100.0),
        None => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_formatting() {
        assert_eq!(format_confidence(Some(0.8234)), "82.3%");
        assert_eq!(format_confidence(Some(1.0)), "100.0%");
        assert_eq!(format_confidence(None), "n/a");
    }
}
