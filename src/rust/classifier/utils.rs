use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ndarray::{Array1, ArrayView1};

use super::error::ClassifierError;

pub(crate) fn softmax(logits: ArrayView1<f32>) -> Array1<f32> {
    let max = logits
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f32::NEG_INFINITY, f32::max);
    if !max.is_finite() {
        return Array1::zeros(logits.len());
    }
    let exps = logits.mapv(|v| if v.is_finite() { (v - max).exp() } else { 0.0 });
    let sum = exps.sum();
    if sum > 0.0 {
        exps / sum
    } else {
        Array1::zeros(logits.len())
    }
}

/// Indices and scores of the `k` largest values, descending. Ties keep index order.
pub(crate) fn top_k(scores: ArrayView1<f32>, k: usize) -> Vec<(usize, f32)> {
    let mut indexed: Vec<(usize, f32)> = scores.iter().copied().enumerate().collect();
    indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    indexed.truncate(k);
    indexed
}

/// Loads a class label table.
///
/// Two formats are accepted:
/// - a Hugging Face `config.json` carrying an `id2label` object (`{"0": "tench", ...}`)
/// - plain text with one label per line
pub(crate) fn load_labels(path: &Path) -> Result<Vec<String>, ClassifierError> {
    let content = fs::read_to_string(path).map_err(|e| {
        ClassifierError::BuildError(format!("Failed to read labels file {:?}: {}", path, e))
    })?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let labels = if is_json {
        parse_id2label(&content)?
    } else {
        content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect()
    };

    if labels.is_empty() {
        return Err(ClassifierError::ValidationError(format!(
            "Labels file {:?} contains no labels",
            path
        )));
    }
    Ok(labels)
}

pub(crate) fn parse_id2label(content: &str) -> Result<Vec<String>, ClassifierError> {
    let config: serde_json::Value = serde_json::from_str(content)
        .map_err(|e| ClassifierError::ValidationError(format!("Invalid model config: {}", e)))?;
    let table = config
        .get("id2label")
        .and_then(|v| v.as_object())
        .ok_or_else(|| ClassifierError::ValidationError("Model config has no id2label table".into()))?;

    let mut by_id = BTreeMap::new();
    for (id, label) in table {
        let id: usize = id.parse().map_err(|_| {
            ClassifierError::ValidationError(format!("Label id '{}' is not an integer", id))
        })?;
        let label = label.as_str().ok_or_else(|| {
            ClassifierError::ValidationError(format!("Label for id {} is not a string", id))
        })?;
        by_id.insert(id, label.to_string());
    }

    // ids must be exactly 0..n
    if let Some((pos, id)) = by_id.keys().enumerate().find(|(pos, id)| pos != *id) {
        return Err(ClassifierError::ValidationError(format!(
            "Label ids are not contiguous: expected {}, found {}",
            pos, id
        )));
    }
    Ok(by_id.into_values().collect())
}
