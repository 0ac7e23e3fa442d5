//! Classification from labeled examples or a fine-tuned model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::{ApiMeta, Truncate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyExample {
    pub text: String,
    pub label: String,
}

impl ClassifyExample {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

/// Either `examples` or a fine-tuned `model` supplies the labels.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassifyRequest {
    pub inputs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<ClassifyExample>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<Truncate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfidence {
    #[serde(default)]
    pub confidence: Option<f64>,
}

/// The prediction for one input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub id: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub prediction: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub predictions: Vec<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub confidences: Vec<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, LabelConfidence>,
    #[serde(default)]
    pub classification_type: Option<String>,
}

/// One classification per input, in input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyResponse {
    pub id: String,
    pub classifications: Vec<Classification>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

endpoint!(ClassifyRequest => ClassifyResponse, Classify, |_r| "/v1/classify".to_string(), json);
