//! Embeddings for text and images, v1 and v2.

use serde::{Deserialize, Serialize};

use crate::chat_v2::ContentPart;
use crate::common::{ApiMeta, Truncate};

/// What the embeddings will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedInputType {
    SearchDocument,
    SearchQuery,
    Classification,
    Clustering,
    Image,
}

/// Numeric encoding of the returned vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingType {
    Float,
    Int8,
    Uint8,
    Binary,
    Ubinary,
    Base64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EmbedRequest {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<String>,
    /// Images as `data:` URIs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<EmbedInputType>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embedding_types: Vec<EmbeddingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<Truncate>,
}

/// Vectors as returned by v1: a bare float matrix unless
/// `embedding_types` was set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Embeddings {
    Floats(Vec<Vec<f64>>),
    ByType(EmbeddingsByType),
}

impl Embeddings {
    /// Number of embedded inputs.
    pub fn len(&self) -> usize {
        match self {
            Embeddings::Floats(v) => v.len(),
            Embeddings::ByType(by_type) => by_type.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingsByType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub float: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub int8: Option<Vec<Vec<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uint8: Option<Vec<Vec<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary: Option<Vec<Vec<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ubinary: Option<Vec<Vec<i64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base64: Option<Vec<String>>,
}

impl EmbeddingsByType {
    pub fn len(&self) -> usize {
        [
            self.float.as_ref().map(Vec::len),
            self.int8.as_ref().map(Vec::len),
            self.uint8.as_ref().map(Vec::len),
            self.binary.as_ref().map(Vec::len),
            self.ubinary.as_ref().map(Vec::len),
            self.base64.as_ref().map(Vec::len),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub id: String,
    pub embeddings: Embeddings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<String>,
    #[serde(default)]
    pub response_type: Option<String>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

/// A mixed text/image input for v2 embeddings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedInput {
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EmbedRequestV2 {
    pub model: String,
    pub input_type: EmbedInputType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<EmbedInput>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embedding_types: Vec<EmbeddingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dimension: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncate: Option<Truncate>,
}

impl EmbedRequestV2 {
    pub fn new(model: impl Into<String>, input_type: EmbedInputType) -> Self {
        Self {
            model: model.into(),
            input_type,
            texts: Vec::new(),
            images: Vec::new(),
            inputs: Vec::new(),
            embedding_types: Vec::new(),
            output_dimension: None,
            truncate: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponseV2 {
    pub id: String,
    pub embeddings: EmbeddingsByType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub texts: Vec<String>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

endpoint!(EmbedRequest => EmbedResponse, Embed, |_r| "/v1/embed".to_string(), json);
endpoint!(EmbedRequestV2 => EmbedResponseV2, EmbedV2, |_r| "/v2/embed".to_string(), json);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn v1_float_matrix() {
        let response: EmbedResponse = serde_json::from_value(json!({
            "id": "e1",
            "embeddings": [[0.1, 0.2], [0.3, 0.4]],
            "texts": ["hello", "goodbye"],
            "response_type": "embeddings_floats"
        }))
        .unwrap();
        assert!(matches!(response.embeddings, Embeddings::Floats(_)));
        assert_eq!(response.embeddings.len(), 2);
    }

    #[test]
    fn v1_by_type() {
        let response: EmbedResponse = serde_json::from_value(json!({
            "id": "e2",
            "embeddings": {"int8": [[1, -2, 3]]},
            "response_type": "embeddings_by_type"
        }))
        .unwrap();
        match response.embeddings {
            Embeddings::ByType(by_type) => {
                assert_eq!(by_type.int8.unwrap()[0], vec![1, -2, 3]);
            }
            other => panic!("Expected ByType, got {other:?}"),
        }
    }

    #[test]
    fn v2_request_with_image_input() {
        let mut request = EmbedRequestV2::new("embed-v4.0", EmbedInputType::Image);
        request.embedding_types = vec![EmbeddingType::Float];
        request.inputs = vec![EmbedInput {
            content: vec![ContentPart::image_url("data:image/png;base64,AAAA")],
        }];
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["input_type"], "image");
        assert_eq!(value["embedding_types"][0], "float");
        assert_eq!(value["inputs"][0]["content"][0]["type"], "image_url");
        assert!(value.get("texts").is_none());
    }

    #[test]
    fn v2_response_len() {
        let response: EmbedResponseV2 = serde_json::from_value(json!({
            "id": "e3",
            "embeddings": {"float": [[0.5], [0.6], [0.7]]},
            "texts": ["a", "b", "c"]
        }))
        .unwrap();
        assert_eq!(response.embeddings.len(), 3);
    }
}
