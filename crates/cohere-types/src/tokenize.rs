//! Tokenize and detokenize.

use serde::{Deserialize, Serialize};

use crate::common::ApiMeta;

#[derive(Debug, Clone, Default, Serialize)]
pub struct TokenizeRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenizeResponse {
    pub tokens: Vec<i64>,
    #[serde(default)]
    pub token_strings: Vec<String>,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetokenizeRequest {
    pub tokens: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetokenizeResponse {
    pub text: String,
    #[serde(default)]
    pub meta: Option<ApiMeta>,
}

endpoint!(TokenizeRequest => TokenizeResponse, Tokenize, |_r| "/v1/tokenize".to_string(), json);
endpoint!(DetokenizeRequest => DetokenizeResponse, Detokenize, |_r| "/v1/detokenize".to_string(), json);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_response() {
        let response: TokenizeResponse = serde_json::from_str(
            r#"{"tokens":[10002,1706],"token_strings":["token","ize"],"meta":{"api_version":{"version":"1"}}}"#,
        )
        .unwrap();
        assert_eq!(response.tokens, vec![10002, 1706]);
        assert_eq!(response.token_strings.len(), 2);
    }

    #[test]
    fn detokenize_request_shape() {
        let request = DetokenizeRequest {
            tokens: vec![10002, 1706, 1722, 5169, 4328],
            model: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["tokens"].as_array().unwrap().len(), 5);
        assert!(value.get("model").is_none());
    }
}
