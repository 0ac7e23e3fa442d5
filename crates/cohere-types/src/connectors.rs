//! Connectors: registered search services that chat can ground on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::Empty;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthTokenType {
    Bearer,
    Basic,
    Noscheme,
}

/// Credentials the API presents when calling the connector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAuth {
    #[serde(rename = "type")]
    pub token_type: AuthTokenType,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorOAuth {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateConnectorRequest {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth: Option<ConnectorOAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_auth: Option<ServiceAuth>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub organization_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(default)]
    pub auth_type: Option<String>,
    /// OAuth settings as returned; secrets are redacted server-side.
    #[serde(default)]
    pub oauth: Option<serde_json::Value>,
    #[serde(default)]
    pub auth_status: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub continue_on_failure: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorResponse {
    pub connector: Connector,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ListConnectorsRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConnectorsResponse {
    #[serde(default)]
    pub connectors: Vec<Connector>,
    #[serde(default)]
    pub total_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetConnectorRequest {
    #[serde(skip)]
    pub id: String,
}

/// Partial update; unset fields are left as they are.
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateConnectorRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oauth: Option<ConnectorOAuth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continue_on_failure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_auth: Option<ServiceAuth>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteConnectorRequest {
    #[serde(skip)]
    pub id: String,
}

/// Start the OAuth flow for a connector.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OAuthAuthorizeRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after_token_redirect: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthAuthorizeResponse {
    #[serde(default)]
    pub redirect_url: Option<String>,
}

endpoint!(CreateConnectorRequest => ConnectorResponse, ConnectorsCreate, |_r| "/v1/connectors".to_string(), json);
endpoint!(ListConnectorsRequest => ListConnectorsResponse, ConnectorsList, |_r| "/v1/connectors".to_string(), query);
endpoint!(GetConnectorRequest => ConnectorResponse, ConnectorsGet, |r| format!("/v1/connectors/{}", urlencoding::encode(&r.id)));
endpoint!(UpdateConnectorRequest => ConnectorResponse, ConnectorsUpdate, |r| format!("/v1/connectors/{}", urlencoding::encode(&r.id)), json);
endpoint!(DeleteConnectorRequest => Empty, ConnectorsDelete, |r| format!("/v1/connectors/{}", urlencoding::encode(&r.id)));
endpoint!(OAuthAuthorizeRequest => OAuthAuthorizeResponse, ConnectorsOAuthAuthorize, |r| format!("/v1/connectors/{}/oauth/authorize", urlencoding::encode(&r.id)), query);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Endpoint, Operation, Payload};
    use serde_json::json;

    #[test]
    fn create_body() {
        let request = CreateConnectorRequest {
            name: "Example connector".into(),
            url: "https://connector-example.com/search".into(),
            service_auth: Some(ServiceAuth {
                token_type: AuthTokenType::Bearer,
                token: "secret".into(),
            }),
            ..CreateConnectorRequest::default()
        };
        let Payload::Json(body) = request.payload().unwrap() else {
            panic!("Expected JSON payload");
        };
        assert_eq!(body["name"], "Example connector");
        assert_eq!(body["service_auth"]["type"], "bearer");
        assert!(body.get("excludes").is_none());
    }

    #[test]
    fn update_keeps_id_out_of_body() {
        let request = UpdateConnectorRequest {
            id: "conn-1".into(),
            name: Some("Renamed".into()),
            ..UpdateConnectorRequest::default()
        };
        assert_eq!(request.operation(), Operation::ConnectorsUpdate);
        assert_eq!(request.path(), "/v1/connectors/conn-1");
        let Payload::Json(body) = request.payload().unwrap() else {
            panic!("Expected JSON payload");
        };
        assert_eq!(body, json!({"name": "Renamed"}));
    }

    #[test]
    fn oauth_authorize_redirect_in_query() {
        let request = OAuthAuthorizeRequest {
            id: "test-id".into(),
            after_token_redirect: Some("https://test.com".into()),
        };
        assert_eq!(request.path(), "/v1/connectors/test-id/oauth/authorize");
        assert_eq!(
            request.query().unwrap(),
            vec![("after_token_redirect".to_string(), "https://test.com".to_string())]
        );
        assert!(matches!(request.payload().unwrap(), Payload::Empty));
    }

    #[test]
    fn connector_parses_with_oauth_object() {
        let response: ConnectorResponse = serde_json::from_value(json!({
            "connector": {
                "id": "conn-1",
                "name": "Example connector",
                "created_at": "2024-03-01T12:00:00Z",
                "oauth": {"client_id": "abc", "authorize_url": "https://a", "token_url": "https://t"},
                "active": true
            }
        }))
        .unwrap();
        assert_eq!(response.connector.id, "conn-1");
        assert!(response.connector.oauth.is_some());
    }
}
