//! HTTP inference service client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use tracing::{debug, info, instrument, warn};

use super::{InferenceRequest, InferenceResponse, InferenceService};
use crate::config::InferenceConfig;
use crate::errors::InferenceError;

/// Posts [`InferenceRequest`]s as JSON to a mode-execution endpoint.
#[derive(Clone)]
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpInferenceClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, InferenceError> {
        let endpoint = endpoint.into();
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, HeaderValue::from_static("conflictpilot/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;
        info!(endpoint = %endpoint, "created HttpInferenceClient");
        Ok(Self {
            http,
            endpoint,
            api_key,
            timeout,
        })
    }

    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        Self::new(&config.endpoint, config.api_key.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl InferenceService for HttpInferenceClient {
    #[instrument(skip(self, request), fields(prompt = %request.prompt_key, file = %request.variables.file_path))]
    async fn execute(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        let mut req = self.http.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::Timeout {
                    secs: self.timeout.as_secs(),
                }
            } else {
                InferenceError::HttpError(e)
            }
        })?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            warn!(status = %status, "inference service returned error");
            return Err(InferenceError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: InferenceResponse =
            serde_json::from_str(&body).map_err(|e| InferenceError::ParseError(e.to_string()))?;
        debug!(success = parsed.success, len = parsed.data.len(), "inference response received");
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::{PromptKey, PromptVariables, ResponseFormat};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> InferenceRequest {
        InferenceRequest {
            mode_id: "merge_conflict_resolver".into(),
            prompt_key: PromptKey::ResolveConflict,
            variables: PromptVariables {
                file_path: "src/a.ts".into(),
                language: Some("typescript".into()),
                current_branch: Some("feature".into()),
                incoming_branch: Some("main".into()),
                conflicted_content: "<<<<<<< a\n=======\n>>>>>>> b\n".into(),
            },
            user_message: "resolve it".into(),
            response_format: Some(ResponseFormat::Text),
        }
    }

    #[tokio::test]
    async fn test_posts_wire_format_and_parses_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/modes/execute"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "modeId": "merge_conflict_resolver",
                "promptKey": "resolve_conflict",
                "variables": { "file_path": "src/a.ts", "current_branch": "feature" },
                "userMessage": "resolve it"
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "success": true, "data": "merged" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpInferenceClient::new(
            format!("{}/v1/modes/execute", server.uri()),
            Some("sk-test".into()),
            Duration::from_secs(5),
        )
        .unwrap();

        let resp = client.execute(&request()).await.unwrap();
        assert!(resp.success);
        assert_eq!(resp.data, "merged");
    }

    #[tokio::test]
    async fn test_http_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let client =
            HttpInferenceClient::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        let err = client.execute(&request()).await.unwrap_err();
        assert!(matches!(
            err,
            InferenceError::ApiError { status: 503, ref body } if body == "overloaded"
        ));
    }

    #[tokio::test]
    async fn test_non_json_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client =
            HttpInferenceClient::new(server.uri(), None, Duration::from_secs(5)).unwrap();
        let err = client.execute(&request()).await.unwrap_err();
        assert!(matches!(err, InferenceError::ParseError(_)));
    }
}
