//! Boundary to the inference service.
//!
//! The service is opaque: it receives a mode, a prompt key, template
//! variables and a user message, and answers with free-form text. The
//! [`InferenceService`] trait is the seam; [`HttpInferenceClient`] is the
//! production implementation and [`response`] holds the parsers for what
//! comes back.

pub mod client;
pub mod response;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::InferenceError;

pub use client::HttpInferenceClient;

/// Mode id under which every conflict-resolution request is sent.
pub const CONFLICT_RESOLVER_MODE: &str = "merge_conflict_resolver";

/// Which prompt template the service should apply.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PromptKey {
    AnalyzeConflict,
    ResolveConflict,
}

impl std::fmt::Display for PromptKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AnalyzeConflict => write!(f, "analyze_conflict"),
            Self::ResolveConflict => write!(f, "resolve_conflict"),
        }
    }
}

/// Requested shape of the reply. Services that cannot honour `Json` reply
/// with text and the caller falls back to [`response::extract_json_object`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    Json,
}

/// Template variables, serialized with the snake_case keys the prompt
/// templates reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptVariables {
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incoming_branch: Option<String>,
    pub conflicted_content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    pub mode_id: String,
    pub prompt_key: PromptKey,
    pub variables: PromptVariables,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceResponse {
    pub success: bool,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// An opaque request/response call to the model.
#[async_trait]
pub trait InferenceService: Send + Sync {
    async fn execute(&self, request: &InferenceRequest)
        -> Result<InferenceResponse, InferenceError>;
}
