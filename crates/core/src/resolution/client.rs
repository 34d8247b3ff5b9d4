//! The resolution client: analyze and resolve one conflicted file at a time.
//!
//! Resolution makes at most two inference calls per file: the initial
//! attempt and, if conflict markers survive it, one retry with a stronger
//! instruction. Whatever comes back is re-checked with
//! [`has_conflict_markers`] before it can be reported as resolved.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use super::prompts;
use crate::config::InferenceConfig;
use crate::conflict::{has_conflict_markers, ConflictScanner};
use crate::errors::{InferenceError, ResolutionError};
use crate::inference::response::{extract_json_object, strip_code_fence};
use crate::inference::{
    InferenceRequest, InferenceService, PromptKey, PromptVariables, ResponseFormat,
    CONFLICT_RESOLVER_MODE,
};
use crate::models::{ConflictAnalysis, ConflictedFile, ResolutionResult};

/// Error reported when markers remain after the retry.
pub const UNRESOLVED_MARKERS_ERROR: &str = "AI could not fully resolve conflict markers";

/// Sends conflicted files to the inference service in conflict-resolver mode.
#[derive(Clone)]
pub struct ResolutionClient {
    service: Arc<dyn InferenceService>,
    scanner: ConflictScanner,
    mode_id: String,
    timeout: Duration,
}

impl ResolutionClient {
    pub fn new(
        service: Arc<dyn InferenceService>,
        scanner: ConflictScanner,
        timeout: Duration,
    ) -> Self {
        Self {
            service,
            scanner,
            mode_id: CONFLICT_RESOLVER_MODE.to_string(),
            timeout,
        }
    }

    pub fn from_config(
        service: Arc<dyn InferenceService>,
        scanner: ConflictScanner,
        config: &InferenceConfig,
    ) -> Self {
        Self {
            mode_id: config.mode_id.clone(),
            ..Self::new(service, scanner, config.timeout())
        }
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Read `path` and classify its conflict.
    pub async fn analyze(&self, repo: &Path, path: &str) -> Result<ConflictAnalysis, ResolutionError> {
        let file = self.scanner.read_conflicted(repo, path).await?;
        self.analyze_file(&file).await
    }

    /// Classify an already-read conflicted file. Best-effort: callers treat
    /// failure as non-fatal.
    #[instrument(skip(self, file), fields(file = %file.path))]
    pub async fn analyze_file(&self, file: &ConflictedFile) -> Result<ConflictAnalysis, ResolutionError> {
        let request = InferenceRequest {
            mode_id: self.mode_id.clone(),
            prompt_key: PromptKey::AnalyzeConflict,
            variables: PromptVariables {
                file_path: file.path.clone(),
                language: Some(file.language.clone()),
                current_branch: None,
                incoming_branch: None,
                conflicted_content: file.content.clone(),
            },
            user_message: prompts::analyze(&file.path),
            response_format: Some(ResponseFormat::Json),
        };

        let data = self
            .call(&request)
            .await
            .map_err(ResolutionError::AnalysisServiceError)?;
        let json = extract_json_object(&data)
            .map_err(|e| ResolutionError::AnalysisParseError(e.to_string()))?;
        let analysis: ConflictAnalysis = serde_json::from_str(json)
            .map_err(|e| ResolutionError::AnalysisParseError(e.to_string()))?;

        debug!(conflict_type = ?analysis.conflict_type, complexity = ?analysis.complexity, "conflict analyzed");
        Ok(analysis)
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    /// Read `path` and produce merged content for it.
    pub async fn resolve(
        &self,
        repo: &Path,
        path: &str,
        current_branch: &str,
        incoming_branch: &str,
    ) -> ResolutionResult {
        match self.scanner.read_conflicted(repo, path).await {
            Ok(file) => self.resolve_file(&file, current_branch, incoming_branch).await,
            Err(e) => {
                warn!(path, error = %e, "could not read conflicted file");
                ResolutionResult::failed(path, e.to_string())
            }
        }
    }

    /// Produce merged content for an already-read conflicted file.
    ///
    /// Never fails with an error: every failure mode is a
    /// `resolved == false` result.
    #[instrument(skip(self, file), fields(file = %file.path))]
    pub async fn resolve_file(
        &self,
        file: &ConflictedFile,
        current_branch: &str,
        incoming_branch: &str,
    ) -> ResolutionResult {
        if !has_conflict_markers(&file.content) {
            info!("no conflict markers present, nothing to resolve");
            return ResolutionResult::resolved(&file.path, file.content.clone());
        }

        let first = self
            .attempt(file, current_branch, incoming_branch, prompts::resolve(&file.path))
            .await;
        let merged = match first {
            Ok(merged) if !has_conflict_markers(&merged) => {
                info!("conflict resolved on first attempt");
                return ResolutionResult::resolved(&file.path, merged);
            }
            Ok(_) => {
                warn!("conflict markers remain after first attempt, retrying");
                self.attempt(file, current_branch, incoming_branch, prompts::retry(&file.path))
                    .await
            }
            Err(e) => Err(e),
        };

        match merged {
            Ok(merged) if !has_conflict_markers(&merged) => {
                info!("conflict resolved on retry");
                ResolutionResult::resolved(&file.path, merged)
            }
            Ok(_) => {
                warn!("conflict markers remain after retry");
                ResolutionResult::failed(&file.path, UNRESOLVED_MARKERS_ERROR)
            }
            Err(e) => {
                warn!(error = %e, "resolution request failed");
                ResolutionResult::failed(&file.path, format!("resolution request failed: {e}"))
            }
        }
    }

    async fn attempt(
        &self,
        file: &ConflictedFile,
        current_branch: &str,
        incoming_branch: &str,
        user_message: String,
    ) -> Result<String, InferenceError> {
        let request = InferenceRequest {
            mode_id: self.mode_id.clone(),
            prompt_key: PromptKey::ResolveConflict,
            variables: PromptVariables {
                file_path: file.path.clone(),
                language: Some(file.language.clone()),
                current_branch: Some(current_branch.to_string()),
                incoming_branch: Some(incoming_branch.to_string()),
                conflicted_content: file.content.clone(),
            },
            user_message,
            response_format: Some(ResponseFormat::Text),
        };
        let data = self.call(&request).await?;
        Ok(strip_code_fence(&data))
    }

    /// One inference call under the configured timeout.
    async fn call(&self, request: &InferenceRequest) -> Result<String, InferenceError> {
        let response = tokio::time::timeout(self.timeout, self.service.execute(request))
            .await
            .map_err(|_| InferenceError::Timeout {
                secs: self.timeout.as_secs(),
            })??;

        if !response.success {
            let detail = response.error.unwrap_or(response.data);
            return Err(InferenceError::Unsuccessful(detail));
        }
        Ok(response.data)
    }
}

impl std::fmt::Debug for ResolutionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionClient")
            .field("mode_id", &self.mode_id)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::git::GitCli;
    use crate::inference::InferenceResponse;
    use crate::models::{Complexity, ConflictKind};
    use crate::testing::{
        write_file, ScriptedInference, ScriptedRunner, ANALYSIS_JSON, CONFLICTED_TS, RESOLVED_TS,
    };

    const FILE: &str = "src/greeting.ts";

    fn client(service: Arc<dyn InferenceService>) -> ResolutionClient {
        let scanner = ConflictScanner::new(GitCli::new(
            Arc::new(ScriptedRunner::new()),
            "git",
            "origin",
        ));
        ResolutionClient::new(service, scanner, Duration::from_secs(5))
    }

    fn conflicted() -> ConflictedFile {
        ConflictedFile {
            path: FILE.into(),
            content: CONFLICTED_TS.into(),
            language: "typescript".into(),
        }
    }

    #[tokio::test]
    async fn test_clean_file_is_noop_without_calling_service() {
        let service = Arc::new(ScriptedInference::new());
        let file = ConflictedFile {
            content: "const a = 1;\n".into(),
            ..conflicted()
        };

        let result = client(service.clone()).resolve_file(&file, "feature", "main").await;
        assert!(result.resolved);
        assert_eq!(result.content.as_deref(), Some("const a = 1;\n"));
        assert!(service.requests().is_empty());
    }

    #[tokio::test]
    async fn test_resolves_on_first_attempt_and_strips_fence() {
        let fenced = format!("```typescript\n{RESOLVED_TS}\n```");
        let service =
            Arc::new(ScriptedInference::new().reply(PromptKey::ResolveConflict, &fenced));

        let result = client(service.clone()).resolve_file(&conflicted(), "feature", "main").await;
        assert!(result.resolved);
        assert_eq!(result.content.as_deref(), Some(RESOLVED_TS));
        assert_eq!(service.count(PromptKey::ResolveConflict, FILE), 1);

        let req = &service.requests()[0];
        assert_eq!(req.mode_id, "merge_conflict_resolver");
        assert_eq!(req.variables.current_branch.as_deref(), Some("feature"));
        assert_eq!(req.variables.incoming_branch.as_deref(), Some("main"));
        assert_eq!(req.variables.conflicted_content, CONFLICTED_TS);
    }

    #[tokio::test]
    async fn test_retries_once_when_markers_echoed() {
        let service = Arc::new(
            ScriptedInference::new()
                .reply(PromptKey::ResolveConflict, CONFLICTED_TS)
                .reply(PromptKey::ResolveConflict, RESOLVED_TS),
        );

        let result = client(service.clone()).resolve_file(&conflicted(), "feature", "main").await;
        assert!(result.resolved);
        assert_eq!(result.content.as_deref(), Some(RESOLVED_TS));
        assert_eq!(service.count(PromptKey::ResolveConflict, FILE), 2);

        let retry = &service.requests()[1];
        assert!(retry.user_message.contains("still contained conflict markers"));
    }

    #[tokio::test]
    async fn test_gives_up_after_two_calls() {
        let service =
            Arc::new(ScriptedInference::new().reply(PromptKey::ResolveConflict, CONFLICTED_TS));

        let result = client(service.clone()).resolve_file(&conflicted(), "feature", "main").await;
        assert!(!result.resolved);
        assert!(result.content.is_none());
        assert_eq!(result.error.as_deref(), Some(UNRESOLVED_MARKERS_ERROR));
        assert_eq!(service.count(PromptKey::ResolveConflict, FILE), 2);
    }

    #[tokio::test]
    async fn test_service_failure_is_unresolved() {
        let service =
            Arc::new(ScriptedInference::new().error(PromptKey::ResolveConflict, "quota exceeded"));

        let result = client(service.clone()).resolve_file(&conflicted(), "feature", "main").await;
        assert!(!result.resolved);
        assert!(result.error.unwrap().contains("quota exceeded"));
        assert_eq!(service.count(PromptKey::ResolveConflict, FILE), 1);
    }

    struct SlowService;

    #[async_trait]
    impl InferenceService for SlowService {
        async fn execute(
            &self,
            _request: &InferenceRequest,
        ) -> Result<InferenceResponse, InferenceError> {
            tokio::time::sleep(Duration::from_secs(600)).await;
            Ok(InferenceResponse {
                success: true,
                data: RESOLVED_TS.into(),
                error: None,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_unresolved() {
        let result = client(Arc::new(SlowService))
            .resolve_file(&conflicted(), "feature", "main")
            .await;
        assert!(!result.resolved);
        assert!(result.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_resolve_reads_file_from_worktree() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), FILE, CONFLICTED_TS);
        let service =
            Arc::new(ScriptedInference::new().reply(PromptKey::ResolveConflict, RESOLVED_TS));

        let result = client(service).resolve(dir.path(), FILE, "feature", "main").await;
        assert!(result.resolved);

        let missing = client(Arc::new(ScriptedInference::new()))
            .resolve(dir.path(), "missing.ts", "feature", "main")
            .await;
        assert!(!missing.resolved);
        assert!(missing.error.is_some());
    }

    #[tokio::test]
    async fn test_analyze_extracts_embedded_json() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), FILE, CONFLICTED_TS);
        let service =
            Arc::new(ScriptedInference::new().reply(PromptKey::AnalyzeConflict, ANALYSIS_JSON));

        let analysis = client(service.clone()).analyze(dir.path(), FILE).await.unwrap();
        assert_eq!(analysis.conflict_type, ConflictKind::Compatible);
        assert_eq!(analysis.complexity, Complexity::Simple);
        assert_eq!(
            service.requests()[0].response_format,
            Some(ResponseFormat::Json)
        );
    }

    #[tokio::test]
    async fn test_analyze_without_json_is_parse_error() {
        let service = Arc::new(
            ScriptedInference::new().reply(PromptKey::AnalyzeConflict, "I think it is simple."),
        );
        let err = client(service).analyze_file(&conflicted()).await.unwrap_err();
        assert!(matches!(err, ResolutionError::AnalysisParseError(_)));
    }

    #[tokio::test]
    async fn test_analyze_service_failure() {
        let service =
            Arc::new(ScriptedInference::new().error(PromptKey::AnalyzeConflict, "down"));
        let err = client(service).analyze_file(&conflicted()).await.unwrap_err();
        assert!(matches!(err, ResolutionError::AnalysisServiceError(_)));
    }
}
