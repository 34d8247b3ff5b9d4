//! Domain model types used throughout ConflictPilot.
//!
//! These records flow between the resolution engine and whatever front end
//! renders previews and collects approve/reject/edit decisions, so they are
//! serialized with camelCase field names.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Conflicted file
// ---------------------------------------------------------------------------

/// A file currently in a merge-conflict state.
///
/// Read fresh on every scan; content changes as conflicts are resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictedFile {
    /// Path relative to the repository root.
    pub path: String,
    /// Raw content, conflict markers included.
    pub content: String,
    /// Language inferred from the file extension.
    pub language: String,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// How the two sides of a conflict relate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Compatible,
    Semantic,
    Structural,
}

/// Strategy suggested by the analysis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    MergeBoth,
    PreferCurrent,
    PreferIncoming,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Compatible => write!(f, "compatible"),
            Self::Semantic => write!(f, "semantic"),
            Self::Structural => write!(f, "structural"),
        }
    }
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MergeBoth => write!(f, "merge_both"),
            Self::PreferCurrent => write!(f, "prefer_current"),
            Self::PreferIncoming => write!(f, "prefer_incoming"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

impl std::fmt::Display for Complexity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Simple => write!(f, "simple"),
            Self::Moderate => write!(f, "moderate"),
            Self::Complex => write!(f, "complex"),
        }
    }
}

/// Advisory classification of a conflict. Informs the reviewer; never gates
/// automatic behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictAnalysis {
    #[serde(default)]
    pub current_branch_intent: String,
    #[serde(default)]
    pub incoming_branch_intent: String,
    pub conflict_type: ConflictKind,
    pub recommended_strategy: ResolutionStrategy,
    #[serde(default)]
    pub explanation: String,
    pub complexity: Complexity,
}

// ---------------------------------------------------------------------------
// Resolution result
// ---------------------------------------------------------------------------

/// Outcome of resolving one conflicted file.
///
/// `resolved == true` implies `content` is present and marker-free;
/// `resolved == false` implies `error` explains why.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    pub file: String,
    pub resolved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ConflictAnalysis>,
}

impl ResolutionResult {
    pub fn resolved(file: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            resolved: true,
            content: Some(content.into()),
            error: None,
            analysis: None,
        }
    }

    pub fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            resolved: false,
            content: None,
            error: Some(error.into()),
            analysis: None,
        }
    }

    pub fn with_analysis(mut self, analysis: Option<ConflictAnalysis>) -> Self {
        self.analysis = analysis;
        self
    }
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// Review state of a preview.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PreviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Modified,
}

impl std::fmt::Display for PreviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// A proposed, unapplied resolution for one conflicted file.
///
/// Created `pending` by the preview pass; moved to approved / rejected /
/// modified by the reviewer; consumed by the applier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictResolutionPreview {
    pub file: String,
    pub language: String,
    /// Content as found in the working tree, markers included.
    pub original_content: String,
    pub proposed_content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ConflictAnalysis>,
    #[serde(default)]
    pub status: PreviewStatus,
    /// Supersedes `proposed_content` at apply time when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_modified_content: Option<String>,
}

impl ConflictResolutionPreview {
    pub fn pending(
        file: impl Into<String>,
        language: impl Into<String>,
        original_content: impl Into<String>,
        proposed_content: impl Into<String>,
        analysis: Option<ConflictAnalysis>,
    ) -> Self {
        Self {
            file: file.into(),
            language: language.into(),
            original_content: original_content.into(),
            proposed_content: proposed_content.into(),
            analysis,
            status: PreviewStatus::Pending,
            user_modified_content: None,
        }
    }

    pub fn approve(&mut self) {
        self.status = PreviewStatus::Approved;
    }

    pub fn reject(&mut self) {
        self.status = PreviewStatus::Rejected;
    }

    /// Replace the proposal with reviewer-edited content.
    pub fn modify(&mut self, content: impl Into<String>) {
        self.user_modified_content = Some(content.into());
        self.status = PreviewStatus::Modified;
    }

    /// Content that would be written if this preview were applied.
    pub fn effective_content(&self) -> &str {
        self.user_modified_content
            .as_deref()
            .unwrap_or(&self.proposed_content)
    }

    /// Unified diff from the conflicted original to the effective content.
    pub fn unified_diff(&self) -> String {
        diffy::create_patch(&self.original_content, self.effective_content()).to_string()
    }
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Full output of one preview-generation pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConflictPreviewResult {
    pub repo_path: PathBuf,
    pub current_branch: String,
    pub target_branch: String,
    pub previews: Vec<ConflictResolutionPreview>,
    pub total_conflicts: usize,
    #[serde(rename = "resolvedByAI")]
    pub resolved_by_ai: usize,
    pub failed_to_resolve: usize,
    /// Stderr of a rebase start that failed; kept because a failed start is
    /// treated as "has conflicts" even when it failed for another reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebase_start_error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl ConflictPreviewResult {
    pub fn new(repo_path: &Path, current_branch: &str, target_branch: &str) -> Self {
        Self {
            repo_path: repo_path.to_path_buf(),
            current_branch: current_branch.to_string(),
            target_branch: target_branch.to_string(),
            previews: Vec::new(),
            total_conflicts: 0,
            resolved_by_ai: 0,
            failed_to_resolve: 0,
            rebase_start_error: None,
            generated_at: Utc::now(),
        }
    }

    /// True when the rebase finished without stopping on conflicts.
    pub fn is_clean(&self) -> bool {
        self.total_conflicts == 0
    }

    /// Write the result as pretty JSON so an approval round can pick it up
    /// in another process.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

/// A preview that could not be applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FileFailure {
    pub file: String,
    pub error: String,
}

/// Partition of an adjudicated preview set by outcome.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResolutionsResult {
    /// True only when `failed` is empty.
    pub success: bool,
    pub message: String,
    pub applied: Vec<String>,
    pub failed: Vec<FileFailure>,
    pub skipped: Vec<String>,
}

/// Outcome of automatic mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RebaseWithResolutionResult {
    pub success: bool,
    pub message: String,
    pub conflicts_resolved: usize,
    pub conflicts_failed: usize,
    pub resolutions: Vec<ResolutionResult>,
    /// Stderr of the rebase start when it stopped rather than finishing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rebase_start_error: Option<String>,
}

/// Snapshot of a repository's rebase situation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoStatus {
    pub current_branch: Option<String>,
    pub rebase_in_progress: bool,
    pub conflicted_files: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_preview() -> ConflictResolutionPreview {
        ConflictResolutionPreview::pending(
            "src/a.ts",
            "typescript",
            "<<<<<<< HEAD\nconst a = 1;\n=======\nconst a = 2;\n>>>>>>> main\n",
            "const a = 2;\n",
            None,
        )
    }

    #[test]
    fn test_effective_content_prefers_user_edit() {
        let mut preview = sample_preview();
        assert_eq!(preview.effective_content(), "const a = 2;\n");

        preview.modify("const a = 3;\n");
        assert_eq!(preview.status, PreviewStatus::Modified);
        assert_eq!(preview.effective_content(), "const a = 3;\n");
    }

    #[test]
    fn test_unified_diff_shows_marker_removal() {
        let diff = sample_preview().unified_diff();
        assert!(diff.contains("-<<<<<<< HEAD"));
        assert!(diff.contains(">>>>>>> main"));
    }

    #[test]
    fn test_preview_serializes_camel_case() {
        let mut preview = sample_preview();
        preview.approve();
        let json = serde_json::to_value(&preview).unwrap();
        assert_eq!(json["status"], "approved");
        assert!(json.get("originalContent").is_some());
        assert!(json.get("proposedContent").is_some());
        assert!(json.get("userModifiedContent").is_none());
    }

    #[test]
    fn test_analysis_deserializes_wire_format() {
        let json = r#"{
            "currentBranchIntent": "rename variable",
            "incomingBranchIntent": "change initial value",
            "conflictType": "compatible",
            "recommendedStrategy": "merge_both",
            "explanation": "both edits can coexist",
            "complexity": "simple"
        }"#;
        let analysis: ConflictAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.conflict_type, ConflictKind::Compatible);
        assert_eq!(analysis.recommended_strategy, ResolutionStrategy::MergeBoth);
        assert_eq!(analysis.complexity, Complexity::Simple);
    }

    #[test]
    fn test_preview_result_json_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("previews.json");

        let mut result = ConflictPreviewResult::new(Path::new("/repo"), "feature", "main");
        result.previews.push(sample_preview());
        result.total_conflicts = 1;
        result.resolved_by_ai = 1;
        result.save_json(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"resolvedByAI\": 1"));

        let loaded = ConflictPreviewResult::load_json(&path).unwrap();
        assert_eq!(loaded, result);
        assert!(!loaded.is_clean());
    }
}
