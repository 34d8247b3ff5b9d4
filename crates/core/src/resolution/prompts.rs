//! User messages sent alongside the service-side prompt templates.

pub(crate) fn analyze(path: &str) -> String {
    format!(
        "Analyze the merge conflict in {path}. Reply with a single JSON object with the keys \
         currentBranchIntent, incomingBranchIntent, conflictType (compatible | semantic | structural), \
         recommendedStrategy (merge_both | prefer_current | prefer_incoming | manual), explanation, \
         and complexity (simple | moderate | complex)."
    )
}

pub(crate) fn resolve(path: &str) -> String {
    format!(
        "Resolve every merge conflict in {path}. Output only the final merged file content: \
         no conflict markers, no explanation, no commentary."
    )
}

pub(crate) fn retry(path: &str) -> String {
    format!(
        "Your previous answer for {path} still contained conflict markers (<<<<<<<, =======, >>>>>>>). \
         Output ONLY the complete merged file. Every conflict marker MUST be removed and both sides \
         reconciled into working code."
    )
}
