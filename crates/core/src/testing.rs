//! Scripted collaborators shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::errors::{InferenceError, ProcessError};
use crate::inference::{InferenceRequest, InferenceResponse, InferenceService, PromptKey};
use crate::process::ProcessRunner;

// ---------------------------------------------------------------------------
// Process runner
// ---------------------------------------------------------------------------

type Effect = Arc<dyn Fn(&Path) -> Result<String, ProcessError> + Send + Sync>;

#[derive(Clone)]
enum Reply {
    Ok(String),
    Fail(i32, String),
    Effect(Effect),
}

struct Rule {
    pattern: String,
    replies: VecDeque<Reply>,
}

/// A [`ProcessRunner`] that answers from a script.
///
/// Each rule matches when its pattern is a substring of `"<program> <args>"`.
/// Replies queued on a rule are consumed in order and the last one repeats.
/// Commands that match no rule succeed with empty output.
pub(crate) struct ScriptedRunner {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn push(self, pattern: &str, reply: Reply) -> Self {
        {
            let mut rules = self.rules.lock().unwrap();
            match rules.iter_mut().find(|r| r.pattern == pattern) {
                Some(rule) => rule.replies.push_back(reply),
                None => rules.push(Rule {
                    pattern: pattern.to_string(),
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    pub fn ok(self, pattern: &str, stdout: &str) -> Self {
        self.push(pattern, Reply::Ok(stdout.to_string()))
    }

    pub fn fail(self, pattern: &str, exit_code: i32, stderr: &str) -> Self {
        self.push(pattern, Reply::Fail(exit_code, stderr.to_string()))
    }

    /// Run `effect` against the working directory when the pattern matches.
    pub fn effect<F>(self, pattern: &str, effect: F) -> Self
    where
        F: Fn(&Path) -> Result<String, ProcessError> + Send + Sync + 'static,
    {
        self.push(pattern, Reply::Effect(Arc::new(effect)))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(pattern)).count()
    }
}

#[async_trait]
impl ProcessRunner for ScriptedRunner {
    async fn run(
        &self,
        program: &str,
        args: &[&str],
        working_dir: &Path,
    ) -> Result<String, ProcessError> {
        let command = format!("{} {}", program, args.join(" "));
        self.calls.lock().unwrap().push(command.clone());

        let reply = {
            let mut rules = self.rules.lock().unwrap();
            rules
                .iter_mut()
                .find(|r| command.contains(&r.pattern))
                .map(|rule| {
                    if rule.replies.len() > 1 {
                        rule.replies.pop_front().unwrap()
                    } else {
                        rule.replies.front().cloned().unwrap()
                    }
                })
        };

        match reply {
            None => Ok(String::new()),
            Some(Reply::Ok(out)) => Ok(out),
            Some(Reply::Fail(exit_code, stderr)) => {
                Err(ProcessError::CommandFailed { exit_code, stderr })
            }
            Some(Reply::Effect(effect)) => effect(working_dir),
        }
    }
}

// ---------------------------------------------------------------------------
// Inference service
// ---------------------------------------------------------------------------

#[derive(Clone)]
enum ModelReply {
    Data(String),
    Error(String),
}

/// An [`InferenceService`] that answers from per-prompt queues.
///
/// Replies registered for a specific file path win over the generic queue
/// for that prompt. The last reply in a queue repeats.
pub(crate) struct ScriptedInference {
    generic: Mutex<HashMap<PromptKey, VecDeque<ModelReply>>>,
    by_file: Mutex<HashMap<(PromptKey, String), VecDeque<ModelReply>>>,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedInference {
    pub fn new() -> Self {
        Self {
            generic: Mutex::new(HashMap::new()),
            by_file: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(self, key: PromptKey, data: &str) -> Self {
        self.generic
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(ModelReply::Data(data.to_string()));
        self
    }

    pub fn error(self, key: PromptKey, message: &str) -> Self {
        self.generic
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push_back(ModelReply::Error(message.to_string()));
        self
    }

    pub fn reply_for(self, key: PromptKey, file: &str, data: &str) -> Self {
        self.by_file
            .lock()
            .unwrap()
            .entry((key, file.to_string()))
            .or_default()
            .push_back(ModelReply::Data(data.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made for `key` against `file`.
    pub fn count(&self, key: PromptKey, file: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.prompt_key == key && r.variables.file_path == file)
            .count()
    }
}

fn next_reply(queue: &mut VecDeque<ModelReply>) -> Option<ModelReply> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl InferenceService for ScriptedInference {
    async fn execute(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, InferenceError> {
        self.requests.lock().unwrap().push(request.clone());

        let key = (request.prompt_key, request.variables.file_path.clone());
        let reply = {
            let mut by_file = self.by_file.lock().unwrap();
            match by_file.get_mut(&key).and_then(next_reply) {
                Some(reply) => Some(reply),
                None => self
                    .generic
                    .lock()
                    .unwrap()
                    .get_mut(&request.prompt_key)
                    .and_then(next_reply),
            }
        };

        match reply {
            Some(ModelReply::Data(data)) => Ok(InferenceResponse {
                success: true,
                data,
                error: None,
            }),
            Some(ModelReply::Error(message)) => Err(InferenceError::Unsuccessful(message)),
            None => Err(InferenceError::Unsuccessful("no scripted reply".into())),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub(crate) const CONFLICTED_TS: &str = "export const greeting = () => {\n<<<<<<< HEAD\n  return 'hello';\n=======\n  return 'hi there';\n>>>>>>> feature\n};\n";

pub(crate) const RESOLVED_TS: &str = "export const greeting = () => {\n  return 'hi there';\n};";

pub(crate) const ANALYSIS_JSON: &str = r#"Here is the analysis:
{"currentBranchIntent":"keep short greeting","incomingBranchIntent":"friendlier greeting","conflictType":"compatible","recommendedStrategy":"prefer_incoming","explanation":"Both change the same literal.","complexity":"simple"}"#;

/// Write `content` to `relative` inside `repo`, creating parent directories.
pub(crate) fn write_file(repo: &Path, relative: &str, content: &str) {
    let path = repo.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}
