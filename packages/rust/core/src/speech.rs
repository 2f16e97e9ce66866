//! Read-aloud through an external text-to-speech program.
//!
//! At most one utterance plays at a time. Starting a new one kills the
//! previous process; there is no queue.

use std::sync::{Arc, Mutex, PoisonError};

use tenantchat_markdown::speakable_text;
use tenantchat_shared::{Result, SpeechConfig, TenantChatError};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

const TEXT_PLACEHOLDER: &str = "{text}";

#[derive(Debug, Clone)]
pub struct SpeechPlayer {
    config: SpeechConfig,
    current: Arc<Mutex<Option<Child>>>,
}

impl SpeechPlayer {
    pub fn new(config: SpeechConfig) -> Self {
        Self {
            config,
            current: Arc::new(Mutex::new(None)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Speak `text` after stripping emoji and markup, cancelling anything
    /// already playing. Must be called inside a tokio runtime.
    pub fn speak(&self, text: &str) -> Result<()> {
        if !self.config.enabled {
            return Ok(());
        }
        let cleaned = speakable_text(text);
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        cancel(&mut current);

        if cleaned.trim().is_empty() {
            return Ok(());
        }

        let child = Command::new(&self.config.program)
            .args(self.arguments(&cleaned))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TenantChatError::config(format!(
                    "failed to start speech program `{}`: {e}",
                    self.config.program
                ))
            })?;
        debug!(pid = ?child.id(), "speaking");
        *current = Some(child);
        Ok(())
    }

    /// Stop the current utterance, if any.
    pub fn stop(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        cancel(&mut current);
    }

    /// Whether an utterance is still playing.
    pub fn is_speaking(&self) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let finished = match current.as_mut() {
            Some(child) => !matches!(child.try_wait(), Ok(None)),
            None => return false,
        };
        if finished {
            *current = None;
        }
        !finished
    }

    /// Program arguments with `{text}` filled in; appended when no argument
    /// carries the placeholder.
    fn arguments(&self, text: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .config
            .args
            .iter()
            .map(|arg| arg.replace(TEXT_PLACEHOLDER, text))
            .collect();
        if !self.config.args.iter().any(|a| a.contains(TEXT_PLACEHOLDER)) {
            args.push(text.to_string());
        }
        args
    }
}

fn cancel(current: &mut Option<Child>) {
    if let Some(mut child) = current.take() {
        if let Err(e) = child.start_kill() {
            warn!(error = %e, "failed to stop speech process");
        }
    }
}
