//! Password reset delivery
//!
//! The reset flow hands the finished link to a sender. Sending is
//! synchronous from the flow's point of view; senders that do I/O spawn
//! their own task.

use std::sync::Mutex;

use crate::error::AuthResult;

pub trait ResetPasswordSender: Send + Sync {
    fn send(&self, email: &str, url: &str) -> AuthResult<()>;
}

/// Logs the link instead of mailing it
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResetPasswordSender;

impl ResetPasswordSender for LogResetPasswordSender {
    fn send(&self, email: &str, url: &str) -> AuthResult<()> {
        tracing::info!(email = %email, url = %url, "Password reset link issued");
        Ok(())
    }
}

/// Keeps every sent link in memory
#[derive(Debug, Default)]
pub struct RecordingResetPasswordSender {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingResetPasswordSender {
    /// `(email, url)` pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn last_url_for(&self, email: &str) -> Option<String> {
        self.sent()
            .into_iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, url)| url)
    }
}

impl ResetPasswordSender for RecordingResetPasswordSender {
    fn send(&self, email: &str, url: &str) -> AuthResult<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((email.to_string(), url.to_string()));
        }
        Ok(())
    }
}
