// crates/crease-server/src/audit.rs
// ============================================================================
// Module: Command Audit Log
// Description: JSON-line audit sinks for command and connection activity.
// Purpose: Record who did what to which match, joinable by correlation id.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every command and subscription event is recorded as one JSON line with
//! the caller's token fingerprint and the correlation id that also appears
//! in error responses. Sinks never fail the request path; a broken audit
//! write is dropped silently.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use serde::Serialize;

// ============================================================================
// SECTION: Audit Events
// ============================================================================

/// Outcome label for an audited action.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The action committed.
    Allow,
    /// The action was denied by authentication or authorization.
    Deny,
    /// The action failed with an error code.
    Error,
}

/// One audit line.
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// Event family, always `command` or `subscription`.
    pub event: &'static str,
    /// Action name, e.g. `submit_ball`.
    pub action: &'static str,
    /// Outcome label.
    pub outcome: AuditOutcome,
    /// Match identifier, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_id: Option<String>,
    /// Caller token fingerprint, when authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_fingerprint: Option<String>,
    /// Correlation identifier also present in the response.
    pub correlation_id: String,
    /// Error code, for deny and error outcomes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short detail message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink interface.
pub trait AuditSink: Send + Sync {
    /// Records one audit event.
    fn record(&self, event: &AuditEvent);
}

/// Audit sink that writes JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            #[allow(clippy::print_stderr, reason = "stderr is this sink's output channel")]
            {
                eprintln!("{line}");
            }
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Open file guarded for line-atomic appends.
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens (or creates) the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns [`std::io::Error`] when the file cannot be opened.
    pub fn new(path: &Path) -> Result<Self, std::io::Error> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &AuditEvent) {
        let Ok(line) = serde_json::to_string(event) else {
            return;
        };
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{line}");
        }
    }
}

/// No-op audit sink for tests.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &AuditEvent) {}
}
