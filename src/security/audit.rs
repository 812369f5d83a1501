//! Line-oriented security/audit log.
//!
//! Records boundary and symlink denials, CSRF failures, rate-limit trips,
//! and successful sensitive operations. The file is append-only; writes are
//! serialized behind a mutex. An unwritable file degrades to a startup
//! warning, never a request failure.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::net::IpAddr;
use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};

use crate::security::boundary::Denial;

pub struct AuditLog {
    file: Option<Mutex<File>>,
}

impl AuditLog {
    /// Open (or create) the audit file. `None` disables the file entirely.
    pub fn open(path: Option<&Path>) -> Self {
        let file = match path {
            Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => Some(Mutex::new(file)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "audit log unavailable");
                    None
                }
            },
            None => None,
        };
        Self { file }
    }

    pub fn denial(&self, client: IpAddr, raw_input: &str, reason: Denial) {
        let event = match reason {
            Denial::InvalidPath => "DENY_INVALID_PATH",
            Denial::SymlinkRejected => "DENY_SYMLINK",
            Denial::OutsideBoundary => "DENY_BOUNDARY",
        };
        self.record(event, client, &format!("input={:?}", raw_input));
    }

    pub fn csrf_failure(&self, client: IpAddr) {
        self.record("DENY_CSRF", client, "state-changing request refused");
    }

    pub fn rate_limited(&self, client: IpAddr, path: &str) {
        self.record("RATE_LIMITED", client, &format!("path={}", path));
    }

    pub fn theme_saved(&self, client: IpAddr, id: &str) {
        self.record("THEME_SAVED", client, &format!("id={}", id));
    }

    fn record(&self, event: &str, client: impl Display, detail: &str) {
        let Some(file) = &self.file else {
            return;
        };
        let line = format!(
            "{} {} client={} {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            event,
            client,
            detail
        );
        let mut file = file.lock().expect("audit log mutex poisoned");
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::warn!(error = %e, "audit log write failed");
        }
    }
}
