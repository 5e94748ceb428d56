//! Email allowlist for Google logins.

use std::collections::HashSet;
use std::path::Path;

/// Set of lower-cased email addresses permitted to hold a session.
///
/// Built once at startup and shared read-only. An empty list denies everyone.
#[derive(Debug, Clone, Default)]
pub struct Allowlist {
    emails: HashSet<String>,
}

impl Allowlist {
    /// Parse one address per line. Blank lines and `#` comments are skipped.
    pub fn parse(text: &str) -> Self {
        let emails = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_lowercase)
            .collect();

        Self { emails }
    }

    /// Load from `path`. A missing path or unreadable file gives an empty list.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            tracing::warn!("No allowlist file found; every login will be denied");
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(text) => {
                let allowlist = Self::parse(&text);
                tracing::info!(
                    "Loaded {} allowed emails from {}",
                    allowlist.len(),
                    path.display()
                );
                allowlist
            }
            Err(e) => {
                tracing::warn!(
                    "Could not read allowlist {}: {}; every login will be denied",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        self.emails.contains(&email.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
