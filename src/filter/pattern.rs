//! Scope-value pattern filtering.
//!
//! # Responsibilities
//! - Load line-oriented rule files into compiled regex sets at startup
//! - Answer "is this scope value allowed" for scope-taking handlers
//!
//! # Rule file format
//! - Blank lines and lines starting with `#` are ignored
//! - A line wrapped in `/` ... `/` is compiled as a raw regex
//! - Any other line is a literal with `*` wildcards: the literal is
//!   escaped, `*` becomes `.*`, and the whole line is anchored
//!
//! # Design Decisions
//! - A malformed regex line is reported and skipped; the remaining
//!   valid lines still load (pinned by tests)
//! - An unreadable rule file is a fatal startup error
//! - Compiled sets are immutable; no locking on the request path

use std::fs;
use std::path::Path;

use regex::Regex;

use crate::config::schema::PatternFilterConfig;

/// Error type for rule loading.
#[derive(Debug)]
pub enum PatternError {
    /// Rule file could not be read.
    Io(std::path::PathBuf, std::io::Error),
}

impl std::fmt::Display for PatternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternError::Io(path, e) => {
                write!(f, "Failed to read rule file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for PatternError {}

/// Compile a single rule line into an anchored regex.
///
/// Returns `None` for a malformed raw-regex line; the caller reports
/// and skips it.
fn compile_line(line: &str) -> Option<Regex> {
    let pattern = if line.len() > 1 && line.starts_with('/') && line.ends_with('/') {
        // Raw regex, still anchored to the full value.
        format!("^(?:{})$", &line[1..line.len() - 1])
    } else {
        // Literal with `*` wildcards.
        let escaped = regex::escape(line).replace(r"\*", ".*");
        format!("^{}$", escaped)
    };
    Regex::new(&pattern).ok()
}

/// Parse rule lines from file content, skipping blanks, comments, and
/// malformed lines.
fn parse_rules(content: &str, source: &Path) -> Vec<Regex> {
    let mut rules = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match compile_line(line) {
            Some(re) => rules.push(re),
            None => tracing::warn!(
                file = %source.display(),
                line = number + 1,
                rule = %line,
                "Skipping malformed pattern rule"
            ),
        }
    }
    rules
}

fn load_rule_file(path: &Path) -> Result<Vec<Regex>, PatternError> {
    let content =
        fs::read_to_string(path).map_err(|e| PatternError::Io(path.to_path_buf(), e))?;
    Ok(parse_rules(&content, path))
}

/// Immutable pattern filter, compiled once at process start.
#[derive(Debug, Clone)]
pub struct PatternFilter {
    enabled: bool,
    allow: Vec<Regex>,
    deny: Vec<Regex>,
    whitelist_overrides: bool,
}

impl PatternFilter {
    /// Load and compile rule files per configuration.
    pub fn from_config(config: &PatternFilterConfig) -> Result<Self, PatternError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let allow = match &config.allow_file {
            Some(path) => load_rule_file(path)?,
            None => Vec::new(),
        };
        let deny = match &config.deny_file {
            Some(path) => load_rule_file(path)?,
            None => Vec::new(),
        };
        tracing::info!(
            allow_rules = allow.len(),
            deny_rules = deny.len(),
            whitelist_overrides = config.whitelist_overrides_blacklist,
            "Pattern filter compiled"
        );
        Ok(Self {
            enabled: true,
            allow,
            deny,
            whitelist_overrides: config.whitelist_overrides_blacklist,
        })
    }

    /// Filter that lets everything through.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            allow: Vec::new(),
            deny: Vec::new(),
            whitelist_overrides: false,
        }
    }

    /// Evaluate a client-supplied scope value.
    pub fn is_allowed(&self, value: &str) -> bool {
        if !self.enabled {
            return true;
        }

        // In override mode a non-empty whitelist is exhaustive: a match
        // wins over any deny rule, a non-match fails outright.
        if self.whitelist_overrides && !self.allow.is_empty() {
            let allowed = self.allow.iter().any(|re| re.is_match(value));
            if !allowed {
                tracing::debug!(value = %value, "Scope value outside override whitelist");
            }
            return allowed;
        }

        if self.deny.iter().any(|re| re.is_match(value)) {
            tracing::debug!(value = %value, "Scope value matched deny pattern");
            return false;
        }

        // No allow set at all defaults to allow; a non-override allow
        // set must be matched.
        if self.allow.is_empty() {
            true
        } else {
            let allowed = self.allow.iter().any(|re| re.is_match(value));
            if !allowed {
                tracing::debug!(value = %value, "Scope value outside whitelist");
            }
            allowed
        }
    }
}
