//! Classification of raw compiler output.
//!
//! `classify` is deterministic and side-effect-free: the same raw text
//! always produces the same diagnostic. Categories are checked in order
//! and are mutually exclusive; the first match wins.

use regex::Regex;

const SYNTAX_MESSAGE: &str = "Component source has a syntax error";
const DEPENDENCY_MESSAGE: &str = "Component dependency missing";
const CONFIG_MESSAGE: &str = "Build configuration error";
const UNKNOWN_MESSAGE: &str = "Component build failed";

/// Category of a build failure, with whatever structure could be
/// extracted from the raw output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    Syntax {
        /// Text after `SyntaxError:`, when present.
        reason: Option<String>,
        /// `file:line:column` triple, when no reason line was found.
        location: Option<SourceLocation>,
    },
    Dependency {
        /// The module that could not be resolved, when extractable.
        module: Option<String>,
    },
    Config,
    Unknown,
}

impl DiagnosticKind {
    /// Stable lowercase label, used in logs and repair prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Syntax { .. } => "syntax",
            Self::Dependency { .. } => "dependency",
            Self::Config => "config",
            Self::Unknown => "unknown",
        }
    }
}

/// Position parsed from a `file:line:column` fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// Classified build failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDiagnostic {
    pub kind: DiagnosticKind,
    /// Fixed per-category summary.
    pub message: String,
    /// Extracted elaboration; falls back to the raw text.
    pub details: String,
    /// Verbatim compiler output.
    pub raw: String,
}

/// Classify raw compiler output into a [`BuildDiagnostic`].
pub fn classify(raw: &str) -> BuildDiagnostic {
    if raw.contains("SyntaxError") || raw.contains("Unexpected token") {
        let reason = capture(r"SyntaxError: (.+?)(?:\n|$)", raw);
        let location = if reason.is_none() {
            extract_location(raw)
        } else {
            None
        };
        let details = reason
            .clone()
            .or_else(|| location.as_ref().map(render_location))
            .unwrap_or_else(|| raw.to_string());

        return BuildDiagnostic {
            kind: DiagnosticKind::Syntax { reason, location },
            message: SYNTAX_MESSAGE.to_string(),
            details,
            raw: raw.to_string(),
        };
    }

    if raw.contains("Module not found") || raw.contains("Can't resolve") {
        let module =
            capture(r"Can't resolve '(.+?)'", raw).or_else(|| capture(r"Module not found: (.+?)'", raw));
        let details = match &module {
            Some(name) => format!("Cannot find module: {name}"),
            None => "Dependency resolution failed".to_string(),
        };

        return BuildDiagnostic {
            kind: DiagnosticKind::Dependency { module },
            message: DEPENDENCY_MESSAGE.to_string(),
            details,
            raw: raw.to_string(),
        };
    }

    // Case-sensitive on purpose: matches what the compiler actually prints.
    if raw.contains("Configuration") || raw.contains("config") {
        return BuildDiagnostic {
            kind: DiagnosticKind::Config,
            message: CONFIG_MESSAGE.to_string(),
            details: raw.to_string(),
            raw: raw.to_string(),
        };
    }

    BuildDiagnostic {
        kind: DiagnosticKind::Unknown,
        message: UNKNOWN_MESSAGE.to_string(),
        details: raw.to_string(),
        raw: raw.to_string(),
    }
}

/// Render the fixed user-facing message for a diagnostic.
pub fn user_message(diagnostic: &BuildDiagnostic) -> String {
    match diagnostic.kind {
        DiagnosticKind::Syntax { .. } => {
            format!("Syntax error: {}\n{}", diagnostic.message, diagnostic.details)
        }
        DiagnosticKind::Dependency { .. } => format!(
            "Dependency error: {}\n{}\nCheck the source for third-party libraries that are not installed",
            diagnostic.message, diagnostic.details
        ),
        DiagnosticKind::Config => format!(
            "Configuration error: {}\n{}\nContact the system operator",
            diagnostic.message, diagnostic.details
        ),
        DiagnosticKind::Unknown => format!(
            "Build failed: {}\n{}\nCheck that the source is valid React and TypeScript",
            diagnostic.message, diagnostic.details
        ),
    }
}

fn capture(pattern: &str, raw: &str) -> Option<String> {
    let re = Regex::new(pattern).ok()?;
    re.captures(raw).map(|caps| caps[1].to_string())
}

fn extract_location(raw: &str) -> Option<SourceLocation> {
    let re = Regex::new(r"(.+?):(\d+):(\d+)").ok()?;
    let caps = re.captures(raw)?;
    Some(SourceLocation {
        file: caps[1].to_string(),
        line: caps[2].parse().ok()?,
        column: caps[3].parse().ok()?,
    })
}

fn render_location(location: &SourceLocation) -> String {
    format!(
        "Syntax error at {} line {} column {}",
        location.file, location.line, location.column
    )
}
