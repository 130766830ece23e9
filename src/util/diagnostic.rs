//! User-friendly diagnostic messages.
//!
//! Every build failure is rendered with its root cause, the stage that
//! produced it, and suggested fixes.

use std::fmt;

/// Common suggestion messages for consistent error handling.
pub mod suggestions {
    /// Suggestion when the manifest file is empty.
    pub const EMPTY_MANIFEST: &str =
        "help: Add at least a `project:` entry to the manifest, or pass `--project`";

    /// Suggestion when the manifest cannot be parsed.
    pub const MANIFEST_FORMAT: &str =
        "help: The manifest is YAML with optional `project`, `configuration` and `assembly` keys";

    /// Suggestion when no project file can be found.
    pub const NO_PROJECT: &str = "help: Pass the project explicitly with `--project <file>`";

    /// Suggestion when the build configuration is blank.
    pub const NO_CONFIGURATION: &str =
        "help: Pass a configuration with `--configuration <name>` or set `build.configuration`";

    /// Suggestion when the assembly name cannot be determined.
    pub const NO_ASSEMBLY: &str = "help: Pass the assembly explicitly with `--assembly <name>.dll`";

    /// Suggestion when a named source cannot be resolved.
    pub const SOURCE_UNAVAILABLE: &str =
        "help: Check the `contextkey`/`dockerfilekey` options point at an existing source";

    /// Suggestion when the runtime image config cannot be fetched.
    pub const IMAGE_CONFIG: &str =
        "help: Check the runtime image reference, or pass `--runtime-config <file>` when planning locally";

    /// Suggestion when the executor rejects the graph.
    pub const SUBMISSION_FAILED: &str = "help: Run with `--verbose` to see the submitted stage graph";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional suggestions.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self, color: bool) -> String {
        let mut output = String::new();

        let severity_str = if color {
            match self.severity {
                Severity::Error => "\x1b[1;31merror\x1b[0m".to_string(),
                Severity::Warning => "\x1b[1;33mwarning\x1b[0m".to_string(),
            }
        } else {
            self.severity.to_string()
        };

        output.push_str(&format!("{}: {}\n", severity_str, self.message));

        for ctx in &self.context {
            output.push_str(&format!("  → {}\n", ctx));
        }

        if !self.suggestions.is_empty() {
            output.push('\n');
            let help_prefix = if color {
                "\x1b[1;32mhelp\x1b[0m"
            } else {
                "help"
            };
            output.push_str(&format!("{}: consider:\n", help_prefix));
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                let suggestion = suggestion.strip_prefix("help: ").unwrap_or(suggestion);
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion));
            }
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format(false))
    }
}

/// Print a diagnostic to stderr.
pub fn emit(diagnostic: &Diagnostic, color: bool) {
    eprint!("{}", diagnostic.format(color));
}
