//! Step definition for installation sequences

use std::collections::HashMap;

/// One mutating step in an installation sequence
///
/// Steps are static, defined per installer, and ordered. Each runs as
/// independent top-level shell state; the only thing carried between steps
/// is plain text captured from a prior step's stdout.
#[derive(Debug, Clone)]
pub struct Step {
    /// Human-readable description, surfaced in progress lines and failures
    pub label: String,
    /// POSIX shell command text, possibly containing `{name}` placeholders
    pub command: String,
    /// Suppress surfacing output to the progress log (output is still captured)
    pub quiet: bool,
    /// Store this step's trimmed stdout under a name for later steps
    pub capture: Option<String>,
}

impl Step {
    /// Create a step
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
            quiet: false,
            capture: None,
        }
    }

    /// Suppress output in the progress log
    #[must_use]
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Capture trimmed stdout under `name` for interpolation into later steps
    #[must_use]
    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.capture = Some(name.into());
        self
    }

    /// Render the command text, substituting `{name}` for each stored capture
    ///
    /// Only names present in `captures` are substituted; other brace text
    /// (shell expansions, nginx blocks) passes through untouched.
    #[must_use]
    pub fn render(&self, captures: &HashMap<String, String>) -> String {
        let mut cmd = self.command.clone();
        for (name, value) in captures {
            cmd = cmd.replace(&format!("{{{name}}}"), value);
        }
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_captures() {
        let mut captures = HashMap::new();
        captures.insert("home".to_string(), "/home/admin".to_string());

        let step = Step::new("write config", "mkdir -p {home}/.config");
        assert_eq!(step.render(&captures), "mkdir -p /home/admin/.config");
    }

    #[test]
    fn test_render_leaves_unknown_braces() {
        let captures = HashMap::new();
        let step = Step::new("write site", "printf 'server { listen 80; }' > /tmp/site");
        assert_eq!(step.render(&captures), step.command);
    }
}
