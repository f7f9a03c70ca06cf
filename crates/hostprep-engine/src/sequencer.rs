//! Installation sequencer: ordered mutating steps with first-failure abort

use std::collections::HashMap;

use tracing::{info, instrument};

use hostprep_exec::RemoteShell;

use crate::error::EngineError;
use crate::runner::run_step;
use crate::step::Step;

/// Plain-text values captured from step stdout, keyed by capture name
pub type Captures = HashMap<String, String>;

/// Ordered list of mutating steps for one target
///
/// The sequencer does not decide whether to run; the caller has already
/// probed. It executes steps strictly in order and aborts the remainder at
/// the first step whose result is a non-zero exit. There is no automatic
/// retry; re-invocation is the operator's call.
#[derive(Debug, Clone)]
pub struct Sequencer {
    /// Target name, for logging
    target: String,
    /// Steps in execution order
    steps: Vec<Step>,
}

impl Sequencer {
    /// Create a sequencer for a target
    pub fn new(target: impl Into<String>, steps: Vec<Step>) -> Self {
        Self {
            target: target.into(),
            steps,
        }
    }

    /// Number of steps
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the sequence has no steps
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Execute the sequence
    ///
    /// Returns the captured values on success.
    ///
    /// # Errors
    /// `EngineError::StepFailed` when a step exits non-zero (remaining steps
    /// are not dispatched), `EngineError::Exec` on transport failure.
    #[instrument(skip(self, shell), fields(target = %self.target, steps = self.steps.len()))]
    pub async fn run(&self, shell: &dyn RemoteShell) -> Result<Captures, EngineError> {
        let mut captures = Captures::new();

        for (index, step) in self.steps.iter().enumerate() {
            info!(
                target = %self.target,
                step = %step.label,
                progress = format!("{}/{}", index + 1, self.steps.len()),
                "sequence step"
            );

            let cmd = step.render(&captures);
            let result = run_step(shell, &step.label, &cmd, step.quiet).await?;

            if !result.success() {
                return Err(EngineError::StepFailed {
                    label: step.label.clone(),
                    status: result.status,
                    stderr: result.stderr.trim().to_string(),
                });
            }

            if let Some(name) = &step.capture {
                captures.insert(name.clone(), result.stdout.trim().to_string());
            }
        }

        Ok(captures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedShell;

    #[tokio::test]
    async fn test_runs_steps_in_order() {
        let shell = ScriptedShell::new().ok_all();

        let seq = Sequencer::new(
            "demo",
            vec![
                Step::new("first", "echo one"),
                Step::new("second", "echo two"),
            ],
        );

        seq.run(&shell).await.unwrap();

        assert_eq!(shell.commands(), vec!["echo one", "echo two"]);
    }

    #[tokio::test]
    async fn test_failure_aborts_remaining_steps() {
        let shell = ScriptedShell::new()
            .ok_on("apt-get update")
            .fail_on_with("apt-get install", 100, "E: Unable to locate package");

        let seq = Sequencer::new(
            "demo",
            vec![
                Step::new("refresh package index", "apt-get update"),
                Step::new("install packages", "apt-get install -y widget"),
                Step::new("never reached", "echo done"),
            ],
        );

        let err = seq.run(&shell).await.unwrap_err();
        match err {
            EngineError::StepFailed { label, status, stderr } => {
                assert_eq!(label, "install packages");
                assert_eq!(status, 100);
                assert!(stderr.contains("Unable to locate"));
            }
            other => panic!("unexpected error: {other:?}"),
        }

        // Third step must not have been dispatched
        assert_eq!(shell.commands().len(), 2);
    }

    #[tokio::test]
    async fn test_capture_feeds_later_step() {
        let shell = ScriptedShell::new()
            .ok_on_with("echo $HOME", "/home/admin\n")
            .ok_all();

        let seq = Sequencer::new(
            "demo",
            vec![
                Step::new("detect home directory", "echo $HOME").capture("home"),
                Step::new("create config dir", "mkdir -p {home}/.config"),
            ],
        );

        let captures = seq.run(&shell).await.unwrap();

        assert_eq!(captures.get("home").unwrap(), "/home/admin");
        assert_eq!(shell.commands()[1], "mkdir -p /home/admin/.config");
    }
}
