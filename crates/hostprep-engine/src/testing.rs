//! Scripted fake shell for engine unit tests

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use hostprep_exec::{CommandResult, ExecError, RemoteShell};

/// Rule matched against issued commands by substring, first match wins
struct Rule {
    needle: String,
    status: i32,
    stdout: String,
    stderr: String,
}

/// Fake shell that answers commands from scripted rules and records
/// everything issued to it
///
/// Unmatched commands exit 1 by default, or 0 after `ok_all`.
pub struct ScriptedShell {
    rules: Vec<Rule>,
    default_status: i32,
    commands: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
}

impl ScriptedShell {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            default_status: 1,
            commands: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Commands containing `needle` exit 0
    pub fn ok_on(mut self, needle: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            status: 0,
            stdout: String::new(),
            stderr: String::new(),
        });
        self
    }

    /// Commands containing `needle` exit 0 with the given stdout
    pub fn ok_on_with(mut self, needle: impl Into<String>, stdout: impl Into<String>) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        });
        self
    }

    /// Commands containing `needle` exit with the given status and stderr
    pub fn fail_on_with(
        mut self,
        needle: impl Into<String>,
        status: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.rules.push(Rule {
            needle: needle.into(),
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        });
        self
    }

    /// Unmatched commands exit 0 instead of 1
    pub fn ok_all(mut self) -> Self {
        self.default_status = 0;
        self
    }

    /// Every command issued, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Every upload destination, in order
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteShell for ScriptedShell {
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        self.commands.lock().unwrap().push(cmd.to_string());

        let (status, stdout, stderr) = self
            .rules
            .iter()
            .find(|rule| cmd.contains(&rule.needle))
            .map_or((self.default_status, String::new(), String::new()), |r| {
                (r.status, r.stdout.clone(), r.stderr.clone())
            });

        Ok(CommandResult {
            status,
            stdout,
            stderr,
            duration: Duration::from_millis(1),
        })
    }

    async fn upload(&self, _data: &[u8], remote_path: &str) -> Result<(), ExecError> {
        self.uploads.lock().unwrap().push(remote_path.to_string());
        Ok(())
    }

    fn shell_type(&self) -> &'static str {
        "scripted"
    }
}
