//! External command execution.
//!
//! Every process the pipeline launches goes through a [`CommandRunner`] so
//! that each invocation carries its own timeout and can be substituted in
//! tests. The system implementation kills the child when the timeout fires.

use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::error::SetupError;

/// A fully specified external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub timeout: Duration,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I, timeout: Duration) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            timeout,
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub success: bool,
    pub status: String,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            success: true,
            status: "exit status: 0".to_string(),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            success: false,
            status: format!("exit status: {code}"),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    /// Turn a non-zero exit into [`SetupError::CommandFailed`].
    pub fn check(self, cmd: &CommandSpec) -> Result<Self, SetupError> {
        if self.success {
            Ok(self)
        } else {
            Err(SetupError::CommandFailed {
                program: cmd.to_string(),
                status: self.status,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }

    pub fn first_stdout_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

impl From<std::process::Output> for CommandOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            status: output.status.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Launches external programs and resolves them on `PATH`.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run the command to completion. A non-zero exit is *not* an error here;
    /// spawn failures and timeouts are.
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, SetupError>;

    /// Resolve a program name on the executable search path.
    fn resolve(&self, program: &str) -> Option<PathBuf>;

    fn is_available(&self, program: &str) -> bool {
        self.resolve(program).is_some()
    }

    /// Run the command and fail on a non-zero exit.
    async fn run_checked(&self, cmd: &CommandSpec) -> Result<CommandOutput, SetupError> {
        self.run(cmd).await?.check(cmd)
    }
}

/// Runs commands on the host with Tokio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, SetupError> {
        log::debug!("Running `{cmd}` (timeout {}s)", cmd.timeout.as_secs());

        let child = Command::new(&cmd.program)
            .args(&cmd.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        match timeout(cmd.timeout, child).await {
            Ok(Ok(output)) => {
                let output = CommandOutput::from(output);
                log::debug!("`{}` finished with {}", cmd.program, output.status);
                Ok(output)
            }
            Ok(Err(source)) => Err(SetupError::Spawn {
                program: cmd.program.clone(),
                source,
            }),
            Err(_) => Err(SetupError::CommandTimeout {
                program: cmd.to_string(),
                secs: cmd.timeout.as_secs(),
            }),
        }
    }

    fn resolve(&self, program: &str) -> Option<PathBuf> {
        which::which(program).ok()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted runner used by the pipeline tests.

    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Records every command line and answers from a script. Unscripted
    /// commands succeed with empty output.
    #[derive(Default)]
    pub(crate) struct RecordingRunner {
        available: Mutex<HashMap<String, PathBuf>>,
        responses: HashMap<String, CommandOutput>,
        provides: HashMap<String, Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingRunner {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        /// Make `program` resolvable as `/usr/bin/<program>`.
        pub(crate) fn with_program(self, program: &str) -> Self {
            self.available
                .lock()
                .unwrap()
                .insert(program.to_string(), PathBuf::from(format!("/usr/bin/{program}")));
            self
        }

        pub(crate) fn respond(mut self, line: &str, output: CommandOutput) -> Self {
            self.responses.insert(line.to_string(), output);
            self
        }

        /// A successful run of `line` makes `program` resolvable.
        pub(crate) fn provides(mut self, line: &str, program: &str) -> Self {
            self.provides
                .entry(line.to_string())
                .or_default()
                .push(program.to_string());
            self
        }

        pub(crate) fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        pub(crate) fn count(&self, line: &str) -> usize {
            self.calls().iter().filter(|c| c.as_str() == line).count()
        }

        pub(crate) fn ran(&self, line: &str) -> bool {
            self.count(line) > 0
        }

        pub(crate) fn ran_program(&self, program: &str) -> bool {
            self.calls()
                .iter()
                .any(|c| c.split_whitespace().next() == Some(program))
        }
    }

    impl CommandRunner for RecordingRunner {
        async fn run(&self, cmd: &CommandSpec) -> Result<CommandOutput, SetupError> {
            let line = cmd.to_string();
            self.calls.lock().unwrap().push(line.clone());

            let output = self
                .responses
                .get(&line)
                .cloned()
                .unwrap_or_else(|| CommandOutput::ok(""));

            if output.success {
                if let Some(programs) = self.provides.get(&line) {
                    let mut available = self.available.lock().unwrap();
                    for program in programs {
                        available.insert(program.clone(), PathBuf::from(format!("/usr/bin/{program}")));
                    }
                }
            }
            Ok(output)
        }

        fn resolve(&self, program: &str) -> Option<PathBuf> {
            self.available.lock().unwrap().get(program).cloned()
        }
    }
}
