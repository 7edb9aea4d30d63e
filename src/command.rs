//! Running external programs and capturing their output

use std::io;
use std::path::PathBuf;
use std::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// None when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Something that can run a program to completion
///
/// Implemented by [`SystemRunner`] for real processes and by fakes in tests.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        (**self).run(program, args)
    }
}

/// Runs programs with `std::process::Command`
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    /// Directory to run in, the current one when unset
    pub working_dir: Option<PathBuf>,
    /// Extra environment variables
    pub env: Vec<(String, String)>,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        tracing::debug!(program, ?args, "running command");
        let output = cmd.output()?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_requires_zero_exit() {
        let ok = CommandOutput {
            exit_code: Some(0),
            ..Default::default()
        };
        let failed = CommandOutput {
            exit_code: Some(1),
            ..Default::default()
        };
        let killed = CommandOutput::default();
        assert!(ok.success());
        assert!(!failed.success());
        assert!(!killed.success());
    }

    #[test]
    fn test_missing_program_is_an_io_error() {
        let runner = SystemRunner::new();
        let result = runner.run("definitely-not-a-real-program-4a1f", &[]);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder() {
        let runner = SystemRunner::new()
            .with_working_dir("/tmp")
            .with_env("TF_IN_AUTOMATION", "1");
        assert_eq!(runner.working_dir, Some(PathBuf::from("/tmp")));
        assert_eq!(runner.env, vec![("TF_IN_AUTOMATION".to_string(), "1".to_string())]);
    }
}
