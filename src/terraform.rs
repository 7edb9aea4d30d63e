//! Reading published outputs through the Terraform CLI

use serde_json::Value as JsonValue;

use crate::command::CommandRunner;

/// Terraform CLI wrapper
#[derive(Debug, Clone)]
pub struct Terraform<R> {
    runner: R,
    binary: String,
}

impl<R: CommandRunner> Terraform<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            binary: "terraform".to_string(),
        }
    }

    /// Use a different executable, e.g. `tofu`
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Fetch a named output as JSON
    ///
    /// Returns None when the command cannot be run or exits non-zero. Output
    /// that is not valid JSON is returned as a string with surrounding
    /// whitespace and quotes removed.
    pub fn output(&self, name: &str) -> Option<JsonValue> {
        let result = match self.runner.run(&self.binary, &["output", "-json", name]) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(output = name, error = %e, "failed to run {}", self.binary);
                return None;
            }
        };

        tracing::debug!(
            output = name,
            exit_code = ?result.exit_code,
            stdout = %result.stdout,
            stderr = %result.stderr,
            "terraform output finished"
        );

        if !result.success() {
            tracing::error!(output = name, "failed to get {} from Terraform outputs", name);
            return None;
        }

        match serde_json::from_str(&result.stdout) {
            Ok(value) => Some(value),
            Err(_) => Some(JsonValue::String(
                result.stdout.trim().trim_matches('"').to_string(),
            )),
        }
    }

    /// Fetch an output that is expected to be a string
    ///
    /// Non-string JSON values are returned in their JSON text form.
    pub fn output_string(&self, name: &str) -> Option<String> {
        self.output(name).map(|value| match value {
            JsonValue::String(s) => s,
            other => other.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use std::cell::RefCell;
    use std::io;

    struct FakeRunner {
        output: CommandOutput,
        calls: RefCell<Vec<String>>,
    }

    impl FakeRunner {
        fn new(stdout: &str, exit_code: i32) -> Self {
            Self {
                output: CommandOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: Some(exit_code),
                },
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            Ok(self.output.clone())
        }
    }

    struct BrokenRunner;

    impl CommandRunner for BrokenRunner {
        fn run(&self, _program: &str, _args: &[&str]) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::NotFound, "no such file"))
        }
    }

    #[test]
    fn test_output_parses_json() {
        let runner = FakeRunner::new("\"my-cluster\"\n", 0);
        let tf = Terraform::new(&runner);
        assert_eq!(tf.output("rds_cluster_name"), Some(JsonValue::from("my-cluster")));
        assert_eq!(
            *runner.calls.borrow(),
            vec!["terraform output -json rds_cluster_name".to_string()]
        );
    }

    #[test]
    fn test_output_structured_json() {
        let runner = FakeRunner::new("[\"a\",\"b\"]", 0);
        let tf = Terraform::new(&runner);
        assert_eq!(tf.output("subnets"), Some(serde_json::json!(["a", "b"])));
        assert_eq!(tf.output_string("subnets").as_deref(), Some("[\"a\",\"b\"]"));
    }

    #[test]
    fn test_output_non_json_is_stripped() {
        let runner = FakeRunner::new("  \"unterminated\n", 0);
        let tf = Terraform::new(&runner);
        assert_eq!(tf.output_string("x").as_deref(), Some("unterminated"));
    }

    #[test]
    fn test_non_zero_exit_is_none() {
        let runner = FakeRunner::new("", 1);
        let tf = Terraform::new(&runner);
        assert_eq!(tf.output("sgmkr_name"), None);
    }

    #[test]
    fn test_spawn_failure_is_none() {
        let tf = Terraform::new(BrokenRunner).with_binary("tofu");
        assert_eq!(tf.output("sgmkr_name"), None);
    }
}
