//! Lifecycle state of the managed cloud resources
//!
//! The database cluster and the notebook instance are queried and toggled
//! through [`ResourceApi`]. [`AwsCli`] implements it on top of the `aws`
//! command-line tool.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::command::CommandRunner;

/// The kinds of resource this tool manages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Aurora/RDS database cluster
    DbCluster,
    /// SageMaker notebook instance
    NotebookInstance,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::DbCluster => write!(f, "cluster"),
            ResourceKind::NotebookInstance => write!(f, "notebook instance"),
        }
    }
}

/// Status reported by the cloud, always compared in lowercase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceStatus {
    Available,
    Starting,
    Stopping,
    Stopped,
    InService,
    Pending,
    Updating,
    Deleting,
    Failed,
    Other(String),
}

impl ResourceStatus {
    /// Parse a status string regardless of case
    pub fn parse(status: &str) -> Self {
        let status = status.trim().to_lowercase();
        match status.as_str() {
            "available" => ResourceStatus::Available,
            "starting" => ResourceStatus::Starting,
            "stopping" => ResourceStatus::Stopping,
            "stopped" => ResourceStatus::Stopped,
            "inservice" => ResourceStatus::InService,
            "pending" => ResourceStatus::Pending,
            "updating" => ResourceStatus::Updating,
            "deleting" => ResourceStatus::Deleting,
            "failed" => ResourceStatus::Failed,
            _ => ResourceStatus::Other(status),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ResourceStatus::Available => "available",
            ResourceStatus::Starting => "starting",
            ResourceStatus::Stopping => "stopping",
            ResourceStatus::Stopped => "stopped",
            ResourceStatus::InService => "inservice",
            ResourceStatus::Pending => "pending",
            ResourceStatus::Updating => "updating",
            ResourceStatus::Deleting => "deleting",
            ResourceStatus::Failed => "failed",
            ResourceStatus::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Errors from querying or commanding a resource
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("failed to run the aws cli: {0}")]
    Io(#[from] std::io::Error),

    #[error("aws {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("unexpected response from aws {operation}: {reason}")]
    InvalidResponse { operation: String, reason: String },
}

/// Query and change the lifecycle state of a resource
pub trait ResourceApi {
    fn status(&self, kind: ResourceKind, id: &str) -> Result<ResourceStatus, CloudError>;
    fn start(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError>;
    fn stop(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError>;
}

impl<A: ResourceApi + ?Sized> ResourceApi for &A {
    fn status(&self, kind: ResourceKind, id: &str) -> Result<ResourceStatus, CloudError> {
        (**self).status(kind, id)
    }

    fn start(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError> {
        (**self).start(kind, id)
    }

    fn stop(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError> {
        (**self).stop(kind, id)
    }
}

#[derive(Deserialize)]
struct DescribeDbClusters {
    #[serde(rename = "DBClusters")]
    db_clusters: Vec<DbCluster>,
}

#[derive(Deserialize)]
struct DbCluster {
    #[serde(rename = "DBClusterIdentifier")]
    identifier: String,
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Deserialize)]
struct DescribeNotebookInstance {
    #[serde(rename = "NotebookInstanceStatus")]
    status: String,
}

/// [`ResourceApi`] backed by the `aws` command-line tool
#[derive(Debug, Clone)]
pub struct AwsCli<R> {
    runner: R,
    binary: String,
    profile: Option<String>,
    region: Option<String>,
}

impl<R: CommandRunner> AwsCli<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            binary: "aws".to_string(),
            profile: None,
            region: None,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Run `aws <service> <operation> <args>` and return stdout
    fn call(&self, service: &str, operation: &str, args: &[&str]) -> Result<String, CloudError> {
        let mut argv = vec![service, operation];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["--output", "json"]);
        if let Some(profile) = &self.profile {
            argv.extend_from_slice(&["--profile", profile.as_str()]);
        }
        if let Some(region) = &self.region {
            argv.extend_from_slice(&["--region", region.as_str()]);
        }

        let result = self.runner.run(&self.binary, &argv)?;
        if !result.success() {
            return Err(CloudError::CommandFailed {
                operation: format!("{} {}", service, operation),
                stderr: result.stderr.trim().to_string(),
            });
        }
        Ok(result.stdout)
    }

    fn call_json<T: DeserializeOwned>(
        &self,
        service: &str,
        operation: &str,
        args: &[&str],
    ) -> Result<T, CloudError> {
        let stdout = self.call(service, operation, args)?;
        serde_json::from_str(&stdout).map_err(|e| CloudError::InvalidResponse {
            operation: format!("{} {}", service, operation),
            reason: e.to_string(),
        })
    }
}

impl<R: CommandRunner> ResourceApi for AwsCli<R> {
    fn status(&self, kind: ResourceKind, id: &str) -> Result<ResourceStatus, CloudError> {
        match kind {
            ResourceKind::DbCluster => {
                let response: DescribeDbClusters =
                    self.call_json("rds", "describe-db-clusters", &[])?;
                response
                    .db_clusters
                    .into_iter()
                    .find(|cluster| cluster.identifier == id)
                    .map(|cluster| ResourceStatus::parse(&cluster.status))
                    .ok_or_else(|| CloudError::NotFound {
                        kind,
                        id: id.to_string(),
                    })
            }
            ResourceKind::NotebookInstance => {
                let response: DescribeNotebookInstance = self.call_json(
                    "sagemaker",
                    "describe-notebook-instance",
                    &["--notebook-instance-name", id],
                )?;
                Ok(ResourceStatus::parse(&response.status))
            }
        }
    }

    fn start(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError> {
        match kind {
            ResourceKind::DbCluster => {
                self.call("rds", "start-db-cluster", &["--db-cluster-identifier", id])?
            }
            ResourceKind::NotebookInstance => self.call(
                "sagemaker",
                "start-notebook-instance",
                &["--notebook-instance-name", id],
            )?,
        };
        Ok(())
    }

    fn stop(&self, kind: ResourceKind, id: &str) -> Result<(), CloudError> {
        match kind {
            ResourceKind::DbCluster => {
                self.call("rds", "stop-db-cluster", &["--db-cluster-identifier", id])?
            }
            ResourceKind::NotebookInstance => self.call(
                "sagemaker",
                "stop-notebook-instance",
                &["--notebook-instance-name", id],
            )?,
        };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::CommandOutput;
    use std::cell::RefCell;
    use std::io;

    struct ScriptedRunner {
        stdout: String,
        exit_code: i32,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn new(stdout: &str, exit_code: i32) -> Self {
            Self {
                stdout: stdout.to_string(),
                exit_code,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<CommandOutput> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            Ok(CommandOutput {
                stdout: self.stdout.clone(),
                stderr: "An error occurred".to_string(),
                exit_code: Some(self.exit_code),
            })
        }
    }

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(ResourceStatus::parse("InService"), ResourceStatus::InService);
        assert_eq!(ResourceStatus::parse("STOPPED"), ResourceStatus::Stopped);
        assert_eq!(ResourceStatus::parse(" available "), ResourceStatus::Available);
        assert_eq!(
            ResourceStatus::parse("Backing-Up"),
            ResourceStatus::Other("backing-up".to_string())
        );
        assert_eq!(ResourceStatus::parse("Backing-Up").to_string(), "backing-up");
    }

    #[test]
    fn test_cluster_status_found() {
        let runner = ScriptedRunner::new(
            r#"{"DBClusters": [
                {"DBClusterIdentifier": "other", "Status": "available"},
                {"DBClusterIdentifier": "main-db", "Status": "Stopped"}
            ]}"#,
            0,
        );
        let aws = AwsCli::new(&runner).with_profile("dev").with_region("us-east-1");
        let status = aws.status(ResourceKind::DbCluster, "main-db").unwrap();
        assert_eq!(status, ResourceStatus::Stopped);
        assert_eq!(
            runner.calls.borrow()[0],
            "aws rds describe-db-clusters --output json --profile dev --region us-east-1"
        );
    }

    #[test]
    fn test_cluster_status_not_found() {
        let runner = ScriptedRunner::new(r#"{"DBClusters": []}"#, 0);
        let aws = AwsCli::new(&runner);
        let err = aws.status(ResourceKind::DbCluster, "missing").unwrap_err();
        assert!(matches!(err, CloudError::NotFound { kind: ResourceKind::DbCluster, .. }));
        assert_eq!(err.to_string(), "cluster not found: missing");
    }

    #[test]
    fn test_notebook_status() {
        let runner = ScriptedRunner::new(r#"{"NotebookInstanceStatus": "InService"}"#, 0);
        let aws = AwsCli::new(&runner);
        let status = aws.status(ResourceKind::NotebookInstance, "nb").unwrap();
        assert_eq!(status, ResourceStatus::InService);
        assert_eq!(
            runner.calls.borrow()[0],
            "aws sagemaker describe-notebook-instance --notebook-instance-name nb --output json"
        );
    }

    #[test]
    fn test_invalid_response() {
        let runner = ScriptedRunner::new("not json", 0);
        let aws = AwsCli::new(&runner);
        let err = aws.status(ResourceKind::NotebookInstance, "nb").unwrap_err();
        assert!(matches!(err, CloudError::InvalidResponse { .. }));
    }

    #[test]
    fn test_start_and_stop_commands() {
        let runner = ScriptedRunner::new("{}", 0);
        let aws = AwsCli::new(&runner);
        aws.start(ResourceKind::DbCluster, "db").unwrap();
        aws.stop(ResourceKind::NotebookInstance, "nb").unwrap();
        let calls = runner.calls.borrow();
        assert_eq!(
            calls[0],
            "aws rds start-db-cluster --db-cluster-identifier db --output json"
        );
        assert_eq!(
            calls[1],
            "aws sagemaker stop-notebook-instance --notebook-instance-name nb --output json"
        );
    }

    #[test]
    fn test_command_failure() {
        let runner = ScriptedRunner::new("", 254);
        let aws = AwsCli::new(&runner);
        let err = aws.stop(ResourceKind::DbCluster, "db").unwrap_err();
        assert_eq!(err.to_string(), "aws rds stop-db-cluster failed: An error occurred");
    }
}
