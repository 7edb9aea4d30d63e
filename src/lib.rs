//! infra-mgr - Terraform configuration generation and resource toggling
//!
//! This library renders Terraform-style configuration from an in-memory
//! block model, reads Terraform outputs, and starts or stops the database
//! cluster and notebook instance those outputs name.
//!
//! # Example
//!
//! ```rust
//! use infra_mgr::hcl::{render_document, Block};
//!
//! let backend = Block::new("terraform")
//!     .with_child(Block::new("backend").with_subtype("s3").with_attribute("bucket", "state"));
//!
//! let text = render_document(&[backend]);
//! assert!(text.contains("backend \"s3\" {"));
//! assert!(text.contains("        bucket = \"state\""));
//! ```

pub mod cloud;
pub mod command;
pub mod config;
pub mod error;
pub mod generate;
pub mod hcl;
pub mod lifecycle;
pub mod terraform;

pub use cloud::{AwsCli, CloudError, ResourceApi, ResourceKind, ResourceStatus};
pub use command::{CommandOutput, CommandRunner, SystemRunner};
pub use config::{ConfigError, ResolvedSettings, Settings};
pub use error::{Error, InvalidBlockError};
pub use hcl::{Block, RenderConfig, Value};
pub use lifecycle::{Action, Mode, PollConfig, Target, ToggleOutcome};
pub use terraform::Terraform;

/// Terraform output naming the database cluster
pub const CLUSTER_OUTPUT: &str = "rds_cluster_name";

/// Terraform output naming the notebook instance
pub const NOTEBOOK_OUTPUT: &str = "sgmkr_name";

/// Look up the managed resources from Terraform outputs
///
/// A resource whose output is unavailable is left out; the Terraform reader
/// has already logged why.
pub fn discover_targets<R: CommandRunner>(terraform: &Terraform<R>) -> Vec<Target> {
    [
        (ResourceKind::DbCluster, CLUSTER_OUTPUT),
        (ResourceKind::NotebookInstance, NOTEBOOK_OUTPUT),
    ]
    .into_iter()
    .filter_map(|(kind, output)| {
        terraform
            .output_string(output)
            .map(|id| Target::new(kind, id))
    })
    .collect()
}
