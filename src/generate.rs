//! Generation of the Terraform backend and locals documents

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ResolvedSettings;
use crate::hcl::{render_document, Block, Value};

/// File name of the provider/backend document
pub const BACKEND_FILE: &str = "backend.tf";

/// File name of the locals document
pub const LOCALS_FILE: &str = "locals.tf";

/// `provider "aws"` followed by `terraform { backend "s3" }`
pub fn backend_blocks(settings: &ResolvedSettings) -> Vec<Block> {
    let provider = Block::new("provider")
        .with_name("aws")
        .with_attribute("profile", &settings.aws_profile)
        .with_attribute("region", &settings.aws_region);

    let backend = Block::new("backend")
        .with_subtype("s3")
        .with_attribute("bucket", &settings.state_bucket)
        .with_attribute("key", &settings.state_key)
        .with_attribute("region", &settings.state_bucket_region)
        .with_attribute("profile", &settings.aws_profile);

    vec![provider, Block::new("terraform").with_child(backend)]
}

/// `locals` block with the application settings and a derived prefix
pub fn locals_block(settings: &ResolvedSettings) -> Block {
    Block::new("locals")
        .with_attribute("app_name", &settings.app_name)
        .with_attribute("stage", &settings.stage)
        .with_attribute("vpc_id", &settings.vpc_id)
        .with_attribute("sgmkr_subnet", &settings.sgmkr_subnet)
        .with_attribute("aurora_subnets", settings.aurora_subnets.clone())
        .with_attribute("db_port", settings.db_port)
        .with_attribute("db_password", &settings.db_password)
        .with_attribute("db_username", &settings.db_username)
        .with_attribute("db_name", &settings.db_name)
        .with_attribute("prefix", Value::from("${local.app_name}-${local.stage}"))
}

pub fn backend_document(settings: &ResolvedSettings) -> String {
    render_document(&backend_blocks(settings))
}

pub fn locals_document(settings: &ResolvedSettings) -> String {
    render_document(&[locals_block(settings)])
}

/// Write both documents into `out_dir` and return their paths
pub fn write_configuration(
    settings: &ResolvedSettings,
    out_dir: &Path,
) -> std::io::Result<Vec<PathBuf>> {
    let backend_path = out_dir.join(BACKEND_FILE);
    fs::write(&backend_path, backend_document(settings))?;
    tracing::info!(path = %backend_path.display(), "wrote backend configuration");

    let locals_path = out_dir.join(LOCALS_FILE);
    fs::write(&locals_path, locals_document(settings))?;
    tracing::info!(path = %locals_path.display(), "wrote locals configuration");

    Ok(vec![backend_path, locals_path])
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn settings() -> ResolvedSettings {
        ResolvedSettings {
            aws_profile: "default".to_string(),
            state_bucket: "tf-state".to_string(),
            state_key: "app.tfstate".to_string(),
            state_bucket_region: "us-east-1".to_string(),
            aws_region: "us-west-2".to_string(),
            app_name: "aurora-sgmkr".to_string(),
            stage: "develop".to_string(),
            vpc_id: "vpc-1".to_string(),
            sgmkr_subnet: "subnet-a".to_string(),
            aurora_subnets: vec!["subnet-b".to_string(), "subnet-c".to_string()],
            db_name: "main".to_string(),
            db_port: 5432,
            db_username: "postgres".to_string(),
            db_password: "secret".to_string(),
        }
    }

    #[test]
    fn test_backend_document() {
        // A block without attributes keeps one indented empty line
        let expected = concat!(
            "provider \"aws\" {\n",
            "    profile = \"default\"\n",
            "    region = \"us-west-2\"\n",
            "}\n",
            "\n",
            "terraform {\n",
            "    \n",
            "    backend \"s3\" {\n",
            "        bucket = \"tf-state\"\n",
            "        key = \"app.tfstate\"\n",
            "        region = \"us-east-1\"\n",
            "        profile = \"default\"\n",
            "    }\n",
            "}"
        );
        assert_eq!(backend_document(&settings()), expected);
    }

    #[test]
    fn test_locals_document() {
        let expected = r#"locals {
    app_name = "aurora-sgmkr"
    stage = "develop"
    vpc_id = "vpc-1"
    sgmkr_subnet = "subnet-a"
    aurora_subnets = [
        "subnet-b",
        "subnet-c",
    ]
    db_port = "5432"
    db_password = "secret"
    db_username = "postgres"
    db_name = "main"
    prefix = "${local.app_name}-${local.stage}"
}"#;
        assert_eq!(locals_document(&settings()), expected);
    }

    #[test]
    fn test_write_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_configuration(&settings(), dir.path()).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths[0].ends_with(BACKEND_FILE));

        let written = fs::read_to_string(&paths[1]).unwrap();
        assert_eq!(written, locals_document(&settings()));
    }
}
