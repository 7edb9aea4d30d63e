//! Settings for the generated configuration and the managed resources
//!
//! Settings come from three layers: built-in defaults, a configuration file
//! (YAML, or TOML when the file ends in `.toml`), and optional interactive
//! answers. Every setting must have a value before anything is rendered.

use std::io::{BufRead, Write};
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Configuration file read when none is given on the command line
pub const DEFAULT_CONFIG_FILE: &str = "configuration.yaml";

/// Setting names in prompt and validation order
pub const SETTING_NAMES: [&str; 14] = [
    "aws_profile",
    "state_bucket",
    "state_key",
    "state_bucket_region",
    "aws_region",
    "app_name",
    "stage",
    "vpc_id",
    "sgmkr_subnet",
    "aurora_subnets",
    "db_name",
    "db_port",
    "db_username",
    "db_password",
];

/// Errors that can occur when loading or completing settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse configuration YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
    #[error("Failed to parse configuration TOML: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("configuration variable '{name}' is null")]
    MissingSetting { name: &'static str },
    #[error("invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },
    #[error("unknown setting: {name}")]
    UnknownSetting { name: String },
}

/// Settings as they are being assembled; any field may still be unset
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub aws_profile: Option<String>,
    pub state_bucket: Option<String>,
    pub state_key: Option<String>,
    pub state_bucket_region: Option<String>,
    pub aws_region: Option<String>,
    pub app_name: Option<String>,
    pub stage: Option<String>,
    pub vpc_id: Option<String>,
    pub sgmkr_subnet: Option<String>,
    pub aurora_subnets: Vec<String>,
    pub db_name: Option<String>,
    pub db_port: Option<u16>,
    pub db_username: Option<String>,
    pub db_password: Option<String>,
}

/// File structure for deserializing settings
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    aws_profile: Option<String>,
    state_bucket: Option<String>,
    state_key: Option<String>,
    state_bucket_region: Option<String>,
    aws_region: Option<String>,
    app_name: Option<String>,
    stage: Option<String>,
    vpc_id: Option<String>,
    sgmkr_subnet: Option<String>,
    aurora_subnets: Option<Vec<String>>,
    db_name: Option<String>,
    db_port: Option<FilePort>,
    db_username: Option<String>,
    db_password: Option<String>,
}

/// A port written either as a number or as quoted text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FilePort {
    Number(u16),
    Text(String),
}

impl FilePort {
    /// Zero and empty text count as unset
    fn into_port(self) -> Result<Option<u16>, ConfigError> {
        let port = match self {
            FilePort::Number(port) => port,
            FilePort::Text(text) if text.trim().is_empty() => return Ok(None),
            FilePort::Text(text) => parse_port(&text)?,
        };
        Ok(Some(port).filter(|port| *port != 0))
    }
}

fn parse_port(text: &str) -> Result<u16, ConfigError> {
    text.trim()
        .parse::<u16>()
        .map_err(|e| ConfigError::InvalidValue {
            name: "db_port".to_string(),
            reason: e.to_string(),
        })
}

/// Settings with every value present
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub aws_profile: String,
    pub state_bucket: String,
    pub state_key: String,
    pub state_bucket_region: String,
    pub aws_region: String,
    pub app_name: String,
    pub stage: String,
    pub vpc_id: String,
    pub sgmkr_subnet: String,
    pub aurora_subnets: Vec<String>,
    pub db_name: String,
    pub db_port: u16,
    pub db_username: String,
    pub db_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            aws_profile: Some("default".to_string()),
            state_bucket: None,
            state_key: None,
            state_bucket_region: None,
            aws_region: None,
            app_name: Some("aurora-sgmkr".to_string()),
            stage: Some("develop".to_string()),
            vpc_id: None,
            sgmkr_subnet: None,
            aurora_subnets: Vec::new(),
            db_name: Some("main".to_string()),
            db_port: Some(5432),
            db_username: Some("postgres".to_string()),
            db_password: None,
        }
    }
}

/// Empty strings in a file count as unset
fn pick(file: Option<String>, default: Option<String>) -> Option<String> {
    file.filter(|s| !s.is_empty()).or(default)
}

impl Settings {
    /// Load settings from a file, falling back to defaults
    ///
    /// A missing file only produces a warning.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let is_toml = path.extension().is_some_and(|ext| ext == "toml");
        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse YAML settings layered over the defaults
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let file: FileSettings = serde_yaml::from_str(content)?;
        Self::default().merged(file)
    }

    /// Parse TOML settings layered over the defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: FileSettings = toml::from_str(content)?;
        Self::default().merged(file)
    }

    fn merged(self, file: FileSettings) -> Result<Self, ConfigError> {
        let db_port = match file.db_port {
            Some(port) => port.into_port()?,
            None => None,
        };
        Ok(Self {
            aws_profile: pick(file.aws_profile, self.aws_profile),
            state_bucket: pick(file.state_bucket, self.state_bucket),
            state_key: pick(file.state_key, self.state_key),
            state_bucket_region: pick(file.state_bucket_region, self.state_bucket_region),
            aws_region: pick(file.aws_region, self.aws_region),
            app_name: pick(file.app_name, self.app_name),
            stage: pick(file.stage, self.stage),
            vpc_id: pick(file.vpc_id, self.vpc_id),
            sgmkr_subnet: pick(file.sgmkr_subnet, self.sgmkr_subnet),
            aurora_subnets: file
                .aurora_subnets
                .filter(|subnets| !subnets.is_empty())
                .unwrap_or(self.aurora_subnets),
            db_name: pick(file.db_name, self.db_name),
            db_port: db_port.or(self.db_port),
            db_username: pick(file.db_username, self.db_username),
            db_password: pick(file.db_password, self.db_password),
        })
    }

    /// Current value of a setting as shown in prompts
    pub fn display_value(&self, name: &str) -> Result<String, ConfigError> {
        let text = match name {
            "aurora_subnets" => return Ok(self.aurora_subnets.join(",")),
            "db_port" => return Ok(self.db_port.map(|p| p.to_string()).unwrap_or_default()),
            _ => self.text_field(name)?.clone(),
        };
        Ok(text.unwrap_or_default())
    }

    fn text_field(&self, name: &str) -> Result<&Option<String>, ConfigError> {
        Ok(match name {
            "aws_profile" => &self.aws_profile,
            "state_bucket" => &self.state_bucket,
            "state_key" => &self.state_key,
            "state_bucket_region" => &self.state_bucket_region,
            "aws_region" => &self.aws_region,
            "app_name" => &self.app_name,
            "stage" => &self.stage,
            "vpc_id" => &self.vpc_id,
            "sgmkr_subnet" => &self.sgmkr_subnet,
            "db_name" => &self.db_name,
            "db_username" => &self.db_username,
            "db_password" => &self.db_password,
            _ => {
                return Err(ConfigError::UnknownSetting {
                    name: name.to_string(),
                })
            }
        })
    }

    fn text_field_mut(&mut self, name: &str) -> Result<&mut Option<String>, ConfigError> {
        Ok(match name {
            "aws_profile" => &mut self.aws_profile,
            "state_bucket" => &mut self.state_bucket,
            "state_key" => &mut self.state_key,
            "state_bucket_region" => &mut self.state_bucket_region,
            "aws_region" => &mut self.aws_region,
            "app_name" => &mut self.app_name,
            "stage" => &mut self.stage,
            "vpc_id" => &mut self.vpc_id,
            "sgmkr_subnet" => &mut self.sgmkr_subnet,
            "db_name" => &mut self.db_name,
            "db_username" => &mut self.db_username,
            "db_password" => &mut self.db_password,
            _ => {
                return Err(ConfigError::UnknownSetting {
                    name: name.to_string(),
                })
            }
        })
    }

    /// Set a setting from user-entered text
    ///
    /// `aurora_subnets` takes a comma-separated list and `db_port` a port
    /// number.
    pub fn set(&mut self, name: &str, input: &str) -> Result<(), ConfigError> {
        match name {
            "aurora_subnets" => {
                self.aurora_subnets = input
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "db_port" => self.db_port = Some(parse_port(input)?),
            _ => *self.text_field_mut(name)? = Some(input.to_string()),
        }
        Ok(())
    }

    /// Ask for every setting in turn; an empty answer keeps the current value
    ///
    /// Prompting stops early when the input is exhausted.
    pub fn prompt<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), ConfigError> {
        for name in SETTING_NAMES {
            write!(output, "{} ({}):", name, self.display_value(name)?)?;
            output.flush()?;

            let mut line = String::new();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            let answer = line.trim();
            if !answer.is_empty() {
                self.set(name, answer)?;
            }
        }
        Ok(())
    }

    /// Check that every setting has a value
    ///
    /// The first unset setting, in [`SETTING_NAMES`] order, is reported.
    pub fn resolve(&self) -> Result<ResolvedSettings, ConfigError> {
        fn req(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
            value.clone().ok_or(ConfigError::MissingSetting { name })
        }

        Ok(ResolvedSettings {
            aws_profile: req(&self.aws_profile, "aws_profile")?,
            state_bucket: req(&self.state_bucket, "state_bucket")?,
            state_key: req(&self.state_key, "state_key")?,
            state_bucket_region: req(&self.state_bucket_region, "state_bucket_region")?,
            aws_region: req(&self.aws_region, "aws_region")?,
            app_name: req(&self.app_name, "app_name")?,
            stage: req(&self.stage, "stage")?,
            vpc_id: req(&self.vpc_id, "vpc_id")?,
            sgmkr_subnet: req(&self.sgmkr_subnet, "sgmkr_subnet")?,
            aurora_subnets: self.aurora_subnets.clone(),
            db_name: req(&self.db_name, "db_name")?,
            db_port: self
                .db_port
                .ok_or(ConfigError::MissingSetting { name: "db_port" })?,
            db_username: req(&self.db_username, "db_username")?,
            db_password: req(&self.db_password, "db_password")?,
        })
    }
}
