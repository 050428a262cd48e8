use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::metrics::MetricDescriptor;
use crate::utils::file::expand_path;

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CLOUDWATCH_UNITS, CONFIG_FILE_NAME, DEFAULT_LOG_GROUP_NAME, ENV_LOG_GROUP_NAME,
};

// =============================================================================
// Dimension Rollup Enum
// =============================================================================

/// Extra dimension sets emitted next to the full label set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum DimensionRollupOption {
    /// Empty dimension set plus one set per label
    #[default]
    ZeroAndSingleDimensionRollup,
    /// One set per label
    SingleDimensionRollupOnly,
    /// Full label set only
    NoDimensionRollup,
}

impl DimensionRollupOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroAndSingleDimensionRollup => "ZeroAndSingleDimensionRollup",
            Self::SingleDimensionRollupOnly => "SingleDimensionRollupOnly",
            Self::NoDimensionRollup => "NoDimensionRollup",
        }
    }
}

impl fmt::Display for DimensionRollupOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub namespace: Option<String>,
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
    pub dimension_rollup_option: Option<DimensionRollupOption>,
    pub eks_fargate_container_insights_enabled: Option<bool>,
    pub metric_descriptors: Option<Vec<MetricDescriptor>>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence).
    ///
    /// Descriptor lists are appended so later files can override single metrics.
    fn merge(&mut self, other: FileConfig) {
        if other.namespace.is_some() {
            tracing::trace!(namespace = ?other.namespace, "Merging namespace");
            self.namespace = other.namespace;
        }
        if other.log_group_name.is_some() {
            tracing::trace!(log_group_name = ?other.log_group_name, "Merging log_group_name");
            self.log_group_name = other.log_group_name;
        }
        if other.log_stream_name.is_some() {
            tracing::trace!(log_stream_name = ?other.log_stream_name, "Merging log_stream_name");
            self.log_stream_name = other.log_stream_name;
        }
        if other.dimension_rollup_option.is_some() {
            self.dimension_rollup_option = other.dimension_rollup_option;
        }
        if other.eks_fargate_container_insights_enabled.is_some() {
            self.eks_fargate_container_insights_enabled =
                other.eks_fargate_container_insights_enabled;
        }
        if let Some(descriptors) = other.metric_descriptors {
            self.metric_descriptors
                .get_or_insert_with(Vec::new)
                .extend(descriptors);
        }
    }
}

// =============================================================================
// Runtime Config Structs (final merged configuration)
// =============================================================================

/// Settings consumed by the grouping engine and EMF rendering
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmfConfig {
    /// Metric namespace; empty means derive from resource attributes
    pub namespace: String,
    /// Log group template, may contain `{label}` placeholders
    pub log_group_name: String,
    /// Log stream template, may contain `{label}` placeholders
    pub log_stream_name: String,
    pub dimension_rollup_option: DimensionRollupOption,
    pub eks_fargate_container_insights_enabled: bool,
    /// Validated descriptors keyed by metric name
    pub metric_descriptors: HashMap<String, MetricDescriptor>,
}

/// Final merged application configuration
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub emf: EmfConfig,
}

impl AppConfig {
    /// Load configuration from all sources
    ///
    /// Priority (lowest to highest):
    /// 1. Defaults
    /// 2. Profile directory config (~/.emf-exporter/emf-exporter.json)
    /// 3. Local directory config OR CLI-specified config path
    /// 4. CLI arguments (which include env var fallbacks via clap)
    pub fn load(cli: &CliConfig) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        if let Some(profile_path) = get_profile_config_path()
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::from_layers(cli, file_config)
    }

    /// Layer defaults -> file config -> CLI/env overrides, then validate
    fn from_layers(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let namespace = cli
            .namespace
            .clone()
            .or(file_config.namespace)
            .unwrap_or_default();

        let log_group_name = cli
            .log_group_name
            .clone()
            .or(file_config.log_group_name)
            .unwrap_or_else(|| DEFAULT_LOG_GROUP_NAME.to_string());

        let log_stream_name = cli
            .log_stream_name
            .clone()
            .or(file_config.log_stream_name)
            .unwrap_or_default();

        let dimension_rollup_option = cli
            .dimension_rollup
            .or(file_config.dimension_rollup_option)
            .unwrap_or_default();

        let eks_fargate_container_insights_enabled = cli
            .eks_fargate_container_insights
            .or(file_config.eks_fargate_container_insights_enabled)
            .unwrap_or(false);

        let metric_descriptors =
            validate_metric_descriptors(file_config.metric_descriptors.unwrap_or_default());

        let config = Self {
            emf: EmfConfig {
                namespace,
                log_group_name,
                log_stream_name,
                dimension_rollup_option,
                eks_fargate_container_insights_enabled,
                metric_descriptors,
            },
        };

        config.validate()?;
        tracing::debug!(
            namespace = %config.emf.namespace,
            log_group = %config.emf.log_group_name,
            rollup = %config.emf.dimension_rollup_option,
            descriptors = config.emf.metric_descriptors.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.emf.log_group_name.trim().is_empty() {
            anyhow::bail!(
                "Configuration error: log_group_name must not be empty. \
                 Set via {} env var or log_group_name in config file.",
                ENV_LOG_GROUP_NAME
            );
        }
        Ok(())
    }
}

/// Drop unusable descriptors; a later descriptor for the same metric replaces an earlier one
fn validate_metric_descriptors(
    descriptors: Vec<MetricDescriptor>,
) -> HashMap<String, MetricDescriptor> {
    let mut valid = HashMap::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if descriptor.metric_name.is_empty() {
            tracing::warn!(unit = %descriptor.unit, "Dropped metric descriptor without a metric name");
            continue;
        }
        if !CLOUDWATCH_UNITS.contains(&descriptor.unit.as_str()) {
            tracing::warn!(
                metric = %descriptor.metric_name,
                unit = %descriptor.unit,
                "Dropped metric descriptor with unsupported unit"
            );
            continue;
        }
        if let Some(previous) = valid.insert(descriptor.metric_name.clone(), descriptor) {
            tracing::debug!(metric = %previous.metric_name, "Metric descriptor replaced");
        }
    }
    valid
}

/// Get the profile config path (~/.emf-exporter/emf-exporter.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}
