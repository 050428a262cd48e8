use clap::{Parser, Subcommand, ValueEnum};

use std::path::PathBuf;

use super::config::DimensionRollupOption;
use super::constants::{
    ENV_CONFIG, ENV_DIMENSION_ROLLUP, ENV_EKS_FARGATE_CONTAINER_INSIGHTS, ENV_LOG_GROUP_NAME,
    ENV_LOG_STREAM_NAME, ENV_NAMESPACE,
};

#[derive(Parser)]
#[command(name = "emf-exporter")]
#[command(version, about = "Group OTLP metrics into Embedded Metric Format records", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Metric namespace (derived from service.namespace/service.name when unset)
    #[arg(long, short = 'n', global = true, env = ENV_NAMESPACE)]
    pub namespace: Option<String>,

    /// Log group name template, e.g. /aws/ecs/{ClusterName}
    #[arg(long, global = true, env = ENV_LOG_GROUP_NAME)]
    pub log_group_name: Option<String>,

    /// Log stream name template, e.g. {TaskId}
    #[arg(long, global = true, env = ENV_LOG_STREAM_NAME)]
    pub log_stream_name: Option<String>,

    /// Dimension rollup option
    #[arg(long, global = true, env = ENV_DIMENSION_ROLLUP, value_parser = parse_dimension_rollup)]
    pub dimension_rollup: Option<DimensionRollupOption>,

    /// Wrap Kubernetes labels of Pod/Container metrics into a nested object
    #[arg(long, global = true, env = ENV_EKS_FARGATE_CONTAINER_INSIGHTS)]
    pub eks_fargate_container_insights: Option<bool>,
}

/// Parse dimension rollup option from CLI/env string
fn parse_dimension_rollup(s: &str) -> Result<DimensionRollupOption, String> {
    match s.to_lowercase().as_str() {
        "zeroandsingledimensionrollup" | "zero-and-single" => {
            Ok(DimensionRollupOption::ZeroAndSingleDimensionRollup)
        }
        "singledimensionrolluponly" | "single-only" => {
            Ok(DimensionRollupOption::SingleDimensionRollupOnly)
        }
        "nodimensionrollup" | "none" => Ok(DimensionRollupOption::NoDimensionRollup),
        _ => Err(format!(
            "Invalid dimension rollup '{}'. Valid options: ZeroAndSingleDimensionRollup, \
             SingleDimensionRollupOnly, NoDimensionRollup",
            s
        )),
    }
}

/// Encoding of the OTLP export request read by `group`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InputFormat {
    /// OTLP/JSON
    #[default]
    Json,
    /// OTLP/protobuf (binary)
    Protobuf,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Group an OTLP metrics export request and print one EMF record per line
    Group {
        /// Input file, or `-` for stdin
        #[arg(long, short = 'i', default_value = "-")]
        input: PathBuf,

        /// Input encoding
        #[arg(long, short = 'f', value_enum, default_value_t = InputFormat::Json)]
        format: InputFormat,
    },
    /// Print the effective configuration as JSON
    Config,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub config: Option<PathBuf>,
    pub namespace: Option<String>,
    pub log_group_name: Option<String>,
    pub log_stream_name: Option<String>,
    pub dimension_rollup: Option<DimensionRollupOption>,
    pub eks_fargate_container_insights: Option<bool>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        config: cli.config,
        namespace: cli.namespace,
        log_group_name: cli.log_group_name,
        log_stream_name: cli.log_stream_name,
        dimension_rollup: cli.dimension_rollup,
        eks_fargate_container_insights: cli.eks_fargate_container_insights,
    };
    (config, cli.command)
}
