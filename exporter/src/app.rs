//! Core application

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use opentelemetry_proto::tonic::collector::metrics::v1::ExportMetricsServiceRequest;
use prost::Message;
use tokio::io::AsyncReadExt;

use crate::core::cli::{self, Commands, InputFormat};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME_LOWER, ENV_LOG};
use crate::domain::metrics::{ExportCycle, LabelPatternResolver, TracingWarnSink, render_all};
use crate::utils::otlp::normalize_json_int_values;

pub struct CoreApp {
    pub config: AppConfig,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        let app = Self {
            config: AppConfig::load(&cli_config)?,
        };

        match command {
            Commands::Group { input, format } => app.group(&input, format).await,
            Commands::Config => app.print_config(),
        }
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER.replace('-', "_"));

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        // Records go to stdout, logs to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn group(&self, input: &Path, format: InputFormat) -> Result<()> {
        let bytes = read_input(input).await?;
        let request = decode_request(&bytes, format)
            .with_context(|| format!("Failed to decode OTLP request from {}", input.display()))?;

        let resolver = LabelPatternResolver;
        let warnings = TracingWarnSink;
        let cycle = ExportCycle::new(&self.config.emf, &resolver, &warnings);

        let grouped = cycle.run(&request);
        let records = render_all(grouped, cycle.received_at_ms());
        tracing::info!(records = records.len(), "Grouped metrics into EMF records");

        let mut stdout = std::io::stdout().lock();
        for record in &records {
            let line = serde_json::to_string(record).context("Failed to serialize EMF record")?;
            writeln!(stdout, "{}", line).context("Failed to write to stdout")?;
        }
        stdout.flush().context("Failed to flush stdout")?;
        Ok(())
    }

    fn print_config(&self) -> Result<()> {
        let json =
            serde_json::to_string_pretty(&self.config).context("Failed to serialize config")?;
        println!("{}", json);
        Ok(())
    }
}

async fn read_input(input: &Path) -> Result<Vec<u8>> {
    if input.as_os_str() == "-" {
        let mut bytes = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut bytes)
            .await
            .context("Failed to read stdin")?;
        return Ok(bytes);
    }

    tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read input file: {}", input.display()))
}

fn decode_request(bytes: &[u8], format: InputFormat) -> Result<ExportMetricsServiceRequest> {
    let request = match format {
        InputFormat::Json => {
            let mut value: serde_json::Value = serde_json::from_slice(bytes)?;
            normalize_json_int_values(&mut value);
            // Generated types need a borrowing deserializer
            serde_json::from_slice(&serde_json::to_vec(&value)?)?
        }
        InputFormat::Protobuf => ExportMetricsServiceRequest::decode(bytes)?,
    };
    Ok(request)
}
