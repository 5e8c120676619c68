use anomaly_client::cli::Cli;
use anomaly_client::config::ClientConfig;
use anomaly_client::logging::{init_logging, LogConfig};
use anomaly_client::output::ResultWriter;
use anomaly_client::pipeline::{InputSource, Pipeline, RunOutcome};
use anomaly_client::scoring::ScoringClient;
use anomaly_client::table::TableReader;
use anyhow::{anyhow, bail, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = &cli.generate_config {
        return match ClientConfig::generate_sample_config(path) {
            Ok(()) => {
                println!("Sample configuration written to {}", path.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    // 設定読み込み前はロガーがないため stderr に直接出す
    let config = match ClientConfig::load(&cli.config_overrides()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut log_config = LogConfig::from_config(&config.logging).with_verbosity(cli.verbose);
    if let Some(dir) = &cli.log_dir {
        log_config = log_config.with_log_dir(dir);
    }
    let _guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, config: ClientConfig) -> Result<()> {
    match &config.source_file {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => debug!("No configuration file found, using defaults and environment"),
    }

    let delimiter = cli
        .delimiter_byte()
        .ok_or_else(|| anyhow!("delimiter {:?} is not a single ASCII character", cli.delimiter))?;
    let params = cli.parameters.apply(config.parameters.clone());
    let client = ScoringClient::new(&config.service)?;

    let pipeline = Pipeline::new(
        TableReader::new().with_delimiter(delimiter),
        client,
        ResultWriter::new(),
    );
    let source = InputSource::resolve(cli.input.as_deref(), cli.random);

    match pipeline.run(&source, &params, cli.output.as_deref()).await? {
        RunOutcome::NoResult => {
            info!("No result returned; nothing written");
            Ok(())
        }
        RunOutcome::Written(artifacts) => {
            let failed = artifacts.errors().len();
            if failed > 0 {
                bail!("{} output file(s) could not be written", failed);
            }
            Ok(())
        }
    }
}
