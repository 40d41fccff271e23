use clap::{Parser, Subcommand, builder::styling};
use eyre::Result;
use owo_colors::OwoColorize;
use search_console_connector::cli;
use std::sync::Arc;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// Search Console connector: extract search analytics into schema-typed NDJSON records
#[derive(Parser)]
#[command(name = "scx", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source credentials from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every configured site into an NDJSON file
    Run {
        /// The connector configuration file (YAML or JSON)
        #[arg(short, long, default_value = "config.yml")]
        config: String,

        /// The NDJSON file to write records to
        #[arg(short, long, default_value = "records.ndjson")]
        output: String,

        /// Override the configured number of splits
        #[arg(short, long)]
        splits: Option<i32>,
    },

    /// List the sites visible to the configured credential
    Sites {
        /// The connector configuration file (YAML or JSON)
        #[arg(short, long, default_value = "config.yml")]
        config: String,
    },

    /// Validate the configuration, and site access unless offline
    Validate {
        /// The connector configuration file (YAML or JSON)
        #[arg(short, long, default_value = "config.yml")]
        config: String,

        /// Skip the checks that call the API
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = dotenvy::from_filename(&cli.env)
        && !e.not_found()
    {
        return Err(e.into());
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Run {
            config,
            output,
            splits,
        } => {
            log::info!(
                "Extracting with {} to {}",
                config.bright_black(),
                output.bright_black()
            );
            let config = cli::load_config(&config)?;
            let client = Arc::new(cli::build_client(&config)?);
            let summary = cli::run_extraction(&config, client, &output, splits).await?;
            if !summary.is_success() {
                eyre::bail!(
                    "{} of {} splits failed",
                    summary.failed_splits,
                    summary.splits
                );
            }
        }
        Commands::Sites { config } => {
            let config = cli::load_config(&config)?;
            let client = cli::build_client(&config)?;
            let sites = cli::list_sites(&client).await?;
            log::info!("{} site(s) visible", sites.len().cyan());
            for site in sites {
                println!("{}", site);
            }
        }
        Commands::Validate { config, offline } => {
            log::info!("Validating {}", config.bright_black());
            let config = cli::load_config(&config)?;
            let mut failures = config.validate();
            if failures.is_empty() && !offline {
                let client = cli::build_client(&config)?;
                failures = cli::validate_remote(&config, &client).await;
            }
            if !failures.is_empty() {
                for failure in &failures {
                    log::error!("{} {}", failure.message.red(), failure.correction);
                }
                eyre::bail!("{} validation failure(s)", failures.len());
            }
            log::info!("✓ Configuration is valid");
        }
    }

    Ok(())
}
