use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use nazoru_core::client::{HttpPredictor, Predictor};
use nazoru_core::config::Config;
use nazoru_core::recorder::KeyEvent;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "nazoructl", about = "Talk to a nazoru prediction endpoint")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/nazoru/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a key sequence and print the ranked candidates
    Predict {
        /// Override the prediction endpoint
        #[arg(long)]
        endpoint: Option<String>,
        /// Keys as KEY@MS, e.g. a@0 b@200 c@350
        #[arg(required = true, value_parser = parse_key_event)]
        keys: Vec<KeyEvent>,
    },
    /// Print the effective configuration
    Config,
}

/// Parse `KEY@MS`. The last `@` separates the time so `@@10` is the key `@`.
fn parse_key_event(s: &str) -> Result<KeyEvent, String> {
    let (key, time) = s
        .rsplit_once('@')
        .ok_or_else(|| format!("expected KEY@MS, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("missing key in '{s}'"));
    }
    let elapsed_ms = time
        .parse::<u64>()
        .map_err(|e| format!("bad time in '{s}': {e}"))?;
    Ok(KeyEvent::new(key, elapsed_ms))
}

/// Load the config, apply the `--endpoint` override, then validate the result.
fn resolve_config(path: Option<&Path>, endpoint: Option<String>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load().context("loading config")?,
    };
    if let Some(endpoint) = endpoint {
        config.predict.endpoint = endpoint;
    }
    config.validate().context("validating config")?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Predict { endpoint, keys } => {
            let config = resolve_config(cli.config.as_deref(), endpoint)?;
            let predictor = HttpPredictor::new(config.predict.endpoint.clone(), config.predict.timeout());
            let prediction = predictor
                .predict(&keys)
                .with_context(|| format!("predicting via {}", predictor.endpoint()))?;

            println!("{}", prediction.character);
            for (rank, candidate) in prediction.candidates.iter().enumerate() {
                match candidate.probability {
                    Some(p) => println!("  {}. {} ({:.3})", rank + 1, candidate.character, p),
                    None => println!("  {}. {}", rank + 1, candidate.character),
                }
            }
        }
        Command::Config => {
            let config = resolve_config(cli.config.as_deref(), None)?;
            let text = toml::to_string_pretty(&config).context("serializing config")?;
            print!("{text}");
        }
    }

    Ok(())
}
