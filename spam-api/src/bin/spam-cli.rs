//! CLI tool for classifying emails and managing stored predictions
//!
//! Works directly against the model artifacts and the prediction database,
//! without going through the HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Classify an email and store the result
//! spam-cli predict "Congratulations, you won a free cruise"
//!
//! # Show aggregate statistics
//! spam-cli stats --db predictions_database.json
//!
//! # Show the last 10 predictions
//! spam-cli list --limit 10
//!
//! # Export everything to CSV
//! spam-cli export csv --output predictions.csv
//!
//! # Remove all predictions
//! spam-cli clear --yes
//! ```

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use spam_api::{logging, ServiceConfig};
use spam_core::store::{NewPrediction, PredictionRecord, PredictionStore};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "spam-cli")]
#[command(about = "Classify emails and manage stored predictions", long_about = None)]
struct Cli {
    /// Service configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Prediction database path, overrides the configuration
    #[arg(long)]
    db: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify an email
    Predict {
        /// Email text
        text: String,
        /// Do not save the prediction
        #[arg(long)]
        no_store: bool,
    },
    /// Show aggregate statistics
    Stats,
    /// List stored predictions
    List {
        /// Only the most recent N predictions
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// List predictions between two ISO-8601 timestamps
    Range {
        /// Inclusive start
        start: String,
        /// Inclusive end
        end: String,
    },
    /// Export all predictions
    Export {
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Delete every stored prediction
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Show the model evaluation snapshot
    ModelInfo,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

/// Configuration from file or defaults, with the `--db` override applied
fn load_config(path: Option<&Path>, db: Option<String>) -> anyhow::Result<ServiceConfig> {
    let mut config = match path {
        Some(path) => ServiceConfig::from_file(path)?,
        None => ServiceConfig::development(),
    };
    if let Some(db) = db {
        config.storage.database_path = db;
    }
    config.validate()?;
    Ok(config)
}

async fn open_store(config: &ServiceConfig) -> anyhow::Result<PredictionStore> {
    let path = &config.storage.database_path;
    PredictionStore::open(path)
        .await
        .with_context(|| format!("Failed to open {}", path))
}

fn print_records(records: &[PredictionRecord]) {
    if records.is_empty() {
        println!("No predictions found.");
        return;
    }

    println!(
        "{:<12} {:<28} {:<6} {:>8}  {}",
        "ID", "Timestamp", "Class", "Conf %", "Text"
    );
    println!("{:-<90}", "");

    for record in records {
        let preview: String = record.email_text.chars().take(30).collect();
        println!(
            "{:<12} {:<28} {:<6} {:>8.2}  {}",
            record.id, record.timestamp, record.prediction, record.confidence_percentage, preview
        );
    }

    println!("\nTotal: {} prediction(s)", records.len());
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init_cli(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.db)?;

    match cli.command {
        Commands::Predict { text, no_store } => {
            if text.trim().is_empty() {
                bail!("Email text cannot be empty");
            }

            let predictor = config
                .model
                .load_predictor()
                .context("Failed to load model artifacts")?;
            let result = predictor.predict(&text);

            println!("Prediction: {}", result.prediction);
            println!("Confidence: {:.2}%", result.confidence_percentage);
            println!("Raw score:  {:.4}", result.raw_score);

            if !no_store {
                let store = open_store(&config).await?;
                let record = store.append(NewPrediction::new(text, result)).await?;
                println!("✓ Saved as {}", record.id);
            }
        }
        Commands::Stats => {
            let store = open_store(&config).await?;
            let stats = store.statistics().await?;
            let metadata = store.metadata().await?;

            println!("Database:        {}", store.path().display());
            println!("Created:         {}", metadata.created_at);
            println!("Last updated:    {}", metadata.last_updated);
            println!();
            println!("Total:           {}", stats.total_predictions);
            println!(
                "Spam:            {} ({:.2}%)",
                stats.spam_count, stats.spam_percentage
            );
            println!(
                "Ham:             {} ({:.2}%)",
                stats.ham_count, stats.ham_percentage
            );
            println!("Avg confidence:  {:.2}%", stats.average_confidence);
            println!("Max confidence:  {:.2}%", stats.max_confidence);
            println!("Min confidence:  {:.2}%", stats.min_confidence);
        }
        Commands::List { limit } => {
            let store = open_store(&config).await?;
            let records = store.list_all(limit).await?;
            print_records(&records);
        }
        Commands::Range { start, end } => {
            let store = open_store(&config).await?;
            let records = store.query_by_range(&start, &end).await?;
            print_records(&records);
        }
        Commands::Export { format, output } => {
            let store = open_store(&config).await?;
            let content = match format {
                ExportFormat::Csv => store.export_csv().await?,
                ExportFormat::Json => {
                    let export = store.export_json().await?;
                    if export.predictions.is_empty() {
                        String::new()
                    } else {
                        serde_json::to_string_pretty(&export)?
                    }
                }
            };

            if content.is_empty() {
                bail!("No predictions to export");
            }

            match output {
                Some(path) => {
                    tokio::fs::write(&path, content)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    println!("✓ Exported to {}", path.display());
                }
                None => println!("{}", content),
            }
        }
        Commands::Clear { yes } => {
            if !yes {
                eprintln!("Error: refusing to delete predictions without --yes");
                std::process::exit(1);
            }

            let store = open_store(&config).await?;
            store.clear_all().await?;
            println!("✓ All predictions have been cleared");
        }
        Commands::ModelInfo => {
            let predictor = config
                .model
                .load_predictor()
                .context("Failed to load model artifacts")?;
            println!("{}", serde_json::to_string_pretty(predictor.model_info())?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config_applies_db_override() {
        let config = load_config(None, Some("/tmp/other.json".to_string())).unwrap();
        assert_eq!(config.storage.database_path, "/tmp/other.json");
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spam-api.toml");
        std::fs::write(&path, "[model]\nconfidence_scale = 0.0\n").unwrap();

        let err = load_config(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("confidence_scale"));
    }

    #[test]
    fn test_load_config_rejects_empty_db_override() {
        assert!(load_config(None, Some(String::new())).is_err());
    }
}
