use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use quarry::{Engine, MetadataMap, RuleAnnotator, Settings};

#[derive(Parser)]
#[command(name = "quarry")]
#[command(about = "Section-based document retrieval for question answering")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a default quarry.toml configuration file
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Config,

    /// Ingest a plain-text document and print its section summary
    Inspect {
        /// Path to the text file
        file: PathBuf,

        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Print each retained section
        #[arg(short, long)]
        sections: bool,

        /// Emit the document summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ingest a document and retrieve context for a question
    Ask {
        /// Path to the text file
        file: PathBuf,

        /// Free-text question
        question: String,

        /// Maximum number of sections to return (overrides config)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Emit the retrieved context as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().unwrap_or_else(|e| {
        eprintln!("Configuration error: {e}");
        eprintln!("Using default configuration.");
        Settings::default()
    });
    quarry::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)
                .map_err(|e| anyhow::anyhow!("{e}"))?;
            println!("Created configuration at: {}", path.display());
        }

        Commands::Config => {
            let rendered = toml::to_string_pretty(&settings)?;
            print!("{rendered}");
        }

        Commands::Inspect {
            file,
            name,
            sections,
            json,
        } => {
            settings
                .segmentation
                .validate()
                .map_err(|e| anyhow::anyhow!(e))?;
            let summary = ingest_file(&settings, &file, name.as_deref(), |engine, summary| {
                if json {
                    println!("{}", serde_json::to_string_pretty(summary)?);
                } else {
                    println!(
                        "'{}' processed: {} sections",
                        summary.source_name, summary.section_count
                    );
                    for (key, value) in summary.metadata.iter() {
                        println!("  {key}: {value}");
                    }
                }
                if sections {
                    let state = engine.session().snapshot().expect("just ingested");
                    for section in state.index.sections() {
                        println!("\n--- section {} ---", section.id);
                        println!("{}", section.content);
                    }
                }
                Ok(())
            });
            summary?;
        }

        Commands::Ask {
            file,
            question,
            limit,
            json,
        } => {
            if let Some(limit) = limit {
                settings.search.limit = limit;
            }
            ingest_file(&settings, &file, None, |engine, _| {
                let bundle = engine
                    .query(&question)
                    .map_err(|e| anyhow::anyhow!("query failed: {e}"))?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&bundle)?);
                    return Ok(());
                }
                if bundle.hits.is_empty() {
                    println!("No relevant sections found.");
                    return Ok(());
                }
                for hit in &bundle.hits {
                    println!("[section {} | score {:.3}]", hit.section.id, hit.score);
                    println!("{}\n", hit.section.content);
                }
                Ok(())
            })?;
        }
    }

    Ok(())
}

/// Read a text file, run ingestion, and hand the engine to `after`.
fn ingest_file(
    settings: &Settings,
    file: &PathBuf,
    name: Option<&str>,
    after: impl FnOnce(&Engine, &quarry::DocumentSummary) -> Result<()>,
) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("cannot read {}", file.display()))?;
    let source_name = name
        .map(str::to_string)
        .or_else(|| {
            file.file_name()
                .map(|n| n.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| file.display().to_string());

    let engine = Engine::new(Arc::new(RuleAnnotator::new()), settings.clone())
        .map_err(|e| anyhow::anyhow!("engine startup failed: {e}"))?;
    let summary = engine
        .ingest(&text, &source_name, MetadataMap::new())
        .map_err(|e| anyhow::anyhow!("ingestion failed: {e}"))?;
    after(&engine, &summary)
}
