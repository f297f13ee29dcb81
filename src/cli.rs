//! CLI interface for the resume ranker

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "resume-ranker")]
#[command(about = "Hybrid resume and job description matching tool")]
#[command(long_about = "Score resumes against a job description by combining skill overlap, TF-IDF similarity, and embedding similarity, and rank candidate batches")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Score one resume against a job description
    Match {
        /// Path to resume file (PDF, TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (PDF, TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Rank every candidate in a manifest against a job description
    Rank {
        /// Path to job description file (PDF, TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// TOML manifest listing candidate resumes
        #[arg(short, long)]
        manifest: PathBuf,

        /// Number of candidates to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Batch deadline in milliseconds
        #[arg(long)]
        deadline_ms: Option<u64>,

        /// Maximum number of resumes scored concurrently
        #[arg(short, long)]
        workers: Option<usize>,

        /// Output format: console, json, markdown
        #[arg(short, long)]
        output: Option<String>,

        /// Output detailed analysis
        #[arg(short, long)]
        detailed: bool,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// Model management commands
    Models {
        #[command(subcommand)]
        action: ModelAction,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Load the configured models and report their readiness
    Health,
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List available embedding models
    List,

    /// Download an embedding model
    Download {
        /// Model name or HuggingFace repo ID
        model: String,
    },

    /// Show model information
    Info {
        /// Model name
        model: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

/// Parse and validate output format
pub fn parse_output_format(format: &str) -> Result<crate::config::OutputFormat, String> {
    match format.to_lowercase().as_str() {
        "console" => Ok(crate::config::OutputFormat::Console),
        "json" => Ok(crate::config::OutputFormat::Json),
        "markdown" | "md" => Ok(crate::config::OutputFormat::Markdown),
        _ => Err(format!("Invalid output format: {}. Supported: console, json, markdown", format)),
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}
