//! Resume ranker: hybrid resume and job description matching tool

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_ranker::batch::{BatchMatchCoordinator, BatchRequest, WorkerPool};
use resume_ranker::cli::{parse_output_format, validate_file_extension, Cli, Commands, ConfigAction, ModelAction};
use resume_ranker::config::{Config, OutputFormat};
use resume_ranker::input::{CandidateStore, InputManager, ManifestStore};
use resume_ranker::models::manager::EmbeddingModelManager;
use resume_ranker::models::ModelRegistry;
use resume_ranker::output::formatter::save_report_to_file;
use resume_ranker::output::{BatchResponse, MatchResponse, ReportGenerator};
use resume_ranker::processing::MatchEngine;
use resume_ranker::{Result, ResumeRankerError};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

const DOCUMENT_EXTENSIONS: [&str; 5] = ["pdf", "txt", "md", "markdown", "text"];

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);
    let config = match Config::load_from(&config_path) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, config_path).await {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: PathBuf) -> Result<()> {
    match command {
        Commands::Match {
            resume,
            job,
            output,
            detailed,
            save,
        } => {
            check_extension(&resume)?;
            check_extension(&job)?;
            let format = resolve_format(output.as_deref(), &config)?;

            info!("Matching {} against {}", resume.display(), job.display());
            let mut input = InputManager::new();
            let resume_text = input.extract_text(&resume).await?;
            let job_text = input.extract_text(&job).await?;

            let registry = load_registry(&config).await?;
            let embedder = registry.embedder().name().to_string();
            let engine = Arc::new(MatchEngine::new(registry, &config)?);

            let report = {
                let engine = Arc::clone(&engine);
                tokio::task::spawn_blocking(move || engine.evaluate(&resume_text, &job_text))
                    .await
                    .map_err(|e| ResumeRankerError::Processing(format!("Match task failed: {}", e)))??
            };

            let response = MatchResponse::from_report(&report, &embedder);
            let generator = ReportGenerator::with_options(config.output.color_output, detailed || config.output.detailed);
            let rendered = generator.generate_match(&response, format)?;
            emit(&rendered, save.as_deref())?;
        }

        Commands::Rank {
            job,
            manifest,
            top_k,
            deadline_ms,
            workers,
            output,
            detailed,
            save,
        } => {
            check_extension(&job)?;
            let format = resolve_format(output.as_deref(), &config)?;
            let top_k = top_k.unwrap_or(config.batch.top_k);
            let deadline = Duration::from_millis(deadline_ms.unwrap_or(config.batch.deadline_ms));
            let workers = workers.unwrap_or(config.batch.workers);
            if workers == 0 {
                return Err(ResumeRankerError::InvalidInput("workers must be greater than 0".to_string()));
            }

            let mut input = InputManager::new();
            let job_description = input.extract_text(&job).await?;
            let loaded = ManifestStore::new(&manifest).load_candidates().await?;
            if loaded.documents.is_empty() && loaded.failures.is_empty() {
                return Err(ResumeRankerError::InvalidInput(format!(
                    "No candidates listed in {}",
                    manifest.display()
                )));
            }

            let registry = load_registry(&config).await?;
            let embedder = registry.embedder().name().to_string();
            let engine = Arc::new(MatchEngine::new(registry, &config)?);
            let coordinator = BatchMatchCoordinator::new(engine, WorkerPool::new(workers));

            let spinner = spinner(&format!(
                "Ranking {} candidates with {} workers...",
                loaded.documents.len(),
                workers
            ));
            let result = coordinator
                .run(BatchRequest {
                    job_description,
                    candidates: loaded.documents,
                    top_k,
                    deadline,
                    failed: loaded.failures,
                })
                .await;
            spinner.finish_and_clear();
            let batch = result?;

            let response = BatchResponse::from_batch(&batch, &embedder);
            let generator = ReportGenerator::with_options(config.output.color_output, detailed || config.output.detailed);
            let rendered = generator.generate_batch(&response, format)?;
            emit(&rendered, save.as_deref())?;
        }

        Commands::Models { action } => {
            let mut manager =
                EmbeddingModelManager::new(config.models_dir().clone(), config.models.available_models.clone()).await?;

            match action {
                ModelAction::List => {
                    println!("{}\n", "Embedding Models".bold());
                    for model in manager.list_available_models() {
                        let status = if manager.is_model_downloaded(&model.name) {
                            "downloaded".green()
                        } else {
                            "available".yellow()
                        };
                        println!(
                            "  • {} ({}) - {} MB, {} dims, {:?} [{}]",
                            model.name, model.repo_id, model.size_mb, model.dimensions, model.backend, status
                        );
                        println!("    {}", model.description);
                    }

                    if manager.list_downloaded_models().is_empty() {
                        println!("\nNo models downloaded yet. Get started with:");
                        println!("   resume-ranker models download potion-base-8M");
                    }
                }

                ModelAction::Download { model } => {
                    let model_id = manager
                        .resolve_model_id(&model)
                        .ok_or_else(|| ResumeRankerError::ModelUnavailable(format!("Unknown model: {}", model)))?;

                    if manager.is_model_downloaded(&model_id) {
                        println!("Model '{}' is already downloaded", model_id);
                        return Ok(());
                    }

                    let spinner = spinner(&format!("Downloading {}...", model_id));
                    let result = manager.download_model(&model_id).await;
                    spinner.finish_and_clear();
                    let path = result?;
                    println!("{} Model '{}' downloaded", "✓".green(), model_id);
                    println!("Location: {}", path.display());
                }

                ModelAction::Info { model } => {
                    let model_id = manager.resolve_model_id(&model).unwrap_or(model);
                    let info = manager
                        .get_model_info(&model_id)
                        .ok_or_else(|| ResumeRankerError::ModelUnavailable(format!("Unknown model: {}", model_id)))?;

                    println!("Name: {}", info.name);
                    println!("Repository: {}", info.repo_id);
                    println!("Backend: {:?}", info.backend);
                    println!("Dimensions: {}", info.dimensions);
                    println!("Size: {} MB", info.size_mb);
                    println!("Description: {}", info.description);
                    match manager.get_model_path(&model_id) {
                        Some(path) => println!("Status: downloaded ({})", path.display()),
                        None => {
                            println!("Status: available for download");
                            println!("   resume-ranker models download {}", model_id);
                        }
                    }
                }
            }
        }

        Commands::Config { action } => match action {
            Some(ConfigAction::Show) | None => {
                println!("{}\n", "Current Configuration".bold());
                println!("Models Directory: {}", config.models_dir().display());
                println!("Embedding Backend: {:?}", config.models.embedding_backend);
                println!("Embedding Model: {}", config.models.embedding_model);
                println!("\nScoring Weights:");
                println!("  Skills: {:.1}%", config.scoring.skill_weight * 100.0);
                println!("  Lexical: {:.1}%", config.scoring.lexical_weight * 100.0);
                println!("  Semantic: {:.1}%", config.scoring.semantic_weight * 100.0);
                println!("\nChunking: window {} chars, stride {} chars, top {}",
                    config.processing.chunk_window, config.processing.chunk_stride, config.processing.top_chunks);
                println!("Batch: {} workers, top {}, deadline {} ms",
                    config.batch.workers, config.batch.top_k, config.batch.deadline_ms);
                if !config.skills.extra.is_empty() {
                    println!("Extra skills: {}", config.skills.extra.len());
                }
            }

            Some(ConfigAction::Reset) => {
                Config::default().save_to(&config_path)?;
                println!("{} Configuration reset: {}", "✓".green(), config_path.display());
            }

            Some(ConfigAction::Path) => {
                println!("{}", config_path.display());
            }
        },

        Commands::Health => {
            let registry = load_registry(&config).await?;
            let health = registry.health();
            let json = serde_json::to_string_pretty(&health)?;
            println!("{}", json);
            if !health.ready {
                return Err(ResumeRankerError::ModelUnavailable(health.embedder));
            }
        }
    }

    Ok(())
}

async fn load_registry(config: &Config) -> Result<Arc<ModelRegistry>> {
    let spinner = spinner(&format!("Loading {:?} embedder...", config.models.embedding_backend));
    let result = ModelRegistry::load(config).await;
    spinner.finish_and_clear();
    let registry = result?;
    info!(
        "Embedder {} ready in {} ms",
        registry.embedder().name(),
        registry.health().load_time_ms
    );
    Ok(Arc::new(registry))
}

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn check_extension(path: &Path) -> Result<()> {
    validate_file_extension(path, &DOCUMENT_EXTENSIONS).map_err(ResumeRankerError::UnsupportedFormat)
}

fn resolve_format(output: Option<&str>, config: &Config) -> Result<OutputFormat> {
    match output {
        Some(format) => parse_output_format(format).map_err(ResumeRankerError::InvalidInput),
        None => Ok(config.output.format),
    }
}

fn emit(rendered: &str, save: Option<&Path>) -> Result<()> {
    match save {
        Some(path) => {
            save_report_to_file(rendered, path)?;
            println!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
