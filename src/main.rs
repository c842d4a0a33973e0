mod cli;

use autostudio::{config, director::Director, director::StopAfter, timeline};
use studio_agents::{providers::GeminiClient, Agents};
use studio_pipeline::{Orchestrator, ProjectStore};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "autostudio=trace,studio_pipeline=trace,studio_agents=debug,studio_core=debug"
                .to_string()
        } else {
            "autostudio=info,studio_pipeline=info,studio_agents=warn,studio_core=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            idea,
            output,
            stop_after,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(run_idea(
                &idea,
                cli.config.as_deref(),
                output,
                stop_after,
            ))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("autostudio {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn run_idea(
    idea: &str,
    config_path: Option<&Path>,
    output: Option<PathBuf>,
    stop_after: Option<StopAfter>,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let client = GeminiClient::new(&config.gemini, &config.production)
        .context("Failed to create Gemini client")?;
    let store = Arc::new(ProjectStore::new(config.events.capacity));
    let orchestrator = Arc::new(Orchestrator::new(
        Agents::from_provider(Arc::new(client)),
        store,
    ));

    tracing::info!("Running pipeline for idea: {:?}", idea);
    let director = Director::new(orchestrator.clone());
    let result = director.run(idea, stop_after, std::io::stdout()).await;

    // Export whatever was reached, including a failed project.
    let state = orchestrator.snapshot();
    if let Some(path) = output.as_deref() {
        timeline::export_json(&state, path)?;
    }

    let outcome = result?;
    println!();
    println!("Project {} is {}", outcome.state.id, outcome.state.status);
    print!("{}", timeline::render_timeline(&outcome.state));

    if let Some(report) = outcome.report {
        println!(
            "Images: {}/{}  Speech: {}  Failures: {}",
            report.images,
            report.frames,
            report.speech,
            report.failures.len()
        );
        if report.is_clean() {
            println!("All requested assets were produced.");
        }
        for failure in &report.failures {
            println!(
                "  scene {} [{}]: {}",
                failure.scene_number, failure.agent, failure.message
            );
        }
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    let warnings = config.validate();
    if warnings.is_empty() {
        println!("✓ Configuration is valid");
    } else {
        println!("✓ Configuration is usable, with {} warning(s):", warnings.len());
        for warning in &warnings {
            println!("  - {}", warning);
        }
    }
    println!("  Script model: {}", config.gemini.script_model);
    println!("  Storyboard model: {}", config.gemini.storyboard_model);
    println!("  Image model: {}", config.gemini.image_model);
    println!(
        "  Speech model: {} (voice {})",
        config.gemini.speech_model, config.gemini.voice_name
    );
    println!(
        "  Rate limit: {} req/s, timeout {}s",
        config.gemini.requests_per_second, config.gemini.timeout_secs
    );
    println!(
        "  Placeholder images: {}",
        config.production.placeholder_images
    );

    Ok(())
}
