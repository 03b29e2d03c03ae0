//! Gavel CLI
//!
//! A command-line tool for judging source files against local problems.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gavel::process::{self, ProcessCommand};
use gavel::repository::parse_problem;
use gavel::{Config, EXAMPLE_CONFIG, InMemoryProblems, Judge, Runner, WorkspaceManager};
use tracing::{Level, debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gavel")]
#[command(about = "A tool for judging submissions against test cases")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: gavel.toml)
        #[arg(short, long, default_value = "gavel.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Judge a source file against a problem file
    Judge {
        /// Source file to judge
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Problem definition (TOML)
        #[arg(short, long)]
        problem: PathBuf,

        /// Language ID (e.g., cpp, python)
        #[arg(short, long)]
        language: String,
    },

    /// Run a program once (build if needed, then execute)
    Run {
        /// Source file to run
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Language ID (e.g., cpp, python)
        #[arg(short, long)]
        language: String,

        /// Input file (default: no input)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Time limit in milliseconds
        #[arg(short, long)]
        time_limit: Option<u64>,
    },

    /// List available languages
    Languages,

    /// Show effective configuration
    ShowConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { output, force } = &cli.command {
        return init_config(output, *force).await;
    }

    if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
    } else {
        debug!("using default configuration");
    }
    let config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Judge {
            source,
            problem,
            language,
        } => run_judge(config, &source, &problem, &language).await,
        Commands::Run {
            source,
            language,
            input,
            time_limit,
        } => run_once(config, &source, &language, input.as_deref(), time_limit).await,
        Commands::Languages => {
            list_languages(&config);
            Ok(())
        }
        Commands::ShowConfig => {
            show_config(&config);
            Ok(())
        }
    }
}

async fn run_judge(
    config: Config,
    source: &Path,
    problem_path: &Path,
    language: &str,
) -> Result<()> {
    let source_code = tokio::fs::read_to_string(source)
        .await
        .context("failed to read source file")?;
    let content = tokio::fs::read_to_string(problem_path)
        .await
        .context("failed to read problem file")?;
    let mut problem = parse_problem(&content).context("failed to parse problem file")?;
    if problem.id.is_empty() {
        problem.id = problem_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "problem".to_owned());
    }
    let problem_id = problem.id.clone();

    let judge = Judge::new(config, InMemoryProblems::new().with(problem));
    let result = match judge.judge_parts(&problem_id, &source_code, language).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Judging failed ({}): {e}", e.status_code());
            std::process::exit(1);
        }
    };

    for (label, results) in [
        ("sample", result.sample_results()),
        ("hidden", result.hidden_results()),
    ] {
        for (index, case) in results.iter().enumerate() {
            println!(
                "{label} #{:<3} {:<4} {:>6} ms",
                index + 1,
                case.status.code(),
                case.time_ms
            );
            if !case.passed {
                println!("    expected: {}", case.expected_output.trim());
                println!("    actual:   {}", case.actual_output);
            }
        }
    }

    println!();
    println!(
        "Passed {}/{} test cases",
        result.passed_count(),
        result.total_count()
    );
    println!("Score: {}", result.score());
    println!("Execution time: {} ms", result.execution_time_ms());
    if let Some(memory) = result.memory_used_mb() {
        println!("Memory: {memory:.1} MB");
    }

    Ok(())
}

async fn run_once(
    config: Config,
    source: &Path,
    language_id: &str,
    input: Option<&Path>,
    time_limit: Option<u64>,
) -> Result<()> {
    let source_content = tokio::fs::read(source)
        .await
        .context("failed to read source file")?;
    let input_data = match input {
        Some(path) => tokio::fs::read(path)
            .await
            .context("failed to read input file")?,
        None => Vec::new(),
    };

    let time_limit = Duration::from_millis(time_limit.unwrap_or(config.default_time_limit_ms));
    let workspaces = WorkspaceManager::new(config.workspace_root(), 1);
    let runner = Runner::new(config);
    let language = runner
        .language(language_id)
        .context("unknown language")?;

    let mut workspace = workspaces
        .acquire()
        .await
        .context("failed to create workspace")?;

    info!(language = %language.name, "building program");
    let report = match runner.build(&workspace, language, &source_content).await {
        Ok(report) => report,
        Err(e) => {
            if let Err(cleanup) = workspace.release().await {
                warn!(error = %cleanup, "workspace cleanup failed");
            }
            eprintln!("Build failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    };
    if !report.output.is_empty() {
        eprintln!("{}", report.output);
    }

    info!("executing program");
    let command = ProcessCommand::new(language.run_command())
        .working_dir(workspace.path())
        .envs(&language.run.env)
        .stdin(input_data)
        .timeout(time_limit);
    let outcome = process::run(command).await;

    workspace
        .release()
        .await
        .context("failed to remove workspace")?;

    print!("{}", outcome.stdout);
    if !outcome.stderr.is_empty() {
        eprintln!("{}", outcome.stderr);
    }

    // Log execution info via tracing (stderr), keeping stdout clean for piping
    info!(
        elapsed = format_args!("{:.3}s", outcome.elapsed.as_secs_f64()),
        peak_memory_kb = outcome.peak_memory_kb,
        exit_code = outcome.exit_code,
        timed_out = outcome.timed_out,
        "execution result"
    );

    if outcome.exited_normally {
        Ok(())
    } else {
        std::process::exit(outcome.exit_code.filter(|&code| code != 0).unwrap_or(1));
    }
}

fn list_languages(config: &Config) {
    println!("Available languages:\n");

    let mut languages: Vec<_> = config.languages.iter().collect();
    languages.sort_by_key(|(id, _)| *id);

    for (id, lang) in languages {
        let lang_type = if lang.is_compiled() {
            "compiled"
        } else {
            "interpreted"
        };
        let aliases = if lang.aliases.is_empty() {
            String::new()
        } else {
            format!(" [{}]", lang.aliases.join(", "))
        };
        println!("  {:<15} {} ({}){}", id, lang.name, lang_type, aliases);
    }
}

fn show_config(config: &Config) {
    println!("Workspace root: {}", config.workspace_root().display());
    println!("Default time limit: {} ms", config.default_time_limit_ms);
    println!("Max concurrent judges: {}", config.max_concurrent_judges);
    println!();
    println!("Languages configured: {}", config.languages.len());
}

async fn init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(())
}
