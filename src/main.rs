use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use console::style;
use docqa::client::intake::split_dropped_paths;
use docqa::client::{
    AlwaysConfirm, BatchReport, Confirm, Deletion, FileSelection, HttpApi, IntakeEvent, Notice,
    NoticeSink, QueryMode, UploadOrchestrator,
};
use docqa::{ClientError, Config, DocQa};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

/// Ask questions about your documents.
#[derive(Parser, Debug)]
#[command(name = "docqa", version, about, long_about = None)]
struct Cli {
    /// Base URL of the question-answering service
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (default: <config dir>/docqa/config.toml)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Do not ask before deleting
    #[arg(short, long, global = true)]
    yes: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the files the server has indexed
    Files,

    /// Upload documents one at a time (paths or glob patterns)
    Upload {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Drag files into the terminal to upload them
    Drop,

    /// Delete one file from the server
    Delete { filename: String },

    /// Delete every file from the server
    DeleteAll,

    /// Ask a question about the uploaded documents
    Ask {
        /// Answering strategy: vector or combined
        #[arg(short, long)]
        mode: Option<QueryMode>,

        #[arg(required = true, trailing_var_arg = true)]
        question: Vec<String>,
    },

    /// Run the server-side evaluation over the uploaded documents
    Evaluate,

    /// Print a shell completion script
    Completions { shell: clap_complete::Shell },
}

struct TerminalNotices;

impl NoticeSink for TerminalNotices {
    fn notify(&self, notice: Notice) {
        let marker = match &notice {
            Notice::Uploaded { .. } | Notice::Deleted { .. } => style("✓").green(),
            Notice::Rejected { .. } => style("!").yellow(),
            _ => style("✗").red(),
        };
        println!("{marker} {notice}");
    }
}

struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, message: &str) -> bool {
        match dialoguer::Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
        {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(error = %e, "Confirmation prompt unavailable, treating as no");
                false
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "docqa=debug" } else { "docqa=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config =
        Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    config
        .apply_env()
        .context("Invalid configuration in environment")?;
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    Ok(config)
}

/// Print `[i/N] name` lines while `work` runs.
async fn with_progress<F: Future>(uploads: &UploadOrchestrator, work: F) -> F::Output {
    let mut rx = uploads.subscribe_progress();
    let printer = async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Some(p) = snapshot.filter(|p| p.current > 0) {
                eprintln!(
                    "{} {}",
                    style(format!("[{}/{}]", p.current, p.total)).dim(),
                    p.current_file
                );
            }
        }
    };

    tokio::pin!(work);
    tokio::select! {
        out = &mut work => out,
        _ = printer => work.await,
    }
}

fn print_report(report: &BatchReport) {
    println!(
        "Uploaded {} of {} file(s), {} chunk(s) added; {} skipped, {} failed.",
        report.uploaded.len(),
        report.total,
        report.chunks_added,
        report.rejected.len(),
        report.failed.len()
    );
}

fn print_files(client: &DocQa) {
    let entries = client.registry.entries();
    if entries.is_empty() {
        println!("No documents uploaded yet. Upload at least one document to ask questions.");
        return;
    }
    println!("Uploaded files ({}):", entries.len());
    for entry in entries {
        println!("  📄 {}", entry.filename);
    }
}

/// A batch fails as a whole only when nothing was uploaded and some file
/// was rejected or failed.
fn batch_succeeded(report: &BatchReport) -> bool {
    !report.uploaded.is_empty() || (report.rejected.is_empty() && report.failed.is_empty())
}

fn exit_code(success: bool) -> ExitCode {
    if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Completions { shell } = &cli.command {
        clap_complete::generate(*shell, &mut Cli::command(), "docqa", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    let config = load_config(&cli)?;
    let api = HttpApi::new(&config).context("Failed to set up the HTTP client")?;
    tracing::debug!(api_url = %api.base_url(), "Using service");
    let confirm: Arc<dyn Confirm> = if cli.yes {
        Arc::new(AlwaysConfirm)
    } else {
        Arc::new(TerminalConfirm)
    };
    let client = DocQa::new(Arc::new(api), confirm, Arc::new(TerminalNotices));

    match cli.command {
        Command::Files => {
            client.registry.refresh().await;
            if client.registry.error().is_some() {
                return Ok(ExitCode::FAILURE);
            }
            print_files(&client);
            Ok(ExitCode::SUCCESS)
        }

        Command::Upload { paths } => {
            let mut selection = FileSelection::from_patterns(&paths)?;
            if selection.is_empty() {
                bail!("No files matched {}", paths.join(" "));
            }
            let report =
                with_progress(&client.uploads, client.intake.on_file_input(&mut selection)).await?;
            print_report(&report);
            print_files(&client);
            Ok(exit_code(batch_succeeded(&report)))
        }

        Command::Drop => {
            println!("Drag documents into this terminal and press Enter to upload them (Ctrl-D to finish).");
            let mut totals = BatchReport::default();
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
                let paths = split_dropped_paths(&line);
                if paths.is_empty() {
                    client.intake.on_event(IntakeEvent::DragLeave).await?;
                    continue;
                }
                client.intake.on_event(IntakeEvent::DragOver).await?;
                let dropped = client.intake.on_event(IntakeEvent::Drop(paths));
                if let Some(report) = with_progress(&client.uploads, dropped).await? {
                    print_report(&report);
                    totals.merge(report);
                }
            }
            print_files(&client);
            Ok(exit_code(batch_succeeded(&totals)))
        }

        Command::Delete { filename } => match client.registry.delete_one(&filename).await {
            Ok(Deletion::Cancelled) => {
                println!("Cancelled.");
                Ok(ExitCode::SUCCESS)
            }
            Ok(Deletion::Deleted(_)) => {
                print_files(&client);
                Ok(ExitCode::SUCCESS)
            }
            Err(_) => Ok(ExitCode::FAILURE),
        },

        Command::DeleteAll => {
            client.registry.refresh().await;
            match client.registry.delete_all().await {
                Ok(Deletion::Cancelled) => {
                    println!("Cancelled.");
                    Ok(ExitCode::SUCCESS)
                }
                Ok(Deletion::Deleted(_)) => {
                    print_files(&client);
                    Ok(ExitCode::SUCCESS)
                }
                Err(_) => Ok(ExitCode::FAILURE),
            }
        }

        Command::Ask { mode, question } => {
            client.registry.refresh().await;
            if client.registry.error().is_some() {
                return Ok(ExitCode::FAILURE);
            }
            let mode = mode.unwrap_or(config.default_mode);
            let question = question.join(" ");
            match client.ask(&question, mode).await {
                Ok(answer) => {
                    println!("{answer}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(err @ (ClientError::NoDocuments | ClientError::EmptyQuestion)) => {
                    eprintln!("{}", style(err).yellow());
                    Ok(ExitCode::FAILURE)
                }
                Err(_) => {
                    println!("{}", client.queries.answer().unwrap_or_default());
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Command::Evaluate => {
            let evaluation = client.evaluate().await.context("Evaluation failed")?;
            println!("{}", evaluation.message);
            println!(
                "{}",
                serde_json::to_string_pretty(&evaluation.results)
                    .context("Failed to render evaluation results")?
            );
            Ok(ExitCode::SUCCESS)
        }

        Command::Completions { .. } => Ok(ExitCode::SUCCESS),
    }
}
