use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use standalone_agent_sdk::agent::AgentConfig;
use standalone_agent_sdk::cli::{validate_store, Console, ExecutionRenderer};
use standalone_agent_sdk::handler::{describe_error, StandaloneHandler};
use standalone_agent_sdk::logging;
use standalone_agent_sdk::store::{ConfigStore, ExecutionStore, FileStore, PromptStore};

#[derive(Parser)]
#[command(name = "standalone-agent", author, version, about, long_about = None)]
struct Cli {
    /// Store directory (defaults to AGENT_STORE_DIR, then ./store)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Debug-level logging unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an agent once on the given input
    Run {
        config_id: String,

        /// The request; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        input: Vec<String>,

        /// Also print tool and message history
        #[arg(short, long)]
        verbose: bool,

        /// Print the handler response as JSON instead
        #[arg(long, conflicts_with = "verbose")]
        json: bool,
    },

    /// Check every stored configuration and prompt
    Validate,

    /// Import a configuration file, and optionally a prompt, into the store
    Init {
        config: PathBuf,

        /// Prompt id and the file holding its text
        #[arg(long, num_args = 2, value_names = ["PROMPT_ID", "FILE"])]
        prompt: Option<Vec<String>>,
    },

    /// List past executions of a configuration, most recent first
    History {
        config_id: String,

        #[arg(short = 'n', long, default_value_t = 100)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let _guard = logging::init_logging(cli.debug)?;

    let store = match &cli.store {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::from_env(),
    };
    tracing::debug!("Using store at {}", store.base_dir().display());

    let console = Console::new();

    match cli.command {
        Command::Run {
            config_id,
            input,
            verbose,
            json,
        } => run(&console, store, &config_id, &input.join(" "), verbose, json).await,
        Command::Validate => validate(&console, &store),
        Command::Init { config, prompt } => init(&console, &store, &config, prompt.as_deref()),
        Command::History { config_id, limit } => history(&console, &store, &config_id, limit),
    }
}

async fn run(
    console: &Console,
    store: FileStore,
    config_id: &str,
    input: &str,
    verbose: bool,
    json: bool,
) -> Result<ExitCode> {
    let store = Arc::new(store);
    let handler = StandaloneHandler::new(store.clone(), store.clone(), store);

    if json {
        let response = handler.handle(config_id, input).await;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(if response.success {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    console.print_user(input);

    match handler.execute(config_id, input).await {
        Ok(execution) => {
            let renderer = if verbose {
                ExecutionRenderer::full()
            } else {
                ExecutionRenderer::compact()
            };
            renderer.render(&execution.outcome.state);
            console.print_field("Execution ID", &execution.execution_id);
            console.print_field("Stop reason", &execution.outcome.stop_reason.to_string());
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            console.print_error(&describe_error(&e));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn validate(console: &Console, store: &FileStore) -> Result<ExitCode> {
    let report = validate_store(store)?;

    console.print_section("VALIDATING CONFIGURATION TEMPLATES");

    console.println("\nAgent Configs:");
    if report.configs.is_empty() {
        console.print_warning(&format!(
            "No config files found in {}",
            store.base_dir().join("agents").display()
        ));
    }
    for check in &report.configs {
        let line = format!("{}: {}", check.file, check.message);
        if check.ok {
            console.print_ok(&line);
        } else {
            console.print_failed(&line);
        }
    }

    console.println("\nPrompts:");
    if report.prompts.is_empty() {
        console.print_warning(&format!(
            "No prompt files found in {}",
            store.base_dir().join("prompts").display()
        ));
    }
    for check in &report.prompts {
        let line = format!("{}: {}", check.file, check.message);
        if check.ok {
            console.print_ok(&line);
        } else {
            console.print_failed(&line);
        }
    }

    console.println("");
    if report.passed() {
        console.print_ok("ALL VALIDATIONS PASSED");
        Ok(ExitCode::SUCCESS)
    } else {
        console.print_failed("VALIDATION FAILED");
        Ok(ExitCode::FAILURE)
    }
}

fn init(
    console: &Console,
    store: &FileStore,
    config_path: &Path,
    prompt: Option<&[String]>,
) -> Result<ExitCode> {
    let raw = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: AgentConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse {}", config_path.display()))?;
    config.validate()?;

    if let Some([prompt_id, prompt_file]) = prompt {
        let content = std::fs::read_to_string(prompt_file)
            .with_context(|| format!("Failed to read {}", prompt_file))?;
        store.save_prompt(prompt_id, &content)?;
        console.print_ok(&format!("Saved prompt '{}'", prompt_id));
    }

    store.save_config(&config)?;
    console.print_ok(&format!(
        "Saved config '{}' ({})",
        config.config_id, config.name
    ));
    Ok(ExitCode::SUCCESS)
}

fn history(console: &Console, store: &FileStore, config_id: &str, limit: usize) -> Result<ExitCode> {
    let records = store.list_executions(config_id, limit)?;
    if records.is_empty() {
        console.print_system(&format!("No executions found for {}", config_id));
        return Ok(ExitCode::SUCCESS);
    }

    console.print_section(&format!("EXECUTIONS OF {}", config_id));
    for record in records {
        console.println("");
        console.print_field("Execution ID", &record.execution_id);
        console.print_field("Timestamp", &record.timestamp.to_rfc3339());
        console.print_field("Input", &record.user_input);
        console.print_field(
            "Iterations",
            &format!(
                "{} ({} tool calls)",
                record.metadata.iterations, record.metadata.tool_calls
            ),
        );
        let preview: String = record.result.chars().take(120).collect();
        console.print_field("Result", &preview);
        console.print_separator();
    }
    Ok(ExitCode::SUCCESS)
}
