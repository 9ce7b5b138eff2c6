use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

use augur::banner::{BannerInfo, print_banner, print_session_summary};
use augur::chat::{ChatClient, ChatReply};
use augur::commands::{CommandRegistry, CommandResult, Mode, SessionInfo, StateChange};
use augur::config::{Config, Key, Overrides, Settings};
use augur::consts::default_db_path;
use augur::dispatcher::{PromptBody, RequestDispatcher};
use augur::envelope::{AnalysisReport, AnalysisResult, pretty};
use augur::interrupt::{ctrl_c, until_interrupted};
use augur::spinner::Spinner;
use augur::surface::terminal::TerminalSurface;

#[derive(Parser)]
#[command(name = "augur", version, about = "Ask a workflow backend what your prompt is made of.")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Analysis endpoint URL
    #[arg(long, env = "AUGUR_ENDPOINT", global = true)]
    endpoint: Option<String>,

    /// Workflow-builder chat endpoint URL
    #[arg(long, env = "AUGUR_CHAT_ENDPOINT", global = true)]
    chat_endpoint: Option<String>,

    /// SQLite database holding saved settings (use :memory: to ignore it)
    #[arg(short, long, global = true)]
    db: Option<String>,

    /// Send the prompt trimmed or exactly as typed (beats the saved setting)
    #[arg(long, value_enum, env = "AUGUR_PROMPT_BODY", global = true)]
    prompt_body: Option<PromptBodyArg>,

    /// After a successful analysis, print a digest of the categorization
    #[arg(long, default_value_t = false, global = true)]
    report: bool,

    /// Log debug output to stderr
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Analyze a single prompt and exit (non-interactive)
    #[arg(short, long)]
    run: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PromptBodyArg {
    Trimmed,
    Raw,
}

impl From<PromptBodyArg> for PromptBody {
    fn from(arg: PromptBodyArg) -> Self {
        match arg {
            PromptBodyArg::Trimmed => PromptBody::Trimmed,
            PromptBodyArg::Raw => PromptBody::Raw,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one prompt and exit. Reads stdin when no prompt is given.
    Analyze {
        /// The workflow prompt
        prompt: Vec<String>,
    },
    /// Talk to the workflow builder until it settles on an intent
    Chat,
    /// Inspect or change saved settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print a stored value
    Get { key: String },
    /// Store a value (endpoint, chat_endpoint, prompt_body)
    Set { key: String, value: String },
    /// Remove a stored value
    Unset { key: String },
    /// Print every stored value
    List,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let db_path = match &cli.db {
        Some(path) => path.clone(),
        None => prepare_default_db()?,
    };
    let config = Config::open(&db_path)?;

    if let Some(Command::Config { action }) = &cli.command {
        handle_config(&config, action)?;
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::resolve(&config, &overrides(&cli))?;

    match cli.command {
        Some(Command::Chat) => run_chat(&settings, &db_path, cli.report).await,
        Some(Command::Analyze { prompt }) => {
            let prompt = if prompt.is_empty() {
                read_stdin_prompt().await?
            } else {
                prompt.join(" ")
            };
            analyze_once(&settings, &prompt, cli.report).await
        }
        Some(Command::Config { .. }) => Ok(ExitCode::SUCCESS),
        None => match cli.run {
            Some(prompt) => analyze_once(&settings, &prompt, cli.report).await,
            None => run_analyze_repl(&settings, &db_path, cli.report).await,
        },
    }
}

fn overrides(cli: &Cli) -> Overrides {
    Overrides {
        endpoint: cli.endpoint.clone(),
        chat_endpoint: cli.chat_endpoint.clone(),
        prompt_body: cli.prompt_body.map(PromptBody::from),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "augur=debug" } else { "error" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Resolve `~/.augur/augur.db`, creating the directory on first use.
fn prepare_default_db() -> Result<String> {
    let path = default_db_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(path.to_string_lossy().into_owned())
}

async fn read_stdin_prompt() -> Result<String> {
    if io::stdin().is_terminal() {
        anyhow::bail!("no prompt given (pass it as an argument or pipe it on stdin)");
    }
    let mut prompt = String::new();
    tokio::io::stdin()
        .read_to_string(&mut prompt)
        .await
        .context("failed to read prompt from stdin")?;
    Ok(prompt)
}

fn handle_config(config: &Config, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let key: Key = key.parse()?;
            match config.get(key)? {
                Some(value) => println!("{value}"),
                None => println!("({key} is not set)"),
            }
        }
        ConfigAction::Set { key, value } => {
            let key: Key = key.parse()?;
            config.set(key, value)?;
            println!("✓ {key} = {}", value.trim());
        }
        ConfigAction::Unset { key } => {
            let key: Key = key.parse()?;
            config.remove(key)?;
            println!("✓ {key} unset");
        }
        ConfigAction::List => {
            let stored = config.list()?;
            if stored.is_empty() {
                println!("no settings stored, using defaults");
            }
            for (key, value) in stored {
                println!("{key} = {value}");
            }
        }
    }
    Ok(())
}

fn print_report(result: &AnalysisResult) {
    print!("\n{}", AnalysisReport::from_result(result).render());
}

async fn analyze_once(settings: &Settings, prompt: &str, report: bool) -> Result<ExitCode> {
    let dispatcher =
        RequestDispatcher::new(&settings.endpoint)?.with_prompt_body(settings.prompt_body);
    let surface = TerminalSurface::new();
    surface.set_prompt(prompt);

    match dispatcher.dispatch(&surface).await {
        Ok(result) => {
            if report {
                print_report(&result);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(_) => Ok(ExitCode::FAILURE),
    }
}

/// Next REPL line; `None` on EOF, read error or Ctrl+C.
async fn read_line(lines: &mut Lines<BufReader<Stdin>>, prompt: &str) -> Result<Option<String>> {
    print!("\n{prompt} ");
    io::stdout().flush()?;

    let line = tokio::select! {
        result = lines.next_line() => match result {
            Ok(line) => line,
            Err(e) => {
                eprintln!("input error: {e}");
                None
            }
        },
        _ = tokio::signal::ctrl_c() => None,
    };
    if line.is_none() {
        println!();
    }
    Ok(line)
}

async fn run_analyze_repl(settings: &Settings, db_path: &str, report: bool) -> Result<ExitCode> {
    let dispatcher =
        RequestDispatcher::new(&settings.endpoint)?.with_prompt_body(settings.prompt_body);
    let surface = TerminalSurface::new();
    let registry = CommandRegistry::new(Mode::Analyze);
    let prompt_body = settings.prompt_body.to_string();

    print_banner(&BannerInfo {
        mode: "analyze",
        endpoint: &settings.endpoint,
        prompt_body: &prompt_body,
        config: db_path,
    });

    let info = SessionInfo {
        mode: Mode::Analyze,
        endpoint: &settings.endpoint,
        chat_endpoint: &settings.chat_endpoint,
        prompt_body: settings.prompt_body,
        db_path,
        session_id: None,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (mut requests, mut failures) = (0, 0);

    while let Some(line) = read_line(&mut lines, "augur>").await? {
        match registry.dispatch(&line, &info).await {
            CommandResult::Quit => break,
            CommandResult::Handled | CommandResult::StateChanged(_) => continue,
            CommandResult::NotACommand => {}
        }

        surface.set_prompt(&line);
        let Some(outcome) = until_interrupted(dispatcher.dispatch(&surface), ctrl_c()).await
        else {
            println!("\n\ninterrupted");
            continue;
        };
        match outcome {
            Ok(result) => {
                requests += 1;
                if report {
                    print_report(&result);
                }
            }
            Err(e) if e.is_validation() => {}
            Err(_) => {
                requests += 1;
                failures += 1;
            }
        }
    }

    print_session_summary(requests, failures);
    Ok(ExitCode::SUCCESS)
}

async fn run_chat(settings: &Settings, db_path: &str, report: bool) -> Result<ExitCode> {
    let mut chat = ChatClient::new(&settings.chat_endpoint)?;
    let registry = CommandRegistry::new(Mode::Chat);
    let prompt_body = settings.prompt_body.to_string();

    print_banner(&BannerInfo {
        mode: "chat",
        endpoint: &settings.chat_endpoint,
        prompt_body: &prompt_body,
        config: db_path,
    });
    println!("describe the workflow; /done when it's right, /help for more");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (mut requests, mut failures) = (0, 0);

    while let Some(line) = read_line(&mut lines, "you>").await? {
        let info = SessionInfo {
            mode: Mode::Chat,
            endpoint: &settings.endpoint,
            chat_endpoint: &settings.chat_endpoint,
            prompt_body: settings.prompt_body,
            db_path,
            session_id: Some(chat.session_id()),
        };

        let outcome = match registry.dispatch(&line, &info).await {
            CommandResult::Quit => break,
            CommandResult::Handled => continue,
            CommandResult::StateChanged(StateChange::ResetChat) => {
                chat.reset();
                println!("  ✓ new session {}", chat.session_id());
                continue;
            }
            CommandResult::StateChanged(StateChange::FinalizeChat) => {
                until_interrupted(Spinner::run("finalizing", chat.finalize()), ctrl_c()).await
            }
            CommandResult::NotACommand => {
                until_interrupted(Spinner::run("thinking", chat.send(&line)), ctrl_c()).await
            }
        };
        let Some(outcome) = outcome else {
            println!("\n\ninterrupted");
            continue;
        };

        match outcome {
            Ok(ChatReply::Ignored) => continue,
            Ok(ChatReply::Reply(text)) => println!("builder> {text}"),
            Ok(ChatReply::Finalized {
                final_intent,
                analysis,
                n8n_workflow,
                error,
                ..
            }) => {
                println!("\nFinal workflow intent:\n  {final_intent}");
                println!("\nAnalysis:\n{}", pretty(&analysis));
                if let Some(workflow) = &n8n_workflow {
                    println!("\nn8n workflow:\n{}", pretty(workflow));
                }
                if let Some(error) = error {
                    eprintln!("  ! workflow generation: {error}");
                }
                if report {
                    print_report(&AnalysisResult(analysis));
                }
                println!("\n  ✓ started new session {}", chat.session_id());
            }
            Err(e) => {
                failures += 1;
                eprintln!("  ! {e}");
            }
        }
        requests += 1;
    }

    print_session_summary(requests, failures);
    Ok(ExitCode::SUCCESS)
}
