mod display;
mod interrupt;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use nyaya_advisor::config::{
    DEFAULT_CONTEXT_TOKENS, DEFAULT_CORPUS_DIR, DEFAULT_MODEL_DIR, DEFAULT_TOP_K,
};
use nyaya_advisor::{check_status, Advisor, AdvisorConfig, Outcome};
use nyaya_ai::ollama::{DEFAULT_MODEL, OLLAMA_DEFAULT_URL};
use nyaya_ai::{OllamaClient, RetryPolicy};
use nyaya_store::LanceStore;
use tokio::io::{AsyncBufReadExt, BufReader};

use interrupt::Interrupts;

/// Offline Bharatiya Nyaya Sanhita (BNS) 2023 legal assistant.
#[derive(Parser)]
#[command(name = "nyaya", version, about)]
struct Cli {
    #[command(flatten)]
    opts: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Options {
    /// Persisted LanceDB corpus of BNS sections.
    #[arg(long, global = true, env = "NYAYA_CORPUS_DIR", default_value = DEFAULT_CORPUS_DIR)]
    corpus_dir: PathBuf,

    /// Offline sentence-transformer directory (model.onnx + tokenizer.json).
    #[arg(long, global = true, env = "NYAYA_MODEL_DIR", default_value = DEFAULT_MODEL_DIR)]
    model_dir: PathBuf,

    #[arg(long, global = true, env = "NYAYA_OLLAMA_URL", default_value = OLLAMA_DEFAULT_URL)]
    ollama_url: String,

    /// Ollama model used for the analysis.
    #[arg(long, global = true, env = "NYAYA_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Sections retrieved per incident.
    #[arg(long, global = true, env = "NYAYA_TOP_K", default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Per-attempt generation timeout in seconds.
    #[arg(long, global = true, env = "NYAYA_TIMEOUT_SECS", default_value_t = 120)]
    timeout_secs: u64,

    /// Retries for transient model-server failures.
    #[arg(long, global = true, env = "NYAYA_MAX_RETRIES", default_value_t = 2)]
    max_retries: u32,

    /// Context budget in estimated tokens; 0 disables the guard.
    #[arg(long, global = true, env = "NYAYA_CONTEXT_TOKENS", default_value_t = DEFAULT_CONTEXT_TOKENS)]
    context_tokens: usize,
}

impl Options {
    fn to_config(&self) -> AdvisorConfig {
        AdvisorConfig {
            corpus_dir: self.corpus_dir.clone(),
            model_dir: self.model_dir.clone(),
            ollama_url: self.ollama_url.clone(),
            model: self.model.clone(),
            top_k: self.top_k,
            timeout: Duration::from_secs(self.timeout_secs),
            retry: RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            },
            context_tokens: (self.context_tokens > 0).then_some(self.context_tokens),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Analyse one incident description.
    Ask {
        /// Incident description, e.g. "My neighbor threatened to hit me".
        #[arg(required = true, num_args = 1..)]
        incident: Vec<String>,
    },
    /// Read incident descriptions from stdin, one per line.
    Interactive,
    /// Check the corpus store and the model server.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = cli.opts.to_config();
    tracing::info!("nyaya v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Ask { incident } => ask(&config, &incident.join(" ")).await,
        Command::Interactive => interactive(&config).await,
        Command::Status => status(&config).await,
    }
}

async fn ask(config: &AdvisorConfig, incident: &str) -> anyhow::Result<()> {
    let mut advisor = Advisor::open(config).context("starting advisor")?;
    let interrupts = Interrupts::install();
    let outcome = interrupts.submit(&mut advisor, incident).await;
    advisor.close();

    match outcome {
        Outcome::Answered(c) => {
            display::print_consultation(&c);
            Ok(())
        }
        Outcome::Ignored => anyhow::bail!("incident description is empty"),
        Outcome::Failed(e) => Err(e.into()),
    }
}

async fn interactive(config: &AdvisorConfig) -> anyhow::Result<()> {
    let mut advisor = Advisor::open(config).context("starting advisor")?;
    let mut interrupts = Interrupts::install();
    eprintln!("Describe the incident (empty line to skip, Ctrl-C or Ctrl-D to quit)");
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupts.idle_interrupt() => {
                eprintln!();
                break;
            }
        };
        let Some(line) = line else { break };
        match interrupts.submit(&mut advisor, &line).await {
            Outcome::Ignored => {}
            Outcome::Answered(c) => display::print_consultation(&c),
            Outcome::Failed(e) => display::print_error(&e),
        }
        eprint!("> ");
    }

    advisor.close();
    Ok(())
}

async fn status(config: &AdvisorConfig) -> anyhow::Result<()> {
    let store = LanceStore::open(&config.corpus_dir)?;
    let client = OllamaClient::new(config.ollama_url.clone(), config.model.clone())
        .with_timeout(Duration::from_secs(5))
        .with_retry(RetryPolicy::none());

    let report = check_status(&store, &client).await;
    display::print_status(&report, &config.corpus_dir.display().to_string());

    anyhow::ensure!(report.is_ready(), "system not ready");
    Ok(())
}
