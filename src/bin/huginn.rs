//! huginn: interactive reply gate.
//!
//! Reads prompts from stdin, one per line, and resolves each through a
//! [`ResponseGate`](huginn::ResponseGate) backed by the configured
//! provider chain. Useful for exercising cache and throttle settings
//! against real providers.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use huginn::{Config, ReplyKey, ReplyRequest, Resolution, Secrets};

#[derive(Parser)]
#[command(name = "huginn")]
#[command(version = huginn::PKG_VERSION)]
#[command(about = "Cached, rate-limited LLM replies from stdin")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Requester identity charged against the rate limit.
    #[arg(short, long, default_value = "cli")]
    requester: String,

    /// System prompt sent with every request.
    #[arg(short, long, env = "HUGINN_SYSTEM_PROMPT")]
    system: Option<String>,

    /// Persona mode folded into the cache key.
    #[arg(long)]
    persona_mode: Option<String>,

    /// Mood folded into the cache key.
    #[arg(long)]
    mood: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;

    let generator = config.generator(&secrets)?;
    let gate = config.gate_builder().name("cli").build()?;

    info!(
        version = huginn::version_string(),
        providers = ?generator.provider_names(),
        "huginn ready"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let prompt = line.trim();
        if prompt.is_empty() {
            continue;
        }

        let mut key = ReplyKey::new(prompt);
        if let Some(mode) = &args.persona_mode {
            key = key.persona_mode(mode.as_str());
        }
        if let Some(mood) = &args.mood {
            key = key.mood(mood.as_str());
        }

        let mut request = ReplyRequest::new(prompt);
        if let Some(system) = &args.system {
            request = request.system(system.as_str());
        }

        match gate
            .resolve_reply(&key, args.requester.as_str(), &generator, &request)
            .await
        {
            Ok(Resolution::Throttled { retry_after }) => {
                println!("(slow down, try again in {}s)", retry_after.as_secs().max(1));
            }
            Ok(resolution) => {
                let cached = resolution.is_cached();
                if let Some(reply) = resolution.into_value() {
                    println!("{reply}");
                }
                info!(cached, "resolved");
            }
            Err(e) => warn!(error = %e, "generation failed"),
        }
    }

    let stats = gate.stats();
    info!(
        entries = stats.cache.entries,
        hits = stats.cache.hits,
        misses = stats.cache.misses,
        "session done"
    );

    Ok(())
}
