//! FairFlip binary
//!
//! Runs the HTTP service, or flips and verifies from the command line.

use clap::{Parser, Subcommand};
use fairflip::{
    api::ApiServer,
    config::{apply_overrides, ConfigLoader, FairFlipConfig},
    errors::{FairFlipError, FairFlipResult},
    games::{seed::random_seed, verify, FairOutcomeEngine, SeedCommitment},
};
use std::path::PathBuf;

/// FairFlip CLI
#[derive(Parser)]
#[command(name = "fairflip")]
#[command(about = "Provably fair commit-reveal coin flips")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Listen address
        #[arg(long)]
        host: Option<String>,

        /// Listen port
        #[arg(short, long)]
        port: Option<u16>,

        /// Start from the local development preset
        #[arg(long)]
        dev: bool,
    },

    /// Compute one flip; seeds are drawn at random when omitted
    Flip {
        #[arg(short, long)]
        server_seed: Option<String>,

        #[arg(short = 'p', long)]
        player_seed: Option<String>,

        #[arg(short, long, default_value = "0")]
        nonce: u64,
    },

    /// Verify a flip from its disclosed values
    Verify {
        #[arg(long)]
        server_seed: String,

        #[arg(long)]
        player_seed: String,

        #[arg(long)]
        nonce: String,

        #[arg(long)]
        digest: String,

        /// HEADS or TAILS
        #[arg(long)]
        outcome: String,
    },

    /// Write the default configuration to a TOML file
    GenerateConfig {
        #[arg(default_value = "fairflip.toml")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> FairFlipResult<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "fairflip=debug,tower_http=debug"
    } else {
        "fairflip=info,tower_http=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .try_init();

    match cli.command {
        Commands::Serve { host, port, dev } => {
            let config = load_config(cli.config, dev, host, port)?;
            ApiServer::new(config).run().await
        }
        Commands::Flip {
            server_seed,
            player_seed,
            nonce,
        } => run_flip(server_seed, player_seed, nonce),
        Commands::Verify {
            server_seed,
            player_seed,
            nonce,
            digest,
            outcome,
        } => run_verify(&server_seed, &player_seed, &nonce, &digest, &outcome),
        Commands::GenerateConfig { path } => {
            ConfigLoader::new().save(&FairFlipConfig::default(), &path)?;
            println!("📝 Wrote default configuration to {}", path);
            Ok(())
        }
    }
}

fn load_config(
    path: Option<PathBuf>,
    dev: bool,
    host: Option<String>,
    port: Option<u16>,
) -> FairFlipResult<FairFlipConfig> {
    let mut config = match path {
        Some(path) => ConfigLoader::new().with_path(path).load()?,
        None if dev => {
            let mut config = FairFlipConfig::development();
            apply_overrides(&mut config, |key| std::env::var(key).ok())?;
            config
        }
        None => ConfigLoader::new().load()?,
    };

    // Override with CLI options
    if let Some(host) = host {
        config.api.host = host;
    }
    if let Some(port) = port {
        config.api.port = port;
    }

    config.validate()?;
    Ok(config)
}

fn run_flip(server_seed: Option<String>, player_seed: Option<String>, nonce: u64) -> FairFlipResult<()> {
    let engine = FairOutcomeEngine::new()?;
    let commitment = SeedCommitment::from_parts(
        server_seed.unwrap_or_else(random_seed),
        player_seed.unwrap_or_else(random_seed),
        nonce,
    )?;

    println!("🔒 Server seed hash: {}", FairOutcomeEngine::digest_hex(commitment.server_seed()));
    let record = engine.compute_outcome("cli", commitment, None);
    let json = serde_json::to_string_pretty(&record).map_err(|e| FairFlipError::Io(e.into()))?;
    println!("{}", json);

    Ok(())
}

fn run_verify(
    server_seed: &str,
    player_seed: &str,
    nonce: &str,
    digest: &str,
    outcome: &str,
) -> FairFlipResult<()> {
    let verdict = verify(server_seed, player_seed, nonce, digest, outcome);

    match (verdict.valid, verdict.reason.as_deref()) {
        (true, _) => println!("✅ Valid flip"),
        (false, reason) => println!("❌ Invalid: {}", reason.unwrap_or("unknown")),
    }
    if let (Some(digest), Some(outcome)) = (&verdict.computed_digest, verdict.computed_outcome) {
        println!("   Computed digest:  {}", digest);
        println!("   Computed outcome: {}", outcome);
    }

    if !verdict.valid {
        std::process::exit(1);
    }
    Ok(())
}
