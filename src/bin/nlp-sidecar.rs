//! nlp-sidecar - local HTTP text annotation service
//!
//! Serves `POST /analyze_batch`, `GET /health`, and `GET /ready` on a
//! loopback address, or annotates texts directly from the command line.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use nlp_sidecar::{
    build_extractor, commands, server, Analyzer, ConfigLayer, ExtractorKind, ServiceConfig,
};

#[derive(Parser)]
#[command(name = "nlp-sidecar")]
#[command(version, about = "Local text annotation sidecar: sentiment, tokens, and entities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP listener (default)
    Serve(ServeArgs),

    /// Annotate texts without starting a server and print the JSON response
    Analyze {
        /// YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        extractor: ExtractorArgs,

        /// Texts to analyze (reads one text per stdin line when omitted)
        texts: Vec<String>,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    /// YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (default: 8000)
    #[arg(short, long)]
    port: Option<u16>,

    /// Maximum request body size in bytes
    #[arg(long)]
    max_body_bytes: Option<usize>,

    #[command(flatten)]
    extractor: ExtractorArgs,
}

#[derive(Args, Default)]
struct ExtractorArgs {
    /// Entity extractor (heuristic, onnx)
    #[arg(short, long)]
    extractor: Option<ExtractorKind>,

    /// Directory with model.onnx, tokenizer.json, and config.json
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("nlp_sidecar=info,tower_http=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => serve(args).await,
        Commands::Analyze {
            config,
            extractor,
            texts,
        } => analyze(config, extractor, texts),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let cli_layer = ConfigLayer {
        host: args.host,
        port: args.port,
        extractor: args.extractor.extractor,
        model_dir: args.extractor.model_dir,
        max_body_bytes: args.max_body_bytes,
    };
    let config = ServiceConfig::load(args.config.as_deref(), cli_layer)?;

    let extractor = build_extractor(config.extractor, config.model_dir.as_deref())?;
    let analyzer = Analyzer::with_extractor(extractor)?;
    tracing::info!("Using {} entity extractor", analyzer.extractor_name());

    let app = server::router_with_limit(analyzer, config.max_body_bytes);
    server::serve(config.socket_addr(), app).await?;
    Ok(())
}

fn analyze(
    config_file: Option<PathBuf>,
    args: ExtractorArgs,
    texts: Vec<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let cli_layer = ConfigLayer {
        extractor: args.extractor,
        model_dir: args.model_dir,
        ..Default::default()
    };
    let config = ServiceConfig::load(config_file.as_deref(), cli_layer)?;

    let stdin = std::io::stdin();
    let count = commands::analyze_texts(&config, texts, stdin.lock(), &mut std::io::stdout())?;
    tracing::debug!("Analyzed {} texts", count);
    Ok(())
}
