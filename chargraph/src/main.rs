//! chargraph: extract a character-relationship graph from a text.

use chargraph_core::{index, ExtractError, Extractor, ExtractorConfig, SnapshotError, SnapshotStore};
use clap::Parser;
use llmclient::{Client, Provider};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser, Debug)]
#[command(
    name = "chargraph",
    version,
    about = "Extract characters and their relationships from a text into JSON graph snapshots"
)]
struct Args {
    /// Text file to analyze.
    input_file: PathBuf,

    /// Base path for output files; iteration N lands in <BASE>_N.json.
    output_base: PathBuf,

    /// Number of refinement iterations.
    #[arg(short, long, default_value_t = 1)]
    iterations: u32,

    /// Seconds to wait between model calls.
    #[arg(short, long, default_value_t = 10)]
    delay: u64,

    /// Previous snapshot to seed the first iteration with.
    #[arg(short, long)]
    previous: Option<PathBuf>,

    /// Render an SVG of the graph beside each snapshot.
    #[arg(long)]
    plot: bool,

    /// Ask for per-character descriptions of at most this many sentences.
    #[arg(long, value_name = "N")]
    desc_sentences: Option<u32>,

    /// Ask for an image-generation prompt for each character.
    #[arg(long)]
    portraits: bool,

    /// Number of copies of the text to include in each prompt.
    #[arg(long, default_value_t = 1)]
    copies: u32,

    /// Sampling temperature.
    #[arg(short, long, default_value_t = 1.0)]
    temperature: f32,

    /// Use OpenRouter instead of the Gemini API.
    #[arg(long)]
    openrouter: bool,

    /// Model identifier, overriding the provider default.
    #[arg(short, long)]
    model: Option<String>,

    /// Display title for the book index; defaults to the input file name.
    #[arg(long)]
    title: Option<String>,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("failed to read input {}: {source}", .path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(transparent)]
    Client(#[from] llmclient::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(%error, "extraction failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), AppError> {
    let text = tokio::fs::read_to_string(&args.input_file)
        .await
        .map_err(|source| AppError::Input {
            path: args.input_file.clone(),
            source,
        })?;

    let provider = if args.openrouter {
        Provider::OpenRouter
    } else {
        Provider::Gemini
    };
    let mut client = Client::from_env(provider)?;
    if let Some(model) = &args.model {
        client = client.with_model(model);
    }
    tracing::info!(provider = ?client.provider(), model = client.model(), "client ready");

    let store = SnapshotStore::open(&args.output_base).await?;

    let mut config = ExtractorConfig::new()
        .with_iterations(args.iterations)
        .with_delay(Duration::from_secs(args.delay))
        .with_copies(args.copies)
        .with_temperature(args.temperature);
    if let Some(previous) = &args.previous {
        config = config.with_seed(previous);
    }
    if let Some(sentences) = args.desc_sentences {
        config = config.with_descriptions(sentences);
    }
    if args.portraits {
        config = config.with_portraits();
    }
    if args.plot {
        config = config.with_images();
    }

    let report = Extractor::new(client, config).run(&text, &store).await?;

    let title = args.title.clone().unwrap_or_else(|| {
        args.input_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| store.stem().to_string())
    });
    index::record_run(&store, &title).await?;

    tracing::info!(
        completed = report.completed(),
        skipped = report.skipped(),
        title = %title,
        "run finished"
    );
    if let Some(path) = report.final_snapshot() {
        tracing::info!(snapshot = %path.display(), "final snapshot");
    }

    Ok(())
}
