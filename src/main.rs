use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use eventline::config::{default_config_path, load_config, save_config, EventlineConfig};
use eventline::consumer::{Pipeline, TimeMode};
use eventline::nlp::{build_vectorizer, tweet, RawDocument, WeightingScheme};
use eventline::queue::DocumentQueue;
use eventline::tdt::DetectorConfig;
use eventline::timeline::{Development, Timeline};
use eventline::QueueError;

/// eventline - burst detection and topic clustering for tweet streams
#[derive(Parser)]
#[command(name = "eventline")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Detect developing events in short-text streams", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines tweet file in simulated time
    Replay {
        /// Tweets, one JSON object per line
        #[arg(long)]
        input: PathBuf,
        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Write developments here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Log a timeline summary of the developments
        #[arg(long)]
        summary: bool,
    },

    /// Consume JSON-lines tweets from stdin on the wall clock
    Live {
        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run several detectors over the same input and count developments
    Compare {
        /// Tweets, one JSON object per line
        #[arg(long)]
        input: PathBuf,
        /// Configuration file (defaults to the user config)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Comma-separated detector names
        #[arg(long, value_delimiter = ',', default_value = "eld,cataldi,zhao")]
        detectors: Vec<String>,
    },

    /// Write the default configuration
    InitConfig {
        /// Destination (defaults to the user config path)
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout carries developments only
        .init();

    match cli.command {
        Commands::Replay {
            input,
            config,
            output,
            summary,
        } => replay(&input, config.as_deref(), output.as_deref(), summary).await?,
        Commands::Live { config } => live(config.as_deref()).await?,
        Commands::Compare {
            input,
            config,
            detectors,
        } => compare(&input, config.as_deref(), &detectors).await?,
        Commands::InitConfig { output, force } => init_config(output, force)?,
    }

    Ok(())
}

/// Load the configuration; an explicit path must exist
fn resolve_config(path: Option<&Path>) -> Result<EventlineConfig> {
    match path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            load_config(path).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => match default_config_path() {
            Some(path) => {
                load_config(&path).with_context(|| format!("Failed to load {}", path.display()))
            }
            None => Ok(EventlineConfig::default()),
        },
    }
}

/// Parse one input line; malformed lines are logged and skipped
fn parse_line(line: &str, number: usize) -> Option<RawDocument> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(line) {
        Ok(value) => {
            let document = tweet::to_document(&value);
            if document.is_none() {
                warn!("Line {}: missing text or timestamp", number);
            }
            document
        }
        Err(e) => {
            warn!("Line {}: invalid JSON: {}", number, e);
            None
        }
    }
}

fn read_documents(path: &Path) -> Result<Vec<RawDocument>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut documents = Vec::new();
    for (index, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if let Some(document) = parse_line(&line, index + 1) {
            documents.push(document);
        }
    }
    info!("Read {} documents from {}", documents.len(), path.display());
    Ok(documents)
}

/// Run one pipeline over a fully loaded input
async fn run_replay(
    config: &EventlineConfig,
    documents: Vec<RawDocument>,
) -> Result<Vec<Development>> {
    let vectorizer = build_vectorizer(
        &config.tokenizer,
        &config.weighting,
        documents.iter().map(|d| d.text.as_str()),
    );

    // The whole file is already in memory, so the queue is never bounded here
    let queue = DocumentQueue::unbounded();
    let mut pipeline = Pipeline::new(config, queue.clone(), Box::new(vectorizer))?;
    for document in documents {
        queue.enqueue(document)?;
    }
    queue.close();

    pipeline.run().await?;
    Ok(pipeline.take_developments())
}

async fn replay(
    input: &Path,
    config: Option<&Path>,
    output: Option<&Path>,
    summary: bool,
) -> Result<()> {
    let mut config = resolve_config(config)?;
    config.window.time = TimeMode::Simulated;

    let documents = read_documents(input)?;
    let developments = run_replay(&config, documents).await?;

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        ),
        None => Box::new(std::io::stdout().lock()),
    };
    let mut writer = BufWriter::new(writer);
    for development in &developments {
        serde_json::to_writer(&mut writer, development)?;
        writeln!(writer)?;
    }
    writer.flush().context("Failed to write developments")?;

    if summary {
        let mut timeline = Timeline::new(config.timeline.clone())?;
        for development in developments {
            timeline.add(development);
        }
        for (created_at, texts) in timeline.summarize()? {
            info!("Node at {}:", created_at);
            for text in texts {
                info!("  {}", text);
            }
        }
    }

    Ok(())
}

async fn live(config: Option<&Path>) -> Result<()> {
    let mut config = resolve_config(config)?;
    config.window.time = TimeMode::Live;
    if config.weighting.scheme == WeightingScheme::Tfidf {
        warn!("TF-IDF has no corpus in live mode; terms are weighted by frequency");
    }

    let queue = config.queue.build()?;
    let vectorizer = build_vectorizer(&config.tokenizer, &config.weighting, std::iter::empty());
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Development>();
    let mut pipeline = Pipeline::new(&config, queue.clone(), Box::new(vectorizer))?.with_sink(tx);

    let handle = pipeline.stop_handle();
    ctrlc::set_handler(move || {
        info!("Interrupt received, draining");
        handle.stop();
    })
    .context("Failed to install Ctrl-C handler")?;

    // stdin blocks, so it gets its own thread
    let producer = queue.clone();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for (index, line) in stdin.lock().lines().enumerate() {
            let Ok(line) = line else { break };
            let Some(document) = parse_line(&line, index + 1) else {
                continue;
            };
            match producer.enqueue(document) {
                Ok(()) => {}
                Err(QueueError::Closed) => break,
                Err(e) => warn!("Line {} dropped: {}", index + 1, e),
            }
        }
        producer.close();
    });

    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        while let Some(development) = rx.recv().await {
            match serde_json::to_string(&development) {
                Ok(json) => {
                    println!("{}", json);
                    printed += 1;
                }
                Err(e) => warn!("Failed to serialize development: {}", e),
            }
        }
        printed
    });

    let stats = pipeline.run().await?;
    // Dropping the pipeline closes the channel and ends the printer
    drop(pipeline);
    let printed = printer.await.context("Printer task failed")?;
    info!(
        "Processed {} documents, printed {} developments",
        stats.documents, printed
    );
    Ok(())
}

async fn compare(input: &Path, config: Option<&Path>, detectors: &[String]) -> Result<()> {
    let mut base = resolve_config(config)?;
    base.window.time = TimeMode::Simulated;
    let documents = read_documents(input)?;

    let mut tasks = Vec::new();
    for name in detectors {
        let name = name.trim().to_lowercase();
        // Configured parameters win for the configured algorithm
        let detector = if base.detector.name() == name {
            base.detector.clone()
        } else {
            DetectorConfig::from_name(&name)
                .with_context(|| format!("Unknown detector '{}'", name))?
        };

        let mut config = base.clone();
        config.detector = detector;
        let documents = documents.clone();
        tasks.push((
            name,
            tokio::spawn(async move { run_replay(&config, documents).await }),
        ));
    }

    for (name, task) in tasks {
        let developments = task
            .await
            .with_context(|| format!("{} pipeline failed", name))??;
        println!("{}\t{}", name, developments.len());
    }
    Ok(())
}

fn init_config(output: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match output {
        Some(path) => path,
        None => default_config_path().context("Could not determine config directory")?,
    };
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            path.display()
        );
    }

    save_config(&EventlineConfig::default(), &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Wrote default configuration to {}", path.display());
    Ok(())
}
