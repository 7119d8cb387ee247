mod display;

use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sentclass_client::{ClientConfig, TritonClient};
use sentclass_core::{IoConfig, ModelRef};
use sentclass_infer::{
    ClassifierService, DEFAULT_MAX_CONCURRENT_BATCHES, ServiceOptions, TensorSegmenter,
};
use tracing_subscriber::EnvFilter;

use crate::display::Format;

#[derive(Parser)]
#[command(name = "sentclass", version, about = "Classify documents and their sentences with a Triton-served model")]
struct Cli {
    /// Triton gRPC endpoint.
    #[arg(long, env = "SENTCLASS_SERVER", default_value = "localhost:8001")]
    server: String,

    /// Classification model name.
    #[arg(long, env = "SENTCLASS_MODEL", default_value = "classifier")]
    model: String,

    /// Classification model version (empty lets the server choose).
    #[arg(long, env = "SENTCLASS_MODEL_VERSION", default_value = "")]
    model_version: String,

    /// Sentence segmentation model name.
    #[arg(long, env = "SENTCLASS_SEGMENTER_MODEL", default_value = "sentence_splitter")]
    segmenter_model: String,

    /// Sentence segmentation model version.
    #[arg(long, env = "SENTCLASS_SEGMENTER_VERSION", default_value = "")]
    segmenter_version: String,

    /// Per-call deadline in seconds.
    #[arg(long, env = "SENTCLASS_TIMEOUT_SECS", default_value_t = 10)]
    timeout_secs: u64,

    /// Maximum texts per inference request; batches are sent concurrently.
    #[arg(long, env = "SENTCLASS_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Maximum batch requests in flight at once.
    #[arg(long, env = "SENTCLASS_MAX_CONCURRENT_BATCHES", default_value_t = DEFAULT_MAX_CONCURRENT_BATCHES)]
    max_concurrent_batches: usize,

    /// JSON file overriding model tensor names.
    #[arg(long, env = "SENTCLASS_IO_CONFIG")]
    io_config: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Json)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify each input line as a whole.
    Classify {
        /// Input file, one text per line (stdin if omitted).
        input: Option<PathBuf>,
    },
    /// Split each input line into sentences and classify every sentence.
    ClassifySentences {
        /// Input file, one document per line (stdin if omitted).
        input: Option<PathBuf>,
    },
    /// Check that the inference server is live and ready.
    Ready,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("sentclass v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let io = match &cli.io_config {
        Some(path) => load_io_config(path)?,
        None => IoConfig::default(),
    };

    let config = ClientConfig {
        endpoint: cli.server.clone(),
        timeout: Duration::from_secs(cli.timeout_secs),
    };
    let model = ModelRef::new(&cli.model, &cli.model_version);

    // `ready` probes on its own terms; the other commands require a ready server up front.
    let client = match cli.command {
        Command::Ready => TritonClient::connect(&config).await,
        _ => TritonClient::connect_checked(&config, &model).await,
    }
    .context("connecting to inference server")?;
    let service = build_service(client, &cli, model, io);
    let mut stdout = std::io::stdout().lock();

    match &cli.command {
        Command::Classify { input } => {
            let texts = read_lines(input.as_deref())?;
            let results = service
                .get_preds(&texts)
                .await
                .context("classifying texts")?;
            display::write_preds(&mut stdout, cli.format, &texts, &results)?;
        }
        Command::ClassifySentences { input } => {
            let documents = read_lines(input.as_deref())?;
            let results = service
                .get_preds_per_sent(&documents)
                .await
                .context("classifying sentences")?;
            display::write_documents(&mut stdout, cli.format, &results)?;
        }
        Command::Ready => {
            service
                .ensure_ready()
                .await
                .context("inference server is not ready")?;
            writeln!(stdout, "ready")?;
        }
    }

    Ok(())
}

fn build_service(
    client: TritonClient,
    cli: &Cli,
    model: ModelRef,
    io: IoConfig,
) -> ClassifierService<TensorSegmenter<TritonClient>, TritonClient> {
    let segmenter = TensorSegmenter::new(
        client.clone(),
        ModelRef::new(&cli.segmenter_model, &cli.segmenter_version),
        io.segmenter,
    );
    ClassifierService::new(
        segmenter,
        client,
        ServiceOptions {
            model,
            io: io.model,
            batch_size: cli.batch_size,
            max_concurrent_batches: cli.max_concurrent_batches,
        },
    )
}

fn load_io_config(path: &Path) -> anyhow::Result<IoConfig> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading I/O config {}", path.display()))?;
    IoConfig::from_json(&json).with_context(|| format!("parsing I/O config {}", path.display()))
}

/// Read non-empty lines from a file, or stdin when no path is given.
fn read_lines(path: Option<&Path>) -> anyhow::Result<Vec<String>> {
    let reader: Box<dyn Read> = match path {
        Some(p) => Box::new(
            std::fs::File::open(p).with_context(|| format!("opening {}", p.display()))?,
        ),
        None => Box::new(std::io::stdin()),
    };
    collect_lines(BufReader::new(reader))
}

fn collect_lines(reader: impl BufRead) -> anyhow::Result<Vec<String>> {
    let mut lines = Vec::new();
    for line in reader.lines() {
        let line = line.context("reading input")?;
        if !line.trim().is_empty() {
            lines.push(line);
        }
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_lines_are_skipped() {
        let input = "first doc.\n\n  \nsecond doc. more.\n";
        let lines = collect_lines(input.as_bytes()).unwrap();
        assert_eq!(lines, ["first doc.", "second doc. more."]);
    }

    #[test]
    fn cli_parses_classify_sentences() {
        let cli = Cli::try_parse_from([
            "sentclass",
            "--server",
            "triton:8001",
            "--batch-size",
            "32",
            "--max-concurrent-batches",
            "2",
            "--format",
            "text",
            "classify-sentences",
            "docs.txt",
        ])
        .unwrap();
        assert_eq!(cli.server, "triton:8001");
        assert_eq!(cli.batch_size, Some(32));
        assert_eq!(cli.max_concurrent_batches, 2);
        assert_eq!(cli.format, Format::Text);
        assert!(matches!(
            cli.command,
            Command::ClassifySentences { input: Some(ref p) } if p == Path::new("docs.txt")
        ));
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["sentclass", "ready"]).unwrap();
        assert_eq!(cli.timeout_secs, 10);
        assert_eq!(cli.model, "classifier");
        assert_eq!(cli.max_concurrent_batches, 4);
        assert_eq!(cli.format, Format::Json);
        assert!(cli.io_config.is_none());
    }
}
