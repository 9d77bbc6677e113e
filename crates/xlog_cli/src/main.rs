//! xlogdump
//!
//! Prints the contents of Tarantool write-ahead logs, snapshots and vinyl
//! files as text or JSON Lines.
//!
//! Exit status is zero only when the whole file decoded, through the EOF
//! marker unless `--allow-unterminated` is given.

mod json;

use clap::{Parser, ValueEnum};
use json::JsonRenderer;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use xlog_codec::DEFAULT_MAX_DEPTH;
use xlog_core::{
    decode_bytes, decode_file, DecodeSummary, DecoderConfig, RecordSink, TextRenderer, XlogResult,
};
use xlog_storage::{InMemorySource, LogSource};

/// Dump Tarantool xlog, snapshot and vinyl files.
#[derive(Parser, Debug)]
#[command(name = "xlogdump")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log file, or `-` for standard input
    path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Verify the CRC32C of every frame payload
    #[arg(long)]
    verify_checksums: bool,

    /// Accept input that ends without an EOF marker
    #[arg(long)]
    allow_unterminated: bool,

    /// Maximum value nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Maximum decompressed size of one frame, in bytes
    #[arg(long)]
    max_decompressed: Option<usize>,

    /// Hide frame preambles in text output
    #[arg(long)]
    no_frames: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl Cli {
    fn decoder_config(&self) -> DecoderConfig {
        let mut config = DecoderConfig::default()
            .max_depth(self.max_depth)
            .verify_checksums(self.verify_checksums)
            .require_eof(!self.allow_unterminated);
        if let Some(len) = self.max_decompressed {
            let scratch_len = config.initial_scratch_len.min(len);
            config = config
                .max_decompressed_len(len)
                .initial_scratch_len(scratch_len);
        }
        config
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn decode_input<S: RecordSink>(
    cli: &Cli,
    config: &DecoderConfig,
    sink: &mut S,
) -> XlogResult<DecodeSummary> {
    if cli.path.as_os_str() == "-" {
        let source = read_source(io::stdin().lock())?;
        decode_bytes(source.bytes(), config, sink)
    } else {
        decode_file(&cli.path, config, sink)
    }
}

/// Buffers piped input. Read failures belong to the open stage.
fn read_source(reader: impl Read) -> XlogResult<InMemorySource> {
    let source = InMemorySource::from_reader(reader)?;
    debug!(size = source.len(), "read log from standard input");
    Ok(source)
}

fn run(cli: &Cli) -> XlogResult<()> {
    let config = cli.decoder_config();
    let stdout = io::stdout();
    let out = BufWriter::new(stdout.lock());

    let summary = match cli.format {
        Format::Text => {
            let mut renderer = TextRenderer::new(out).show_frames(!cli.no_frames);
            let result = decode_input(cli, &config, &mut renderer);
            renderer.into_inner().flush()?;
            result?
        }
        Format::Json => {
            let mut renderer = JsonRenderer::new(out);
            let result = decode_input(cli, &config, &mut renderer);
            renderer.finish()?;
            result?
        }
    };

    report(&summary);
    Ok(())
}

fn report(summary: &DecodeSummary) {
    info!(
        frames = summary.frames,
        compressed = summary.compressed_frames,
        records = summary.records,
        body_errors = summary.body_errors,
        eof = summary.saw_eof,
        bytes = summary.total_bytes,
        "decode complete"
    );
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}
