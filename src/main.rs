//! Bridge media CLI
//!
//! Classify a payload, acquire its media, persist inbound blobs, or fetch a
//! remote URL, from the command line.

use clap::{Args, Parser, Subcommand};
use bridge_media::classify::classify;
use bridge_media::config::Config;
use bridge_media::fetch::HttpFetcher;
use bridge_media::persist::BlobStore;
use bridge_media::{ExtractedRecord, MediaOutcome, MediaResolver, MessageKind, RawPayload, Result};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Bridge media - chat payload normalizer
#[derive(Parser)]
#[command(name = "bridge-media")]
#[command(about = "Normalize chat payloads and acquire the media they reference")]
struct Cli {
    /// Root of the per-account working directories
    #[arg(long, global = true)]
    workdir: Option<PathBuf>,

    /// Shared document root
    #[arg(long, global = true)]
    docdir: Option<PathBuf>,

    /// Seconds to wait for local media to appear
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PayloadArgs {
    /// Message kind (text, image, voice, video, file, sticker, location, app, revoke, voip, system)
    kind: MessageKind,

    /// Message markup file (reads stdin when omitted)
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Extra-info markup file
    #[arg(long)]
    extra_info: Option<PathBuf>,

    /// File path hint from message metadata
    #[arg(long, default_value = "")]
    file_path: String,

    /// Thumbnail path hint from message metadata
    #[arg(long, default_value = "")]
    thumbnail: String,

    /// Account the message belongs to
    #[arg(long, default_value = "")]
    sender: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a payload and print the record as JSON
    Parse(PayloadArgs),

    /// Classify a payload and save its media into a directory
    Fetch {
        #[command(flatten)]
        payload: PayloadArgs,

        /// Directory to write the media into
        #[arg(short = 'o', long)]
        output: PathBuf,
    },

    /// Persist a bridge blob description (JSON) into the working directory
    Save {
        /// JSON file with `name` and base64 `binary`
        file: PathBuf,

        /// Write into this account's subdirectory
        #[arg(long)]
        sender: Option<String>,
    },

    /// Fetch a URL once and write the body to stdout
    Get {
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries command output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = Config::default();
    if let Some(workdir) = cli.workdir {
        config.workdir = workdir;
    }
    if let Some(docdir) = cli.docdir {
        config.docdir = docdir;
    }
    if let Some(secs) = cli.timeout_secs {
        config.media_timeout = Duration::from_secs(secs);
    }

    match cli.command {
        Commands::Parse(args) => cmd_parse(&args),
        Commands::Fetch { payload, output } => cmd_fetch(config, &payload, &output).await,
        Commands::Save { file, sender } => cmd_save(&config, &file, sender.as_deref()),
        Commands::Get { url } => cmd_get(&config, &url).await,
    }
}

// ============================================================================
// Commands
// ============================================================================

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn load_payload(args: &PayloadArgs) -> Result<RawPayload> {
    let message = read_input(args.file.as_deref())?;
    let extra_info = match &args.extra_info {
        Some(path) => fs::read_to_string(path)?,
        None => String::new(),
    };

    Ok(RawPayload::new(args.sender.clone(), message)
        .with_extra_info(extra_info)
        .with_file_path(args.file_path.clone())
        .with_thumbnail(args.thumbnail.clone()))
}

fn cmd_parse(args: &PayloadArgs) -> Result<()> {
    let payload = load_payload(args)?;
    let classified = classify(args.kind, &payload);
    println!("{}", serde_json::to_string_pretty(&classified)?);
    Ok(())
}

async fn cmd_fetch(config: Config, args: &PayloadArgs, output: &Path) -> Result<()> {
    let payload = load_payload(args)?;
    let classified = classify(args.kind, &payload);

    let Some(ExtractedRecord::Media(reference)) = classified.record else {
        eprintln!("Message carries no media");
        std::process::exit(2);
    };

    let fetcher = HttpFetcher::new(&config)?;
    let resolver = MediaResolver::new(Arc::new(config), fetcher);

    match resolver.resolve(&reference).await? {
        MediaOutcome::Ready(blob) => {
            let path = BlobStore::new(output).write(&blob)?;
            info!(kind = ?reference.kind(), bytes = blob.binary.len(), "media saved");
            println!("{}", path.display());
            Ok(())
        }
        MediaOutcome::Unavailable => {
            warn!(kind = ?reference.kind(), "media unavailable");
            eprintln!("Media not available within {:?}", resolver.config().media_timeout);
            std::process::exit(1);
        }
    }
}

fn cmd_save(config: &Config, file: &Path, sender: Option<&str>) -> Result<()> {
    let json = fs::read(file)?;
    let dir = match sender {
        Some(sender) => config.sender_dir(sender),
        None => config.workdir.clone(),
    };

    match BlobStore::new(dir).persist(&json) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => {
            eprintln!("Blob not persisted");
            std::process::exit(1);
        }
    }
}

async fn cmd_get(config: &Config, url: &str) -> Result<()> {
    let fetcher = HttpFetcher::new(config)?;
    let body = fetcher.fetch(url).await?;
    std::io::stdout().write_all(&body)?;
    Ok(())
}
