use clap::{Parser, Subcommand};
use shelfbot::api::{CatalogClient, LanraragiClient};
use shelfbot::cache::GalleryCache;
use shelfbot::config::{self, BotConfig};
use shelfbot::imaging::RustCodec;
use shelfbot::pipeline::{self, BotContext, Reply, ReplySegment};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "shelfbot")]
#[command(about = "Archive search and gallery preview bot core")]
#[command(long_about = "\
Archive search and gallery preview bot core

Runs one request end-to-end and prints the reply the messaging layer would
deliver: text blocks to stdout, image attachments as file paths.

  shelfbot search team:alpha        # keyword search → thumbnail strip + links
  shelfbot preview \"<chat message>\"  # detect a gallery link → cover + caption
  shelfbot gen-config               # print a documented config.toml

Configuration is read from config.toml (see --config); a missing file means
stock defaults. Set RUST_LOG=debug for upstream call detail.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the archive server by keyword
    Search {
        /// Search keyword (joined when given as multiple words)
        keyword: Vec<String>,
    },
    /// Scan a message for a catalog gallery link and preview it
    Preview {
        /// Message text to scan
        message: String,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::Search { keyword } => {
            let ctx = build_context(&cli.config)?;
            let reply = pipeline::run_search(&ctx, &keyword.join(" "));
            print_reply(&reply);
        }
        Command::Preview { message } => {
            let ctx = build_context(&cli.config)?;
            match pipeline::run_gallery_link(&ctx, &message) {
                Some(reply) => print_reply(&reply),
                None => println!("No gallery link in that message."),
            }
        }
    }

    Ok(())
}

fn build_context(
    config_path: &std::path::Path,
) -> Result<BotContext<LanraragiClient, CatalogClient, RustCodec>, Box<dyn std::error::Error>> {
    let config = BotConfig::load(config_path)?;

    let agent = ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.http.timeout_secs))
        .build();

    let scratch_dir = config.cache.effective_scratch_dir();
    let cache = GalleryCache::new(
        &config.cache.dir,
        &scratch_dir,
        Duration::from_secs(config.cache.ttl_secs),
    )?;

    Ok(BotContext {
        archive: LanraragiClient::new(
            agent.clone(),
            &config.archive.base_url,
            config.archive.api_key.clone(),
        ),
        gallery: CatalogClient::new(agent, &config.gallery.api_url),
        codec: RustCodec::new(),
        cache,
        dictionary_path: config.gallery.dictionary.clone(),
        external_url: config.archive.external_url.clone(),
        spec: config.compose.to_spec(),
        scratch_dir,
    })
}

fn print_reply(reply: &Reply) {
    for segment in &reply.segments {
        match segment {
            ReplySegment::Image(path) => println!("[image] {}", path.display()),
            ReplySegment::Text(text) => println!("{text}"),
        }
    }
}
