//! File Memo - fetch a URL through the file cache
//!
//! Loads settings from the environment, fetches the given URL with the
//! configured proxy and cache, and prints the body to stdout.

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_memo::request::ResponseType;
use file_memo::{Config, RequestOptions, Requester};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "file_memo", version, about = "Fetch a URL through the file cache")]
struct Cli {
    /// URL to fetch
    url: String,

    /// Parse the response body as JSON
    #[arg(long)]
    json: bool,

    /// Connect directly instead of through a proxy
    #[arg(long)]
    no_proxy: bool,

    /// Proxy URL to use instead of the proxy file
    #[arg(long)]
    proxy: Option<String>,

    /// Line of the proxy file to use
    #[arg(long, default_value_t = 0)]
    proxy_id: usize,

    /// Bypass the response cache
    #[arg(long)]
    no_cache: bool,

    /// Delay before the request in production mode, in milliseconds
    #[arg(long, default_value_t = 0)]
    wait_ms: u64,
}

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build request options from configuration and arguments
/// 4. Fetch through the cache and print the result
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "file_memo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();
    info!(
        "Configuration loaded: cache_folder={}, cache_max_age_ms={}, production={}",
        config.cache_folder.display(),
        config.cache_max_age_ms,
        config.production
    );

    let mut options = RequestOptions::from_config(&config);
    options.proxy_enabled = !cli.no_proxy;
    options.proxy_id = cli.proxy_id;
    if let Some(proxy) = cli.proxy {
        options.proxy_file = None;
        options.proxy_custom = Some(proxy);
    }
    options.cache_disabled |= cli.no_cache;
    options.wait_ms = cli.wait_ms;
    if cli.json {
        options.response_type = ResponseType::Json;
    }
    debug!(?options, "Request options");

    let requester = Requester::from_config(&config);
    let body = requester.request(&cli.url, options).await?;
    println!("{}", body.into_text());

    Ok(())
}
