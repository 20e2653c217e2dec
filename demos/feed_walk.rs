// # feed_walk - walk the live photo feed
//
// Thin integration layer over photofeed-core: reads configuration from
// environment variables, builds a session on the reqwest transport, and
// loads a few pages while logging every bus event.
//
// ## Configuration
//
// - `PHOTOFEED_ACCESS_TOKEN`: Bearer token (required)
// - `PHOTOFEED_API_BASE_URL`: API base URL (default: https://api.unsplash.com)
// - `PHOTOFEED_PAGES`: Number of pages to load, 1-20 (default: 2)
// - `PHOTOFEED_HTTP_TIMEOUT_SECS`: Per-request timeout (default: 30)
// - `PHOTOFEED_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export PHOTOFEED_ACCESS_TOKEN=your_token
// export PHOTOFEED_PAGES=3
//
// cargo run -p photofeed-demos --bin feed_walk
// ```

use anyhow::{Context, Result};
use photofeed_core::{EventKind, FeedEvent, FeedSession, PageLoad, PhotoFeedConfig};
use photofeed_http::{DEFAULT_TOKEN_VAR, EnvTokenProvider, ReqwestRequester};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
#[derive(Debug, Clone, Copy)]
enum WalkExitCode {
    /// All requested pages were walked
    Success = 0,
    /// Configuration or startup error
    ConfigError = 1,
    /// A request failed
    RuntimeError = 2,
}

impl From<WalkExitCode> for ExitCode {
    fn from(code: WalkExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    feed: PhotoFeedConfig,
    pages: usize,
    log_level: Level,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let mut feed = PhotoFeedConfig::new();
        if let Ok(base_url) = env::var("PHOTOFEED_API_BASE_URL") {
            feed.api.base_url = base_url;
        }
        if let Ok(timeout) = env::var("PHOTOFEED_HTTP_TIMEOUT_SECS") {
            feed.http.timeout_secs = timeout
                .parse()
                .with_context(|| format!("PHOTOFEED_HTTP_TIMEOUT_SECS is not a number: {}", timeout))?;
        }
        feed.validate()?;

        let pages = match env::var("PHOTOFEED_PAGES") {
            Ok(raw) => raw
                .parse()
                .with_context(|| format!("PHOTOFEED_PAGES is not a number: {}", raw))?,
            Err(_) => 2,
        };
        if !(1..=20).contains(&pages) {
            anyhow::bail!("PHOTOFEED_PAGES must be between 1 and 20. Got: {}", pages);
        }

        let log_level = match env::var("PHOTOFEED_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string())
            .to_lowercase()
            .as_str()
        {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            other => anyhow::bail!(
                "PHOTOFEED_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        };

        if env::var(DEFAULT_TOKEN_VAR).is_err() {
            anyhow::bail!(
                "{} is required. Set it via: export {}=your_token",
                DEFAULT_TOKEN_VAR,
                DEFAULT_TOKEN_VAR
            );
        }

        Ok(Self {
            feed,
            pages,
            log_level,
        })
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return WalkExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(config.log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return WalkExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return WalkExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match walk(config).await {
            Ok(()) => WalkExitCode::Success,
            Err(e) => {
                error!("Walk failed: {:#}", e);
                WalkExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Load the configured number of pages and report what arrived
async fn walk(config: Config) -> Result<()> {
    let requester = Arc::new(ReqwestRequester::new(&config.feed.http)?);
    let tokens = Arc::new(EnvTokenProvider::default());
    let session = FeedSession::new(&config.feed, requester, tokens)?;

    session.bus().subscribe(EventKind::PageAppended, |event| {
        if let FeedEvent::PageAppended { new_items } = event {
            for photo in new_items {
                info!(
                    id = %photo.id,
                    size = %format!("{}x{}", photo.width, photo.height),
                    liked = photo.is_liked,
                    "photo"
                );
            }
        }
    });
    session.bus().subscribe(EventKind::ProfileUpdated, |event| {
        if let FeedEvent::ProfileUpdated { profile } = event {
            info!(name = %profile.name, login = %profile.login_name, "signed in");
        }
    });

    if let Err(e) = session.fetch_profile().await {
        warn!("Profile unavailable: {}", e);
    }

    for _ in 0..config.pages {
        match session.load_next_page().await? {
            PageLoad::Appended(items) => info!(total = items.len(), "page loaded"),
            PageLoad::InFlight | PageLoad::Discarded { .. } => {}
        }
    }

    info!(
        photos = session.feed().len(),
        last_page = ?session.feed().last_loaded_page(),
        "walk finished"
    );
    session.sign_out();
    Ok(())
}
