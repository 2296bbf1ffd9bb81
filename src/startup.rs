use crate::config::Config;
use crate::directory::DirectoryService;
use crate::error::{DutyResult, Error};
use crate::seed;
use crate::shutdown;
use crate::store::{Directory, DirectoryStore, InMemoryStore};
use crate::utils::time::SchoolClock;
use crate::web::{self, AppState};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Config(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => {
            info!("Loaded configuration: {:?}", config);
            Ok(config)
        }
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Pick the record store: Redis when configured and reachable, memory otherwise
pub async fn build_store(config: &Config) -> Arc<dyn DirectoryStore> {
    let Some(url) = config.redis_url.as_deref() else {
        warn!("REDIS_URL is not set, records will only live in memory");
        return Arc::new(InMemoryStore::new());
    };

    #[cfg(feature = "redis-store")]
    {
        match crate::store::RedisStore::connect(url).await {
            Ok(store) => {
                info!("Connected to Redis successfully");
                return Arc::new(store);
            }
            Err(e) => {
                error!("Failed to connect to Redis: {}", e);
            }
        }
    }

    #[cfg(not(feature = "redis-store"))]
    warn!("Built without Redis support, ignoring REDIS_URL {}", url);

    warn!("Using in-memory store as fallback");
    Arc::new(InMemoryStore::new())
}

/// Load the seed roster into an empty directory, if one is configured
async fn seed_directory(config: &Config, service: &DirectoryService) -> DutyResult<()> {
    let Some(path) = config.seed_file.as_deref() else {
        return Ok(());
    };

    info!("Loading roster seed from {}", path.display());
    let roster = seed::load_roster(path)?;
    seed::seed_if_empty(service, roster).await?;
    Ok(())
}

/// Assemble the application state from configuration
pub async fn build_state(config: &Config) -> DutyResult<AppState> {
    crate::utils::i18n::set_locale(&config.locale);
    info!("Setting locale to {}", config.locale);

    let directory = Directory::new(build_store(config).await);
    let clock = SchoolClock::new(config.school_timezone);
    info!(
        "School clock runs in {}, local time {}",
        clock.timezone(),
        clock.moment().time_string()
    );
    let state = AppState::new(directory, clock, config.auth_config());

    seed_directory(config, &state.directory_service).await?;

    Ok(state)
}

/// Bind the listener and serve until a shutdown signal arrives
pub async fn run(config: Config) -> miette::Result<()> {
    let state = build_state(&config).await?;
    let app = web::router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(Error::from)?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown::shutdown_signal())
        .await
        .map_err(Error::from)?;

    info!("Server stopped");
    Ok(())
}
