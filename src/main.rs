use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use date_service::config::{Settings, StorageBackend};
use date_service::core::{ActivitySink, IdentityProvider, ProfileProvider, SwipeEngine, SwipeStore};
use date_service::routes::{self, AppState};
use date_service::services::{
    CacheManager, CachedProfileProvider, HttpActivityLog, HttpProfileProvider, InMemorySwipeStore,
    JwtIdentityProvider, PostgresSwipeStore, TracingActivityLog,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }
}

async fn build_profile_provider(settings: &Settings) -> std::io::Result<Arc<dyn ProfileProvider>> {
    let http = HttpProfileProvider::new(
        settings.profiles.base_url.clone(),
        Duration::from_secs(settings.profiles.timeout_secs),
    )
    .map_err(|e| startup_error("Failed to create profile client", e))?;
    let http: Arc<dyn ProfileProvider> = Arc::new(http);

    if !settings.cache.enabled {
        info!("Candidate cache disabled");
        return Ok(http);
    }

    let ttl = settings.cache.ttl_secs.unwrap_or(60);
    let l1_size = settings.cache.l1_cache_size.unwrap_or(10_000);

    let cache = match &settings.cache.redis_url {
        Some(url) => match CacheManager::with_redis(url, l1_size, ttl).await {
            Ok(cache) => {
                info!("Candidate cache initialized (L1: {} entries, Redis L2, TTL: {}s)", l1_size, ttl);
                cache
            }
            Err(e) => {
                warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                CacheManager::local(l1_size, ttl)
            }
        },
        None => {
            info!("Candidate cache initialized (L1: {} entries, TTL: {}s)", l1_size, ttl);
            CacheManager::local(l1_size, ttl)
        }
    };

    Ok(Arc::new(CachedProfileProvider::new(http, Arc::new(cache))))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load().map_err(|e| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("Configuration error: {}", e))
    })?;

    init_logging(&settings.logging.level, &settings.logging.format);
    info!("Starting date service...");

    let store: Arc<dyn SwipeStore> = match settings.storage.backend {
        StorageBackend::Postgres => {
            let db = &settings.database;
            let postgres = PostgresSwipeStore::from_settings(
                &db.url,
                db.max_connections,
                db.min_connections,
                db.acquire_timeout_secs,
                db.idle_timeout_secs,
            )
            .await
            .map_err(|e| startup_error("Failed to connect to PostgreSQL", e))?;
            info!("PostgreSQL swipe store initialized (max: {} connections)", db.max_connections.unwrap_or(10));
            Arc::new(postgres)
        }
        StorageBackend::Memory => {
            warn!("Using in-memory swipe store; data is lost on restart");
            Arc::new(InMemorySwipeStore::new())
        }
    };

    let profiles = build_profile_provider(&settings).await?;

    let activity: Arc<dyn ActivitySink> = match &settings.activity.base_url {
        Some(url) => {
            let client = HttpActivityLog::new(url.clone(), Duration::from_secs(settings.activity.timeout_secs))
                .map_err(|e| startup_error("Failed to create logs client", e))?;
            info!("Activity log sink: {}", url);
            Arc::new(client)
        }
        None => {
            info!("No logs service configured, activity goes to the service log");
            Arc::new(TracingActivityLog)
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(JwtIdentityProvider::new(&settings.auth.jwt_secret));

    let engine = SwipeEngine::new(store, profiles, activity).with_config(settings.engine.engine_config());
    info!("Swipe engine initialized with {:?}", engine.config());

    let app_state = AppState {
        engine,
        identity,
        request_timeout: settings.engine.request_timeout(),
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_app)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
