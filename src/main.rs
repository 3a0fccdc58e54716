use anyhow::{bail, Context, Result};
use meet365_crm::{
    app::{create_router, AppState},
    auth::{AuthGate, StaticIdentityProvider},
    config::Config,
    crm::{CustomerStore, MemoryStore, PgStore},
    i18n::{DictionaryCache, DictionaryLoader, DictionaryValidator, ExcludedPaths, LocaleResolver},
};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meet365_crm=info".parse()?),
        )
        .init();

    info!("Starting Meet365 CRM");

    let config = Config::from_env()?;

    // A locale without a usable dictionary is a deployment error
    let loader = match &config.dictionary_dir {
        Some(dir) => DictionaryLoader::from_dir(dir),
        None => DictionaryLoader::embedded(),
    };
    let report = DictionaryValidator::validate_all(&loader).await;
    for warning in &report.warnings {
        warn!("Dictionary: {}", warning);
    }
    if report.has_errors() {
        bail!("Dictionary validation failed:\n  {}", report.errors.join("\n  "));
    }

    let store: Arc<dyn CustomerStore> = match &config.database_url {
        Some(url) => {
            info!("Using PostgreSQL customer store");
            Arc::new(PgStore::connect(url).await?)
        }
        None => {
            warn!("DATABASE_URL not set, customers are kept in memory");
            Arc::new(MemoryStore::new())
        }
    };

    if config.accounts.is_empty() {
        warn!("CRM_ACCOUNTS is empty, nobody can sign in");
    }
    let provider = Arc::new(StaticIdentityProvider::new(config.accounts.clone()));

    let state = AppState {
        store,
        auth: Arc::new(AuthGate::new(provider, config.allowed_email_domain.clone())),
        dictionaries: Arc::new(DictionaryCache::new(loader)),
        resolver: Arc::new(LocaleResolver::new(ExcludedPaths::new(
            config.excluded_path_prefixes.iter().cloned(),
        ))),
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}
