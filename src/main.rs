use questioncraft_backend::{
    config::Settings,
    database::{create_pool, run_migrations},
    logging::{Fields, Logging},
    routes, AppState,
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let logging = Logging::init(&settings);
    let log = logging.logger("questioncraft.main");

    log.info(
        "starting",
        Fields::new()
            .with("app", &settings.app_name)
            .with("env", &settings.app_env)
            .with("debug", settings.debug)
            .with("log_level", settings.log_level.to_string()),
    );
    if settings.is_production() && settings.debug {
        log.warning("DEBUG is enabled in production", Fields::new());
    }

    let pool = match create_pool(&settings).await {
        Ok(pool) => pool,
        Err(e) => {
            log.exception("database unavailable", &e, Fields::new());
            return Err(e.into());
        }
    };
    run_migrations(&pool).await?;

    let state = AppState::new(pool, settings.clone(), logging);
    let app = routes::router(state);

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address).await?;
    log.info("listening", Fields::new().with("address", &address));

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log.info("shutdown complete", Fields::new());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
