//! Gatherly server entry point.

mod scheduler;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use gatherly_api::{middleware::AppState, router as api_router};
use gatherly_common::{Clock, Config, SystemClock};
use gatherly_core::{
    ActivityLogService, DeletionService, EligibilityService, RegistrationService, UserService,
};
use gatherly_db::repositories::{
    ActivityLogRepository, DeletionRepository, EventRepository, PendingDeletionRepository,
    RegistrationRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatherly=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting gatherly server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = gatherly_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    gatherly_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let user_repo = UserRepository::new(Arc::clone(&db));
    let event_repo = EventRepository::new(Arc::clone(&db));
    let registration_repo = RegistrationRepository::new(Arc::clone(&db));
    let pending_deletion_repo = PendingDeletionRepository::new(Arc::clone(&db));
    let deletion_repo = DeletionRepository::new(Arc::clone(&db));
    let activity_log_repo = ActivityLogRepository::new(Arc::clone(&db));

    // Initialize services
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let activity_log_service = ActivityLogService::new(activity_log_repo, clock.clone());
    let user_service = UserService::new(
        user_repo.clone(),
        activity_log_service.clone(),
        clock.clone(),
    );
    let registration_service = RegistrationService::new(
        registration_repo.clone(),
        event_repo.clone(),
        activity_log_service.clone(),
        clock.clone(),
    );
    let eligibility_service = EligibilityService::new(
        user_repo.clone(),
        registration_repo,
        event_repo,
        clock.clone(),
    );
    let deletion_service = DeletionService::new(
        deletion_repo,
        pending_deletion_repo,
        user_repo,
        eligibility_service.clone(),
        activity_log_service,
        clock,
    );

    // Start the periodic due-deletion sweep
    let sweep_interval = Duration::from_secs(config.deletion.sweep_interval_secs);
    let sweep_task = scheduler::spawn_sweep_task(deletion_service.clone(), sweep_interval);

    // Create app state
    let state = AppState {
        user_service,
        registration_service,
        eligibility_service,
        deletion_service,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gatherly_api::middleware::auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweep_task.abort();
    info!("Server shut down");

    Ok(())
}
