// src/main.rs

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use dotenvy::dotenv;
use quizsmith::accounts::{PgUserStore, UserStore};
use quizsmith::cache::Coordinator;
use quizsmith::config::Config;
use quizsmith::generation::OpenAiGenerator;
use quizsmith::ledger::{PgAttemptStore, ProgressLedger};
use quizsmith::routes;
use quizsmith::state::AppState;
use quizsmith::storage::FsBlobStore;
use quizsmith::utils::hash::hash_password;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool with Retry
    let mut retry_count = 0;
    let pool = loop {
        match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
        {
            Ok(pool) => break pool,
            Err(e) => {
                retry_count += 1;
                if retry_count > 5 {
                    panic!("Failed to connect to database after 5 retries: {}", e);
                }
                tracing::warn!(
                    "Database not ready, retrying in 2s... (Attempt {})",
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Wire up the stores and services
    let users: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));

    // Seed Admin User
    if let Err(e) = seed_admin_user(users.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    let blobs = Arc::new(
        FsBlobStore::open(&config.blob_dir)
            .await
            .expect("Failed to open blob store directory"),
    );

    let generator = Arc::new(
        OpenAiGenerator::new(&config).expect("Failed to build the question generator"),
    );

    let coordinator = Coordinator::new(
        blobs.clone(),
        generator,
        Duration::from_secs(config.generation_timeout_secs),
    );

    let ledger = Arc::new(ProgressLedger::new(
        users.clone(),
        Arc::new(PgAttemptStore::new(pool.clone())),
    ));

    let state = AppState {
        config: config.clone(),
        coordinator,
        ledger,
        users,
        blobs,
    };

    // Rate limiting at the server edge, keyed by peer address.
    let governor_conf = GovernorConfigBuilder::default()
        .per_second(2)
        .burst_size(10)
        .finish()
        .unwrap();
    let governor_conf = Arc::new(governor_conf);

    // Periodic eviction sweep so the limiter's key table cannot grow without
    // bound.
    let governor_limiter = governor_conf.limiter().clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(60)).await;
            tracing::debug!("Rate limiter storage size: {}", governor_limiter.len());
            governor_limiter.retain_recent();
        }
    });

    // Create the Axum application router
    let app = routes::create_router(state).layer(GovernorLayer::new(governor_conf));

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("quizsmith listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}

async fn seed_admin_user(
    users: &dyn UserStore,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        if users.find_by_username(username).await?.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;
            users.create(username, &hashed_password, "admin").await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
