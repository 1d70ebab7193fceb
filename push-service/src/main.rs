use actix_web::{middleware, web, App, HttpServer};
use push_service::{
    auth::AuthVerifier, handlers::register_routes, AppState, Config, Dispatcher,
};
use push_service::storage::PgStore;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use webpush_shared::{SenderIdentity, WebPushClient};

fn fatal(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message)
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting push dispatch service");

    let config = Config::from_env()
        .map_err(|e| fatal(format!("Configuration error: {e}")))?;

    // Sender identity is parsed once; malformed key material blocks all
    // dispatch, so it aborts boot.
    let identity = SenderIdentity::from_config(
        &config.vapid.private_key,
        &config.vapid.public_key,
        config.vapid.subject.clone(),
    )
    .map_err(|e| fatal(format!("VAPID key material rejected: {e}")))?;

    let verifier = AuthVerifier::from_public_key_pem(&config.auth.jwt_public_key_pem)
        .map_err(|e| fatal(format!("JWT verification key rejected: {e}")))?;

    let db_pool = match PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await
    {
        Ok(pool) => {
            tracing::info!("Successfully connected to database");
            pool
        }
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "Database connection failed",
            ));
        }
    };

    let client = Arc::new(
        WebPushClient::new(identity)
            .map_err(|e| fatal(format!("HTTP client initialization failed: {e}")))?,
    );
    let store = Arc::new(PgStore::new(db_pool));

    let state = web::Data::new(AppState {
        vapid_public_key: client.public_key_base64url().to_string(),
        dispatcher: Dispatcher::new(client, store.clone()),
        destinations: store.clone(),
        dispatch_log: store,
    });

    let addr = format!("0.0.0.0:{}", config.app.port);
    tracing::info!("Starting HTTP server on {}", addr);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::Data::new(verifier.clone()))
            .wrap(middleware::Logger::default())
            .route("/health", web::get().to(|| async { "OK" }))
            .route("/", web::get().to(|| async { "Push Dispatch Service v1.0" }))
            .configure(register_routes)
    })
    .bind(&addr)?
    .run()
    .await
}
