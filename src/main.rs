use devflow::routes::build_router;
use devflow::state::{AppConfig, AppState};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "devflow=info,tower_http=info".into()),
        )
        .init();

    tracing::info!("Starting Devflow server...");

    let config = AppConfig::from_env();

    // Connect to MongoDB
    let mongo_client = mongodb::Client::with_uri_str(&config.mongodb_uri)
        .await
        .expect("Failed to connect to MongoDB");
    let mongo_db = mongo_client.database(&config.database);

    tracing::info!("Connected to MongoDB at {}", config.mongodb_uri);

    let bind_addr = config.bind_addr.clone();
    let state = AppState::with_mongo(&mongo_db, config);
    let app = build_router(state);

    // Start the server
    tracing::info!("Listening on http://{}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listen address");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
