use tower_http::cors::CorsLayer;

use category_ledger::{AppState, config::Config, database, router, utils::init_tracing};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env().map_err(|e| format!("Configuration error: {}", e))?;
    init_tracing(config.debug);

    let db = database::init_db(&config.data_path)
        .await
        .map_err(|e| format!("Failed to initialize database: {}", e))?;

    let app_state = AppState { db };

    let frontend_origin_header = config
        .frontend_origin
        .parse::<axum::http::HeaderValue>()
        .map_err(|e| format!("Invalid FRONTEND_ORIGIN '{}': {}", config.frontend_origin, e))?;

    let cors = CorsLayer::new()
        .allow_origin(frontend_origin_header)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::AUTHORIZATION,
        ]);

    let app = router(app_state).layer(cors);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", bind_address, e))?;

    tracing::info!("Category service running on http://{}", bind_address);

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
