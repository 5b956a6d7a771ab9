use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use express_checkout_server::checkout::Checkout;
use express_checkout_server::config::Config;
use express_checkout_server::gateway::HttpGateway;
use express_checkout_server::handlers::AppState;
use express_checkout_server::routes::create_routes;
use express_checkout_server::store::PgStore;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Successfully connected to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    tracing::info!("Migrations run successfully");

    let gateway = HttpGateway::new(&config.gateway).expect("Failed to build gateway client");
    tracing::info!(api_url = %config.gateway.api_url, "Gateway client ready");

    let checkout = Checkout::new(
        Arc::new(gateway),
        Arc::new(PgStore::new(pool)),
        Arc::new(config.gateway),
    );
    let app = create_routes(AppState { checkout });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind address");

    axum::serve(listener, app).await.expect("Server failed");
}
