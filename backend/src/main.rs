use std::net::SocketAddr;
use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Response};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::games::backend_tavern_game::{
    create_router as create_tavern_game_router, TavernGameState,
};
use crate::services::ledger_service::LedgerStore;
use shared::shared_tavern_game::WheelConfig;

mod error;
mod games;
mod logging;
mod services;

#[derive(Clone)]
pub struct AppState {
    pub ledger: LedgerStore,
}

pub async fn health_check() -> impl IntoResponse {
    Response::builder().status(200).body(Body::from("OK")).unwrap()
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::setup();

    // A bad wheel configuration is fatal at startup, never per spin
    if let Err(err) = WheelConfig::default().validate() {
        eprintln!("Invalid wheel configuration: {}", err);
        std::process::exit(1);
    }

    let state = AppState {
        ledger: LedgerStore::from_env(),
    };

    let cors = CorsLayer::new()
        .allow_origin(
            std::env::var("GT_TAVERN_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:8080".to_string())
                .parse::<HeaderValue>()
                .expect("Invalid GT_TAVERN_ALLOWED_ORIGIN"),
        )
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api/tavern",
            create_tavern_game_router(TavernGameState::new()),
        )
        .layer(Extension(state))
        .layer(cors);

    let addr: SocketAddr = std::env::var("GT_TAVERN_BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()
        .expect("Invalid GT_TAVERN_BIND_ADDR");

    info!("🍺 The Gilded Tankard backend listening on {}", addr);

    let listener = TcpListener::bind(addr).await.expect("Failed to bind address");
    axum::serve(listener, app).await.expect("Server error");
}
