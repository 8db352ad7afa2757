use axum::http::{
    header::{ACCEPT, CONTENT_TYPE},
    HeaderValue, Method,
};
use domain::auth_flow::AuthFlow;
use log::*;
use service::config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

mod controller;
mod error;
mod extractors;
mod middleware;
mod response;
pub mod router;

pub use error::{Error, Result};

// Web-layer state shared with every handler.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub auth_flow: Arc<AuthFlow>,
}

impl AppState {
    pub fn new(auth_flow: AuthFlow) -> Self {
        Self {
            auth_flow: Arc::new(auth_flow),
        }
    }
}

pub async fn init_server(app_state: AppState, config: &Config) -> std::io::Result<()> {
    let host = config.interface.as_deref().unwrap_or("127.0.0.1");
    let listen_addr = format!("{host}:{}", config.port);

    info!("Server starting... listening for connections on http://{listen_addr}");

    let listener = TcpListener::bind(&listen_addr).await?;

    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(AllowOrigin::list(allowed_origins));

    axum::serve(
        listener,
        router::define_routes(app_state).layer(cors_layer),
    )
    .await
}
