use domain::auth_flow::{AuthFlow, AuthSettings};
use log::{error, info};
use service::{config::Config, logging::Logger};
use web::AppState;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config as &Config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting club portal [{}] with base URL {}",
        config.runtime_env(),
        config.auth_base_url()
    );

    let app_state = AppState::new(AuthFlow::new(AuthSettings::from(&config)));

    if let Err(e) = web::init_server(app_state, &config).await {
        error!("Server stopped: {e}");
        std::process::exit(1);
    }
}
