use config::{default_config_path, load_config};
use controller::{create_app, AppState};
use database::Database;

use cyder_tools::log::{info, LocalLogger};

mod config;
mod controller;
mod database;
mod utils;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(default_config_path())?;
    LocalLogger::init(&config.log_level);

    let addr = format!("{}:{}", &config.host, config.port);
    info!("server start at {}", &addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let state = AppState {
        db: Database::new(config.db_url.as_str()),
    };
    axum::serve(listener, create_app(&config.base_path, state)).await?;
    Ok(())
}
