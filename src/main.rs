mod capture;
mod plate;
mod recognizer;
mod server;
mod session;
mod types;
mod vehicle;

use crate::recognizer::{GeminiReader, PlateReader};
use env_logger::Env;
use log::{info, warn};
use std::env;
use std::sync::Arc;

#[macro_use]
extern crate failure;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    info!("Starting placa-vision");

    let reader: Option<Arc<dyn PlateReader>> = match env::var("API_KEY") {
        Ok(key) if !key.trim().is_empty() => Some(Arc::new(GeminiReader::new(key))),
        _ => {
            warn!("API_KEY is not set; recognition requests will be answered with 500");
            None
        }
    };

    let ctx = server::AppContext { reader };
    info!("Listening on http://0.0.0.0:8080");
    warp::serve(server::routes(ctx))
        .run(([0, 0, 0, 0], 8080))
        .await;
}
