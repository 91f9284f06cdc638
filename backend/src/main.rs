use actix_web::{web, App, HttpServer};
use backend::config::AppConfig;
use backend::services;
use backend::state::AppState;
use env_logger::Env;
use log::info;
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    if let Err(e) = dotenv::dotenv() {
        if !e.not_found() {
            eprintln!("Ignoring unreadable .env file: {}", e);
        }
    }
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env();
    let host = config.host.clone();
    let port = config.port;
    let json_limit = config.json_limit;
    let url = config.bind_url();

    let state = AppState::new(config);
    state
        .init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
    info!("Server running at {}", url);

    let data = web::Data::new(state);
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(data.clone())
            .configure(services::configure)
    })
    .bind((host, port))?
    .run()
    .await
}
