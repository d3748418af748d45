use std::io;

use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use env_logger::Env;

mod config;
mod db;
mod error;
mod handlers;
mod routes;

use config::Config;
use db::Database;
use handlers::assets;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|err| {
        log::error!("Invalid configuration: {}", err);
        io::Error::new(io::ErrorKind::InvalidInput, err)
    })?;

    log::info!("Connecting to database...");
    let database = Database::connect(&config).await.map_err(|err| {
        log::error!("Failed to create pool: {}", err);
        io::Error::new(io::ErrorKind::Other, err)
    })?;

    log::info!("Starting server at http://{}", config.socket_addr());

    let db_data = web::Data::new(database.clone());
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .wrap(middleware::Logger::default())
            .configure(routes::configure)
            .configure(|cfg| assets::register(cfg, &static_dir))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    database.close().await;
    log::info!("Database pool closed, shutting down");
    Ok(())
}
