mod categories;
mod config;
mod error;
mod nim;
mod parser;
mod pipeline;
mod preprocess;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use config::AppConfig;
use pipeline::Classifier;
use routes::{configure_routes, not_found};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    log::info!("GreenGuide backend v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Vision model: {}", config.models.vision);
    log::info!("Reasoning model: {}", config.models.reasoning);
    log::info!("Educator model: {}", config.models.educator);
    log::info!("API key configured: {}", config.api_key_configured());
    log::info!(
        "Upstream timeout {}s, at most {} concurrent classifications",
        config.upstream_timeout.as_secs(),
        config.max_concurrent_classifications
    );

    let bind_address = config.bind_address();
    let classifier = Classifier::from_config(config);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .expose_headers(vec![routes::REQUEST_ID_HEADER])
                    .max_age(3600),
            )
            .app_data(web::Data::new(classifier.clone()))
            .configure(configure_routes)
            .default_service(web::to(not_found))
    })
    .bind(&bind_address)?
    .run()
    .await
}
