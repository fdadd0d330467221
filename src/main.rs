use std::io;
use std::time::{Duration, Instant};

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use dotenv::dotenv;
use tokio::time::interval;

use connecto::config::Config;
use connecto::state::AppState;
use connecto::{db, routes};

const PRESENCE_SWEEP: Duration = Duration::from_secs(60);

fn to_io<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> io::Error {
    move |e| io::Error::new(io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    // Load environment variables from .env file (if exists)
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(to_io("invalid configuration"))?;

    let db_client = db::init_db(&config.mongo_uri)
        .await
        .map_err(to_io("failed to configure MongoDB"))?;
    let db = db_client.database(&config.mongo_db_name);
    match db::ping(&db).await {
        Ok(()) => log::info!("connected to MongoDB database {}", config.mongo_db_name),
        Err(e) => log::warn!("MongoDB did not answer a ping yet: {}", e),
    }
    if let Err(e) = db::ensure_indexes(&db).await {
        log::warn!("could not ensure indexes: {}", e);
    }

    if config.mistral_api_key.is_none() {
        log::warn!("MISTRAL_API_KEY is not set; voice commands will be rejected");
    }
    tokio::fs::create_dir_all(std::path::Path::new(&config.upload_dir).join("messages")).await?;

    let bind = (config.server_host.clone(), config.server_port);
    let app_state = AppState::new(db, config);

    // Expired presence entries are dropped lazily on read; this bounds memory
    // for users who never come back.
    let presence = app_state.presence.clone();
    actix_web::rt::spawn(async move {
        let mut ticker = interval(PRESENCE_SWEEP);
        loop {
            ticker.tick().await;
            let removed = presence.prune(Instant::now());
            if removed > 0 {
                log::debug!("pruned {} stale presence entries", removed);
            }
        }
    });

    log::info!("listening on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        let cors = match app_state.config.frontend_url.as_deref() {
            Some(origin) => Cors::default().allowed_origin(origin),
            None => Cors::default().allow_any_origin(),
        }
        .allow_any_method()
        .allow_any_header()
        .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::init)
    })
    .bind(bind)?
    .run()
    .await
}
