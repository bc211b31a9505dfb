use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::{Context, Result};
use log::info;

use currex::refresher::spawn_rate_refresher;
use currex::{AppState, Config, RateStore, handlers};

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let store = RateStore::connect(&config.database_url)
        .await
        .with_context(|| format!("Can't open rate store at {}", config.database_url))?;
    let state = AppState::build(&config, store).await?;

    match config.poll_interval {
        Some(every) => {
            info!("Polling backend rates every {:?}", every);
            spawn_rate_refresher(state.clone(), every);
        }
        None => info!("Backend rate polling disabled"),
    }

    let data = web::Data::new(state);
    info!("Listening on {}", config.bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind(config.bind_addr)
    .with_context(|| format!("Can't bind {}", config.bind_addr))?
    .run()
    .await?;

    Ok(())
}
