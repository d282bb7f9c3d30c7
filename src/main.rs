use anyhow::{Context, Result};
use log::*;
use quiz_backend::{
    auth::HmacValidator,
    bank::QuestionSource,
    config::{Config, ServerSettings},
    http::router,
    model::roster::Roster,
    persistence::PersistenceClient,
    server::{AppState, start_ws_server},
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    info!("Starting quiz backend");

    let config = Config::from_env()?;

    let roster_text = tokio::fs::read_to_string(&config.roster_path)
        .await
        .with_context(|| format!("failed to read roster {}", config.roster_path.display()))?;
    let roster = Roster::from_json(&roster_text)?;
    info!("Loaded roster with {} entries", roster.entries().len());

    let store = match (&config.persistence_url, &config.persistence_api_key) {
        (Some(url), Some(api_key)) => PersistenceClient::remote(url, api_key.clone())?,
        _ => PersistenceClient::in_memory(),
    };

    let app_state = Arc::new(AppState::new(
        QuestionSource::from_path(config.bank_path.clone()),
        roster,
        store,
        Arc::new(HmacValidator::new(config.auth_secret.as_bytes())),
        ServerSettings::from_config(&config),
    ));

    let ws_listener = TcpListener::bind(&config.ws_addr)
        .await
        .with_context(|| format!("can't listen on {}", config.ws_addr))?;
    let http_listener = TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("can't listen on {}", config.http_addr))?;

    tokio::select! {
        _ = start_ws_server(ws_listener, app_state.clone()) => {},
        res = axum::serve(http_listener, router(app_state)) => {
            res.context("HTTP server failed")?;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutting down");
        },
    }

    Ok(())
}
