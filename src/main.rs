#![deny(clippy::implicit_return)]
#![allow(clippy::needless_return)]

mod application;
mod configuration;
mod domain;
mod infrastructure;

use std::process;

use anyhow::Error;
use tracing_subscriber::EnvFilter;

use crate::application::cli;
use crate::application::server::Server;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::BackendName;
use crate::infrastructure::backends::BackendManager;

fn handle_error(err: Error) {
    eprintln!(
        "Oh no! Muesli has failed with the following app version and error.\n\nVersion: {}\nError: {:?}",
        env!("CARGO_PKG_VERSION"),
        err
    );

    process::exit(1);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let ready_res = cli::parse().await;
    if let Err(ready_err) = ready_res {
        handle_error(ready_err);
        return;
    }
    if !ready_res.unwrap() {
        process::exit(0);
    }

    let backend_res =
        BackendName::parse(Config::get(ConfigKey::Backend)).and_then(BackendManager::get);
    if let Err(backend_err) = backend_res {
        handle_error(backend_err);
        return;
    }
    let backend = backend_res.unwrap();

    // A missing credential is allowed at startup. Generation requests fail
    // with an error event instead.
    if let Err(err) = backend.health_check().await {
        tracing::warn!(error = ?err, "backend health check failed, generation requests may fail");
    }

    if let Err(err) = Server::start(backend).await {
        handle_error(err);
    }
}
