// SPDX-License-Identifier: MIT

//! Geoviews driver.
//!
//! Runs one session against the configured counter service: refreshes the
//! count for a page (registering a hit if this profile has not been counted
//! yet), optionally logs in and prints the geo-traffic detail panel.

use geoviews::config::Config;
use geoviews::services::{AuthCache, CounterClient, ViewCounterService};
use geoviews::store::FileStore;
use geoviews::Session;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        base_url = %config.counter_base_url,
        namespace = %config.namespace,
        "Starting geoviews"
    );

    let store = Arc::new(FileStore::open(&config.store_path));
    let client = CounterClient::new(&config.counter_base_url);
    let counter = ViewCounterService::new(client, store.clone(), &config.namespace);
    let auth = AuthCache::new(store, &config.namespace);

    let page = std::env::var("COUNTER_PAGE").unwrap_or_else(|_| "home".to_string());
    let mut session = Session::new(counter, auth, &page);
    session.arm_auth_expiry();

    session.set_page(&page).await;
    println!("views[{}]: {}", session.page(), session.count_label());

    if !session.is_authenticated() {
        if let Ok(password) = std::env::var("COUNTER_PASSWORD") {
            if let Err(e) = session.login(&password).await {
                tracing::warn!(error = %e, "Login failed");
            }
        }
    }

    if session.is_authenticated() {
        session.open_details().await;
        if let Some(error) = session.details_error() {
            println!("{}", error);
        } else {
            for group in session.markers().groups() {
                let first = &group.points()[0];
                println!(
                    "marker {} ({} point{}) - {} {}",
                    group.key(),
                    group.len(),
                    if group.len() == 1 { "" } else { "s" },
                    first.ip.as_deref().unwrap_or("UNKNOWN_HOST"),
                    first.country.as_deref().unwrap_or(""),
                );
            }
        }
    }

    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("geoviews=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
