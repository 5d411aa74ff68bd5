use crate::calendar::{CalendarMirror, DisabledCalendar, GoogleCalendar};
use crate::configuration::Configuration;
use crate::configuration_handler::ConfigurationHandler;
use crate::database_interface::DatabaseInterface;
use crate::http::create_app;
use crate::local_ledger::LocalLedger;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod backend;
mod booking_service;
mod calendar;
mod configuration;
mod configuration_handler;
mod database_interface;
mod error;
mod http;
mod local_ledger;
mod schema;
mod session;
#[cfg(test)]
mod testutils;
mod types;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("####################");
    println!("# Tutoring Manager #");
    println!("####################");

    let configuration = ConfigurationHandler::parse_arguments();
    let calendar = connect_calendar(&configuration).await;

    let address = format!("0.0.0.0:{}", configuration.port());
    println!("Accessible at:\n{address}");
    let listener = tokio::net::TcpListener::bind(address).await.unwrap();

    let app = if let Some(database_url) = configuration.database_url() {
        let backend = loop {
            match DatabaseInterface::new(&database_url) {
                Ok(backend) => {
                    info!("Successfully connected to database");
                    break backend;
                }
                Err(err) => {
                    error!(?err, "Failed to establish database connection: {database_url}. Retry in 1 sec. You may want to restart it without a database URL (impersistent ledgers).");
                    sleep(Duration::from_secs(1)).await;
                }
            }
        };
        create_app(backend, calendar)
    } else {
        create_app(LocalLedger::default(), calendar)
    };

    axum::serve(listener, app).await.unwrap();
}

async fn connect_calendar(configuration: &impl Configuration) -> Arc<dyn CalendarMirror> {
    let Some(key_path) = configuration.calendar_credentials() else {
        info!("No calendar credentials configured, mirroring disabled");
        return Arc::new(DisabledCalendar);
    };
    match GoogleCalendar::connect(&key_path, configuration.calendar_id()).await {
        Ok(calendar) => {
            info!("Successfully connected to the calendar service");
            Arc::new(calendar)
        }
        Err(err) => {
            error!(?err, "Failed to connect to the calendar service, mirroring disabled");
            Arc::new(DisabledCalendar)
        }
    }
}
