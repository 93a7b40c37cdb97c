use std::str::FromStr;
use std::sync::Arc;

use clap::{arg, command};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;

use abi::config::{Config, LogConfig};
use abi::errors::Result;
use api::AppState;
use db::DbRepo;
use friendship::FriendshipCoordinator;

const DEFAULT_CONFIG: &str = "./abi/fixtures/config.yml";
const LOG_FILE: &str = "campus.log";

/// stdout by default, a daily rolling file when `log.directory` is set;
/// the guard has to outlive the server
fn init_tracing(config: &LogConfig) -> Option<WorkerGuard> {
    let level = Level::from_str(&config.level).unwrap_or(Level::DEBUG);
    let builder = tracing_subscriber::FmtSubscriber::builder()
        .with_line_number(true)
        .with_max_level(level);

    match &config.directory {
        Some(directory) => {
            let appender = tracing_appender::rolling::daily(directory, LOG_FILE);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            builder.with_writer(writer).with_ansi(false).init();
            Some(guard)
        }
        None => {
            builder.init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = command!()
        .arg(arg!(-c --config <FILE> "path to the yaml configuration").default_value(DEFAULT_CONFIG))
        .get_matches();
    let path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or(DEFAULT_CONFIG);

    let config = Config::load(path)?;
    let _guard = init_tracing(&config.log);
    info!("configuration loaded from {path}");

    let db = DbRepo::new(&config).await?;

    let mut coordinator = FriendshipCoordinator::new(db.relationship.clone(), db.user.clone());
    for channel in pusher::channels(&config)? {
        coordinator.attach(channel);
    }

    let state = AppState::new(db, Arc::new(coordinator), &config);
    api::start(&config, state).await
}
