use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use services::{AppServices, Clock, CompletionSink, LoggingSink};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidListenAddr { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidListenAddr { raw } => {
                write!(f, "invalid --listen value (expected host:port): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    listen: SocketAddr,
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("VIDEOTRACK_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut listen: SocketAddr = std::env::var("VIDEOTRACK_LISTEN")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8077)));

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--listen" => {
                    let value = require_value(&mut args, "--listen")?;
                    listen = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidListenAddr { raw: value })?;
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self { db_url, listen })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse()?;

    // The logging sink stands in for the course-completion engine until one
    // is wired up.
    let sink: Arc<dyn CompletionSink> = Arc::new(LoggingSink);
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), sink).await?;

    let router = server::create_router(services);
    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!(addr = %args.listen, db = %args.db_url, "videotrack listening");
    axum::serve(listener, router).await?;

    Ok(())
}
