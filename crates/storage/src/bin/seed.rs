use std::fmt;

use chrono::{DateTime, Duration, Utc};
use videotrack_core::model::{Activity, ActivityId, ActivitySettings, Attempt, UserId};
use storage::repository::{ActivityRepository, AttemptRecord, AttemptRepository, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    activity_id: ActivityId,
    activity_name: String,
    video_url: String,
    user_id: UserId,
    attempts: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidActivityId { raw: String },
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
    InvalidAttempts { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidActivityId { raw } => {
                write!(f, "invalid --activity-id value: {raw}")
            }
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user-id value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
            ArgsError::InvalidAttempts { raw } => write!(f, "invalid --attempts value: {raw}"),
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

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("VIDEOTRACK_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut activity_id = std::env::var("VIDEOTRACK_ACTIVITY_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| ActivityId::new(1), ActivityId::new);
        let mut activity_name =
            std::env::var("VIDEOTRACK_ACTIVITY_NAME").unwrap_or_else(|_| "Intro lecture".into());
        let mut video_url = std::env::var("VIDEOTRACK_VIDEO_URL")
            .unwrap_or_else(|_| "https://cdn.example.org/intro.mp4".into());
        let mut user_id = UserId::new(1);
        let mut attempts = 3_u32;
        let mut now: Option<DateTime<Utc>> = None;

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
                "--activity-id" => {
                    let value = require_value(&mut args, "--activity-id")?;
                    activity_id = value
                        .parse::<u64>()
                        .map(ActivityId::new)
                        .map_err(|_| ArgsError::InvalidActivityId { raw: value })?;
                }
                "--name" => {
                    activity_name = require_value(&mut args, "--name")?;
                }
                "--video-url" => {
                    video_url = require_value(&mut args, "--video-url")?;
                }
                "--user-id" => {
                    let value = require_value(&mut args, "--user-id")?;
                    user_id = value
                        .parse::<u64>()
                        .map(UserId::new)
                        .map_err(|_| ArgsError::InvalidUserId { raw: value })?;
                }
                "--attempts" => {
                    let value = require_value(&mut args, "--attempts")?;
                    attempts = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAttempts { raw: value })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            activity_id,
            activity_name,
            video_url,
            user_id,
            attempts,
            now,
        })
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse()?;
    let now = args.now.unwrap_or_else(Utc::now);

    let storage = Storage::sqlite(&args.db_url).await?;

    let activity = Activity::new(
        args.activity_id,
        args.activity_name.clone(),
        &args.video_url,
        ActivitySettings::new(true, true),
        now,
    )?;
    storage.activities.upsert_activity(&activity).await?;

    // A run of partial sessions, each a minute apart and a bit further in.
    for i in 0..args.attempts {
        let watched = f64::from(i + 1) * 30.0;
        let recorded_at = now + Duration::minutes(i64::from(i));
        let attempt = Attempt::new(args.activity_id, args.user_id, watched, false, recorded_at)?;
        storage
            .attempts
            .append_attempt(AttemptRecord::from_attempt(&attempt))
            .await?;
    }

    println!(
        "seeded activity {} ({}) with {} partial attempts for user {}",
        args.activity_id, args.activity_name, args.attempts, args.user_id
    );
    Ok(())
}
