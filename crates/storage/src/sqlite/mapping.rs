use sqlx::Row;
use videotrack_core::model::{Activity, ActivityId, ActivitySettings, UserId};

use crate::repository::{AttemptRecord, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn activity_id_from_i64(v: i64) -> Result<ActivityId, StorageError> {
    Ok(ActivityId::new(i64_to_u64("activity_id", v)?))
}

pub(crate) fn user_id_from_i64(v: i64) -> Result<UserId, StorageError> {
    Ok(UserId::new(i64_to_u64("user_id", v)?))
}

pub(crate) fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<AttemptRecord, StorageError> {
    Ok(AttemptRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        activity_id: activity_id_from_i64(row.try_get::<i64, _>("activity_id").map_err(ser)?)?,
        user_id: user_id_from_i64(row.try_get::<i64, _>("user_id").map_err(ser)?)?,
        watched_seconds: row.try_get("watched_seconds").map_err(ser)?,
        completed: row.try_get("completed").map_err(ser)?,
        recorded_at: row.try_get("recorded_at").map_err(ser)?,
    })
}

pub(crate) fn map_activity_row(row: &sqlx::sqlite::SqliteRow) -> Result<Activity, StorageError> {
    let settings = ActivitySettings::new(
        row.try_get("prevent_forward_seeking").map_err(ser)?,
        row.try_get("resume_playback").map_err(ser)?,
    );

    Activity::new(
        activity_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("name").map_err(ser)?,
        row.try_get::<String, _>("video_url").map_err(ser)?.as_str(),
        settings,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}
