use videotrack_core::model::{Activity, ActivityId};

use super::{
    SqliteRepository,
    mapping::{id_to_i64, map_activity_row},
};
use crate::repository::{ActivityRepository, StorageError};

#[async_trait::async_trait]
impl ActivityRepository for SqliteRepository {
    async fn upsert_activity(&self, activity: &Activity) -> Result<(), StorageError> {
        let id = id_to_i64("activity_id", activity.id().value())?;

        sqlx::query(
            r"
                INSERT INTO activities (
                    id, name, video_url, prevent_forward_seeking, resume_playback, created_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    -- keep created_at from the original insert; only update mutable fields
                    name = excluded.name,
                    video_url = excluded.video_url,
                    prevent_forward_seeking = excluded.prevent_forward_seeking,
                    resume_playback = excluded.resume_playback
            ",
        )
        .bind(id)
        .bind(activity.name().to_owned())
        .bind(activity.video_url().as_str().to_owned())
        .bind(activity.settings().prevent_forward_seeking())
        .bind(activity.settings().resume_playback())
        .bind(activity.created_at())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Activity, StorageError> {
        let id = id_to_i64("activity_id", id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, name, video_url, prevent_forward_seeking, resume_playback, created_at
                FROM activities
                WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_activity_row(&row),
            None => Err(StorageError::NotFound),
        }
    }
}
