use videotrack_core::model::{ActivityId, UserId};

use super::{
    SqliteRepository,
    mapping::{id_to_i64, map_attempt_row},
};
use crate::repository::{AttemptRecord, AttemptRepository, StorageError};

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, record: AttemptRecord) -> Result<i64, StorageError> {
        let activity_id = id_to_i64("activity_id", record.activity_id.value())?;
        let user_id = id_to_i64("user_id", record.user_id.value())?;

        let res = sqlx::query(
            r"
                INSERT INTO attempts (
                    activity_id, user_id, watched_seconds, completed, recorded_at
                )
                VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(activity_id)
        .bind(user_id)
        .bind(record.watched_seconds)
        .bind(record.completed)
        .bind(record.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_unfinished(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Option<AttemptRecord>, StorageError> {
        let activity = id_to_i64("activity_id", activity_id.value())?;
        let user = id_to_i64("user_id", user_id.value())?;

        let row = sqlx::query(
            r"
                SELECT id, activity_id, user_id, watched_seconds, completed, recorded_at
                FROM attempts
                WHERE activity_id = ?1 AND user_id = ?2 AND completed = 0
                ORDER BY recorded_at DESC, id DESC
                LIMIT 1
            ",
        )
        .bind(activity)
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_attempt_row).transpose()
    }

    async fn has_completed(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<bool, StorageError> {
        let activity = id_to_i64("activity_id", activity_id.value())?;
        let user = id_to_i64("user_id", user_id.value())?;

        let row = sqlx::query(
            r"
                SELECT 1
                FROM attempts
                WHERE activity_id = ?1 AND user_id = ?2 AND completed = 1
                LIMIT 1
            ",
        )
        .bind(activity)
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn attempts_for(
        &self,
        activity_id: ActivityId,
        user_id: UserId,
    ) -> Result<Vec<AttemptRecord>, StorageError> {
        let activity = id_to_i64("activity_id", activity_id.value())?;
        let user = id_to_i64("user_id", user_id.value())?;

        let rows = sqlx::query(
            r"
                SELECT id, activity_id, user_id, watched_seconds, completed, recorded_at
                FROM attempts
                WHERE activity_id = ?1 AND user_id = ?2
                ORDER BY recorded_at ASC, id ASC
            ",
        )
        .bind(activity)
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row(&row)?);
        }
        Ok(out)
    }
}
