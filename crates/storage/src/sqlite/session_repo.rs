use quickcal_core::model::{PracticeSession, SessionId, SubmittedAnswer};
use sqlx::{Row, Sqlite, Transaction};

use super::SqliteRepository;
use super::mapping::{
    conn, duration_to_ms, id_to_i64, map_answer_row, map_session_row, ser, session_id_from_i64,
};
use crate::repository::{PracticeSessionRepository, SessionQuery, StorageError};

async fn insert_answer(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: i64,
    position: i64,
    answer: &SubmittedAnswer,
) -> Result<(), StorageError> {
    sqlx::query(
        r"
        INSERT INTO submitted_answers (
            session_id, position, expression, correct_answer, user_answer,
            category, is_correct, time_spent_ms, answered_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        ",
    )
    .bind(session_id)
    .bind(position)
    .bind(answer.expression.as_str())
    .bind(answer.correct_answer.as_str())
    .bind(answer.user_answer.as_str())
    .bind(answer.category.as_str())
    .bind(answer.is_correct)
    .bind(duration_to_ms(answer.time_spent))
    .bind(answer.answered_at)
    .execute(&mut **tx)
    .await
    .map_err(conn)?;
    Ok(())
}

async fn insert_all_answers(
    tx: &mut Transaction<'_, Sqlite>,
    session_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<(), StorageError> {
    for (position, answer) in answers.iter().enumerate() {
        let position = i64::try_from(position)
            .map_err(|_| StorageError::Serialization("answer position overflow".into()))?;
        insert_answer(tx, session_id, position, answer).await?;
    }
    Ok(())
}

impl SqliteRepository {
    async fn load_answers(&self, session_id: i64) -> Result<Vec<SubmittedAnswer>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT expression, correct_answer, user_answer, category, time_spent_ms, answered_at
            FROM submitted_answers
            WHERE session_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_answer_row).collect()
    }
}

#[async_trait::async_trait]
impl PracticeSessionRepository for SqliteRepository {
    async fn insert_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        let res = sqlx::query(
            r"
            INSERT INTO practice_sessions (
                category, total_questions, correct_answers, total_time_ms,
                average_time_ms, started_at, ended_at, is_completed
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(session.category().as_str())
        .bind(i64::from(session.total_questions()))
        .bind(i64::from(session.correct_answers()))
        .bind(duration_to_ms(session.total_time()))
        .bind(duration_to_ms(session.average_time()))
        .bind(session.started_at())
        .bind(session.ended_at())
        .bind(session.is_completed())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let id = res.last_insert_rowid();
        insert_all_answers(&mut tx, id, session.answers()).await?;
        tx.commit().await.map_err(conn)?;
        session_id_from_i64(id)
    }

    async fn save_session(&self, session: &PracticeSession) -> Result<(), StorageError> {
        let id = session.id().ok_or(StorageError::NotFound)?;
        let id = id_to_i64("session_id", id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;
        let res = sqlx::query(
            r"
            UPDATE practice_sessions SET
                category = ?2,
                total_questions = ?3,
                correct_answers = ?4,
                total_time_ms = ?5,
                average_time_ms = ?6,
                started_at = ?7,
                ended_at = ?8,
                is_completed = ?9
            WHERE id = ?1
            ",
        )
        .bind(id)
        .bind(session.category().as_str())
        .bind(i64::from(session.total_questions()))
        .bind(i64::from(session.correct_answers()))
        .bind(duration_to_ms(session.total_time()))
        .bind(duration_to_ms(session.average_time()))
        .bind(session.started_at())
        .bind(session.ended_at())
        .bind(session.is_completed())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        // The session value is authoritative; replace whatever answers were appended.
        sqlx::query("DELETE FROM submitted_answers WHERE session_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        insert_all_answers(&mut tx, id, session.answers()).await?;

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn append_answer(
        &self,
        session_id: SessionId,
        answer: &SubmittedAnswer,
    ) -> Result<(), StorageError> {
        let id = id_to_i64("session_id", session_id.value())?;
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            UPDATE practice_sessions
            SET correct_answers = correct_answers + ?2
            WHERE id = ?1
            ",
        )
        .bind(id)
        .bind(i64::from(answer.is_correct))
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let position: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM submitted_answers WHERE session_id = ?1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;

        insert_answer(&mut tx, id, position, answer).await?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError> {
        let id = id_to_i64("session_id", id.value())?;
        let row = sqlx::query(
            r"
            SELECT id, category, total_questions, correct_answers, total_time_ms,
                   average_time_ms, started_at, ended_at, is_completed
            FROM practice_sessions
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?
        .ok_or(StorageError::NotFound)?;

        let answers = self.load_answers(id).await?;
        map_session_row(&row, answers)
    }

    async fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, category, total_questions, correct_answers, total_time_ms,
                   average_time_ms, started_at, ended_at, is_completed
            FROM practice_sessions
            WHERE (?1 = 0 OR is_completed = 1)
              AND (?2 IS NULL OR started_at >= ?2)
              AND (?3 IS NULL OR category = ?3)
            ORDER BY started_at DESC, id DESC
            LIMIT ?4
            ",
        )
        .bind(query.completed_only)
        .bind(query.started_from)
        .bind(query.category.map(|c| c.as_str()))
        // SQLite treats a negative LIMIT as unbounded.
        .bind(query.limit.map_or(-1, i64::from))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(ser)?;
            let answers = self.load_answers(id).await?;
            sessions.push(map_session_row(row, answers)?);
        }
        Ok(sessions)
    }

    async fn delete_all_sessions(&self) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM practice_sessions")
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        tracing::debug!(removed = res.rows_affected(), "deleted practice sessions");
        Ok(res.rows_affected())
    }
}
