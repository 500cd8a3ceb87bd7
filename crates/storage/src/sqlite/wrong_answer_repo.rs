use quickcal_core::model::{MistakeFilter, WrongAnswerId, WrongAnswerRecord};

use super::SqliteRepository;
use super::mapping::{conn, id_to_i64, map_wrong_answer_row, wrong_answer_id_from_i64};
use crate::repository::{StorageError, WrongAnswerRepository};

const SELECT_COLUMNS: &str = r"
    SELECT id, expression, correct_answer, user_answer, category, wrong_count,
           first_wrong_at, last_wrong_at, is_mastered
    FROM wrong_answers
";

fn mastered_flag(filter: MistakeFilter) -> Option<bool> {
    match filter {
        MistakeFilter::All => None,
        MistakeFilter::NotMastered => Some(false),
        MistakeFilter::Mastered => Some(true),
    }
}

fn insert_error(e: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return StorageError::Conflict;
        }
    }
    conn(e)
}

#[async_trait::async_trait]
impl WrongAnswerRepository for SqliteRepository {
    async fn find_by_expression(
        &self,
        expression: &str,
    ) -> Result<Option<WrongAnswerRecord>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE expression = ?1");
        let row = sqlx::query(&sql)
            .bind(expression)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.as_ref().map(map_wrong_answer_row).transpose()
    }

    async fn get_wrong_answer(&self, id: WrongAnswerId) -> Result<WrongAnswerRecord, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        let row = sqlx::query(&sql)
            .bind(id_to_i64("wrong_answer_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?
            .ok_or(StorageError::NotFound)?;
        map_wrong_answer_row(&row)
    }

    async fn upsert_wrong_answer(
        &self,
        record: &WrongAnswerRecord,
    ) -> Result<WrongAnswerId, StorageError> {
        if let Some(id) = record.id() {
            let res = sqlx::query(
                r"
                UPDATE wrong_answers SET
                    correct_answer = ?2,
                    user_answer = ?3,
                    category = ?4,
                    wrong_count = ?5,
                    last_wrong_at = ?6,
                    is_mastered = ?7
                WHERE id = ?1
                ",
            )
            .bind(id_to_i64("wrong_answer_id", id.value())?)
            .bind(record.correct_answer())
            .bind(record.user_answer())
            .bind(record.category().as_str())
            .bind(i64::from(record.wrong_count()))
            .bind(record.last_wrong_at())
            .bind(record.is_mastered())
            .execute(&self.pool)
            .await
            .map_err(conn)?;

            if res.rows_affected() == 0 {
                return Err(StorageError::NotFound);
            }
            return Ok(id);
        }

        let res = sqlx::query(
            r"
            INSERT INTO wrong_answers (
                expression, correct_answer, user_answer, category, wrong_count,
                first_wrong_at, last_wrong_at, is_mastered
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(record.expression())
        .bind(record.correct_answer())
        .bind(record.user_answer())
        .bind(record.category().as_str())
        .bind(i64::from(record.wrong_count()))
        .bind(record.first_wrong_at())
        .bind(record.last_wrong_at())
        .bind(record.is_mastered())
        .execute(&self.pool)
        .await
        .map_err(insert_error)?;

        wrong_answer_id_from_i64(res.last_insert_rowid())
    }

    async fn list_wrong_answers(
        &self,
        filter: MistakeFilter,
    ) -> Result<Vec<WrongAnswerRecord>, StorageError> {
        let sql = format!(
            "{SELECT_COLUMNS} WHERE (?1 IS NULL OR is_mastered = ?1) \
             ORDER BY last_wrong_at DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(mastered_flag(filter))
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;
        rows.iter().map(map_wrong_answer_row).collect()
    }

    async fn delete_wrong_answer(&self, id: WrongAnswerId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM wrong_answers WHERE id = ?1")
            .bind(id_to_i64("wrong_answer_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_wrong_answers(&self, filter: MistakeFilter) -> Result<u64, StorageError> {
        let res = sqlx::query("DELETE FROM wrong_answers WHERE (?1 IS NULL OR is_mastered = ?1)")
            .bind(mastered_flag(filter))
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        tracing::debug!(?filter, removed = res.rows_affected(), "deleted wrong answers");
        Ok(res.rows_affected())
    }
}
