use chrono::{DateTime, Duration, Utc};
use quickcal_core::model::{
    Category, PracticeSession, SessionId, SubmittedAnswer, UserPreferences, WrongAnswerId,
    WrongAnswerRecord,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn session_id_from_i64(v: i64) -> Result<SessionId, StorageError> {
    Ok(SessionId::new(i64_to_u64("session_id", v)?))
}

pub(crate) fn wrong_answer_id_from_i64(v: i64) -> Result<WrongAnswerId, StorageError> {
    Ok(WrongAnswerId::new(i64_to_u64("wrong_answer_id", v)?))
}

pub(crate) fn duration_to_ms(d: Duration) -> i64 {
    d.num_milliseconds().max(0)
}

fn duration_from_ms(field: &'static str, ms: i64) -> Result<Duration, StorageError> {
    if ms < 0 {
        return Err(StorageError::Serialization(format!("negative {field}: {ms}")));
    }
    Ok(Duration::milliseconds(ms))
}

fn category_column(row: &SqliteRow) -> Result<Category, StorageError> {
    let raw: String = row.try_get("category").map_err(ser)?;
    raw.parse::<Category>().map_err(ser)
}

pub(crate) fn map_answer_row(row: &SqliteRow) -> Result<SubmittedAnswer, StorageError> {
    let time_spent = duration_from_ms("time_spent_ms", row.try_get("time_spent_ms").map_err(ser)?)?;
    let answered_at: DateTime<Utc> = row.try_get("answered_at").map_err(ser)?;
    Ok(SubmittedAnswer::from_persisted(
        row.try_get("expression").map_err(ser)?,
        row.try_get("correct_answer").map_err(ser)?,
        row.try_get("user_answer").map_err(ser)?,
        category_column(row)?,
        time_spent,
        answered_at,
    ))
}

/// Rebuild a session from its header row and its ordered answers.
pub(crate) fn map_session_row(
    row: &SqliteRow,
    answers: Vec<SubmittedAnswer>,
) -> Result<PracticeSession, StorageError> {
    let id = session_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let total_questions = u32_from_i64(
        "total_questions",
        row.try_get("total_questions").map_err(ser)?,
    )?;
    let correct_answers = u32_from_i64(
        "correct_answers",
        row.try_get("correct_answers").map_err(ser)?,
    )?;
    let total_time = duration_from_ms("total_time_ms", row.try_get("total_time_ms").map_err(ser)?)?;
    let average_time = duration_from_ms(
        "average_time_ms",
        row.try_get("average_time_ms").map_err(ser)?,
    )?;
    let started_at: DateTime<Utc> = row.try_get("started_at").map_err(ser)?;
    let ended_at: Option<DateTime<Utc>> = row.try_get("ended_at").map_err(ser)?;
    let is_completed: bool = row.try_get("is_completed").map_err(ser)?;

    PracticeSession::from_persisted(
        id,
        category_column(row)?,
        total_questions,
        answers,
        correct_answers,
        total_time,
        average_time,
        started_at,
        ended_at,
        is_completed,
    )
    .map_err(ser)
}

pub(crate) fn map_wrong_answer_row(row: &SqliteRow) -> Result<WrongAnswerRecord, StorageError> {
    let id = wrong_answer_id_from_i64(row.try_get("id").map_err(ser)?)?;
    let wrong_count = u32_from_i64("wrong_count", row.try_get("wrong_count").map_err(ser)?)?;
    Ok(WrongAnswerRecord::from_persisted(
        id,
        row.try_get("expression").map_err(ser)?,
        row.try_get("correct_answer").map_err(ser)?,
        row.try_get("user_answer").map_err(ser)?,
        category_column(row)?,
        wrong_count,
        row.try_get("first_wrong_at").map_err(ser)?,
        row.try_get("last_wrong_at").map_err(ser)?,
        row.try_get("is_mastered").map_err(ser)?,
    ))
}

pub(crate) fn map_preferences_row(row: &SqliteRow) -> Result<UserPreferences, StorageError> {
    let questions = u32_from_i64(
        "questions_per_session",
        row.try_get("questions_per_session").map_err(ser)?,
    )?;
    UserPreferences::from_persisted(
        questions,
        row.try_get("sound_enabled").map_err(ser)?,
        row.try_get("haptic_feedback_enabled").map_err(ser)?,
        row.try_get("auto_submit_enabled").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
        row.try_get("updated_at").map_err(ser)?,
    )
    .map_err(ser)
}
