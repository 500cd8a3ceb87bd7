use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::SqliteInitError;

/// One schema version: the statements that bring the previous version up to it.
struct Migration {
    version: i64,
    statements: &'static [&'static str],
}

const SESSIONS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS practice_sessions (
        id INTEGER PRIMARY KEY,
        category TEXT NOT NULL,
        total_questions INTEGER NOT NULL CHECK (total_questions >= 0),
        correct_answers INTEGER NOT NULL CHECK (correct_answers >= 0),
        total_time_ms INTEGER NOT NULL CHECK (total_time_ms >= 0),
        average_time_ms INTEGER NOT NULL CHECK (average_time_ms >= 0),
        started_at TEXT NOT NULL,
        ended_at TEXT,
        is_completed INTEGER NOT NULL CHECK (is_completed IN (0, 1))
    )";

const ANSWERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS submitted_answers (
        id INTEGER PRIMARY KEY,
        session_id INTEGER NOT NULL
            REFERENCES practice_sessions(id) ON DELETE CASCADE,
        position INTEGER NOT NULL CHECK (position >= 0),
        expression TEXT NOT NULL,
        correct_answer TEXT NOT NULL,
        user_answer TEXT NOT NULL,
        category TEXT NOT NULL,
        is_correct INTEGER NOT NULL CHECK (is_correct IN (0, 1)),
        time_spent_ms INTEGER NOT NULL CHECK (time_spent_ms >= 0),
        answered_at TEXT NOT NULL,
        UNIQUE (session_id, position)
    )";

const WRONG_ANSWERS_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS wrong_answers (
        id INTEGER PRIMARY KEY,
        expression TEXT NOT NULL UNIQUE,
        correct_answer TEXT NOT NULL,
        user_answer TEXT NOT NULL,
        category TEXT NOT NULL,
        wrong_count INTEGER NOT NULL CHECK (wrong_count >= 1),
        first_wrong_at TEXT NOT NULL,
        last_wrong_at TEXT NOT NULL,
        is_mastered INTEGER NOT NULL CHECK (is_mastered IN (0, 1))
    )";

// Singleton row; id is pinned to 1.
const PREFERENCES_TABLE: &str = r"
    CREATE TABLE IF NOT EXISTS user_preferences (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        questions_per_session INTEGER NOT NULL
            CHECK (questions_per_session BETWEEN 5 AND 50),
        sound_enabled INTEGER NOT NULL,
        haptic_feedback_enabled INTEGER NOT NULL,
        auto_submit_enabled INTEGER NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )";

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        SESSIONS_TABLE,
        ANSWERS_TABLE,
        WRONG_ANSWERS_TABLE,
        PREFERENCES_TABLE,
        "CREATE INDEX IF NOT EXISTS idx_practice_sessions_completed_started \
         ON practice_sessions (is_completed, started_at)",
        "CREATE INDEX IF NOT EXISTS idx_wrong_answers_mastered_last_wrong \
         ON wrong_answers (is_mastered, last_wrong_at)",
    ],
}];

/// Brings the database up to the latest schema version.
///
/// Each pending version runs in its own transaction and is recorded in
/// `schema_migrations`, so re-running is a no-op.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    for migration in MIGRATIONS {
        if is_applied(pool, migration.version).await? {
            continue;
        }
        let mut tx = pool.begin().await?;
        apply(&mut tx, migration).await?;
        tx.commit().await?;
        tracing::debug!(version = migration.version, "applied sqlite migration");
    }

    Ok(())
}

async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
    let applied: Option<i64> =
        sqlx::query_scalar("SELECT version FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
    Ok(applied.is_some())
}

async fn apply(tx: &mut Transaction<'_, Sqlite>, migration: &Migration) -> Result<(), sqlx::Error> {
    for statement in migration.statements {
        sqlx::query(statement).execute(&mut **tx).await?;
    }
    sqlx::query(
        "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)
         ON CONFLICT(version) DO NOTHING",
    )
    .bind(migration.version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
