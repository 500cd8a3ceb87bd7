use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use quickcal_core::generator::{QuestionGenerator, RandomQuestionGenerator};
use quickcal_core::model::{
    Category, MistakeFilter, PracticeSession, Problem, SessionId, SubmittedAnswer, WrongAnswerId,
    WrongAnswerRecord,
};
use quickcal_core::time::fixed_now;
use services::{Clock, PracticeLoopService, PracticeStatus, SessionError};
use storage::repository::{
    InMemoryRepository, PracticeSessionRepository, SessionQuery, StorageError,
    WrongAnswerRepository,
};

struct FixedProblems(Vec<(&'static str, &'static str)>);

impl QuestionGenerator for FixedProblems {
    fn generate(
        &self,
        category: Category,
        count: usize,
        created_at: DateTime<Utc>,
    ) -> Vec<Problem> {
        self.0
            .iter()
            .cycle()
            .take(count)
            .map(|(expr, answer)| Problem::new(category, *expr, *answer, created_at))
            .collect()
    }
}

fn five_additions() -> Arc<dyn QuestionGenerator> {
    Arc::new(FixedProblems(vec![
        ("27 + 56", "83"),
        ("45 + 12", "57"),
        ("33 + 21", "54"),
        ("19 + 19", "38"),
        ("60 + 31", "91"),
    ]))
}

fn loop_over(
    repo: &InMemoryRepository,
    clock: Clock,
    generator: Arc<dyn QuestionGenerator>,
) -> PracticeLoopService {
    PracticeLoopService::new(
        clock,
        generator,
        Arc::new(repo.clone()),
        Arc::new(repo.clone()),
    )
}

#[tokio::test]
async fn five_answers_three_correct_two_misses() {
    let repo = InMemoryRepository::new();
    let (clock, handle) = Clock::manual(fixed_now());
    let practice = loop_over(&repo, clock, five_additions());

    let mut tracker = practice
        .start_practice(Category::TwoDigitAddition, 5)
        .await
        .unwrap();
    let session_id = tracker.session_id().expect("session shell stored");

    let mut last = None;
    for input in ["83", "56", "54", "40", "91"] {
        handle.advance(Duration::seconds(2));
        last = Some(practice.submit_answer(&mut tracker, input).await.unwrap());
    }
    let last = last.unwrap();
    assert!(last.is_complete);
    assert_eq!(last.saved_session_id, Some(session_id));
    assert_eq!(tracker.status(), PracticeStatus::Completed);

    let stored = repo.get_session(session_id).await.unwrap();
    assert!(stored.is_completed());
    assert_eq!(stored.correct_answers(), 3);
    assert_eq!(stored.wrong_answers(), 2);
    assert_eq!(stored.answers().len(), 5);
    assert_eq!(stored.total_time(), Duration::seconds(10));
    assert_eq!(stored.average_time(), Duration::seconds(2));

    let notebook = repo.list_wrong_answers(MistakeFilter::All).await.unwrap();
    assert_eq!(notebook.len(), 2);
    assert!(notebook.iter().all(|r| r.wrong_count() == 1));
    let miss = repo.find_by_expression("45 + 12").await.unwrap().unwrap();
    assert_eq!(miss.user_answer(), "56");
    assert_eq!(miss.correct_answer(), "57");
}

#[tokio::test]
async fn repeated_miss_increments_existing_record() {
    let repo = InMemoryRepository::new();
    let (clock, handle) = Clock::manual(fixed_now());
    let practice = loop_over(&repo, clock, Arc::new(FixedProblems(vec![("25 × 7", "175")])));

    for wrong in ["165", "185"] {
        let mut tracker = practice
            .start_practice(Category::TwoDigitMultiplication, 1)
            .await
            .unwrap();
        handle.advance(Duration::minutes(1));
        practice.submit_answer(&mut tracker, wrong).await.unwrap();
    }

    let records = repo.list_wrong_answers(MistakeFilter::All).await.unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.wrong_count(), 2);
    assert_eq!(record.user_answer(), "185");
    assert_eq!(record.first_wrong_at(), fixed_now() + Duration::minutes(1));
    assert_eq!(record.last_wrong_at(), fixed_now() + Duration::minutes(2));

    let history = repo.list_sessions(&SessionQuery::completed()).await.unwrap();
    assert_eq!(history.len(), 2);
}

#[tokio::test]
async fn paused_session_rejects_answers_and_excludes_pause() {
    let repo = InMemoryRepository::new();
    let (clock, handle) = Clock::manual(fixed_now());
    let practice = loop_over(&repo, clock, five_additions());
    let mut tracker = practice
        .start_practice(Category::TwoDigitAddition, 1)
        .await
        .unwrap();

    handle.advance(Duration::seconds(1));
    assert_eq!(practice.toggle_pause(&mut tracker).unwrap(), PracticeStatus::Paused);
    handle.advance(Duration::minutes(5));
    assert!(matches!(
        practice.submit_answer(&mut tracker, "83").await,
        Err(SessionError::Paused)
    ));
    assert!(matches!(
        practice.finalize_session(&mut tracker).await,
        Err(SessionError::InProgress)
    ));

    assert_eq!(practice.toggle_pause(&mut tracker).unwrap(), PracticeStatus::InProgress);
    handle.advance(Duration::seconds(2));
    let result = practice.submit_answer(&mut tracker, "83").await.unwrap();
    assert_eq!(result.answer.time_spent, Duration::seconds(3));
    assert_eq!(tracker.session().unwrap().total_time(), Duration::seconds(3));
}

#[tokio::test]
async fn zero_count_never_reaches_storage() {
    let repo = InMemoryRepository::new();
    let practice = loop_over(&repo, Clock::fixed(fixed_now()), five_additions());
    let err = practice
        .start_practice(Category::TwoDigitAddition, 0)
        .await
        .err()
        .expect("empty run rejected");
    assert!(matches!(err, SessionError::Empty));
    assert!(repo
        .list_sessions(&SessionQuery::default())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn seeded_generator_runs_every_category() {
    let repo = InMemoryRepository::new();
    let practice = loop_over(
        &repo,
        Clock::fixed(fixed_now()),
        Arc::new(RandomQuestionGenerator::seeded(7)),
    );

    for category in Category::ALL {
        let mut tracker = practice.start_practice(category, 4).await.unwrap();
        while let Some(problem) = tracker.current_problem() {
            assert_ne!(problem.category(), Category::Mixed);
            assert_eq!(
                problem.is_multiple_choice(),
                problem.category() == Category::FourDigitDivision
            );
            let answer = problem.correct_answer().to_owned();
            practice.submit_answer(&mut tracker, &answer).await.unwrap();
        }
        let session = tracker.session().unwrap();
        assert_eq!(session.category(), category);
        assert_eq!(session.correct_answers(), 4);
    }

    assert!(repo
        .list_wrong_answers(MistakeFilter::All)
        .await
        .unwrap()
        .is_empty());
}

// ─── FAILING STORE ─────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct FailingStore;

fn offline() -> StorageError {
    StorageError::Connection("offline".into())
}

#[async_trait::async_trait]
impl PracticeSessionRepository for FailingStore {
    async fn insert_session(&self, _session: &PracticeSession) -> Result<SessionId, StorageError> {
        Err(offline())
    }

    async fn save_session(&self, _session: &PracticeSession) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn append_answer(
        &self,
        _session_id: SessionId,
        _answer: &SubmittedAnswer,
    ) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn get_session(&self, _id: SessionId) -> Result<PracticeSession, StorageError> {
        Err(offline())
    }

    async fn list_sessions(
        &self,
        _query: &SessionQuery,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        Err(offline())
    }

    async fn delete_all_sessions(&self) -> Result<u64, StorageError> {
        Err(offline())
    }
}

#[async_trait::async_trait]
impl WrongAnswerRepository for FailingStore {
    async fn find_by_expression(
        &self,
        _expression: &str,
    ) -> Result<Option<WrongAnswerRecord>, StorageError> {
        Err(offline())
    }

    async fn get_wrong_answer(
        &self,
        _id: WrongAnswerId,
    ) -> Result<WrongAnswerRecord, StorageError> {
        Err(offline())
    }

    async fn upsert_wrong_answer(
        &self,
        _record: &WrongAnswerRecord,
    ) -> Result<WrongAnswerId, StorageError> {
        Err(offline())
    }

    async fn list_wrong_answers(
        &self,
        _filter: MistakeFilter,
    ) -> Result<Vec<WrongAnswerRecord>, StorageError> {
        Err(offline())
    }

    async fn delete_wrong_answer(&self, _id: WrongAnswerId) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn delete_wrong_answers(&self, _filter: MistakeFilter) -> Result<u64, StorageError> {
        Err(offline())
    }
}

#[tokio::test]
async fn failing_store_never_blocks_a_run() {
    let practice = PracticeLoopService::new(
        Clock::fixed(fixed_now()),
        five_additions(),
        Arc::new(FailingStore),
        Arc::new(FailingStore),
    );

    let mut tracker = practice
        .start_practice(Category::TwoDigitAddition, 2)
        .await
        .unwrap();
    assert!(tracker.session_id().is_none());

    let first = practice.submit_answer(&mut tracker, "0").await.unwrap();
    assert!(first.wrong_answer_id.is_none());
    let last = practice.submit_answer(&mut tracker, "57").await.unwrap();
    assert!(last.is_complete);
    assert!(last.saved_session_id.is_none());
    assert_eq!(tracker.correct_count(), 1);

    let err = practice.finalize_session(&mut tracker).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(StorageError::Connection(_))));
}

#[tokio::test]
async fn finalize_retry_saves_after_store_recovers() {
    let repo = InMemoryRepository::new();
    let failing = PracticeLoopService::new(
        Clock::fixed(fixed_now()),
        five_additions(),
        Arc::new(FailingStore),
        Arc::new(repo.clone()),
    );
    let mut tracker = failing
        .start_practice(Category::TwoDigitAddition, 1)
        .await
        .unwrap();
    failing.submit_answer(&mut tracker, "83").await.unwrap();
    assert!(tracker.is_complete());

    let recovered = loop_over(&repo, Clock::fixed(fixed_now()), five_additions());
    let id = recovered.finalize_session(&mut tracker).await.unwrap();
    assert_eq!(tracker.session_id(), Some(id));
    assert_eq!(repo.get_session(id).await.unwrap().correct_answers(), 1);

    // A second finalize overwrites the same row.
    assert_eq!(recovered.finalize_session(&mut tracker).await.unwrap(), id);
    assert_eq!(repo.list_sessions(&SessionQuery::default()).await.unwrap().len(), 1);
}

// Accepts inserts and appends, rejects the final save.
#[derive(Clone, Default)]
struct SaveRejectingStore(InMemoryRepository);

#[async_trait::async_trait]
impl PracticeSessionRepository for SaveRejectingStore {
    async fn insert_session(&self, session: &PracticeSession) -> Result<SessionId, StorageError> {
        self.0.insert_session(session).await
    }

    async fn save_session(&self, _session: &PracticeSession) -> Result<(), StorageError> {
        Err(offline())
    }

    async fn append_answer(
        &self,
        session_id: SessionId,
        answer: &SubmittedAnswer,
    ) -> Result<(), StorageError> {
        self.0.append_answer(session_id, answer).await
    }

    async fn get_session(&self, id: SessionId) -> Result<PracticeSession, StorageError> {
        self.0.get_session(id).await
    }

    async fn list_sessions(
        &self,
        query: &SessionQuery,
    ) -> Result<Vec<PracticeSession>, StorageError> {
        self.0.list_sessions(query).await
    }

    async fn delete_all_sessions(&self) -> Result<u64, StorageError> {
        self.0.delete_all_sessions().await
    }
}

#[tokio::test]
async fn failed_final_save_is_reported_despite_stored_shell() {
    let repo = InMemoryRepository::new();
    let practice = PracticeLoopService::new(
        Clock::fixed(fixed_now()),
        five_additions(),
        Arc::new(SaveRejectingStore(repo.clone())),
        Arc::new(repo.clone()),
    );

    let mut tracker = practice
        .start_practice(Category::TwoDigitAddition, 1)
        .await
        .unwrap();
    assert!(tracker.session_id().is_some());

    let last = practice.submit_answer(&mut tracker, "83").await.unwrap();
    assert!(last.is_complete);
    assert!(last.saved_session_id.is_none());

    // The shell id alone does not mean the completed run was stored.
    let stored = repo.get_session(tracker.session_id().unwrap()).await.unwrap();
    assert!(!stored.is_completed());
    assert!(practice.finalize_session(&mut tracker).await.is_err());
}
