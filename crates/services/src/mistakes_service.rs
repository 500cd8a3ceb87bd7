use std::collections::BTreeMap;
use std::sync::Arc;

use quickcal_core::model::{Category, MistakeFilter, WrongAnswerId, WrongAnswerRecord};
use storage::repository::WrongAnswerRepository;

use crate::error::MistakeServiceError;

/// Notebook records of one category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MistakeGroup {
    pub category: Category,
    pub records: Vec<WrongAnswerRecord>,
}

/// Record counts per filter tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MistakeCounts {
    pub all: usize,
    pub not_mastered: usize,
    pub mastered: usize,
}

/// Outcome of re-answering a notebook entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryResult {
    pub is_correct: bool,
    pub correct_answer: String,
}

/// Browsing and maintenance of the wrong-answer notebook.
#[derive(Clone)]
pub struct MistakeService {
    repo: Arc<dyn WrongAnswerRepository>,
}

impl MistakeService {
    #[must_use]
    pub fn new(repo: Arc<dyn WrongAnswerRepository>) -> Self {
        Self { repo }
    }

    /// Records matching `filter`, most recently missed first.
    ///
    /// # Errors
    ///
    /// Returns `MistakeServiceError` on storage failures.
    pub async fn list(
        &self,
        filter: MistakeFilter,
    ) -> Result<Vec<WrongAnswerRecord>, MistakeServiceError> {
        Ok(self.repo.list_wrong_answers(filter).await?)
    }

    /// # Errors
    ///
    /// Returns `MistakeServiceError` if the record is missing.
    pub async fn get(&self, id: WrongAnswerId) -> Result<WrongAnswerRecord, MistakeServiceError> {
        Ok(self.repo.get_wrong_answer(id).await?)
    }

    /// Records matching `filter`, grouped by category in category order.
    ///
    /// # Errors
    ///
    /// Returns `MistakeServiceError` on storage failures.
    pub async fn grouped(
        &self,
        filter: MistakeFilter,
    ) -> Result<Vec<MistakeGroup>, MistakeServiceError> {
        let mut groups: BTreeMap<Category, Vec<WrongAnswerRecord>> = BTreeMap::new();
        for record in self.list(filter).await? {
            groups.entry(record.category()).or_default().push(record);
        }
        Ok(groups
            .into_iter()
            .map(|(category, records)| MistakeGroup { category, records })
            .collect())
    }

    /// # Errors
    ///
    /// Returns `MistakeServiceError` on storage failures.
    pub async fn counts(&self) -> Result<MistakeCounts, MistakeServiceError> {
        let records = self.list(MistakeFilter::All).await?;
        let mastered = records.iter().filter(|r| r.is_mastered()).count();
        Ok(MistakeCounts {
            all: records.len(),
            not_mastered: records.len() - mastered,
            mastered,
        })
    }

    /// # Errors
    ///
    /// Returns `MistakeServiceError` if the record is missing or cannot be saved.
    pub async fn mark_mastered(
        &self,
        id: WrongAnswerId,
    ) -> Result<WrongAnswerRecord, MistakeServiceError> {
        let mut record = self.repo.get_wrong_answer(id).await?;
        if !record.is_mastered() {
            record.mark_mastered();
            self.repo.upsert_wrong_answer(&record).await?;
            tracing::debug!(%id, "marked wrong answer mastered");
        }
        Ok(record)
    }

    /// Check a retry attempt; surrounding whitespace is ignored and nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns `MistakeServiceError` if the record is missing.
    pub async fn retry(
        &self,
        id: WrongAnswerId,
        input: &str,
    ) -> Result<RetryResult, MistakeServiceError> {
        let record = self.repo.get_wrong_answer(id).await?;
        Ok(RetryResult {
            is_correct: record.check_retry(input),
            correct_answer: record.correct_answer().to_owned(),
        })
    }

    /// # Errors
    ///
    /// Returns `MistakeServiceError` if deletion fails.
    pub async fn clear_mastered(&self) -> Result<u64, MistakeServiceError> {
        Ok(self.repo.delete_wrong_answers(MistakeFilter::Mastered).await?)
    }

    /// # Errors
    ///
    /// Returns `MistakeServiceError` if deletion fails.
    pub async fn clear_all(&self) -> Result<u64, MistakeServiceError> {
        Ok(self.repo.delete_wrong_answers(MistakeFilter::All).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quickcal_core::model::{Problem, SubmittedAnswer};
    use quickcal_core::time::fixed_now;
    use storage::repository::InMemoryRepository;

    async fn seed(
        repo: &InMemoryRepository,
        category: Category,
        expr: &str,
        answer: &str,
    ) -> WrongAnswerId {
        let problem = Problem::new(category, expr, answer, fixed_now());
        let miss = SubmittedAnswer::grade(&problem, "0", Duration::seconds(1), fixed_now());
        repo.upsert_wrong_answer(&WrongAnswerRecord::first_miss(&miss))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn retry_trims_input_and_stores_nothing() {
        let repo = InMemoryRepository::new();
        let id = seed(&repo, Category::TwoDigitAddition, "27 + 56", "83").await;
        let service = MistakeService::new(Arc::new(repo.clone()));

        let ok = service.retry(id, "  83\n").await.unwrap();
        assert!(ok.is_correct);
        let miss = service.retry(id, "84").await.unwrap();
        assert!(!miss.is_correct);
        assert_eq!(miss.correct_answer, "83");

        let stored = repo.get_wrong_answer(id).await.unwrap();
        assert_eq!(stored.wrong_count(), 1);
        assert!(!stored.is_mastered());
    }

    #[tokio::test]
    async fn grouping_counts_and_clearing() {
        let repo = InMemoryRepository::new();
        let add = seed(&repo, Category::TwoDigitAddition, "27 + 56", "83").await;
        seed(&repo, Category::TwoDigitMultiplication, "25 × 7", "175").await;
        seed(&repo, Category::TwoDigitAddition, "45 + 12", "57").await;
        let service = MistakeService::new(Arc::new(repo));

        let groups = service.grouped(MistakeFilter::All).await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, Category::TwoDigitAddition);
        assert_eq!(groups[0].records.len(), 2);

        service.mark_mastered(add).await.unwrap();
        let counts = service.counts().await.unwrap();
        assert_eq!(
            counts,
            MistakeCounts {
                all: 3,
                not_mastered: 2,
                mastered: 1
            }
        );

        assert_eq!(service.clear_mastered().await.unwrap(), 1);
        assert_eq!(service.list(MistakeFilter::Mastered).await.unwrap().len(), 0);
        assert_eq!(service.clear_all().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_record_surfaces_not_found() {
        let service = MistakeService::new(Arc::new(InMemoryRepository::new()));
        let err = service.mark_mastered(WrongAnswerId::new(42)).await.unwrap_err();
        assert!(matches!(
            err,
            MistakeServiceError::Storage(storage::repository::StorageError::NotFound)
        ));
    }
}
