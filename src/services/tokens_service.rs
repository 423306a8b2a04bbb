use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::{ServiceError, TokenListFilters};
use crate::entities::Token;
use crate::filter::DocumentFilter;
use crate::store::DocumentCollection;

/// Token lifecycle engine: batch generation, filtered listing, bulk removal,
/// and the conditional used-marking that enforces single use.
#[derive(Clone)]
pub struct TokensService {
    collection: Arc<dyn DocumentCollection<Token>>,
}

impl TokensService {
    pub fn new(collection: Arc<dyn DocumentCollection<Token>>) -> Self {
        Self { collection }
    }

    /// Inserts `count` fresh tokens bound to the given receiver. The receiver
    /// is not checked for existence here; redemption validates the binding.
    pub async fn generate(
        &self,
        count: i64,
        feedback_receiver_id: Uuid,
        expiry_time: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Token>, ServiceError> {
        if count <= 0 {
            return Err(ServiceError::InvalidArgument(format!(
                "numberOfTokens must be positive, got {count}"
            )));
        }

        let tokens: Vec<Token> = (0..count)
            .map(|_| Token::new(feedback_receiver_id, expiry_time, now))
            .collect();
        self.collection.insert_many(&tokens).await?;
        Ok(tokens)
    }

    /// Lists tokens matching the conjunction of the set filters. No filters
    /// set at all returns every token.
    pub async fn find(&self, filters: &TokenListFilters) -> Result<Vec<Token>, ServiceError> {
        let mut filter = DocumentFilter::new();
        if !filters.ids.is_empty() {
            filter = filter.id_in("id", filters.ids.clone());
        }
        if let Some(receiver_id) = filters.feedback_receiver_id {
            filter = filter.eq("feedback_receiver_id", receiver_id);
        }
        if let Some(after) = filters.created_after {
            filter = filter.gte("created_at", after);
        }
        if let Some(before) = filters.created_before {
            filter = filter.lte("created_at", before);
        }
        if let Some(after) = filters.used_after {
            filter = filter.gte("time_used", after);
        }
        if let Some(before) = filters.used_before {
            filter = filter.lte("time_used", before);
        }

        Ok(self.collection.find(&filter, None, None).await?)
    }

    /// Removes tokens by id. An id set matching nothing is a vacuous success.
    pub async fn delete(&self, ids: &[Uuid]) -> Result<(), ServiceError> {
        self.collection
            .delete_many(&DocumentFilter::new().id_in("id", ids.to_vec()))
            .await?;
        Ok(())
    }

    /// Removes every token bound to any of the given receivers; used for the
    /// receiver-deletion cascade.
    pub async fn delete_by_receiver_ids(&self, receiver_ids: &[Uuid]) -> Result<(), ServiceError> {
        self.collection
            .delete_many(&DocumentFilter::new().id_in("feedback_receiver_id", receiver_ids.to_vec()))
            .await?;
        Ok(())
    }

    /// Consumes the token: sets `time_used = now` only if it is still unset,
    /// in one store round trip. Returns false when no row matched, i.e. the
    /// token is missing or was already consumed (possibly by a concurrent
    /// redemption that won the write).
    pub async fn mark_used(&self, token_id: Uuid, now: DateTime<Utc>) -> Result<bool, ServiceError> {
        let unused = DocumentFilter::new().eq("id", token_id).is_null("time_used");
        let matched = self
            .collection
            .update_one(&unused, "time_used", now.into())
            .await?;
        Ok(matched > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryCollection;
    use chrono::Duration;

    fn service() -> TokensService {
        TokensService::new(Arc::new(MemoryCollection::new()))
    }

    #[tokio::test]
    async fn generate_batch_binds_every_token_to_the_receiver() {
        let service = service();
        let receiver_id = Uuid::new_v4();
        let now = Utc::now();
        let expiry = now + Duration::hours(24);

        let tokens = service
            .generate(2, receiver_id, Some(expiry), now)
            .await
            .unwrap();
        assert_eq!(tokens.len(), 2);
        for token in &tokens {
            assert_eq!(token.feedback_receiver_id, receiver_id);
            assert_eq!(token.expiry_time, Some(expiry));
            assert!(token.time_used.is_none());
        }

        let stored = service.find(&TokenListFilters::default()).await.unwrap();
        assert_eq!(stored, tokens);
    }

    #[tokio::test]
    async fn generate_rejects_non_positive_counts() {
        let service = service();
        for count in [0, -1] {
            let result = service.generate(count, Uuid::new_v4(), None, Utc::now()).await;
            assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
        }
        let stored = service.find(&TokenListFilters::default()).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn find_with_no_filters_returns_all_tokens() {
        let service = service();
        let now = Utc::now();
        service.generate(3, Uuid::new_v4(), None, now).await.unwrap();
        service.generate(2, Uuid::new_v4(), None, now).await.unwrap();

        let all = service.find(&TokenListFilters::default()).await.unwrap();
        assert_eq!(all.len(), 5);
    }

    #[tokio::test]
    async fn find_filters_by_receiver_and_created_range() {
        let service = service();
        let receiver_id = Uuid::new_v4();
        let early = Utc::now() - Duration::days(2);
        let late = Utc::now();
        service.generate(1, receiver_id, None, early).await.unwrap();
        service.generate(1, receiver_id, None, late).await.unwrap();
        service.generate(1, Uuid::new_v4(), None, late).await.unwrap();

        let filters = TokenListFilters {
            feedback_receiver_id: Some(receiver_id),
            created_after: Some(late - Duration::hours(1)),
            ..Default::default()
        };
        let found = service.find(&filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].created_at, late);
    }

    #[tokio::test]
    async fn find_by_used_range_excludes_unused_tokens() {
        let service = service();
        let now = Utc::now();
        let tokens = service.generate(2, Uuid::new_v4(), None, now).await.unwrap();
        assert!(service.mark_used(tokens[0].id, now).await.unwrap());

        let filters = TokenListFilters {
            used_after: Some(now - Duration::hours(1)),
            ..Default::default()
        };
        let found = service.find(&filters).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, tokens[0].id);
    }

    #[tokio::test]
    async fn mark_used_consumes_exactly_once() {
        let service = service();
        let now = Utc::now();
        let tokens = service.generate(1, Uuid::new_v4(), None, now).await.unwrap();

        assert!(service.mark_used(tokens[0].id, now).await.unwrap());
        assert!(!service.mark_used(tokens[0].id, now).await.unwrap());

        let stored = service.find(&TokenListFilters::default()).await.unwrap();
        assert_eq!(stored[0].time_used, Some(now));
    }

    #[tokio::test]
    async fn mark_used_on_missing_token_reports_no_match() {
        let service = service();
        assert!(!service.mark_used(Uuid::new_v4(), Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn delete_is_vacuous_for_unknown_ids() {
        let service = service();
        let now = Utc::now();
        let tokens = service.generate(1, Uuid::new_v4(), None, now).await.unwrap();

        service.delete(&[Uuid::new_v4()]).await.unwrap();
        let remaining = service.find(&TokenListFilters::default()).await.unwrap();
        assert_eq!(remaining, tokens);
    }

    #[tokio::test]
    async fn delete_by_receiver_only_touches_that_receivers_tokens() {
        let service = service();
        let now = Utc::now();
        let doomed = Uuid::new_v4();
        let kept = Uuid::new_v4();
        service.generate(2, doomed, None, now).await.unwrap();
        service.generate(1, kept, None, now).await.unwrap();

        service.delete_by_receiver_ids(&[doomed]).await.unwrap();

        let remaining = service.find(&TokenListFilters::default()).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].feedback_receiver_id, kept);
    }
}
