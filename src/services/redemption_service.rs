use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use super::{
    FeedbackReceiversService, FeedbacksService, ServiceError, TokenListFilters, TokensService,
};
use crate::entities::Feedback;

#[derive(Debug, Error)]
pub enum RedemptionError {
    #[error("Token not found.")]
    TokenNotFound,

    #[error("FeedbackReceiver with id {0} not found.")]
    ReceiverNotFound(Uuid),

    /// Covers used, expired, wrong-receiver, and losing the concurrent
    /// consume race; the cases are deliberately not distinguished.
    #[error("Token is invalid.")]
    TokenInvalid,

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// The one externally meaningful transaction of the system: accept a token
/// id plus rating and description, and either commit a new Feedback while
/// consuming the token, or reject.
#[derive(Clone)]
pub struct RedemptionService {
    tokens: TokensService,
    receivers: FeedbackReceiversService,
    feedbacks: FeedbacksService,
}

impl RedemptionService {
    pub fn new(
        tokens: TokensService,
        receivers: FeedbackReceiversService,
        feedbacks: FeedbacksService,
    ) -> Self {
        Self {
            tokens,
            receivers,
            feedbacks,
        }
    }

    /// Redeems a token for one Feedback submission.
    ///
    /// `receiver_id_from_path` carries the receiver id of the receiver-scoped
    /// entry point; when set it must match the token's bound receiver.
    pub async fn redeem(
        &self,
        token_id: Uuid,
        rating: i16,
        description: &str,
        receiver_id_from_path: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Result<Feedback, RedemptionError> {
        let filters = TokenListFilters {
            ids: vec![token_id],
            ..Default::default()
        };
        let token = self
            .tokens
            .find(&filters)
            .await?
            .into_iter()
            .next()
            .ok_or(RedemptionError::TokenNotFound)?;

        if let Some(path_id) = receiver_id_from_path {
            if path_id != token.feedback_receiver_id {
                return Err(RedemptionError::TokenInvalid);
            }
        }

        let receiver = self
            .receivers
            .find(&[token.feedback_receiver_id], None, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or(RedemptionError::ReceiverNotFound(token.feedback_receiver_id))?;

        if !token.is_valid_for(&receiver, now) {
            return Err(RedemptionError::TokenInvalid);
        }

        // Validate the feedback before any write so a bad rating leaves no
        // partial effects.
        let feedback = Feedback::new(receiver.id, rating, description, now)
            .map_err(|e| RedemptionError::InvalidArgument(e.to_string()))?;

        // Conditional consume: two concurrent attempts can both pass the
        // validity check above, only one wins this write.
        if !self.tokens.mark_used(token_id, now).await? {
            return Err(RedemptionError::TokenInvalid);
        }

        // A failure here leaves the token consumed with no feedback recorded;
        // there is no cross-collection transaction to roll back.
        Ok(self.feedbacks.add(feedback, &receiver).await?)
    }

    /// Probe form of the validity check. A missing token is reported as
    /// invalid rather than as an error.
    pub async fn check_token(
        &self,
        token_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<bool, ServiceError> {
        let filters = TokenListFilters {
            ids: vec![token_id],
            ..Default::default()
        };
        let token = self.tokens.find(&filters).await?.into_iter().next();
        Ok(token.map_or(false, |t| t.is_valid(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{FeedbackReceiver, Token};
    use crate::filter::{DocumentFilter, FilterValue};
    use crate::services::FeedbackListFilters;
    use crate::store::memory::MemoryCollection;
    use crate::store::{DocumentCollection, StoreError};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::Arc;

    struct Fixture {
        service: RedemptionService,
        tokens: TokensService,
        receivers: FeedbackReceiversService,
        feedbacks: FeedbacksService,
    }

    fn fixture() -> Fixture {
        fixture_with_feedbacks(Arc::new(MemoryCollection::new()))
    }

    fn fixture_with_feedbacks(collection: Arc<dyn DocumentCollection<Feedback>>) -> Fixture {
        let tokens = TokensService::new(Arc::new(MemoryCollection::new()));
        let receivers = FeedbackReceiversService::new(Arc::new(MemoryCollection::new()));
        let feedbacks = FeedbacksService::new(collection);
        let service =
            RedemptionService::new(tokens.clone(), receivers.clone(), feedbacks.clone());
        Fixture {
            service,
            tokens,
            receivers,
            feedbacks,
        }
    }

    async fn seed_receiver(fx: &Fixture) -> FeedbackReceiver {
        let receiver = FeedbackReceiver::new("cafe", "corner cafe", Utc::now());
        fx.receivers
            .create_many(vec![receiver.clone()])
            .await
            .unwrap();
        receiver
    }

    async fn list_feedbacks(fx: &Fixture, receiver_id: Uuid) -> Vec<Feedback> {
        fx.feedbacks
            .list(&FeedbackListFilters {
                feedback_receiver_id: Some(receiver_id),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn redeem_commits_feedback_and_consumes_the_token() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        let feedback = fx
            .service
            .redeem(tokens[0].id, 4, "ok", None, now)
            .await
            .unwrap();
        assert_eq!(feedback.feedback_receiver_id, receiver.id);
        assert_eq!(feedback.rating, 4);

        let stored = list_feedbacks(&fx, receiver.id).await;
        assert_eq!(stored, vec![feedback]);

        let token = &fx.tokens.find(&TokenListFilters::default()).await.unwrap()[0];
        assert_eq!(token.time_used, Some(now));
    }

    #[tokio::test]
    async fn second_redeem_of_the_same_token_fails() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        fx.service
            .redeem(tokens[0].id, 4, "ok", None, now)
            .await
            .unwrap();
        let result = fx.service.redeem(tokens[0].id, 5, "again", None, now).await;
        assert!(matches!(result, Err(RedemptionError::TokenInvalid)));
        assert_eq!(list_feedbacks(&fx, receiver.id).await.len(), 1);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx
            .tokens
            .generate(1, receiver.id, Some(now - Duration::hours(1)), now - Duration::days(1))
            .await
            .unwrap();

        let result = fx.service.redeem(tokens[0].id, 3, "late", None, now).await;
        assert!(matches!(result, Err(RedemptionError::TokenInvalid)));
        assert!(list_feedbacks(&fx, receiver.id).await.is_empty());
    }

    #[tokio::test]
    async fn unknown_token_is_not_found() {
        let fx = fixture();
        let result = fx
            .service
            .redeem(Uuid::new_v4(), 3, "hm", None, Utc::now())
            .await;
        assert!(matches!(result, Err(RedemptionError::TokenNotFound)));
    }

    #[tokio::test]
    async fn missing_receiver_is_reported() {
        let fx = fixture();
        let now = Utc::now();
        // Token bound to a receiver that was never created
        let tokens = fx.tokens.generate(1, Uuid::new_v4(), None, now).await.unwrap();

        let result = fx.service.redeem(tokens[0].id, 3, "hm", None, now).await;
        assert!(matches!(result, Err(RedemptionError::ReceiverNotFound(_))));
    }

    #[tokio::test]
    async fn receiver_scoped_entry_rejects_a_mismatched_path_id() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        let result = fx
            .service
            .redeem(tokens[0].id, 4, "ok", Some(Uuid::new_v4()), now)
            .await;
        assert!(matches!(result, Err(RedemptionError::TokenInvalid)));

        // The matching path id still redeems
        fx.service
            .redeem(tokens[0].id, 4, "ok", Some(receiver.id), now)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn out_of_range_rating_leaves_no_partial_effects() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        let result = fx.service.redeem(tokens[0].id, 6, "!!", None, now).await;
        assert!(matches!(result, Err(RedemptionError::InvalidArgument(_))));

        // Token untouched, no feedback written
        let token = &fx.tokens.find(&TokenListFilters::default()).await.unwrap()[0];
        assert!(token.time_used.is_none());
        assert!(list_feedbacks(&fx, receiver.id).await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_redeems_commit_exactly_one_feedback() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();
        let token_id = tokens[0].id;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let service = fx.service.clone();
            handles.push(tokio::spawn(async move {
                service.redeem(token_id, 4, "race", None, now).await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(RedemptionError::TokenInvalid) => {}
                Err(other) => panic!("unexpected redemption failure: {other}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(list_feedbacks(&fx, receiver.id).await.len(), 1);
    }

    #[tokio::test]
    async fn probe_reports_missing_token_as_invalid() {
        let fx = fixture();
        assert!(!fx
            .service
            .check_token(Uuid::new_v4(), Utc::now())
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn probe_tracks_token_state() {
        let fx = fixture();
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        assert!(fx.service.check_token(tokens[0].id, now).await.unwrap());
        fx.service
            .redeem(tokens[0].id, 4, "ok", None, now)
            .await
            .unwrap();
        assert!(!fx.service.check_token(tokens[0].id, now).await.unwrap());
    }

    /// Feedback collection that fails every insert, for observing the
    /// partial-state behavior when the second write of the workflow fails.
    struct BrokenFeedbacks;

    #[async_trait]
    impl DocumentCollection<Feedback> for BrokenFeedbacks {
        async fn insert_one(&self, _: &Feedback) -> Result<(), StoreError> {
            Err(StoreError::Backend("insert refused".to_string()))
        }
        async fn insert_many(&self, _: &[Feedback]) -> Result<(), StoreError> {
            Err(StoreError::Backend("insert refused".to_string()))
        }
        async fn find(
            &self,
            _: &DocumentFilter,
            _: Option<i64>,
            _: Option<i64>,
        ) -> Result<Vec<Feedback>, StoreError> {
            Ok(vec![])
        }
        async fn delete_many(&self, _: &DocumentFilter) -> Result<u64, StoreError> {
            Ok(0)
        }
        async fn update_one(
            &self,
            _: &DocumentFilter,
            _: &'static str,
            _: FilterValue,
        ) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn failed_feedback_insert_leaves_the_token_consumed() {
        let fx = fixture_with_feedbacks(Arc::new(BrokenFeedbacks));
        let now = Utc::now();
        let receiver = seed_receiver(&fx).await;
        let tokens = fx.tokens.generate(1, receiver.id, None, now).await.unwrap();

        let result = fx.service.redeem(tokens[0].id, 4, "ok", None, now).await;
        assert!(matches!(
            result,
            Err(RedemptionError::Service(ServiceError::OperationFailed(_)))
        ));

        // Known partial state: the consume committed, the insert did not.
        let token = &fx.tokens.find(&TokenListFilters::default()).await.unwrap()[0];
        assert_eq!(token.time_used, Some(now));
    }
}
