use sqlx::PgPool;
use std::sync::Arc;

use crate::entities::{Feedback, FeedbackReceiver, Token};
use crate::services::{
    FeedbackReceiversService, FeedbacksService, RedemptionService, TokensService,
};
use crate::store::memory::MemoryCollection;
use crate::store::postgres::PgCollection;
use crate::store::DocumentCollection;

/// Shared handler state: one service per concern, all over the same store
/// backend.
#[derive(Clone)]
pub struct AppState {
    pub receivers: FeedbackReceiversService,
    pub tokens: TokensService,
    pub feedbacks: FeedbacksService,
    pub redemption: RedemptionService,
}

impl AppState {
    pub fn new(
        receivers_collection: Arc<dyn DocumentCollection<FeedbackReceiver>>,
        tokens_collection: Arc<dyn DocumentCollection<Token>>,
        feedbacks_collection: Arc<dyn DocumentCollection<Feedback>>,
    ) -> Self {
        let receivers = FeedbackReceiversService::new(receivers_collection);
        let tokens = TokensService::new(tokens_collection);
        let feedbacks = FeedbacksService::new(feedbacks_collection);
        let redemption =
            RedemptionService::new(tokens.clone(), receivers.clone(), feedbacks.clone());
        Self {
            receivers,
            tokens,
            feedbacks,
            redemption,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self::new(
            Arc::new(PgCollection::new(pool.clone())),
            Arc::new(PgCollection::new(pool.clone())),
            Arc::new(PgCollection::new(pool)),
        )
    }

    /// Ephemeral store; data is lost on shutdown. Used by the test suites
    /// and as a dev fallback when no database is configured.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryCollection::new()),
            Arc::new(MemoryCollection::new()),
            Arc::new(MemoryCollection::new()),
        )
    }
}
