use std::sync::Arc;

use super::{FeedbackListFilters, ServiceError};
use crate::entities::{Feedback, FeedbackReceiver};
use crate::filter::DocumentFilter;
use crate::store::DocumentCollection;

/// Persistence facade for Feedback records.
#[derive(Clone)]
pub struct FeedbacksService {
    collection: Arc<dyn DocumentCollection<Feedback>>,
}

impl FeedbacksService {
    pub fn new(collection: Arc<dyn DocumentCollection<Feedback>>) -> Self {
        Self { collection }
    }

    /// Stamps the feedback with the receiver's id and inserts it.
    pub async fn add(
        &self,
        mut feedback: Feedback,
        receiver: &FeedbackReceiver,
    ) -> Result<Feedback, ServiceError> {
        feedback.feedback_receiver_id = receiver.id;
        self.collection.insert_one(&feedback).await?;
        Ok(feedback)
    }

    /// Lists feedbacks for one receiver, optionally bounded by created time.
    /// The receiver id is required; listing across all receivers is not a
    /// supported query.
    pub async fn list(&self, filters: &FeedbackListFilters) -> Result<Vec<Feedback>, ServiceError> {
        let receiver_id = filters.feedback_receiver_id.ok_or_else(|| {
            ServiceError::InvalidArgument("feedback_receiver_id filter is required".to_string())
        })?;

        let mut filter = DocumentFilter::new().eq("feedback_receiver_id", receiver_id);
        if let Some(after) = filters.created_after {
            filter = filter.gte("created_at", after);
        }
        if let Some(before) = filters.created_before {
            filter = filter.lte("created_at", before);
        }

        Ok(self.collection.find(&filter, None, None).await?)
    }
}
