use std::sync::Arc;
use uuid::Uuid;

use super::ServiceError;
use crate::entities::FeedbackReceiver;
use crate::filter::DocumentFilter;
use crate::store::DocumentCollection;

/// Persistence facade for FeedbackReceiver items.
#[derive(Clone)]
pub struct FeedbackReceiversService {
    collection: Arc<dyn DocumentCollection<FeedbackReceiver>>,
}

impl FeedbackReceiversService {
    pub fn new(collection: Arc<dyn DocumentCollection<FeedbackReceiver>>) -> Self {
        Self { collection }
    }

    pub async fn create_many(&self, items: Vec<FeedbackReceiver>) -> Result<(), ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::OperationFailed(
                "items must contain at least one element".to_string(),
            ));
        }
        self.collection.insert_many(&items).await?;
        Ok(())
    }

    pub async fn delete_many(&self, ids: &[Uuid]) -> Result<(), ServiceError> {
        self.collection
            .delete_many(&DocumentFilter::new().id_in("id", ids.to_vec()))
            .await?;
        Ok(())
    }

    /// Lists receivers. An empty id set is unconstrained; `offset`/`limit`
    /// apply skip/take on the store-default order.
    pub async fn find(
        &self,
        ids: &[Uuid],
        offset: Option<i64>,
        limit: Option<i64>,
    ) -> Result<Vec<FeedbackReceiver>, ServiceError> {
        let filter = if ids.is_empty() {
            DocumentFilter::new()
        } else {
            DocumentFilter::new().id_in("id", ids.to_vec())
        };
        Ok(self.collection.find(&filter, offset, limit).await?)
    }
}
