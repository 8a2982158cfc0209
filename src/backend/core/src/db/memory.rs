//! In-process event collection.

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{CollectionError, EventCollection, FieldUpdate, Filter};
use crate::events::EventDocument;

/// Event documents held in insertion order behind a single lock.
///
/// The lock is held for one call only. Proximity results are sorted by
/// haversine distance from the query centre.
#[derive(Debug, Default)]
pub struct MemoryCollection {
    documents: RwLock<Vec<EventDocument>>,
}

impl MemoryCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents, soft-deleted ones included.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    /// Copy of every stored document.
    pub fn snapshot(&self) -> Vec<EventDocument> {
        self.documents.read().clone()
    }
}

#[async_trait]
impl EventCollection for MemoryCollection {
    async fn insert_one(&self, document: EventDocument) -> Result<(), CollectionError> {
        let mut documents = self.documents.write();
        if documents.iter().any(|existing| existing.key == document.key) {
            return Err(CollectionError::DuplicateKey(document.key.into_inner()));
        }
        documents.push(document);
        Ok(())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<EventDocument>, CollectionError> {
        let documents = self.documents.read();
        let found = match &filter.near {
            Some(near) => documents
                .iter()
                .filter(|document| filter.matches(document))
                .filter_map(|document| near.distance_to(&document.location).map(|d| (d, document)))
                .min_by(|a, b| a.0.total_cmp(&b.0))
                .map(|(_, document)| document.clone()),
            None => documents.iter().find(|document| filter.matches(document)).cloned(),
        };
        Ok(found)
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<EventDocument>, CollectionError> {
        let documents = self.documents.read();
        let matched = documents.iter().filter(|document| filter.matches(document));

        let Some(near) = &filter.near else {
            return Ok(matched.cloned().collect());
        };

        let mut ranked: Vec<(f64, &EventDocument)> = matched
            .filter_map(|document| near.distance_to(&document.location).map(|d| (d, document)))
            .collect();
        ranked.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(ranked.into_iter().map(|(_, document)| document.clone()).collect())
    }

    async fn update_one(
        &self,
        filter: &Filter,
        update: &FieldUpdate,
    ) -> Result<Option<EventDocument>, CollectionError> {
        let mut documents = self.documents.write();
        let Some(document) = documents.iter_mut().find(|document| filter.matches(document)) else {
            return Ok(None);
        };
        update.apply(document);
        Ok(Some(document.clone()))
    }

    async fn ping(&self) -> Result<(), CollectionError> {
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
