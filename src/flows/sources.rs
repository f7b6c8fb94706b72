//! Source list: cached locally, revalidated against `GET /sources`.

use chrono::Utc;
use tracing::{info, warn};

use crate::api::{ApiError, Gateway, NewSource, RecordId, Source, SourceCreated};
use crate::store::{CacheEntry, RecordCache, SessionStore};

#[derive(Debug, Default)]
pub struct SourceDirectory {
    cache: RecordCache<Source>,
    loading: bool,
    error: Option<String>,
}

impl SourceDirectory {
    /// Seed from the last persisted list; it may be stale until refreshed
    pub fn from_store(store: &SessionStore) -> Self {
        Self {
            cache: RecordCache::from_confirmed(store.cached_sources()),
            loading: false,
            error: None,
        }
    }

    pub fn entries(&self) -> &[CacheEntry<Source>] {
        self.cache.entries()
    }

    pub fn sources(&self) -> impl Iterator<Item = &Source> {
        self.cache.records()
    }

    pub fn get(&self, index: usize) -> Option<&CacheEntry<Source>> {
        self.cache.get(index)
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Refetch; the server list replaces every confirmed entry
    pub async fn refresh(
        &mut self,
        gateway: &dyn Gateway,
        store: &mut SessionStore,
    ) -> Result<(), ApiError> {
        self.loading = true;
        self.error = None;
        let outcome = gateway.list_sources().await;
        self.loading = false;

        match outcome {
            Ok(sources) => {
                info!(count = sources.len(), "sources refreshed");
                self.cache.replace_with_server(sources);
                self.persist(store);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "failed to fetch sources");
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Optimistic create: the pending row shows at once, then is confirmed
    /// in place or dropped. A successful create is followed by a refetch.
    pub async fn create(
        &mut self,
        gateway: &dyn Gateway,
        store: &mut SessionStore,
        request: &NewSource,
    ) -> Result<SourceCreated, ApiError> {
        let placeholder = Source {
            id: RecordId::Text(String::new()),
            name: request.name.clone(),
            source_type: request.source_type.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        let ticket = self.cache.insert_pending(placeholder.clone());

        match gateway.create_source(request).await {
            Ok(created) => {
                info!(id = %created.id, name = %request.name, "source created");
                self.cache.confirm(
                    ticket,
                    Source {
                        id: created.id.clone(),
                        ..placeholder
                    },
                );
                self.persist(store);
                // The row is already confirmed; a failed refetch only shows a banner
                let _ = self.refresh(gateway, store).await;
                Ok(created)
            }
            Err(e) => {
                warn!(error = %e, name = %request.name, "source creation rejected");
                self.cache.reject(ticket);
                Err(e)
            }
        }
    }

    /// Delete by id, then refetch
    pub async fn delete(
        &mut self,
        gateway: &dyn Gateway,
        store: &mut SessionStore,
        id: &RecordId,
    ) -> Result<(), ApiError> {
        gateway.delete_source(id).await?;
        info!(%id, "source deleted");
        self.cache.remove(id);
        self.persist(store);
        let _ = self.refresh(gateway, store).await;
        Ok(())
    }

    fn persist(&self, store: &mut SessionStore) {
        if let Err(e) = store.cache_sources(&self.cache.confirmed()) {
            warn!(error = %e, "failed to cache sources");
        }
    }
}
