// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Chunked result cache over the data service search endpoint.
//!
//! Search results are fetched in fixed-size chunks and memoized for the
//! lifetime of a session, so scrolling a result list or stepping through
//! neighboring records does not refetch what is already known. Backend
//! fetches are strictly serialized; concurrent lookups into the same
//! missing chunk coalesce into a single request.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::error::ClientError;
use crate::models::entity::EntityRecord;
use crate::models::query::Query;
use crate::models::search::{FacetSummary, SearchResponse};
use crate::services::entity::EntityClient;

/// Number of entities fetched and cached per backend call.
pub const CHUNK_SIZE: u64 = 50;

/// Per-session search result cache.
///
/// Holds the active [`Query`] and a sparse store of fetched entities keyed
/// by result index. Replacing the query keeps the store as long as the
/// backend-effective form of the query is unchanged, so paging moves are
/// free while a new term, facet or sort starts a fresh result set.
pub struct SearchService {
    client: Arc<EntityClient>,
    /// Single-slot fetch queue; held across the backend call so at most one
    /// search request is in flight and waiters complete in arrival order.
    fetch_slot: tokio::sync::Mutex<()>,
    state: Mutex<SessionState>,
}

struct SessionState {
    query: Query,
    store: ResultStore,
    /// Bumped on every invalidation so an in-flight fetch cannot write
    /// entities of a replaced query into the fresh store.
    generation: u64,
}

#[derive(Default)]
struct ResultStore {
    entities: BTreeMap<u64, EntityRecord>,
    size: Option<u64>,
    facets: Option<FacetSummary>,
}

impl ResultStore {
    /// The cached chunk starting at `offset`, if it is resident.
    fn chunk_at(&self, offset: u64) -> Option<Vec<EntityRecord>> {
        if !self.entities.contains_key(&offset) {
            return None;
        }
        Some(
            self.entities
                .range(offset..offset + CHUNK_SIZE)
                .map(|(_, entity)| entity.clone())
                .collect(),
        )
    }
}

impl SearchService {
    /// Create a cache for one search session.
    pub fn new(client: Arc<EntityClient>, query: Query) -> Self {
        Self {
            client,
            fetch_slot: tokio::sync::Mutex::new(()),
            state: Mutex::new(SessionState {
                query,
                store: ResultStore::default(),
                generation: 0,
            }),
        }
    }

    /// The active query.
    pub fn current_query(&self) -> Query {
        self.state().query.clone()
    }

    /// Replace the active query.
    ///
    /// The cached result set survives when the backend-effective form of
    /// the query is unchanged; otherwise the store is reset and the next
    /// lookup fetches fresh results.
    pub fn update_query(&self, next: Query) {
        let mut state = self.state();
        if next.to_flat() != state.query.to_flat() {
            debug!("effective query changed, resetting result cache");
            state.store = ResultStore::default();
            state.generation += 1;
        }
        state.query = next;
    }

    /// Total hit count reported by the last successful fetch, if any.
    pub fn get_size(&self) -> Option<u64> {
        self.state().store.size
    }

    /// Facet overview reported by the last successful fetch, if any.
    pub fn get_facets(&self) -> Option<FacetSummary> {
        self.state().store.facets.clone()
    }

    /// The entity at the given 1-based result rank.
    ///
    /// Makes the containing chunk resident, then resolves to `None` when
    /// the rank lies beyond the end of the result set.
    pub async fn get_entity(&self, rank: u64) -> Result<Option<EntityRecord>, ClientError> {
        if rank < 1 {
            return Err(ClientError::InvalidRank(rank));
        }
        let offset = chunk_offset(rank);
        let chunk = self.ensure_chunk(offset).await?;
        Ok(chunk.get((rank - 1 - offset) as usize).cloned())
    }

    /// The chunk of entities at the query's current offset.
    pub async fn get_current_page(&self) -> Result<Vec<EntityRecord>, ClientError> {
        let offset = self.state().query.offset();
        self.ensure_chunk(offset).await
    }

    /// Make the chunk starting at `offset` resident and return it.
    ///
    /// Every lookup passes through the fetch slot, so a cached read issued
    /// while a fetch is in flight completes only after that fetch, and no
    /// two backend calls overlap.
    async fn ensure_chunk(&self, offset: u64) -> Result<Vec<EntityRecord>, ClientError> {
        let _slot = self.fetch_slot.lock().await;

        let (flat, generation) = {
            let state = self.state();
            if let Some(chunk) = state.store.chunk_at(offset) {
                debug!(offset, "serving chunk from cache");
                return Ok(chunk);
            }
            (state.query.to_flat(), state.generation)
        };

        debug!(offset, limit = CHUNK_SIZE, "fetching result chunk");
        let SearchResponse {
            size,
            facets,
            entities,
        } = self.client.search(&flat, offset, CHUNK_SIZE).await?;

        let mut state = self.state();
        if state.generation == generation {
            state.store.size = Some(size);
            state.store.facets = Some(facets);
            for (index, entity) in entities.iter().enumerate() {
                state.store.entities.insert(offset + index as u64, entity.clone());
            }
        } else {
            debug!(offset, "query changed mid-fetch, discarding chunk for the old result set");
        }
        Ok(entities)
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().expect("session state poisoned")
    }
}

/// Start offset of the chunk containing a 1-based result rank.
fn chunk_offset(rank: u64) -> u64 {
    (rank - 1) / CHUNK_SIZE * CHUNK_SIZE
}
