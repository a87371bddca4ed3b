// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Wire types for the data service search endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::entity::EntityRecord;

/// Facet overview for a result set: facet name to its value/count pairs.
pub type FacetSummary = BTreeMap<String, Vec<FacetValueCount>>;

/// One value of a facet together with the number of hits carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetValueCount {
    pub value: String,
    pub count: u64,
}

/// Response body of `GET /search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Total number of hits for the query, independent of the requested
    /// window.
    pub size: u64,
    /// Facet overview over the full result set.
    #[serde(default)]
    pub facets: FacetSummary,
    /// The requested window of result entities. Absent when the window
    /// starts beyond the last hit.
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
}
