// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Catalog entity records as they appear in search results.

use serde::{Deserialize, Serialize};

/// One catalog record in a search result window.
///
/// Search results carry this compact projection; the full schema-less
/// document behind it is fetched separately by entity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRecord {
    /// Stable numeric identifier of the record.
    pub entity_id: u64,
    /// Record category, e.g. object, building or topography.
    #[serde(default, rename = "type")]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Image used for the result thumbnail, when the record has one.
    #[serde(default)]
    pub thumbnail_id: Option<u64>,
}
