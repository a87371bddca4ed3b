// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Error types shared by the dataservice client and the result cache.

use thiserror::Error;

/// Errors surfaced by the client library.
///
/// A failed backend call leaves the result cache untouched, so callers may
/// simply retry the lookup that produced the error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A result rank below 1 was requested. Ranks are 1-based and the
    /// request is rejected before any backend call is made.
    #[error("result rank {0} is invalid, ranks start at 1")]
    InvalidRank(u64),

    /// Transport failure, non-success status or undecodable body from the
    /// data service.
    #[error("dataservice request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The dataservice base URL or a route built from it could not be
    /// parsed.
    #[error("invalid dataservice URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}
