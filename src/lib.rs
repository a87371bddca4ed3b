// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Client library for the Arachne archaeological object catalog.
//!
//! Three layers build on each other: the [`models::query::Query`] value
//! object describes a faceted search and converts between its URL form and
//! the flat parameter form the data service accepts, the
//! [`services::entity::EntityClient`] binds the REST endpoints, and the
//! [`services::search::SearchService`] caches search results in fixed-size
//! chunks so paging through a result set stays cheap.

pub mod error;
pub mod models;
pub mod services;

pub use error::ClientError;
