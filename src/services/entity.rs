// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! REST binding for the data service's search, entity and news endpoints.

use std::env;
use std::sync::RwLock;

use reqwest::header::AUTHORIZATION;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::ClientError;
use crate::models::query::FlatQuery;
use crate::models::search::SearchResponse;
use crate::services::auth::{Credentials, User};

/// Base URL of the public catalog instance.
const DEFAULT_DATASERVICE_URL: &str = "https://arachne.dainst.org/data";

/// Fields the service accepts for the `sort` parameter.
const SORTABLE_FIELDS: [&str; 3] = ["entityId", "title", "subtitle"];

/// Configuration for the data service connection.
#[derive(Debug, Clone)]
pub struct DataserviceConfig {
    /// Base URL of the REST data service.
    pub base_url: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    /// Fields result sorting is allowed on.
    pub sortable_fields: Vec<String>,
}

impl Default for DataserviceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_DATASERVICE_URL.to_string(),
            user_agent: format!("arachne-client/{}", env!("CARGO_PKG_VERSION")),
            sortable_fields: SORTABLE_FIELDS.iter().map(|field| field.to_string()).collect(),
        }
    }
}

impl DataserviceConfig {
    /// Load connection settings from environment variables, falling back to
    /// the public catalog instance.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: env::var("ARACHNE_DATASERVICE_URL").unwrap_or(defaults.base_url),
            user_agent: env::var("ARACHNE_USER_AGENT").unwrap_or(defaults.user_agent),
            sortable_fields: defaults.sortable_fields,
        }
    }
}

/// HTTP client for the Arachne data service.
///
/// Credential state is explicit per client: after a successful [`login`]
/// every request carries the stored Basic token until
/// [`clear_credentials`] drops it.
///
/// [`login`]: EntityClient::login
/// [`clear_credentials`]: EntityClient::clear_credentials
pub struct EntityClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: RwLock<Option<Credentials>>,
}

impl EntityClient {
    /// Build a client from connection settings.
    pub fn new(config: &DataserviceConfig) -> Result<Self, ClientError> {
        // a trailing slash keeps joined routes under the base path
        let mut base = config.base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)?;
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self {
            http,
            base_url,
            credentials: RwLock::new(None),
        })
    }

    /// Run a search for the given window of the result set.
    ///
    /// `limit` is the window size of this request, not the query's own page
    /// size; the result cache always asks for full chunks.
    pub async fn search(
        &self,
        query: &FlatQuery,
        offset: u64,
        limit: u64,
    ) -> Result<SearchResponse, ClientError> {
        let mut url = self.base_url.join("search")?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query.to_pairs() {
                pairs.append_pair(key, &value);
            }
            pairs.append_pair("offset", &offset.to_string());
            pairs.append_pair("limit", &limit.to_string());
        }
        debug!(%url, "querying dataservice");
        let response = self.request(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch a full entity document by its identifier.
    ///
    /// The document schema belongs to the backend and is passed through as
    /// raw JSON.
    pub async fn get_entity(&self, entity_id: u64) -> Result<Value, ClientError> {
        let url = self.base_url.join(&format!("entity/{entity_id}"))?;
        let response = self.request(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetch the catalog news feed for a language.
    pub async fn get_news(&self, language: &str) -> Result<Value, ClientError> {
        let url = self.base_url.join(&format!("news/{language}"))?;
        let response = self.request(url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Validate credentials against the service root and keep them for all
    /// subsequent requests. Rejected credentials are not stored.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        let credentials = Credentials::new(username, password);
        self.http
            .get(self.base_url.clone())
            .header(AUTHORIZATION, credentials.authorization_header())
            .send()
            .await?
            .error_for_status()?;
        debug!(username, "dataservice login succeeded");
        let user = User {
            username: credentials.username().to_string(),
        };
        *self.credentials.write().expect("credential state poisoned") = Some(credentials);
        Ok(user)
    }

    /// Drop stored credentials; subsequent requests go out anonymous.
    pub fn clear_credentials(&self) {
        *self.credentials.write().expect("credential state poisoned") = None;
    }

    /// The user whose credentials are attached to requests, if any.
    pub fn current_user(&self) -> Option<User> {
        self.credentials
            .read()
            .expect("credential state poisoned")
            .as_ref()
            .map(|credentials| User {
                username: credentials.username().to_string(),
            })
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        let builder = self.http.get(url);
        match self
            .credentials
            .read()
            .expect("credential state poisoned")
            .as_ref()
        {
            Some(credentials) => builder.header(AUTHORIZATION, credentials.authorization_header()),
            None => builder,
        }
    }
}
