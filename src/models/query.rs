// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 The Arachne Project

//! Search query value object.
//!
//! A [`Query`] captures one faceted catalog search. It converts between two
//! representations: the GET-parameter string carried in frontend URLs and
//! the flat parameter form ([`FlatQuery`]) the data service accepts. All
//! transformation methods return a new value and leave the receiver
//! untouched, so a query can be shared between a view and the result cache
//! without either seeing the other's edits.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::warn;
use url::form_urlencoded;

/// Page size a query starts out with.
pub const DEFAULT_LIMIT: u64 = 50;

/// Parameter keys that map to typed fields instead of the extras map.
const FIELD_PARAMS: [&str; 9] = [
    "q",
    "sort",
    "desc",
    "restrict",
    "catalogIds",
    "fl",
    "offset",
    "limit",
    "resultIndex",
];

/// A single facet filter. Facets are AND-ed onto the search as
/// `key:"value"` clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facet {
    pub key: String,
    pub value: String,
}

impl Facet {
    /// Wire form of the filter, `key:"value"`, as sent in `fq` parameters.
    pub fn filter_string(&self) -> String {
        format!("{}:\"{}\"", self.key, self.value)
    }
}

/// Value of a free-form query parameter: a single scalar or a repeated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Single(String),
    Many(Vec<String>),
}

impl ParamValue {
    /// The value as a scalar; repeated keys collapse to their first element.
    fn scalar(&self) -> &str {
        match self {
            ParamValue::Single(value) => value,
            ParamValue::Many(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Many(values)
    }
}

/// An immutable faceted search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    q: Option<String>,
    facets: Vec<Facet>,
    offset: u64,
    limit: u64,
    sort: Option<String>,
    desc: Option<String>,
    restrict: Option<String>,
    catalog_ids: Option<String>,
    fl: Option<String>,
    result_index: Option<u64>,
    extra: BTreeMap<String, ParamValue>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            q: None,
            facets: Vec::new(),
            offset: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
            desc: None,
            restrict: None,
            catalog_ids: None,
            fl: None,
            result_index: None,
            extra: BTreeMap::new(),
        }
    }
}

impl Query {
    /// A query with no term, no facets and default paging.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from decoded URL search parameters.
    ///
    /// The inverse of [`Query::to_url_string`] for everything that method
    /// emits. `fq` pairs become facets; repeated unknown keys accumulate
    /// into one multi-valued parameter.
    pub fn from_search<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut query = Query::default();
        for (key, value) in pairs {
            let (key, value) = (key.as_ref(), value.as_ref());
            if key == "fq" {
                if let Some(facet) = parse_facet_param(value) {
                    query.facets.push(facet);
                }
            } else if FIELD_PARAMS.contains(&key) {
                query.apply_field(key, value);
            } else {
                query.push_extra(key, value);
            }
        }
        query
    }

    /// Build a query from a raw URL query string, with or without the
    /// leading `?`.
    pub fn from_query_string(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        Self::from_search(form_urlencoded::parse(raw.as_bytes()))
    }

    pub fn q(&self) -> Option<&str> {
        self.q.as_deref()
    }

    pub fn facets(&self) -> &[Facet] {
        &self.facets
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn desc(&self) -> Option<&str> {
        self.desc.as_deref()
    }

    pub fn restrict(&self) -> Option<&str> {
        self.restrict.as_deref()
    }

    pub fn catalog_ids(&self) -> Option<&str> {
        self.catalog_ids.as_deref()
    }

    pub fn fl(&self) -> Option<&str> {
        self.fl.as_deref()
    }

    pub fn result_index(&self) -> Option<u64> {
        self.result_index
    }

    /// New query with `key` set to `value`.
    ///
    /// Typed keys (`q`, `sort`, `desc`, `restrict`, `catalogIds`, `fl`,
    /// `offset`, `limit`, `resultIndex`) update their field; any other key
    /// lands in the free-form extras. A non-numeric value for a numeric key
    /// is ignored with a warning.
    pub fn set_param(&self, key: &str, value: impl Into<ParamValue>) -> Self {
        let value = value.into();
        let mut next = self.clone();
        if FIELD_PARAMS.contains(&key) {
            next.apply_field(key, value.scalar());
        } else {
            next.extra.insert(key.to_string(), value);
        }
        next
    }

    /// New query with `key` removed. Removing `offset` or `limit` restores
    /// their defaults.
    pub fn remove_param(&self, key: &str) -> Self {
        let mut next = self.clone();
        match key {
            "q" => next.q = None,
            "sort" => next.sort = None,
            "desc" => next.desc = None,
            "restrict" => next.restrict = None,
            "catalogIds" => next.catalog_ids = None,
            "fl" => next.fl = None,
            "offset" => next.offset = 0,
            "limit" => next.limit = DEFAULT_LIMIT,
            "resultIndex" => next.result_index = None,
            _ => {
                next.extra.remove(key);
            }
        }
        next
    }

    /// New query with every listed key removed.
    pub fn remove_params(&self, keys: &[&str]) -> Self {
        keys.iter().fold(self.clone(), |query, key| query.remove_param(key))
    }

    /// Copy of a parameter's value, normalized to a vector: empty when the
    /// parameter is absent, one element for scalars. Mutating the returned
    /// vector never affects the query.
    pub fn get_array_param(&self, key: &str) -> Vec<String> {
        match key {
            "q" | "sort" | "desc" | "restrict" | "catalogIds" | "fl" => self
                .scalar_field(key)
                .map(|value| vec![value.to_string()])
                .unwrap_or_default(),
            "offset" => vec![self.offset.to_string()],
            "limit" => vec![self.limit.to_string()],
            "resultIndex" => self
                .result_index
                .map(|value| vec![value.to_string()])
                .unwrap_or_default(),
            _ => match self.extra.get(key) {
                Some(ParamValue::Single(value)) => vec![value.clone()],
                Some(ParamValue::Many(values)) => values.clone(),
                None => Vec::new(),
            },
        }
    }

    /// New query with an additional facet filter. Duplicate keys are
    /// allowed; each one narrows the result set further.
    pub fn add_facet(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.facets.push(Facet {
            key: key.into(),
            value: value.into(),
        });
        next
    }

    /// New query with every facet named `key` removed.
    pub fn remove_facet(&self, key: &str) -> Self {
        let mut next = self.clone();
        next.facets.retain(|facet| facet.key != key);
        next
    }

    pub fn has_facet(&self, key: &str) -> bool {
        self.facets.iter().any(|facet| facet.key == key)
    }

    pub fn has_facets(&self) -> bool {
        !self.facets.is_empty()
    }

    /// GET-parameter representation for frontend URLs, `?`-prefixed, or the
    /// empty string when nothing would be serialized.
    ///
    /// Facets are rendered as `fq=key:"value"` pairs. `limit` never appears
    /// here; empty scalars and a zero `offset` are skipped, but a present
    /// `resultIndex` is kept even at 0 so jump-to-result state survives a
    /// reload.
    pub fn to_url_string(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if let Some(q) = &self.q {
            if !q.is_empty() {
                pairs.push(("q", q.clone()));
            }
        }
        for facet in &self.facets {
            pairs.push(("fq", facet.filter_string()));
        }
        for key in ["restrict", "catalogIds", "sort", "desc", "fl"] {
            if let Some(value) = self.scalar_field(key) {
                if !value.is_empty() {
                    pairs.push((key, value.to_string()));
                }
            }
        }
        if let Some(result_index) = self.result_index {
            pairs.push(("resultIndex", result_index.to_string()));
        }
        if self.offset != 0 {
            pairs.push(("offset", self.offset.to_string()));
        }
        for (key, value) in &self.extra {
            match value {
                ParamValue::Single(value) if !value.is_empty() => {
                    pairs.push((key, value.clone()));
                }
                ParamValue::Single(_) => {}
                ParamValue::Many(values) => {
                    for value in values {
                        pairs.push((key, value.clone()));
                    }
                }
            }
        }
        if pairs.is_empty() {
            return String::new();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &pairs {
            serializer.append_pair(key, value);
        }
        format!("?{}", serializer.finish())
    }

    /// Backend-request form of the query.
    ///
    /// Facets and the restriction clauses collapse into `q`/`fq`; paging
    /// `offset` is left out since the result cache pages in its own chunks.
    pub fn to_flat(&self) -> FlatQuery {
        let mut clauses: Vec<String> = Vec::new();
        if let Some(q) = &self.q {
            if !q.is_empty() {
                // plain text search never matches place records
                clauses.push(format!("{q} AND NOT facet_category:Places"));
            }
        }
        if let Some(restrict) = &self.restrict {
            clauses.push(format!("_exists_:{restrict}"));
        }
        if let Some(catalog_ids) = &self.catalog_ids {
            clauses.push(format!("catalogIds:{catalog_ids}"));
        }
        FlatQuery {
            q: clauses.join(" AND "),
            fq: self.facets.iter().map(Facet::filter_string).collect(),
            fl: self.fl.clone(),
            limit: self.limit,
            sort: self.sort.clone(),
            desc: self.desc.clone(),
        }
    }

    fn scalar_field(&self, key: &str) -> Option<&str> {
        match key {
            "q" => self.q.as_deref(),
            "sort" => self.sort.as_deref(),
            "desc" => self.desc.as_deref(),
            "restrict" => self.restrict.as_deref(),
            "catalogIds" => self.catalog_ids.as_deref(),
            "fl" => self.fl.as_deref(),
            _ => None,
        }
    }

    fn apply_field(&mut self, key: &str, raw: &str) {
        match key {
            "q" => self.q = Some(raw.to_string()),
            "sort" => self.sort = Some(raw.to_string()),
            "desc" => self.desc = Some(raw.to_string()),
            "restrict" => self.restrict = Some(raw.to_string()),
            "catalogIds" => self.catalog_ids = Some(raw.to_string()),
            "fl" => self.fl = Some(raw.to_string()),
            "offset" => {
                if let Some(value) = parse_count(key, raw) {
                    self.offset = value;
                }
            }
            "limit" => {
                if let Some(value) = parse_count(key, raw) {
                    self.limit = value;
                }
            }
            "resultIndex" => {
                if let Some(value) = parse_count(key, raw) {
                    self.result_index = Some(value);
                }
            }
            _ => {}
        }
    }

    fn push_extra(&mut self, key: &str, value: &str) {
        match self.extra.entry(key.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(ParamValue::Single(value.to_string()));
            }
            Entry::Occupied(mut entry) => {
                let slot = entry.get_mut();
                match slot {
                    ParamValue::Single(first) => {
                        let first = std::mem::take(first);
                        *slot = ParamValue::Many(vec![first, value.to_string()]);
                    }
                    ParamValue::Many(values) => values.push(value.to_string()),
                }
            }
        }
    }
}

/// The query as the data service sees it.
///
/// This is also the cache key for search results: two queries whose flat
/// forms are equal share one result set, which is why paging state is not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatQuery {
    /// Combined text clause: term, `_exists_:` restriction and catalog
    /// scope joined with ` AND `. Present on every request, possibly empty.
    pub q: String,
    /// One `key:"value"` filter per facet.
    pub fq: Vec<String>,
    pub fl: Option<String>,
    pub limit: u64,
    pub sort: Option<String>,
    pub desc: Option<String>,
}

impl FlatQuery {
    /// Request parameter pairs, without paging. The caller appends `offset`
    /// and its own `limit` for the window it wants.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("q", self.q.clone())];
        for fq in &self.fq {
            pairs.push(("fq", fq.clone()));
        }
        if let Some(fl) = &self.fl {
            pairs.push(("fl", fl.clone()));
        }
        if let Some(sort) = &self.sort {
            pairs.push(("sort", sort.clone()));
        }
        if let Some(desc) = &self.desc {
            pairs.push(("desc", desc.clone()));
        }
        pairs
    }
}

/// Parse one `fq` parameter, `key:"value"` with optional quotes. The key
/// ends at the first colon so facet values may contain colons themselves.
fn parse_facet_param(raw: &str) -> Option<Facet> {
    let Some((key, value)) = raw.split_once(':') else {
        warn!(value = raw, "dropping facet parameter without a key:value separator");
        return None;
    };
    let value = value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value);
    Some(Facet {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_count(key: &str, raw: &str) -> Option<u64> {
    match raw.parse::<u64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = raw, "ignoring non-numeric paging parameter");
            None
        }
    }
}
