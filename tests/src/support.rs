#![cfg(test)]
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use underlay_common::models::query::Query;
use underlay_common::models::row::{Field, ResultRow};
use underlay_core::http::FetchError;
use underlay_core::ports::{SearchIndex, WebClient, WebPage};
use underlay_core::search::SearchError;
use url::Url;

/*************************************************************
                     Web double
**************************************************************/

/// Canned pages keyed by normalised URL. Every other URL is unreachable.
#[derive(Default)]
pub struct StaticWeb {
    pages: HashMap<String, Vec<u8>>,
    fetched: Mutex<Vec<String>>,
}

impl StaticWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, body: impl AsRef<[u8]>) -> Self {
        let key = Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string());
        self.pages.insert(key, body.as_ref().to_vec());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebClient for StaticWeb {
    async fn get(&self, url: &Url) -> Result<WebPage, FetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(body) => Ok(WebPage {
                url: url.clone(),
                status: 200,
                body: body.clone(),
            }),
            None => Err(FetchError::Status(404)),
        }
    }

    async fn is_reachable(&self, url: &Url) -> bool {
        self.pages.contains_key(url.as_str())
    }
}

/*************************************************************
                     Index double
**************************************************************/

/// Returns the same rows for every discovery query and records the queries.
pub struct ScriptedIndex {
    rows: Vec<ResultRow>,
    seen: Mutex<Vec<Query>>,
}

impl ScriptedIndex {
    pub fn returning(rows: Vec<ResultRow>) -> Self {
        Self {
            rows,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<Query> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for ScriptedIndex {
    async fn search(&self, query: &Query, fields: &[Field]) -> Result<Vec<ResultRow>, SearchError> {
        self.seen.lock().unwrap().push(query.clone());
        if fields == [Field::Title] {
            return Ok(Vec::new());
        }
        Ok(self.rows.clone())
    }
}
