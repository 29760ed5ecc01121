//! In-memory port implementations for unit tests.

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use underlay_common::models::query::Query;
use underlay_common::models::row::{Field, ResultRow};
use url::Url;

use crate::http::FetchError;
use crate::ports::{SearchIndex, WebClient, WebPage};
use crate::search::SearchError;

fn key(url: &str) -> String {
    Url::parse(url).map(|u| u.to_string()).unwrap_or_else(|_| url.to_string())
}

/// Serves canned pages; unknown URLs fail like an unreachable host.
#[derive(Default)]
pub struct FakeWeb {
    pages: HashMap<String, (u16, Vec<u8>)>,
    reachable: HashSet<String>,
    gets: AtomicUsize,
    probes: Mutex<Vec<String>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(self, url: &str, body: impl AsRef<[u8]>) -> Self {
        self.page_with_status(url, 200, body)
    }

    pub fn page_with_status(mut self, url: &str, status: u16, body: impl AsRef<[u8]>) -> Self {
        self.pages.insert(key(url), (status, body.as_ref().to_vec()));
        self
    }

    pub fn reachable(mut self, url: &str) -> Self {
        self.reachable.insert(key(url));
        self
    }

    pub fn get_count(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn probed(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebClient for FakeWeb {
    async fn get(&self, url: &Url) -> Result<WebPage, FetchError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let (status, body) = self
            .pages
            .get(url.as_str())
            .cloned()
            .ok_or(FetchError::Status(503))?;
        Ok(WebPage {
            url: url.clone(),
            status,
            body,
        })
    }

    async fn is_reachable(&self, url: &Url) -> bool {
        self.probes.lock().unwrap().push(url.to_string());
        self.reachable.contains(url.as_str())
    }
}

type Responder = Box<dyn Fn(&Query, &[Field]) -> Result<Vec<ResultRow>, SearchError> + Send + Sync>;

/// Answers queries through a closure and records what was asked.
pub struct FakeIndex {
    responder: Responder,
    queries: Mutex<Vec<(String, Vec<Field>)>>,
}

impl FakeIndex {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Query, &[Field]) -> Result<Vec<ResultRow>, SearchError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::new(|_, _| Ok(Vec::new()))
    }

    pub fn queries(&self) -> Vec<(String, Vec<Field>)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndex for FakeIndex {
    async fn search(&self, query: &Query, fields: &[Field]) -> Result<Vec<ResultRow>, SearchError> {
        self.queries
            .lock()
            .unwrap()
            .push((query.plain().to_string(), fields.to_vec()));
        (self.responder)(query, fields)
    }
}

/// Answers a single HTTP request on a loopback port with `status` and `body`.
///
/// The handle resolves to the raw request head that was received.
pub async fn serve_once(status: &'static str, body: &'static str) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&head).into_owned()
    });

    (addr, handle)
}
