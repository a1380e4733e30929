//! The authenticated session shared by every pipeline step.
//!
//! A session is created once per run (browser login, then an HTTP client that
//! carries the resulting cookies) and passed explicitly into discovery, fetching
//! and media download. The trait is the seam tests use to stand in for a wiki.

pub mod browser;
pub mod http;

use crate::error::SessionError;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

pub use browser::{Authenticator, SessionCookie};
pub use http::HttpSession;

/// Authenticated access to one wiki.js instance
#[async_trait]
pub trait WikiSession: Send + Sync {
    /// Scheme, host and port of the wiki
    fn base_url(&self) -> &Url;

    /// Run a GraphQL query against `<base>/graphql` and return the raw JSON body
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, SessionError>;

    /// GET a URL and return the body as text
    async fn get_text(&self, url: &Url) -> Result<String, SessionError>;

    /// GET a URL and return the body as bytes
    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, SessionError>;
}

/// Envelope of every GraphQL response
#[derive(Debug, Deserialize)]
pub struct GraphqlResponse<T> {
    pub data: Option<T>,

    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlErrorEntry {
    pub message: String,
}

impl<T: DeserializeOwned> GraphqlResponse<T> {
    /// Decode a raw response body
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    /// All error messages joined, if the server reported any
    pub fn error_message(&self) -> Option<String> {
        let errors = self.errors.as_ref().filter(|e| !e.is_empty())?;
        Some(
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory wiki: canned GraphQL answers keyed by a query fragment, and URL bodies
    pub struct FakeSession {
        pub base: Url,
        pub graphql_answers: Vec<(String, Option<i64>, Value)>,
        pub bodies: HashMap<String, Vec<u8>>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeSession {
        pub fn new(base: &str) -> Self {
            Self {
                base: Url::parse(base).unwrap(),
                graphql_answers: Vec::new(),
                bodies: HashMap::new(),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn with_graphql(mut self, fragment: &str, answer: Value) -> Self {
            self.graphql_answers
                .push((fragment.to_string(), None, answer));
            self
        }

        pub fn with_page(mut self, id: i64, answer: Value) -> Self {
            self.graphql_answers
                .push(("single".to_string(), Some(id), answer));
            self
        }

        pub fn with_body(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_string(), body.to_vec());
            self
        }

        pub fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }

        fn get(&self, url: &Url) -> Result<Vec<u8>, SessionError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.bodies
                .get(url.as_str())
                .cloned()
                .ok_or_else(|| SessionError::Status {
                    status: 404,
                    url: url.to_string(),
                })
        }
    }

    #[async_trait]
    impl WikiSession for FakeSession {
        fn base_url(&self) -> &Url {
            &self.base
        }

        async fn graphql(&self, query: &str, variables: Value) -> Result<Value, SessionError> {
            self.requests
                .lock()
                .unwrap()
                .push(format!("graphql {variables}"));
            let id = variables.get("id").and_then(Value::as_i64);
            self.graphql_answers
                .iter()
                .find(|(fragment, want_id, _)| {
                    query.contains(fragment.as_str()) && (want_id.is_none() || *want_id == id)
                })
                .map(|(_, _, answer)| answer.clone())
                .ok_or_else(|| SessionError::Status {
                    status: 400,
                    url: "graphql".to_string(),
                })
        }

        async fn get_text(&self, url: &Url) -> Result<String, SessionError> {
            let bytes = self.get(url)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }

        async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, SessionError> {
            self.get(url)
        }
    }
}
