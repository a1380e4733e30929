use crate::error::SessionError;
use crate::session::{SessionCookie, WikiSession};
use async_trait::async_trait;
use reqwest::cookie::Jar;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// HTTP session that carries the cookies of a browser login
pub struct HttpSession {
    client: reqwest::Client,
    base_url: Url,
    graphql_url: Url,
}

impl HttpSession {
    /// Build a client whose cookie jar holds `cookies`, scoped to the wiki origin
    pub fn new(
        base_url: Url,
        cookies: &[SessionCookie],
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<Self, SessionError> {
        let jar = Arc::new(Jar::default());
        for cookie in cookies {
            jar.add_cookie_str(&format!("{}={}; Path=/", cookie.name, cookie.value), &base_url);
        }

        let client = reqwest::Client::builder()
            .cookie_provider(jar)
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()?;

        let graphql_url = base_url
            .join("graphql")
            .map_err(|_| SessionError::Url(base_url.to_string()))?;

        ::log::debug!(
            "HTTP session ready for {} with {} cookies",
            base_url,
            cookies.len()
        );

        Ok(Self {
            client,
            base_url,
            graphql_url,
        })
    }

    async fn get(&self, url: &Url) -> Result<reqwest::Response, SessionError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl WikiSession for HttpSession {
    fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, SessionError> {
        let body = json!({ "query": query, "variables": variables });

        let response = self
            .client
            .post(self.graphql_url.clone())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SessionError::Status {
                status: status.as_u16(),
                url: self.graphql_url.to_string(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| SessionError::Decode(e.to_string()))
    }

    async fn get_text(&self, url: &Url) -> Result<String, SessionError> {
        Ok(self.get(url).await?.text().await?)
    }

    async fn get_bytes(&self, url: &Url) -> Result<Vec<u8>, SessionError> {
        Ok(self.get(url).await?.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_endpoint_from_base() {
        let base = Url::parse("http://localhost:3000/").unwrap();
        let cookies = vec![SessionCookie {
            name: "jwt".to_string(),
            value: "token".to_string(),
        }];
        let session = HttpSession::new(base, &cookies, Duration::from_secs(5), false).unwrap();
        assert_eq!(session.graphql_url.as_str(), "http://localhost:3000/graphql");
        assert_eq!(session.base_url().as_str(), "http://localhost:3000/");
    }
}
