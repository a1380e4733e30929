use crate::config::ScrapeConfig;
use crate::error::AuthError;
use crate::utils::xpath_literal;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::json;
use std::time::Duration;
use tokio::time::{Instant, sleep};

const CONNECT_ATTEMPTS: usize = 2;
const NAVIGATION_ATTEMPTS: usize = 2;
const ELEMENT_TIMEOUT: Duration = Duration::from_secs(15);
const LOGIN_TIMEOUT: Duration = Duration::from_secs(30);

const USERNAME_SELECTOR: &str =
    r#"input[type="text"], input#loginUsername, input[autocomplete="username"]"#;
const PASSWORD_SELECTOR: &str = r#"input[type="password"]"#;

/// A cookie collected from the browser after login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub name: String,
    pub value: String,
}

/// Logs in through the wiki's web login form with the LDAP strategy
pub struct Authenticator<'a> {
    config: &'a ScrapeConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(config: &'a ScrapeConfig) -> Self {
        Self { config }
    }

    /// Runs the login flow and returns the session cookies.
    ///
    /// The browser is closed before returning, whether the login succeeded or not.
    pub async fn login(&self) -> Result<Vec<SessionCookie>, AuthError> {
        let client = self.connect().await?;

        let result = self.login_flow(&client).await;

        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close browser session: {}", e);
        } else {
            ::log::debug!("Browser session closed");
        }

        result
    }

    /// Connects to the WebDriver instance, retrying once on failure
    async fn connect(&self) -> Result<Client, AuthError> {
        let url = &self.config.webdriver_url;
        let mut last_error = String::new();

        for attempt in 1..=CONNECT_ATTEMPTS {
            let mut builder = ClientBuilder::native();
            builder.capabilities(self.capabilities());
            match builder.connect(url).await {
                Ok(client) => {
                    ::log::debug!("Connected to WebDriver at {}", url);
                    return Ok(client);
                }
                Err(e) => {
                    ::log::warn!(
                        "WebDriver connection attempt {}/{} to {} failed: {}",
                        attempt,
                        CONNECT_ATTEMPTS,
                        url,
                        e
                    );
                    last_error = e.to_string();
                }
            }
            if attempt < CONNECT_ATTEMPTS {
                sleep(Duration::from_secs(1)).await;
            }
        }

        ::log::error!(
            "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
        );
        Err(AuthError::WebDriver {
            url: url.clone(),
            message: last_error,
        })
    }

    fn capabilities(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut caps = serde_json::Map::new();
        caps.insert(
            "acceptInsecureCerts".to_string(),
            json!(self.config.accept_invalid_certs),
        );
        if self.config.headless {
            caps.insert(
                "goog:chromeOptions".to_string(),
                json!({ "args": ["--headless=new", "--window-size=1280,900"] }),
            );
            caps.insert(
                "moz:firefoxOptions".to_string(),
                json!({ "args": ["-headless"] }),
            );
        }
        caps
    }

    async fn login_flow(&self, client: &Client) -> Result<Vec<SessionCookie>, AuthError> {
        let login_url = self.config.login_url.as_str();
        ::log::info!("Navigating to login page: {}", login_url);
        self.goto(client, login_url).await?;

        let strategy_xpath = format!(
            "//*[contains(normalize-space(text()), {})]",
            xpath_literal(&self.config.ldap_strategy_label)
        );
        self.wait_for(client, Locator::XPath(&strategy_xpath), &self.config.ldap_strategy_label)
            .await?
            .click()
            .await
            .map_err(browser_error)?;
        ::log::info!("Selected {} strategy", self.config.ldap_strategy_label);

        self.wait_for(client, Locator::Css(USERNAME_SELECTOR), USERNAME_SELECTOR)
            .await?
            .send_keys(&self.config.user)
            .await
            .map_err(browser_error)?;
        self.wait_for(client, Locator::Css(PASSWORD_SELECTOR), PASSWORD_SELECTOR)
            .await?
            .send_keys(&self.config.password)
            .await
            .map_err(browser_error)?;
        ::log::info!("Credentials entered for user={}", self.config.user);

        let submit_xpath = format!(
            "//button[contains(normalize-space(.), {})]",
            xpath_literal(&self.config.submit_label)
        );
        self.wait_for(client, Locator::XPath(&submit_xpath), &self.config.submit_label)
            .await?
            .click()
            .await
            .map_err(browser_error)?;

        let landed = self.wait_until_logged_in(client).await?;
        ::log::info!("Login successful, current URL: {}", landed);

        let cookies: Vec<SessionCookie> = client
            .get_all_cookies()
            .await
            .map_err(browser_error)?
            .iter()
            .map(|c| SessionCookie {
                name: c.name().to_string(),
                value: c.value().to_string(),
            })
            .collect();

        if cookies.is_empty() {
            return Err(AuthError::NoSession);
        }
        ::log::debug!("Collected {} cookies from the browser", cookies.len());
        Ok(cookies)
    }

    /// Navigates to a URL, retrying once on transient failure
    async fn goto(&self, client: &Client, url: &str) -> Result<(), AuthError> {
        let mut last_error = None;
        for attempt in 1..=NAVIGATION_ATTEMPTS {
            match client.goto(url).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    ::log::warn!(
                        "Navigation attempt {}/{} to {} failed: {}",
                        attempt,
                        NAVIGATION_ATTEMPTS,
                        url,
                        e
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.map_or_else(
            || AuthError::Browser(format!("could not open {url}")),
            browser_error,
        ))
    }

    async fn wait_for(
        &self,
        client: &Client,
        locator: Locator<'_>,
        description: &str,
    ) -> Result<fantoccini::elements::Element, AuthError> {
        client
            .wait()
            .at_most(ELEMENT_TIMEOUT)
            .for_element(locator)
            .await
            .map_err(|e| element_error(e, description))
    }

    /// Polls the current URL until the browser has left the login page
    async fn wait_until_logged_in(&self, client: &Client) -> Result<String, AuthError> {
        let deadline = Instant::now() + LOGIN_TIMEOUT;
        loop {
            let current = client.current_url().await.map_err(browser_error)?;
            if !is_login_url(current.as_str()) {
                return Ok(current.to_string());
            }
            if Instant::now() >= deadline {
                return Err(AuthError::Rejected(current.to_string()));
            }
            sleep(Duration::from_millis(500)).await;
        }
    }
}

fn browser_error(error: CmdError) -> AuthError {
    AuthError::Browser(error.to_string())
}

/// Maps a failed element lookup; a missing element names what was looked for
fn element_error(error: CmdError, what: &str) -> AuthError {
    match error {
        e if e.is_no_such_element() || matches!(e, CmdError::WaitTimeout) => {
            AuthError::SelectorNotFound(what.to_string())
        }
        other => browser_error(other),
    }
}

/// Whether the browser is still on the login page
fn is_login_url(url: &str) -> bool {
    url.contains("/login")
}
