// Legacy dashboard session client
//
// Cookie-based login against the HTML dashboard, page fetching for the
// status/users tables, and the per-node checkin graph image. This surface
// predates the signed API; it stays fail-fast (no retry) because a broken
// session cookie makes every subsequent fetch garbage anyway.

use bytes::Bytes;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Relative page paths on the dashboard host.
#[derive(Debug, Clone)]
pub struct DashboardPages {
    pub login: String,
    pub status: String,
    pub users: String,
    pub checkin_graph: String,
}

impl Default for DashboardPages {
    fn default() -> Self {
        Self {
            login: "/dashboard/login".into(),
            status: "/dashboard/network".into(),
            users: "/dashboard/users".into(),
            checkin_graph: "/checkin-graph".into(),
        }
    }
}

/// HTTP client for the legacy HTML dashboard.
///
/// One login call establishes the session cookie; page fetches reuse it
/// through the shared cookie jar.
pub struct SessionClient {
    http: reqwest::Client,
    base_url: Url,
    pages: DashboardPages,
}

impl SessionClient {
    /// Create a session client. A cookie jar is added to the transport
    /// automatically if the config doesn't already carry one.
    pub fn new(
        base_url: Url,
        pages: DashboardPages,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let config = if transport.cookie_jar.is_some() {
            transport.clone()
        } else {
            transport.clone().with_cookie_jar()
        };
        let http = config.build_client()?;
        Ok(Self {
            http,
            base_url,
            pages,
        })
    }

    /// Create a session client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, pages: DashboardPages) -> Self {
        Self {
            http,
            base_url,
            pages,
        }
    }

    fn page_url(&self, page: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(page)?)
    }

    /// Log in and establish the session cookie.
    pub async fn login(&self, account: &str, password: &SecretString) -> Result<(), Error> {
        let url = self.page_url(&self.pages.login)?;
        debug!("logging in at {}", url);

        let form = [
            ("account", account),
            ("password", password.expose_secret()),
            ("status", "View Status"),
        ];

        let resp = self
            .http
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        debug!("login successful");
        Ok(())
    }

    /// Fetch a dashboard page as raw HTML, failing on any non-2xx status.
    async fn get_page(&self, page: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        let url = self.page_url(page)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_owned();
            let body = resp.text().await.unwrap_or_default();
            error!("{} {} {}", status.as_u16(), reason, body);
            return Err(Error::Api {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        resp.text().await.map_err(Error::Transport)
    }

    /// Fetch the node status page for a network.
    pub async fn status_page(&self, network: &str) -> Result<String, Error> {
        self.get_page(
            &self.pages.status,
            &[("network", network), ("showall", "1"), ("details", "1")],
        )
        .await
    }

    /// Fetch the connected-users page for a network.
    pub async fn users_page(&self, network: &str) -> Result<String, Error> {
        self.get_page(&self.pages.users, &[("network", network)])
            .await
    }

    /// Fetch the rendered checkin-timeline image for one node MAC.
    pub async fn checkin_graph(&self, mac: &str) -> Result<Bytes, Error> {
        let url = self.page_url(&self.pages.checkin_graph)?;
        debug!("GET {} (mac={})", url, mac);

        let resp = self
            .http
            .get(url)
            .query(&[("legend", "0"), ("mac", mac)])
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("unknown").to_owned();
            let body = resp.text().await.unwrap_or_default();
            error!("{} {} {}", status.as_u16(), reason, body);
            return Err(Error::Api {
                status: status.as_u16(),
                reason,
                body,
            });
        }

        resp.bytes().await.map_err(Error::Transport)
    }
}
