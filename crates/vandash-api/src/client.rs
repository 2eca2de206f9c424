// Dashboard backend HTTP client
//
// Wraps `reqwest::Client` with base-URL joining and error payload
// decoding. Endpoint methods (inverter, leds, sensors, files, app) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::{Error, preview};
use crate::transport::TransportConfig;

/// Raw HTTP client for the dashboard backend.
///
/// Cheap to clone: the underlying `reqwest::Client` is reference counted.
/// No caching and no retries happen at this layer.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `http://van.local:5000`). A path
    /// prefix is allowed when the backend sits behind a proxy.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build a full URL for a resource path such as `/leds/configure`.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON response.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Send a POST request with a JSON body.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Send a POST request without a body.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Send a POST request without a body, ignoring whatever comes back.
    pub(crate) async fn post_discard(&self, url: Url) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Error::from_response(status.as_u16(), &body))
    }

    /// Send a multipart POST request.
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        form: reqwest::multipart::Form,
    ) -> Result<T, Error> {
        debug!("POST (multipart) {}", url);
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Send a DELETE request with a JSON body.
    pub(crate) async fn delete<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_response(resp).await
    }

    /// Decode a response: JSON on 2xx, `Error::Server` otherwise.
    async fn parse_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;
        trace!(status = status.as_u16(), len = body.len(), "response received");

        if !status.is_success() {
            return Err(Error::from_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("http://van.local:5000/");
        assert_eq!(
            c.url("/leds/configure").unwrap().as_str(),
            "http://van.local:5000/leds/configure"
        );
    }

    #[test]
    fn url_keeps_base_prefix() {
        let c = client("http://van.local/api");
        assert_eq!(
            c.url("inverter/toggle").unwrap().as_str(),
            "http://van.local/api/inverter/toggle"
        );
    }
}
