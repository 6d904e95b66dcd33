//! AWX REST API client
//!
//! Thin HTTP layer over `/api/v2`: authentication, pagination, error bodies
//! and cancellation. The [`DirectoryClient`](invsync_directory::DirectoryClient)
//! implementation built on top of it lives in `directory.rs`.

use crate::api::{ApiErrorBody, Page};
use crate::config::{Auth, AwxConfig};
use crate::error::{AwxError, Result};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::debug;

const API_PREFIX: &str = "/api/v2";

/// Page size requested from list endpoints
const PAGE_SIZE: &str = "200";

/// AWX / Ansible Tower API client
pub struct AwxClient {
    http: reqwest::Client,
    base_url: String,
    auth: Auth,
}

impl AwxClient {
    pub fn new(config: AwxConfig) -> Result<Self> {
        let base_url = config.normalized_base_url()?;
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(config.request_timeout)
            .user_agent(concat!("invsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            auth: config.auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL of an API path such as `/hosts/3/`
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    /// Resolve a `next` link, which AWX returns relative to the host
    fn resolve_link(&self, link: &str) -> String {
        if link.starts_with("http://") || link.starts_with("https://") {
            link.to_string()
        } else {
            format!("{}{}", self.base_url, link)
        }
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.auth {
            Auth::Token(token) => builder.bearer_auth(token),
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
        }
    }

    /// Send a request, racing it against `cancel`, and turn non-2xx
    /// responses into [`AwxError::Api`]
    async fn send(&self, builder: RequestBuilder, cancel: &CancellationToken) -> Result<Response> {
        let response =
            cancellable(cancel, async { builder.send().await.map_err(AwxError::from) }).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = match cancellable(cancel, async {
            response.text().await.map_err(AwxError::from)
        })
        .await
        {
            Ok(text) => text,
            Err(AwxError::Cancelled) => return Err(AwxError::Cancelled),
            Err(_) => String::new(),
        };
        Err(api_error(status, &text))
    }

    async fn decode<T: DeserializeOwned>(response: Response, cancel: &CancellationToken) -> Result<T> {
        let bytes =
            cancellable(cancel, async { response.bytes().await.map_err(AwxError::from) }).await?;
        serde_json::from_slice(&bytes).map_err(|e| AwxError::Decode(e.to_string()))
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "GET");
        let response = self.send(self.request(Method::GET, &url), cancel).await?;
        Self::decode(response, cancel).await
    }

    /// Fetch every page of a list endpoint
    pub(crate) async fn list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancellationToken,
    ) -> Result<Vec<T>> {
        let url = self.url(path);
        debug!(%url, ?query, "GET (list)");

        let first = self
            .request(Method::GET, &url)
            .query(query)
            .query(&[("page_size", PAGE_SIZE)]);
        let response = self.send(first, cancel).await?;
        let mut page: Page<T> = Self::decode(response, cancel).await?;
        let mut items = std::mem::take(&mut page.results);

        while let Some(next) = page.next.take() {
            let next = self.resolve_link(&next);
            debug!(url = %next, "GET (next page)");
            let response = self.send(self.request(Method::GET, &next), cancel).await?;
            page = Self::decode(response, cancel).await?;
            items.append(&mut page.results);
        }

        Ok(items)
    }

    pub(crate) async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "POST");
        let response = self
            .send(self.request(Method::POST, &url).json(body), cancel)
            .await?;
        Self::decode(response, cancel).await
    }

    /// POST where the response body is not needed (e.g. 204 No Content)
    pub(crate) async fn post_unit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let url = self.url(path);
        debug!(%url, "POST");
        self.send(self.request(Method::POST, &url).json(body), cancel)
            .await?;
        Ok(())
    }

    pub(crate) async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "PATCH");
        let response = self
            .send(self.request(Method::PATCH, &url).json(body), cancel)
            .await?;
        Self::decode(response, cancel).await
    }

    /// DELETE; a resource that is already gone counts as deleted
    pub(crate) async fn delete(&self, path: &str, cancel: &CancellationToken) -> Result<()> {
        let url = self.url(path);
        debug!(%url, "DELETE");
        match self.send(self.request(Method::DELETE, &url), cancel).await {
            Ok(_) => Ok(()),
            Err(AwxError::Api { status: 404, .. }) => {
                debug!(%url, "already deleted");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AwxError::Cancelled),
        result = fut => result,
    }
}

fn api_error(status: StatusCode, body: &str) -> AwxError {
    let message = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message(),
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().chars().take(200).collect(),
    };
    AwxError::Api {
        status: status.as_u16(),
        message,
    }
}
