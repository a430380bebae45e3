//! Relay protocol over HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use desu_core::error::{Error, ProtocolError, TransportError};
use desu_core::protocol::{ListQuery, MessageList, NewMessage, ServerInfo, StoredMessage, SubmitReceipt};
use desu_core::traits::Relay;
use desu_core::types::ServerUrl;
use desu_core::Result;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("desu/", env!("CARGO_PKG_VERSION"));

/// HTTP client with the desu user agent, shared by relays and the client.
pub(crate) fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(transport)
}

/// A remote relay reached over HTTP.
///
/// Requests are made once: there is no retry and no timeout beyond what
/// reqwest does by default.
#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: reqwest::Client,
    url: ServerUrl,
}

impl HttpRelay {
    /// Create a relay handle for `url` with its own HTTP client.
    pub fn new(url: ServerUrl) -> Result<Self> {
        Ok(Self::with_client(url, http_client()?))
    }

    /// Create a relay handle sharing an existing HTTP client.
    pub fn with_client(url: ServerUrl, client: reqwest::Client) -> Self {
        Self { client, url }
    }

    /// `GET /info` as raw JSON, for callers that repair malformed answers
    /// themselves instead of rejecting them.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_info(&self) -> Result<Value> {
        self.get("/info", None).await
    }

    async fn get<R: DeserializeOwned>(&self, path: &str, query: Option<&ListQuery>) -> Result<R> {
        let url = self.url.endpoint(path);
        debug!(%url, "GET");

        let mut request = self.client.get(&url);
        if let Some(query) = query {
            trace!(?query, "query parameters");
            request = request.query(query);
        }
        let response = request.send().await.map_err(transport)?;

        let response = expect_ok("GET", &url, response)?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_json(&content_type) {
            return Err(ProtocolError::NotJson {
                method: "GET",
                url,
                content_type,
            }
            .into());
        }

        decode("GET", &url, response).await
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url.endpoint(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(transport)?;

        let response = expect_ok("POST", &url, response)?;
        decode("POST", &url, response).await
    }
}

#[async_trait]
impl Relay for HttpRelay {
    fn url(&self) -> &ServerUrl {
        &self.url
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn info(&self) -> Result<ServerInfo> {
        self.get("/info", None).await
    }

    #[instrument(skip(self, message), fields(url = %self.url))]
    async fn post(&self, message: NewMessage) -> Result<SubmitReceipt> {
        self.post_json("/", &message).await
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn list(&self, query: &ListQuery) -> Result<Vec<StoredMessage>> {
        let list: MessageList = self.get("/", Some(query)).await?;
        Ok(list.messages)
    }
}

fn transport(e: reqwest::Error) -> Error {
    let error = if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connection {
            message: e.to_string(),
        }
    } else {
        TransportError::Http {
            message: e.to_string(),
        }
    };
    error.into()
}

fn expect_ok(method: &'static str, url: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    trace!(%status, "response");

    if status == StatusCode::OK {
        Ok(response)
    } else {
        Err(ProtocolError::UnexpectedStatus {
            method,
            url: url.to_string(),
            status: status.as_u16(),
        }
        .into())
    }
}

async fn decode<R: DeserializeOwned>(
    method: &'static str,
    url: &str,
    response: reqwest::Response,
) -> Result<R> {
    let bytes = response.bytes().await.map_err(transport)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ProtocolError::Decode {
            method,
            url: url.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// `application/json`, with or without parameters such as a charset.
fn is_json(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
}
