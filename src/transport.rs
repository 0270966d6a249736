//! HTTP transport seam.
//!
//! Orchestrators are generic over [`Transport`] so the interpreter runs
//! against a scripted transport in tests and a reqwest client in the CLI.

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Descriptor methods arrive as free-form strings; anything unknown
    /// is treated as absent so the per-action default applies.
    pub fn parse(method: &str) -> Option<Method> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        write!(f, "{name}")
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> impl Future<Output = Result<serde_json::Value, Self::Error>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    #[error("invalid url {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("request failed. status: {code}, body: {body}")]
    Status {
        code: reqwest::StatusCode,
        body: String,
    },
}

/// Bearer-authenticated JSON client. Relative endpoint paths out of a
/// descriptor are resolved against the base URL.
#[derive(Clone)]
pub struct HttpTransport {
    base: Option<url::Url>,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base: Option<url::Url>, token: Option<String>) -> Self {
        Self {
            base,
            token,
            client: reqwest::Client::new(),
        }
    }

    fn resolve(&self, url: &str) -> Result<url::Url, Error> {
        let resolved = match &self.base {
            Some(base) => base.join(url),
            None => url.parse(),
        };
        resolved.map_err(|source| Error::InvalidUrl {
            url: url.to_owned(),
            source,
        })
    }
}

impl Transport for HttpTransport {
    type Error = Error;

    async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, Error> {
        let url = self.resolve(url)?;
        let mut request = self.client.request(method.into(), url);
        if !params.is_empty() {
            request = request.query(params);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(Error::Transport)?;
        let code = response.status();
        let text = response.text().await.map_err(Error::Transport)?;
        if !code.is_success() {
            return Err(Error::Status { code, body: text });
        }
        if text.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        let mut deserializer = serde_json::Deserializer::from_str(&text);
        match serde_json::Value::deserialize(&mut deserializer) {
            Ok(value) => Ok(value),
            // 2xx with a non-JSON body (e.g. a bare "ok") is treated as
            // an empty result rather than a failure.
            Err(_) => Ok(serde_json::Value::Null),
        }
    }
}
