use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use reqwest::{
    header::{HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT},
    Method,
};
use serde::de::DeserializeOwned;

#[cfg(feature = "tracing")]
use tracing::Instrument;

use crate::{
    errors::{DecodeError, Error, Result, TransportError, TransportErrorKind, ValidationError},
    http::{parse_api_error_parts, request_id_from_headers, HeaderList},
    photos::PhotosClient,
    telemetry::{HttpRequestMetrics, MetricsCallbacks, RequestContext, Telemetry},
    ACCEPT_VERSION_HEADER, API_VERSION, DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER,
};

#[derive(Clone, Debug, Default)]
pub struct Config {
    /// Override the API base URL (defaults to `https://api.unsplash.com`).
    pub base_url: Option<String>,
    /// Default access key; a request may carry its own.
    pub access_key: Option<String>,
    /// User-Agent override.
    pub client_header: Option<String>,
    pub http_client: Option<reqwest::Client>,
    /// Connect timeout. Unset leaves the transport default in place.
    pub connect_timeout: Option<Duration>,
    /// Overall request timeout. Unset leaves the transport default in place.
    pub timeout: Option<Duration>,
    /// Extra headers applied to all requests.
    pub default_headers: Option<HeaderList>,
    /// Optional metrics callbacks (HTTP latency and outcome).
    pub metrics: Option<MetricsCallbacks>,
}

/// Async Unsplash client. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    pub(crate) inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    base_url: reqwest::Url,
    pub(crate) access_key: Option<String>,
    client_header: String,
    http: reqwest::Client,
    request_timeout: Option<Duration>,
    default_headers: Option<HeaderList>,
    telemetry: Telemetry,
}

impl Client {
    pub fn new(cfg: Config) -> Result<Self> {
        let base = cfg
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base = base.trim_end_matches('/').to_string();
        let base_url = reqwest::Url::parse(&base)
            .map_err(|err| Error::Config(format!("invalid base url: {err}")))?;

        let http = match cfg.http_client {
            Some(client) => client,
            None => {
                let mut builder = reqwest::Client::builder();
                if let Some(connect_timeout) = cfg.connect_timeout {
                    builder = builder.connect_timeout(connect_timeout);
                }
                builder.build().map_err(|err| TransportError {
                    kind: TransportErrorKind::Connect,
                    message: "failed to build http client".to_string(),
                    source: Some(err),
                })?
            }
        };

        let client_header = cfg
            .client_header
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CLIENT_HEADER.to_string());

        Ok(Self {
            inner: Arc::new(ClientInner {
                base_url,
                access_key: cfg.access_key,
                client_header,
                http,
                request_timeout: cfg.timeout,
                default_headers: cfg.default_headers,
                telemetry: Telemetry::new(cfg.metrics),
            }),
        })
    }

    /// Random photo operations.
    pub fn photos(&self) -> PhotosClient {
        PhotosClient {
            inner: self.inner.clone(),
        }
    }
}

pub(crate) fn apply_header_list<B: HeaderTarget>(mut builder: B, headers: &HeaderList) -> Result<B> {
    for entry in headers.iter() {
        if !entry.is_valid() {
            continue;
        }
        let name = HeaderName::from_bytes(entry.key.trim().as_bytes())
            .map_err(|err| Error::Config(format!("invalid header name: {err}")))?;
        let val = HeaderValue::from_str(entry.value.trim())
            .map_err(|err| Error::Config(format!("invalid header value: {err}")))?;
        builder = builder.with_header(name, val);
    }
    Ok(builder)
}

/// `Authorization: Client-ID <key>`. The key is passed through untrimmed and
/// may be empty; only values that cannot be encoded are rejected.
pub(crate) fn client_id_header(access_key: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(&format!("Client-ID {access_key}")).map_err(|_| {
        Error::Validation(
            ValidationError::new("contains characters not allowed in a header")
                .with_field("access_key"),
        )
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Common surface of the async and blocking request builders.
pub(crate) trait HeaderTarget: Sized {
    fn with_header(self, name: HeaderName, value: HeaderValue) -> Self;
}

impl HeaderTarget for reqwest::RequestBuilder {
    fn with_header(self, name: HeaderName, value: HeaderValue) -> Self {
        self.header(name, value)
    }
}

#[cfg(feature = "blocking")]
impl HeaderTarget for reqwest::blocking::RequestBuilder {
    fn with_header(self, name: HeaderName, value: HeaderValue) -> Self {
        self.header(name, value)
    }
}

/// Standard headers every Unsplash call carries.
pub(crate) fn apply_standard_headers<B: HeaderTarget>(
    mut builder: B,
    access_key: &str,
    client_header: &str,
    defaults: Option<&HeaderList>,
) -> Result<B> {
    builder = builder.with_header(ACCEPT, HeaderValue::from_static("application/json"));
    builder = builder.with_header(
        HeaderName::from_static(ACCEPT_VERSION_HEADER),
        HeaderValue::from_static(API_VERSION),
    );
    let agent = HeaderValue::from_str(client_header)
        .map_err(|err| Error::Config(format!("invalid client header: {err}")))?;
    builder = builder.with_header(USER_AGENT, agent);
    builder = builder.with_header(AUTHORIZATION, client_id_header(access_key)?);
    if let Some(defaults) = defaults {
        builder = apply_header_list(builder, defaults)?;
    }
    Ok(builder)
}

pub(crate) fn join_url(base_url: &reqwest::Url, path: &str) -> Result<reqwest::Url> {
    base_url
        .join(path)
        .map_err(|err| Error::Config(format!("invalid path: {err}")))
}

/// Decode a 2xx body, keeping the raw text on failure.
pub(crate) fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice::<T>(bytes).map_err(|source| {
        Error::Decode(DecodeError {
            source,
            raw_body: Some(String::from_utf8_lossy(bytes).into_owned()),
        })
    })
}

impl ClientInner {
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        access_key: Option<&str>,
    ) -> Result<reqwest::RequestBuilder> {
        let url = join_url(&self.base_url, path)?;
        let key = access_key
            .or(self.access_key.as_deref())
            .unwrap_or_default();
        let builder = apply_standard_headers(
            self.http.request(method, url),
            key,
            &self.client_header,
            self.default_headers.as_ref(),
        )?;
        Ok(match self.request_timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        })
    }

    pub(crate) async fn execute_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        ctx: RequestContext,
    ) -> Result<T> {
        let resp = self.send(builder, ctx).await?;
        let bytes = resp.bytes().await.map_err(Error::from)?;
        decode_body(&bytes)
    }

    /// Send exactly once. Non-2xx responses become [`Error::Api`].
    async fn send(
        &self,
        builder: reqwest::RequestBuilder,
        ctx: RequestContext,
    ) -> Result<reqwest::Response> {
        let start = Instant::now();
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "randompic.http",
            method = %ctx.method,
            path = %ctx.path,
            query = ctx.query.as_deref().unwrap_or_default(),
        );
        let pending = builder.send();
        #[cfg(feature = "tracing")]
        let pending = pending.instrument(span);

        match pending.await {
            Ok(resp) => {
                let status = resp.status();
                let http_ctx = ctx.with_request_id(request_id_from_headers(resp.headers()));
                if status.is_success() {
                    if self.telemetry.http_enabled() {
                        self.telemetry.record_http(HttpRequestMetrics {
                            latency: start.elapsed(),
                            status: Some(status.as_u16()),
                            error: None,
                            context: http_ctx,
                        });
                    }
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        status = %status,
                        elapsed_ms = start.elapsed().as_millis() as u64,
                        "request completed"
                    );
                    return Ok(resp);
                }

                if self.telemetry.http_enabled() {
                    self.telemetry.record_http(HttpRequestMetrics {
                        latency: start.elapsed(),
                        status: Some(status.as_u16()),
                        error: Some(format!("http {}", status.as_u16())),
                        context: http_ctx,
                    });
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(status = %status, "request failed; returning error");
                let headers = resp.headers().clone();
                let body = resp.text().await.unwrap_or_default();
                Err(parse_api_error_parts(status, &headers, body))
            }
            Err(err) => {
                if self.telemetry.http_enabled() {
                    self.telemetry.record_http(HttpRequestMetrics {
                        latency: start.elapsed(),
                        status: None,
                        error: Some(err.to_string()),
                        context: ctx,
                    });
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "transport error");
                Err(err.into())
            }
        }
    }
}
