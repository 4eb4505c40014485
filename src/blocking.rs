use std::{sync::Arc, time::Instant};

use reqwest::{
    blocking::{Client as HttpClient, RequestBuilder, Response},
    Method, Url,
};

use crate::{
    client::{apply_standard_headers, decode_body, join_url, Config},
    errors::{Error, Result, TransportError, TransportErrorKind},
    http::{parse_api_error_parts, request_id_from_headers, HeaderList},
    photos::RandomPhotoRequest,
    telemetry::{HttpRequestMetrics, RequestContext, Telemetry},
    types::{FetchedImage, RandomPhotoResponse},
    DEFAULT_BASE_URL, DEFAULT_CLIENT_HEADER, RANDOM_PHOTO_PATH,
};

/// Blocking counterpart of [`Client`](crate::Client) for hosts without an
/// async runtime. Takes the same [`Config`]; `http_client` is ignored since it
/// holds an async client.
#[derive(Clone)]
pub struct BlockingClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    base_url: Url,
    access_key: Option<String>,
    client_header: String,
    http: HttpClient,
    default_headers: Option<HeaderList>,
    telemetry: Telemetry,
}

impl BlockingClient {
    pub fn new(cfg: Config) -> Result<Self> {
        let base = cfg
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let base_url =
            Url::parse(&base).map_err(|err| Error::Config(format!("invalid base url: {err}")))?;

        let mut builder = HttpClient::builder();
        if let Some(connect_timeout) = cfg.connect_timeout {
            builder = builder.connect_timeout(connect_timeout);
        }
        // reqwest's blocking client applies a 30s default; unset means none here too.
        builder = builder.timeout(cfg.timeout);
        let http = builder.build().map_err(|err| TransportError {
            kind: TransportErrorKind::Connect,
            message: "failed to build http client".to_string(),
            source: Some(err),
        })?;

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
                default_headers: cfg.default_headers,
                telemetry: Telemetry::new(cfg.metrics),
            }),
        })
    }

    pub fn photos(&self) -> BlockingPhotosClient {
        BlockingPhotosClient {
            inner: self.inner.clone(),
        }
    }
}

#[derive(Clone)]
pub struct BlockingPhotosClient {
    inner: Arc<ClientInner>,
}

impl BlockingPhotosClient {
    /// Fetch one random photo. Exactly one request is made.
    pub fn random(&self, req: RandomPhotoRequest) -> Result<FetchedImage> {
        let mut builder =
            self.inner
                .request(Method::GET, RANDOM_PHOTO_PATH, req.access_key.as_deref())?;
        if let Some(query) = req.effective_query() {
            builder = builder.query(&[("query", query)]);
        }
        let ctx = RequestContext::new(Method::GET.as_str(), RANDOM_PHOTO_PATH)
            .with_query(req.effective_query().map(str::to_string));
        let resp = self.inner.send(builder, ctx)?;
        let bytes = resp.bytes().map_err(Error::from)?;
        let payload: RandomPhotoResponse = decode_body(&bytes)?;
        Ok(payload.into())
    }
}

impl ClientInner {
    fn request(&self, method: Method, path: &str, access_key: Option<&str>) -> Result<RequestBuilder> {
        let url = join_url(&self.base_url, path)?;
        let key = access_key
            .or(self.access_key.as_deref())
            .unwrap_or_default();
        apply_standard_headers(
            self.http.request(method, url),
            key,
            &self.client_header,
            self.default_headers.as_ref(),
        )
    }

    fn send(&self, builder: RequestBuilder, ctx: RequestContext) -> Result<Response> {
        let start = Instant::now();
        #[cfg(feature = "tracing")]
        let span = tracing::debug_span!(
            "randompic.http",
            method = %ctx.method,
            path = %ctx.path,
            blocking = true
        );
        #[cfg(feature = "tracing")]
        let _guard = span.enter();

        match builder.send() {
            Ok(resp) => {
                let status = resp.status();
                let http_ctx = ctx.with_request_id(request_id_from_headers(resp.headers()));
                if self.telemetry.http_enabled() {
                    self.telemetry.record_http(HttpRequestMetrics {
                        latency: start.elapsed(),
                        status: Some(status.as_u16()),
                        error: (!status.is_success()).then(|| format!("http {}", status.as_u16())),
                        context: http_ctx,
                    });
                }
                if status.is_success() {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(status = %status, "request completed");
                    return Ok(resp);
                }
                #[cfg(feature = "tracing")]
                tracing::warn!(status = %status, "request failed; returning error");
                let headers = resp.headers().clone();
                let body = resp.text().unwrap_or_default();
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
