//! Random photo endpoint.

use std::sync::Arc;

use reqwest::Method;

use crate::{
    client::{Client, ClientInner, Config},
    errors::Result,
    plugin::{BoxFuture, ImageSource},
    telemetry::RequestContext,
    types::{FetchedImage, RandomPhotoResponse},
    RANDOM_PHOTO_PATH,
};

/// Parameters for one `GET /photos/random` call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomPhotoRequest {
    /// Search term narrowing the selection. Empty is treated as absent.
    pub query: Option<String>,
    /// Overrides the client's configured access key for this call.
    pub access_key: Option<String>,
}

impl RandomPhotoRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// The query to send, if any.
    pub fn effective_query(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }
}

/// Client for the random photo endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use randompic::{Client, Config, RandomPhotoRequest};
///
/// let client = Client::new(Config {
///     access_key: Some("your-access-key".into()),
///     ..Default::default()
/// })?;
/// let image = client
///     .photos()
///     .random(RandomPhotoRequest::new().with_query("mountains"))
///     .await?;
/// println!("{}", image.markdown());
/// ```
#[derive(Clone)]
pub struct PhotosClient {
    pub(crate) inner: Arc<ClientInner>,
}

impl PhotosClient {
    /// Fetch one random photo. Exactly one request is made.
    pub async fn random(&self, req: RandomPhotoRequest) -> Result<FetchedImage> {
        let mut builder =
            self.inner
                .request(Method::GET, RANDOM_PHOTO_PATH, req.access_key.as_deref())?;
        if let Some(query) = req.effective_query() {
            builder = builder.query(&[("query", query)]);
        }
        let ctx = RequestContext::new(Method::GET.as_str(), RANDOM_PHOTO_PATH)
            .with_query(req.effective_query().map(str::to_string));
        let resp: RandomPhotoResponse = self.inner.execute_json(builder, ctx).await?;
        Ok(resp.into())
    }
}

impl ImageSource for Client {
    fn fetch_random<'a>(
        &'a self,
        access_key: &'a str,
        query: Option<&'a str>,
    ) -> BoxFuture<'a, Result<FetchedImage>> {
        let mut req = RandomPhotoRequest::new().with_access_key(access_key);
        req.query = query.map(str::to_string);
        Box::pin(async move { self.photos().random(req).await })
    }
}

/// One-shot fetch with a default client.
///
/// Prefer a shared [`Client`] when making more than one call.
pub async fn fetch_random_image(access_key: &str, query: Option<&str>) -> Result<FetchedImage> {
    let client = Client::new(Config {
        access_key: Some(access_key.to_string()),
        ..Default::default()
    })?;
    let mut req = RandomPhotoRequest::new();
    req.query = query.map(str::to_string);
    client.photos().random(req).await
}
