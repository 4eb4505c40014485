//! Insert a random Unsplash photo into a note editor.
//!
//! The crate has two layers: an HTTP client for `GET /photos/random`
//! ([`Client`], [`fetch_random_image`]) and a plugin shell
//! ([`RandomPicPlugin`]) that a host application drives through the
//! capability traits in [`host`].
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::result_large_err)]

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.unsplash.com";

/// Default User-Agent header value.
pub(crate) const DEFAULT_CLIENT_HEADER: &str = concat!("randompic/", env!("CARGO_PKG_VERSION"));

/// Header selecting the Unsplash API version.
pub const ACCEPT_VERSION_HEADER: &str = "accept-version";

/// API version requested on every call.
pub const API_VERSION: &str = "v1";

/// HTTP header carrying the upstream request id.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Path of the random photo endpoint.
pub(crate) const RANDOM_PHOTO_PATH: &str = "/photos/random";

mod client;
mod errors;
mod http;
mod photos;
mod settings;
mod telemetry;
mod types;

pub mod host;
pub mod plugin;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "blocking")]
mod blocking;

pub use client::{Client, Config};
pub use errors::{
    APIError, DecodeError, Error, Result, SettingsError, TransportError, TransportErrorKind,
    ValidationError,
};
pub use host::{Command, CommandRegistry, Editor, Notifier, SettingsPanel, TextSetting};
pub use http::{HeaderEntry, HeaderList};
pub use photos::{fetch_random_image, PhotosClient, RandomPhotoRequest};
pub use plugin::{
    BoxFuture, ImageSource, InsertOutcome, RandomPicPlugin, COMMAND_INSERT_PICTURE,
    COMMAND_INSERT_PICTURE_NAME,
};
pub use settings::{
    JsonFileSettingsStore, MemorySettingsStore, SettingKey, Settings, SettingsStore,
    SETTINGS_FILE_NAME,
};
pub use telemetry::{HttpRequestMetrics, MetricsCallbacks, RequestContext};
pub use types::{FetchedImage, PhotoUrls, PhotoUser, RandomPhotoResponse, UserLinks};

#[cfg(feature = "blocking")]
pub use blocking::{BlockingClient, BlockingPhotosClient};
