use serde::{Deserialize, Serialize};

/// Subset of the `GET /photos/random` payload the plugin reads.
///
/// Everything else in the response is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RandomPhotoResponse {
    pub urls: PhotoUrls,
    pub user: PhotoUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoUrls {
    pub full: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhotoUser {
    pub username: String,
    pub links: UserLinks,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserLinks {
    /// Public profile page of the photographer.
    pub html: String,
}

/// Result of one successful random-photo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub url: String,
    pub author_name: String,
    pub author_profile_url: String,
}

impl FetchedImage {
    /// Markdown image link with attribution, as inserted into the note.
    pub fn markdown(&self) -> String {
        format!(
            "![Photo by {}({})]({})",
            self.author_name, self.author_profile_url, self.url
        )
    }
}

impl From<RandomPhotoResponse> for FetchedImage {
    fn from(resp: RandomPhotoResponse) -> Self {
        Self {
            url: resp.urls.full,
            author_name: resp.user.username,
            author_profile_url: resp.user.links.html,
        }
    }
}
