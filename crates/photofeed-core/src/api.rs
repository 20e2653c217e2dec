//! Request construction for the photo API
//!
//! Builds exactly the requests the caches issue:
//!
//! ```text
//! GET    {base}/photos?page={n}&per_page=10&order_by=latest
//! POST   {base}/photos/{id}/like
//! DELETE {base}/photos/{id}/like
//! GET    {base}/me
//! ```
//!
//! Every request carries `Authorization: Bearer {token}`.

use crate::error::{Error, Result};
use crate::traits::{HttpRequest, Method};
use url::Url;

/// Fixed number of photos per page
pub const PAGE_SIZE: u32 = 10;

/// Page ordering requested from the API
pub const ORDER_BY: &str = "latest";

/// Builder for API requests against one base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
}

impl Endpoints {
    /// Create endpoints for the given base URL
    ///
    /// Fails with [`Error::InvalidRequest`] if the URL cannot carry paths.
    pub fn new(base_url: &str) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::invalid_request(format!(
                "'{}' cannot be used as an API base URL",
                base_url
            )));
        }
        Ok(Self { base })
    }

    /// The base URL requests are built against
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `GET /photos` for one page
    pub fn photos_page(&self, page: u32, token: &str) -> Result<HttpRequest> {
        let mut url = self.url_for(&["photos"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("per_page", &PAGE_SIZE.to_string())
            .append_pair("order_by", ORDER_BY);

        Ok(authorized(Method::Get, url, token))
    }

    /// Like or unlike a photo
    ///
    /// `currently_liked` selects the direction: a liked photo is unliked with
    /// `DELETE`, anything else is liked with `POST`.
    pub fn toggle_like(&self, photo_id: &str, currently_liked: bool, token: &str) -> Result<HttpRequest> {
        if photo_id.is_empty() {
            return Err(Error::invalid_request("photo id cannot be empty"));
        }

        let url = self.url_for(&["photos", photo_id, "like"])?;
        let method = if currently_liked { Method::Delete } else { Method::Post };

        Ok(authorized(method, url, token))
    }

    /// `GET /me`
    pub fn profile(&self, token: &str) -> Result<HttpRequest> {
        let url = self.url_for(&["me"])?;
        Ok(authorized(Method::Get, url, token))
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| Error::invalid_request(format!("'{}' cannot carry a path", self.base)))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

fn authorized(method: Method, url: Url, token: &str) -> HttpRequest {
    HttpRequest::new(method, url.as_str()).with_header("Authorization", format!("Bearer {}", token))
}
