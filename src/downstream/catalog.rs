//! Typed access to the catalog service's recommend endpoint.

use url::Url;

use crate::downstream::client::{DownstreamBody, DownstreamClient, DownstreamRequest};
use crate::downstream::error::DownstreamError;
use crate::trace::TraceContext;

/// Logical name of the recommend call, used as its span name.
pub const RECOMMEND_CALL: &str = "catalog.recommend";

const RECOMMEND_PATH: &str = "products/recommend";

#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: DownstreamClient,
    recommend_url: Url,
}

impl CatalogClient {
    /// `base_url` is the catalog service root, e.g. `http://localhost:8002`.
    pub fn new(client: DownstreamClient, base_url: &Url) -> Result<Self, url::ParseError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            client,
            recommend_url: base.join(RECOMMEND_PATH)?,
        })
    }

    pub fn recommend_url(&self) -> &Url {
        &self.recommend_url
    }

    pub async fn recommend(
        &self,
        category: &str,
        limit: usize,
        current: &TraceContext,
    ) -> Result<DownstreamBody, DownstreamError> {
        let request = DownstreamRequest::get(RECOMMEND_CALL, self.recommend_url.clone())
            .param("category", category)
            .param("limit", limit);
        self.client.call(request, current).await
    }
}
