//! Raw document retrieval with a single proxy fallback.
//!
//! The direct attempt uses a browser-like header set to reduce
//! bot-blocking false negatives. On any non-success status or transport
//! error the fetcher makes exactly one attempt through the rendering
//! proxy, if one is configured. Retries beyond that belong to the caller.

mod direct;
mod proxy;

pub use direct::DirectFetcher;
pub use proxy::ProxyFetcher;

use log::{debug, warn};

use crate::error::{FetchError, FetchErrorKind};
use crate::model::{FetchMethod, FetchResult};

pub struct Fetcher {
    direct: DirectFetcher,
    proxy: Option<ProxyFetcher>,
}

impl Fetcher {
    pub fn new(direct: DirectFetcher, proxy: Option<ProxyFetcher>) -> Self {
        Fetcher { direct, proxy }
    }

    /// Retrieve the HTML document behind `url`.
    ///
    /// When the direct attempt fails and no proxy is configured, the
    /// direct error is returned unchanged; with a proxy, a combined
    /// diagnostic covers both failures so the root cause stays visible.
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        validate_url(url)?;

        let direct_err = match self.direct.fetch(url).await {
            Ok(html) => {
                return Ok(FetchResult {
                    html,
                    method: FetchMethod::Direct,
                })
            }
            Err(e) => e,
        };

        let Some(proxy) = &self.proxy else {
            return Err(direct_err);
        };

        debug!(
            "direct fetch of {} failed ({}), trying rendering proxy",
            url, direct_err
        );

        match proxy.fetch(url).await {
            Ok(html) => Ok(FetchResult {
                html,
                method: FetchMethod::FallbackProxy,
            }),
            Err(proxy_err) => {
                warn!("both fetch strategies failed for {}", url);
                Err(FetchError::new(
                    proxy_err.kind,
                    format!(
                        "direct failed: {}; fallback failed: {}",
                        direct_err.message, proxy_err.message
                    ),
                ))
            }
        }
    }
}

fn validate_url(url: &str) -> Result<(), FetchError> {
    let ok = (url.starts_with("http://") || url.starts_with("https://"))
        && url.len() > "https://".len()
        && !url.contains(char::is_whitespace);
    if ok {
        Ok(())
    } else {
        Err(FetchError::new(
            FetchErrorKind::InvalidUrl,
            format!("not an absolute http(s) URL: {:?}", url),
        ))
    }
}
