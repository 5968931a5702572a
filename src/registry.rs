//! Provider registry listing client
//!
//! Talks to the registry's `/v2/providers` listing endpoint one page at a
//! time and flattens the paginated results into repository references. The
//! listing is sequential by design: whether another page exists is only known
//! from the previous page's `links.next` indicator.

use crate::config::Config;
use crate::error::{RegistryError, Result};
use crate::types::{Event, RepoRef};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

/// One page of the provider listing
///
/// Field shapes follow the registry's JSON:API payload. Unknown fields are
/// ignored; missing `data` or `links` deserialize to their defaults so an
/// empty page is representable and distinct from a malformed one.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProvidersPage {
    /// Provider records on this page, in listing order
    #[serde(default)]
    pub data: Vec<ProviderRecord>,

    /// Pagination links
    #[serde(default)]
    pub links: PageLinks,
}

/// One provider entry within a listing page
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderRecord {
    /// Registry-assigned provider ID (used by the detail endpoint)
    #[serde(default)]
    pub id: String,

    /// Provider attributes
    #[serde(default)]
    pub attributes: ProviderAttributes,
}

/// Attributes of a provider record
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderAttributes {
    /// Upstream source repository URL
    #[serde(default)]
    pub source: String,
}

/// Pagination links attached to a listing page
///
/// Only the presence of `next` matters: it is the sole signal that another
/// page exists. Its value is kept opaque.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PageLinks {
    /// Link to the next page, absent on the final page
    #[serde(default)]
    pub next: Option<serde_json::Value>,
}

/// Client for the provider registry listing endpoints
///
/// Shares the downloader's pooled HTTP client; listing requests reuse the
/// same connections as archive downloads.
#[derive(Clone)]
pub struct RegistryClient {
    config: Arc<Config>,
    http: reqwest::Client,
    event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl RegistryClient {
    /// Create a new registry client
    pub fn new(
        config: Arc<Config>,
        http: reqwest::Client,
        event_tx: tokio::sync::broadcast::Sender<Event>,
    ) -> Self {
        Self {
            config,
            http,
            event_tx,
        }
    }

    /// Fetch one page of the provider listing
    ///
    /// `page` is 1-based. A non-success status or an unparseable body is an
    /// error; an empty `data` array is a valid page. This distinction keeps
    /// transport failures from being mistaken for the end of the listing.
    pub async fn fetch_page(&self, page: u32) -> Result<ProvidersPage> {
        let url = format!("{}/v2/providers", self.config.registry_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("filter[tier]", self.config.tiers.join(",")),
                ("page[number]", page.to_string()),
                ("page[size]", self.config.page_size.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Http {
                page,
                status: status.as_u16(),
            }
            .into());
        }

        let listing = response.json::<ProvidersPage>().await.map_err(|e| {
            RegistryError::MalformedPage {
                page,
                reason: e.to_string(),
            }
        })?;

        Ok(listing)
    }

    /// Collect every repository reference from the full provider listing
    ///
    /// Starts at `page_start` and keeps fetching while the previous page
    /// reported a `links.next` indicator and the page number has not passed
    /// `page_limit`. Sources are flattened in first-seen order across pages;
    /// repeated sources are kept as-is (the collector mirrors the upstream
    /// listing, repeats included). A source that cannot be parsed into
    /// owner/name is dropped with a warning rather than aborting collection.
    pub async fn collect_sources(&self) -> Result<Vec<RepoRef>> {
        debug!("collecting provider sources");

        let mut repos = Vec::new();
        let mut page = self.config.page_start;

        loop {
            // Progress log throttled to the first page and every 10th
            if page == self.config.page_start || page % 10 == 0 {
                debug!(page, "fetching providers page");
            }

            let listing = self.fetch_page(page).await?;
            self.emit(Event::PageFetched {
                page,
                providers: listing.data.len(),
            });

            for record in &listing.data {
                match RepoRef::parse(&record.attributes.source) {
                    Ok(repo) => repos.push(repo),
                    Err(e) => {
                        warn!(
                            source = %record.attributes.source,
                            error = %e,
                            "dropping provider with malformed source"
                        );
                    }
                }
            }

            if listing.links.next.is_none() || page >= self.config.page_limit {
                break;
            }
            page += 1;
        }

        debug!(repos = repos.len(), "provider source collection complete");
        Ok(repos)
    }

    /// Fetch the detail document for one provider
    ///
    /// Not used by the bulk download pipeline; exposed for consumers that
    /// want per-provider metadata (categories, versions, fork links).
    pub async fn provider_details(&self, id: &str) -> Result<serde_json::Value> {
        debug!(provider = id, "fetching provider details");

        let url = format!("{}/v2/providers/{}", self.config.registry_url, id);
        let response = self
            .http
            .get(&url)
            .query(&[(
                "include",
                "categories,moved-to,potential-fork-of,provider-versions,top-modules",
            )])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() != 200 {
            return Err(RegistryError::ProviderDetails {
                id: id.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response.json::<serde_json::Value>().await?)
    }

    fn emit(&self, event: Event) {
        // send() fails when no one is subscribed, which is fine
        self.event_tx.send(event).ok();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(registry_url: String) -> RegistryClient {
        let config = Config {
            registry_url,
            ..Default::default()
        };
        let (event_tx, _rx) = tokio::sync::broadcast::channel(64);
        RegistryClient::new(Arc::new(config), reqwest::Client::new(), event_tx)
    }

    fn page_body(sources: &[&str], has_next: bool) -> serde_json::Value {
        let data: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| {
                json!({
                    "id": format!("provider-{i}"),
                    "attributes": { "source": s }
                })
            })
            .collect();
        let mut body = json!({ "data": data, "links": {} });
        if has_next {
            body["links"]["next"] = json!("/v2/providers?page[number]=next");
        }
        body
    }

    #[tokio::test]
    async fn fetch_page_parses_listing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .and(query_param("page[number]", "1"))
            .and(query_param("page[size]", "100"))
            .and(query_param("filter[tier]", "official,partner,community"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(&["https://github.com/acme/widget"], false)),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let page = client.fetch_page(1).await.unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(
            page.data[0].attributes.source,
            "https://github.com/acme/widget"
        );
        assert!(page.links.next.is_none());
    }

    #[tokio::test]
    async fn fetch_page_distinguishes_errors_from_empty_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.fetch_page(3).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::Http { page: 3, status: 500 })
        ));
    }

    #[tokio::test]
    async fn fetch_page_rejects_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.fetch_page(1).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::MalformedPage { page: 1, .. })
        ));
    }

    #[tokio::test]
    async fn collect_sources_stops_when_next_is_absent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .and(query_param("page[number]", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(&["https://github.com/acme/widget"], true)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .and(query_param("page[number]", "2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(&["https://github.com/acme/gadget"], false)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let repos = client.collect_sources().await.unwrap();

        // First-seen order across pages, terminated after exactly 2 pages
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].to_string(), "acme/widget");
        assert_eq!(repos[1].to_string(), "acme/gadget");
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn collect_sources_respects_page_limit_ceiling() {
        let server = MockServer::start().await;
        // Every page claims to have a next page; only the ceiling terminates
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(&["https://github.com/acme/widget"], true)),
            )
            .mount(&server)
            .await;

        let config = Config {
            registry_url: server.uri(),
            page_limit: 3,
            ..Default::default()
        };
        let (event_tx, _rx) = tokio::sync::broadcast::channel(64);
        let client = RegistryClient::new(Arc::new(config), reqwest::Client::new(), event_tx);

        let repos = client.collect_sources().await.unwrap();
        assert_eq!(repos.len(), 3);
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn collect_sources_drops_malformed_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
                &[
                    "https://github.com/acme/widget",
                    "not a url",
                    "https://github.com/only-owner",
                    "https://github.com/acme/gadget",
                ],
                false,
            )))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let repos = client.collect_sources().await.unwrap();

        let names: Vec<_> = repos.iter().map(|r| r.to_string()).collect();
        assert_eq!(names, vec!["acme/widget", "acme/gadget"]);
    }

    #[tokio::test]
    async fn collect_sources_keeps_repeated_sources() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_body(
                &[
                    "https://github.com/acme/widget",
                    "https://github.com/acme/widget",
                ],
                false,
            )))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let repos = client.collect_sources().await.unwrap();
        assert_eq!(repos.len(), 2);
    }

    #[tokio::test]
    async fn listing_failure_propagates_mid_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .and(query_param("page[number]", "1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(page_body(&["https://github.com/acme/widget"], true)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/providers"))
            .and(query_param("page[number]", "2"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.collect_sources().await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::Http { page: 2, status: 502 })
        ));
    }

    #[tokio::test]
    async fn provider_details_returns_document() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers/hashicorp-aws"))
            .and(query_param(
                "include",
                "categories,moved-to,potential-fork-of,provider-versions,top-modules",
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({
                    "data": { "id": "hashicorp-aws" }
                })),
            )
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let details = client.provider_details("hashicorp-aws").await.unwrap();
        assert_eq!(details["data"]["id"], "hashicorp-aws");
    }

    #[tokio::test]
    async fn provider_details_errors_on_non_200() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/providers/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let err = client.provider_details("missing").await.unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::ProviderDetails { status: 404, .. })
        ));
    }
}
