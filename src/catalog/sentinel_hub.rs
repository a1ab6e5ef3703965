//! STAC catalog client for Sentinel Hub deployments (Copernicus Data Space by default).
use super::{Catalog, Collection};
use crate::acquisition::{footprint_from_geojson, Acquisition};
use crate::config::CatalogConfig;
use crate::error::CatalogError;
use crate::search::TimeWindow;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use geo::{LineString, Polygon};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};
use stac::{Item, ItemCollection};
use std::future::Future;
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio::time::sleep;
use url::Url;

const SEARCH_PATH: &str = "api/v1/catalog/1.0.0/search";
const MAX_PAGE_LIMIT: u32 = 100;

pub struct SentinelHub {
    client: reqwest::Client,
    config: CatalogConfig,
    token: OnceCell<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

enum RetryError {
    /// Network issues, server errors and rate limiting
    Retryable(anyhow::Error),
    NonRetryable(anyhow::Error),
}

impl From<reqwest::Error> for RetryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() {
            RetryError::Retryable(e.into())
        } else {
            RetryError::NonRetryable(e.into())
        }
    }
}

impl SentinelHub {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        if !config.has_credentials() {
            return Err(CatalogError::MissingCredentials.into());
        }
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            token: OnceCell::new(),
        })
    }

    fn search_url(&self) -> Result<Url> {
        Ok(self.config.base_url.join(SEARCH_PATH)?)
    }

    async fn access_token(&self) -> Result<&str> {
        let token = self
            .token
            .get_or_try_init(|| self.request_token())
            .await?;
        Ok(token.as_str())
    }

    async fn request_token(&self) -> Result<String> {
        log::debug!("Requesting access token from {}", self.config.token_url);
        let token_url = &self.config.token_url;
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        let form = &form;

        let response: TokenResponse = self
            .with_retry(|| async move {
                let response = self
                    .client
                    .post(token_url.clone())
                    .form(form)
                    .send()
                    .await?;
                let response = check_status(response).await?;
                Ok::<_, RetryError>(response.json::<TokenResponse>().await?)
            })
            .await?;

        response
            .access_token
            .ok_or(CatalogError::MissingAccessToken.into())
    }

    async fn fetch_page(&self, url: &Url, body: &Value) -> Result<Value> {
        let token = self.access_token().await?;
        self.with_retry(|| async move {
            let response = self
                .client
                .post(url.clone())
                .bearer_auth(token)
                .json(body)
                .send()
                .await?;
            let response = check_status(response).await?;
            Ok::<_, RetryError>(response.json::<Value>().await?)
        })
        .await
    }

    /// Runs `func` until it succeeds, fails permanently, or retries run out.
    ///
    /// The delay doubles after every attempt, starting at `retry_base_delay_ms`.
    async fn with_retry<F, Fut, T>(&self, func: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, RetryError>>,
    {
        let mut attempt = 0;
        loop {
            match func().await {
                Ok(result) => return Ok(result),
                Err(RetryError::Retryable(err)) if attempt < self.config.max_retries => {
                    let delay =
                        Duration::from_millis(self.config.retry_base_delay_ms << attempt.min(16));
                    log::warn!("Retryable error: {}", err);
                    log::warn!(
                        "Retry attempt {}/{} after {:?}",
                        attempt + 1,
                        self.config.max_retries,
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                Err(RetryError::Retryable(err)) | Err(RetryError::NonRetryable(err)) => {
                    return Err(err)
                }
            }
        }
    }
}

impl Catalog for SentinelHub {
    async fn search(
        &self,
        collection: &Collection,
        region: &Polygon<f64>,
        window: &TimeWindow,
    ) -> Result<Vec<Acquisition>> {
        let url = self.search_url()?;
        let limit = self.config.page_limit.clamp(1, MAX_PAGE_LIMIT);

        let mut acquisitions = vec![];
        let mut next = None;
        loop {
            let body = search_body(collection, region, window, limit, next);
            let page = self.fetch_page(&url, &body).await?;
            let (mut items, next_page) = parse_page(page)?;
            log::debug!(
                "{}: received {} items, next page {:?}",
                collection.name(),
                items.len(),
                next_page
            );

            let page_was_empty = items.is_empty();
            acquisitions.append(&mut items);
            match next_page {
                Some(n) if !page_was_empty => next = Some(n),
                _ => break,
            }
        }

        log::info!(
            "Found {} raw {} acquisitions",
            acquisitions.len(),
            collection.name()
        );
        Ok(acquisitions)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RetryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err: anyhow::Error = CatalogError::Status {
        status: status.as_u16(),
        body,
    }
    .into();
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        Err(RetryError::Retryable(err))
    } else {
        Err(RetryError::NonRetryable(err))
    }
}

fn search_body(
    collection: &Collection,
    region: &Polygon<f64>,
    window: &TimeWindow,
    limit: u32,
    next: Option<u64>,
) -> Value {
    let mut body = json!({
        "collections": vec![collection.key()],
        "datetime": window.to_interval(),
        "intersects": polygon_to_geojson(region),
        "limit": limit,
    });
    if let Some(filter) = collection.filter() {
        body["filter"] = json!(filter);
        body["filter-lang"] = json!("cql2-text");
    }
    if let Some(next) = next {
        body["next"] = json!(next);
    }
    body
}

fn polygon_to_geojson(polygon: &Polygon<f64>) -> Value {
    let ring = |line: &LineString<f64>| -> Vec<[f64; 2]> { line.coords().map(|c| [c.x, c.y]).collect() };
    let rings: Vec<Vec<[f64; 2]>> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring)
        .collect();
    json!({"type": "Polygon", "coordinates": rings})
}

/// Splits a search response into decoded acquisitions and the next page token.
fn parse_page(page: Value) -> Result<(Vec<Acquisition>, Option<u64>)> {
    let next = page
        .get("context")
        .and_then(|context| context.get("next"))
        .and_then(Value::as_u64);
    let item_collection: ItemCollection = serde_json::from_value(page)
        .map_err(|e| anyhow!("Unable to decode catalog response: {}", e))?;

    let mut acquisitions = vec![];
    for item in item_collection.items.iter() {
        match acquisition_from_item(item) {
            Ok(acquisition) => acquisitions.push(acquisition),
            Err(e) => log::warn!("Skipping item: {}", e),
        }
    }
    Ok((acquisitions, next))
}

fn acquisition_from_item(item: &Item) -> Result<Acquisition, CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidItem {
        id: item.id.to_owned(),
        reason,
    };

    let properties = serde_json::to_value(&item.properties).map_err(|e| invalid(e.to_string()))?;
    let datetime = properties
        .get("datetime")
        .and_then(Value::as_str)
        .ok_or_else(|| invalid("missing properties.datetime".to_string()))?;
    let timestamp = DateTime::parse_from_rfc3339(datetime)
        .map_err(|e| invalid(e.to_string()))?
        .with_timezone(&Utc);

    let geometry = serde_json::to_value(&item.geometry).map_err(|e| invalid(e.to_string()))?;
    if geometry.is_null() {
        return Err(invalid("missing geometry".to_string()));
    }
    let footprint = footprint_from_geojson(&geometry).map_err(|e| invalid(e.to_string()))?;

    let cloud_cover = properties
        .get("eo:cloud_cover")
        .or_else(|| properties.get("cloudCover"))
        .and_then(Value::as_f64);

    Ok(Acquisition::new(item.id.to_owned(), timestamp, footprint, cloud_cover))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::OrbitDirection;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn item(id: &str, datetime: &str, properties: Value, geometry: Value) -> Value {
        let mut properties = properties;
        properties["datetime"] = json!(datetime);
        json!({
            "type": "Feature",
            "stac_version": "1.0.0",
            "id": id,
            "geometry": geometry,
            "bbox": [13.0, 52.0, 14.0, 53.0],
            "properties": properties,
            "links": [],
            "assets": {}
        })
    }

    fn square() -> Value {
        json!({
            "type": "Polygon",
            "coordinates": [[[13.0, 52.0], [14.0, 52.0], [14.0, 53.0], [13.0, 53.0], [13.0, 52.0]]]
        })
    }

    fn page(features: Vec<Value>, next: Option<u64>) -> Value {
        let mut page = json!({
            "type": "FeatureCollection",
            "features": features,
            "links": []
        });
        if let Some(next) = next {
            page["context"] = json!({"next": next, "limit": 100, "returned": 100});
        }
        page
    }

    fn window() -> TimeWindow {
        TimeWindow {
            start: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap(),
        }
    }

    fn region() -> Polygon<f64> {
        Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 0.0)]),
            vec![],
        )
    }

    #[test]
    fn test_search_body() {
        let collection = Collection::Sentinel1Iw {
            orbit: Some(OrbitDirection::Ascending),
        };
        let body = search_body(&collection, &region(), &window(), 50, Some(100));

        assert_eq!(body["collections"], json!(["sentinel-1-grd"]));
        assert_eq!(body["datetime"], json!("2024-05-01T00:00:00Z/2024-05-10T00:00:00Z"));
        assert_eq!(body["limit"], json!(50));
        assert_eq!(body["next"], json!(100));
        assert_eq!(body["filter-lang"], json!("cql2-text"));
        assert_eq!(body["intersects"]["type"], json!("Polygon"));
        assert_eq!(body["intersects"]["coordinates"][0][1], json!([1.0, 0.0]));
    }

    #[test]
    fn test_search_body_without_filter_or_next() {
        let body = search_body(&Collection::Sentinel2L2a, &region(), &window(), 100, None);
        assert!(body.get("filter").is_none());
        assert!(body.get("next").is_none());
    }

    #[test]
    fn test_parse_page() {
        let features = vec![
            item(
                "S2A_MSIL2A_20240504T100601",
                "2024-05-04T10:06:01Z",
                json!({"eo:cloud_cover": 12.5}),
                square(),
            ),
            item(
                "S1A_IW_GRDH_1SDV_20240504T051234",
                "2024-05-04T05:12:34.123Z",
                json!({}),
                square(),
            ),
        ];
        let (acquisitions, next) = parse_page(page(features, Some(100))).unwrap();

        assert_eq!(next, Some(100));
        assert_eq!(acquisitions.len(), 2);
        assert_eq!(acquisitions[0].cloud_cover, 12.5);
        assert_eq!(
            acquisitions[0].timestamp,
            Utc.with_ymd_and_hms(2024, 5, 4, 10, 6, 1).unwrap()
        );
        assert_eq!(acquisitions[1].cloud_cover, 0.0);
        assert_eq!(acquisitions[1].footprint.0.len(), 1);
    }

    #[test]
    fn test_legacy_cloud_cover_property() {
        let features = vec![item("a", "2024-05-04T10:06:01Z", json!({"cloudCover": 42.0}), square())];
        let (acquisitions, next) = parse_page(page(features, None)).unwrap();
        assert_eq!(next, None);
        assert_eq!(acquisitions[0].cloud_cover, 42.0);
    }

    #[test]
    fn test_undecodable_items_are_skipped() {
        let features = vec![
            item("no-geometry", "2024-05-04T10:06:01Z", json!({}), Value::Null),
            item(
                "point",
                "2024-05-04T10:06:01Z",
                json!({}),
                json!({"type": "Point", "coordinates": [13.5, 52.5]}),
            ),
            item("good", "2024-05-04T10:06:01Z", json!({}), square()),
        ];
        let (acquisitions, _) = parse_page(page(features, None)).unwrap();
        assert_eq!(acquisitions.len(), 1);
        assert_eq!(acquisitions[0].id, "good");
    }

    #[test]
    fn test_requires_credentials() {
        assert!(SentinelHub::new(CatalogConfig::default()).is_err());

        let config = CatalogConfig::default()
            .with_credentials(Some("id".to_string()), Some("secret".to_string()));
        let catalog = SentinelHub::new(config).unwrap();
        assert_eq!(
            catalog.search_url().unwrap().as_str(),
            "https://sh.dataspace.copernicus.eu/api/v1/catalog/1.0.0/search"
        );
    }

    #[tokio::test]
    async fn test_retry_gives_up_on_permanent_errors() {
        let config = CatalogConfig {
            max_retries: 5,
            retry_base_delay_ms: 1,
            ..CatalogConfig::default()
        }
        .with_credentials(Some("id".to_string()), Some("secret".to_string()));
        let catalog = SentinelHub::new(config).unwrap();

        let attempts = &AtomicU32::new(0);
        let result: Result<()> = catalog
            .with_retry(|| async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RetryError::NonRetryable(anyhow!("bad request")))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);

        let attempts = &AtomicU32::new(0);
        let result: Result<()> = catalog
            .with_retry(|| async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(RetryError::Retryable(anyhow!("unavailable")))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 6);
    }
}
