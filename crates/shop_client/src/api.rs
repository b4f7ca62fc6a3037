use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::EventId,
    error::{ApiException, ErrorCode, ValidationErrors},
    protocol::{
        BoughtItemCreateRequest, BoughtItemResource, EventResource, ItemResource,
        OrderDiscountCreateRequest, OrderDiscountResource, OrderLookupRequest, OrderResource,
    },
};
use tracing::warn;

use crate::config::ShopSettings;

/// Image adjustment requested for item thumbnails.
pub const PREVIEW_RESIZE: &str = "fit|100|100";
/// Image adjustment requested for the enlarged item view.
pub const CLOSEUP_RESIZE: &str = "fit|598|598";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    pub event: String,
    pub item: String,
    pub order: String,
    pub boughtitem: String,
    pub orderdiscount: String,
    pub ordersearch: String,
}

impl ApiEndpoints {
    pub fn from_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            event: format!("{base}/event/"),
            item: format!("{base}/item/"),
            order: format!("{base}/order/"),
            boughtitem: format!("{base}/boughtitem/"),
            orderdiscount: format!("{base}/orderdiscount/"),
            ordersearch: format!("{base}/ordersearch/"),
        }
    }

    pub fn event_detail(&self, event_id: EventId) -> String {
        format!("{}{}/", self.event, event_id.0)
    }
}

/// The registration REST API as seen by the shop.
#[async_trait]
pub trait ShopApi: Send + Sync {
    async fn load_event(&self, event_id: EventId) -> Result<EventResource>;
    async fn load_items(&self, event_id: EventId) -> Result<Vec<ItemResource>>;
    /// Fetches, or opens, the caller's current order for the event.
    async fn load_order(&self, event_id: EventId) -> Result<OrderResource>;
    async fn add_to_cart(&self, item_option_link: &str, order_link: &str)
        -> Result<BoughtItemResource>;
    async fn remove_from_cart(&self, bought_item_link: &str) -> Result<()>;
    async fn apply_discount(
        &self,
        discount_code: &str,
        order_link: &str,
    ) -> Result<OrderDiscountResource>;
    async fn search_orders(&self, event_id: EventId, query: &str) -> Result<Vec<OrderResource>>;
    async fn resize_image(&self, resize_endpoint: &str, adjustment: &str)
        -> Result<serde_json::Value>;
}

pub struct MissingShopApi;

#[async_trait]
impl ShopApi for MissingShopApi {
    async fn load_event(&self, event_id: EventId) -> Result<EventResource> {
        Err(anyhow!("shop api unavailable; cannot load event {}", event_id.0))
    }

    async fn load_items(&self, event_id: EventId) -> Result<Vec<ItemResource>> {
        Err(anyhow!("shop api unavailable; cannot load items for event {}", event_id.0))
    }

    async fn load_order(&self, event_id: EventId) -> Result<OrderResource> {
        Err(anyhow!("shop api unavailable; cannot load order for event {}", event_id.0))
    }

    async fn add_to_cart(
        &self,
        _item_option_link: &str,
        _order_link: &str,
    ) -> Result<BoughtItemResource> {
        Err(anyhow!("shop api unavailable"))
    }

    async fn remove_from_cart(&self, _bought_item_link: &str) -> Result<()> {
        Err(anyhow!("shop api unavailable"))
    }

    async fn apply_discount(
        &self,
        _discount_code: &str,
        _order_link: &str,
    ) -> Result<OrderDiscountResource> {
        Err(anyhow!("shop api unavailable"))
    }

    async fn search_orders(&self, _event_id: EventId, _query: &str) -> Result<Vec<OrderResource>> {
        Err(anyhow!("shop api unavailable"))
    }

    async fn resize_image(
        &self,
        _resize_endpoint: &str,
        _adjustment: &str,
    ) -> Result<serde_json::Value> {
        Err(anyhow!("shop api unavailable"))
    }
}

pub struct HttpShopApi {
    http: Client,
    endpoints: ApiEndpoints,
}

impl HttpShopApi {
    pub fn new(endpoints: ApiEndpoints) -> Self {
        Self::with_client(Client::new(), endpoints)
    }

    pub fn with_client(http: Client, endpoints: ApiEndpoints) -> Self {
        Self { http, endpoints }
    }

    pub fn from_settings(settings: &ShopSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .context("failed to build http client")?;
        Ok(Self::with_client(
            http,
            ApiEndpoints::from_base(&settings.api_base_url),
        ))
    }

    pub fn endpoints(&self) -> &ApiEndpoints {
        &self.endpoints
    }
}

/// Turns a non-2xx response into an [`ApiException`]. 4xx responses carry the server's
/// first validation message when there is one.
async fn error_for_status(res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let url = res.url().to_string();
    let body = res.text().await.unwrap_or_default();
    // Only client errors carry a message meant for the user.
    let message = status
        .is_client_error()
        .then(|| serde_json::from_str::<ValidationErrors>(&body).ok())
        .flatten()
        .and_then(|errors| errors.first_message())
        .unwrap_or_else(|| format!("request to {url} failed with status {status}"));
    warn!(%url, status = status.as_u16(), "shop api request rejected: {message}");
    Err(ApiException::new(ErrorCode::from_status(status.as_u16()), message).into())
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T> {
    let res = error_for_status(res).await?;
    Ok(res.json().await?)
}

#[async_trait]
impl ShopApi for HttpShopApi {
    async fn load_event(&self, event_id: EventId) -> Result<EventResource> {
        let res = self
            .http
            .get(self.endpoints.event_detail(event_id))
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to load event {}", event_id.0))
    }

    async fn load_items(&self, event_id: EventId) -> Result<Vec<ItemResource>> {
        let res = self
            .http
            .get(&self.endpoints.item)
            .query(&[("event", event_id.0)])
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to load items for event {}", event_id.0))
    }

    async fn load_order(&self, event_id: EventId) -> Result<OrderResource> {
        let res = self
            .http
            .post(&self.endpoints.order)
            .json(&OrderLookupRequest { event: event_id })
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to load order for event {}", event_id.0))
    }

    async fn add_to_cart(
        &self,
        item_option_link: &str,
        order_link: &str,
    ) -> Result<BoughtItemResource> {
        let res = self
            .http
            .post(&self.endpoints.boughtitem)
            .json(&BoughtItemCreateRequest {
                item_option: item_option_link.to_string(),
                order: order_link.to_string(),
            })
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to add {item_option_link} to cart"))
    }

    async fn remove_from_cart(&self, bought_item_link: &str) -> Result<()> {
        let res = self.http.delete(bought_item_link).send().await?;
        error_for_status(res)
            .await
            .with_context(|| format!("failed to remove {bought_item_link} from cart"))?;
        Ok(())
    }

    async fn apply_discount(
        &self,
        discount_code: &str,
        order_link: &str,
    ) -> Result<OrderDiscountResource> {
        let res = self
            .http
            .post(&self.endpoints.orderdiscount)
            .json(&OrderDiscountCreateRequest {
                discount_code: discount_code.to_string(),
                order: order_link.to_string(),
            })
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to apply discount code '{discount_code}'"))
    }

    async fn search_orders(&self, event_id: EventId, query: &str) -> Result<Vec<OrderResource>> {
        let res = self
            .http
            .get(&self.endpoints.ordersearch)
            .query(&[("event", event_id.0.to_string()), ("search", query.to_string())])
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("order search for '{query}' failed"))
    }

    async fn resize_image(
        &self,
        resize_endpoint: &str,
        adjustment: &str,
    ) -> Result<serde_json::Value> {
        let res = self
            .http
            .get(resize_endpoint)
            .query(&[("r", adjustment)])
            .send()
            .await?;
        decode(res)
            .await
            .with_context(|| format!("failed to resize image via {resize_endpoint}"))
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
