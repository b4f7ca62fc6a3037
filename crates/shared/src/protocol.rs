use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Amount, BoughtItemId, BoughtItemStatus, EventId, ItemId, ItemImageId, ItemOptionId, OrderId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResource {
    pub id: EventId,
    pub link: String,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    /// Minutes a reserved cart is held before it expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_timeout: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoughtItemResource {
    pub id: BoughtItemId,
    pub link: String,
    pub item_option: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
    pub added: DateTime<Utc>,
    pub status: BoughtItemStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDiscountResource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub discount: String,
    pub order: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResource {
    pub id: OrderId,
    pub link: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cart_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bought_items: Vec<BoughtItemResource>,
    #[serde(default)]
    pub discounts: Vec<OrderDiscountResource>,
    /// Every other order field (survey answers, housing, flyer address, ...).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemOptionResource {
    pub id: ItemOptionId,
    pub link: String,
    pub item: String,
    pub name: String,
    pub price: Amount,
    #[serde(default)]
    pub total_number: Option<u32>,
    #[serde(default)]
    pub taken: u32,
    #[serde(default)]
    pub remaining_display: Option<String>,
    #[serde(default)]
    pub available_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub order: i32,
}

impl ItemOptionResource {
    pub fn remaining(&self) -> Option<u32> {
        self.total_number
            .map(|total| total.saturating_sub(self.taken))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemImageResource {
    pub id: ItemImageId,
    pub link: String,
    pub item: String,
    #[serde(default)]
    pub order: i32,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resize_endpoint: Option<String>,
    /// Thumbnail adjustment info, filled in client-side after load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closeup: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResource {
    pub id: ItemId,
    pub link: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub event: String,
    #[serde(default)]
    pub options: Vec<ItemOptionResource>,
    #[serde(default)]
    pub images: Vec<ItemImageResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLookupRequest {
    pub event: EventId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoughtItemCreateRequest {
    pub item_option: String,
    pub order: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDiscountCreateRequest {
    pub discount_code: String,
    pub order: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_keeps_unknown_fields_in_extra() {
        let order: OrderResource = serde_json::from_str(
            r#"{
                "id": 3,
                "link": "http://testserver/api/v1/order/3/",
                "event": "http://testserver/api/v1/event/1/",
                "person": null,
                "code": "ABC123",
                "cart_start_time": "2015-03-01T12:00:00Z",
                "bought_items": [{
                    "id": 9,
                    "link": "http://testserver/api/v1/boughtitem/9/",
                    "item_option": "http://testserver/api/v1/itemoption/2/",
                    "order": "http://testserver/api/v1/order/3/",
                    "added": "2015-03-01T12:00:00Z",
                    "status": "reserved",
                    "attendee": null
                }],
                "discounts": [],
                "survey_completed": false,
                "notes": "late arrival"
            }"#,
        )
        .expect("order");

        assert_eq!(order.id, OrderId(3));
        assert_eq!(order.bought_items.len(), 1);
        assert_eq!(order.bought_items[0].status, BoughtItemStatus::Reserved);
        assert_eq!(
            order.extra.get("notes").and_then(|v| v.as_str()),
            Some("late arrival")
        );
        assert!(order.extra.contains_key("survey_completed"));
        assert!(!order.extra.contains_key("bought_items"));
    }

    #[test]
    fn option_remaining_saturates() {
        let option: ItemOptionResource = serde_json::from_str(
            r#"{
                "id": 2,
                "link": "http://testserver/api/v1/itemoption/2/",
                "item": "http://testserver/api/v1/item/1/",
                "name": "Full weekend",
                "price": "85.00",
                "total_number": 3,
                "taken": 5
            }"#,
        )
        .expect("option");
        assert_eq!(option.price, Amount(8500));
        assert_eq!(option.remaining(), Some(0));
    }
}
