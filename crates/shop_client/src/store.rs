//! Explicit state container for the registration shop.
//!
//! Network responses are folded in through the `apply_*` / `push_*` calls;
//! views only read.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::{
    domain::{BoughtItemId, OrderId},
    protocol::{BoughtItemResource, EventResource, ItemResource, OrderDiscountResource, OrderResource},
};
use tracing::debug;
use url::Url;

use crate::{
    countdown::{cart_timer, CartTimer, Countdown},
    reconcile::{reconcile_refreshing, Edit, EditSummary},
};

/// Turns an API link into the key used by [`ObjectStore`]: the URL path
/// without its leading slash. Relative links are accepted as-is.
pub fn link_to_keypath(link: &str) -> String {
    let path = match Url::parse(link) {
        Ok(url) => url.path().to_string(),
        Err(_) => link
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };
    path.strip_prefix('/').unwrap_or(&path).to_string()
}

/// Link-addressed cache of API objects.
#[derive(Debug, Default, Clone)]
pub struct ObjectStore {
    objects: HashMap<String, serde_json::Value>,
}

impl ObjectStore {
    pub fn store_object(&mut self, link: &str, object: serde_json::Value) {
        self.objects.insert(link_to_keypath(link), object);
    }

    pub fn fetch_object(&self, link: &str) -> Option<&serde_json::Value> {
        self.objects.get(&link_to_keypath(link))
    }

    pub fn remove_object(&mut self, link: &str) -> Option<serde_json::Value> {
        self.objects.remove(&link_to_keypath(link))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[derive(Debug, Default, Clone)]
pub struct OrderState {
    pub id: Option<OrderId>,
    pub link: Option<String>,
    pub event: Option<String>,
    pub person: Option<String>,
    pub email: Option<String>,
    pub code: Option<String>,
    pub cart_start_time: Option<DateTime<Utc>>,
    pub bought_items: Vec<BoughtItemResource>,
    pub discounts: Vec<OrderDiscountResource>,
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Clone)]
pub struct ShopState {
    pub event: Option<EventResource>,
    pub order: OrderState,
    pub items: Vec<ItemResource>,
    pub countdown: Option<Countdown>,
    pub countdown_expired: bool,
    pub discount_code_error: Option<String>,
    pub objects: ObjectStore,
}

impl ShopState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_event(&mut self, event: EventResource) {
        if let Ok(value) = serde_json::to_value(&event) {
            self.objects.store_object(&event.link, value);
        }
        self.event = Some(event);
    }

    pub fn set_items(&mut self, items: Vec<ItemResource>) {
        self.items = items;
    }

    /// Folds a freshly fetched order into the state. Bought items are merged
    /// positionally; everything else is overwritten.
    pub fn apply_order(&mut self, order: OrderResource) -> Vec<Edit<BoughtItemId>> {
        let OrderResource {
            id,
            link,
            code,
            cart_start_time,
            bought_items,
            discounts,
            extra,
            person,
            email,
            event,
        } = order;

        self.order.id = Some(id);
        self.order.link = Some(link);
        self.order.event = Some(event);
        self.order.person = person;
        self.order.email = email;
        self.order.code = Some(code);
        self.order.cart_start_time = cart_start_time;
        self.order.discounts = discounts;
        self.order.extra.extend(extra);

        let edits = reconcile_refreshing(&mut self.order.bought_items, bought_items);
        let summary = EditSummary::of(&edits);
        if !summary.is_empty() {
            debug!(
                order_id = id.0,
                inserted = summary.inserted,
                removed = summary.removed,
                replaced = summary.replaced,
                "bought items reconciled"
            );
        }
        edits
    }

    pub fn push_bought_item(&mut self, item: BoughtItemResource) {
        if let Ok(value) = serde_json::to_value(&item) {
            self.objects.store_object(&item.link, value);
        }
        self.order.bought_items.push(item);
    }

    /// Drops a bought item by link, from both the list and the object store.
    pub fn remove_bought_item(&mut self, link: &str) -> Option<BoughtItemResource> {
        self.objects.remove_object(link);
        let index = self
            .order
            .bought_items
            .iter()
            .position(|item| item.link == link)?;
        Some(self.order.bought_items.remove(index))
    }

    pub fn push_discount(&mut self, discount: OrderDiscountResource) {
        if let Some(link) = &discount.link {
            if let Ok(value) = serde_json::to_value(&discount) {
                self.objects.store_object(link, value);
            }
        }
        self.order.discounts.push(discount);
    }

    pub fn has_cart(&self) -> bool {
        self.order
            .bought_items
            .iter()
            .any(|item| item.status.is_in_cart())
    }

    pub fn set_item_image_previews(
        &mut self,
        item_idx: usize,
        image_idx: usize,
        preview: Option<serde_json::Value>,
        closeup: Option<serde_json::Value>,
    ) -> bool {
        let Some(image) = self
            .items
            .get_mut(item_idx)
            .and_then(|item| item.images.get_mut(image_idx))
        else {
            return false;
        };
        if preview.is_some() {
            image.preview = preview;
        }
        if closeup.is_some() {
            image.closeup = closeup;
        }
        true
    }

    /// Recomputes the cart countdown. Returns the timer so callers can react
    /// to expiry.
    pub fn refresh_countdown(&mut self, now: DateTime<Utc>) -> CartTimer {
        let timeout = self.event.as_ref().and_then(|event| event.cart_timeout);
        let timer = cart_timer(self.order.cart_start_time, timeout, now);
        match timer {
            CartTimer::Inactive => self.countdown = None,
            CartTimer::Running(countdown) => self.countdown = Some(countdown),
            CartTimer::Expired => {
                self.countdown = None;
                self.countdown_expired = true;
            }
        }
        timer
    }

    pub fn dismiss_expired(&mut self) {
        self.countdown_expired = false;
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
