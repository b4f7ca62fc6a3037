use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use shared::{
    domain::{BoughtItemId, EventId, OrderId},
    error::{ApiException, ErrorCode},
    protocol::BoughtItemResource,
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod api;
pub mod config;
pub mod countdown;
pub mod filters;
pub mod reconcile;
pub mod refund;
pub mod search;
pub mod store;

pub use api::{ApiEndpoints, HttpShopApi, MissingShopApi, ShopApi};
pub use config::{load_settings, ShopSettings};
pub use countdown::{CartTimer, Countdown};
pub use reconcile::{Edit, EditSummary};
pub use search::{DispatchPolicy, QuickFind, QuickFindResults};
pub use store::ShopState;

use api::{CLOSEUP_RESIZE, PREVIEW_RESIZE};

#[derive(Debug, Clone, PartialEq)]
pub enum ShopEvent {
    EventLoaded {
        event_id: EventId,
    },
    OrderUpdated {
        order_id: OrderId,
        summary: EditSummary,
    },
    ItemsLoaded {
        count: usize,
    },
    CartItemAdded {
        bought_item_id: BoughtItemId,
    },
    CartItemRemoved {
        link: String,
    },
    DiscountApplied {
        code: Option<String>,
    },
    DiscountRejected {
        message: String,
    },
    CountdownTick(Countdown),
    CartExpired,
}

pub struct Shop {
    api: Arc<dyn ShopApi>,
    event_id: EventId,
    search_policy: DispatchPolicy,
    state: Mutex<ShopState>,
    events: broadcast::Sender<ShopEvent>,
}

impl Shop {
    pub fn new(event_id: EventId) -> Arc<Self> {
        Self::new_with_api(event_id, Arc::new(MissingShopApi))
    }

    pub fn new_with_api(event_id: EventId, api: Arc<dyn ShopApi>) -> Arc<Self> {
        Self::new_with_dependencies(event_id, api, DispatchPolicy::default())
    }

    pub fn new_with_dependencies(
        event_id: EventId,
        api: Arc<dyn ShopApi>,
        search_policy: DispatchPolicy,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            event_id,
            search_policy,
            state: Mutex::new(ShopState::new()),
            events,
        })
    }

    pub fn from_settings(settings: &ShopSettings) -> Result<Arc<Self>> {
        settings.validate().context("invalid shop settings")?;
        let event_id = settings.event()?;
        let api = HttpShopApi::from_settings(settings)?;
        Ok(Self::new_with_dependencies(
            event_id,
            Arc::new(api),
            DispatchPolicy::from(settings),
        ))
    }

    pub fn event_id(&self) -> EventId {
        self.event_id
    }

    pub fn search_policy(&self) -> DispatchPolicy {
        self.search_policy
    }

    pub fn api(&self) -> Arc<dyn ShopApi> {
        Arc::clone(&self.api)
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ShopEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ShopState {
        self.state.lock().await.clone()
    }

    pub async fn has_cart(&self) -> bool {
        self.state.lock().await.has_cart()
    }

    pub async fn dismiss_expired(&self) {
        self.state.lock().await.dismiss_expired();
    }

    fn emit(&self, event: ShopEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Loads the event, the current order and the item catalogue.
    pub async fn initialize(&self) -> Result<()> {
        let event = self
            .api
            .load_event(self.event_id)
            .await
            .context("failed to initialize shop")?;
        info!(event_id = self.event_id.0, name = %event.name, "shop event loaded");
        self.state.lock().await.set_event(event);
        self.emit(ShopEvent::EventLoaded {
            event_id: self.event_id,
        });

        self.load_order().await?;
        self.load_items().await?;
        Ok(())
    }

    pub async fn load_order(&self) -> Result<Vec<Edit<BoughtItemId>>> {
        let order = self.api.load_order(self.event_id).await?;
        let order_id = order.id;
        let edits = {
            let mut state = self.state.lock().await;
            let edits = state.apply_order(order);
            state.refresh_countdown(Utc::now());
            edits
        };
        self.emit(ShopEvent::OrderUpdated {
            order_id,
            summary: EditSummary::of(&edits),
        });
        Ok(edits)
    }

    /// Loads the catalogue, then fetches preview and closeup renditions for
    /// every image that has a resize endpoint.
    pub async fn load_items(&self) -> Result<()> {
        let items = self.api.load_items(self.event_id).await?;
        let targets: Vec<(usize, usize, String)> = items
            .iter()
            .enumerate()
            .flat_map(|(item_idx, item)| {
                item.images
                    .iter()
                    .enumerate()
                    .filter_map(move |(image_idx, image)| {
                        image
                            .resize_endpoint
                            .clone()
                            .map(|endpoint| (item_idx, image_idx, endpoint))
                    })
            })
            .collect();
        let count = items.len();
        self.state.lock().await.set_items(items);

        let resized = join_all(targets.into_iter().map(|(item_idx, image_idx, endpoint)| {
            let api = Arc::clone(&self.api);
            async move {
                let preview = api.resize_image(&endpoint, PREVIEW_RESIZE).await;
                let closeup = api.resize_image(&endpoint, CLOSEUP_RESIZE).await;
                (item_idx, image_idx, endpoint, preview, closeup)
            }
        }))
        .await;

        let mut state = self.state.lock().await;
        for (item_idx, image_idx, endpoint, preview, closeup) in resized {
            let preview = preview
                .map_err(|err| warn!(%endpoint, "image preview failed: {err:#}"))
                .ok();
            let closeup = closeup
                .map_err(|err| warn!(%endpoint, "image closeup failed: {err:#}"))
                .ok();
            state.set_item_image_previews(item_idx, image_idx, preview, closeup);
        }
        drop(state);

        debug!(count, "items loaded");
        self.emit(ShopEvent::ItemsLoaded { count });
        Ok(())
    }

    async fn order_link(&self) -> Result<String> {
        self.state
            .lock()
            .await
            .order
            .link
            .clone()
            .ok_or_else(|| anyhow!("no order loaded for event {}", self.event_id.0))
    }

    /// Reserves an item option in the current order. Item availability and
    /// the order are refreshed afterwards.
    pub async fn add_to_cart(&self, item_option_link: &str) -> Result<BoughtItemResource> {
        let order_link = self.order_link().await?;
        let bought_item = self.api.add_to_cart(item_option_link, &order_link).await?;
        info!(bought_item_id = bought_item.id.0, "item added to cart");
        self.state
            .lock()
            .await
            .push_bought_item(bought_item.clone());
        self.emit(ShopEvent::CartItemAdded {
            bought_item_id: bought_item.id,
        });

        self.load_items().await?;
        self.load_order().await?;
        Ok(bought_item)
    }

    pub async fn remove_from_cart(&self, bought_item_link: &str) -> Result<()> {
        self.api.remove_from_cart(bought_item_link).await?;
        if self
            .state
            .lock()
            .await
            .remove_bought_item(bought_item_link)
            .is_none()
        {
            debug!(link = bought_item_link, "removed item was not in local order");
        }
        info!(link = bought_item_link, "item removed from cart");
        self.emit(ShopEvent::CartItemRemoved {
            link: bought_item_link.to_string(),
        });

        self.load_items().await?;
        self.load_order().await?;
        Ok(())
    }

    /// Applies a discount code. A validation rejection by the server is
    /// recorded as the discount error and reported as `Ok(false)`; server
    /// faults and transport failures are returned as errors.
    pub async fn apply_discount(&self, discount_code: &str) -> Result<bool> {
        self.state.lock().await.discount_code_error = None;
        let order_link = self.order_link().await?;

        match self.api.apply_discount(discount_code, &order_link).await {
            Ok(discount) => {
                let code = discount.discount_code.clone();
                self.state.lock().await.push_discount(discount);
                info!(code = discount_code, "discount applied");
                self.emit(ShopEvent::DiscountApplied { code });
                Ok(true)
            }
            Err(err) => {
                let message = match err.downcast_ref::<ApiException>() {
                    Some(rejection) if rejection.code == ErrorCode::Validation => {
                        rejection.message.clone()
                    }
                    _ => return Err(err),
                };
                warn!(code = discount_code, "discount rejected: {message}");
                self.state.lock().await.discount_code_error = Some(message.clone());
                self.emit(ShopEvent::DiscountRejected { message });
                Ok(false)
            }
        }
    }

    pub async fn tick_countdown(&self) -> Result<CartTimer> {
        self.tick_countdown_at(Utc::now()).await
    }

    /// Recomputes the cart timer at `now`. On expiry the order is reloaded so
    /// released items disappear from the cart.
    pub async fn tick_countdown_at(&self, now: DateTime<Utc>) -> Result<CartTimer> {
        let timer = self.state.lock().await.refresh_countdown(now);
        match timer {
            CartTimer::Inactive => {}
            CartTimer::Running(countdown) => self.emit(ShopEvent::CountdownTick(countdown)),
            CartTimer::Expired => {
                info!(event_id = self.event_id.0, "cart expired; reloading order");
                self.emit(ShopEvent::CartExpired);
                self.load_order().await?;
            }
        }
        Ok(timer)
    }

    /// Ticks the countdown every `period` until the handle is aborted.
    pub fn spawn_countdown(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let shop = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                if let Err(err) = shop.tick_countdown().await {
                    warn!("countdown tick failed: {err:#}");
                }
            }
        })
    }

    pub fn quick_find(&self) -> QuickFind {
        QuickFind::spawn(self.api(), self.event_id, self.search_policy)
    }
}

#[cfg(test)]
#[path = "tests/fixtures.rs"]
mod test_fixtures;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
