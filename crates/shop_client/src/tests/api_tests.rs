use super::*;
use crate::test_fixtures::{bought_item, discount, event, order};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use shared::domain::BoughtItemStatus::Reserved;
use std::{collections::HashMap, sync::Arc};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct StubState {
    order_lookups: Arc<Mutex<Vec<serde_json::Value>>>,
    searches: Arc<Mutex<Vec<HashMap<String, String>>>>,
    resizes: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<u32>>,
}

async fn stub_event() -> Json<EventResource> {
    Json(event(Some(15)))
}

async fn stub_order(
    State(state): State<StubState>,
    Json(body): Json<serde_json::Value>,
) -> Json<OrderResource> {
    state.order_lookups.lock().await.push(body);
    Json(order(vec![bought_item(1, 0, Reserved)]))
}

async fn stub_discount(Json(body): Json<serde_json::Value>) -> (StatusCode, Json<serde_json::Value>) {
    if body["discount_code"] == "CRASH" {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "boom" })),
        );
    }
    if body["discount_code"] == "EARLY" {
        return (
            StatusCode::CREATED,
            Json(serde_json::to_value(discount("EARLY")).unwrap_or_default()),
        );
    }
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({
            "non_field_errors": ["Discount is not currently available."]
        })),
    )
}

async fn stub_delete(State(state): State<StubState>) -> StatusCode {
    *state.deleted.lock().await += 1;
    StatusCode::NO_CONTENT
}

async fn stub_search(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<OrderResource>> {
    state.searches.lock().await.push(params);
    Json(vec![order(Vec::new())])
}

async fn stub_resize(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let adjustment = params.get("r").cloned().unwrap_or_default();
    state.resizes.lock().await.push(adjustment.clone());
    Json(serde_json::json!({ "url": format!("/media/thumb.png?r={adjustment}") }))
}

async fn stub_forbidden() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::FORBIDDEN,
        Json(serde_json::json!({ "detail": "You do not have permission." })),
    )
}

async fn spawn_shop_server() -> Result<(String, StubState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = StubState::default();
    let app = Router::new()
        .route("/api/v1/event/1/", get(stub_event))
        .route("/api/v1/order/", post(stub_order))
        .route("/api/v1/orderdiscount/", post(stub_discount))
        .route("/api/v1/boughtitem/5/", delete(stub_delete))
        .route("/api/v1/ordersearch/", get(stub_search))
        .route("/api/v1/resize/items/0.png", get(stub_resize))
        .route("/api/v1/item/", get(stub_forbidden))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api/v1"), state))
}

#[test]
fn endpoints_are_derived_from_the_base_url() {
    let endpoints = ApiEndpoints::from_base("https://register.example.com/api/v1/");

    assert_eq!(endpoints.event, "https://register.example.com/api/v1/event/");
    assert_eq!(endpoints.boughtitem, "https://register.example.com/api/v1/boughtitem/");
    assert_eq!(endpoints.ordersearch, "https://register.example.com/api/v1/ordersearch/");
    assert_eq!(
        endpoints.event_detail(EventId(4)),
        "https://register.example.com/api/v1/event/4/"
    );
}

#[tokio::test]
async fn missing_api_reports_unavailable() {
    let err = MissingShopApi
        .load_order(EventId(1))
        .await
        .expect_err("missing api must fail");
    assert!(err.to_string().contains("unavailable"));
}

#[tokio::test]
async fn loads_event_and_posts_order_lookup() {
    let (base, state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    let loaded = api.load_event(EventId(1)).await.expect("event");
    assert_eq!(loaded, event(Some(15)));

    let loaded = api.load_order(EventId(1)).await.expect("order");
    assert_eq!(loaded.code, "ABC123");
    assert_eq!(loaded.bought_items.len(), 1);
    assert_eq!(
        state.order_lookups.lock().await.as_slice(),
        &[serde_json::json!({ "event": 1 })]
    );
}

#[tokio::test]
async fn rejected_discount_surfaces_first_validation_message() {
    let (base, _state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    let applied = api
        .apply_discount("EARLY", "http://testserver/api/v1/order/3/")
        .await
        .expect("discount");
    assert_eq!(applied.discount_code.as_deref(), Some("EARLY"));

    let err = api
        .apply_discount("BOGUS", "http://testserver/api/v1/order/3/")
        .await
        .expect_err("bogus code");
    let exception = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(exception.code, ErrorCode::Validation);
    assert_eq!(exception.message, "Discount is not currently available.");
}

#[tokio::test]
async fn forbidden_response_uses_detail_message() {
    let (base, _state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    let err = api.load_items(EventId(1)).await.expect_err("forbidden");
    let exception = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(exception.code, ErrorCode::Forbidden);
    assert_eq!(exception.message, "You do not have permission.");
}

#[tokio::test]
async fn removes_bought_item_by_link() {
    let (base, state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    api.remove_from_cart(&format!("{base}/boughtitem/5/"))
        .await
        .expect("delete");
    assert_eq!(*state.deleted.lock().await, 1);

    let err = api
        .remove_from_cart(&format!("{base}/boughtitem/6/"))
        .await
        .expect_err("unknown item");
    assert_eq!(
        err.downcast_ref::<ApiException>().map(|e| e.code),
        Some(ErrorCode::NotFound)
    );
}

#[tokio::test]
async fn search_and_resize_send_query_parameters() {
    let (base, state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    let found = api.search_orders(EventId(1), "dancer").await.expect("search");
    assert_eq!(found.len(), 1);
    let searches = state.searches.lock().await.clone();
    assert_eq!(searches[0].get("event").map(String::as_str), Some("1"));
    assert_eq!(searches[0].get("search").map(String::as_str), Some("dancer"));

    let resized = api
        .resize_image(&format!("{base}/resize/items/0.png"), PREVIEW_RESIZE)
        .await
        .expect("resize");
    assert_eq!(resized["url"], "/media/thumb.png?r=fit|100|100");
    assert_eq!(state.resizes.lock().await.as_slice(), &["fit|100|100".to_string()]);
}

#[tokio::test]
async fn server_errors_map_to_internal_code() {
    let (base, _state) = spawn_shop_server().await.expect("spawn server");
    let api = HttpShopApi::new(ApiEndpoints::from_base(&base));

    let err = api
        .apply_discount("CRASH", "http://testserver/api/v1/order/3/")
        .await
        .expect_err("server fault");

    let exception = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(exception.code, ErrorCode::Internal);
    assert!(exception.message.contains("500"));
}
