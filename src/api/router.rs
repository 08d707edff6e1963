use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::admin;
use super::catalog;
use super::health;
use super::middleware::{logging_middleware, timing_middleware};
use super::state::AppState;
use crate::infrastructure::observability::{create_metrics_router, PrometheusMetrics};

/// Create the full router with application state.
///
/// When `metrics` is set, the Prometheus scrape endpoint is mounted at
/// `metrics_path`.
pub fn create_router(
    state: AppState,
    metrics: Option<PrometheusMetrics>,
    metrics_path: &str,
) -> Router {
    let mut router = Router::new()
        .route("/", get(catalog::root))
        // Catalog reads
        .route("/products", get(catalog::list_products))
        .route("/products/{id}", get(catalog::get_product))
        .route("/users", get(catalog::list_users))
        .route("/users/{id}", get(catalog::get_user))
        .route("/orders", get(catalog::list_orders))
        .route("/orders/{id}", get(catalog::get_order))
        .route("/stats", get(catalog::stats))
        // Dataset mutations
        .route("/truncate-all", delete(admin::truncate_all))
        .route("/seed-data", post(admin::seed_data))
        // Probes
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .with_state(state);

    if let Some(metrics) = metrics {
        router = router.merge(create_metrics_router(metrics, metrics_path));
    }

    router
        .layer(middleware::from_fn(timing_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::domain::cache::{Cache, CacheStore, MockCache};
    use crate::domain::catalog::DatasetRepository;
    use crate::infrastructure::cache::InMemoryCache;
    use crate::infrastructure::services::{
        BulkInvalidator, CacheTtlPolicy, CatalogService, DatasetService,
    };
    use crate::infrastructure::storage::fixtures::{new_order, new_user, product_grid};
    use crate::infrastructure::storage::{CatalogStorage, InMemoryCatalog, StorageType};

    fn app_with(catalog: Arc<InMemoryCatalog>, cache: Arc<dyn Cache>) -> Router {
        let storage = CatalogStorage::from_backend(catalog, StorageType::InMemory);
        let cache = CacheStore::new(cache);

        let catalog = CatalogService::new(
            storage.products.clone(),
            storage.users.clone(),
            storage.orders.clone(),
            storage.dataset.clone(),
            cache.clone(),
            CacheTtlPolicy::default(),
        );
        let dataset = DatasetService::new(storage.dataset.clone(), BulkInvalidator::new(cache.clone()));

        create_router(AppState::new(catalog, dataset, cache), None, "/metrics")
    }

    async fn seeded_catalog() -> Arc<InMemoryCatalog> {
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.insert_products(product_grid(30)).await.unwrap();
        catalog
            .insert_users((1..=2).map(new_user).collect())
            .await
            .unwrap();
        catalog
            .insert_orders(vec![
                new_order(1, 1, 2, 10.0),
                new_order(1, 2, 1, 17.5),
                new_order(2, 3, 3, 35.0),
                new_order(2, 4, 1, 52.5),
                new_order(1, 5, 4, 70.0),
            ])
            .await
            .unwrap();
        catalog
    }

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        (status, body)
    }

    async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Method::GET, uri).await
    }

    fn error_message(body: &Value) -> &str {
        body["error"]["message"].as_str().unwrap_or_default()
    }

    #[tokio::test]
    async fn test_root() {
        let app = app_with(Arc::new(InMemoryCatalog::new()), Arc::new(InMemoryCache::new()));

        let (status, body) = get(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Catalog Data API");
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_filtered_product_listing() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (status, body) = get(
            &app,
            "/products?category=Electronics&min_price=100&max_price=500&sort_by=price&sort_order=desc&size=5",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 8);
        assert_eq!(body["page"], 1);
        assert_eq!(body["size"], 5);
        assert_eq!(body["pages"], 2);

        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[0]["price"], 472.5);

        let prices: Vec<f64> = items.iter().map(|p| p["price"].as_f64().unwrap()).collect();
        assert!(prices.windows(2).all(|w| w[0] >= w[1]));
        assert!(items.iter().all(|p| p["category"] == "Electronics"));
        assert!(prices.iter().all(|p| (100.0..=500.0).contains(p)));
    }

    #[tokio::test]
    async fn test_second_request_is_served_identically_from_cache() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (_, first) = get(&app, "/products?brand=Sony&size=3").await;
        let (_, second) = get(&app, "/products?size=3&brand=Sony").await;

        assert_eq!(first, second);
        assert_eq!(first["items"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_sort_field_falls_back_to_id() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (status, body) = get(&app, "/products?sort_by=colour&size=3").await;
        assert_eq!(status, StatusCode::OK);

        let ids: Vec<i64> = body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_empty_filter_values_mean_absent() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (_, all_products) = get(&app, "/products").await;
        assert_eq!(all_products["total"], 30);

        for uri in ["/products?category=", "/products?brand=&search=", "/products?sort_by=&sort_order="] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::OK, "{}", uri);
            assert_eq!(body, all_products, "{}", uri);
        }

        let (_, all_users) = get(&app, "/users").await;
        let (status, body) = get(&app, "/users?city=&country=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, all_users);
        assert_eq!(body["total"], 2);

        let (status, body) = get(&app, "/orders?status=").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 5);
    }

    #[tokio::test]
    async fn test_invalid_list_parameters_are_rejected() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        for uri in [
            "/products?page=0",
            "/products?size=1001",
            "/products?size=0",
            "/products?sort_order=up",
            "/products?min_price=500&max_price=100",
            "/products?min_price=-1",
            "/products?page=abc",
            "/orders?status=lost",
            "/orders?user_id=0",
        ] {
            let (status, body) = get(&app, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body["error"]["type"], "invalid_request_error", "{}", uri);
        }

        let (_, body) = get(&app, "/products?page=0").await;
        assert_eq!(error_message(&body), "Page must be greater than 0");
    }

    #[tokio::test]
    async fn test_item_lookups() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (status, body) = get(&app, "/products/4").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 4);
        assert_eq!(body["category"], "Electronics");

        let (status, body) = get(&app, "/products/999").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(error_message(&body), "Product not found");

        let (status, body) = get(&app, "/users/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["param"], "id");

        let (status, _) = get(&app, "/orders/0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_orders_embed_user_and_product() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (status, body) = get(&app, "/orders/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["id"], 2);
        assert_eq!(body["product"]["id"], 3);
        assert_eq!(body["total_amount"], 105.0);

        let (status, body) = get(&app, "/orders?user_id=1&sort_by=total_amount&sort_order=desc").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
        assert_eq!(body["items"][0]["total_amount"], 280.0);
    }

    #[tokio::test]
    async fn test_unreachable_cache_serves_from_storage() {
        let healthy = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));
        let degraded = app_with(
            seeded_catalog().await,
            Arc::new(MockCache::new().with_error("connection refused")),
        );

        for uri in ["/products?category=Books&size=4", "/users/1", "/stats"] {
            let (status, expected) = get(&healthy, uri).await;
            let (degraded_status, body) = get(&degraded, uri).await;

            assert_eq!(status, StatusCode::OK);
            assert_eq!(degraded_status, StatusCode::OK, "{}", uri);
            assert_eq!(body, expected, "{}", uri);
        }

        let (status, body) = get(&degraded, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_truncate_clears_rows_and_cache() {
        let app = app_with(seeded_catalog().await, Arc::new(InMemoryCache::new()));

        let (_, before) = get(&app, "/products/1").await;
        assert_eq!(before["id"], 1);

        let (status, body) = send(&app, Method::DELETE, "/truncate-all").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deleted_counts"]["products"], 30);
        assert_eq!(body["deleted_counts"]["users"], 2);
        assert_eq!(body["deleted_counts"]["orders"], 5);
        assert_eq!(body["cache_cleared"], true);

        let (status, _) = get(&app, "/products/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, body) = get(&app, "/products").await;
        assert_eq!(body["total"], 0);
        assert_eq!(body["pages"], 0);
    }

    #[tokio::test]
    async fn test_seed_then_stats() {
        let app = app_with(Arc::new(InMemoryCatalog::new()), Arc::new(InMemoryCache::new()));

        let (status, body) =
            send(&app, Method::POST, "/seed-data?products=20&users=10&orders=40&seed=7").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["seeded"]["products"], 20);
        assert_eq!(body["seeded"]["users"], 10);
        assert_eq!(body["seeded"]["orders"], 40);

        let (status, body) = get(&app, "/stats").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_products"], 20);
        assert_eq!(body["total_orders"], 40);
    }

    #[tokio::test]
    async fn test_seed_rejects_oversized_request() {
        let app = app_with(Arc::new(InMemoryCatalog::new()), Arc::new(InMemoryCache::new()));

        let (status, _) = send(&app, Method::POST, "/seed-data?products=2000000").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_probes_and_headers() {
        let app = app_with(Arc::new(InMemoryCatalog::new()), Arc::new(InMemoryCache::new()));

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-request-id", "req-1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-request-id"], "req-1");

        let elapsed: f64 = response.headers()["x-process-time"]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!(elapsed >= 0.0);

        let (status, body) = get(&app, "/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, _) = get(&app, "/live").await;
        assert_eq!(status, StatusCode::OK);
    }
}
