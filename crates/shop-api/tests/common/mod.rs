//! Shared setup for the database-backed API tests.
#![allow(dead_code)]

use async_trait::async_trait;
use axum_test::TestServer;
use secrecy::SecretString;
use serde_json::{json, Value};
use sqlx::PgPool;

use shop_api::db::ItemRepository;
use shop_api::{create_router, AppConfig, AppState};
use shop_core::{
    Currency, NewItem, PaymentError, PaymentIntent, PaymentProvider, PaymentRequest,
    PaymentResult, Price, WebhookEvent,
};

pub const CURRENCY: Currency = Currency::BGN;
pub const PASSWORD: &str = "correct horse";

pub fn config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        environment: "test".to_string(),
        database_url: SecretString::from("postgres://unused".to_string()),
        database_max_connections: 5,
        jwt_key: SecretString::from("integration-signing-key".to_string()),
        token_ttl_hours: 1,
        currency: CURRENCY,
        points_per_unit: 10,
        allow_admin_signup: true,
        catalog_path: "config/items.toml".to_string(),
        publishable_key: None,
        mail: None,
    }
}

/// Provider for tests that never reach checkout
pub struct NoPayments;

#[async_trait]
impl PaymentProvider for NoPayments {
    async fn create_payment_intent(&self, _: &PaymentRequest) -> PaymentResult<PaymentIntent> {
        Err(PaymentError::Configuration("payments are disabled".to_string()))
    }

    async fn verify_webhook(&self, _: &[u8], _: &str) -> PaymentResult<WebhookEvent> {
        Err(PaymentError::Configuration("payments are disabled".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "none"
    }
}

pub fn server(pool: PgPool) -> TestServer {
    let state = AppState::from_parts(config(), pool, std::sync::Arc::new(NoPayments), None);
    TestServer::new(create_router(state)).unwrap()
}

/// Register through the API and return a session token
pub async fn register(server: &TestServer, email: &str, account_type: &str) -> String {
    server
        .post("/api/v1/signup")
        .json(&json!({
            "name": "Ana",
            "email": email,
            "password": PASSWORD,
            "type": account_type
        }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/v1/login")
        .json(&json!({ "email": email, "password": PASSWORD }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

pub async fn item(pool: &PgPool, name: &str, description: &str, cents: i64) -> i64 {
    ItemRepository::new(pool, CURRENCY)
        .create(&NewItem {
            name: name.to_string(),
            description: description.to_string(),
            price: Price::from_cents(cents, CURRENCY),
        })
        .await
        .unwrap()
        .id
}

/// Names of the items in a `{items: [...]}` body
pub fn names(body: &Value) -> Vec<String> {
    body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["name"].as_str().unwrap().to_string())
        .collect()
}
