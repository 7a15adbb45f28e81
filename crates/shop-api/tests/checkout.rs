//! Checkout and coupon behavior against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL` pointing at a server where the user may create
//! databases: `cargo test -p shop-api -- --ignored`.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use sqlx::PgPool;

use shop_api::checkout::{CheckoutError, CheckoutService};
use shop_api::db::{AccountRepository, CartRepository, CouponRepository, ItemRepository, RepositoryError};
use shop_core::{
    Account, AccountType, Currency, NewAccount, NewCoupon, NewItem, PaymentError, PaymentIntent,
    PaymentProvider, PaymentRequest, PaymentResult, Price, ShopError, WebhookEvent,
};

const CURRENCY: Currency = Currency::BGN;

#[derive(Default)]
struct FakeProvider {
    calls: AtomicUsize,
    fail: bool,
}

impl FakeProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_payment_intent(
        &self,
        request: &PaymentRequest,
    ) -> PaymentResult<PaymentIntent> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail {
            return Err(PaymentError::NetworkError("connection reset".to_string()));
        }
        Ok(PaymentIntent {
            id: format!("pi_{}", n),
            client_secret: format!("pi_{}_secret", n),
            amount: request.amount.amount,
            currency: request.amount.currency,
            status: "requires_payment_method".to_string(),
            customer_id: None,
            created_at: Utc::now(),
        })
    }

    async fn verify_webhook(&self, _: &[u8], _: &str) -> PaymentResult<WebhookEvent> {
        Err(PaymentError::Configuration("not used".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn account(pool: &PgPool, email: &str) -> Account {
    AccountRepository::new(pool)
        .create(&NewAccount {
            name: "Ana".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$unused".to_string(),
            account_type: AccountType::User,
        })
        .await
        .unwrap()
}

async fn item(pool: &PgPool, name: &str, cents: i64) -> i64 {
    ItemRepository::new(pool, CURRENCY)
        .create(&NewItem {
            name: name.to_string(),
            description: String::new(),
            price: Price::from_cents(cents, CURRENCY),
        })
        .await
        .unwrap()
        .id
}

async fn coupon(pool: &PgPool, account_id: i64, code: &str, percent: i64) {
    let coupon = NewCoupon::parse(code, percent, today() + Duration::days(30), today()).unwrap();
    CouponRepository::new(pool)
        .apply(account_id, &coupon, today())
        .await
        .unwrap();
}

async fn points(pool: &PgPool, account_id: i64) -> i64 {
    AccountRepository::new(pool)
        .get_by_id(account_id)
        .await
        .unwrap()
        .unwrap()
        .points
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn checkout_without_coupon_charges_full_price(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;
    let lamp = item(&pool, "Desk lamp", 1250).await;
    let cart = CartRepository::new(&pool, CURRENCY);
    cart.add(ana.id, lamp, 2).await.unwrap();

    let provider = FakeProvider::default();
    let receipt = CheckoutService::new(&pool, &provider, CURRENCY, 10)
        .checkout(ana.id, today())
        .await
        .unwrap();

    assert_eq!(receipt.quote.total.amount, 2500);
    assert_eq!(receipt.quote.discount_percent, None);
    assert_eq!(receipt.payment_intent.unwrap().amount, 2500);
    assert_eq!(receipt.quote.points, 250);

    assert!(cart.lines(ana.id).await.unwrap().is_empty());
    assert_eq!(points(&pool, ana.id).await, 250);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn coupon_discount_applies_exactly_once(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;
    let chair = item(&pool, "Chair", 5000).await;
    let cart = CartRepository::new(&pool, CURRENCY);
    coupon(&pool, ana.id, "SPRING20", 20).await;

    let provider = FakeProvider::default();
    let service = CheckoutService::new(&pool, &provider, CURRENCY, 10);

    cart.add(ana.id, chair, 1).await.unwrap();
    let price = service.quote(ana.id, today()).await.unwrap();
    assert_eq!(price.total.amount, 4000);

    let first = service.checkout(ana.id, today()).await.unwrap();
    assert_eq!(first.quote.discount_percent, Some(20));
    assert_eq!(first.quote.total.amount, 4000);
    assert!(CouponRepository::new(&pool)
        .active(ana.id, today())
        .await
        .unwrap()
        .is_none());

    cart.add(ana.id, chair, 1).await.unwrap();
    let second = service.checkout(ana.id, today()).await.unwrap();
    assert_eq!(second.quote.discount_percent, None);
    assert_eq!(second.quote.total.amount, 5000);

    assert_eq!(points(&pool, ana.id).await, 400 + 500);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn invalid_coupons_are_rejected(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;

    assert!(matches!(
        NewCoupon::parse("OLD", 10, today() - Duration::days(1), today()),
        Err(ShopError::CouponExpired { .. })
    ));
    assert!(matches!(
        NewCoupon::parse("GREEDY", 101, today() + Duration::days(1), today()),
        Err(ShopError::DiscountOutOfRange { percent: 101 })
    ));

    coupon(&pool, ana.id, "FIRST", 10).await;
    let second = NewCoupon::parse("SECOND", 10, today() + Duration::days(5), today()).unwrap();
    let err = CouponRepository::new(&pool)
        .apply(ana.id, &second, today())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    // a stored coupon that has since expired is ignored at checkout
    let lamp = item(&pool, "Desk lamp", 1000).await;
    CartRepository::new(&pool, CURRENCY).add(ana.id, lamp, 1).await.unwrap();
    let provider = FakeProvider::default();
    let quote = CheckoutService::new(&pool, &provider, CURRENCY, 10)
        .quote(ana.id, today() + Duration::days(60))
        .await
        .unwrap();
    assert_eq!(quote.discount_percent, None);
    assert_eq!(quote.total.amount, 1000);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn concurrent_checkouts_charge_once(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;
    let lamp = item(&pool, "Desk lamp", 1999).await;
    CartRepository::new(&pool, CURRENCY).add(ana.id, lamp, 3).await.unwrap();

    let provider = FakeProvider::default();
    let service = CheckoutService::new(&pool, &provider, CURRENCY, 10);

    let (a, b) = tokio::join!(
        service.checkout(ana.id, today()),
        service.checkout(ana.id, today())
    );

    let results = [a, b];
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    let empty = results
        .iter()
        .filter(|r| matches!(r, Err(CheckoutError::Shop(ShopError::EmptyCart))))
        .count();

    assert_eq!(succeeded, 1);
    assert_eq!(empty, 1);
    assert_eq!(provider.calls(), 1);
    assert_eq!(points(&pool, ana.id).await, 599);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn provider_failure_rolls_back(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;
    let chair = item(&pool, "Chair", 5000).await;
    let cart = CartRepository::new(&pool, CURRENCY);
    cart.add(ana.id, chair, 1).await.unwrap();
    coupon(&pool, ana.id, "SPRING20", 20).await;

    let provider = FakeProvider::failing();
    let err = CheckoutService::new(&pool, &provider, CURRENCY, 10)
        .checkout(ana.id, today())
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::Payment(_)));

    assert_eq!(cart.lines(ana.id).await.unwrap().len(), 1);
    assert!(CouponRepository::new(&pool)
        .active(ana.id, today())
        .await
        .unwrap()
        .is_some());
    assert_eq!(points(&pool, ana.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn full_discount_settles_without_payment(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;
    let chair = item(&pool, "Chair", 5000).await;
    let cart = CartRepository::new(&pool, CURRENCY);
    cart.add(ana.id, chair, 1).await.unwrap();
    coupon(&pool, ana.id, "FREE", 100).await;

    let provider = FakeProvider::default();
    let receipt = CheckoutService::new(&pool, &provider, CURRENCY, 10)
        .checkout(ana.id, today())
        .await
        .unwrap();

    assert!(receipt.payment_intent.is_none());
    assert!(receipt.quote.is_free());
    assert_eq!(provider.calls(), 0);
    assert!(cart.lines(ana.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn empty_cart_cannot_be_checked_out(pool: PgPool) {
    let ana = account(&pool, "ana@example.com").await;

    let provider = FakeProvider::default();
    let err = CheckoutService::new(&pool, &provider, CURRENCY, 10)
        .checkout(ana.id, today())
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Shop(ShopError::EmptyCart)));
    assert_eq!(provider.calls(), 0);
}
