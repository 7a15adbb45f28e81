//! Coupon endpoints.

use axum::{extract::State, http::StatusCode};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{info, instrument};

use shop_core::NewCoupon;

use super::today;
use crate::db::CouponRepository;
use crate::error::ApiError;
use crate::extract::JsonBody;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub code: String,
    /// Percent off, 1..=100
    pub discount: i64,
    /// `YYYY-MM-DD`; the coupon stops working on this day
    #[serde(alias = "expirationDate")]
    pub expiration_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct RemoveCouponRequest {
    #[serde(default)]
    pub token: Option<String>,
    pub code: String,
}

/// Attach a coupon to the caller's account
#[instrument(skip(state, request), fields(code = %request.code))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<ApplyCouponRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;
    let today = today();

    let coupon = NewCoupon::parse(
        &request.code,
        request.discount,
        request.expiration_date,
        today,
    )?;

    let coupon = CouponRepository::new(&state.pool)
        .apply(claims.account_id(), &coupon, today)
        .await?;

    info!(
        "Applied coupon {} ({}%) to account {}",
        coupon.code,
        coupon.discount_percent,
        claims.account_id()
    );
    Ok(StatusCode::OK)
}

#[instrument(skip(state, request), fields(code = %request.code))]
pub async fn remove_coupon(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RemoveCouponRequest>,
) -> Result<StatusCode, ApiError> {
    let claims = state.authenticate(request.token.as_deref())?;

    let removed = CouponRepository::new(&state.pool)
        .remove(claims.account_id(), request.code.trim())
        .await?;
    if !removed {
        return Err(ApiError::not_found("coupon"));
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use crate::test_support::TestApp;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn in_days(days: i64) -> String {
        (Utc::now().date_naive() + Duration::days(days))
            .format("%Y-%m-%d")
            .to_string()
    }

    #[tokio::test]
    async fn test_expired_coupon_rejected() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/v1/coupon")
            .json(&json!({
                "token": app.user_token(),
                "code": "OLD",
                "discount": 10,
                "expiration_date": in_days(-1)
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"], "Coupon OLD has expired");
    }

    #[tokio::test]
    async fn test_discount_over_100_rejected() {
        let app = TestApp::new();

        let response = app
            .server
            .post("/api/v1/coupon")
            .json(&json!({
                "token": app.user_token(),
                "code": "GREEDY",
                "discount": 150,
                "expirationDate": in_days(30)
            }))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_date_rejected() {
        let app = TestApp::new();

        app.server
            .post("/api/v1/coupon")
            .json(&json!({
                "token": app.user_token(),
                "code": "SPRING",
                "discount": 10,
                "expiration_date": "next tuesday"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_remove_coupon_requires_token() {
        let app = TestApp::new();

        app.server
            .delete("/api/v1/coupon")
            .json(&json!({ "code": "SPRING" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
}
