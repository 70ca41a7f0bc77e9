//! Checkout, transaction lookup and sales reports.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use stockroom_core::validation::parse_report_date;
use stockroom_core::{CheckoutRequest, SalesSummary, Transaction};

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

/// `POST /api/checkout`
pub async fn checkout(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<Transaction>)> {
    let transaction = state.sales.checkout(&request.items).await?;
    Ok((StatusCode::CREATED, Json(transaction)))
}

/// `GET /api/transactions/{id}`
pub async fn get_transaction(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Transaction>> {
    Ok(Json(state.sales.get_transaction(id).await?))
}

/// `GET /api/report/today`
pub async fn today_summary(State(state): State<AppState>) -> ApiResult<Json<SalesSummary>> {
    Ok(Json(state.sales.today_summary().await?))
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// `GET /api/report?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD`
///
/// Both bounds are required and inclusive. Blank values count as missing.
pub async fn range_summary(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> ApiResult<Json<SalesSummary>> {
    let start = query
        .start_date
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_report_date("start_date", v))
        .transpose()?;
    let end = query
        .end_date
        .as_deref()
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_report_date("end_date", v))
        .transpose()?;

    Ok(Json(state.sales.range_summary(start, end).await?))
}

#[cfg(test)]
mod tests {
    use crate::test_support::spawn_server;
    use chrono::Utc;
    use serde_json::{json, Value};
    use stockroom_core::{Money, NewCategory, NewProduct};

    /// Kopi{10.00, stock 5}, Roti{3.50, stock 2}
    async fn setup() -> (String, stockroom_db::Database, i64, i64) {
        let (base, db) = spawn_server().await;
        let category = db
            .categories()
            .create(&NewCategory {
                name: "Cafe".into(),
                description: String::new(),
            })
            .await
            .unwrap();
        let kopi = db
            .products()
            .create(&NewProduct {
                name: "Kopi".into(),
                price_cents: 1000,
                stock: 5,
                category_id: category.id,
            })
            .await
            .unwrap();
        let roti = db
            .products()
            .create(&NewProduct {
                name: "Roti".into(),
                price_cents: 350,
                stock: 2,
                category_id: category.id,
            })
            .await
            .unwrap();
        (base, db, kopi.id, roti.id)
    }

    #[tokio::test]
    async fn test_checkout_and_lookup() {
        let (base, db, kopi, roti) = setup().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/api/checkout", base))
            .json(&json!({ "items": [
                { "product_id": kopi, "quantity": 2 },
                { "product_id": roti, "quantity": 2 }
            ]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let tx: Value = resp.json().await.unwrap();
        assert_eq!(tx["total_cents"], 2700);
        assert_eq!(tx["details"].as_array().unwrap().len(), 2);
        assert_eq!(tx["details"][0]["product"]["name"], "Kopi");

        assert_eq!(db.products().get(kopi).await.unwrap().stock, 3);
        assert_eq!(db.products().get(roti).await.unwrap().stock, 0);

        let resp = client
            .get(format!("{}/api/transactions/{}", base, tx["id"]))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let loaded: Value = resp.json().await.unwrap();
        assert_eq!(loaded["total_cents"], 2700);
        assert_eq!(loaded["details"][1]["subtotal_cents"], 700);

        let resp = client
            .get(format!("{}/api/transactions/999", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_rejected_checkouts() {
        let (base, db, kopi, roti) = setup().await;
        let client = reqwest::Client::new();
        let url = format!("{}/api/checkout", base);

        let resp = client.post(&url).json(&json!({ "items": [] })).send().await.unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .post(&url)
            .json(&json!({ "items": [{ "product_id": kopi, "quantity": 0 }] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .post(&url)
            .json(&json!({ "items": [
                { "product_id": kopi, "quantity": 1 },
                { "product_id": roti, "quantity": 3 }
            ]}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");

        let resp = client
            .post(&url)
            .json(&json!({ "items": [{ "product_id": 999, "quantity": 1 }] }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);

        // Nothing survived the failures
        assert_eq!(db.products().get(kopi).await.unwrap().stock, 5);
        assert_eq!(db.transactions().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reports() {
        let (base, db, kopi, roti) = setup().await;
        let client = reqwest::Client::new();

        client
            .post(format!("{}/api/checkout", base))
            .json(&json!({ "items": [{ "product_id": roti, "quantity": 2 }] }))
            .send()
            .await
            .unwrap();
        db.transactions()
            .record(
                "2024-01-03T08:00:00Z".parse().unwrap(),
                &[(kopi, 3, Money::from_cents(3000))],
            )
            .await
            .unwrap();

        let summary: Value = client
            .get(format!("{}/api/report/today", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(summary["total_revenue_cents"], 700);
        assert_eq!(summary["total_transactions"], 1);
        assert_eq!(summary["best_selling_product"]["name"], "Roti");

        let today = Utc::now().date_naive();
        let range: Value = client
            .get(format!(
                "{}/api/report?start_date=2024-01-01&end_date={}",
                base, today
            ))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(range["total_revenue_cents"], 3700);
        assert_eq!(range["total_transactions"], 2);
        assert_eq!(range["best_selling_product"]["product_id"], kopi);

        let resp = client
            .get(format!("{}/api/report?start_date=2024-01-01", base))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .get(format!(
                "{}/api/report?start_date=2024-02-01&end_date=2024-01-01",
                base
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = client
            .get(format!(
                "{}/api/report?start_date=01-02-2024&end_date=2024-01-31",
                base
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let (base, _db, kopi, _) = setup().await;
        let client = reqwest::Client::new();

        client
            .post(format!("{}/api/checkout", base))
            .json(&json!({ "items": [{ "product_id": kopi, "quantity": 1 }] }))
            .send()
            .await
            .unwrap();

        let resp = client
            .delete(format!("{}/api/products/{}", base, kopi))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "STILL_REFERENCED");
    }
}
