//! Category endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use tracing::info;

use stockroom_core::{Category, CategoryUpdate, NewCategory};

use super::MessageResponse;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

/// `GET /api/categories`
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.db.categories().list().await?))
}

/// `POST /api/categories`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let category = state.db.categories().create(&new).await?;
    info!(id = category.id, name = %category.name, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// `GET /api/categories/{id}`
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().get(id).await?))
}

/// `PUT /api/categories/{id}`
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<CategoryUpdate>,
) -> ApiResult<Json<Category>> {
    Ok(Json(state.db.categories().update(id, &update).await?))
}

/// `DELETE /api/categories/{id}`
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.categories().delete(id).await?;
    info!(id, "Category deleted");
    Ok(Json(MessageResponse::new("category deleted")))
}

#[cfg(test)]
mod tests {
    use crate::test_support::spawn_server;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_category_lifecycle() {
        let (base, _db) = spawn_server().await;
        let client = reqwest::Client::new();
        let url = format!("{}/api/categories", base);

        let resp = client
            .post(&url)
            .json(&json!({ "name": "Drinks", "description": "Cold ones" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
        let created: Value = resp.json().await.unwrap();
        let id = created["id"].as_i64().unwrap();

        // Duplicate name
        let resp = client
            .post(&url)
            .json(&json!({ "name": "Drinks" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "INVALID_REQUEST");

        // Empty name keeps the current one
        let resp = client
            .put(format!("{}/{}", url, id))
            .json(&json!({ "name": "", "description": "Hot and cold" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let updated: Value = resp.json().await.unwrap();
        assert_eq!(updated["name"], "Drinks");
        assert_eq!(updated["description"], "Hot and cold");

        let list: Vec<Value> = client.get(&url).send().await.unwrap().json().await.unwrap();
        assert_eq!(list.len(), 1);

        let resp = client.delete(format!("{}/{}", url, id)).send().await.unwrap();
        assert_eq!(resp.status(), 200);

        let resp = client.get(format!("{}/{}", url, id)).send().await.unwrap();
        assert_eq!(resp.status(), 404);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_delete_refused_while_in_use() {
        let (base, _db) = spawn_server().await;
        let client = reqwest::Client::new();

        let category: Value = client
            .post(format!("{}/api/categories", base))
            .json(&json!({ "name": "Snacks" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let category_id = category["id"].as_i64().unwrap();

        client
            .post(format!("{}/api/products", base))
            .json(&json!({
                "name": "Chips",
                "price_cents": 250,
                "stock": 3,
                "category_id": category_id
            }))
            .send()
            .await
            .unwrap();

        let resp = client
            .delete(format!("{}/api/categories/{}", base, category_id))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 409);
    }
}
