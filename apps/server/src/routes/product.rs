//! Product endpoints.
//!
//! `GET /api/products` doubles as search and category filter:
//! `?category_id=` wins over `?name=`; neither lists everything.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use stockroom_core::validation::validate_search_query;
use stockroom_core::{NewProduct, Product, ProductUpdate};

use super::MessageResponse;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub name: Option<String>,
    pub category_id: Option<i64>,
}

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.db.products();

    if let Some(category_id) = query.category_id {
        return Ok(Json(products.list_by_category(category_id).await?));
    }

    match query.name.as_deref().map(validate_search_query).transpose()?.flatten() {
        Some(fragment) => Ok(Json(products.search_by_name(&fragment).await?)),
        None => Ok(Json(products.list().await?)),
    }
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    ApiJson(new): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let product = state.db.products().create(&new).await?;
    info!(id = product.id, name = %product.name, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `GET /api/products/{id}`
pub async fn get(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().get(id).await?))
}

/// `PUT /api/products/{id}`
pub async fn update(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(update): ApiJson<ProductUpdate>,
) -> ApiResult<Json<Product>> {
    Ok(Json(state.db.products().update(id, &update).await?))
}

/// `DELETE /api/products/{id}`
pub async fn delete(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<MessageResponse>> {
    state.db.products().delete(id).await?;
    info!(id, "Product deleted");
    Ok(Json(MessageResponse::new("product deleted")))
}
