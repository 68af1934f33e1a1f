//! Generic CRUD handler group mounted under each resource prefix.

use crate::error::{AppError, AppResult};
use crate::models::PaginatedResponse;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use axum::{Extension, Router};
use std::sync::Arc;
use uuid::Uuid;

use super::payload::Payload;
use super::types::ListQuery;
use super::AppState;

/// Collection served by a handler group.
#[derive(Debug, Clone, Copy)]
pub struct Collection(pub &'static str);

/// Build the CRUD handler group for one collection
pub fn resource_routes(collection: &'static str) -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_documents).post(create_document))
        .route(
            "/{id}",
            get(get_document)
                .put(replace_document)
                .patch(merge_document)
                .delete(delete_document),
        )
        .layer(Extension(Collection(collection)))
}

fn parse_id(collection: Collection, id: &str) -> AppResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| AppError::DocumentNotFound {
        collection: collection.0.to_string(),
        id: id.to_string(),
    })
}

/// List documents (paginated)
pub async fn list_documents(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> AppResult<impl IntoResponse> {
    let Query(query) = query.map_err(|e| AppError::InvalidQuery(e.body_text()))?;
    let limit = query.limit();
    let offset = query.offset();

    let (items, total) = state.store.list(collection.0, limit, offset).await?;
    Ok(Json(PaginatedResponse::new(items, total, limit, offset)))
}

/// Create a document
pub async fn create_document(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    Payload(data): Payload,
) -> AppResult<impl IntoResponse> {
    let doc = state.store.create(collection.0, data).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Fetch a single document
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(collection, &id)?;
    let doc = state.store.get(collection.0, id).await?;
    Ok(Json(doc))
}

/// Replace every field of a document
pub async fn replace_document(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    Payload(data): Payload,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(collection, &id)?;
    let doc = state.store.replace(collection.0, id, data).await?;
    Ok(Json(doc))
}

/// Update the given top-level fields of a document
pub async fn merge_document(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    Payload(patch): Payload,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(collection, &id)?;
    let doc = state.store.merge(collection.0, id, patch).await?;
    Ok(Json(doc))
}

/// Delete a document
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let id = parse_id(collection, &id)?;
    state.store.delete(collection.0, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
