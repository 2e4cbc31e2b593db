use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;

use contracts::domain::common::{AggregateId, ValidationError};
use contracts::domain::listing::aggregate::{CarListing, ListingId, ListingPatch, NewListing};

use crate::domain::listing::service::{CatalogService, SearchRequest, SearchResult};
use crate::error::CatalogError;

fn parse_id(id: &str) -> Result<ListingId, CatalogError> {
    ListingId::from_string(id).map_err(|e| ValidationError::new("id", e).into())
}

/// POST /api/listings
pub async fn create(
    State(service): State<CatalogService>,
    payload: Result<Json<NewListing>, JsonRejection>,
) -> Result<(StatusCode, Json<CarListing>), CatalogError> {
    let Json(draft) = payload.map_err(|e| ValidationError::new("body", e.body_text()))?;
    let listing = service.add_listing(draft).await?;
    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /api/listings/:id
pub async fn get_by_id(
    State(service): State<CatalogService>,
    Path(id): Path<String>,
) -> Result<Json<CarListing>, CatalogError> {
    let id = parse_id(&id)?;
    Ok(Json(service.get_listing(id).await?))
}

/// PATCH /api/listings/:id
pub async fn update(
    State(service): State<CatalogService>,
    Path(id): Path<String>,
    payload: Result<Json<ListingPatch>, JsonRejection>,
) -> Result<Json<CarListing>, CatalogError> {
    let id = parse_id(&id)?;
    let Json(patch) = payload.map_err(|e| ValidationError::new("body", e.body_text()))?;
    Ok(Json(service.update_listing(id, patch).await?))
}

/// POST /api/listings/:id/sold
pub async fn mark_sold(
    State(service): State<CatalogService>,
    Path(id): Path<String>,
) -> Result<Json<CarListing>, CatalogError> {
    let id = parse_id(&id)?;
    Ok(Json(service.mark_sold(id).await?))
}

/// DELETE /api/listings/:id
pub async fn delete(
    State(service): State<CatalogService>,
    Path(id): Path<String>,
) -> Result<StatusCode, CatalogError> {
    let id = parse_id(&id)?;
    service.remove_listing(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/listings
pub async fn search(
    State(service): State<CatalogService>,
    query: Result<Query<SearchRequest>, QueryRejection>,
) -> Result<Json<SearchResult>, CatalogError> {
    let Query(request) = query.map_err(|e| ValidationError::new("query", e.body_text()))?;
    Ok(Json(service.search(request).await?))
}
