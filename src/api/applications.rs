//! Read-only application API endpoints for staff.

use axum::extract::{Path, Query, State};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::ListApplicationsQuery;
use crate::store::{Fields, RecordFilter};
use crate::AppState;

/// GET /api/applications/{collection} - List stored applications, optionally by status.
pub async fn list_applications(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListApplicationsQuery>,
) -> ApiResult<Vec<Fields>> {
    let filter = RecordFilter {
        status: query.status.map(|s| s.as_str().to_string()),
        ..Default::default()
    };

    let records = state.store.select(&collection, &filter).await?;
    success(records)
}

/// GET /api/applications/{collection}/{id} - Get a single application.
pub async fn get_application(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Fields> {
    let record = state
        .store
        .select(&collection, &RecordFilter::by_id(id.clone()))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Application {} not found", id)))?;

    success(record)
}
