//! Invoices API endpoints

use api_types::{invoice::InvoiceView, page::ApiPage};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{filtering::RawFilteringRequest, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

/// `GET /workspaces/{workspace_id}/invoices?status[in]=DRAFT,SENT&page=1&limit=10`
pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(workspace_id): Path<Uuid>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiPage<InvoiceView>>, ServerError> {
    let request = RawFilteringRequest::parse(params)?;
    let page = state
        .engine
        .list_invoices(workspace_id, &user.username, &request)
        .await?;
    Ok(Json(page))
}
