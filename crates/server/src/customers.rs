use api_types::{customer::CustomerView, page::ApiPage};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use engine::{filtering::RawFilteringRequest, users};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(workspace_id): Path<Uuid>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<ApiPage<CustomerView>>, ServerError> {
    let request = RawFilteringRequest::parse(params)?;
    let page = state
        .engine
        .list_customers(workspace_id, &user.username, &request)
        .await?;
    Ok(Json(page))
}
