//! Expenses API endpoints
//!
//! Uses the typed query flavour: `pageNumber`, `pageSize`, `sortBy`,
//! `sortOrder`, `freeSearchText` and a repeatable `status`.

use api_types::{
    expense::{ExpenseView, ExpensesQuery},
    page::ApiPage,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use axum_extra::extract::{Query, QueryRejection};
use engine::users;
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(workspace_id): Path<Uuid>,
    query: Result<Query<ExpensesQuery>, QueryRejection>,
) -> Result<Json<ApiPage<ExpenseView>>, ServerError> {
    let Query(query) = query.map_err(|rejection| ServerError::Generic(rejection.to_string()))?;
    let page = state
        .engine
        .list_expenses(workspace_id, &user.username, &query)
        .await?;
    Ok(Json(page))
}
