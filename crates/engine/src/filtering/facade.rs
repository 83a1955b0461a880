//! Orchestration of a list endpoint: workspace access, query, mapping.

use std::future::Future;

use api_types::page::ApiPage;
use sea_orm::{DatabaseConnection, EntityTrait};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, workspaces};

use super::{
    executor::QueryExecutor, request::FilteringRequest, specification::QuerySpecification,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// The workspace a request addresses, on behalf of whom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkspaceScope {
    pub workspace_id: Uuid,
    pub user_id: String,
    pub mode: AccessMode,
}

impl WorkspaceScope {
    pub fn read(workspace_id: Uuid, user_id: &str) -> Self {
        Self {
            workspace_id,
            user_id: user_id.to_string(),
            mode: AccessMode::ReadOnly,
        }
    }
}

/// Decides whether a user may address a workspace.
///
/// Fails with [`EngineError::KeyNotFound`] or [`EngineError::Forbidden`].
pub trait WorkspaceAccess {
    fn validate_access(
        &self,
        workspace_id: Uuid,
        user_id: &str,
        mode: AccessMode,
    ) -> impl Future<Output = ResultEngine<workspaces::Model>> + Send;
}

pub struct FilteringFacade<E: EntityTrait, R, A> {
    specification: QuerySpecification<E, R>,
    executor: QueryExecutor,
    access: A,
}

impl<E, R, A> std::fmt::Debug for FilteringFacade<E, R, A>
where
    E: EntityTrait,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteringFacade")
            .field("specification", &self.specification)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl<E, R, A> FilteringFacade<E, R, A>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    R: FilteringRequest,
    A: WorkspaceAccess,
{
    pub fn new(specification: QuerySpecification<E, R>, executor: QueryExecutor, access: A) -> Self {
        Self {
            specification,
            executor,
            access,
        }
    }

    /// Like [`FilteringFacade::new`], for endpoints that are always addressed
    /// through a workspace.
    pub fn workspace_scoped(
        specification: QuerySpecification<E, R>,
        executor: QueryExecutor,
        access: A,
    ) -> ResultEngine<Self> {
        if !specification.has_workspace_filter() {
            let table = E::default().table_name().to_string();
            tracing::error!(table, "workspace scoped facade without a workspace filter");
            return Err(EngineError::Configuration(format!(
                "workspace filter is not configured for '{table}'"
            )));
        }
        Ok(Self::new(specification, executor, access))
    }

    pub fn specification(&self) -> &QuerySpecification<E, R> {
        &self.specification
    }

    /// Validate access to the addressed workspace, run the query and map
    /// every row. No query is issued when access is denied.
    pub async fn execute_filtering<D, M>(
        &self,
        db: &DatabaseConnection,
        request: &R,
        scope: Option<&WorkspaceScope>,
        map: M,
    ) -> ResultEngine<ApiPage<D>>
    where
        M: FnMut(E::Model) -> ResultEngine<D>,
    {
        let workspace_id = match scope {
            Some(scope) => {
                self.access
                    .validate_access(scope.workspace_id, &scope.user_id, scope.mode)
                    .await?;
                Some(scope.workspace_id)
            }
            None => None,
        };

        let page = self
            .executor
            .execute_filtering_query(db, &self.specification, request, workspace_id)
            .await?
            .map(map)?;

        Ok(ApiPage {
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements: page.total_elements,
            data: page.data,
        })
    }
}
