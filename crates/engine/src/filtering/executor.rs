//! Runs query specifications: one count query and one paged data query.

use std::{future::Future, time::Duration};

use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, QuerySelect};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

use super::{request::FilteringRequest, specification::QuerySpecification};

/// One page of root entities plus the total number of matches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page<T> {
    pub page_number: u64,
    pub page_size: u64,
    pub total_elements: u64,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    pub fn map<U, F>(self, f: F) -> ResultEngine<Page<U>>
    where
        F: FnMut(T) -> ResultEngine<U>,
    {
        Ok(Page {
            page_number: self.page_number,
            page_size: self.page_size,
            total_elements: self.total_elements,
            data: self
                .data
                .into_iter()
                .map(f)
                .collect::<ResultEngine<Vec<_>>>()?,
        })
    }
}

/// Runs a specification against the database.
///
/// The count and the data query are built independently from the same
/// specification so that sorting, offset and limit never leak into the
/// count. Both may run on different pooled connections.
#[derive(Clone, Copy, Debug, Default)]
pub struct QueryExecutor {
    timeout: Option<Duration>,
}

impl QueryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound every database round trip by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn execute_filtering_query<E, R>(
        &self,
        db: &DatabaseConnection,
        specification: &QuerySpecification<E, R>,
        request: &R,
        workspace_id: Option<Uuid>,
    ) -> ResultEngine<Page<E::Model>>
    where
        E: EntityTrait,
        E::Model: Send + Sync,
        R: FilteringRequest,
    {
        let page = request.page_request()?;
        specification.validate_request(request)?;

        let total_elements = self
            .run(
                specification
                    .filtered_query(request, workspace_id)?
                    .count(db),
            )
            .await?;

        let data_query = specification
            .apply_sorting(
                specification.filtered_query(request, workspace_id)?,
                page.sort.as_ref(),
            )
            .offset(page.offset())
            .limit(page.page_size);
        let data = self.run(data_query.all(db)).await?;

        let entity = E::default();
        tracing::debug!(
            table = entity.table_name(),
            page_number = page.page_number,
            page_size = page.page_size,
            total_elements,
            returned = data.len(),
            "filtering query executed"
        );

        Ok(Page {
            page_number: page.page_number,
            page_size: page.page_size,
            total_elements,
            data,
        })
    }

    async fn run<T, F>(&self, query: F) -> ResultEngine<T>
    where
        F: Future<Output = Result<T, DbErr>>,
    {
        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, query).await {
                Ok(result) => result.map_err(Into::into),
                Err(_) => {
                    tracing::warn!(?timeout, "query timed out");
                    Err(EngineError::Timeout(timeout))
                }
            },
            None => query.await.map_err(Into::into),
        }
    }
}
