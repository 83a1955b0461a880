use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::{
    ResultEngine,
    filtering::{FilteringFacade, QueryExecutor, RawFilteringRequest},
};

mod access;
mod customers;
mod expenses;
mod invoices;

pub use access::DbWorkspaceAccess;

type Facade<E, R> = FilteringFacade<E, R, DbWorkspaceAccess>;

/// List operations of every workspace endpoint.
///
/// The query specifications are built once by [`EngineBuilder::build`] and
/// only read afterwards, so a single `Engine` can serve concurrent requests.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    invoices: Facade<crate::invoices::Entity, RawFilteringRequest>,
    customers: Facade<crate::customers::Entity, RawFilteringRequest>,
    expenses: Facade<crate::expenses::Entity, api_types::expense::ExpensesQuery>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn database(&self) -> &DatabaseConnection {
        &self.database
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    query_timeout: Option<Duration>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Bound every database round trip of a list operation.
    pub fn query_timeout(mut self, timeout: Option<Duration>) -> EngineBuilder {
        self.query_timeout = timeout;
        self
    }

    /// Construct `Engine`
    ///
    /// Fails if an endpoint is wired incorrectly.
    pub async fn build(self) -> ResultEngine<Engine> {
        let executor = match self.query_timeout {
            Some(timeout) => QueryExecutor::with_timeout(timeout),
            None => QueryExecutor::new(),
        };
        let access = DbWorkspaceAccess::new(self.database.clone());

        Ok(Engine {
            invoices: FilteringFacade::workspace_scoped(
                invoices::specification()?,
                executor,
                access.clone(),
            )?,
            customers: FilteringFacade::workspace_scoped(
                customers::specification()?,
                executor,
                access.clone(),
            )?,
            expenses: FilteringFacade::workspace_scoped(
                expenses::specification()?,
                executor,
                access,
            )?,
            database: self.database,
        })
    }
}
