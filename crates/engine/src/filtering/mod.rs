//! Generic filtering, sorting and pagination of list endpoints.
//!
//! A request (either the `<field>[<operator>]=<value>` query grammar parsed
//! by [`RawFilteringRequest`], or a typed request implementing
//! [`FilteringRequest`]) is compiled by a [`QuerySpecification`] into a
//! count query and a data query, executed by the [`QueryExecutor`] and
//! wrapped into an `ApiPage` by the [`FilteringFacade`].

mod executor;
mod facade;
mod operators;
mod request;
mod specification;

pub use executor::{Page, QueryExecutor};
pub use facade::{AccessMode, FilteringFacade, WorkspaceAccess, WorkspaceScope};
pub use operators::{Arity, FilteringOperator, OperatorRegistry};
pub use request::{
    DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, FilteringRequest, MAX_ROWS, PageRequest, Predicate,
    RESERVED_PARAMETERS, RawFilteringRequest, SortDirection, SortRequest,
};
pub use specification::{FieldKind, QuerySpecification, QuerySpecificationBuilder};
