pub use error::EngineError;
pub use ops::{DbWorkspaceAccess, Engine, EngineBuilder};

pub mod customers;
mod error;
pub mod expenses;
pub mod filtering;
pub mod invoices;
mod ops;
pub mod users;
mod util;
pub mod workspace_members;
pub mod workspaces;

pub type ResultEngine<T> = Result<T, EngineError>;
