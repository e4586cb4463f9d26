//! Command implementations for the pgconn CLI

pub mod check;
pub mod query;
pub mod status;

pub use check::run_check;
pub use query::run_query;
pub use status::run_status;
