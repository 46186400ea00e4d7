pub mod query_error;
pub use query_error::*;

pub mod select_expr;
pub use select_expr::*;

pub mod aggregate;
pub use aggregate::*;

pub mod eval;
pub use eval::*;

pub mod scope;
pub use scope::*;
