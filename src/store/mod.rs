pub mod schema;
pub use schema::*;

pub mod table;
pub use table::*;

pub mod db;
pub use db::*;
