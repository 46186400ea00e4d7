pub mod projection;
pub use projection::{
    all, col, named, resolve, slugify, sql, ColumnCatalog, Pluck, PluckError, Record, RecordShape,
    ResolvedProjection, RowSource, Specifier,
};

pub mod query;
pub use query::{Comparator, QueryError, Scope, SelectExpr};

pub mod store;
pub use store::{ColumnInfo, Db, DbCommon, InternalDb, InternalTable, Table, TableSchema, ValueType};
