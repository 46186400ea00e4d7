use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    projection::{ColumnCatalog, RowSource},
    query::{
        aggregate,
        eval::Eval,
        select_expr::{AggregateArg, ParsedSelect},
        Comparator, QueryError, SelectExpr,
    },
    store::{Db, DbCommon},
};

/// Inner equi-join against another table.
#[derive(Debug, Clone)]
pub struct Join {
    pub table: String,
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub column: String,
    pub op: Comparator,
    pub value: Value,
}

/// A scoped, not-yet-executed query over one primary table. Filters, joins
/// and grouping are set up front; execution happens once, when a projection
/// asks for rows.
pub struct Scope {
    db: Db,
    table: String,
    joins: Vec<Join>,
    filters: Vec<Filter>,
    group_by: Vec<String>,
}

impl Scope {
    pub fn new(db: &Db, table: &str) -> Self {
        Self {
            db: db.clone(),
            table: table.to_ascii_lowercase(),
            joins: Vec::new(),
            filters: Vec::new(),
            group_by: Vec::new(),
        }
    }

    pub fn join(mut self, table: &str, left: &str, right: &str) -> Self {
        self.joins.push(Join {
            table: table.to_ascii_lowercase(),
            left: left.to_string(),
            right: right.to_string(),
        });
        self
    }

    pub fn filter(mut self, column: &str, op: Comparator, value: Value) -> Self {
        self.filters.push(Filter { column: column.to_string(), op, value });
        self
    }

    pub fn group(mut self, column: &str) -> Self {
        self.group_by.push(column.to_string());
        self
    }

    /// Primary table first, then join tables in declaration order. Bare
    /// column names resolve in this order.
    fn tables(&self) -> Vec<String> {
        let mut tables = Vec::with_capacity(self.joins.len() + 1);
        tables.push(self.table.clone());
        tables.extend(self.joins.iter().map(|j| j.table.clone()));
        tables
    }

    /// Rows of one table with keys qualified as `table.column`.
    fn load_table(&self, table: &str) -> Result<Vec<Map<String, Value>>, QueryError> {
        let handle = self
            .db
            .get(table)
            .ok_or_else(|| QueryError::UnknownTable(table.to_string()))?;
        let guard = handle.read().unwrap();
        let mut out = Vec::with_capacity(guard.len());
        for row in guard.rows() {
            let mut qualified = Map::new();
            for (k, v) in row {
                qualified.insert(format!("{table}.{k}"), v.clone());
            }
            out.push(qualified);
        }
        Ok(out)
    }

    /// Materialize the scope: primary rows, then each join (nested loop over
    /// merged qualified-key maps), then filters.
    fn load_rows(&self) -> Result<Vec<Map<String, Value>>, QueryError> {
        let tables = self.tables();
        let mut rows = self.load_table(&self.table)?;

        for join in &self.joins {
            let right_rows = self.load_table(&join.table)?;
            let mut joined = Vec::new();
            for left_row in &rows {
                for right_row in &right_rows {
                    let mut merged = left_row.clone();
                    for (k, v) in right_row {
                        merged.insert(k.clone(), v.clone());
                    }
                    let l = Eval::lookup(&merged, &tables, &join.left)?;
                    let r = Eval::lookup(&merged, &tables, &join.right)?;
                    if Eval::compare(&l, Comparator::Eq, &r) {
                        joined.push(merged);
                    }
                }
            }
            rows = joined;
        }

        for filter in &self.filters {
            let mut kept = Vec::new();
            for row in rows {
                let v = Eval::lookup(&row, &tables, &filter.column)?;
                if Eval::compare(&v, filter.op, &filter.value) {
                    kept.push(row);
                }
            }
            rows = kept;
        }

        Ok(rows)
    }

    fn fetch_grouped(
        &self,
        rows: &[Map<String, Value>],
        tables: &[String],
        parsed: &[ParsedSelect],
    ) -> Result<Vec<Vec<Value>>, QueryError> {
        // group key -> member rows, in first-seen order
        let mut groups: IndexMap<String, Vec<&Map<String, Value>>> = IndexMap::new();
        for row in rows {
            let key_vals = self
                .group_by
                .iter()
                .map(|c| Eval::lookup(row, tables, c))
                .collect::<Result<Vec<_>, _>>()?;
            let key = serde_json::to_string(&key_vals).unwrap();
            groups.entry(key).or_default().push(row);
        }
        // an ungrouped aggregate still yields exactly one row
        if self.group_by.is_empty() && groups.is_empty() {
            groups.insert("[]".to_string(), Vec::new());
        }

        let mut out = Vec::with_capacity(groups.len());
        for group_rows in groups.values() {
            let mut values = Vec::with_capacity(parsed.len());
            for select in parsed {
                match select {
                    ParsedSelect::Column(name) => {
                        let v = match group_rows.first() {
                            Some(row) => Eval::lookup(row, tables, name)?,
                            None => Value::Null,
                        };
                        values.push(v);
                    }
                    ParsedSelect::Aggregate { func, arg } => {
                        let mut acc = aggregate::accumulator_for(func)
                            .ok_or_else(|| QueryError::UnsupportedExpression(func.clone()))?;
                        for row in group_rows {
                            match arg {
                                AggregateArg::Star => acc.update(&Value::Bool(true)),
                                AggregateArg::Column(name) => {
                                    acc.update(&Eval::lookup(row, tables, name)?)
                                }
                            }
                        }
                        values.push(acc.finalize());
                    }
                }
            }
            out.push(values);
        }
        Ok(out)
    }
}

impl RowSource for Scope {
    fn table_name(&self) -> String {
        self.table.clone()
    }

    fn fetch_rows(&self, selects: &[SelectExpr]) -> Result<Vec<Vec<Value>>, QueryError> {
        let parsed = selects
            .iter()
            .map(SelectExpr::parse)
            .collect::<Result<Vec<_>, _>>()?;
        let rows = self.load_rows()?;
        let tables = self.tables();
        let has_aggregate = parsed
            .iter()
            .any(|p| matches!(p, ParsedSelect::Aggregate { .. }));
        debug!(
            table = %self.table,
            rows = rows.len(),
            selects = parsed.len(),
            grouped = has_aggregate || !self.group_by.is_empty(),
            "fetching rows"
        );

        if has_aggregate || !self.group_by.is_empty() {
            return self.fetch_grouped(&rows, &tables, &parsed);
        }

        rows.iter()
            .map(|row| {
                parsed
                    .iter()
                    .map(|select| match select {
                        ParsedSelect::Column(name) => Eval::lookup(row, &tables, name),
                        ParsedSelect::Aggregate { .. } => unreachable!(),
                    })
                    .collect()
            })
            .collect()
    }
}

impl ColumnCatalog for Scope {
    fn columns_of(&self, table: &str) -> Option<Vec<String>> {
        self.db.columns_of(table)
    }
}
