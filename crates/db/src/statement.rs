//! Parameterized `SELECT` statements assembled clause by clause.
//!
//! Column names and sort directions only enter the SQL text as `&'static str`
//! or enum-derived literals. Anything that came from a caller is carried as a
//! [`BindValue`] and rendered as a placeholder.

use std::fmt;

use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// Placeholder syntax of the target database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// `$1`, `$2`, ...
    #[default]
    Postgres,
    /// `?` for every parameter (SQLite, MySQL).
    QuestionMark,
}

impl Dialect {
    fn placeholder(self, ordinal: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", ordinal),
            Dialect::QuestionMark => "?".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A value sent to the database separately from the statement text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Text(String),
    BigInt(i64),
}

impl fmt::Display for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Text(value) => write!(f, "{:?}", value),
            BindValue::BigInt(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for BindValue {
    fn from(value: &str) -> Self {
        BindValue::Text(value.to_string())
    }
}

impl From<String> for BindValue {
    fn from(value: String) -> Self {
        BindValue::Text(value)
    }
}

impl From<i64> for BindValue {
    fn from(value: i64) -> Self {
        BindValue::BigInt(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Clause {
    WhereEq {
        column: &'static str,
        value: BindValue,
    },
    OrderBy {
        column: &'static str,
        direction: SortDirection,
    },
    Limit(BindValue),
    Offset(BindValue),
}

impl Clause {
    /// Position of the clause kind in SQL grammar.
    fn rank(&self) -> u8 {
        match self {
            Clause::WhereEq { .. } => 0,
            Clause::OrderBy { .. } => 1,
            Clause::Limit(_) => 2,
            Clause::Offset(_) => 3,
        }
    }
}

/// Builder for a `SELECT` over a fixed projection.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    table: &'static str,
    columns: &'static [&'static str],
    clauses: Vec<Clause>,
}

impl SelectStatement {
    pub fn new(table: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            table,
            columns,
            clauses: Vec::new(),
        }
    }

    /// `column = <bound value>`; several filters are joined with `AND`.
    pub fn filter_eq(mut self, column: &'static str, value: impl Into<BindValue>) -> Self {
        self.clauses.push(Clause::WhereEq {
            column,
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, column: &'static str, direction: SortDirection) -> Self {
        self.clauses.push(Clause::OrderBy { column, direction });
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.clauses.push(Clause::Limit(limit.into()));
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.clauses.push(Clause::Offset(offset.into()));
        self
    }

    /// Render SQL text and the arguments in placeholder order.
    pub fn render(&self, dialect: Dialect) -> RenderedStatement {
        let mut clauses: Vec<&Clause> = self.clauses.iter().collect();
        // Stable: filters keep the order they were added in.
        clauses.sort_by_key(|clause| clause.rank());

        let mut sql = format!("SELECT {} FROM {}", self.columns.join(", "), self.table);
        let mut args = Vec::new();
        let mut filters = Vec::new();
        let mut orderings = Vec::new();
        let mut tail = String::new();

        for clause in clauses {
            match clause {
                Clause::WhereEq { column, value } => {
                    args.push(value.clone());
                    filters.push(format!("{} = {}", column, dialect.placeholder(args.len())));
                }
                Clause::OrderBy { column, direction } => {
                    orderings.push(format!("{} {}", column, direction.to_sql()));
                }
                Clause::Limit(value) => {
                    args.push(value.clone());
                    tail.push_str(&format!(" LIMIT {}", dialect.placeholder(args.len())));
                }
                Clause::Offset(value) => {
                    args.push(value.clone());
                    tail.push_str(&format!(" OFFSET {}", dialect.placeholder(args.len())));
                }
            }
        }

        if !filters.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&filters.join(" AND "));
        }
        if !orderings.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&orderings.join(", "));
        }
        sql.push_str(&tail);

        RenderedStatement { sql, args }
    }
}

/// SQL text plus its arguments, ready to bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    pub sql: String,
    pub args: Vec<BindValue>,
}

impl RenderedStatement {
    /// Build an sqlx query with every argument bound in order.
    pub fn query(&self) -> Query<'_, Postgres, PgArguments> {
        self.args
            .iter()
            .fold(sqlx::query(&self.sql), |query, arg| match arg {
                BindValue::Text(value) => query.bind(value.clone()),
                BindValue::BigInt(value) => query.bind(*value),
            })
    }
}
