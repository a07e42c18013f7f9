//! Validation of listing parameters and the statement they produce.

use std::fmt;

use shelf_db::{SelectStatement, SortDirection};
use thiserror::Error;

use super::models::ListBooksParams;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

const TABLE: &str = "books";
const COLUMNS: &[&str] = &["id", "title", "price", "genre"];

/// Parameter named by an [`ListBooksError::InvalidParameter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    Limit,
    Offset,
    Sort,
}

impl Parameter {
    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::Limit => "limit",
            Parameter::Offset => "offset",
            Parameter::Sort => "sort",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a statement did not produce its first response.
#[derive(Debug, Error)]
pub enum ExecutionFailure {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("query cancelled: deadline of {0} ms exceeded")]
    DeadlineExceeded(u128),
}

#[derive(Debug, Error)]
pub enum ListBooksError {
    #[error("invalid {0}")]
    InvalidParameter(Parameter),

    #[error("query execution failed: {0}")]
    QueryExecution(ExecutionFailure),

    #[error("result decode failed: {0}")]
    ResultDecode(ExecutionFailure),
}

impl ListBooksError {
    /// Short machine-readable tag used in logs and error responses.
    pub fn code(&self) -> &'static str {
        match self {
            ListBooksError::InvalidParameter(_) => "invalid_parameter",
            ListBooksError::QueryExecution(_) => "query_execution_error",
            ListBooksError::ResultDecode(_) => "result_decode_error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Whatever order the store returns.
    #[default]
    Unspecified,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    fn parse(raw: &str) -> Result<Self, ListBooksError> {
        match raw {
            "" => Ok(SortOrder::Unspecified),
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            _ => Err(ListBooksError::InvalidParameter(Parameter::Sort)),
        }
    }

    fn direction(self) -> Option<SortDirection> {
        match self {
            SortOrder::Unspecified => None,
            SortOrder::PriceAsc => Some(SortDirection::Asc),
            SortOrder::PriceDesc => Some(SortDirection::Desc),
        }
    }
}

/// Validated listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookQuery {
    pub limit: i64,
    pub offset: i64,
    pub genre: Option<String>,
    pub sort: SortOrder,
}

impl Default for BookQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            genre: None,
            sort: SortOrder::Unspecified,
        }
    }
}

impl BookQuery {
    /// Validate raw parameters in the order limit, offset, genre, sort.
    pub fn from_params(params: &ListBooksParams) -> Result<Self, ListBooksError> {
        let limit = match trimmed(&params.limit) {
            None => DEFAULT_LIMIT,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if value > 0 => value.min(MAX_LIMIT),
                _ => return Err(ListBooksError::InvalidParameter(Parameter::Limit)),
            },
        };

        let offset = match trimmed(&params.offset) {
            None => 0,
            Some(raw) => match raw.parse::<i64>() {
                Ok(value) if value >= 0 => value,
                _ => return Err(ListBooksError::InvalidParameter(Parameter::Offset)),
            },
        };

        let genre = trimmed(&params.genre).map(str::to_string);
        let sort = SortOrder::parse(trimmed(&params.sort).unwrap_or(""))?;

        Ok(Self {
            limit,
            offset,
            genre,
            sort,
        })
    }

    pub fn statement(&self) -> SelectStatement {
        let mut statement = SelectStatement::new(TABLE, COLUMNS);
        if let Some(genre) = &self.genre {
            statement = statement.filter_eq("genre", genre.as_str());
        }
        if let Some(direction) = self.sort.direction() {
            statement = statement.order_by("price", direction);
        }
        statement.limit(self.limit).offset(self.offset)
    }
}

/// Trimmed value, or `None` when absent or blank.
fn trimmed(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|value| !value.is_empty())
}
