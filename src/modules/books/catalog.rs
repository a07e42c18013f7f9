//! Executes validated listing queries against the database.

use std::time::{Duration, Instant};

use futures_util::stream::BoxStream;
use futures_util::TryStreamExt;
use shelf_db::{BindValue, Database, Dialect, RenderedStatement};
use sqlx::postgres::PgRow;
use sqlx::Row;

use super::models::{Book, ListBooksParams};
use super::query::{BookQuery, ExecutionFailure, ListBooksError};

type RowStream<'a> = BoxStream<'a, Result<PgRow, sqlx::Error>>;

/// A result together with the time spent waiting on the database.
#[derive(Debug)]
pub struct Timed<T> {
    pub value: T,
    pub elapsed: Duration,
}

/// Read access to the `books` table.
#[derive(Clone, Debug)]
pub struct BookCatalog {
    db: Database,
}

impl BookCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Validate raw parameters and run the listing. Rejected parameters never
    /// reach the database and report zero elapsed time.
    pub async fn list(&self, params: &ListBooksParams) -> Timed<Result<Vec<Book>, ListBooksError>> {
        match BookQuery::from_params(params) {
            Ok(query) => self.fetch(&query).await,
            Err(err) => {
                tracing::warn!(
                    target: "shelf.books",
                    error = %err,
                    took_ms = 0u64,
                    "list books rejected"
                );
                Timed {
                    value: Err(err),
                    elapsed: Duration::ZERO,
                }
            }
        }
    }

    /// Run one validated listing. Elapsed time covers issuing the statement
    /// up to the first response from the server.
    pub async fn fetch(&self, query: &BookQuery) -> Timed<Result<Vec<Book>, ListBooksError>> {
        let rendered = query.statement().render(Dialect::Postgres);
        let timeout = self.db.statement_timeout();
        let mut rows = rendered.query().fetch(self.db.pool());

        let start = Instant::now();
        let deadline = tokio::time::Instant::from_std(start) + timeout;
        let first = next_row(&mut rows, deadline, timeout).await;
        let elapsed = start.elapsed();

        let value = match first {
            Err(failure) => Err(ListBooksError::QueryExecution(failure)),
            Ok(first) => drain(first, &mut rows, deadline, timeout).await,
        };
        log_query(&rendered, elapsed, &value);

        Timed { value, elapsed }
    }

    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        self.db.ping().await
    }
}

async fn next_row(
    rows: &mut RowStream<'_>,
    deadline: tokio::time::Instant,
    timeout: Duration,
) -> Result<Option<PgRow>, ExecutionFailure> {
    match tokio::time::timeout_at(deadline, rows.try_next()).await {
        Ok(row) => Ok(row?),
        Err(_) => Err(ExecutionFailure::DeadlineExceeded(timeout.as_millis())),
    }
}

/// Decode every row; the first failure discards what was collected so far.
async fn drain(
    first: Option<PgRow>,
    rows: &mut RowStream<'_>,
    deadline: tokio::time::Instant,
    timeout: Duration,
) -> Result<Vec<Book>, ListBooksError> {
    let mut books = Vec::new();
    let mut current = first;

    while let Some(row) = current {
        let book =
            decode_book(&row).map_err(|err| ListBooksError::ResultDecode(err.into()))?;
        books.push(book);
        current = next_row(rows, deadline, timeout)
            .await
            .map_err(ListBooksError::ResultDecode)?;
    }

    Ok(books)
}

fn decode_book(row: &PgRow) -> Result<Book, sqlx::Error> {
    Ok(Book {
        id: integer_column(row, 0)?,
        title: row.try_get(1)?,
        price: integer_column(row, 2)?,
        genre: row.try_get(3)?,
    })
}

/// `BIGINT` or `INTEGER`, widened to `i64`.
fn integer_column(row: &PgRow, index: usize) -> Result<i64, sqlx::Error> {
    match row.try_get::<i64, _>(index) {
        Err(sqlx::Error::ColumnDecode { .. }) => row.try_get::<i32, _>(index).map(i64::from),
        other => other,
    }
}

/// The one event per executed statement, carrying its final outcome.
fn log_query(
    rendered: &RenderedStatement,
    elapsed: Duration,
    value: &Result<Vec<Book>, ListBooksError>,
) {
    tracing::info!(
        target: "shelf.books",
        sql = %rendered.sql,
        args = %display_args(&rendered.args),
        took_ms = elapsed.as_millis() as u64,
        ok = value.is_ok(),
        rows = value.as_ref().ok().map(Vec::len),
        error = value.as_ref().err().map(tracing::field::display),
        "list books query"
    );
}

fn display_args(args: &[BindValue]) -> String {
    let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(" "))
}
