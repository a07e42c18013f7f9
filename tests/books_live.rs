//! Listing behaviour against a real PostgreSQL server.
//!
//! Ignored by default. Point `SHELF_TEST_DATABASE_URL` at a PostgreSQL
//! database and run `cargo test --test books_live -- --ignored`. Each test
//! works inside its own throwaway schema, so an existing `books` table is
//! never touched.

use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use shelf_app::modules::books::routes;
use shelf_app::{Book, BookCatalog, ListBooksError, ListBooksParams, Timed};
use shelf_db::Database;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower::ServiceExt;

struct Fixture {
    admin: PgPool,
    schema: String,
    catalog: BookCatalog,
}

impl Fixture {
    /// Create a schema holding a `books` table with the given rows.
    async fn with_books(rows: &[(&str, i64, &str)]) -> Self {
        Self::with_deadline(rows, Duration::from_secs(5)).await
    }

    async fn with_deadline(rows: &[(&str, i64, &str)], statement_timeout: Duration) -> Self {
        let url = std::env::var("SHELF_TEST_DATABASE_URL")
            .expect("SHELF_TEST_DATABASE_URL must point at a PostgreSQL database");

        let admin = PgPool::connect(&url).await.unwrap();
        let schema = format!("shelf_test_{}", uuid::Uuid::now_v7().simple());
        sqlx::query(&format!("CREATE SCHEMA {}", schema))
            .execute(&admin)
            .await
            .unwrap();
        sqlx::query(&format!(
            "CREATE TABLE {}.books (id BIGSERIAL PRIMARY KEY, title TEXT NOT NULL, price BIGINT NOT NULL, genre TEXT NOT NULL)",
            schema
        ))
        .execute(&admin)
        .await
        .unwrap();

        for (title, price, genre) in rows {
            sqlx::query(&format!(
                "INSERT INTO {}.books (title, price, genre) VALUES ($1, $2, $3)",
                schema
            ))
            .bind(*title)
            .bind(*price)
            .bind(*genre)
            .execute(&admin)
            .await
            .unwrap();
        }

        let options = Database::connect_options(&url, statement_timeout)
            .unwrap()
            .options([("search_path", schema.as_str())])
            .application_name(&schema);
        let pool = PgPoolOptions::new().connect_with(options).await.unwrap();
        let catalog = BookCatalog::new(Database::from_pool(pool, statement_timeout));

        Self {
            admin,
            schema,
            catalog,
        }
    }

    /// Statements from this fixture's pool that the server is still running.
    async fn active_statements(&self) -> i64 {
        sqlx::query_scalar(
            "SELECT count(*) FROM pg_stat_activity WHERE application_name = $1 AND state = 'active'",
        )
        .bind(&self.schema)
        .fetch_one(&self.admin)
        .await
        .unwrap()
    }

    async fn list(&self, pairs: &[(&str, &str)]) -> Timed<Result<Vec<Book>, ListBooksError>> {
        let params = ListBooksParams::from_pairs(pairs.iter().copied());
        self.catalog.list(&params).await
    }

    async fn books(&self, pairs: &[(&str, &str)]) -> Vec<Book> {
        self.list(pairs).await.value.unwrap()
    }

    async fn teardown(self) {
        self.catalog.database().close().await;
        sqlx::query(&format!("DROP SCHEMA {} CASCADE", self.schema))
            .execute(&self.admin)
            .await
            .unwrap();
    }
}

fn prices(books: &[Book]) -> Vec<i64> {
    books.iter().map(|book| book.price).collect()
}

const SHELF: &[(&str, i64, &str)] = &[
    ("Middlemarch", 1800, "Fiction"),
    ("The Waste Land", 900, "Poetry"),
    ("Beloved", 1500, "Fiction"),
    ("Cosmos", 2200, "Science"),
    ("Fiction Writing 101", 1100, "Fiction Guides"),
    ("Ariel", 700, "Poetry"),
    ("Dune", 1300, "fiction"),
];

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn two_cheapest_in_ascending_order() {
    let fixture =
        Fixture::with_books(&[("C", 30, "Fiction"), ("A", 10, "Fiction"), ("B", 20, "Fiction")])
            .await;

    let books = fixture
        .books(&[("limit", "2"), ("offset", "0"), ("sort", "price_asc")])
        .await;
    assert_eq!(prices(&books), vec![10, 20]);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn genre_filter_is_exact() {
    let fixture = Fixture::with_books(SHELF).await;

    let books = fixture.books(&[("genre", "Fiction")]).await;
    assert_eq!(books.len(), 2);
    assert!(books.iter().all(|book| book.genre == "Fiction"));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn sorting_orders_prices() {
    let fixture = Fixture::with_books(SHELF).await;

    let ascending = prices(&fixture.books(&[("sort", "price_asc"), ("limit", "100")]).await);
    assert!(ascending.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(ascending.len(), SHELF.len());

    let descending = prices(&fixture.books(&[("sort", "price_desc")]).await);
    assert!(descending.windows(2).all(|pair| pair[0] >= pair[1]));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn paging_walks_the_sorted_list() {
    let fixture = Fixture::with_books(SHELF).await;

    let first = fixture
        .books(&[("sort", "price_asc"), ("limit", "3")])
        .await;
    let second = fixture
        .books(&[("sort", "price_asc"), ("limit", "3"), ("offset", "3")])
        .await;
    let past_end = fixture
        .books(&[("sort", "price_asc"), ("offset", "50")])
        .await;

    assert_eq!(prices(&first), vec![700, 900, 1100]);
    assert_eq!(prices(&second), vec![1300, 1500, 1800]);
    assert!(past_end.is_empty());

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn same_parameters_give_the_same_page() {
    let fixture = Fixture::with_books(SHELF).await;

    let pairs = [("sort", "price_desc"), ("limit", "4"), ("offset", "1")];
    let first = fixture.books(&pairs).await;
    let second = fixture.books(&pairs).await;
    assert_eq!(first, second);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn hostile_genre_is_just_a_value() {
    let fixture = Fixture::with_books(SHELF).await;

    let books = fixture
        .books(&[("genre", "Fiction' OR '1'='1")])
        .await;
    assert!(books.is_empty());

    let all = fixture.books(&[("limit", "100")]).await;
    assert_eq!(all.len(), SHELF.len());

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn unmatched_genre_is_an_empty_json_array() {
    let fixture = Fixture::with_books(SHELF).await;

    let router = routes::router(fixture.catalog.clone());
    let response = router
        .oneshot(
            Request::builder()
                .uri("/?genre=Westerns")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let query_time = response.headers()["x-query-time"].to_str().unwrap().to_string();
    assert!(query_time.ends_with("ms"));
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"[]\n");

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn integer_columns_decode_too() {
    let fixture = Fixture::with_books(&[]).await;

    sqlx::query(&format!(
        "ALTER TABLE {}.books ALTER COLUMN price TYPE INTEGER",
        fixture.schema
    ))
    .execute(&fixture.admin)
    .await
    .unwrap();
    sqlx::query(&format!(
        "INSERT INTO {}.books (title, price, genre) VALUES ('Ariel', 700, 'Poetry')",
        fixture.schema
    ))
    .execute(&fixture.admin)
    .await
    .unwrap();

    let books = fixture.books(&[]).await;
    assert_eq!(prices(&books), vec![700]);

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn missing_table_is_an_execution_error() {
    let fixture = Fixture::with_books(&[]).await;

    sqlx::query(&format!("DROP TABLE {}.books", fixture.schema))
        .execute(&fixture.admin)
        .await
        .unwrap();

    let Timed { value, .. } = fixture.list(&[]).await;
    assert!(matches!(value, Err(ListBooksError::QueryExecution(_))));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn undecodable_rows_discard_the_whole_page() {
    let fixture = Fixture::with_books(SHELF).await;

    sqlx::query(&format!(
        "ALTER TABLE {}.books ALTER COLUMN price TYPE TEXT",
        fixture.schema
    ))
    .execute(&fixture.admin)
    .await
    .unwrap();

    let Timed { value, .. } = fixture.list(&[]).await;
    assert!(matches!(value, Err(ListBooksError::ResultDecode(_))));

    fixture.teardown().await;
}

#[tokio::test]
#[ignore = "needs SHELF_TEST_DATABASE_URL"]
async fn deadline_cancels_the_statement_on_the_server() {
    let fixture = Fixture::with_deadline(&[], Duration::from_millis(300)).await;

    sqlx::query(&format!("DROP TABLE {}.books", fixture.schema))
        .execute(&fixture.admin)
        .await
        .unwrap();
    sqlx::query(&format!(
        "CREATE VIEW {}.books AS \
         SELECT 1::bigint AS id, 'Slow'::text AS title, 100::bigint AS price, 'slow'::text AS genre \
         FROM pg_sleep(3)",
        fixture.schema
    ))
    .execute(&fixture.admin)
    .await
    .unwrap();

    let Timed { value, elapsed } = fixture.list(&[("genre", "slow")]).await;
    assert!(matches!(value, Err(ListBooksError::QueryExecution(_))));
    assert!(elapsed < Duration::from_secs(2), "took {:?}", elapsed);

    let mut active = fixture.active_statements().await;
    for _ in 0..20 {
        if active == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        active = fixture.active_statements().await;
    }
    assert_eq!(active, 0, "abandoned statement still running on the server");

    fixture.teardown().await;
}
