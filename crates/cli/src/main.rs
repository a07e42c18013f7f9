use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use shelf_app::{BookCatalog, BookQuery, ListBooksParams, Timed};
use shelf_db::Database;
use shelf_kernel::settings::Settings;

/// Query the shelf book catalog from the command line
#[derive(Parser, Debug)]
#[command(name = "shelf-cli", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List one page of books as pretty-printed JSON
    Books(BooksArgs),
    /// Check that the configured database answers
    Ping,
}

/// Raw values, validated exactly like the HTTP query string
#[derive(Args, Debug)]
struct BooksArgs {
    /// Page size (1-100, larger values are clamped)
    #[arg(long, allow_hyphen_values = true)]
    limit: Option<String>,
    /// Rows to skip
    #[arg(long, allow_hyphen_values = true)]
    offset: Option<String>,
    /// Exact genre to match
    #[arg(long)]
    genre: Option<String>,
    /// `price_asc` or `price_desc`
    #[arg(long)]
    sort: Option<String>,
}

impl From<BooksArgs> for ListBooksParams {
    fn from(args: BooksArgs) -> Self {
        ListBooksParams {
            limit: args.limit,
            offset: args.offset,
            genre: args.genre,
            sort: args.sort,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Books(args) => {
            // Reject bad input before touching configuration or the network
            let query = BookQuery::from_params(&args.into())?;
            let db = connect().await?;

            let Timed { value, elapsed } = BookCatalog::new(db.clone()).fetch(&query).await;
            db.close().await;
            tracing::info!(took_ms = elapsed.as_millis() as u64, "query finished");

            let books = value?;
            let rendered =
                serde_json::to_string_pretty(&books).context("encode books as JSON")?;
            println!("{}", rendered);
        }
        Command::Ping => {
            let db = connect().await?;
            db.close().await;
            println!("ok");
        }
    }

    Ok(())
}

async fn connect() -> anyhow::Result<Database> {
    let settings = Settings::load().with_context(|| "failed to load shelf settings")?;
    shelf_telemetry::init(&settings.telemetry)?;

    Database::connect(
        settings.database.url()?,
        Duration::from_millis(settings.database.statement_timeout_ms),
    )
    .await
}
