pub mod catalog;
pub mod models;
pub mod query;
pub mod routes;

use async_trait::async_trait;
use axum::Router;
use serde_json::json;
use shelf_kernel::{InitCtx, Module};

use catalog::BookCatalog;

/// Books module serving the paginated catalog listing
pub struct BooksModule {
    catalog: BookCatalog,
}

impl BooksModule {
    pub fn new(catalog: BookCatalog) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            statement_timeout_ms = self.catalog.database().statement_timeout().as_millis() as u64,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.catalog.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let query_time = json!({
            "X-Query-Time": {
                "description": "Time spent on the database, e.g. `12ms`",
                "schema": { "type": "string" }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "parameters": [
                            {
                                "name": "limit",
                                "in": "query",
                                "required": false,
                                "description": "Page size, 1 or more; values above 100 are clamped to 100",
                                "schema": { "type": "integer", "default": 10, "minimum": 1 }
                            },
                            {
                                "name": "offset",
                                "in": "query",
                                "required": false,
                                "description": "Rows to skip",
                                "schema": { "type": "integer", "default": 0, "minimum": 0 }
                            },
                            {
                                "name": "genre",
                                "in": "query",
                                "required": false,
                                "description": "Exact genre match",
                                "schema": { "type": "string" }
                            },
                            {
                                "name": "sort",
                                "in": "query",
                                "required": false,
                                "schema": { "type": "string", "enum": ["price_asc", "price_desc"] }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Page of books",
                                "headers": query_time.clone(),
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": {
                                                "$ref": "#/components/schemas/Book"
                                            }
                                        }
                                    }
                                }
                            },
                            "400": {
                                "description": "Invalid parameter or failed query",
                                "headers": query_time,
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                },
                "/health": {
                    "get": {
                        "summary": "Books database health check",
                        "tags": ["Books"],
                        "responses": {
                            "200": {
                                "description": "Database reachable",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            },
                            "500": {
                                "description": "Database unreachable",
                                "content": {
                                    "text/plain": {
                                        "schema": { "type": "string" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": {
                                "type": "integer",
                                "format": "int64",
                                "description": "Identifier assigned by the store"
                            },
                            "title": {
                                "type": "string",
                                "description": "Title of the book"
                            },
                            "price": {
                                "type": "integer",
                                "format": "int64",
                                "description": "Price in minor currency units"
                            },
                            "genre": {
                                "type": "string",
                                "description": "Genre of the book"
                            }
                        },
                        "required": ["id", "title", "price", "genre"]
                    }
                }
            }
        }))
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create the books module around the shared database handle
pub fn create_module(ctx: &InitCtx<'_>) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(BookCatalog::new(ctx.db.clone())))
}
