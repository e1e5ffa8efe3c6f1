pub mod models;
pub mod routes;

use async_trait::async_trait;
use axum::{routing::get, Router};
use serde_json::json;
use shelf_kernel::{AppState, InitCtx, Migration, Module};

/// Reviews attached to books
pub struct ReviewsModule;

impl ReviewsModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for ReviewsModule {
    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            max_rate = ctx.settings.catalog.max_rate,
            "reviews module initialized"
        );
        Ok(())
    }

    fn routes(&self, state: &AppState) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route(
                "/{book_id}",
                get(routes::list_reviews).post(routes::create_review),
            )
            .with_state(state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = |description: &str| {
            json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let book_param = json!({
            "name": "book_id", "in": "path", "required": true, "schema": { "type": "integer" }
        });

        Some(json!({
            "paths": {
                "/{book_id}": {
                    "get": {
                        "summary": "Reviews of a book, newest first",
                        "tags": ["Reviews"],
                        "security": [{ "bearer": [] }],
                        "parameters": [book_param],
                        "responses": {
                            "200": { "description": "Reviews and average rating" },
                            "404": error("Book not found")
                        }
                    },
                    "post": {
                        "summary": "Review a book",
                        "tags": ["Reviews"],
                        "security": [{ "bearer": [] }],
                        "parameters": [book_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ReviewForm" }
                                }
                            }
                        },
                        "responses": {
                            "201": {
                                "description": "Review created; Location points at the book",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/Review" }
                                    }
                                }
                            },
                            "404": error("Book not found"),
                            "422": error("Validation error")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "ReviewForm": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": 100 },
                            "text": { "type": "string" },
                            "rate": { "type": "integer", "minimum": 0 }
                        },
                        "required": ["title", "text", "rate"]
                    },
                    "Review": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "book_id": { "type": "integer" },
                            "title": { "type": "string" },
                            "text": { "type": "string" },
                            "rate": { "type": "integer" },
                            "user_id": { "type": "integer" }
                        },
                        "required": ["id", "book_id", "title", "text", "rate", "user_id"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE reviews (
                    id      INTEGER PRIMARY KEY AUTOINCREMENT,
                    book_id INTEGER NOT NULL REFERENCES books (id) ON DELETE CASCADE,
                    title   TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
                    text    TEXT NOT NULL,
                    rate    INTEGER NOT NULL CHECK (rate >= 0),
                    user_id INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
                );
                CREATE INDEX reviews_book_id ON reviews (book_id)
                "#,
        }]
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "reviews module is healthy"
}

/// Create a new instance of the reviews module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(ReviewsModule::new())
}
