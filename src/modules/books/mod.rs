pub mod models;
pub mod routes;

use async_trait::async_trait;
use axum::{
    routing::{get, put},
    Router,
};
use serde_json::json;
use shelf_kernel::{AppState, InitCtx, Migration, Module};

/// Books, the rating ranking and cover thumbnails
pub struct BooksModule;

impl BooksModule {
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tokio::fs::create_dir_all(ctx.settings.media.root.join("thumbnails")).await?;
        tracing::info!(
            module = self.name(),
            items_per_page = ctx.settings.catalog.items_per_page,
            media_root = %ctx.settings.media.root.display(),
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self, state: &AppState) -> Router {
        Router::new()
            .route("/", get(routes::list_books).post(routes::create_book))
            .route("/index", get(routes::index))
            .route("/health", get(health_check))
            .route(
                "/{id}",
                get(routes::get_book)
                    .put(routes::update_book)
                    .delete(routes::delete_book),
            )
            .route("/{id}/thumbnail", put(routes::upload_thumbnail))
            .with_state(state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let error = json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                }
            }
        });
        let with_description = |description: &str| {
            let mut response = error.clone();
            response["description"] = json!(description);
            response
        };
        let id_param = json!({
            "name": "id", "in": "path", "required": true, "schema": { "type": "integer" }
        });
        let page_param = json!({
            "name": "page", "in": "query", "required": false,
            "schema": { "type": "integer", "minimum": 1, "default": 1 }
        });
        let book_form = json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/BookForm" }
                }
            }
        });
        let book = json!({
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Book" }
                }
            }
        });

        Some(json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List books",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [page_param],
                        "responses": {
                            "200": { "description": "One page of books" },
                            "404": with_description("Page out of range")
                        }
                    },
                    "post": {
                        "summary": "Create a book owned by the caller",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "requestBody": book_form,
                        "responses": {
                            "201": { "description": "Book created; Location points at the index" },
                            "422": with_description("Validation error")
                        }
                    }
                },
                "/index": {
                    "get": {
                        "summary": "Newest books, ranking and one ranking page",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [page_param],
                        "responses": {
                            "200": { "description": "Landing page data" },
                            "400": with_description("Page is not an integer"),
                            "404": with_description("Page out of range")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Book detail with reviews",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Book detail" },
                            "404": with_description("Book not found")
                        }
                    },
                    "put": {
                        "summary": "Update a book (owner only)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "requestBody": book_form,
                        "responses": {
                            "200": { "description": "Book updated", "content": book["content"] },
                            "403": with_description("Not the owner"),
                            "404": with_description("Book not found"),
                            "422": with_description("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a book and its reviews (owner only)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "200": { "description": "Book deleted" },
                            "403": with_description("Not the owner"),
                            "404": with_description("Book not found")
                        }
                    }
                },
                "/{id}/thumbnail": {
                    "put": {
                        "summary": "Upload a cover image (owner only)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "multipart/form-data": {
                                    "schema": {
                                        "type": "object",
                                        "properties": {
                                            "file": { "type": "string", "format": "binary" }
                                        },
                                        "required": ["file"]
                                    }
                                }
                            }
                        },
                        "responses": {
                            "200": { "description": "Thumbnail stored", "content": book["content"] },
                            "403": with_description("Not the owner"),
                            "422": with_description("Missing or unsupported image")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "BookForm": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "maxLength": 100 },
                            "text": { "type": "string" },
                            "category": { "type": "string", "enum": ["business", "life", "other"] },
                            "thumbnail": { "type": ["string", "null"] }
                        },
                        "required": ["title", "text", "category"]
                    },
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer" },
                            "title": { "type": "string" },
                            "text": { "type": "string" },
                            "thumbnail": { "type": ["string", "null"] },
                            "thumbnail_url": { "type": ["string", "null"] },
                            "category": { "type": "string" },
                            "category_label": { "type": "string" },
                            "user_id": { "type": "integer" }
                        },
                        "required": ["id", "title", "text", "category", "user_id"]
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_init",
            up: r#"
                CREATE TABLE books (
                    id        INTEGER PRIMARY KEY AUTOINCREMENT,
                    title     TEXT NOT NULL CHECK (length(title) BETWEEN 1 AND 100),
                    text      TEXT NOT NULL,
                    thumbnail TEXT,
                    category  TEXT NOT NULL CHECK (category IN ('business', 'life', 'other')),
                    user_id   INTEGER NOT NULL REFERENCES users (id) ON DELETE CASCADE
                );
                CREATE INDEX books_user_id ON books (user_id);
                "#,
        }]
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

/// Create a new instance of the books module
pub fn create_module() -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new())
}
