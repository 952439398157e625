//! HTTP handlers for the books module.
//!
//! Handlers own the boundary decisions: payload validation, the minimum
//! search-term length, and the mapping from store outcomes to status codes.
//! Each request opens its own database session and drops it on return.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use libris_db::{Database, DbError};
use libris_http::error::AppError;

use super::models::{Book, CreateBook, UpdateBook};
use super::store;

const MIN_SEARCH_LEN: usize = 2;

pub fn router(db: Database) -> Router {
    Router::new()
        .route("/", get(list_books).post(create_book))
        .route("/search", get(search_books))
        .route("/stats", get(book_stats))
        .route("/isbn/{isbn}", get(get_book_by_isbn))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .with_state(db)
}

/// Map storage failures: a unique violation means a duplicate ISBN, anything
/// else is an internal error.
fn storage_error(err: DbError) -> AppError {
    match err {
        DbError::UniqueViolation(_) => AppError::conflict(
            vec![json!({"field": "isbn", "error": "already exists"})],
            "a book with this ISBN already exists",
        ),
        other => AppError::Internal(anyhow::Error::new(other)),
    }
}

#[derive(Debug, Deserialize)]
struct Pagination {
    #[serde(default)]
    offset: u32,
    #[serde(default = "Pagination::default_limit")]
    limit: u32,
}

impl Pagination {
    fn default_limit() -> u32 {
        100
    }
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

async fn list_books(
    State(db): State<Database>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Book>>, AppError> {
    let conn = db.session().map_err(storage_error)?;
    let books = store::list(&conn, page.offset, page.limit).map_err(storage_error)?;
    Ok(Json(books))
}

async fn search_books(
    State(db): State<Database>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Book>>, AppError> {
    let term = query.q.trim();
    if term.chars().count() < MIN_SEARCH_LEN {
        return Err(AppError::bad_request(format!(
            "search query must be at least {MIN_SEARCH_LEN} characters long"
        )));
    }

    let conn = db.session().map_err(storage_error)?;
    let books = store::search(&conn, term).map_err(storage_error)?;
    Ok(Json(books))
}

async fn book_stats(State(db): State<Database>) -> Result<Json<serde_json::Value>, AppError> {
    let conn = db.session().map_err(storage_error)?;
    let total = store::count(&conn).map_err(storage_error)?;
    Ok(Json(json!({
        "total_books": total,
        "message": format!("database contains {total} books"),
    })))
}

async fn get_book(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, AppError> {
    let conn = db.session().map_err(storage_error)?;
    store::get_by_id(&conn, id)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book with id {id} not found")))
}

async fn get_book_by_isbn(
    State(db): State<Database>,
    Path(isbn): Path<String>,
) -> Result<Json<Book>, AppError> {
    let conn = db.session().map_err(storage_error)?;
    store::get_by_isbn(&conn, &isbn)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book with ISBN {isbn} not found")))
}

async fn create_book(
    State(db): State<Database>,
    Json(payload): Json<CreateBook>,
) -> Result<(StatusCode, Json<Book>), AppError> {
    if let Err(details) = payload.validate() {
        return Err(AppError::validation(details, "book payload failed validation"));
    }

    let conn = db.session().map_err(storage_error)?;
    let book = store::create(&conn, &payload).map_err(storage_error)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(db): State<Database>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateBook>,
) -> Result<Json<Book>, AppError> {
    if let Err(details) = payload.validate() {
        return Err(AppError::validation(details, "book payload failed validation"));
    }

    let conn = db.session().map_err(storage_error)?;
    store::update(&conn, id, &payload)
        .map_err(storage_error)?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("book with id {id} not found")))
}

async fn delete_book(
    State(db): State<Database>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let conn = db.session().map_err(storage_error)?;
    if store::delete(&conn, id).map_err(storage_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found(format!("book with id {id} not found")))
    }
}
