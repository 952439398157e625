//! Book store: the sole owner of persistent access to the `books` table.
//!
//! Every operation is a single synchronous statement against a
//! caller-supplied connection. Absence is an `Option`/`bool` outcome, never
//! an error; storage failures propagate as [`DbError`] with no retry.
//! ISBN uniqueness is enforced by the `books_isbn_unique` index, so a
//! duplicate insert or update surfaces as [`DbError::UniqueViolation`].

use rusqlite::{params, Connection, OptionalExtension};

use libris_db::DbError;

use super::models::{Book, CreateBook, UpdateBook};

const COLUMNS: &str = "id, title, author, isbn, published_year";

/// Books ordered by id ascending, `limit` records after skipping `offset`.
pub fn list(conn: &Connection, offset: u32, limit: u32) -> Result<Vec<Book>, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM books ORDER BY id ASC LIMIT ?1 OFFSET ?2");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![limit, offset], Book::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Book>, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM books WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id], Book::from_row)
        .optional()?)
}

/// Exact match on the stored ISBN; no case or hyphen normalization.
pub fn get_by_isbn(conn: &Connection, isbn: &str) -> Result<Option<Book>, DbError> {
    let sql = format!("SELECT {COLUMNS} FROM books WHERE isbn = ?1");
    Ok(conn
        .query_row(&sql, params![isbn], Book::from_row)
        .optional()?)
}

/// Every book whose title or author contains `term` as a case-insensitive
/// substring. All matches, no pagination; term-length policing belongs to
/// the caller.
pub fn search(conn: &Connection, term: &str) -> Result<Vec<Book>, DbError> {
    let sql = format!(
        "SELECT {COLUMNS} FROM books \
         WHERE lower(title) LIKE ?1 OR lower(author) LIKE ?1 \
         ORDER BY id ASC"
    );
    let pattern = format!("%{}%", term.to_lowercase());
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![pattern], Book::from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Insert a new record and return it with its assigned id.
pub fn create(conn: &Connection, book: &CreateBook) -> Result<Book, DbError> {
    conn.execute(
        "INSERT INTO books (title, author, isbn, published_year) VALUES (?1, ?2, ?3, ?4)",
        params![book.title, book.author, book.isbn, book.published_year],
    )?;
    let id = conn.last_insert_rowid();
    match get_by_id(conn, id)? {
        Some(book) => Ok(book),
        None => Err(rusqlite::Error::QueryReturnedNoRows.into()),
    }
}

/// Apply only the fields present in `patch`; absent fields keep their prior
/// value, an explicit null clears an optional field. `None` when no record
/// exists for `id`.
pub fn update(conn: &Connection, id: i64, patch: &UpdateBook) -> Result<Option<Book>, DbError> {
    let Some(mut book) = get_by_id(conn, id)? else {
        return Ok(None);
    };

    if let Some(title) = &patch.title {
        book.title = title.clone();
    }
    if let Some(author) = &patch.author {
        book.author = author.clone();
    }
    if let Some(isbn) = &patch.isbn {
        book.isbn = isbn.clone();
    }
    if let Some(year) = patch.published_year {
        book.published_year = year;
    }

    conn.execute(
        "UPDATE books SET title = ?1, author = ?2, isbn = ?3, published_year = ?4 WHERE id = ?5",
        params![book.title, book.author, book.isbn, book.published_year, book.id],
    )?;
    Ok(Some(book))
}

/// Hard delete. `false` when no record exists for `id`.
pub fn delete(conn: &Connection, id: i64) -> Result<bool, DbError> {
    let affected = conn.execute("DELETE FROM books WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

pub fn count(conn: &Connection) -> Result<u64, DbError> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0))?;
    Ok(total as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::BOOKS_SCHEMA;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(BOOKS_SCHEMA).unwrap();
        conn
    }

    fn dune() -> CreateBook {
        CreateBook {
            title: "Dune".to_string(),
            author: "Herbert".to_string(),
            isbn: Some("9780441013593".to_string()),
            published_year: Some(1965),
        }
    }

    #[test]
    fn create_assigns_id_and_roundtrips() {
        let conn = test_conn();
        let created = create(&conn, &dune()).unwrap();
        assert_eq!(created.id, 1);

        let fetched = get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, created);

        let by_isbn = get_by_isbn(&conn, "9780441013593").unwrap().unwrap();
        assert_eq!(by_isbn, created);
    }

    #[test]
    fn create_stores_absent_optionals_as_null() {
        let conn = test_conn();
        let book = create(
            &conn,
            &CreateBook {
                title: "Nameless".to_string(),
                author: "Anon".to_string(),
                isbn: None,
                published_year: None,
            },
        )
        .unwrap();
        assert_eq!(book.isbn, None);
        assert_eq!(book.published_year, None);
    }

    #[test]
    fn duplicate_isbn_is_a_unique_violation() {
        let conn = test_conn();
        create(&conn, &dune()).unwrap();

        let err = create(&conn, &dune()).unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[test]
    fn missing_isbn_does_not_collide() {
        // SQLite unique indexes treat NULLs as distinct, so books without
        // an ISBN can coexist.
        let conn = test_conn();
        let no_isbn = CreateBook {
            isbn: None,
            ..dune()
        };
        create(&conn, &no_isbn).unwrap();
        create(&conn, &no_isbn).unwrap();
        assert_eq!(count(&conn).unwrap(), 2);
    }

    #[test]
    fn list_is_paginated_and_ordered_by_id() {
        let conn = test_conn();
        for i in 0..5 {
            create(
                &conn,
                &CreateBook {
                    title: format!("Book {i}"),
                    author: "Author".to_string(),
                    isbn: None,
                    published_year: None,
                },
            )
            .unwrap();
        }

        let page = list(&conn, 1, 2).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].title, "Book 1");
        assert_eq!(page[1].title, "Book 2");
    }

    #[test]
    fn list_on_empty_store_is_empty_not_an_error() {
        let conn = test_conn();
        assert!(list(&conn, 0, 10).unwrap().is_empty());
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_author() {
        let conn = test_conn();
        create(&conn, &dune()).unwrap();
        create(
            &conn,
            &CreateBook {
                title: "Children of Dune".to_string(),
                author: "Frank Herbert".to_string(),
                isbn: None,
                published_year: Some(1976),
            },
        )
        .unwrap();
        create(
            &conn,
            &CreateBook {
                title: "Neuromancer".to_string(),
                author: "Gibson".to_string(),
                isbn: None,
                published_year: Some(1984),
            },
        )
        .unwrap();

        assert_eq!(search(&conn, "dUnE").unwrap().len(), 2);
        assert_eq!(search(&conn, "herbert").unwrap().len(), 2);
        assert_eq!(search(&conn, "gibson").unwrap().len(), 1);
        assert!(search(&conn, "tolkien").unwrap().is_empty());
    }

    #[test]
    fn update_changes_only_present_fields() {
        let conn = test_conn();
        let created = create(&conn, &dune()).unwrap();

        let patch = UpdateBook {
            published_year: Some(Some(1966)),
            ..Default::default()
        };
        let updated = update(&conn, created.id, &patch).unwrap().unwrap();
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.author, "Herbert");
        assert_eq!(updated.isbn.as_deref(), Some("9780441013593"));
        assert_eq!(updated.published_year, Some(1966));

        // The change is persisted, not just echoed.
        let fetched = get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn update_with_explicit_null_clears_optional_fields() {
        let conn = test_conn();
        let created = create(&conn, &dune()).unwrap();

        let patch: UpdateBook = serde_json::from_str(r#"{"isbn": null}"#).unwrap();
        let updated = update(&conn, created.id, &patch).unwrap().unwrap();
        assert_eq!(updated.isbn, None);
        // The other fields stay untouched.
        assert_eq!(updated.title, "Dune");
        assert_eq!(updated.published_year, Some(1965));

        let patch: UpdateBook = serde_json::from_str(r#"{"published_year": null}"#).unwrap();
        let updated = update(&conn, created.id, &patch).unwrap().unwrap();
        assert_eq!(updated.published_year, None);

        let fetched = get_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(fetched, updated);
    }

    #[test]
    fn update_missing_id_is_none() {
        let conn = test_conn();
        assert!(update(&conn, 42, &UpdateBook::default()).unwrap().is_none());
    }

    #[test]
    fn update_to_taken_isbn_is_a_unique_violation() {
        let conn = test_conn();
        create(&conn, &dune()).unwrap();
        let other = create(
            &conn,
            &CreateBook {
                title: "Dune Messiah".to_string(),
                author: "Herbert".to_string(),
                isbn: Some("9780441013594".to_string()),
                published_year: Some(1969),
            },
        )
        .unwrap();

        let patch = UpdateBook {
            isbn: Some(Some("9780441013593".to_string())),
            ..Default::default()
        };
        let err = update(&conn, other.id, &patch).unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation(_)));
    }

    #[test]
    fn delete_returns_whether_a_record_existed() {
        let conn = test_conn();
        let created = create(&conn, &dune()).unwrap();

        assert!(delete(&conn, created.id).unwrap());
        assert!(get_by_id(&conn, created.id).unwrap().is_none());
        assert!(!delete(&conn, created.id).unwrap());
    }

    #[test]
    fn deleted_ids_are_not_reassigned() {
        let conn = test_conn();
        let first = create(&conn, &dune()).unwrap();
        delete(&conn, first.id).unwrap();

        let next = create(
            &conn,
            &CreateBook {
                isbn: None,
                ..dune()
            },
        )
        .unwrap();
        assert!(next.id > first.id);
    }
}
