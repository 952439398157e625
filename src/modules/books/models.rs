//! Domain and request models for the books module.
//!
//! `CreateBook` and `UpdateBook` are the validated command objects handed to
//! the store. Validation failures are reported as per-field detail objects
//! in the shape the HTTP error body expects.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

const TITLE_MIN: usize = 1;
const TITLE_MAX: usize = 200;
const AUTHOR_MIN: usize = 1;
const AUTHOR_MAX: usize = 100;
const ISBN_MIN: usize = 10;
const ISBN_MAX: usize = 13;
const YEAR_MIN: i32 = 1000;
const YEAR_MAX: i32 = 2030;

/// A persisted book record. `id` is assigned by the storage layer at
/// creation and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
}

impl Book {
    /// Map a row selected as `id, title, author, isbn, published_year`.
    pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            author: row.get(2)?,
            isbn: row.get(3)?,
            published_year: row.get(4)?,
        })
    }
}

/// Payload for creating a book. `id` is never client-supplied.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
}

impl CreateBook {
    /// Check field constraints, collecting one detail object per violation.
    pub fn validate(&self) -> Result<(), Vec<Value>> {
        let mut details = Vec::new();
        check_length(&mut details, "title", &self.title, TITLE_MIN, TITLE_MAX);
        check_length(&mut details, "author", &self.author, AUTHOR_MIN, AUTHOR_MAX);
        if let Some(isbn) = &self.isbn {
            check_length(&mut details, "isbn", isbn, ISBN_MIN, ISBN_MAX);
        }
        if let Some(year) = self.published_year {
            check_year(&mut details, year);
        }
        if details.is_empty() {
            Ok(())
        } else {
            Err(details)
        }
    }
}

/// Payload for a partial update. Absent fields leave the stored value
/// unchanged; for the optional fields an explicit `null` is a present value
/// and clears the stored one, hence the double `Option`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBook {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub isbn: Option<Option<String>>,
    #[serde(default, deserialize_with = "present_or_null")]
    pub published_year: Option<Option<i32>>,
}

impl UpdateBook {
    /// Check the constraints of every field that is present. A `null`
    /// (clearing an optional field) is always valid.
    pub fn validate(&self) -> Result<(), Vec<Value>> {
        let mut details = Vec::new();
        if let Some(title) = &self.title {
            check_length(&mut details, "title", title, TITLE_MIN, TITLE_MAX);
        }
        if let Some(author) = &self.author {
            check_length(&mut details, "author", author, AUTHOR_MIN, AUTHOR_MAX);
        }
        if let Some(Some(isbn)) = &self.isbn {
            check_length(&mut details, "isbn", isbn, ISBN_MIN, ISBN_MAX);
        }
        if let Some(Some(year)) = self.published_year {
            check_year(&mut details, year);
        }
        if details.is_empty() {
            Ok(())
        } else {
            Err(details)
        }
    }
}

/// Distinguishes a field sent as `null` (`Some(None)`) from one omitted
/// entirely (`None`, supplied by the `default`).
fn present_or_null<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_length(details: &mut Vec<Value>, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        details.push(json!({
            "field": field,
            "error": format!("length must be between {min} and {max} characters"),
        }));
    }
}

fn check_year(details: &mut Vec<Value>, year: i32) {
    if !(YEAR_MIN..=YEAR_MAX).contains(&year) {
        details.push(json!({
            "field": "published_year",
            "error": format!("must be between {YEAR_MIN} and {YEAR_MAX}"),
        }));
    }
}
