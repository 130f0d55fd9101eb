//! Movie model and row-level persistence for the Marquee service.
//!
//! Three independent shapes share field names: [`Movie`] is a persisted
//! row, [`NewMovie`] is what a client sends to create one, and
//! [`MovieUpdate`] is a partial patch where only the keys present in the
//! request are written. Every operation takes a plain `&Connection`, so it
//! runs equally well on a pooled connection or inside a transaction.

pub mod release_date;

use chrono::NaiveDateTime;
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Errors that can occur during movie operations.
#[derive(Debug, Error)]
pub enum MovieError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("movie not found: {0}")]
    NotFound(i64),
}

/// A persisted movie row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Movie {
    /// Row ID assigned by SQLite. Never reused after a delete.
    pub id: i64,
    pub author: String,
    pub description: String,
    /// Release timestamp, without time zone.
    pub release_date: NaiveDateTime,
}

/// Body of a create request. Every field is required.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct NewMovie {
    pub author: String,
    pub description: String,
    #[serde(deserialize_with = "release_date::deserialize")]
    pub release_date: NaiveDateTime,
}

impl NewMovie {
    /// Pairs the request fields with the ID the store assigned them.
    pub fn into_movie(self, id: i64) -> Movie {
        Movie {
            id,
            author: self.author,
            description: self.description,
            release_date: self.release_date,
        }
    }
}

/// Body of an update request.
///
/// A missing key leaves the stored column untouched. An explicit `null` is
/// rejected at deserialization, since none of the columns are nullable.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MovieUpdate {
    #[serde(default, deserialize_with = "present")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "release_date::deserialize_present")]
    pub release_date: Option<NaiveDateTime>,
}

impl MovieUpdate {
    /// Column/value pairs for the fields this update sets, in column order.
    fn assignments(&self) -> Vec<(&'static str, &dyn ToSql)> {
        let mut set: Vec<(&'static str, &dyn ToSql)> = Vec::with_capacity(3);
        if let Some(author) = &self.author {
            set.push(("author", author as &dyn ToSql));
        }
        if let Some(description) = &self.description {
            set.push(("description", description as &dyn ToSql));
        }
        if let Some(release_date) = &self.release_date {
            set.push(("release_date", release_date as &dyn ToSql));
        }
        set
    }
}

/// Deserializes a key that is present in the input. Paired with
/// `#[serde(default)]`, an absent key becomes `None` while `null` fails to
/// deserialize as `T`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Inserts a new movie and returns the stored row with its assigned ID.
pub fn create_movie(conn: &Connection, new: NewMovie) -> Result<Movie, MovieError> {
    conn.execute(
        "INSERT INTO movie (author, description, release_date) VALUES (?1, ?2, ?3)",
        params![new.author, new.description, new.release_date],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!(movie_id = id, "movie row inserted");
    Ok(new.into_movie(id))
}

/// Retrieves a movie by ID.
pub fn get_movie(conn: &Connection, id: i64) -> Result<Movie, MovieError> {
    conn.query_row(
        "SELECT id, author, description, release_date FROM movie WHERE id = ?1",
        [id],
        map_row_to_movie,
    )
    .optional()?
    .ok_or(MovieError::NotFound(id))
}

/// Merges `update` into the stored movie with a single UPDATE statement and
/// returns the row as it now stands.
///
/// Only fields that are `Some` are written. An empty update still checks
/// that the movie exists.
pub fn update_movie(conn: &Connection, id: i64, update: &MovieUpdate) -> Result<Movie, MovieError> {
    let assignments = update.assignments();
    if assignments.is_empty() {
        return get_movie(conn, id);
    }

    let set_clause = assignments
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE movie SET {} WHERE id = ?{}",
        set_clause,
        assignments.len() + 1
    );

    let mut values: Vec<&dyn ToSql> = assignments.iter().map(|(_, value)| *value).collect();
    values.push(&id);

    let count = conn.execute(&sql, values.as_slice())?;
    if count == 0 {
        return Err(MovieError::NotFound(id));
    }
    get_movie(conn, id)
}

/// Deletes a movie.
pub fn delete_movie(conn: &Connection, id: i64) -> Result<(), MovieError> {
    let count = conn.execute("DELETE FROM movie WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(MovieError::NotFound(id));
    }
    Ok(())
}

fn map_row_to_movie(row: &Row) -> rusqlite::Result<Movie> {
    Ok(Movie {
        id: row.get(0)?,
        author: row.get(1)?,
        description: row.get(2)?,
        release_date: row.get(3)?,
    })
}
