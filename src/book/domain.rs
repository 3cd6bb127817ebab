//! Core book catalog types.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Database identifier for a book.
pub type BookId = i64;

/// Whether a book is on the shelf or lent out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum BookStatus {
    /// The book is on the shelf.
    Available,
    /// The book has been lent to a user.
    Issued,
}

impl BookStatus {
    /// The status as it is stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Issued => "Issued",
        }
    }
}

impl Display for BookStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for BookStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Available" => Ok(BookStatus::Available),
            "Issued" => Ok(BookStatus::Issued),
            other => Err(FromSqlError::Other(
                format!("invalid book status \"{other}\"").into(),
            )),
        }
    }
}

/// A book in the library catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub status: BookStatus,
}

/// A book that has been validated but not yet added to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    title: String,
    author: String,
}

impl NewBook {
    /// Validate the title and author of a book, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns an [Error::EmptyBookField] if either field is empty.
    pub fn new(title: &str, author: &str) -> Result<Self, Error> {
        let title = title.trim();
        let author = author.trim();

        if title.is_empty() {
            return Err(Error::EmptyBookField("Title"));
        }

        if author.is_empty() {
            return Err(Error::EmptyBookField("Author"));
        }

        Ok(Self {
            title: title.to_owned(),
            author: author.to_owned(),
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }
}

/// Form data for adding a book.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookFormData {
    pub title: String,
    pub author: String,
}

#[cfg(test)]
mod new_book_tests {
    use crate::{Error, book::domain::NewBook};

    #[test]
    fn new_fails_on_empty_title() {
        assert_eq!(
            NewBook::new(" ", "Ursula K. Le Guin"),
            Err(Error::EmptyBookField("Title"))
        );
    }

    #[test]
    fn new_fails_on_empty_author() {
        assert_eq!(
            NewBook::new("The Dispossessed", "\t"),
            Err(Error::EmptyBookField("Author"))
        );
    }

    #[test]
    fn new_trims_fields() {
        let book = NewBook::new("  The Dispossessed ", " Ursula K. Le Guin").unwrap();

        assert_eq!(book.title(), "The Dispossessed");
        assert_eq!(book.author(), "Ursula K. Le Guin");
    }
}
