//! Database operations for the book catalog.

use rusqlite::{Connection, Row};

use crate::{
    Error,
    book::{Book, BookId, BookStatus, domain::NewBook},
};

/// Add a book to the catalog as [BookStatus::Available] and return it with its generated ID.
pub fn create_book(book: NewBook, connection: &Connection) -> Result<Book, Error> {
    connection.execute(
        "INSERT INTO book (title, author, status) VALUES (?1, ?2, ?3);",
        (book.title(), book.author(), BookStatus::Available),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Book {
        id,
        title: book.title().to_owned(),
        author: book.author().to_owned(),
        status: BookStatus::Available,
    })
}

/// Retrieve a single book by ID.
///
/// # Errors
///
/// Returns an [Error::BookNotFound] if no book has the ID `book_id`.
pub fn get_book(book_id: BookId, connection: &Connection) -> Result<Book, Error> {
    connection
        .prepare("SELECT id, title, author, status FROM book WHERE id = :id;")?
        .query_row(&[(":id", &book_id)], |row| map_book_row(row, 0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::BookNotFound,
            error => error.into(),
        })
}

/// Retrieve all books ordered alphabetically by title.
pub fn get_all_books(connection: &Connection) -> Result<Vec<Book>, Error> {
    connection
        .prepare("SELECT id, title, author, status FROM book ORDER BY title ASC, id ASC;")?
        .query_map([], |row| map_book_row(row, 0))?
        .map(|maybe_book| maybe_book.map_err(|error| error.into()))
        .collect()
}

/// Mark an available book as issued.
///
/// # Errors
///
/// Returns a:
/// - [Error::BookNotFound] if no book has the ID `book_id`,
/// - [Error::BookUnavailable] if the book is already issued.
pub fn issue_book(book_id: BookId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE book SET status = ?1 WHERE id = ?2 AND status = ?3",
        (BookStatus::Issued, book_id, BookStatus::Available),
    )?;

    if rows_affected == 0 {
        get_book(book_id, connection)?;
        return Err(Error::BookUnavailable);
    }

    Ok(())
}

/// Set the availability of a book. Returns an error if the book doesn't exist.
pub fn set_book_status(
    book_id: BookId,
    status: BookStatus,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE book SET status = ?1 WHERE id = ?2",
        (status, book_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::BookNotFound);
    }

    Ok(())
}

/// Initialize the book table and indexes.
pub fn create_book_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS book (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            author TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'Available' CHECK (status IN ('Available', 'Issued'))
        );

        CREATE INDEX IF NOT EXISTS idx_book_title ON book(title);",
    )?;

    Ok(())
}

/// Map the four book columns starting at `offset`.
///
/// Used directly for book queries and for joins that select the book columns
/// after another table's columns.
pub(crate) fn map_book_row(row: &Row, offset: usize) -> Result<Book, rusqlite::Error> {
    Ok(Book {
        id: row.get(offset)?,
        title: row.get(offset + 1)?,
        author: row.get(offset + 2)?,
        status: row.get(offset + 3)?,
    })
}

#[cfg(test)]
mod book_query_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        book::{BookStatus, domain::NewBook},
    };

    use super::{
        create_book, create_book_table, get_all_books, get_book, issue_book, set_book_status,
    };

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_book_table(&connection).expect("Could not create book table");
        connection
    }

    #[test]
    fn create_book_succeeds() {
        let connection = get_test_db_connection();

        let book = create_book(NewBook::new("Kindred", "Octavia E. Butler").unwrap(), &connection)
            .expect("Could not create book");

        assert!(book.id > 0);
        assert_eq!(book.title, "Kindred");
        assert_eq!(book.author, "Octavia E. Butler");
        assert_eq!(book.status, BookStatus::Available);
    }

    #[test]
    fn get_book_succeeds() {
        let connection = get_test_db_connection();
        let inserted_book =
            create_book(NewBook::new("Kindred", "Octavia E. Butler").unwrap(), &connection)
                .unwrap();

        let selected_book = get_book(inserted_book.id, &connection);

        assert_eq!(Ok(inserted_book), selected_book);
    }

    #[test]
    fn get_book_with_invalid_id_returns_book_not_found() {
        let connection = get_test_db_connection();

        assert_eq!(get_book(123, &connection), Err(Error::BookNotFound));
    }

    #[test]
    fn get_all_books_orders_by_title() {
        let connection = get_test_db_connection();
        let solaris = create_book(NewBook::new("Solaris", "Stanisław Lem").unwrap(), &connection)
            .unwrap();
        let beloved =
            create_book(NewBook::new("Beloved", "Toni Morrison").unwrap(), &connection).unwrap();

        let books = get_all_books(&connection).expect("Could not get all books");

        assert_eq!(books, vec![beloved, solaris]);
    }

    #[test]
    fn set_book_status_succeeds() {
        let connection = get_test_db_connection();
        let book = create_book(NewBook::new("Beloved", "Toni Morrison").unwrap(), &connection)
            .unwrap();

        set_book_status(book.id, BookStatus::Issued, &connection).unwrap();

        let got = get_book(book.id, &connection).unwrap();
        assert_eq!(got.status, BookStatus::Issued);
    }

    #[test]
    fn set_book_status_with_invalid_id_returns_book_not_found() {
        let connection = get_test_db_connection();

        let result = set_book_status(999, BookStatus::Issued, &connection);

        assert_eq!(result, Err(Error::BookNotFound));
    }

    #[test]
    fn issue_book_marks_available_book_issued() {
        let connection = get_test_db_connection();
        let book = create_book(NewBook::new("Beloved", "Toni Morrison").unwrap(), &connection)
            .unwrap();

        issue_book(book.id, &connection).unwrap();

        assert_eq!(get_book(book.id, &connection).unwrap().status, BookStatus::Issued);
    }

    #[test]
    fn issue_book_rejects_issued_book() {
        let connection = get_test_db_connection();
        let book = create_book(NewBook::new("Beloved", "Toni Morrison").unwrap(), &connection)
            .unwrap();
        issue_book(book.id, &connection).unwrap();

        assert_eq!(issue_book(book.id, &connection), Err(Error::BookUnavailable));
    }

    #[test]
    fn issue_book_with_invalid_id_returns_book_not_found() {
        let connection = get_test_db_connection();

        assert_eq!(issue_book(999, &connection), Err(Error::BookNotFound));
    }
}
