//! Database operations for transactions and the transitions between their statuses.
//!
//! Every transition is a conditional update on the current status, so a transition
//! that races another one for the same transaction affects no rows and is rejected.
//! Transitions that also change a book's status commit both writes together.

use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    book::{Book, BookId, BookStatus, get_book, issue_book, map_book_row, set_book_status},
    transaction::{Fine, LOAN_PERIOD, Transaction, TransactionId, TransactionStatus},
    user::{UserID, Username},
};

/// The transaction columns in the order [map_transaction_row] expects.
const TRANSACTION_COLUMNS: &str = "t.id, t.user_id, t.book_id, t.status, t.issue_date, \
    t.return_date, t.actual_return_date, t.fine, t.created_at, t.updated_at";

const TRANSACTION_COLUMN_COUNT: usize = 10;

const BOOK_COLUMNS: &str = "b.id, b.title, b.author, b.status";

/// A transaction together with the book it lends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionWithBook {
    pub transaction: Transaction,
    pub book: Book,
}

/// A transaction with the name of the borrower and the book, as administrators see it.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub username: Username,
    pub book: Book,
}

/// The order to list a user's transactions in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOrder {
    OldestFirst,
    NewestFirst,
}

impl TransactionOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            TransactionOrder::OldestFirst => "ASC",
            TransactionOrder::NewestFirst => "DESC",
        }
    }
}

/// Create the transaction table.
///
/// A user may only have one pending or issued transaction per book, which is
/// enforced by a partial unique index.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL REFERENCES user(id),
            book_id INTEGER NOT NULL REFERENCES book(id),
            status TEXT NOT NULL DEFAULT 'Pending'
                CHECK (status IN ('Pending', 'Issued', 'ReturnRequested', 'Returned')),
            issue_date TEXT,
            return_date TEXT,
            actual_return_date TEXT,
            fine REAL NOT NULL DEFAULT 0 CHECK (fine >= 0),
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_transaction_outstanding
            ON \"transaction\"(user_id, book_id)
            WHERE status IN ('Pending', 'Issued');

        CREATE INDEX IF NOT EXISTS idx_transaction_status ON \"transaction\"(status);
        CREATE INDEX IF NOT EXISTS idx_transaction_user_id ON \"transaction\"(user_id);",
    )?;

    Ok(())
}

/// Record that `user_id` wants to borrow `book_id`.
///
/// # Errors
///
/// Returns a:
/// - [Error::BookNotFound] if the book does not exist,
/// - [Error::DuplicateRequest] if the user already has a pending or issued
///   transaction for the book,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn request_issue(
    user_id: UserID,
    book_id: BookId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    get_book(book_id, connection)?;

    let outstanding: Option<TransactionId> = connection
        .query_row(
            "SELECT id FROM \"transaction\"
            WHERE user_id = ?1 AND book_id = ?2 AND status IN ('Pending', 'Issued')",
            (user_id.as_i64(), book_id),
            |row| row.get(0),
        )
        .optional()?;

    if outstanding.is_some() {
        return Err(Error::DuplicateRequest);
    }

    connection.execute(
        "INSERT INTO \"transaction\" (user_id, book_id, status, fine, created_at, updated_at)
        VALUES (?1, ?2, ?3, 0, ?4, ?4)",
        (
            user_id.as_i64(),
            book_id,
            TransactionStatus::Pending,
            now,
        ),
    )?;

    Ok(Transaction {
        id: connection.last_insert_rowid(),
        user_id,
        book_id,
        status: TransactionStatus::Pending,
        issue_date: None,
        return_date: None,
        actual_return_date: None,
        fine: 0.0,
        created_at: now,
        updated_at: now,
    })
}

/// Issue the book of a pending transaction, due back after [LOAN_PERIOD].
///
/// The book is marked as issued in the same database transaction.
///
/// # Errors
///
/// Returns a:
/// - [Error::TransactionNotFound] if there is no transaction with `transaction_id`,
/// - [Error::InvalidTransition] if the transaction is not pending,
/// - [Error::BookUnavailable] if the book is issued under another transaction,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn approve_issue(
    transaction_id: TransactionId,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let current = get_transaction(transaction_id, &sql_transaction)?;

    let rows_affected = sql_transaction.execute(
        "UPDATE \"transaction\"
        SET status = ?1, issue_date = ?2, return_date = ?3, updated_at = ?2
        WHERE id = ?4 AND status = ?5",
        (
            TransactionStatus::Issued,
            now,
            now + LOAN_PERIOD,
            transaction_id,
            TransactionStatus::Pending,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidTransition {
            from: current.status,
            to: TransactionStatus::Issued,
        });
    }

    issue_book(current.book_id, &sql_transaction)?;

    let updated = get_transaction(transaction_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(updated)
}

/// Ask to hand back a book that has been issued to `user_id`.
///
/// # Errors
///
/// Returns an [Error::InvalidReturnRequest] if the transaction does not exist,
/// belongs to another user or is not issued.
pub fn request_return(
    transaction_id: TransactionId,
    user_id: UserID,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let rows_affected = connection.execute(
        "UPDATE \"transaction\"
        SET status = ?1, updated_at = ?2
        WHERE id = ?3 AND user_id = ?4 AND status = ?5",
        (
            TransactionStatus::ReturnRequested,
            now,
            transaction_id,
            user_id.as_i64(),
            TransactionStatus::Issued,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidReturnRequest);
    }

    get_transaction(transaction_id, connection)
}

/// Confirm a requested return, recording `fine` and putting the book back on the shelf.
///
/// # Errors
///
/// Returns a:
/// - [Error::TransactionNotFound] if there is no transaction with `transaction_id`,
/// - [Error::InvalidTransition] if no return has been requested,
/// - [Error::SqlError] if an SQL related error occurred.
pub fn confirm_return(
    transaction_id: TransactionId,
    fine: Fine,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let sql_transaction = connection.unchecked_transaction()?;
    let current = get_transaction(transaction_id, &sql_transaction)?;

    let rows_affected = sql_transaction.execute(
        "UPDATE \"transaction\"
        SET status = ?1, fine = ?2, actual_return_date = ?3, updated_at = ?3
        WHERE id = ?4 AND status = ?5",
        (
            TransactionStatus::Returned,
            fine.as_f64(),
            now,
            transaction_id,
            TransactionStatus::ReturnRequested,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidTransition {
            from: current.status,
            to: TransactionStatus::Returned,
        });
    }

    set_book_status(current.book_id, BookStatus::Available, &sql_transaction)?;

    let updated = get_transaction(transaction_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(updated)
}

/// Retrieve a single transaction.
///
/// # Errors
///
/// Returns an [Error::TransactionNotFound] if there is no transaction with `transaction_id`.
pub fn get_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM \"transaction\" t WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &transaction_id)], |row| map_transaction_row(row, 0))
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

/// Retrieve every transaction of `user_id` together with its book.
pub fn get_user_transactions(
    user_id: UserID,
    order: TransactionOrder,
    connection: &Connection,
) -> Result<Vec<TransactionWithBook>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, {BOOK_COLUMNS}
            FROM \"transaction\" t
            INNER JOIN book b ON b.id = t.book_id
            WHERE t.user_id = :user_id
            ORDER BY t.id {}",
            order.as_sql()
        ))?
        .query_map(&[(":user_id", &user_id.as_i64())], |row| {
            Ok(TransactionWithBook {
                transaction: map_transaction_row(row, 0)?,
                book: map_book_row(row, TRANSACTION_COLUMN_COUNT)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Retrieve the issue requests waiting for approval, oldest first.
pub fn get_pending_requests(connection: &Connection) -> Result<Vec<TransactionDetails>, Error> {
    get_transactions_with_status(TransactionStatus::Pending, connection)
}

/// Retrieve the transactions whose books users want to hand back, oldest first.
pub fn get_return_requests(connection: &Connection) -> Result<Vec<TransactionDetails>, Error> {
    get_transactions_with_status(TransactionStatus::ReturnRequested, connection)
}

fn get_transactions_with_status(
    status: TransactionStatus,
    connection: &Connection,
) -> Result<Vec<TransactionDetails>, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, u.username, {BOOK_COLUMNS}
            FROM \"transaction\" t
            INNER JOIN user u ON u.id = t.user_id
            INNER JOIN book b ON b.id = t.book_id
            WHERE t.status = :status
            ORDER BY t.id ASC"
        ))?
        .query_map(&[(":status", &status)], map_details_row)?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// Retrieve a transaction with its borrower's name and book.
///
/// # Errors
///
/// Returns an [Error::TransactionNotFound] if there is no transaction with `transaction_id`.
pub fn get_transaction_details(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<TransactionDetails, Error> {
    connection
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS}, u.username, {BOOK_COLUMNS}
            FROM \"transaction\" t
            INNER JOIN user u ON u.id = t.user_id
            INNER JOIN book b ON b.id = t.book_id
            WHERE t.id = :id"
        ))?
        .query_row(&[(":id", &transaction_id)], map_details_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::TransactionNotFound,
            error => error.into(),
        })
}

fn map_transaction_row(row: &Row, offset: usize) -> Result<Transaction, rusqlite::Error> {
    Ok(Transaction {
        id: row.get(offset)?,
        user_id: UserID::new(row.get(offset + 1)?),
        book_id: row.get(offset + 2)?,
        status: row.get(offset + 3)?,
        issue_date: row.get(offset + 4)?,
        return_date: row.get(offset + 5)?,
        actual_return_date: row.get(offset + 6)?,
        fine: row.get(offset + 7)?,
        created_at: row.get(offset + 8)?,
        updated_at: row.get(offset + 9)?,
    })
}

fn map_details_row(row: &Row) -> Result<TransactionDetails, rusqlite::Error> {
    let raw_username: String = row.get(TRANSACTION_COLUMN_COUNT)?;

    Ok(TransactionDetails {
        transaction: map_transaction_row(row, 0)?,
        username: Username::new_unchecked(&raw_username),
        book: map_book_row(row, TRANSACTION_COLUMN_COUNT + 1)?,
    })
}
