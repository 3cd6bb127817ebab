use rusqlite::Connection;

use crate::{
    PasswordHash,
    book::{Book, NewBook, create_book},
    db::initialize,
    user::{Role, User, Username, create_user},
};

pub(crate) fn get_test_connection() -> Connection {
    let connection =
        Connection::open_in_memory().expect("Could not open in-memory SQLite database");
    initialize(&connection).expect("Could not initialize database");
    connection
}

pub(crate) fn insert_test_user(username: &str, role: Role, connection: &Connection) -> User {
    create_user(
        Username::new_unchecked(username),
        PasswordHash::new_unchecked("hunter2"),
        role,
        connection,
    )
    .expect("Could not create test user")
}

pub(crate) fn insert_test_book(title: &str, connection: &Connection) -> Book {
    create_book(
        NewBook::new(title, "Test Author").expect("Invalid test book"),
        connection,
    )
    .expect("Could not create test book")
}
