//! The library's book catalog.

mod create;
mod db;
mod domain;

pub use create::{create_book_endpoint, get_new_book_page};
pub use db::{
    create_book, create_book_table, get_all_books, get_book, issue_book, set_book_status,
};
pub(crate) use db::map_book_row;
pub use domain::{Book, BookId, BookStatus, NewBook};
