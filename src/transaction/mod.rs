//! Lending books: requests, issues, returns and overdue fines.

mod availability;
mod db;
mod domain;
mod loans;
mod pending;
mod request;
mod returns;
mod state;

pub use availability::get_availability_page;
pub use db::create_transaction_table;
#[cfg(test)]
pub(crate) use db::{get_transaction, request_issue};
pub use domain::{
    DAILY_FINE, Fine, FineAssessment, LOAN_PERIOD, Transaction, TransactionId, TransactionStatus,
    assess_fine,
};
pub use loans::{get_my_books_page, get_my_reports_page};
pub use pending::{approve_issue_endpoint, get_pending_page};
pub use request::{request_issue_endpoint, request_return_endpoint};
pub use returns::{confirm_return_endpoint, get_return_page, get_returns_page};
