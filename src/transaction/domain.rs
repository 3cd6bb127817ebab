//! Core types for lending books: the transaction lifecycle and overdue fines.

use std::fmt::Display;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};

use crate::{Error, book::BookId, user::UserID};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// How long a book may be kept before it is overdue.
pub const LOAN_PERIOD: Duration = Duration::days(15);

/// The fine charged for each day a book is overdue.
pub const DAILY_FINE: f64 = 10.0;

/// Where a transaction is in its lifecycle.
///
/// Transactions only ever move forward:
/// Pending → Issued → ReturnRequested → Returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum TransactionStatus {
    /// A user asked to borrow a book and is waiting for an administrator.
    Pending,
    /// The book has been lent to the user.
    Issued,
    /// The user wants to hand the book back.
    ReturnRequested,
    /// An administrator confirmed the book is back on the shelf.
    Returned,
}

impl TransactionStatus {
    /// The status as it is stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "Pending",
            TransactionStatus::Issued => "Issued",
            TransactionStatus::ReturnRequested => "ReturnRequested",
            TransactionStatus::Returned => "Returned",
        }
    }

    /// The status as it is shown to people.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::ReturnRequested => "Return Requested",
            status => status.as_str(),
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for TransactionStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for TransactionStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "Pending" => Ok(TransactionStatus::Pending),
            "Issued" => Ok(TransactionStatus::Issued),
            "ReturnRequested" => Ok(TransactionStatus::ReturnRequested),
            "Returned" => Ok(TransactionStatus::Returned),
            other => Err(FromSqlError::Other(
                format!("invalid transaction status \"{other}\"").into(),
            )),
        }
    }
}

/// One lending of a book to a user, from the request until the book is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub user_id: UserID,
    pub book_id: BookId,
    pub status: TransactionStatus,
    /// Set when the transaction is issued.
    pub issue_date: Option<OffsetDateTime>,
    /// The due date, set together with `issue_date`.
    pub return_date: Option<OffsetDateTime>,
    /// When the return was confirmed.
    pub actual_return_date: Option<OffsetDateTime>,
    pub fine: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// A fine amount that is finite and not negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Fine(f64);

impl Fine {
    /// Validate a fine amount.
    ///
    /// # Errors
    ///
    /// Returns an [Error::InvalidFine] if `amount` is negative, infinite or NaN.
    pub fn new(amount: f64) -> Result<Self, Error> {
        if amount.is_finite() && amount >= 0.0 {
            Ok(Self(amount))
        } else {
            Err(Error::InvalidFine(amount))
        }
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

/// How overdue a book is and what that costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FineAssessment {
    pub late_days: i64,
    pub fine: f64,
}

/// Work out the overdue fine for a book due on `return_date` if it is returned on `today`.
///
/// Any part of a day past the due date counts as a whole late day.
/// Books without a due date and books returned on time have no fine.
pub fn assess_fine(return_date: Option<OffsetDateTime>, today: OffsetDateTime) -> FineAssessment {
    let late_days = match return_date {
        Some(return_date) if today > return_date => {
            let overdue = (today - return_date).whole_nanoseconds();
            let day = Duration::DAY.whole_nanoseconds();

            ((overdue + day - 1) / day) as i64
        }
        _ => 0,
    };

    FineAssessment {
        late_days,
        fine: late_days as f64 * DAILY_FINE,
    }
}

/// Form data for requesting a book.
#[derive(Debug, Serialize, Deserialize)]
pub struct BookRequestForm {
    pub book_id: BookId,
}

/// Form data for actions on an existing transaction.
#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionForm {
    pub transaction_id: TransactionId,
}

/// Form data for confirming a return.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConfirmReturnForm {
    pub transaction_id: TransactionId,
    pub fine: f64,
}

#[cfg(test)]
mod fine_tests {
    use time::{Duration, macros::datetime};

    use crate::{
        Error,
        transaction::domain::{Fine, FineAssessment, assess_fine},
    };

    #[test]
    fn no_fine_without_due_date() {
        let got = assess_fine(None, datetime!(2025-10-20 12:00 UTC));

        assert_eq!(
            got,
            FineAssessment {
                late_days: 0,
                fine: 0.0
            }
        );
    }

    #[test]
    fn no_fine_on_or_before_due_date() {
        let due = datetime!(2025-10-20 12:00 UTC);

        for today in [due - Duration::days(3), due - Duration::seconds(1), due] {
            assert_eq!(assess_fine(Some(due), today).fine, 0.0, "today = {today}");
            assert_eq!(assess_fine(Some(due), today).late_days, 0);
        }
    }

    #[test]
    fn three_days_late_costs_thirty() {
        let due = datetime!(2025-10-20 12:00 UTC);

        let got = assess_fine(Some(due), due + Duration::days(3));

        assert_eq!(
            got,
            FineAssessment {
                late_days: 3,
                fine: 30.0
            }
        );
    }

    #[test]
    fn part_of_a_day_counts_as_a_whole_day() {
        let due = datetime!(2025-10-20 12:00 UTC);

        assert_eq!(assess_fine(Some(due), due + Duration::minutes(1)).late_days, 1);
        assert_eq!(
            assess_fine(Some(due), due + Duration::days(2) + Duration::hours(1)).late_days,
            3
        );
    }

    #[test]
    fn fine_rejects_negative_and_non_finite_amounts() {
        assert_eq!(Fine::new(-1.0), Err(Error::InvalidFine(-1.0)));
        assert!(Fine::new(f64::NAN).is_err());
        assert_eq!(
            Fine::new(f64::INFINITY),
            Err(Error::InvalidFine(f64::INFINITY))
        );
    }

    #[test]
    fn fine_accepts_zero_and_positive_amounts() {
        assert_eq!(Fine::new(0.0).map(|fine| fine.as_f64()), Ok(0.0));
        assert_eq!(Fine::new(42.5).map(|fine| fine.as_f64()), Ok(42.5));
    }
}
