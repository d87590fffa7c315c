//! Transient form state for entities not yet persisted. A draft lives for a
//! single submission: it resets to its defaults on success and keeps what the
//! user typed on failure.

use serde::{Deserialize, Serialize};

/// Loan duration bounds, enforced at the input boundary.
pub const DEFAULT_LOAN_DAYS: i64 = 14;
pub const MIN_LOAN_DAYS: i64 = 1;
pub const MAX_LOAN_DAYS: i64 = 60;

/// Clamp a requested loan duration into the allowed range.
pub fn clamp_loan_days(days: i64) -> i64 {
    days.clamp(MIN_LOAN_DAYS, MAX_LOAN_DAYS)
}

/// Body of `POST /api/books`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i64,
    pub copies_available: i64,
}

impl Default for BookDraft {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            isbn: String::new(),
            category: String::new(),
            total_copies: 1,
            copies_available: 1,
        }
    }
}

impl BookDraft {
    /// Title, author and ISBN are required; category is not.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.author.is_empty() && !self.isbn.is_empty()
    }
}

/// Body of `POST /api/members`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemberDraft {
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl MemberDraft {
    /// Name and email are required; phone is not.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.email.is_empty()
    }
}

/// Body of `POST /api/loans/borrow`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BorrowRequest {
    pub member_id: i64,
    pub book_id: i64,
    pub days: i64,
}
