use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog entry as served by `/api/books`. Copy counts are owned by the
/// server; the client renders them as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: Option<String>,
    pub total_copies: i64,
    pub copies_available: i64,
}

impl Book {
    /// Whether at least one copy is on the shelf. Gates the borrow action.
    pub fn is_available(&self) -> bool {
        self.copies_available > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A loan row from `/api/loans`. `book_title` and `member_name` are
/// denormalized by the server for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: i64,
    pub book_id: i64,
    pub member_id: i64,
    pub book_title: String,
    pub member_name: String,
    pub due_at: DateTime<Utc>,
    pub status: LoanStatus,
}

impl Loan {
    /// A loan can be returned as long as the server has not marked it returned.
    pub fn is_open(&self) -> bool {
        self.status != LoanStatus::Returned
    }
}

/// Loan lifecycle as reported by the server. The value set is owned by the
/// API; anything unrecognized is carried through as `Other` rather than
/// failing the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Active,
    Returned,
    Overdue,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Active => "active",
            LoanStatus::Returned => "returned",
            LoanStatus::Overdue => "overdue",
            LoanStatus::Other(s) => s.as_str(),
        };
        write!(f, "{}", label)
    }
}

/// Aggregate counts from `/api/stats`. Fields absent from the response fall
/// back to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default)]
    pub books: i64,
    #[serde(default)]
    pub copies: i64,
    #[serde(default)]
    pub available: i64,
    #[serde(default)]
    pub members: i64,
    #[serde(default)]
    pub active_loans: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn borrow_is_gated_on_available_copies() {
        let mut book: Book = serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Dune",
            "author": "Frank Herbert",
            "isbn": "9780441013593",
            "category": "Sci-Fi",
            "total_copies": 3,
            "copies_available": 3,
        }))
        .unwrap();
        assert!(book.is_available());

        book.copies_available = 0;
        assert!(!book.is_available());
    }

    #[test]
    fn loan_status_parses_known_values() {
        assert_eq!(
            serde_json::from_str::<LoanStatus>("\"active\"").unwrap(),
            LoanStatus::Active
        );
        assert_eq!(
            serde_json::from_str::<LoanStatus>("\"returned\"").unwrap(),
            LoanStatus::Returned
        );
        assert_eq!(
            serde_json::from_str::<LoanStatus>("\"overdue\"").unwrap(),
            LoanStatus::Overdue
        );
    }

    #[test]
    fn unknown_loan_status_is_tolerated_and_counts_as_open() {
        let loan: Loan = serde_json::from_value(serde_json::json!({
            "id": 5,
            "book_id": 7,
            "member_id": 1,
            "book_title": "Dune",
            "member_name": "Ada",
            "due_at": "2026-08-20T00:00:00Z",
            "status": "renewed",
        }))
        .unwrap();
        assert_eq!(loan.status, LoanStatus::Other("renewed".to_string()));
        assert!(loan.is_open());
        assert_eq!(loan.status.to_string(), "renewed");
    }

    #[test]
    fn returned_loans_are_not_open() {
        let loan: Loan = serde_json::from_value(serde_json::json!({
            "id": 5,
            "book_id": 7,
            "member_id": 1,
            "book_title": "Dune",
            "member_name": "Ada",
            "due_at": "2026-08-20T00:00:00Z",
            "status": "returned",
        }))
        .unwrap();
        assert!(!loan.is_open());
    }

    #[test]
    fn stats_fields_default_to_zero_when_absent() {
        let stats: Stats = serde_json::from_str("{}").unwrap();
        assert_eq!(stats.books, 0);
        assert_eq!(stats.copies, 0);
        assert_eq!(stats.available, 0);
        assert_eq!(stats.members, 0);
        assert_eq!(stats.active_loans, 0);

        let stats: Stats = serde_json::from_str(r#"{"books": 12, "members": 4}"#).unwrap();
        assert_eq!(stats.books, 12);
        assert_eq!(stats.members, 4);
        assert_eq!(stats.active_loans, 0);
    }
}
