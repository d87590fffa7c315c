pub mod draft;
pub mod library;

// Re-export commonly used types
pub use draft::{BookDraft, BorrowRequest, MemberDraft};
pub use library::{Book, Loan, LoanStatus, Member, Stats};
