//! Field-at-a-time editing state for the add-book and add-member forms.
//!
//! Text fields edit the draft directly; numeric fields edit a digit-only
//! buffer that is folded into the draft at submit time, keeping the draft's
//! current value when the buffer does not parse.

use circdesk_common::{BookDraft, MemberDraft};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Isbn,
    Category,
    TotalCopies,
    CopiesAvailable,
}

impl BookField {
    pub const ALL: [BookField; 6] = [
        BookField::Title,
        BookField::Author,
        BookField::Isbn,
        BookField::Category,
        BookField::TotalCopies,
        BookField::CopiesAvailable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Isbn => "ISBN",
            BookField::Category => "Category",
            BookField::TotalCopies => "Total copies",
            BookField::CopiesAvailable => "Available",
        }
    }

    fn is_numeric(self) -> bool {
        matches!(self, BookField::TotalCopies | BookField::CopiesAvailable)
    }

    fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug)]
pub struct BookForm {
    pub draft: BookDraft,
    pub total_copies_input: String,
    pub copies_available_input: String,
    pub field: BookField,
    pub submitting: bool,
}

impl Default for BookForm {
    fn default() -> Self {
        let draft = BookDraft::default();
        Self {
            total_copies_input: draft.total_copies.to_string(),
            copies_available_input: draft.copies_available.to_string(),
            draft,
            field: BookField::Title,
            submitting: false,
        }
    }
}

impl BookForm {
    /// Current text of a field, for rendering.
    pub fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.draft.title,
            BookField::Author => &self.draft.author,
            BookField::Isbn => &self.draft.isbn,
            BookField::Category => &self.draft.category,
            BookField::TotalCopies => &self.total_copies_input,
            BookField::CopiesAvailable => &self.copies_available_input,
        }
    }

    pub fn input(&mut self, c: char) {
        if self.field.is_numeric() && !c.is_ascii_digit() {
            return;
        }
        match self.field {
            BookField::Title => self.draft.title.push(c),
            BookField::Author => self.draft.author.push(c),
            BookField::Isbn => self.draft.isbn.push(c),
            BookField::Category => self.draft.category.push(c),
            BookField::TotalCopies => self.total_copies_input.push(c),
            BookField::CopiesAvailable => self.copies_available_input.push(c),
        }
    }

    pub fn backspace(&mut self) {
        let buf = match self.field {
            BookField::Title => &mut self.draft.title,
            BookField::Author => &mut self.draft.author,
            BookField::Isbn => &mut self.draft.isbn,
            BookField::Category => &mut self.draft.category,
            BookField::TotalCopies => &mut self.total_copies_input,
            BookField::CopiesAvailable => &mut self.copies_available_input,
        };
        buf.pop();
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.prev();
    }

    /// Fold the numeric buffers into the draft and hand back the draft to
    /// post. A buffer that does not parse leaves the draft's current value in
    /// place (and resyncs the buffer to it).
    pub fn commit(&mut self) -> BookDraft {
        match self.total_copies_input.parse() {
            Ok(n) => self.draft.total_copies = n,
            Err(_) => self.total_copies_input = self.draft.total_copies.to_string(),
        }
        match self.copies_available_input.parse() {
            Ok(n) => self.draft.copies_available = n,
            Err(_) => self.copies_available_input = self.draft.copies_available.to_string(),
        }
        self.draft.clone()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.draft.is_complete()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberField {
    Name,
    Email,
    Phone,
}

impl MemberField {
    pub const ALL: [MemberField; 3] = [MemberField::Name, MemberField::Email, MemberField::Phone];

    pub fn label(self) -> &'static str {
        match self {
            MemberField::Name => "Name",
            MemberField::Email => "Email",
            MemberField::Phone => "Phone",
        }
    }

    fn next(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }

    fn prev(self) -> Self {
        let i = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(i + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug)]
pub struct MemberForm {
    pub draft: MemberDraft,
    pub field: MemberField,
    pub submitting: bool,
}

impl Default for MemberForm {
    fn default() -> Self {
        Self {
            draft: MemberDraft::default(),
            field: MemberField::Name,
            submitting: false,
        }
    }
}

impl MemberForm {
    pub fn value(&self, field: MemberField) -> &str {
        match field {
            MemberField::Name => &self.draft.name,
            MemberField::Email => &self.draft.email,
            MemberField::Phone => &self.draft.phone,
        }
    }

    fn focused(&mut self) -> &mut String {
        match self.field {
            MemberField::Name => &mut self.draft.name,
            MemberField::Email => &mut self.draft.email,
            MemberField::Phone => &mut self.draft.phone,
        }
    }

    pub fn input(&mut self, c: char) {
        self.focused().push(c);
    }

    pub fn backspace(&mut self) {
        self.focused().pop();
    }

    pub fn next_field(&mut self) {
        self.field = self.field.next();
    }

    pub fn prev_field(&mut self) {
        self.field = self.field.prev();
    }

    pub fn commit(&self) -> MemberDraft {
        self.draft.clone()
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && self.draft.is_complete()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(form: &mut BookForm, field: BookField, text: &str) {
        form.field = field;
        for c in text.chars() {
            form.input(c);
        }
    }

    #[test]
    fn numeric_fields_accept_digits_only() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::TotalCopies, "2x5");
        assert_eq!(form.total_copies_input, "125");
    }

    #[test]
    fn commit_coerces_numeric_buffers() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "Dune");
        form.field = BookField::TotalCopies;
        form.backspace(); // "1" -> ""
        form.input('3');
        let draft = form.commit();
        assert_eq!(draft.total_copies, 3);
        assert_eq!(draft.copies_available, 1);
    }

    #[test]
    fn commit_keeps_the_current_value_on_empty_input() {
        let mut form = BookForm::default();
        form.field = BookField::CopiesAvailable;
        form.backspace(); // empty buffer no longer parses
        let draft = form.commit();
        assert_eq!(draft.copies_available, 1);
        // the buffer is resynced so the form shows what will be sent
        assert_eq!(form.copies_available_input, "1");
    }

    #[test]
    fn reset_restores_declared_defaults() {
        let mut form = BookForm::default();
        typed(&mut form, BookField::Title, "Dune");
        typed(&mut form, BookField::Author, "Frank Herbert");
        form.reset();
        assert_eq!(form.draft, circdesk_common::BookDraft::default());
        assert_eq!(form.total_copies_input, "1");
        assert_eq!(form.field, BookField::Title);
    }

    #[test]
    fn submit_is_gated_on_required_fields() {
        let mut form = BookForm::default();
        assert!(!form.can_submit());
        typed(&mut form, BookField::Title, "Dune");
        typed(&mut form, BookField::Author, "Frank Herbert");
        typed(&mut form, BookField::Isbn, "9780441013593");
        assert!(form.can_submit());
        form.submitting = true;
        assert!(!form.can_submit());
    }

    #[test]
    fn member_form_cycles_fields() {
        let mut form = MemberForm::default();
        assert_eq!(form.field, MemberField::Name);
        form.next_field();
        assert_eq!(form.field, MemberField::Email);
        form.prev_field();
        assert_eq!(form.field, MemberField::Name);
        form.prev_field();
        assert_eq!(form.field, MemberField::Phone);
    }
}
