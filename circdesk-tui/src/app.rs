//! Application state machine.
//!
//! `App` is the single owner of everything mutable: the active tab, the
//! refresh key, the read-view handles, the two entity forms, and the borrow
//! dialog. The UI renders from `&App`; terminal keys and request completions
//! both funnel through the event loop into `App`'s methods, so there is no
//! shared mutable state anywhere else.
//!
//! The refresh protocol: every mutation that succeeds bumps `refresh_key`,
//! and the bump re-issues the fetches of all mounted read views (the stats
//! view lives at the root and is always mounted; list views mount with their
//! tab). The key rides along as the `_=K` cache-buster so two reads around a
//! mutation can never be served by the same cached response.

use std::future::Future;
use std::sync::Arc;

use circdesk_common::draft::{clamp_loan_days, DEFAULT_LOAN_DAYS};
use circdesk_common::{Book, BorrowRequest, Loan, Member, Stats};
use crossterm::event::{KeyCode, KeyEvent};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::api::{ApiResult, LibraryBackend};
use crate::form::{BookForm, MemberForm};
use crate::sync::SyncHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Books,
    Members,
    Loans,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Dashboard, Tab::Books, Tab::Members, Tab::Loans];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Books => "Books",
            Tab::Members => "Members",
            Tab::Loans => "Loans",
        }
    }

    fn next(self) -> Self {
        let i = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Keyboard focus on the books and members tabs: the list or the add-form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Form,
}

/// Completions delivered back to the event loop by spawned requests.
#[derive(Debug)]
pub enum SyncEvent {
    Stats(u64, ApiResult<Stats>),
    Books(u64, ApiResult<Vec<Book>>),
    Members(u64, ApiResult<Vec<Member>>),
    Loans(u64, ApiResult<Vec<Loan>>),
    DialogMembers(u64, ApiResult<Vec<Member>>),
    MutationDone(Mutation, ApiResult<()>),
}

/// The actions that change server state. Each bumps the refresh key on
/// success; on failure the state that produced it is left as typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateBook,
    CreateMember,
    Borrow,
    ReturnLoan,
}

/// The borrow dialog: closed, or open over one book.
pub enum BorrowDialog {
    Closed,
    Open(DialogState),
}

pub struct DialogState {
    pub book: Book,
    /// Fetched independently on every open; not tied to the refresh key.
    pub members: SyncHandle<Vec<Member>>,
    pub cursor: Option<usize>,
    pub days_input: String,
    pub submitting: bool,
}

impl DialogState {
    /// Requested duration, clamped to the allowed range. An unparseable
    /// buffer falls back to the default.
    pub fn days(&self) -> i64 {
        self.days_input
            .parse()
            .map(clamp_loan_days)
            .unwrap_or(DEFAULT_LOAN_DAYS)
    }

    pub fn selected_member(&self) -> Option<&Member> {
        self.members.snapshot().data.as_ref()?.get(self.cursor?)
    }

    pub fn can_confirm(&self) -> bool {
        !self.submitting && self.selected_member().is_some()
    }
}

pub struct App {
    backend: Arc<dyn LibraryBackend>,
    tx: UnboundedSender<SyncEvent>,

    pub tab: Tab,
    pub focus: Focus,
    refresh_key: u64,

    pub stats: SyncHandle<Stats>,
    pub books: SyncHandle<Vec<Book>>,
    pub members: SyncHandle<Vec<Member>>,
    pub loans: SyncHandle<Vec<Loan>>,
    pub books_cursor: usize,
    pub members_cursor: usize,
    pub loans_cursor: usize,

    pub book_form: BookForm,
    pub member_form: MemberForm,
    pub dialog: BorrowDialog,

    pub should_quit: bool,
}

impl App {
    pub fn new(backend: Arc<dyn LibraryBackend>, tx: UnboundedSender<SyncEvent>) -> Self {
        Self {
            backend,
            tx,
            tab: Tab::Dashboard,
            focus: Focus::List,
            refresh_key: 0,
            stats: SyncHandle::new(),
            books: SyncHandle::new(),
            members: SyncHandle::new(),
            loans: SyncHandle::new(),
            books_cursor: 0,
            members_cursor: 0,
            loans_cursor: 0,
            book_form: BookForm::default(),
            member_form: MemberForm::default(),
            dialog: BorrowDialog::Closed,
            should_quit: false,
        }
    }

    /// Initial mount. The stats view lives at the root and is always mounted.
    pub fn start(&mut self) {
        self.fetch_stats();
    }

    pub fn refresh_key(&self) -> u64 {
        self.refresh_key
    }

    // ---- read views ------------------------------------------------------

    fn fetch_stats(&mut self) {
        let backend = Arc::clone(&self.backend);
        let key = self.refresh_key;
        self.stats.refresh(
            async move { backend.stats(key).await },
            self.tx.clone(),
            SyncEvent::Stats,
        );
    }

    fn fetch_books(&mut self) {
        let backend = Arc::clone(&self.backend);
        let key = self.refresh_key;
        self.books.refresh(
            async move { backend.books(key).await },
            self.tx.clone(),
            SyncEvent::Books,
        );
    }

    fn fetch_members(&mut self) {
        let backend = Arc::clone(&self.backend);
        let key = self.refresh_key;
        self.members.refresh(
            async move { backend.members(Some(key)).await },
            self.tx.clone(),
            SyncEvent::Members,
        );
    }

    fn fetch_loans(&mut self) {
        let backend = Arc::clone(&self.backend);
        let key = self.refresh_key;
        self.loans.refresh(
            async move { backend.loans(key).await },
            self.tx.clone(),
            SyncEvent::Loans,
        );
    }

    /// Switch tabs. The departing list view unmounts (its in-flight fetch may
    /// no longer update anything); the arriving one mounts and fetches.
    pub fn select_tab(&mut self, tab: Tab) {
        if tab == self.tab {
            return;
        }
        match self.tab {
            Tab::Books => self.books.cancel(),
            Tab::Members => self.members.cancel(),
            Tab::Loans => self.loans.cancel(),
            Tab::Dashboard => {}
        }
        self.tab = tab;
        self.focus = Focus::List;
        match tab {
            Tab::Books => self.fetch_books(),
            Tab::Members => self.fetch_members(),
            Tab::Loans => self.fetch_loans(),
            Tab::Dashboard => {}
        }
    }

    /// Something changed on the server: bump the key and re-fetch every
    /// mounted read view with the new cache-buster.
    fn bump_refresh(&mut self) {
        self.refresh_key += 1;
        self.fetch_stats();
        match self.tab {
            Tab::Books => self.fetch_books(),
            Tab::Members => self.fetch_members(),
            Tab::Loans => self.fetch_loans(),
            Tab::Dashboard => {}
        }
    }

    // ---- mutations -------------------------------------------------------

    fn spawn_mutation<F>(&self, mutation: Mutation, fut: F)
    where
        F: Future<Output = ApiResult<()>> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = fut.await;
            let _ = tx.send(SyncEvent::MutationDone(mutation, result));
        });
    }

    pub fn submit_book_form(&mut self) {
        if !self.book_form.can_submit() {
            debug!("add-book form is not submittable");
            return;
        }
        self.book_form.submitting = true;
        let draft = self.book_form.commit();
        let backend = Arc::clone(&self.backend);
        self.spawn_mutation(Mutation::CreateBook, async move {
            backend.create_book(draft).await.map(|_| ())
        });
    }

    pub fn submit_member_form(&mut self) {
        if !self.member_form.can_submit() {
            debug!("add-member form is not submittable");
            return;
        }
        self.member_form.submitting = true;
        let draft = self.member_form.commit();
        let backend = Arc::clone(&self.backend);
        self.spawn_mutation(Mutation::CreateMember, async move {
            backend.create_member(draft).await.map(|_| ())
        });
    }

    pub fn open_borrow_dialog(&mut self) {
        let Some(book) = self.selected_book().cloned() else {
            return;
        };
        if !book.is_available() {
            debug!(book = %book.title, "no copies available to borrow");
            return;
        }
        let mut members = SyncHandle::new();
        let backend = Arc::clone(&self.backend);
        members.refresh(
            async move { backend.members(None).await },
            self.tx.clone(),
            SyncEvent::DialogMembers,
        );
        self.dialog = BorrowDialog::Open(DialogState {
            book,
            members,
            cursor: None,
            days_input: DEFAULT_LOAN_DAYS.to_string(),
            submitting: false,
        });
    }

    pub fn close_dialog(&mut self) {
        if let BorrowDialog::Open(state) = &mut self.dialog {
            state.members.cancel();
        }
        self.dialog = BorrowDialog::Closed;
    }

    pub fn confirm_borrow(&mut self) {
        let request = match &mut self.dialog {
            BorrowDialog::Open(state) if state.can_confirm() => {
                let member_id = match state.selected_member() {
                    Some(member) => member.id,
                    None => return,
                };
                state.submitting = true;
                BorrowRequest {
                    member_id,
                    book_id: state.book.id,
                    days: state.days(),
                }
            }
            _ => return,
        };
        let backend = Arc::clone(&self.backend);
        self.spawn_mutation(Mutation::Borrow, async move {
            backend.borrow(request).await.map(|_| ())
        });
    }

    pub fn return_selected_loan(&mut self) {
        let Some(loan) = self.selected_loan() else {
            return;
        };
        if !loan.is_open() {
            return;
        }
        let id = loan.id;
        let backend = Arc::clone(&self.backend);
        self.spawn_mutation(Mutation::ReturnLoan, async move {
            backend.return_loan(id).await.map(|_| ())
        });
    }

    fn finish_mutation(&mut self, mutation: Mutation, result: ApiResult<()>) {
        match result {
            Ok(()) => {
                match mutation {
                    Mutation::CreateBook => self.book_form.reset(),
                    Mutation::CreateMember => self.member_form.reset(),
                    Mutation::Borrow => self.close_dialog(),
                    Mutation::ReturnLoan => {}
                }
                self.bump_refresh();
            }
            Err(error) => {
                // Logged only; whatever the user typed stays in place.
                warn!(%error, ?mutation, "mutation failed");
                match mutation {
                    Mutation::CreateBook => self.book_form.submitting = false,
                    Mutation::CreateMember => self.member_form.submitting = false,
                    Mutation::Borrow => {
                        if let BorrowDialog::Open(state) = &mut self.dialog {
                            state.submitting = false;
                        }
                    }
                    Mutation::ReturnLoan => {}
                }
            }
        }
    }

    // ---- selection -------------------------------------------------------

    pub fn selected_book(&self) -> Option<&Book> {
        self.books.snapshot().data.as_ref()?.get(self.books_cursor)
    }

    pub fn selected_loan(&self) -> Option<&Loan> {
        self.loans.snapshot().data.as_ref()?.get(self.loans_cursor)
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.tab {
            Tab::Books => (
                &mut self.books_cursor,
                self.books.snapshot().data.as_ref().map_or(0, Vec::len),
            ),
            Tab::Members => (
                &mut self.members_cursor,
                self.members.snapshot().data.as_ref().map_or(0, Vec::len),
            ),
            Tab::Loans => (
                &mut self.loans_cursor,
                self.loans.snapshot().data.as_ref().map_or(0, Vec::len),
            ),
            Tab::Dashboard => return,
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn clamp_cursors(&mut self) {
        let books = self.books.snapshot().data.as_ref().map_or(0, Vec::len);
        self.books_cursor = self.books_cursor.min(books.saturating_sub(1));
        let members = self.members.snapshot().data.as_ref().map_or(0, Vec::len);
        self.members_cursor = self.members_cursor.min(members.saturating_sub(1));
        let loans = self.loans.snapshot().data.as_ref().map_or(0, Vec::len);
        self.loans_cursor = self.loans_cursor.min(loans.saturating_sub(1));
    }

    // ---- event handling --------------------------------------------------

    pub fn handle_sync(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Stats(seq, result) => self.stats.apply(seq, result),
            SyncEvent::Books(seq, result) => {
                self.books.apply(seq, result);
                self.clamp_cursors();
            }
            SyncEvent::Members(seq, result) => {
                self.members.apply(seq, result);
                self.clamp_cursors();
            }
            SyncEvent::Loans(seq, result) => {
                self.loans.apply(seq, result);
                self.clamp_cursors();
            }
            SyncEvent::DialogMembers(seq, result) => {
                if let BorrowDialog::Open(state) = &mut self.dialog {
                    state.members.apply(seq, result);
                }
            }
            SyncEvent::MutationDone(mutation, result) => self.finish_mutation(mutation, result),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if matches!(self.dialog, BorrowDialog::Open(_)) {
            return self.handle_dialog_key(key);
        }
        match self.focus {
            Focus::Form => self.handle_form_key(key),
            Focus::List => self.handle_list_key(key),
        }
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.select_tab(Tab::Dashboard),
            KeyCode::Char('2') => self.select_tab(Tab::Books),
            KeyCode::Char('3') => self.select_tab(Tab::Members),
            KeyCode::Char('4') => self.select_tab(Tab::Loans),
            KeyCode::Tab => self.select_tab(self.tab.next()),
            KeyCode::Up => self.move_cursor(-1),
            KeyCode::Down => self.move_cursor(1),
            KeyCode::Char('a') if matches!(self.tab, Tab::Books | Tab::Members) => {
                self.focus = Focus::Form;
            }
            KeyCode::Char('b') if self.tab == Tab::Books => self.open_borrow_dialog(),
            KeyCode::Char('r') if self.tab == Tab::Loans => self.return_selected_loan(),
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match self.tab {
            Tab::Books => match key.code {
                KeyCode::Esc => self.focus = Focus::List,
                KeyCode::Enter => self.submit_book_form(),
                KeyCode::Tab | KeyCode::Down => self.book_form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.book_form.prev_field(),
                KeyCode::Backspace => self.book_form.backspace(),
                KeyCode::Char(c) => self.book_form.input(c),
                _ => {}
            },
            Tab::Members => match key.code {
                KeyCode::Esc => self.focus = Focus::List,
                KeyCode::Enter => self.submit_member_form(),
                KeyCode::Tab | KeyCode::Down => self.member_form.next_field(),
                KeyCode::BackTab | KeyCode::Up => self.member_form.prev_field(),
                KeyCode::Backspace => self.member_form.backspace(),
                KeyCode::Char(c) => self.member_form.input(c),
                _ => {}
            },
            _ => self.focus = Focus::List,
        }
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.close_dialog(),
            KeyCode::Enter => self.confirm_borrow(),
            KeyCode::Up | KeyCode::Down => {
                if let BorrowDialog::Open(state) = &mut self.dialog {
                    let len = state.members.snapshot().data.as_ref().map_or(0, Vec::len);
                    if len == 0 {
                        state.cursor = None;
                    } else if key.code == KeyCode::Down {
                        state.cursor = Some(state.cursor.map_or(0, |c| (c + 1).min(len - 1)));
                    } else {
                        // Up from the first entry goes back to "no selection".
                        state.cursor = state.cursor.and_then(|c| c.checked_sub(1));
                    }
                }
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if let BorrowDialog::Open(state) = &mut self.dialog {
                    if state.days_input.len() < 2 {
                        state.days_input.push(c);
                    }
                }
            }
            KeyCode::Backspace => {
                if let BorrowDialog::Open(state) = &mut self.dialog {
                    state.days_input.pop();
                }
            }
            _ => {}
        }
    }

    /// Shutdown: abort everything still in flight.
    pub fn shutdown(&mut self) {
        self.stats.cancel();
        self.books.cancel();
        self.members.cancel();
        self.loans.cancel();
        if let BorrowDialog::Open(state) = &mut self.dialog {
            state.members.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, MockLibraryBackend};
    use chrono::Utc;
    use circdesk_common::{BookDraft, LoanStatus};
    use mockall::predicate::eq;
    use reqwest::StatusCode;
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn book(id: i64, title: &str, available: i64) -> Book {
        Book {
            id,
            title: title.into(),
            author: "Frank Herbert".into(),
            isbn: "9780441013593".into(),
            category: None,
            total_copies: 3,
            copies_available: available,
        }
    }

    fn member(id: i64, name: &str) -> Member {
        Member {
            id,
            name: name.into(),
            email: format!("{}@example.org", name.to_lowercase()),
            phone: None,
        }
    }

    fn loan(id: i64, status: LoanStatus) -> Loan {
        Loan {
            id,
            book_id: 7,
            member_id: 1,
            book_title: "Dune".into(),
            member_name: "Ada".into(),
            due_at: Utc::now(),
            status,
        }
    }

    struct Harness {
        app: App,
        rx: UnboundedReceiver<SyncEvent>,
    }

    fn harness(backend: MockLibraryBackend) -> Harness {
        let (tx, rx) = mpsc::unbounded_channel();
        Harness {
            app: App::new(Arc::new(backend), tx),
            rx,
        }
    }

    impl Harness {
        /// Feed one spawned-request completion back into the app.
        async fn pump(&mut self) {
            let event = self.rx.recv().await.expect("event channel closed");
            self.app.handle_sync(event);
        }
    }

    #[tokio::test]
    async fn creating_a_book_posts_the_draft_once_and_resets_it() {
        let mut backend = MockLibraryBackend::new();
        let expected = BookDraft {
            title: "Dune".into(),
            author: "Frank Herbert".into(),
            isbn: "9780441013593".into(),
            category: String::new(),
            total_copies: 1,
            copies_available: 1,
        };
        backend
            .expect_create_book()
            .with(eq(expected))
            .times(1)
            .returning(|_| Ok(book(1, "Dune", 1)));
        backend.expect_stats().returning(|_| Ok(Stats::default()));

        let mut h = harness(backend);
        h.app.book_form.draft.title = "Dune".into();
        h.app.book_form.draft.author = "Frank Herbert".into();
        h.app.book_form.draft.isbn = "9780441013593".into();
        h.app.submit_book_form();
        assert!(h.app.book_form.submitting);
        // re-submitting while in flight is refused (no second POST)
        h.app.submit_book_form();

        h.pump().await; // MutationDone
        assert_eq!(h.app.book_form.draft, BookDraft::default());
        assert!(!h.app.book_form.submitting);
        assert_eq!(h.app.refresh_key(), 1);
        h.pump().await; // the bump re-fetched the root stats view
        assert!(h.app.stats.snapshot().data.is_some());
    }

    #[tokio::test]
    async fn failed_creation_leaves_the_draft_as_typed() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_create_book()
            .times(1)
            .returning(|_| Err(ApiError::Status(StatusCode::UNPROCESSABLE_ENTITY)));

        let mut h = harness(backend);
        h.app.book_form.draft.title = "Dune".into();
        h.app.book_form.draft.author = "Frank Herbert".into();
        h.app.book_form.draft.isbn = "9780441013593".into();
        h.app.submit_book_form();
        h.pump().await;

        assert_eq!(h.app.book_form.draft.title, "Dune");
        assert!(!h.app.book_form.submitting);
        assert_eq!(h.app.refresh_key(), 0);
    }

    #[tokio::test]
    async fn a_key_bump_refetches_every_mounted_view_with_the_new_buster() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_stats()
            .with(eq(0_u64))
            .times(1)
            .returning(|_| Ok(Stats::default()));
        backend
            .expect_books()
            .with(eq(0_u64))
            .times(1)
            .returning(|_| Ok(vec![]));
        backend
            .expect_create_member()
            .times(1)
            .returning(|_| Ok(member(1, "Ada")));
        backend
            .expect_stats()
            .with(eq(1_u64))
            .times(1)
            .returning(|_| Ok(Stats::default()));
        backend
            .expect_books()
            .with(eq(1_u64))
            .times(1)
            .returning(|_| Ok(vec![]));

        let mut h = harness(backend);
        h.app.start();
        h.app.select_tab(Tab::Books);
        h.pump().await;
        h.pump().await;

        h.app.member_form.draft.name = "Ada".into();
        h.app.member_form.draft.email = "ada@example.org".into();
        h.app.submit_member_form();
        h.pump().await; // MutationDone -> bump -> stats(1) + books(1)
        assert_eq!(h.app.refresh_key(), 1);
        h.pump().await;
        h.pump().await;
    }

    #[tokio::test]
    async fn borrowing_posts_the_request_and_closes_the_dialog() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_books()
            .with(eq(0_u64))
            .times(1)
            .returning(|_| Ok(vec![book(7, "Dune", 3)]));
        backend
            .expect_members()
            .with(eq(None::<u64>))
            .times(1)
            .returning(|_| Ok(vec![member(1, "Ada")]));
        backend
            .expect_borrow()
            .with(eq(BorrowRequest {
                member_id: 1,
                book_id: 7,
                days: 14,
            }))
            .times(1)
            .returning(|_| Ok(loan(9, LoanStatus::Active)));
        backend.expect_stats().returning(|_| Ok(Stats::default()));
        backend
            .expect_books()
            .with(eq(1_u64))
            .times(1)
            .returning(|_| Ok(vec![book(7, "Dune", 2)]));

        let mut h = harness(backend);
        h.app.select_tab(Tab::Books);
        h.pump().await;

        h.app.open_borrow_dialog();
        assert!(matches!(h.app.dialog, BorrowDialog::Open(_)));
        h.pump().await; // dialog member list

        // confirm is inert until a member is selected
        h.app.confirm_borrow();
        assert!(h.rx.try_recv().is_err());

        h.app.handle_key(KeyEvent::from(KeyCode::Down));
        h.app.confirm_borrow();
        h.pump().await; // MutationDone(Borrow, Ok)

        assert!(matches!(h.app.dialog, BorrowDialog::Closed));
        assert_eq!(h.app.refresh_key(), 1);
        h.pump().await;
        h.pump().await; // stats(1) + books(1)
    }

    #[tokio::test]
    async fn failed_borrow_keeps_the_dialog_open_as_configured() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_books()
            .times(1)
            .returning(|_| Ok(vec![book(7, "Dune", 3)]));
        backend
            .expect_members()
            .times(1)
            .returning(|_| Ok(vec![member(1, "Ada")]));
        backend
            .expect_borrow()
            .times(1)
            .returning(|_| Err(ApiError::Status(StatusCode::CONFLICT)));

        let mut h = harness(backend);
        h.app.select_tab(Tab::Books);
        h.pump().await;
        h.app.open_borrow_dialog();
        h.pump().await;
        h.app.handle_key(KeyEvent::from(KeyCode::Down));
        h.app.confirm_borrow();
        h.pump().await;

        match &h.app.dialog {
            BorrowDialog::Open(state) => {
                assert!(!state.submitting);
                assert!(state.selected_member().is_some());
            }
            BorrowDialog::Closed => panic!("dialog must stay open on failure"),
        }
        assert_eq!(h.app.refresh_key(), 0);
    }

    #[tokio::test]
    async fn borrow_is_refused_when_no_copy_is_available() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_books()
            .times(1)
            .returning(|_| Ok(vec![book(7, "Dune", 0)]));
        // no member fetch, no borrow: opening must not touch the backend

        let mut h = harness(backend);
        h.app.select_tab(Tab::Books);
        h.pump().await;
        h.app.open_borrow_dialog();
        assert!(matches!(h.app.dialog, BorrowDialog::Closed));
    }

    #[tokio::test]
    async fn returning_a_loan_posts_to_its_return_endpoint() {
        let mut backend = MockLibraryBackend::new();
        backend
            .expect_loans()
            .with(eq(0_u64))
            .times(1)
            .returning(|_| Ok(vec![loan(5, LoanStatus::Active)]));
        backend
            .expect_return_loan()
            .with(eq(5_i64))
            .times(1)
            .returning(|_| Ok(loan(5, LoanStatus::Returned)));
        backend.expect_stats().returning(|_| Ok(Stats::default()));
        backend
            .expect_loans()
            .with(eq(1_u64))
            .times(1)
            .returning(|_| Ok(vec![loan(5, LoanStatus::Returned)]));

        let mut h = harness(backend);
        h.app.select_tab(Tab::Loans);
        h.pump().await;

        h.app.handle_key(KeyEvent::from(KeyCode::Char('r')));
        h.pump().await; // MutationDone
        assert_eq!(h.app.refresh_key(), 1);
        h.pump().await;
        h.pump().await; // stats(1) + loans(1)

        // a returned loan no longer offers the action
        h.app.handle_key(KeyEvent::from(KeyCode::Char('r')));
        assert!(h.rx.try_recv().is_err());
    }

    #[test]
    fn dialog_days_clamp_and_fall_back() {
        let mut state = DialogState {
            book: book(7, "Dune", 3),
            members: SyncHandle::new(),
            cursor: None,
            days_input: "90".into(),
            submitting: false,
        };
        assert_eq!(state.days(), 60);
        state.days_input = "0".into();
        assert_eq!(state.days(), 1);
        state.days_input.clear();
        assert_eq!(state.days(), 14);
    }
}
