//! Terminal rendering. Everything here is a pure function of `&App`: the
//! widgets own no state, so the render path cannot race the event loop.

use circdesk_common::Stats;
use itertools::Itertools;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Tabs};
use ratatui::Frame;

use crate::app::{App, BorrowDialog, DialogState, Focus, Tab};
use crate::form::{BookField, MemberField};
use crate::sync::Snapshot;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_tabs(frame, app, chunks[0]);
    match app.tab {
        Tab::Dashboard => draw_dashboard(frame, app, chunks[1]),
        Tab::Books => draw_books(frame, app, chunks[1]),
        Tab::Members => draw_members(frame, app, chunks[1]),
        Tab::Loans => draw_loans(frame, app, chunks[1]),
    }
    draw_footer(frame, app, chunks[2]);

    if let BorrowDialog::Open(state) = &app.dialog {
        let area = frame.area();
        draw_borrow_dialog(frame, state, area);
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles = Tab::ALL.iter().map(|t| t.title()).collect_vec();
    let selected = Tab::ALL.iter().position(|t| *t == app.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(
            Style::default()
                .fg(Color::Indexed(63))
                .add_modifier(Modifier::BOLD),
        )
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Library Management"),
        );
    frame.render_widget(tabs, area);
}

fn stat_value(snapshot: &Snapshot<Stats>, field: impl Fn(&Stats) -> i64) -> String {
    if snapshot.loading {
        "—".to_string()
    } else {
        snapshot.data.as_ref().map(field).unwrap_or(0).to_string()
    }
}

fn draw_dashboard(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.stats.snapshot();
    let cards = [
        ("Books", stat_value(snapshot, |s| s.books)),
        ("Copies", stat_value(snapshot, |s| s.copies)),
        ("Available", stat_value(snapshot, |s| s.available)),
        ("Members", stat_value(snapshot, |s| s.members)),
        ("Active Loans", stat_value(snapshot, |s| s.active_loans)),
    ];
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(20); 5])
        .split(area);
    for ((label, value), chunk) in cards.iter().zip(chunks.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(*label));
        frame.render_widget(card, *chunk);
    }
}

fn field_line<'a>(label: &'a str, value: &'a str, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    let style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{marker}{label}: "), style),
        Span::raw(value),
    ])
}

fn draw_books(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area);

    let editing = app.focus == Focus::Form;
    let mut lines = BookField::ALL
        .iter()
        .map(|field| {
            field_line(
                field.label(),
                app.book_form.value(*field),
                editing && app.book_form.field == *field,
            )
        })
        .collect_vec();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if app.book_form.submitting {
            "Saving..."
        } else {
            "a edit • Enter save"
        },
        Style::default().add_modifier(Modifier::DIM),
    )));
    let form = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Add Book"));
    frame.render_widget(form, chunks[0]);

    let snapshot = app.books.snapshot();
    let block = Block::default().borders(Borders::ALL).title("Books");
    if snapshot.loading && snapshot.data.is_none() {
        frame.render_widget(Paragraph::new("Loading books...").block(block), chunks[1]);
        return;
    }
    let books = snapshot.data.as_deref().unwrap_or_default();
    let items = books
        .iter()
        .map(|book| {
            let availability = Span::styled(
                format!("{} available", book.copies_available),
                if book.is_available() {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::Red)
                },
            );
            ListItem::new(vec![
                Line::from(Span::styled(
                    book.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled(
                        format!(
                            "{} • {} • {}  ",
                            book.author,
                            book.isbn,
                            book.category.as_deref().unwrap_or("—")
                        ),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    availability,
                ]),
            ])
        })
        .collect_vec();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.books_cursor));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_members(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(66)])
        .split(area);

    let editing = app.focus == Focus::Form;
    let mut lines = MemberField::ALL
        .iter()
        .map(|field| {
            field_line(
                field.label(),
                app.member_form.value(*field),
                editing && app.member_form.field == *field,
            )
        })
        .collect_vec();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        if app.member_form.submitting {
            "Saving..."
        } else {
            "a edit • Enter save"
        },
        Style::default().add_modifier(Modifier::DIM),
    )));
    let form =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Add Member"));
    frame.render_widget(form, chunks[0]);

    let snapshot = app.members.snapshot();
    let block = Block::default().borders(Borders::ALL).title("Members");
    if snapshot.loading && snapshot.data.is_none() {
        frame.render_widget(Paragraph::new("Loading members...").block(block), chunks[1]);
        return;
    }
    let members = snapshot.data.as_deref().unwrap_or_default();
    let items = members
        .iter()
        .map(|member| {
            let contact = match member.phone.as_deref() {
                Some(phone) => format!("{} • {}", member.email, phone),
                None => member.email.clone(),
            };
            ListItem::new(vec![
                Line::from(Span::styled(
                    member.name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    contact,
                    Style::default().add_modifier(Modifier::DIM),
                )),
            ])
        })
        .collect_vec();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.members_cursor));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}

fn draw_loans(frame: &mut Frame, app: &App, area: Rect) {
    let snapshot = app.loans.snapshot();
    let block = Block::default().borders(Borders::ALL).title("Loans");
    if snapshot.loading && snapshot.data.is_none() {
        frame.render_widget(Paragraph::new("Loading loans...").block(block), area);
        return;
    }
    let loans = snapshot.data.as_deref().unwrap_or_default();
    let items = loans
        .iter()
        .map(|loan| {
            let status_style = if loan.is_open() {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::Green)
            };
            ListItem::new(vec![
                Line::from(Span::styled(
                    format!("{} → {}", loan.book_title, loan.member_name),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(vec![
                    Span::styled(
                        format!("due {} • ", loan.due_at.format("%Y-%m-%d")),
                        Style::default().add_modifier(Modifier::DIM),
                    ),
                    Span::styled(loan.status.to_string(), status_style),
                ]),
            ])
        })
        .collect_vec();
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = ListState::default().with_selected(Some(app.loans_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let hint = if matches!(app.dialog, BorrowDialog::Open(_)) {
        "↑/↓ select member • 0-9 days • Enter confirm • Esc cancel"
    } else if app.focus == Focus::Form {
        "Tab/↓ next field • Enter save • Esc back"
    } else {
        match app.tab {
            Tab::Dashboard => "1-4 tabs • q quit",
            Tab::Books => "1-4 tabs • ↑/↓ select • b borrow • a add book • q quit",
            Tab::Members => "1-4 tabs • ↑/↓ select • a add member • q quit",
            Tab::Loans => "1-4 tabs • ↑/↓ select • r mark returned • q quit",
        }
    };
    let footer = Paragraph::new(Span::styled(
        hint,
        Style::default().add_modifier(Modifier::DIM),
    ));
    frame.render_widget(footer, area);
}

fn draw_borrow_dialog(frame: &mut Frame, state: &DialogState, area: Rect) {
    let popup = centered_rect(50, 60, area);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Borrow \"{}\"", state.book.title));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let snapshot = state.members.snapshot();
    if snapshot.loading && snapshot.data.is_none() {
        frame.render_widget(Paragraph::new("Loading members..."), chunks[0]);
    } else {
        let members = snapshot.data.as_deref().unwrap_or_default();
        let items = members
            .iter()
            .map(|member| ListItem::new(member.name.clone()))
            .collect_vec();
        let list = List::new(items)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
        let mut list_state = ListState::default().with_selected(state.cursor);
        frame.render_stateful_widget(list, chunks[0], &mut list_state);
    }

    frame.render_widget(
        Paragraph::new(format!("Days: {}", state.days_input)),
        chunks[1],
    );
    let confirm = if state.can_confirm() {
        Span::raw("Enter confirm • Esc cancel")
    } else {
        Span::styled(
            "select a member to confirm • Esc cancel",
            Style::default().add_modifier(Modifier::DIM),
        )
    };
    frame.render_widget(Paragraph::new(confirm), chunks[2]);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);
    horizontal[1]
}
