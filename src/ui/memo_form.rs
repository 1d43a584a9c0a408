use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::form::{format_amount, Command, HeaderField, InvoiceForm, ItemField, Outcome};
use crate::install_prompt::{InstallPrompt, PromptChoice};
use crate::ui::components::date_input::DateInputState;

const INPUT_POLL: Duration = Duration::from_millis(200);

// Where keyboard focus sits outside of an edit
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Focus {
    Date,
    Header(HeaderField),
    Items,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Focus::Date => Focus::Header(HeaderField::CustomerName),
            Focus::Header(HeaderField::CustomerName) => Focus::Header(HeaderField::CustomerAddress),
            Focus::Header(HeaderField::CustomerAddress) => Focus::Header(HeaderField::CustomerPhone),
            Focus::Header(HeaderField::CustomerPhone) => Focus::Items,
            Focus::Items => Focus::Date,
        }
    }

    fn previous(self) -> Self {
        match self {
            Focus::Date => Focus::Items,
            Focus::Header(HeaderField::CustomerName) => Focus::Date,
            Focus::Header(HeaderField::CustomerAddress) => Focus::Header(HeaderField::CustomerName),
            Focus::Header(HeaderField::CustomerPhone) => Focus::Header(HeaderField::CustomerAddress),
            Focus::Items => Focus::Header(HeaderField::CustomerPhone),
        }
    }
}

fn next_column(field: ItemField) -> ItemField {
    match field {
        ItemField::Serial => ItemField::Description,
        ItemField::Description => ItemField::Quantity,
        ItemField::Quantity => ItemField::UnitPrice,
        ItemField::UnitPrice => ItemField::Serial,
    }
}

fn previous_column(field: ItemField) -> ItemField {
    match field {
        ItemField::Serial => ItemField::UnitPrice,
        ItemField::Description => ItemField::Serial,
        ItemField::Quantity => ItemField::Description,
        ItemField::UnitPrice => ItemField::Quantity,
    }
}

#[derive(Clone, PartialEq, Debug)]
pub enum Modal {
    Notice(String),
    ConfirmReset,
    ConfirmInstall,
}

/// Work the controller does on the form's behalf
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum MemoAction {
    Quit,
    Export,
    OpenInstallPrompt,
    AnswerInstall(PromptChoice),
    DismissBanner,
}

pub struct MemoFormState {
    form: InvoiceForm,
    focus: Focus,
    column: ItemField,
    table_state: TableState,
    // Text being typed into a header field or a cell
    edit_buffer: Option<String>,
    date_state: DateInputState,
    modal: Option<Modal>,
    status: Option<String>,
}

impl MemoFormState {
    pub fn new(form: InvoiceForm) -> Self {
        let mut table_state = TableState::default();
        table_state.select(Some(0));
        let date_state = DateInputState::new(form.header().date);

        Self {
            form,
            focus: Focus::Items,
            column: ItemField::Quantity,
            table_state,
            edit_buffer: None,
            date_state,
            modal: None,
            status: None,
        }
    }

    pub fn form(&self) -> &InvoiceForm {
        &self.form
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn selected_row(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    pub fn is_editing(&self) -> bool {
        self.edit_buffer.is_some() || self.date_state.editing
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = Some(status.into());
    }

    pub fn show_notice(&mut self, message: impl Into<String>) {
        self.modal = Some(Modal::Notice(message.into()));
    }

    pub fn ask_install(&mut self) {
        self.modal = Some(Modal::ConfirmInstall);
    }

    fn dispatch(&mut self, command: Command) {
        match self.form.apply(command) {
            Ok(Outcome::Updated) => self.clamp_selection(),
            Ok(Outcome::Declined) => {}
            Err(e) => self.show_notice(e.to_string()),
        }
    }

    fn clamp_selection(&mut self) {
        let last = self.form.len() - 1;
        if self.selected_row() > last {
            self.table_state.select(Some(last));
        }
    }

    fn select_next_row(&mut self) {
        let len = self.form.len();
        let i = if self.selected_row() >= len - 1 { 0 } else { self.selected_row() + 1 };
        self.table_state.select(Some(i));
    }

    fn select_previous_row(&mut self) {
        let len = self.form.len();
        let i = if self.selected_row() == 0 { len - 1 } else { self.selected_row() - 1 };
        self.table_state.select(Some(i));
    }

    fn current_cell_value(&self) -> String {
        let item = &self.form.items()[self.selected_row()];
        match self.column {
            ItemField::Serial => item.serial.to_string(),
            ItemField::Description => item.description.clone(),
            ItemField::Quantity => item.quantity.clone(),
            ItemField::UnitPrice => item.unit_price.clone(),
        }
    }

    fn start_editing(&mut self) {
        match self.focus {
            Focus::Date => self.date_state.start_editing(self.form.header().date),
            Focus::Header(field) => {
                let header = self.form.header();
                let value = match field {
                    HeaderField::CustomerName => header.customer_name.clone(),
                    HeaderField::CustomerAddress => header.customer_address.clone(),
                    HeaderField::CustomerPhone => header.customer_phone.clone(),
                };
                self.edit_buffer = Some(value);
            }
            Focus::Items => self.edit_buffer = Some(self.current_cell_value()),
        }
    }

    // Every keystroke is written through, so totals follow the typing
    fn write_through(&mut self) {
        let Some(value) = self.edit_buffer.clone() else {
            return;
        };
        let command = match self.focus {
            Focus::Header(field) => Command::EditHeader { field, value },
            Focus::Items => Command::EditItem {
                index: self.selected_row(),
                field: self.column,
                value,
            },
            Focus::Date => return,
        };
        self.dispatch(command);
    }

    fn handle_editing_key(&mut self, key: KeyCode) {
        if self.date_state.editing {
            match key {
                KeyCode::Enter => {
                    let date = self.date_state.date;
                    self.date_state.stop_editing();
                    self.dispatch(Command::SetDate(date));
                }
                KeyCode::Esc => self.date_state.stop_editing(),
                other => self.date_state.handle_input(other),
            }
            return;
        }

        match key {
            KeyCode::Enter | KeyCode::Esc => self.edit_buffer = None,
            KeyCode::Tab if self.focus == Focus::Items => {
                self.column = next_column(self.column);
                self.edit_buffer = Some(self.current_cell_value());
            }
            KeyCode::Char(c) => {
                if let Some(buffer) = self.edit_buffer.as_mut() {
                    buffer.push(c);
                }
                self.write_through();
            }
            KeyCode::Backspace => {
                if let Some(buffer) = self.edit_buffer.as_mut() {
                    buffer.pop();
                }
                self.write_through();
            }
            _ => {}
        }
    }

    fn handle_modal_key(&mut self, modal: Modal, key: KeyCode) -> Option<MemoAction> {
        self.modal = None;
        let yes = matches!(key, KeyCode::Char('y') | KeyCode::Char('Y'));

        match modal {
            Modal::Notice(_) => None,
            Modal::ConfirmReset => {
                self.dispatch(Command::Reset {
                    confirmed: yes,
                    today: Local::now().date_naive(),
                });
                if yes {
                    self.table_state.select(Some(0));
                    self.date_state = DateInputState::new(self.form.header().date);
                    self.set_status("Form reset");
                }
                None
            }
            Modal::ConfirmInstall => {
                let choice = if yes { PromptChoice::Accepted } else { PromptChoice::Dismissed };
                Some(MemoAction::AnswerInstall(choice))
            }
        }
    }

    /// Apply one key press. Returns work for the controller, if any.
    pub fn handle_key(&mut self, key: KeyCode) -> Option<MemoAction> {
        if let Some(modal) = self.modal.clone() {
            return self.handle_modal_key(modal, key);
        }

        if self.is_editing() {
            self.handle_editing_key(key);
            return None;
        }

        self.status = None;
        match key {
            KeyCode::Char('q') | KeyCode::Esc => return Some(MemoAction::Quit),
            KeyCode::Char('p') => return Some(MemoAction::Export),
            KeyCode::Char('i') => return Some(MemoAction::OpenInstallPrompt),
            KeyCode::Char('x') => return Some(MemoAction::DismissBanner),
            KeyCode::Char('a') => {
                self.dispatch(Command::AddRow);
                self.focus = Focus::Items;
                self.table_state.select(Some(self.form.len() - 1));
            }
            KeyCode::Char('d') if self.focus == Focus::Items => {
                self.dispatch(Command::RemoveRow(self.selected_row()));
            }
            KeyCode::Char('r') => self.modal = Some(Modal::ConfirmReset),
            KeyCode::Enter => self.start_editing(),
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.previous(),
            KeyCode::Down if self.focus == Focus::Items => self.select_next_row(),
            KeyCode::Up if self.focus == Focus::Items => self.select_previous_row(),
            KeyCode::Down => self.focus = self.focus.next(),
            KeyCode::Up => self.focus = self.focus.previous(),
            KeyCode::Right if self.focus == Focus::Items => self.column = next_column(self.column),
            KeyCode::Left if self.focus == Focus::Items => self.column = previous_column(self.column),
            _ => {}
        }

        None
    }
}

pub fn render_memo_form<B: Backend>(frame: &mut Frame<B>, state: &mut MemoFormState, prompt: &InstallPrompt) {
    let banner_height = if prompt.banner_visible() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3),             // Title
                Constraint::Length(6),             // Header fields
                Constraint::Min(6),                // Line items
                Constraint::Length(3),             // Grand total
                Constraint::Length(banner_height), // Install banner
                Constraint::Length(3),             // Help
            ]
            .as_ref(),
        )
        .split(frame.size());

    let title = Paragraph::new("Pest Control Service - Cash Memo")
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(title, chunks[0]);

    render_header(frame, state, chunks[1]);
    render_items(frame, state, chunks[2]);

    let total = Paragraph::new(Spans::from(vec![
        Span::raw("Grand Total: "),
        Span::styled(
            format_amount(state.form.grand_total()),
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(total, chunks[3]);

    if prompt.banner_visible() {
        let banner = Paragraph::new("Install this app for easier access   I - Install | X - Close")
            .style(Style::default().fg(Color::Magenta))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(banner, chunks[4]);
    }

    let help_text = if let Some(status) = &state.status {
        status.clone()
    } else if state.is_editing() {
        match state.focus {
            Focus::Date => "Digits - Type | Left/Right - Switch part | Enter - Save | Esc - Cancel".to_string(),
            Focus::Items => "Type to edit | Tab - Next cell | Enter/Esc - Done".to_string(),
            Focus::Header(_) => "Type to edit | Enter/Esc - Done".to_string(),
        }
    } else {
        "A - Add row | D - Remove row | Enter - Edit | Tab - Next field | R - Reset | P - Print | Q - Quit"
            .to_string()
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[5]);

    if let Some(modal) = &state.modal {
        let size = frame.size();
        render_modal(frame, size, modal);
    }
}

fn field_style(active: bool) -> Style {
    if active {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    }
}

fn render_header<B: Backend>(frame: &mut Frame<B>, state: &MemoFormState, area: Rect) {
    let header = state.form.header();

    let date_value = if state.date_state.editing {
        state.date_state.get_display_string()
    } else {
        header.date.format("%d/%m/%Y").to_string()
    };

    let text_line = |label: &'static str, field: HeaderField, value: &str| {
        let active = state.focus == Focus::Header(field);
        let shown = match (&state.edit_buffer, active) {
            (Some(buffer), true) => format!("{}|", buffer),
            _ => value.to_string(),
        };
        Spans::from(vec![Span::styled(label, field_style(active)), Span::raw(shown)])
    };

    let lines = vec![
        Spans::from(vec![
            Span::styled("Date:     ", field_style(state.focus == Focus::Date)),
            Span::raw(date_value),
        ]),
        text_line("Customer: ", HeaderField::CustomerName, &header.customer_name),
        text_line("Address:  ", HeaderField::CustomerAddress, &header.customer_address),
        text_line("Phone:    ", HeaderField::CustomerPhone, &header.customer_phone),
    ];

    let paragraph = Paragraph::new(lines).block(Block::default().title("Customer").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn render_items<B: Backend>(frame: &mut Frame<B>, state: &mut MemoFormState, area: Rect) {
    let items_focused = state.focus == Focus::Items;
    let selected = state.selected_row();

    let rows = state
        .form
        .items()
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let cell = |field: ItemField, value: String| {
                let active = items_focused && index == selected && state.column == field;
                match (&state.edit_buffer, active) {
                    (Some(buffer), true) => Cell::from(format!("{}|", buffer))
                        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                    (None, true) => Cell::from(value).style(Style::default().add_modifier(Modifier::UNDERLINED)),
                    _ => Cell::from(value),
                }
            };

            Row::new(vec![
                cell(ItemField::Serial, item.serial.to_string()),
                cell(ItemField::Description, item.description.clone()),
                cell(ItemField::Quantity, item.quantity.clone()),
                cell(ItemField::UnitPrice, item.unit_price.clone()),
                Cell::from(format_amount(item.row_total())),
            ])
        })
        .collect::<Vec<_>>();

    let header = Row::new(vec!["Sl.", "Description", "Qty", "Rate", "Total"])
        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));

    let table = Table::new(rows)
        .header(header)
        .block(
            Block::default()
                .title("Items")
                .borders(Borders::ALL)
                .style(field_style(items_focused)),
        )
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White))
        .widths(&[
            Constraint::Length(5),
            Constraint::Percentage(45),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(12),
        ]);

    frame.render_stateful_widget(table, area, &mut state.table_state);
}

fn render_modal<B: Backend>(frame: &mut Frame<B>, size: Rect, modal: &Modal) {
    let popup_area = centered_rect(60, 20, size);

    let (title, message, hint, color) = match modal {
        Modal::Notice(message) => ("Notice", message.as_str(), "Press any key to continue", Color::Red),
        Modal::ConfirmReset => (
            "Reset",
            "Are you sure you want to reset the form? All data will be lost.",
            "Y - Reset | any other key - Keep",
            Color::Yellow,
        ),
        Modal::ConfirmInstall => (
            "Install",
            "Install Pest Control Memo for offline use?",
            "Y - Install | any other key - Not now",
            Color::Magenta,
        ),
    };

    let popup = Paragraph::new(vec![
        Spans::from(""),
        Spans::from(message),
        Spans::from(""),
        Spans::from(hint),
    ])
    .block(Block::default().title(title).borders(Borders::ALL))
    .style(Style::default().fg(color));

    frame.render_widget(Clear, popup_area);
    frame.render_widget(popup, popup_area);
}

// Helper function to create a centered rect
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Wait briefly for a key and apply it. Returns `None` when no key arrived,
/// so the caller can keep servicing background work.
/// Wait up to [`INPUT_POLL`] for a key press.
fn read_key() -> Result<Option<KeyCode>> {
    if !event::poll(INPUT_POLL)? {
        return Ok(None);
    }

    if let Event::Key(key) = event::read()? {
        return Ok(Some(key.code));
    }

    Ok(None)
}

/// The terminal poll blocks, so it runs on the blocking pool and the runtime
/// keeps driving the background cache install meanwhile.
pub async fn handle_input(state: &mut MemoFormState) -> Result<Option<MemoAction>> {
    next_action(state, read_key).await
}

async fn next_action<F>(state: &mut MemoFormState, read: F) -> Result<Option<MemoAction>>
where
    F: FnOnce() -> Result<Option<KeyCode>> + Send + 'static,
{
    let key = tokio::task::spawn_blocking(read).await??;
    Ok(key.and_then(|code| state.handle_key(code)))
}
