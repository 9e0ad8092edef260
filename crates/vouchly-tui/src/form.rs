//! Modal input form used for "add voucher" and "import CSV".

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
};

use crate::action::{Action, FormKind};
use crate::theme;

struct Field {
    label: &'static str,
    value: String,
    required: bool,
}

impl Field {
    fn new(label: &'static str, required: bool) -> Self {
        Self {
            label,
            value: String::new(),
            required,
        }
    }
}

/// Outcome of feeding a key to the form.
#[derive(Debug)]
pub enum FormEvent {
    /// Still editing.
    Pending,
    Cancelled,
    Submitted(Action),
}

pub struct Form {
    kind: FormKind,
    fields: Vec<Field>,
    focus: usize,
    error: Option<String>,
}

impl Form {
    pub fn new(kind: FormKind) -> Self {
        let fields = match kind {
            FormKind::AddVoucher => vec![
                Field::new("Serial", true),
                Field::new("PIN", true),
                Field::new("Type", false),
            ],
            FormKind::ImportCsv => vec![Field::new("CSV file", true)],
        };
        Self {
            kind,
            fields,
            focus: 0,
            error: None,
        }
    }

    fn title(&self) -> &'static str {
        match self.kind {
            FormKind::AddVoucher => " Add voucher ",
            FormKind::ImportCsv => " Import CSV ",
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormEvent {
        match key.code {
            KeyCode::Esc => return FormEvent::Cancelled,
            KeyCode::Tab | KeyCode::Down => self.focus = (self.focus + 1) % self.fields.len(),
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
            }
            KeyCode::Enter => return self.submit(),
            KeyCode::Backspace => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.pop();
                }
            }
            KeyCode::Char(c) => {
                if let Some(field) = self.fields.get_mut(self.focus) {
                    field.value.push(c);
                }
            }
            _ => {}
        }
        FormEvent::Pending
    }

    fn value(&self, idx: usize) -> String {
        self.fields
            .get(idx)
            .map(|f| f.value.trim().to_owned())
            .unwrap_or_default()
    }

    fn submit(&mut self) -> FormEvent {
        if let Some(missing) = self
            .fields
            .iter()
            .find(|f| f.required && f.value.trim().is_empty())
        {
            self.error = Some(format!("{} is required", missing.label));
            return FormEvent::Pending;
        }

        let action = match self.kind {
            FormKind::AddVoucher => {
                let kind = self.value(2);
                Action::AddVoucher {
                    serial: self.value(0),
                    pin: self.value(1),
                    kind: (!kind.is_empty()).then_some(kind),
                }
            }
            FormKind::ImportCsv => Action::ImportFile(PathBuf::from(self.value(0))),
        };
        FormEvent::Submitted(action)
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let width = 56u16.min(area.width.saturating_sub(4));
        let height = u16::try_from(self.fields.len())
            .unwrap_or(u16::MAX)
            .saturating_add(5)
            .min(area.height);
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let rect = Rect::new(x, y, width, height);

        frame.render_widget(Clear, rect);
        let block = Block::default()
            .title(self.title())
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused())
            .style(Style::default().bg(theme::BG_DARK));
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let mut lines: Vec<Line> = self
            .fields
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let active = i == self.focus;
                let cursor = if active { "█" } else { "" };
                Line::from(vec![
                    Span::styled(
                        format!(" {:<10}", field.label),
                        if active { theme::key_hint_key() } else { theme::key_hint() },
                    ),
                    Span::styled(format!("{}{cursor}", field.value), theme::table_row()),
                ])
            })
            .collect();
        lines.push(Line::from(""));
        if let Some(ref err) = self.error {
            lines.push(Line::from(Span::styled(
                format!(" {err}"),
                Style::default().fg(theme::RED),
            )));
        }
        lines.push(Line::from(vec![
            Span::styled(" Tab ", theme::key_hint_key()),
            Span::styled("next  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("submit  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]));
        frame.render_widget(Paragraph::new(lines), inner);
    }
}
