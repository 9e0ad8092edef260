//! Sales list. Search filters locally; the backend has no sales query.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use vouchly_core::{Sale, SessionState};

use crate::action::{Action, ExportKind};
use crate::component::Component;
use crate::theme;

use super::{move_index, opt};

fn sale_matches(sale: &Sale, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let voucher = sale.voucher_display();
    [
        sale.name.as_deref(),
        sale.phone.as_deref(),
        sale.email.as_deref(),
        sale.reference.as_deref(),
        Some(voucher.as_str()),
    ]
    .into_iter()
    .flatten()
    .any(|field| field.to_lowercase().contains(needle))
}

pub struct SalesScreen {
    focused: bool,
    sales: Arc<Vec<Arc<Sale>>>,
    search: String,
    filtered: Vec<Arc<Sale>>,
    table_state: TableState,
}

impl SalesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            sales: Arc::new(Vec::new()),
            search: String::new(),
            filtered: Vec::new(),
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn recompute(&mut self) {
        let needle = self.search.trim().to_lowercase();
        self.filtered = self
            .sales
            .iter()
            .filter(|s| sale_matches(s, &needle))
            .cloned()
            .collect();
        let len = self.filtered.len();
        if len > 0 && self.selected_index() >= len {
            self.table_state.select(Some(len - 1));
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn move_selection(&mut self, delta: isize) {
        let next = move_index(self.selected_index(), delta, self.filtered.len());
        self.table_state.select(Some(next));
    }
}

impl Component for SalesScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Char('g') => {
                self.table_state.select(Some(0));
                None
            }
            KeyCode::Char('G') => {
                self.table_state
                    .select(Some(self.filtered.len().saturating_sub(1)));
                None
            }
            KeyCode::Char('e') => Some(Action::Export(ExportKind::Sales)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SalesUpdated(sales) => {
                self.sales = Arc::clone(sales);
                self.recompute();
            }
            Action::SearchInput(query) => {
                self.search.clone_from(query);
                self.table_state.select(Some(0));
                self.recompute();
            }
            Action::CloseSearch => {
                self.search.clear();
                self.recompute();
            }
            Action::SessionChanged(state) if !matches!(state, SessionState::LoggedIn { .. }) => {
                self.sales = Arc::new(Vec::new());
                self.recompute();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(format!(" Sales ({}) ", self.filtered.len()))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let layout = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(inner);

        let header = Row::new(
            ["Name", "Phone", "Email", "Voucher", "Reference", "Date"]
                .into_iter()
                .map(Cell::from),
        )
        .style(theme::table_header());

        let rows: Vec<Row> = self
            .filtered
            .iter()
            .map(|s| {
                Row::new(vec![
                    Cell::from(opt(s.name.as_deref())).style(Style::default().fg(theme::TEAL)),
                    Cell::from(opt(s.phone.as_deref())),
                    Cell::from(opt(s.email.as_deref())),
                    Cell::from(s.voucher_display()).style(Style::default().fg(theme::ACCENT)),
                    Cell::from(opt(s.reference.as_deref())),
                    Cell::from(opt(s.date.as_deref())),
                ])
                .style(theme::table_row())
            })
            .collect();

        let widths = [
            Constraint::Fill(2),
            Constraint::Length(14),
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());
        let mut state = self.table_state;
        frame.render_stateful_widget(table, layout[0], &mut state);

        let mut hints = vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("/ ", theme::key_hint_key()),
            Span::styled("search  ", theme::key_hint()),
            Span::styled("e ", theme::key_hint_key()),
            Span::styled("export", theme::key_hint()),
        ];
        if !self.search.is_empty() {
            hints.push(Span::styled(
                format!("   matching \"{}\"", self.search),
                Style::default().fg(theme::AMBER),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(hints)), layout[1]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn sale(name: &str, voucher: &str, reference: &str) -> Arc<Sale> {
        Arc::new(Sale {
            id: None,
            name: Some(name.into()),
            phone: None,
            email: None,
            voucher_serial: None,
            voucher_pin: None,
            voucher: Some(voucher.into()),
            reference: Some(reference.into()),
            date: None,
        })
    }

    #[test]
    fn search_matches_name_reference_and_voucher() {
        let mut screen = SalesScreen::new();
        let list = Arc::new(vec![
            sale("Ama", "S1 | P1", "T-100"),
            sale("Kofi", "S2 | P2", "T-200"),
        ]);
        screen.update(&Action::SalesUpdated(list)).unwrap();

        screen.update(&Action::SearchInput("KOFI".into())).unwrap();
        assert_eq!(screen.filtered.len(), 1);
        screen.update(&Action::SearchInput("t-1".into())).unwrap();
        assert_eq!(screen.filtered[0].name.as_deref(), Some("Ama"));
        screen.update(&Action::SearchInput("s2".into())).unwrap();
        assert_eq!(screen.filtered[0].name.as_deref(), Some("Kofi"));

        screen.update(&Action::CloseSearch).unwrap();
        assert_eq!(screen.filtered.len(), 2);
    }

    #[test]
    fn export_key_requests_sales_export() {
        let mut screen = SalesScreen::new();
        let action = screen
            .handle_key_event(KeyEvent::from(KeyCode::Char('e')))
            .unwrap();
        assert!(matches!(action, Some(Action::Export(ExportKind::Sales))));
    }
}
