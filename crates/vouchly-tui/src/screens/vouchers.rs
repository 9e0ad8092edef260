//! Voucher list with status filter, search and row actions.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};

use vouchly_core::{RowAction, SessionState, StatusFilter, Voucher, VoucherFilter};

use crate::action::{Action, ExportKind, FormKind, Notification};
use crate::component::Component;
use crate::theme;

use super::{move_index, opt};

pub struct VouchersScreen {
    focused: bool,
    vouchers: Arc<Vec<Arc<Voucher>>>,
    filter: VoucherFilter,
    filtered: Vec<Arc<Voucher>>,
    table_state: TableState,
}

impl VouchersScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            vouchers: Arc::new(Vec::new()),
            filter: VoucherFilter::default(),
            filtered: Vec::new(),
            table_state: TableState::default().with_selected(Some(0)),
        }
    }

    fn recompute(&mut self) {
        self.filtered = self.filter.apply(&self.vouchers);
        let len = self.filtered.len();
        if len > 0 && self.selected_index() >= len {
            self.table_state.select(Some(len - 1));
        }
    }

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn selected(&self) -> Option<&Arc<Voucher>> {
        self.filtered.get(self.selected_index())
    }

    fn move_selection(&mut self, delta: isize) {
        let next = move_index(self.selected_index(), delta, self.filtered.len());
        self.table_state.select(Some(next));
    }

    fn row_action(&self, action: RowAction) -> Option<Action> {
        let voucher = self.selected()?;
        if RowAction::available_for(voucher).contains(&action) {
            Some(Action::RequestRowAction(action, Arc::clone(voucher)))
        } else {
            Some(Action::Notify(Notification::info(format!(
                "{} is already used",
                voucher.serial
            ))))
        }
    }

    fn status_tabs(&self) -> Line<'static> {
        let mut spans = vec![Span::styled(" Status ", theme::key_hint())];
        for status in [StatusFilter::All, StatusFilter::Unused, StatusFilter::Used] {
            let style = if status == self.filter.status {
                theme::tab_active()
            } else {
                theme::tab_inactive()
            };
            spans.push(Span::styled(format!(" {status} "), style));
        }
        if !self.filter.search().is_empty() {
            spans.push(Span::styled("   search ", theme::key_hint()));
            spans.push(Span::styled(
                format!("\"{}\"", self.filter.search()),
                Style::default().fg(theme::AMBER),
            ));
        }
        Line::from(spans)
    }
}

impl Component for VouchersScreen {
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
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(10);
                None
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.move_selection(-10);
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
            KeyCode::Char('f') => {
                let mut filter = self.filter.clone();
                filter.status = filter.status.next();
                Some(Action::ApplyFilter(filter))
            }
            KeyCode::Char('m') => self.row_action(RowAction::MarkUsed),
            KeyCode::Char('d') => self.row_action(RowAction::Delete),
            KeyCode::Char('r') => self.row_action(RowAction::Resend),
            KeyCode::Char('a') => Some(Action::OpenForm(FormKind::AddVoucher)),
            KeyCode::Char('i') => Some(Action::OpenForm(FormKind::ImportCsv)),
            KeyCode::Char('e') => Some(Action::Export(ExportKind::Vouchers)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::VouchersUpdated(vouchers) => {
                self.vouchers = Arc::clone(vouchers);
                self.recompute();
            }
            Action::FilterChanged(filter) => {
                self.filter = filter.clone();
                self.recompute();
            }
            // Live narrowing while typing; the backend is asked on submit.
            Action::SearchInput(query) => {
                self.filter.set_search(query.as_str());
                self.table_state.select(Some(0));
                self.recompute();
            }
            Action::SearchSubmit => return Ok(Some(Action::ApplyFilter(self.filter.clone()))),
            Action::CloseSearch => {
                let mut filter = self.filter.clone();
                filter.set_search("");
                return Ok(Some(Action::ApplyFilter(filter)));
            }
            Action::SessionChanged(state) if !matches!(state, SessionState::LoggedIn { .. }) => {
                self.vouchers = Arc::new(Vec::new());
                self.recompute();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let title = format!(" Vouchers ({}/{}) ", self.filtered.len(), self.vouchers.len());
        let block = Block::default()
            .title(title)
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

        let layout = Layout::vertical([
            Constraint::Length(1), // status tabs
            Constraint::Min(1),    // table
            Constraint::Length(1), // hints
        ])
        .split(inner);

        frame.render_widget(Paragraph::new(self.status_tabs()), layout[0]);

        let header = Row::new(
            ["ID", "Serial", "PIN", "Type", "Status", "Reference", "Used at"]
                .into_iter()
                .map(Cell::from),
        )
        .style(theme::table_header());

        let selected = self.selected_index();
        let rows: Vec<Row> = self
            .filtered
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let style = if i == selected {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                Row::new(vec![
                    Cell::from(v.id.to_string()),
                    Cell::from(v.serial.clone()).style(Style::default().fg(theme::TEAL)),
                    Cell::from(v.pin.clone()),
                    Cell::from(opt(v.kind.as_deref())),
                    Cell::from(v.status_label()).style(theme::status(v.used)),
                    Cell::from(opt(v.reference.as_deref())),
                    Cell::from(opt(v.date_used.as_deref())),
                ])
                .style(style)
            })
            .collect();

        let widths = [
            Constraint::Length(6),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Fill(2),
            Constraint::Length(20),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());
        let mut state = self.table_state;
        frame.render_stateful_widget(table, layout[1], &mut state);

        let hints = Line::from(vec![
            Span::styled("  f ", theme::key_hint_key()),
            Span::styled("filter  ", theme::key_hint()),
            Span::styled("m ", theme::key_hint_key()),
            Span::styled("mark used  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("resend  ", theme::key_hint()),
            Span::styled("d ", theme::key_hint_key()),
            Span::styled("delete  ", theme::key_hint()),
            Span::styled("a ", theme::key_hint_key()),
            Span::styled("add  ", theme::key_hint()),
            Span::styled("i ", theme::key_hint_key()),
            Span::styled("import  ", theme::key_hint()),
            Span::styled("e ", theme::key_hint_key()),
            Span::styled("export", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;
    use vouchly_core::VoucherId;

    use super::*;

    fn voucher(id: i64, serial: &str, used: bool) -> Arc<Voucher> {
        Arc::new(Voucher {
            id: VoucherId::Numeric(id),
            serial: serial.into(),
            pin: "0000".into(),
            kind: Some("WASSCE".into()),
            used,
            reference: None,
            date_used: None,
            phone: None,
            email: None,
        })
    }

    fn loaded() -> VouchersScreen {
        let mut screen = VouchersScreen::new();
        let list = Arc::new(vec![
            voucher(1, "WAE-1", false),
            voucher(2, "WAE-2", true),
            voucher(3, "BEC-3", false),
        ]);
        screen.update(&Action::VouchersUpdated(list)).unwrap();
        screen
    }

    fn press(screen: &mut VouchersScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap()
    }

    #[test]
    fn filter_key_cycles_status() {
        let mut screen = loaded();
        match press(&mut screen, KeyCode::Char('f')) {
            Some(Action::ApplyFilter(f)) => assert_eq!(f.status, StatusFilter::Unused),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_narrows_locally_then_applies() {
        let mut screen = loaded();
        screen.update(&Action::SearchInput("wae".into())).unwrap();
        assert_eq!(screen.filtered.len(), 2);

        let follow_up = screen.update(&Action::SearchSubmit).unwrap();
        match follow_up {
            Some(Action::ApplyFilter(f)) => assert_eq!(f.search(), "wae"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn mark_used_on_used_voucher_only_notifies() {
        let mut screen = loaded();
        press(&mut screen, KeyCode::Down);
        match press(&mut screen, KeyCode::Char('m')) {
            Some(Action::Notify(n)) => assert!(n.message.contains("WAE-2")),
            other => panic!("unexpected {other:?}"),
        }
        match press(&mut screen, KeyCode::Char('d')) {
            Some(Action::RequestRowAction(RowAction::Delete, v)) => assert_eq!(v.serial, "WAE-2"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn selection_is_clamped_when_list_shrinks() {
        let mut screen = loaded();
        press(&mut screen, KeyCode::Char('G'));
        assert_eq!(screen.selected_index(), 2);
        screen
            .update(&Action::VouchersUpdated(Arc::new(vec![voucher(1, "WAE-1", false)])))
            .unwrap();
        assert_eq!(screen.selected_index(), 0);
    }

    #[test]
    fn logout_empties_the_list() {
        let mut screen = loaded();
        screen
            .update(&Action::SessionChanged(SessionState::LoggedOut))
            .unwrap();
        assert!(screen.filtered.is_empty());
        assert!(press(&mut screen, KeyCode::Char('r')).is_none());
    }
}
