//! Dashboard: count tiles and the most recent sales.

use std::sync::Arc;

use chrono::Local;
use color_eyre::eyre::Result;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};

use vouchly_core::{Sale, SessionState, VoucherStats};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

use super::opt;

const RECENT_SALES: usize = 8;

pub struct DashboardScreen {
    focused: bool,
    stats: Option<VoucherStats>,
    sales: Arc<Vec<Arc<Sale>>>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            stats: None,
            sales: Arc::new(Vec::new()),
        }
    }

    fn render_tile(frame: &mut Frame, area: Rect, label: &str, value: Option<u64>, color: Color) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let value = value.map_or_else(|| "─".into(), |v| v.to_string());
        let lines = vec![
            Line::from(Span::styled(
                value,
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(label.to_owned(), theme::key_hint())),
        ];
        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
    }

    fn render_recent(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Recent sales ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.sales.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled("  No sales yet", theme::key_hint())),
                inner,
            );
            return;
        }

        let header = Row::new(["Name", "Voucher", "Reference", "Date"].into_iter().map(Cell::from))
            .style(theme::table_header());
        let rows: Vec<Row> = self
            .sales
            .iter()
            .take(RECENT_SALES)
            .map(|s| {
                Row::new(vec![
                    Cell::from(opt(s.name.as_deref())),
                    Cell::from(s.voucher_display()).style(Style::default().fg(theme::ACCENT)),
                    Cell::from(opt(s.reference.as_deref())),
                    Cell::from(opt(s.date.as_deref())),
                ])
                .style(theme::table_row())
            })
            .collect();
        let widths = [
            Constraint::Fill(2),
            Constraint::Fill(2),
            Constraint::Fill(1),
            Constraint::Length(20),
        ];
        frame.render_widget(Table::new(rows, widths).header(header), inner);
    }
}

impl Component for DashboardScreen {
    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::StatsUpdated(stats) => self.stats = Some(*stats),
            Action::SalesUpdated(sales) => self.sales = Arc::clone(sales),
            Action::SessionChanged(state) if !matches!(state, SessionState::LoggedIn { .. }) => {
                self.stats = None;
                self.sales = Arc::new(Vec::new());
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Dashboard ")
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
            Constraint::Length(4), // tiles
            Constraint::Min(3),    // recent sales
            Constraint::Length(1), // fetched at
        ])
        .split(inner);

        let tiles = Layout::horizontal([Constraint::Ratio(1, 3); 3]).split(layout[0]);
        Self::render_tile(frame, tiles[0], "Total", self.stats.map(|s| s.total), theme::TEAL);
        Self::render_tile(frame, tiles[1], "Unused", self.stats.map(|s| s.unused), theme::GREEN);
        Self::render_tile(frame, tiles[2], "Used", self.stats.map(|s| s.used), theme::ROSE);

        self.render_recent(frame, layout[1]);

        let footer = self.stats.map_or_else(
            || "  Press R to load".to_owned(),
            |s| {
                format!(
                    "  Updated {}",
                    s.fetched_at.with_timezone(&Local).format("%H:%M:%S")
                )
            },
        );
        frame.render_widget(Paragraph::new(Span::styled(footer, theme::key_hint())), layout[2]);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}
