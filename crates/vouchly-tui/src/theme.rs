//! Palette and semantic styles.

use ratatui::style::{Color, Modifier, Style};

// ── Palette ─────────────────────────────────────────────────────────

pub const ACCENT: Color = Color::Rgb(255, 184, 108); // #ffb86c
pub const TEAL: Color = Color::Rgb(94, 234, 212); // #5eead4
pub const ROSE: Color = Color::Rgb(251, 113, 133); // #fb7185
pub const AMBER: Color = Color::Rgb(250, 204, 21); // #facc15
pub const GREEN: Color = Color::Rgb(74, 222, 128); // #4ade80
pub const RED: Color = Color::Rgb(248, 113, 113); // #f87171

pub const TEXT: Color = Color::Rgb(203, 213, 225); // #cbd5e1
pub const MUTED: Color = Color::Rgb(100, 116, 139); // #64748b
pub const BG_HIGHLIGHT: Color = Color::Rgb(30, 41, 59); // #1e293b
pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0f172a

// ── Styles ──────────────────────────────────────────────────────────

pub fn title_style() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

pub fn border_focused() -> Style {
    Style::default().fg(ACCENT)
}

pub fn border_default() -> Style {
    Style::default().fg(MUTED)
}

pub fn table_header() -> Style {
    Style::default()
        .fg(TEAL)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
}

pub fn table_row() -> Style {
    Style::default().fg(TEXT)
}

pub fn table_selected() -> Style {
    Style::default()
        .fg(ACCENT)
        .bg(BG_HIGHLIGHT)
        .add_modifier(Modifier::BOLD)
}

pub fn tab_active() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn tab_inactive() -> Style {
    Style::default().fg(TEXT)
}

pub fn key_hint() -> Style {
    Style::default().fg(MUTED)
}

pub fn key_hint_key() -> Style {
    Style::default().fg(TEAL).add_modifier(Modifier::BOLD)
}

/// Used / unused status colouring.
pub fn status(used: bool) -> Style {
    Style::default().fg(if used { ROSE } else { GREEN })
}
