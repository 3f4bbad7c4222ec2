use ratatui::style::{Color, Modifier, Style};

use crate::model::Tone;

pub fn tone_color(tone: Tone) -> Color {
    match tone {
        Tone::Neutral => Color::Gray,
        Tone::Primary => Color::Cyan,
        Tone::Info => Color::Blue,
        Tone::Success => Color::Green,
        Tone::Warning => Color::Yellow,
        Tone::Error => Color::Red,
    }
}

/// Inverted badge style, e.g. for "IN PROGRESS".
pub fn badge(tone: Tone) -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(tone_color(tone))
        .add_modifier(Modifier::BOLD)
}

pub fn heading() -> Style {
    Style::default().add_modifier(Modifier::BOLD).fg(Color::Cyan)
}

pub fn muted() -> Style {
    Style::default().fg(Color::DarkGray)
}

pub fn selected() -> Style {
    Style::default()
        .bg(Color::Cyan)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}
