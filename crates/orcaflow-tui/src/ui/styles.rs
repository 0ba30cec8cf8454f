use ratatui::style::{Color, Modifier, Style};

use orcaflow_core::models::{ContactStatus, PageStatus, Platform, PostStatus};

// Ocean palette
pub const PRIMARY: Color = Color::Rgb(56, 142, 204);
pub const SECONDARY: Color = Color::Rgb(88, 176, 120);
pub const ACCENT: Color = Color::Rgb(230, 168, 64);
pub const ERROR: Color = Color::Rgb(208, 72, 72);
pub const MUTED: Color = Color::Rgb(128, 128, 140);
pub const HIGHLIGHT: Color = Color::Rgb(36, 52, 72);

const FACEBOOK: Color = Color::Rgb(66, 103, 178);
const INSTAGRAM: Color = Color::Rgb(193, 53, 132);
const LINKEDIN: Color = Color::Rgb(10, 102, 194);

pub fn title_style() -> Style {
    Style::default().fg(PRIMARY).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn highlight_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn success_style() -> Style {
    Style::default().fg(SECONDARY)
}

pub fn error_style() -> Style {
    Style::default().fg(ERROR)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(PRIMARY)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        Style::default().fg(Color::White)
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(PRIMARY)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn search_style() -> Style {
    Style::default().fg(ACCENT)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(Color::Rgb(24, 32, 44)).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn today_style() -> Style {
    Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
}

pub fn platform_style(platform: Platform) -> Style {
    let color = match platform {
        Platform::Facebook => FACEBOOK,
        Platform::Instagram => INSTAGRAM,
        Platform::LinkedIn => LINKEDIN,
        Platform::Generic => MUTED,
    };
    Style::default().fg(color)
}

/// Published posts are green, upcoming ones amber.
pub fn post_status_style(status: PostStatus) -> Style {
    match status {
        PostStatus::Posted => success_style(),
        PostStatus::Scheduled => highlight_style(),
    }
}

pub fn contact_status_style(status: ContactStatus) -> Style {
    match status {
        ContactStatus::Lead => highlight_style(),
        ContactStatus::Customer => success_style(),
        ContactStatus::Partner => Style::default().fg(PRIMARY),
        ContactStatus::Archived => muted_style(),
    }
}

pub fn page_status_style(status: PageStatus) -> Style {
    match status {
        PageStatus::Active => success_style(),
        PageStatus::Inactive => error_style(),
        PageStatus::Pending => highlight_style(),
    }
}
