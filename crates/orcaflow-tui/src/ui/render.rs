use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, AppState, LoginFocus, Tab};
use crate::form::{FieldKind, Form, FormField};

use super::styles;
use super::tabs::{contacts, planner, settings};

const LOGO: [&str; 3] = [
    "   ╔═╗╦═╗╔═╗╔═╗  ╔═╗╦  ╔═╗╦ ╦",
    "   ║ ║╠╦╝║  ╠═╣  ╠╣ ║  ║ ║║║║",
    "   ╚═╝╩╚═╚═╝╩ ╩  ╚  ╩═╝╚═╝╚╩╝",
];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Tabs
            Constraint::Min(10),   // Main content
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_tabs(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_status_bar(frame, app, chunks[3]);

    // Overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete => render_delete_overlay(frame, app),
        AppState::Editing => render_form_overlay(frame, app),
        _ => {}
    }
}

fn logo_lines(indent: &str) -> Vec<Line<'static>> {
    LOGO.iter()
        .map(|l| Line::from(Span::styled(format!("{}{}", indent, l), styles::title_style())))
        .collect()
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = "  OrcaFlow";
    let user = format!("{}  [?] Help", app.user_label());

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.len() + user.chars().count() + 2),
        )),
        Span::styled(user, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let tabs = [Tab::Planner, Tab::Contacts, Tab::Settings];

    let mut spans = vec![Span::raw(" ")];
    for (i, tab) in tabs.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        let label = format!("[{}] {}", i + 1, tab.title());
        if app.current_tab == *tab {
            spans.push(Span::styled(label, styles::tab_style(true)));
        } else {
            spans.push(Span::styled(label, styles::muted_style()));
        }
    }

    // View mode toggle on the right of the planner tab
    if app.current_tab == Tab::Planner {
        use orcaflow_core::calendar::ViewMode;
        let modes = [
            ("[m]onth", ViewMode::Month),
            ("[w]eek", ViewMode::Week),
            ("[l]ist", ViewMode::List),
        ];
        let main_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let modes_width: usize = modes.iter().map(|(l, _)| l.len()).sum::<usize>() + (modes.len() - 1) * 3;
        let padding = (area.width as usize).saturating_sub(main_width + modes_width + 2);
        spans.push(Span::raw(" ".repeat(padding)));

        for (i, (label, mode)) in modes.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled(" | ", styles::muted_style()));
            }
            let style = if app.view_mode == *mode {
                styles::tab_style(true)
            } else {
                styles::muted_style()
            };
            spans.push(Span::styled(*label, style));
        }
    }

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.current_tab {
        Tab::Planner => planner::render(frame, app, area),
        Tab::Contacts => contacts::render(frame, app, area),
        Tab::Settings => settings::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.current_tab {
        Tab::Planner => "[f]ilter | [t]oday | [d]elete | [r]efresh | [q]uit",
        Tab::Contacts => "[/]search | [s]tatus | [d]elete | [q]uit",
        Tab::Settings => "[r]efresh | [d]isconnect | [L]ogout | [q]uit",
    };

    let left_text = match app.status_message {
        Some(ref msg) => format!(" {} ", msg),
        None => match app.current_tab {
            Tab::Planner => format!(" Posts updated {} ", app.cache_ages.posts_age()),
            Tab::Contacts => format!(" {} contacts stored locally ", app.contacts.len()),
            Tab::Settings => format!(" Pages updated {} ", app.cache_ages.pages_age()),
        },
    };
    let right_text = format!(" {} ", shortcuts);

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 35, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines("  ");
    lines.push(Line::from(Span::styled(
        format!("              version {}", env!("CARGO_PKG_VERSION")),
        styles::muted_style(),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Navigation", styles::highlight_style())));
    lines.push(help_line("1-3 ←/→", "Switch tabs (←/→ outside Planner)"));
    lines.push(help_line("Tab", "Switch focus (list / detail)"));
    lines.push(help_line("↑/↓ j/k", "Move selection"));
    lines.push(help_line("PgUp/PgDn", "Move a page"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Planner", styles::highlight_style())));
    lines.push(help_line("m/w/l", "Month, week or list view"));
    lines.push(help_line("←/→ [ ]", "Previous / next period"));
    lines.push(help_line("t", "Jump to today"));
    lines.push(help_line("f", "Cycle platform filter"));
    lines.push(help_line("d", "Delete scheduled post"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Contacts", styles::highlight_style())));
    lines.push(help_line("/", "Search name, email, company"));
    lines.push(help_line("s", "Cycle status filter"));
    lines.push(help_line("a / e", "Add or edit contact"));
    lines.push(help_line("d", "Delete contact"));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" General", styles::highlight_style())));
    lines.push(help_line("r", "Refresh current tab"));
    lines.push(help_line("e / g", "Edit brand or agent (Settings)"));
    lines.push(help_line("c / d", "Connect or disconnect page"));
    lines.push(help_line("X", "Clear local data (Settings)"));
    lines.push(help_line("L", "Log out"));
    lines.push(help_line("q", "Quit"));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("       Press ", styles::muted_style()),
        Span::styled("?", styles::help_key_style()),
        Span::styled(" or ", styles::muted_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" to close", styles::muted_style()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn input_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled(" [", styles::muted_style()),
        Span::styled(format!("{:<28}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 14 } else { 12 };
    let area = centered_rect_fixed(50, height, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = logo_lines("      ");
    lines.push(Line::from(""));

    // Show the tail of a long email so the cursor stays visible
    let email: String = {
        let count = app.login_email.chars().count();
        app.login_email.chars().skip(count.saturating_sub(28)).collect()
    };
    lines.push(input_field("   Email:", email, app.login_focus == LoginFocus::Email));
    lines.push(input_field("Password:", "*".repeat(app.login_password.chars().count().min(28)), app.login_focus == LoginFocus::Password));

    let button_focused = app.login_focus == LoginFocus::Button;
    let button_style = if button_focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = if app.login_in_progress {
        " Signing in… "
    } else if button_focused {
        " ▶ Sign in ◀ "
    } else {
        "   Sign in   "
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                 ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(format!(" {}", error), styles::error_style())));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn confirm_lines(prompt: String) -> Vec<Line<'static>> {
    let mut lines = logo_lines("      ");
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(format!("  {}", prompt), styles::list_item_style())));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("            "),
        Span::styled("[y]", styles::help_key_style()),
        Span::styled(" Yes    ", styles::help_desc_style()),
        Span::styled("[n]", styles::help_key_style()),
        Span::styled(" No", styles::help_desc_style()),
    ]));
    lines
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(50, 10, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let lines = confirm_lines("Quit OrcaFlow?".to_string());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App) {
    let Some(ref pending) = app.pending_delete else {
        return;
    };
    let area = centered_rect_fixed(50, 10, frame.area());
    frame.render_widget(Clear, area);

    let prompt = orcaflow_core::utils::truncate(&pending.prompt(), 44);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    frame.render_widget(Paragraph::new(confirm_lines(prompt)).block(block), area);
}

/// Width of the value column in form rows.
const FORM_VALUE_WIDTH: usize = 40;

/// Field value as shown: masked secrets, arrows around choices, a checkbox for toggles.
fn form_value(field: &FormField) -> String {
    match field.kind {
        FieldKind::Secret => "•".repeat(field.value.chars().count().min(FORM_VALUE_WIDTH)),
        FieldKind::Choice(_) => format!("‹ {} ›", field.value),
        FieldKind::Toggle => if field.is_on() { "[x]" } else { "[ ]" }.to_string(),
        FieldKind::Text => {
            // Keep the end of long values in view
            let count = field.value.chars().count();
            field.value.chars().skip(count.saturating_sub(FORM_VALUE_WIDTH)).collect()
        }
    }
}

fn form_lines(form: &Form) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    for (i, field) in form.fields.iter().enumerate() {
        let focused = i == form.focus;
        let style = if focused {
            styles::selected_style()
        } else {
            styles::list_item_style()
        };
        let cursor = if focused && field.is_editable_text() { "▌" } else { "" };
        lines.push(Line::from(vec![
            Span::styled(format!("  {:>15} ", field.label), styles::muted_style()),
            Span::styled(format!("{}{}", form_value(field), cursor), style),
        ]));
    }

    let button_style = if form.on_button() {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let label = if form.submitting {
        " Working… ".to_string()
    } else {
        format!(" {} ", form.button_label())
    };
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw("                  ["),
        Span::styled(label, button_style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = form.error {
        lines.push(Line::from(Span::styled(format!("  {}", error), styles::error_style())));
    }
    lines.push(Line::from(vec![
        Span::styled("  Tab", styles::help_key_style()),
        Span::styled(" next  ", styles::help_desc_style()),
        Span::styled("←/→", styles::help_key_style()),
        Span::styled(" choose  ", styles::help_desc_style()),
        Span::styled("Ctrl+S", styles::help_key_style()),
        Span::styled(" save  ", styles::help_desc_style()),
        Span::styled("Esc", styles::help_key_style()),
        Span::styled(" cancel", styles::help_desc_style()),
    ]));
    lines
}

fn render_form_overlay(frame: &mut Frame, app: &App) {
    let Some(ref form) = app.form else {
        return;
    };
    let height = form.fields.len() as u16 + 7;
    let area = centered_rect_fixed(64, height, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(form.title())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(Paragraph::new(form_lines(form)).block(block), area);
}
