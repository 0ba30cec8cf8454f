use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use orcaflow_core::utils::format_followers;

use crate::app::{today, App, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_brand(frame, app, chunks[0]);
    render_pages(frame, app, chunks[1]);
}

fn row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<17}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn section(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(title, styles::highlight_style()))
}

fn render_brand(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let brand = app.brand_settings();

    let source = if app.settings_loading {
        Span::styled("loading…", styles::muted_style())
    } else if app.settings.is_some() {
        Span::styled("tenant", styles::success_style())
    } else {
        Span::styled("local copy", styles::highlight_style())
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Source: ", styles::muted_style()), source]),
        Line::from(""),
        section("Brand Voice"),
        row("Industry", brand.industry.clone()),
        row("Target audience", brand.target_audience.clone()),
        row("Offerings", brand.offerings.clone()),
        row("Archetype", brand.archetype.clone()),
        row("Tone", brand.tone.clone()),
        row("Language", brand.default_language.label().to_string()),
        row("Forbidden words", brand.keywords_csv()),
        row("Exemplar", format!("\u{201c}{}\u{201d}", brand.exemplar)),
    ];

    if let Some(system) = app.system_settings() {
        lines.push(Line::from(""));
        lines.push(section("System"));
        let business = if system.business_name.is_empty() {
            "(not set)".to_string()
        } else {
            system.business_name.clone()
        };
        lines.push(row("Business name", business));
        lines.push(row("Timezone", system.timezone.clone()));
        let sample = today().format(system.date_format.chrono_format());
        lines.push(row("Date format", format!("{} ({})", system.date_format.label(), sample)));
        lines.push(row("Currency", system.currency.clone()));
    }

    let agent = &app.custom_agent;
    let enabled = |on: bool| if on { "on" } else { "off" };
    lines.push(Line::from(""));
    lines.push(section("Custom Agent"));
    lines.push(row("Provider", agent.platform.clone()));
    let key = if agent.api_key.is_empty() {
        "(not set)".to_string()
    } else {
        agent.masked_key()
    };
    lines.push(row("API key", key));
    lines.push(row(
        "Features",
        format!("planner {} · chat {}", enabled(agent.features.planner), enabled(agent.features.chat)),
    ));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Brand & System [e] · Agent [g] ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_pages(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let pages = app.visible_pages();

    let header = Row::new(vec![
        Cell::from("Page"),
        Cell::from("Platform"),
        Cell::from("Followers"),
        Cell::from("Status"),
        Cell::from("Since"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = pages
        .iter()
        .map(|page| {
            Row::new(vec![
                Cell::from(page.name.clone()),
                Cell::from(page.platform.clone()),
                Cell::from(format_followers(page.followers)),
                Cell::from(page.status.label()).style(styles::page_status_style(page.status)),
                Cell::from(page.connected_on().to_string()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(9),
        Constraint::Length(11),
    ];

    let state_note = if app.pages.loading {
        " · loading…"
    } else if app.pages.error.is_some() {
        " · failed, [r] to retry"
    } else {
        ""
    };
    let title = format!(" Connected Pages ({}){} [c] ", pages.len(), state_note);
    let title_style = if app.pages.error.is_some() {
        styles::error_style()
    } else {
        styles::muted_style()
    };

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(title_style)
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !pages.is_empty() {
        state.select(Some(app.page_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}
