use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use orcaflow_core::models::Contact;
use orcaflow_core::utils::format_phone;

use crate::app::{App, AppState, Focus};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(4)])
        .split(chunks[0]);

    render_search_bar(frame, app, left[0]);
    render_contact_list(frame, app, left[1]);
    render_contact_detail(frame, app, chunks[1]);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let searching = app.state == AppState::Searching;
    let filter = app
        .contact_status_filter
        .map(|s| s.as_str())
        .unwrap_or("All");

    let query = if app.contact_query.is_empty() && !searching {
        Span::styled("press / to search", styles::muted_style())
    } else {
        let cursor = if searching { "▌" } else { "" };
        Span::styled(format!("{}{}", app.contact_query, cursor), styles::search_style())
    };

    let line = Line::from(vec![
        Span::styled(" Search: ", styles::muted_style()),
        query,
    ]);

    let block = Block::default()
        .title(format!(" Status: {} [s] ", filter))
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(searching));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_contact_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List) && app.state != AppState::Searching;
    let contacts = app.visible_contacts();

    let header = Row::new(vec![
        Cell::from("Name"),
        Cell::from("Company"),
        Cell::from("Email"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = contacts
        .iter()
        .map(|c| {
            Row::new(vec![
                Cell::from(c.full_name()),
                Cell::from(c.company.clone()),
                Cell::from(c.email.clone()),
                Cell::from(c.status.as_str()).style(styles::contact_status_style(c.status)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Percentage(30),
        Constraint::Percentage(22),
        Constraint::Fill(1),
        Constraint::Length(9),
    ];

    let title = format!(" Contacts ({}/{}) [a]dd [e]dit ", contacts.len(), app.contacts.len());

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !contacts.is_empty() {
        state.select(Some(app.contact_selection));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_contact_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let lines = match app.selected_contact() {
        Some(contact) => contact_lines(contact),
        None if !app.contact_query.is_empty() => vec![Line::from(Span::styled(
            format!("No contacts match \"{}\"", app.contact_query),
            styles::muted_style(),
        ))],
        None => vec![Line::from(Span::styled("No contacts", styles::muted_style()))],
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Details ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn contact_lines(contact: &Contact) -> Vec<Line<'static>> {
    let label = |s: &'static str| Span::styled(format!("{:<9}", s), styles::muted_style());

    let mut lines = vec![
        Line::from(Span::styled(contact.full_name(), styles::title_style())),
    ];
    if !contact.role.is_empty() || !contact.company.is_empty() {
        let at = match (contact.role.is_empty(), contact.company.is_empty()) {
            (false, false) => format!("{} at {}", contact.role, contact.company),
            (true, _) => contact.company.clone(),
            (_, true) => contact.role.clone(),
        };
        lines.push(Line::from(Span::styled(at, styles::muted_style())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![label("Email:"), Span::raw(contact.email.clone())]));
    if !contact.phone.is_empty() {
        lines.push(Line::from(vec![label("Phone:"), Span::raw(format_phone(&contact.phone))]));
    }
    lines.push(Line::from(vec![
        label("Status:"),
        Span::styled(contact.status.as_str(), styles::contact_status_style(contact.status)),
    ]));

    for field in &contact.custom_fields {
        lines.push(Line::from(vec![
            Span::styled(format!("{:<9}", format!("{}:", field.key)), styles::muted_style()),
            Span::raw(field.value.clone()),
        ]));
    }

    if !contact.notes.trim().is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Notes", styles::highlight_style())));
        lines.extend(contact.notes.lines().map(|l| Line::from(l.to_string())));
    }

    let history = contact.history_newest_first();
    if !history.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("History", styles::highlight_style())));
        for event in history {
            lines.push(Line::from(vec![
                Span::styled(event.date.format("%Y-%m-%d  ").to_string(), styles::muted_style()),
                Span::styled(format!("{:<9}", format!("{:?}", event.event_type)), styles::highlight_style()),
                Span::raw(event.details.clone()),
            ]));
        }
    }

    lines
}
