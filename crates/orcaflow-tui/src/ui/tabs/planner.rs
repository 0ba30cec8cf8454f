use chrono::Datelike;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use orcaflow_core::calendar::{self, ViewMode};
use orcaflow_core::models::ScheduledPost;
use orcaflow_core::utils::{format_long_date, truncate};

use crate::app::{today, App, Focus};
use crate::ui::styles;

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let posts = app.visible_posts();

    match app.view_mode {
        ViewMode::Month | ViewMode::Week => {
            let grid_height = if app.view_mode == ViewMode::Month { 14 } else { 9 };
            let left = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(grid_height), Constraint::Min(4)])
                .split(chunks[0]);
            if app.view_mode == ViewMode::Month {
                render_month_grid(frame, app, &posts, left[0]);
            } else {
                render_week(frame, app, &posts, left[0]);
            }
            render_post_list(frame, app, &posts, left[1]);
        }
        ViewMode::List => render_post_list(frame, app, &posts, chunks[0]),
    }

    render_post_detail(frame, app, chunks[1]);
}

/// Title for the calendar block: period, filter and fetch state.
fn header(app: &App) -> String {
    let mut title = format!(" {} ", calendar::header_title(app.view_mode, app.current_date));
    if app.platform_filter != calendar::PLATFORM_FILTERS[0] {
        title.push_str(&format!("· {} ", app.platform_filter));
    }
    if app.posts.loading {
        title.push_str("· loading… ");
    } else if app.posts.error.is_some() {
        title.push_str("· failed, [r] to retry ");
    } else if app.showing_cached_posts() {
        title.push_str("· cached ");
    }
    title
}

fn render_month_grid(frame: &mut Frame, app: &App, posts: &[&ScheduledPost], area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let today = today();
    let month = app.current_date.month();
    let selected_day = app.selected_post().map(|p| p.date);

    let header = Row::new(WEEKDAYS.iter().map(|d| Cell::from(*d)))
        .style(styles::title_style())
        .height(1);

    let days = calendar::month_grid(app.current_date);
    let rows: Vec<Row> = days
        .chunks(7)
        .map(|week| {
            let cells = week.iter().map(|day| {
                let count = posts.iter().filter(|p| p.date == *day).count();
                let label = if count > 0 {
                    format!("{:>2} ·{}", day.day(), count)
                } else {
                    format!("{:>2}", day.day())
                };
                let style = if Some(*day) == selected_day {
                    styles::selected_style()
                } else if *day == today {
                    styles::today_style()
                } else if day.month() != month {
                    styles::muted_style()
                } else if count > 0 {
                    styles::highlight_style()
                } else {
                    styles::list_item_style()
                };
                Cell::from(label).style(style)
            });
            Row::new(cells).height(2)
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(
            Block::default()
                .title(header_title_line(app))
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        );

    frame.render_widget(table, area);
}

fn render_week(frame: &mut Frame, app: &App, posts: &[&ScheduledPost], area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let today = today();
    let days = calendar::week_days(app.current_date);
    let selected = app.selected_post().map(|p| p.id);

    let header = Row::new(days.iter().map(|day| {
        let label = format!("{} {}", WEEKDAYS[day.weekday().num_days_from_sunday() as usize], day.day());
        let style = if *day == today {
            styles::today_style()
        } else {
            styles::title_style()
        };
        Cell::from(label).style(style)
    }));

    // One row per post slot; column n holds the nth post of that day
    let per_day: Vec<Vec<&ScheduledPost>> = days
        .iter()
        .map(|day| posts.iter().filter(|p| p.date == *day).copied().collect())
        .collect();
    let slots = per_day.iter().map(Vec::len).max().unwrap_or(0);
    let col_width = (area.width.saturating_sub(2) / 7).saturating_sub(1) as usize;

    let rows: Vec<Row> = (0..slots)
        .map(|slot| {
            Row::new(per_day.iter().map(|day_posts| match day_posts.get(slot) {
                Some(post) => {
                    let style = if Some(post.id) == selected {
                        styles::selected_style()
                    } else {
                        styles::platform_style(post.platform)
                    };
                    Cell::from(truncate(&post.title, col_width.max(4))).style(style)
                }
                None => Cell::from(""),
            }))
        })
        .collect();

    let table = Table::new(rows, [Constraint::Ratio(1, 7); 7])
        .header(header)
        .block(
            Block::default()
                .title(header_title_line(app))
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        );

    frame.render_widget(table, area);
}

fn header_title_line(app: &App) -> Line<'static> {
    let style = if app.posts.error.is_some() {
        styles::error_style()
    } else {
        styles::title_style()
    };
    Line::from(Span::styled(header(app), style))
}

fn render_post_list(frame: &mut Frame, app: &App, posts: &[&ScheduledPost], area: Rect) {
    let focused = matches!(app.focus, Focus::List);

    let header_row = Row::new(vec![
        Cell::from("Date"),
        Cell::from("Platform"),
        Cell::from("Title"),
        Cell::from("Status"),
    ])
    .style(styles::title_style())
    .height(1);

    let rows: Vec<Row> = posts
        .iter()
        .map(|post| {
            Row::new(vec![
                Cell::from(post.date.format("%b %d").to_string()),
                Cell::from(post.platform.as_str()).style(styles::platform_style(post.platform)),
                Cell::from(post.title.clone()),
                Cell::from(post.status.to_string()).style(styles::post_status_style(post.status)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(8),
        Constraint::Length(10),
        Constraint::Fill(1),
        Constraint::Length(10),
    ];

    let title = if app.view_mode == ViewMode::List {
        header(app)
    } else {
        format!(" Posts ({}) ", posts.len())
    };

    let mut table = Table::new(rows, widths)
        .header(header_row)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .row_highlight_style(styles::selected_style());

    if posts.is_empty() {
        let message = if app.posts.loading {
            "Loading posts..."
        } else if app.posts.error.is_some() {
            "Could not load posts"
        } else {
            "No posts in this period"
        };
        table = table.rows(vec![Row::new(vec![
            Cell::from(""),
            Cell::from(""),
            Cell::from(message).style(styles::muted_style()),
        ])]);
        frame.render_widget(table, area);
        return;
    }

    let mut state = TableState::default();
    state.select(Some(app.post_selection));
    frame.render_stateful_widget(table, area, &mut state);
}

fn field<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn render_post_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let lines = match app.selected_post() {
        Some(post) => post_lines(post),
        None => {
            let mut lines = vec![Line::from(Span::styled("No post selected", styles::muted_style()))];
            if let Some(ref error) = app.posts.error {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(error.clone(), styles::error_style())));
            }
            lines
        }
    };

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title(" Post ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(focused)),
        )
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn post_lines(post: &ScheduledPost) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(post.title.clone(), styles::title_style())),
        Line::from(""),
        field("Date:", format_long_date(post.date)),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Platform:"), styles::muted_style()),
            Span::styled(post.platform.as_str(), styles::platform_style(post.platform)),
        ]),
        Line::from(vec![
            Span::styled(format!("{:<10}", "Status:"), styles::muted_style()),
            Span::styled(post.status.to_string(), styles::post_status_style(post.status)),
        ]),
    ];

    if let Some(ref posted_at) = post.posted_at {
        lines.push(field("Posted:", posted_at.clone()));
    }

    if post.is_posted() {
        lines.push(field(
            "Activity:",
            format!("{} likes · {} comments · {} shares", post.likes, post.comments, post.shares),
        ));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Content", styles::highlight_style())));
    if post.content.trim().is_empty() {
        lines.push(Line::from(Span::styled("(empty)", styles::muted_style())));
    } else {
        lines.extend(post.content.lines().map(|l| Line::from(l.to_string())));
    }

    let attachments = post.attachments.as_deref().unwrap_or_default();
    if !attachments.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Attachments ({})", attachments.len()),
            styles::highlight_style(),
        )));
        for name in attachments {
            lines.push(Line::from(format!("  {}", name)));
        }
    }

    if let Some(ref picture) = post.full_picture {
        lines.push(field("Picture:", picture.clone()));
    }

    if !post.can_delete() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Published posts are read-only",
            styles::muted_style(),
        )));
    }
    lines
}

