//! Keyboard input handling for the TUI.
//!
//! Translates key events into `App` state changes. Requests are started
//! here but finish later through `App::check_background_tasks`.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use orcaflow_core::calendar::{Direction, ViewMode};

use crate::app::{
    can_add_email_char, can_add_password_char, can_add_search_char, App, AppState, Focus,
    LoginFocus, Tab, PAGE_SCROLL_SIZE,
};

/// Returns `Ok(true)` when the app should exit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::LoggingIn => return handle_login_input(app, key),
        AppState::Searching => return handle_search_input(app, key),
        AppState::Editing => return handle_form_input(app, key),
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            return Ok(false);
        }
        AppState::ConfirmingQuit => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    app.state = AppState::Quitting;
                    return Ok(true);
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    app.state = AppState::Normal;
                }
                _ => {}
            }
            return Ok(false);
        }
        AppState::ConfirmingDelete => {
            match key.code {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => app.confirm_delete(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_delete(),
                _ => {}
            }
            return Ok(false);
        }
        AppState::Normal | AppState::Quitting => {}
    }

    // Global keys
    match key.code {
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
        }
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
        }
        KeyCode::Char('1') => switch_tab(app, Tab::Planner),
        KeyCode::Char('2') => switch_tab(app, Tab::Contacts),
        KeyCode::Char('3') => switch_tab(app, Tab::Settings),
        KeyCode::BackTab => switch_tab(app, app.current_tab.prev()),
        KeyCode::Tab => {
            app.focus = match app.focus {
                Focus::List => Focus::Detail,
                Focus::Detail => Focus::List,
            };
        }
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('r') => app.refresh_current_tab(),
        KeyCode::Esc => {
            app.status_message = None;
            app.focus = Focus::List;
        }
        _ => match app.current_tab {
            Tab::Planner => handle_planner_input(app, key),
            Tab::Contacts => handle_contacts_input(app, key),
            Tab::Settings => handle_settings_input(app, key),
        },
    }

    Ok(false)
}

fn switch_tab(app: &mut App, tab: Tab) {
    app.current_tab = tab;
    app.focus = Focus::List;
    app.status_message = None;
}

/// Move a list selection by `delta` rows, clamped to `len`.
fn move_selection(selection: &mut usize, len: usize, delta: isize) {
    if len == 0 {
        *selection = 0;
        return;
    }
    let next = (*selection as isize + delta).clamp(0, len as isize - 1);
    *selection = next as usize;
}

/// Shared up/down/page/home/end handling. Returns true if the key was used.
fn handle_list_keys(selection: &mut usize, len: usize, code: KeyCode) -> bool {
    match code {
        KeyCode::Up | KeyCode::Char('k') => move_selection(selection, len, -1),
        KeyCode::Down | KeyCode::Char('j') => move_selection(selection, len, 1),
        KeyCode::PageUp => move_selection(selection, len, -(PAGE_SCROLL_SIZE as isize)),
        KeyCode::PageDown => move_selection(selection, len, PAGE_SCROLL_SIZE as isize),
        KeyCode::Home => *selection = 0,
        KeyCode::End => *selection = len.saturating_sub(1),
        _ => return false,
    }
    true
}

fn handle_planner_input(app: &mut App, key: KeyEvent) {
    let len = app.visible_posts().len();
    if handle_list_keys(&mut app.post_selection, len, key.code) {
        return;
    }

    match key.code {
        KeyCode::Char('m') => app.set_view_mode(ViewMode::Month),
        KeyCode::Char('w') => app.set_view_mode(ViewMode::Week),
        KeyCode::Char('l') => app.set_view_mode(ViewMode::List),
        KeyCode::Left | KeyCode::Char('[') => app.navigate(Direction::Prev),
        KeyCode::Right | KeyCode::Char(']') => app.navigate(Direction::Next),
        KeyCode::Char('t') => app.go_to_today(),
        KeyCode::Char('f') => app.cycle_platform_filter(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_post(),
        _ => {}
    }
}

fn handle_contacts_input(app: &mut App, key: KeyEvent) {
    let len = app.visible_contacts().len();
    if handle_list_keys(&mut app.contact_selection, len, key.code) {
        return;
    }

    match key.code {
        KeyCode::Char('/') => {
            app.state = AppState::Searching;
        }
        KeyCode::Left => switch_tab(app, app.current_tab.prev()),
        KeyCode::Right => switch_tab(app, app.current_tab.next()),
        KeyCode::Char('s') => app.cycle_contact_filter(),
        KeyCode::Char('a') => app.open_new_contact(),
        KeyCode::Char('e') | KeyCode::Enter => app.open_edit_contact(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_delete_contact(),
        _ => {}
    }
}

fn handle_settings_input(app: &mut App, key: KeyEvent) {
    let len = app.visible_pages().len();
    if handle_list_keys(&mut app.page_selection, len, key.code) {
        return;
    }

    match key.code {
        KeyCode::Left => switch_tab(app, app.current_tab.prev()),
        KeyCode::Right => switch_tab(app, app.current_tab.next()),
        KeyCode::Char('e') => app.open_brand_form(),
        KeyCode::Char('g') => app.open_custom_agent_form(),
        KeyCode::Char('c') => app.open_connect_page_form(),
        KeyCode::Char('d') | KeyCode::Delete => app.request_disconnect_page(),
        KeyCode::Char('X') => app.clear_local_data(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            app.state = AppState::Normal;
            app.contact_query.clear();
            app.contact_selection = 0;
        }
        KeyCode::Enter => {
            // Keep the query active
            app.state = AppState::Normal;
        }
        KeyCode::Backspace => {
            app.contact_query.pop();
            app.contact_selection = 0;
        }
        KeyCode::Char(c) => {
            if can_add_search_char(app.contact_query.chars().count(), c) {
                app.contact_query.push(c);
                app.contact_selection = 0;
            }
        }
        _ => {}
    }
    Ok(false)
}

fn handle_form_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.code == KeyCode::Esc {
        app.close_form();
        return Ok(false);
    }
    if key.code == KeyCode::Char('s') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.submit_form();
        return Ok(false);
    }

    let Some(form) = app.form.as_mut() else {
        app.state = AppState::Normal;
        return Ok(false);
    };
    if form.submitting {
        return Ok(false);
    }

    let on_text = form.focused_field().is_some_and(|f| f.is_editable_text());
    match key.code {
        KeyCode::Down | KeyCode::Tab => form.focus_next(),
        KeyCode::Up | KeyCode::BackTab => form.focus_prev(),
        KeyCode::Enter => {
            if form.on_button() {
                app.submit_form();
            } else {
                form.focus_next();
            }
        }
        KeyCode::Left if !on_text => form.cycle_focused(false),
        KeyCode::Right if !on_text => form.cycle_focused(true),
        KeyCode::Char(' ') if !on_text => form.cycle_focused(true),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.type_char(c),
        _ => {}
    }
    Ok(false)
}

fn handle_login_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match key.code {
        KeyCode::Esc => {
            // Nothing to show without a session
            app.state = AppState::Quitting;
            return Ok(true);
        }
        KeyCode::Down | KeyCode::Tab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Password,
                LoginFocus::Password => LoginFocus::Button,
                LoginFocus::Button => LoginFocus::Email,
            };
        }
        KeyCode::Up | KeyCode::BackTab => {
            app.login_focus = match app.login_focus {
                LoginFocus::Email => LoginFocus::Button,
                LoginFocus::Password => LoginFocus::Email,
                LoginFocus::Button => LoginFocus::Password,
            };
        }
        KeyCode::Enter => match app.login_focus {
            LoginFocus::Email => app.login_focus = LoginFocus::Password,
            LoginFocus::Password | LoginFocus::Button => {
                app.login_focus = LoginFocus::Button;
                app.submit_login();
            }
        },
        KeyCode::Backspace => match app.login_focus {
            LoginFocus::Email => {
                app.login_email.pop();
            }
            LoginFocus::Password => {
                app.login_password.pop();
            }
            LoginFocus::Button => {}
        },
        KeyCode::Char(c) => match app.login_focus {
            LoginFocus::Email => {
                if can_add_email_char(app.login_email.chars().count(), c) {
                    app.login_email.push(c);
                }
            }
            LoginFocus::Password => {
                if can_add_password_char(app.login_password.chars().count(), c) {
                    app.login_password.push(c);
                }
            }
            LoginFocus::Button => {}
        },
        _ => {}
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_app;

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::from(code)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_move_selection_clamps() {
        let mut selection = 0;
        move_selection(&mut selection, 5, -1);
        assert_eq!(selection, 0);
        move_selection(&mut selection, 5, 10);
        assert_eq!(selection, 4);
        move_selection(&mut selection, 0, 1);
        assert_eq!(selection, 0);
    }

    #[tokio::test]
    async fn test_number_keys_switch_tabs() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.current_tab, Tab::Contacts);
        press(&mut app, KeyCode::Char('3'));
        assert_eq!(app.current_tab, Tab::Settings);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.current_tab, Tab::Contacts);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_tab, Tab::Settings);
    }

    #[tokio::test]
    async fn test_login_focus_and_typing() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.login_email.clear();
        app.start_login();
        assert_eq!(app.login_focus, LoginFocus::Email);

        type_text(&mut app, "an@orca.vn");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "pw 1");
        assert_eq!(app.login_email, "an@orca.vn");
        assert_eq!(app.login_password, "pw 1");

        press(&mut app, KeyCode::Up);
        assert_eq!(app.login_focus, LoginFocus::Email);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.login_focus, LoginFocus::Button);
    }

    #[tokio::test]
    async fn test_escape_on_login_quits() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.start_login();
        assert!(press(&mut app, KeyCode::Esc));
        assert_eq!(app.state, AppState::Quitting);
    }

    #[tokio::test]
    async fn test_contact_search_flow() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.load_from_cache();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('/'));
        assert_eq!(app.state, AppState::Searching);
        type_text(&mut app, "startupz");
        assert_eq!(app.visible_contacts().len(), 1);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.contact_query, "startupz");

        press(&mut app, KeyCode::Char('/'));
        press(&mut app, KeyCode::Esc);
        assert!(app.contact_query.is_empty());
        assert_eq!(app.visible_contacts().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_confirmation_can_be_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.load_from_cache();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::ConfirmingDelete);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.contacts.len(), 3);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.contacts.len(), 2);
    }

    #[tokio::test]
    async fn test_add_contact_with_keyboard() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.load_from_cache();
        press(&mut app, KeyCode::Char('2'));

        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::Editing);
        // 'q' and digits are text here, not global keys
        type_text(&mut app, "Quynh");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "Vo");
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "quynh@orca.vn");

        // Status is a choice: typing is ignored, arrows cycle
        for _ in 0..4 {
            press(&mut app, KeyCode::Down);
        }
        type_text(&mut app, "x");
        press(&mut app, KeyCode::Right);
        assert_eq!(app.form.as_ref().unwrap().value("Status"), "Customer");

        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        handle_input(&mut app, ctrl_s).unwrap();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.contacts.len(), 4);
        assert_eq!(app.selected_contact().unwrap().full_name(), "Quynh Vo");
    }

    #[tokio::test]
    async fn test_escape_discards_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        app.load_from_cache();
        press(&mut app, KeyCode::Char('3'));

        press(&mut app, KeyCode::Char('g'));
        assert_eq!(app.state, AppState::Editing);
        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.form.as_ref().unwrap().value("Provider"), "OpenAI");

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);
        assert!(app.form.is_none());
        assert_eq!(app.custom_agent.platform, "Google Gemini");
    }

    #[tokio::test]
    async fn test_quit_requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = test_app(dir.path());
        assert!(!press(&mut app, KeyCode::Char('q')));
        assert_eq!(app.state, AppState::ConfirmingQuit);
        assert!(press(&mut app, KeyCode::Char('y')));
    }
}
