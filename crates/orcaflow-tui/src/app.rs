//! Application state management for the OrcaFlow dashboard.
//!
//! This module contains the core `App` struct that owns the auth session,
//! the domain services, cached data and all UI state. Network calls run on
//! spawned tasks and report back through an MPSC channel; `check_background_tasks`
//! applies their results on the UI loop.

use anyhow::Result;
use chrono::{Local, NaiveDate};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use orcaflow_core::api::{ApiClient, ApiError};
use orcaflow_core::auth::{token_store_for, AuthSession, AuthState};
use orcaflow_core::cache::{CacheAges, CacheManager};
use orcaflow_core::calendar::{self, DateRange, Direction, ViewMode};
use orcaflow_core::contacts::{self, ContactBook};
use orcaflow_core::fetch::{FetchState, Ticket};
use orcaflow_core::models::{
    BrandSettings, ConnectedPage, Contact, ContactStatus, CustomAgentSettings, GetPostsParams,
    Id, LoginResponse, ScheduledPost, Settings, SystemSettings, UserProfile, DATE_FORMAT,
};
use orcaflow_core::services::Services;
use orcaflow_core::Config;

use crate::form::{Form, FormKind};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for email input.
const MAX_EMAIL_LENGTH: usize = 100;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for the contact search box.
const MAX_SEARCH_LENGTH: usize = 64;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

const SIGNING_OUT_MESSAGE: &str = "Still signing out, try again in a moment";

// ============================================================================
// UI State Types
// ============================================================================

/// Main navigation tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Planner,
    Contacts,
    Settings,
}

impl Tab {
    pub fn title(&self) -> &'static str {
        match self {
            Tab::Planner => "Planner",
            Tab::Contacts => "Contacts",
            Tab::Settings => "Settings",
        }
    }

    /// Get the next tab (wrapping around)
    pub fn next(&self) -> Self {
        match self {
            Tab::Planner => Tab::Contacts,
            Tab::Contacts => Tab::Settings,
            Tab::Settings => Tab::Planner,
        }
    }

    /// Get the previous tab (wrapping around)
    pub fn prev(&self) -> Self {
        match self {
            Tab::Planner => Tab::Settings,
            Tab::Contacts => Tab::Planner,
            Tab::Settings => Tab::Contacts,
        }
    }
}

/// Current UI focus area (list/calendar panel or detail panel)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    Searching,
    ShowingHelp,
    LoggingIn,
    ConfirmingQuit,
    ConfirmingDelete,
    /// An edit form overlay is open
    Editing,
    Quitting,
}

/// Login form focus state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoginFocus {
    Email,
    Password,
    Button,
}

/// What the delete confirmation will remove.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingDelete {
    Post { id: i64, title: String },
    Contact { id: i64, name: String },
    Page { id: Id, name: String },
}

impl PendingDelete {
    pub fn prompt(&self) -> String {
        match self {
            PendingDelete::Post { title, .. } => format!("Delete post \"{}\"?", title),
            PendingDelete::Contact { name, .. } => format!("Delete contact {}?", name),
            PendingDelete::Page { name, .. } => format!("Disconnect page {}?", name),
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent from spawned API tasks back to the UI loop.
#[derive(Debug)]
enum BackgroundResult {
    /// `/auth/me` check of a stored token
    SessionChecked(Result<UserProfile, ApiError>),
    LoggedIn(Result<LoginResponse, ApiError>),
    LoggedOut,
    /// Posts for the window a ticket was issued for
    Posts(Ticket, DateRange, Result<Vec<ScheduledPost>, ApiError>),
    Settings(Option<Settings>),
    Pages(Ticket, Result<Vec<ConnectedPage>, ApiError>),
    PostDeleted(i64, Result<(), ApiError>),
    PageDisconnected(Id, Result<(), ApiError>),
    /// Echoes back what was sent once the tenant accepted it
    SettingsSaved(Result<(BrandSettings, SystemSettings), ApiError>),
    PageConnected(Result<(), ApiError>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub services: Services,
    pub session: AuthSession,
    pub cache: CacheManager,

    // UI State
    pub state: AppState,
    pub current_tab: Tab,
    pub focus: Focus,
    pub status_message: Option<String>,
    pub pending_delete: Option<PendingDelete>,
    pub form: Option<Form>,

    // Login form state
    pub login_email: String,
    pub login_password: String,
    pub login_focus: LoginFocus,
    pub login_error: Option<String>,
    pub login_in_progress: bool,
    pub logout_in_progress: bool,

    // Planner
    pub view_mode: ViewMode,
    pub current_date: NaiveDate,
    pub platform_filter: &'static str,
    pub posts: FetchState<Vec<ScheduledPost>>,
    pub cached_posts: Option<(DateRange, Vec<ScheduledPost>)>,
    pub post_selection: usize,

    // Contacts
    pub contacts: ContactBook,
    pub contact_selection: usize,
    pub contact_query: String,
    pub contact_status_filter: Option<ContactStatus>,

    // Settings
    pub settings: Option<Settings>,
    pub settings_loading: bool,
    pub local_brand: BrandSettings,
    pub custom_agent: CustomAgentSettings,
    pub pages: FetchState<Vec<ConnectedPage>>,
    pub cached_pages: Vec<ConnectedPage>,
    pub page_selection: usize,

    pub cache_ages: CacheAges,

    // Background task channel
    results_tx: mpsc::Sender<BackgroundResult>,
    results_rx: mpsc::Receiver<BackgroundResult>,
}

impl App {
    /// Create a new application instance from the loaded configuration
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        debug!(?cache_dir, "Cache directory configured");

        let tokens = token_store_for(config.token_backend, cache_dir.clone());
        let client = ApiClient::with_timeout(config.api_base_url(), tokens, config.request_timeout())?;
        let cache = CacheManager::new(cache_dir)?;

        Ok(Self::with_parts(config, Services::new(client), cache))
    }

    pub fn with_parts(config: Config, services: Services, cache: CacheManager) -> Self {
        let (results_tx, results_rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session = AuthSession::new(services.auth.clone());

        let login_email = config.login_email().unwrap_or_default();
        let login_password = Config::login_password().unwrap_or_default();
        let view_mode = config.default_view;

        Self {
            config,
            services,
            session,
            cache,

            state: AppState::Normal,
            current_tab: Tab::Planner,
            focus: Focus::List,
            status_message: None,
            pending_delete: None,
            form: None,

            login_email,
            login_password,
            login_focus: LoginFocus::Email,
            login_error: None,
            login_in_progress: false,
            logout_in_progress: false,

            view_mode,
            current_date: today(),
            platform_filter: calendar::PLATFORM_FILTERS[0],
            posts: FetchState::new(),
            cached_posts: None,
            post_selection: 0,

            contacts: ContactBook::default(),
            contact_selection: 0,
            contact_query: String::new(),
            contact_status_filter: None,

            settings: None,
            settings_loading: false,
            local_brand: BrandSettings::default(),
            custom_agent: CustomAgentSettings::default(),
            pages: FetchState::new(),
            cached_pages: Vec::new(),
            page_selection: 0,

            cache_ages: CacheAges::default(),

            results_tx,
            results_rx,
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// Validate a stored token in the background, or go straight to the login form.
    pub fn start_session_check(&mut self) {
        if !self.session.begin_initialize() {
            self.start_login();
            return;
        }

        self.status_message = Some("Checking session...".to_string());
        let auth = self.services.auth.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = auth.current_user().await;
            Self::send_result(&tx, BackgroundResult::SessionChecked(result)).await;
        });
    }

    /// Start the login process (show login overlay)
    pub fn start_login(&mut self) {
        self.state = AppState::LoggingIn;
        self.form = None;
        self.pending_delete = None;
        self.login_focus = if self.login_email.is_empty() {
            LoginFocus::Email
        } else {
            LoginFocus::Password
        };
        self.login_in_progress = false;
    }

    /// Submit the login form in the background.
    pub fn submit_login(&mut self) {
        if self.login_in_progress {
            return;
        }
        if self.logout_in_progress {
            self.login_error = Some(SIGNING_OUT_MESSAGE.to_string());
            return;
        }
        let email = self.login_email.trim().to_string();
        let password = self.login_password.clone();

        if email.is_empty() || password.is_empty() {
            self.login_error = Some("Email and password are required".to_string());
            return;
        }

        self.login_error = None;
        self.login_in_progress = true;

        let auth = self.services.auth.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = auth.login(&email, &password).await;
            Self::send_result(&tx, BackgroundResult::LoggedIn(result)).await;
        });
    }

    /// Leave the dashboard now; the server call and token removal finish in the background.
    pub fn logout(&mut self) {
        if self.logout_in_progress {
            return;
        }
        info!("Logging out");
        self.session.begin_logout();
        self.logout_in_progress = true;

        let auth = self.services.auth.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            auth.logout().await;
            Self::send_result(&tx, BackgroundResult::LoggedOut).await;
        });
        self.clear_remote_data();
        self.login_password.clear();
        self.login_error = None;
        self.start_login();
    }

    fn on_authenticated(&mut self) {
        self.login_password.clear();
        self.login_error = None;
        self.login_in_progress = false;
        self.state = AppState::Normal;
        if let Some(user) = self.session.user() {
            self.status_message = Some(format!("Signed in as {}", user.display_name()));
            if self.config.last_email.as_deref() != Some(user.email.as_str()) && !user.email.is_empty() {
                self.config.last_email = Some(user.email.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
            }
        }
        self.refresh_all();
    }

    fn clear_remote_data(&mut self) {
        self.posts.reset();
        self.pages.reset();
        self.settings = None;
        self.settings_loading = false;
        self.post_selection = 0;
        self.page_selection = 0;
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Load local data: contacts, brand fallback, agent settings and last fetched posts/pages.
    pub fn load_from_cache(&mut self) {
        self.contacts = ContactBook::load(&self.cache);

        match self.cache.load_brand_settings() {
            Ok(Some(cached)) => self.local_brand = cached.data,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load cached brand settings"),
        }

        match self.cache.load_custom_agent() {
            Ok(Some(cached)) => self.custom_agent = cached.data,
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to load custom agent settings"),
        }

        if let Ok(Some(cached)) = self.cache.load_posts() {
            let window = cached.data;
            let parse = |s: &str| NaiveDate::parse_from_str(s, DATE_FORMAT).ok();
            if let (Some(start), Some(end)) = (parse(&window.start), parse(&window.end)) {
                self.cached_posts = Some((DateRange { start, end }, window.posts));
            }
        }

        if let Ok(Some(cached)) = self.cache.load_social_pages() {
            self.cached_pages = cached.data;
        }

        self.cache_ages = self.cache.get_cache_ages();
    }

    pub fn clear_local_data(&mut self) {
        if let Err(e) = self.cache.clear_all() {
            warn!(error = %e, "Failed to clear local data");
            self.status_message = Some(format!("Failed to clear local data: {}", e));
            return;
        }
        self.contacts = ContactBook::default();
        self.local_brand = BrandSettings::default();
        self.custom_agent = CustomAgentSettings::default();
        self.cached_posts = None;
        self.cached_pages.clear();
        self.cache_ages = self.cache.get_cache_ages();
        self.status_message = Some("Local data cleared".to_string());
    }

    // =========================================================================
    // Background Data Refresh
    // =========================================================================

    /// Helper to send results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<BackgroundResult>, result: BackgroundResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send background result - channel closed");
        }
    }

    pub fn refresh_all(&mut self) {
        self.refresh_posts();
        self.refresh_settings();
    }

    /// Refresh whatever the current tab shows.
    pub fn refresh_current_tab(&mut self) {
        match self.current_tab {
            Tab::Planner => self.refresh_posts(),
            Tab::Contacts => {
                self.contacts = ContactBook::load(&self.cache);
                self.status_message = Some("Contacts reloaded".to_string());
            }
            Tab::Settings => self.refresh_settings(),
        }
    }

    pub fn current_range(&self) -> DateRange {
        calendar::date_range(self.view_mode, self.current_date, today())
    }

    pub fn refresh_posts(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        let range = self.current_range();
        let params = GetPostsParams::for_range(range.start, range.end).with_platform(self.platform_filter);
        let ticket = self.posts.begin();

        let planner = self.services.planner.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = planner.list_posts(&params).await.map(|r| r.posts);
            Self::send_result(&tx, BackgroundResult::Posts(ticket, range, result)).await;
        });
    }

    /// Tenant settings and connected pages, fetched together.
    pub fn refresh_settings(&mut self) {
        if !self.is_authenticated() {
            return;
        }
        self.settings_loading = true;
        let ticket = self.pages.begin();
        let settings = self.services.settings.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let (tenant, pages) = futures::future::join(settings.get_settings(), settings.list_pages()).await;
            Self::send_result(&tx, BackgroundResult::Settings(tenant)).await;
            Self::send_result(&tx, BackgroundResult::Pages(ticket, pages)).await;
        });
    }

    /// Check for completed background tasks and the unauthorized signal.
    pub fn check_background_tasks(&mut self) {
        let mut results = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            results.push(result);
        }

        for result in results {
            self.process_result(result);
        }

        if self.session.poll_events() {
            warn!("Session ended by server");
            self.clear_remote_data();
            self.login_error = Some(SESSION_EXPIRED_MESSAGE.to_string());
            self.start_login();
        }
    }

    fn process_result(&mut self, result: BackgroundResult) {
        match result {
            BackgroundResult::SessionChecked(result) => {
                self.session.finish_initialize(result);
                self.status_message = None;
                if self.is_authenticated() {
                    self.on_authenticated();
                } else {
                    self.start_login();
                }
            }
            BackgroundResult::LoggedIn(result) => {
                self.login_in_progress = false;
                match self.session.finish_login(result) {
                    Ok(user) => {
                        info!(email = %user.email, "Login successful");
                        self.on_authenticated();
                    }
                    Err(e) => {
                        error!(error = %e, "Login failed");
                        self.login_error = Some(e.message);
                    }
                }
            }
            BackgroundResult::LoggedOut => {
                debug!("Server logout finished");
                self.session.finish_logout();
                self.logout_in_progress = false;
                if self.login_error.as_deref() == Some(SIGNING_OUT_MESSAGE) {
                    self.login_error = None;
                }
            }
            BackgroundResult::Posts(ticket, range, result) => {
                if !self.posts.complete(ticket, result) {
                    debug!("Dropping stale posts response");
                    return;
                }
                if let Some(ref posts) = self.posts.data {
                    let start = range.start.format(DATE_FORMAT).to_string();
                    let end = range.end.format(DATE_FORMAT).to_string();
                    if let Err(e) = self.cache.save_posts(&start, &end, posts) {
                        warn!(error = %e, "Failed to cache posts");
                    }
                    self.cached_posts = Some((range, posts.clone()));
                }
                self.clamp_post_selection();
                self.cache_ages = self.cache.get_cache_ages();
            }
            BackgroundResult::Settings(settings) => {
                self.settings_loading = false;
                if let Some(ref s) = settings {
                    if let Err(e) = self.cache.save_brand_settings(&s.brand_settings) {
                        warn!(error = %e, "Failed to cache brand settings");
                    }
                    self.local_brand = s.brand_settings.clone();
                }
                self.settings = settings;
            }
            BackgroundResult::Pages(ticket, result) => {
                if !self.pages.complete(ticket, result) {
                    debug!("Dropping stale pages response");
                    return;
                }
                if let Some(ref pages) = self.pages.data {
                    if let Err(e) = self.cache.save_social_pages(pages) {
                        warn!(error = %e, "Failed to cache social pages");
                    }
                    self.cached_pages = pages.clone();
                }
                self.page_selection = self.page_selection.min(self.visible_pages().len().saturating_sub(1));
                self.cache_ages = self.cache.get_cache_ages();
            }
            BackgroundResult::PostDeleted(id, result) => match result {
                Ok(()) => {
                    if let Some(ref mut posts) = self.posts.data {
                        posts.retain(|p| p.id != id);
                    }
                    self.clamp_post_selection();
                    self.status_message = Some("Post deleted".to_string());
                }
                Err(e) => {
                    self.status_message = Some(format!("Delete failed: {}", e.message()));
                }
            },
            BackgroundResult::PageDisconnected(id, result) => match result {
                Ok(()) => {
                    if let Some(ref mut pages) = self.pages.data {
                        pages.retain(|p| p.id != id);
                    }
                    self.cached_pages.retain(|p| p.id != id);
                    self.page_selection = self.page_selection.min(self.visible_pages().len().saturating_sub(1));
                    self.status_message = Some("Page disconnected".to_string());
                }
                Err(e) => {
                    self.status_message = Some(format!("Disconnect failed: {}", e.message()));
                }
            },
            BackgroundResult::SettingsSaved(result) => match result {
                Ok((brand, system)) => {
                    match self.settings {
                        Some(ref mut settings) => {
                            settings.brand_settings = brand;
                            settings.system_settings = system;
                        }
                        None => self.refresh_settings(),
                    }
                    self.status_message = Some("Settings saved".to_string());
                }
                Err(e) => {
                    self.status_message = Some(format!("Settings saved locally only: {}", e.message()));
                }
            },
            BackgroundResult::PageConnected(result) => {
                let open = matches!(self.form, Some(ref f) if f.kind == FormKind::ConnectPage);
                match result {
                    Ok(()) => {
                        if open {
                            self.close_form();
                        }
                        self.status_message = Some("Page connected".to_string());
                        self.refresh_settings();
                    }
                    Err(e) => match self.form {
                        Some(ref mut form) if open => {
                            form.submitting = false;
                            form.error = Some(e.message());
                        }
                        _ => self.status_message = Some(format!("Connect failed: {}", e.message())),
                    },
                }
            }
        }
    }

    // =========================================================================
    // Planner
    // =========================================================================

    /// Posts for the current window, sorted by date. Falls back to the cached
    /// window while a fetch is in flight or failed.
    pub fn visible_posts(&self) -> Vec<&ScheduledPost> {
        let range = self.current_range();
        let source: &[ScheduledPost] = match (&self.posts.data, &self.cached_posts) {
            (Some(posts), _) => posts.as_slice(),
            (None, Some((cached_range, posts))) if *cached_range == range => posts.as_slice(),
            _ => &[],
        };

        let mut posts: Vec<&ScheduledPost> = source
            .iter()
            .filter(|p| range.contains(p.date))
            .filter(|p| calendar::matches_platform_filter(p, self.platform_filter))
            .collect();
        posts.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
        posts
    }

    pub fn showing_cached_posts(&self) -> bool {
        self.posts.data.is_none() && !self.visible_posts().is_empty()
    }

    pub fn selected_post(&self) -> Option<&ScheduledPost> {
        self.visible_posts().get(self.post_selection).copied()
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.view_mode != mode {
            self.view_mode = mode;
            self.post_selection = 0;
            self.refresh_posts();
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        let next = calendar::navigate(self.view_mode, self.current_date, direction);
        if next != self.current_date {
            self.current_date = next;
            self.post_selection = 0;
            self.refresh_posts();
        }
    }

    pub fn go_to_today(&mut self) {
        self.current_date = today();
        self.post_selection = 0;
        self.refresh_posts();
    }

    pub fn cycle_platform_filter(&mut self) {
        self.platform_filter = calendar::next_platform_filter(self.platform_filter);
        self.post_selection = 0;
        self.refresh_posts();
    }

    /// Ask to delete the selected post. Published posts are refused.
    pub fn request_delete_post(&mut self) {
        let Some(post) = self.selected_post() else {
            return;
        };
        if !post.can_delete() {
            self.status_message = Some("Published posts cannot be deleted".to_string());
            return;
        }
        self.pending_delete = Some(PendingDelete::Post {
            id: post.id,
            title: post.title.clone(),
        });
        self.state = AppState::ConfirmingDelete;
    }

    fn clamp_post_selection(&mut self) {
        let len = self.visible_posts().len();
        self.post_selection = self.post_selection.min(len.saturating_sub(1));
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    pub fn visible_contacts(&self) -> Vec<&Contact> {
        self.contacts
            .filtered(self.contact_status_filter, &self.contact_query)
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.visible_contacts().get(self.contact_selection).copied()
    }

    pub fn cycle_contact_filter(&mut self) {
        self.contact_status_filter = contacts::next_status_filter(self.contact_status_filter);
        self.contact_selection = 0;
    }

    pub fn request_delete_contact(&mut self) {
        if let Some(contact) = self.selected_contact() {
            self.pending_delete = Some(PendingDelete::Contact {
                id: contact.id,
                name: contact.full_name(),
            });
            self.state = AppState::ConfirmingDelete;
        }
    }

    // =========================================================================
    // Settings
    // =========================================================================

    /// Brand settings to show: the tenant record when loaded, else the local copy.
    pub fn brand_settings(&self) -> &BrandSettings {
        self.settings
            .as_ref()
            .map(|s| &s.brand_settings)
            .unwrap_or(&self.local_brand)
    }

    pub fn system_settings(&self) -> Option<&SystemSettings> {
        self.settings.as_ref().map(|s| &s.system_settings)
    }

    pub fn visible_pages(&self) -> &[ConnectedPage] {
        match self.pages.data {
            Some(ref pages) => pages,
            None => &self.cached_pages,
        }
    }

    pub fn selected_page(&self) -> Option<&ConnectedPage> {
        self.visible_pages().get(self.page_selection)
    }

    pub fn request_disconnect_page(&mut self) {
        if let Some(page) = self.selected_page() {
            self.pending_delete = Some(PendingDelete::Page {
                id: page.id.clone(),
                name: page.name.clone(),
            });
            self.state = AppState::ConfirmingDelete;
        }
    }

    // =========================================================================
    // Edit Forms
    // =========================================================================

    fn open_form(&mut self, form: Form) {
        self.form = Some(form);
        self.state = AppState::Editing;
    }

    pub fn close_form(&mut self) {
        self.form = None;
        self.state = AppState::Normal;
    }

    pub fn open_new_contact(&mut self) {
        self.open_form(Form::contact(None));
    }

    pub fn open_edit_contact(&mut self) {
        if let Some(contact) = self.selected_contact() {
            let form = Form::contact(Some(contact));
            self.open_form(form);
        }
    }

    pub fn open_brand_form(&mut self) {
        let system = self.system_settings().cloned().unwrap_or_default();
        let form = Form::brand(self.brand_settings(), &system);
        self.open_form(form);
    }

    pub fn open_custom_agent_form(&mut self) {
        let form = Form::custom_agent(&self.custom_agent);
        self.open_form(form);
    }

    pub fn open_connect_page_form(&mut self) {
        if !self.is_authenticated() {
            self.status_message = Some("Sign in to connect pages".to_string());
            return;
        }
        self.open_form(Form::connect_page());
    }

    /// Save the open form. Validation problems keep it open with an error.
    pub fn submit_form(&mut self) {
        let Some(form) = self.form.take() else {
            return;
        };
        if form.submitting {
            self.form = Some(form);
            return;
        }

        match form.kind {
            FormKind::NewContact | FormKind::EditContact(_) => self.save_contact_form(form),
            FormKind::Brand => self.save_brand_form(&form),
            FormKind::CustomAgent => {
                self.custom_agent = form.to_custom_agent();
                match self.cache.save_custom_agent(&self.custom_agent) {
                    Ok(()) => self.status_message = Some("Custom agent saved".to_string()),
                    Err(e) => {
                        warn!(error = %e, "Failed to save custom agent settings");
                        self.status_message = Some(format!("Failed to save custom agent: {}", e));
                    }
                }
                self.close_form();
            }
            FormKind::ConnectPage => self.connect_page(form),
        }
    }

    fn save_contact_form(&mut self, mut form: Form) {
        let result = match form.kind {
            FormKind::EditContact(id) => match self.contacts.get(id).cloned() {
                Some(existing) => self.contacts.update(form.to_contact(existing)).map(|_| id),
                None => Err(contacts::ContactError::NotFound(id)),
            },
            _ => self.contacts.add(form.to_contact(Contact::default())),
        };

        match result {
            Ok(id) => {
                if let Err(e) = self.contacts.save(&self.cache) {
                    warn!(error = %e, "Failed to save contacts");
                }
                let name = self.contacts.get(id).map(|c| c.full_name()).unwrap_or_default();
                self.status_message = Some(format!("Saved {}", name));
                self.select_contact(id);
                self.close_form();
            }
            Err(e) => {
                form.error = Some(e.to_string());
                self.form = Some(form);
            }
        }
    }

    /// Point the contact list at `id`, clearing filters that would hide it.
    fn select_contact(&mut self, id: i64) {
        if !self.visible_contacts().iter().any(|c| c.id == id) {
            self.contact_query.clear();
            self.contact_status_filter = None;
        }
        self.contact_selection = self
            .visible_contacts()
            .iter()
            .position(|c| c.id == id)
            .unwrap_or(0);
    }

    /// The local copy is updated right away; the tenant record follows when signed in.
    fn save_brand_form(&mut self, form: &Form) {
        let mut brand = self.brand_settings().clone();
        let mut system = self.system_settings().cloned().unwrap_or_default();
        form.apply_brand(&mut brand, &mut system);

        if let Err(e) = self.cache.save_brand_settings(&brand) {
            warn!(error = %e, "Failed to cache brand settings");
        }
        self.local_brand = brand.clone();
        self.close_form();

        if !self.is_authenticated() {
            self.status_message = Some("Saved locally".to_string());
            return;
        }

        self.status_message = Some("Saving settings...".to_string());
        let settings = self.services.settings.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = settings.update(&brand, &system).await.map(|_| (brand, system));
            Self::send_result(&tx, BackgroundResult::SettingsSaved(result)).await;
        });
    }

    fn connect_page(&mut self, mut form: Form) {
        let platform = form.value("Platform").to_string();
        let token = form.value("Access token").trim().to_string();
        if token.is_empty() {
            form.error = Some("An access token is required".to_string());
            self.form = Some(form);
            return;
        }

        form.error = None;
        form.submitting = true;
        self.form = Some(form);

        let settings = self.services.settings.clone();
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = settings.connect_page(&platform, &token).await;
            Self::send_result(&tx, BackgroundResult::PageConnected(result)).await;
        });
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    pub fn confirm_delete(&mut self) {
        self.state = AppState::Normal;
        let Some(pending) = self.pending_delete.take() else {
            return;
        };

        match pending {
            PendingDelete::Post { id, .. } => {
                let planner = self.services.planner.clone();
                let tx = self.results_tx.clone();
                self.status_message = Some("Deleting post...".to_string());
                tokio::spawn(async move {
                    let result = planner.delete_post(id).await;
                    Self::send_result(&tx, BackgroundResult::PostDeleted(id, result)).await;
                });
            }
            PendingDelete::Contact { id, name } => {
                match self.contacts.remove(id) {
                    Ok(_) => {
                        if let Err(e) = self.contacts.save(&self.cache) {
                            warn!(error = %e, "Failed to save contacts");
                        }
                        self.status_message = Some(format!("Deleted {}", name));
                    }
                    Err(e) => self.status_message = Some(e.to_string()),
                }
                let len = self.visible_contacts().len();
                self.contact_selection = self.contact_selection.min(len.saturating_sub(1));
            }
            PendingDelete::Page { id, .. } => {
                let settings = self.services.settings.clone();
                let tx = self.results_tx.clone();
                self.status_message = Some("Disconnecting page...".to_string());
                tokio::spawn(async move {
                    let result = settings.disconnect_page(&id).await;
                    Self::send_result(&tx, BackgroundResult::PageDisconnected(id, result)).await;
                });
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        self.state = AppState::Normal;
    }

    pub fn user_label(&self) -> String {
        match self.session.state() {
            AuthState::Authenticated(user) => user.display_name().to_string(),
            AuthState::Checking => "checking session...".to_string(),
            AuthState::Unauthenticated => "signed out".to_string(),
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_email_char(current_len: usize, c: char) -> bool {
    current_len < MAX_EMAIL_LENGTH && is_valid_input_char(c) && !c.is_whitespace()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_search_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SEARCH_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================

/// App over an in-memory token store and a cache in `dir`.
#[cfg(test)]
pub(crate) fn test_app_at(dir: &std::path::Path, base_url: &str) -> App {
    use std::sync::Arc;

    let store = Arc::new(orcaflow_core::auth::MemoryTokenStore::with_token("jwt"));
    let client = ApiClient::new(base_url, store).unwrap();
    let cache = CacheManager::new(dir.to_path_buf()).unwrap();
    let mut config = Config::default();
    // Matches the test profile so login never writes the real config file
    config.last_email = Some("hoa@orcaflow.test".to_string());
    let mut app = App::with_parts(config, Services::new(client), cache);
    app.current_date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
    app
}

/// Nothing listens on this port, so spawned requests fail fast.
#[cfg(test)]
pub(crate) fn test_app(dir: &std::path::Path) -> App {
    test_app_at(dir, "http://127.0.0.1:1")
}
