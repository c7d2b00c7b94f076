use std::{io, sync::Arc, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::{spawn, sync::mpsc};
use tracing::{error, info};

use gamedeals_core::{
    config::AppConfig,
    models::{validate_comment, Comment, Game, ServerInfo, UserProfile},
    nav::{HistoryEntry, Route, SharedHistory},
    profile::{ApiUniquenessChecker, FieldCheck, ProfileForm},
    search::{
        sentinel_in_view, ApiSearchBackend, QueryParams, SearchController, SearchPhase,
        SearchViewState, SessionStore, PRICE_CEILING,
    },
    services::{
        CategoryService, CommentService, GameService, SearchService, ServerService, UserService,
        VideoService,
    },
    state::AppState,
};

use crate::modals::{
    AddServerModal, CategoryPickerModal, ConfirmAction, ConfirmModal, FilterModal, ModalOutcome,
    PickerTarget,
};

const TICK_RATE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct Theme {
    pub primary_fg: Color,
    pub accent: Color,
    pub accent_alt: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            accent_alt: Color::Blue,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

/// One clonable bundle of every REST service.
#[derive(Clone)]
pub struct Services {
    pub search: SearchService,
    pub games: GameService,
    pub categories: CategoryService,
    pub comments: CommentService,
    pub servers: ServerService,
    pub users: UserService,
    pub videos: VideoService,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Main,
    Search,
    Detail,
    Profile,
    MyServer,
    Login,
    Info,
}

/// Front-page shelves.
struct Shelves {
    discounted: Vec<Game>,
    popular: Vec<Game>,
}

/// Everything the detail screen needs, loaded in one task.
struct DetailBundle {
    game: Game,
    prices: Vec<gamedeals_core::models::PriceRecord>,
    videos: Vec<gamedeals_core::models::Video>,
    comments: Vec<Comment>,
    servers: Vec<ServerInfo>,
}

enum AppEvent {
    Input(Event),
    Tick,
    StateReady(Result<(), String>),
    ShelvesLoaded(Result<Shelves, String>),
    DetailLoaded(u64, Box<Result<DetailBundle, String>>),
    CommentsRefreshed(u64, Result<Vec<Comment>, String>),
    MyServersLoaded(Result<Vec<ServerInfo>, String>),
    GameServersRefreshed(u64, Result<Vec<ServerInfo>, String>),
    ProfileSaved(Result<UserProfile, String>),
    LoginFinished(Result<(), String>),
}

/// Mounted search view: the controller plus its terminal-side chrome.
struct SearchScreen {
    controller: SearchController,
    input: String,
    editing: bool,
    selected: usize,
    scroll: usize,
    list_rows: usize,
}

impl SearchScreen {
    fn mount(
        backend: Arc<ApiSearchBackend>,
        session: SessionStore,
        history: SharedHistory,
        params: Option<&QueryParams>,
    ) -> Self {
        let controller = SearchController::new(backend, session, history);
        controller.mount(params);
        let input = controller.state().query;
        Self {
            controller,
            input,
            editing: false,
            selected: 0,
            scroll: 0,
            list_rows: 1,
        }
    }

    /// Clamp selection/scroll to the viewport and poke the pagination
    /// sentinel when the window reaches past the loaded results.
    fn sync_window(&mut self, result_count: usize) {
        if result_count == 0 {
            self.selected = 0;
            self.scroll = 0;
        } else if self.selected >= result_count {
            self.selected = result_count - 1;
        }
        let rows = self.list_rows.max(1);
        if self.selected < self.scroll {
            self.scroll = self.selected;
        } else if self.selected >= self.scroll + rows {
            self.scroll = self.selected + 1 - rows;
        }
        if sentinel_in_view(self.scroll, rows, result_count) {
            self.controller.sentinel_visible();
        }
    }
}

struct DetailScreen {
    game_id: u64,
    bundle: Option<DetailBundle>,
    error: Option<String>,
    loading: bool,
    comment_cursor: usize,
    comment_input: String,
    comment_error: Option<String>,
    editing_comment: bool,
}

impl DetailScreen {
    fn new(game_id: u64) -> Self {
        Self {
            game_id,
            bundle: None,
            error: None,
            loading: true,
            comment_cursor: 0,
            comment_input: String::new(),
            comment_error: None,
            editing_comment: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProfileField {
    Nickname,
    Discord,
}

struct ProfileScreen {
    form: ProfileForm,
    focus: ProfileField,
    saving: bool,
}

#[derive(Default)]
struct MyServerScreen {
    servers: Vec<ServerInfo>,
    cursor: usize,
    loading: bool,
    error: Option<String>,
}

enum Modal {
    Confirm(ConfirmModal),
    AddServer(AddServerModal),
    CategoryPicker(CategoryPickerModal),
    Filter(FilterModal),
}

/// The terminal client. Owns the event loop, screen stack, and modals.
pub struct GameDealsApp {
    config: AppConfig,
    services: Services,
    app_state: AppState,
    history: SharedHistory,
    session: SessionStore,
    search_backend: Arc<ApiSearchBackend>,

    screen: Screen,
    main_input: String,
    main_editing: bool,
    main_cursor: usize,
    main_on_popular: bool,
    shelves: Option<Shelves>,

    search: Option<SearchScreen>,
    detail: Option<DetailScreen>,
    profile: Option<ProfileScreen>,
    my_server: MyServerScreen,

    modal: Option<Modal>,
    status: String,
    should_quit: bool,
    theme: Theme,
    event_tx: Option<mpsc::Sender<AppEvent>>,
}

impl GameDealsApp {
    pub fn new(
        config: AppConfig,
        services: Services,
        app_state: AppState,
        history: SharedHistory,
        session: SessionStore,
    ) -> Self {
        let search_backend = Arc::new(ApiSearchBackend::new(services.search.clone()));
        Self {
            config,
            services,
            app_state,
            history,
            session,
            search_backend,
            screen: Screen::Main,
            main_input: String::new(),
            main_editing: false,
            main_cursor: 0,
            main_on_popular: false,
            shelves: None,
            search: None,
            detail: None,
            profile: None,
            my_server: MyServerScreen::default(),
            modal: None,
            status: "Loading…".to_string(),
            should_quit: false,
            theme: Theme::default(),
            event_tx: None,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
            .context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx.clone());

        self.history.lock().push(Route::Main, "");
        self.start_app_state_load();
        self.load_shelves();

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }
            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
            if self.should_quit {
                break;
            }
        }

        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        Ok(())
    }

    fn sender(&self) -> Option<mpsc::Sender<AppEvent>> {
        self.event_tx.clone()
    }

    fn start_app_state_load(&self) {
        let Some(tx) = self.sender() else { return };
        let state = self.app_state.clone();
        let categories = self.services.categories.clone();
        let users = self.services.users.clone();
        spawn(async move {
            let result = state
                .initialize(&categories, &users)
                .await
                .map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::StateReady(result)).await;
        });
    }

    fn load_shelves(&self) {
        let Some(tx) = self.sender() else { return };
        let games = self.services.games.clone();
        spawn(async move {
            let result = async {
                let discounted = games.discounted_shelf().await?;
                let popular = games.popular_shelf().await?;
                Ok::<_, gamedeals_core::ApiError>(Shelves { discounted, popular })
            }
            .await
            .map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::ShelvesLoaded(result)).await;
        });
    }

    fn load_detail(&self, game_id: u64) {
        let Some(tx) = self.sender() else { return };
        let services = self.services.clone();
        spawn(async move {
            let result = async {
                let game = services.games.detail(game_id).await?;
                // Side sections degrade to empty; the page still renders.
                let prices = services.games.price_history(game_id).await.unwrap_or_default();
                let videos = services.videos.list(game_id).await.unwrap_or_default();
                let comments = services.comments.list(game_id).await.unwrap_or_default();
                let servers = services.servers.list(game_id).await.unwrap_or_default();
                Ok::<_, gamedeals_core::ApiError>(DetailBundle {
                    game,
                    prices,
                    videos,
                    comments,
                    servers,
                })
            }
            .await
            .map_err(|err| err.to_string());
            let _ = tx
                .send(AppEvent::DetailLoaded(game_id, Box::new(result)))
                .await;
        });
    }

    fn load_my_servers(&mut self) {
        self.my_server.loading = true;
        self.my_server.error = None;
        let Some(tx) = self.sender() else { return };
        let servers = self.services.servers.clone();
        spawn(async move {
            let result = servers.mine().await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::MyServersLoaded(result)).await;
        });
    }

    fn refresh_comments(&self, game_id: u64) {
        let Some(tx) = self.sender() else { return };
        let comments = self.services.comments.clone();
        spawn(async move {
            let result = comments.list(game_id).await.map_err(|err| err.to_string());
            let _ = tx.send(AppEvent::CommentsRefreshed(game_id, result)).await;
        });
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    // ---- navigation -------------------------------------------------

    fn navigate(&mut self, route: Route, query: String) {
        self.history.lock().push(route.clone(), query.clone());
        self.enter(route, query);
    }

    fn go_back(&mut self) {
        let destination = self.history.lock().back();
        match destination {
            Some(HistoryEntry { route, query }) => self.enter(route, query),
            None => self.should_quit = true,
        }
    }

    /// Switch to a route's screen, mounting and unmounting views as
    /// needed. The search view is rebuilt from the entry's query string.
    fn enter(&mut self, route: Route, query: String) {
        // Leaving the search screen tears its controller down.
        if self.screen == Screen::Search && route != Route::Search {
            self.search = None;
        }
        if self.screen == Screen::Profile && route != Route::Profile {
            if let Some(profile) = &self.profile {
                profile.form.cancel_pending();
            }
            self.profile = None;
        }
        self.modal = None;
        match route {
            Route::Root | Route::Main => {
                self.screen = Screen::Main;
                if self.shelves.is_none() {
                    self.load_shelves();
                }
            }
            Route::Search => {
                let params = QueryParams::parse(&query);
                self.search = Some(SearchScreen::mount(
                    Arc::clone(&self.search_backend),
                    self.session.clone(),
                    self.history.clone(),
                    Some(&params),
                ));
                self.screen = Screen::Search;
            }
            Route::GameDetail(id) => {
                self.detail = Some(DetailScreen::new(id));
                self.load_detail(id);
                self.screen = Screen::Detail;
            }
            Route::Profile => {
                match self.app_state.profile() {
                    Some(profile) => {
                        let checker =
                            Arc::new(ApiUniquenessChecker::new(self.services.users.clone()));
                        self.profile = Some(ProfileScreen {
                            form: ProfileForm::new(checker, profile),
                            focus: ProfileField::Nickname,
                            saving: false,
                        });
                        self.screen = Screen::Profile;
                    }
                    None => {
                        self.set_status("Sign in to edit your profile");
                        self.history.lock().replace(Route::Login, "");
                        self.enter(Route::Login, String::new());
                    }
                }
            }
            Route::MyServer => {
                self.load_my_servers();
                self.screen = Screen::MyServer;
            }
            Route::Login => self.screen = Screen::Login,
            Route::Info => self.screen = Screen::Info,
        }
    }

    // ---- event loop -------------------------------------------------

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    self.set_status(format!("Error: {err}"));
                }
                true
            }
            Some(AppEvent::Tick) => true,
            Some(AppEvent::StateReady(result)) => {
                match result {
                    Ok(()) => {
                        let signed_in = self.app_state.is_signed_in();
                        info!(signed_in, "startup state ready");
                        self.set_status(if signed_in {
                            format!(
                                "Welcome back, {}",
                                self.app_state
                                    .profile()
                                    .map(|profile| profile.nickname)
                                    .unwrap_or_default()
                            )
                        } else {
                            "Browsing as guest".to_string()
                        });
                    }
                    Err(err) => {
                        error!("startup state load failed: {err}");
                        self.set_status(format!("Failed to load categories: {err}"));
                    }
                }
                true
            }
            Some(AppEvent::ShelvesLoaded(result)) => {
                match result {
                    Ok(shelves) => self.shelves = Some(shelves),
                    Err(err) => self.set_status(format!("Failed to load shelves: {err}")),
                }
                true
            }
            Some(AppEvent::DetailLoaded(game_id, result)) => {
                if let Some(detail) = self.detail.as_mut() {
                    if detail.game_id == game_id {
                        detail.loading = false;
                        match *result {
                            Ok(bundle) => detail.bundle = Some(bundle),
                            Err(err) => detail.error = Some(err),
                        }
                    }
                }
                true
            }
            Some(AppEvent::CommentsRefreshed(game_id, result)) => {
                if let Some(detail) = self.detail.as_mut() {
                    if detail.game_id == game_id {
                        match result {
                            Ok(comments) => {
                                if let Some(bundle) = detail.bundle.as_mut() {
                                    bundle.comments = comments;
                                }
                                detail.comment_cursor = 0;
                            }
                            Err(err) => {
                                self.set_status(format!("Failed to refresh comments: {err}"))
                            }
                        }
                    }
                }
                true
            }
            Some(AppEvent::MyServersLoaded(result)) => {
                self.my_server.loading = false;
                match result {
                    Ok(servers) => {
                        self.my_server.servers = servers;
                        self.my_server.cursor = 0;
                    }
                    Err(err) => self.my_server.error = Some(err),
                }
                true
            }
            Some(AppEvent::GameServersRefreshed(game_id, result)) => {
                match result {
                    Ok(servers) => {
                        if let Some(detail) = self.detail.as_mut() {
                            if detail.game_id == game_id {
                                if let Some(bundle) = detail.bundle.as_mut() {
                                    bundle.servers = servers;
                                }
                            }
                        }
                        self.set_status("Server list updated");
                    }
                    Err(err) => self.set_status(format!("Server update failed: {err}")),
                }
                true
            }
            Some(AppEvent::ProfileSaved(result)) => {
                if let Some(profile) = self.profile.as_mut() {
                    profile.saving = false;
                }
                match result {
                    Ok(saved) => {
                        self.app_state.set_profile(Some(saved));
                        self.set_status("Profile saved");
                        self.go_back();
                    }
                    Err(err) => self.set_status(format!("Profile save failed: {err}")),
                }
                true
            }
            Some(AppEvent::LoginFinished(result)) => {
                match result {
                    Ok(()) => {
                        self.set_status("Signed in");
                        self.navigate(Route::Main, String::new());
                    }
                    Err(err) => self.set_status(format!("Sign-in failed: {err}")),
                }
                true
            }
            None => false,
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        if let Some(modal) = self.modal.take() {
            self.handle_modal_event(modal, event);
            return Ok(());
        }
        match event {
            Event::Key(key) => self.handle_key(key)?,
            Event::Mouse(_) | Event::Resize(_, _) => {}
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => {}
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.handle_global_shortcut(&key) {
            return Ok(());
        }
        match self.screen {
            Screen::Main => self.handle_main_key(key),
            Screen::Search => self.handle_search_key(key),
            Screen::Detail => self.handle_detail_key(key),
            Screen::Profile => self.handle_profile_key(key),
            Screen::MyServer => self.handle_my_server_key(key),
            Screen::Login => self.handle_login_key(key),
            Screen::Info => self.handle_info_key(key),
        }
        Ok(())
    }

    fn text_entry_active(&self) -> bool {
        match self.screen {
            Screen::Main => self.main_editing,
            Screen::Search => self.search.as_ref().map(|s| s.editing).unwrap_or(false),
            Screen::Detail => self
                .detail
                .as_ref()
                .map(|d| d.editing_comment)
                .unwrap_or(false),
            Screen::Profile => true,
            _ => false,
        }
    }

    fn handle_global_shortcut(&mut self, key: &KeyEvent) -> bool {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return true;
        }
        if self.text_entry_active() {
            return false;
        }
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => {
                self.should_quit = true;
                true
            }
            KeyCode::Esc | KeyCode::Backspace => {
                self.go_back();
                true
            }
            KeyCode::Char('m') => {
                self.navigate(Route::Main, String::new());
                true
            }
            KeyCode::Char('s') if self.screen != Screen::Search => {
                self.navigate(Route::Search, String::new());
                true
            }
            KeyCode::Char('p') => {
                self.navigate(Route::Profile, String::new());
                true
            }
            KeyCode::Char('v') => {
                self.navigate(Route::MyServer, String::new());
                true
            }
            KeyCode::Char('i') => {
                self.navigate(Route::Info, String::new());
                true
            }
            KeyCode::Char('o') if !self.app_state.is_signed_in() => {
                self.navigate(Route::Login, String::new());
                true
            }
            _ => false,
        }
    }

    // ---- main screen ------------------------------------------------

    fn handle_main_key(&mut self, key: KeyEvent) {
        if self.main_editing {
            match key.code {
                KeyCode::Esc => self.main_editing = false,
                KeyCode::Enter => {
                    self.main_editing = false;
                    let params = QueryParams {
                        query: self.main_input.trim().to_string(),
                        from_main: true,
                        ..Default::default()
                    };
                    // `from=main` rides only on the navigation itself.
                    let mut encoded = params.encode();
                    if encoded.is_empty() {
                        encoded = "from=main".to_string();
                    } else {
                        encoded.push_str("&from=main");
                    }
                    self.main_input.clear();
                    self.navigate(Route::Search, encoded);
                }
                KeyCode::Backspace => {
                    self.main_input.pop();
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        self.main_input.push(ch);
                    }
                }
                _ => {}
            }
            return;
        }
        let shelf_len = |shelves: Option<&Shelves>, popular: bool| {
            shelves
                .map(|s| if popular { s.popular.len() } else { s.discounted.len() })
                .unwrap_or(0)
        };
        match key.code {
            KeyCode::Char('/') => {
                self.main_editing = true;
                self.set_status("Type a title, Enter to search");
            }
            KeyCode::Tab => {
                self.main_on_popular = !self.main_on_popular;
                self.main_cursor = 0;
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let len = shelf_len(self.shelves.as_ref(), self.main_on_popular);
                if self.main_cursor + 1 < len {
                    self.main_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.main_cursor = self.main_cursor.saturating_sub(1);
            }
            KeyCode::Enter => {
                let game_id = self.shelves.as_ref().and_then(|shelves| {
                    let shelf = if self.main_on_popular {
                        &shelves.popular
                    } else {
                        &shelves.discounted
                    };
                    shelf.get(self.main_cursor).map(|game| game.id)
                });
                if let Some(id) = game_id {
                    self.navigate(Route::GameDetail(id), String::new());
                }
            }
            _ => {}
        }
    }

    // ---- search screen ----------------------------------------------

    fn handle_search_key(&mut self, key: KeyEvent) {
        let Some(mut search) = self.search.take() else {
            return;
        };
        let state = search.controller.state();

        if search.editing {
            match key.code {
                KeyCode::Esc => search.editing = false,
                KeyCode::Enter => {
                    search.editing = false;
                    search.controller.submit();
                }
                KeyCode::Backspace => {
                    search.input.pop();
                    search.controller.set_query(&search.input);
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        search.input.push(ch);
                        search.controller.set_query(&search.input);
                    }
                }
                _ => {}
            }
            self.search = Some(search);
            return;
        }

        match key.code {
            KeyCode::Char('/') => {
                search.editing = true;
                self.set_status("Type to search; results follow as you type");
            }
            KeyCode::Char('d') => {
                search.controller.toggle_discount();
                self.set_status("Discount filter toggled");
            }
            KeyCode::Char('r') => {
                search.controller.toggle_recommended();
                self.set_status("Recommended filter toggled");
            }
            KeyCode::Char('f') => {
                self.modal = Some(Modal::Filter(FilterModal::new(
                    state.filters.clone(),
                    PRICE_CEILING,
                )));
            }
            KeyCode::Char('c') => {
                self.modal = Some(Modal::CategoryPicker(CategoryPickerModal::new(
                    PickerTarget::SearchFilters,
                    state.filters.categories.clone(),
                    self.app_state.categories(),
                )));
            }
            KeyCode::Char('x') => {
                search.controller.reset_filters();
                self.set_status("Filters reset");
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if search.selected + 1 < state.results.len() {
                    search.selected += 1;
                }
                search.sync_window(state.results.len());
            }
            KeyCode::Char('k') | KeyCode::Up => {
                search.selected = search.selected.saturating_sub(1);
                search.sync_window(state.results.len());
            }
            KeyCode::PageDown => {
                search.selected =
                    (search.selected + search.list_rows).min(state.results.len().saturating_sub(1));
                search.sync_window(state.results.len());
            }
            KeyCode::PageUp => {
                search.selected = search.selected.saturating_sub(search.list_rows);
                search.sync_window(state.results.len());
            }
            KeyCode::Enter => {
                if let Some(game) = state.results.get(search.selected) {
                    let id = game.id;
                    self.search = Some(search);
                    self.navigate(Route::GameDetail(id), String::new());
                    return;
                }
            }
            _ => {}
        }
        self.search = Some(search);
    }

    // ---- detail screen ----------------------------------------------

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let Some(mut detail) = self.detail.take() else {
            return;
        };

        if detail.editing_comment {
            match key.code {
                KeyCode::Esc => {
                    detail.editing_comment = false;
                    detail.comment_error = None;
                }
                KeyCode::Enter => match validate_comment(&detail.comment_input) {
                    Ok(()) => {
                        let content = detail.comment_input.trim().to_string();
                        detail.comment_input.clear();
                        detail.editing_comment = false;
                        detail.comment_error = None;
                        self.post_comment(detail.game_id, content);
                    }
                    Err(rejection) => {
                        detail.comment_error = Some(rejection.to_string());
                    }
                },
                KeyCode::Backspace => {
                    detail.comment_input.pop();
                    detail.comment_error = None;
                }
                KeyCode::Char(ch) => {
                    if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                        detail.comment_input.push(ch);
                        detail.comment_error = None;
                    }
                }
                _ => {}
            }
            self.detail = Some(detail);
            return;
        }

        match key.code {
            KeyCode::Char('c') => {
                if self.app_state.is_signed_in() {
                    detail.editing_comment = true;
                } else {
                    self.set_status("Sign in to comment");
                }
            }
            KeyCode::Char('j') | KeyCode::Down => {
                let count = detail
                    .bundle
                    .as_ref()
                    .map(|bundle| bundle.comments.len())
                    .unwrap_or(0);
                if detail.comment_cursor + 1 < count {
                    detail.comment_cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                detail.comment_cursor = detail.comment_cursor.saturating_sub(1);
            }
            KeyCode::Char('d') => {
                let own = self.app_state.profile().and_then(|profile| {
                    detail.bundle.as_ref().and_then(|bundle| {
                        bundle
                            .comments
                            .get(detail.comment_cursor)
                            .filter(|comment| comment.is_owned_by(&profile))
                            .map(|comment| comment.id)
                    })
                });
                match own {
                    Some(comment_id) => {
                        self.modal = Some(Modal::Confirm(ConfirmModal::new(
                            "Delete comment",
                            "Delete this comment? This cannot be undone.",
                            ConfirmAction::DeleteComment {
                                game_id: detail.game_id,
                                comment_id,
                            },
                        )));
                    }
                    None => self.set_status("You can only delete your own comments"),
                }
            }
            KeyCode::Char('a') => {
                if self.app_state.is_signed_in() {
                    self.modal = Some(Modal::AddServer(AddServerModal::new(detail.game_id)));
                } else {
                    self.set_status("Sign in to register a server");
                }
            }
            _ => {}
        }
        self.detail = Some(detail);
    }

    fn post_comment(&mut self, game_id: u64, content: String) {
        let Some(tx) = self.sender() else { return };
        let comments = self.services.comments.clone();
        spawn(async move {
            let result = match comments.create(game_id, &content).await {
                Ok(_) => comments.list(game_id).await.map_err(|err| err.to_string()),
                Err(err) => Err(err.to_string()),
            };
            let _ = tx.send(AppEvent::CommentsRefreshed(game_id, result)).await;
        });
        self.set_status("Posting comment…");
    }

    // ---- profile screen ---------------------------------------------

    fn handle_profile_key(&mut self, key: KeyEvent) {
        let Some(mut profile) = self.profile.take() else {
            return;
        };
        match key.code {
            KeyCode::Esc => {
                profile.form.cancel_pending();
                self.go_back();
                return;
            }
            KeyCode::Tab => {
                profile.focus = match profile.focus {
                    ProfileField::Nickname => ProfileField::Discord,
                    ProfileField::Discord => ProfileField::Nickname,
                };
            }
            KeyCode::Char('k') if key.modifiers == KeyModifiers::CONTROL => {
                let selected = profile.form.categories.selected().to_vec();
                self.modal = Some(Modal::CategoryPicker(CategoryPickerModal::new(
                    PickerTarget::Profile,
                    selected,
                    self.app_state.categories(),
                )));
            }
            KeyCode::Char('s') if key.modifiers == KeyModifiers::CONTROL => {
                if profile.saving {
                    self.set_status("Save already in progress");
                } else if profile.form.can_save() {
                    profile.saving = true;
                    let payload = profile.form.to_profile();
                    if let Some(tx) = self.sender() {
                        let users = self.services.users.clone();
                        spawn(async move {
                            let result = users
                                .save_profile(&payload)
                                .await
                                .map_err(|err| err.to_string());
                            let _ = tx.send(AppEvent::ProfileSaved(result)).await;
                        });
                        self.set_status("Saving profile…");
                    }
                } else {
                    self.set_status("Fix the highlighted fields before saving");
                }
            }
            KeyCode::Backspace => match profile.focus {
                ProfileField::Nickname => {
                    let mut text = profile.form.nickname();
                    text.pop();
                    profile.form.set_nickname(&text);
                }
                ProfileField::Discord => {
                    let mut text = profile.form.discord_link();
                    text.pop();
                    profile.form.set_discord_link(&text);
                }
            },
            KeyCode::Char(ch) => {
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                    match profile.focus {
                        ProfileField::Nickname => {
                            let mut text = profile.form.nickname();
                            text.push(ch);
                            profile.form.set_nickname(&text);
                        }
                        ProfileField::Discord => {
                            let mut text = profile.form.discord_link();
                            text.push(ch);
                            profile.form.set_discord_link(&text);
                        }
                    }
                }
            }
            _ => {}
        }
        self.profile = Some(profile);
    }

    // ---- my-server screen -------------------------------------------

    fn handle_my_server_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                if self.my_server.cursor + 1 < self.my_server.servers.len() {
                    self.my_server.cursor += 1;
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.my_server.cursor = self.my_server.cursor.saturating_sub(1);
            }
            KeyCode::Char('d') => {
                if let Some(server) = self.my_server.servers.get(self.my_server.cursor) {
                    self.modal = Some(Modal::Confirm(ConfirmModal::new(
                        "Remove server",
                        &format!("Remove \"{}\" from your servers?", server.name),
                        ConfirmAction::DeleteServer {
                            server_id: server.id,
                        },
                    )));
                }
            }
            KeyCode::Char('r') => self.load_my_servers(),
            _ => {}
        }
    }

    // ---- login / info -----------------------------------------------

    fn handle_login_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Enter {
            let Some(tx) = self.sender() else { return };
            let state = self.app_state.clone();
            let users = self.services.users.clone();
            spawn(async move {
                let result = state
                    .refresh_profile(&users)
                    .await
                    .map_err(|err| err.to_string());
                let _ = tx.send(AppEvent::LoginFinished(result)).await;
            });
            self.set_status("Completing sign-in…");
        }
    }

    fn handle_info_key(&mut self, _key: KeyEvent) {}

    // ---- modals -----------------------------------------------------

    fn handle_modal_event(&mut self, mut modal: Modal, event: Event) {
        let key = match event {
            Event::Key(key) => key,
            Event::Mouse(mouse) => {
                if let Modal::Filter(filter) = &mut modal {
                    filter.handle_mouse(mouse);
                }
                self.modal = Some(modal);
                return;
            }
            _ => {
                self.modal = Some(modal);
                return;
            }
        };

        match &mut modal {
            Modal::Confirm(confirm) => match confirm.handle_key(key) {
                ModalOutcome::Open => self.modal = Some(modal),
                ModalOutcome::Cancel => {}
                ModalOutcome::Confirm => {
                    let action = confirm.action.clone();
                    self.run_confirm_action(action);
                }
            },
            Modal::AddServer(add) => match add.handle_key(key) {
                ModalOutcome::Open => self.modal = Some(modal),
                ModalOutcome::Cancel => {}
                ModalOutcome::Confirm => {
                    let game_id = add.game_id;
                    let invite = add.invite_url();
                    self.add_server(game_id, invite);
                }
            },
            Modal::CategoryPicker(picker) => match picker.handle_key(key) {
                ModalOutcome::Open => self.modal = Some(modal),
                ModalOutcome::Cancel => {}
                ModalOutcome::Confirm => {
                    let target = picker.target;
                    let selected = picker.picker.selected().to_vec();
                    self.apply_picked_categories(target, selected);
                }
            },
            Modal::Filter(filter) => match filter.handle_key(key) {
                ModalOutcome::Open => self.modal = Some(modal),
                ModalOutcome::Cancel => {}
                ModalOutcome::Confirm => {
                    let reset = filter.reset_requested;
                    let draft = filter.draft();
                    if let Some(search) = self.search.as_ref() {
                        if reset {
                            search.controller.reset_filters();
                            self.set_status("Filters reset");
                        } else {
                            search.controller.apply_filters(draft);
                            self.set_status("Filters applied");
                        }
                    }
                }
            },
        }
    }

    fn run_confirm_action(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteComment {
                game_id,
                comment_id,
            } => {
                let Some(tx) = self.sender() else { return };
                let comments = self.services.comments.clone();
                spawn(async move {
                    let result = match comments.delete(comment_id).await {
                        Ok(()) => comments.list(game_id).await.map_err(|err| err.to_string()),
                        Err(err) => Err(err.to_string()),
                    };
                    let _ = tx.send(AppEvent::CommentsRefreshed(game_id, result)).await;
                });
                self.set_status("Deleting comment…");
            }
            ConfirmAction::DeleteServer { server_id } => {
                let Some(tx) = self.sender() else { return };
                let servers = self.services.servers.clone();
                spawn(async move {
                    let result = match servers.delete(server_id).await {
                        Ok(()) => servers.mine().await.map_err(|err| err.to_string()),
                        Err(err) => Err(err.to_string()),
                    };
                    let _ = tx.send(AppEvent::MyServersLoaded(result)).await;
                });
                self.set_status("Removing server…");
            }
        }
    }

    fn add_server(&mut self, game_id: u64, invite_url: String) {
        let Some(tx) = self.sender() else { return };
        let servers = self.services.servers.clone();
        spawn(async move {
            let result = servers
                .add(game_id, &invite_url)
                .await
                .map_err(|err| err.to_string());
            let _ = tx
                .send(AppEvent::GameServersRefreshed(game_id, result))
                .await;
        });
        self.set_status("Registering server…");
    }

    fn apply_picked_categories(&mut self, target: PickerTarget, selected: Vec<u64>) {
        match target {
            PickerTarget::SearchFilters => {
                if let Some(search) = self.search.as_ref() {
                    let mut filters = search.controller.state().filters;
                    filters.categories = selected;
                    search.controller.apply_filters(filters);
                    self.set_status("Category filter applied");
                }
            }
            PickerTarget::Profile => {
                if let Some(profile) = self.profile.as_mut() {
                    let mut picker = std::mem::take(&mut profile.form.categories);
                    picker.clear();
                    for id in selected {
                        picker.toggle(id, std::time::Instant::now());
                    }
                    profile.form.categories = picker;
                    self.set_status("Preferred categories updated");
                }
            }
        }
    }

    // ---- rendering --------------------------------------------------

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        match self.screen {
            Screen::Main => self.render_main(frame, chunks[1]),
            Screen::Search => self.render_search(frame, chunks[1]),
            Screen::Detail => self.render_detail(frame, chunks[1]),
            Screen::Profile => self.render_profile(frame, chunks[1]),
            Screen::MyServer => self.render_my_server(frame, chunks[1]),
            Screen::Login => self.render_login(frame, chunks[1]),
            Screen::Info => self.render_info(frame, chunks[1]),
        }
        self.render_status(frame, chunks[2]);

        if let Some(modal) = self.modal.as_mut() {
            match modal {
                Modal::Confirm(confirm) => confirm.render(frame, &self.theme),
                Modal::AddServer(add) => add.render(frame, &self.theme),
                Modal::CategoryPicker(picker) => picker.render(frame, &self.theme),
                Modal::Filter(filter) => filter.render(frame, &self.theme),
            }
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let tabs: [(Screen, &str); 5] = [
            (Screen::Main, "[m] Main"),
            (Screen::Search, "[s] Search"),
            (Screen::Profile, "[p] Profile"),
            (Screen::MyServer, "[v] My Servers"),
            (Screen::Info, "[i] Info"),
        ];
        let mut spans: Vec<Span> = Vec::new();
        for (screen, label) in tabs {
            let style = if screen == self.screen {
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(self.theme.muted)
            };
            spans.push(Span::styled(format!("{label}  "), style));
        }
        let account = match self.app_state.profile() {
            Some(profile) => Span::styled(
                format!("{} ", profile.nickname),
                Style::default().fg(self.theme.success),
            ),
            None => Span::styled("[o] Sign in ", Style::default().fg(self.theme.warning)),
        };
        spans.push(account);
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_main(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(4)])
            .split(area);

        let cursor = if self.main_editing { "▏" } else { "" };
        let search_box = Paragraph::new(format!("{}{cursor}", self.main_input)).block(
            Block::default()
                .borders(Borders::ALL)
                .title(if self.main_editing {
                    "Search all games (Enter to run)"
                } else {
                    "Search all games ( / to type)"
                })
                .border_style(if self.main_editing {
                    Style::default().fg(self.theme.accent)
                } else {
                    Style::default().fg(self.theme.muted)
                }),
        );
        frame.render_widget(search_box, chunks[0]);

        let shelves = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        self.render_shelf(frame, shelves[0], false);
        self.render_shelf(frame, shelves[1], true);
    }

    fn render_shelf(&self, frame: &mut Frame, area: Rect, popular: bool) {
        let title = if popular { "Popular" } else { "On sale" };
        let active = self.main_on_popular == popular;
        let items: Vec<ListItem> = match self.shelves.as_ref() {
            None => vec![ListItem::new("Loading…")],
            Some(shelves) => {
                let shelf = if popular {
                    &shelves.popular
                } else {
                    &shelves.discounted
                };
                if shelf.is_empty() {
                    vec![ListItem::new("Nothing here right now")]
                } else {
                    shelf
                        .iter()
                        .map(|game| ListItem::new(self.game_line(game)))
                        .collect()
                }
            }
        };
        let mut state = ListState::default();
        if active && !items.is_empty() {
            state.select(Some(self.main_cursor.min(items.len() - 1)));
        }
        let border = if active {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(border),
            )
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn game_line(&self, game: &Game) -> Line<'static> {
        let mut spans = vec![Span::raw(format!("{}  ", game.title))];
        spans.push(Span::styled(
            format!("{}", game.current_price),
            Style::default().fg(self.theme.primary_fg),
        ));
        let discount = game.discount_percent();
        if discount > 0 {
            spans.push(Span::styled(
                format!("  −{discount}%"),
                Style::default().fg(self.theme.success),
            ));
        }
        if let Some(rating) = game.rating {
            spans.push(Span::styled(
                format!("  ★{rating:.1}"),
                Style::default().fg(self.theme.warning),
            ));
        }
        Line::from(spans)
    }

    fn render_search(&mut self, frame: &mut Frame, area: Rect) {
        let Some(search) = self.search.as_mut() else {
            frame.render_widget(Paragraph::new("Search is not mounted"), area);
            return;
        };
        let state = search.controller.state();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
            ])
            .split(area);

        let cursor = if search.editing { "▏" } else { "" };
        let query_box = Paragraph::new(format!("{}{cursor}", search.input)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search ( / to type, Enter to submit )")
                .border_style(if search.editing {
                    Style::default().fg(self.theme.accent)
                } else {
                    Style::default().fg(self.theme.muted)
                }),
        );
        frame.render_widget(query_box, chunks[0]);

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                toggle_span("d:discount", state.mode == gamedeals_core::services::SearchMode::Discounted, &self.theme),
                Span::raw("  "),
                toggle_span("r:recommended", state.mode == gamedeals_core::services::SearchMode::Recommended, &self.theme),
                Span::raw("  "),
                toggle_span("f:filters", !state.filters.is_empty(), &self.theme),
                Span::raw("  "),
                Span::styled("c:categories  x:reset", Style::default().fg(self.theme.muted)),
            ])),
            chunks[1],
        );

        let list_area = chunks[2];
        search.list_rows = list_area.height.saturating_sub(2) as usize;

        match state.phase {
            SearchPhase::LoadingFirstPage => {
                frame.render_widget(
                    Paragraph::new("Searching…")
                        .block(Block::default().borders(Borders::ALL).title("Results"))
                        .alignment(Alignment::Center),
                    list_area,
                );
                return;
            }
            SearchPhase::Error => {
                let message = state
                    .error
                    .clone()
                    .unwrap_or_else(|| "Something went wrong".to_string());
                frame.render_widget(
                    Paragraph::new(Span::styled(
                        message,
                        Style::default().fg(self.theme.danger),
                    ))
                    .block(Block::default().borders(Borders::ALL).title("Results"))
                    .alignment(Alignment::Center)
                    .wrap(Wrap { trim: true }),
                    list_area,
                );
                return;
            }
            SearchPhase::Empty => {
                frame.render_widget(
                    Paragraph::new("No games matched your search.")
                        .block(Block::default().borders(Borders::ALL).title("Results"))
                        .alignment(Alignment::Center),
                    list_area,
                );
                return;
            }
            SearchPhase::Idle | SearchPhase::LoadingMore => {}
        }

        render_result_list(frame, list_area, search, &state, &self.theme);
    }

    fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
        let Some(detail) = self.detail.as_ref() else {
            frame.render_widget(Paragraph::new("No game selected"), area);
            return;
        };
        if detail.loading {
            frame.render_widget(
                Paragraph::new("Loading game…").alignment(Alignment::Center),
                area,
            );
            return;
        }
        if let Some(error) = &detail.error {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("Failed to load this game: {error}"),
                    Style::default().fg(self.theme.danger),
                ))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
                area,
            );
            return;
        }
        let Some(bundle) = detail.bundle.as_ref() else {
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7),
                Constraint::Min(5),
                Constraint::Length(3),
            ])
            .split(area);

        let game = &bundle.game;
        let mut header_lines = vec![
            Line::from(Span::styled(
                game.title.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            self.game_line(game),
        ];
        if let Some(developer) = &game.developer {
            header_lines.push(Line::from(format!("Developer: {developer}")));
        }
        if let Some(low) = bundle.prices.iter().map(|record| record.price).min() {
            header_lines.push(Line::from(format!(
                "Lowest recorded price: {low} ({} data points)",
                bundle.prices.len()
            )));
        }
        if !bundle.videos.is_empty() {
            header_lines.push(Line::from(format!("{} video(s) available", bundle.videos.len())));
        }
        frame.render_widget(
            Paragraph::new(header_lines)
                .block(Block::default().borders(Borders::ALL).title("Game")),
            chunks[0],
        );

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        let profile = self.app_state.profile();
        let comment_items: Vec<ListItem> = if bundle.comments.is_empty() {
            vec![ListItem::new("No comments yet — press c to write one")]
        } else {
            bundle
                .comments
                .iter()
                .map(|comment| {
                    let own = profile
                        .as_ref()
                        .map(|p| comment.is_owned_by(p))
                        .unwrap_or(false);
                    let marker = if own { " (you)" } else { "" };
                    ListItem::new(Line::from(vec![
                        Span::styled(
                            format!("{}{marker}: ", comment.author_name),
                            Style::default().fg(self.theme.accent_alt),
                        ),
                        Span::raw(comment.content.clone()),
                    ]))
                })
                .collect()
        };
        let mut comment_state = ListState::default();
        if !bundle.comments.is_empty() {
            comment_state.select(Some(detail.comment_cursor.min(bundle.comments.len() - 1)));
        }
        frame.render_stateful_widget(
            List::new(comment_items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("Comments (c: write, d: delete own)"),
                )
                .highlight_style(Style::default().bg(self.theme.selection_bg)),
            body[0],
            &mut comment_state,
        );

        let server_items: Vec<ListItem> = if bundle.servers.is_empty() {
            vec![ListItem::new("No servers yet — press a to register one")]
        } else {
            bundle
                .servers
                .iter()
                .map(|server| {
                    ListItem::new(format!("{} ({} members)", server.name, server.member_count))
                })
                .collect()
        };
        frame.render_widget(
            List::new(server_items).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Party servers (a: add)"),
            ),
            body[1],
        );

        let input_line = if detail.editing_comment {
            format!("{}▏", detail.comment_input)
        } else {
            String::new()
        };
        let input_title = match &detail.comment_error {
            Some(error) => format!("Comment — {error}"),
            None => "Comment (Enter to post, Esc to cancel)".to_string(),
        };
        let border = if detail.comment_error.is_some() {
            Style::default().fg(self.theme.danger)
        } else if detail.editing_comment {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        frame.render_widget(
            Paragraph::new(input_line).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(input_title)
                    .border_style(border),
            ),
            chunks[2],
        );
    }

    fn render_profile(&mut self, frame: &mut Frame, area: Rect) {
        let Some(profile) = self.profile.as_ref() else {
            frame.render_widget(Paragraph::new("Not signed in"), area);
            return;
        };
        let form = &profile.form;

        let field_line = |label: &str, value: String, check: FieldCheck, focused: bool| {
            let mut spans = vec![
                Span::styled(
                    format!("{label}: "),
                    if focused {
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(self.theme.primary_fg)
                    },
                ),
                Span::raw(value),
            ];
            match check {
                FieldCheck::Pending => spans.push(Span::styled(
                    "  checking…",
                    Style::default().fg(self.theme.muted),
                )),
                FieldCheck::Available => spans.push(Span::styled(
                    "  available",
                    Style::default().fg(self.theme.success),
                )),
                _ => {}
            }
            Line::from(spans)
        };

        let mut lines = vec![
            field_line(
                "Nickname",
                form.nickname(),
                form.nickname_check(),
                profile.focus == ProfileField::Nickname,
            ),
        ];
        if let Some(message) = form.nickname_check().inline_message("nickname") {
            lines.push(Line::from(Span::styled(
                format!("  {message}"),
                Style::default().fg(self.theme.danger),
            )));
        }
        lines.push(field_line(
            "Discord link",
            form.discord_link(),
            form.discord_check(),
            profile.focus == ProfileField::Discord,
        ));
        if let Some(message) = form.discord_check().inline_message("discord link") {
            lines.push(Line::from(Span::styled(
                format!("  {message}"),
                Style::default().fg(self.theme.danger),
            )));
        }
        lines.push(Line::from(""));
        let names: Vec<String> = form
            .categories
            .selected()
            .iter()
            .filter_map(|&id| self.app_state.category_name(id))
            .collect();
        lines.push(Line::from(format!(
            "Preferred categories: {}",
            if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            }
        )));
        lines.push(Line::from(""));
        let save_hint = if profile.saving {
            Span::styled("Saving…", Style::default().fg(self.theme.muted))
        } else if form.can_save() {
            Span::styled("Ctrl+S save", Style::default().fg(self.theme.success))
        } else {
            Span::styled(
                "Ctrl+S save (blocked until checks pass)",
                Style::default().fg(self.theme.muted),
            )
        };
        lines.push(Line::from(vec![
            save_hint,
            Span::styled(
                "    Tab switch field    Ctrl+K categories    Esc back",
                Style::default().fg(self.theme.muted),
            ),
        ]));

        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Profile"))
                .wrap(Wrap { trim: false }),
            area,
        );
    }

    fn render_my_server(&mut self, frame: &mut Frame, area: Rect) {
        let now = chrono::Utc::now();
        let items: Vec<ListItem> = if self.my_server.loading {
            vec![ListItem::new("Loading…")]
        } else if let Some(error) = &self.my_server.error {
            vec![ListItem::new(Span::styled(
                format!("Failed to load servers: {error}"),
                Style::default().fg(self.theme.danger),
            ))]
        } else if self.my_server.servers.is_empty() {
            vec![ListItem::new(
                "No registered servers. Add one from a game's page.",
            )]
        } else {
            self.my_server
                .servers
                .iter()
                .map(|server| {
                    let mut spans = vec![Span::raw(format!(
                        "{}  {}",
                        server.name, server.invite_url
                    ))];
                    if server.is_expired(now) {
                        spans.push(Span::styled(
                            "  expired",
                            Style::default().fg(self.theme.danger),
                        ));
                    }
                    ListItem::new(Line::from(spans))
                })
                .collect()
        };
        let mut state = ListState::default();
        if !self.my_server.servers.is_empty() {
            state.select(Some(
                self.my_server.cursor.min(self.my_server.servers.len() - 1),
            ));
        }
        frame.render_stateful_widget(
            List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title("My servers (d: remove, r: reload)"),
                )
                .highlight_style(Style::default().bg(self.theme.selection_bg)),
            area,
            &mut state,
        );
    }

    fn render_login(&mut self, frame: &mut Frame, area: Rect) {
        let url = format!("{}/oauth/authorize?client=gamedeals", self.config.oauth_base_url);
        let lines = vec![
            Line::from("Sign in with Discord"),
            Line::from(""),
            Line::from("Open this link in a browser and approve access:"),
            Line::from(Span::styled(url, Style::default().fg(self.theme.accent))),
            Line::from(""),
            Line::from(Span::styled(
                "[Enter] I've signed in    [Esc] back",
                Style::default().fg(self.theme.muted),
            )),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Login"))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_info(&mut self, frame: &mut Frame, area: Rect) {
        let lines = vec![
            Line::from("gamedeals — compare game prices across storefronts"),
            Line::from(""),
            Line::from("m Main  s Search  p Profile  v My Servers  i Info"),
            Line::from("Esc goes back; q quits."),
            Line::from(""),
            Line::from("Search: / type, d discount, r recommended, f filters,"),
            Line::from("c categories, x reset, Enter opens the selected game."),
        ];
        frame.render_widget(
            Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Info"))
                .alignment(Alignment::Center),
            area,
        );
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        frame.render_widget(
            Paragraph::new(self.status.clone())
                .block(Block::default().borders(Borders::ALL).title("Status")),
            area,
        );
    }
}

fn toggle_span(label: &str, on: bool, theme: &Theme) -> Span<'static> {
    if on {
        Span::styled(
            format!("[{label}]"),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(format!(" {label} "), Style::default().fg(theme.muted))
    }
}

fn render_result_list(
    frame: &mut Frame,
    area: Rect,
    search: &mut SearchScreen,
    state: &SearchViewState,
    theme: &Theme,
) {
    let rows = search.list_rows.max(1);
    let end = (search.scroll + rows).min(state.results.len());
    let mut items: Vec<ListItem> = state.results[search.scroll..end]
        .iter()
        .enumerate()
        .map(|(idx, game)| {
            let absolute = search.scroll + idx;
            let marker = if absolute == search.selected {
                Span::styled("▶ ", Style::default().fg(theme.accent))
            } else {
                Span::raw("  ")
            };
            let mut spans = vec![marker, Span::raw(format!("{}  ", game.title))];
            spans.push(Span::raw(format!("{}", game.current_price)));
            let discount = game.discount_percent();
            if discount > 0 {
                spans.push(Span::styled(
                    format!("  −{discount}%"),
                    Style::default().fg(theme.success),
                ));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();
    if state.phase == SearchPhase::LoadingMore {
        items.push(ListItem::new(Span::styled(
            "  Loading more…",
            Style::default().fg(theme.muted),
        )));
    }
    let title = format!(
        "Results ({}{})",
        state.results.len(),
        if state.has_more { "+" } else { "" }
    );
    frame.render_widget(
        List::new(items).block(Block::default().borders(Borders::ALL).title(title)),
        area,
    );
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}
