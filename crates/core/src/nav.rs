//! Client-side routes and the navigation history.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::api::Telemetry;

/// Screens addressable by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Entry screen before any navigation.
    Root,
    /// OAuth login hand-off.
    Login,
    /// Profile editor.
    Profile,
    /// Main landing screen.
    Main,
    /// Game search.
    Search,
    /// Detail page for one game id.
    GameDetail(u64),
    /// About and contact info.
    Info,
    /// The signed-in user's registered server.
    MyServer,
}

impl Route {
    /// Path form used for deep links and page-view tracking.
    pub fn path(&self) -> String {
        match self {
            Route::Root => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Profile => "/profile".to_string(),
            Route::Main => "/main".to_string(),
            Route::Search => "/search".to_string(),
            Route::GameDetail(id) => format!("/games/{id}"),
            Route::Info => "/info".to_string(),
            Route::MyServer => "/my-server".to_string(),
        }
    }
}

/// One history entry: a route plus its encoded query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// The screen visited.
    pub route: Route,
    /// Encoded query string, empty for most routes.
    pub query: String,
}

/// Browser-style history. Search commits use [`History::replace`] so that
/// back-navigation skips intermediate keystrokes.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    telemetry: Option<Telemetry>,
}

/// Handle shared between the app loop and the search controller.
pub type SharedHistory = Arc<Mutex<History>>;

impl History {
    /// An empty history. Page views are reported to `telemetry` when given.
    pub fn new(telemetry: Option<Telemetry>) -> Self {
        Self {
            entries: Vec::new(),
            telemetry,
        }
    }

    /// [`new`](Self::new), wrapped for sharing across tasks.
    pub fn shared(telemetry: Option<Telemetry>) -> SharedHistory {
        Arc::new(Mutex::new(Self::new(telemetry)))
    }

    /// Visit a new entry, growing the stack.
    pub fn push(&mut self, route: Route, query: impl Into<String>) {
        let entry = HistoryEntry {
            route,
            query: query.into(),
        };
        self.track(&entry);
        self.entries.push(entry);
    }

    /// Replace the current entry instead of growing the stack.
    pub fn replace(&mut self, route: Route, query: impl Into<String>) {
        let entry = HistoryEntry {
            route,
            query: query.into(),
        };
        self.track(&entry);
        match self.entries.last_mut() {
            Some(last) => *last = entry,
            None => self.entries.push(entry),
        }
    }

    /// Navigate back. When the referrer is the login screen the user is
    /// sent to Main instead, so back never bounces into a completed login.
    pub fn back(&mut self) -> Option<HistoryEntry> {
        self.entries.pop()?;
        if matches!(
            self.entries.last().map(|entry| &entry.route),
            Some(Route::Login)
        ) {
            self.entries.pop();
            let main = HistoryEntry {
                route: Route::Main,
                query: String::new(),
            };
            self.entries.push(main.clone());
            self.track(&main);
            return Some(main);
        }
        self.entries.last().cloned()
    }

    /// The entry the user is currently on.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.last()
    }

    /// Depth of the stack.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been visited yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn track(&self, entry: &HistoryEntry) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.page_view(&entry.route.path());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_does_not_grow_the_stack() {
        let mut history = History::new(None);
        history.push(Route::Main, "");
        history.push(Route::Search, "query=a");
        history.replace(Route::Search, "query=ab");
        history.replace(Route::Search, "query=abc");
        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().query, "query=abc");
    }

    #[test]
    fn back_skips_login_referrer() {
        let mut history = History::new(None);
        history.push(Route::Main, "");
        history.push(Route::Login, "");
        history.push(Route::Profile, "");
        let landed = history.back().expect("expected a destination");
        assert_eq!(landed.route, Route::Main);
        // The login entry is gone entirely.
        assert!(!history
            .entries
            .iter()
            .any(|entry| entry.route == Route::Login));
    }

    #[test]
    fn back_pops_normally_otherwise() {
        let mut history = History::new(None);
        history.push(Route::Main, "");
        history.push(Route::GameDetail(7), "");
        let landed = history.back().expect("expected a destination");
        assert_eq!(landed.route, Route::Main);
    }

    #[test]
    fn route_paths() {
        assert_eq!(Route::GameDetail(42).path(), "/games/42");
        assert_eq!(Route::MyServer.path(), "/my-server");
    }
}
