//! Profile editor state: debounced uniqueness validation and save gating.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::warn;

use crate::{
    error::ApiError,
    models::UserProfile,
    search::filters::CategoryPicker,
    services::UserService,
    util::Debouncer,
};

/// Quiet period before a field edit fires its uniqueness check.
pub const VALIDATION_DEBOUNCE: Duration = Duration::from_millis(500);

/// Seam over the uniqueness endpoints so the form is testable offline.
#[async_trait]
pub trait UniquenessChecker: Send + Sync {
    /// Whether `nickname` is free to claim.
    async fn nickname_available(&self, nickname: &str) -> Result<bool, ApiError>;
    /// Whether `link` is free to claim.
    async fn discord_link_available(&self, link: &str) -> Result<bool, ApiError>;
}

/// Production checker backed by the user service.
pub struct ApiUniquenessChecker {
    users: UserService,
}

impl ApiUniquenessChecker {
    /// Checker calling through the given service.
    pub fn new(users: UserService) -> Self {
        Self { users }
    }
}

#[async_trait]
impl UniquenessChecker for ApiUniquenessChecker {
    async fn nickname_available(&self, nickname: &str) -> Result<bool, ApiError> {
        self.users.nickname_available(nickname).await
    }

    async fn discord_link_available(&self, link: &str) -> Result<bool, ApiError> {
        self.users.discord_link_available(link).await
    }
}

/// Validation state of one debounced field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldCheck {
    /// Unchanged from the saved profile, or empty: no check needed.
    #[default]
    Idle,
    /// An edit happened; the check has not come back yet.
    Pending,
    /// Confirmed free to claim.
    Available,
    /// Already claimed by another account.
    Taken,
    /// The check itself failed; surfaced inline, blocks saving.
    Failed,
}

impl FieldCheck {
    fn blocks_save(self) -> bool {
        matches!(self, FieldCheck::Pending | FieldCheck::Taken | FieldCheck::Failed)
    }

    /// Inline message next to the field, when any.
    pub fn inline_message(self, field: &str) -> Option<String> {
        match self {
            FieldCheck::Taken => Some(format!("This {field} is already in use")),
            FieldCheck::Failed => Some(format!("Could not verify this {field}")),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct FormState {
    nickname: String,
    discord_link: String,
    nickname_check: FieldCheck,
    discord_check: FieldCheck,
}

/// The profile editor. Uniqueness checks are debounced 500 ms; a save is
/// blocked while either field is flagged invalid or still being checked.
pub struct ProfileForm {
    checker: Arc<dyn UniquenessChecker>,
    original: UserProfile,
    state: Arc<Mutex<FormState>>,
    /// Preferred categories, capped at five with the shared picker.
    pub categories: CategoryPicker,
    nickname_debounce: Mutex<Debouncer>,
    discord_debounce: Mutex<Debouncer>,
}

impl ProfileForm {
    /// A form pre-filled from the saved profile.
    pub fn new(checker: Arc<dyn UniquenessChecker>, original: UserProfile) -> Self {
        let state = FormState {
            nickname: original.nickname.clone(),
            discord_link: original.discord_link.clone().unwrap_or_default(),
            ..Default::default()
        };
        Self {
            checker,
            categories: CategoryPicker::new(original.preferred_categories.clone()),
            original,
            state: Arc::new(Mutex::new(state)),
            nickname_debounce: Mutex::new(Debouncer::new(VALIDATION_DEBOUNCE)),
            discord_debounce: Mutex::new(Debouncer::new(VALIDATION_DEBOUNCE)),
        }
    }

    /// Current nickname field text.
    pub fn nickname(&self) -> String {
        self.state.lock().nickname.clone()
    }

    /// Current Discord link field text.
    pub fn discord_link(&self) -> String {
        self.state.lock().discord_link.clone()
    }

    /// Validation state of the nickname field.
    pub fn nickname_check(&self) -> FieldCheck {
        self.state.lock().nickname_check
    }

    /// Validation state of the Discord link field.
    pub fn discord_check(&self) -> FieldCheck {
        self.state.lock().discord_check
    }

    /// Update the nickname field, scheduling a debounced uniqueness check
    /// when it differs from the saved value.
    pub fn set_nickname(&self, text: &str) {
        {
            let mut form = self.state.lock();
            form.nickname = text.to_string();
            if text == self.original.nickname || text.trim().is_empty() {
                form.nickname_check = FieldCheck::Idle;
                self.nickname_debounce.lock().cancel();
                return;
            }
            form.nickname_check = FieldCheck::Pending;
        }
        let checker = Arc::clone(&self.checker);
        let state = Arc::clone(&self.state);
        let value = text.to_string();
        self.nickname_debounce.lock().call(move || async move {
            let verdict = match checker.nickname_available(&value).await {
                Ok(true) => FieldCheck::Available,
                Ok(false) => FieldCheck::Taken,
                Err(err) => {
                    warn!("nickname check failed: {err}");
                    FieldCheck::Failed
                }
            };
            let mut form = state.lock();
            // Apply only if the field still holds the checked value.
            if form.nickname == value {
                form.nickname_check = verdict;
            }
        });
    }

    /// Update the Discord link field, with the same debounced check.
    pub fn set_discord_link(&self, text: &str) {
        {
            let mut form = self.state.lock();
            form.discord_link = text.to_string();
            let unchanged = self.original.discord_link.as_deref().unwrap_or_default() == text;
            if unchanged || text.trim().is_empty() {
                form.discord_check = FieldCheck::Idle;
                self.discord_debounce.lock().cancel();
                return;
            }
            form.discord_check = FieldCheck::Pending;
        }
        let checker = Arc::clone(&self.checker);
        let state = Arc::clone(&self.state);
        let value = text.to_string();
        self.discord_debounce.lock().call(move || async move {
            let verdict = match checker.discord_link_available(&value).await {
                Ok(true) => FieldCheck::Available,
                Ok(false) => FieldCheck::Taken,
                Err(err) => {
                    warn!("discord link check failed: {err}");
                    FieldCheck::Failed
                }
            };
            let mut form = state.lock();
            if form.discord_link == value {
                form.discord_check = verdict;
            }
        });
    }

    /// Whether the save action is currently allowed.
    pub fn can_save(&self) -> bool {
        let form = self.state.lock();
        if form.nickname.trim().is_empty() {
            return false;
        }
        !form.nickname_check.blocks_save() && !form.discord_check.blocks_save()
    }

    /// Assemble the profile to persist. Caller is responsible for checking
    /// [`can_save`](Self::can_save) first.
    pub fn to_profile(&self) -> UserProfile {
        let form = self.state.lock();
        let discord_link = form.discord_link.trim();
        UserProfile {
            id: self.original.id,
            nickname: form.nickname.trim().to_string(),
            discord_link: if discord_link.is_empty() {
                None
            } else {
                Some(discord_link.to_string())
            },
            preferred_categories: self.categories.selected().to_vec(),
        }
    }

    /// Drop pending validation timers, e.g. on unmount.
    pub fn cancel_pending(&self) {
        self.nickname_debounce.lock().cancel();
        self.discord_debounce.lock().cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChecker {
        taken_nicknames: Vec<String>,
        calls: AtomicUsize,
    }

    impl FakeChecker {
        fn new(taken: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                taken_nicknames: taken.iter().map(|s| s.to_string()).collect(),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl UniquenessChecker for FakeChecker {
        async fn nickname_available(&self, nickname: &str) -> Result<bool, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(!self.taken_nicknames.contains(&nickname.to_string()))
        }

        async fn discord_link_available(&self, _link: &str) -> Result<bool, ApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    fn original() -> UserProfile {
        UserProfile {
            id: 1,
            nickname: "dana".to_string(),
            discord_link: None,
            preferred_categories: vec![1, 2],
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_coalesce_into_one_check() {
        let checker = FakeChecker::new(&[]);
        let form = ProfileForm::new(checker.clone(), original());

        form.set_nickname("d");
        form.set_nickname("da");
        form.set_nickname("dax");
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(checker.calls.load(Ordering::SeqCst), 1);
        assert_eq!(form.nickname_check(), FieldCheck::Available);
        assert!(form.can_save());
    }

    #[tokio::test(start_paused = true)]
    async fn taken_nickname_blocks_save_inline() {
        let checker = FakeChecker::new(&["taken"]);
        let form = ProfileForm::new(checker, original());

        form.set_nickname("taken");
        assert_eq!(form.nickname_check(), FieldCheck::Pending);
        assert!(!form.can_save()); // pending also blocks
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(form.nickname_check(), FieldCheck::Taken);
        assert!(!form.can_save());
        assert!(FieldCheck::Taken.inline_message("nickname").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_nickname_needs_no_check() {
        let checker = FakeChecker::new(&[]);
        let form = ProfileForm::new(checker.clone(), original());

        form.set_nickname("dax");
        form.set_nickname("dana"); // back to the saved value
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(checker.calls.load(Ordering::SeqCst), 0);
        assert_eq!(form.nickname_check(), FieldCheck::Idle);
        assert!(form.can_save());
    }

    #[tokio::test(start_paused = true)]
    async fn to_profile_collects_edits() {
        let checker = FakeChecker::new(&[]);
        let mut form = ProfileForm::new(checker, original());
        form.set_nickname("dax");
        form.set_discord_link("https://discord.gg/party");
        form.categories.toggle(3, std::time::Instant::now());
        tokio::time::sleep(Duration::from_secs(2)).await;

        let profile = form.to_profile();
        assert_eq!(profile.nickname, "dax");
        assert_eq!(profile.discord_link.as_deref(), Some("https://discord.gg/party"));
        assert_eq!(profile.preferred_categories, vec![1, 2, 3]);
        assert_eq!(profile.id, 1);
    }
}
