//! Client-only filter state and the shared category picker.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::models::MAX_SELECTED_CATEGORIES;

/// Upper bound of the price range slider, in currency units.
pub const PRICE_CEILING: u32 = 100_000;
/// Upper bound of the concurrent-player range.
pub const PLAYER_CEILING: u32 = 100;
/// How long a transient picker notice stays visible.
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

/// Transient filter selection. Never persisted server-side; serialized to
/// the session store and to query parameters for shareability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOptions {
    /// Selected category ids, at most [`MAX_SELECTED_CATEGORIES`].
    pub categories: Vec<u64>,
    /// Minimum rating, when set.
    pub min_rating: Option<f32>,
    /// Lower edge of the price range.
    pub price_min: u32,
    /// Upper edge of the price range, at most [`PRICE_CEILING`].
    pub price_max: u32,
    /// Lower edge of the player-count range.
    pub players_min: u32,
    /// Upper edge of the player-count range, at most [`PLAYER_CEILING`].
    pub players_max: u32,
    /// Restrict to games playable solo.
    pub single_player: bool,
    /// Restrict to games playable with others.
    pub multi_player: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            min_rating: None,
            price_min: 0,
            price_max: PRICE_CEILING,
            players_min: 1,
            players_max: PLAYER_CEILING,
            single_player: false,
            multi_player: false,
        }
    }
}

impl FilterOptions {
    /// True when nothing deviates from the defaults, i.e. the search is
    /// unfiltered.
    pub fn is_empty(&self) -> bool {
        *self == FilterOptions::default()
    }

    /// Append the non-default members as wire query pairs.
    pub fn extend_query(&self, pairs: &mut Vec<(&'static str, String)>) {
        if !self.categories.is_empty() {
            let joined = self
                .categories
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(",");
            pairs.push(("category_ids", joined));
        }
        if let Some(rating) = self.min_rating {
            pairs.push(("min_rating", format!("{rating}")));
        }
        if self.price_min > 0 {
            pairs.push(("price_min", self.price_min.to_string()));
        }
        if self.price_max < PRICE_CEILING {
            pairs.push(("price_max", self.price_max.to_string()));
        }
        if self.players_min > 1 {
            pairs.push(("players_min", self.players_min.to_string()));
        }
        if self.players_max < PLAYER_CEILING {
            pairs.push(("players_max", self.players_max.to_string()));
        }
        if self.single_player {
            pairs.push(("single_player", "true".to_string()));
        }
        if self.multi_player {
            pairs.push(("multi_player", "true".to_string()));
        }
    }
}

/// Short-lived notice raised by the picker, e.g. on a rejected selection.
#[derive(Debug, Clone)]
pub struct Notice {
    /// The message to display.
    pub text: String,
    raised_at: Instant,
}

impl Notice {
    fn new(text: String, now: Instant) -> Self {
        Self {
            text,
            raised_at: now,
        }
    }

    /// Whether the notice has outlived [`NOTICE_TTL`] at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.raised_at) >= NOTICE_TTL
    }
}

/// Category multi-select shared by the filter modal and the profile
/// editor. Enforces the five-category cap with a transient notice rather
/// than an error.
#[derive(Debug, Clone, Default)]
pub struct CategoryPicker {
    selected: Vec<u64>,
    notice: Option<Notice>,
}

impl CategoryPicker {
    /// A picker pre-seeded with `selected`.
    pub fn new(selected: Vec<u64>) -> Self {
        Self {
            selected,
            notice: None,
        }
    }

    /// The current selection, in toggle order.
    pub fn selected(&self) -> &[u64] {
        &self.selected
    }

    /// Consume the picker, keeping the selection.
    pub fn into_selected(self) -> Vec<u64> {
        self.selected
    }

    /// Whether `id` is part of the selection.
    pub fn is_selected(&self, id: u64) -> bool {
        self.selected.contains(&id)
    }

    /// Toggle a category. A sixth selection is rejected: the existing five
    /// stay unchanged and a notice is raised for [`NOTICE_TTL`].
    pub fn toggle(&mut self, id: u64, now: Instant) {
        if let Some(position) = self.selected.iter().position(|&selected| selected == id) {
            self.selected.remove(position);
            return;
        }
        if self.selected.len() >= MAX_SELECTED_CATEGORIES {
            self.notice = Some(Notice::new(
                format!("You can select up to {MAX_SELECTED_CATEGORIES} categories"),
                now,
            ));
            return;
        }
        self.selected.push(id);
    }

    /// Currently visible notice, dropping it once expired.
    pub fn notice(&mut self, now: Instant) -> Option<&str> {
        if let Some(notice) = &self.notice {
            if notice.is_expired(now) {
                self.notice = None;
            }
        }
        self.notice.as_ref().map(|notice| notice.text.as_str())
    }

    /// Drop the whole selection and any notice.
    pub fn clear(&mut self) {
        self.selected.clear();
        self.notice = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixth_selection_is_rejected_with_notice() {
        let now = Instant::now();
        let mut picker = CategoryPicker::new(vec![1, 2, 3, 4, 5]);
        picker.toggle(6, now);
        assert_eq!(picker.selected(), &[1, 2, 3, 4, 5]);
        assert!(picker.notice(now).is_some());
    }

    #[test]
    fn notice_expires_after_ttl() {
        let now = Instant::now();
        let mut picker = CategoryPicker::new(vec![1, 2, 3, 4, 5]);
        picker.toggle(6, now);
        assert!(picker.notice(now + Duration::from_secs(1)).is_some());
        assert!(picker.notice(now + NOTICE_TTL).is_none());
        // Once dropped it stays gone.
        assert!(picker.notice(now + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn toggle_removes_existing_selection() {
        let now = Instant::now();
        let mut picker = CategoryPicker::new(vec![1, 2, 3]);
        picker.toggle(2, now);
        assert_eq!(picker.selected(), &[1, 3]);
        picker.toggle(2, now);
        assert_eq!(picker.selected(), &[1, 3, 2]);
    }

    #[test]
    fn empty_filters_report_empty() {
        assert!(FilterOptions::default().is_empty());
        let filters = FilterOptions {
            price_max: 50_000,
            ..Default::default()
        };
        assert!(!filters.is_empty());
    }

    #[test]
    fn only_non_default_members_hit_the_wire() {
        let mut pairs = Vec::new();
        FilterOptions::default().extend_query(&mut pairs);
        assert!(pairs.is_empty());

        let filters = FilterOptions {
            categories: vec![3, 9],
            min_rating: Some(4.0),
            price_max: 50_000,
            single_player: true,
            ..Default::default()
        };
        let mut pairs = Vec::new();
        filters.extend_query(&mut pairs);
        assert!(pairs.contains(&("category_ids", "3,9".to_string())));
        assert!(pairs.contains(&("min_rating", "4".to_string())));
        assert!(pairs.contains(&("price_max", "50000".to_string())));
        assert!(pairs.contains(&("single_player", "true".to_string())));
        assert!(!pairs.iter().any(|(key, _)| *key == "players_min"));
    }
}
