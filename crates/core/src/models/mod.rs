//! Shared domain models mirroring the storefront REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum characters allowed in a comment body.
pub const MAX_COMMENT_LEN: usize = 50;
/// Maximum line breaks allowed in a comment body.
pub const MAX_COMMENT_LINES: usize = 15;
/// A profile or filter may reference at most this many categories.
pub const MAX_SELECTED_CATEGORIES: usize = 5;

/// Wire envelope wrapping every endpoint's payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-endpoint success discriminator; checked against a literal,
    /// independent of the HTTP status.
    pub message: String,
    /// The payload itself.
    pub data: T,
}

/// A storefront game. Read-only from the client's perspective.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Stable game id.
    pub id: u64,
    /// Display title.
    pub title: String,
    /// Cover image, when the storefront has one.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    /// Current best price across platforms, in currency units.
    pub current_price: u32,
    /// Historical lowest price seen.
    pub lowest_price: u32,
    /// Average user rating, 0 to 5.
    #[serde(default)]
    pub rating: Option<f32>,
    /// Category ids the game is listed under.
    #[serde(default)]
    pub category_ids: Vec<u64>,
    /// Playable solo.
    #[serde(default)]
    pub single_player: bool,
    /// Playable with others.
    #[serde(default)]
    pub multi_player: bool,
    /// Developer credit.
    #[serde(default)]
    pub developer: Option<String>,
    /// Publisher credit.
    #[serde(default)]
    pub publisher: Option<String>,
    /// Release date as the storefront formats it.
    #[serde(default)]
    pub release_date: Option<String>,
}

impl Game {
    /// Saving relative to the current price, as a percentage. Zero when the
    /// game has never been cheaper than it is now.
    pub fn discount_percent(&self) -> u32 {
        if self.current_price == 0 || self.lowest_price >= self.current_price {
            return 0;
        }
        // Widened so the intermediate product cannot overflow u32.
        let saved = u64::from(self.current_price - self.lowest_price);
        (saved * 100 / u64::from(self.current_price)) as u32
    }
}

/// Global category label. Loaded once per session and cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable category id.
    pub id: u64,
    /// Display label.
    pub name: String,
}

/// The authenticated user's profile. Absent entirely for guests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Stable account id; the basis for ownership checks.
    pub id: u64,
    /// Unique display name.
    pub nickname: String,
    /// Personal Discord invite, when shared.
    #[serde(default)]
    pub discord_link: Option<String>,
    /// Up to [`MAX_SELECTED_CATEGORIES`] preferred category ids.
    #[serde(default)]
    pub preferred_categories: Vec<u64>,
}

/// A comment attached to a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Stable comment id.
    pub id: u64,
    /// Account id of the author.
    pub author_id: u64,
    /// Author's nickname at the time of writing.
    pub author_name: String,
    /// Body text, within [`MAX_COMMENT_LEN`] / [`MAX_COMMENT_LINES`].
    pub content: String,
    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
    /// Last edit time, when edited.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Soft-deletion time, when removed.
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Comment {
    /// Ownership compares stable user ids, not display names: two users can
    /// share a nickname.
    pub fn is_owned_by(&self, profile: &UserProfile) -> bool {
        self.author_id == profile.id
    }
}

/// Why a comment body was rejected client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentRejection {
    /// Nothing but whitespace.
    Empty,
    /// Over [`MAX_COMMENT_LEN`] characters.
    TooLong,
    /// Over [`MAX_COMMENT_LINES`] line breaks.
    TooManyLines,
}

impl std::fmt::Display for CommentRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommentRejection::Empty => write!(f, "Comment cannot be empty"),
            CommentRejection::TooLong => {
                write!(f, "Comment must be at most {MAX_COMMENT_LEN} characters")
            }
            CommentRejection::TooManyLines => {
                write!(f, "Comment must have at most {MAX_COMMENT_LINES} line breaks")
            }
        }
    }
}

/// Validate a comment body before it is sent.
pub fn validate_comment(content: &str) -> Result<(), CommentRejection> {
    if content.trim().is_empty() {
        return Err(CommentRejection::Empty);
    }
    if content.chars().count() > MAX_COMMENT_LEN {
        return Err(CommentRejection::TooLong);
    }
    if content.matches('\n').count() > MAX_COMMENT_LINES {
        return Err(CommentRejection::TooManyLines);
    }
    Ok(())
}

/// Discord invite metadata for a party-finding server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfo {
    /// Stable server record id.
    pub id: u64,
    /// Game the server was registered under.
    pub game_id: u64,
    /// Account id of the user who registered it.
    pub owner_id: u64,
    /// The Discord invite link.
    pub invite_url: String,
    /// Server name as resolved from the invite.
    pub name: String,
    /// Server icon, when Discord provides one.
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Member count at resolution time.
    #[serde(default)]
    pub member_count: u32,
    /// Invite expiry; `None` for a permanent invite.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ServerInfo {
    /// Whether `profile` registered this server. Id comparison, as with
    /// comments.
    pub fn is_owned_by(&self, profile: &UserProfile) -> bool {
        self.owner_id == profile.id
    }

    /// Whether the invite has lapsed at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|expiry| expiry <= now).unwrap_or(false)
    }
}

/// A hosted video attached to a game's detail page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    /// Stable video id.
    pub id: u64,
    /// Game the video belongs to.
    pub game_id: u64,
    /// Video title.
    pub title: String,
    /// Playback URL.
    pub url: String,
    /// Preview image, when available.
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// One point in a game's price history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRecord {
    /// When the price was observed.
    pub recorded_at: DateTime<Utc>,
    /// Observed price in currency units.
    pub price: u32,
    /// Storefront platform the price was seen on.
    #[serde(default)]
    pub platform: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: u64, nickname: &str) -> UserProfile {
        UserProfile {
            id,
            nickname: nickname.to_string(),
            discord_link: None,
            preferred_categories: Vec::new(),
        }
    }

    #[test]
    fn comment_ownership_uses_ids_not_names() {
        let comment = Comment {
            id: 1,
            author_id: 7,
            author_name: "dana".to_string(),
            content: "nice".to_string(),
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        // Same display name, different account: not the owner.
        assert!(!comment.is_owned_by(&profile(8, "dana")));
        assert!(comment.is_owned_by(&profile(7, "dana")));
    }

    #[test]
    fn comment_validation_boundaries() {
        assert_eq!(validate_comment("   "), Err(CommentRejection::Empty));
        assert!(validate_comment(&"a".repeat(MAX_COMMENT_LEN)).is_ok());
        assert_eq!(
            validate_comment(&"a".repeat(MAX_COMMENT_LEN + 1)),
            Err(CommentRejection::TooLong)
        );
        let short_many_breaks = "a\n".repeat(MAX_COMMENT_LINES + 1);
        assert_eq!(
            validate_comment(&short_many_breaks),
            Err(CommentRejection::TooManyLines)
        );
    }

    #[test]
    fn discount_percent_handles_degenerate_prices() {
        let mut game = Game {
            id: 1,
            title: "Sample".to_string(),
            thumbnail_url: None,
            current_price: 40_000,
            lowest_price: 30_000,
            rating: None,
            category_ids: Vec::new(),
            single_player: true,
            multi_player: false,
            developer: None,
            publisher: None,
            release_date: None,
        };
        assert_eq!(game.discount_percent(), 25);
        game.lowest_price = 40_000;
        assert_eq!(game.discount_percent(), 0);
        game.current_price = 0;
        assert_eq!(game.discount_percent(), 0);
        // Prices near u32::MAX must not overflow the percentage math.
        game.current_price = u32::MAX;
        game.lowest_price = u32::MAX / 2;
        assert_eq!(game.discount_percent(), 50);
    }

    #[test]
    fn server_expiry() {
        let now = Utc::now();
        let server = ServerInfo {
            id: 1,
            game_id: 2,
            owner_id: 3,
            invite_url: "https://discord.gg/abc".to_string(),
            name: "Raid night".to_string(),
            icon_url: None,
            member_count: 12,
            expires_at: Some(now - chrono::Duration::minutes(1)),
        };
        assert!(server.is_expired(now));
        let open_ended = ServerInfo {
            expires_at: None,
            ..server
        };
        assert!(!open_ended.is_expired(now));
    }
}
