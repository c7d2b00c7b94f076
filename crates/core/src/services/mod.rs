//! Thin request/response wrappers, one per REST domain.
//!
//! Failure policy everywhere: log and rethrow. No local recovery and no
//! retries; the search service is the only one with extra semantics
//! (cancellation and a placeholder fallback).

pub mod category;
pub mod comment;
pub mod game;
pub mod search;
pub mod server;
pub mod user;
pub mod video;

pub use category::CategoryService;
pub use comment::CommentService;
pub use game::GameService;
pub use search::{SearchMode, SearchRequest, SearchService, PAGE_SIZE};
pub use server::{is_valid_invite_link, ServerService};
pub use user::UserService;
pub use video::VideoService;
