//! Small shared primitives: cancellation and debouncing.

pub mod cancel;
pub mod debounce;

pub use cancel::CancelToken;
pub use debounce::Debouncer;
