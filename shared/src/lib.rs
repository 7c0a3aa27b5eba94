pub mod github;
pub mod metrics;
pub mod streak;

pub use github::*;
pub use metrics::*;
pub use streak::longest_push_streak;
