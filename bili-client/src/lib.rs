pub mod api;
pub mod crawler;
pub mod danmaku;
pub mod retry;
pub mod source;
pub mod throttle;


pub use api::{BiliApiClient, Endpoints};
pub use crawler::{CrawlOutcome, Crawler, InterruptFlag};
pub use danmaku::parse_comment_document;
pub use retry::{BlockRetryPolicy, RetryConfig, RetryStrategy};
pub use source::VideoSource;
pub use throttle::{Throttle, ThrottleConfig};
