pub mod health;
#[cfg(feature = "desktop")]
pub mod ticker_feed;
