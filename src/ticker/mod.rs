pub mod banner;
pub mod coinlore;
pub mod display;
pub mod icons;
pub mod numeric;
pub mod sort;
pub mod sync;
pub mod types;

pub const TICKER_SNAPSHOT_EVENT: &str = "ticker_snapshot";
pub const TICKER_BANNER_EVENT: &str = "ticker_banner";
