//! Renderer-facing projection of a snapshot: formatted figures, change
//! directions and icon references per row, so the webview only lays them out.

use crate::ticker::icons::{local_asset_path, remote_icon_url};
use crate::ticker::numeric::{
    change_direction, format_compact, format_crypto_value, ChangeDirection, NOT_AVAILABLE,
};
use crate::ticker::types::{DisplaySnapshot, TickerEntry};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PercentChange {
    pub value: String,
    pub direction: ChangeDirection,
}

impl PercentChange {
    fn from_raw(raw: Option<&str>) -> Self {
        let value = raw
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        Self {
            value: value.to_string(),
            direction: change_direction(raw),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerRow {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub rank: u32,
    pub price: String,
    pub market_cap: String,
    pub market_cap_compact: String,
    pub volume_24h: String,
    pub change_1h: PercentChange,
    pub change_24h: PercentChange,
    pub change_7d: PercentChange,
    pub icon_path: String,
    pub icon_url: String,
}

impl From<&TickerEntry> for TickerRow {
    fn from(entry: &TickerEntry) -> Self {
        Self {
            id: entry.id.clone(),
            symbol: entry.symbol.clone(),
            name: entry.name.clone(),
            rank: entry.rank,
            price: format_crypto_value(entry.price_usd.as_deref(), NOT_AVAILABLE),
            market_cap: format_crypto_value(entry.market_cap_usd.as_deref(), NOT_AVAILABLE),
            market_cap_compact: format_compact(entry.market_cap_usd.as_deref().unwrap_or_default()),
            volume_24h: format_crypto_value(entry.volume24.as_deref(), NOT_AVAILABLE),
            change_1h: PercentChange::from_raw(entry.percent_change_1h.as_deref()),
            change_24h: PercentChange::from_raw(entry.percent_change_24h.as_deref()),
            change_7d: PercentChange::from_raw(entry.percent_change_7d.as_deref()),
            icon_path: local_asset_path(&entry.symbol),
            icon_url: remote_icon_url(&entry.symbol),
        }
    }
}

/// Snapshot plus one formatted row per list entry, in list order. `rows` is
/// empty unless the list is in the success state.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerView {
    pub snapshot: DisplaySnapshot,
    pub rows: Vec<TickerRow>,
}

impl From<DisplaySnapshot> for TickerView {
    fn from(snapshot: DisplaySnapshot) -> Self {
        let rows = snapshot
            .list
            .entries()
            .map(|entries| entries.iter().map(TickerRow::from).collect())
            .unwrap_or_default();
        Self { snapshot, rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::types::{SortSpec, ViewState};
    use std::sync::Arc;

    fn coin(symbol: &str, price: Option<&str>, change_24h: Option<&str>) -> TickerEntry {
        TickerEntry {
            id: symbol.to_ascii_lowercase(),
            name: symbol.to_string(),
            symbol: symbol.to_string(),
            rank: 1,
            price_usd: price.map(str::to_string),
            percent_change_1h: Some("0.05".to_string()),
            percent_change_24h: change_24h.map(str::to_string),
            percent_change_7d: Some("garbled".to_string()),
            market_cap_usd: Some("1320000000000.00".to_string()),
            volume24: Some("28500000000.5".to_string()),
            csupply: None,
            tsupply: None,
            msupply: None,
        }
    }

    #[test]
    fn row_formats_figures_for_display() {
        let row = TickerRow::from(&coin("btc", Some("67000.5"), Some("-1.10")));

        assert_eq!(row.price, "67,000.50");
        assert_eq!(row.market_cap, "1,320,000,000,000.00");
        assert_eq!(row.market_cap_compact, "1.32T");
        assert_eq!(row.volume_24h, "28,500,000,000.50");
        assert_eq!(row.change_24h.value, "-1.10");
        assert_eq!(row.change_24h.direction, ChangeDirection::Down);
        assert_eq!(row.change_1h.direction, ChangeDirection::Up);
        assert_eq!(row.icon_path, "downloaded_icons/BTC.png");
        assert_eq!(
            row.icon_url,
            "https://assets.coingecko.com/coins/images/1/standard/bitcoin.png"
        );
    }

    #[test]
    fn row_keeps_small_prices_and_garbled_text_readable() {
        let row = TickerRow::from(&coin("SHIB", Some("0.0000432"), None));

        assert_eq!(row.price, "0.0000432");
        assert_eq!(row.change_24h.value, NOT_AVAILABLE);
        assert_eq!(row.change_24h.direction, ChangeDirection::Up);
        assert_eq!(row.change_7d.value, "garbled");

        let missing = TickerRow::from(&coin("XYZ", None, None));
        assert_eq!(missing.price, NOT_AVAILABLE);
    }

    #[test]
    fn view_rows_follow_list_order() {
        let entries: Arc<[TickerEntry]> = Arc::from(vec![
            coin("ETH", Some("3100"), Some("2.0")),
            coin("BTC", Some("67000"), Some("1.0")),
        ]);
        let snapshot = DisplaySnapshot {
            list: ViewState::Success(Arc::clone(&entries)),
            banner: ViewState::Success(entries),
            ..DisplaySnapshot::initial(SortSpec::default())
        };

        let view = TickerView::from(snapshot);

        let symbols: Vec<&str> = view.rows.iter().map(|row| row.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["ETH", "BTC"]);
    }

    #[test]
    fn view_has_no_rows_outside_success() {
        let view = TickerView::from(DisplaySnapshot {
            list: ViewState::Error("timeout".to_string()),
            ..DisplaySnapshot::initial(SortSpec::default())
        });

        assert!(view.rows.is_empty());
        assert_eq!(view.snapshot.list, ViewState::Error("timeout".to_string()));
    }
}
