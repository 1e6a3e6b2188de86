//! Icon references for ticker symbols. Whether a local asset actually exists
//! is for the renderer to check.

const LOCAL_ICON_DIR: &str = "downloaded_icons";
const REMOTE_ICON_BASE_URL: &str = "https://assets.coingecko.com/coins/images";

// symbol -> (CoinGecko image id, image name)
const REMOTE_ICONS: [(&str, u32, &str); 10] = [
    ("BTC", 1, "bitcoin"),
    ("ETH", 279, "ethereum"),
    ("USDT", 325, "tether"),
    ("BNB", 825, "binance-coin-logo"),
    ("USDC", 6319, "usdc"),
    ("XRP", 44, "xrp-symbol-white-128"),
    ("ADA", 975, "cardano"),
    ("SOL", 4128, "solana"),
    ("DOGE", 5, "dogecoin"),
    ("MATIC", 4713, "matic-token-icon"),
];
const DEFAULT_REMOTE_ICON: (u32, &str) = (1, "bitcoin");

pub fn local_asset_path(symbol: &str) -> String {
    format!("{LOCAL_ICON_DIR}/{}.png", symbol.trim().to_ascii_uppercase())
}

pub fn remote_icon_url(symbol: &str) -> String {
    let symbol = symbol.trim();
    let (image_id, image_name) = REMOTE_ICONS
        .iter()
        .find(|(known, _, _)| known.eq_ignore_ascii_case(symbol))
        .map(|(_, image_id, image_name)| (*image_id, *image_name))
        .unwrap_or(DEFAULT_REMOTE_ICON);

    format!("{REMOTE_ICON_BASE_URL}/{image_id}/standard/{image_name}.png")
}
