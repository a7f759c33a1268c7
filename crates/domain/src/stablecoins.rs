//! Stablecoin recognition used to value positions without a price feed.

/// Symbols treated as pegged to one unit of fiat.
pub const STABLECOINS: &[&str] = &[
    "USDC", "USDT", "DAI", "BUSD", "TUSD", "FRAX", "LUSD", "USDP", "GUSD", "SUSD", "CUSD",
    "USDD", "PYUSD", "GHO", "FDUSD", "CRVUSD", "MKUSD", "USDC.E", "USDT.E", "DAI.E", "USDBC",
    "USDCE", "AXLUSDC", "EURS", "EURT", "AGEUR", "CEUR", "EURC", "GBPT", "MIM", "DOLA", "ALUSD",
    "USDS", "OUSD",
];

/// Which side of a pair is the stablecoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableSide {
    Token0,
    Token1,
}

pub fn is_stablecoin(symbol: &str) -> bool {
    let upper = symbol.trim().to_uppercase();
    STABLECOINS.contains(&upper.as_str())
}

/// The stable side of a pair, `None` when neither or both sides are stable.
pub fn stablecoin_side(symbol0: &str, symbol1: &str) -> Option<StableSide> {
    match (is_stablecoin(symbol0), is_stablecoin(symbol1)) {
        (true, false) => Some(StableSide::Token0),
        (false, true) => Some(StableSide::Token1),
        _ => None,
    }
}
