use crate::entities::address::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl Token {
    pub fn new(address: Address, symbol: impl AsRef<str>, decimals: u8) -> Self {
        Self {
            address,
            symbol: normalize_symbol(symbol.as_ref()),
            decimals,
        }
    }
}

/// Cleans a raw on-chain symbol: strips NUL padding and whitespace and folds
/// the tether variants (`USD₮0`, `USD₮`, `USDT0`) into `USDT`.
pub fn normalize_symbol(raw: &str) -> String {
    let cleaned = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    match cleaned {
        "USD₮0" | "USD₮" | "USDT0" => "USDT".to_string(),
        other => other.to_string(),
    }
}
