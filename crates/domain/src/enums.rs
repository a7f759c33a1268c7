use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Concentrated-liquidity deployments sharing the Uniswap V3 ABI layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolId {
    UniswapV3,
    PancakeSwapV3,
    SushiSwapV3,
}

impl ProtocolId {
    pub const ALL: [ProtocolId; 3] = [
        ProtocolId::UniswapV3,
        ProtocolId::PancakeSwapV3,
        ProtocolId::SushiSwapV3,
    ];

    /// Stable identifier used in configuration and on the command line.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        match self {
            ProtocolId::UniswapV3 => "uniswap_v3",
            ProtocolId::PancakeSwapV3 => "pancakeswap_v3",
            ProtocolId::SushiSwapV3 => "sushiswap_v3",
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            ProtocolId::UniswapV3 => "Uniswap V3",
            ProtocolId::PancakeSwapV3 => "PancakeSwap V3",
            ProtocolId::SushiSwapV3 => "SushiSwap V3",
        }
    }
}

impl fmt::Display for ProtocolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ProtocolId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "uniswap_v3" | "uniswap" | "univ3" => Ok(ProtocolId::UniswapV3),
            "pancakeswap_v3" | "pancakeswap" | "pancake" => Ok(ProtocolId::PancakeSwapV3),
            "sushiswap_v3" | "sushiswap" | "sushi" => Ok(ProtocolId::SushiSwapV3),
            _ => Err(format!("unknown protocol: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionStatus {
    /// Pool tick lies in `[tick_lower, tick_upper)`.
    InRange,
    OutOfRange,
    /// Liquidity is zero; the NFT still exists but holds no range.
    Closed,
}

/// How uncollected fees were derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeAccuracy {
    /// Full fee-growth accounting against both boundary ticks.
    Exact,
    /// Tick data was unavailable; only the recorded `tokensOwed` is reported.
    TokensOwedOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeStrategy {
    Conservative,
    Moderate,
    Aggressive,
}
