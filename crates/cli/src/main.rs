//! Command line interface for reading concentrated liquidity positions.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use clmm_lens_domain::entities::Address;
use clmm_lens_domain::enums::ProtocolId;
use clmm_lens_domain::value_objects::PositionData;
use clmm_lens_protocols::prelude::*;
use dotenv::dotenv;
use primitive_types::U256;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "clmm-lens")]
#[command(about = "Reads Uniswap V3 compatible liquidity positions straight from chain", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read a position's full state
    Read {
        /// Position NFT id
        #[arg(value_parser = parse_token_id)]
        token_id: U256,

        /// Network name; searched across all networks when omitted
        #[arg(short, long)]
        network: Option<String>,

        /// Protocol (uniswap_v3, pancakeswap_v3, sushiswap_v3)
        #[arg(short, long)]
        protocol: Option<ProtocolId>,

        /// Pool address; resolved through the factory when omitted
        #[arg(long)]
        pool: Option<Address>,

        /// USD price of token0
        #[arg(long)]
        token0_usd: Option<Decimal>,

        /// USD price of token1
        #[arg(long)]
        token1_usd: Option<Decimal>,

        /// Pool 24h volume in USD
        #[arg(long)]
        volume: Option<Decimal>,

        /// Pool TVL in USD
        #[arg(long)]
        tvl: Option<Decimal>,

        /// Fail instead of reporting tokensOwed when tick data is unavailable
        #[arg(long)]
        strict_fees: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find which network and protocol hold a position id
    Locate {
        #[arg(value_parser = parse_token_id)]
        token_id: U256,

        #[arg(short, long)]
        network: Option<String>,

        #[arg(short, long)]
        protocol: Option<ProtocolId>,
    },
    /// List the positions a wallet holds on one network
    List {
        /// Wallet address
        wallet: Address,

        #[arg(short, long)]
        network: String,

        #[arg(short, long)]
        protocol: Option<ProtocolId>,

        #[arg(long)]
        json: bool,
    },
    /// Show configured networks and deployments
    Networks,
}

fn parse_token_id(raw: &str) -> std::result::Result<U256, String> {
    U256::from_dec_str(raw.trim()).map_err(|e| format!("invalid token id {raw}: {e:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let registry = Arc::new(Registry::from_env().context("loading network configuration")?);

    match cli.command {
        Commands::Read {
            token_id,
            network,
            protocol,
            pool,
            token0_usd,
            token1_usd,
            volume,
            tvl,
            strict_fees,
            json,
        } => {
            let client = client()?;
            let filter = CandidateFilter { network, protocol };
            let candidate = resolve_candidate(&client, &registry, token_id, &filter).await?;

            let fee_fallback = if strict_fees {
                FeeFallbackPolicy::Strict
            } else {
                FeeFallbackPolicy::Degrade
            };
            let reader = PositionReader::new(
                client,
                ReaderConfig {
                    fee_fallback,
                    ..ReaderConfig::default()
                },
            );
            let data = reader
                .read(&ReadRequest {
                    candidate,
                    token_id,
                    pool,
                    market: MarketInputs {
                        token0_usd,
                        token1_usd,
                        volume_24h_usd: volume,
                        tvl_usd: tvl,
                    },
                })
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&data)?);
            } else {
                print_position(&data);
            }
        }
        Commands::Locate {
            token_id,
            network,
            protocol,
        } => {
            let locator = PositionLocator::new(client()?, registry, LocatorConfig::default());
            let found = locator
                .locate(token_id, &CandidateFilter { network, protocol })
                .await?;
            println!(
                "✅ Position #{} is on {} ({})",
                token_id,
                found.candidate.protocol.display_name(),
                found.candidate.network.name
            );
            println!("   Pair:      {} / {}", found.position.token0, found.position.token1);
            println!("   Fee tier:  {}", found.position.fee.label());
            println!(
                "   Ticks:     [{}, {}]",
                found.position.tick_lower, found.position.tick_upper
            );
            println!("   Liquidity: {}", found.position.liquidity);
        }
        Commands::List {
            wallet,
            network,
            protocol,
            json,
        } => {
            let indexer = WalletIndexer::new(client()?, registry, IndexerConfig::default());
            let listed = indexer.list_positions(&network, wallet, protocol).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&listed)?);
                return Ok(());
            }

            println!(
                "📋 {} positions for {} on {}",
                listed.positions.len(),
                listed.wallet,
                listed.network
            );
            println!(
                "{:<16} | {:<10} | {:<18} | {:<7} | {:<20} | {:<8}",
                "Protocol", "Id", "Pair", "Fee", "Ticks", "Status"
            );
            println!("{}", "-".repeat(92));
            for p in &listed.positions {
                println!(
                    "{:<16} | {:<10} | {:<18} | {:<7} | {:<20} | {:<8}",
                    p.protocol.display_name(),
                    p.token_id,
                    format!("{}/{}", p.token0_symbol, p.token1_symbol),
                    p.fee.label(),
                    format!("[{}, {}]", p.tick_lower, p.tick_upper),
                    if p.active { "active" } else { "closed" }
                );
            }
            for failure in &listed.failures {
                println!("⚠️  {} could not be indexed: {}", failure.protocol.display_name(), failure.error);
            }
        }
        Commands::Networks => {
            println!(
                "{:<10} | {:<8} | {:<24} | {:<32}",
                "Network", "Chain", "RPC", "Protocols"
            );
            println!("{}", "-".repeat(82));
            for network in registry.networks() {
                let protocols: Vec<&str> = registry
                    .protocols()
                    .iter()
                    .filter(|p| p.deployments.contains_key(&network.name))
                    .map(|p| p.id.display_name())
                    .collect();
                println!(
                    "{:<10} | {:<8} | {:<24} | {:<32}",
                    network.name,
                    network.chain_id,
                    network.rpc_url,
                    protocols.join(", ")
                );
            }
        }
    }

    Ok(())
}

fn client() -> Result<Arc<dyn EthCall>> {
    let provider = RpcProvider::new(RpcConfig::from_env()).context("building RPC client")?;
    Ok(Arc::new(provider))
}

/// Uses the single matching deployment when the filter pins one, otherwise
/// searches for the position.
async fn resolve_candidate(
    client: &Arc<dyn EthCall>,
    registry: &Arc<Registry>,
    token_id: U256,
    filter: &CandidateFilter,
) -> Result<Candidate> {
    let mut candidates = registry.candidates(filter);
    match candidates.len() {
        0 => bail!("no deployment matches the given network and protocol"),
        1 => Ok(candidates.remove(0)),
        n => {
            info!(candidates = n, "Locating position before reading");
            let locator = PositionLocator::new(
                Arc::clone(client),
                Arc::clone(registry),
                LocatorConfig::default(),
            );
            Ok(locator.locate(token_id, filter).await?.candidate)
        }
    }
}

fn print_position(data: &PositionData) {
    println!(
        "\n📊 Position #{} | {} on {}",
        data.token_id,
        data.protocol.display_name(),
        data.network
    );
    println!("════════════════════════════════════");
    println!(
        "Pair:            {}/{} ({})",
        data.token0.symbol, data.token1.symbol, data.fee_label
    );
    println!("Pool:            {}", data.pool);
    println!("Status:          {:?}", data.status);
    println!("Current price:   {:.6}", data.current_price.value);
    match &data.range {
        Some(range) => println!(
            "Range:           {:.6} - {:.6}",
            range.lower_price.value, range.upper_price.value
        ),
        None => println!(
            "Range:           ticks [{}, {}]",
            data.tick_lower, data.tick_upper
        ),
    }
    println!(
        "Amounts:         {:.6} {} + {:.6} {}",
        data.amount0, data.token0.symbol, data.amount1, data.token1.symbol
    );
    println!(
        "Composition:     {:.1}% / {:.1}%",
        data.token0_pct, data.token1_pct
    );
    println!(
        "Value:           {:.4} {}",
        data.value_in_token1, data.token1.symbol
    );
    println!(
        "Uncollected:     {:.6} {} + {:.6} {} ({:?})",
        data.fees0, data.token0.symbol, data.fees1, data.token1.symbol, data.fee_accuracy
    );
    println!("Capital eff.:    {:.2}x", data.capital_efficiency);
    println!("Pool share:      {:.6}%", data.pool_share_pct);
    if let Some(usd) = &data.usd {
        println!(
            "Value (USD):     ${:.2} ({:?})",
            usd.total_usd, usd.source
        );
        println!("Fees (USD):      ${:.2}", usd.fees_usd);
    }
    if let Some(fee_yield) = &data.fee_yield {
        println!(
            "Fee APY (est.):  {:.2}% (${:.2}/day)",
            fee_yield.apy_pct, fee_yield.daily_fees_usd
        );
    }
    if let Some(apr) = data.pool_apr_pct {
        println!("Pool APR:        {:.2}%", apr);
    }
    if let Some(ratio) = data.volume_tvl_ratio {
        println!("Volume / TVL:    {:.4}", ratio);
    }
    if let Some(analytics) = &data.analytics {
        println!(
            "Range width:     {:.2}% ({:?})",
            analytics.width_pct, analytics.strategy
        );
        println!(
            "IL at bounds:    {:.2}% / {:.2}%",
            analytics.il_at_lower.v3 * Decimal::ONE_HUNDRED,
            analytics.il_at_upper.v3 * Decimal::ONE_HUNDRED
        );
    }
    if let Some(losses) = &data.fees_vs_loss {
        println!(
            "Fees net of IL:  ${:.2} at lower / ${:.2} at upper",
            losses.net_at_lower_usd, losses.net_at_upper_usd
        );
    }
    if !data.strategies.is_empty() {
        println!("Suggested ranges:");
        for s in &data.strategies {
            println!(
                "  {:<13} {:.4} - {:.4}  CE {:.2}x  APR {:.2}%  ${:.2}/day",
                format!("{:?}", s.strategy),
                s.lower_price,
                s.upper_price,
                s.capital_efficiency,
                s.apr_estimate_pct,
                s.daily_fees_usd
            );
        }
    }
    println!("════════════════════════════════════");
    match data.audit.block_number {
        Some(block) => println!("Block {} via {}", block, data.audit.rpc_url),
        None => println!("Latest block via {}", data.audit.rpc_url),
    }
    println!(
        "Fetched {}",
        data.audit.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
}
