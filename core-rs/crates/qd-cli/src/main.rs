mod bars;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "qd")]
#[command(about = "Quant backtest/risk/allocation core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> env -> overrides...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Run a single backtest over a bar file
    Backtest {
        #[command(subcommand)]
        cmd: BacktestCmd,
    },

    /// Walk-forward validation over a bar file
    Walkforward {
        #[command(subcommand)]
        cmd: WalkforwardCmd,
    },

    /// Paper trading account lifecycle
    Paper {
        #[command(subcommand)]
        cmd: PaperCmd,
    },

    /// Strategy registry
    Registry {
        #[command(subcommand)]
        cmd: RegistryCmd,
    },

    /// Capital allocation across eligible strategies
    Allocate {
        /// JSON file: array of {strategy_id, level, fitness, paper_days_active, sharpe}
        #[arg(long)]
        candidates: String,
        /// JSON file: {"pairs": [["a","b"], ...]}
        #[arg(long)]
        correlated_pairs: Option<String>,
        #[arg(long)]
        total_capital_usd: f64,
        #[arg(long, default_value_t = 10.0)]
        cash_reserve_pct: f64,
        #[arg(long, default_value_t = 20.0)]
        max_single_strategy_pct: f64,
        #[arg(long, default_value_t = 80.0)]
        max_total_exposure_pct: f64,
    },

    /// Fund-level daily risk classification
    Risk {
        #[command(subcommand)]
        cmd: RiskCmd,
    },

    /// Fitness-ranked strategy leaderboard
    Leaderboard {
        /// JSON file: array of {strategy_id, level, fitness, walk_forward_passed}
        #[arg(long)]
        profiles: String,
    },

    /// Pairwise return correlation
    Correlation {
        /// JSON file: {"series": {"name": [f64, ...], ...}}
        #[arg(long)]
        series: String,
        #[arg(long, default_value_t = qd_correlation::HIGH_CORRELATION_THRESHOLD)]
        threshold: f64,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,
    Migrate,
}

#[derive(Subcommand)]
enum BacktestCmd {
    Run {
        #[arg(long)]
        bars: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "equity")]
        market: String,
        #[arg(long, default_value = "sma_cross")]
        strategy: String,
        #[arg(long, default_value_t = 100_000_000_000)]
        initial_cash_micros: i64,
        #[arg(long, default_value_t = 5)]
        slippage_bps: i64,
    },
}

#[derive(Subcommand)]
enum WalkforwardCmd {
    Validate {
        #[arg(long)]
        bars: String,
        #[arg(long)]
        symbol: String,
        #[arg(long, default_value = "equity")]
        market: String,
        #[arg(long, default_value = "sma_cross")]
        strategy: String,
        #[arg(long, default_value_t = 100_000_000_000)]
        initial_cash_micros: i64,
        #[arg(long, default_value_t = 4)]
        window_count: usize,
    },
}

#[derive(Subcommand)]
enum PaperCmd {
    CreateAccount {
        #[arg(long, default_value = "equity")]
        market: String,
        #[arg(long)]
        initial_cash_micros: i64,
    },
    SubmitOrder {
        #[arg(long)]
        account_id: Uuid,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        side: String,
        #[arg(long, default_value = "market")]
        order_type: String,
        #[arg(long)]
        qty: i64,
        #[arg(long)]
        limit_price_micros: Option<i64>,
        #[arg(long)]
        current_price_micros: i64,
        #[arg(long, default_value_t = 5)]
        slippage_bps: i64,
    },
    Snapshot {
        #[arg(long)]
        account_id: Uuid,
        /// Repeatable SYMBOL=PRICE_MICROS marks, e.g. --mark AAPL=190500000
        #[arg(long = "mark", value_parser = parse_mark)]
        marks: Vec<(String, i64)>,
    },
    Metrics {
        #[arg(long)]
        account_id: Uuid,
        #[arg(long, default_value_t = 60)]
        history_limit: i64,
    },
}

#[derive(Subcommand)]
enum RegistryCmd {
    List,
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "l0_incubate")]
        level: String,
    },
    Promote {
        #[arg(long)]
        id: Uuid,
        #[arg(long = "to")]
        to_level: String,
    },
}

#[derive(Subcommand)]
enum RiskCmd {
    Evaluate {
        #[arg(long)]
        today_start_equity: f64,
        #[arg(long)]
        equity: f64,
        #[arg(long)]
        allocated_capital: f64,
    },
}

fn parse_mark(s: &str) -> Result<(String, i64), String> {
    let (symbol, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected SYMBOL=PRICE_MICROS, got '{s}'"))?;
    let price: i64 = price
        .parse()
        .map_err(|_| format!("invalid price_micros in '{s}'"))?;
    Ok((symbol.to_string(), price))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Db { cmd } => match cmd {
            DbCmd::Status => commands::db::status().await?,
            DbCmd::Migrate => commands::db::migrate().await?,
        },

        Commands::ConfigHash { paths } => commands::config::hash(paths).await?,

        Commands::Backtest { cmd } => match cmd {
            BacktestCmd::Run {
                bars,
                symbol,
                market,
                strategy,
                initial_cash_micros,
                slippage_bps,
            } => {
                commands::backtest::run(bars, symbol, market, strategy, initial_cash_micros, slippage_bps)
                    .await?
            }
        },

        Commands::Walkforward { cmd } => match cmd {
            WalkforwardCmd::Validate {
                bars,
                symbol,
                market,
                strategy,
                initial_cash_micros,
                window_count,
            } => {
                commands::walkforward::validate(
                    bars,
                    symbol,
                    market,
                    strategy,
                    initial_cash_micros,
                    window_count,
                )
                .await?
            }
        },

        Commands::Paper { cmd } => match cmd {
            PaperCmd::CreateAccount { market, initial_cash_micros } => {
                commands::paper::create_account(market, initial_cash_micros).await?
            }
            PaperCmd::SubmitOrder {
                account_id,
                symbol,
                side,
                order_type,
                qty,
                limit_price_micros,
                current_price_micros,
                slippage_bps,
            } => {
                commands::paper::submit_order(
                    account_id,
                    symbol,
                    side,
                    order_type,
                    qty,
                    limit_price_micros,
                    current_price_micros,
                    slippage_bps,
                )
                .await?
            }
            PaperCmd::Snapshot { account_id, marks } => {
                commands::paper::snapshot(account_id, marks).await?
            }
            PaperCmd::Metrics { account_id, history_limit } => {
                commands::paper::metrics(account_id, history_limit).await?
            }
        },

        Commands::Registry { cmd } => match cmd {
            RegistryCmd::List => commands::registry::list().await?,
            RegistryCmd::Register { name, level } => commands::registry::register(name, level).await?,
            RegistryCmd::Promote { id, to_level } => commands::registry::promote(id, to_level).await?,
        },

        Commands::Allocate {
            candidates,
            correlated_pairs,
            total_capital_usd,
            cash_reserve_pct,
            max_single_strategy_pct,
            max_total_exposure_pct,
        } => {
            commands::allocate::run(
                candidates,
                correlated_pairs,
                total_capital_usd,
                cash_reserve_pct,
                max_single_strategy_pct,
                max_total_exposure_pct,
            )
            .await?
        }

        Commands::Risk { cmd } => match cmd {
            RiskCmd::Evaluate { today_start_equity, equity, allocated_capital } => {
                commands::risk::evaluate(today_start_equity, equity, allocated_capital).await?
            }
        },

        Commands::Leaderboard { profiles } => commands::leaderboard::show(profiles).await?,

        Commands::Correlation { series, threshold } => {
            commands::correlation::show(series, threshold).await?
        }
    }

    Ok(())
}
