use clap::{Parser, Subcommand};

pub mod formatters;
pub mod runner;

#[derive(Parser)]
#[command(name = "cartera")]
#[command(version, about = "Portfolio valuation from an operations ledger")]
#[command(
    long_about = "Reconstruct holdings from a CSV ledger of buys, sells, coupons, dividends and amortizations, value them against a daily price table, and report current composition or the evolution over a period."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the current portfolio composition with gains
    Composition {
        /// Path to the operations CSV
        #[arg(short, long)]
        operations: String,

        /// Path to the daily prices CSV
        #[arg(short, long)]
        prices: String,

        /// Valuation date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        as_of: Option<String>,

        /// Write the report rows to a CSV file
        #[arg(long)]
        export: Option<String>,

        /// Print the calculation trace (resets, active ledgers, prices used)
        #[arg(long)]
        trace: bool,

        /// Zero-quantity tolerance for residual detection
        #[arg(long)]
        epsilon: Option<String>,
    },

    /// Show how holdings and value changed over a period
    Evolution {
        /// Path to the operations CSV
        #[arg(short, long)]
        operations: String,

        /// Path to the daily prices CSV
        #[arg(short, long)]
        prices: String,

        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Write the report rows to a CSV file
        #[arg(long)]
        export: Option<String>,

        /// Print the calculation trace (resets, active ledgers, prices used)
        #[arg(long)]
        trace: bool,

        /// Zero-quantity tolerance for residual detection
        #[arg(long)]
        epsilon: Option<String>,
    },

    /// Show the operation history of one asset over a period
    Detail {
        /// Path to the operations CSV
        #[arg(short, long)]
        operations: String,

        /// Path to the daily prices CSV
        #[arg(short, long)]
        prices: String,

        /// Asset identifier (as it appears in the ledger)
        #[arg(short, long)]
        asset: String,

        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        from: String,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        to: String,

        /// Write the report rows to a CSV file
        #[arg(long)]
        export: Option<String>,

        /// Print the calculation trace (resets, active ledgers, prices used)
        #[arg(long)]
        trace: bool,

        /// Zero-quantity tolerance for residual detection
        #[arg(long)]
        epsilon: Option<String>,
    },
}
