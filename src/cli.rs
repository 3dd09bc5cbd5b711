use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cropsafe",
    version,
    about = "Pesticide withdrawal countdowns and weather risk alerts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Evaluate countdowns as of this date (YYYY-MM-DD) instead of today
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config, open the database and fetch the forecast
    Check,
    /// Record a pesticide application
    Log {
        /// Product name, e.g. "Mancozeb"
        product: String,

        /// Withdrawal period in days (defaults to the known-product table)
        #[arg(long)]
        days: Option<i64>,

        /// Date the product was applied (defaults to today)
        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<NaiveDate>,

        /// Free-text notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List applications with days remaining
    List,
    /// Remove an application by id or unambiguous id prefix
    Remove { id: String },
    /// Show whether the farm is clear to harvest
    Status,
    /// Show the forecast and the risk alerts it raises
    Alerts {
        /// Only evaluate one rule (mildew, leaf or wind)
        #[arg(long)]
        rule: Option<String>,
    },
    /// Show known products and their default withdrawal periods
    Products,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_command() {
        let cli = Cli::try_parse_from([
            "cropsafe",
            "--as-of",
            "2024-08-05",
            "log",
            "Mancozeb",
            "--days",
            "5",
            "--date",
            "2024-08-01",
        ])
        .unwrap();

        assert_eq!(cli.as_of, NaiveDate::from_ymd_opt(2024, 8, 5));
        match cli.command {
            Some(Commands::Log {
                product,
                days,
                date,
                notes,
            }) => {
                assert_eq!(product, "Mancozeb");
                assert_eq!(days, Some(5));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 8, 1));
                assert!(notes.is_none());
            }
            _ => panic!("expected log command"),
        }
    }

    #[test]
    fn no_command_means_tui() {
        let cli = Cli::try_parse_from(["cropsafe", "-vv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn rejects_malformed_date() {
        assert!(Cli::try_parse_from(["cropsafe", "--as-of", "05/08/2024", "status"]).is_err());
    }
}
