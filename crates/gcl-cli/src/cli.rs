use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Ledger database used when neither `--db` nor the config names one.
pub const DEFAULT_DB: &str = "greenchoice.db";

#[derive(Parser)]
#[command(
    name = "gcl",
    about = "GreenChoice Ledger: sustainable-purchase streaks and carbon rewards",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file; its policy, classifier and store apply to every command
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite ledger database [default: the config's store, else greenchoice.db]
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Report a new lifecycle status for an order
    Report(ReportArgs),
    /// Replace an order's classification
    Reclassify(ReclassifyArgs),
    /// Show a user's streak and credit
    User(UserArgs),
    /// List a user's orders
    Orders(UserArgs),
    /// Show one order
    Order(OrderArgs),
    /// Check a user's account against their orders
    Audit(UserArgs),
    /// Score product text with the configured classifier
    Classify(ClassifyArgs),
}

#[derive(Args)]
pub struct ServeArgs {
    /// Override the configured listen address
    #[arg(long)]
    pub bind: Option<String>,
}

/// Classifier fields given on the command line.
#[derive(Args, Clone, Debug, Default)]
pub struct ClassificationArgs {
    #[arg(long)]
    pub label: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub score: Option<f64>,
    #[arg(long)]
    pub credit: Option<f64>,
}

#[derive(Args)]
pub struct ReportArgs {
    pub order_id: String,
    pub user_id: String,
    /// placed, shipped, delivered, cancelled, returned, refunded or replaced
    pub status: String,
    #[command(flatten)]
    pub classification: ClassificationArgs,
}

#[derive(Args)]
pub struct ReclassifyArgs {
    pub order_id: String,
    pub user_id: String,
    #[command(flatten)]
    pub classification: ClassificationArgs,
}

#[derive(Args)]
pub struct UserArgs {
    pub user_id: String,
}

#[derive(Args)]
pub struct OrderArgs {
    pub order_id: String,
}

#[derive(Args)]
pub struct ClassifyArgs {
    #[arg(required = true)]
    pub text: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_report_with_classification() {
        let cli = Cli::try_parse_from([
            "gcl", "report", "o1", "u1", "delivered", "--label", "Hemp tote", "--score", "7",
            "--credit", "7.5",
        ])
        .unwrap();
        if let Command::Report(args) = cli.command {
            assert_eq!(args.order_id, "o1");
            assert_eq!(args.status, "delivered");
            assert_eq!(args.classification.label.as_deref(), Some("Hemp tote"));
            assert_eq!(args.classification.score, Some(7.0));
            assert_eq!(args.classification.credit, Some(7.5));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_negative_score() {
        let cli = Cli::try_parse_from(["gcl", "reclassify", "o1", "u1", "--score", "-4"]).unwrap();
        if let Command::Reclassify(args) = cli.command {
            assert_eq!(args.classification.score, Some(-4.0));
            assert!(args.classification.credit.is_none());
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::try_parse_from([
            "gcl", "user", "u1", "--db", "/tmp/l.db", "--format", "json", "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/l.db")));
        assert!(matches!(cli.command, Command::User(_)));
    }

    #[test]
    fn db_and_config_are_optional() {
        let cli = Cli::try_parse_from(["gcl", "orders", "u1"]).unwrap();
        assert!(cli.db.is_none());
        assert!(cli.config.is_none());
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn config_applies_to_one_shot_commands() {
        let cli = Cli::try_parse_from(["gcl", "audit", "u1", "-c", "gcl.toml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("gcl.toml")));
        assert!(matches!(cli.command, Command::Audit(_)));
    }

    #[test]
    fn parse_serve() {
        let cli =
            Cli::try_parse_from(["gcl", "serve", "--config", "gcl.toml", "--bind", "0.0.0.0:8080"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("gcl.toml")));
        if let Command::Serve(args) = cli.command {
            assert_eq!(args.bind.as_deref(), Some("0.0.0.0:8080"));
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn classify_requires_text() {
        assert!(Cli::try_parse_from(["gcl", "classify"]).is_err());
        let cli = Cli::try_parse_from(["gcl", "classify", "bamboo", "toothbrush"]).unwrap();
        if let Command::Classify(args) = cli.command {
            assert_eq!(args.text.join(" "), "bamboo toothbrush");
        } else {
            panic!("wrong command");
        }
    }
}
