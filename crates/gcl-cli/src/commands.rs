use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use gcl_classify::{Assessment, Grade};
use gcl_ledger::{AuditReport, ReclassifyRequest, ReportOutcome, StatusReport, StreakLedger, Transition};
use gcl_server::{GclConfig, GclServer};
use gcl_store::SqliteLedgerStore;
use gcl_types::{Classification, Order, OrderId, UserAccount, UserId};
use serde::Serialize;

use crate::cli::*;

type Ledger = StreakLedger<SqliteLedgerStore>;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let Cli {
        command,
        format,
        config,
        db,
        ..
    } = cli;
    let config = load_config(config.as_deref(), db.as_deref())?;
    match command {
        Command::Serve(args) => cmd_serve(args, config),
        Command::Report(args) => {
            let outcome = cmd_report(&open_ledger(&config)?, args)?;
            emit(format, &outcome, print_outcome)
        }
        Command::Reclassify(args) => {
            let outcome = cmd_reclassify(&open_ledger(&config)?, args)?;
            emit(format, &outcome, print_outcome)
        }
        Command::User(args) => {
            let account = open_ledger(&config)?.account(&UserId::new(&args.user_id)?)?;
            emit(format, &account, print_account)
        }
        Command::Orders(args) => {
            let orders = open_ledger(&config)?.orders_for(&UserId::new(&args.user_id)?)?;
            emit(format, &orders, |orders| print_orders(orders))
        }
        Command::Order(args) => {
            let order = open_ledger(&config)?.order(&OrderId::new(&args.order_id)?)?;
            emit(format, &order, print_order)
        }
        Command::Audit(args) => {
            let report = open_ledger(&config)?.audit(&UserId::new(&args.user_id)?)?;
            emit(format, &AuditView::from(&report), |_| print_audit(&report))
        }
        Command::Classify(args) => {
            let assessment = cmd_classify(&config, args)?;
            emit(format, &assessment, print_assessment)
        }
    }
}

/// Read the config file, or start from defaults, and settle the ledger
/// database: `--db` wins, then the file's `store.path`. Without a file the
/// local default database is used, so one-shot commands and `serve` share it.
fn load_config(path: Option<&Path>, db: Option<&Path>) -> anyhow::Result<GclConfig> {
    let mut config = match path {
        Some(path) => GclConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GclConfig::default(),
    };
    match db {
        Some(db) => config.store.path = Some(db.to_path_buf()),
        None if path.is_none() => config.store.path = Some(PathBuf::from(DEFAULT_DB)),
        None => {}
    }
    Ok(config)
}

fn open_ledger(config: &GclConfig) -> anyhow::Result<Ledger> {
    let db = config
        .store
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DB));
    let store = SqliteLedgerStore::open(&db)
        .with_context(|| format!("opening ledger database {}", db.display()))?;
    Ok(StreakLedger::new(store, config.policy))
}

fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce(&T)) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(value),
    }
    Ok(())
}

impl From<ClassificationArgs> for Classification {
    fn from(args: ClassificationArgs) -> Self {
        Classification {
            product_label: args.label,
            sustainability_score: args.score,
            credit_amount: args.credit,
        }
    }
}

fn cmd_serve(args: ServeArgs, mut config: GclConfig) -> anyhow::Result<()> {
    if let Some(bind) = &args.bind {
        config.server.bind_addr = bind
            .parse()
            .with_context(|| format!("invalid bind address {bind}"))?;
    }

    let server = GclServer::open(config)?;
    println!(
        "{} GCL server on {}",
        "✓".green().bold(),
        server.config().server.bind_addr.to_string().bold()
    );
    tokio::runtime::Runtime::new()?.block_on(server.serve())?;
    Ok(())
}

fn cmd_report(ledger: &Ledger, args: ReportArgs) -> anyhow::Result<ReportOutcome> {
    let report = StatusReport::parse(&args.order_id, &args.user_id, &args.status)?
        .with_classification(args.classification.into());
    Ok(ledger.report(report)?)
}

fn cmd_reclassify(ledger: &Ledger, args: ReclassifyArgs) -> anyhow::Result<ReportOutcome> {
    let request = ReclassifyRequest::new(
        OrderId::new(&args.order_id)?,
        UserId::new(&args.user_id)?,
        args.classification.into(),
    );
    Ok(ledger.reclassify(request)?)
}

fn cmd_classify(config: &GclConfig, args: ClassifyArgs) -> anyhow::Result<Assessment> {
    let classifier = config.classifier.build();
    let text = args.text.join(" ");
    let assessment = tokio::runtime::Runtime::new()?.block_on(classifier.classify(&text))?;
    Ok(assessment)
}

/// Serializable summary of an audit.
#[derive(Serialize)]
struct AuditView {
    user_id: String,
    order_count: usize,
    active_awards: usize,
    clean: bool,
    violations: Vec<String>,
}

impl From<&AuditReport> for AuditView {
    fn from(report: &AuditReport) -> Self {
        Self {
            user_id: report.user_id.to_string(),
            order_count: report.order_count,
            active_awards: report.active_awards,
            clean: report.is_clean(),
            violations: report
                .violations
                .iter()
                .map(|v| v.description.clone())
                .collect(),
        }
    }
}

fn print_outcome(outcome: &ReportOutcome) {
    let label = match outcome.transition {
        Transition::Award => "award".green().bold(),
        Transition::Reset => "reset".yellow().bold(),
        Transition::Revert => "revert".red().bold(),
        Transition::NoOp => "no-op".dimmed(),
    };
    println!(
        "Order {} ({}) -> {}",
        outcome.order.order_id.to_string().yellow(),
        outcome.order.lifecycle_status,
        label
    );
    print_account(&outcome.account);
}

fn print_account(account: &UserAccount) {
    println!("User {}", account.user_id.to_string().bold());
    println!(
        "  Streak: {} (longest {})",
        account.current_streak.to_string().green().bold(),
        account.longest_streak
    );
    println!("  Credit: {:.1}", account.total_credit_score);
    println!("  Carbon rewards: {}", account.carbon_reward_count.to_string().cyan());
    if let Some(date) = account.last_award_date {
        println!("  Last award: {date}");
    }
}

fn print_order(order: &Order) {
    let sustainable = if order.is_sustainable {
        "sustainable".green()
    } else {
        "not sustainable".dimmed()
    };
    let applied = if order.award_applied { "applied".cyan() } else { "pending".dimmed() };
    println!(
        "{}  {}  {}  {}  {}",
        order.order_id.to_string().yellow(),
        order.lifecycle_status,
        sustainable,
        applied,
        order.product_label.as_deref().unwrap_or("-")
    );
}

fn print_orders(orders: &[Order]) {
    if orders.is_empty() {
        println!("No orders.");
    }
    for order in orders {
        print_order(order);
    }
}

fn print_audit(report: &AuditReport) {
    if report.is_clean() {
        println!(
            "{} Account {} consistent with {} orders ({} active awards)",
            "✓".green().bold(),
            report.user_id.to_string().bold(),
            report.order_count,
            report.active_awards
        );
        return;
    }
    println!(
        "{} Account {} has {} issue(s):",
        "✗".red().bold(),
        report.user_id.to_string().bold(),
        report.violations.len()
    );
    for violation in &report.violations {
        println!("  {:?}: {}", violation.kind, violation.description);
    }
}

fn print_assessment(assessment: &Assessment) {
    let grade = match assessment.grade {
        Grade::A | Grade::B => assessment.grade.as_str().green().bold(),
        Grade::C | Grade::D => assessment.grade.as_str().yellow().bold(),
        Grade::F => assessment.grade.as_str().red().bold(),
    };
    println!("Score: {} (grade {})", assessment.numeric_score, grade);
    if !assessment.materials.is_empty() {
        println!("Materials: {}", assessment.materials.join(", "));
    }
    println!("Carbon: {:.1} kg  Water: {:.0} L", assessment.carbon_footprint_kg, assessment.water_usage_liters);
    println!("{}", assessment.explanation.dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn config_for(db: &Path) -> GclConfig {
        load_config(None, Some(db)).unwrap()
    }

    fn report_args(order: &str, user: &str, status: &str, score: Option<f64>) -> ReportArgs {
        ReportArgs {
            order_id: order.into(),
            user_id: user.into(),
            status: status.into(),
            classification: ClassificationArgs {
                label: Some("Linen shirt".into()),
                score,
                credit: score,
            },
        }
    }

    #[test]
    fn report_and_reclassify_persist_to_the_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("ledger.db");

        {
            let ledger = open_ledger(&config_for(&db)).unwrap();
            let outcome = cmd_report(&ledger, report_args("o1", "u1", "delivered", Some(6.0))).unwrap();
            assert_eq!(outcome.transition, Transition::Award);
        }

        let ledger = open_ledger(&config_for(&db)).unwrap();
        let account = ledger.account(&UserId::new("u1").unwrap()).unwrap();
        assert_eq!(account.current_streak, 1);
        assert_eq!(account.total_credit_score, 6.0);

        let outcome = cmd_reclassify(
            &ledger,
            ReclassifyArgs {
                order_id: "o1".into(),
                user_id: "u1".into(),
                classification: ClassificationArgs {
                    label: None,
                    score: Some(9.0),
                    credit: Some(9.0),
                },
            },
        )
        .unwrap();
        assert_eq!(outcome.transition, Transition::Award);
        assert_eq!(outcome.account.total_credit_score, 9.0);
        assert!(ledger.audit(&UserId::new("u1").unwrap()).unwrap().is_clean());
    }

    #[test]
    fn report_rejects_unknown_status() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&config_for(&dir.path().join("ledger.db"))).unwrap();
        assert!(cmd_report(&ledger, report_args("o1", "u1", "misplaced", None)).is_err());
    }

    #[test]
    fn audit_view_summarizes_report() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = open_ledger(&config_for(&dir.path().join("ledger.db"))).unwrap();
        cmd_report(&ledger, report_args("o1", "u1", "delivered", Some(6.0))).unwrap();
        let report = ledger.audit(&UserId::new("u1").unwrap()).unwrap();

        let view = AuditView::from(&report);
        assert!(view.clean);
        assert_eq!(view.order_count, 1);
        assert_eq!(view.active_awards, 1);
        assert!(view.violations.is_empty());
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    #[test]
    fn without_config_the_default_database_is_used() {
        let config = load_config(None, None).unwrap();
        assert_eq!(config.store.path, Some(PathBuf::from(DEFAULT_DB)));
        assert_eq!(config.policy, gcl_types::RewardPolicy::default());
    }

    #[test]
    fn config_policy_and_store_reach_one_shot_commands() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("configured.db");
        let config_path = dir.path().join("gcl.toml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "[store]\npath = {:?}\n\n[policy]\nreward_threshold = 10.0",
            db.display().to_string()
        )
        .unwrap();

        let config = load_config(Some(config_path.as_path()), None).unwrap();
        assert_eq!(config.store.path, Some(db.clone()));
        let ledger = open_ledger(&config).unwrap();
        let outcome = cmd_report(&ledger, report_args("o1", "u1", "delivered", Some(12.0))).unwrap();
        assert_eq!(outcome.account.carbon_reward_count, 1);
        assert!(db.exists());

        let other = dir.path().join("override.db");
        let config = load_config(Some(config_path.as_path()), Some(other.as_path())).unwrap();
        assert_eq!(config.store.path, Some(other));
        assert_eq!(config.policy.reward_threshold, 10.0);
    }

    #[test]
    fn config_without_store_keeps_serve_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("gcl.toml");
        std::fs::write(&config_path, "[server]\nallow_cors = false\n").unwrap();

        let config = load_config(Some(config_path.as_path()), None).unwrap();
        assert!(config.store.path.is_none());
        assert!(!config.server.allow_cors);
    }

    #[test]
    fn classify_uses_the_configured_classifier() {
        let args = ClassifyArgs {
            text: vec!["Organic".into(), "hemp".into(), "tote".into()],
        };
        let assessment = cmd_classify(&GclConfig::default(), args).unwrap();
        assert_eq!(assessment.grade, Grade::A);
        assert_eq!(assessment.source, gcl_classify::Source::Fallback);
    }
}
