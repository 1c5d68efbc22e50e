//! chatlens - dashboard views over processed group chat archives
//!
//! Selects NDJSON archives from the data directory and prints one view or the
//! full report.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Archives: $XDG_DATA_HOME/chatlens/processed/ (override with `--data-dir`)
//! - Config: $XDG_CONFIG_HOME/chatlens/config.toml
//! - Logs: $XDG_STATE_HOME/chatlens/chatlens.log

use anyhow::{Context, Result};
use chatlens_core::analytics::{
    DailyPoint, DailyTrend, Heatmap, HistogramBin, LengthHistograms, MessageTypeDistribution,
    PaymentStats, SourceRatio, Summary, TopUsers, UserPaymentRanking, UserTrend,
};
use chatlens_core::{AggregateResult, Config, LoadReport, SelectionManager, ViewKey};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatlens")]
#[command(about = "Dashboard views over processed group chat archives")]
#[command(version)]
struct Args {
    /// Archive directory (default: from config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Mirror log events to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List archive files in the data directory
    Files,

    /// Print one view of the selected files
    View {
        /// View name (summary, daily, heatmap, top-users, message-types,
        /// histograms, payments, payment-ranking, source-ratio, user-trend)
        view: String,

        /// Archive file to select (repeatable, order kept)
        #[arg(short, long = "file", required = true)]
        files: Vec<String>,

        /// Sender id for user-trend
        #[arg(short, long)]
        user: Option<String>,

        /// Rows to keep in rankings (default: analytics.top_n)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Print every dashboard view as one JSON document
    Report {
        /// Archive file to select (repeatable, order kept)
        #[arg(short, long = "file", required = true)]
        files: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load().context("failed to load configuration")?;
    if args.verbose {
        config.logging.stderr = true;
    }
    if let Some(dir) = &args.data_dir {
        config.data.dir = Some(dir.clone());
    }
    let _log_guard = chatlens_core::logging::init(&config.logging).ok();

    let manager = SelectionManager::from_config(&config);
    tracing::debug!(data_dir = %manager.data_dir().display(), "Using data directory");

    match args.command {
        Command::Files => list_files(&manager),
        Command::View {
            view,
            files,
            user,
            limit,
            format,
        } => {
            let limit = limit.or(Some(config.analytics.top_n));
            let key = ViewKey::from_name(&view, limit, user.as_deref())
                .context("invalid view arguments")?;
            select(&manager, &files)?;
            let result = manager.view(&key);

            match format.as_str() {
                "json" => println!("{}", serde_json::to_string_pretty(&*result)?),
                "text" => print_view(&key, &result),
                other => anyhow::bail!("Unknown format: {}. Use 'text' or 'json'", other),
            }
            Ok(())
        }
        Command::Report { files } => {
            select(&manager, &files)?;
            let report = manager.report();
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn list_files(manager: &SelectionManager) -> Result<()> {
    let files = manager
        .available_files()
        .context("failed to list archive files")?;
    if files.is_empty() {
        eprintln!("No archive files in {}", manager.data_dir().display());
    }
    for name in files {
        println!("{}", name);
    }
    Ok(())
}

fn select(manager: &SelectionManager, files: &[String]) -> Result<LoadReport> {
    let report = manager
        .select(files)
        .with_context(|| format!("failed to select {}", files.join(", ")))?;
    if report.skipped_lines > 0 {
        eprintln!(
            "warning: skipped {} malformed line(s) while loading",
            report.skipped_lines
        );
    }
    Ok(report)
}

fn print_view(key: &ViewKey, result: &AggregateResult) {
    println!("== {} ==", key);
    match result {
        AggregateResult::Summary(v) => print_summary(v),
        AggregateResult::DailyTrend(v) => print_daily(v),
        AggregateResult::Heatmap(v) => print_heatmap(v),
        AggregateResult::TopUsers(v) => print_top_users(v),
        AggregateResult::MessageTypes(v) => print_message_types(v),
        AggregateResult::LengthHistograms(v) => print_histograms(v),
        AggregateResult::Payments(v) => print_payments(v),
        AggregateResult::UserPaymentRanking(v) => print_payment_ranking(v),
        AggregateResult::SourceRatio(v) => print_source_ratio(v),
        AggregateResult::UserTrend(v) => print_user_trend(v),
    }
}

fn print_summary(summary: &Summary) {
    println!("   Messages:        {}", summary.total_messages);
    println!("   Users:           {}", summary.total_users);
    println!("   Red packets:     {:.2}", summary.total_redpacket_amount);
    println!("   Avg length:      {:.2}", summary.avg_content_length);
    println!("   Avg tokens:      {:.2}", summary.avg_token_length);
    println!(
        "   Active days:     {} (longest streak {})",
        summary.active_days, summary.longest_streak_days
    );
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("   Range:           {} to {}", first, last);
    }
}

fn print_days(days: &[DailyPoint]) {
    if days.is_empty() {
        println!("   No activity.");
    }
    for day in days {
        println!(
            "   {}  {:>6} msgs  {:>9.2}",
            day.date, day.message_count, day.redpacket_amount
        );
    }
}

fn print_daily(trend: &DailyTrend) {
    print_days(&trend.days);
}

fn print_user_trend(trend: &UserTrend) {
    println!("   Sender: {}", trend.sender_id);
    print_days(&trend.days);
}

fn print_heatmap(heatmap: &Heatmap) {
    print!("   {:<4}", "");
    for hour in 0..Heatmap::HOURS {
        print!("{:>4}", hour);
    }
    println!();
    for weekday in 0..Heatmap::WEEKDAYS as u8 {
        print!("   {:<4}", &Heatmap::weekday_name(weekday)[..3]);
        for hour in 0..Heatmap::HOURS as u8 {
            print!("{:>4}", heatmap.count(weekday, hour));
        }
        println!();
    }
    if let Some(hour) = heatmap.peak_hour {
        println!("   Peak hour:    {:02}:00", hour);
    }
    if let Some(weekday) = heatmap.busiest_weekday {
        println!("   Busiest day:  {}", Heatmap::weekday_name(weekday));
    }
}

fn print_top_users(top: &TopUsers) {
    if top.users.is_empty() {
        println!("   No senders.");
    }
    for (i, user) in top.users.iter().enumerate() {
        println!(
            "   {:>3}. {:<24} {:<16} {:>6}",
            i + 1,
            user.sender_name,
            user.sender_id,
            user.message_count
        );
    }
}

fn print_message_types(types: &MessageTypeDistribution) {
    let rows = [
        ("text", types.counts.text, types.percentages.text),
        ("image", types.counts.image, types.percentages.image),
        ("redpacket", types.counts.redpacket, types.percentages.redpacket),
    ];
    for (name, count, pct) in rows {
        println!("   {:<10} {:>8}  {:>5.1}%", name, count, pct);
    }
}

fn print_bins(title: &str, bins: &[HistogramBin]) {
    println!("   {}", title);
    for bin in bins.iter().filter(|b| b.count > 0) {
        println!("     {:<12} {:>8}", bin.label, bin.count);
    }
}

fn print_histograms(hist: &LengthHistograms) {
    print_bins("Content length", &hist.content_length);
    print_bins("Token count", &hist.token_count);
}

fn print_payments(stats: &PaymentStats) {
    println!(
        "   Total: {:.2} over {} events ({} outliers excluded)",
        stats.total_amount, stats.event_count, stats.excluded_count
    );
    for (day, running) in stats.daily.iter().zip(&stats.cumulative) {
        println!(
            "   {}  {:>9.2}  {:>10.2}",
            day.date, day.amount, running.cumulative_amount
        );
    }
}

fn print_payment_ranking(ranking: &UserPaymentRanking) {
    if ranking.users.is_empty() {
        println!("   No red packets.");
    }
    for (i, user) in ranking.users.iter().enumerate() {
        println!(
            "   {:>3}. {:<16} {:>9.2}  ({} events)",
            i + 1,
            user.sender_id,
            user.total_amount,
            user.event_count
        );
    }
}

fn print_source_ratio(ratio: &SourceRatio) {
    for day in &ratio.days {
        println!(
            "   {}  web {:>5.1}%  mobile {:>5.1}%  ({} msgs)",
            day.date,
            day.web_ratio * 100.0,
            day.mobile_ratio * 100.0,
            day.total
        );
    }
}
