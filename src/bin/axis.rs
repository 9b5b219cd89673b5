//! Axis CLI - Command-line interface for Axis Life Score
//!
//! Commands:
//! - log: Record (or correct) a day and show the resulting score
//! - import: Bulk-load daily logs from NDJSON, a JSON array, or an export
//! - score: Show the Life Score for a date
//! - week: Show the average Life Score over the trailing week
//! - export: Print a user's raw history
//! - spots: Show the personal sweet spots in effect for a date
//! - doctor: Diagnose configuration and storage

use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use axis_life_score::{
    DailyLog, Factor, HistoryStore, JsonFileHistoryStore, LifeScoreEngine, LifeScoreResult,
    ScoreError, ScoringConfig, SweetSpotSet, UserHistory, AXIS_VERSION, PRODUCER_NAME,
};

/// Axis - Personal Life Score from daily wellbeing logs
#[derive(Parser)]
#[command(name = "axis")]
#[command(author = "Axis Contributors")]
#[command(version = AXIS_VERSION)]
#[command(about = "Score daily wellbeing logs against your own baseline", long_about = None)]
struct Cli {
    /// Directory holding one history file per user
    #[arg(long, global = true, env = "AXIS_DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Scoring configuration file (TOML, or JSON with a .json extension)
    #[arg(long, global = true, env = "AXIS_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record (or correct) a day and show the resulting score
    Log {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Date of the entry (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Mood (1-10)
        #[arg(long)]
        mood: Option<f64>,

        /// Hours slept (0-12)
        #[arg(long)]
        sleep: Option<f64>,

        /// Physical activity (0-10)
        #[arg(long)]
        activity: Option<f64>,

        /// Focus / productivity (0-10)
        #[arg(long)]
        focus: Option<f64>,

        /// Social connection (0-10)
        #[arg(long)]
        social: Option<f64>,

        /// Output the score as JSON
        #[arg(long)]
        json: bool,
    },

    /// Bulk-load daily logs
    Import {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Input file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "ndjson")]
        input_format: InputFormat,
    },

    /// Show the Life Score for a date
    Score {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the average Life Score over the trailing week
    Week {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Last day of the week (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print a user's raw history
    Export {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Show the personal sweet spots in effect for a date
    Spots {
        /// User id
        #[arg(short, long)]
        user: String,

        /// Reference date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and storage
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum InputFormat {
    /// Newline-delimited JSON (one daily log per line)
    Ndjson,
    /// JSON array of daily logs
    Json,
    /// History file as produced by `axis export`
    History,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<(), AxisCliError> {
    let Cli {
        data_dir,
        config,
        command,
    } = cli;

    // Doctor reports a broken config rather than failing on it
    let open = || open_engine(&data_dir, config.as_deref());

    match command {
        Commands::Log {
            user,
            date,
            mood,
            sleep,
            activity,
            focus,
            social,
            json,
        } => {
            let mut log = DailyLog::new(date.unwrap_or_else(today));
            log.mood = mood;
            log.sleep_hours = sleep;
            log.activity = activity;
            log.focus = focus;
            log.social = social;
            log.logged_at = Some(Utc::now());
            cmd_log(&mut open()?, &user, log, json)
        }

        Commands::Import {
            user,
            input,
            input_format,
        } => cmd_import(&mut open()?, &user, &input, input_format),

        Commands::Score { user, date, json } => {
            cmd_score(&open()?, &user, date.unwrap_or_else(today), json)
        }

        Commands::Week { user, date, json } => {
            cmd_week(&open()?, &user, date.unwrap_or_else(today), json)
        }

        Commands::Export { user, output } => cmd_export(&open()?, &user, &output),

        Commands::Spots { user, date, json } => {
            cmd_spots(&open()?, &user, date.unwrap_or_else(today), json)
        }

        Commands::Doctor { json } => cmd_doctor(&data_dir, config.as_deref(), json),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_config(config: Option<&Path>) -> Result<ScoringConfig, ScoreError> {
    match config {
        Some(path) => ScoringConfig::load(path),
        None => Ok(ScoringConfig::default()),
    }
}

fn open_engine(
    data_dir: &Path,
    config: Option<&Path>,
) -> Result<LifeScoreEngine<JsonFileHistoryStore>, AxisCliError> {
    let config = load_config(config)?;
    Ok(LifeScoreEngine::new(
        JsonFileHistoryStore::new(data_dir),
        config,
    )?)
}

fn cmd_log(
    engine: &mut LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    log: DailyLog,
    json: bool,
) -> Result<(), AxisCliError> {
    log.validate()?;
    let date = log.date;
    engine.append_or_update_log(user, log)?;

    let result = engine.compute_today_score(user, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("Entry saved ({date}).");
        print_score(&result);
    }
    Ok(())
}

fn cmd_import(
    engine: &mut LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    input: &Path,
    input_format: InputFormat,
) -> Result<(), AxisCliError> {
    let input_data = if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        fs::read_to_string(input)?
    };

    let logs = parse_logs(&input_data, &input_format)?;
    if logs.is_empty() {
        return Err(AxisCliError::NoLogs);
    }

    // Validate everything before writing anything
    for log in &logs {
        log.validate()?;
    }

    let count = logs.len();
    for log in logs {
        engine.append_or_update_log(user, log)?;
    }

    println!("Imported {count} daily logs for user {user}.");
    Ok(())
}

fn parse_logs(input: &str, format: &InputFormat) -> Result<Vec<DailyLog>, AxisCliError> {
    match format {
        InputFormat::Ndjson => input
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                serde_json::from_str(line.trim()).map_err(|e| {
                    AxisCliError::InvalidInput(format!("line {}: {}", index + 1, e))
                })
            })
            .collect(),
        InputFormat::Json => Ok(serde_json::from_str(input)?),
        InputFormat::History => Ok(UserHistory::from_json(input)?.iter().cloned().collect()),
    }
}

fn cmd_score(
    engine: &LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    date: NaiveDate,
    json: bool,
) -> Result<(), AxisCliError> {
    let result = engine.compute_today_score(user, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        let history = engine.export_raw_history(user)?;
        if let Some(note) = missing_entry_note(&history, date) {
            println!("{note}");
        }
        print_score(&result);
    }
    Ok(())
}

/// Note shown when the scored date itself has no log
fn missing_entry_note(history: &UserHistory, date: NaiveDate) -> Option<String> {
    if history.get(date).is_some() {
        return None;
    }
    Some(format!(
        "No entry for {date} yet; the score only reflects the previous days. Add one with 'axis log'."
    ))
}

fn cmd_week(
    engine: &LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    date: NaiveDate,
    json: bool,
) -> Result<(), AxisCliError> {
    let weekly = engine.compute_weekly_average(user, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&weekly)?);
        return Ok(());
    }

    let window = engine.scorer().config().weekly_window_days;
    match weekly {
        Some(weekly) => println!(
            "Average Life Score over {} logged day(s) ending {}: {:.1}",
            weekly.days_counted, weekly.reference_date, weekly.average
        ),
        None => println!("No data in the {window} days ending {date}."),
    }
    Ok(())
}

fn cmd_export(
    engine: &LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    output: &Path,
) -> Result<(), AxisCliError> {
    let history = engine.export_raw_history(user)?;
    let payload = history.to_json_pretty()?;

    if output.to_string_lossy() == "-" {
        println!("{payload}");
    } else {
        fs::write(output, payload)?;
    }
    Ok(())
}

fn cmd_spots(
    engine: &LifeScoreEngine<JsonFileHistoryStore>,
    user: &str,
    date: NaiveDate,
    json: bool,
) -> Result<(), AxisCliError> {
    let spots = engine.sweet_spots(user, date)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&spots)?);
    } else {
        println!("Sweet spots as of {date}:");
        print_sweet_spots(&spots);
    }
    Ok(())
}

fn cmd_doctor(data_dir: &Path, config: Option<&Path>, json: bool) -> Result<(), AxisCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "axis_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Axis version {}", AXIS_VERSION),
    });

    // Configuration
    checks.push(match (config, load_config(config)) {
        (None, _) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: "No config file; using built-in defaults".to_string(),
        },
        (Some(path), Ok(_)) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Ok,
            message: format!("Config file {} is valid", path.display()),
        },
        (Some(path), Err(e)) => DoctorCheck {
            name: "config".to_string(),
            status: CheckStatus::Error,
            message: format!("Config file {}: {}", path.display(), e),
        },
    });

    // Storage
    let store = JsonFileHistoryStore::new(data_dir);
    if !data_dir.exists() {
        checks.push(DoctorCheck {
            name: "data_dir".to_string(),
            status: CheckStatus::Warning,
            message: format!(
                "Data directory {} does not exist yet (created on first log)",
                data_dir.display()
            ),
        });
    } else {
        match store.user_ids() {
            Ok(ids) => {
                let mut unreadable = Vec::new();
                for id in &ids {
                    if let Err(e) = store.history(id) {
                        unreadable.push(format!("{id} ({e})"));
                    }
                }
                if unreadable.is_empty() {
                    checks.push(DoctorCheck {
                        name: "data_dir".to_string(),
                        status: CheckStatus::Ok,
                        message: format!(
                            "Data directory {} holds {} user histories",
                            data_dir.display(),
                            ids.len()
                        ),
                    });
                } else {
                    checks.push(DoctorCheck {
                        name: "data_dir".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Unreadable histories: {}", unreadable.join(", ")),
                    });
                }
            }
            Err(e) => checks.push(DoctorCheck {
                name: "data_dir".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read data directory {}: {}", data_dir.display(), e),
            }),
        }
    }

    // Check stdin is available (for `import --input -`)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (import from stdin ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: AXIS_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Axis Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(AxisCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn percent(value: f64) -> String {
    format!("{:.0}", value * 100.0)
}

fn print_score(result: &LifeScoreResult) {
    let breakdown = &result.breakdown;
    println!(
        "Life Score for {}: {} ({}, {})",
        result.date,
        result.rounded_score(),
        result.band,
        result.band.label()
    );
    println!(
        "Mood:      {} (m_eff {}, m_hat {})",
        percent(result.mood_component),
        percent(breakdown.m_eff),
        percent(breakdown.m_hat)
    );
    println!("Stability: {}", percent(result.stability_component));
    println!(
        "Factors:   sleep {} | focus {} | activity {} | social {}",
        percent(breakdown.lagged.sleep),
        percent(breakdown.lagged.focus),
        percent(breakdown.lagged.activity),
        percent(breakdown.lagged.social)
    );
    println!("Optimal zones:");
    print_sweet_spots(&breakdown.sweet_spots);
}

fn print_sweet_spots(spots: &SweetSpotSet) {
    for factor in Factor::ALL {
        let spot = spots.get(factor);
        let source = if spot.is_default() {
            "default".to_string()
        } else {
            format!("from {} days", spot.sample_days)
        };
        println!(
            "  - {}: optimum ~ {:.1}, tolerance +/-{:.1} ({})",
            factor, spot.optimal, spot.tolerance, source
        );
    }
}

// Error types

#[derive(Debug)]
enum AxisCliError {
    Io(io::Error),
    Score(ScoreError),
    Json(serde_json::Error),
    NotEnoughData(String),
    InvalidInput(String),
    NoLogs,
    DoctorFailed,
}

impl From<io::Error> for AxisCliError {
    fn from(e: io::Error) -> Self {
        AxisCliError::Io(e)
    }
}

impl From<ScoreError> for AxisCliError {
    fn from(e: ScoreError) -> Self {
        match e {
            ScoreError::NotEnoughData(msg) => AxisCliError::NotEnoughData(msg),
            other => AxisCliError::Score(other),
        }
    }
}

impl From<serde_json::Error> for AxisCliError {
    fn from(e: serde_json::Error) -> Self {
        AxisCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<AxisCliError> for CliError {
    fn from(e: AxisCliError) -> Self {
        match e {
            AxisCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            AxisCliError::Score(e) => {
                let (code, hint) = match &e {
                    ScoreError::InvalidConfig(_) | ScoreError::ConfigParseError(_) => {
                        ("CONFIG_ERROR", "Run 'axis doctor' to check the configuration")
                    }
                    ScoreError::InvalidLog(_) => (
                        "INVALID_LOG",
                        "Mood is 1-10, sleep 0-12 hours, other factors 0-10",
                    ),
                    ScoreError::InvalidUserId(_) => (
                        "INVALID_USER",
                        "User ids may contain letters, digits, '-' and '_'",
                    ),
                    _ => ("SCORE_ERROR", "Run 'axis doctor' for details"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            AxisCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            AxisCliError::NotEnoughData(msg) => CliError {
                code: "NOT_ENOUGH_DATA".to_string(),
                message: format!("Not enough data yet: {msg}"),
                hint: Some("Record a day with 'axis log'".to_string()),
            },
            AxisCliError::InvalidInput(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Each line must be one daily log object".to_string()),
            },
            AxisCliError::NoLogs => CliError {
                code: "NO_LOGS".to_string(),
                message: "No daily logs found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            AxisCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ndjson_skips_blank_lines() {
        let input = "{\"date\": \"2024-03-01\", \"mood\": 6}\n\n{\"date\": \"2024-03-02\", \"sleep\": 7.5}\n";
        let logs = parse_logs(input, &InputFormat::Ndjson).unwrap();
        assert_eq!(logs.len(), 2);
        assert_eq!(logs[1].sleep_hours, Some(7.5));
    }

    #[test]
    fn test_parse_ndjson_reports_line() {
        let input = "{\"date\": \"2024-03-01\", \"mood\": 6}\nnot json\n";
        match parse_logs(input, &InputFormat::Ndjson) {
            Err(AxisCliError::InvalidInput(msg)) => assert!(msg.starts_with("line 2")),
            _ => panic!("expected a parse error"),
        }
    }

    #[test]
    fn test_missing_entry_note() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let history = UserHistory::from_logs(vec![DailyLog::new(yesterday).with(Factor::Mood, 7.0)]);

        let note = missing_entry_note(&history, day).unwrap();
        assert!(note.starts_with("No entry for 2024-03-10"));
        assert_eq!(missing_entry_note(&history, yesterday), None);
    }

    #[test]
    fn test_parse_exported_history() {
        let input = r#"{"entries": [{"date": "2024-03-02", "mood": 8}, {"date": "2024-03-01", "mood": 5}]}"#;
        let logs = parse_logs(input, &InputFormat::History).unwrap();
        assert_eq!(logs[0].mood, Some(5.0));
        assert_eq!(logs[1].mood, Some(8.0));
    }
}
