//! Ironsight CLI - Command-line interface for the strength engine
//!
//! Commands:
//! - analyze: Turn a dashboard snapshot into a strength report
//! - validate: Report how much of a snapshot is usable
//! - standards: Print interpolated strength standards and classify a value
//! - doctor: Diagnose configuration and snapshot files

use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

use ironsight::aggregator::AggregationStats;
use ironsight::encoder::ReportEncoder;
use ironsight::pipeline::{parse_date, Analysis};
use ironsight::standards::{
    classify_lift, percentile, standards_for_bodyweight, Tier, BODYWEIGHT_BRACKETS,
};
use ironsight::types::ExerciseReport;
use ironsight::{
    AnalyticsError, EngineConfig, LiftCategory, Snapshot, IRONSIGHT_VERSION, PRODUCER_NAME,
};

/// Ironsight - Strength estimation and credibility engine
#[derive(Parser)]
#[command(name = "ironsight")]
#[command(version = IRONSIGHT_VERSION)]
#[command(about = "Estimate trustworthy one-rep maxes from workout logs", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a snapshot into a strength report
    Analyze {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        output_format: OutputFormat,

        /// Evaluation date (YYYY-MM-DD); defaults to today (UTC)
        #[arg(long)]
        today: Option<String>,

        /// Engine configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only report these exercises (repeatable)
        #[arg(long)]
        exercise: Vec<String>,
    },

    /// Report snapshot statistics: sets used and skipped, exercises found
    Validate {
        /// Snapshot file path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print strength standards for a category and bodyweight
    Standards {
        /// Lift category (e.g. bench_press); all categories when omitted
        #[arg(long)]
        category: Option<String>,

        /// Bodyweight in kg
        #[arg(long, default_value = "80")]
        bodyweight: f64,

        /// Classify this value (kg) against the thresholds
        #[arg(long)]
        value: Option<f64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose configuration and snapshot files
    Doctor {
        /// Check an engine configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Check a snapshot file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Newline-delimited JSON (one exercise per line)
    Ndjson,
    /// Compact JSON report
    Json,
    /// Pretty-printed JSON report
    JsonPretty,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            eprintln!(
                "{}",
                serde_json::to_string(&error).unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), IronsightCliError> {
    match cli.command {
        Commands::Analyze {
            input,
            output,
            output_format,
            today,
            config,
            exercise,
        } => cmd_analyze(
            &input,
            &output,
            output_format,
            today.as_deref(),
            config.as_deref(),
            &exercise,
        ),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Standards {
            category,
            bodyweight,
            value,
            json,
        } => cmd_standards(category.as_deref(), bodyweight, value, json),

        Commands::Doctor {
            config,
            snapshot,
            json,
        } => cmd_doctor(config.as_deref(), snapshot.as_deref(), json),
    }
}

fn read_input(input: &Path) -> Result<String, IronsightCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig, IronsightCliError> {
    match path {
        Some(path) => Ok(EngineConfig::from_json(&fs::read_to_string(path)?)?),
        None => Ok(EngineConfig::default()),
    }
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate, IronsightCliError> {
    match today {
        Some(raw) => Ok(parse_date(raw)?),
        None => Ok(Utc::now().date_naive()),
    }
}

fn cmd_analyze(
    input: &Path,
    output: &Path,
    output_format: OutputFormat,
    today: Option<&str>,
    config: Option<&Path>,
    exercises: &[String],
) -> Result<(), IronsightCliError> {
    let config = load_config(config)?;
    let today = resolve_today(today)?;
    let raw = read_input(input)?;
    let analysis = Analysis::from_json(&raw, today, config)?;

    let selected: Vec<ExerciseReport> = if exercises.is_empty() {
        analysis.exercise_reports()
    } else {
        exercises
            .iter()
            .map(|name| analysis.exercise_report(name))
            .collect::<Result<_, _>>()?
    };

    let encoder = ReportEncoder::new();
    let output_data = match output_format {
        OutputFormat::Ndjson => encoder.encode_to_ndjson(&selected)?,
        OutputFormat::Json => {
            let report = encoder.encode_exercises(&analysis, selected, analysis.overview().clone());
            serde_json::to_string(&report)?
        }
        OutputFormat::JsonPretty => {
            let report = encoder.encode_exercises(&analysis, selected, analysis.overview().clone());
            serde_json::to_string_pretty(&report)?
        }
    };

    if output.to_string_lossy() == "-" {
        print!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), IronsightCliError> {
    let raw = read_input(input)?;
    let snapshot = Snapshot::from_json(&raw)?;
    let analysis = Analysis::build(&snapshot, Utc::now().date_naive(), EngineConfig::default())?;

    let report = ValidationReport {
        generated_at: snapshot.generated_at.map(|t| t.to_rfc3339()),
        body_comp_records: snapshot.body_comp.len(),
        nutrition_days: snapshot.nutrition.len(),
        stats: analysis.stats().clone(),
        exercises: analysis
            .histories()
            .iter_ranked()
            .map(|h| ExerciseSummary {
                name: h.name.clone(),
                sessions: h.session_count(),
                category: h.tag.category.map(|c| c.to_string()),
                equipment: h.tag.equipment.as_str().to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let stats = &report.stats;
        println!("Validation Report");
        println!("=================");
        println!("Sessions:            {}", stats.sessions);
        println!("Sets total:          {}", stats.sets_total);
        println!("Sets used:           {}", stats.sets_used);
        println!("Skipped (drop set):  {}", stats.skipped_drop_sets);
        println!("Skipped (no load):   {}", stats.skipped_missing_load);
        println!("Skipped (no reps):   {}", stats.skipped_missing_reps);
        println!("Skipped (load <= 0): {}", stats.skipped_non_positive_load);
        println!("Exercises:           {}", stats.exercises);

        if !report.exercises.is_empty() {
            println!("\nExercises:");
            for e in &report.exercises {
                println!(
                    "  - {} ({} sessions, {}, {})",
                    e.name,
                    e.sessions,
                    e.equipment,
                    e.category.as_deref().unwrap_or("no standards")
                );
            }
        }
    }

    if report.stats.sets_total > 0 && report.stats.sets_used == 0 {
        Err(IronsightCliError::NoUsableSets(report.stats.sets_total))
    } else {
        Ok(())
    }
}

fn cmd_standards(
    category: Option<&str>,
    bodyweight: f64,
    value: Option<f64>,
    json: bool,
) -> Result<(), IronsightCliError> {
    let categories: Vec<LiftCategory> = match category {
        Some(raw) => vec![LiftCategory::from_str(raw)?],
        None => LiftCategory::ALL.to_vec(),
    };

    let rows: Vec<StandardsRow> = categories
        .into_iter()
        .map(|category| {
            let thresholds = standards_for_bodyweight(category, bodyweight);
            let classification = value.map(|v| {
                let c = classify_lift(v, &thresholds);
                ValueClassification {
                    value_kg: v,
                    tier: c.tier,
                    next_tier: c.next_tier,
                    delta_to_next: c.delta_to_next,
                    progress_pct: c.progress_pct,
                    percentile: percentile(v, &thresholds),
                }
            });
            StandardsRow {
                category: category.to_string(),
                bodyweight_kg: bodyweight,
                thresholds: thresholds.as_array(),
                classification,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("Strength standards at {:.1} kg bodyweight", bodyweight);
    println!(
        "{:<16} {:>9} {:>9} {:>12} {:>9} {:>9}",
        "category", "beginner", "novice", "intermediate", "advanced", "elite"
    );
    for row in &rows {
        let t = row.thresholds;
        println!(
            "{:<16} {:>9.1} {:>9.1} {:>12.1} {:>9.1} {:>9.1}",
            row.category, t[0], t[1], t[2], t[3], t[4]
        );
        if let Some(c) = &row.classification {
            let next = c.next_tier.map(|t| t.to_string()).unwrap_or_else(|| "-".to_string());
            println!(
                "  {:.1} kg: {} ({:.0}% to {}, {:.0} kg to go), percentile {:.1}",
                c.value_kg, c.tier, c.progress_pct, next, c.delta_to_next, c.percentile
            );
        }
    }

    Ok(())
}

fn cmd_doctor(
    config: Option<&Path>,
    snapshot: Option<&Path>,
    json: bool,
) -> Result<(), IronsightCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "ironsight_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Ironsight version {}", IRONSIGHT_VERSION),
    });

    checks.push(standards_table_check());

    if let Some(config_path) = config {
        checks.push(file_check("config", config_path, |content| {
            EngineConfig::from_json(content).map(|_| "Configuration valid".to_string())
        }));
    }

    if let Some(snapshot_path) = snapshot {
        checks.push(file_check("snapshot", snapshot_path, |content| {
            let snapshot = Snapshot::from_json(content)?;
            Ok(format!(
                "Snapshot valid ({} sessions, {} sets, {} body composition records)",
                snapshot.workouts.len(),
                snapshot.set_count(),
                snapshot.body_comp.len()
            ))
        }));
    }

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: IRONSIGHT_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Ironsight Doctor Report");
        println!("=======================");
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

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(IronsightCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

fn file_check(
    name: &str,
    path: &Path,
    validate: impl Fn(&str) -> Result<String, AnalyticsError>,
) -> DoctorCheck {
    if !path.exists() {
        return DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: format!("{} does not exist", path.display()),
        };
    }

    match fs::read_to_string(path) {
        Ok(content) => match validate(&content) {
            Ok(message) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Ok,
                message,
            },
            Err(e) => DoctorCheck {
                name: name.to_string(),
                status: CheckStatus::Error,
                message: e.to_string(),
            },
        },
        Err(e) => DoctorCheck {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot read {}: {}", path.display(), e),
        },
    }
}

/// Every interpolated row must rise with tier and with bodyweight
fn standards_table_check() -> DoctorCheck {
    let mut problems = Vec::new();
    for category in LiftCategory::ALL {
        let mut previous: Option<[f64; 5]> = None;
        for bodyweight in BODYWEIGHT_BRACKETS {
            let row = standards_for_bodyweight(category, bodyweight).as_array();
            if row.windows(2).any(|w| w[0] > w[1]) {
                problems.push(format!("{category} tiers out of order at {bodyweight} kg"));
            }
            if let Some(prev) = previous {
                if prev.iter().zip(row.iter()).any(|(a, b)| a > b) {
                    problems.push(format!("{category} decreases at {bodyweight} kg"));
                }
            }
            previous = Some(row);
        }
    }

    if problems.is_empty() {
        DoctorCheck {
            name: "standards_table".to_string(),
            status: CheckStatus::Ok,
            message: format!(
                "{} categories, {} brackets",
                LiftCategory::ALL.len(),
                BODYWEIGHT_BRACKETS.len()
            ),
        }
    } else {
        DoctorCheck {
            name: "standards_table".to_string(),
            status: CheckStatus::Error,
            message: problems.join("; "),
        }
    }
}

// Error types

#[derive(Debug)]
enum IronsightCliError {
    Io(io::Error),
    Analytics(AnalyticsError),
    Json(serde_json::Error),
    NoUsableSets(usize),
    DoctorFailed,
}

impl From<io::Error> for IronsightCliError {
    fn from(e: io::Error) -> Self {
        IronsightCliError::Io(e)
    }
}

impl From<AnalyticsError> for IronsightCliError {
    fn from(e: AnalyticsError) -> Self {
        match e {
            AnalyticsError::IoError(io) => IronsightCliError::Io(io),
            other => IronsightCliError::Analytics(other),
        }
    }
}

impl From<serde_json::Error> for IronsightCliError {
    fn from(e: serde_json::Error) -> Self {
        IronsightCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<IronsightCliError> for CliError {
    fn from(e: IronsightCliError) -> Self {
        match e {
            IronsightCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            IronsightCliError::Analytics(e) => {
                let hint = match &e {
                    AnalyticsError::JsonError(_) => {
                        "Check that the input is a dashboard snapshot document".to_string()
                    }
                    AnalyticsError::DateParseError(_) => {
                        "Dates use the YYYY-MM-DD format".to_string()
                    }
                    AnalyticsError::InvalidConfig(_) => {
                        "Run 'ironsight doctor --config <file>' for details".to_string()
                    }
                    AnalyticsError::UnknownExercise(_) => {
                        "Run 'ironsight validate' to list exercise names".to_string()
                    }
                    AnalyticsError::UnknownCategory(_) => {
                        let keys: Vec<&str> =
                            LiftCategory::ALL.iter().map(|c| c.as_str()).collect();
                        format!("Categories: {}", keys.join(", "))
                    }
                    _ => "Check input format".to_string(),
                };
                CliError {
                    code: e.code().to_string(),
                    message: e.to_string(),
                    hint: Some(hint),
                }
            }
            IronsightCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            IronsightCliError::NoUsableSets(total) => CliError {
                code: "NO_USABLE_SETS".to_string(),
                message: format!("None of {} sets could be used", total),
                hint: Some(
                    "Sets need a load and a rep count and must not be drop sets".to_string(),
                ),
            },
            IronsightCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    generated_at: Option<String>,
    body_comp_records: usize,
    nutrition_days: usize,
    stats: AggregationStats,
    exercises: Vec<ExerciseSummary>,
}

#[derive(serde::Serialize)]
struct ExerciseSummary {
    name: String,
    sessions: usize,
    category: Option<String>,
    equipment: String,
}

#[derive(serde::Serialize)]
struct StandardsRow {
    category: String,
    bodyweight_kg: f64,
    thresholds: [f64; 5],
    classification: Option<ValueClassification>,
}

#[derive(serde::Serialize)]
struct ValueClassification {
    value_kg: f64,
    tier: Tier,
    next_tier: Option<Tier>,
    delta_to_next: f64,
    progress_pct: f64,
    percentile: f64,
}

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
