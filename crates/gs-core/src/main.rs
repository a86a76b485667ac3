//! Gift Score - expected-score modelling for live-stream gift records
//!
//! The `giftscore` entry point, handling:
//! - Record extraction with conditions, slices, and ordering
//! - Segmented regression of the expected-score model
//! - Band classification and class tallies
//! - Model inspection and configuration checks

use clap::{Args, Parser, Subcommand};
use gs_common::{Error, NormalizedRecord, OutputFormat, StructuredError, SCHEMA_VERSION};
use gs_config::{
    load_config, validate_config, ConfigSnapshot, PresetName, ResolvedConfig, ValidationError,
};
use gs_core::classify::{assign_classes, BandClass};
use gs_core::exit_codes::ExitCode;
use gs_core::filter::{self, Predicate, Slice, SortOrder, DEFAULT_KEYS};
use gs_core::fit::{compare_feature_sets, fit, FitOptions};
use gs_core::load::load_paths;
use gs_core::log_event;
use gs_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use gs_core::model::{PiecewiseModel, DEFAULT_SAMPLES};
use gs_core::normalize::normalize_groups;
use gs_core::summary::{class_table, DEFAULT_COINS, DEFAULT_MAX_GIFTERS};
use gs_core::validation::validate_all;
use serde_json::{json, Value};
use std::path::PathBuf;

/// Gift Score - fit and classify live-stream scores against gift totals
#[derive(Parser)]
#[command(name = "giftscore")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Analysis configuration file (TOML or JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Model preset, overriding the configuration (linear-3x, ru-v2)
    #[arg(long, global = true)]
    preset: Option<String>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "json")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all log output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Reject records that fail data-quality checks
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print normalized records matching conditions and slices
    Extract(ExtractArgs),

    /// Fit the segmented expected-score model
    Fit(FitArgs),

    /// Assign performance bands
    Classify(ClassifyArgs),

    /// Evaluate, sample, or inspect the active model
    Model(ModelArgs),

    /// Validate the resolved configuration
    Check,
}

#[derive(Args, Debug, Default)]
struct FilterArgs {
    /// Condition 'key<op>value' (repeatable; all must hold)
    #[arg(long = "cond", value_name = "COND")]
    conditions: Vec<String>,

    /// Slice: a date, a score floor like 100k+, a rank, or date/rank (repeatable)
    #[arg(long = "slice", value_name = "SLICE")]
    slices: Vec<String>,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// Record files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Sort key; prefix with '-' for ascending order
    #[arg(long, default_value = filter::DEFAULT_ORDER_KEY, allow_hyphen_values = true)]
    order: String,

    /// Fields to print (repeatable); whole records when omitted in JSON output
    #[arg(long = "key", value_name = "KEY")]
    keys: Vec<String>,
}

#[derive(Args, Debug)]
struct FitArgs {
    /// Record files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Range lower edge (repeatable; replaces the configured boundaries)
    #[arg(long = "boundary", value_name = "X")]
    boundaries: Vec<f64>,

    /// Keep records under the exclusion line
    #[arg(long)]
    no_exclude: bool,

    /// Slope forced onto the first segment
    #[arg(long, conflicts_with = "no_slope_override")]
    first_slope: Option<f64>,

    /// Keep the fitted first-segment slope
    #[arg(long)]
    no_slope_override: bool,

    /// Also compare nested feature sets over the whole population
    #[arg(long)]
    features: bool,
}

#[derive(Args, Debug)]
struct ClassifyArgs {
    /// Record files or directories
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    /// Print the class tally by gifter count instead of per-record classes
    #[arg(long)]
    table: bool,

    /// Largest gifter count in the tally
    #[arg(long, default_value_t = DEFAULT_MAX_GIFTERS)]
    max_gifters: usize,

    /// Coin level for the tally (repeatable)
    #[arg(long = "coin", value_name = "COIN")]
    coins: Vec<u64>,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Total gift to evaluate the model at (repeatable)
    #[arg(long = "eval", value_name = "X")]
    evals: Vec<f64>,

    /// Sample the model curve over [MIN, MAX]
    #[arg(long, num_args = 2, value_names = ["MIN", "MAX"])]
    sample: Option<Vec<f64>>,

    /// Number of sample points
    #[arg(long, default_value_t = DEFAULT_SAMPLES)]
    count: usize,
}

/// Why a command stopped.
#[derive(Debug)]
enum Failure {
    /// Arguments that parse but make no sense together.
    Args(String),
    Analysis(Error),
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Failure::Analysis(err)
    }
}

/// What a command prints on success.
struct Payload {
    document: Value,
    /// One JSON line each in jsonl mode.
    lines: Vec<Value>,
    summary: String,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            std::process::exit(code.as_i32());
        }
    };

    let level = LogLevel::from_flags(cli.global.verbose, cli.global.quiet);
    init_logging(&LogConfig::from_env(level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id());
    log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "giftscore started");

    let result = match &cli.command {
        Commands::Extract(args) => run_extract(&cli.global, &ctx, args),
        Commands::Fit(args) => run_fit(&cli.global, &ctx, args),
        Commands::Classify(args) => run_classify(&cli.global, &ctx, args),
        Commands::Model(args) => run_model(&cli.global, &ctx, args),
        Commands::Check => run_check(&cli.global, &ctx),
    };

    let exit_code = match result.and_then(|payload| write_payload(cli.global.format, &payload)) {
        Ok(()) => ExitCode::Clean,
        Err(failure) => output_failure(&cli.global, &ctx, &failure),
    };

    log_event!(
        ctx,
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "giftscore finished",
        exit_code = exit_code.as_i32()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared pipeline steps
// ============================================================================

fn config_error(err: ValidationError) -> Error {
    Error::Config(err.to_string())
}

/// Resolve the configuration and apply global overrides.
fn resolve_config(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig, Error> {
    let mut resolved = load_config(global.config.as_deref()).map_err(config_error)?;

    if let Some(name) = &global.preset {
        let preset =
            PresetName::parse(name).ok_or_else(|| Error::UnknownPreset(name.to_string()))?;
        resolved.config.model.preset = preset;
        resolved.config.model.segments = None;
    }
    if global.strict {
        resolved.config.validation.strict = true;
    }
    validate_config(&resolved.config).map_err(config_error)?;

    match &resolved.path {
        Some(path) => log_event!(
            ctx,
            INFO,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "configuration loaded",
            path = tracing::field::display(path.display()),
            source = tracing::field::display(&resolved.source)
        ),
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "using built-in configuration"
        ),
    }
    Ok(resolved)
}

/// Load, normalize, optionally validate, classify, and filter records.
fn load_records(
    resolved: &ResolvedConfig,
    ctx: &LogContext,
    paths: &[PathBuf],
    filter_args: &FilterArgs,
) -> Result<Vec<NormalizedRecord>, Error> {
    // Parse filters first so a typo fails before any file is read.
    let predicate = Predicate::parse_all(&filter_args.conditions)?;
    let slices = filter_args
        .slices
        .iter()
        .map(|s| Slice::parse(s))
        .collect::<Result<Vec<_>, _>>()?;

    let groups = load_paths(paths)?;
    log_event!(
        ctx,
        INFO,
        event_names::LOAD_FINISHED,
        Stage::Load,
        "record files loaded",
        groups = groups.len()
    );

    let mut records = normalize_groups(&groups)?;
    log_event!(
        ctx,
        INFO,
        event_names::NORMALIZE_FINISHED,
        Stage::Normalize,
        "records normalized",
        records = records.len()
    );

    if resolved.config.validation.strict {
        validate_all(&records, &resolved.config.validation)?;
        log_event!(
            ctx,
            INFO,
            event_names::VALIDATE_FINISHED,
            Stage::Validate,
            "strict validation passed",
            records = records.len()
        );
    }

    // Conditions may test `class`, so bands are attached before filtering.
    assign_classes(&mut records)?;

    let total = records.len();
    let selected = filter::select(records, &predicate, &slices);
    log_event!(
        ctx,
        INFO,
        event_names::FILTER_FINISHED,
        Stage::Filter,
        "records filtered",
        kept = selected.len(),
        dropped = total - selected.len()
    );
    Ok(selected)
}

fn envelope(command: &str, ctx: &LogContext) -> serde_json::Map<String, Value> {
    let mut doc = serde_json::Map::new();
    doc.insert("schema_version".into(), json!(SCHEMA_VERSION));
    doc.insert("command".into(), json!(command));
    doc.insert("run_id".into(), json!(ctx.run_id));
    doc.insert(
        "generated_at".into(),
        json!(chrono::Utc::now().to_rfc3339()),
    );
    doc
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    Ok(serde_json::to_value(value)?)
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

// ============================================================================
// Commands
// ============================================================================

fn run_extract(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &ExtractArgs,
) -> Result<Payload, Failure> {
    let resolved = resolve_config(global, ctx)?;
    let mut records = load_records(&resolved, ctx, &args.paths, &args.filter)?;

    let order = SortOrder::parse(&args.order);
    if order.key.is_empty() {
        return Err(Failure::Args("--order needs a field name".to_string()));
    }
    filter::sort_records(&mut records, &order.key, order.descending);

    let keys: Vec<String> = if args.keys.is_empty() {
        DEFAULT_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        args.keys.clone()
    };

    let rows: Vec<Value> = if args.keys.is_empty() {
        records.iter().map(to_value).collect::<Result<_, _>>()?
    } else {
        records
            .iter()
            .map(|r| Value::Object(filter::project(r, &keys)))
            .collect()
    };

    // Summary output is comma separated in key order.
    let mut summary = keys.join(",");
    for record in &records {
        let row = filter::project(record, &keys);
        let cells: Vec<String> = keys
            .iter()
            .map(|k| match &row[k.as_str()] {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        summary.push('\n');
        summary.push_str(&cells.join(","));
    }

    let mut doc = envelope("extract", ctx);
    doc.insert("order".into(), json!(args.order));
    doc.insert("count".into(), json!(rows.len()));
    doc.insert("records".into(), Value::Array(rows.clone()));

    Ok(Payload {
        document: Value::Object(doc),
        lines: rows,
        summary,
    })
}

fn run_fit(global: &GlobalOpts, ctx: &LogContext, args: &FitArgs) -> Result<Payload, Failure> {
    let mut resolved = resolve_config(global, ctx)?;

    // Overrides go into the config so the snapshot describes this fit.
    let fit_config = &mut resolved.config.fit;
    if !args.boundaries.is_empty() {
        fit_config.boundaries = args.boundaries.clone();
    }
    if args.no_exclude {
        fit_config.exclude_outliers = false;
    }
    if args.no_slope_override {
        fit_config.override_first_slope = false;
    } else if let Some(slope) = args.first_slope {
        fit_config.override_first_slope = true;
        fit_config.first_slope = slope;
    }
    validate_config(&resolved.config).map_err(|e| Failure::Args(e.to_string()))?;

    let records = load_records(&resolved, ctx, &args.paths, &args.filter)?;
    let options = FitOptions::from_config(&resolved.config.fit);
    let report = fit(&records, &options)?;
    let features = if args.features {
        Some(compare_feature_sets(&records)?)
    } else {
        None
    };

    let mut summary = format!(
        "fitted {} segments over {} records",
        report.segments.len(),
        records.len()
    );
    for seg in &report.segments {
        let hi = seg.hi.map_or_else(|| "inf".to_string(), |h| h.to_string());
        summary.push_str(&format!(
            "\n  [{}, {}): score = {:.6} * gift + {:.3}  (n={}, excluded={}, R^2={:.4}{})",
            seg.lo,
            hi,
            seg.slope,
            seg.intercept,
            seg.samples,
            seg.excluded,
            seg.r_squared,
            if seg.override_applied { ", slope overridden" } else { "" }
        ));
    }
    for bp in &report.breakpoints {
        summary.push_str(&format!(
            "\n  breakpoint {}|{}: x = {:.2}, y = {:.2}",
            bp.index,
            bp.index + 1,
            bp.x,
            bp.y
        ));
    }
    for fs in features.iter().flatten() {
        summary.push_str(&format!(
            "\n  features {}: R^2={:.4} AIC={:.2} VIF max={}{}",
            fs.columns.join("+"),
            fs.r_squared,
            fs.aic,
            fmt_opt(fs.vif.iter().copied().reduce(f64::max)),
            if fs.multicollinear { " (multicollinear)" } else { "" }
        ));
    }

    let lines = report
        .segments
        .iter()
        .map(to_value)
        .collect::<Result<Vec<_>, _>>()?;

    let mut doc = envelope("fit", ctx);
    doc.insert(
        "config".into(),
        to_value(&ConfigSnapshot::capture(&resolved))?,
    );
    doc.insert("records".into(), json!(records.len()));
    doc.insert("fit".into(), to_value(&report)?);
    if let Some(features) = &features {
        doc.insert("features".into(), to_value(features)?);
    }

    Ok(Payload {
        document: Value::Object(doc),
        lines,
        summary,
    })
}

fn run_classify(
    global: &GlobalOpts,
    ctx: &LogContext,
    args: &ClassifyArgs,
) -> Result<Payload, Failure> {
    let resolved = resolve_config(global, ctx)?;
    let records = load_records(&resolved, ctx, &args.paths, &args.filter)?;

    let mut counts = [0usize; 4];
    for class in records.iter().filter_map(|r| r.class()) {
        counts[class as usize] += 1;
    }
    log_event!(
        ctx,
        INFO,
        event_names::CLASSIFY_FINISHED,
        Stage::Classify,
        "records classified",
        records = records.len()
    );
    let counts_json: serde_json::Map<String, Value> = BandClass::ALL
        .iter()
        .map(|b| (b.to_string(), json!(counts[b.index() as usize])))
        .collect();

    let mut doc = envelope("classify", ctx);
    doc.insert("counts".into(), Value::Object(counts_json));

    if args.table {
        if args.max_gifters == 0 {
            return Err(Failure::Args("--max-gifters must be at least 1".to_string()));
        }
        let coins = if args.coins.is_empty() {
            DEFAULT_COINS.to_vec()
        } else {
            args.coins.clone()
        };
        let rows = class_table(&records, args.max_gifters, &coins)?;

        let mut summary = String::from("gifters,coin,total,Z,A,B,C");
        for row in &rows {
            summary.push_str(&format!(
                "\n{},{},{},{},{},{},{}",
                row.gifters,
                row.coin,
                row.total,
                row.counts[0],
                row.counts[1],
                row.counts[2],
                row.counts[3]
            ));
        }
        let lines = rows.iter().map(to_value).collect::<Result<Vec<_>, _>>()?;
        doc.insert("table".into(), Value::Array(lines.clone()));
        return Ok(Payload {
            document: Value::Object(doc),
            lines,
            summary,
        });
    }

    let lines: Vec<Value> = records
        .iter()
        .filter_map(|r| {
            let band = r.class().and_then(BandClass::from_index)?;
            Some(json!({
                "id": r.display_id(),
                "date": r.date,
                "total_gift": r.total_gift,
                "livescore": r.livescore,
                "rate": r.rate,
                "class": band.index(),
                "band": band.to_string(),
            }))
        })
        .collect();

    let summary = BandClass::ALL
        .iter()
        .map(|b| format!("{}: {}", b, counts[b.index() as usize]))
        .collect::<Vec<_>>()
        .join("  ");

    doc.insert("records".into(), Value::Array(lines.clone()));
    Ok(Payload {
        document: Value::Object(doc),
        lines,
        summary,
    })
}

fn run_model(global: &GlobalOpts, ctx: &LogContext, args: &ModelArgs) -> Result<Payload, Failure> {
    let resolved = resolve_config(global, ctx)?;
    let model = PiecewiseModel::from_config(&resolved.config.model)?;
    let breakpoints = model.breakpoints()?;

    let evaluations: Vec<Value> = args
        .evals
        .iter()
        .map(|&x| {
            let score = model.evaluate(x);
            json!({ "x": x, "score": score, "rate": (x != 0.0).then(|| score / x) })
        })
        .collect();

    let curve = match args.sample.as_deref() {
        Some(&[min, max]) => {
            if min.partial_cmp(&max) != Some(std::cmp::Ordering::Less) {
                return Err(Failure::Args(format!(
                    "--sample needs MIN < MAX, got {} {}",
                    min, max
                )));
            }
            if args.count < 2 {
                return Err(Failure::Args("--count must be at least 2".to_string()));
            }
            Some(model.sample_curve(min, max, args.count))
        }
        Some(_) => return Err(Failure::Args("--sample takes MIN and MAX".to_string())),
        None => None,
    };

    let source = resolved.config.model.source_name();
    let mut summary = format!("model {}: {} segments", source, model.segments().len());
    for (i, seg) in model.segments().iter().enumerate() {
        summary.push_str(&format!(
            "\n  segment {}: score = {} * gift + {}",
            i, seg.slope, seg.intercept
        ));
    }
    for bp in &breakpoints {
        summary.push_str(&format!("\n  breakpoint: x = {:.2}, y = {:.2}", bp.x, bp.y));
    }
    for e in &evaluations {
        summary.push_str(&format!("\n  f({}) = {}", e["x"], e["score"]));
    }

    let lines = match &curve {
        Some(points) => points.iter().map(to_value).collect::<Result<Vec<_>, _>>()?,
        None => evaluations.clone(),
    };

    let mut doc = envelope("model", ctx);
    doc.insert("model".into(), json!(source));
    doc.insert("segments".into(), to_value(&model.segments())?);
    doc.insert("breakpoints".into(), to_value(&breakpoints)?);
    if !evaluations.is_empty() {
        doc.insert("evaluations".into(), Value::Array(evaluations));
    }
    if let Some(points) = &curve {
        doc.insert("curve".into(), to_value(points)?);
    }

    Ok(Payload {
        document: Value::Object(doc),
        lines,
        summary,
    })
}

fn run_check(global: &GlobalOpts, ctx: &LogContext) -> Result<Payload, Failure> {
    let resolved = resolve_config(global, ctx)?;
    gs_core::validation::Validator::new(&resolved.config.validation)?;
    let model = PiecewiseModel::from_config(&resolved.config.model)?;
    model.breakpoints()?;

    let snapshot = ConfigSnapshot::capture(&resolved);
    let summary = format!(
        "config ok: {} ({}), model {}, boundaries {:?}",
        snapshot.path.as_deref().unwrap_or("built-in defaults"),
        snapshot.source,
        snapshot.model,
        snapshot.boundaries
    );

    let mut doc = envelope("check", ctx);
    doc.insert("status".into(), json!("ok"));
    doc.insert("using_defaults".into(), json!(resolved.path.is_none()));
    doc.insert("config".into(), to_value(&snapshot)?);
    let line = Value::Object(doc.clone());

    Ok(Payload {
        document: Value::Object(doc),
        lines: vec![line],
        summary,
    })
}

// ============================================================================
// Output
// ============================================================================

fn write_payload(format: OutputFormat, payload: &Payload) -> Result<(), Failure> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&payload.document).map_err(Error::from)?
            );
        }
        OutputFormat::Jsonl => {
            for line in &payload.lines {
                println!("{}", serde_json::to_string(line).map_err(Error::from)?);
            }
        }
        OutputFormat::Summary => println!("{}", payload.summary),
    }
    Ok(())
}

fn output_failure(global: &GlobalOpts, ctx: &LogContext, failure: &Failure) -> ExitCode {
    match failure {
        Failure::Args(message) => {
            log_event!(ctx, INFO, event_names::RUN_FAILED, Stage::Init, message);
            match global.format {
                OutputFormat::Summary => eprintln!("error: {}", message),
                _ => {
                    let response = json!({
                        "schema_version": SCHEMA_VERSION,
                        "status": "error",
                        "error": {
                            "code": ExitCode::ArgsError.as_i32(),
                            "code_name": ExitCode::ArgsError.code_name(),
                            "message": message,
                        }
                    });
                    eprintln!("{}", response);
                }
            }
            ExitCode::ArgsError
        }
        Failure::Analysis(err) => {
            let exit_code = ExitCode::from(err);
            log_event!(
                ctx,
                INFO,
                event_names::RUN_FAILED,
                Stage::Report,
                err.to_string(),
                code = err.code()
            );
            match global.format {
                OutputFormat::Summary => {
                    eprintln!("{}: {}", err.headline(), err);
                    eprintln!("  hint: {}", err.remediation());
                }
                _ => {
                    let structured = StructuredError::from(err)
                        .with_context("exit_code", exit_code.code_name());
                    let response = json!({
                        "schema_version": SCHEMA_VERSION,
                        "status": "error",
                        "error": structured,
                    });
                    eprintln!("{}", response);
                }
            }
            exit_code
        }
    }
}
