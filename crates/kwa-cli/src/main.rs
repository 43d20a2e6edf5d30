use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use kwa_core::{worst_rollup, FileAuditRecord};
use kwa_rules::{MatchMode, DEFAULT_RULES_YAML};
use kwa_runner::{exit_code, load_rules, Config, Runner, EXIT_FATAL};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kwa", version, about = "Audit server-side templates for boilerplate and keyword compliance")]
struct Cli {
    /// Project directory holding kwa.toml
    #[arg(short = 'C', long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default kwa.toml and rules.yaml
    Init {
        #[arg(long, default_value = "src")]
        codebase: String,
    },

    /// Check that config, rules and codebase are usable
    Doctor,

    /// Show the compiled rule set, or print the embedded default document
    Rules {
        #[arg(long)]
        rules: Option<PathBuf>,
        #[arg(long)]
        default: bool,
    },

    /// Validate individual files and print their findings
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Print one JSON record per line instead of text
        #[arg(long)]
        json: bool,
    },

    /// Audit the configured codebase and write reports
    Audit {
        #[arg(long)]
        codebase: Option<String>,
        #[arg(long)]
        rules: Option<String>,
        #[arg(long)]
        reports_dir: Option<String>,
        #[arg(long)]
        citations: Option<String>,
        /// Skip citation enrichment
        #[arg(long)]
        rules_only: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            error!(error = %format!("{e:#}"), "fatal");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<u8> {
    let base = match cli.dir {
        Some(d) => d,
        None => std::env::current_dir()?,
    };

    match cli.cmd {
        Command::Init { codebase } => {
            let created = Runner::init(&base, &codebase)?;
            for path in &created {
                println!("created {}", path.display());
            }
            if created.is_empty() {
                println!("already initialized in {}", base.display());
            }
            Ok(0)
        }
        Command::Doctor => {
            let r = Runner::open(base)?;
            let report = r.doctor()?;
            println!("rules fingerprint: {}", report.rules_fingerprint);
            println!("codebase: {} ({} template files)", report.codebase.display(), report.template_files);
            if let Some(n) = report.citation_keys {
                println!("citation index: {n} keys");
            }
            println!("OK");
            Ok(0)
        }
        Command::Rules { rules, default } => {
            if default {
                print!("{DEFAULT_RULES_YAML}");
                return Ok(0);
            }
            let rules = load_rules(rules.as_deref())?;
            println!("fingerprint: {}", rules.fingerprint());
            println!("top markers: {}", rules.markers.top.len());
            println!("bottom markers: {}", rules.markers.bottom.len());
            if let Some(tag) = &rules.script.open_tag {
                println!("script tag: {tag}");
            }
            println!("forbidden globals: {}", rules.script.forbid_globals.len());
            let mode = match rules.keywords.match_mode {
                MatchMode::Prefix => "prefix",
                MatchMode::Exact => "exact",
            };
            println!("keyword match mode: {mode}");
            for prefix in rules.keywords.valid_prefixes.iter().flatten() {
                println!("  prefix {prefix}");
            }
            for pattern in rules.keywords.known_patterns.iter().flatten() {
                println!("  known {pattern}");
            }
            println!("modifier order rules: {}", rules.keywords.modifier_order.len());
            Ok(0)
        }
        Command::Check { files, rules, json } => {
            let mut cfg = if Config::config_path(&base).exists() {
                Config::load_from(&Config::config_path(&base))?
            } else {
                let mut cfg = Config::default_for(".");
                cfg.audit.rules = None;
                cfg
            };
            if let Some(path) = rules {
                cfg.audit.rules = Some(path.display().to_string());
            }
            cfg.audit.rules_only = true;
            let r = Runner::from_config(base, cfg)?;
            let records = r.check(&files);
            print_records(&records, json)?;
            Ok(exit_code(worst_rollup(&records)))
        }
        Command::Audit {
            codebase,
            rules,
            reports_dir,
            citations,
            rules_only,
        } => {
            let mut cfg = Config::load_from(&Config::config_path(&base))?;
            if let Some(v) = codebase {
                cfg.audit.codebase = v;
            }
            if rules.is_some() {
                cfg.audit.rules = rules;
            }
            if let Some(v) = reports_dir {
                cfg.audit.reports_dir = v;
            }
            if citations.is_some() {
                cfg.audit.citations = citations;
            }
            if rules_only {
                cfg.audit.rules_only = true;
            }
            let r = Runner::from_config(base, cfg)?;
            let outcome = r.audit()?;
            print_records(&outcome.records, false)?;
            println!(
                "{} files, worst rollup {}",
                outcome.manifest.file_count,
                outcome.worst().as_str()
            );
            if let Some(dir) = &outcome.report_dir {
                println!("reports: {}", dir.display());
            }
            Ok(outcome.exit_code())
        }
    }
}

fn print_records(records: &[FileAuditRecord], json: bool) -> anyhow::Result<()> {
    for rec in records {
        if json {
            println!("{}", serde_json::to_string(rec)?);
            continue;
        }
        println!("{} [{}]", rec.file, rec.rollup.as_str());
        for f in &rec.findings {
            match f.location {
                Some(at) => println!("  {}:{} {} {}", at.line, at.offset, f.severity.as_str(), f.message),
                None => println!("  {} {}", f.severity.as_str(), f.message),
            }
        }
    }
    Ok(())
}
