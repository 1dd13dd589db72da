//! PDF/UA remediation tool.
//!
//! Consumes a content extractor snapshot and optional fix records, runs a
//! remediation pass, writes the tagged PDF, and optionally validates it.
//!
//! Usage:
//!   remediate --input doc.json --output doc.pdf
//!   remediate --input doc.json --output doc.pdf --fixes fixes.json \
//!       --title "Annual Report" --language en --validate --report report.json

use accesspdf::ai::NoSuggestions;
use accesspdf::blocks::DocumentSnapshot;
use accesspdf::compliance::ComplianceValidator;
use accesspdf::fixes::{load_fix_records, FixRecord};
use accesspdf::remediate::{remediate, RemediationOptions};
use accesspdf::writer::PdfWriter;
use std::path::PathBuf;
use std::process::ExitCode;

struct Config {
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    fixes: Option<PathBuf>,
    title: Option<String>,
    language: Option<String>,
    use_ai: bool,
    validate: bool,
    report: Option<PathBuf>,
}

impl Config {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut config = Self {
            input: None,
            output: None,
            fixes: None,
            title: None,
            language: None,
            use_ai: false,
            validate: false,
            report: None,
        };

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--input" => {
                    i += 1;
                    if i < args.len() {
                        config.input = Some(PathBuf::from(&args[i]));
                    }
                },
                "--output" => {
                    i += 1;
                    if i < args.len() {
                        config.output = Some(PathBuf::from(&args[i]));
                    }
                },
                "--fixes" => {
                    i += 1;
                    if i < args.len() {
                        config.fixes = Some(PathBuf::from(&args[i]));
                    }
                },
                "--title" => {
                    i += 1;
                    if i < args.len() {
                        config.title = Some(args[i].clone());
                    }
                },
                "--language" => {
                    i += 1;
                    if i < args.len() {
                        config.language = Some(args[i].clone());
                    }
                },
                "--report" => {
                    i += 1;
                    if i < args.len() {
                        config.report = Some(PathBuf::from(&args[i]));
                    }
                },
                "--use-ai" => {
                    config.use_ai = true;
                },
                "--validate" => {
                    config.validate = true;
                },
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                },
                other => {
                    eprintln!("Unknown argument: {}", other);
                },
            }
            i += 1;
        }
        config
    }
}

fn print_usage() {
    println!("PDF/UA remediation tool");
    println!();
    println!("Usage: remediate --input <snapshot.json> --output <out.pdf> [options]");
    println!();
    println!("Options:");
    println!("  --input <path>     Content extractor snapshot (JSON)");
    println!("  --output <path>    Remediated PDF to write");
    println!("  --fixes <path>     Fix records (JSON array)");
    println!("  --title <text>     Document title override");
    println!("  --language <code>  Primary language override (e.g. en, de-AT)");
    println!("  --use-ai           Enable the suggestion oracle, if configured");
    println!("  --validate         Run the compliance checks after writing");
    println!("  --report <path>    Write the validation report as JSON");
}

fn main() -> ExitCode {
    env_logger::init();
    // A failing compliance report is a handled outcome, printed above;
    // only unhandled failures exit non-zero.
    match run(Config::from_args()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        },
    }
}

fn run(config: Config) -> accesspdf::Result<bool> {
    let (Some(input), Some(output)) = (config.input.as_ref(), config.output.as_ref()) else {
        print_usage();
        return Err(accesspdf::Error::InvalidInput(
            "--input and --output are required".to_string(),
        ));
    };

    let snapshot = DocumentSnapshot::from_json_file(input)?;
    let fixes: Vec<FixRecord> = match config.fixes.as_ref() {
        Some(path) => load_fix_records(path)?,
        None => Vec::new(),
    };

    // The AI backend is an external collaborator; without one configured,
    // --use-ai still runs with the deterministic fallbacks.
    if config.use_ai {
        log::warn!("no suggestion backend configured; deterministic fallbacks apply");
    }
    let oracle = NoSuggestions;

    let options = RemediationOptions {
        title: config.title.clone(),
        language: config.language.clone(),
        link_mode: None,
    };

    let (doc, summary) = remediate(&snapshot, &fixes, &oracle, &options)?;
    PdfWriter::new().write_to_file(&doc, output)?;

    println!("Remediated {} page(s) -> {}", doc.page_count(), output.display());
    println!("  fixes applied:    {}", summary.fixes_applied);
    println!("  fixes skipped:    {}", summary.fixes_skipped);
    println!("  elements created: {}", summary.elements_created);
    println!("  mcids placed:     {}", summary.mcids_placed);
    for warning in summary.warnings.iter().take(10) {
        println!("  warning: {}", warning);
    }
    if summary.warnings.len() > 10 {
        println!("  ... and {} more warning(s)", summary.warnings.len() - 10);
    }

    if !config.validate {
        return Ok(true);
    }

    let report = ComplianceValidator::new().validate(&doc);
    println!();
    println!(
        "Compliance: {}",
        if report.is_compliant { "PASS" } else { "FAIL" }
    );
    for check in &report.checks {
        let status = if check.passed { "pass" } else { "FAIL" };
        println!("  [{}] {:<26} {}", check.code, check.kind.title(), status);
        for reason in check.failures.iter().take(3) {
            println!("        - {}", reason);
        }
        if check.failures.len() > 3 {
            println!("        - ... and {} more", check.failures.len() - 3);
        }
    }

    if let Some(report_path) = config.report.as_ref() {
        std::fs::write(report_path, serde_json::to_vec_pretty(&report)?)?;
        println!("Report written to {}", report_path.display());
    }

    Ok(report.is_compliant)
}
