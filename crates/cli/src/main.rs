use std::path::Path;
use std::{fs, process};

use clap::Parser;
use knotcheck_cli::{App, CheckArgs, Command, InputFormat, Workload};
use knotcheck_core::analysis::AnalysisResult;
use knotcheck_core::consistency::Validity;
use knotcheck_core::AnalysisOptions;
use knotcheck_parser::raw::RawOp;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let app = App::parse();
    match &app.command {
        Command::Check(args) => check(args),
        Command::Schema => schema(),
    }
}

fn decode(args: &CheckArgs) -> Vec<RawOp> {
    let text = fs::read_to_string(&args.input).unwrap_or_else(|e| {
        eprintln!("Failed to read {}: {e}", args.input.display());
        process::exit(2);
    });

    let format = args.format.unwrap_or_else(|| infer_format(&args.input));

    match format {
        InputFormat::Text => knotcheck_parser::parse_history(&text).unwrap_or_else(|e| {
            eprintln!("Failed to parse {}: {e}", args.input.display());
            process::exit(2);
        }),
        InputFormat::Json => knotcheck_parser::parse_history_json(&text).unwrap_or_else(|e| {
            eprintln!("Failed to parse {}: {e}", args.input.display());
            process::exit(2);
        }),
    }
}

fn infer_format(path: &Path) -> InputFormat {
    if path.extension().is_some_and(|ext| ext == "json") {
        InputFormat::Json
    } else {
        InputFormat::Text
    }
}

fn options(args: &CheckArgs) -> AnalysisOptions {
    let mut options = AnalysisOptions::new().with_timeout_ms(args.timeout_ms);
    if !args.models.is_empty() {
        options = options.with_models(args.models.iter().copied().map(Into::into));
    }
    options
}

fn check(args: &CheckArgs) {
    let raw_ops = decode(args);
    let options = options(args);

    let exit_code = match args.workload {
        Workload::ListAppend => {
            let history = knotcheck_parser::into_list_append_history(raw_ops).unwrap_or_else(|e| {
                eprintln!("Failed to build history: {e}");
                process::exit(2);
            });
            let result = knotcheck_core::analyze_list_append(&history, &options);
            report(&result, args.json)
        }
        Workload::Register => {
            let history = knotcheck_parser::into_register_history(raw_ops).unwrap_or_else(|e| {
                eprintln!("Failed to build history: {e}");
                process::exit(2);
            });
            let result = knotcheck_core::analyze_register(&history, &options);
            report(&result, args.json)
        }
    };

    process::exit(exit_code);
}

/// Maps a validity to a process exit code (§6, "Exit model").
fn exit_code_for(validity: Validity) -> i32 {
    match validity {
        Validity::Valid => 0,
        Validity::Invalid => 1,
        Validity::Unknown => 2,
    }
}

fn report<K: core::fmt::Display, V: core::fmt::Display>(result: &AnalysisResult<K, V>, as_json: bool) -> i32 {
    if as_json {
        print_json(result);
    } else {
        print_text(result);
    }
    exit_code_for(result.validity)
}

fn print_text<K: core::fmt::Display, V: core::fmt::Display>(result: &AnalysisResult<K, V>) {
    let verdict = match result.validity {
        Validity::Valid => "valid",
        Validity::Invalid => "invalid",
        Validity::Unknown => "unknown",
    };
    println!("verdict: {verdict}");

    if !result.anomalies_found.is_empty() {
        println!("anomalies:");
        for tag in &result.anomalies_found {
            println!("  {tag}");
        }
    }

    if !result.impossible_models.is_empty() {
        println!("impossible models:");
        for model in &result.impossible_models {
            println!("  {model}");
        }
    }

    for cycle in &result.cycles {
        println!("\n{} cycle:", cycle.tag);
        for step in &cycle.steps {
            println!("  {} -> {} ({})", step.from, step.to, step.rel);
            for witness in &step.witnesses {
                println!("    {}: {}", witness.key, witness.detail);
            }
        }
    }

    for case in &result.aborted_reads {
        println!("\naborted read: {} read {}={} written by failed {}", case.reading_txn, case.key, case.value, case.failed_txn);
    }
    for case in &result.intermediate_reads {
        println!(
            "\nintermediate read: {} read {}={}, an intermediate write by {}",
            case.reading_txn, case.key, case.value, case.writing_txn
        );
    }
    for case in &result.lost_updates {
        let txns: Vec<String> = case.txns.iter().map(ToString::to_string).collect();
        println!("\nlost update: {}={} read by {}", case.key, case.value, txns.join(", "));
    }

    if !result.timed_out.is_empty() {
        println!("\ntimed out before exhausting search:");
        for tag in &result.timed_out {
            println!("  {tag}");
        }
    }
}

fn print_json<K: core::fmt::Display, V: core::fmt::Display>(result: &AnalysisResult<K, V>) {
    let verdict = match result.validity {
        Validity::Valid => "valid",
        Validity::Invalid => "invalid",
        Validity::Unknown => "unknown",
    };

    let cycles: Vec<_> = result
        .cycles
        .iter()
        .map(|cycle| {
            let steps: Vec<_> = cycle
                .steps
                .iter()
                .map(|step| {
                    let witnesses: Vec<_> = step
                        .witnesses
                        .iter()
                        .map(|w| serde_json::json!({"rel": w.rel.to_string(), "key": w.key.to_string(), "detail": w.detail}))
                        .collect();
                    serde_json::json!({
                        "from": step.from.to_string(),
                        "to": step.to.to_string(),
                        "rel": step.rel.to_string(),
                        "witnesses": witnesses,
                    })
                })
                .collect();
            serde_json::json!({"type": cycle.tag.to_string(), "steps": steps})
        })
        .collect();

    let payload = serde_json::json!({
        "valid": verdict,
        "anomaly_types": result.anomalies_found.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "impossible_models": result.impossible_models.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "cycles": cycles,
        "aborted_reads": result.aborted_reads.iter().map(|c| serde_json::json!({
            "key": c.key.to_string(), "value": c.value.to_string(),
            "failed_txn": c.failed_txn.to_string(), "reading_txn": c.reading_txn.to_string(),
        })).collect::<Vec<_>>(),
        "intermediate_reads": result.intermediate_reads.iter().map(|c| serde_json::json!({
            "key": c.key.to_string(), "value": c.value.to_string(),
            "writing_txn": c.writing_txn.to_string(), "reading_txn": c.reading_txn.to_string(),
        })).collect::<Vec<_>>(),
        "lost_updates": result.lost_updates.iter().map(|c| serde_json::json!({
            "key": c.key.to_string(), "value": c.value.to_string(),
            "txns": c.txns.iter().map(ToString::to_string).collect::<Vec<_>>(),
        })).collect::<Vec<_>>(),
        "timed_out": result.timed_out.iter().map(ToString::to_string).collect::<Vec<_>>(),
    });

    println!("{}", serde_json::to_string_pretty(&payload).expect("json-serializable payload"));
}

fn schema() {
    let schema = schemars::schema_for!(Vec<ScopedRawOp>);
    println!("{}", serde_json::to_string_pretty(&schema).expect("schema is JSON-serializable"));
}

/// A `schemars`-friendly mirror of the JSON history form (§6), used only to
/// render the `schema` subcommand's output; [`knotcheck_parser::json`] does
/// the actual decoding without depending on this shape matching exactly.
#[derive(schemars::JsonSchema)]
#[allow(dead_code)]
struct ScopedRawOp {
    r#type: String,
    f: String,
    process: u64,
    index: u64,
    time: i64,
    /// Each entry is a `[f_mop, k, v]` triple rendered as strings; `v` may
    /// be the literal `"null"`, an integer, or a JSON array of integers.
    value: Vec<Vec<String>>,
}
