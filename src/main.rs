//! Thin CLI layer: parse args, styled output, and call into rowpool-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use rowpool_core::{
    normalize_header, parallel_map_outcomes, read_table, write_table, ReadOptions, Row,
    WriteOptions,
};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn success(msg: &str) {
    if use_color() {
        println!("{}", msg.green());
    } else {
        println!("{}", msg);
    }
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

fn parse_delimiter(raw: &str) -> Result<u8, String> {
    match raw {
        "tab" | "\\t" => Ok(b'\t'),
        _ => {
            let mut bytes = raw.bytes();
            match (bytes.next(), bytes.next()) {
                (Some(byte), None) => Ok(byte),
                _ => Err(format!("Delimiter must be a single character, got '{}'", raw)),
            }
        }
    }
}

fn row_to_json(row: &Row) -> serde_json::Value {
    match row {
        Row::Mapping(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect(),
        ),
        Row::Sequence(fields) => serde_json::Value::Array(
            fields
                .iter()
                .map(|f| serde_json::Value::String(f.clone()))
                .collect(),
        ),
    }
}

fn render_row(row: &Row, delimiter: u8) -> String {
    let sep = (delimiter as char).to_string();
    match row {
        Row::Mapping(map) => map
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(&sep),
        Row::Sequence(fields) => fields.join(&sep),
    }
}

fn run_head(path: &str, count: usize, options: &ReadOptions, json: bool) -> Result<(), String> {
    let rows = read_table(path, options).map_err(|e| e.to_string())?;
    if json {
        let values: Vec<serde_json::Value> = rows.iter().take(count).map(row_to_json).collect();
        let rendered = serde_json::to_string_pretty(&values).map_err(|e| e.to_string())?;
        println!("{}", rendered);
    } else {
        for row in rows.iter().take(count) {
            println!("{}", render_row(row, options.delimiter));
        }
        if rows.len() > count {
            dim(&format!("… {} more row(s)", rows.len() - count));
        }
    }
    Ok(())
}

fn run_headers(path: &str, options: &ReadOptions) -> Result<(), String> {
    let rows = read_table(path, options).map_err(|e| e.to_string())?;
    match rows.first() {
        Some(Row::Sequence(tokens)) => {
            for token in tokens {
                println!("{}", normalize_header(token));
            }
            Ok(())
        }
        _ => Err("File has no header line.".to_string()),
    }
}

/// Convert the whole batch on the pool while a spinner ticks.
fn convert_batch<F>(
    message: &str,
    pairs: Vec<(PathBuf, PathBuf)>,
    worker: F,
) -> Vec<Result<PathBuf, rowpool_core::Error>>
where
    F: Fn((PathBuf, PathBuf)) -> Result<PathBuf, rowpool_core::Error> + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(parallel_map_outcomes(pairs, worker));
    });
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⠈⠐⠠⠰⠸⠹")
            .template("{spinner:.dim} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    loop {
        match rx.try_recv() {
            Ok(outcomes) => {
                spinner.finish_and_clear();
                return outcomes;
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                spinner.finish_and_clear();
                return Vec::new();
            }
            Err(mpsc::TryRecvError::Empty) => {}
        }
        spinner.tick();
        thread::sleep(Duration::from_millis(80));
    }
}

fn run_convert(
    inputs: &[String],
    read: ReadOptions,
    write: WriteOptions,
    suffix: &str,
    quiet: bool,
) -> Result<(), String> {
    let total = inputs.len();
    let pairs: Vec<(PathBuf, PathBuf)> = inputs
        .iter()
        .map(|input| {
            let input = PathBuf::from(input);
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("table")
                .to_string();
            let output = input.with_file_name(format!("{}.{}", stem, suffix));
            (input, output)
        })
        .collect();

    let worker = move |(input, output): (PathBuf, PathBuf)| {
        let rows = read_table(&input, &read)?;
        write_table(&output, &rows, &write)?;
        Ok(output)
    };

    let outcomes = convert_batch("Converting …", pairs, worker);
    if outcomes.len() != total {
        return Err("Conversion worker failed unexpectedly.".to_string());
    }

    let mut failed = 0;
    for (input, outcome) in inputs.iter().zip(&outcomes) {
        match outcome {
            Ok(output) => {
                if !quiet {
                    success(&format!("{} → {}", input, output.display()));
                }
            }
            Err(e) => {
                failed += 1;
                error(&format!("{}: {}", input, e));
            }
        }
    }
    if failed > 0 {
        Err(format!("{} of {} file(s) failed to convert.", failed, total))
    } else {
        info(&format!("Converted {} file(s).", total));
        Ok(())
    }
}

fn run() -> Result<(), String> {
    let delimiter_arg = Arg::new("delimiter")
        .short('d')
        .long("delimiter")
        .default_value(",")
        .help("Field delimiter (single character, or 'tab')");
    let encoding_arg = Arg::new("encoding")
        .short('e')
        .long("encoding")
        .default_value("utf-8")
        .help("Text encoding label (e.g. utf-8, latin1)");

    let matches = Command::new("rowpool")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Delimited table tooling — read, rewrite, and bulk-process CSV-style files")
        .after_help(
            "Examples:\n  rowpool head data.csv -n 5 --named\n  rowpool headers data.csv\n  rowpool convert a.csv b.csv --out-delimiter ';'",
        )
        .subcommand(
            Command::new("head")
                .about("Print the first rows of a delimited file")
                .arg(Arg::new("file").required(true).help("File to read"))
                .arg(
                    Arg::new("rows")
                        .short('n')
                        .long("rows")
                        .default_value("10")
                        .help("How many rows to print"),
                )
                .arg(delimiter_arg.clone())
                .arg(encoding_arg.clone())
                .arg(
                    Arg::new("named")
                        .long("named")
                        .action(ArgAction::SetTrue)
                        .help("Treat the first line as a header and name the fields"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print rows as JSON"),
                ),
        )
        .subcommand(
            Command::new("headers")
                .about("Print the normalized header names of a delimited file")
                .arg(Arg::new("file").required(true).help("File to read"))
                .arg(delimiter_arg.clone())
                .arg(encoding_arg.clone()),
        )
        .subcommand(
            Command::new("convert")
                .about("Rewrite delimited files with a new delimiter or encoding")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .help("File(s) to convert; the batch runs on the worker pool"),
                )
                .arg(delimiter_arg.clone())
                .arg(encoding_arg.clone())
                .arg(
                    Arg::new("out-delimiter")
                        .long("out-delimiter")
                        .help("Delimiter for the output files (default: same as input)"),
                )
                .arg(
                    Arg::new("out-encoding")
                        .long("out-encoding")
                        .help("Encoding for the output files (default: same as input)"),
                )
                .arg(
                    Arg::new("suffix")
                        .long("suffix")
                        .default_value("out.csv")
                        .help("Suffix replacing the input file extension"),
                )
                .arg(
                    Arg::new("quiet")
                        .short('q')
                        .long("quiet")
                        .action(ArgAction::SetTrue)
                        .help("Only report failures"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("head", sub)) => {
            let file = sub.get_one::<String>("file").ok_or("Missing file")?;
            let count: usize = sub
                .get_one::<String>("rows")
                .ok_or("Missing row count")?
                .parse()
                .map_err(|_| "Row count must be a number".to_string())?;
            let delimiter = parse_delimiter(sub.get_one::<String>("delimiter").ok_or("Missing delimiter")?)?;
            let encoding = sub.get_one::<String>("encoding").ok_or("Missing encoding")?;
            let options = ReadOptions::new()
                .delimiter(delimiter)
                .encoding(encoding.as_str())
                .named(sub.get_flag("named"));
            run_head(file, count, &options, sub.get_flag("json"))
        }
        Some(("headers", sub)) => {
            let file = sub.get_one::<String>("file").ok_or("Missing file")?;
            let delimiter = parse_delimiter(sub.get_one::<String>("delimiter").ok_or("Missing delimiter")?)?;
            let encoding = sub.get_one::<String>("encoding").ok_or("Missing encoding")?;
            let options = ReadOptions::new()
                .delimiter(delimiter)
                .encoding(encoding.as_str());
            run_headers(file, &options)
        }
        Some(("convert", sub)) => {
            let files: Vec<String> = sub
                .get_many::<String>("files")
                .ok_or("Missing input files")?
                .cloned()
                .collect();
            let delimiter = parse_delimiter(sub.get_one::<String>("delimiter").ok_or("Missing delimiter")?)?;
            let encoding = sub
                .get_one::<String>("encoding")
                .ok_or("Missing encoding")?
                .clone();
            let out_delimiter = match sub.get_one::<String>("out-delimiter") {
                Some(raw) => parse_delimiter(raw)?,
                None => delimiter,
            };
            let out_encoding = sub
                .get_one::<String>("out-encoding")
                .cloned()
                .unwrap_or_else(|| encoding.clone());
            let suffix = sub.get_one::<String>("suffix").ok_or("Missing suffix")?;
            let read = ReadOptions::new().delimiter(delimiter).encoding(encoding);
            let write = WriteOptions::new()
                .delimiter(out_delimiter)
                .encoding(out_encoding);
            run_convert(&files, read, write, suffix, sub.get_flag("quiet"))
        }
        _ => {
            if use_color() {
                println!("{}", "rowpool".bright_cyan().bold());
                dim("Delimited table tooling — read, rewrite, and bulk-process CSV-style files.");
            } else {
                println!("rowpool — delimited table tooling");
            }
            dim("\nRun `rowpool --help` for details.");
            Ok(())
        }
    }
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error(&e);
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}
