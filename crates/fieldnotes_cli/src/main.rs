//! Command-line entry point for the rendering engines.
//!
//! # Responsibility
//! - Expose cross-referencing and lexicon highlighting over stdin/stdout.
//! - Keep `ping` / `version` for wiring checks.
//!
//! Usage:
//! - `fieldnotes ping`
//! - `fieldnotes version`
//! - `fieldnotes link <candidates.json> [--manual] < text`
//! - `fieldnotes highlight <lexicon.json> < text`
//!
//! Every command accepts `--log-dir <absolute dir>`; `FIELDNOTES_LOG_DIR`
//! is used when the flag is absent. Without either, nothing is logged.
//! `FIELDNOTES_LOG_LEVEL` overrides the build's default level.

use fieldnotes_core::{
    highlight_lexicon, init_logging, AllowListSanitizer, CrossReferenceMode, CrossReferencer,
    HtmlSanitizer, Lexicon, LexiconEntry, LogLevel, ReferenceCandidate,
};
use std::io::Read;
use std::process::ExitCode;

const USAGE: &str = "usage: fieldnotes [--log-dir <dir>] <ping | version | link <candidates.json> [--manual] | highlight <lexicon.json>>";
const LOG_DIR_ENV: &str = "FIELDNOTES_LOG_DIR";
const LOG_LEVEL_ENV: &str = "FIELDNOTES_LOG_LEVEL";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match start_logging(args).and_then(|args| run(&args)) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let Some(command) = args.first() else {
        return Err(USAGE.to_string());
    };
    match command.as_str() {
        "ping" => Ok(format!("fieldnotes_core ping={}", fieldnotes_core::ping())),
        "version" => Ok(format!(
            "fieldnotes_core version={}",
            fieldnotes_core::core_version()
        )),
        "link" => {
            let path = args.get(1).ok_or_else(|| USAGE.to_string())?;
            let mode = match args.get(2).map(String::as_str) {
                None => CrossReferenceMode::Auto,
                Some("--manual") => CrossReferenceMode::Manual,
                Some(other) => return Err(format!("unknown option `{other}`\n{USAGE}")),
            };
            let candidates: Vec<ReferenceCandidate> = read_json(path)?;
            let html = AllowListSanitizer::default().sanitize(&read_stdin()?);
            let report = CrossReferencer::new(candidates).rewrite(&html, mode);
            for key in &report.skipped_ambiguous {
                eprintln!("skipped ambiguous reference `{key}`");
            }
            Ok(report.html)
        }
        "highlight" => {
            let path = args.get(1).ok_or_else(|| USAGE.to_string())?;
            let entries: Vec<LexiconEntry> = read_json(path)?;
            let lexicon = Lexicon::new(entries);
            let report = highlight_lexicon(&read_stdin()?, &lexicon);
            eprintln!(
                "known={} total={} accuracy={}",
                report.known_words, report.total_words, report.accuracy
            );
            Ok(report.html)
        }
        other => Err(format!("unknown command `{other}`\n{USAGE}")),
    }
}

/// Starts file logging when a directory is configured; returns the
/// remaining command arguments.
fn start_logging(args: Vec<String>) -> Result<Vec<String>, String> {
    let (args, flag_dir) = split_log_dir(args)?;
    let log_dir = flag_dir.or_else(|| {
        std::env::var(LOG_DIR_ENV)
            .ok()
            .filter(|dir| !dir.trim().is_empty())
    });
    if let Some(dir) = log_dir {
        let level = std::env::var(LOG_LEVEL_ENV)
            .unwrap_or_else(|_| LogLevel::build_default().as_str().to_string());
        init_logging(&level, &dir).map_err(|err| err.to_string())?;
    }
    Ok(args)
}

/// Removes `--log-dir <dir>` / `--log-dir=<dir>` from `args`.
fn split_log_dir(args: Vec<String>) -> Result<(Vec<String>, Option<String>), String> {
    let mut rest = Vec::with_capacity(args.len());
    let mut log_dir = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let value = if arg == "--log-dir" {
            iter.next()
                .ok_or_else(|| format!("`--log-dir` needs a directory\n{USAGE}"))?
        } else if let Some(value) = arg.strip_prefix("--log-dir=") {
            value.to_string()
        } else {
            rest.push(arg);
            continue;
        };
        if log_dir.replace(value).is_some() {
            return Err(format!("`--log-dir` given more than once\n{USAGE}"));
        }
    }
    Ok((rest, log_dir))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, String> {
    let raw = std::fs::read_to_string(path).map_err(|err| format!("cannot read `{path}`: {err}"))?;
    serde_json::from_str(&raw).map_err(|err| format!("invalid json in `{path}`: {err}"))
}

fn read_stdin() -> Result<String, String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|err| format!("cannot read stdin: {err}"))?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}

#[cfg(test)]
mod tests {
    use super::{run, split_log_dir, start_logging};

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn log_dir_flag_is_removed_from_command_args() {
        let (rest, dir) =
            split_log_dir(args(&["--log-dir", "/tmp/fieldnotes", "link", "c.json"])).unwrap();
        assert_eq!(rest, args(&["link", "c.json"]));
        assert_eq!(dir.as_deref(), Some("/tmp/fieldnotes"));

        let (rest, dir) = split_log_dir(args(&["ping", "--log-dir=/var/log/fn"])).unwrap();
        assert_eq!(rest, args(&["ping"]));
        assert_eq!(dir.as_deref(), Some("/var/log/fn"));
    }

    #[test]
    fn log_dir_flag_needs_one_value() {
        assert!(split_log_dir(args(&["ping", "--log-dir"])).is_err());
        assert!(split_log_dir(args(&["--log-dir=/a", "--log-dir=/b", "ping"])).is_err());
    }

    #[test]
    fn relative_log_dir_is_reported() {
        let err = start_logging(args(&["--log-dir", "logs", "ping"])).unwrap_err();
        assert!(err.contains("absolute"));
    }

    #[test]
    fn ping_runs_after_logging_starts() {
        let dir = tempfile::tempdir().unwrap();
        let dir_arg = dir.path().to_str().unwrap().to_string();

        let rest = start_logging(vec!["--log-dir".to_string(), dir_arg, "ping".to_string()])
            .unwrap();
        assert_eq!(run(&rest).unwrap(), "fieldnotes_core ping=pong");
        assert!(fieldnotes_core::logging_status().is_some());
    }
}
