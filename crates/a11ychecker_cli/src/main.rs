//! Command-line checker.
//!
//! # Responsibility
//! - Run one check over an HTML fragment file with the built-in rules.
//! - Print the issue list, the marked markup and the clean export.

use a11ychecker_core::{
    default_log_level, init_logging, CheckSession, CheckerConfig, EditableDecorator, Engine,
    RuleEngine,
};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use futures::executor::block_on;
use log::info;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

fn cli() -> Command {
    Command::new("a11ychecker")
        .version(a11ychecker_core::core_version())
        .about("Mark accessibility issues in an HTML fragment")
        .arg(
            Arg::new("file")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("HTML fragment to check"),
        )
        .arg(
            Arg::new("keep-ids")
                .long("keep-ids")
                .action(ArgAction::SetTrue)
                .help("Keep data-quail-id attributes in the marked output"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("JSON checker configuration"),
        )
        .arg(
            Arg::new("log-dir")
                .long("log-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Absolute directory for rolling log files"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .help("trace|debug|info|warn|error"),
        )
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(matches: &ArgMatches) -> Result<(), String> {
    let config = match matches.get_one::<PathBuf>("config") {
        Some(path) => CheckerConfig::load(path).map_err(|err| err.to_string())?,
        None => CheckerConfig::default(),
    };

    if let Some(log_dir) = matches.get_one::<PathBuf>("log-dir") {
        let level = matches
            .get_one::<String>("log-level")
            .cloned()
            .or_else(|| config.log_level.clone())
            .unwrap_or_else(|| default_log_level().to_string());
        init_logging(&level, &log_dir.to_string_lossy()).map_err(|err| err.to_string())?;
    }

    let file = matches
        .get_one::<PathBuf>("file")
        .ok_or_else(|| "missing input file".to_string())?;
    let html = std::fs::read_to_string(file)
        .map_err(|err| format!("failed to read `{}`: {err}", file.display()))?;

    let engine: Arc<dyn Engine> = Arc::new(RuleEngine::with_config(&config));
    let mut decorator = EditableDecorator::new(&config);
    decorator.set_data(&html);
    decorator.add_listeners().map_err(|err| err.to_string())?;
    let mut session = CheckSession::new(decorator, Arc::clone(&engine));

    let report = block_on(session.check()).map_err(|err| err.to_string())?;
    info!(
        "event=cli_check module=cli status=ok file={} issues={}",
        file.display(),
        report.issues
    );

    println!("issues: {} (resolved {}, stale {})", report.issues, report.resolved, report.stale);
    for (index, issue) in session.issues().iter().enumerate() {
        let title = block_on(engine.get_issue_details(issue))
            .map(|details| details.title)
            .unwrap_or_else(|_| issue.id.clone());
        let element = issue
            .original_element
            .as_ref()
            .map(|element| element.name.as_str())
            .unwrap_or("?");
        println!(
            "  [{index}] {:?} {} <{element}>: {title}",
            issue.testability, issue.id
        );
    }

    session
        .decorator_mut()
        .set_disable_filter_strip(matches.get_flag("keep-ids"));
    let marked = session.decorator().get_data().map_err(|err| err.to_string())?;
    println!("\nmarked:\n{marked}");

    session.close().map_err(|err| err.to_string())?;
    session.decorator_mut().set_disable_filter_strip(false);
    let clean = session.decorator().get_data().map_err(|err| err.to_string())?;
    println!("\nclean:\n{clean}");
    Ok(())
}
