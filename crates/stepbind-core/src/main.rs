//! `stepbind` command-line utilities: tag filter evaluation and step stubs

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::process::ExitCode;
use stepbind_core::codegen::step_code;
use stepbind_core::matcher::{pattern_for_step_text, placeholder_count};
use stepbind_model::{Step, StepKeyword};
use stepbind_tags::{TagFilter, TagSet};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("stepbind")
        .version(stepbind_core::VERSION)
        .about("Tag filter and step stub utilities for stepbind feature bindings")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("tags")
                .about("Evaluate a tag filter against a set of tags")
                .arg(
                    Arg::new("filter")
                        .long("filter")
                        .required(true)
                        .help("Tag expression, e.g. \"@smoke and not @slow\""),
                )
                .arg(
                    Arg::new("tag")
                        .long("tag")
                        .action(ArgAction::Append)
                        .help("Tag carried by the scenario (repeatable)"),
                ),
        )
        .subcommand(
            Command::new("stub")
                .about("Print the binding stub for a step")
                .arg(
                    Arg::new("keyword")
                        .long("keyword")
                        .default_value("given")
                        .help("Step keyword: given, when, then, and or but"),
                )
                .arg(
                    Arg::new("pattern")
                        .long("pattern")
                        .action(ArgAction::SetTrue)
                        .help("Also print the generated pattern and its argument count"),
                )
                .arg(Arg::new("text").required(true).help("Step text")),
        )
}

fn run_tags(args: &ArgMatches) -> anyhow::Result<bool> {
    let expression = args
        .get_one::<String>("filter")
        .context("missing --filter")?;
    let tags = TagSet::from_tags(args.get_many::<String>("tag").into_iter().flatten());
    let filter = TagFilter::compile(expression)?;
    let selected = filter.matches(&tags);

    tracing::debug!(expression = %expression, tags = tags.len(), selected, "evaluated tag filter");
    println!("{}", filter.root());
    println!("{}", if selected { "selected" } else { "skipped" });
    Ok(selected)
}

fn run_stub(args: &ArgMatches) -> anyhow::Result<()> {
    let keyword = args
        .get_one::<String>("keyword")
        .context("missing --keyword")?;
    let Some(keyword) = StepKeyword::parse(keyword) else {
        bail!("unknown step keyword '{keyword}'");
    };
    let text = args.get_one::<String>("text").context("missing step text")?;

    let step = Step::new(keyword, text.as_str(), 0);
    println!("{}", step_code(&step));
    if args.get_flag("pattern") {
        println!();
        println!("pattern:   {}", pattern_for_step_text(text));
        println!("arguments: {}", placeholder_count(text));
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    let outcome = match matches.subcommand() {
        Some(("tags", args)) => run_tags(args).map(|selected| {
            if selected {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }),
        Some(("stub", args)) => run_stub(args).map(|()| ExitCode::SUCCESS),
        _ => Ok(ExitCode::SUCCESS),
    };

    match outcome {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}
