pub mod rules;
pub mod summary;

use clap::Parser;
use console::style;
use serverslim_lib::util::create_spinner;
use serverslim_lib::{ArchivePolicy, Classifier, Config, PruneOptions, Pruner};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "serverslim")]
#[command(about = "Strip client-only assets from a game install for dedicated server use", long_about = None)]
#[command(version)]
pub struct Cli {
    #[arg(help = "Installation directory (defaults to the current directory)")]
    pub path: Option<PathBuf>,

    #[arg(long, short = 'n', help = "Classify and report without deleting anything")]
    pub dry_run: bool,

    #[arg(long, short = 'v', help = "Print a line for every entry")]
    pub verbose: bool,

    #[arg(long, short = 'q', conflicts_with = "verbose", help = "Suppress non-error output")]
    pub quiet: bool,

    #[arg(long, value_name = "FILE", help = "Load rules from a TOML file instead of the built-in set")]
    pub rules: Option<PathBuf>,

    #[arg(long, help = "Print the report as JSON")]
    pub json: bool,

    #[arg(long, help = "Leave asset archives untouched")]
    pub no_archives: bool,

    #[arg(long, hide = true)]
    pub no_bulk: bool,

    #[arg(long, help = "List the active rules and exit")]
    pub list_rules: bool,
}

pub fn init_logging(verbose: bool, quiet: bool) {
    let default_filter = if quiet {
        "error"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::new(cli.path.clone(), cli.rules.clone())?;
    let ruleset = config.load_ruleset()?;

    if cli.list_rules {
        rules::print_rules(&ruleset);
        return Ok(());
    }

    let classifier = Classifier::new(&ruleset.rules)?;
    let archives = ArchivePolicy::from_ruleset(&ruleset)?;
    let chatty = !cli.quiet && !cli.json;

    let options = PruneOptions {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        bulk_directories: !cli.no_bulk,
        prune_archives: !cli.no_archives,
    };

    if chatty {
        println!(
            "{} {} {}",
            style(">>>").cyan(),
            if cli.dry_run { "Dry run over" } else { "Pruning" },
            style(config.root.display()).bold()
        );
    }

    let mut pruner = Pruner::new(&config.root, &classifier, options);
    if let Some(policy) = archives.as_ref() {
        pruner = pruner.with_archives(policy);
    }
    if chatty && !cli.verbose {
        pruner = pruner.with_progress(create_spinner("Scanning"));
    }

    let report = pruner.run()?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if cli.quiet {
        summary::print_errors(&report);
    } else {
        if cli.verbose {
            summary::print_outcomes(&report);
        }
        summary::print_summary(&report);
    }

    Ok(())
}
