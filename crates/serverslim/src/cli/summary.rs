use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use serverslim_lib::util::{format_bytes, format_duration, format_timestamp};
use serverslim_lib::{Action, PruneReport};

pub fn print_outcomes(report: &PruneReport) {
    for outcome in &report.outcomes {
        let marker = match outcome.action {
            Action::Removed => style("-").red(),
            Action::Kept => style("·").dim(),
            Action::Rewritten => style("~").yellow(),
            Action::Failed => style("!").red().bold(),
        };
        let rule = outcome
            .rule
            .as_deref()
            .map(|r| format!(" [{}]", r))
            .unwrap_or_default();

        println!(
            "  {} {:<9} {:<7} {}{}",
            marker,
            outcome.action.as_str(),
            outcome.kind.as_str(),
            outcome.path.display(),
            style(rule).dim()
        );
    }
}

pub fn print_summary(report: &PruneReport) {
    let title = if report.dry_run {
        "Dry Run Summary (nothing was deleted)"
    } else {
        "Prune Summary"
    };
    println!("\n{}", style(title).bold().cyan());
    println!("{}", style("═".repeat(60)).dim());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Metric").fg(Color::Cyan),
        Cell::new("Value").fg(Color::Cyan),
    ]);

    table.add_row(vec![Cell::new("Root"), Cell::new(report.root.display())]);
    table.add_row(vec![Cell::new("Files removed"), Cell::new(report.files_removed)]);
    table.add_row(vec![Cell::new("Directories removed"), Cell::new(report.dirs_removed)]);
    table.add_row(vec![
        Cell::new("Space reclaimed"),
        Cell::new(format_bytes(report.bytes_reclaimed)).fg(Color::Green),
    ]);
    table.add_row(vec![Cell::new("Files kept"), Cell::new(report.files_kept)]);
    if report.archives_rewritten > 0 {
        table.add_row(vec![
            Cell::new("Archives rewritten"),
            Cell::new(format!(
                "{} ({} entries dropped)",
                report.archives_rewritten, report.archive_entries_removed
            )),
        ]);
        table.add_row(vec![
            Cell::new("Archive space reclaimed"),
            Cell::new(format_bytes(report.archive_bytes_removed)).fg(Color::Green),
        ]);
    }

    let error_cell = Cell::new(report.error_count());
    table.add_row(vec![
        Cell::new("Errors"),
        if report.error_count() > 0 {
            error_cell.fg(Color::Red)
        } else {
            error_cell
        },
    ]);
    table.add_row(vec![Cell::new("Warnings"), Cell::new(report.warning_count())]);
    table.add_row(vec![
        Cell::new("Started"),
        Cell::new(format_timestamp(&report.started_at)),
    ]);
    if let Some(duration) = report.duration() {
        table.add_row(vec![Cell::new("Duration"), Cell::new(format_duration(duration))]);
    }

    println!("{}", table);

    print_errors(report);

    if !report.warnings.is_empty() {
        println!("\n{}", style("Warnings").bold().yellow());
        for issue in &report.warnings {
            println!("  {} {}: {}", style("!").yellow(), issue.path.display(), issue.message);
        }
    }

    println!(
        "\n{} {}",
        style("✓").green(),
        if report.dry_run {
            "Dry run complete"
        } else {
            "Prune complete"
        }
    );
}

pub fn print_errors(report: &PruneReport) {
    if report.errors.is_empty() {
        return;
    }
    eprintln!("\n{}", style("Errors").bold().red());
    for issue in &report.errors {
        eprintln!("  {} {}", style("✗").red(), issue.message);
    }
}
