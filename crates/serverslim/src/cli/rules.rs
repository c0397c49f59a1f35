use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use console::style;
use serverslim_lib::{Rule, Ruleset, Verdict};

pub fn print_rules(ruleset: &Ruleset) {
    println!("{}", style("Installation rules").bold());
    println!("{}", rule_table(&ruleset.rules));

    if let Some(archive) = &ruleset.archive {
        println!(
            "\n{} (extensions: {}; paths: {})",
            style("Archive rules").bold(),
            archive.extensions.join(", "),
            if archive.paths.is_empty() {
                "anywhere".to_string()
            } else {
                archive.paths.join(", ")
            }
        );
        println!("{}", rule_table(&archive.rules));
    }
}

fn rule_table(rules: &[Rule]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Rule").fg(Color::Cyan),
        Cell::new("Type").fg(Color::Cyan),
        Cell::new("Verdict").fg(Color::Cyan),
        Cell::new("Priority").fg(Color::Cyan),
        Cell::new("Matches").fg(Color::Cyan),
        Cell::new("Description").fg(Color::Cyan),
    ]);

    for rule in rules {
        let verdict = Cell::new(rule.verdict.as_str()).fg(match rule.verdict {
            Verdict::Remove => Color::Red,
            _ => Color::Green,
        });
        table.add_row(vec![
            Cell::new(&rule.name),
            Cell::new(rule.matcher.kind()),
            verdict,
            Cell::new(rule.priority),
            Cell::new(rule.matcher.values().join(", ")),
            Cell::new(rule.description.as_deref().unwrap_or("")),
        ]);
    }

    table
}
