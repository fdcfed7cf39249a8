/// Output formatting: terminal tables and JSON.
use serde::Serialize;
use valuerank_core::{ConflictRecord, ModelReport, Progress, RankedItem};

#[derive(Serialize)]
struct JsonRankings<'a> {
    items: &'a [RankedItem],
    total_decisions: usize,
    progress: &'a Progress,
}

fn name_width<'a>(names: impl Iterator<Item = &'a str>, header: &str) -> usize {
    names.map(|n| n.chars().count()).max().unwrap_or(0).max(header.len())
}

/// Print the ranking as a formatted terminal table.
pub fn print_table(rankings: &[RankedItem], total_decisions: usize, progress: &Progress) {
    let name_width = name_width(rankings.iter().map(|r| r.name.as_str()), "Value");

    println!(" # | {:<name_width$} |  Rating |   RD | Matches", "Value");
    println!("---|-{}-|---------|------|--------", "-".repeat(name_width));

    for r in rankings {
        let pin = if r.manual_rank.is_some() { " *" } else { "" };
        println!(
            "{:>2} | {:<name_width$} | {:>7.1} | {:>4.0} | {:>7}{pin}",
            r.rank, r.name, r.rating, r.rd, r.match_count,
        );
    }

    println!(
        "\n{} values, {} decisions, {}% accurate ({})",
        rankings.len(),
        total_decisions,
        progress.whole_percent,
        progress.message,
    );
    if rankings.iter().any(|r| r.manual_rank.is_some()) {
        println!("* placed by hand");
    }
}

/// Print the ranking as JSON.
pub fn print_json(rankings: &[RankedItem], total_decisions: usize, progress: &Progress) {
    let output = JsonRankings { items: rankings, total_decisions, progress };
    print_serialized(&output);
}

/// Print the hard-choice log, most recent first.
pub fn print_conflicts(records: &[ConflictRecord]) {
    if records.is_empty() {
        println!("No hard choices yet.");
        return;
    }
    let width = name_width(records.iter().flat_map(|c| c.pair.iter().map(String::as_str)), "Chose");

    println!("{:<width$} | {:<width$} | {:<width$} |  Time", "Left", "Right", "Chose");
    println!("{}", "-".repeat(width * 3 + 15));
    for c in records.iter().rev() {
        println!(
            "{:<width$} | {:<width$} | {:<width$} | {:>4.1}s",
            c.pair[0],
            c.pair[1],
            c.winner,
            c.duration_ms as f64 / 1000.0,
        );
    }
}

pub fn print_conflicts_json(records: &[ConflictRecord]) {
    print_serialized(&records);
}

/// Print simulation results, one table per model.
pub fn print_simulation(reports: &[ModelReport], num_items: usize, trials: usize) {
    println!("{num_items} items, {trials} trials per budget\n");
    for report in reports {
        println!("{:?}", report.model);
        println!("Matches |  Top-1 | Top-3 | Top-5 | Winner rank");
        println!("--------|--------|-------|-------|------------");
        for row in &report.rows {
            println!(
                "{:>7} | {:>5.1}% | {:>5.2} | {:>5.2} | {:>11.2}",
                row.matches,
                row.top1_rate * 100.0,
                row.top3_avg,
                row.top5_avg,
                row.avg_winner_rank,
            );
        }
        println!();
    }
}

pub fn print_simulation_json(reports: &[ModelReport]) {
    print_serialized(&reports);
}

fn print_serialized<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => crate::bail(format!("Failed to serialize output: {e}")),
    }
}
