/// Interactive comparison loop.
///
/// Shows one pair at a time, times the answer and hands it to the engine.
/// Everything printed about a decision comes from the engine's events, so
/// auto-resolved pairs, confident picks and hard choices all render the same
/// way whichever call produced them.
use std::io::{self, BufRead, Write};
use std::time::Instant;

use tracing::debug;
use valuerank_core::{EngineEvent, PairKind, Presentation, Progress, RankingEngine};

/// What the user typed at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// 0 = left, 1 = right.
    Pick(usize),
    Quit,
    Invalid,
}

pub fn parse_choice(line: &str) -> Choice {
    match line.trim().to_ascii_lowercase().as_str() {
        "1" | "l" | "left" => Choice::Pick(0),
        "2" | "r" | "right" => Choice::Pick(1),
        "q" | "quit" | "exit" => Choice::Quit,
        _ => Choice::Invalid,
    }
}

const BAR_WIDTH: usize = 30;

pub fn progress_bar(progress: &Progress) -> String {
    let filled = ((progress.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!(
        "[{}{}] {:>3}%  {}",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        progress.whole_percent,
        progress.message,
    )
}

fn kind_badge(kind: PairKind) -> &'static str {
    match kind {
        PairKind::Comparison => "",
        PairKind::Contradiction => "  [tie breaker: your answers disagree]",
        PairKind::Rematch => "  [tie breaker: rematch]",
    }
}

/// Text for one engine event, or `None` if the event is not shown.
pub fn render_event(event: &EngineEvent) -> Option<String> {
    match event {
        EngineEvent::PairPresented { left, right, kind, auto_resolution, .. } => Some(match auto_resolution {
            Some(justification) => format!("  auto  {left} vs {right}  ({justification})"),
            None => format!("\n  1) {left}\n  2) {right}{}", kind_badge(*kind)),
        }),
        EngineEvent::DecisionCommitted { decision, confident, .. } if !decision.was_auto => {
            let badge = if *confident { "  (confident)" } else { "" };
            Some(format!("  -> {} over {}{badge}", decision.winner, decision.loser))
        }
        EngineEvent::DecisionCommitted { .. } => None,
        EngineEvent::ConflictRecorded { record } => Some(format!(
            "  hard choice logged ({:.1}s): {} vs {}",
            record.duration_ms as f64 / 1000.0,
            record.pair[0],
            record.pair[1],
        )),
        EngineEvent::ProgressChanged { progress } => Some(format!("  {}", progress_bar(progress))),
        EngineEvent::SessionReset => Some("  Session reset.".to_string()),
    }
}

pub fn print_events(events: &[EngineEvent], out: &mut impl Write) -> io::Result<()> {
    for line in events.iter().filter_map(render_event) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

/// How a prompt for one pair ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Committed,
    /// The user quit or input ended. The pair stays pending.
    Stopped,
}

/// Prompt until the user answers the pending pair `pair_id` or stops.
pub fn answer_pair<R: BufRead, W: Write>(
    engine: &mut RankingEngine,
    pair_id: u64,
    input: &mut R,
    out: &mut W,
) -> io::Result<Answer> {
    let mut line = String::new();
    loop {
        write!(out, "  Which matters more? [1/2, q to stop] ")?;
        out.flush()?;

        let asked_at = Instant::now();
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(Answer::Stopped);
        }
        let elapsed_ms = asked_at.elapsed().as_millis() as u64;

        match parse_choice(&line) {
            Choice::Quit => return Ok(Answer::Stopped),
            Choice::Invalid => writeln!(out, "  Please type 1 or 2.")?,
            Choice::Pick(side) => match engine.submit_decision(pair_id, side, elapsed_ms) {
                Ok(outcome) => {
                    debug!(delta = outcome.update.delta, k = outcome.update.k, "decision applied");
                    print_events(&engine.drain_events(), out)?;
                    return Ok(Answer::Committed);
                }
                Err(e) => writeln!(out, "  {e}")?,
            },
        }
    }
}

/// Run comparisons until the user quits or input ends. `save` is called
/// after every committed decision, auto-resolved ones included.
/// Returns the number of decisions committed during this run.
pub fn run_interactive<R, W, F>(
    engine: &mut RankingEngine,
    input: &mut R,
    out: &mut W,
    mut save: F,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
    F: FnMut(&RankingEngine),
{
    let start_count = engine.decisions().len();

    loop {
        let pair = match engine.next_pair() {
            Presentation::Choose(pair) => pair,
            Presentation::AutoResolved { .. } => {
                print_events(&engine.drain_events(), out)?;
                save(engine);
                continue;
            }
            // Only host-directed presentation answers from history.
            Presentation::Decided { .. } => return Ok(engine.decisions().len() - start_count),
        };
        print_events(&engine.drain_events(), out)?;

        match answer_pair(engine, pair.id, input, out)? {
            Answer::Committed => save(engine),
            Answer::Stopped => return Ok(engine.decisions().len() - start_count),
        }
    }
}

/// Ask a yes/no question. Anything but "y" or "yes" is a no.
pub fn confirm(question: &str, input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "{question} [y/N] ")?;
    out.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
