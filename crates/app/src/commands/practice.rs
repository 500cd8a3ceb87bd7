use anyhow::Result;
use quickcal_core::model::{Category, Problem};
use services::practice::format_elapsed;
use services::{
    AppServices, ElapsedTicker, PracticeAnswerResult, PracticeStatus, PracticeTracker,
    SessionError,
};

use super::{format_duration, percent};
use crate::prompt::Input;

const HELP: &str = "Type an answer and press Enter. \
    `p` pauses or resumes, `t` shows the time, `q` quits.";

pub async fn execute(app: &AppServices, category: Category, count: Option<u32>) -> Result<()> {
    let count = match count {
        Some(count) => count,
        None => app.preferences().load().await?.questions_per_session(),
    };
    let practice = app.practice();
    let mut tracker = practice.start_practice(category, count).await?;

    println!("{}: {}", category.display_name(), category.practice_hint());
    println!("{HELP}");
    print_problem(&tracker);

    let recommended = category.recommended_time();
    let mut warned_overtime = false;
    let mut input = Input::stdin();
    let mut ticker = ElapsedTicker::new();
    let mut last_result = None;

    while !tracker.is_complete() {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match line.as_str() {
                    "" => {}
                    "q" | "quit" => break,
                    "p" | "pause" => match practice.toggle_pause(&mut tracker)? {
                        PracticeStatus::Paused => println!("Paused. Type `p` to resume."),
                        _ => print_problem(&tracker),
                    },
                    "t" | "time" => {
                        let elapsed = tracker.elapsed(practice.clock().now());
                        println!(
                            "session {}  question {}",
                            format_elapsed(elapsed.session),
                            format_elapsed(elapsed.question)
                        );
                    }
                    raw => {
                        let answer = resolve_choice(tracker.current_problem(), raw);
                        match practice.submit_answer(&mut tracker, &answer).await {
                            Ok(result) => {
                                if result.answer.is_correct {
                                    println!("✓ ({})", format_duration(result.answer.time_spent));
                                } else {
                                    println!(
                                        "✗ {} = {}",
                                        result.answer.expression, result.answer.correct_answer
                                    );
                                }
                                if !result.is_complete {
                                    print_problem(&tracker);
                                }
                                last_result = Some(result);
                            }
                            Err(SessionError::Paused) => println!("Paused. Type `p` to resume."),
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
            }
            () = ticker.tick() => {
                if !warned_overtime && ElapsedTicker::should_refresh(&tracker) {
                    let elapsed = tracker.elapsed(practice.clock().now());
                    if elapsed.session > recommended {
                        warned_overtime = true;
                        println!(
                            "(past the {} target for this category)",
                            format_duration(recommended)
                        );
                    }
                }
            }
        }
    }

    if !tracker.is_complete() {
        println!("Session abandoned.");
        return Ok(());
    }
    if needs_explicit_save(last_result.as_ref()) {
        // Automatic save failed; one explicit retry before reporting.
        if let Err(err) = practice.finalize_session(&mut tracker).await {
            eprintln!("warning: session could not be saved: {err}");
        }
    }
    print_summary(&tracker);
    Ok(())
}

fn print_problem(tracker: &PracticeTracker) {
    let Some(problem) = tracker.current_problem() else {
        return;
    };
    let progress = tracker.progress();
    println!();
    println!("[{}/{}] {} = ?", progress.answered + 1, progress.total, problem.expression());
    if let Some(options) = problem.options() {
        let listed: Vec<String> = options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}) {option}", i + 1))
            .collect();
        println!("    {}", listed.join("   "));
    }
}

/// True unless the answer that completed the run also saved the session.
fn needs_explicit_save(last: Option<&PracticeAnswerResult>) -> bool {
    !last.is_some_and(|result| result.is_complete && result.saved_session_id.is_some())
}

/// Map a 1-based option number to its text for multiple-choice problems.
fn resolve_choice(problem: Option<&Problem>, raw: &str) -> String {
    problem
        .and_then(Problem::options)
        .and_then(|options| {
            let index = raw.parse::<usize>().ok()?.checked_sub(1)?;
            options.get(index).cloned()
        })
        .unwrap_or_else(|| raw.to_owned())
}

fn print_summary(tracker: &PracticeTracker) {
    let Some(session) = tracker.session() else {
        return;
    };
    println!();
    println!(
        "Done: {}/{} correct ({})",
        session.correct_answers(),
        session.total_questions(),
        percent(session.correct_rate())
    );
    println!(
        "Total {}  average {}",
        format_duration(session.total_time()),
        format_duration(session.average_time())
    );
    println!("{}", session.performance().message());
    let missed: Vec<_> = session.missed().collect();
    if !missed.is_empty() {
        println!("Missed:");
        for answer in missed {
            println!(
                "  {} = {} (you: {})",
                answer.expression, answer.correct_answer, answer.user_answer
            );
        }
    }
}
