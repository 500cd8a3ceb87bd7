use anyhow::Result;
use comfy_table::{Cell, Table};
use quickcal_core::model::Category;
use services::{AppServices, HistoryRange};

use super::{format_duration, percent};

pub async fn execute(
    app: &AppServices,
    range: HistoryRange,
    category: Option<Category>,
) -> Result<()> {
    let history = app.history();
    let sessions = history.list(range, category).await?;
    if sessions.is_empty() {
        println!("No completed sessions ({}).", range.as_str());
        return Ok(());
    }

    let stats = history.stats(range, category).await?;
    println!(
        "{} sessions, {} questions, average {} correct, {} total",
        stats.session_count,
        stats.total_questions,
        percent(stats.average_correct_rate),
        format_duration(stats.total_time)
    );
    for (category, count) in &stats.category_counts {
        println!("  {:<20} {count}", category.display_name());
    }

    let mut table = Table::new();
    table.set_header(vec!["Started", "Category", "Score", "Rate", "Time", "Avg"]);
    for session in &sessions {
        table.add_row(vec![
            Cell::new(session.started_at().format("%Y-%m-%d %H:%M")),
            Cell::new(session.category().display_name()),
            Cell::new(format!(
                "{}/{}",
                session.correct_answers(),
                session.total_questions()
            )),
            Cell::new(percent(session.correct_rate())),
            Cell::new(format_duration(session.total_time())),
            Cell::new(format_duration(session.average_time())),
        ]);
    }
    println!("{table}");
    Ok(())
}
