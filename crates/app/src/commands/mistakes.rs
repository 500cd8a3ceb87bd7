use anyhow::Result;
use clap::ValueEnum;
use comfy_table::{Cell, Table};
use quickcal_core::model::{MistakeFilter, WrongAnswerId, WrongAnswerRecord};
use services::AppServices;

use crate::prompt::Input;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterArg {
    All,
    NotMastered,
    Mastered,
}

impl From<FilterArg> for MistakeFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => MistakeFilter::All,
            FilterArg::NotMastered => MistakeFilter::NotMastered,
            FilterArg::Mastered => MistakeFilter::Mastered,
        }
    }
}

fn records_table(records: &[WrongAnswerRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        "Id", "Problem", "Answer", "Last wrong", "Misses", "Last seen", "Mastered",
    ]);
    for record in records {
        table.add_row(vec![
            Cell::new(record.id().map_or_else(String::new, |id| id.to_string())),
            Cell::new(record.expression()),
            Cell::new(record.correct_answer()),
            Cell::new(record.user_answer()),
            Cell::new(record.wrong_count()),
            Cell::new(record.last_wrong_at().format("%Y-%m-%d %H:%M")),
            Cell::new(if record.is_mastered() { "yes" } else { "" }),
        ]);
    }
    table
}

pub async fn list(app: &AppServices, filter: FilterArg, grouped: bool) -> Result<()> {
    let mistakes = app.mistakes();
    let counts = mistakes.counts().await?;
    println!(
        "{} entries: {} not mastered, {} mastered",
        counts.all, counts.not_mastered, counts.mastered
    );

    let filter = MistakeFilter::from(filter);
    if grouped {
        for group in mistakes.grouped(filter).await? {
            println!();
            println!("{} ({})", group.category.display_name(), group.records.len());
            println!("{}", records_table(&group.records));
        }
    } else {
        let records = mistakes.list(filter).await?;
        if !records.is_empty() {
            println!("{}", records_table(&records));
        }
    }
    Ok(())
}

pub async fn master(app: &AppServices, id: WrongAnswerId) -> Result<()> {
    let record = app.mistakes().mark_mastered(id).await?;
    println!("Marked {} as mastered.", record.expression());
    Ok(())
}

pub async fn retry(app: &AppServices, id: WrongAnswerId, answer: Option<String>) -> Result<()> {
    let answer = match answer {
        Some(answer) => answer,
        None => {
            let record = app.mistakes().get(id).await?;
            let mut input = Input::stdin();
            let Some(line) = input.ask(&format!("{} = ", record.expression())).await? else {
                return Ok(());
            };
            line
        }
    };

    let result = app.mistakes().retry(id, &answer).await?;
    if result.is_correct {
        println!("Correct!");
    } else {
        println!("Not quite. The answer is {}.", result.correct_answer);
    }
    Ok(())
}

pub async fn clear(app: &AppServices, all: bool) -> Result<()> {
    let mistakes = app.mistakes();
    let removed = if all {
        mistakes.clear_all().await?
    } else {
        mistakes.clear_mastered().await?
    };
    println!("Removed {removed} entries.");
    Ok(())
}
