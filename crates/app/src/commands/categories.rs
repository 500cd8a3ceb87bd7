use comfy_table::{Cell, Table};
use quickcal_core::model::Category;

use super::format_duration;

pub fn execute() {
    let mut table = Table::new();
    table.set_header(vec![
        "Slug",
        "Name",
        "Example",
        "Questions",
        "Target time",
    ]);
    for category in Category::ALL {
        table.add_row(vec![
            Cell::new(category.as_str()),
            Cell::new(category.display_name()),
            Cell::new(category.example()),
            Cell::new(category.recommended_question_count()),
            Cell::new(format_duration(category.recommended_time())),
        ]);
    }
    println!("{table}");
}
