//! Terminal rendering of a comparison result.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use recon_model::{ComparisonResult, ResultCategory};

pub fn print_summary(result: &ComparisonResult) {
    println!("{}", summary_table(result));

    if let Some(narrative) = result.narrative.as_deref().filter(|n| !n.trim().is_empty()) {
        println!();
        println!("Analysis:");
        println!("{}", narrative.trim());
    }

    for &category in ResultCategory::all() {
        let items = result.items(category);
        if items.is_empty() {
            continue;
        }
        println!();
        println!("{} ({}):", category.label(), items.len());
        for item in items {
            println!("- {item}");
        }
    }
}

/// Counts per category plus the chart breakdown.
pub fn summary_table(result: &ComparisonResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Count"),
        header_cell("Share"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);

    let total = result.counts().total();
    for slice in result.breakdown() {
        table.add_row(vec![
            category_cell(slice.category),
            Cell::new(slice.count),
            Cell::new(format!("{:.1}%", slice.percentage(total))),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(total).add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    table
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn category_cell(category: ResultCategory) -> Cell {
    let color = match category {
        ResultCategory::Matching => Color::Green,
        ResultCategory::MissingFromSource | ResultCategory::MissingFromTarget => Color::Red,
        ResultCategory::UnknownTerms => Color::Yellow,
    };
    Cell::new(category.label()).fg(color)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
