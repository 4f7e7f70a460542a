use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use mapgen_core::{RunReport, TableOutcome, TableReport};
use mapgen_model::WarningKind;

pub fn print_summary(report: &RunReport) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Target table"),
        header_cell("Status"),
        header_cell("Source table"),
        header_cell("Workflow"),
        header_cell("Fields"),
        header_cell("Hubs"),
        header_cell("Warnings"),
        header_cell("Details"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Right);
    align_column(&mut table, 6, CellAlignment::Right);

    for entry in &report.tables {
        let warnings = report.diagnostics.for_table(&entry.table).count();
        table.add_row(table_row(entry, warnings));
    }
    let built = report.built().count();
    let failed = report.failed().count();
    let skipped = report.skipped().count();
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{built} built / {failed} failed / {skipped} skipped"))
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(report.diagnostics.warnings().len(), Color::Yellow)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
    ]);
    println!("{table}");
    print_warning_table(report);
    if report.has_warnings() {
        eprintln!(
            "Warnings were raised ({} type compatibility, {} expression format); review before deploying.",
            report.diagnostics.count(WarningKind::TypeCompatibility),
            report.diagnostics.count(WarningKind::ExpressionFormat)
        );
    }
}

fn table_row(entry: &TableReport, warnings: usize) -> Vec<Cell> {
    match &entry.outcome {
        TableOutcome::Built(mapping) => vec![
            table_cell(&entry.table),
            Cell::new("BUILT").fg(Color::Green),
            Cell::new(mapping.source.table.qualified()),
            Cell::new(mapping.mapping.workflow_file()),
            Cell::new(mapping.mapping.field_map.len()),
            Cell::new(mapping.target.hub_fields.len()),
            count_cell(warnings, Color::Yellow),
            dim_cell("-"),
        ],
        TableOutcome::Skipped { reason } => vec![
            table_cell(&entry.table),
            Cell::new("SKIPPED").fg(Color::DarkGrey),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            count_cell(warnings, Color::Yellow),
            dim_cell(reason),
        ],
        TableOutcome::Failed(err) => vec![
            table_cell(&entry.table),
            Cell::new("FAILED")
                .fg(Color::Red)
                .add_attribute(Attribute::Bold),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            dim_cell("-"),
            count_cell(warnings, Color::Yellow),
            Cell::new(format!("{}: {}", err.kind(), err.messages().join("\n"))).fg(Color::Red),
        ],
    }
}

fn print_warning_table(report: &RunReport) {
    let warnings = report.diagnostics.warnings();
    if warnings.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Target table"),
        header_cell("Kind"),
        header_cell("Message"),
    ]);
    apply_table_style(&mut table);
    for warning in warnings {
        table.add_row(vec![
            table_cell(&warning.table),
            Cell::new(warning.kind.as_str()).fg(Color::Yellow),
            Cell::new(&warning.message),
        ]);
    }
    println!();
    println!("Warnings:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 8 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(9)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::UpperBoundary(Width::Percentage(20)),
            ColumnConstraint::LowerBoundary(Width::Fixed(6)),
            ColumnConstraint::LowerBoundary(Width::Fixed(4)),
            ColumnConstraint::LowerBoundary(Width::Fixed(8)),
            ColumnConstraint::UpperBoundary(Width::Percentage(40)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn table_cell(name: &str) -> Cell {
    Cell::new(name)
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
