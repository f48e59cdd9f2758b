use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use shd_transform::{CorrelationSummary, IndicatorSummary, JoinStep};

use crate::types::JobResult;

pub fn print_summary(results: &[JobResult]) {
    if let Some(table) = outputs_table(results) {
        println!("{table}");
    }
    for result in results {
        if !result.joins.is_empty() {
            println!();
            println!("Joins ({}):", result.job);
            println!("{}", joins_table(&result.joins));
        }
        if let Some(report) = &result.subset {
            println!();
            println!(
                "Subset: {} rows in, {} after year, {} after region, {} out",
                report.rows_in, report.rows_after_year, report.rows_after_region, report.rows_out
            );
            if !report.missing_members.is_empty() {
                println!("Region members without rows: {}", report.missing_members.join(", "));
            }
        }
        if !result.correlations.is_empty() {
            println!();
            println!("{}", correlations_table(&result.correlations));
        }
        if !result.indicators.is_empty() {
            println!("{}", indicators_table(&result.indicators));
        }
    }
}

fn outputs_table(results: &[JobResult]) -> Option<Table> {
    let rows: Vec<_> = results
        .iter()
        .flat_map(|result| result.outputs.iter().map(move |output| (result, output)))
        .collect();
    if rows.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Job"),
        header_cell("Output"),
        header_cell("Rows"),
        header_cell("Columns"),
        header_cell("Written"),
        header_cell("Parse failures"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    align_column(&mut table, 3, CellAlignment::Right);
    align_column(&mut table, 4, CellAlignment::Center);
    align_column(&mut table, 5, CellAlignment::Right);
    let mut previous_job = "";
    for (result, output) in rows {
        let (job, failures) = if result.job == previous_job {
            (dim_cell(""), dim_cell(""))
        } else {
            (
                Cell::new(result.job)
                    .fg(Color::Blue)
                    .add_attribute(Attribute::Bold),
                count_cell(result.parse_failures, Color::Yellow),
            )
        };
        previous_job = result.job;
        let (rows, columns) = match output.shape {
            Some((rows, columns)) => (Cell::new(rows), Cell::new(columns)),
            None => (dim_cell("-"), dim_cell("-")),
        };
        let written = if output.written {
            Cell::new("✓")
                .fg(Color::Green)
                .add_attribute(Attribute::Bold)
        } else {
            dim_cell("dry run")
        };
        table.add_row(vec![
            job,
            Cell::new(output.path.display()),
            rows,
            columns,
            written,
            failures,
        ]);
    }
    Some(table)
}

fn joins_table(steps: &[JoinStep]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Table"),
        header_cell("Rows"),
        header_cell("Matched"),
        header_cell("Unmatched"),
        header_cell("Added columns"),
        header_cell("Overlaps"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=3 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for step in steps {
        let overlaps: Vec<String> = step
            .overlaps
            .iter()
            .map(|overlap| match &overlap.kept_as {
                Some(name) if *name != overlap.column => format!("{} -> {name}", overlap.column),
                Some(_) => format!("{} (replaced)", overlap.column),
                None => format!("{} (dropped)", overlap.column),
            })
            .collect();
        table.add_row(vec![
            Cell::new(&step.table),
            Cell::new(step.joined_rows),
            Cell::new(step.matched),
            count_cell(step.unmatched, Color::Yellow),
            Cell::new(step.added_columns.len()),
            if overlaps.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(overlaps.join(", "))
            },
        ]);
    }
    table
}

fn correlations_table(summaries: &[CorrelationSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Group"),
        header_cell("Pairs"),
        header_cell("Pearson r"),
        header_cell("Slope"),
        header_cell("Intercept"),
        header_cell("R²"),
    ]);
    apply_table_style(&mut table);
    for column in 1..=5 {
        align_column(&mut table, column, CellAlignment::Right);
    }
    for summary in summaries {
        let (slope, intercept, r_squared) = match summary.trendline {
            Some(line) => (
                float_cell(line.slope),
                float_cell(line.intercept),
                float_cell(line.r_squared),
            ),
            None => (dim_cell("-"), dim_cell("-"), dim_cell("-")),
        };
        table.add_row(vec![
            Cell::new(&summary.group).add_attribute(Attribute::Bold),
            Cell::new(summary.pairs),
            summary.pearson_r.map_or_else(|| dim_cell("-"), float_cell),
            slope,
            intercept,
            r_squared,
        ]);
    }
    table
}

fn indicators_table(summaries: &[IndicatorSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Indicator"),
        header_cell("Countries"),
        header_cell("Mean"),
        header_cell("Top"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for summary in summaries {
        let top: Vec<String> = summary
            .top
            .iter()
            .map(|(country, value)| format!("{country} ({value:.2})"))
            .collect();
        table.add_row(vec![
            Cell::new(&summary.column).add_attribute(Attribute::Bold),
            Cell::new(summary.countries_with_data),
            summary.mean.map_or_else(|| dim_cell("-"), float_cell),
            Cell::new(top.join(", ")),
        ]);
    }
    table
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(140);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn float_cell(value: f64) -> Cell {
    Cell::new(format!("{value:.3}"))
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
