//! Terminal summary tables.

use std::cmp::Ordering;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{
    Attribute, Cell, CellAlignment, ColumnConstraint, ContentArrangement, Table, Width,
};

use corebridge_infer::InferredSchema;
use corebridge_model::{ComplianceReport, FieldMapping, IssueSeverity};

use crate::types::MapRun;

/// Confidence band boundaries for the mapping summary.
const HIGH_BAND: f64 = 0.8;
const MEDIUM_BAND: f64 = 0.6;

pub fn print_map_summary(run: &MapRun) {
    println!(
        "Mapped {} \u{2192} {}",
        run.file.source_system, run.file.target_system
    );
    println!("Output: {}", run.output_path.display());
    println!(
        "Pipeline: {} stages, {} mappings improved, {} ms",
        run.file.stages_run.len(),
        run.file.total_improved,
        run.file.duration_ms
    );

    let (high, medium, low) = band_counts(&run.file.field_mappings);
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Band"),
        header_cell("Confidence"),
        header_cell("Mappings"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new("High").fg(comfy_table::Color::Green),
        Cell::new(format!("\u{2265} {HIGH_BAND:.1}")),
        Cell::new(high),
    ]);
    table.add_row(vec![
        Cell::new("Medium").fg(comfy_table::Color::Yellow),
        Cell::new(format!("{MEDIUM_BAND:.1} - {HIGH_BAND:.1}")),
        Cell::new(medium),
    ]);
    table.add_row(vec![
        Cell::new("Low").fg(comfy_table::Color::Red),
        Cell::new(format!("< {MEDIUM_BAND:.1}")),
        Cell::new(low),
    ]);
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(comfy_table::Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(""),
        Cell::new(run.file.field_mappings.len()).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    print_issue_table(&run.file.compliance_report);
}

pub fn print_scan_summary(report: &ComplianceReport) {
    let summary = report.summary();
    println!(
        "Compliance: {} errors, {} warnings, {} informational",
        summary.errors, summary.warnings, summary.infos
    );
    println!(
        "Categories: {} privacy, {} payment card, {} audit trail",
        summary.privacy_issues, summary.payment_card_issues, summary.audit_issues
    );
    print_issue_table(report);
}

pub fn print_infer_summary(path: &std::path::Path, schema: &InferredSchema) {
    println!("Schema: {}", path.display());
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Entity"),
        header_cell("Fields"),
        header_cell("Keys"),
    ]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    for entity in &schema.entities {
        let fields: Vec<_> = schema
            .fields
            .iter()
            .filter(|field| field.entity_id == entity.id)
            .collect();
        let keys = fields.iter().filter(|field| field.is_key).count();
        table.add_row(vec![
            Cell::new(&entity.name),
            Cell::new(fields.len()),
            Cell::new(keys),
        ]);
    }
    println!("{table}");
    if !schema.relationships.is_empty() {
        println!("Relationships: {}", schema.relationships.len());
    }
}

fn print_issue_table(report: &ComplianceReport) {
    if report.is_empty() {
        println!("No compliance issues found.");
        return;
    }

    let mut issues: Vec<_> = report.issues.iter().collect();
    issues.sort_by(|a, b| {
        let severity = severity_rank(b.severity).cmp(&severity_rank(a.severity));
        if severity != Ordering::Equal {
            return severity;
        }
        a.code.cmp(&b.code)
    });

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Code"),
        header_cell("Tag"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            Cell::new(&issue.code),
            Cell::new(
                issue
                    .tag
                    .map(|tag| tag.as_str().to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            Cell::new(&issue.message),
        ]);
    }
    println!();
    println!("Issues:");
    println!("{table}");
}

fn band_counts(mappings: &[FieldMapping]) -> (usize, usize, usize) {
    let mut high = 0;
    let mut medium = 0;
    let mut low = 0;
    for mapping in mappings {
        let confidence = mapping.confidence();
        if confidence >= HIGH_BAND {
            high += 1;
        } else if confidence >= MEDIUM_BAND {
            medium += 1;
        } else {
            low += 1;
        }
    }
    (high, medium, low)
}

fn severity_rank(severity: IssueSeverity) -> u8 {
    match severity {
        IssueSeverity::Error => 2,
        IssueSeverity::Warning => 1,
        IssueSeverity::Info => 0,
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("error")
            .fg(comfy_table::Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("warning").fg(comfy_table::Color::Yellow),
        IssueSeverity::Info => Cell::new("info").fg(comfy_table::Color::Blue),
    }
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold)
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(100);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
    if table.column_count() >= 4 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Fixed(10)),
            ColumnConstraint::UpperBoundary(Width::Fixed(13)),
            ColumnConstraint::UpperBoundary(Width::Fixed(14)),
            ColumnConstraint::UpperBoundary(Width::Percentage(60)),
        ]);
    }
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corebridge_model::{EntityMappingId, FieldId, Transform};

    #[test]
    fn bands_split_on_thresholds() {
        let mapping = |confidence| {
            FieldMapping::new(
                EntityMappingId::new("em"),
                FieldId::new("s"),
                FieldId::new("t"),
                Transform::direct(),
                confidence,
                "test",
            )
        };
        let mappings = vec![mapping(0.95), mapping(0.8), mapping(0.7), mapping(0.2)];
        assert_eq!(band_counts(&mappings), (2, 1, 1));
    }
}
