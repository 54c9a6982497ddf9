// Result presentation: per-file grouping, comfy-table for terminals, one line per match for pipes
use crate::cli_output::{OutputMode, OutputWriter};
use crate::models::{ActionMatch, FieldDependency, TriggerMatch};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// A result record that can be listed under its file.
pub trait ReportRow {
    fn file_name(&self) -> &str;
    fn headers() -> &'static [&'static str];
    fn cells(&self) -> Vec<String>;
    fn plain_line(&self) -> String;
    fn order(&self, other: &Self) -> Ordering;
}

impl ReportRow for TriggerMatch {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn headers() -> &'static [&'static str] {
        &["Trigger", "Event", "Scope", "Entity"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.trigger_name.clone(),
            self.event_label.clone(),
            self.scope_label.clone(),
            self.entity_name.clone(),
        ]
    }

    fn plain_line(&self) -> String {
        format!(
            "- Trigger: \"{}\" | Event: {} | Scope: {} | Entity: {}",
            self.trigger_name, self.event_label, self.scope_label, self.entity_name
        )
    }

    fn order(&self, other: &Self) -> Ordering {
        self.trigger_name.cmp(&other.trigger_name)
    }
}

impl ReportRow for ActionMatch {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn headers() -> &'static [&'static str] {
        &["Action", "Type", "Operation", "Entity"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.action_name.clone(),
            self.action_type.clone(),
            self.operation_id.clone(),
            self.entity_name.clone(),
        ]
    }

    fn plain_line(&self) -> String {
        format!(
            "- Action: \"{}\" | Type: {} | Operation: {} | Entity: {}",
            self.action_name, self.action_type, self.operation_id, self.entity_name
        )
    }

    fn order(&self, other: &Self) -> Ordering {
        self.action_name.cmp(&other.action_name)
    }
}

impl ReportRow for FieldDependency {
    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn headers() -> &'static [&'static str] {
        &["Source", "Name", "Dependency", "Entity", "Field", "Details"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.source_kind.to_string(),
            self.source_name.clone(),
            self.dependency_kind.to_string(),
            self.entity_name.clone(),
            self.field_name.clone(),
            self.details.clone(),
        ]
    }

    fn plain_line(&self) -> String {
        format!(
            "- {}: \"{}\" | Type: {} | Entity: {} | Field: {} | Details: {}",
            self.source_kind,
            self.source_name,
            self.dependency_kind,
            self.entity_name,
            self.field_name,
            self.details
        )
    }

    fn order(&self, other: &Self) -> Ordering {
        self.source_kind
            .cmp(&other.source_kind)
            .then_with(|| self.source_name.cmp(&other.source_name))
    }
}

/// Matches keyed by file name, each group sorted by its row order.
/// The sort is stable, so equal rows keep the order the analyzer found them in.
pub fn group_by_file<T: ReportRow>(matches: &[T]) -> BTreeMap<&str, Vec<&T>> {
    let mut groups: BTreeMap<&str, Vec<&T>> = BTreeMap::new();
    for item in matches {
        groups.entry(item.file_name()).or_default().push(item);
    }
    for rows in groups.values_mut() {
        rows.sort_by(|a, b| a.order(b));
    }
    groups
}

pub fn render_table<T: ReportRow>(rows: &[&T]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers().to_vec());
    for row in rows {
        table.add_row(row.cells());
    }
    table.to_string()
}

pub fn render_plain<T: ReportRow>(matches: &[T]) -> String {
    let mut out = String::new();
    for (file, rows) in group_by_file(matches) {
        out.push_str(&format!("File: {}\n", file));
        for row in rows {
            out.push_str(&format!("  {}\n", row.plain_line()));
        }
    }
    out
}

/// Print results under one section per file. JSON mode prints nothing here.
pub fn print_matches<T: ReportRow>(writer: &OutputWriter, matches: &[T]) {
    match writer.mode() {
        OutputMode::Human => {
            for (file, rows) in group_by_file(matches) {
                writer.section(&format!("File: {}", file));
                println!("{}", render_table(&rows));
            }
        }
        OutputMode::Plain => print!("{}", render_plain(matches)),
        OutputMode::Json => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DependencyKind, SourceKind};

    fn action(name: &str, file: &str) -> ActionMatch {
        ActionMatch {
            action_name: name.to_string(),
            action_type: "OpenApiConnection".to_string(),
            operation_id: "DeleteRecord".to_string(),
            entity_name: "contact".to_string(),
            file_name: file.to_string(),
        }
    }

    fn dependency(kind: SourceKind, name: &str) -> FieldDependency {
        FieldDependency {
            file_name: "Flow.json".to_string(),
            source_kind: kind,
            source_name: name.to_string(),
            dependency_kind: DependencyKind::Condition,
            entity_name: "account".to_string(),
            field_name: "name".to_string(),
            details: "Field referenced in condition logic (manual check recommended)".to_string(),
        }
    }

    #[test]
    fn test_group_by_file_sorts_files_and_rows() {
        let matches = vec![
            action("Zeta", "B.json"),
            action("Delete_a_row", "A.json"),
            action("Alpha", "B.json"),
        ];
        let groups = group_by_file(&matches);
        let files: Vec<_> = groups.keys().copied().collect();
        assert_eq!(files, vec!["A.json", "B.json"]);

        let names: Vec<_> = groups["B.json"].iter().map(|m| m.action_name.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_field_dependencies_order_triggers_first() {
        let matches = vec![
            dependency(SourceKind::Action, "Apply"),
            dependency(SourceKind::Trigger, "When_a_row_is_modified"),
            dependency(SourceKind::Action, "Add_note"),
        ];
        let groups = group_by_file(&matches);
        let order: Vec<_> = groups["Flow.json"]
            .iter()
            .map(|d| (d.source_kind, d.source_name.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (SourceKind::Trigger, "When_a_row_is_modified"),
                (SourceKind::Action, "Add_note"),
                (SourceKind::Action, "Apply"),
            ]
        );
    }

    #[test]
    fn test_render_plain() {
        let matches = vec![TriggerMatch {
            trigger_name: "When_a_row_is_added".to_string(),
            event_label: "Create".to_string(),
            scope_label: "Organization".to_string(),
            entity_name: "contact".to_string(),
            file_name: "Flow.json".to_string(),
        }];
        assert_eq!(
            render_plain(&matches),
            "File: Flow.json\n  - Trigger: \"When_a_row_is_added\" | Event: Create | Scope: Organization | Entity: contact\n"
        );
    }

    #[test]
    fn test_render_plain_field_dependency_line() {
        let line = dependency(SourceKind::Trigger, "When_modified").plain_line();
        assert!(line.starts_with("- Trigger: \"When_modified\" | Type: Condition |"));
        assert!(line.ends_with("(manual check recommended)"));
    }

    #[test]
    fn test_render_table_contains_headers_and_cells() {
        let matches = vec![action("Delete_a_row", "A.json")];
        let rows: Vec<_> = matches.iter().collect();
        let table = render_table(&rows);
        assert!(table.contains("Operation"));
        assert!(table.contains("Delete_a_row"));
        assert!(table.contains("DeleteRecord"));
    }
}
