//! Terminal and JSON rendering of table views

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde_json::json;
use tabview_core::Record;
use tabview_engine::{ComposedView, FieldKind, PaginationState};

use crate::schema::Column;

pub fn render_table(columns: &[Column], rows: &[&Record]) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(columns.iter().map(|c| c.name.as_str()));

    for row in rows {
        table.add_row(columns.iter().map(|c| cell(row, c)));
    }
    table.to_string()
}

fn cell(row: &Record, column: &Column) -> String {
    let value = row.get(&column.name);
    match column.kind {
        FieldKind::Bool => value
            .as_bool()
            .map(|b| if b { "yes" } else { "no" }.to_string())
            .unwrap_or_else(|| value.to_string()),
        _ => value.to_string(),
    }
}

/// e.g. "Page 2 of 3 · 26–50 of 57"
pub fn pagination_footer(pagination: &PaginationState) -> String {
    format!(
        "Page {} of {} · {}",
        pagination.current_page,
        pagination.total_pages(),
        pagination.range_label()
    )
}

pub fn view_json(view: &ComposedView<'_, Record>) -> serde_json::Value {
    json!({
        "rows": view.visible_rows,
        "pagination": view.pagination,
        "totalPages": view.pagination.total_pages(),
    })
}

pub fn export_json(rows: &[&Record]) -> serde_json::Value {
    json!(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabview_engine::ViewStatus;

    fn records() -> Vec<Record> {
        Record::parse_collection(r#"[{"id": 1, "name": "Acme", "vip": true}]"#).unwrap()
    }

    fn columns() -> Vec<Column> {
        vec![
            Column {
                name: "name".into(),
                kind: FieldKind::Text,
            },
            Column {
                name: "vip".into(),
                kind: FieldKind::Bool,
            },
        ]
    }

    #[test]
    fn test_render_table_includes_headers_and_cells() {
        let records = records();
        let rows: Vec<&Record> = records.iter().collect();
        let rendered = render_table(&columns(), &rows);
        assert!(rendered.contains("name"));
        assert!(rendered.contains("Acme"));
        assert!(rendered.contains("yes"));
    }

    #[test]
    fn test_pagination_footer() {
        let pagination = PaginationState::new(25).recompute(57).set_page(2);
        assert_eq!(pagination_footer(&pagination), "Page 2 of 3 · 26–50 of 57");
    }

    #[test]
    fn test_view_json_shape() {
        let records = records();
        let view = ComposedView {
            visible_rows: records.iter().collect(),
            pagination: PaginationState::new(10).recompute(1),
            status: ViewStatus::Populated,
        };
        let json = view_json(&view);
        assert_eq!(json["rows"][0]["name"], "Acme");
        assert_eq!(json["pagination"]["pageSize"], 10);
        assert_eq!(json["totalPages"], 1);
    }
}
