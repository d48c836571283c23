use serde_json::{Value, json};

use super::ToolSpec;

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn number(description: &str) -> Value {
    json!({"type": "number", "description": description})
}

fn boolean(description: &str) -> Value {
    json!({"type": "boolean", "description": description})
}

fn string_list(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

/// Schemas for every workbook operation, in the order they are offered to the model.
pub fn tool_definitions() -> Vec<ToolSpec> {
    vec![
        ToolSpec::function(
            "read_cell",
            "Read the value and formula of a single cell.",
            json!({"cell": string("Cell address, e.g. A1"), "sheet": string("Sheet name (default: active)")}),
            &["cell"],
        ),
        ToolSpec::function(
            "write_cell",
            "Write a value to a single cell. Numeric text is stored as a number.",
            json!({
                "cell": string("Cell address"),
                "value": string("Value to write"),
                "sheet": string("Sheet name"),
            }),
            &["cell", "value"],
        ),
        ToolSpec::function(
            "read_range",
            "Read a rectangular range as a 2D array.",
            json!({"range": string("Range, e.g. A1:D10"), "sheet": string("Sheet name")}),
            &["range"],
        ),
        ToolSpec::function(
            "write_range",
            "Write a 2D array starting at a cell.",
            json!({
                "start_cell": string("Top-left cell"),
                "data": {
                    "type": "array",
                    "description": "2D array of rows",
                    "items": {"type": "array", "items": {"type": "string"}},
                },
                "sheet": string("Sheet name"),
            }),
            &["start_cell", "data"],
        ),
        ToolSpec::function(
            "get_sheet_info",
            "Used range, size and header row of a sheet.",
            json!({"sheet": string("Sheet name")}),
            &[],
        ),
        ToolSpec::function(
            "get_workbook_info",
            "File name, sheet list and active sheet.",
            json!({}),
            &[],
        ),
        ToolSpec::function(
            "format_range",
            "Apply formatting to cells.",
            json!({
                "range": string("Range"),
                "bold": boolean("Bold"),
                "italic": boolean("Italic"),
                "font_size": number("Font size"),
                "font_color": number("Font color (RGB Long)"),
                "bg_color": number("Background color (RGB Long)"),
                "number_format": string("Number format, e.g. 0.00 zł"),
                "h_align": string("left/center/right"),
                "wrap_text": boolean("Wrap text"),
                "borders": boolean("Thin borders"),
                "column_width": number("Column width"),
                "row_height": number("Row height"),
                "autofit": boolean("Autofit columns"),
                "merge": boolean("Merge cells"),
                "sheet": string("Sheet name"),
            }),
            &["range"],
        ),
        ToolSpec::function(
            "insert_formula",
            "Insert a formula (English function names) into a cell.",
            json!({
                "cell": string("Cell address"),
                "formula": string("Formula, e.g. =SUM(A1:A10)"),
                "sheet": string("Sheet name"),
            }),
            &["cell", "formula"],
        ),
        ToolSpec::function(
            "sort_range",
            "Sort a range by one column.",
            json!({
                "range": string("Range"),
                "sort_column": string("Column letter"),
                "order": string("asc/desc"),
                "has_headers": boolean("First row is a header"),
                "sheet": string("Sheet name"),
            }),
            &["range", "sort_column"],
        ),
        ToolSpec::function(
            "add_sheet",
            "Add a new worksheet.",
            json!({"name": string("Sheet name")}),
            &[],
        ),
        ToolSpec::function(
            "delete_rows",
            "Delete whole rows. Fails if a PivotTable is on the sheet; move it first.",
            json!({
                "start_row": number("First row (1-based)"),
                "count": number("Number of rows (default 1)"),
                "sheet": string("Sheet name"),
            }),
            &["start_row"],
        ),
        ToolSpec::function(
            "insert_rows",
            "Insert empty rows. Fails if a PivotTable is on the sheet; move it first.",
            json!({
                "at_row": number("Row to insert at (1-based)"),
                "count": number("Number of rows (default 1)"),
                "sheet": string("Sheet name"),
            }),
            &["at_row"],
        ),
        ToolSpec::function(
            "create_chart",
            "Create a chart from a data range.",
            json!({
                "data_range": string("Data range"),
                "chart_type": string("column/bar/line/pie"),
                "title": string("Chart title"),
                "sheet": string("Sheet name"),
            }),
            &["data_range"],
        ),
        ToolSpec::function(
            "delete_chart",
            "Delete a chart by name.",
            json!({"chart_name": string("Chart name"), "sheet": string("Sheet name")}),
            &["chart_name"],
        ),
        ToolSpec::function(
            "list_charts",
            "List charts.",
            json!({"sheet": string("Sheet name")}),
            &[],
        ),
        ToolSpec::function(
            "create_pivot_table",
            "Create a PivotTable. Without dest_cell it goes to a new sheet.",
            json!({
                "source_range": string("Source data range including headers"),
                "dest_cell": string("Destination cell on the source sheet"),
                "name": string("PivotTable name"),
                "row_fields": string_list("Row fields (header names)"),
                "column_fields": string_list("Column fields"),
                "value_fields": string_list("Value fields"),
                "value_function": string("sum/count/average/max/min"),
                "sheet": string("Source sheet"),
            }),
            &["source_range", "row_fields", "value_fields"],
        ),
        ToolSpec::function(
            "move_table",
            "Move data or a PivotTable to another sheet. Use when a pivot blocks delete_rows/insert_rows.",
            json!({
                "name": string("PivotTable name"),
                "source_range": string("Source range"),
                "dest_sheet": string("Destination sheet (created if missing)"),
                "dest_cell": string("Destination cell (default A1)"),
                "sheet": string("Source sheet"),
            }),
            &[],
        ),
        ToolSpec::function(
            "auto_filter",
            "Apply or clear an AutoFilter.",
            json!({
                "range": string("Range"),
                "field": number("Column offset (1-based)"),
                "criteria": string("Criteria, e.g. >100"),
                "clear": boolean("Remove the filter"),
                "sheet": string("Sheet name"),
            }),
            &["range"],
        ),
        ToolSpec::function(
            "find_replace",
            "Find and replace text.",
            json!({
                "find": string("Text to find"),
                "replace": string("Replacement"),
                "range": string("Limit to range"),
                "sheet": string("Sheet name"),
            }),
            &["find", "replace"],
        ),
        ToolSpec::function(
            "conditional_format",
            "Add a conditional formatting rule.",
            json!({
                "range": string("Range"),
                "rule_type": string("color_scale/data_bars/cell_value/duplicate/top_bottom"),
                "value1": string("Rule value"),
                "format_color": number("Color (RGB Long)"),
                "sheet": string("Sheet name"),
            }),
            &["range", "rule_type"],
        ),
        ToolSpec::function(
            "copy_range",
            "Copy a range to another location.",
            json!({
                "source": string("Source range"),
                "destination": string("Destination top-left cell"),
                "dest_sheet": string("Destination sheet"),
                "values_only": boolean("Paste values only"),
                "sheet": string("Source sheet"),
            }),
            &["source", "destination"],
        ),
        ToolSpec::function(
            "rename_sheet",
            "Rename a sheet.",
            json!({"sheet": string("Current name (default: active)"), "new_name": string("New name")}),
            &["new_name"],
        ),
        ToolSpec::function(
            "delete_sheet",
            "Delete a sheet.",
            json!({"sheet": string("Sheet name")}),
            &["sheet"],
        ),
        ToolSpec::function(
            "freeze_panes",
            "Freeze rows/columns above and left of a cell.",
            json!({
                "cell": string("Cell, e.g. A2"),
                "unfreeze": boolean("Remove freeze"),
                "sheet": string("Sheet name"),
            }),
            &[],
        ),
        ToolSpec::function(
            "remove_duplicates",
            "Remove duplicate rows.",
            json!({
                "range": string("Range"),
                "columns": {"type": "array", "items": {"type": "number"}, "description": "Columns to compare"},
                "has_headers": boolean("First row is a header"),
                "sheet": string("Sheet name"),
            }),
            &["range"],
        ),
        ToolSpec::function(
            "set_validation",
            "Add data validation.",
            json!({
                "range": string("Range"),
                "type": string("list/whole/decimal/date/length"),
                "formula1": string("List items or minimum"),
                "sheet": string("Sheet name"),
            }),
            &["range", "type", "formula1"],
        ),
        ToolSpec::function(
            "list_pivot_tables",
            "List PivotTables with their location and source.",
            json!({"sheet": string("Sheet name")}),
            &[],
        ),
        ToolSpec::function(
            "clear_range",
            "Clear contents, formats or both.",
            json!({"range": string("Range"), "what": string("contents/formats/all"), "sheet": string("Sheet name")}),
            &["range"],
        ),
    ]
}
