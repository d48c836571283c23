//! Dispatch table for the named workbook operations.

use std::str::FromStr;

use serde_json::{Value, json};

use super::args::{Args, parse_cell, parse_range};
use super::{CellValue, Chart, PivotTable, Sheet, VirtualWorkbook};
use crate::address::{CellRange, CellRef};
use crate::tools::ToolName;

type OpResult = Result<Value, String>;

const FILE_NAME: &str = "Test.xlsx";
const FILE_PATH: &str = "C:\\Test.xlsx";
const SHEET_PREFIX: &str = "Arkusz";
/// Upper bound on cells returned by one `read_range`.
const MAX_READ_CELLS: u64 = 10_000;

impl VirtualWorkbook {
    /// Run one named operation against the workbook.
    ///
    /// Never fails: unknown names, bad arguments and refused operations all come
    /// back as `{"error": "..."}` so the model can read and react to them.
    pub fn execute(&mut self, name: &str, args: &Value) -> Value {
        let Ok(tool) = ToolName::from_str(name) else {
            log::warn!("[workbook] Unknown tool requested: {}", name);
            return json!({"error": format!("Unknown tool: {}", name)});
        };
        let args = Args::new(args);

        let result = match tool {
            ToolName::GetWorkbookInfo => Ok(self.workbook_info()),
            ToolName::GetSheetInfo => self.sheet_info(&args),
            ToolName::ReadCell => self.read_cell(&args),
            ToolName::WriteCell => self.write_cell(&args),
            ToolName::ReadRange => self.read_range(&args),
            ToolName::WriteRange => self.write_range(&args),
            ToolName::FormatRange => self.acknowledge_range(&args, json!({})),
            ToolName::InsertFormula => self.insert_formula(&args),
            ToolName::AddSheet => self.add_sheet(&args),
            ToolName::DeleteRows => self.delete_rows(&args),
            ToolName::InsertRows => self.insert_rows(&args),
            ToolName::CreateChart => self.create_chart(&args),
            ToolName::DeleteChart => self.delete_chart(&args),
            ToolName::ListCharts => Ok(self.list_charts(&args)),
            ToolName::CreatePivotTable => self.create_pivot_table(&args),
            ToolName::ListPivotTables => Ok(self.list_pivot_tables(&args)),
            ToolName::MoveTable => self.move_table(&args),
            ToolName::ClearRange => self.clear_range(&args),
            ToolName::SortRange => self.acknowledge_range(
                &args,
                json!({"sorted_by": args.str("sort_column").unwrap_or("A")}),
            ),
            ToolName::AutoFilter => self.acknowledge_range(&args, json!({})),
            ToolName::FindReplace => self.find_replace(&args),
            ToolName::ConditionalFormat => self.acknowledge_range(
                &args,
                json!({"rule_type": args.str("rule_type").unwrap_or("")}),
            ),
            ToolName::CopyRange => self.copy_range(&args),
            ToolName::RenameSheet => self.rename_sheet(&args),
            ToolName::DeleteSheet => self.delete_sheet(&args),
            ToolName::FreezePanes => self.freeze_panes(&args),
            ToolName::RemoveDuplicates => {
                self.acknowledge_range(&args, json!({"rows_removed": 0}))
            }
            ToolName::SetValidation => self.acknowledge_range(&args, json!({})),
        };

        result.unwrap_or_else(|e| {
            log::debug!("[workbook] {} refused: {}", name, e);
            json!({ "error": e })
        })
    }

    fn target(&self, args: &Args) -> String {
        args.str("sheet")
            .map(str::to_string)
            .unwrap_or_else(|| self.active.clone())
    }

    fn existing(&self, name: &str) -> Result<&Sheet, String> {
        self.sheet(name)
            .ok_or_else(|| format!("Sheet '{}' not found", name))
    }

    fn existing_mut(&mut self, name: &str) -> Result<&mut Sheet, String> {
        self.sheet_mut(name)
            .ok_or_else(|| format!("Sheet '{}' not found", name))
    }

    fn workbook_info(&self) -> Value {
        json!({
            "file_name": FILE_NAME,
            "path": FILE_PATH,
            "sheets": self.sheet_names(),
            "active_sheet": self.active,
        })
    }

    fn sheet_info(&self, args: &Args) -> OpResult {
        let name = self.target(args);
        let sheet = self.existing(&name)?;
        let Some(used) = sheet.used_range() else {
            return Ok(json!({
                "name": name,
                "used_range": "",
                "rows": 0,
                "cols": 0,
                "headers": [],
            }));
        };
        let headers: Vec<String> = (used.start.col..=used.end.col)
            .map(|col| {
                sheet
                    .get(CellRef::new(used.start.row, col))
                    .map(CellValue::display_string)
                    .unwrap_or_default()
            })
            .collect();
        Ok(json!({
            "name": name,
            "used_range": used.to_string(),
            "rows": used.rows(),
            "cols": used.cols(),
            "headers": headers,
        }))
    }

    fn read_cell(&self, args: &Args) -> OpResult {
        let raw = args.require_str("cell")?;
        let cell = parse_cell(raw)?;
        let name = self.target(args);
        let sheet = self.existing(&name)?;
        let (value, formula, kind) = match sheet.get(cell) {
            None => (json!(""), String::new(), "empty"),
            Some(CellValue::Formula(f)) => (json!(format!("[F:{}]", f)), f.clone(), "formula"),
            Some(v) => (v.to_json(), String::new(), v.type_name()),
        };
        Ok(json!({
            "cell": raw,
            "value": value,
            "formula": formula,
            "type": kind,
            "sheet": name,
        }))
    }

    fn write_cell(&mut self, args: &Args) -> OpResult {
        let raw = args.require_str("cell")?;
        let cell = parse_cell(raw)?;
        let value = CellValue::from_json(args.require_value("value")?);
        let name = self.target(args);
        let stored = value.as_ref().map(CellValue::to_json).unwrap_or(Value::Null);
        self.ensure_sheet(&name).set(cell, value);
        Ok(json!({"success": true, "cell": raw, "value": stored}))
    }

    fn read_range(&self, args: &Args) -> OpResult {
        let raw = args.require_str("range")?;
        let range = parse_range(raw)?;
        let cells = range.rows() as u64 * range.cols() as u64;
        if cells > MAX_READ_CELLS {
            return Err(format!(
                "Range {} has {} cells; read at most {} at a time",
                raw, cells, MAX_READ_CELLS
            ));
        }
        let name = self.target(args);
        let sheet = self.existing(&name)?;
        let data: Vec<Vec<Value>> = (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| {
                        sheet
                            .get(CellRef::new(row, col))
                            .map(CellValue::to_json)
                            .unwrap_or(Value::Null)
                    })
                    .collect()
            })
            .collect();
        Ok(json!({
            "range": raw,
            "sheet": name,
            "rows": range.rows(),
            "cols": range.cols(),
            "data": data,
        }))
    }

    fn write_range(&mut self, args: &Args) -> OpResult {
        let raw = args.require_str("start_cell")?;
        let start = parse_cell(raw)?;
        let rows = args.grid("data")?;
        let name = self.target(args);

        let mut placed = Vec::new();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let cell = start
                    .offset(r as i64, c as i64)
                    .ok_or_else(|| format!("Data starting at {} runs off the sheet", raw))?;
                placed.push((cell, CellValue::from_json(value)));
            }
        }

        let sheet = self.ensure_sheet(&name);
        let written = placed.len();
        for (cell, value) in placed {
            sheet.set(cell, value);
        }
        Ok(json!({
            "success": true,
            "start_cell": raw,
            "rows_written": rows.len(),
            "cells_written": written,
        }))
    }

    /// Operations the mock accepts without modelling: validate the range, echo it back.
    fn acknowledge_range(&self, args: &Args, extra: Value) -> OpResult {
        let raw = args.require_str("range")?;
        parse_range(raw)?;
        let mut result = json!({"success": true, "range": raw, "sheet": self.target(args)});
        if let (Some(obj), Value::Object(extra)) = (result.as_object_mut(), extra) {
            obj.extend(extra);
        }
        Ok(result)
    }

    fn insert_formula(&mut self, args: &Args) -> OpResult {
        let raw = args.require_str("cell")?;
        let cell = parse_cell(raw)?;
        let formula = args.require_str("formula")?;
        let name = self.target(args);
        self.ensure_sheet(&name)
            .set(cell, Some(CellValue::Formula(formula.to_string())));
        Ok(json!({"success": true, "cell": raw, "formula": formula}))
    }

    fn add_sheet(&mut self, args: &Args) -> OpResult {
        let name = match args.str("name") {
            Some(n) => n.to_string(),
            None => self.next_name(SHEET_PREFIX, self.sheets.len() + 1, |wb, n| wb.has_sheet(n)),
        };
        if self.has_sheet(&name) {
            return Err(format!("Sheet '{}' already exists", name));
        }
        self.ensure_sheet(&name);
        Ok(json!({"success": true, "name": name}))
    }

    /// First `{prefix}{n}` at or after `from` that `taken` rejects.
    fn next_name(&self, prefix: &str, from: usize, taken: impl Fn(&Self, &str) -> bool) -> String {
        (from..)
            .map(|n| format!("{}{}", prefix, n))
            .find(|candidate| !taken(self, candidate))
            .unwrap_or_else(|| prefix.to_string())
    }

    /// Row structure changes are refused while a PivotTable sits on the sheet,
    /// the way Excel refuses them.
    fn ensure_no_pivot(&self, sheet: &str, action: &str) -> Result<(), String> {
        match self.pivots.iter().find(|p| p.dest_sheet == sheet) {
            Some(pivot) => Err(format!(
                "Cannot {} on sheet '{}': PivotTable '{}' at {} would be affected. \
                 Move it to another sheet with move_table first, then retry.",
                action, sheet, pivot.name, pivot.dest_cell
            )),
            None => Ok(()),
        }
    }

    fn row_count(args: &Args) -> Result<u32, String> {
        let count = args.int("count")?.unwrap_or(1);
        if count < 1 {
            return Err("count must be >= 1".to_string());
        }
        u32::try_from(count).map_err(|_| "count is too large".to_string())
    }

    fn delete_rows(&mut self, args: &Args) -> OpResult {
        let start = args.require_int("start_row")?;
        if start < 1 {
            return Err("start_row must be >= 1".to_string());
        }
        let start = u32::try_from(start).map_err(|_| "start_row is too large".to_string())?;
        let count = Self::row_count(args)?;
        let name = self.target(args);
        self.existing(&name)?;
        self.ensure_no_pivot(&name, "delete rows")?;

        let end = start.saturating_add(count);
        self.existing_mut(&name)?.remap_rows(|row| {
            if row < start {
                Some(row)
            } else if row < end {
                None
            } else {
                Some(row - count)
            }
        });
        Ok(json!({"success": true, "deleted_from": start, "count": count}))
    }

    fn insert_rows(&mut self, args: &Args) -> OpResult {
        let at = args.require_int("at_row")?;
        if at < 1 {
            return Err("at_row must be >= 1".to_string());
        }
        let at = u32::try_from(at).map_err(|_| "at_row is too large".to_string())?;
        let count = Self::row_count(args)?;
        let name = self.target(args);
        self.existing(&name)?;
        self.ensure_no_pivot(&name, "insert rows")?;

        self.existing_mut(&name)?.remap_rows(|row| {
            if row < at {
                Some(row)
            } else {
                row.checked_add(count)
                    .filter(|r| *r <= crate::address::MAX_ROWS)
            }
        });
        Ok(json!({"success": true, "at_row": at, "count": count}))
    }

    fn create_chart(&mut self, args: &Args) -> OpResult {
        let data_range = args.require_str("data_range")?;
        parse_range(data_range)?;
        let chart_type = args.str("chart_type").unwrap_or("column").to_string();
        let name = self.next_name("Chart ", self.charts.len() + 1, |wb, n| {
            wb.charts.iter().any(|c| c.name == n)
        });
        let sheet = self.target(args);
        self.charts.push(Chart {
            name: name.clone(),
            chart_type: chart_type.clone(),
            data_range: data_range.to_string(),
            sheet,
            title: args.str("title").map(str::to_string),
        });
        Ok(json!({"success": true, "chart_name": name, "type": chart_type}))
    }

    fn delete_chart(&mut self, args: &Args) -> OpResult {
        let name = args.require_str("chart_name")?;
        let idx = self
            .charts
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| format!("Chart '{}' not found", name))?;
        self.charts.remove(idx);
        Ok(json!({"success": true, "deleted": name}))
    }

    fn list_charts(&self, args: &Args) -> Value {
        let filter = args.str("sheet");
        let charts: Vec<Value> = self
            .charts
            .iter()
            .filter(|c| filter.is_none_or(|s| c.sheet == s))
            .map(|c| {
                json!({
                    "name": c.name,
                    "type": c.chart_type,
                    "data_range": c.data_range,
                    "sheet": c.sheet,
                })
            })
            .collect();
        json!({"count": charts.len(), "charts": charts})
    }

    fn create_pivot_table(&mut self, args: &Args) -> OpResult {
        let source_range = args.require_str("source_range")?;
        parse_range(source_range)?;
        let source_sheet = self.target(args);
        self.existing(&source_sheet)?;

        let name = match args.str("name") {
            Some(n) => n.to_string(),
            None => self.next_name("PT", self.pivots.len() + 1, |wb, n| wb.pivot(n).is_some()),
        };
        if self.pivot(&name).is_some() {
            return Err(format!("PivotTable '{}' already exists", name));
        }

        let (dest_sheet, dest_cell) = match args.str("dest_cell") {
            Some(cell) => {
                parse_cell(cell)?;
                (source_sheet.clone(), cell.to_string())
            }
            None => (format!("Pivot_{}", name), "A1".to_string()),
        };
        self.ensure_sheet(&dest_sheet);

        log::debug!(
            "[workbook] PivotTable '{}' on '{}'!{} from '{}'!{}",
            name,
            dest_sheet,
            dest_cell,
            source_sheet,
            source_range
        );
        self.pivots.push(PivotTable {
            name: name.clone(),
            source: format!("'{}'!{}", source_sheet, source_range),
            dest_sheet: dest_sheet.clone(),
            dest_cell: dest_cell.clone(),
            row_fields: args.str_list("row_fields"),
            column_fields: args.str_list("column_fields"),
            value_fields: args.str_list("value_fields"),
            value_function: args.str("value_function").unwrap_or("sum").to_string(),
        });
        Ok(json!({
            "success": true,
            "name": name,
            "dest_sheet": dest_sheet,
            "dest_cell": dest_cell,
        }))
    }

    fn list_pivot_tables(&self, args: &Args) -> Value {
        let filter = args.str("sheet");
        let pivots: Vec<Value> = self
            .pivots
            .iter()
            .filter(|p| filter.is_none_or(|s| p.dest_sheet == s))
            .map(|p| {
                json!({
                    "name": p.name,
                    "sheet": p.dest_sheet,
                    "location": p.dest_cell,
                    "source": p.source,
                })
            })
            .collect();
        json!({"count": pivots.len(), "pivot_tables": pivots})
    }

    /// Relocate a PivotTable (by name, or by a range covering its anchor) or a
    /// block of data to another sheet.
    fn move_table(&mut self, args: &Args) -> OpResult {
        let source_sheet = self.target(args);
        let dest_cell_raw = args.str("dest_cell").unwrap_or("A1");
        let dest_cell = parse_cell(dest_cell_raw)?;
        let source_range = args.str("source_range").map(parse_range).transpose()?;
        let requested = args.str("name");

        let pivot_idx = match requested {
            Some(name) => self.pivots.iter().position(|p| p.name == name),
            None => None,
        }
        .or_else(|| {
            let range = source_range?;
            self.pivots.iter().position(|p| {
                p.dest_sheet == source_sheet
                    && CellRef::parse(&p.dest_cell).is_ok_and(|anchor| range.contains(anchor))
            })
        });

        if pivot_idx.is_none() && source_range.is_none() {
            if let Some(name) = requested {
                return Err(format!(
                    "PivotTable '{}' not found. Use list_pivot_tables, or pass source_range to move data.",
                    name
                ));
            }
        }

        let dest_sheet = match args.str("dest_sheet") {
            Some(s) => s.to_string(),
            None => format!("Moved_{}", self.sheets.len() + 1),
        };

        if let Some(idx) = pivot_idx {
            self.ensure_sheet(&dest_sheet);
            let pivot = &mut self.pivots[idx];
            let from = std::mem::replace(&mut pivot.dest_sheet, dest_sheet.clone());
            pivot.dest_cell = dest_cell.to_string();
            log::info!(
                "[workbook] Moved PivotTable '{}' from '{}' to '{}'!{}",
                pivot.name,
                from,
                dest_sheet,
                pivot.dest_cell
            );
            return Ok(json!({
                "success": true,
                "moved": "pivot_table",
                "name": pivot.name,
                "from_sheet": from,
                "to_sheet": dest_sheet,
                "dest_cell": pivot.dest_cell,
            }));
        }

        let mut moved = 0;
        if let Some(range) = source_range {
            dest_cell
                .offset(range.rows() as i64 - 1, range.cols() as i64 - 1)
                .ok_or_else(|| format!("Destination {} runs off the sheet", dest_cell))?;
            let cells = self.existing(&source_sheet)?.cells_in(range);
            self.existing_mut(&source_sheet)?.clear(range);
            moved = self.paste(&dest_sheet, range, dest_cell, cells)?;
        } else {
            self.ensure_sheet(&dest_sheet);
        }
        Ok(json!({
            "success": true,
            "moved": "data",
            "to_sheet": dest_sheet,
            "dest_cell": dest_cell_raw,
            "cells_moved": moved,
        }))
    }

    /// Write `cells` taken from `from` so that its top-left corner lands on `to`.
    fn paste(
        &mut self,
        sheet: &str,
        from: CellRange,
        to: CellRef,
        cells: Vec<(CellRef, CellValue)>,
    ) -> Result<usize, String> {
        let dr = to.row as i64 - from.start.row as i64;
        let dc = to.col as i64 - from.start.col as i64;
        let mut placed = Vec::with_capacity(cells.len());
        for (cell, value) in cells {
            let target = cell
                .offset(dr, dc)
                .ok_or_else(|| format!("Destination {} runs off the sheet", to))?;
            placed.push((target, value));
        }
        let dest = self.ensure_sheet(sheet);
        let count = placed.len();
        for (cell, value) in placed {
            dest.set(cell, Some(value));
        }
        Ok(count)
    }

    fn clear_range(&mut self, args: &Args) -> OpResult {
        let raw = args.require_str("range")?;
        let range = parse_range(raw)?;
        let what = args.str("what").unwrap_or("contents").to_ascii_lowercase();
        let name = self.target(args);
        let cleared = match what.as_str() {
            "contents" | "all" => self.existing_mut(&name)?.clear(range),
            "formats" => {
                self.existing(&name)?;
                0
            }
            other => {
                return Err(format!(
                    "Unknown clear mode '{}'; use contents, formats or all",
                    other
                ));
            }
        };
        Ok(json!({"success": true, "range": raw, "cleared": what, "cells_cleared": cleared}))
    }

    fn find_replace(&mut self, args: &Args) -> OpResult {
        let find = args.require_text("find")?;
        if find.is_empty() {
            return Err("find must not be empty".to_string());
        }
        let replace = args.require_text("replace")?;
        let range = args.str("range").map(parse_range).transpose()?;
        let name = self.target(args);

        let mut made = 0;
        for (cell, text) in self.existing_mut(&name)?.text_cells_mut() {
            if range.is_some_and(|r| !r.contains(cell)) {
                continue;
            }
            let hits = text.matches(find).count();
            if hits > 0 {
                *text = text.replace(find, replace);
                made += hits;
            }
        }
        Ok(json!({
            "success": true,
            "find": find,
            "replace": replace,
            "replacements_made": made,
        }))
    }

    fn copy_range(&mut self, args: &Args) -> OpResult {
        let source_raw = args.require_str("source")?;
        let source = parse_range(source_raw)?;
        let destination = args.require_str("destination")?;
        let to = parse_range(destination)?.start;
        let source_sheet = self.target(args);
        let dest_sheet = args
            .str("dest_sheet")
            .map(str::to_string)
            .unwrap_or_else(|| source_sheet.clone());

        let cells = self.existing(&source_sheet)?.cells_in(source);
        let copied = self.paste(&dest_sheet, source, to, cells)?;
        Ok(json!({
            "success": true,
            "source": source_raw,
            "destination": destination,
            "dest_sheet": dest_sheet,
            "cells_copied": copied,
        }))
    }

    fn rename_sheet(&mut self, args: &Args) -> OpResult {
        let old = self.target(args);
        let new = args.require_str("new_name")?.to_string();
        self.existing(&old)?;
        if new != old && self.has_sheet(&new) {
            return Err(format!("Sheet '{}' already exists", new));
        }

        self.existing_mut(&old)?.name = new.clone();
        if self.active == old {
            self.active = new.clone();
        }
        let old_prefix = format!("'{}'!", old);
        for pivot in self.pivots.iter_mut() {
            if pivot.dest_sheet == old {
                pivot.dest_sheet = new.clone();
            }
            if let Some(rest) = pivot.source.strip_prefix(&old_prefix) {
                pivot.source = format!("'{}'!{}", new, rest);
            }
        }
        for chart in self.charts.iter_mut().filter(|c| c.sheet == old) {
            chart.sheet = new.clone();
        }
        Ok(json!({"success": true, "old_name": old, "new_name": new}))
    }

    fn delete_sheet(&mut self, args: &Args) -> OpResult {
        let name = args.require_str("sheet")?;
        if self.sheets.len() <= 1 {
            return Err("Cannot delete the last sheet".to_string());
        }
        let idx = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| format!("Sheet '{}' not found", name))?;
        self.sheets.remove(idx);
        self.pivots.retain(|p| p.dest_sheet != name);
        self.charts.retain(|c| c.sheet != name);
        if self.active == name {
            self.active = self.sheets[0].name.clone();
        }
        Ok(json!({"success": true, "deleted": name}))
    }

    fn freeze_panes(&self, args: &Args) -> OpResult {
        if let Some(cell) = args.str("cell") {
            parse_cell(cell)?;
        }
        let name = self.target(args);
        self.existing(&name)?;
        Ok(json!({"success": true, "unfrozen": args.bool("unfreeze")}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(wb: &mut VirtualWorkbook, name: &str, args: Value) -> Value {
        wb.execute(name, &args)
    }

    fn seeded() -> VirtualWorkbook {
        let mut wb = VirtualWorkbook::new();
        run(
            &mut wb,
            "write_range",
            json!({
                "start_cell": "A1",
                "data": [["Produkt", "Wartość"], ["A", "100"], ["B", "200"], ["C", "300"]],
            }),
        );
        wb
    }

    #[test]
    fn test_unknown_tool() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "launch_rockets", json!({}));
        assert_eq!(out["error"], "Unknown tool: launch_rockets");
    }

    #[test]
    fn test_workbook_info_defaults() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "get_workbook_info", json!({}));
        assert_eq!(out["file_name"], "Test.xlsx");
        assert_eq!(out["sheets"], json!(["Arkusz1"]));
        assert_eq!(out["active_sheet"], "Arkusz1");
    }

    #[test]
    fn test_empty_sheet_info() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "get_sheet_info", json!({}));
        assert_eq!(out["used_range"], "");
        assert_eq!(out["rows"], 0);
        assert_eq!(out["headers"], json!([]));
    }

    #[test]
    fn test_sheet_info_reports_headers() {
        let mut wb = seeded();
        let out = run(&mut wb, "get_sheet_info", json!({}));
        assert_eq!(out["used_range"], "A1:B4");
        assert_eq!(out["rows"], 4);
        assert_eq!(out["cols"], 2);
        assert_eq!(out["headers"], json!(["Produkt", "Wartość"]));
    }

    #[test]
    fn test_write_then_read_cell_coerces_numbers() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "write_cell", json!({"cell": "C3", "value": "42"}));
        assert_eq!(out["value"], 42);
        let out = run(&mut wb, "read_cell", json!({"cell": "C3"}));
        assert_eq!(out["value"], 42);
        assert_eq!(out["type"], "number");

        let out = run(&mut wb, "read_cell", json!({"cell": "Z9"}));
        assert_eq!(out["value"], "");
        assert_eq!(out["type"], "empty");
    }

    #[test]
    fn test_bad_cell_reference_is_an_error_object() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "read_cell", json!({"cell": "A0"}));
        assert!(out["error"].as_str().unwrap().contains("Invalid cell reference"));
        let out = run(&mut wb, "write_cell", json!({"cell": "B2"}));
        assert_eq!(out["error"], "Missing required argument 'value'");
    }

    #[test]
    fn test_read_range_shape() {
        let mut wb = seeded();
        let out = run(&mut wb, "read_range", json!({"range": "A1:C2"}));
        assert_eq!(out["rows"], 2);
        assert_eq!(out["cols"], 3);
        assert_eq!(out["data"], json!([["Produkt", "Wartość", null], ["A", 100, null]]));
    }

    #[test]
    fn test_read_range_missing_sheet() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "read_range", json!({"range": "A1", "sheet": "Nope"}));
        assert_eq!(out["error"], "Sheet 'Nope' not found");
    }

    #[test]
    fn test_write_range_counts() {
        let mut wb = VirtualWorkbook::new();
        let out = run(
            &mut wb,
            "write_range",
            json!({"start_cell": "B2", "data": [["x", "1"], ["y"]], "sheet": "Nowy"}),
        );
        assert_eq!(out["rows_written"], 2);
        assert_eq!(out["cells_written"], 3);
        assert_eq!(wb.value("Nowy", "C2"), Some(&CellValue::Number(1.0)));
    }

    #[test]
    fn test_insert_formula_reads_back() {
        let mut wb = VirtualWorkbook::new();
        run(&mut wb, "insert_formula", json!({"cell": "E2", "formula": "=C2*D2"}));
        let out = run(&mut wb, "read_cell", json!({"cell": "E2"}));
        assert_eq!(out["formula"], "=C2*D2");
        assert_eq!(out["value"], "[F:=C2*D2]");
        assert_eq!(out["type"], "formula");
    }

    #[test]
    fn test_add_sheet_default_and_duplicate() {
        let mut wb = VirtualWorkbook::new();
        assert_eq!(run(&mut wb, "add_sheet", json!({}))["name"], "Arkusz2");
        let out = run(&mut wb, "add_sheet", json!({"name": "Arkusz2"}));
        assert_eq!(out["error"], "Sheet 'Arkusz2' already exists");
    }

    #[test]
    fn test_delete_rows_shifts_cells_up() {
        let mut wb = seeded();
        let out = run(&mut wb, "delete_rows", json!({"start_row": 2, "count": 2}));
        assert_eq!(out["success"], true);
        assert_eq!(wb.value("Arkusz1", "A2"), Some(&CellValue::Text("C".into())));
        assert_eq!(wb.value("Arkusz1", "A3"), None);
    }

    #[test]
    fn test_row_ops_validate_start() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "delete_rows", json!({"start_row": 0}));
        assert_eq!(out["error"], "start_row must be >= 1");
        let out = run(&mut wb, "insert_rows", json!({"at_row": -3}));
        assert_eq!(out["error"], "at_row must be >= 1");
    }

    #[test]
    fn test_insert_rows_shifts_cells_down() {
        let mut wb = seeded();
        run(&mut wb, "insert_rows", json!({"at_row": 2, "count": "3"}));
        assert_eq!(wb.value("Arkusz1", "A2"), None);
        assert_eq!(wb.value("Arkusz1", "A5"), Some(&CellValue::Text("A".into())));
    }

    #[test]
    fn test_pivot_on_sheet_blocks_row_changes_until_moved() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "dest_cell": "D1", "row_fields": ["Produkt"], "value_fields": ["Wartość"]}),
        );
        let blocked = run(&mut wb, "delete_rows", json!({"start_row": 8, "count": 13}));
        assert!(blocked["error"].as_str().unwrap().contains("move_table"));

        let moved = run(&mut wb, "move_table", json!({"name": "PT1", "dest_sheet": "Pivoty"}));
        assert_eq!(moved["moved"], "pivot_table");
        assert_eq!(moved["from_sheet"], "Arkusz1");
        assert_eq!(wb.pivot("PT1").unwrap().dest_sheet, "Pivoty");

        let ok = run(&mut wb, "delete_rows", json!({"start_row": 8, "count": 13}));
        assert_eq!(ok["success"], true);
    }

    #[test]
    fn test_insert_rows_blocked_by_pivot() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "dest_cell": "D1", "row_fields": ["Produkt"], "value_fields": ["Wartość"]}),
        );
        let blocked = run(&mut wb, "insert_rows", json!({"at_row": 2, "count": 1}));
        let message = blocked["error"].as_str().unwrap();
        assert!(message.starts_with("Cannot insert rows on sheet 'Arkusz1'"));
        assert!(message.contains("PT1"));
        assert_eq!(wb.value("Arkusz1", "A2"), Some(&CellValue::Text("A".into())));

        run(&mut wb, "move_table", json!({"name": "PT1", "dest_sheet": "Pivoty"}));
        let ok = run(&mut wb, "insert_rows", json!({"at_row": 2, "count": 1}));
        assert_eq!(ok["success"], true);
        assert_eq!(wb.value("Arkusz1", "A3"), Some(&CellValue::Text("A".into())));
    }

    #[test]
    fn test_pivot_default_destination_sheet() {
        let mut wb = seeded();
        let out = run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "row_fields": ["Produkt"], "value_fields": ["Wartość"]}),
        );
        assert_eq!(out["name"], "PT1");
        assert_eq!(out["dest_sheet"], "Pivot_PT1");
        assert_eq!(out["dest_cell"], "A1");
        assert!(wb.has_sheet("Pivot_PT1"));
        assert_eq!(wb.pivot("PT1").unwrap().source, "'Arkusz1'!A1:B4");

        let listed = run(&mut wb, "list_pivot_tables", json!({"sheet": "Arkusz1"}));
        assert_eq!(listed["count"], 0);
        let listed = run(&mut wb, "list_pivot_tables", json!({}));
        assert_eq!(listed["pivot_tables"][0]["sheet"], "Pivot_PT1");
    }

    #[test]
    fn test_move_table_finds_pivot_by_range() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "dest_cell": "D1", "name": "Sprzedaz", "row_fields": [], "value_fields": []}),
        );
        let out = run(&mut wb, "move_table", json!({"source_range": "D1:E5"}));
        assert_eq!(out["moved"], "pivot_table");
        assert_eq!(out["to_sheet"], "Moved_2");
    }

    #[test]
    fn test_move_table_moves_data() {
        let mut wb = seeded();
        let out = run(
            &mut wb,
            "move_table",
            json!({"source_range": "A1:B4", "dest_sheet": "Dane", "dest_cell": "B2"}),
        );
        assert_eq!(out["moved"], "data");
        assert_eq!(out["cells_moved"], 8);
        assert_eq!(wb.value("Arkusz1", "A1"), None);
        assert_eq!(wb.value("Dane", "B2"), Some(&CellValue::Text("Produkt".into())));
        assert_eq!(wb.value("Dane", "C5"), Some(&CellValue::Number(300.0)));
    }

    #[test]
    fn test_move_table_unknown_pivot() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "move_table", json!({"name": "PT9"}));
        assert!(out["error"].as_str().unwrap().starts_with("PivotTable 'PT9' not found"));
    }

    #[test]
    fn test_chart_lifecycle() {
        let mut wb = seeded();
        let out = run(&mut wb, "create_chart", json!({"data_range": "A1:B4"}));
        assert_eq!(out["chart_name"], "Chart 1");
        assert_eq!(out["type"], "column");
        run(&mut wb, "create_chart", json!({"data_range": "A1:B4", "chart_type": "pie"}));
        assert_eq!(run(&mut wb, "list_charts", json!({}))["count"], 2);

        assert_eq!(run(&mut wb, "delete_chart", json!({"chart_name": "Chart 1"}))["deleted"], "Chart 1");
        let out = run(&mut wb, "create_chart", json!({"data_range": "A1:B4"}));
        assert_eq!(out["chart_name"], "Chart 3");
        let out = run(&mut wb, "delete_chart", json!({"chart_name": "Chart 1"}));
        assert_eq!(out["error"], "Chart 'Chart 1' not found");
    }

    #[test]
    fn test_clear_range_modes() {
        let mut wb = seeded();
        let out = run(&mut wb, "clear_range", json!({"range": "A1:B2", "what": "formats"}));
        assert_eq!(out["cells_cleared"], 0);
        let out = run(&mut wb, "clear_range", json!({"range": "A1:B2"}));
        assert_eq!(out["cleared"], "contents");
        assert_eq!(out["cells_cleared"], 4);
        let out = run(&mut wb, "clear_range", json!({"range": "A1", "what": "colors"}));
        assert!(out["error"].is_string());
    }

    #[test]
    fn test_find_replace_counts_hits() {
        let mut wb = seeded();
        let out = run(&mut wb, "find_replace", json!({"find": "Produkt", "replace": "Towar"}));
        assert_eq!(out["replacements_made"], 1);
        assert_eq!(wb.value("Arkusz1", "A1"), Some(&CellValue::Text("Towar".into())));

        let out = run(&mut wb, "find_replace", json!({"find": "B", "replace": "", "range": "A1:A2"}));
        assert_eq!(out["replacements_made"], 0);
    }

    #[test]
    fn test_copy_range_to_other_sheet() {
        let mut wb = seeded();
        let out = run(
            &mut wb,
            "copy_range",
            json!({"source": "A1:A2", "destination": "C1", "dest_sheet": "Kopia"}),
        );
        assert_eq!(out["cells_copied"], 2);
        assert_eq!(wb.value("Kopia", "C2"), Some(&CellValue::Text("A".into())));
        assert_eq!(wb.value("Arkusz1", "A2"), Some(&CellValue::Text("A".into())));
    }

    #[test]
    fn test_rename_sheet_follows_active_and_pivots() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "dest_cell": "D1", "row_fields": [], "value_fields": []}),
        );
        let out = run(&mut wb, "rename_sheet", json!({"new_name": "Dane"}));
        assert_eq!(out["old_name"], "Arkusz1");
        assert_eq!(wb.active_sheet(), "Dane");
        assert_eq!(wb.pivot("PT1").unwrap().dest_sheet, "Dane");
        assert_eq!(wb.sheet_names(), vec!["Dane"]);
    }

    #[test]
    fn test_rename_sheet_rewrites_pivot_source() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "row_fields": ["Produkt"], "value_fields": ["Wartość"]}),
        );
        run(&mut wb, "rename_sheet", json!({"sheet": "Arkusz1", "new_name": "Dane"}));
        assert_eq!(wb.pivot("PT1").unwrap().source, "'Dane'!A1:B4");
        assert_eq!(wb.pivot("PT1").unwrap().dest_sheet, "Pivot_PT1");

        let listed = run(&mut wb, "list_pivot_tables", json!({}));
        assert_eq!(listed["pivot_tables"][0]["source"], "'Dane'!A1:B4");
    }

    #[test]
    fn test_rename_to_existing_sheet_fails() {
        let mut wb = seeded();
        run(&mut wb, "add_sheet", json!({"name": "Dane"}));
        let out = run(&mut wb, "rename_sheet", json!({"sheet": "Arkusz1", "new_name": "Dane"}));
        assert_eq!(out["error"], "Sheet 'Dane' already exists");
        assert_eq!(wb.sheet_names(), vec!["Arkusz1", "Dane"]);
        assert_eq!(wb.value("Arkusz1", "A2"), Some(&CellValue::Text("A".into())));
    }

    #[test]
    fn test_delete_sheet_rules() {
        let mut wb = VirtualWorkbook::new();
        let out = run(&mut wb, "delete_sheet", json!({"sheet": "Arkusz1"}));
        assert_eq!(out["error"], "Cannot delete the last sheet");

        run(&mut wb, "add_sheet", json!({"name": "Drugi"}));
        let out = run(&mut wb, "delete_sheet", json!({"sheet": "Trzeci"}));
        assert_eq!(out["error"], "Sheet 'Trzeci' not found");

        let out = run(&mut wb, "delete_sheet", json!({"sheet": "Arkusz1"}));
        assert_eq!(out["deleted"], "Arkusz1");
        assert_eq!(wb.active_sheet(), "Drugi");
    }

    #[test]
    fn test_delete_sheet_drops_hosted_pivots_and_charts() {
        let mut wb = seeded();
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "dest_cell": "D1", "row_fields": ["Produkt"], "value_fields": ["Wartość"]}),
        );
        run(&mut wb, "create_chart", json!({"sheet": "Arkusz1", "data_range": "A1:B4"}));
        run(
            &mut wb,
            "create_pivot_table",
            json!({"source_range": "A1:B4", "name": "Zostaje", "row_fields": [], "value_fields": []}),
        );
        assert_eq!(wb.pivots().len(), 2);
        assert_eq!(wb.charts().len(), 1);

        let out = run(&mut wb, "delete_sheet", json!({"sheet": "Arkusz1"}));
        assert_eq!(out["deleted"], "Arkusz1");
        assert!(wb.pivot("PT1").is_none());
        assert!(wb.pivot("Zostaje").is_some());
        assert!(wb.charts().is_empty());
    }

    #[test]
    fn test_acknowledged_operations_validate_range() {
        let mut wb = VirtualWorkbook::new();
        for name in ["format_range", "auto_filter", "set_validation", "remove_duplicates"] {
            let out = run(&mut wb, name, json!({"range": "A1:B2"}));
            assert_eq!(out["success"], true, "{}", name);
            let out = run(&mut wb, name, json!({"range": "nonsense"}));
            assert!(out["error"].is_string(), "{}", name);
        }
        let out = run(&mut wb, "sort_range", json!({"range": "A1:B9"}));
        assert_eq!(out["sorted_by"], "A");
        let out = run(&mut wb, "remove_duplicates", json!({"range": "A1:B9"}));
        assert_eq!(out["rows_removed"], 0);
        assert_eq!(run(&mut wb, "freeze_panes", json!({"cell": "A2"}))["success"], true);
    }
}
