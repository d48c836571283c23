//! In-memory stand-in for an Excel workbook.
//!
//! Only enough state is kept to give the agent believable answers: sparse cell
//! values per sheet, PivotTable and chart registries, and the active sheet.
//! Formatting, sorting and validation are acknowledged but not modelled.

mod args;
mod ops;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};

use crate::address::{AddressError, CellRange, CellRef};

/// Name of the sheet a fresh workbook starts with.
pub const DEFAULT_SHEET: &str = "Arkusz1";

/// A stored cell value.
///
/// Serializes the way the agent expects to read it back: integral numbers as
/// JSON integers and formulas as `"[F:<formula>]"`. Deserialization uses the
/// plain tagged form (`Number(100.0)`, `Text("A")`) so seeds stay readable in RON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Formula(String),
}

impl CellValue {
    /// Coerce a JSON argument into a cell value. `null` means "no value".
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(Self::Bool(*b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::coerce_text(s)),
            other => Some(Self::Text(other.to_string())),
        }
    }

    /// Numeric-looking text becomes a number and `=...` a formula; everything
    /// else stays text.
    pub fn coerce_text(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.len() > 1 && trimmed.starts_with('=') {
            return Self::Formula(trimmed.to_string());
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(s.to_string()),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Text(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Formula(_) => "formula",
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Text as a header or find/replace would see it.
    pub fn display_string(&self) -> String {
        match self {
            Self::Number(n) => match integral(*n) {
                Some(i) => i.to_string(),
                None => n.to_string(),
            },
            Self::Text(s) => s.clone(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Formula(f) => format!("[F:{}]", f),
        }
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(n as i64)
    } else {
        None
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) => match integral(*n) {
                Some(i) => serializer.serialize_i64(i),
                None => serializer.serialize_f64(*n),
            },
            Self::Text(s) => serializer.serialize_str(s),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Formula(f) => serializer.serialize_str(&format!("[F:{}]", f)),
        }
    }
}

/// One worksheet: a name and its non-empty cells keyed by `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn get(&self, cell: CellRef) -> Option<&CellValue> {
        self.cells.get(&(cell.row, cell.col))
    }

    pub fn set(&mut self, cell: CellRef, value: Option<CellValue>) {
        match value {
            Some(v) => {
                self.cells.insert((cell.row, cell.col), v);
            }
            None => {
                self.cells.remove(&(cell.row, cell.col));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Smallest range covering every non-empty cell.
    pub fn used_range(&self) -> Option<CellRange> {
        let mut keys = self.cells.keys();
        let &(r, c) = keys.next()?;
        let (mut min_r, mut min_c, mut max_r, mut max_c) = (r, c, r, c);
        for &(r, c) in keys {
            min_r = min_r.min(r);
            min_c = min_c.min(c);
            max_r = max_r.max(r);
            max_c = max_c.max(c);
        }
        Some(CellRange::new(
            CellRef::new(min_r, min_c),
            CellRef::new(max_r, max_c),
        ))
    }

    /// Cells inside `range`, in row-major order.
    pub fn cells_in(&self, range: CellRange) -> Vec<(CellRef, CellValue)> {
        self.cells
            .range((range.start.row, 0)..=(range.end.row, u32::MAX))
            .map(|(&(r, c), v)| (CellRef::new(r, c), v.clone()))
            .filter(|(cell, _)| range.contains(*cell))
            .collect()
    }

    pub fn clear(&mut self, range: CellRange) -> usize {
        let before = self.cells.len();
        self.cells
            .retain(|&(r, c), _| !range.contains(CellRef::new(r, c)));
        before - self.cells.len()
    }

    /// Apply a row mapping; cells mapped to `None` are dropped.
    fn remap_rows(&mut self, f: impl Fn(u32) -> Option<u32>) {
        let cells = std::mem::take(&mut self.cells);
        self.cells = cells
            .into_iter()
            .filter_map(|((r, c), v)| f(r).map(|r| ((r, c), v)))
            .collect();
    }

    fn text_cells_mut(&mut self) -> impl Iterator<Item = (CellRef, &mut String)> {
        self.cells.iter_mut().filter_map(|(&(r, c), v)| match v {
            CellValue::Text(s) => Some((CellRef::new(r, c), s)),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotTable {
    pub name: String,
    /// Qualified source, e.g. `'Arkusz1'!A1:B6`.
    pub source: String,
    pub dest_sheet: String,
    pub dest_cell: String,
    #[serde(default)]
    pub row_fields: Vec<String>,
    #[serde(default)]
    pub column_fields: Vec<String>,
    #[serde(default)]
    pub value_fields: Vec<String>,
    #[serde(default = "default_value_function")]
    pub value_function: String,
}

fn default_value_function() -> String {
    "sum".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub name: String,
    #[serde(rename = "type")]
    pub chart_type: String,
    pub data_range: String,
    pub sheet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Initial contents for a workbook, loaded with the scenarios.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookSeed {
    #[serde(default)]
    pub sheets: Vec<String>,
    #[serde(default)]
    pub cells: Vec<SeedCell>,
    #[serde(default)]
    pub pivots: Vec<PivotTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedCell {
    #[serde(default)]
    pub sheet: Option<String>,
    pub cell: String,
    pub value: CellValue,
}

#[derive(Debug, Clone)]
pub struct VirtualWorkbook {
    sheets: Vec<Sheet>,
    active: String,
    pivots: Vec<PivotTable>,
    charts: Vec<Chart>,
}

impl Default for VirtualWorkbook {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualWorkbook {
    pub fn new() -> Self {
        Self {
            sheets: vec![Sheet::new(DEFAULT_SHEET)],
            active: DEFAULT_SHEET.to_string(),
            pivots: Vec::new(),
            charts: Vec::new(),
        }
    }

    pub fn from_seed(seed: &WorkbookSeed) -> Result<Self, AddressError> {
        let mut wb = Self::new();
        for name in &seed.sheets {
            wb.ensure_sheet(name);
        }
        for sc in &seed.cells {
            let cell = CellRef::parse(&sc.cell)?;
            let sheet = sc.sheet.clone().unwrap_or_else(|| wb.active.clone());
            wb.ensure_sheet(&sheet).set(cell, Some(sc.value.clone()));
        }
        for pivot in &seed.pivots {
            CellRef::parse(&pivot.dest_cell)?;
            wb.ensure_sheet(&pivot.dest_sheet);
            wb.add_pivot(pivot.clone());
        }
        Ok(wb)
    }

    pub fn active_sheet(&self) -> &str {
        &self.active
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    pub fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    /// Get a sheet, appending an empty one if it does not exist yet.
    pub fn ensure_sheet(&mut self, name: &str) -> &mut Sheet {
        let idx = match self.sheets.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                log::debug!("[workbook] Creating sheet '{}'", name);
                self.sheets.push(Sheet::new(name));
                self.sheets.len() - 1
            }
        };
        &mut self.sheets[idx]
    }

    pub fn pivots(&self) -> &[PivotTable] {
        &self.pivots
    }

    pub fn pivot(&self, name: &str) -> Option<&PivotTable> {
        self.pivots.iter().find(|p| p.name == name)
    }

    /// Insert or replace a PivotTable by name.
    pub fn add_pivot(&mut self, pivot: PivotTable) {
        match self.pivots.iter_mut().find(|p| p.name == pivot.name) {
            Some(existing) => *existing = pivot,
            None => self.pivots.push(pivot),
        }
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    /// Convenience for tests and seeding: the value at `cell` on `sheet`.
    pub fn value(&self, sheet: &str, cell: &str) -> Option<&CellValue> {
        let cell = CellRef::parse(cell).ok()?;
        self.sheet(sheet)?.get(cell)
    }

    /// Snapshot for the end-of-run report.
    pub fn describe(&self) -> Value {
        let sheets: Vec<Value> = self
            .sheets
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "used_range": s.used_range().map(|r| r.to_string()).unwrap_or_default(),
                    "cells": s.cell_count(),
                })
            })
            .collect();
        json!({
            "sheets": sheets,
            "active_sheet": self.active,
            "pivots": self.pivots,
            "charts": self.charts,
        })
    }
}
