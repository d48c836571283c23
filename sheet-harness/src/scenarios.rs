//! Fixed conversation scenarios, loaded from `config/scenarios.ron`, and the
//! end-of-run summary.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::agent;
use crate::ai::CompletionBackend;
use crate::error::{HarnessError, Result};
use crate::models::RunOutcome;
use crate::workbook::{CellValue, PivotTable, SeedCell, VirtualWorkbook, WorkbookSeed};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Short id other scenarios refer to, e.g. `T1`.
    pub key: String,
    /// Name used in the summary.
    pub title: String,
    /// Header printed above the transcript.
    pub label: String,
    pub prompt: String,
    /// Falls back to `TEST_MAX_ROUNDS` when unset.
    #[serde(default)]
    pub max_rounds: Option<usize>,
    #[serde(default)]
    pub seed: Option<WorkbookSeed>,
    /// Key of an earlier scenario whose workbook this one continues with. Only
    /// runs if that scenario stopped `ok`.
    #[serde(default)]
    pub requires: Option<String>,
    /// Print the final workbook state in the summary.
    #[serde(default)]
    pub show_state: bool,
}

impl Scenario {
    fn workbook(&self) -> std::result::Result<VirtualWorkbook, String> {
        match &self.seed {
            Some(seed) => VirtualWorkbook::from_seed(seed).map_err(|e| e.to_string()),
            None => Ok(VirtualWorkbook::new()),
        }
    }
}

/// Parse and validate a RON scenario list. `source` names the input in errors.
pub fn parse_scenarios(content: &str, source: &str) -> Result<Vec<Scenario>> {
    let invalid = |message: String| HarnessError::Scenarios {
        path: source.to_string(),
        message,
    };
    let scenarios: Vec<Scenario> = ron::from_str(content).map_err(|e| invalid(e.to_string()))?;

    let mut seen = HashSet::new();
    for scenario in &scenarios {
        if let Some(required) = &scenario.requires {
            if !seen.contains(required.as_str()) {
                return Err(invalid(format!(
                    "scenario '{}' requires '{}', which does not run before it",
                    scenario.key, required
                )));
            }
        }
        if scenario.max_rounds == Some(0) {
            return Err(invalid(format!(
                "scenario '{}' has max_rounds 0; use at least 1 or leave it unset",
                scenario.key
            )));
        }
        if !seen.insert(scenario.key.as_str()) {
            return Err(invalid(format!("duplicate scenario key '{}'", scenario.key)));
        }
        scenario
            .workbook()
            .map_err(|e| invalid(format!("scenario '{}' has a bad seed: {}", scenario.key, e)))?;
    }
    Ok(scenarios)
}

/// Load scenarios from `path`, falling back to the built-in set when the file
/// is missing or broken.
pub fn load_scenarios(path: &Path) -> Vec<Scenario> {
    if !path.exists() {
        log::warn!("[scenarios] Scenario file not found: {:?}, using defaults", path);
        return default_scenarios();
    }
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            log::error!("[scenarios] Failed to read scenario file: {}", e);
            return default_scenarios();
        }
    };
    match parse_scenarios(&content, &path.display().to_string()) {
        Ok(scenarios) => {
            log::info!("[scenarios] Loaded {} scenarios from {:?}", scenarios.len(), path);
            scenarios
        }
        Err(e) => {
            log::error!("[scenarios] {}", e);
            default_scenarios()
        }
    }
}

/// The four built-in scenarios.
pub fn default_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            key: "T1".to_string(),
            title: "tabela+pivot".to_string(),
            label: "Mała tabela + pivot (5 wierszy)".to_string(),
            prompt: "Stwórz małą tabelę (5 wierszy danych + nagłówek) z kolumnami: Produkt, \
                     Kategoria, Ilość, Cena. Oblicz kolumnę Wartość (Ilość*Cena). Następnie \
                     stwórz tabelę przestawną podsumowującą Wartość wg Kategorii."
                .to_string(),
            max_rounds: Some(20),
            seed: None,
            requires: None,
            show_state: false,
        },
        Scenario {
            key: "T2".to_string(),
            title: "ładniejsza".to_string(),
            label: "Upiększenie".to_string(),
            prompt: "Sformatuj tabelę — pogrubiony nagłówek, obramowanie, format walutowy dla \
                     Cena i Wartość."
                .to_string(),
            max_rounds: Some(15),
            seed: None,
            requires: Some("T1".to_string()),
            show_state: false,
        },
        Scenario {
            key: "T3".to_string(),
            title: "przenieś pivot".to_string(),
            label: "Przeniesienie pivot + delete_rows".to_string(),
            prompt: "Na arkuszu Arkusz1 mam dane w A1:B6 i tabelę przestawną PT1 w D1. \
                     Przenieś tabelę przestawną na osobny arkusz i usuń puste wiersze 8-20 z danych."
                .to_string(),
            max_rounds: Some(20),
            seed: Some(pivot_blocked_seed()),
            requires: None,
            show_state: true,
        },
        Scenario {
            key: "T4".to_string(),
            title: "pusty".to_string(),
            label: "Pusty arkusz".to_string(),
            prompt: "Podsumuj dane w tym arkuszu".to_string(),
            max_rounds: Some(10),
            seed: None,
            requires: None,
            show_state: false,
        },
    ]
}

/// `A1:B6` of products and values with PivotTable `PT1` anchored at `D1` on
/// the same sheet, so row deletes are blocked until it moves.
fn pivot_blocked_seed() -> WorkbookSeed {
    let products = ["Produkt", "A", "B", "C", "A", "B"];
    let values = [100.0, 200.0, 300.0, 150.0, 250.0];

    let mut cells = Vec::new();
    for (i, product) in products.iter().enumerate() {
        let row = i + 1;
        cells.push(SeedCell {
            sheet: None,
            cell: format!("A{}", row),
            value: CellValue::Text(product.to_string()),
        });
        let value = match i {
            0 => CellValue::Text("Wartość".to_string()),
            _ => CellValue::Number(values[i - 1]),
        };
        cells.push(SeedCell {
            sheet: None,
            cell: format!("B{}", row),
            value,
        });
    }

    WorkbookSeed {
        sheets: Vec::new(),
        cells,
        pivots: vec![PivotTable {
            name: "PT1".to_string(),
            source: "'Arkusz1'!A1:B6".to_string(),
            dest_sheet: "Arkusz1".to_string(),
            dest_cell: "D1".to_string(),
            row_fields: vec!["Produkt".to_string()],
            column_fields: Vec::new(),
            value_fields: vec!["Wartość".to_string()],
            value_function: "sum".to_string(),
        }],
    }
}

#[derive(Debug)]
pub struct ScenarioResult {
    pub key: String,
    pub title: String,
    /// `None` when the scenario did not run.
    pub outcome: Option<RunOutcome>,
    pub skip_reason: Option<String>,
    show_state: bool,
}

impl ScenarioResult {
    pub fn status_icon(&self) -> &'static str {
        self.outcome
            .as_ref()
            .map(|o| o.stop.status_icon())
            .unwrap_or("❌")
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.as_ref().is_some_and(RunOutcome::is_ok)
    }
}

#[derive(Debug, Default)]
pub struct ScenarioReport {
    pub results: Vec<ScenarioResult>,
    workbooks: HashMap<String, VirtualWorkbook>,
}

impl ScenarioReport {
    pub fn result(&self, key: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.key == key)
    }

    /// Workbook as a scenario left it.
    pub fn workbook(&self, key: &str) -> Option<&VirtualWorkbook> {
        self.workbooks.get(key)
    }
}

/// Run the scenarios in order. One scenario's failure never stops the rest.
pub async fn run_all(
    backend: &dyn CompletionBackend,
    scenarios: &[Scenario],
    default_max_rounds: usize,
) -> ScenarioReport {
    let mut report = ScenarioReport::default();

    for scenario in scenarios {
        let skip = |reason: String| {
            log::warn!("[scenarios] Skipping {}: {}", scenario.key, reason);
            ScenarioResult {
                key: scenario.key.clone(),
                title: scenario.title.clone(),
                outcome: None,
                skip_reason: Some(reason),
                show_state: scenario.show_state,
            }
        };

        let mut workbook = match &scenario.requires {
            Some(required) => {
                if !report.result(required).is_some_and(ScenarioResult::is_ok) {
                    report
                        .results
                        .push(skip(format!("requires {} to finish ok", required)));
                    continue;
                }
                report.workbooks.get(required).cloned().unwrap_or_default()
            }
            None => match scenario.workbook() {
                Ok(workbook) => workbook,
                Err(e) => {
                    report.results.push(skip(format!("bad seed: {}", e)));
                    continue;
                }
            },
        };

        let max_rounds = scenario.max_rounds.unwrap_or(default_max_rounds);
        let outcome = agent::run(backend, &mut workbook, &scenario.prompt, &scenario.label, max_rounds).await;

        report.workbooks.insert(scenario.key.clone(), workbook);
        report.results.push(ScenarioResult {
            key: scenario.key.clone(),
            title: scenario.title.clone(),
            outcome: Some(outcome),
            skip_reason: None,
            show_state: scenario.show_state,
        });
    }
    report
}

pub fn print_summary(report: &ScenarioReport) {
    let rule = "=".repeat(60);
    println!("\n{}\n  📊 PODSUMOWANIE\n{}", rule, rule);

    for result in &report.results {
        let name = format!("{}: {}", result.key, result.title);
        match &result.outcome {
            Some(o) => println!(
                "  {} {}: stop={}, rounds={}, tools={}, writes={}, tokens={}",
                result.status_icon(),
                name,
                o.stop,
                o.rounds,
                o.tool_calls,
                o.writes,
                o.usage.total_tokens
            ),
            None => println!(
                "  {} {}: brak wyniku ({})",
                result.status_icon(),
                name,
                result.skip_reason.as_deref().unwrap_or("not run")
            ),
        }
    }

    for result in report.results.iter().filter(|r| r.show_state) {
        let Some(workbook) = report.workbook(&result.key) else {
            continue;
        };
        println!("\n  📋 WB po {} ({}):", result.key, result.title);
        let sheets: Vec<String> = workbook
            .sheet_names()
            .into_iter()
            .map(|name| {
                let cells = workbook.sheet(&name).map(|s| s.cell_count()).unwrap_or(0);
                format!("{} ({} cells)", name, cells)
            })
            .collect();
        println!("     Sheets: [{}]", sheets.join(", "));
        for pivot in workbook.pivots() {
            println!(
                "     Pivot {}: '{}'!{} <- {}",
                pivot.name, pivot.dest_sheet, pivot.dest_cell, pivot.source
            );
        }
        if workbook.pivots().is_empty() {
            println!("     Pivots: none");
        }
        if !workbook.charts().is_empty() {
            let charts: Vec<&str> = workbook.charts().iter().map(|c| c.name.as_str()).collect();
            println!("     Charts: [{}]", charts.join(", "));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const BUNDLED: &str = include_str!("../config/scenarios.ron");

    #[test]
    fn test_bundled_file_matches_defaults() {
        let parsed = parse_scenarios(BUNDLED, "config/scenarios.ron").unwrap();
        assert_eq!(parsed, default_scenarios());
    }

    #[test]
    fn test_pivot_seed_layout() {
        let wb = VirtualWorkbook::from_seed(&pivot_blocked_seed()).unwrap();
        assert_eq!(wb.value("Arkusz1", "B1"), Some(&CellValue::Text("Wartość".into())));
        assert_eq!(wb.value("Arkusz1", "A6"), Some(&CellValue::Text("B".into())));
        assert_eq!(wb.value("Arkusz1", "B6"), Some(&CellValue::Number(250.0)));
        let pivot = wb.pivot("PT1").unwrap();
        assert_eq!(pivot.dest_sheet, "Arkusz1");
        assert_eq!(pivot.dest_cell, "D1");
    }

    #[test]
    fn test_requires_must_come_earlier() {
        let ron = r#"[
            (key: "B", title: "b", label: "b", prompt: "x", requires: Some("A")),
            (key: "A", title: "a", label: "a", prompt: "y"),
        ]"#;
        let err = parse_scenarios(ron, "inline").unwrap_err();
        assert!(err.to_string().contains("requires 'A'"));
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let ron = r#"[
            (key: "A", title: "a", label: "a", prompt: "x"),
            (key: "A", title: "a", label: "a", prompt: "y"),
        ]"#;
        assert!(parse_scenarios(ron, "inline").is_err());
    }

    #[test]
    fn test_zero_round_cap_rejected() {
        let ron = r#"[
            (key: "Z", title: "z", label: "z", prompt: "x", max_rounds: Some(0)),
        ]"#;
        let err = parse_scenarios(ron, "inline").unwrap_err();
        assert!(err.to_string().contains("max_rounds 0"));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.ron");
        std::fs::write(&path, ron).unwrap();
        assert_eq!(load_scenarios(&path), default_scenarios());
    }

    #[test]
    fn test_bad_seed_rejected() {
        let ron = r#"[
            (key: "A", title: "a", label: "a", prompt: "x",
             seed: Some((cells: [(cell: "ZZZZ0", value: Number(1.0))]))),
        ]"#;
        let err = parse_scenarios(ron, "inline").unwrap_err();
        assert!(err.to_string().contains("bad seed"));
    }

    #[test]
    fn test_load_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.ron");
        assert_eq!(load_scenarios(&missing).len(), 4);

        let broken = dir.path().join("broken.ron");
        std::fs::write(&broken, "[ (key: ").unwrap();
        assert_eq!(load_scenarios(&broken), default_scenarios());
    }

    #[test]
    fn test_load_custom_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[(key: "X", title: "solo", label: "Solo", prompt: "Hej", max_rounds: Some(3))]"#
        )
        .unwrap();
        let scenarios = load_scenarios(file.path());
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].max_rounds, Some(3));
        assert!(scenarios[0].seed.is_none());
        assert!(!scenarios[0].show_state);
    }
}
