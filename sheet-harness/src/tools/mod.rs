//! The workbook operations exposed to the model.

mod definitions;
mod types;

use strum::{AsRefStr, Display, EnumIter, EnumString};

pub use definitions::tool_definitions;
pub use types::{ToolFunction, ToolSpec};

/// Every operation the mock workbook answers. The string form is the tool name
/// the model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum ToolName {
    GetWorkbookInfo,
    GetSheetInfo,
    ReadCell,
    WriteCell,
    ReadRange,
    WriteRange,
    FormatRange,
    InsertFormula,
    AddSheet,
    DeleteRows,
    InsertRows,
    CreateChart,
    DeleteChart,
    ListCharts,
    CreatePivotTable,
    ListPivotTables,
    MoveTable,
    ClearRange,
    SortRange,
    AutoFilter,
    FindReplace,
    ConditionalFormat,
    CopyRange,
    RenameSheet,
    DeleteSheet,
    FreezePanes,
    RemoveDuplicates,
    SetValidation,
}

impl ToolName {
    /// Operations that change workbook state.
    pub fn is_mutating(self) -> bool {
        !matches!(
            self,
            ToolName::GetWorkbookInfo
                | ToolName::GetSheetInfo
                | ToolName::ReadCell
                | ToolName::ReadRange
                | ToolName::ListCharts
                | ToolName::ListPivotTables
        )
    }
}
