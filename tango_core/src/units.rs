//! Vocabulary unit import (JSON, CSV, Excel) and pool flattening

use std::fs;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{DrillError, Result};
use crate::questions::VocabItem;

/// One vocabulary unit: a titled list of word pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFile {
    pub unit_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub items: Vec<VocabItem>,
}

/// Catalogue entry describing where a unit lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMeta {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub count: Option<usize>,
    /// Unit file location relative to the data root.
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IndexShape {
    List(Vec<UnitMeta>),
    Wrapped {
        #[serde(default)]
        units: Vec<UnitMeta>,
    },
}

/// Parse a unit index given either as a bare array or as `{ "units": [...] }`.
///
/// Entries with a blank id are dropped.
pub fn parse_unit_index(raw: &str) -> Result<Vec<UnitMeta>> {
    let units = match serde_json::from_str(raw)? {
        IndexShape::List(units) => units,
        IndexShape::Wrapped { units } => units,
    };
    Ok(units.into_iter().filter(|u| !u.id.trim().is_empty()).collect())
}

pub fn load_unit_index(path: &Path) -> Result<Vec<UnitMeta>> {
    parse_unit_index(&fs::read_to_string(path)?)
}

/// Where to find `unit_id` under `data_root`: the index entry's `path` when
/// set, `units/<id>.json` otherwise.
pub fn resolve_unit_path(data_root: &Path, index: &[UnitMeta], unit_id: &str) -> PathBuf {
    let explicit = index
        .iter()
        .find(|meta| meta.id == unit_id)
        .and_then(|meta| meta.path.as_deref())
        .map(str::trim)
        .filter(|path| !path.is_empty());

    match explicit {
        Some(path) => data_root.join(path.trim_start_matches('/')),
        None => data_root.join("units").join(format!("{unit_id}.json")),
    }
}

/// Load every unit in `unit_ids`, in order.
pub fn load_units_by_ids(data_root: &Path, index: &[UnitMeta], unit_ids: &[String]) -> Result<Vec<UnitFile>> {
    unit_ids
        .iter()
        .map(|id| load_unit_file(&resolve_unit_path(data_root, index, id)))
        .collect()
}

/// Concatenate the item lists of `units` into one pool.
pub fn flatten_items(units: Vec<UnitFile>) -> Vec<VocabItem> {
    units.into_iter().flat_map(|unit| unit.items).collect()
}

/// Load a unit file, choosing the parser from the extension.
///
/// Tabular files take their unit id and title from the file stem.
pub fn load_unit_file(path: &Path) -> Result<UnitFile> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let unit = match extension.as_str() {
        "json" => serde_json::from_str(&fs::read_to_string(path)?)?,
        "csv" => UnitFile {
            items: parse_csv(path, &stem)?,
            title: stem.clone(),
            unit_id: stem,
        },
        "xlsx" | "xls" => UnitFile {
            items: parse_excel(path, &stem)?,
            title: stem.clone(),
            unit_id: stem,
        },
        _ => return Err(DrillError::UnsupportedFormat(extension)),
    };
    debug!(unit = %unit.unit_id, items = unit.items.len(), "loaded unit file");
    Ok(unit)
}

/// Column index mapping
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub id: Option<usize>,
    pub en: usize,
    pub ja: usize,
    pub hint: Option<usize>,
}

/// Detect column indices from header names
fn detect_columns(headers: &[String]) -> Result<ColumnMapping> {
    let mut id = None;
    let mut en = None;
    let mut ja = None;
    let mut hint = None;

    for (i, header) in headers.iter().enumerate() {
        match header.trim().to_lowercase().as_str() {
            "id" => id = Some(i),
            "en" | "english" | "word" => en = Some(i),
            "ja" | "japanese" | "meaning" => ja = Some(i),
            "hint" | "note" => hint = Some(i),
            _ => {}
        }
    }

    Ok(ColumnMapping {
        id,
        en: en.ok_or_else(|| DrillError::MissingColumn("en".to_string()))?,
        ja: ja.ok_or_else(|| DrillError::MissingColumn("ja".to_string()))?,
        hint,
    })
}

/// Build an item from one data row; rows missing either language are skipped.
fn row_to_item(cells: &[String], mapping: &ColumnMapping, unit_id: &str, row_number: usize) -> Option<VocabItem> {
    let cell = |i: usize| cells.get(i).map(|s| s.trim()).unwrap_or_default();

    let en = cell(mapping.en);
    let ja = cell(mapping.ja);
    if en.is_empty() || ja.is_empty() {
        if cells.iter().any(|c| !c.trim().is_empty()) {
            warn!(unit = unit_id, row = row_number, "skipping row without both en and ja");
        }
        return None;
    }

    let id = mapping
        .id
        .map(cell)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{unit_id}-{row_number}"));
    let hint = mapping.hint.map(cell).filter(|h| !h.is_empty()).map(str::to_string);

    Some(VocabItem {
        id,
        en: en.to_string(),
        ja: ja.to_string(),
        hint,
    })
}

/// Parse CSV word pairs
pub fn parse_csv(path: &Path, unit_id: &str) -> Result<Vec<VocabItem>> {
    let mut reader = ReaderBuilder::new().has_headers(true).flexible(true).from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
    let mapping = detect_columns(&headers)?;

    let mut items = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result?;
        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        items.extend(row_to_item(&cells, &mapping, unit_id, i + 1));
    }
    Ok(items)
}

/// Parse word pairs from the first sheet of a workbook
pub fn parse_excel(path: &Path, unit_id: &str) -> Result<Vec<VocabItem>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| DrillError::Excel(format!("failed to open workbook: {e}")))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| DrillError::Excel("no sheets found".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| DrillError::Excel(format!("failed to read sheet: {e}")))?;

    let mut rows = range.rows();
    let header_row = rows.next().ok_or_else(|| DrillError::Excel("empty sheet, no header row".to_string()))?;
    let headers: Vec<String> = header_row.iter().map(cell_string).collect();
    let mapping = detect_columns(&headers)?;

    let mut items = Vec::new();
    for (i, row) in rows.enumerate() {
        let cells: Vec<String> = row.iter().map(cell_string).collect();
        items.extend(row_to_item(&cells, &mapping, unit_id, i + 1));
    }
    Ok(items)
}

/// Helper to extract string from Excel cell
fn cell_string(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt.to_string(),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

// ============= Python Binding =============

#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "load_unit_file")]
pub fn py_load_unit_file(path: &str) -> PyResult<Vec<VocabItem>> {
    Ok(load_unit_file(Path::new(path))?.items)
}
