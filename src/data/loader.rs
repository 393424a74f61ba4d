use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
};
use arrow::datatypes::DataType;
use calamine::{open_workbook, DataType as XlsxCell, Reader, Xlsx};
use chrono::{NaiveDate, TimeDelta};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Record, DEFAULT_CATEGORY_THRESHOLD};

/// Knobs applied while turning a file into a [`Dataset`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Max distinct values for a textual column to be profiled as a category.
    pub category_threshold: usize,
    /// Drop columns that hold no value in any row.
    pub drop_empty_columns: bool,
    /// Worksheet to read from `.xlsx` files; the first one when `None`.
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            category_threshold: DEFAULT_CATEGORY_THRESHOLD,
            drop_empty_columns: true,
            sheet: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a survey sheet from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row, one response per line
/// * `.json`    – `[{ "Comunidade": "...", "Idade": 34, ... }, ...]`
/// * `.parquet` – flat columns of strings, integers, floats or booleans
/// * `.xlsx`    – first row of the worksheet is the header
pub fn load_file(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (columns, records) = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        "xlsx" => load_xlsx(path, options.sheet.as_deref()),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    let dataset = Dataset::new(columns, records, options.category_threshold);
    let dataset = if options.drop_empty_columns {
        dataset.without_empty_columns()
    } else {
        dataset
    };
    log::info!(
        "Loaded {} records with columns {:?} from {}",
        dataset.len(),
        dataset.column_names(),
        path.display()
    );
    Ok(dataset)
}

type Rows = (Vec<String>, Vec<Record>);

/// Rename repeated headers to `{name}.{n}` (`Nome`, `Nome.1`, `Nome.2`) so
/// every column keeps its own cells. A generated name never takes one that
/// already appears in the header row.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let original: HashSet<String> = headers.iter().cloned().collect();
    let mut used: HashSet<String> = HashSet::with_capacity(headers.len());
    headers
        .into_iter()
        .map(|name| {
            if used.insert(name.clone()) {
                return name;
            }
            let renamed = (1..)
                .map(|n| format!("{name}.{n}"))
                .find(|candidate| !used.contains(candidate) && !original.contains(candidate))
                .unwrap_or_else(|| name.clone());
            log::debug!("renaming repeated header '{name}' to '{renamed}'");
            used.insert(renamed.clone());
            renamed
        })
        .collect()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every cell type-guessed.
fn load_csv(path: &Path) -> Result<Rows> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let headers = dedupe_headers(headers);

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let row = result.with_context(|| format!("CSV row {row_no}"))?;
        let record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(col, value)| (col.clone(), guess_cell_type(value)))
            .collect();
        records.push(record);
    }

    Ok((headers, records))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        // "nan" / "NaN" placeholders count as missing.
        if f.is_nan() {
            return CellValue::Null;
        }
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Comunidade": "Vila Aliança", "Idade": 34 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<Rows> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut columns: Vec<String> = Vec::new();
    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        for key in obj.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        records.push(
            obj.iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect::<Record>(),
        );
    }

    Ok((columns, records))
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a flat Parquet file. Works with files written by both **Pandas**
/// (`df.to_parquet()`) and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Rows> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let columns = dedupe_headers(columns);
    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            let record: Record = columns
                .iter()
                .enumerate()
                .map(|(col_idx, name)| (name.clone(), extract_cell(batch.column(col_idx), row)))
                .collect();
            records.push(record);
        }
    }

    Ok((columns, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 => {
            let s = col.as_string::<i32>();
            CellValue::Text(s.value(row).to_string())
        }
        DataType::LargeUtf8 => {
            let s = col.as_string::<i64>();
            CellValue::Text(s.value(row).to_string())
        }
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .map_or(CellValue::Null, |arr| CellValue::Integer(arr.value(row) as i64)),
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .map_or(CellValue::Null, |arr| CellValue::Integer(arr.value(row))),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .map_or(CellValue::Null, |arr| CellValue::Float(arr.value(row) as f64)),
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .map_or(CellValue::Null, |arr| CellValue::Float(arr.value(row))),
        DataType::Boolean => col
            .as_any()
            .downcast_ref::<BooleanArray>()
            .map_or(CellValue::Null, |arr| CellValue::Bool(arr.value(row))),
        _ => match arrow::util::display::array_value_to_string(col, row) {
            Ok(s) => CellValue::Text(s),
            Err(_) => CellValue::Text(format!("{:?}", col.data_type())),
        },
    }
}

// ---------------------------------------------------------------------------
// XLSX loader
// ---------------------------------------------------------------------------

/// First row of the worksheet is the header; blank header cells get a
/// positional name so no column is silently lost.
fn load_xlsx(path: &Path, sheet: Option<&str>) -> Result<Rows> {
    let mut workbook: Xlsx<_> = open_workbook(path).context("opening workbook")?;

    let range = match sheet {
        Some(name) => workbook
            .worksheet_range(name)
            .with_context(|| format!("worksheet '{name}' not found"))?
            .context("reading worksheet")?,
        None => workbook
            .worksheet_range_at(0)
            .context("workbook has no worksheet")?
            .context("reading worksheet")?,
    };

    let mut rows = range.rows();
    let header = rows.next().context("worksheet is empty")?;
    log::debug!("xlsx header: {header:?}");
    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| match xlsx_to_cell(cell) {
            CellValue::Null => format!("column_{}", idx + 1),
            value => value.to_string().trim().to_string(),
        })
        .collect();
    let columns = dedupe_headers(columns);

    let records: Vec<Record> = rows
        .map(|row| {
            columns
                .iter()
                .zip(row.iter())
                .map(|(col, cell)| (col.clone(), xlsx_to_cell(cell)))
                .collect::<Record>()
        })
        .collect();

    Ok((columns, records))
}

fn xlsx_to_cell(cell: &XlsxCell) -> CellValue {
    match cell {
        XlsxCell::Int(i) => CellValue::Integer(*i),
        XlsxCell::Float(f) if f.is_nan() => CellValue::Null,
        XlsxCell::Float(f) => CellValue::Float(*f),
        XlsxCell::String(s) if s.trim().is_empty() => CellValue::Null,
        XlsxCell::String(s) => CellValue::Text(s.clone()),
        XlsxCell::Bool(b) => CellValue::Bool(*b),
        XlsxCell::DateTime(serial) => excel_date(*serial)
            .map(CellValue::Text)
            .unwrap_or(CellValue::Float(*serial)),
        XlsxCell::Empty => CellValue::Null,
        other => CellValue::Text(other.to_string()),
    }
}

/// Render an Excel date serial (days since 1899-12-30) as ISO text:
/// `2023-03-15`, or `2023-03-15 12:30:00` when it carries a time of day.
fn excel_date(serial: f64) -> Option<String> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    let stamp = epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)?;
    if serial.fract() == 0.0 {
        Some(stamp.format("%Y-%m-%d").to_string())
    } else {
        Some(stamp.format("%Y-%m-%d %H:%M:%S").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_guessing() {
        assert_eq!(guess_cell_type(""), CellValue::Null);
        assert_eq!(guess_cell_type(" 42 "), CellValue::Integer(42));
        assert_eq!(guess_cell_type("3.5"), CellValue::Float(3.5));
        assert_eq!(guess_cell_type("NaN"), CellValue::Null);
        assert_eq!(guess_cell_type("true"), CellValue::Bool(true));
        assert_eq!(guess_cell_type("Vila Aliança"), CellValue::from("Vila Aliança"));
    }

    #[test]
    fn json_cells() {
        assert_eq!(json_to_cell(&serde_json::json!(7)), CellValue::Integer(7));
        assert_eq!(json_to_cell(&serde_json::json!(0.5)), CellValue::Float(0.5));
        assert_eq!(json_to_cell(&serde_json::json!(null)), CellValue::Null);
        assert_eq!(json_to_cell(&serde_json::json!([1, 2])), CellValue::from("[1,2]"));
    }

    #[test]
    fn xlsx_cells() {
        assert_eq!(xlsx_to_cell(&XlsxCell::Int(3)), CellValue::Integer(3));
        assert_eq!(xlsx_to_cell(&XlsxCell::Empty), CellValue::Null);
        assert_eq!(xlsx_to_cell(&XlsxCell::String(" ".into())), CellValue::Null);
        assert_eq!(xlsx_to_cell(&XlsxCell::String("Centro".into())), CellValue::from("Centro"));
    }

    #[test]
    fn xlsx_dates_become_iso_text() {
        assert_eq!(xlsx_to_cell(&XlsxCell::DateTime(45000.0)), CellValue::from("2023-03-15"));
        assert_eq!(
            xlsx_to_cell(&XlsxCell::DateTime(45000.5)),
            CellValue::from("2023-03-15 12:00:00")
        );
        assert_eq!(xlsx_to_cell(&XlsxCell::DateTime(1.0)), CellValue::from("1899-12-31"));
        assert_eq!(excel_date(f64::INFINITY), None);
    }

    #[test]
    fn repeated_headers_are_numbered() {
        let headers = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(
            dedupe_headers(headers(&["Nome", "Idade", "Nome", "Nome"])),
            ["Nome", "Idade", "Nome.1", "Nome.2"]
        );
        assert_eq!(
            dedupe_headers(headers(&["Nome", "Nome", "Nome.1"])),
            ["Nome", "Nome.2", "Nome.1"]
        );
        assert_eq!(dedupe_headers(headers(&["a", "b"])), ["a", "b"]);
    }

    #[test]
    fn csv_with_repeated_header_keeps_both_columns() {
        let mut tmp = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        std::io::Write::write_all(&mut tmp, b"Nome,Idade,Nome\nAna,30,Silva\n").unwrap();
        let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
        assert_eq!(ds.column_names(), ["Nome", "Idade", "Nome.1"]);
        let row = &ds.records()[0];
        assert_eq!(row.get("Nome"), Some(&CellValue::from("Ana")));
        assert_eq!(row.get("Nome.1"), Some(&CellValue::from("Silva")));
        assert_eq!(row.get("Idade"), Some(&CellValue::Integer(30)));
    }

    #[test]
    fn unsupported_extension_is_an_error() {
        let err = load_file(Path::new("survey.ods"), &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Unsupported file extension"));
    }
}
