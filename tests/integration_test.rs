use std::io::Write;
use std::sync::Arc;

use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rust_xlsxwriter::{Workbook, XlsxError};
use survey_filter::data::loader::{load_file, LoadOptions};
use survey_filter::{CellValue, ColumnKind, Config, FilterError, FilterSet, Session};
use tempfile::NamedTempFile;

fn write_temp(suffix: &str, contents: &str) -> NamedTempFile {
    let mut tmp = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    tmp.write_all(contents.as_bytes()).unwrap();
    tmp.flush().unwrap();
    tmp
}

const SURVEY_CSV: &str = "\u{feff}Comunidade,Idade,Problema,Vazia\n\
Vila Aliança,17,Falta de água,\n\
vila alianca,18,Saneamento,\n\
Centro,45,falta de agua,\n\
CENTRO,60,Moradia,\n\
Jardim Ipê,61,,\n";

#[test]
fn csv_is_profiled_and_filtered() {
    let tmp = write_temp(".csv", SURVEY_CSV);
    let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(ds.len(), 5);
    assert_eq!(ds.column_names(), ["Comunidade", "Idade", "Problema"]);
    assert_eq!(ds.profile("Idade").map(|p| p.kind()), Some(ColumnKind::Number));
    assert_eq!(ds.profile("Comunidade").map(|p| p.kind()), Some(ColumnKind::Category));

    let filters = FilterSet::builder(&ds)
        .membership("Problema", ["FALTA DE ÁGUA"])
        .unwrap()
        .range("Idade", 18.0, 60.0)
        .unwrap()
        .build();
    let view = filters.apply(&ds);
    assert_eq!(view.indices(), [2]);
    let stats = view.stats();
    assert_eq!((stats.matched, stats.total), (1, 5));
    assert!((stats.ratio - 0.2).abs() < 1e-12);
}

#[test]
fn empty_columns_survive_when_asked() {
    let tmp = write_temp(".csv", SURVEY_CSV);
    let options = LoadOptions {
        drop_empty_columns: false,
        ..LoadOptions::default()
    };
    let ds = load_file(tmp.path(), &options).unwrap();
    assert!(ds.has_column("Vazia"));
    let filters = FilterSet::builder(&ds).membership("Vazia", [""]).unwrap().build();
    assert_eq!(filters.apply(&ds).len(), ds.len());
}

#[test]
fn json_records_load() {
    let tmp = write_temp(
        ".json",
        r#"[
            {"Comunidade": "São José", "Moradores": 4},
            {"Comunidade": "Sao Jose", "Moradores": 6, "Obs": "casa nova"},
            {"Comunidade": "Centro", "Moradores": null}
        ]"#,
    );
    let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(ds.column_names(), ["Comunidade", "Moradores", "Obs"]);
    assert_eq!(ds.records()[0].get("Obs"), Some(&CellValue::Text(String::new())));
    assert_eq!(ds.records()[2].get("Moradores"), Some(&CellValue::Null));

    let profile = ds.profile("Comunidade").unwrap();
    assert_eq!(profile.search("jose", 5), ["São José", "Sao Jose"]);

    let filters = FilterSet::builder(&ds)
        .membership("Comunidade", ["sao jose"])
        .unwrap()
        .range("Moradores", 5.0, 10.0)
        .unwrap()
        .build();
    assert_eq!(filters.apply(&ds).indices(), [1]);
}

#[test]
fn malformed_json_is_an_error() {
    let tmp = write_temp(".json", r#"{"Comunidade": "Centro"}"#);
    let err = load_file(tmp.path(), &LoadOptions::default()).unwrap_err();
    assert!(format!("{err:#}").contains("Expected top-level JSON array"));
}

#[test]
fn parquet_columns_load() {
    let tmp = tempfile::Builder::new().suffix(".parquet").tempfile().unwrap();
    let schema = Arc::new(Schema::new(vec![
        Field::new("Comunidade", DataType::Utf8, true),
        Field::new("Idade", DataType::Int32, false),
        Field::new("Renda", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(vec![Some("Vila Aliança"), None, Some("Centro")])),
            Arc::new(Int32Array::from(vec![17, 18, 45])),
            Arc::new(Float64Array::from(vec![Some(1200.5), None, Some(900.0)])),
        ],
    )
    .unwrap();
    let mut writer = ArrowWriter::try_new(tmp.as_file(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
    assert_eq!(ds.column_names(), ["Comunidade", "Idade", "Renda"]);
    assert_eq!(ds.records()[1].get("Comunidade"), Some(&CellValue::Text(String::new())));
    assert_eq!(ds.records()[1].get("Renda"), Some(&CellValue::Null));
    assert_eq!(ds.profile("Renda").and_then(|p| p.range()), Some((900.0, 1200.5)));

    let filters = FilterSet::builder(&ds).range("Renda", 0.0, 10_000.0).unwrap().build();
    assert_eq!(filters.apply(&ds).indices(), [0, 2]);
}

/// Two sheets: a summary first, then the answers with a blank header cell,
/// a repeated header and one short row.
fn write_survey_workbook() -> Result<NamedTempFile, XlsxError> {
    let tmp = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    let mut workbook = Workbook::new();

    let summary = workbook.add_worksheet();
    summary.set_name("Resumo")?;
    summary.write_string(0, 0, "Total")?;
    summary.write_number(0, 1, 4)?;

    let answers = workbook.add_worksheet();
    answers.set_name("Respostas")?;
    answers.write_string(0, 0, "Comunidade")?;
    answers.write_string(0, 1, " Idade ")?;
    answers.write_string(0, 3, "Comunidade")?;
    let rows: [(&str, u32, &str, &str); 4] = [
        ("Vila Aliança", 17, "sim", "Norte"),
        ("vila alianca", 34, "não", "Norte"),
        ("Centro", 52, "", ""),
        ("São José", 61, "sim", "Sul"),
    ];
    for (i, (community, age, visited, region)) in rows.into_iter().enumerate() {
        let row = i as u32 + 1;
        answers.write_string(row, 0, community)?;
        answers.write_number(row, 1, age)?;
        if !visited.is_empty() {
            answers.write_string(row, 2, visited)?;
            answers.write_string(row, 3, region)?;
        }
    }

    workbook.save(tmp.path())?;
    Ok(tmp)
}

#[test]
fn xlsx_named_sheet_loads_and_filters() {
    let tmp = write_survey_workbook().unwrap();
    let options = LoadOptions {
        sheet: Some("Respostas".to_string()),
        ..LoadOptions::default()
    };
    let ds = load_file(tmp.path(), &options).unwrap();
    assert_eq!(ds.len(), 4);
    assert_eq!(ds.column_names(), ["Comunidade", "Idade", "column_3", "Comunidade.1"]);
    assert_eq!(ds.records()[2].get("column_3"), Some(&CellValue::Text(String::new())));
    assert_eq!(ds.records()[2].get("Comunidade.1"), Some(&CellValue::Text(String::new())));
    assert_eq!(ds.records()[3].get("Comunidade.1"), Some(&CellValue::from("Sul")));
    assert_eq!(ds.profile("Idade").and_then(|p| p.range()), Some((17.0, 61.0)));
    assert_eq!(ds.profile("column_3").map(|p| p.kind()), Some(ColumnKind::Category));

    let filters = FilterSet::builder(&ds)
        .membership("Comunidade", ["VILA ALIANCA"])
        .unwrap()
        .range("Idade", 18.0, 60.0)
        .unwrap()
        .build();
    assert_eq!(filters.apply(&ds).indices(), [1]);

    let filters = FilterSet::builder(&ds).membership("column_3", ["nao"]).unwrap().build();
    assert_eq!(filters.apply(&ds).indices(), [1]);
}

#[test]
fn xlsx_reads_the_first_sheet_by_default() {
    let tmp = write_survey_workbook().unwrap();
    let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
    assert!(ds.is_empty());
    assert!(!ds.has_column("Comunidade"));

    let options = LoadOptions {
        sheet: Some("Nada".to_string()),
        ..LoadOptions::default()
    };
    let err = load_file(tmp.path(), &options).unwrap_err();
    assert!(format!("{err:#}").contains("worksheet 'Nada' not found"));
}

#[test]
fn range_errors_reach_the_caller() {
    let tmp = write_temp(".csv", SURVEY_CSV);
    let ds = load_file(tmp.path(), &LoadOptions::default()).unwrap();
    let err = FilterSet::builder(&ds).range("Idade", 10.0, 5.0).unwrap_err();
    assert!(matches!(err, FilterError::InvalidRange { .. }));
}

#[test]
fn session_reports_failed_loads() {
    let tmp = write_temp(".xlsx", "not a workbook");
    let mut session = Session::new();
    session.load(tmp.path(), &Config::default());
    assert!(session.dataset().is_none());
    assert!(session.error().is_some());

    let csv = write_temp(".csv", SURVEY_CSV);
    session.load(csv.path(), &Config::default());
    assert!(session.error().is_none());
    assert_eq!(session.stats().map(|s| s.matched), Some(5));
}
