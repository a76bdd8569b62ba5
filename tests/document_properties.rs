//! End-to-end behavior of the mutation engines against files on disk.

use office_service::common::xml::XmlElement;
use office_service::ooxml::docx::{self, paragraph::new_run};
use office_service::ooxml::opc::Part;
use office_service::ooxml::{pptx, xlsx};
use office_service::service::models::*;
use office_service::service::{Service, excel, powerpoint, word};
use proptest::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn temp_path(dir: &TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

fn word_doc(svc: &Service, path: &str, paragraphs: Vec<String>) {
    word::create(
        svc,
        CreateWordRequest {
            file_path: path.to_string(),
            title: None,
            paragraphs,
        },
    )
    .unwrap();
}

fn word_read(svc: &Service, path: &str) -> Value {
    word::read(svc, FileRequest { file_path: path.to_string() })
        .unwrap()
        .data
        .unwrap()
}

fn deck(svc: &Service, path: &str, titles: &[&str]) {
    powerpoint::create(
        svc,
        CreatePptxRequest {
            file_path: path.to_string(),
            slides: titles
                .iter()
                .map(|t| SlideData {
                    title: t.to_string(),
                    content: format!("{} body", t),
                    notes: String::new(),
                })
                .collect(),
        },
    )
    .unwrap();
}

fn deck_read(svc: &Service, path: &str) -> Vec<Value> {
    powerpoint::read(svc, FileRequest { file_path: path.to_string() })
        .unwrap()
        .data
        .unwrap()["slides"]
        .as_array()
        .unwrap()
        .clone()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn delete_paragraph_removes_exactly_one(
        texts in prop::collection::vec("[a-z]{1,8}", 1..8),
        pick in any::<prop::sample::Index>(),
    ) {
        let dir = TempDir::new().unwrap();
        let svc = Service::new();
        let path = temp_path(&dir, "p.docx");
        word_doc(&svc, &path, texts.clone());

        let index = pick.index(texts.len());
        word::delete_paragraph(&svc, DeleteWordParagraphRequest {
            file_path: path.clone(),
            paragraph_index: index as i64,
        }).unwrap();

        let mut expected = texts.clone();
        expected.remove(index);
        prop_assert_eq!(word_read(&svc, &path)["paragraphs"].clone(), json!(expected));
    }
}

#[test]
fn test_word_table_reads_back() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "t.docx");
    word_doc(&svc, &path, vec![]);
    word::add_table(
        &svc,
        AddWordTableRequest {
            file_path: path.clone(),
            headers: strings(&["A", "B"]),
            rows: vec![strings(&["1", "2"]), strings(&["3", "4"])],
            style: Some("Table Grid".to_string()),
        },
    )
    .unwrap();
    assert_eq!(
        word_read(&svc, &path)["tables"],
        json!([[["A", "B"], ["1", "2"], ["3", "4"]]])
    );
}

#[test]
fn test_search_replace_is_run_scoped() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let whole = temp_path(&dir, "whole.docx");
    word_doc(&svc, &whole, strings(&["say foo now"]));
    let outcome = word::search_replace(
        &svc,
        SearchReplaceWordRequest {
            file_path: whole.clone(),
            search: "foo".to_string(),
            replace: "bar".to_string(),
        },
    )
    .unwrap();
    assert_eq!(outcome.message, "Replaced 1 occurrence(s)");
    assert_eq!(word_read(&svc, &whole)["paragraphs"], json!(["say bar now"]));

    let split = temp_path(&dir, "split.docx");
    let mut doc = docx::Package::new().unwrap();
    doc.append_block(
        XmlElement::new("w:p")
            .with_child(new_run("fo"))
            .with_child(new_run("o")),
    )
    .unwrap();
    doc.save(&split).unwrap();
    let outcome = word::search_replace(
        &svc,
        SearchReplaceWordRequest {
            file_path: split.clone(),
            search: "foo".to_string(),
            replace: "bar".to_string(),
        },
    )
    .unwrap();
    assert_eq!(outcome.message, "Replaced 0 occurrence(s)");
    assert_eq!(word_read(&svc, &split)["paragraphs"], json!(["foo"]));
}

#[test]
fn test_excel_write_data_reads_as_strings() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "w.xlsx");
    excel::create(
        &svc,
        CreateExcelRequest {
            file_path: path.clone(),
            sheets: vec![],
        },
    )
    .unwrap();
    excel::write_data(
        &svc,
        WriteExcelDataRequest {
            file_path: path.clone(),
            sheet_name: "Sheet1".to_string(),
            headers: strings(&["X"]),
            rows: vec![vec![CellValue::Text("5".to_string())]],
            hidden: false,
        },
    )
    .unwrap();
    let data = excel::read(
        &svc,
        ReadExcelRequest {
            file_path: path.clone(),
            sheet_name: Some("Sheet1".to_string()),
        },
    )
    .unwrap()
    .data
    .unwrap();
    assert_eq!(data["sheets"]["Sheet1"]["rows"], json!([["X"], ["5"]]));
    assert_eq!(data["sheets"]["Sheet1"]["hidden"], json!(false));
}

#[test]
fn test_insert_rows_shifts_formula_references() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "f.xlsx");
    excel::create(
        &svc,
        CreateExcelRequest {
            file_path: path.clone(),
            sheets: vec![SheetData {
                name: "Calc".to_string(),
                headers: strings(&["a", "b", "sum"]),
                rows: vec![
                    vec![CellValue::Integer(1), CellValue::Integer(2)],
                    vec![
                        CellValue::Integer(3),
                        CellValue::Integer(4),
                        CellValue::Text("=A3+B3".to_string()),
                    ],
                ],
                hidden: false,
            }],
        },
    )
    .unwrap();
    excel::insert_rows(
        &svc,
        InsertRowsColsRequest {
            file_path: path.clone(),
            sheet_name: "Calc".to_string(),
            index: 2,
            count: 1,
        },
    )
    .unwrap();

    let book = xlsx::Package::open(&path).unwrap();
    let rows = book.read_sheet(&book.sheet("Calc").unwrap()).unwrap();
    assert_eq!(rows[3][2], "=A4+B4");
    assert_eq!(rows[1], strings(&["", "", ""]));
    assert_eq!(rows[2][..2], strings(&["1", "2"])[..]);
}

#[test]
fn test_delete_slide_releases_relationship() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "d.pptx");
    deck(&svc, &path, &["one", "two", "three"]);

    let before = pptx::Package::open(&path).unwrap();
    let victim = before.slide(1).unwrap();

    powerpoint::delete_slide(
        &svc,
        SlideRequest {
            file_path: path.clone(),
            slide_index: 1,
        },
    )
    .unwrap();

    let slides = deck_read(&svc, &path);
    assert_eq!(slides.len(), 2);
    assert_eq!(slides[1]["text"], json!("three\nthree body"));

    let after = pptx::Package::open(&path).unwrap();
    let opc = after.opc_package();
    let rels = opc.part(after.main_partname()).unwrap().rels();
    assert!(rels.get(&victim.r_id).is_none());
    assert!(!opc.contains_part(&victim.partname));
    for rel in rels.iter().filter(|r| !r.is_external()) {
        assert!(opc.contains_part(&rel.target_partname().unwrap()));
    }
}

#[test]
fn test_duplicate_slide_appends_copy() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "dup.pptx");
    deck(&svc, &path, &["a", "b", "c"]);
    let original = deck_read(&svc, &path);

    powerpoint::duplicate_slide(
        &svc,
        SlideRequest {
            file_path: path.clone(),
            slide_index: 0,
        },
    )
    .unwrap();

    let slides = deck_read(&svc, &path);
    assert_eq!(slides.len(), 4);
    assert_eq!(slides[..3], original[..]);
    assert_eq!(slides[3]["text"], original[0]["text"]);
    assert_eq!(slides[3]["slide_number"], json!(4));
}

#[test]
fn test_out_of_range_leaves_files_untouched() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();

    let doc = temp_path(&dir, "o.docx");
    word_doc(&svc, &doc, strings(&["a", "b"]));
    let deck_path = temp_path(&dir, "o.pptx");
    deck(&svc, &deck_path, &["x"]);
    let doc_bytes = std::fs::read(&doc).unwrap();
    let deck_bytes = std::fs::read(&deck_path).unwrap();

    for index in [2, 99, -1] {
        let err = word::delete_paragraph(
            &svc,
            DeleteWordParagraphRequest {
                file_path: doc.clone(),
                paragraph_index: index,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "OUT_OF_RANGE");

        let err = powerpoint::set_notes(
            &svc,
            SetNotesRequest {
                file_path: deck_path.clone(),
                slide_index: index,
                notes: "n".to_string(),
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "OUT_OF_RANGE");

        let err = powerpoint::add_table(
            &svc,
            AddPptxTableRequest {
                file_path: deck_path.clone(),
                slide_index: index,
                headers: strings(&["h"]),
                rows: vec![],
                left: 1.0,
                top: 2.0,
                width: 8.0,
                height: 3.0,
            },
        )
        .unwrap_err();
        assert_eq!(err.code(), "OUT_OF_RANGE");
    }

    assert_eq!(std::fs::read(&doc).unwrap(), doc_bytes);
    assert_eq!(std::fs::read(&deck_path).unwrap(), deck_bytes);
}

#[test]
fn test_wrong_format_is_corrupt_container() {
    let dir = TempDir::new().unwrap();
    let svc = Service::new();
    let path = temp_path(&dir, "actually-word.xlsx");
    word_doc(&svc, &path, strings(&["x"]));
    let err = excel::read(
        &svc,
        ReadExcelRequest {
            file_path: path.clone(),
            sheet_name: None,
        },
    )
    .unwrap_err();
    assert_eq!(err.code(), "CORRUPT_CONTAINER");

    let garbage = temp_path(&dir, "garbage.docx");
    std::fs::write(&garbage, b"not a zip").unwrap();
    let err = word::read(&svc, FileRequest { file_path: garbage }).unwrap_err();
    assert_eq!(err.code(), "CORRUPT_CONTAINER");
}
