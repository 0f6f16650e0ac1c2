//! Preview pipeline integration tests
//!
//! Reader → header correction → validation over real .xlsx and .csv uploads.

mod helpers;

use helpers::fixtures::row;
use helpers::{csv_upload, product_rows, xlsx_upload, FailingCorrector, FixedCompletion, SlowCompletion};
use sheetport_ingest::services::{
    AiHeaderCorrector, CorrectionError, PreviewOrchestrator, SimilarityMatcher,
};
use sheetport_ingest::ImportError;
use std::sync::Arc;
use std::time::Duration;

fn similarity_preview() -> PreviewOrchestrator {
    PreviewOrchestrator::new(Arc::new(SimilarityMatcher::default()))
}

fn ai_preview(reply: &str) -> (PreviewOrchestrator, FixedCompletion) {
    let backend = FixedCompletion::new(reply);
    let corrector = AiHeaderCorrector::new(backend.clone(), Duration::from_secs(5), 512);
    (PreviewOrchestrator::new(Arc::new(corrector)), backend)
}

fn customer_sheet() -> Vec<Vec<String>> {
    vec![
        row(&["user", "mail", "name"]),
        row(&["jdoe", "jane@example.com", "Jane Doe"]),
        row(&["asmith", "alex@example.com", ""]),
        row(&["", "", "Nobody"]),
    ]
}

#[tokio::test]
async fn test_abbreviated_customer_headers_via_ai_reply() {
    let (orchestrator, backend) = ai_preview(
        "```json\n{\"correctedColumns\": [\"username\", \"email\", \"fullname\"], \"wasCorrected\": true, \"changesReport\": \"user→username, mail→email, name→fullname\"}\n```",
    );

    let result = orchestrator
        .preview(&xlsx_upload("customers.xlsx", &customer_sheet()), "customer")
        .await
        .unwrap();

    assert_eq!(backend.calls(), 1, "one correction call per import");
    let correction = &result.header_correction;
    assert!(correction.was_corrected);
    assert_eq!(correction.original_headers, vec!["user", "mail", "name"]);
    assert_eq!(correction.corrected_columns, vec!["username", "email", "fullname"]);

    assert_eq!(result.valid_count(), 1);
    assert_eq!(result.valid_rows[0].row_number, 2);

    assert_eq!(result.invalid_count(), 2);
    let row3 = &result.invalid_rows[0];
    assert_eq!(row3.row_number, 3);
    assert_eq!(row3.errors.len(), 1);
    assert!(row3.errors[0].contains("fullname"));

    let row4 = &result.invalid_rows[1];
    assert_eq!(row4.row_number, 4);
    assert!(row4.errors.iter().any(|e| e.contains("username")));
    assert!(row4.errors.iter().any(|e| e.contains("email")));
}

#[tokio::test]
async fn test_abbreviated_customer_headers_via_similarity() {
    let result = similarity_preview()
        .preview(&xlsx_upload("customers.xlsx", &customer_sheet()), "Customer")
        .await
        .unwrap();

    assert!(result.header_correction.was_corrected);
    assert_eq!(
        result.header_correction.corrected_columns,
        vec!["username", "email", "fullname"]
    );
    assert_eq!(result.valid_count(), 1);
    assert_eq!(result.invalid_count(), 2);
}

#[tokio::test]
async fn test_bad_price_reported_on_sheet_row() {
    let upload = xlsx_upload("products.xlsx", &product_rows(10, Some(7)));

    let result = similarity_preview().preview(&upload, "product").await.unwrap();

    assert_eq!(result.total(), 10);
    assert_eq!(result.valid_count(), 9);
    assert_eq!(result.invalid_count(), 1);

    let invalid = &result.invalid_rows[0];
    assert_eq!(invalid.row_number, 8);
    assert!(invalid.errors.iter().any(|e| e.contains("price")));

    let valid_numbers: Vec<u32> = result.valid_rows.iter().map(|v| v.row_number).collect();
    assert_eq!(valid_numbers, vec![2, 3, 4, 5, 6, 7, 9, 10, 11]);

    // Numeric cells come back as plain text
    assert_eq!(result.valid_rows[0].row_data["price"], "1.5");
    assert_eq!(result.valid_rows[0].row_data["stock"], "10");
}

#[tokio::test]
async fn test_correction_timeout_fails_preview() {
    let corrector = AiHeaderCorrector::new(
        SlowCompletion {
            delay: Duration::from_secs(10),
        },
        Duration::from_millis(50),
        512,
    );
    let orchestrator = PreviewOrchestrator::new(Arc::new(corrector));

    let err = orchestrator
        .preview(&xlsx_upload("products.xlsx", &product_rows(3, None)), "product")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ImportError::HeaderCorrectionFailed(CorrectionError::Timeout(_))
    ));
}

#[tokio::test]
async fn test_correction_failure_fails_preview() {
    let orchestrator = PreviewOrchestrator::new(Arc::new(FailingCorrector));
    let err = orchestrator
        .preview(&csv_upload("p.csv", "code,name,price\nA,B,1\n"), "product")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "HEADER_CORRECTION_FAILED");
}

#[tokio::test]
async fn test_malformed_ai_reply_fails_preview() {
    let (orchestrator, _) = ai_preview("I could not work out the columns, sorry.");
    let err = orchestrator
        .preview(&csv_upload("p.csv", "code,name,price\nA,B,1\n"), "product")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ImportError::HeaderCorrectionFailed(CorrectionError::MalformedReply(_))
    ));
}

#[tokio::test]
async fn test_short_ai_reply_keeps_cardinality() {
    let (orchestrator, _) = ai_preview(r#"{"canonicalHeaders": ["code"]}"#);
    let result = orchestrator
        .preview(&csv_upload("p.csv", "sku,name,price\nA,Pen,1\n"), "product")
        .await
        .unwrap();

    let correction = &result.header_correction;
    assert_eq!(correction.corrected_columns, vec!["code", "name", "price"]);
    assert_eq!(correction.corrected_columns.len(), correction.original_headers.len());
    assert_eq!(result.valid_count(), 1);
}

#[tokio::test]
async fn test_preview_is_idempotent() {
    let (orchestrator, _) = ai_preview(
        r#"{"correctedColumns": ["code", "name", "description", "price", "stock"], "wasCorrected": false}"#,
    );
    let upload = xlsx_upload("products.xlsx", &product_rows(6, Some(2)));

    let first = orchestrator.preview(&upload, "product").await.unwrap();
    let second = orchestrator.preview(&upload, "product").await.unwrap();

    let numbers = |rows: &[sheetport_ingest::models::RowValidationVerdict]| {
        rows.iter().map(|r| r.row_number).collect::<Vec<_>>()
    };
    assert_eq!(numbers(&first.valid_rows), numbers(&second.valid_rows));
    assert_eq!(numbers(&first.invalid_rows), numbers(&second.invalid_rows));
    assert_eq!(numbers(&first.invalid_rows), vec![3]);
    assert_ne!(first.session_id, second.session_id);
}

#[tokio::test]
async fn test_empty_workbook_is_empty_worksheet() {
    let upload = xlsx_upload("empty.xlsx", &[]);
    let err = similarity_preview().preview(&upload, "product").await.unwrap_err();
    assert!(matches!(err, ImportError::EmptyWorksheet(_)));
}

#[tokio::test]
async fn test_non_spreadsheet_is_unreadable() {
    let upload = helpers::csv_upload("notes.xlsx", "just some text");
    let err = similarity_preview().preview(&upload, "product").await.unwrap_err();
    assert!(matches!(err, ImportError::UnreadableFile(_)));
}

#[tokio::test]
async fn test_unknown_entity_type() {
    let upload = xlsx_upload("products.xlsx", &product_rows(1, None));
    let err = similarity_preview().preview(&upload, "invoice").await.unwrap_err();
    assert!(matches!(err, ImportError::UnknownEntityType(ref name) if name == "invoice"));
}

#[tokio::test]
async fn test_semicolon_csv_with_accented_headers() {
    let body = "\u{feff}Código;Name;Precio;Stock\nA-1;Lápiz;0,5;3\nA-2;Goma;1.25;4\n";
    let result = similarity_preview()
        .preview(&csv_upload("productos.csv", body), "product")
        .await
        .unwrap();

    let correction = &result.header_correction;
    assert_eq!(correction.corrected_columns[0], "code");
    assert_eq!(correction.corrected_columns[2], "price");

    // "0,5" is not a decimal in the accepted format
    assert_eq!(result.invalid_count(), 1);
    assert_eq!(result.invalid_rows[0].row_number, 2);
    assert_eq!(result.valid_rows[0].row_number, 3);
}
