//! Upload fixtures
//!
//! `.xlsx` files are generated with rust_xlsxwriter so the reader is exercised
//! against real workbooks rather than checked-in binaries.

use rust_xlsxwriter::Workbook;
use sheetport_ingest::services::UploadedFile;

/// Workbook whose first sheet holds `rows`; numeric-looking cells are
/// written as numbers
pub fn xlsx_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            match cell.parse::<f64>() {
                Ok(number) => worksheet.write_number(r as u32, c as u16, number).unwrap(),
                Err(_) => worksheet.write_string(r as u32, c as u16, cell).unwrap(),
            };
        }
    }

    workbook.save_to_buffer().unwrap()
}

pub fn xlsx_upload(name: &str, rows: &[Vec<String>]) -> UploadedFile {
    UploadedFile::new(name, xlsx_bytes(rows))
}

pub fn csv_upload(name: &str, body: &str) -> UploadedFile {
    UploadedFile::new(name, body.as_bytes().to_vec())
}

pub fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

/// Product sheet: header plus `count` data rows; `bad_price_at` (1-based data
/// row index) gets a non-numeric price
pub fn product_rows(count: usize, bad_price_at: Option<usize>) -> Vec<Vec<String>> {
    let mut rows = vec![row(&["Code", "Name", "Description", "Price", "Stock"])];
    for i in 1..=count {
        let price = if Some(i) == bad_price_at {
            "twelve".to_string()
        } else {
            format!("{}.5", i)
        };
        rows.push(vec![
            format!("P-{:03}", i),
            format!("Product {}", i),
            String::new(),
            price,
            (i * 10).to_string(),
        ]);
    }
    rows
}
