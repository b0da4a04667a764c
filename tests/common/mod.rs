//! Spreadsheet fixtures shared by the integration tests

#![allow(dead_code)]

use rust_xlsxwriter::Workbook;
use std::path::Path;

/// Cells that parse as numbers are written as numbers; empty strings are skipped
pub fn write_sheet(path: &Path, rows: &[&[&str]]) {
    write_named_sheets(path, &[("Sheet1", rows)]);
}

pub fn write_named_sheets(path: &Path, sheets: &[(&str, &[&[&str]])]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                match value.parse::<f64>() {
                    Ok(n) => worksheet.write_number(r as u32, c as u16, n).unwrap(),
                    Err(_) => worksheet.write_string(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
    }
    workbook.save(path).unwrap();
}

/// The canonical fixture: three blank rows, then the header
pub fn write_startups(path: &Path) {
    write_sheet(
        path,
        &[
            &[],
            &[],
            &[],
            &["Company", "Sector", "City", "Funding Received"],
            &["Acme", "Fintech", "Mumbai", "$2M"],
            &["Beta", "Edtech", "Delhi", "-"],
        ],
    );
}

/// A richer sheet with a preamble and every role the views look for
pub fn write_directory(path: &Path) {
    write_sheet(
        path,
        &[
            &["Startup Ecosystem Report 2024"],
            &["Compiled from public sources"],
            &[],
            &[
                "Company",
                "Sector",
                "City",
                "Tier",
                "Funding Level",
                "Funding Received",
                "Hot Startup",
                "Key Words",
                "Founding Year",
                "Founder",
                "Founder Type",
                "Email",
                "Contact Number",
                "Description",
            ],
            &[
                "Acme Pay", "Fintech", "Mumbai", "Tier 1", "Series A", "$2M", "Yes",
                "payments, upi", "2016", "A. Rao", "Male", "hello@acme.example",
                "98200 00000", "UPI payments for small merchants",
            ],
            &[
                "Beta Learn", "Edtech", "Bengaluru", "Tier 1", "Seed", "500K", "No",
                "learning, k12", "2019", "B. Iyer", "Female", "", "", "",
            ],
            &[
                "Gamma Farms", "Agritech", "Pune", "Tier 2", "-", "-", "No",
                "farming", "2021", "", "Mixed", "", "", "",
            ],
            &[
                "Delta Health", "Healthtech", "Gurgaon", "Tier 1", "Pre Seed", "3 Cr",
                "Yes", "clinics, payments", "1998", "", "", "", "", "",
            ],
        ],
    );
}
