// Bookstock - Publisher/Book/Shop Sales Reporting
// Copyright (C) 2025 Henning Berge
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

//! Fixed-width table rendering for the sales report
//!
//! Presentation only: rows in, bordered text table out. The caller decides
//! what to do with an empty row set.

use crate::storage::queries::SaleReportRow;

const COLUMNS: [(&str, usize); 4] = [
    ("Book title", 40),
    ("Shop", 20),
    ("Price", 10),
    ("Date", 15),
];

/// Render report rows as a bordered fixed-width table.
///
/// Header cells are centered, data cells left-aligned; the sale date is
/// rendered day-month-year. Cells longer than their column widen the row
/// rather than being truncated.
pub fn render_sales_table(rows: &[SaleReportRow]) -> String {
    let separator = separator_line();
    let mut out = String::new();

    out.push_str(&separator);
    out.push('\n');

    let header: Vec<String> = COLUMNS
        .iter()
        .map(|&(name, width)| format!("{name:^width$}"))
        .collect();
    out.push_str(&format!("|{}|\n", header.join("|")));
    out.push_str(&separator);
    out.push('\n');

    for row in rows {
        let cells = [
            format!("{:<width$}", row.title, width = COLUMNS[0].1),
            format!("{:<width$}", row.shop, width = COLUMNS[1].1),
            format!("{:<width$}", row.price, width = COLUMNS[2].1),
            format!(
                "{:<width$}",
                row.date_sale.format("%d-%m-%Y"),
                width = COLUMNS[3].1
            ),
        ];
        out.push_str(&format!("|{}|\n", cells.join("|")));
    }

    out.push_str(&separator);
    out.push('\n');
    out
}

fn separator_line() -> String {
    let mut line = String::from("+");
    for (_, width) in COLUMNS {
        line.push_str(&"-".repeat(width));
        line.push('+');
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_row() -> SaleReportRow {
        SaleReportRow {
            title: "Programming Rust".to_string(),
            shop: "Буквоед".to_string(),
            price: 600.0,
            date_sale: NaiveDate::from_ymd_opt(2022, 11, 9).unwrap(),
        }
    }

    #[test]
    fn test_table_shape() {
        let table = render_sales_table(&[sample_row()]);
        let lines: Vec<&str> = table.lines().collect();

        // border, header, border, one data row, border
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("+----"));
        assert_eq!(lines[0], lines[2]);
        assert_eq!(lines[0], lines[4]);
        assert!(lines[1].contains("Book title"));
    }

    #[test]
    fn test_date_rendered_day_month_year() {
        let table = render_sales_table(&[sample_row()]);
        assert!(table.contains("09-11-2022"));
    }

    #[test]
    fn test_data_cells_left_aligned() {
        let table = render_sales_table(&[sample_row()]);
        let row_line = table.lines().nth(3).expect("Missing data row");
        assert!(row_line.starts_with("|Programming Rust "));
    }

    #[test]
    fn test_empty_rows_render_header_only() {
        let table = render_sales_table(&[]);
        assert_eq!(table.lines().count(), 4);
    }
}
