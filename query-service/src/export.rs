//! Excel 导出模块

use common::models::QueryResult;
use rust_xlsxwriter::{ColNum, Format, RowNum, Workbook, Worksheet, XlsxError};
use serde_json::Value;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const SHEET_NAME: &str = "Report";
const MAX_COLUMN_WIDTH: usize = 50;

/// Replaces every character outside `[A-Za-z0-9_-]` with `_`.
pub fn safe_filename(name: &str) -> String {
    let safe: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if safe.is_empty() {
        "report".to_string()
    } else {
        safe
    }
}

/// 将查询结果写入单个工作表，首行为加粗列名
pub fn workbook(result: &QueryResult) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();

    for (col, name) in result.columns.iter().enumerate() {
        sheet.write_string_with_format(0, col_num(col)?, name, &bold)?;
    }

    for (idx, row) in result.rows.iter().enumerate() {
        let row_num = row_num(idx + 1)?;
        for (col, name) in result.columns.iter().enumerate() {
            let Some(value) = row.get(name) else { continue };
            let len = write_cell(sheet, row_num, col_num(col)?, value)?;
            widths[col] = widths[col].max(len);
        }
    }

    for (col, width) in widths.into_iter().enumerate() {
        sheet.set_column_width(col_num(col)?, (width + 2).min(MAX_COLUMN_WIDTH) as f64)?;
    }

    workbook.save_to_buffer()
}

/// Writes one cell by JSON type and returns the rendered width. Nulls stay blank.
fn write_cell(sheet: &mut Worksheet, row: RowNum, col: ColNum, value: &Value) -> Result<usize, XlsxError> {
    match value {
        Value::Null => return Ok(0),
        Value::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Value::Number(n) => match n.as_f64() {
            Some(f) => {
                sheet.write_number(row, col, f)?;
            }
            None => {
                sheet.write_string(row, col, n.to_string())?;
            }
        },
        Value::String(s) => {
            sheet.write_string(row, col, s)?;
            return Ok(s.chars().count());
        }
        Value::Array(_) | Value::Object(_) => {
            let text = value.to_string();
            sheet.write_string(row, col, &text)?;
            return Ok(text.chars().count());
        }
    }
    Ok(value.to_string().len())
}

fn row_num(idx: usize) -> Result<RowNum, XlsxError> {
    RowNum::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}

fn col_num(idx: usize) -> Result<ColNum, XlsxError> {
    ColNum::try_from(idx).map_err(|_| XlsxError::RowColumnLimitError)
}
