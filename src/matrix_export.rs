use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::score_matrix::ScoreMatrix;

const SHEET_NAME: &str = "ScoreMatrix";

// Worksheet limits of the xlsx format.
const XLSX_MAX_ROWS: usize = 1_048_576;
const XLSX_MAX_COLS: usize = 16_384;

/// Writes the grid as headerless comma-separated integers.
pub fn write_csv<W: Write>(matrix: &ScoreMatrix, writer: W) -> Result<()> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    for row in matrix.rows() {
        out.write_record(row.iter().map(|v| v.to_string()))
            .context("write matrix row")?;
    }
    out.flush().context("flush matrix csv")?;
    Ok(())
}

pub fn save_csv(matrix: &ScoreMatrix, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_csv(matrix, file).with_context(|| format!("failed writing matrix to {}", path.display()))
}

pub fn read_csv<R: Read>(reader: R) -> Result<ScoreMatrix> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut rows = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("read matrix row {idx}"))?;
        let row = record
            .iter()
            .map(|cell| {
                cell.parse::<i64>()
                    .with_context(|| format!("row {idx}: not an integer: {cell:?}"))
            })
            .collect::<Result<Vec<_>>>()?;
        rows.push(row);
    }
    Ok(ScoreMatrix::from_rows(rows)?)
}

pub fn load_csv(path: &Path) -> Result<ScoreMatrix> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_csv(file).with_context(|| format!("invalid matrix file {}", path.display()))
}

pub fn save_xlsx(matrix: &ScoreMatrix, path: &Path) -> Result<()> {
    let last = matrix.dim() - 1;
    sheet_cell(last, last).context("matrix does not fit in a worksheet")?;

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;
        write_grid(sheet, matrix)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_grid(worksheet: &mut Worksheet, matrix: &ScoreMatrix) -> Result<()> {
    for (row_idx, row) in matrix.rows().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            let (row, col) = sheet_cell(row_idx, col_idx)?;
            worksheet
                .write_number(row, col, *value as f64)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

fn sheet_cell(row_idx: usize, col_idx: usize) -> Result<(u32, u16)> {
    if row_idx >= XLSX_MAX_ROWS || col_idx >= XLSX_MAX_COLS {
        return Err(anyhow!(
            "cell ({row_idx},{col_idx}) is beyond the {XLSX_MAX_ROWS}x{XLSX_MAX_COLS} sheet limit"
        ));
    }
    Ok((u32::try_from(row_idx)?, u16::try_from(col_idx)?))
}
