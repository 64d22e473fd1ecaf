//! Table detection (§4.9): finds runs of consecutive rows with matching
//! column counts and aligned column boundaries.

use crate::content::TextRun;

/// A detected table region: rows of cell text, in reading order.
#[derive(Debug, Clone)]
pub struct Table {
    /// Cell text, one inner `Vec` per row.
    pub rows: Vec<Vec<String>>,
    /// Index into `rows` of the header row, if the header heuristic fired.
    pub header_row: Option<usize>,
    /// Device-space y of the table's topmost row.
    pub y_start: f32,
    /// Device-space y of the table's bottommost row.
    pub y_end: f32,
}

struct Row {
    cells: Vec<Cell>,
    y: f32,
}

struct Cell {
    text: String,
    x: f32,
    font_size: f32,
    bold: bool,
}

/// Detect tables among a page's positioned runs.
///
/// `page_width` is used to size the 3%-of-page-width column-alignment
/// tolerance (§4.9).
pub fn detect_tables(items: &[TextRun], page_width: f32) -> Vec<Table> {
    let rows = cluster_rows(items);
    let alignment_tolerance = 0.03 * page_width;

    let mut tables = Vec::new();
    let mut i = 0;
    while i < rows.len() {
        let col_count = rows[i].cells.len();
        if col_count < 2 {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < rows.len() && rows[j].cells.len() == col_count && columns_aligned(&rows[i], &rows[j], alignment_tolerance) {
            j += 1;
        }

        let run_len = j - i;
        if run_len >= 3 {
            tables.push(build_table(&rows[i..j]));
            i = j;
        } else {
            i += 1;
        }
    }
    tables
}

/// Row clustering (§4.9): same Y-proximity rule the assembler's sort uses.
fn cluster_rows(items: &[TextRun]) -> Vec<Row> {
    let mut sorted: Vec<&TextRun> = items.iter().collect();
    sorted.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(std::cmp::Ordering::Equal));

    let mut rows: Vec<Vec<&TextRun>> = Vec::new();
    for item in sorted {
        let starts_new_row = match rows.last().and_then(|r| r.last()) {
            Some(prev) => {
                let font_size = if prev.font_size > 0.0 { prev.font_size } else { 12.0 };
                (item.y - prev.y).abs() > 0.5 * font_size
            },
            None => true,
        };
        if starts_new_row {
            rows.push(vec![item]);
        } else {
            rows.last_mut().unwrap().push(item);
        }
    }

    rows.into_iter().map(|r| segment_cells(r)).collect()
}

/// Cell segmentation (§4.9): split a row into cells at x-gaps exceeding
/// `1.5 * fontSize`.
fn segment_cells(mut row: Vec<&TextRun>) -> Row {
    row.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal));
    let y = row.first().map(|r| r.y).unwrap_or(0.0);

    let mut cells: Vec<Cell> = Vec::new();
    for item in row {
        let font_size = if item.font_size > 0.0 { item.font_size } else { 12.0 };
        let starts_new_cell = match cells.last() {
            Some(prev) => item.x - prev.x > 1.5 * font_size,
            None => true,
        };
        if starts_new_cell {
            cells.push(Cell { text: item.text.clone(), x: item.x, font_size: item.font_size, bold: is_bold(&item.base_font) });
        } else {
            let cell = cells.last_mut().unwrap();
            if !cell.text.is_empty() && !item.text.is_empty() {
                cell.text.push(' ');
            }
            cell.text.push_str(&item.text);
        }
    }
    Row { cells, y }
}

fn columns_aligned(a: &Row, b: &Row, tolerance: f32) -> bool {
    a.cells.iter().zip(b.cells.iter()).all(|(ca, cb)| (ca.x - cb.x).abs() <= tolerance)
}

fn is_bold(base_font: &str) -> bool {
    base_font.to_ascii_lowercase().contains("bold")
}

/// Header heuristic (§4.9): the first row is a header if its cells are
/// bold, or its font size is more than 0.5pt larger than the second row's.
fn build_table(rows: &[Row]) -> Table {
    let header_row = if rows.len() >= 2 {
        let first_bold = rows[0].cells.iter().any(|c| c.bold);
        let first_size = rows[0].cells.iter().map(|c| c.font_size).fold(0.0_f32, f32::max);
        let second_size = rows[1].cells.iter().map(|c| c.font_size).fold(0.0_f32, f32::max);
        if first_bold || first_size - second_size > 0.5 { Some(0) } else { None }
    } else {
        None
    };

    let y_start = rows.first().map(|r| r.y).unwrap_or(0.0);
    let y_end = rows.last().map(|r| r.y).unwrap_or(0.0);
    let rows = rows.iter().map(|r| r.cells.iter().map(|c| c.text.clone()).collect()).collect();
    Table { rows, header_row, y_start, y_end }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(text: &str, x: f32, y: f32, font_size: f32, bold: bool) -> TextRun {
        let base_font = if bold { "Helvetica-Bold" } else { "Helvetica" };
        TextRun { text: text.to_string(), x, y, font_size, base_font: base_font.to_string(), width: text.len() as f32 * font_size * 0.5, text_object_id: 1 }
    }

    #[test]
    fn detects_a_three_row_two_column_grid() {
        let items = vec![
            cell("Name", 0.0, 700.0, 10.0, true),
            cell("Age", 100.0, 700.0, 10.0, true),
            cell("Alice", 0.0, 685.0, 10.0, false),
            cell("30", 100.0, 685.0, 10.0, false),
            cell("Bob", 0.0, 670.0, 10.0, false),
            cell("25", 100.0, 670.0, 10.0, false),
        ];
        let tables = detect_tables(&items, 612.0);
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[0], vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(table.header_row, Some(0));
    }

    #[test]
    fn ignores_misaligned_rows() {
        let items = vec![
            cell("A", 0.0, 700.0, 10.0, false),
            cell("B", 50.0, 700.0, 10.0, false),
            cell("C", 10.0, 685.0, 10.0, false),
            cell("D", 90.0, 685.0, 10.0, false),
        ];
        let tables = detect_tables(&items, 612.0);
        assert!(tables.is_empty());
    }

    #[test]
    fn two_rows_are_not_enough() {
        let items = vec![
            cell("A", 0.0, 700.0, 10.0, false),
            cell("B", 50.0, 700.0, 10.0, false),
            cell("C", 0.0, 685.0, 10.0, false),
            cell("D", 50.0, 685.0, 10.0, false),
        ];
        let tables = detect_tables(&items, 612.0);
        assert!(tables.is_empty());
    }
}
