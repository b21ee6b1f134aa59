//! Table reconstruction from positioned text
//!
//! Groups the text fragments of a page into rows by baseline, splits rows
//! into cells at wide horizontal gaps or vertical ruling lines, and keeps
//! runs of multi-cell rows as tables.
//!
//! # Example
//!
//! ```rust
//! use pdf_toolkit::parser::ContentParser;
//! use pdf_toolkit::text::{TableOptions, TableReconstructor};
//!
//! let ops = ContentParser::parse(b"BT /F1 10 Tf 72 700 Td (Name) Tj 100 0 Td (Age) Tj ET").unwrap();
//! let rows = TableReconstructor::new(TableOptions::default()).reconstruct(&ops);
//! assert_eq!(rows[0].cells, vec!["Name", "Age"]);
//! ```

use super::extraction::{extract_layout, extract_page_layout, PageLayout, RulingLine, TextFragment};
use super::font::FontSet;
use crate::objects::ObjectId;
use crate::parser::{ContentOperation, ParseResult};
use crate::Document;

/// Gap between fragments of one cell, relative to the font size, above
/// which a space is inserted
const WORD_GAP_RATIO: f64 = 0.15;

/// How far a ruling may sit inside the text it separates
const RULING_SLACK: f64 = 0.5;

/// Where blank separator rows go in the flattened output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeparatorMode {
    /// One blank row between consecutive tables
    #[default]
    BetweenTables,
    /// One blank row after every table
    AfterEachTable,
    /// No separator rows
    None,
}

/// Header row classification
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaderHeuristic {
    /// Share of cells that must contain an alphabetic character
    pub min_alpha_ratio: f64,
}

impl Default for HeaderHeuristic {
    fn default() -> Self {
        Self {
            min_alpha_ratio: 0.5,
        }
    }
}

impl HeaderHeuristic {
    pub fn is_header(&self, row: &TableRow) -> bool {
        if row.cells.is_empty() {
            return false;
        }
        let alphabetic = row
            .cells
            .iter()
            .filter(|cell| cell.chars().any(char::is_alphabetic))
            .count();
        alphabetic as f64 >= self.min_alpha_ratio * row.cells.len() as f64
    }
}

/// Table reconstruction options
#[derive(Debug, Clone)]
pub struct TableOptions {
    /// Maximum baseline difference within one row, in points
    pub row_tolerance: f64,
    /// Minimum horizontal gap that starts a new cell, in points
    pub column_gap: f64,
    /// Cells a row needs to count as a table row
    pub min_columns: usize,
    /// Maximum vertical distance between consecutive rows of one table
    pub table_gap: f64,
    /// Rows a table needs to be reported
    pub min_rows: usize,
    /// Line cells up with per-table column bands, padding with empty cells
    pub align_columns: bool,
    pub separator: SeparatorMode,
    pub header: HeaderHeuristic,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            row_tolerance: 3.0,
            column_gap: 10.0,
            min_columns: 2,
            table_gap: 30.0,
            min_rows: 1,
            align_columns: true,
            separator: SeparatorMode::default(),
            header: HeaderHeuristic::default(),
        }
    }
}

impl TableOptions {
    pub fn with_row_tolerance(mut self, tolerance: f64) -> Self {
        self.row_tolerance = tolerance;
        self
    }

    pub fn with_column_gap(mut self, gap: f64) -> Self {
        self.column_gap = gap;
        self
    }

    pub fn with_min_columns(mut self, columns: usize) -> Self {
        self.min_columns = columns;
        self
    }

    pub fn with_table_gap(mut self, gap: f64) -> Self {
        self.table_gap = gap;
        self
    }

    pub fn with_min_rows(mut self, rows: usize) -> Self {
        self.min_rows = rows;
        self
    }

    pub fn with_align_columns(mut self, align: bool) -> Self {
        self.align_columns = align;
        self
    }

    pub fn with_separator(mut self, separator: SeparatorMode) -> Self {
        self.separator = separator;
        self
    }

    pub fn with_header_heuristic(mut self, header: HeaderHeuristic) -> Self {
        self.header = header;
        self
    }
}

/// One row of cell strings. A row without cells separates tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableRow {
    pub cells: Vec<String>,
}

impl TableRow {
    pub fn new(cells: Vec<String>) -> Self {
        Self { cells }
    }

    pub fn separator() -> Self {
        Self::default()
    }

    pub fn is_separator(&self) -> bool {
        self.cells.is_empty()
    }

    /// At least half of the cells contain an alphabetic character
    pub fn is_header(&self) -> bool {
        HeaderHeuristic::default().is_header(self)
    }
}

/// A run of table rows on one page, top to bottom
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub rows: Vec<TableRow>,
    /// Baseline of the first row
    pub top: f64,
    /// Baseline of the last row
    pub bottom: f64,
}

impl Table {
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|row| row.cells.len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone)]
struct Cell {
    text: String,
    left: f64,
    right: f64,
}

#[derive(Debug, Clone)]
struct Line {
    y: f64,
    cells: Vec<Cell>,
}

/// Reconstructs tables from page content
#[derive(Debug, Clone, Default)]
pub struct TableReconstructor {
    options: TableOptions,
}

impl TableReconstructor {
    pub fn new(options: TableOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    /// Header classification with the configured heuristic
    pub fn is_header(&self, row: &TableRow) -> bool {
        self.options.header.is_header(row)
    }

    /// Rows of the tables in one page's content operators. Fonts are not
    /// known here, so glyph advances are estimated.
    pub fn reconstruct(&self, operations: &[ContentOperation]) -> Vec<TableRow> {
        self.reconstruct_layout(&extract_layout(operations, &FontSet::default()))
    }

    /// Rows of the tables on page `page_id`, with the page's fonts
    pub fn reconstruct_page(
        &self,
        document: &Document,
        page_id: ObjectId,
    ) -> ParseResult<Vec<TableRow>> {
        let layout = extract_page_layout(document, page_id)?;
        Ok(self.reconstruct_layout(&layout))
    }

    /// Rows of the tables of every page, in page order. Tables on different
    /// pages are separated the same way as tables on one page.
    pub fn reconstruct_document(&self, document: &Document) -> ParseResult<Vec<TableRow>> {
        let mut rows = Vec::new();

        for (index, &page_id) in document.page_ids().iter().enumerate() {
            let page_rows = self.reconstruct_page(document, page_id)?;
            tracing::debug!("Page {}: {} table rows", index + 1, page_rows.len());

            if page_rows.is_empty() {
                continue;
            }
            if self.options.separator == SeparatorMode::BetweenTables && !rows.is_empty() {
                rows.push(TableRow::separator());
            }
            rows.extend(page_rows);
        }

        Ok(rows)
    }

    pub fn reconstruct_layout(&self, layout: &PageLayout) -> Vec<TableRow> {
        self.flatten(self.detect_tables(layout))
    }

    /// Tables of one page, top to bottom
    pub fn detect_tables(&self, layout: &PageLayout) -> Vec<Table> {
        let lines: Vec<Line> = self
            .group_rows(&layout.fragments)
            .into_iter()
            .map(|(y, fragments)| Line {
                y,
                cells: self.split_cells(y, fragments, &layout.rulings),
            })
            .collect();

        let mut tables = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            if line.cells.len() < self.options.min_columns {
                self.close_table(&mut current, &mut tables);
                continue;
            }
            if let Some(last) = current.last() {
                if last.y - line.y > self.options.table_gap {
                    self.close_table(&mut current, &mut tables);
                }
            }
            current.push(line);
        }
        self.close_table(&mut current, &mut tables);

        tables
    }

    /// Rows of `tables` with separator rows placed per the options
    pub fn flatten(&self, tables: Vec<Table>) -> Vec<TableRow> {
        let count = tables.len();
        let mut rows = Vec::new();

        for (index, table) in tables.into_iter().enumerate() {
            rows.extend(table.rows);
            let separate = match self.options.separator {
                SeparatorMode::BetweenTables => index + 1 < count,
                SeparatorMode::AfterEachTable => true,
                SeparatorMode::None => false,
            };
            if separate {
                rows.push(TableRow::separator());
            }
        }

        rows
    }

    /// Fragments clustered by baseline, top to bottom, each row sorted left
    /// to right
    fn group_rows<'f>(&self, fragments: &'f [TextFragment]) -> Vec<(f64, Vec<&'f TextFragment>)> {
        let mut sorted: Vec<&TextFragment> = fragments.iter().collect();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<(f64, Vec<&TextFragment>)> = Vec::new();
        for fragment in sorted {
            let joins = rows
                .last()
                .is_some_and(|(y, _)| (y - fragment.y).abs() <= self.options.row_tolerance);
            if !joins {
                rows.push((fragment.y, vec![fragment]));
                continue;
            }
            if let Some((y, members)) = rows.last_mut() {
                members.push(fragment);
                // Running mean keeps long rows anchored
                *y += (fragment.y - *y) / members.len() as f64;
            }
        }

        for (_, members) in &mut rows {
            members.sort_by(|a, b| a.x.total_cmp(&b.x));
        }
        rows
    }

    fn split_cells(&self, y: f64, fragments: Vec<&TextFragment>, rulings: &[RulingLine]) -> Vec<Cell> {
        let mut cells: Vec<Cell> = Vec::new();

        for fragment in fragments {
            let starts_cell = match cells.last() {
                None => true,
                Some(cell) => {
                    fragment.x - cell.right > self.options.column_gap
                        || rulings.iter().any(|ruling| {
                            ruling.spans(y, self.options.row_tolerance)
                                && ruling.x > cell.right - RULING_SLACK
                                && ruling.x < fragment.x + RULING_SLACK
                        })
                }
            };

            if starts_cell {
                cells.push(Cell {
                    text: fragment.text.clone(),
                    left: fragment.x,
                    right: fragment.right(),
                });
            } else if let Some(cell) = cells.last_mut() {
                if fragment.x - cell.right > fragment.font_size * WORD_GAP_RATIO {
                    cell.text.push(' ');
                }
                cell.text.push_str(&fragment.text);
                cell.right = cell.right.max(fragment.right());
            }
        }

        for cell in &mut cells {
            cell.text = cell.text.trim().to_string();
        }
        cells
    }

    fn close_table(&self, lines: &mut Vec<Line>, tables: &mut Vec<Table>) {
        if lines.is_empty() {
            return;
        }
        let lines = std::mem::take(lines);
        if lines.len() < self.options.min_rows {
            tracing::trace!("Dropping {}-row table candidate", lines.len());
            return;
        }

        let top = lines[0].y;
        let bottom = lines[lines.len() - 1].y;
        let bands = if self.options.align_columns {
            column_bands(&lines)
        } else {
            None
        };

        let rows = lines
            .into_iter()
            .map(|line| match &bands {
                Some(bands) => TableRow::new(align_cells(line.cells, bands)),
                None => TableRow::new(line.cells.into_iter().map(|cell| cell.text).collect()),
            })
            .collect();

        tables.push(Table { rows, top, bottom });
    }
}

/// Horizontal extents of the table's columns: cell spans merged where they
/// overlap. `None` when merging leaves fewer bands than the widest row has
/// cells.
fn column_bands(lines: &[Line]) -> Option<Vec<(f64, f64)>> {
    let mut spans: Vec<(f64, f64)> = lines
        .iter()
        .flat_map(|line| line.cells.iter().map(|cell| (cell.left, cell.right)))
        .collect();
    spans.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut bands: Vec<(f64, f64)> = Vec::new();
    for (left, right) in spans {
        match bands.last_mut() {
            Some(band) if left <= band.1 => band.1 = band.1.max(right),
            _ => bands.push((left, right)),
        }
    }

    let widest = lines.iter().map(|line| line.cells.len()).max().unwrap_or(0);
    (bands.len() >= widest).then_some(bands)
}

fn align_cells(cells: Vec<Cell>, bands: &[(f64, f64)]) -> Vec<String> {
    let mut aligned = vec![String::new(); bands.len()];

    for cell in cells {
        let column = bands
            .iter()
            .position(|&(left, right)| cell.left >= left && cell.left <= right)
            .unwrap_or(bands.len() - 1);
        let slot = &mut aligned[column];
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(&cell.text);
    }

    aligned
}
