//! Table detection using text position analysis (Stream mode).
//!
//! Tables are found by looking at text alignment alone: spans are grouped
//! into rows by baseline, column edges are the left-edge positions that recur
//! across rows, and runs of consecutive rows aligned to those edges become
//! table regions.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::model::{Table, TableCell, TableRow};

use super::TextSpan;

/// A detected table region with its content.
#[derive(Debug, Clone)]
pub struct TableRegion {
    /// Baseline of the first row
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    pub left_x: f32,
    pub right_x: f32,
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    /// Rows from top to bottom
    pub rows: Vec<TableRowData>,
}

/// A row of text spans in a table.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Average baseline of the row
    pub y: f32,
    /// Spans in this row, sorted by x
    pub spans: Vec<TextSpan>,
    indices: Vec<usize>,
}

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Y tolerance for grouping spans into rows (fraction of font size)
    pub y_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between column edges
    pub min_column_gap: f32,
    /// Width of the buckets left edges are snapped into
    pub edge_bucket: f32,
    /// Distance within which a span counts as aligned with a column edge
    pub alignment_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
            edge_bucket: 5.0,
            alignment_tolerance: 5.0,
        }
    }
}

impl TableDetectorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_rows(mut self, rows: usize) -> Self {
        self.min_rows = rows.max(1);
        self
    }

    pub fn with_min_columns(mut self, columns: usize) -> Self {
        self.min_columns = columns.max(1);
        self
    }

    pub fn with_max_columns(mut self, columns: usize) -> Self {
        self.max_columns = columns;
        self
    }

    pub fn with_min_column_gap(mut self, gap: f32) -> Self {
        self.min_column_gap = gap;
        self
    }

    /// Scale the distance thresholds for coordinates that are not in points,
    /// e.g. OCR pixels at a given DPI.
    pub fn scaled(mut self, factor: f32) -> Self {
        self.min_column_gap *= factor;
        self.edge_bucket *= factor;
        self.alignment_tolerance *= factor;
        self
    }
}

/// Detects tables in a list of text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Detect tables in the given spans.
    ///
    /// Returns detected tables and the spans that were not part of any table.
    pub fn detect(&self, spans: Vec<TextSpan>) -> (Vec<TableRegion>, Vec<TextSpan>) {
        log::debug!("TableDetector: starting with {} spans", spans.len());

        if spans.len() < self.config.min_rows * self.config.min_columns {
            log::debug!("TableDetector: not enough spans ({})", spans.len());
            return (vec![], spans);
        }

        let rows = self.group_into_rows(&spans);
        if rows.len() < self.config.min_rows {
            log::debug!("TableDetector: not enough rows ({})", rows.len());
            return (vec![], spans);
        }

        let columns = self.detect_columns(&rows);
        log::debug!("TableDetector: page-wide column edges {:?}", columns);
        if columns.len() < self.config.min_columns {
            return (vec![], spans);
        }

        let mut tables = Vec::new();
        let mut used: HashSet<usize> = HashSet::new();

        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = &rows[start..=end];

            // Columns are re-detected per region so unrelated rows elsewhere
            // on the page do not contribute edges.
            let table_columns = self.detect_columns(table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            used.extend(table_rows.iter().flat_map(|r| r.indices.iter().copied()));
            tables.push(region_from_rows(table_rows.to_vec(), table_columns));
        }

        let remaining = spans
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .map(|(_, span)| span)
            .collect();

        log::debug!("TableDetector: found {} tables", tables.len());
        (tables, remaining)
    }

    /// Detect tables and convert them straight to the table model.
    pub fn detect_tables(&self, spans: Vec<TextSpan>) -> Vec<Table> {
        let (regions, _) = self.detect(spans);
        regions.iter().map(|r| self.to_table(r)).collect()
    }

    /// Group spans into rows by baseline, top to bottom.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut order: Vec<usize> = (0..spans.len()).collect();
        order.sort_by(|&a, &b| {
            spans[b]
                .y
                .total_cmp(&spans[a].y)
                .then(spans[a].x.total_cmp(&spans[b].x))
        });

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<usize> = Vec::new();
        let mut current_y: Option<f32> = None;

        for idx in order {
            let span = &spans[idx];
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(idx),
                _ => {
                    if !current.is_empty() {
                        rows.push(make_row(spans, std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(idx);
                }
            }
        }
        if !current.is_empty() {
            rows.push(make_row(spans, current));
        }

        rows
    }

    /// Detect column edges from left edges that recur across rows.
    ///
    /// Rows holding two or more spans are the likely table rows; if too few
    /// of them exist every row is counted instead.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();
        let sample: Vec<&TableRowData> = if multi.len() >= self.config.min_rows {
            multi
        } else {
            rows.iter().collect()
        };
        if sample.is_empty() {
            return vec![];
        }

        let bucket = self.config.edge_bucket.max(f32::EPSILON);
        let mut edge_counts: HashMap<i64, usize> = HashMap::new();
        for row in &sample {
            let buckets: HashSet<i64> = row
                .spans
                .iter()
                .map(|s| (s.x / bucket).round() as i64)
                .collect();
            for b in buckets {
                *edge_counts.entry(b).or_insert(0) += 1;
            }
        }

        let min_occurrences =
            ((sample.len() as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(b, _)| b as f32 * bucket)
            .collect();
        edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find runs of consecutive aligned rows, as inclusive row ranges.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if self.alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Fraction of a row's spans that start on a column edge.
    fn alignment_score(&self, row: &TableRowData, columns: &[f32]) -> f32 {
        if row.spans.is_empty() || columns.is_empty() {
            return 0.0;
        }
        let aligned = row
            .spans
            .iter()
            .filter(|s| {
                columns
                    .iter()
                    .any(|c| (s.x - c).abs() <= self.config.alignment_tolerance)
            })
            .count();
        aligned as f32 / row.spans.len() as f32
    }

    /// Convert a detected region into the table model.
    ///
    /// The first row becomes the header when the table has more than one row.
    pub fn to_table(&self, region: &TableRegion) -> Table {
        let header_rows = usize::from(region.rows.len() > 1);
        let mut table = Table::with_header(header_rows);
        let columns = &region.columns;

        for row in &region.rows {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for span in &row.spans {
                let col = self.column_for(span.x, columns, region.right_x);
                if let Some(cell) = cells.get_mut(col) {
                    cell.push(span.text.trim());
                }
            }
            table.add_row(TableRow::new(
                cells
                    .into_iter()
                    .map(|parts| TableCell::text(parts.join(" ")))
                    .collect(),
            ));
        }

        table
    }

    /// Index of the column a span starting at `x` belongs to.
    fn column_for(&self, x: f32, columns: &[f32], right_x: f32) -> usize {
        let slack = self.config.alignment_tolerance * 2.0;
        for (i, &start) in columns.iter().enumerate() {
            let end = columns.get(i + 1).copied().unwrap_or(right_x + slack * 10.0);
            if x >= start - slack && x < end - slack {
                return i;
            }
        }

        columns
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Whether aligned rows are really a bulleted or numbered list.
    ///
    /// A list marker and its item text are separate spans at two x positions,
    /// which looks like a two-column table.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let mut bullets = 0usize;
        let mut numbers = 0usize;
        for row in rows {
            if let Some(first) = row.spans.first() {
                let text = first.text.trim();
                if is_bullet_marker(text) {
                    bullets += 1;
                } else if is_number_marker(text) {
                    numbers += 1;
                }
            }
        }

        let total = rows.len() as f32;
        let bullet_ratio = bullets as f32 / total;
        let marker_ratio = (bullets + numbers) as f32 / total;
        log::debug!(
            "TableDetector: list markers bullets={} numbers={} rows={}",
            bullets,
            numbers,
            rows.len()
        );

        bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
    }
}

fn make_row(spans: &[TextSpan], mut indices: Vec<usize>) -> TableRowData {
    indices.sort_by(|&a, &b| spans[a].x.partial_cmp(&spans[b].x).unwrap_or(Ordering::Equal));
    let row_spans: Vec<TextSpan> = indices.iter().map(|&i| spans[i].clone()).collect();
    let y = row_spans.iter().map(|s| s.y).sum::<f32>() / row_spans.len().max(1) as f32;
    TableRowData {
        y,
        spans: row_spans,
        indices,
    }
}

fn region_from_rows(rows: Vec<TableRowData>, columns: Vec<f32>) -> TableRegion {
    let all = || rows.iter().flat_map(|r| r.spans.iter());
    let left_x = all().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let right_x = all().map(|s| s.right()).fold(f32::NEG_INFINITY, f32::max);
    TableRegion {
        top_y: rows.first().map(|r| r.y).unwrap_or(0.0),
        bottom_y: rows.last().map(|r| r.y).unwrap_or(0.0),
        left_x: if left_x.is_finite() { left_x } else { 0.0 },
        right_x: if right_x.is_finite() { right_x } else { 0.0 },
        columns,
        rows,
    }
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆"
            | "▶" | "➤"
    )
}

/// Markers such as "1.", "12)", "3", "a." or "B)".
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }
    if cleaned.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let Some(body) = cleaned
        .strip_suffix('.')
        .or_else(|| cleaned.strip_suffix(')'))
    else {
        return false;
    };
    let mut chars = body.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_alphabetic() => true,
        _ => !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()),
    }
}
