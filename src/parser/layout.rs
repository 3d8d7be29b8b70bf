//! Text positioning and line grouping.
//!
//! Walks the text operators of each page, tracks the text matrix to place
//! every shown string, splits the page into columns at a vertical gutter
//! and groups each column's spans into physical lines by baseline.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::backend::{ContentOp, PageId, PdfBackend, PdfValue};
use crate::error::Result;
use crate::model::{RawLine, RawSpan};

/// A shown string with its position on the page.
#[derive(Debug, Clone)]
pub struct PositionedSpan {
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline, PDF user space, grows upward)
    pub y: f32,
    /// Horizontal advance in user space
    pub width: f32,
    /// Effective font size in points
    pub size: f32,
    pub font: String,
}

impl PositionedSpan {
    /// Right edge.
    pub fn end_x(&self) -> f32 {
        self.x + self.width
    }

    fn avg_char_width(&self) -> f32 {
        let chars = self.text.chars().count();
        if chars > 0 && self.width > 0.0 {
            self.width / chars as f32
        } else {
            self.size * 0.5
        }
    }
}

impl From<PositionedSpan> for RawSpan {
    fn from(span: PositionedSpan) -> Self {
        RawSpan::new(span.text, span.size, span.font)
    }
}

/// TJ adjustments beyond this many thousandths of an em read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Spans within this fraction of their font size share a baseline.
const BASELINE_TOLERANCE: f32 = 0.3;

/// A gap wider than this fraction of the average character width is a word break.
const WORD_GAP_RATIO: f32 = 0.2;

/// Glyph width assumed when the font has no width table, in thousandths of an em.
const ESTIMATED_GLYPH_WIDTH: f32 = 500.0;

const DEFAULT_FONT_SIZE: f32 = 12.0;

/// Extracts physical lines from every page of a document.
pub struct LineExtractor<'a, B: PdfBackend> {
    backend: &'a B,
    first_page: u32,
}

impl<'a, B: PdfBackend> LineExtractor<'a, B> {
    /// Create an extractor numbering pages from `first_page`.
    pub fn new(backend: &'a B, first_page: u32) -> Self {
        Self {
            backend,
            first_page,
        }
    }

    /// Extract all lines, page by page.
    ///
    /// A page whose content cannot be decoded is skipped with a warning.
    pub fn extract(&self) -> Vec<RawLine> {
        let mut lines = Vec::new();
        for (idx, page_id) in self.backend.page_ids().into_iter().enumerate() {
            let page = self.first_page + idx as u32;
            match self.page_spans(page_id) {
                Ok(spans) => {
                    for line in group_into_lines(spans) {
                        let spans = line.into_iter().map(RawSpan::from).collect();
                        lines.push(RawLine::new(page, spans));
                    }
                }
                Err(e) => log::warn!("skipping page {}: {}", page, e),
            }
        }
        lines
    }

    /// Positioned spans of one page, in content stream order.
    pub fn page_spans(&self, page_id: PageId) -> Result<Vec<PositionedSpan>> {
        let fonts = self.backend.font_names(page_id).unwrap_or_else(|e| {
            log::debug!("no font table for page {:?}: {}", page_id, e);
            HashMap::new()
        });
        let ops = self.backend.operations(page_id)?;
        Ok(self.interpret(page_id, &ops, &fonts))
    }

    fn interpret(
        &self,
        page_id: PageId,
        ops: &[ContentOp],
        fonts: &HashMap<Vec<u8>, String>,
    ) -> Vec<PositionedSpan> {
        let mut state = TextState::default();
        let mut spans = Vec::new();

        for op in ops {
            match op.operator.as_str() {
                "BT" => {
                    state.in_text = true;
                    state.set_matrix(TextMatrix::default());
                }
                "ET" => state.in_text = false,
                "Tf" => {
                    if let Some(PdfValue::Name(key)) = op.operands.first() {
                        state.font = fonts
                            .get(key)
                            .cloned()
                            .unwrap_or_else(|| String::from_utf8_lossy(key).to_string());
                        state.font_key = key.clone();
                    }
                    state.font_size = op.number(1, DEFAULT_FONT_SIZE);
                }
                "Tc" => state.char_spacing = op.number(0, 0.0),
                "Tw" => state.word_spacing = op.number(0, 0.0),
                "TL" => state.leading = op.number(0, 0.0),
                "Td" => state.move_line(op.number(0, 0.0), op.number(1, 0.0)),
                "TD" => {
                    let ty = op.number(1, 0.0);
                    state.leading = -ty;
                    state.move_line(op.number(0, 0.0), ty);
                }
                "Tm" => state.set_matrix(TextMatrix {
                    m: [
                        op.number(0, 1.0),
                        op.number(1, 0.0),
                        op.number(2, 0.0),
                        op.number(3, 1.0),
                        op.number(4, 0.0),
                        op.number(5, 0.0),
                    ],
                }),
                "T*" => state.next_line(),
                "Tj" => {
                    if let Some(PdfValue::Str(bytes)) = op.operands.first() {
                        let (text, advance) = self.decode_str(page_id, &state, bytes);
                        state.show(text, advance, &mut spans);
                    }
                }
                "TJ" => {
                    if let Some(PdfValue::Array(items)) = op.operands.first() {
                        let (text, advance) = self.decode_tj(page_id, &state, items);
                        state.show(text, advance, &mut spans);
                    }
                }
                "'" | "\"" => {
                    if op.operator == "\"" {
                        state.word_spacing = op.number(0, state.word_spacing);
                        state.char_spacing = op.number(1, state.char_spacing);
                    }
                    state.next_line();
                    let idx = if op.operator == "\"" { 2 } else { 0 };
                    if let Some(PdfValue::Str(bytes)) = op.operands.get(idx) {
                        let (text, advance) = self.decode_str(page_id, &state, bytes);
                        state.show(text, advance, &mut spans);
                    }
                }
                _ => {}
            }
        }

        spans
    }

    /// Decode one string operand and measure its advance in text space.
    fn decode_str(&self, page_id: PageId, state: &TextState, bytes: &[u8]) -> (String, f32) {
        let text = self.backend.decode_text(page_id, &state.font_key, bytes);
        let glyphs = self
            .backend
            .glyph_widths(page_id, &state.font_key, bytes)
            .unwrap_or_else(|| text.chars().count() as f32 * ESTIMATED_GLYPH_WIDTH);

        let chars = text.chars().count() as f32;
        let spaces = text.chars().filter(|&c| c == ' ').count() as f32;
        let advance = glyphs / 1000.0 * state.font_size
            + chars * state.char_spacing
            + spaces * state.word_spacing;
        (text, advance)
    }

    /// Decode a TJ array, turning large negative adjustments into spaces.
    fn decode_tj(&self, page_id: PageId, state: &TextState, items: &[PdfValue]) -> (String, f32) {
        let mut combined = String::new();
        let mut advance = 0.0;
        for item in items {
            match item {
                PdfValue::Str(bytes) => {
                    let (text, width) = self.decode_str(page_id, state, bytes);
                    combined.push_str(&text);
                    advance += width;
                }
                PdfValue::Number(n) => {
                    advance -= n / 1000.0 * state.font_size;
                    if -*n > TJ_SPACE_THRESHOLD {
                        if let Some(last) = combined.chars().last() {
                            if !last.is_whitespace() && !is_spaceless_script_char(last) {
                                combined.push(' ');
                            }
                        }
                    }
                }
                _ => {}
            }
        }
        (combined, advance)
    }
}

#[derive(Debug)]
struct TextState {
    in_text: bool,
    font: String,
    font_key: Vec<u8>,
    font_size: f32,
    leading: f32,
    char_spacing: f32,
    word_spacing: f32,
    /// Start of the current line; only line moves and `Tm` change it.
    line_matrix: TextMatrix,
    /// Current glyph origin; advanced by every shown string.
    matrix: TextMatrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            in_text: false,
            font: String::new(),
            font_key: Vec::new(),
            font_size: DEFAULT_FONT_SIZE,
            leading: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            line_matrix: TextMatrix::default(),
            matrix: TextMatrix::default(),
        }
    }
}

impl TextState {
    fn set_matrix(&mut self, matrix: TextMatrix) {
        self.line_matrix = matrix;
        self.matrix = matrix;
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix.translate(tx, ty);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = if self.leading > 0.0 {
            self.leading
        } else {
            self.font_size * 1.2
        };
        self.move_line(0.0, -leading);
    }

    /// Emit a span for `text` and move the glyph origin past it.
    fn show(&mut self, text: String, advance: f32, spans: &mut Vec<PositionedSpan>) {
        if !self.in_text {
            return;
        }
        let (x, y) = self.matrix.position();
        self.matrix.translate(advance, 0.0);
        if text.trim().is_empty() {
            return;
        }
        spans.push(PositionedSpan {
            text,
            x,
            y,
            width: advance * self.matrix.horizontal_scale(),
            size: self.font_size * self.matrix.vertical_scale(),
            font: self.font.clone(),
        });
    }
}

/// Text matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy)]
struct TextMatrix {
    m: [f32; 6],
}

impl Default for TextMatrix {
    fn default() -> Self {
        Self {
            m: [1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        }
    }
}

impl TextMatrix {
    fn translate(&mut self, tx: f32, ty: f32) {
        let [a, b, c, d, e, f] = self.m;
        self.m[4] = e + tx * a + ty * c;
        self.m[5] = f + tx * b + ty * d;
    }

    fn position(&self) -> (f32, f32) {
        (self.m[4], self.m[5])
    }

    fn horizontal_scale(&self) -> f32 {
        let scale = (self.m[0] * self.m[0] + self.m[1] * self.m[1]).sqrt();
        if scale > 0.0 {
            scale
        } else {
            1.0
        }
    }

    fn vertical_scale(&self) -> f32 {
        let scale = (self.m[2] * self.m[2] + self.m[3] * self.m[3]).sqrt();
        if scale > 0.0 {
            scale
        } else {
            1.0
        }
    }
}

/// A vertical text column of a page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Column {
    pub left: f32,
    pub right: f32,
}

impl Column {
    /// Whether a span's left edge or center falls in this column.
    pub fn contains_span(&self, span: &PositionedSpan) -> bool {
        let center = span.x + span.width / 2.0;
        self.contains(span.x) || self.contains(center)
    }

    fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }
}

/// Width of the occupancy slices used to look for a gutter.
const SLICE_WIDTH: f32 = 3.0;

/// Split a page into one or two columns at its widest central gutter.
///
/// Returns columns left to right. Narrow text blocks, small gaps and
/// lopsided splits all give a single column.
pub fn detect_columns(spans: &[PositionedSpan]) -> Vec<Column> {
    if spans.is_empty() {
        return vec![];
    }

    let min_x = spans.iter().map(|s| s.x).fold(f32::INFINITY, f32::min);
    let max_x = spans.iter().map(|s| s.end_x()).fold(f32::NEG_INFINITY, f32::max);
    let single = vec![Column {
        left: min_x - 10.0,
        right: max_x + 10.0,
    }];

    let text_width = max_x - min_x;
    if text_width < 250.0 {
        return single;
    }

    let num_slices = (text_width / SLICE_WIDTH) as usize + 1;
    let mut occupancy = vec![0usize; num_slices];
    for span in spans {
        let start = ((span.x - min_x) / SLICE_WIDTH) as usize;
        let end = ((span.end_x() - min_x) / SLICE_WIDTH) as usize;
        for slot in occupancy
            .iter_mut()
            .take(end.min(num_slices - 1) + 1)
            .skip(start)
        {
            *slot += 1;
        }
    }

    // Look for runs of empty slices in the middle 70% of the text block.
    let search_start = num_slices * 15 / 100;
    let search_end = num_slices * 85 / 100;
    let center = num_slices / 2;

    let mut best: Option<(usize, usize)> = None;
    let mut best_center_dist = usize::MAX;
    let mut consider = |start: usize, len: usize| {
        let width = len as f32 * SLICE_WIDTH;
        if width < 10.0 {
            return;
        }
        let best_width = best.map_or(0.0, |(_, l)| l as f32 * SLICE_WIDTH);
        let center_dist = (start + len / 2).abs_diff(center);
        if width > best_width * 1.5 || (width >= best_width * 0.7 && center_dist < best_center_dist) {
            best = Some((start, len));
            best_center_dist = center_dist;
        }
    };

    let mut run_start = search_start;
    let mut run_len = 0;
    for (i, &count) in occupancy
        .iter()
        .enumerate()
        .take(search_end)
        .skip(search_start)
    {
        if count == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
        } else if run_len > 0 {
            consider(run_start, run_len);
            run_len = 0;
        }
    }
    if run_len > 0 {
        consider(run_start, run_len);
    }

    let Some((gap_start, gap_len)) = best else {
        return single;
    };
    if (gap_len as f32 * SLICE_WIDTH) < 12.0 {
        return single;
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * SLICE_WIDTH;
    if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
        log::debug!("column too narrow at gutter x={:.1}, single column", gutter);
        return single;
    }

    let left_spans = spans.iter().filter(|s| s.x + s.width / 2.0 < gutter).count();
    let right_spans = spans.len() - left_spans;
    let min_spans = (spans.len() / 10).max(2);
    if left_spans < min_spans || right_spans < min_spans {
        log::debug!(
            "spans too imbalanced ({} / {}), single column",
            left_spans,
            right_spans
        );
        return single;
    }

    log::debug!("two columns split at x={:.1}", gutter);
    vec![
        Column {
            left: min_x - 10.0,
            right: gutter,
        },
        Column {
            left: gutter,
            right: max_x + 10.0,
        },
    ]
}

/// Group spans into lines, column by column.
///
/// Within a column lines run top to bottom and spans left to right.
/// Adjacent spans of one font and size with no word gap between them are
/// merged into a single run.
pub fn group_into_lines(spans: Vec<PositionedSpan>) -> Vec<Vec<PositionedSpan>> {
    let columns = detect_columns(&spans);
    let mut buckets: Vec<Vec<PositionedSpan>> = vec![Vec::new(); columns.len()];
    for span in spans {
        let idx = columns
            .iter()
            .position(|c| c.contains_span(&span))
            .unwrap_or(columns.len() - 1);
        buckets[idx].push(span);
    }

    buckets
        .into_iter()
        .flat_map(group_by_baseline)
        .map(merge_runs)
        .collect()
}

fn group_by_baseline(mut spans: Vec<PositionedSpan>) -> Vec<Vec<PositionedSpan>> {
    spans.sort_by(|a, b| {
        b.y.partial_cmp(&a.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });

    let mut lines: Vec<Vec<PositionedSpan>> = Vec::new();
    let mut current: Vec<PositionedSpan> = Vec::new();
    let mut baseline: Option<f32> = None;

    for span in spans {
        let same_line = baseline
            .map(|y| (span.y - y).abs() <= span.size * BASELINE_TOLERANCE)
            .unwrap_or(false);
        if !same_line && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !same_line {
            baseline = Some(span.y);
        }
        current.push(span);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    for line in &mut lines {
        line.sort_by(|a, b| a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal));
    }
    lines
}

/// Join same-style spans that abut into one run.
fn merge_runs(line: Vec<PositionedSpan>) -> Vec<PositionedSpan> {
    let mut merged: Vec<PositionedSpan> = Vec::with_capacity(line.len());
    for span in line {
        if let Some(prev) = merged.last_mut() {
            let same_style = prev.font == span.font && (prev.size - span.size).abs() < 0.05;
            let gap = span.x - prev.end_x();
            let char_width = prev.avg_char_width();
            // Overprinted duplicates start near the previous span's origin.
            if same_style && gap <= char_width * WORD_GAP_RATIO && gap > -char_width {
                prev.text.push_str(&span.text);
                prev.width = span.end_x().max(prev.end_x()) - prev.x;
                continue;
            }
        }
        merged.push(span);
    }
    merged
}

/// Scripts written without spaces between words (Han, kana).
fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2EBEF
        | 0x3040..=0x30FF
        | 0x3000..=0x303F)
}
