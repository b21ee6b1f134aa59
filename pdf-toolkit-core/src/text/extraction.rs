//! Positioned text extraction from PDF content streams
//!
//! Runs the text and path operators of a content stream and records every
//! shown string as a [`TextFragment`] in page space, together with the
//! vertical ruling lines drawn on the page. Form XObjects are followed
//! when a document is available.

use super::font::FontSet;
use crate::objects::{Dictionary, Object, ObjectId};
use crate::parser::content::{ContentOperation, ContentParser, TextElement};
use crate::parser::filters::decode_to_bytes;
use crate::parser::{ParseError, ParseResult};
use crate::Document;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Widest filled rectangle still treated as a rule
const MAX_RULE_WIDTH: f64 = 2.0;

/// Horizontal drift tolerated for a segment to count as vertical
const VERTICAL_SLACK: f64 = 1.0;

/// Nesting limit for form XObjects
const MAX_FORM_DEPTH: usize = 16;

/// A fragment of text with position information
#[derive(Debug, Clone, PartialEq)]
pub struct TextFragment {
    /// Text content
    pub text: String,
    /// X of the glyph origin in page coordinates
    pub x: f64,
    /// Y of the baseline in page coordinates
    pub y: f64,
    /// Advance width in page coordinates
    pub width: f64,
    /// Font size after the text and transformation matrices
    pub font_size: f64,
}

impl TextFragment {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }
}

/// A vertical line segment in page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RulingLine {
    pub x: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl RulingLine {
    /// Whether the line crosses height `y`, within `tolerance`
    pub fn spans(&self, y: f64, tolerance: f64) -> bool {
        self.y_min - tolerance <= y && y <= self.y_max + tolerance
    }
}

/// Text fragments and vertical rulings of one page, in content order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub fragments: Vec<TextFragment>,
    pub rulings: Vec<RulingLine>,
}

impl PageLayout {
    /// Plain text in content order: a newline when the baseline moves by
    /// more than half the font size, a space across visible gaps
    pub fn text(&self) -> String {
        let mut text = String::new();
        let mut previous: Option<&TextFragment> = None;

        for fragment in &self.fragments {
            if let Some(prev) = previous {
                if (fragment.y - prev.y).abs() > prev.font_size / 2.0 {
                    text.push('\n');
                } else if fragment.x > prev.right() + prev.font_size * 0.1 {
                    text.push(' ');
                }
            }
            text.push_str(&fragment.text);
            previous = Some(fragment);
        }

        text
    }
}

/// Layout of already parsed operators. Fonts come from `fonts`; form
/// XObjects are not followed.
pub fn extract_layout(operations: &[ContentOperation], fonts: &FontSet) -> PageLayout {
    let mut interpreter = Interpreter::new(None);
    // Without a document no operator can fail
    if let Err(e) = interpreter.run(operations, fonts, None) {
        tracing::debug!("Layout extraction stopped: {}", e);
    }
    interpreter.layout
}

/// Layout of page `page_id`, including text drawn by form XObjects.
/// A content stream that cannot be decoded fails the page.
pub fn extract_page_layout(document: &Document, page_id: ObjectId) -> ParseResult<PageLayout> {
    let content = document.page_contents(page_id)?;
    let operations = ContentParser::parse(&content)?;
    let resources = document.page_resources(page_id);
    let fonts = FontSet::from_resources(document, resources);

    let mut interpreter = Interpreter::new(Some(document));
    interpreter.run(&operations, &fonts, resources)?;

    tracing::trace!(
        "Page {} layout: {} fragments, {} rulings",
        page_id,
        interpreter.layout.fragments.len(),
        interpreter.layout.rulings.len()
    );
    Ok(interpreter.layout)
}

/// Graphics state entries that matter for text placement
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    char_space: f64,
    word_space: f64,
    horizontal_scale: f64,
    leading: f64,
    text_rise: f64,
    font_name: String,
    font_size: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: IDENTITY,
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scale: 100.0,
            leading: 0.0,
            text_rise: 0.0,
            font_name: String::new(),
            font_size: 0.0,
        }
    }
}

type Point = (f64, f64);

/// Current path in page coordinates
#[derive(Debug, Default)]
struct PathBuilder {
    current: Option<Point>,
    start: Option<Point>,
    segments: Vec<(Point, Point)>,
    rects: Vec<[Point; 4]>,
}

impl PathBuilder {
    fn move_to(&mut self, point: Point) {
        self.current = Some(point);
        self.start = Some(point);
    }

    fn line_to(&mut self, point: Point) {
        if let Some(current) = self.current {
            self.segments.push((current, point));
        }
        self.current = Some(point);
    }

    fn close(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.start) {
            self.segments.push((current, start));
            self.current = Some(start);
        }
    }

    fn take(&mut self) -> (Vec<(Point, Point)>, Vec<[Point; 4]>) {
        self.current = None;
        self.start = None;
        (
            std::mem::take(&mut self.segments),
            std::mem::take(&mut self.rects),
        )
    }
}

struct Interpreter<'a> {
    document: Option<&'a Document>,
    layout: PageLayout,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    text_matrix: Matrix,
    text_line_matrix: Matrix,
    path: PathBuilder,
    /// Form XObjects being executed
    forms: Vec<ObjectId>,
}

impl<'a> Interpreter<'a> {
    fn new(document: Option<&'a Document>) -> Self {
        Self {
            document,
            layout: PageLayout::default(),
            state: GraphicsState::default(),
            stack: Vec::new(),
            text_matrix: IDENTITY,
            text_line_matrix: IDENTITY,
            path: PathBuilder::default(),
            forms: Vec::new(),
        }
    }

    fn run(
        &mut self,
        operations: &[ContentOperation],
        fonts: &FontSet,
        resources: Option<&'a Dictionary>,
    ) -> ParseResult<()> {
        for op in operations {
            match op {
                ContentOperation::BeginText => {
                    self.text_matrix = IDENTITY;
                    self.text_line_matrix = IDENTITY;
                }
                ContentOperation::EndText => {}

                ContentOperation::SetCharSpacing(spacing) => {
                    self.state.char_space = f64::from(*spacing)
                }
                ContentOperation::SetWordSpacing(spacing) => {
                    self.state.word_space = f64::from(*spacing)
                }
                ContentOperation::SetHorizontalScaling(scale) => {
                    self.state.horizontal_scale = f64::from(*scale)
                }
                ContentOperation::SetLeading(leading) => self.state.leading = f64::from(*leading),
                ContentOperation::SetTextRise(rise) => self.state.text_rise = f64::from(*rise),
                ContentOperation::SetFont(name, size) => {
                    self.state.font_name = name.clone();
                    self.state.font_size = f64::from(*size);
                }

                ContentOperation::MoveText(tx, ty) => self.move_text(f64::from(*tx), f64::from(*ty)),
                ContentOperation::MoveTextSetLeading(tx, ty) => {
                    self.state.leading = -f64::from(*ty);
                    self.move_text(f64::from(*tx), f64::from(*ty));
                }
                ContentOperation::SetTextMatrix(a, b, c, d, e, f) => {
                    let matrix = [a, b, c, d, e, f].map(|v| f64::from(*v));
                    self.text_matrix = matrix;
                    self.text_line_matrix = matrix;
                }
                ContentOperation::NextLine => self.move_text(0.0, -self.state.leading),

                ContentOperation::ShowText(bytes) => self.show_text(bytes, fonts),
                ContentOperation::ShowTextArray(elements) => {
                    for element in elements {
                        match element {
                            TextElement::Text(bytes) => self.show_text(bytes, fonts),
                            TextElement::Spacing(adjustment) => {
                                // Positive values move left
                                let tx = -f64::from(*adjustment) / 1000.0
                                    * self.state.font_size
                                    * self.state.horizontal_scale
                                    / 100.0;
                                self.advance(tx);
                            }
                        }
                    }
                }
                ContentOperation::NextLineShowText(bytes) => {
                    self.move_text(0.0, -self.state.leading);
                    self.show_text(bytes, fonts);
                }
                ContentOperation::SetSpacingNextLineShowText(word_space, char_space, bytes) => {
                    self.state.word_space = f64::from(*word_space);
                    self.state.char_space = f64::from(*char_space);
                    self.move_text(0.0, -self.state.leading);
                    self.show_text(bytes, fonts);
                }

                ContentOperation::SaveGraphicsState => self.stack.push(self.state.clone()),
                ContentOperation::RestoreGraphicsState => {
                    if let Some(state) = self.stack.pop() {
                        self.state = state;
                    }
                }
                ContentOperation::SetTransformMatrix(a, b, c, d, e, f) => {
                    let matrix = [a, b, c, d, e, f].map(|v| f64::from(*v));
                    self.state.ctm = multiply_matrix(&matrix, &self.state.ctm);
                }

                ContentOperation::MoveTo(x, y) => {
                    let point = self.user_point(*x, *y);
                    self.path.move_to(point);
                }
                ContentOperation::LineTo(x, y) => {
                    let point = self.user_point(*x, *y);
                    self.path.line_to(point);
                }
                ContentOperation::CurveTo(_, _, _, _, x, y)
                | ContentOperation::CurveToV(_, _, x, y)
                | ContentOperation::CurveToY(_, _, x, y) => {
                    let point = self.user_point(*x, *y);
                    self.path.current = Some(point);
                }
                ContentOperation::ClosePath => self.path.close(),
                ContentOperation::Rectangle(x, y, width, height) => {
                    let (x, y, w, h) = (*x, *y, *width, *height);
                    let corners = [
                        self.user_point(x, y),
                        self.user_point(x + w, y),
                        self.user_point(x + w, y + h),
                        self.user_point(x, y + h),
                    ];
                    self.path.rects.push(corners);
                    self.path.move_to(corners[0]);
                }

                ContentOperation::Stroke => self.paint(true, false),
                ContentOperation::CloseStroke => {
                    self.path.close();
                    self.paint(true, false);
                }
                ContentOperation::Fill | ContentOperation::FillEvenOdd => self.paint(false, true),
                ContentOperation::FillStroke | ContentOperation::FillStrokeEvenOdd => {
                    self.paint(true, true)
                }
                ContentOperation::CloseFillStroke | ContentOperation::CloseFillStrokeEvenOdd => {
                    self.path.close();
                    self.paint(true, true);
                }
                ContentOperation::EndPath => {
                    self.path.take();
                }

                ContentOperation::PaintXObject(name) => self.paint_form(name, fonts, resources)?,
            }
        }

        Ok(())
    }

    fn move_text(&mut self, tx: f64, ty: f64) {
        let matrix = multiply_matrix(&[1.0, 0.0, 0.0, 1.0, tx, ty], &self.text_line_matrix);
        self.text_matrix = matrix;
        self.text_line_matrix = matrix;
    }

    fn advance(&mut self, tx: f64) {
        self.text_matrix = multiply_matrix(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &self.text_matrix);
    }

    fn user_point(&self, x: f32, y: f32) -> Point {
        transform_point(f64::from(x), f64::from(y), &self.state.ctm)
    }

    fn show_text(&mut self, bytes: &[u8], fonts: &FontSet) {
        let state = &self.state;
        let font = fonts.get(&state.font_name);
        let scale = state.horizontal_scale / 100.0;

        let mut text = String::new();
        let mut advance = 0.0;
        for glyph in font.glyphs(bytes) {
            let spacing = if glyph.is_space { state.word_space } else { 0.0 };
            advance +=
                (glyph.width / 1000.0 * state.font_size + state.char_space + spacing) * scale;
            text.push_str(&glyph.text);
        }

        let matrix = multiply_matrix(&self.text_matrix, &state.ctm);
        let (start_x, y) = transform_point(0.0, state.text_rise, &matrix);
        let (end_x, _) = transform_point(advance, state.text_rise, &matrix);
        let font_size = state.font_size * matrix[2].hypot(matrix[3]);

        if !text.trim().is_empty() {
            self.layout.fragments.push(TextFragment {
                text,
                x: start_x.min(end_x),
                y,
                width: (end_x - start_x).abs(),
                font_size,
            });
        }

        self.advance(advance);
    }

    /// Record vertical rulings of the current path and clear it
    fn paint(&mut self, stroke: bool, fill: bool) {
        let (segments, rects) = self.path.take();

        if stroke {
            let rect_edges = rects.iter().flat_map(|corners| {
                (0..4).map(move |i| (corners[i], corners[(i + 1) % 4]))
            });
            for (from, to) in segments.into_iter().chain(rect_edges) {
                if (from.0 - to.0).abs() <= VERTICAL_SLACK && (from.1 - to.1).abs() > VERTICAL_SLACK
                {
                    self.layout.rulings.push(RulingLine {
                        x: (from.0 + to.0) / 2.0,
                        y_min: from.1.min(to.1),
                        y_max: from.1.max(to.1),
                    });
                }
            }
        } else if fill {
            for corners in rects {
                let (min_x, max_x) = bounds(corners.iter().map(|p| p.0));
                let (min_y, max_y) = bounds(corners.iter().map(|p| p.1));
                let width = max_x - min_x;
                if width <= MAX_RULE_WIDTH && max_y - min_y > width {
                    self.layout.rulings.push(RulingLine {
                        x: (min_x + max_x) / 2.0,
                        y_min: min_y,
                        y_max: max_y,
                    });
                }
            }
        }
    }

    fn paint_form(
        &mut self,
        name: &str,
        fonts: &FontSet,
        resources: Option<&'a Dictionary>,
    ) -> ParseResult<()> {
        let Some(document) = self.document else {
            return Ok(());
        };
        let Some(Object::Reference(form_id)) = resources
            .and_then(|res| document.resolve_dict(res, "XObject"))
            .and_then(|xobjects| xobjects.get(name))
        else {
            return Ok(());
        };
        let form_id = *form_id;

        let Some(stream) = document.get(form_id).and_then(Object::as_stream) else {
            return Err(ParseError::dangling(form_id));
        };
        if stream.dict.get_name("Subtype") != Some("Form") {
            return Ok(());
        }
        if self.forms.contains(&form_id) || self.forms.len() >= MAX_FORM_DEPTH {
            tracing::debug!("Not re-entering form XObject {}", form_id);
            return Ok(());
        }

        let content = decode_to_bytes(stream)?;
        let operations = ContentParser::parse(&content)?;

        let form_resources = document.resolve_dict(&stream.dict, "Resources");
        let form_fonts;
        let (fonts, resources) = match form_resources {
            Some(own) => {
                form_fonts = FontSet::from_resources(document, Some(own));
                (&form_fonts, Some(own))
            }
            None => (fonts, resources),
        };

        let form_matrix = stream
            .dict
            .get("Matrix")
            .and_then(Object::as_array)
            .filter(|values| values.len() == 6)
            .map(|values| {
                let mut matrix = IDENTITY;
                for (slot, value) in matrix.iter_mut().zip(values) {
                    *slot = value.as_real().unwrap_or(*slot);
                }
                matrix
            })
            .unwrap_or(IDENTITY);

        let saved_state = self.state.clone();
        let saved_text = (self.text_matrix, self.text_line_matrix);
        self.state.ctm = multiply_matrix(&form_matrix, &self.state.ctm);
        self.forms.push(form_id);

        let result = self.run(&operations, fonts, resources);

        self.forms.pop();
        self.state = saved_state;
        (self.text_matrix, self.text_line_matrix) = saved_text;
        result
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

/// Multiply two transformation matrices
fn multiply_matrix(a: &Matrix, b: &Matrix) -> Matrix {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

/// Transform a point using a transformation matrix
fn transform_point(x: f64, y: f64, matrix: &Matrix) -> (f64, f64) {
    let tx = matrix[0] * x + matrix[2] * y + matrix[4];
    let ty = matrix[1] * x + matrix[3] * y + matrix[5];
    (tx, ty)
}
