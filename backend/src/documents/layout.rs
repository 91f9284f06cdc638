//! Flow layout of structured markup onto a fixed-width canvas.
//!
//! The tree is first flattened into blocks of styled runs, then every block is
//! word-wrapped greedily into lines. The result is a list of positioned draw
//! items in canvas pixels plus the total height; the renderer rasterizes it.

use crate::documents::fonts::{FontBook, FontStyle};
use common::model::markup::{decode_entities, Element, Node, StructuredDocument};

/// Canvas geometry in pixels before upscaling: 210 mm at 96 dpi with 20 mm padding.
pub const CANVAS_WIDTH: f32 = 794.0;
pub const CANVAS_PADDING: f32 = 76.0;
pub const BASE_FONT_PX: f32 = 12.0;
pub const LINE_HEIGHT: f32 = 1.5;

const BULLET: &str = "\u{2022}";
const LIST_INDENT_EM: f32 = 2.0;
const SKIPPED_ELEMENTS: [&str; 4] = ["head", "script", "style", "title"];

#[derive(Debug, Clone, Copy)]
pub struct Metrics {
    pub width: f32,
    pub padding: f32,
    pub font_px: f32,
}

impl Metrics {
    /// Canvas metrics multiplied by `scale`.
    pub fn scaled(scale: f32) -> Self {
        Metrics {
            width: (CANVAS_WIDTH * scale).round(),
            padding: CANVAS_PADDING * scale,
            font_px: BASE_FONT_PX * scale,
        }
    }

    fn content_width(&self) -> f32 {
        (self.width - 2.0 * self.padding).max(1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    Paragraph,
    Heading(u8),
    ListItem,
    Rule,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Inline {
    bold: bool,
    italic: bool,
    underline: bool,
}

#[derive(Debug, Clone)]
struct Run {
    text: String,
    inline: Inline,
}

#[derive(Debug, Clone)]
struct Block {
    kind: BlockKind,
    align: Align,
    runs: Vec<Run>,
    /// Set by a `<br>` inside the block; forces a line break at that point.
    breaks: Vec<usize>,
}

impl Block {
    fn new(kind: BlockKind, align: Align) -> Self {
        Block {
            kind,
            align,
            runs: Vec::new(),
            breaks: Vec::new(),
        }
    }

    fn has_text(&self) -> bool {
        self.runs.iter().any(|run| !run.text.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawItem {
    Text {
        x: f32,
        y: f32,
        px: f32,
        style: FontStyle,
        underline: bool,
        text: String,
    },
    Rule {
        x0: f32,
        x1: f32,
        y: f32,
    },
}

#[derive(Debug, Clone)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub items: Vec<DrawItem>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn text_align(element: &Element) -> Option<Align> {
    let style = element.attribute("style")?.to_ascii_lowercase();
    style.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        if key.trim() != "text-align" {
            return None;
        }
        match value.trim() {
            "center" => Some(Align::Center),
            "right" | "end" => Some(Align::Right),
            "left" | "start" | "justify" => Some(Align::Left),
            _ => None,
        }
    })
}

#[derive(Default)]
struct Flattener {
    blocks: Vec<Block>,
    current: Option<Block>,
}

impl Flattener {
    fn flush(&mut self) {
        if let Some(block) = self.current.take() {
            self.blocks.push(block);
        }
    }

    fn current(&mut self, align: Align) -> &mut Block {
        self.current
            .get_or_insert_with(|| Block::new(BlockKind::Paragraph, align))
    }

    fn text(&mut self, text: String, inline: Inline, align: Align) {
        let starts_block = self.current.as_ref().map_or(true, |b| b.runs.is_empty());
        if starts_block && text.trim().is_empty() {
            return;
        }
        self.current(align).runs.push(Run { text, inline });
    }

    fn walk(&mut self, nodes: &[Node], inline: Inline, align: Align) {
        for node in nodes {
            match node {
                Node::Text { raw } => self.text(decode_entities(raw), inline, align),
                Node::Field(marker) => self.text(marker.key.placeholder(), inline, align),
                Node::Raw { .. } => {}
                Node::Element(element) => self.element(element, inline, align),
            }
        }
    }

    fn element(&mut self, element: &Element, inline: Inline, align: Align) {
        let name = element.name.as_str();
        if SKIPPED_ELEMENTS.contains(&name) {
            return;
        }
        match name {
            "br" => {
                let block = self.current(align);
                let at = block.runs.len();
                block.breaks.push(at);
            }
            "hr" => {
                self.flush();
                self.blocks.push(Block::new(BlockKind::Rule, align));
            }
            _ if element.is_block() => {
                let align = text_align(element).unwrap_or(align);
                let kind = match name {
                    "h1" => BlockKind::Heading(1),
                    "h2" => BlockKind::Heading(2),
                    "h3" | "h4" | "h5" | "h6" => BlockKind::Heading(3),
                    "li" => BlockKind::ListItem,
                    _ => BlockKind::Paragraph,
                };
                let inline = match kind {
                    BlockKind::Heading(_) => Inline { bold: true, ..inline },
                    _ => inline,
                };
                self.flush();
                let is_container = matches!(name, "ul" | "ol" | "section" | "article" | "blockquote")
                    || element.children.iter().any(|child| matches!(child, Node::Element(e) if e.is_block() && e.name != "br"));
                if is_container && kind == BlockKind::Paragraph {
                    self.walk(&element.children, inline, align);
                    self.flush();
                    return;
                }
                self.current = Some(Block::new(kind, align));
                self.walk(&element.children, inline, align);
                self.flush();
            }
            _ => {
                let inline = match name {
                    "strong" | "b" => Inline { bold: true, ..inline },
                    "em" | "i" => Inline { italic: true, ..inline },
                    "u" => Inline { underline: true, ..inline },
                    _ => inline,
                };
                self.walk(&element.children, inline, align);
            }
        }
    }
}

/// A word or a space with its style, the unit of wrapping.
#[derive(Debug, Clone)]
struct Piece {
    text: String,
    inline: Inline,
    space: bool,
    hard_break: bool,
}

fn pieces(block: &Block) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    for (index, run) in block.runs.iter().enumerate() {
        if block.breaks.contains(&index) {
            out.push(Piece {
                text: String::new(),
                inline: run.inline,
                space: false,
                hard_break: true,
            });
        }
        let mut word = String::new();
        for ch in run.text.chars() {
            if ch.is_whitespace() && ch != '\u{00A0}' {
                if !word.is_empty() {
                    out.push(Piece {
                        text: std::mem::take(&mut word),
                        inline: run.inline,
                        space: false,
                        hard_break: false,
                    });
                }
                let last_is_space = out.last().map_or(true, |p| p.space || p.hard_break);
                if !last_is_space {
                    out.push(Piece {
                        text: " ".to_string(),
                        inline: run.inline,
                        space: true,
                        hard_break: false,
                    });
                }
            } else {
                word.push(if ch == '\u{00A0}' { ' ' } else { ch });
            }
        }
        if !word.is_empty() {
            out.push(Piece {
                text: word,
                inline: run.inline,
                space: false,
                hard_break: false,
            });
        }
    }
    let trailing = block.breaks.iter().filter(|&&at| at >= block.runs.len()).count();
    for _ in 0..trailing {
        out.push(Piece {
            text: String::new(),
            inline: Inline::default(),
            space: false,
            hard_break: true,
        });
    }
    out
}

struct Segment {
    text: String,
    inline: Inline,
    width: f32,
}

fn style_of(inline: Inline) -> FontStyle {
    FontStyle::new(inline.bold, inline.italic)
}

/// Greedy line breaking; spaces at line ends are dropped.
fn wrap(pieces: Vec<Piece>, fonts: &FontBook, px: f32, max_width: f32) -> Vec<Vec<Segment>> {
    let mut lines: Vec<Vec<Segment>> = vec![Vec::new()];
    let mut line_width = 0.0;
    for piece in pieces {
        if piece.hard_break {
            trim_trailing_space(lines.last_mut());
            lines.push(Vec::new());
            line_width = 0.0;
            continue;
        }
        let width = fonts.measure(style_of(piece.inline), px, &piece.text);
        let width = if piece.space && width <= 0.0 { px * 0.25 } else { width };
        let line_is_empty = lines.last().map_or(true, |l| l.is_empty());
        if piece.space && line_is_empty {
            continue;
        }
        if !piece.space && !line_is_empty && line_width + width > max_width {
            trim_trailing_space(lines.last_mut());
            lines.push(Vec::new());
            line_width = 0.0;
        }
        line_width += width;
        if let Some(line) = lines.last_mut() {
            line.push(Segment {
                text: piece.text,
                inline: piece.inline,
                width,
            });
        }
    }
    trim_trailing_space(lines.last_mut());
    lines
}

fn trim_trailing_space(line: Option<&mut Vec<Segment>>) {
    if let Some(line) = line {
        while line.last().map_or(false, |s| s.text == " ") {
            line.pop();
        }
    }
}

fn heading_factor(level: u8) -> f32 {
    match level {
        1 => 2.0,
        2 => 1.5,
        _ => 1.17,
    }
}

/// Lays `document` out on a canvas described by `metrics`.
pub fn layout(document: &StructuredDocument, fonts: &FontBook, metrics: Metrics) -> Layout {
    let mut flattener = Flattener::default();
    flattener.walk(&document.nodes, Inline::default(), Align::Left);
    flattener.flush();

    let left = metrics.padding;
    let content_width = metrics.content_width();
    let mut y = metrics.padding;
    let mut items = Vec::new();

    for block in &flattener.blocks {
        let px = match block.kind {
            BlockKind::Heading(level) => metrics.font_px * heading_factor(level),
            _ => metrics.font_px,
        };
        let line_height = px * LINE_HEIGHT;
        let gap = px * 0.5;

        if block.kind == BlockKind::Rule {
            let rule_y = y + gap;
            items.push(DrawItem::Rule {
                x0: left,
                x1: left + content_width,
                y: rule_y,
            });
            y = rule_y + gap;
            continue;
        }

        let indent = if block.kind == BlockKind::ListItem {
            metrics.font_px * LIST_INDENT_EM
        } else {
            0.0
        };
        let available = (content_width - indent).max(px);

        if !block.has_text() {
            // An empty paragraph still takes up one line, like `<p><br></p>`.
            y += line_height;
            continue;
        }

        if block.kind == BlockKind::ListItem {
            items.push(DrawItem::Text {
                x: left + indent * 0.4,
                y: y + (line_height - px) / 2.0,
                px,
                style: FontStyle::Regular,
                underline: false,
                text: BULLET.to_string(),
            });
        }

        for line in wrap(pieces(block), fonts, px, available) {
            let line_width: f32 = line.iter().map(|s| s.width).sum();
            let mut x = left
                + indent
                + match block.align {
                    Align::Left => 0.0,
                    Align::Center => ((available - line_width) / 2.0).max(0.0),
                    Align::Right => (available - line_width).max(0.0),
                };
            let text_y = y + (line_height - px) / 2.0;
            for segment in line {
                if segment.text != " " || segment.inline.underline {
                    items.push(DrawItem::Text {
                        x,
                        y: text_y,
                        px,
                        style: style_of(segment.inline),
                        underline: segment.inline.underline,
                        text: segment.text,
                    });
                }
                x += segment.width;
            }
            y += line_height;
        }
        y += gap;
    }

    let height = if items.is_empty() {
        0
    } else {
        (y + metrics.padding).ceil() as u32
    };
    Layout {
        width: metrics.width as u32,
        height,
        items,
    }
}
