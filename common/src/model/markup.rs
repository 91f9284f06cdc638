//! # Structured document markup
//!
//! Templates store their editable content as a small HTML-like markup in which
//! substitutable values appear as `{{key}}` placeholders. This module parses that
//! markup into an immutable tree of [`Node`]s and serializes it back.
//!
//! Parsing is lossless: every byte of the input ends up in exactly one node, so
//! `StructuredDocument::parse(m).to_markup() == m` holds for any input, including
//! malformed markup (stray closing tags, unterminated comments and a lone `<`
//! all survive verbatim).
//!
//! The editable form ([`to_editable`]) additionally lifts every placeholder whose
//! key belongs to the [`FieldKey`] vocabulary into an atomic [`FieldMarker`]
//! node. [`from_editable`] writes markers back as placeholders, making the pair
//! an exact inverse. Keeping the cursor out of a marker is the editor's job; the
//! tree only guarantees a marker is never split.

use crate::model::place_holder::{FieldKey, PLACEHOLDER_PREFIX, PLACEHOLDER_SUFFIX};
use serde::{Deserialize, Serialize};

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: [&str; 12] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "wbr",
];

/// Elements that start a new block when laid out or flattened to text.
const BLOCK_ELEMENTS: [&str; 16] = [
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "li", "ul", "ol", "blockquote", "section",
    "article", "br", "hr",
];

/// Seed content for a freshly created editable template.
pub const DEFAULT_CONTENT: &str = r#"<p style="text-align: center;"><strong>PERFORMANCE AGREEMENT</strong></p>
<p style="text-align: center;">{{project_title}}</p>
<p>This Performance Agreement ("Agreement") is between the undersigned vendor ("Vendor") and the client named below ("Client"). It becomes effective once both parties have signed.</p>
<p><strong>1. Engagement</strong></p>
<p>The Vendor will perform at the event described below, for the package selected by the Client.</p>
<p><strong>2. Fee &amp; Deposit</strong></p>
<p>The total fee is {{performance_fee}}. A deposit of half the fee is invoiced once this Agreement is fully signed; the balance is due before the event.</p>
<p><strong>3. Cancellation</strong></p>
<p>The deposit is non-refundable. Cancellations made less than 30 days before the event are charged the full fee.</p>
<p>Client details:</p>
<p>Full Legal Name: {{client_name}}</p>
<p>Email: {{client_email}}</p>
<p>Phone: {{client_phone}}</p>
<p>Wedding/Event Date: {{wedding_date}}</p>
<p>Venue: {{venue}}</p>
<p>Package: {{package_type}} — Performance Fee: {{performance_fee}}</p>
<p>{{signature_client}}</p>
<p>VENDOR</p>
<p>{{signature_vendor}}</p>"#;

/// An atomic stand-in for a merge field or a signature slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMarker {
    pub key: FieldKey,
    pub label: String,
}

impl FieldMarker {
    pub fn new(key: FieldKey) -> Self {
        FieldMarker {
            key,
            label: key.label().to_string(),
        }
    }
}

/// An element together with the exact source text of its tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Lower-cased tag name.
    pub name: String,
    /// The opening tag exactly as written, attributes included.
    pub open_tag: String,
    pub children: Vec<Node>,
    /// The closing tag exactly as written; `None` for void or unclosed elements.
    pub close_tag: Option<String>,
}

impl Element {
    /// Value of attribute `name` on the opening tag, if present.
    pub fn attribute(&self, name: &str) -> Option<String> {
        attribute(&self.open_tag, name)
    }

    pub fn is_block(&self) -> bool {
        is_block(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Element(Element),
    /// Character data, still entity-escaped as it appeared in the markup.
    Text { raw: String },
    Field(FieldMarker),
    /// Comments, declarations and stray closing tags, kept verbatim.
    Raw { raw: String },
}

/// How field markers are written when a tree is serialized.
#[derive(Clone, Copy)]
enum FieldOutput {
    Placeholder,
    EditorSpan,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    pub nodes: Vec<Node>,
}

impl StructuredDocument {
    /// Parses markup into a tree. Placeholders stay plain text.
    pub fn parse(markup: &str) -> Self {
        Parser::default().run(markup)
    }

    /// Serializes the tree back to stored markup, markers as `{{key}}`.
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, FieldOutput::Placeholder, &mut out);
        out
    }

    /// Serializes the tree for the editing surface, markers as
    /// `<span data-merge="key" contenteditable="false">Label</span>`.
    pub fn to_editor_html(&self) -> String {
        let mut out = String::new();
        write_nodes(&self.nodes, FieldOutput::EditorSpan, &mut out);
        out
    }

    /// All field markers in document order.
    pub fn fields(&self) -> Vec<&FieldMarker> {
        let mut fields = Vec::new();
        collect_fields(&self.nodes, &mut fields);
        fields
    }

    /// Decoded text with one line per block, for previews and assertions.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        flatten_text(&self.nodes, &mut out);
        out.lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Returns a copy with every field marker replaced by `f(marker)` as text.
    /// The replacement is inserted as already-escaped markup.
    pub fn map_fields<F>(&self, f: F) -> StructuredDocument
    where
        F: Fn(&FieldMarker) -> String,
    {
        StructuredDocument {
            nodes: map_field_nodes(&self.nodes, &f),
        }
    }
}

/// Lifts every known `{{key}}` placeholder in `markup` into a [`FieldMarker`].
/// Unknown keys and unmatched delimiters stay literal text.
pub fn to_editable(markup: &str) -> StructuredDocument {
    let parsed = StructuredDocument::parse(markup);
    StructuredDocument {
        nodes: lift_placeholders(parsed.nodes),
    }
}

/// Inverse of [`to_editable`]: markers become `{{key}}` again, nothing else changes.
pub fn from_editable(document: &StructuredDocument) -> String {
    document.to_markup()
}

/// Converts editor HTML back into stored markup: every element carrying a
/// `data-merge` attribute becomes the `{{key}}` placeholder for that key.
pub fn editor_html_to_markup(html: &str) -> String {
    let parsed = StructuredDocument::parse(html);
    let nodes = lift_editor_spans(parsed.nodes);
    StructuredDocument { nodes }.to_markup()
}

/// Whether `name` starts a new block in layout.
pub fn is_block(name: &str) -> bool {
    BLOCK_ELEMENTS.contains(&name)
}

/// Escapes text for inclusion in markup.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Decodes the character references that appear in stored markup.
/// Unknown or malformed references are kept as written.
pub fn decode_entities(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let candidate = &rest[amp..];
        let decoded = candidate
            .find(';')
            .filter(|&end| end <= 10)
            .and_then(|end| decode_reference(&candidate[1..end]).map(|ch| (ch, end)));
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &candidate[end + 1..];
            }
            None => {
                out.push('&');
                rest = &candidate[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" | "#39" => Some('\''),
        "nbsp" => Some('\u{00A0}'),
        "mdash" => Some('—'),
        "ndash" => Some('–'),
        _ => {
            let number = name.strip_prefix('#')?;
            let code = match number.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
    }
}

/// Reads attribute `name` from a raw opening tag such as `<p style="x">`.
pub fn attribute(open_tag: &str, name: &str) -> Option<String> {
    let inner = open_tag
        .strip_prefix('<')?
        .trim_end_matches('>')
        .trim_end_matches('/');
    let chars: Vec<char> = inner.chars().collect();
    let mut i = 0;
    // skip the tag name
    while i < chars.len() && !chars[i].is_whitespace() {
        i += 1;
    }
    while i < chars.len() {
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let start = i;
        while i < chars.len() && !chars[i].is_whitespace() && chars[i] != '=' {
            i += 1;
        }
        let attr_name: String = chars[start..i].iter().collect();
        if attr_name.is_empty() {
            i += 1;
            continue;
        }
        while i < chars.len() && chars[i].is_whitespace() {
            i += 1;
        }
        let mut value = String::new();
        if i < chars.len() && chars[i] == '=' {
            i += 1;
            while i < chars.len() && chars[i].is_whitespace() {
                i += 1;
            }
            if i < chars.len() && (chars[i] == '"' || chars[i] == '\'') {
                let quote = chars[i];
                i += 1;
                let value_start = i;
                while i < chars.len() && chars[i] != quote {
                    i += 1;
                }
                value = chars[value_start..i].iter().collect();
                i += 1;
            } else {
                let value_start = i;
                while i < chars.len() && !chars[i].is_whitespace() {
                    i += 1;
                }
                value = chars[value_start..i].iter().collect();
            }
        }
        if attr_name.eq_ignore_ascii_case(name) {
            return Some(decode_entities(&value));
        }
    }
    None
}

enum Token {
    Raw,
    Open { name: String, void: bool },
    Close { name: String },
}

#[derive(Default)]
struct Parser {
    root: Vec<Node>,
    stack: Vec<Element>,
}

impl Parser {
    fn run(mut self, markup: &str) -> StructuredDocument {
        let mut pos = 0;
        let mut text_start = 0;
        while let Some(offset) = markup[pos..].find('<') {
            let start = pos + offset;
            match classify(&markup[start..]) {
                Some((token, len)) => {
                    if start > text_start {
                        self.push_text(&markup[text_start..start]);
                    }
                    let source = &markup[start..start + len];
                    self.apply(token, source);
                    pos = start + len;
                    text_start = pos;
                }
                None => pos = start + 1,
            }
        }
        if text_start < markup.len() {
            self.push_text(&markup[text_start..]);
        }
        while let Some(element) = self.stack.pop() {
            self.children().push(Node::Element(element));
        }
        StructuredDocument { nodes: self.root }
    }

    fn children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(element) => &mut element.children,
            None => &mut self.root,
        }
    }

    fn push_text(&mut self, text: &str) {
        let children = self.children();
        if let Some(Node::Text { raw }) = children.last_mut() {
            raw.push_str(text);
        } else {
            children.push(Node::Text {
                raw: text.to_string(),
            });
        }
    }

    fn apply(&mut self, token: Token, source: &str) {
        match token {
            Token::Raw => self.children().push(Node::Raw {
                raw: source.to_string(),
            }),
            Token::Open { name, void } => {
                let element = Element {
                    name,
                    open_tag: source.to_string(),
                    children: Vec::new(),
                    close_tag: None,
                };
                if void {
                    self.children().push(Node::Element(element));
                } else {
                    self.stack.push(element);
                }
            }
            Token::Close { name } => {
                match self.stack.iter().rposition(|open| open.name == name) {
                    Some(index) => {
                        // elements opened after the matching one close implicitly
                        while self.stack.len() > index + 1 {
                            if let Some(unclosed) = self.stack.pop() {
                                self.children().push(Node::Element(unclosed));
                            }
                        }
                        if let Some(mut element) = self.stack.pop() {
                            element.close_tag = Some(source.to_string());
                            self.children().push(Node::Element(element));
                        }
                    }
                    None => self.children().push(Node::Raw {
                        raw: source.to_string(),
                    }),
                }
            }
        }
    }
}

/// Recognizes the construct starting at a `<`. `None` means the `<` is literal text.
fn classify(rest: &str) -> Option<(Token, usize)> {
    if rest.starts_with("<!--") {
        let len = rest.find("-->").map(|end| end + 3).unwrap_or(rest.len());
        return Some((Token::Raw, len));
    }
    if let Some(after) = rest.strip_prefix("</") {
        if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return None;
        }
        let end = rest.find('>')?;
        let name = tag_name(after);
        return Some((Token::Close { name }, end + 1));
    }
    if rest.starts_with("<!") || rest.starts_with("<?") {
        let end = rest.find('>')?;
        return Some((Token::Raw, end + 1));
    }
    let after = &rest[1..];
    if !after.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let end = find_tag_end(rest)?;
    let name = tag_name(after);
    let self_closing = rest[..end].ends_with('/');
    let void = self_closing || VOID_ELEMENTS.contains(&name.as_str());
    Some((Token::Open { name, void }, end + 1))
}

fn tag_name(after_bracket: &str) -> String {
    after_bracket
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Byte index of the `>` closing an opening tag, skipping quoted attribute values.
fn find_tag_end(tag: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (index, ch) in tag.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if ch == '>' => return Some(index),
            None => {}
        }
    }
    None
}

fn write_nodes(nodes: &[Node], fields: FieldOutput, out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => {
                out.push_str(&element.open_tag);
                write_nodes(&element.children, fields, out);
                if let Some(close) = &element.close_tag {
                    out.push_str(close);
                }
            }
            Node::Text { raw } | Node::Raw { raw } => out.push_str(raw),
            Node::Field(marker) => match fields {
                FieldOutput::Placeholder => out.push_str(&marker.key.placeholder()),
                FieldOutput::EditorSpan => {
                    out.push_str(&format!(
                        r#"<span data-merge="{}" contenteditable="false">{}</span>"#,
                        marker.key.key(),
                        escape_text(&marker.label)
                    ));
                }
            },
        }
    }
}

fn collect_fields<'a>(nodes: &'a [Node], out: &mut Vec<&'a FieldMarker>) {
    for node in nodes {
        match node {
            Node::Element(element) => collect_fields(&element.children, out),
            Node::Field(marker) => out.push(marker),
            Node::Text { .. } | Node::Raw { .. } => {}
        }
    }
}

fn flatten_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Element(element) => {
                let block = element.is_block();
                if block {
                    out.push('\n');
                }
                flatten_text(&element.children, out);
                if block {
                    out.push('\n');
                }
            }
            Node::Text { raw } => out.push_str(&decode_entities(raw)),
            Node::Field(marker) => out.push_str(&marker.key.placeholder()),
            Node::Raw { .. } => {}
        }
    }
}

fn map_field_nodes<F>(nodes: &[Node], f: &F) -> Vec<Node>
where
    F: Fn(&FieldMarker) -> String,
{
    let mut out: Vec<Node> = Vec::with_capacity(nodes.len());
    for node in nodes {
        let mapped = match node {
            Node::Element(element) => Node::Element(Element {
                children: map_field_nodes(&element.children, f),
                ..element.clone()
            }),
            Node::Field(marker) => Node::Text { raw: f(marker) },
            other => other.clone(),
        };
        push_merging_text(&mut out, mapped);
    }
    out
}

fn push_merging_text(out: &mut Vec<Node>, node: Node) {
    if let Node::Text { raw } = &node {
        if let Some(Node::Text { raw: previous }) = out.last_mut() {
            previous.push_str(raw);
            return;
        }
    }
    out.push(node);
}

fn lift_placeholders(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(mut element) => {
                element.children = lift_placeholders(element.children);
                out.push(Node::Element(element));
            }
            Node::Text { raw } => out.extend(split_placeholders(&raw)),
            other => out.push(other),
        }
    }
    out
}

fn split_placeholders(raw: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut literal = String::new();
    let mut rest = raw;
    while let Some(start) = rest.find(PLACEHOLDER_PREFIX) {
        let after = &rest[start + PLACEHOLDER_PREFIX.len()..];
        let Some(end) = after.find(PLACEHOLDER_SUFFIX) else {
            break;
        };
        match FieldKey::from_key(&after[..end]) {
            Some(key) => {
                literal.push_str(&rest[..start]);
                if !literal.is_empty() {
                    nodes.push(Node::Text {
                        raw: std::mem::take(&mut literal),
                    });
                }
                nodes.push(Node::Field(FieldMarker::new(key)));
                rest = &after[end + PLACEHOLDER_SUFFIX.len()..];
            }
            None => {
                // step over one brace so `{{{key}}}` still finds the inner placeholder
                literal.push_str(&rest[..start + 1]);
                rest = &rest[start + 1..];
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        nodes.push(Node::Text { raw: literal });
    }
    nodes
}

fn lift_editor_spans(nodes: Vec<Node>) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Element(mut element) => match element.attribute("data-merge") {
                Some(key) => {
                    let lifted = match FieldKey::from_key(&key) {
                        Some(field) => Node::Field(FieldMarker::new(field)),
                        None => Node::Text {
                            raw: format!("{}{}{}", PLACEHOLDER_PREFIX, key, PLACEHOLDER_SUFFIX),
                        },
                    };
                    push_merging_text(&mut out, lifted);
                }
                None => {
                    element.children = lift_editor_spans(element.children);
                    out.push(Node::Element(element));
                }
            },
            other => push_merging_text(&mut out, other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: [&str; 8] = [
        "",
        "plain text with {{client_name}}",
        "<p>Hello <strong>{{client_name}}</strong>, see you on {{wedding_date}}.</p>",
        "<p style=\"text-align: center;\"><em>{{unknown_key}}</em> {{venue</p>",
        "<div><p>unclosed <b>bold<i>italic</div> tail</p><br/>{{signature_client}}",
        "a < b && c > d <!-- note {{venue}} --> </span> {{{package_type}}}",
        "<p data-x='a>b'>{{performance_fee}}{{project_title}}</P>",
        "<!DOCTYPE html><ul><li>{{client_email}}<li>{{client_phone}}</ul><!-- open",
    ];

    #[test]
    fn parse_and_serialize_is_lossless() {
        for sample in SAMPLES {
            assert_eq!(StructuredDocument::parse(sample).to_markup(), sample);
        }
    }

    #[test]
    fn editable_round_trip_is_byte_exact() {
        for sample in SAMPLES {
            let editable = to_editable(sample);
            assert_eq!(from_editable(&editable), sample);
        }
        let default = to_editable(DEFAULT_CONTENT);
        assert_eq!(from_editable(&default), DEFAULT_CONTENT);
    }

    #[test]
    fn known_placeholders_become_markers() {
        let doc = to_editable("<p>Hello <strong>{{client_name}}</strong> at {{venue}}</p>");
        let keys: Vec<_> = doc.fields().iter().map(|f| f.key).collect();
        assert_eq!(keys, vec![FieldKey::ClientName, FieldKey::Venue]);
        assert_eq!(doc.fields()[0].label, "Client name");
    }

    #[test]
    fn unknown_and_unmatched_placeholders_stay_text() {
        let doc = to_editable("{{nope}} and {{venue");
        assert!(doc.fields().is_empty());
        assert_eq!(doc.plain_text(), "{{nope}} and {{venue");
    }

    #[test]
    fn triple_braces_still_find_the_inner_placeholder() {
        let doc = to_editable("{{{package_type}}}");
        assert_eq!(doc.fields().len(), 1);
        assert_eq!(from_editable(&doc), "{{{package_type}}}");
    }

    #[test]
    fn markers_are_not_lifted_from_comments_or_attributes() {
        let doc = to_editable("<a title=\"{{venue}}\">x</a><!-- {{client_name}} -->");
        assert!(doc.fields().is_empty());
    }

    #[test]
    fn stray_closing_tags_are_kept_raw() {
        let doc = StructuredDocument::parse("a</p>b");
        assert_eq!(
            doc.nodes,
            vec![
                Node::Text { raw: "a".into() },
                Node::Raw { raw: "</p>".into() },
                Node::Text { raw: "b".into() },
            ]
        );
    }

    #[test]
    fn unclosed_inner_elements_close_with_their_parent() {
        let doc = StructuredDocument::parse("<div><b>x</div>");
        let Node::Element(div) = &doc.nodes[0] else {
            panic!("expected element");
        };
        assert_eq!(div.close_tag.as_deref(), Some("</div>"));
        let Node::Element(bold) = &div.children[0] else {
            panic!("expected element");
        };
        assert_eq!(bold.name, "b");
        assert_eq!(bold.close_tag, None);
    }

    #[test]
    fn editor_html_spans_convert_back_to_placeholders() {
        let editable = to_editable("<p>Dear {{client_name}}, {{signature_vendor}}</p>");
        let html = editable.to_editor_html();
        assert!(html.contains(
            r#"<span data-merge="client_name" contenteditable="false">Client name</span>"#
        ));
        assert_eq!(
            editor_html_to_markup(&html),
            "<p>Dear {{client_name}}, {{signature_vendor}}</p>"
        );
    }

    #[test]
    fn editor_spans_with_unknown_keys_are_preserved_as_placeholders() {
        let html = r#"<p><span data-merge="shoe_size" contenteditable="false">Shoe</span></p>"#;
        assert_eq!(editor_html_to_markup(html), "<p>{{shoe_size}}</p>");
    }

    #[test]
    fn attributes_are_read_from_raw_tags() {
        let tag = r#"<p class=intro style="text-align: center;" data-merge='venue'>"#;
        assert_eq!(attribute(tag, "class").as_deref(), Some("intro"));
        assert_eq!(
            attribute(tag, "style").as_deref(),
            Some("text-align: center;")
        );
        assert_eq!(attribute(tag, "data-merge").as_deref(), Some("venue"));
        assert_eq!(attribute(tag, "id"), None);
    }

    #[test]
    fn entities_decode_and_escape() {
        assert_eq!(decode_entities("A &amp; B &lt;3 &#65;&#x42; &bogus; &"), "A & B <3 AB &bogus; &");
        assert_eq!(escape_text("A & <B>"), "A &amp; &lt;B&gt;");
    }

    #[test]
    fn plain_text_puts_blocks_on_separate_lines() {
        let doc = StructuredDocument::parse("<p>One  <b>two</b></p><p>three</p>");
        assert_eq!(doc.plain_text(), "One two\nthree");
    }

    #[test]
    fn tree_serializes_as_tagged_json() {
        let doc = to_editable("<p>{{venue}}</p>");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["nodes"][0]["type"], "element");
        assert_eq!(json["nodes"][0]["children"][0]["type"], "field");
        assert_eq!(json["nodes"][0]["children"][0]["key"], "venue");
    }
}
