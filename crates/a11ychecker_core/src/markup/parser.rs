//! Lenient HTML fragment parser.
//!
//! Supports the subset the editable produces: elements with quoted, unquoted
//! or bare attributes, void elements, raw text elements, text, comments and
//! basic entities. Stray end tags are dropped and open elements are closed
//! at end of input.

use crate::markup::{decode_entities, is_raw_text_element, is_void_element};
use crate::model::document::{Document, Element, NodeId, NodeKind};

const DEFAULT_ROOT_NAME: &str = "body";

/// Parses `html` as the children of a `<body>` root.
pub fn parse_fragment(html: &str) -> Document {
    parse_fragment_into(DEFAULT_ROOT_NAME, html)
}

/// Parses `html` as the children of a root element named `root_name`.
pub fn parse_fragment_into(root_name: &str, html: &str) -> Document {
    let document = Document::new(root_name);
    let root = document.root();
    let parser = FragmentParser {
        input: html,
        pos: 0,
        document,
        open: vec![root],
    };
    parser.run()
}

struct FragmentParser<'a> {
    input: &'a str,
    pos: usize,
    document: Document,
    open: Vec<NodeId>,
}

impl FragmentParser<'_> {
    fn run(mut self) -> Document {
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if rest.starts_with("<!--") {
                self.parse_comment();
            } else if rest.starts_with("</") {
                self.parse_end_tag();
            } else if rest.starts_with("<!") || rest.starts_with("<?") {
                self.skip_declaration();
            } else if rest.starts_with('<')
                && rest[1..].starts_with(|ch: char| ch.is_ascii_alphabetic())
            {
                self.parse_start_tag();
            } else {
                self.parse_text();
            }
        }
        self.document
    }

    fn current(&self) -> NodeId {
        self.open.last().copied().unwrap_or(self.document.root())
    }

    fn append(&mut self, node: NodeId) {
        let parent = self.current();
        // Freshly created nodes are detached, so append cannot fail here.
        let _ = self.document.append_child(parent, node);
    }

    fn push_text(&mut self, raw: &str) {
        if raw.is_empty() {
            return;
        }
        let text = decode_entities(raw);
        self.push_decoded_text(text);
    }

    fn push_decoded_text(&mut self, text: String) {
        let parent = self.current();
        if let Some(&last) = self.document.children(parent).last() {
            if let Some(previous) = self.document.text(last) {
                let merged = format!("{previous}{text}");
                let node = self.document.create_text(merged);
                let _ = self.document.detach(last);
                self.append(node);
                return;
            }
        }
        let node = self.document.create_text(text);
        self.append(node);
    }

    fn parse_text(&mut self) {
        let rest = &self.input[self.pos..];
        // A lone `<` that does not open a tag is plain text.
        let search_from = usize::from(rest.starts_with('<'));
        let end = rest[search_from..]
            .find('<')
            .map(|offset| offset + search_from)
            .unwrap_or(rest.len());
        self.push_text(&rest[..end]);
        self.pos += end;
    }

    fn parse_comment(&mut self) {
        let body_start = self.pos + 4;
        let rest = &self.input[body_start..];
        let (body, consumed) = match rest.find("-->") {
            Some(end) => (&rest[..end], end + 3),
            None => (rest, rest.len()),
        };
        let node = self.document.create_comment(body);
        self.append(node);
        self.pos = body_start + consumed;
    }

    fn skip_declaration(&mut self) {
        let rest = &self.input[self.pos..];
        self.pos += rest.find('>').map(|end| end + 1).unwrap_or(rest.len());
    }

    fn parse_end_tag(&mut self) {
        let rest = &self.input[self.pos + 2..];
        let name_len = tag_name_len(rest);
        let name = rest[..name_len].to_ascii_lowercase();
        self.pos += 2 + rest.find('>').map(|end| end + 1).unwrap_or(rest.len());

        if name.is_empty() {
            return;
        }
        let matching = self.open.iter().rposition(|open| {
            *open != self.document.root()
                && self
                    .document
                    .element(*open)
                    .is_some_and(|element| element.name() == name)
        });
        if let Some(index) = matching {
            self.open.truncate(index);
        }
    }

    fn parse_start_tag(&mut self) {
        let rest = &self.input[self.pos + 1..];
        let name_len = tag_name_len(rest);
        let mut element = Element::new(&rest[..name_len]);
        self.pos += 1 + name_len;

        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            let rest = &self.input[self.pos..];
            if rest.is_empty() {
                break;
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }
            self.parse_attribute(&mut element);
        }

        let name = element.name().to_string();
        let node = self.document.create_element(element);
        self.append(node);

        if self_closing || is_void_element(&name) {
            return;
        }
        if is_raw_text_element(&name) {
            self.parse_raw_text(node, &name);
            return;
        }
        self.open.push(node);
    }

    fn parse_attribute(&mut self, element: &mut Element) {
        let rest = &self.input[self.pos..];
        let name_len = rest
            .find(|ch: char| ch.is_whitespace() || ch == '=' || ch == '>' || ch == '/')
            .unwrap_or(rest.len())
            .max(rest.chars().next().map(char::len_utf8).unwrap_or(0));
        let name = rest[..name_len].to_ascii_lowercase();
        self.pos += name_len;

        self.skip_whitespace();
        let value = if self.input[self.pos..].starts_with('=') {
            self.pos += 1;
            self.skip_whitespace();
            self.parse_attribute_value()
        } else {
            String::new()
        };

        // First occurrence wins, as in browsers.
        if !element.has_attribute(&name) {
            element.set_attribute(name, value);
        }
    }

    fn parse_attribute_value(&mut self) -> String {
        let rest = &self.input[self.pos..];
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &rest[1..];
                let end = body.find(quote).unwrap_or(body.len());
                self.pos += 1 + end + usize::from(end < body.len());
                decode_entities(&body[..end])
            }
            _ => {
                let end = rest
                    .find(|ch: char| ch.is_whitespace() || ch == '>')
                    .unwrap_or(rest.len());
                self.pos += end;
                decode_entities(&rest[..end])
            }
        }
    }

    fn parse_raw_text(&mut self, node: NodeId, name: &str) {
        let rest = &self.input[self.pos..];
        let closing = format!("</{name}");
        let end = rest
            .to_ascii_lowercase()
            .find(&closing)
            .unwrap_or(rest.len());
        if end > 0 {
            let text = self.document.create_text(&rest[..end]);
            let _ = self.document.append_child(node, text);
        }
        self.pos += end;
        let after = &self.input[self.pos..];
        if !after.is_empty() {
            self.pos += after.find('>').map(|close| close + 1).unwrap_or(after.len());
        }
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
    }
}

fn tag_name_len(value: &str) -> usize {
    value
        .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '-' || ch == ':'))
        .unwrap_or(value.len())
}

/// Whether `document` holds only whitespace text and no elements.
pub fn is_blank(document: &Document) -> bool {
    document
        .children(document.root())
        .iter()
        .all(|child| match document.kind(*child) {
            Some(NodeKind::Text(text)) => text.trim().is_empty(),
            Some(NodeKind::Comment(_)) => true,
            _ => false,
        })
}
