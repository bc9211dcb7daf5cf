use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use thiserror::Error;

/// Maximum element nesting depth accepted in a feed document.
const MAX_FEED_DEPTH: usize = 256;

/// Errors that make a feed body unusable as XML.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying XML reader rejected the document.
    #[error("XML parse error {0}")]
    Xml(String),

    /// The document ended while elements were still open.
    #[error("Unexpected end of document: {0} element(s) left open")]
    UnclosedElements(usize),

    /// The input contained no element at all.
    #[error("Document has no root element")]
    NoRootElement,

    /// Nesting depth exceeds the safety limit.
    #[error("Feed nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// One `<item>` of an RSS feed, reduced to the fields extraction cares about.
///
/// Texts are kept raw (untrimmed). `None` means the element was absent;
/// `Some("")` means it was present but empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemNode {
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Link,
    PubDate,
    Category,
}

impl ItemNode {
    /// Marks `name` as opened inside this item and returns the field whose
    /// text should be captured, if any.
    ///
    /// `link` and `pubDate` keep their first occurrence only.
    fn open(&mut self, name: &[u8]) -> Option<Field> {
        match name {
            b"link" if self.link.is_none() => {
                self.link = Some(String::new());
                Some(Field::Link)
            }
            b"pubDate" if self.pub_date.is_none() => {
                self.pub_date = Some(String::new());
                Some(Field::PubDate)
            }
            b"category" => {
                self.categories.push(String::new());
                Some(Field::Category)
            }
            _ => None,
        }
    }

    fn append(&mut self, field: Field, text: &str) {
        let target = match field {
            Field::Link => self.link.as_mut(),
            Field::PubDate => self.pub_date.as_mut(),
            Field::Category => self.categories.last_mut(),
        };
        if let Some(target) = target {
            target.push_str(text);
        }
    }
}

/// An `<item>` whose end tag has not been seen yet.
struct OpenItem {
    /// Element depth of the `<item>` start tag.
    depth: usize,
    /// Position reserved in the output, so items stay in start-tag order.
    slot: usize,
    node: ItemNode,
    /// (depth of the captured element, field receiving its text)
    capture: Option<(usize, Field)>,
}

/// Parses a raw feed body into its `<item>` nodes, in document order.
///
/// Only RSS `<item>` elements are extracted. Atom `<entry>` elements are not
/// recognized and contribute nothing.
///
/// An `<item>` nested inside another is returned as its own node, after its
/// parent. Fields are looked up among all descendants, so the parent also
/// sees the nested item's `link`, `pubDate` and `category` elements.
///
/// # Errors
///
/// Returns [`ParseError`] when the body is not well-formed XML: reader
/// syntax errors, mismatched end tags, elements left open at end of input,
/// or no root element at all.
pub fn parse_items(raw: &str) -> Result<Vec<ItemNode>, ParseError> {
    // quick-xml (0.37) never expands <!ENTITY> declarations; only the five
    // predefined entities are resolved by `unescape()`.
    let mut reader = Reader::from_str(raw);

    let mut items: Vec<ItemNode> = Vec::new();
    let mut open: Vec<OpenItem> = Vec::new();
    let mut depth: usize = 0;
    let mut saw_element = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth > MAX_FEED_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_FEED_DEPTH));
                }
                saw_element = true;

                let name = e.name();
                if name.as_ref() == b"item" {
                    open.push(OpenItem {
                        depth,
                        slot: items.len(),
                        node: ItemNode::default(),
                        capture: None,
                    });
                    items.push(ItemNode::default());
                } else {
                    for item in open.iter_mut().filter(|i| i.capture.is_none()) {
                        item.capture = item.node.open(name.as_ref()).map(|field| (depth, field));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                saw_element = true;
                let name = e.name();
                if name.as_ref() == b"item" {
                    items.push(ItemNode::default());
                } else {
                    for item in open.iter_mut().filter(|i| i.capture.is_none()) {
                        item.node.open(name.as_ref());
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if open.iter().any(|i| i.capture.is_some()) {
                    let text = match e.unescape() {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::warn!(error = %err, "Unrecognized entity in feed text, keeping raw text");
                            Cow::Owned(String::from_utf8_lossy(&e).into_owned())
                        }
                    };
                    append_captured(&mut open, &text);
                }
            }
            Ok(Event::CData(e)) => {
                append_captured(&mut open, &String::from_utf8_lossy(&e));
            }
            Ok(Event::End(_)) => {
                for item in open.iter_mut() {
                    if matches!(item.capture, Some((d, _)) if d == depth) {
                        item.capture = None;
                    }
                }
                if open.last().is_some_and(|i| i.depth == depth) {
                    if let Some(item) = open.pop() {
                        items[item.slot] = item.node;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Xml(format!(
                    "at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ParseError::UnclosedElements(depth));
    }
    if !saw_element {
        return Err(ParseError::NoRootElement);
    }

    Ok(items)
}

fn append_captured(open: &mut [OpenItem], text: &str) {
    for item in open.iter_mut() {
        if let Some((_, field)) = item.capture {
            item.node.append(field, text);
        }
    }
}
