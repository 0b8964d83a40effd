//! Decoding of FogBugz XML responses into records.
//!
//! The API never sends a schema. A list response nests one repeated element
//! per entity under a wrapper, with one child element per field:
//!
//! ```text
//! <response>
//!   <categories>
//!     <category>
//!       <ixCategory>1</ixCategory>
//!       <sCategory><![CDATA[Bug]]></sCategory>
//!       <fIsScheduleItem>false</fIsScheduleItem>
//!     </category>
//!   </categories>
//! </response>
//! ```
//!
//! Field types come from the tag prefix, checked in this order:
//!
//! | Prefix | Value |
//! |---|---|
//! | `s`, `evt` | CDATA payload, or the raw text when not CDATA-wrapped |
//! | `ix`, `n` | integer, `0` when the text has no leading digits |
//! | `f` | `true` only for the exact text `"true"` |
//! | anything else | raw text |
//!
//! Field values are taken from the raw inner markup of each element, so a
//! compound field such as a case's `events` keeps its XML and can be decoded
//! again with [`expand_nested`].

use roxmltree::{Document, Node};

use crate::error::FoglineError;
use crate::models::{FieldValue, Record, RecordSet};

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Root element wrapped around field fragments before they are parsed.
const FRAGMENT_ROOT: &str = "fragment";

/// An `<error code="N">message</error>` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerError {
    /// The numeric code, when present and numeric.
    pub code: Option<u32>,
    /// The element's text.
    pub message: String,
}

/// A parsed response document.
pub struct Response<'a> {
    source: &'a str,
    doc: Document<'a>,
}

impl<'a> Response<'a> {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::MalformedResponse` if the body is not well-formed XML.
    pub fn parse(source: &'a str) -> Result<Self, FoglineError> {
        let doc = Document::parse(source).map_err(|e| FoglineError::malformed(e.to_string()))?;
        Ok(Self { source, doc })
    }

    /// Returns every `<error>` element in the document.
    pub fn errors(&self) -> Vec<ServerError> {
        self.doc
            .descendants()
            .filter(|n| n.has_tag_name("error"))
            .map(|n| ServerError {
                code: n.attribute("code").and_then(|c| c.trim().parse().ok()),
                message: plain_text(n),
            })
            .collect()
    }

    /// Fails with the first server error, if the response carries any.
    ///
    /// Messages of further `<error>` elements are appended to the first.
    pub fn check(&self) -> Result<(), FoglineError> {
        let errors = self.errors();
        let Some(first) = errors.first() else {
            return Ok(());
        };
        let message = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        match first.code {
            Some(code) => Err(FoglineError::api(code, message)),
            None => Err(FoglineError::malformed(format!(
                "error element without a numeric code: {}",
                message
            ))),
        }
    }

    /// Decodes every `element` into a record keyed by its `name_field` child.
    ///
    /// Elements are matched at any depth. Zero matches yield an empty set.
    ///
    /// # Errors
    ///
    /// Returns `FoglineError::MissingKeyField` if a matched element has no
    /// `name_field` child.
    pub fn records(&self, element: &str, name_field: &str) -> Result<RecordSet, FoglineError> {
        let mut set = RecordSet::new();

        for item in self.doc.descendants().filter(|n| n.has_tag_name(element)) {
            let key_node = item
                .children()
                .find(|n| n.has_tag_name(name_field))
                .ok_or_else(|| FoglineError::MissingKeyField {
                    element: element.to_string(),
                    field: name_field.to_string(),
                })?;
            let key = record_key(name_field, self.inner(key_node));

            let mut record = Record::new();
            for child in item.children().filter(Node::is_element) {
                let tag = child.tag_name().name();
                record.insert(tag.to_string(), coerce(tag, self.inner(child)));
            }

            // Later duplicates replace the earlier record.
            set.insert(key, record);
        }

        tracing::trace!(element, name_field, count = set.len(), "decoded records");
        Ok(set)
    }

    /// Returns the decoded text of the first `tag` element.
    ///
    /// CDATA sections and entities are resolved and surrounding whitespace trimmed.
    pub fn text(&self, tag: &str) -> Option<String> {
        self.find(tag).map(|n| plain_text(n).trim().to_string())
    }

    /// Returns the decoded text of every `tag` element.
    pub fn texts(&self, tag: &str) -> Vec<String> {
        self.doc
            .descendants()
            .filter(|n| n.has_tag_name(tag))
            .map(|n| plain_text(n).trim().to_string())
            .collect()
    }

    /// Returns the first `tag` element's text as a lenient integer (0 when absent).
    pub fn integer(&self, tag: &str) -> i64 {
        self.text(tag).map_or(0, |t| parse_integer(&t))
    }

    /// Returns the child elements of the first `tag` element as text fields.
    ///
    /// CDATA-wrapped values are unwrapped, others kept raw. `None` when the
    /// element is absent.
    pub fn children_of(&self, tag: &str) -> Option<Record> {
        let node = self.find(tag)?;
        let record = node
            .children()
            .filter(Node::is_element)
            .map(|child| {
                let raw = self.inner(child);
                let value = unwrap_cdata(raw).unwrap_or(raw);
                (
                    child.tag_name().name().to_string(),
                    FieldValue::Text(value.to_string()),
                )
            })
            .collect();
        Some(record)
    }

    /// Decodes every `tag` element into a record keyed by its text.
    ///
    /// Each record holds the element's attributes plus a `name` field
    /// carrying the text.
    pub fn attributed(&self, tag: &str) -> RecordSet {
        let mut set = RecordSet::new();
        for node in self.doc.descendants().filter(|n| n.has_tag_name(tag)) {
            let name = plain_text(node).trim().to_string();
            let mut record: Record = node
                .attributes()
                .map(|a| (a.name().to_string(), FieldValue::Text(a.value().to_string())))
                .collect();
            record.insert("name".to_string(), FieldValue::Text(name.clone()));
            set.insert(name, record);
        }
        set
    }

    fn find(&self, tag: &str) -> Option<Node<'_, 'a>> {
        self.doc.descendants().find(|n| n.has_tag_name(tag))
    }

    /// Returns the raw markup between an element's start and end tags.
    fn inner(&self, node: Node<'_, '_>) -> &'a str {
        let source: &'a str = self.source;
        inner_markup(&source[node.range()])
    }
}

/// Decodes `element` records keyed by `name_field` from a complete document.
///
/// # Errors
///
/// `MalformedResponse` for XML that does not parse, `MissingKeyField` for an
/// element without its key child.
pub fn decode_records(xml: &str, element: &str, name_field: &str) -> Result<RecordSet, FoglineError> {
    Response::parse(xml)?.records(element, name_field)
}

/// Like [`decode_records`] for a field fragment, which may have several
/// top-level elements or none.
pub fn decode_fragment(
    fragment: &str,
    element: &str,
    name_field: &str,
) -> Result<RecordSet, FoglineError> {
    let wrapped = wrap_fragment(fragment);
    decode_records(&wrapped, element, name_field)
}

/// Replaces a text field holding XML with the records decoded from it.
///
/// Does nothing when the field is missing or already decoded.
///
/// # Errors
///
/// Propagates decoding errors for the fragment.
pub fn expand_nested(
    record: &mut Record,
    field: &str,
    element: &str,
    name_field: &str,
) -> Result<(), FoglineError> {
    if let Some(FieldValue::Text(fragment)) = record.get(field) {
        let nested = decode_fragment(fragment, element, name_field)?;
        record.insert(field.to_string(), FieldValue::Records(nested));
    }
    Ok(())
}

/// Replaces a text field holding flag elements with one boolean field per
/// element, merged into the record.
///
/// `<rgWorkDays><fMonday>true</fMonday>...</rgWorkDays>` becomes
/// `fMonday: true, ...` on the parent record and `rgWorkDays` is removed.
///
/// # Errors
///
/// `MalformedResponse` if the fragment does not parse.
pub fn merge_flags(record: &mut Record, field: &str) -> Result<(), FoglineError> {
    let Some(FieldValue::Text(fragment)) = record.get(field) else {
        return Ok(());
    };
    let wrapped = wrap_fragment(fragment);
    let response = Response::parse(&wrapped)?;

    let flags: Vec<(String, bool)> = response
        .doc
        .root_element()
        .children()
        .filter(Node::is_element)
        .map(|n| (n.tag_name().name().to_string(), response.inner(n) == "true"))
        .collect();

    record.shift_remove(field);
    for (name, value) in flags {
        record.insert(name, FieldValue::Boolean(value));
    }
    Ok(())
}

/// Coerces a field's raw inner text by its tag prefix.
pub fn coerce(tag: &str, raw: &str) -> FieldValue {
    if tag.starts_with('s') || tag.starts_with("evt") {
        // Non-CDATA string fields stay raw; they are never coerced further.
        let text = unwrap_cdata(raw).unwrap_or(raw);
        FieldValue::Text(text.to_string())
    } else if tag.starts_with("ix") || tag.starts_with('n') {
        FieldValue::Integer(parse_integer(raw))
    } else if tag.starts_with('f') {
        FieldValue::Boolean(raw == "true")
    } else {
        FieldValue::Text(raw.to_string())
    }
}

/// Returns the payload of a CDATA-wrapped value.
///
/// The value (ignoring surrounding whitespace) must start with `<![CDATA[`;
/// the payload runs to the first `]]>`.
pub fn unwrap_cdata(raw: &str) -> Option<&str> {
    let body = raw.trim().strip_prefix(CDATA_OPEN)?;
    let end = body.find(CDATA_CLOSE)?;
    Some(&body[..end])
}

/// Parses the leading integer of `text`, ignoring anything after it.
///
/// Leading whitespace and one sign are accepted. Text without leading digits
/// is `0`; values beyond `i64` saturate.
pub fn parse_integer(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let magnitude = rest
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Key of a record: CDATA payload for `s*` name fields, raw text otherwise.
fn record_key(name_field: &str, raw: &str) -> String {
    if name_field.starts_with('s') {
        unwrap_cdata(raw).unwrap_or(raw).to_string()
    } else {
        raw.to_string()
    }
}

fn wrap_fragment(fragment: &str) -> String {
    format!("<{root}>{}</{root}>", fragment, root = FRAGMENT_ROOT)
}

/// Concatenated decoded text of all text nodes below `node`.
fn plain_text(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}

/// Strips the start and end tag from an element's outer markup.
fn inner_markup(outer: &str) -> &str {
    let bytes = outer.as_bytes();
    let mut quote = None;
    let mut start_tag_end = None;

    for (i, &b) in bytes.iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if b == b'>' => {
                start_tag_end = Some(i);
                break;
            }
            None => {}
        }
    }

    let Some(gt) = start_tag_end else {
        return "";
    };
    if gt > 0 && bytes[gt - 1] == b'/' {
        return "";
    }
    let body = &outer[gt + 1..];
    body.rfind("</").map_or("", |end| &body[..end])
}
