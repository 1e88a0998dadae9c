//! Codec for identifier tokens embedded in placeholder elements.
//!
//! # Responsibility
//! - Read and rewrite one `name="digits"` token inside the URI-encoded
//!   markup a placeholder element carries for its real content.
//!
//! # Invariants
//! - `inject` strips every prior token for the same name first.
//! - The new token sits right after the opening tag name.
//! - Markup without an opening tag is rejected, never guessed at.
//!
//! Placeholders stand in for non-editable widgets: the element in the tree
//! is a fake (`data-cke-real-node-type` set) and the real markup lives in
//! `data-cke-realelement`, URI-encoded.
//!
//! Encoding follows `encodeURIComponent`: `!'()*` stay literal, so a host
//! payload survives stamp and unstamp byte for byte.

use crate::model::document::Element;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Marks an element as a placeholder for embedded content.
pub const REAL_NODE_TYPE_ATTRIBUTE: &str = "data-cke-real-node-type";
/// Holds the URI-encoded markup of the real element.
pub const REAL_ELEMENT_ATTRIBUTE: &str = "data-cke-realelement";

/// Escapes `urlencoding` emits but `encodeURIComponent` does not.
static URI_COMPONENT_MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"%(21|27|28|29|2A)").expect("uri mark pattern is valid"));

static OPENING_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<[A-Za-z][A-Za-z0-9:-]*").expect("opening tag pattern is valid")
});

/// Placeholder codec failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderError {
    /// Element has no `data-cke-realelement` payload.
    MissingPayload,
    /// Payload is not valid percent-encoded UTF-8.
    InvalidEncoding(String),
    /// Decoded markup does not start with an opening tag.
    MissingOpeningTag,
    /// Token pattern for the attribute name could not be built.
    Pattern(String),
}

impl Display for PlaceholderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPayload => write!(f, "placeholder has no `{REAL_ELEMENT_ATTRIBUTE}` payload"),
            Self::InvalidEncoding(reason) => write!(f, "placeholder payload is not decodable: {reason}"),
            Self::MissingOpeningTag => write!(f, "placeholder markup has no opening tag"),
            Self::Pattern(reason) => write!(f, "invalid token pattern: {reason}"),
        }
    }
}

impl Error for PlaceholderError {}

/// Whether `element` stands in for embedded non-editable content.
pub fn is_placeholder(element: &Element) -> bool {
    element.has_attribute(REAL_NODE_TYPE_ATTRIBUTE)
}

pub fn decode(encoded: &str) -> Result<String, PlaceholderError> {
    urlencoding::decode(encoded)
        .map(|decoded| decoded.into_owned())
        .map_err(|err| PlaceholderError::InvalidEncoding(err.to_string()))
}

pub fn encode(markup: &str) -> String {
    let encoded = urlencoding::encode(markup);
    URI_COMPONENT_MARKS
        .replace_all(&encoded, |caps: &regex::Captures<'_>| match &caps[1] {
            "21" => "!",
            "27" => "'",
            "28" => "(",
            "29" => ")",
            _ => "*",
        })
        .into_owned()
}

fn token_pattern(attr_name: &str) -> Result<Regex, PlaceholderError> {
    Regex::new(&format!(r#"\s+{}="\d+""#, regex::escape(attr_name)))
        .map_err(|err| PlaceholderError::Pattern(err.to_string()))
}

/// Removes every `attr_name="digits"` token (with its leading whitespace).
pub fn strip(markup: &str, attr_name: &str) -> Result<String, PlaceholderError> {
    Ok(token_pattern(attr_name)?.replace_all(markup, "").into_owned())
}

/// Replaces any previous token with `attr_name="value"` after the tag name.
pub fn inject(markup: &str, attr_name: &str, value: u32) -> Result<String, PlaceholderError> {
    let stripped = strip(markup, attr_name)?;
    let tag_end = OPENING_TAG
        .find(&stripped)
        .map(|found| found.end())
        .ok_or(PlaceholderError::MissingOpeningTag)?;
    Ok(format!(
        r#"{} {attr_name}="{value}"{}"#,
        &stripped[..tag_end],
        &stripped[tag_end..]
    ))
}

/// Reads the first `attr_name="digits"` token, if any.
pub fn read(markup: &str, attr_name: &str) -> Result<Option<u32>, PlaceholderError> {
    let found = token_pattern(attr_name)?.find(markup);
    Ok(found.and_then(|token| {
        token
            .as_str()
            .split('"')
            .nth(1)
            .and_then(|digits| digits.parse().ok())
    }))
}

fn payload(element: &Element) -> Result<String, PlaceholderError> {
    let encoded = element
        .attribute(REAL_ELEMENT_ATTRIBUTE)
        .ok_or(PlaceholderError::MissingPayload)?;
    decode(encoded)
}

/// Encoded payload of `element` with its token set to `value`.
pub fn payload_with_token(
    element: &Element,
    attr_name: &str,
    value: u32,
) -> Result<String, PlaceholderError> {
    Ok(encode(&inject(&payload(element)?, attr_name, value)?))
}

/// Decode, inject, re-encode the placeholder payload of `element`.
pub fn write_token(element: &mut Element, attr_name: &str, value: u32) -> Result<(), PlaceholderError> {
    let updated = payload_with_token(element, attr_name, value)?;
    element.set_attribute(REAL_ELEMENT_ATTRIBUTE, updated);
    Ok(())
}

/// Decode, strip, re-encode the placeholder payload of `element`.
pub fn remove_token(element: &mut Element, attr_name: &str) -> Result<(), PlaceholderError> {
    let updated = strip(&payload(element)?, attr_name)?;
    element.set_attribute(REAL_ELEMENT_ATTRIBUTE, encode(&updated));
    Ok(())
}

/// Token value stored in the placeholder payload of `element`.
pub fn read_token(element: &Element, attr_name: &str) -> Result<Option<u32>, PlaceholderError> {
    read(&payload(element)?, attr_name)
}
