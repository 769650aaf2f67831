//! Tag stream tokenizer.
//!
//! The glyph stream is consumed one tag at a time through [`TagSource`].
//! [`XmlTagReader`] implements it on top of `quick-xml`; it reports opening
//! and closing tags with their attributes, and attaches any text that follows
//! a tag to that tag. Self-closing elements produce only an opening tag.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::buffer::{ReadBuffer, Source};
use crate::error::{Error, Result};

/// One tag from the stream.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    /// Element name without angle brackets or `/`
    pub name: String,

    /// True for `</name>`
    pub closing: bool,

    /// Attributes in document order
    pub attributes: Vec<(String, String)>,

    /// Text between this tag and the next one
    pub text: String,
}

impl Tag {
    /// Opening tag with the given attributes.
    pub fn open(name: &str, attributes: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            closing: false,
            attributes: attributes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            text: String::new(),
        }
    }

    /// Closing tag.
    pub fn close(name: &str) -> Self {
        Self {
            name: name.to_string(),
            closing: true,
            ..Default::default()
        }
    }

    /// Set the trailing text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// True if this is `<name ...>`.
    pub fn is_open(&self, name: &str) -> bool {
        !self.closing && self.name == name
    }

    /// True if this is `</name>`.
    pub fn is_close(&self, name: &str) -> bool {
        self.closing && self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute value, failing if absent.
    pub fn require(&self, name: &str) -> Result<&str> {
        self.attr(name).ok_or_else(|| {
            Error::malformed(format!("missing attribute '{}' on <{}>", name, self.name))
        })
    }

    /// Parse a required attribute.
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Result<T> {
        let value = self.require(name)?;
        value.trim().parse().map_err(|_| {
            Error::malformed(format!(
                "bad value '{}' for attribute '{}' on <{}>",
                value, name, self.name
            ))
        })
    }

    /// Parse an optional attribute.
    pub fn parse_opt<T: std::str::FromStr>(&self, name: &str) -> Result<Option<T>> {
        match self.attr(name) {
            Some(_) => self.parse(name).map(Some),
            None => Ok(None),
        }
    }

    /// `<name>` or `</name>` for messages.
    pub fn describe(&self) -> String {
        if self.closing {
            format!("</{}>", self.name)
        } else {
            format!("<{}>", self.name)
        }
    }
}

/// Pull interface over a tag stream.
pub trait TagSource {
    /// Next tag, or `None` at end of stream.
    fn next_tag(&mut self) -> Result<Option<Tag>>;
}

impl TagSource for VecDeque<Tag> {
    fn next_tag(&mut self) -> Result<Option<Tag>> {
        Ok(self.pop_front())
    }
}

impl<T: TagSource + ?Sized> TagSource for &mut T {
    fn next_tag(&mut self) -> Result<Option<Tag>> {
        (**self).next_tag()
    }
}

/// [`TagSource`] over XML text.
pub struct XmlTagReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    lookahead: Option<Tag>,
}

impl<'a> XmlTagReader<&'a [u8]> {
    /// Read tags from an in-memory string.
    pub fn from_str(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<S: Source> XmlTagReader<BufReader<ReadBuffer<S>>> {
    /// Read tags from a [`ReadBuffer`].
    pub fn from_buffer(buffer: ReadBuffer<S>) -> Self {
        Self::new(BufReader::new(buffer))
    }
}

impl<R: BufRead> XmlTagReader<R> {
    /// Read tags from any buffered reader.
    pub fn new(inner: R) -> Self {
        let mut reader = Reader::from_reader(inner);
        reader.trim_text(true);
        Self {
            reader,
            buf: Vec::new(),
            lookahead: None,
        }
    }

    fn open_tag(e: &BytesStart<'_>) -> Result<Tag> {
        let mut tag = Tag {
            name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
            ..Default::default()
        };
        for attr in e.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            tag.attributes.push((key, value));
        }
        Ok(tag)
    }
}

impl<R: BufRead> TagSource for XmlTagReader<R> {
    fn next_tag(&mut self) -> Result<Option<Tag>> {
        let mut current = self.lookahead.take();
        loop {
            self.buf.clear();
            let next = match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(e) | Event::Empty(e) => Self::open_tag(&e)?,
                Event::End(e) => {
                    Tag::close(&String::from_utf8_lossy(e.name().as_ref()))
                }
                Event::Decl(_) => Tag::open("?xml", &[]),
                Event::Text(t) => {
                    if let Some(tag) = current.as_mut() {
                        tag.text.push_str(&t.unescape()?);
                    }
                    continue;
                }
                Event::CData(t) => {
                    if let Some(tag) = current.as_mut() {
                        tag.text.push_str(&String::from_utf8_lossy(&t));
                    }
                    continue;
                }
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
                Event::Eof => return Ok(current),
            };
            match current {
                Some(tag) => {
                    self.lookahead = Some(next);
                    return Ok(Some(tag));
                }
                None => current = Some(next),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(text: &str) -> Vec<Tag> {
        let mut reader = XmlTagReader::from_str(text);
        let mut tags = Vec::new();
        while let Some(tag) = reader.next_tag().unwrap() {
            tags.push(tag);
        }
        tags
    }

    #[test]
    fn test_tags_and_attributes() {
        let tags = collect(
            r#"<?xml version="1.0"?>
            <page>
              <span ctm="1 0 0 1 0 0" font_name="Times">
                <char x="1" y="2" adv="0.5" ucs="65"/>
              </span>
            </page>"#,
        );
        let names: Vec<_> = tags.iter().map(Tag::describe).collect();
        assert_eq!(
            names,
            ["<?xml>", "<page>", "<span>", "<char>", "</span>", "</page>"]
        );
        assert_eq!(tags[2].attr("font_name"), Some("Times"));
        assert_eq!(tags[3].parse::<f32>("adv").unwrap(), 0.5);
        assert_eq!(tags[3].parse::<u32>("ucs").unwrap(), 65);
    }

    #[test]
    fn test_text_attached_to_preceding_tag() {
        let tags = collect(r#"<page><image type="png" datasize="2">beef</image></page>"#);
        assert_eq!(tags[1].name, "image");
        assert_eq!(tags[1].text, "beef");
        assert!(tags[2].is_close("image"));
        assert!(tags[2].text.is_empty());
    }

    #[test]
    fn test_escaped_attribute() {
        let tags = collect(r#"<span font_name="A&amp;B"/>"#);
        assert_eq!(tags[0].attr("font_name"), Some("A&B"));
    }

    #[test]
    fn test_missing_and_bad_attributes() {
        let tag = Tag::open("char", &[("x", "abc")]);
        let err = tag.require("y").unwrap_err();
        assert!(err.to_string().contains("missing attribute 'y' on <char>"));
        assert!(tag.parse::<f32>("x").is_err());
        assert_eq!(tag.parse_opt::<u32>("gid").unwrap(), None);
    }

    #[test]
    fn test_mismatched_end_is_error() {
        let mut reader = XmlTagReader::from_str("<page><span></page>");
        let mut result = Ok(None);
        for _ in 0..4 {
            result = reader.next_tag();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(Error::Xml(_))));
    }
}
