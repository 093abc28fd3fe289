//! Streaming XMLTV scanner.
//!
//! One pass over the document collects every `<channel>` and `<programme>`
//! element as raw strings. Child elements are dispatched by name, so their
//! order inside a programme does not matter and missing ones stay `None`.
//! Turning raw records into [`Channel`](crate::Channel)s (filtering,
//! timestamp parsing, grouping) happens in [`crate::guide`].

use chrono::{DateTime, FixedOffset};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::encoding::Decoder;
use quick_xml::Reader;

use crate::error::{GuideError, Result};

/// XMLTV timestamp layout, e.g. `20240101200000 +0000`.
pub const XMLTV_TIME_FORMAT: &str = "%Y%m%d%H%M%S %z";

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawChannel {
    pub id: String,
    pub display_name: Option<String>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawProgramme {
    pub channel: Option<String>,
    pub start: Option<String>,
    pub stop: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct RawDocument {
    pub channels: Vec<RawChannel>,
    pub programmes: Vec<RawProgramme>,
}

/// Text-bearing child elements we keep.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    DisplayName,
    Title,
    SubTitle,
    Desc,
}

impl Field {
    fn for_programme_child(local_name: &[u8]) -> Option<Field> {
        if local_name == b"title" {
            Some(Field::Title)
        } else if local_name.eq_ignore_ascii_case(b"sub-title") {
            Some(Field::SubTitle)
        } else if local_name == b"desc" {
            Some(Field::Desc)
        } else {
            None
        }
    }
}

/// The top-level element currently open.
#[derive(Debug)]
enum Open {
    Channel(RawChannel),
    Programme(RawProgramme),
}

/// A child element whose text is being collected.
#[derive(Debug)]
struct Capture {
    field: Field,
    depth: usize,
    text: String,
}

struct Scanner<'a> {
    reader: Reader<&'a [u8]>,
    doc: RawDocument,
    depth: usize,
    open: Option<(Open, usize)>,
    capture: Option<Capture>,
    saw_root: bool,
}

/// Scan an XMLTV document into raw channel and programme records.
///
/// # Errors
/// Returns `GuideError::Xml` for malformed XML, `GuideError::Malformed` when
/// the document has no `<tv>` root, and `GuideError::MissingAttribute` for a
/// `<channel>` without an `id`.
pub(crate) fn scan(text: &str) -> Result<RawDocument> {
    let mut scanner = Scanner {
        reader: Reader::from_str(text),
        doc: RawDocument::default(),
        depth: 0,
        open: None,
        capture: None,
        saw_root: false,
    };
    scanner.run()?;
    Ok(scanner.doc)
}

impl Scanner<'_> {
    fn run(&mut self) -> Result<()> {
        loop {
            match self.reader.read_event()? {
                Event::Start(e) => {
                    self.depth += 1;
                    self.open_element(&e)?;
                }
                Event::Empty(e) => {
                    self.depth += 1;
                    self.open_element(&e)?;
                    self.close_element();
                    self.depth -= 1;
                }
                Event::End(_) => {
                    self.close_element();
                    self.depth = self.depth.saturating_sub(1);
                }
                Event::Text(e) => {
                    if let Some(capture) = self.capture.as_mut() {
                        capture.text.push_str(&e.decode()?);
                    }
                }
                Event::CData(e) => {
                    if let Some(capture) = self.capture.as_mut() {
                        capture.text.push_str(&e.decode()?);
                    }
                }
                Event::GeneralRef(e) => {
                    if let Some(capture) = self.capture.as_mut() {
                        capture.text.push_str(&resolve_reference(&e)?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if self.depth != 0 {
            return Err(GuideError::Malformed(format!(
                "document ends with {} element(s) still open",
                self.depth
            )));
        }
        if !self.saw_root {
            return Err(GuideError::Malformed("no <tv> root element".to_string()));
        }
        Ok(())
    }

    fn open_element(&mut self, e: &BytesStart<'_>) -> Result<()> {
        let decoder = self.reader.decoder();
        let local = e.local_name();
        let name = local.as_ref();

        if self.depth == 1 {
            if name != b"tv" {
                return Err(GuideError::Malformed(format!(
                    "root element is <{}>, expected <tv>",
                    String::from_utf8_lossy(name)
                )));
            }
            self.saw_root = true;
            return Ok(());
        }

        if self.open.is_none() {
            let opened = match name {
                b"channel" => {
                    let id = attribute(e, b"id", decoder)?.ok_or(GuideError::MissingAttribute {
                        element: "channel",
                        attribute: "id",
                    })?;
                    Open::Channel(RawChannel {
                        id,
                        ..RawChannel::default()
                    })
                }
                b"programme" => Open::Programme(RawProgramme {
                    channel: attribute(e, b"channel", decoder)?,
                    start: attribute(e, b"start", decoder)?,
                    stop: attribute(e, b"stop", decoder)?,
                    ..RawProgramme::default()
                }),
                _ => return Ok(()),
            };
            self.open = Some((opened, self.depth));
            return Ok(());
        }

        if self.capture.is_some() {
            return Ok(());
        }

        let field = match self.open.as_mut() {
            Some((Open::Channel(channel), _)) => {
                if channel.display_name.is_some() || name != b"display-name" {
                    return Ok(());
                }
                channel.language = attribute(e, b"lang", decoder)?;
                Field::DisplayName
            }
            Some((Open::Programme(_), _)) => match Field::for_programme_child(name) {
                Some(field) => field,
                None => return Ok(()),
            },
            None => return Ok(()),
        };
        self.capture = Some(Capture {
            field,
            depth: self.depth,
            text: String::new(),
        });
        Ok(())
    }

    fn close_element(&mut self) {
        if matches!(&self.capture, Some(c) if c.depth == self.depth) {
            if let (Some(capture), Some((open, _))) = (self.capture.take(), self.open.as_mut()) {
                store(open, capture);
            }
            return;
        }

        if matches!(&self.open, Some((_, depth)) if *depth == self.depth) {
            match self.open.take() {
                Some((Open::Channel(channel), _)) => self.doc.channels.push(channel),
                Some((Open::Programme(programme), _)) => self.doc.programmes.push(programme),
                None => {}
            }
        }
    }
}

fn attribute(e: &BytesStart<'_>, key: &[u8], decoder: Decoder) -> Result<Option<String>> {
    match e.try_get_attribute(key)? {
        Some(attr) => Ok(Some(attr.decode_and_unescape_value(decoder)?.into_owned())),
        None => Ok(None),
    }
}

/// First non-blank occurrence of each field wins.
fn store(open: &mut Open, capture: Capture) {
    let text = capture.text.trim();
    if text.is_empty() {
        return;
    }
    let slot = match (open, capture.field) {
        (Open::Channel(c), Field::DisplayName) => &mut c.display_name,
        (Open::Programme(p), Field::Title) => &mut p.title,
        (Open::Programme(p), Field::SubTitle) => &mut p.subtitle,
        (Open::Programme(p), Field::Desc) => &mut p.description,
        _ => return,
    };
    if slot.is_none() {
        *slot = Some(text.to_string());
    }
}

fn resolve_reference(e: &BytesRef<'_>) -> Result<String> {
    if let Some(ch) = e.resolve_char_ref()? {
        return Ok(ch.to_string());
    }
    let name = e.decode()?;
    Ok(match resolve_predefined_entity(&name) {
        Some(value) => value.to_string(),
        // Undeclared entity: keep it as written.
        None => format!("&{name};"),
    })
}

/// Parse an XMLTV `start`/`stop` attribute.
///
/// # Errors
/// Returns `GuideError::InvalidTimestamp` if `value` does not match
/// [`XMLTV_TIME_FORMAT`].
pub fn parse_timestamp(value: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value.trim(), XMLTV_TIME_FORMAT).map_err(|e| {
        GuideError::InvalidTimestamp {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}
