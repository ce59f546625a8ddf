//! Cursor over the start elements of an xml document.

use std::io::Read;

use xml::name::OwnedName;
use xml::reader::{self, EventReader, XmlEvent};

/// Scans an xml stream one start element at a time.
///
/// Calling `next` moves to the following start element, all other events are
/// skipped. Character data is only consumed when a caller explicitly asks for
/// it right after the start element it belongs to. Once the stream ends, or a
/// decode error is hit, `next` keeps returning false and the error (None on a
/// clean end of document) stays available through `error`.
///
/// A scanner can not be rewound, scanning again means issuing the request again.
pub struct XmlScanner<R> where R: Read {
    reader:   EventReader<R>,
    current:  Option<OwnedName>,
    error:    Option<reader::Error>,
    finished: bool
}

impl<R> XmlScanner<R> where R: Read {
    /// Create a new XmlScanner over the given source.
    pub fn new(source: R) -> XmlScanner<R> {
        XmlScanner{ reader: EventReader::new(source), current: None, error: None, finished: false }
    }

    /// Advance to the next start element.
    pub fn next(&mut self) -> bool {
        self.current = None;

        while let Some(event) = self.next_event() {
            if let XmlEvent::StartElement{ name, .. } = event {
                self.current = Some(name);
                break;
            }
        }

        self.current.is_some()
    }

    /// Local name of the start element the scanner is positioned on.
    pub fn current(&self) -> Option<&str> {
        self.current.as_ref().map(|name| name.local_name.as_str())
    }

    /// Error that terminated the scan, if any.
    pub fn error(&self) -> Option<&reader::Error> {
        self.error.as_ref()
    }

    pub fn into_error(self) -> Option<reader::Error> {
        self.error
    }

    /// Read the character data immediately following the current start element.
    ///
    /// Returns None if the next event is anything other than character data, in
    /// which case that event is consumed.
    pub fn read_text(&mut self) -> Option<String> {
        match self.next_event() {
            Some(XmlEvent::Characters(text)) |
            Some(XmlEvent::CData(text))      |
            Some(XmlEvent::Whitespace(text)) => Some(text),
            _ => None
        }
    }

    /// Consume the rest of the current element, collecting the text of each
    /// direct child element as (local name, text) pairs in document order.
    pub fn read_children(&mut self) -> Vec<(String, String)> {
        let mut children = Vec::new();
        let mut child: Option<(String, String)> = None;
        let mut depth = 0usize;

        while let Some(event) = self.next_event() {
            match event {
                XmlEvent::StartElement{ name, .. } => {
                    depth += 1;

                    if depth == 1 {
                        child = Some((name.local_name, String::new()));
                    }
                },
                XmlEvent::EndElement{ .. } => {
                    if depth == 0 {
                        break;
                    } else if depth == 1 {
                        children.extend(child.take());
                    }

                    depth -= 1;
                },
                XmlEvent::Characters(text) |
                XmlEvent::CData(text)      |
                XmlEvent::Whitespace(text) => {
                    if let (1, Some((_, value))) = (depth, child.as_mut()) {
                        value.push_str(&text);
                    }
                },
                _ => ()
            }
        }

        children
    }

    fn next_event(&mut self) -> Option<XmlEvent> {
        if self.finished {
            return None;
        }

        match self.reader.next() {
            Ok(XmlEvent::EndDocument) => {
                self.finished = true;

                None
            },
            Ok(event) => Some(event),
            Err(error) => {
                self.finished = true;
                self.error = Some(error);

                None
            }
        }
    }
}
