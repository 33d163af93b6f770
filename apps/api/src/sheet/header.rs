//! Page header: the running list of characters introduced on a page.

use crate::dataset::Character;
use crate::sheet::tile::escape_xml;

/// Once the first line is longer than this (in characters), the next entry starts line two.
pub const HEADER_WRAP_THRESHOLD: usize = 75;

/// Deduplicated `char (pronunciation)` entries in first-seen order, on at most two lines.
///
/// The wrap check runs before each new entry is appended, after its `", "` separator, so
/// the separator stays at the end of the first line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Header {
    seen: Vec<char>,
    first: String,
    second: Option<String>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a character. Repeats are ignored.
    pub fn observe(&mut self, character: &Character) {
        if self.seen.contains(&character.glyph) {
            return;
        }
        self.seen.push(character.glyph);

        if !self.first.is_empty() {
            self.current_line().push_str(", ");
        }
        if self.second.is_none() && self.first.chars().count() > HEADER_WRAP_THRESHOLD {
            self.second = Some(String::new());
        }

        let entry = match &character.pronunciation {
            Some(reading) => format!("{} ({})", character.glyph, reading),
            None => character.glyph.to_string(),
        };
        self.current_line().push_str(&entry);
    }

    fn current_line(&mut self) -> &mut String {
        match &mut self.second {
            Some(line) => line,
            None => &mut self.first,
        }
    }

    /// Characters in first-seen order.
    pub fn characters(&self) -> &[char] {
        &self.seen
    }

    /// One or two lines of plain text.
    pub fn lines(&self) -> Vec<&str> {
        std::iter::once(self.first.as_str())
            .chain(self.second.as_deref())
            .collect()
    }

    pub fn is_wrapped(&self) -> bool {
        self.second.is_some()
    }

    /// SVG text block `"<page>: <line one>"` with an optional second line below.
    pub fn render(&self, page_number: usize) -> String {
        let mut out = format!(
            r#"<text x="0" y="5" font-size="5px"><tspan x="0" dy="0em">{page_number}: {}</tspan>"#,
            escape_xml(&self.first)
        );
        if let Some(second) = &self.second {
            out.push_str(&format!(
                r#"<tspan x="0" dy="1.2em">{}</tspan>"#,
                escape_xml(second)
            ));
        }
        out.push_str("</text>");
        out
    }
}
