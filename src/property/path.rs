//! Property path grammar.
//!
//! ```text
//! path    := segment ( '.' segment )*
//! segment := ident ( '[' token ']' )?
//! token   := bare | '"' ( char | '\"' | '\\' )* '"'
//! ```
//!
//! Splitting on `.` is bracket- and quote-aware, so `Lookup["a.b"].Value` has two segments.

use std::{fmt, str::FromStr};

use crate::{
    Error::{PathEmpty, PathSegmentParseFailed},
    Result,
};

/// Bracket token of a path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexToken {
    /// Unquoted literal (array index, numeric/bool/name map key); empty for `[]`
    Bare(String),
    /// Double-quoted string literal with escapes removed
    Quoted(String),
}

impl IndexToken {
    /// Token text without quotes
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            IndexToken::Bare(text) | IndexToken::Quoted(text) => text,
        }
    }

    /// Returns `true` for `[]`
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, IndexToken::Bare(text) if text.is_empty())
    }
}

impl fmt::Display for IndexToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexToken::Bare(text) => f.write_str(text),
            IndexToken::Quoted(text) => {
                f.write_str("\"")?;
                for c in text.chars() {
                    if c == '"' || c == '\\' {
                        f.write_str("\\")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("\"")
            }
        }
    }
}

/// One `ident[token]` element of a [`PropertyPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Field name
    pub name: String,
    /// Optional container index or key
    pub index: Option<IndexToken>,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.index {
            Some(token) => write!(f, "{}[{token}]", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Parsed property path.
///
/// ```rust
/// use propscope::property::{IndexToken, PropertyPath};
///
/// let path: PropertyPath = r#"Loadout["main.hand"].Damage"#.parse()?;
/// assert_eq!(path.segments().len(), 2);
/// assert_eq!(
///     path.segments()[0].index,
///     Some(IndexToken::Quoted("main.hand".into()))
/// );
/// # Ok::<(), propscope::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl PropertyPath {
    /// Parse a path string.
    ///
    /// # Errors
    /// Returns [`crate::Error::PathEmpty`] for empty or whitespace-only input, and
    /// [`crate::Error::PathSegmentParseFailed`] naming the offending segment for unbalanced
    /// brackets or quotes, empty identifiers, a second bracket group or trailing characters.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(PathEmpty);
        }

        let segments = split_segments(trimmed)?
            .into_iter()
            .map(parse_segment)
            .collect::<Result<Vec<_>>>()?;

        Ok(PropertyPath {
            raw: trimmed.to_string(),
            segments,
        })
    }

    /// All segments in order, never empty
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The first segment, naming a top-level field
    #[must_use]
    pub fn root(&self) -> &PathSegment {
        &self.segments[0]
    }

    /// Returns `true` for a single-segment path
    #[must_use]
    pub fn is_top_level(&self) -> bool {
        self.segments.len() == 1
    }

    /// The path as given, without surrounding whitespace
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for PropertyPath {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        PropertyPath::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Split on `.` outside of brackets and quotes.
fn split_segments(path: &str) -> Result<Vec<&str>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut escaped = false;

    for (pos, c) in path.char_indices() {
        if in_quote {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_quote = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_quote = true,
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err(PathSegmentParseFailed(segment_at(path, start)));
                }
                depth -= 1;
            }
            '.' if depth == 0 => {
                segments.push(&path[start..pos]);
                start = pos + 1;
            }
            _ => {}
        }
    }

    if depth != 0 || in_quote {
        return Err(PathSegmentParseFailed(path[start..].to_string()));
    }

    segments.push(&path[start..]);
    Ok(segments)
}

/// Text of the segment starting at `start`, for error messages
fn segment_at(path: &str, start: usize) -> String {
    let rest = &path[start..];
    rest.split('.').next().unwrap_or(rest).to_string()
}

fn parse_segment(segment: &str) -> Result<PathSegment> {
    let failed = || PathSegmentParseFailed(segment.to_string());

    let (name, bracket) = match segment.find('[') {
        Some(open) => (&segment[..open], Some(&segment[open + 1..])),
        None => (segment, None),
    };

    let name = name.trim();
    if name.is_empty() || name.contains([']', '"']) {
        return Err(failed());
    }

    let Some(rest) = bracket else {
        return Ok(PathSegment {
            name: name.to_string(),
            index: None,
        });
    };

    let (token, tail) = if rest.trim_start().starts_with('"') {
        let (text, consumed) = parse_quoted(rest.trim_start()).ok_or_else(failed)?;
        let after = rest.trim_start()[consumed..].trim_start();
        let tail = after.strip_prefix(']').ok_or_else(failed)?;
        (IndexToken::Quoted(text), tail)
    } else {
        let close = rest.find(']').ok_or_else(failed)?;
        let bare = rest[..close].trim();
        if bare.contains(['[', '"']) {
            return Err(failed());
        }
        (IndexToken::Bare(bare.to_string()), &rest[close + 1..])
    };

    if !tail.trim().is_empty() {
        return Err(failed());
    }

    Ok(PathSegment {
        name: name.to_string(),
        index: Some(token),
    })
}

/// Parse a quoted literal at the start of `input`; returns the unescaped text and the number
/// of bytes consumed including both quotes.
fn parse_quoted(input: &str) -> Option<(String, usize)> {
    let mut chars = input.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }

    let mut text = String::new();
    let mut escaped = false;
    for (pos, c) in chars {
        if escaped {
            text.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => return Some((text, pos + 1)),
            _ => text.push(c),
        }
    }
    None
}
