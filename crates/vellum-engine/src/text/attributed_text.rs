use std::collections::HashSet;
use std::fmt;
use std::ops::{Range, RangeInclusive};

use unicode_segmentation::UnicodeSegmentation;

use crate::text::attribution::{Attribution, AttributionSpan, normalize_spans};

/// Errors raised by [`AttributedText`] operations.
///
/// These are contract violations: the caller passed offsets that do not
/// address this text. They are never used for expected "nothing to do"
/// outcomes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    #[error("offset {offset} is beyond text length {len}")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("invalid character range {start}..{end} for text of length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("invalid inclusive character range [{start}, {end}] for text of length {len}")]
    InvalidSpanRange { start: usize, end: usize, len: usize },
}

/// A text buffer carrying layered style annotations over character ranges.
///
/// All offsets are character (Unicode scalar) offsets, not byte offsets.
/// Editing operations (`insert`, `remove_range`) use half-open ranges;
/// attribution operations (`add_attribution` and friends) use inclusive-end
/// ranges, where the end is the offset of the last *included* character.
/// That asymmetry is part of the contract and is relied on by the selection
/// range resolution above this module.
///
/// `AttributedText` is immutable by replacement: every mutator returns a new
/// value and the caller swaps the reference, which is what lets observers
/// detect change by value comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributedText {
    content: String,
    spans: Vec<AttributionSpan>,
}

impl AttributedText {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            spans: Vec::new(),
        }
    }

    /// Build a text with pre-existing spans, validating that every span fits
    /// within the content.
    pub fn with_spans(
        content: impl Into<String>,
        spans: Vec<AttributionSpan>,
    ) -> Result<Self, TextError> {
        let content = content.into();
        let len = content.chars().count();
        for span in &spans {
            if span.start > span.end || span.end > len {
                return Err(TextError::InvalidRange {
                    start: span.start,
                    end: span.end,
                    len,
                });
            }
        }
        Ok(Self {
            content,
            spans: normalize_spans(spans),
        })
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.content.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The normalized span set.
    pub fn spans(&self) -> &[AttributionSpan] {
        &self.spans
    }

    /// Insert `text` at `offset`, applying `attributions` to the inserted
    /// range. Spans at or after the insertion point shift right; a span
    /// ending exactly at the insertion point stretches to cover the inserted
    /// text, while a span starting there moves past it.
    pub fn insert(
        &self,
        text: &str,
        offset: usize,
        attributions: &HashSet<Attribution>,
    ) -> Result<Self, TextError> {
        let len = self.len();
        if offset > len {
            return Err(TextError::OffsetOutOfBounds { offset, len });
        }

        let at = byte_of_char(&self.content, offset);
        let mut content = String::with_capacity(self.content.len() + text.len());
        content.push_str(&self.content[..at]);
        content.push_str(text);
        content.push_str(&self.content[at..]);

        let inserted = text.chars().count();
        let mut spans: Vec<AttributionSpan> = self
            .spans
            .iter()
            .cloned()
            .map(|mut span| {
                if span.start >= offset {
                    span.start += inserted;
                }
                if span.end >= offset {
                    span.end += inserted;
                }
                span
            })
            .collect();

        if inserted > 0 {
            for attribution in attributions {
                spans.push(AttributionSpan::new(
                    attribution.clone(),
                    offset,
                    offset + inserted,
                ));
            }
        }

        Ok(Self {
            content,
            spans: normalize_spans(spans),
        })
    }

    /// Delete the half-open character range `range`. Spans entirely inside
    /// the range are dropped, spans overlapping a boundary are truncated,
    /// and spans past the range shift left.
    pub fn remove_range(&self, range: Range<usize>) -> Result<Self, TextError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(TextError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }

        let from = byte_of_char(&self.content, range.start);
        let to = byte_of_char(&self.content, range.end);
        let mut content = String::with_capacity(self.content.len() - (to - from));
        content.push_str(&self.content[..from]);
        content.push_str(&self.content[to..]);

        let removed = range.end - range.start;
        let shift = |offset: usize| {
            if offset <= range.start {
                offset
            } else if offset >= range.end {
                offset - removed
            } else {
                range.start
            }
        };

        let mut spans = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            let start = shift(span.start);
            let end = shift(span.end);
            let surviving_marker =
                span.is_marker() && (span.start <= range.start || span.start >= range.end);
            if end > start || surviving_marker {
                spans.push(AttributionSpan::new(span.attribution.clone(), start, end));
            }
        }

        Ok(Self {
            content,
            spans: normalize_spans(spans),
        })
    }

    /// Apply `attribution` over the inclusive character range `range`.
    pub fn add_attribution(
        &self,
        attribution: Attribution,
        range: RangeInclusive<usize>,
    ) -> Result<Self, TextError> {
        let (start, end) = self.check_span_range(&range)?;
        let mut spans = self.spans.clone();
        spans.push(AttributionSpan::new(attribution, start, end + 1));
        Ok(Self {
            content: self.content.clone(),
            spans: normalize_spans(spans),
        })
    }

    /// Remove `attribution` from the inclusive character range `range`,
    /// splitting any span that extends past the range.
    pub fn remove_attribution(
        &self,
        attribution: &Attribution,
        range: RangeInclusive<usize>,
    ) -> Result<Self, TextError> {
        let (start, end) = self.check_span_range(&range)?;
        let (cut_start, cut_end) = (start, end + 1);

        let mut spans = Vec::with_capacity(self.spans.len());
        for span in &self.spans {
            if span.attribution != *attribution || span.end <= cut_start || span.start >= cut_end {
                spans.push(span.clone());
                continue;
            }
            if span.start < cut_start {
                spans.push(AttributionSpan::new(
                    span.attribution.clone(),
                    span.start,
                    cut_start,
                ));
            }
            if span.end > cut_end {
                spans.push(AttributionSpan::new(
                    span.attribution.clone(),
                    cut_end,
                    span.end,
                ));
            }
        }

        Ok(Self {
            content: self.content.clone(),
            spans: normalize_spans(spans),
        })
    }

    /// Flip `attribution` over the inclusive range: if any character in the
    /// range already carries it, remove it from the whole range; otherwise
    /// apply it to the whole range.
    pub fn toggle_attribution(
        &self,
        attribution: Attribution,
        range: RangeInclusive<usize>,
    ) -> Result<Self, TextError> {
        self.check_span_range(&range)?;
        if self.has_any_attribution_within(std::slice::from_ref(&attribution), range.clone()) {
            self.remove_attribution(&attribution, range)
        } else {
            self.add_attribution(attribution, range)
        }
    }

    /// True when every requested attribution covers at least one character
    /// in the inclusive range. Not "every character": partial coverage
    /// counts.
    pub fn has_attributions_within(
        &self,
        attributions: &[Attribution],
        range: RangeInclusive<usize>,
    ) -> bool {
        let (start, end) = (*range.start(), range.end().saturating_add(1));
        attributions.iter().all(|attribution| {
            self.spans
                .iter()
                .any(|span| span.attribution == *attribution && overlaps(span, start, end))
        })
    }

    /// True when at least one of the requested attributions covers at least
    /// one character in the inclusive range.
    pub fn has_any_attribution_within(
        &self,
        attributions: &[Attribution],
        range: RangeInclusive<usize>,
    ) -> bool {
        let (start, end) = (*range.start(), range.end().saturating_add(1));
        attributions.iter().any(|attribution| {
            self.spans
                .iter()
                .any(|span| span.attribution == *attribution && overlaps(span, start, end))
        })
    }

    /// The attributions covering the character at `offset`.
    pub fn attributions_at(&self, offset: usize) -> HashSet<Attribution> {
        self.spans
            .iter()
            .filter(|span| span.start <= offset && offset < span.end)
            .map(|span| span.attribution.clone())
            .collect()
    }

    /// The raw text slice for a half-open character range.
    pub fn span_text(&self, range: Range<usize>) -> Result<&str, TextError> {
        let len = self.len();
        if range.start > range.end || range.end > len {
            return Err(TextError::InvalidRange {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let from = byte_of_char(&self.content, range.start);
        let to = byte_of_char(&self.content, range.end);
        Ok(&self.content[from..to])
    }

    /// Extract a half-open character range as a standalone value, with the
    /// covering spans clipped and re-based to the new origin.
    pub fn copy_span(&self, range: Range<usize>) -> Result<Self, TextError> {
        let content = self.span_text(range.clone())?.to_string();

        let mut spans = Vec::new();
        for span in &self.spans {
            let start = span.start.clamp(range.start, range.end);
            let end = span.end.clamp(range.start, range.end);
            let surviving_marker =
                span.is_marker() && range.start <= span.start && span.start <= range.end;
            if end > start || surviving_marker {
                spans.push(AttributionSpan::new(
                    span.attribution.clone(),
                    start - range.start,
                    end - range.start,
                ));
            }
        }

        Ok(Self {
            content,
            spans: normalize_spans(spans),
        })
    }

    /// Concatenate `other` after this text, shifting its spans past this
    /// text's length. Touching spans with the same attribution coalesce.
    pub fn append(&self, other: &Self) -> Self {
        let shift = self.len();
        let mut content = self.content.clone();
        content.push_str(&other.content);

        let mut spans = self.spans.clone();
        spans.extend(other.spans.iter().map(|span| {
            AttributionSpan::new(
                span.attribution.clone(),
                span.start + shift,
                span.end + shift,
            )
        }));

        Self {
            content,
            spans: normalize_spans(spans),
        }
    }

    /// The caret offset one grapheme cluster after `offset`, or `None` at
    /// the end of the text.
    pub fn next_grapheme_offset(&self, offset: usize) -> Option<usize> {
        if offset >= self.len() {
            return None;
        }
        let at = byte_of_char(&self.content, offset);
        let grapheme = self.content[at..].graphemes(true).next()?;
        Some(offset + grapheme.chars().count())
    }

    /// The caret offset one grapheme cluster before `offset`, or `None` at
    /// the start of the text.
    pub fn prev_grapheme_offset(&self, offset: usize) -> Option<usize> {
        if offset == 0 {
            return None;
        }
        let at = byte_of_char(&self.content, offset.min(self.len()));
        let grapheme = self.content[..at].graphemes(true).next_back()?;
        Some(offset - grapheme.chars().count())
    }

    /// The caret offset at the end of the word after `offset` (skipping
    /// intervening whitespace), clamped to the end of the text.
    pub fn next_word_offset(&self, offset: usize) -> usize {
        let at = byte_of_char(&self.content, offset.min(self.len()));
        for (start, word) in self.content.split_word_bound_indices() {
            let end = start + word.len();
            if end <= at || word.trim().is_empty() {
                continue;
            }
            return char_of_byte(&self.content, end);
        }
        self.len()
    }

    /// The caret offset at the start of the word before `offset` (skipping
    /// intervening whitespace), clamped to the start of the text.
    pub fn prev_word_offset(&self, offset: usize) -> usize {
        let at = byte_of_char(&self.content, offset.min(self.len()));
        for (start, word) in self.content.split_word_bound_indices().rev() {
            if start >= at || word.trim().is_empty() {
                continue;
            }
            return char_of_byte(&self.content, start);
        }
        0
    }

    fn check_span_range(&self, range: &RangeInclusive<usize>) -> Result<(usize, usize), TextError> {
        let (start, end) = (*range.start(), *range.end());
        let len = self.len();
        if start > end || end >= len {
            return Err(TextError::InvalidSpanRange { start, end, len });
        }
        Ok((start, end))
    }
}

impl Default for AttributedText {
    fn default() -> Self {
        Self::new("")
    }
}

impl From<&str> for AttributedText {
    fn from(content: &str) -> Self {
        Self::new(content)
    }
}

impl From<String> for AttributedText {
    fn from(content: String) -> Self {
        Self::new(content)
    }
}

impl fmt::Display for AttributedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

fn overlaps(span: &AttributionSpan, start: usize, end: usize) -> bool {
    span.start.max(start) < span.end.min(end)
}

fn byte_of_char(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

fn char_of_byte(text: &str, byte_offset: usize) -> usize {
    text[..byte_offset].chars().count()
}
