use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A named style or semantic tag applied over a character range.
///
/// Attributions are what rich-text spans carry: visual styles like bold and
/// italics, semantic tags like links, and host-defined tags via [`Attribution::Named`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Attribution {
    Bold,
    Italics,
    Underline,
    Strikethrough,
    Code,
    /// A hyperlink carrying its destination URL.
    Link(String),
    /// Escape hatch for host-defined tags (comment threads, mentions, etc.).
    Named(String),
}

/// One attribution applied over a half-open `[start, end)` character range.
///
/// A zero-length span (`start == end`) is a marker: it carries no characters
/// but records an attribution boundary at an insertion point.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributionSpan {
    pub attribution: Attribution,
    pub start: usize,
    pub end: usize,
}

impl AttributionSpan {
    pub fn new(attribution: Attribution, start: usize, end: usize) -> Self {
        Self {
            attribution,
            start,
            end,
        }
    }

    pub fn is_marker(&self) -> bool {
        self.start == self.end
    }
}

/// Canonicalize a span set: merge overlapping and touching spans that carry
/// the same attribution, absorb markers covered by a wider span, and order
/// the result by `(start, end, attribution)`.
///
/// Every `AttributedText` keeps its spans in this form, which is what makes
/// derived equality and hashing order-independent.
pub(crate) fn normalize_spans(spans: Vec<AttributionSpan>) -> Vec<AttributionSpan> {
    let mut by_attribution: BTreeMap<Attribution, Vec<(usize, usize)>> = BTreeMap::new();
    for span in spans {
        debug_assert!(span.start <= span.end);
        by_attribution
            .entry(span.attribution)
            .or_default()
            .push((span.start, span.end));
    }

    let mut out = Vec::new();
    for (attribution, mut ranges) in by_attribution {
        ranges.sort_unstable();
        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (start, end) in ranges {
            match merged.last_mut() {
                Some((_, merged_end)) if start <= *merged_end => {
                    *merged_end = (*merged_end).max(end);
                }
                _ => merged.push((start, end)),
            }
        }
        out.extend(
            merged
                .into_iter()
                .map(|(start, end)| AttributionSpan::new(attribution.clone(), start, end)),
        );
    }

    out.sort_by(|a, b| {
        (a.start, a.end)
            .cmp(&(b.start, b.end))
            .then_with(|| a.attribution.cmp(&b.attribution))
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(attribution: Attribution, start: usize, end: usize) -> AttributionSpan {
        AttributionSpan::new(attribution, start, end)
    }

    #[test]
    fn test_normalize_merges_overlapping_identical_attributions() {
        let spans = vec![
            span(Attribution::Bold, 0, 4),
            span(Attribution::Bold, 2, 8),
        ];

        assert_eq!(normalize_spans(spans), vec![span(Attribution::Bold, 0, 8)]);
    }

    #[test]
    fn test_normalize_merges_touching_spans() {
        let spans = vec![
            span(Attribution::Italics, 0, 3),
            span(Attribution::Italics, 3, 6),
        ];

        assert_eq!(
            normalize_spans(spans),
            vec![span(Attribution::Italics, 0, 6)]
        );
    }

    #[test]
    fn test_normalize_keeps_distinct_attributions_apart() {
        let spans = vec![
            span(Attribution::Bold, 0, 4),
            span(Attribution::Italics, 0, 4),
        ];

        let normalized = normalize_spans(spans);
        assert_eq!(normalized.len(), 2);
    }

    #[test]
    fn test_normalize_absorbs_covered_markers() {
        let spans = vec![
            span(Attribution::Bold, 0, 5),
            span(Attribution::Bold, 3, 3),
        ];

        assert_eq!(normalize_spans(spans), vec![span(Attribution::Bold, 0, 5)]);
    }

    #[test]
    fn test_normalize_keeps_isolated_markers() {
        let spans = vec![span(Attribution::Bold, 7, 7)];

        assert_eq!(normalize_spans(spans), vec![span(Attribution::Bold, 7, 7)]);
    }

    #[test]
    fn test_normalize_is_order_independent() {
        let forward = normalize_spans(vec![
            span(Attribution::Bold, 0, 2),
            span(Attribution::Link("https://example.com".into()), 4, 8),
        ]);
        let reversed = normalize_spans(vec![
            span(Attribution::Link("https://example.com".into()), 4, 8),
            span(Attribution::Bold, 0, 2),
        ]);

        assert_eq!(forward, reversed);
    }
}
