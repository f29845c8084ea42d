//! Style interval algebra.
//!
//! Pure functions over a single block's interval list. For any one label the
//! intervals of a block are kept sorted by `start` and never overlap; every
//! function here preserves that.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::editing::{Block, StyleInterval, selection::Span};

/// Insert `interval` at its sorted position (after intervals with the same start)
pub fn insert_interval(block: &mut Block, interval: StyleInterval) {
    let index = block
        .styles
        .partition_point(|existing| existing.start <= interval.start);
    block.styles.insert(index, interval);
}

/// Apply `label` over `start..end`, merging with intervals of the same label.
///
/// Intervals that overlap or touch the range are unioned with it, unless they
/// carry different metadata: those are carved out of the range first (or left
/// alone when they merely abut it), so distinct metadata is never silently
/// merged. An interval spanning exactly `start..end` just takes the new meta.
pub fn apply_style_at(
    block: &mut Block,
    start: usize,
    end: usize,
    label: &str,
    meta: Option<Value>,
) {
    if start >= end {
        return;
    }

    let conflicting = |style: &StyleInterval| {
        meta.is_some() && style.meta != meta && (style.start != start || style.end != end)
    };

    let needs_carving = block.styles.iter().any(|style| {
        style.style == label && style.start < end && style.end > start && conflicting(style)
    });
    if needs_carving {
        remove_style_at(block, start, end, Some(label));
    }

    let mut merged_start = start;
    let mut merged_end = end;
    block.styles.retain(|style| {
        if style.style != label || style.start > end || style.end < start {
            return true;
        }
        if conflicting(style) {
            // Only abutting intervals survive carving; they stay separate
            return true;
        }
        merged_start = merged_start.min(style.start);
        merged_end = merged_end.max(style.end);
        false
    });

    insert_interval(
        block,
        StyleInterval {
            start: merged_start,
            end: merged_end,
            style: label.to_string(),
            meta,
        },
    );
}

/// Remove formatting over `start..end` for one label, or for every label when `label` is `None`.
///
/// Contained intervals are dropped, containing intervals are split in two and
/// partially overlapping ones are trimmed at the range boundary.
pub fn remove_style_at(block: &mut Block, start: usize, end: usize, label: Option<&str>) {
    if start >= end {
        return;
    }

    let mut remainders = Vec::new();
    block.styles.retain_mut(|style| {
        if label.is_some_and(|label| style.style != label) {
            return true;
        }
        if style.end <= start || style.start >= end {
            return true;
        }

        if style.start >= start && style.end <= end {
            false
        } else if style.start < start && style.end > end {
            remainders.push(StyleInterval {
                start: end,
                ..style.clone()
            });
            style.end = start;
            true
        } else {
            if style.start < start {
                style.end = start;
            } else {
                style.start = end;
            }
            true
        }
    });

    block.styles.extend(remainders);
    block.styles.sort_by_key(|style| style.start);
}

/// Shift every interval bound at or after `offset` by `-delta`.
///
/// Used after `delta` chars were removed at `offset` (positive delta) or
/// `-delta` chars were inserted there (negative delta). Intervals that collapse
/// are dropped.
pub fn move_styles(block: &mut Block, offset: usize, delta: isize) {
    if delta == 0 {
        return;
    }
    for style in block.styles.iter_mut() {
        if style.start >= offset {
            style.start = style.start.saturating_add_signed(-delta);
        }
        if style.end >= offset {
            style.end = style.end.saturating_add_signed(-delta);
        }
    }
    block.styles.retain(|style| !style.is_degenerate());
}

/// Clamp every interval to `len` chars, dropping those left empty
pub(crate) fn clip_styles(block: &mut Block, len: usize) {
    for style in block.styles.iter_mut() {
        style.end = style.end.min(len);
    }
    block.styles.retain(|style| !style.is_degenerate());
}

/// The interval of `label` in `block` that covers all of `start..end`, if any
pub fn covering<'a>(
    block: &'a Block,
    label: &str,
    start: usize,
    end: usize,
) -> Option<&'a StyleInterval> {
    block
        .styles
        .iter()
        .find(|style| style.style == label && style.start <= start && style.end >= end)
}

/// Labels active over the whole of `span`, keyed to their covering interval in
/// the first touched block.
///
/// A collapsed span reports the labels whose interval contains the caret
/// (both bounds inclusive). For an expanded span, blocks whose touched range is
/// empty (a selection starting at the very end of a block) are ignored.
pub fn active_styles(blocks: &[Block], span: &Span) -> BTreeMap<String, StyleInterval> {
    let mut active = BTreeMap::new();

    let mut ranges: Vec<(&Block, usize, usize)> = (span.start_index..=span.end_index)
        .filter_map(|index| blocks.get(index).map(|block| (index, block)))
        .map(|(index, block)| {
            let (start, end) = span.range_in(index, block);
            (block, start, end)
        })
        .collect();
    if !span.is_collapsed() {
        ranges.retain(|(_, start, end)| start < end);
    }

    let Some(&(first, first_start, first_end)) = ranges.first() else {
        return active;
    };

    for candidate in &first.styles {
        if active.contains_key(&candidate.style) {
            continue;
        }
        let Some(cover) = covering(first, &candidate.style, first_start, first_end) else {
            continue;
        };
        let covers_all = ranges
            .iter()
            .all(|(block, start, end)| covering(block, &candidate.style, *start, *end).is_some());
        if covers_all {
            active.insert(candidate.style.clone(), cover.clone());
        }
    }

    active
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::selection::Point;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn block(text: &str, styles: Vec<StyleInterval>) -> Block {
        Block::new("1").with_text(text).with_styles(styles)
    }

    fn bold(start: usize, end: usize) -> StyleInterval {
        StyleInterval::new(start, end, "bold")
    }

    fn assert_well_formed(block: &Block) {
        for (i, a) in block.styles.iter().enumerate() {
            assert!(a.start < a.end, "degenerate interval {a:?}");
            assert!(a.end <= block.len(), "interval {a:?} past end of text");
            for b in &block.styles[i + 1..] {
                assert!(a.start <= b.start, "unsorted: {a:?} before {b:?}");
                if a.style == b.style {
                    assert!(a.end <= b.start, "overlap: {a:?} and {b:?}");
                }
            }
        }
    }

    #[test]
    fn test_apply_inserts_sorted() {
        let mut b = block("abcdefgh", vec![bold(4, 6)]);
        apply_style_at(&mut b, 0, 2, "bold", None);
        apply_style_at(&mut b, 1, 3, "italic", None);

        assert_eq!(
            b.styles,
            vec![bold(0, 2), StyleInterval::new(1, 3, "italic"), bold(4, 6)]
        );
        assert_well_formed(&b);
    }

    #[rstest]
    #[case::overlapping_left(vec![bold(0, 3)], 2, 5, vec![bold(0, 5)])]
    #[case::overlapping_right(vec![bold(4, 7)], 2, 5, vec![bold(2, 7)])]
    #[case::abutting(vec![bold(0, 2)], 2, 4, vec![bold(0, 4)])]
    #[case::bridging_two(vec![bold(0, 2), bold(4, 6)], 1, 5, vec![bold(0, 6)])]
    #[case::contained(vec![bold(0, 8)], 2, 4, vec![bold(0, 8)])]
    #[case::disjoint(vec![bold(0, 1)], 3, 4, vec![bold(0, 1), bold(3, 4)])]
    fn test_apply_merges_same_label(
        #[case] existing: Vec<StyleInterval>,
        #[case] start: usize,
        #[case] end: usize,
        #[case] expected: Vec<StyleInterval>,
    ) {
        let mut b = block("abcdefgh", existing);
        apply_style_at(&mut b, start, end, "bold", None);
        assert_eq!(b.styles, expected);
        assert_well_formed(&b);
    }

    #[test]
    fn test_apply_empty_range_is_noop() {
        let mut b = block("abc", vec![]);
        apply_style_at(&mut b, 2, 2, "bold", None);
        assert!(b.styles.is_empty());
    }

    #[test]
    fn test_apply_with_different_meta_carves_out() {
        let link = |start, end, href: &str| {
            StyleInterval::new(start, end, "link").with_meta(json!(href))
        };
        let mut b = block("abcdefgh", vec![link(0, 8, "a")]);

        apply_style_at(&mut b, 2, 4, "link", Some(json!("b")));

        assert_eq!(
            b.styles,
            vec![link(0, 2, "a"), link(2, 4, "b"), link(4, 8, "a")]
        );
        assert_well_formed(&b);
    }

    #[test]
    fn test_apply_with_different_meta_abutting_stays_separate() {
        let link = |start, end, href: &str| {
            StyleInterval::new(start, end, "link").with_meta(json!(href))
        };
        let mut b = block("abcdefgh", vec![link(0, 2, "a")]);

        apply_style_at(&mut b, 2, 5, "link", Some(json!("b")));

        assert_eq!(b.styles, vec![link(0, 2, "a"), link(2, 5, "b")]);
    }

    #[test]
    fn test_apply_same_span_replaces_meta() {
        let mut b = block(
            "abcd",
            vec![StyleInterval::new(1, 3, "link").with_meta(json!("old"))],
        );

        apply_style_at(&mut b, 1, 3, "link", Some(json!("new")));

        assert_eq!(
            b.styles,
            vec![StyleInterval::new(1, 3, "link").with_meta(json!("new"))]
        );
    }

    #[test]
    fn test_apply_same_meta_merges() {
        let mut b = block(
            "abcdefgh",
            vec![StyleInterval::new(0, 3, "color").with_meta(json!("red"))],
        );

        apply_style_at(&mut b, 2, 6, "color", Some(json!("red")));

        assert_eq!(
            b.styles,
            vec![StyleInterval::new(0, 6, "color").with_meta(json!("red"))]
        );
    }

    #[test]
    fn test_remove_trims_right_part() {
        let mut b = block("ab", vec![bold(0, 2)]);
        remove_style_at(&mut b, 1, 2, Some("bold"));
        assert_eq!(b.styles, vec![bold(0, 1)]);
    }

    #[rstest]
    #[case::contained(vec![bold(2, 4)], vec![])]
    #[case::containing(vec![bold(0, 8)], vec![bold(0, 2), bold(5, 8)])]
    #[case::left_overlap(vec![bold(0, 3)], vec![bold(0, 2)])]
    #[case::right_overlap(vec![bold(4, 7)], vec![bold(5, 7)])]
    #[case::abutting_untouched(vec![bold(0, 2), bold(5, 6)], vec![bold(0, 2), bold(5, 6)])]
    fn test_remove_cases(
        #[case] existing: Vec<StyleInterval>,
        #[case] expected: Vec<StyleInterval>,
    ) {
        let mut b = block("abcdefgh", existing);
        remove_style_at(&mut b, 2, 5, Some("bold"));
        assert_eq!(b.styles, expected);
        assert_well_formed(&b);
    }

    #[test]
    fn test_remove_without_label_clears_everything_in_range() {
        let mut b = block(
            "abcdef",
            vec![bold(0, 4), StyleInterval::new(2, 6, "italic")],
        );
        remove_style_at(&mut b, 1, 5, None);

        assert_eq!(
            b.styles,
            vec![bold(0, 1), StyleInterval::new(5, 6, "italic")]
        );
    }

    #[test]
    fn test_remove_other_label_untouched() {
        let mut b = block("abcdef", vec![StyleInterval::new(0, 6, "italic")]);
        remove_style_at(&mut b, 1, 5, Some("bold"));
        assert_eq!(b.styles, vec![StyleInterval::new(0, 6, "italic")]);
    }

    #[test]
    fn test_remove_twice_is_idempotent() {
        let mut b = block("abcdefgh", vec![bold(0, 8)]);
        remove_style_at(&mut b, 2, 5, Some("bold"));
        let after_first = b.styles.clone();
        remove_style_at(&mut b, 2, 5, Some("bold"));
        assert_eq!(b.styles, after_first);
    }

    #[test]
    fn test_move_styles_after_insertion() {
        // Two chars inserted at offset 2
        let mut b = block("abXYcd", vec![bold(0, 2), bold(2, 4)]);
        move_styles(&mut b, 2, -2);
        assert_eq!(b.styles, vec![bold(0, 4), bold(4, 6)]);
    }

    #[test]
    fn test_move_styles_drops_degenerate() {
        // Char at offset 3 removed (caret was at 4)
        let mut b = block("abcef", vec![bold(3, 4), bold(0, 2)]);
        move_styles(&mut b, 4, 1);
        assert_eq!(b.styles, vec![bold(0, 2)]);
    }

    #[test]
    fn test_covering() {
        let b = block("abcdef", vec![bold(1, 4)]);
        assert!(covering(&b, "bold", 1, 4).is_some());
        assert!(covering(&b, "bold", 2, 2).is_some());
        assert!(covering(&b, "bold", 0, 2).is_none());
        assert!(covering(&b, "italic", 2, 3).is_none());
    }

    fn span(start: (usize, usize), end: (usize, usize), blocks: &[Block]) -> Span {
        Span {
            start: Point::new(blocks[start.0].id.clone(), start.1),
            end: Point::new(blocks[end.0].id.clone(), end.1),
            start_index: start.0,
            end_index: end.0,
        }
    }

    #[test]
    fn test_active_styles_single_block() {
        let blocks = vec![block("abcdef", vec![bold(1, 4), StyleInterval::new(0, 2, "em")])];

        let active = active_styles(&blocks, &span((0, 1), (0, 4), &blocks));
        assert_eq!(active.keys().map(String::as_str).collect::<Vec<_>>(), vec!["bold"]);

        let caret = active_styles(&blocks, &span((0, 2), (0, 2), &blocks));
        assert_eq!(caret.keys().map(String::as_str).collect::<Vec<_>>(), vec!["bold", "em"]);
    }

    #[test]
    fn test_active_styles_across_blocks() {
        let blocks = vec![
            Block::new("1").with_text("abc").with_styles(vec![bold(1, 3)]),
            Block::new("2").with_text("de").with_styles(vec![bold(0, 2)]),
            Block::new("3").with_text("fgh").with_styles(vec![bold(0, 1)]),
        ];

        let covered = active_styles(&blocks, &span((0, 1), (2, 1), &blocks));
        assert!(covered.contains_key("bold"));

        let too_wide = active_styles(&blocks, &span((0, 0), (2, 1), &blocks));
        assert!(too_wide.is_empty());

        let past_end = active_styles(&blocks, &span((0, 1), (2, 2), &blocks));
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_active_styles_requires_interior_coverage() {
        let blocks = vec![
            Block::new("1").with_text("abc").with_styles(vec![bold(0, 3)]),
            Block::new("2").with_text("plain"),
            Block::new("3").with_text("fgh").with_styles(vec![bold(0, 3)]),
        ];

        let active = active_styles(&blocks, &span((0, 0), (2, 3), &blocks));
        assert!(active.is_empty());
    }
}
