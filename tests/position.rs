mod common;
use common::*;
use flowsync::position::{LineIndex, Span, to_offset, to_position};
use flowsync::prelude::*;
use rstest::rstest;

const TEXT: &str = "a😀b\nxy";

#[rstest]
#[case((0, 0), Some(0))]
#[case((0, 1), Some(1))]
#[case((0, 3), Some(5))]
#[case((0, 4), Some(6))]
#[case((1, 0), Some(7))]
#[case((1, 2), Some(9))]
#[case((0, 2), None)]
#[case((0, 5), None)]
#[case((2, 0), None)]
fn test_offset_of_counts_utf16_units(#[case] position: (usize, usize), #[case] expected: Option<usize>) {
    let at = LinePosition::new(position.0, position.1);
    assert_eq!(to_offset(TEXT, at), expected, "offset of {}", at);
}

#[rstest]
#[case(0, (0, 0))]
#[case(5, (0, 3))]
#[case(6, (0, 4))]
#[case(7, (1, 0))]
#[case(100, (1, 2))]
fn test_position_of_offset(#[case] offset: usize, #[case] expected: (usize, usize)) {
    assert_eq!(to_position(TEXT, offset), LinePosition::new(expected.0, expected.1));
}

#[test]
fn test_position_inside_a_code_point_rounds_down() {
    // Byte 3 is inside the emoji.
    assert_eq!(to_position(TEXT, 3), LinePosition::new(0, 1));
}

#[test]
fn test_line_index_reuse() {
    let index = LineIndex::new(TEXT);
    assert_eq!(index.line_count(), 2);
    for offset in [0, 1, 5, 6, 7, 8, 9] {
        let position = index.position_of(TEXT, offset);
        assert_eq!(index.offset_of(TEXT, position), Some(offset));
    }
}

#[test]
fn test_positions_order_by_line_then_column() {
    let mut positions = vec![
        LinePosition::new(2, 0),
        LinePosition::new(0, 9),
        LinePosition::new(1, 4),
        LinePosition::new(1, 2),
    ];
    positions.sort();
    assert_eq!(
        positions,
        vec![
            LinePosition::new(0, 9),
            LinePosition::new(1, 2),
            LinePosition::new(1, 4),
            LinePosition::new(2, 0),
        ]
    );
}

#[rstest]
#[case(((1, 0), (3, 1)), ((1, 4), (2, 0)), true)]
#[case(((1, 0), (3, 1)), ((1, 0), (3, 1)), true)]
#[case(((1, 0), (3, 1)), ((0, 5), (2, 0)), false)]
#[case(((1, 0), (3, 1)), ((3, 0), (3, 2)), false)]
fn test_contains(
    #[case] outer: ((usize, usize), (usize, usize)),
    #[case] inner: ((usize, usize), (usize, usize)),
    #[case] expected: bool,
) {
    assert_eq!(range(outer.0, outer.1).contains(&range(inner.0, inner.1)), expected);
}

#[test]
fn test_contains_requires_same_file() {
    let other = LineRange::from_coords("other.bal", (1, 4), (2, 0));
    assert!(!range((1, 0), (3, 1)).contains(&other));
}

#[rstest]
#[case(((1, 0), (1, 9)), ((1, 9), (2, 0)), true)]
#[case(((1, 0), (1, 9)), ((1, 4), (1, 5)), true)]
#[case(((1, 0), (1, 9)), ((1, 10), (2, 0)), false)]
#[case(((3, 0), (4, 0)), ((1, 0), (2, 9)), false)]
fn test_intersects(
    #[case] a: ((usize, usize), (usize, usize)),
    #[case] b: ((usize, usize), (usize, usize)),
    #[case] expected: bool,
) {
    let (a, b) = (range(a.0, a.1), range(b.0, b.1));
    assert_eq!(a.intersects(&b), expected);
    assert_eq!(b.intersects(&a), expected);
}

#[test]
fn test_ends_before_is_strict() {
    let first = range((1, 0), (1, 9));
    assert!(first.ends_before(&range((1, 10), (1, 12))));
    assert!(!first.ends_before(&range((1, 9), (1, 12))));
    assert!(!range((1, 10), (1, 12)).ends_before(&first));
}

#[test]
fn test_same_span_ignores_file() {
    let other = LineRange::from_coords("other.bal", (1, 0), (3, 1));
    assert!(range((1, 0), (3, 1)).same_span(&other));
    assert_ne!(range((1, 0), (3, 1)), other);
}

#[test]
fn test_range_display_and_span() {
    let r = range((1, 0), (3, 1));
    assert_eq!(r.to_string(), "main.bal:1:0-3:1");
    assert_eq!(
        r.span(),
        Span::new(LinePosition::new(1, 0), LinePosition::new(3, 1))
    );
    assert!(Span::point(LinePosition::new(2, 2)).is_empty());
}

#[test]
fn test_range_serializes_in_camel_case() {
    let json = serde_json::to_value(range((1, 0), (3, 1))).expect("Range should serialize");
    assert_eq!(json["file"], FILE);
    assert_eq!(json["startLine"], 1);
    assert_eq!(json["endCol"], 1);
}
