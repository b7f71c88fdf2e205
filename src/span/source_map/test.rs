use crate::span::{span, FileName, SourceMap, Spanning};

#[test]
fn spans_are_offset_by_the_file_padding() {
    let mut map = SourceMap::default();
    let file = map.add_str(FileName::Anonymous, "let x = 5;");

    assert_eq!(map[file].span(), span(1, 11));
    assert_eq!(map.snippet(span(1, 4)), "let");
    assert_eq!(map.snippet(span(5, 6)), "x");
}

#[test]
fn consecutive_files_do_not_overlap() {
    let mut map = SourceMap::default();
    let first = map.add_str(FileName::Anonymous, "aaa");
    let second = map.add_str(FileName::Anonymous, "bbb");

    assert_eq!(map[first].span(), span(1, 4));
    assert_eq!(map[second].span(), span(5, 8));
    assert_eq!(map.snippet(span(5, 8)), "bbb");
}

#[test]
fn line_resolution() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "first\nsecond line\nthird");

    // `second` on line 2: local 6..12, global 7..13
    let line = map.line_with_highlight(span(7, 13));
    assert_eq!(line.number, 2);
    assert_eq!(line.content, "second line");
    assert_eq!(line.prefix, "");
    assert_eq!(line.highlight.start, 1);
    assert_eq!(line.highlight.end, 7);
    assert_eq!(line.highlight.width, 6);

    // `line` on line 2: local 13..17, global 14..18
    let line = map.line_with_highlight(span(14, 18));
    assert_eq!(line.prefix, "second ");
    assert_eq!(line.highlight.start, 8);
}

#[test]
fn multi_line_highlights_are_clamped_to_the_first_line() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "alpha\nbeta");

    // `pha\nbe`: local 2..8, global 3..9
    let line = map.line_with_highlight(span(3, 9));
    assert_eq!(line.number, 1);
    assert_eq!(line.content, "alpha");
    assert_eq!(line.highlight.start, 3);
    assert_eq!(line.highlight.end, 6);
}

#[test]
fn end_of_input_location() {
    let mut map = SourceMap::default();
    map.add_str(FileName::Anonymous, "ab");

    let line = map.line_with_highlight(span(3, 3));
    assert_eq!(line.number, 1);
    assert_eq!(line.content, "ab");
    assert_eq!(line.highlight.start, 3);
    assert_eq!(line.highlight.width, 1);
}
