//! Tests for pagination module

use super::types::is_truthy;
use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use test_case::test_case;

// ============================================================================
// NextPage Tests
// ============================================================================

#[test]
fn test_next_page_with_param() {
    let next = NextPage::with_param("offset", 5);
    assert!(next.is_continue());
    assert!(!next.is_done());

    if let NextPage::Continue { query_params } = next {
        assert_eq!(query_params.get("offset"), Some(&json!(5)));
    } else {
        panic!("Expected Continue");
    }
}

#[test]
fn test_next_page_done_and_boundary() {
    assert!(NextPage::Done.is_done());
    assert!(!NextPage::Done.is_boundary());
    assert!(NextPage::Boundary.is_done());
    assert!(NextPage::Boundary.is_boundary());
}

// ============================================================================
// PageCursor Tests
// ============================================================================

#[test]
fn test_page_cursor_default() {
    let cursor = PageCursor::new();
    assert_eq!(cursor.pages, 0);
    assert!(cursor.overlay.is_empty());
    assert!(cursor.time_offset.is_none());
    assert!(!cursor.done);
}

#[test]
fn test_page_cursor_advance_replaces_keys() {
    let mut cursor = PageCursor::new();
    cursor.advance(json!({"offset": 5}).as_object().unwrap().clone());
    cursor.advance(json!({"offset": 10, "vidOffset": 3}).as_object().unwrap().clone());
    assert_eq!(
        serde_json::Value::Object(cursor.overlay),
        json!({"offset": 10, "vidOffset": 3})
    );
}

#[test_case(json!(true), true)]
#[test_case(json!(false), false)]
#[test_case(json!(null), false)]
#[test_case(json!(0), false)]
#[test_case(json!(7), true)]
#[test_case(json!(""), false)]
#[test_case(json!("abc"), true)]
#[test_case(json!([]), true)]
fn test_is_truthy(value: serde_json::Value, expected: bool) {
    assert_eq!(is_truthy(&value), expected);
}

// ============================================================================
// HasMorePaginator Tests
// ============================================================================

#[test]
fn test_has_more_offset() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"hasMore": true, "offset": 5}), &mut cursor);
    assert_eq!(next, NextPage::with_param("offset", 5));
    assert_eq!(cursor.pages, 1);
    assert!(!cursor.done);
}

#[test]
fn test_has_more_dashed_flag_and_vid_offset() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(
        &json!({"contacts": [], "has-more": true, "vid-offset": 1234}),
        &mut cursor,
    );
    assert_eq!(next, NextPage::with_param("vidOffset", 1234));
}

#[test]
fn test_both_cursor_fields_copied() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(
        &json!({"has-more": true, "vid-offset": 9, "offset": "abc"}),
        &mut cursor,
    );
    let NextPage::Continue { query_params } = next else {
        panic!("Expected Continue");
    };
    assert_eq!(
        serde_json::Value::Object(query_params),
        json!({"vidOffset": 9, "offset": "abc"})
    );
}

#[test]
fn test_no_more_is_done() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"hasMore": false, "offset": 10}), &mut cursor);
    assert_eq!(next, NextPage::Done);
    assert!(cursor.done);
}

#[test]
fn test_missing_flag_is_done() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();
    assert_eq!(paginator.next_page(&json!([1, 2, 3]), &mut cursor), NextPage::Done);
}

#[test]
fn test_more_without_cursor_stops() {
    let paginator = HasMorePaginator::new();
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"hasMore": true}), &mut cursor);
    assert_eq!(next, NextPage::Done);
    assert!(cursor.done);
}

#[test]
fn test_with_cursors_ignores_other_fields() {
    let paginator = HasMorePaginator::with_cursors(vec![CursorField::new("offset", "offset")]);
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(
        &json!({"hasMore": true, "offset": 20, "vid-offset": 3}),
        &mut cursor,
    );
    assert_eq!(next, NextPage::with_param("offset", 20));
}

// ============================================================================
// Time Cursor Tests
// ============================================================================

#[test]
fn test_time_cursor_within_boundary_continues() {
    let paginator = HasMorePaginator::new().with_time_cursor("time-offset", "timeOffset", 1_000);
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(
        &json!({"has-more": true, "vid-offset": 7, "time-offset": 5_000}),
        &mut cursor,
    );
    let NextPage::Continue { query_params } = next else {
        panic!("Expected Continue");
    };
    assert_eq!(query_params.get("timeOffset"), Some(&json!(5_000)));
    assert_eq!(query_params.get("vidOffset"), Some(&json!(7)));
    assert_eq!(cursor.time_offset, Some(5_000));
}

#[test]
fn test_time_cursor_past_boundary_stops() {
    let paginator = HasMorePaginator::new().with_time_cursor("time-offset", "timeOffset", 1_000);
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(
        &json!({"has-more": true, "vid-offset": 7, "time-offset": 999}),
        &mut cursor,
    );
    assert_eq!(next, NextPage::Boundary);
    assert!(cursor.done);
    assert_eq!(cursor.time_offset, Some(999));
}

#[test]
fn test_time_cursor_equal_to_boundary_continues() {
    let paginator = HasMorePaginator::new().with_time_cursor("time-offset", "timeOffset", 1_000);
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"has-more": true, "time-offset": 1_000}), &mut cursor);
    assert!(next.is_continue());
}

#[test]
fn test_time_cursor_ignored_without_more() {
    let paginator = HasMorePaginator::new().with_time_cursor("time-offset", "timeOffset", 1_000);
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"has-more": false, "time-offset": 1}), &mut cursor);
    assert_eq!(next, NextPage::Done);
}

// ============================================================================
// NoPaginator Tests
// ============================================================================

#[test]
fn test_no_paginator() {
    let paginator = NoPaginator;
    let mut cursor = PageCursor::new();

    let next = paginator.next_page(&json!({"hasMore": true, "offset": 5}), &mut cursor);
    assert_eq!(next, NextPage::Done);
    assert!(cursor.done);
    assert_eq!(cursor.pages, 1);
}
