//! Tests for the refetch heuristic: a guide is stale once the first channel's
//! last programme no longer starts on local tomorrow or later.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use epg_core::{ChannelFilter, Guide};

fn utc(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

/// One channel whose programmes start at the given XMLTV timestamps.
fn single_channel(starts: &[&str]) -> String {
    let programmes: String = starts
        .iter()
        .map(|start| {
            format!(
                r#"<programme channel="one" start="{start}" stop="{start}"><title>P</title></programme>"#
            )
        })
        .collect();
    format!(
        r#"<tv><channel id="one"><display-name>One</display-name></channel>{programmes}</tv>"#
    )
}

#[test]
fn last_programme_today_is_stale() {
    let doc = single_channel(&["20240310060000 +0000", "20240310200000 +0000"]);
    let guide = Guide::parse(&doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn last_programme_tomorrow_is_fresh() {
    let doc = single_channel(&["20240310060000 +0000", "20240311060000 +0000"]);
    let guide = Guide::parse(&doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(!guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn last_programme_beyond_tomorrow_is_fresh() {
    let doc = single_channel(&["20240310060000 +0000", "20240313060000 +0000"]);
    let guide = Guide::parse(&doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(!guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn local_date_decides_not_utc_date() {
    // 22:30 UTC on the 10th is 00:30 on the 11th in Jerusalem (UTC+2).
    let doc = single_channel(&["20240310223000 +0000"]);
    let now = utc("2024-03-10T08:00:00Z");

    let local = Guide::parse(&doc, "Asia/Jerusalem".parse().unwrap(), &ChannelFilter::All).unwrap();
    assert!(!local.is_stale_at(now));

    let utc_guide = Guide::parse(&doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(utc_guide.is_stale_at(now));
}

#[test]
fn local_now_rolls_over_before_utc() {
    // 23:00 UTC on the 10th is already the 11th in Jerusalem, so "tomorrow"
    // is the 12th and a guide ending on the 11th is stale.
    let doc = single_channel(&["20240311100000 +0000"]);
    let guide = Guide::parse(&doc, "Asia/Jerusalem".parse().unwrap(), &ChannelFilter::All).unwrap();
    assert!(!guide.is_stale_at(utc("2024-03-10T21:00:00Z")));
    assert!(guide.is_stale_at(utc("2024-03-10T23:00:00Z")));
}

#[test]
fn only_last_programme_in_list_order_counts() {
    // Document order, not chronological order: the last listed starts today.
    let doc = single_channel(&["20240311060000 +0000", "20240310060000 +0000"]);
    let guide = Guide::parse(&doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn only_first_channel_is_inspected() {
    let doc = r#"<tv>
        <channel id="short"><display-name>Short</display-name></channel>
        <channel id="long"><display-name>Long</display-name></channel>
        <programme channel="short" start="20240310060000 +0000" stop="20240310070000 +0000"><title>A</title></programme>
        <programme channel="long" start="20240311060000 +0000" stop="20240311070000 +0000"><title>B</title></programme>
    </tv>"#;
    let guide = Guide::parse(doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn zero_channels_is_always_stale() {
    let guide = Guide::parse("<tv/>", Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn empty_first_channel_is_always_stale() {
    let doc = r#"<tv>
        <channel id="empty"><display-name>Empty</display-name></channel>
        <channel id="full"><display-name>Full</display-name></channel>
        <programme channel="full" start="20240311060000 +0000" stop="20240311070000 +0000"><title>B</title></programme>
    </tv>"#;
    let guide = Guide::parse(doc, Tz::UTC, &ChannelFilter::All).unwrap();
    assert!(guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}

#[test]
fn filter_changes_which_channel_is_first() {
    let doc = r#"<tv>
        <channel id="short"><display-name>Short</display-name></channel>
        <channel id="long"><display-name>Long</display-name></channel>
        <programme channel="short" start="20240310060000 +0000" stop="20240310070000 +0000"><title>A</title></programme>
        <programme channel="long" start="20240311060000 +0000" stop="20240311070000 +0000"><title>B</title></programme>
    </tv>"#;
    let guide = Guide::parse(doc, Tz::UTC, &ChannelFilter::from_names(["Long"])).unwrap();
    assert!(!guide.is_stale_at(utc("2024-03-10T08:00:00Z")));
}
