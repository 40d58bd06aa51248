use chrono::{Duration, NaiveDate, TimeZone, Utc};
use droptrack_core::{DateRange, DisplayZone, TimeError, UtcWindow};

fn la() -> DisplayZone {
    DisplayZone::new("America/Los_Angeles").unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn ordinary_day_resolves_to_a_24_hour_window() {
    let window = DateRange::parse("2024-06-05", "2024-06-05")
        .unwrap()
        .resolve(&la());

    assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 6, 5, 7, 0, 0).unwrap());
    assert_eq!(
        window.end,
        Utc.with_ymd_and_hms(2024, 6, 6, 7, 0, 0).unwrap() - Duration::microseconds(1)
    );
}

#[test]
fn spring_forward_day_resolves_to_a_23_hour_window() {
    // 2024-03-10 loses the 2AM hour; the window must end one tick before
    // 2024-03-11T07:00:00Z, not 08:00:00Z.
    let window = DateRange::parse("2024-03-10", "2024-03-10")
        .unwrap()
        .resolve(&la());

    assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap());
    assert_eq!(
        window.end,
        Utc.with_ymd_and_hms(2024, 3, 11, 7, 0, 0).unwrap() - Duration::microseconds(1)
    );
}

#[test]
fn fall_back_day_resolves_to_a_25_hour_window() {
    let window = DateRange::parse("2024-11-03", "2024-11-03")
        .unwrap()
        .resolve(&la());

    assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 11, 3, 7, 0, 0).unwrap());
    assert_eq!(
        window.end,
        Utc.with_ymd_and_hms(2024, 11, 4, 8, 0, 0).unwrap() - Duration::microseconds(1)
    );
}

#[test]
fn multi_day_range_spans_both_midnights() {
    let window = DateRange::parse("2024-06-01", "2024-06-03")
        .unwrap()
        .resolve(&la());

    assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap());
    assert_eq!(
        window.end,
        Utc.with_ymd_and_hms(2024, 6, 4, 7, 0, 0).unwrap() - Duration::microseconds(1)
    );
}

#[test]
fn window_edges_are_inclusive_start_exclusive_of_prior_tick() {
    let window = DateRange::parse("2024-06-05", "2024-06-05")
        .unwrap()
        .resolve(&la());

    let midnight = Utc.with_ymd_and_hms(2024, 6, 5, 7, 0, 0).unwrap();
    assert!(window.contains(midnight));
    assert!(!window.contains(midnight - Duration::microseconds(1)));

    let next_midnight = Utc.with_ymd_and_hms(2024, 6, 6, 7, 0, 0).unwrap();
    assert!(window.contains(next_midnight - Duration::microseconds(1)));
    assert!(!window.contains(next_midnight));
}

#[test]
fn day_of_matches_the_single_date_range() {
    let zone = la();
    // 01:30 local on the spring-forward morning.
    let instant = Utc.with_ymd_and_hms(2024, 3, 10, 9, 30, 0).unwrap();

    let window = UtcWindow::day_of(instant, &zone);
    let expected = DateRange::parse("2024-03-10", "2024-03-10")
        .unwrap()
        .resolve(&zone);

    assert_eq!(window, expected);
    assert!(window.contains(instant));
}

#[test]
fn reversed_range_is_rejected_not_silently_empty() {
    let err = DateRange::parse("2024-01-05", "2024-01-03").unwrap_err();
    match err {
        TimeError::EmptyRange { start, end } => {
            assert_eq!(start, date(2024, 1, 5));
            assert_eq!(end, date(2024, 1, 3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unparseable_dates_are_rejected() {
    for (start, end) in [
        ("2024/01/05", "2024-01-06"),
        ("2024-01-05", "tomorrow"),
        ("", "2024-01-06"),
        ("2024-02-30", "2024-03-01"),
    ] {
        assert!(
            matches!(
                DateRange::parse(start, end),
                Err(TimeError::InvalidDateFormat(_))
            ),
            "expected InvalidDateFormat for ({start}, {end})"
        );
    }
}

#[test]
fn midnight_in_a_spring_forward_gap_shifts_to_first_valid_instant() {
    // Chile jumps 24:00 -> 01:00, so 2024-09-08 has no local midnight; the
    // day starts at 01:00 -03, i.e. 04:00:00Z.
    let zone = DisplayZone::new("America/Santiago").unwrap();
    let window = DateRange::parse("2024-09-08", "2024-09-08")
        .unwrap()
        .resolve(&zone);

    assert_eq!(window.start, Utc.with_ymd_and_hms(2024, 9, 8, 4, 0, 0).unwrap());
}
