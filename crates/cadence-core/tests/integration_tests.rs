use cadence_core::error::{CoreError, ParseError, RuleError};
use cadence_core::models::*;
use cadence_core::recurrence::*;
use cadence_core::{apply_exceptions, Frequency, RuleDescriptor, WeekdayNum};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rstest::rstest;

/// Helper function to build a date
fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// Helper function to build a date-time on the hour
fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, 0, 0).expect("valid test time")
}

/// Helper function to create managers for both engines
fn manager(engine: EngineKind) -> RecurrenceManager {
    RecurrenceManager::new(ExpansionConfig {
        engine,
        ..Default::default()
    })
}

fn parse(text: &str) -> RuleDescriptor {
    text.parse().expect("valid test rule")
}

#[rstest]
#[case::native(EngineKind::Native)]
#[case::rrule(EngineKind::Rrule)]
fn test_daily_week(#[case] engine: EngineKind) {
    let occurrences = manager(engine)
        .occurrences_between(
            &parse("FREQ=DAILY"),
            at(2024, 1, 1, 0),
            at(2024, 1, 1, 0),
            at(2024, 1, 8, 0),
        )
        .unwrap();
    let days: Vec<u32> = occurrences.iter().map(|dt| dt.day()).collect();
    assert_eq!(days, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[rstest]
#[case::native(EngineKind::Native)]
#[case::rrule(EngineKind::Rrule)]
fn test_biweekly_tuesday_thursday(#[case] engine: EngineKind) {
    // 2024-01-02 is a Tuesday
    let anchor = at(2024, 1, 2, 10);
    let occurrences = manager(engine)
        .occurrences_between(
            &parse("FREQ=WEEKLY;INTERVAL=2;BYDAY=TU,TH"),
            anchor,
            at(2024, 1, 1, 0),
            at(2024, 4, 1, 0),
        )
        .unwrap();

    assert!(!occurrences.is_empty());
    for occurrence in &occurrences {
        assert!(matches!(occurrence.weekday(), Weekday::Tue | Weekday::Thu));
        let weeks_from_anchor = (occurrence.date() - date(2024, 1, 1)).num_days() / 7;
        assert_eq!(weeks_from_anchor % 2, 0, "{occurrence} is in an off week");
    }
}

#[rstest]
#[case::native(EngineKind::Native)]
#[case::rrule(EngineKind::Rrule)]
fn test_count_exhausted_before_window(#[case] engine: EngineKind) {
    let occurrences = manager(engine)
        .occurrences_between(
            &parse("FREQ=DAILY;COUNT=5"),
            at(2024, 1, 1, 0),
            at(2024, 1, 10, 0),
            at(2024, 2, 1, 0),
        )
        .unwrap();
    assert!(occurrences.is_empty());
}

#[rstest]
#[case::native(EngineKind::Native)]
#[case::rrule(EngineKind::Rrule)]
fn test_until_date_inclusive(#[case] engine: EngineKind) {
    let occurrences = manager(engine)
        .occurrences_between(
            &parse("FREQ=DAILY;UNTIL=20240105"),
            at(2024, 1, 1, 9),
            at(2024, 1, 1, 0),
            at(2024, 2, 1, 0),
        )
        .unwrap();
    assert_eq!(occurrences.len(), 5);
    assert_eq!(occurrences.last(), Some(&at(2024, 1, 5, 9)));
}

#[rstest]
#[case::native(EngineKind::Native)]
#[case::rrule(EngineKind::Rrule)]
fn test_last_day_of_month(#[case] engine: EngineKind) {
    let occurrences = manager(engine)
        .occurrences_between(
            &parse("FREQ=MONTHLY;BYMONTHDAY=-1"),
            at(2024, 1, 31, 0),
            at(2024, 1, 1, 0),
            at(2024, 7, 1, 0),
        )
        .unwrap();
    let dates: Vec<NaiveDate> = occurrences.iter().map(|dt| dt.date()).collect();
    assert_eq!(
        dates,
        vec![
            date(2024, 1, 31),
            date(2024, 2, 29),
            date(2024, 3, 31),
            date(2024, 4, 30),
            date(2024, 5, 31),
            date(2024, 6, 30),
        ]
    );
}

#[rstest]
#[case("FREQ=DAILY;COUNT=3", at(2024, 1, 3, 9), None)]
#[case("FREQ=DAILY;COUNT=3", at(2024, 1, 2, 9), Some(at(2024, 1, 3, 9)))]
#[case("FREQ=WEEKLY;UNTIL=20240115", at(2024, 1, 8, 9), Some(at(2024, 1, 15, 9)))]
#[case("FREQ=YEARLY", at(2024, 1, 1, 9), Some(at(2025, 1, 1, 9)))]
fn test_next_occurrence_after(
    #[case] rule: &str,
    #[case] after: NaiveDateTime,
    #[case] expected: Option<NaiveDateTime>,
) {
    let next = RecurrenceManager::with_defaults()
        .next_occurrence_after(&parse(rule), at(2024, 1, 1, 9), after)
        .unwrap();
    assert_eq!(next, expected);
}

#[rstest]
#[case("FREQ=HOURLY")]
#[case("FREQ=MINUTELY;INTERVAL=5")]
#[case("FREQ=SECONDLY")]
fn test_sub_daily_frequencies_rejected(#[case] text: &str) {
    let err = text.parse::<RuleDescriptor>().unwrap_err();
    assert!(matches!(err, ParseError::UnsupportedFrequency(_)));
}

#[rstest]
#[case("FREQ=DAILY;COUNT=2;UNTIL=20240101", RuleError::CountAndUntil)]
#[case("FREQ=DAILY;INTERVAL=0", RuleError::InvalidInterval(0))]
#[case(
    "FREQ=MONTHLY;BYYEARDAY=100",
    RuleError::YearlyOnlyField { field: "BYYEARDAY", frequency: Frequency::Monthly }
)]
#[case(
    "FREQ=WEEKLY;BYWEEKNO=20",
    RuleError::YearlyOnlyField { field: "BYWEEKNO", frequency: Frequency::Weekly }
)]
fn test_construction_errors(#[case] text: &str, #[case] expected: RuleError) {
    let err = text.parse::<RuleDescriptor>().unwrap_err();
    assert_eq!(err, ParseError::Rule(expected));
}

#[test]
fn test_invalid_window_is_an_error() {
    let result = RecurrenceManager::with_defaults().occurrences_between(
        &parse("FREQ=DAILY"),
        at(2024, 1, 1, 0),
        at(2024, 1, 5, 0),
        at(2024, 1, 1, 0),
    );
    assert!(matches!(result, Err(CoreError::InvalidWindow { .. })));
}

#[test]
fn test_bounded_expander_over_both_engines_agree() {
    let rule = RuleDescriptor::builder(Frequency::Monthly)
        .by_week_days([WeekdayNum::nth(-1, Weekday::Fri)])
        .count(6)
        .build()
        .unwrap();
    let anchor = at(2024, 1, 26, 17);
    let native = manager(EngineKind::Native)
        .occurrences_between(&rule, anchor, at(2024, 3, 1, 0), at(2025, 1, 1, 0))
        .unwrap();
    let delegated = manager(EngineKind::Rrule)
        .occurrences_between(&rule, anchor, at(2024, 3, 1, 0), at(2025, 1, 1, 0))
        .unwrap();
    assert_eq!(native, delegated);
    // Jan and Feb fall before the window; four of the six remain
    assert_eq!(native.len(), 4);
    assert_eq!(native.last(), Some(&at(2024, 6, 28, 17)));
}

#[test]
fn test_lunch_region_workflow() {
    let mut lunch = TimeRegion::new(at(2024, 1, 1, 12), at(2024, 1, 1, 13));
    lunch.label = Some("Lunch".to_string());
    lunch.block_interaction = true;
    lunch.recurrence_rule = Some("FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR".to_string());

    let workweek: Vec<TimeRegion> = date(2024, 1, 8)
        .iter_days()
        .take(7)
        .filter_map(|day| lunch.expanded_for_date(day))
        .collect();

    assert_eq!(workweek.len(), 5);
    for region in &workweek {
        assert_eq!(region.start.time(), lunch.start.time());
        assert_eq!(region.duration(), Duration::hours(1));
        assert!(region.block_interaction);
        assert!(!region.is_recurring());
    }
}

#[test]
fn test_day_region_and_time_region_share_boundary_rules() {
    let mut day = DayRegion::new(date(2024, 1, 1));
    day.recurrence_rule = Some("FREQ=DAILY;UNTIL=20240105".to_string());
    let mut time = TimeRegion::new(at(2024, 1, 1, 23), at(2024, 1, 2, 0));
    time.recurrence_rule = day.recurrence_rule.clone();

    for offset in 0..7 {
        let on = date(2024, 1, 1) + Duration::days(offset);
        assert_eq!(
            day.applies_to(on),
            time.expanded_for_date(on).is_some(),
            "regions disagree on {on}"
        );
    }
    assert!(day.applies_to(date(2024, 1, 5)));
    assert!(!day.applies_to(date(2024, 1, 6)));
}

#[test]
fn test_weekly_series_with_deletion() {
    let rule = parse("FREQ=WEEKLY;COUNT=10");
    let anchor = at(2024, 1, 1, 9);
    let occurrences = get_occurrences(&rule, anchor, anchor, at(2025, 1, 1, 0)).unwrap();
    assert_eq!(occurrences.len(), 10);

    let fourth = occurrences[3];
    let exceptions = vec![RecurrenceException::Deleted {
        original_date: fourth.date(),
    }];
    let result = apply_exceptions(occurrences, &exceptions);
    assert_eq!(result.len(), 9);
    assert!(result.iter().all(|dt| dt.date() != fourth.date()));
}

#[test]
fn test_event_json_round_trip() {
    let mut event = CalendarEvent::new("Planning", at(2024, 1, 1, 9), at(2024, 1, 1, 10));
    event.recurrence_rule = Some("FREQ=WEEKLY;BYDAY=MO".to_string());
    event.recurrence_exceptions = vec![RecurrenceException::Deleted {
        original_date: date(2024, 1, 8),
    }];

    let json = serde_json::to_string(&event).unwrap();
    let back: CalendarEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);

    let occurrences =
        back.occurrences_between(default_manager(), at(2024, 1, 1, 0), at(2024, 1, 22, 0));
    let starts: Vec<NaiveDateTime> = occurrences.iter().map(|event| event.start).collect();
    assert_eq!(starts, vec![at(2024, 1, 1, 9), at(2024, 1, 15, 9)]);
}

#[test]
fn test_rule_descriptor_serde_as_text() {
    let rule = parse("freq=monthly;byday=-1fr;count=3");
    let json = serde_json::to_value(&rule).unwrap();
    assert_eq!(json, serde_json::json!("FREQ=MONTHLY;COUNT=3;BYDAY=-1FR"));
    let back: RuleDescriptor = serde_json::from_value(json).unwrap();
    assert_eq!(back, rule);
}
