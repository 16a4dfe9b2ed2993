use chrono::{Datelike, Duration, NaiveDate, Weekday};
use colloscope::rotation::{calendar_week, vacation_adjusted_offset};
use colloscope::{StaticGroup, TermCalendar, TermConfig, changing_group};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn default_term_matches_first_semester_2024() {
    let cal = TermCalendar::default();
    assert_eq!(cal.start_date(), d(2024, 9, 16));
    assert_eq!(cal.start_date().weekday(), Weekday::Mon);
    assert_eq!(cal.term_weeks(), 16);
    assert_eq!(cal.vacation_starts(), &[5, 14]);
    assert_eq!(cal.days_per_week(), 6);
    assert_eq!(cal.timezone(), "Europe/Paris");
}

#[test]
fn last_teaching_week_lands_after_two_vacations() {
    let cal = TermCalendar::default();
    let weeks: Vec<_> = cal.weeks(StaticGroup::A).collect();
    assert_eq!(weeks.len(), 16);

    let jumps: Vec<_> = weeks
        .windows(2)
        .filter(|pair| pair[1].calendar_week - pair[0].calendar_week > 1)
        .map(|pair| (pair[0].nominal, pair[1].calendar_week - pair[0].calendar_week))
        .collect();
    assert_eq!(jumps, vec![(4, 3), (11, 3)]);

    let last = weeks.last().unwrap();
    assert_eq!(last.calendar_week, 19);
    // the term covers 16 + 2 + 2 calendar weeks
    assert_eq!(
        cal.week_start(last.nominal) + Duration::weeks(1),
        cal.start_date() + Duration::weeks(20)
    );
}

#[test]
fn rotation_ignores_vacations() {
    let cal = TermCalendar::default();
    for week in cal.weeks(StaticGroup::A) {
        assert_eq!(week.group, changing_group(StaticGroup::A, week.nominal));
    }
    // weeks 4 and 5 sit on either side of the Toussaint break yet still rotate by one
    let before = changing_group(StaticGroup::A, 4).index();
    let after = changing_group(StaticGroup::A, 5).index();
    assert_eq!((before + 3 - 1) % 3, after);
}

#[test]
fn vacation_offset_is_monotonic_over_long_terms() {
    let vacations = [3, 8, 9, 20];
    let mut previous = 0;
    for week in 0..40 {
        let offset = vacation_adjusted_offset(week, &vacations);
        assert!(offset >= previous);
        previous = offset;
        assert_eq!(calendar_week(week, &vacations), week + offset);
    }
    assert_eq!(previous, 8);
}

#[test]
fn custom_term_is_validated() {
    let config = TermConfig {
        start_date: d(2025, 1, 6),
        term_weeks: 10,
        vacation_starts: vec![6],
        days_per_week: 5,
        ..TermConfig::default()
    };
    let cal = TermCalendar::from_config(&config).unwrap();
    assert_eq!(cal.week_start(6), d(2025, 3, 3));
    assert!(!cal.is_teaching_day(d(2025, 1, 11)));
    assert_eq!(cal.teaching_days().count(), 50);

    let bad = TermConfig {
        term_weeks: 0,
        ..config
    };
    let err = TermCalendar::from_config(&bad).unwrap_err();
    assert!(err.to_string().contains("at least one week"));
}
