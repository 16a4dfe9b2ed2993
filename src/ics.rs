use crate::event::{Calendar, CalendarEvent};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};
use std::io::{self, Write};

/// Maximum line length in octets, excluding the CRLF.
const MAX_LINE_OCTETS: usize = 75;

/// Whether `tzid` names a zone of the IANA database.
pub fn is_known_timezone(tzid: &str) -> bool {
    tzid.parse::<Tz>().is_ok()
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ZoneState {
    utc_offset: i32,
    daylight: bool,
    name: String,
}

fn zone_state(tz: Tz, utc: NaiveDateTime) -> ZoneState {
    let offset = tz.offset_from_utc_datetime(&utc);
    ZoneState {
        utc_offset: offset.fix().local_minus_utc(),
        daylight: offset.dst_offset() != TimeDelta::zero(),
        name: offset.to_string(),
    }
}

/// A `STANDARD` or `DAYLIGHT` sub-component.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Observance {
    /// Local time of the switch, in the offset in force before it.
    onset: NaiveDateTime,
    offset_from: i32,
    state: ZoneState,
}

impl Observance {
    fn starting(utc: NaiveDateTime, previous: i32, state: ZoneState) -> Self {
        Self {
            onset: utc + TimeDelta::seconds(i64::from(previous)),
            offset_from: previous,
            state,
        }
    }
}

/// First minute in `(lo, lo + 1h]` whose state differs from `current`.
fn first_change(tz: Tz, lo: NaiveDateTime, current: &ZoneState) -> NaiveDateTime {
    let (mut before, mut after) = (0, 60);
    while after - before > 1 {
        let mid = (before + after) / 2;
        if zone_state(tz, lo + TimeDelta::minutes(mid)) == *current {
            before = mid;
        } else {
            after = mid;
        }
    }
    lo + TimeDelta::minutes(after)
}

/// Observances in force between `from` and `to` (UTC), scanned hour by hour.
fn observances(tz: Tz, from: NaiveDateTime, to: NaiveDateTime) -> Vec<Observance> {
    let mut current = zone_state(tz, from);
    let mut found = vec![Observance::starting(from, current.utc_offset, current.clone())];
    let mut cursor = from;
    while cursor < to {
        let next = cursor + TimeDelta::hours(1);
        let state = zone_state(tz, next);
        if state != current {
            let switch = first_change(tz, cursor, &current);
            found.push(Observance::starting(switch, current.utc_offset, state.clone()));
            current = state;
        }
        cursor = next;
    }
    found
}

/// UTC span covering every event, padded by a day on each side.
fn event_span(events: &[CalendarEvent]) -> (NaiveDateTime, NaiveDateTime) {
    let first = events.iter().map(|e| e.start.date()).min();
    let last = events.iter().map(|e| e.end.date()).max();
    match (first, last) {
        (Some(first), Some(last)) => (
            first.pred_opt().unwrap_or(first).and_time(NaiveTime::MIN),
            last.succ_opt().unwrap_or(last).and_time(NaiveTime::MIN),
        ),
        _ => {
            let epoch = NaiveDate::default().and_time(NaiveTime::MIN);
            (epoch, epoch)
        }
    }
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.unsigned_abs() / 60;
    format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
}

fn vtimezone_lines(tzid: &str, events: &[CalendarEvent]) -> Vec<String> {
    // an unparseable zone id still gets a well-formed block
    let tz = tzid.parse::<Tz>().unwrap_or(Tz::UTC);
    let (from, to) = event_span(events);

    let mut lines = vec!["BEGIN:VTIMEZONE".to_string(), format!("TZID:{tzid}")];
    for observance in observances(tz, from, to) {
        let kind = if observance.state.daylight {
            "DAYLIGHT"
        } else {
            "STANDARD"
        };
        lines.push(format!("BEGIN:{kind}"));
        lines.push(format!("DTSTART:{}", local_time(observance.onset)));
        lines.push(format!(
            "TZOFFSETFROM:{}",
            format_offset(observance.offset_from)
        ));
        lines.push(format!(
            "TZOFFSETTO:{}",
            format_offset(observance.state.utc_offset)
        ));
        lines.push(format!("TZNAME:{}", escape_text(&observance.state.name)));
        lines.push(format!("END:{kind}"));
    }
    lines.push("END:VTIMEZONE".to_string());
    lines
}

/// Escapes a TEXT value (RFC 5545 §3.3.11).
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            other => out.push(other),
        }
    }
    out
}

/// Splits a content line into CRLF-terminated physical lines of at most 75
/// octets, never cutting a UTF-8 sequence.
pub fn fold_line(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 8);
    let mut width = 0;
    for ch in line.chars() {
        let len = ch.len_utf8();
        if width + len > MAX_LINE_OCTETS {
            out.push_str("\r\n ");
            // the leading space counts towards the continuation line
            width = 1;
        }
        out.push(ch);
        width += len;
    }
    out.push_str("\r\n");
    out
}

fn local_time(value: NaiveDateTime) -> String {
    value.format("%Y%m%dT%H%M%S").to_string()
}

fn utc_time(value: DateTime<Utc>) -> String {
    value.format("%Y%m%dT%H%M%SZ").to_string()
}

fn event_lines(event: &CalendarEvent, tzid: &str) -> Vec<String> {
    let mut lines = vec![
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}", escape_text(&event.uid)),
        format!("DTSTAMP:{}", utc_time(event.stamp)),
        format!("DTSTART;TZID={tzid}:{}", local_time(event.start)),
        format!("DTEND;TZID={tzid}:{}", local_time(event.end)),
        format!("SUMMARY:{}", escape_text(&event.summary)),
    ];
    if let Some(location) = &event.location {
        lines.push(format!("LOCATION:{}", escape_text(location)));
    }
    if let Some(description) = &event.description {
        lines.push(format!("DESCRIPTION:{}", escape_text(description)));
    }
    lines.push("END:VEVENT".to_string());
    lines
}

fn calendar_lines(calendar: &Calendar) -> impl Iterator<Item = String> + '_ {
    let tzid = calendar.timezone.as_str();
    let header = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{}", calendar.metadata.product_id),
        "CALSCALE:GREGORIAN".to_string(),
        "METHOD:PUBLISH".to_string(),
        format!("X-WR-CALNAME:{}", escape_text(&calendar.metadata.calendar_name)),
        format!("X-WR-TIMEZONE:{tzid}"),
    ];
    header
        .into_iter()
        .chain(vtimezone_lines(tzid, &calendar.events))
        .chain(
            calendar
                .events
                .iter()
                .flat_map(move |event| event_lines(event, tzid)),
        )
        .chain(std::iter::once("END:VCALENDAR".to_string()))
}

pub fn write_calendar<W: Write>(mut writer: W, calendar: &Calendar) -> io::Result<()> {
    for line in calendar_lines(calendar) {
        writer.write_all(fold_line(&line).as_bytes())?;
    }
    writer.flush()
}

pub fn to_string(calendar: &Calendar) -> String {
    calendar_lines(calendar).map(|line| fold_line(&line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::metadata::CalendarMetadata;
    use chrono::{NaiveDate, TimeZone};

    fn sample_event(summary: &str) -> CalendarEvent {
        let date = NaiveDate::from_ymd_opt(2024, 9, 16).unwrap();
        CalendarEvent {
            uid: "20240916T080000-0@colloscope".into(),
            kind: EventKind::Lesson,
            summary: summary.into(),
            start: date.and_hms_opt(8, 0, 0).unwrap(),
            end: date.and_hms_opt(8, 55, 0).unwrap(),
            location: Some("B12".into()),
            description: None,
            stamp: Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap(),
        }
    }

    fn sample_calendar(events: Vec<CalendarEvent>) -> Calendar {
        Calendar {
            metadata: CalendarMetadata::default(),
            timezone: "Europe/Paris".into(),
            events,
        }
    }

    #[test]
    fn event_is_written_with_timezone_and_utc_stamp() {
        let ics = sample_calendar(vec![sample_event("Maths")]).to_ics();
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.contains("TZID:Europe/Paris\r\n"));
        assert!(ics.contains("DTSTART;TZID=Europe/Paris:20240916T080000\r\n"));
        assert!(ics.contains("DTEND;TZID=Europe/Paris:20240916T085500\r\n"));
        assert!(ics.contains("DTSTAMP:20240901T120000Z\r\n"));
        assert!(ics.contains("LOCATION:B12\r\n"));
        assert!(!ics.contains("DESCRIPTION"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn text_values_are_escaped() {
        assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    }

    #[test]
    fn long_lines_are_folded_on_char_boundaries() {
        let line = format!("SUMMARY:{}", "é".repeat(60));
        let folded = fold_line(&line);
        for physical in folded.split("\r\n").filter(|l| !l.is_empty()) {
            assert!(physical.len() <= MAX_LINE_OCTETS, "{physical:?}");
        }
        let unfolded = folded.trim_end_matches("\r\n").replace("\r\n ", "");
        assert_eq!(unfolded, line);
    }

    #[test]
    fn write_and_to_string_agree() {
        let calendar = sample_calendar(vec![sample_event("Maths"), sample_event("Physique")]);
        let mut buffer = Vec::new();
        calendar.write_ics(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), calendar.to_ics());
    }

    #[test]
    fn known_timezones() {
        assert!(is_known_timezone("Europe/Paris"));
        assert!(is_known_timezone("UTC"));
        assert!(is_known_timezone("America/Cayenne"));
        assert!(!is_known_timezone("Mars/Olympus"));
    }

    fn event_on(date: NaiveDate) -> CalendarEvent {
        let mut event = sample_event("Maths");
        event.start = date.and_hms_opt(8, 0, 0).unwrap();
        event.end = date.and_hms_opt(8, 55, 0).unwrap();
        event
    }

    #[test]
    fn summer_term_has_a_single_daylight_observance() {
        let ics = sample_calendar(vec![sample_event("Maths")]).to_ics();
        assert_eq!(ics.matches("BEGIN:DAYLIGHT").count(), 1);
        assert!(!ics.contains("BEGIN:STANDARD"));
        assert!(ics.contains("TZOFFSETTO:+0200\r\nTZNAME:CEST\r\n"));
    }

    #[test]
    fn autumn_switch_is_written_in_the_previous_offset() {
        let calendar = sample_calendar(vec![
            event_on(NaiveDate::from_ymd_opt(2024, 10, 21).unwrap()),
            event_on(NaiveDate::from_ymd_opt(2024, 11, 4).unwrap()),
        ]);
        let ics = calendar.to_ics();
        assert!(ics.contains(
            "BEGIN:STANDARD\r\n\
             DTSTART:20241027T030000\r\n\
             TZOFFSETFROM:+0200\r\n\
             TZOFFSETTO:+0100\r\n\
             TZNAME:CET\r\n"
        ));
    }

    #[test]
    fn zones_without_daylight_saving_get_one_standard_block() {
        let mut calendar = sample_calendar(vec![sample_event("Maths")]);
        calendar.timezone = "America/Cayenne".into();
        let ics = calendar.to_ics();
        assert!(ics.contains("TZID:America/Cayenne\r\n"));
        assert_eq!(ics.matches("BEGIN:STANDARD").count(), 1);
        assert!(ics.contains("TZOFFSETFROM:-0300\r\nTZOFFSETTO:-0300\r\n"));
        assert!(!ics.contains("DAYLIGHT"));
    }

    #[test]
    fn offsets_are_formatted_with_sign() {
        assert_eq!(format_offset(3600), "+0100");
        assert_eq!(format_offset(-3 * 3600), "-0300");
        assert_eq!(format_offset(5 * 3600 + 45 * 60), "+0545");
        assert_eq!(format_offset(0), "+0000");
    }
}
