//! iCalendar export.

use chrono::{Days, NaiveDate};
use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::event::Event;
use crate::time::TimeOfDay;

/// Render events as one VCALENDAR document.
pub fn export_ics(events: &[Event]) -> String {
    let mut cal = Calendar::new();

    for event in events {
        cal.push(to_vevent(event));
    }

    strip_ics_bloat(&cal.done().to_string())
}

fn to_vevent(event: &Event) -> icalendar::Event {
    let mut vevent = icalendar::Event::new();
    vevent.uid(&format!("{}@scicloud", event.id));
    vevent.summary(&event.title);
    vevent.add_property("DTSTAMP", chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string());

    match (event.all_day, event.start_time, event.end_time) {
        (false, Some(start), Some(end)) => {
            vevent.add_property("DTSTART", floating(event.date, start));
            vevent.add_property("DTEND", floating(event.date, end));
        }
        _ => {
            // DTEND is exclusive for dates
            let next = event.date.checked_add_days(Days::new(1)).unwrap_or(event.date);
            add_date_property(&mut vevent, "DTSTART", event.date);
            add_date_property(&mut vevent, "DTEND", next);
        }
    }

    vevent.add_property("CATEGORIES", event.category.label());
    if let Some(ref desc) = event.description {
        vevent.description(desc);
    }
    if let Some(ref loc) = event.location {
        vevent.location(loc);
    }
    if let Some(ref color) = event.color {
        vevent.add_property("COLOR", color);
    }

    for attendee in &event.attendees {
        let value = if attendee.contains('@') {
            format!("mailto:{}", attendee)
        } else {
            attendee.clone()
        };
        let mut prop = Property::new("ATTENDEE", value);
        prop.add_parameter("CN", attendee);
        vevent.append_multi_property(prop);
    }

    vevent.done()
}

fn floating(date: NaiveDate, time: TimeOfDay) -> String {
    date.and_time(time.to_naive_time())
        .format("%Y%m%dT%H%M%S")
        .to_string()
}

fn add_date_property(vevent: &mut icalendar::Event, name: &str, date: NaiveDate) {
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    vevent.append_property(prop);
}

/// Use our own PRODID and drop CALSCALE:GREGORIAN (the default).
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:SCICLOUD\r\n");
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
