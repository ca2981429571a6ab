use ::ics::escape_text;
use chrono::NaiveDateTime;

use crate::{Calendar, Event, TimeZoneId};

const PRODUCT_ID: &str = "-//Schedule Export//EN";

fn format_date_time(date_time: &NaiveDateTime) -> String {
    date_time.format("%Y%m%dT%H%M%S").to_string()
}

/// Serializes events into one iCalendar document, keeping their order.
///
/// Date-times carry `TZID=<timezone_id>` instead of being converted to UTC.
/// Text values are escaped; lines are joined by `\n` and left unfolded.
#[must_use]
pub fn encode(events: &[Event], timezone_id: &str) -> String {
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODUCT_ID}"),
        "CALSCALE:GREGORIAN".to_string(),
    ];

    for event in events {
        lines.extend(event.to_ics_lines(timezone_id));
    }

    lines.push("END:VCALENDAR".to_string());
    lines.join("\n")
}

impl Event {
    #[must_use]
    pub fn to_ics_lines(&self, timezone_id: &str) -> [String; 8] {
        [
            "BEGIN:VEVENT".to_string(),
            format!("UID:{}", self.uid),
            format!("DTSTART;TZID={timezone_id}:{}", format_date_time(&self.start)),
            format!("DTEND;TZID={timezone_id}:{}", format_date_time(&self.end)),
            format!("SUMMARY:{}", escape_text(self.title.as_str())),
            format!("LOCATION:{}", escape_text(self.location.as_str())),
            format!("DESCRIPTION:{}", escape_text(self.description.as_str())),
            "END:VEVENT".to_string(),
        ]
    }
}

impl Calendar {
    #[must_use]
    pub fn to_ics(&self, time_zone: &TimeZoneId) -> String {
        encode(&self.events, time_zone.as_str())
    }
}
