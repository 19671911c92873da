use crate::models::event;

use super::Recipient;

fn when(event: &event::Model) -> (String, String) {
    let fmt = if event.all_day_event {
        "%Y-%m-%d"
    } else {
        "%Y-%m-%d %H:%M UTC"
    };
    (
        event.time_event_start.format(fmt).to_string(),
        event.time_event_stop.format(fmt).to_string(),
    )
}

/// Plain-text body of a notification
pub fn render_text(recipient: &Recipient, event: &event::Model) -> String {
    let (start, stop) = when(event);
    let mut body = format!(
        "Hello {},\n\nThis is a reminder about an upcoming event.\n\nEvent: {}\nStart: {}\nEnd: {}\n",
        recipient.username, event.title, start, stop
    );
    if let Some(details) = event.details.as_deref().filter(|d| !d.trim().is_empty()) {
        body.push_str(&format!("Details: {}\n", details));
    }
    body.push_str("\n---\nSent by the Reminder notification service\n");
    body
}

/// HTML alternative of [`render_text`]
pub fn render_html(recipient: &Recipient, event: &event::Model) -> String {
    let (start, stop) = when(event);
    let details = event
        .details
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!("<p><strong>Details:</strong> {}</p>", escape(d)))
        .unwrap_or_default();

    format!(
        "<html><body>\
         <p>Hello {},</p>\
         <p>This is a reminder about an upcoming event.</p>\
         <h3>{}</h3>\
         <p><strong>Start:</strong> {}<br><strong>End:</strong> {}</p>\
         {}\
         <hr><p><small>Sent by the Reminder notification service</small></p>\
         </body></html>",
        escape(&recipient.username),
        escape(&event.title),
        start,
        stop,
        details
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(all_day: bool, details: Option<&str>) -> event::Model {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap();
        event::Model {
            id: 1,
            title: "Dentist <2>".to_string(),
            details: details.map(str::to_string),
            time_creation: start,
            all_day_event: all_day,
            time_event_start: start,
            time_event_stop: start + chrono::Duration::hours(1),
            to_notify: true,
            time_notify: None,
            notification_sent: false,
            is_active: true,
            author_id: 1,
        }
    }

    fn alice() -> Recipient {
        Recipient {
            user_id: 2,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
        }
    }

    #[test]
    fn test_text_includes_times_and_details() {
        let text = render_text(&alice(), &event(false, Some("Bring card")));

        assert!(text.starts_with("Hello alice,"));
        assert!(text.contains("Start: 2026-03-14 09:30 UTC"));
        assert!(text.contains("Details: Bring card"));
    }

    #[test]
    fn test_all_day_event_omits_time() {
        let text = render_text(&alice(), &event(true, None));

        assert!(text.contains("Start: 2026-03-14\n"));
        assert!(!text.contains("Details:"));
    }

    #[test]
    fn test_html_escapes_title() {
        let html = render_html(&alice(), &event(false, None));

        assert!(html.contains("Dentist &lt;2&gt;"));
        assert!(!html.contains("<2>"));
    }
}
