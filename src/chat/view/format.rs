//! Day grouping and human-readable labels.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::chat::core::types::Message;

/// Messages that share a calendar day, in server order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayGroup<'a> {
    /// Calendar day in the viewer's time zone.
    pub day: NaiveDate,
    /// Divider label (`Today`, `Yesterday`, `3 March`, ...).
    pub label: String,
    /// Messages of that day.
    pub messages: Vec<&'a Message>,
}

/// Group messages by calendar day in `now`'s time zone.
///
/// Order is never changed: groups appear in order of first occurrence and
/// messages keep their position within a group.
#[must_use]
pub fn group_by_day<'a, Tz: TimeZone>(messages: &'a [Message], now: &DateTime<Tz>) -> Vec<DayGroup<'a>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut groups: Vec<DayGroup<'a>> = Vec::new();

    for message in messages {
        let day = message.sent_at.with_timezone(&tz).date_naive();
        match groups.iter_mut().rev().find(|group| group.day == day) {
            Some(group) => group.messages.push(message),
            None => groups.push(DayGroup {
                day,
                label: day_divider_label(day, today),
                messages: vec![message],
            }),
        }
    }

    groups
}

/// Divider label for a calendar day relative to `today`.
#[must_use]
pub fn day_divider_label(day: NaiveDate, today: NaiveDate) -> String {
    match (today - day).num_days() {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        _ if day.year() == today.year() => day.format("%-d %B").to_string(),
        _ => day.format("%-d %B %Y").to_string(),
    }
}

/// Clock time of a message in the viewer's time zone.
#[must_use]
pub fn message_time_label<Tz: TimeZone>(sent_at: &DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    sent_at.with_timezone(tz).format("%H:%M").to_string()
}

/// Compact timestamp for a conversation list entry.
#[must_use]
pub fn conversation_time_label<Tz: TimeZone>(at: Option<&DateTime<Utc>>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(at) = at else {
        return String::new();
    };
    let local = at.with_timezone(&now.timezone());
    match (now.date_naive() - local.date_naive()).num_days() {
        0 => local.format("%H:%M").to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => local.format("%a").to_string(),
        _ => local.format("%-d.%-m").to_string(),
    }
}

/// Coarse "time ago" label used by the notification list.
#[must_use]
pub fn relative_time_label(at: &DateTime<Utc>, now: &DateTime<Utc>) -> String {
    let elapsed = *now - *at;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "now".to_string()
    } else if minutes < 60 {
        format!("{minutes} min ago")
    } else if hours < 24 {
        format!("{hours} h ago")
    } else if days == 1 {
        "Yesterday".to_string()
    } else if days < 7 {
        format!("{days} days ago")
    } else {
        at.format("%-d %b").to_string()
    }
}

/// Cut `text` to `max_chars` characters, marking the cut with `...`.
#[must_use]
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

/// Badge text for an unread counter; `None` hides the badge.
#[must_use]
pub fn badge_label(count: u32, cap: u32) -> Option<String> {
    match count {
        0 => None,
        n if n > cap => Some(format!("{cap}+")),
        n => Some(n.to_string()),
    }
}
