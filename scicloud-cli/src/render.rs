//! TUI rendering traits for scicloud types.
//!
//! Extension traits that add colored terminal rendering to scicloud-core
//! types using owo_colors.

use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scicloud_core::validation::FieldError;
use scicloud_core::{Category, Event};

/// Extension trait for TUI rendering with colors.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for Category {
    fn render(&self) -> String {
        let (r, g, b) = hex_to_rgb(Category::default_color(*self)).unwrap_or((128, 128, 128));
        format!("[{}]", self.label()).truecolor(r, g, b).to_string()
    }
}

impl Render for Event {
    /// One line: time, colored title, category tag and short id.
    fn render(&self) -> String {
        let (r, g, b) = hex_to_rgb(self.display_color()).unwrap_or((128, 128, 128));
        format!(
            "{} {} {} {}",
            format_time_range(self),
            self.title.truecolor(r, g, b).bold(),
            self.category.render(),
            short_id(self).dimmed()
        )
    }
}

impl Render for FieldError {
    fn render(&self) -> String {
        format!("  {} {}", "✗".red(), self.to_string().red())
    }
}

/// Multi-line detail view for `show`.
pub fn render_detail(event: &Event) -> String {
    let mut lines = vec![event.render()];

    lines.push(format!("  {:<12}{}", "Date".dimmed(), event.date.format("%a %b %-d, %Y")));
    lines.push(format!("  {:<12}{}", "Id".dimmed(), event.id));
    if let Some(ref location) = event.location {
        lines.push(format!("  {:<12}{}", "Location".dimmed(), location));
    }
    if !event.attendees.is_empty() {
        lines.push(format!("  {:<12}{}", "Attendees".dimmed(), event.attendees.join(", ")));
    }
    if let Some(ref description) = event.description {
        lines.push(String::new());
        lines.extend(description.lines().map(|l| format!("  {}", l)));
    }

    lines.join("\n")
}

/// Format the time portion of an event (e.g. "09:00-10:30" or "all-day")
pub fn format_time_range(event: &Event) -> String {
    match (event.all_day, event.start_time, event.end_time) {
        (false, Some(start), Some(end)) => format!("{}-{}", start, end),
        _ => format!("{:<11}", "all-day"),
    }
}

/// Format a date as a human-readable label (e.g. "Today", "Tomorrow", "Wed Feb 25")
pub fn format_date_label(date: NaiveDate, today: NaiveDate) -> String {
    match (date - today).num_days() {
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        -1 => "Yesterday".to_string(),
        _ => date.format("%a %b %-d").to_string(),
    }
}

fn short_id(event: &Event) -> String {
    event.id.as_str().chars().take(8).collect()
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Simple pluralization helper
pub fn pluralize(count: usize) -> &'static str {
    if count == 1 { "event" } else { "events" }
}
