use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scicloud_core::CalendarView;

use crate::app::App;
use crate::render::{Render, format_date_label, pluralize};

pub async fn run(app: &App, view: CalendarView, date: Option<NaiveDate>) -> Result<()> {
    let collection = app.collection(view, date).await?;
    let range = collection.visible_range();
    let today = collection.today();

    println!(
        "{} {} - {}",
        format!("{} view", view).bold(),
        range.from.format("%b %-d"),
        range.to.format("%b %-d, %Y")
    );

    let by_date = collection.by_date();
    for day in range.days() {
        println!();
        println!("{}", format_date_label(day, today).bold());

        match by_date.get(&day) {
            Some(events) => {
                for event in events {
                    println!("  {}", event.render());
                }
            }
            None => println!("  {}", "No events".dimmed()),
        }
    }

    Ok(())
}

pub async fn upcoming(app: &App) -> Result<()> {
    let collection = app.collection(CalendarView::Week, None).await?;
    let events = collection.upcoming();
    let today = collection.today();

    if events.is_empty() {
        println!("{}", "No upcoming events".dimmed());
        return Ok(());
    }

    println!("{}", format!("Next {} {}", events.len(), pluralize(events.len())).bold());
    for event in &events {
        println!(
            "  {:<10} {}",
            format_date_label(event.date, today),
            event.render()
        );
    }

    Ok(())
}
