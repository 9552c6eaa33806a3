use anyhow::Result;
use owo_colors::OwoColorize;
use scicloud_core::{Event, EventFilter};

use crate::app::App;
use crate::render::{Render, pluralize};

pub async fn run(app: &App, filter: EventFilter, json: bool) -> Result<()> {
    let events = app.repository.list_events(&filter).await?;
    print_events(&events, json)
}

pub async fn search(app: &App, query: &str, filter: EventFilter, json: bool) -> Result<()> {
    let events = app.repository.search_events(query, &filter).await?;
    print_events(&events, json)
}

fn print_events(events: &[Event], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(events)?);
        return Ok(());
    }

    if events.is_empty() {
        println!("{}", "No events found".dimmed());
        return Ok(());
    }

    for event in events {
        println!("{}  {}", event.date.format("%Y-%m-%d").dimmed(), event.render());
    }
    println!("\n{} {}", events.len(), pluralize(events.len()));
    Ok(())
}
