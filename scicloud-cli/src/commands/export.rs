use std::path::Path;

use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scicloud_core::EventFilter;
use scicloud_core::ics::export_ics;

use crate::app::App;
use crate::render::pluralize;

pub async fn run(
    app: &App,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let filter = EventFilter {
        start_date: from,
        end_date: to,
        ..EventFilter::default()
    };
    let events = app.repository.list_events(&filter).await?;
    let ics = export_ics(&events);

    match output {
        Some(path) => {
            std::fs::write(path, ics)?;
            eprintln!(
                "{} {} {} to {}",
                "Exported".green(),
                events.len(),
                pluralize(events.len()),
                path.display()
            );
        }
        None => print!("{}", ics),
    }

    Ok(())
}
