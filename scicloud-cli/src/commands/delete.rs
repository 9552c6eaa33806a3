use anyhow::Result;
use dialoguer::Confirm;
use owo_colors::OwoColorize;
use scicloud_core::CalendarView;

use crate::app::App;
use crate::render::Render;

pub async fn run(app: &App, id: &str, yes: bool) -> Result<()> {
    let id = app.resolve_id(id).await?;
    let event = app
        .repository
        .get_event(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event not found: {}", id))?;

    println!("{}", event.render());

    // Confirm unless --yes
    if !yes {
        let confirmed = Confirm::new()
            .with_prompt("Delete this event?")
            .default(false)
            .interact()?;

        if !confirmed {
            return Ok(());
        }
    }

    let collection = app.collection(CalendarView::Day, Some(event.date)).await?;
    collection.delete(&id).await?;

    println!("{}", "Deleted".red());
    Ok(())
}
