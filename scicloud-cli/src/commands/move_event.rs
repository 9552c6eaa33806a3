use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scicloud_core::TimeOfDay;

use crate::app::App;
use crate::render::Render;

/// Reschedule the way a drag-and-drop does: same duration, new date and start.
pub async fn run(app: &App, id: &str, date: NaiveDate, start: TimeOfDay) -> Result<()> {
    let id = app.resolve_id(id).await?;
    let event = app
        .repository
        .get_event(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event not found: {}", id))?;

    let mut controller = app.controller(event.date).await?;
    controller.begin_drag(id.clone());
    let moved = controller.handle_drop(&id, date, start).await?;

    println!("{} {}", "Moved".yellow(), moved.render());
    Ok(())
}
