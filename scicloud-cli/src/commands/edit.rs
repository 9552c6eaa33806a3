use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;

use crate::EventFields;
use crate::app::App;
use crate::commands::add::{apply_fields, report};
use crate::render::Render;

pub async fn run(
    app: &App,
    id: &str,
    title: Option<String>,
    date: Option<NaiveDate>,
    all_day: Option<bool>,
    fields: EventFields,
) -> Result<()> {
    let id = app.resolve_id(id).await?;
    let event = app
        .repository
        .get_event(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event not found: {}", id))?;

    // Overlap is checked against the events on the target date
    let mut controller = app.controller(date.unwrap_or(event.date)).await?;
    controller.open_edit_dialog(&event);

    if let Some(draft) = controller.draft_mut() {
        if let Some(title) = title {
            draft.title = title;
        }
        if let Some(date) = date {
            draft.date = Some(date);
        }
        if let Some(all_day) = all_day {
            draft.all_day = all_day;
        }
        apply_fields(draft, fields);
    }

    let updated = report(controller.submit().await)?;
    println!("{} {}", "Updated".yellow(), updated.render());
    Ok(())
}
