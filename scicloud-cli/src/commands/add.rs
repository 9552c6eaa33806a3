use anyhow::Result;
use chrono::NaiveDate;
use owo_colors::OwoColorize;
use scicloud_core::{EventDraft, SciCloudError, SciCloudResult};

use crate::EventFields;
use crate::app::App;
use crate::render::Render;

pub async fn run(
    app: &App,
    title: String,
    date: Option<NaiveDate>,
    all_day: bool,
    fields: EventFields,
) -> Result<()> {
    let date = match date {
        Some(date) => date,
        None => app.config.clock()?.today(),
    };
    let mut controller = app.controller(date).await?;

    controller.open_create_dialog(Some(date), fields.start);
    if let Some(draft) = controller.draft_mut() {
        draft.title = title;
        draft.all_day = all_day;
        apply_fields(draft, fields);
    }

    let event = report(controller.submit().await)?;
    println!("{} {}", "Created".green(), event.render());
    Ok(())
}

/// Copy the optional CLI fields onto a draft.
///
/// A new start without a new end keeps the draft's current duration.
pub fn apply_fields(draft: &mut EventDraft, fields: EventFields) {
    if let Some(start) = fields.start {
        let duration = match (draft.start_time, draft.end_time) {
            (Some(s), Some(e)) if e > s => (e.minutes() - s.minutes()) as i64,
            _ => 60,
        };
        draft.start_time = Some(start);
        if fields.end.is_none() {
            draft.end_time = Some(start.add_minutes(duration));
        }
    }
    if let Some(end) = fields.end {
        draft.end_time = Some(end);
    }
    if let Some(description) = fields.description {
        draft.description = Some(description);
    }
    if let Some(category) = fields.category {
        draft.category = category;
    }
    if let Some(location) = fields.location {
        draft.location = Some(location);
    }
    if let Some(color) = fields.color {
        draft.color = Some(color);
    }
    if !fields.attendees.is_empty() {
        draft.attendees = fields.attendees;
    }
}

/// Print field errors before handing the failure back.
pub fn report<T>(result: SciCloudResult<T>) -> Result<T> {
    result.map_err(|e| {
        if let SciCloudError::ValidationFailed(errors) = &e {
            for error in errors {
                eprintln!("{}", error.render());
            }
        }
        e.into()
    })
}
