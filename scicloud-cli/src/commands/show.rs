use anyhow::Result;

use crate::app::App;
use crate::render::render_detail;

pub async fn run(app: &App, id: &str) -> Result<()> {
    let id = app.resolve_id(id).await?;
    let event = app
        .repository
        .get_event(&id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Event not found: {}", id))?;

    println!("{}", render_detail(&event));
    Ok(())
}
