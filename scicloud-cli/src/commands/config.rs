use anyhow::Result;
use owo_colors::OwoColorize;
use scicloud_core::SciCloudConfig;

pub fn path() -> Result<()> {
    let config_path = SciCloudConfig::config_path()?;
    let config = SciCloudConfig::load()?;

    println!("{}", "Paths".bold());
    println!("  Config:  {}", config_path.display());
    println!("  Data:    {}", config.data_path().display());

    Ok(())
}

pub fn show() -> Result<()> {
    let config = SciCloudConfig::load()?;
    println!("{}", describe(&config)?);
    Ok(())
}

pub fn set_owner(owner: &str) -> Result<()> {
    let owner = owner.trim();
    if owner.is_empty() {
        anyhow::bail!("Owner id must not be empty");
    }

    let mut config = SciCloudConfig::load()?;
    config.owner = Some(owner.to_string());
    config.save()?;

    println!("{} {}", "Owner set to".green(), owner.bold());
    Ok(())
}

fn describe(config: &SciCloudConfig) -> Result<String> {
    let mut lines = vec![
        format!("data_dir = {:?}", config.data_path().display().to_string()),
        format!("owner = {}", config.owner.as_deref().unwrap_or("(not set)")),
        format!("timezone = {}", config.timezone.as_deref().unwrap_or("(system)")),
        format!("default_view = {}", config.default_view),
    ];
    let interval = config.refresh_interval()?;
    lines.push(format!("refresh_interval = {} ({}s)", config.refresh_interval, interval.as_secs()));
    lines.push(format!("upcoming_limit = {}", config.upcoming_limit));
    lines.push(format!(
        "layout = hour {} rem, min {} rem, all-day {} rem",
        config.layout.hour_height, config.layout.min_height, config.layout.all_day_height
    ));
    Ok(lines.join("\n"))
}
