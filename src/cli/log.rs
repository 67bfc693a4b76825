use crate::error::Result;
use crate::pipeline::RUN_LOG_NAME;
use crate::settings::load_settings;

pub fn run(lines: usize) -> Result<()> {
    let folder = load_settings().watched_folder()?;
    let path = folder.join(RUN_LOG_NAME);
    if !path.exists() {
        println!("No run log yet at {}", path.display());
        return Ok(());
    }

    let content = std::fs::read_to_string(&path)?;
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    for line in &all[start..] {
        println!("{line}");
    }
    Ok(())
}
