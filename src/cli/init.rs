use std::path::PathBuf;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(folder: Option<String>, spreadsheet: Option<String>) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = folder {
        settings.receipt_folder = shellexpand_path(&dir);
    } else if settings.receipt_folder.is_empty() {
        // First run — prompt for the watched folder
        println!("Receipt folder: ");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input).ok();
        let chosen = input.trim();
        if !chosen.is_empty() {
            settings.receipt_folder = shellexpand_path(chosen);
        }
    }

    if let Some(id) = spreadsheet {
        settings.spreadsheet_id = id;
    }

    save_settings(&settings)?;

    if !settings.receipt_folder.is_empty() {
        let folder = PathBuf::from(&settings.receipt_folder);
        std::fs::create_dir_all(&folder)?;
        println!("Initialized tally; watching {}", folder.display());
    } else {
        println!("Initialized tally (no receipt folder configured yet)");
    }
    Ok(())
}
