use anyhow::Result;
use owo_colors::OwoColorize;
use worknest_core::SessionStore;

use crate::app::session_store;

pub fn show() -> Result<()> {
    let store = session_store()?;
    let entries = store.entries()?;

    println!("{} {}", "Session".bold(), store.path().display().dimmed());
    if entries.is_empty() {
        println!("  {}", "(empty)".dimmed());
    }
    for (key, value) in entries {
        println!("  {key} = {value}");
    }
    Ok(())
}

pub fn set(key: &str, value: &str) -> Result<()> {
    session_store()?.set(key, value)?;
    println!("{}", format!("  Set {key}").green());
    Ok(())
}

pub fn unset(key: &str) -> Result<()> {
    session_store()?.remove(key)?;
    println!("{}", format!("  Removed {key}").green());
    Ok(())
}
