//! Validate a script and its referenced assets.

use std::path::PathBuf;

use anyhow::Context;
use reelsmith_script_model::LoadedScript;

pub fn run(script: PathBuf) -> anyhow::Result<()> {
    println!("Validating script at: {}", script.display());

    let loaded = LoadedScript::load(&script)
        .with_context(|| format!("Failed to load script {}", script.display()))?;

    println!("  Title: {}", loaded.script.title);
    println!("  Scenes: {}", loaded.script.scenes.len());

    let issues = loaded.validate();
    if issues.is_empty() {
        println!("\nScript is valid.");
        return Ok(());
    }

    println!("\nValidation issues:");
    for issue in &issues {
        println!("  - {issue}");
    }

    let blocking = issues.iter().filter(|issue| issue.is_blocking()).count();
    if blocking > 0 {
        return Err(anyhow::anyhow!(
            "{blocking} blocking issue(s) found; the script cannot be composed"
        ));
    }

    println!(
        "\n{} warning(s) found. Script can be composed.",
        issues.len()
    );
    Ok(())
}
