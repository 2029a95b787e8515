//! The `recall init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("recall.toml").exists() {
        println!("recall.toml already exists, skipping.");
    } else {
        std::fs::write("recall.toml", SAMPLE_CONFIG)?;
        println!("Created recall.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit recall.toml and point api_url at your server");
    println!("  2. Run: recall login --username <name> --password <password>");
    println!("  3. Run: recall courses");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# recall configuration

api_url = "http://localhost:8080"

# Where the bearer token is kept between runs.
# token_path = "~/.config/recall/token"

# Launching from a Telegram Mini-App? Paste its init data here
# and skip `recall login` entirely.
# telegram_init_data = "${RECALL_TMA}"
"#;
