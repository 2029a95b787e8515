//! The `recall login` and `recall logout` commands.

use anyhow::Result;

use recall_core::Route;

use super::App;

pub async fn login(app: &App, username: &str, password: &str) -> Result<()> {
    if app.session.is_telegram_context() {
        println!("Signed in through Telegram, no password needed.");
        return Ok(());
    }
    app.navigate(&Route::Login)?;

    let outcome = app.client.login(username, password).await?;
    app.settle(outcome)?;

    println!("Logged in as {username} at {}.", app.config.api_url);
    Ok(())
}

pub fn logout(app: &App) -> Result<()> {
    if !app.session.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    app.session.clear_token()?;
    println!("Logged out.");
    Ok(())
}
