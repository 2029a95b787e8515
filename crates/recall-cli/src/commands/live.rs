//! The `recall changes` and `recall events` commands.

use anyhow::{Context, Result};

use recall_client::events;
use recall_core::Route;

use super::App;

pub async fn changes(app: &App) -> Result<()> {
    app.navigate(&Route::Main)?;

    match app.settle(app.client.get_changes().await?)? {
        Some(body) => println!("{body}"),
        None => println!("No changes in progress."),
    }
    Ok(())
}

pub async fn events(app: &App, limit: Option<usize>) -> Result<()> {
    app.navigate(&Route::Main)?;

    let mut stream = events::open(&app.session)?;
    eprintln!("Listening on {}/api/events (Ctrl-C to stop)", app.session.api_url());

    let mut seen = 0usize;
    while let Some(item) = stream.next().await {
        let event = match item {
            Ok(event) => event,
            Err(e) => {
                app.session.close_event_stream();
                return Err(e).context(format!("event stream failed after {seen} event(s)"));
            }
        };
        println!("{}: {}", event.event_type, event.data);
        seen += 1;
        if limit.is_some_and(|max| seen >= max) {
            break;
        }
    }

    app.session.close_event_stream();
    eprintln!("Event stream closed after {seen} event(s).");
    Ok(())
}
