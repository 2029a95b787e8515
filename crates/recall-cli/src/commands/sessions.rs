//! Test session commands: start, list, show, next, answer.

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use recall_core::model::{CreateTestSession, TestSessionDetail, UserAnswerStatus};
use recall_core::Route;

use super::App;

pub async fn start(app: &App, course: String, modules: Vec<i64>, shuffle: bool) -> Result<()> {
    app.navigate(&Route::Main)?;

    let request = CreateTestSession {
        course_slug: course,
        module_ids: modules,
        shuffle,
    };
    let session = app.settle(app.client.create_test_session(&request).await?)?;

    println!("Started test session {}", session.uuid);
    println!("Next: recall next {}", session.uuid);
    Ok(())
}

pub async fn list(app: &App) -> Result<()> {
    app.navigate(&Route::Main)?;
    let sessions = app.settle(app.client.get_test_sessions().await?)?;

    if sessions.is_empty() {
        println!("No test sessions yet. Start one with `recall start --course <slug>`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "Session",
        "Course",
        "Started",
        "Remembered",
        "Forgot",
        "Left",
        "Status",
    ]);
    for s in &sessions {
        let status = if s.is_active { "active" } else { "closed" };
        table.add_row(vec![
            Cell::new(s.uuid),
            Cell::new(&s.course_name),
            Cell::new(s.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(s.count_remember),
            Cell::new(s.count_forget),
            Cell::new(s.count_null),
            Cell::new(status),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show(app: &App, uuid: Uuid) -> Result<()> {
    app.navigate(&Route::Cards(uuid))?;
    let detail = app.settle(app.client.get_test_session(uuid).await?)?;
    print_summary(&detail);

    for (i, answer) in detail.user_answers.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}: {}",
            i + 1,
            answer.status.label(),
            answer.module_name,
            answer.question
        );
    }
    Ok(())
}

pub async fn next(app: &App, uuid: Uuid, reveal: bool) -> Result<()> {
    app.navigate(&Route::Cards(uuid))?;
    let detail = app.settle(app.client.get_test_session(uuid).await?)?;

    let Some(card) = detail.next_pending() else {
        print_summary(&detail);
        println!("Every card has been answered.");
        return Ok(());
    };

    let (remembered, forgot, left) = detail.tally();
    let position = remembered + forgot + 1;
    println!(
        "Card {position}/{} ({})",
        position + left - 1,
        card.module_name
    );
    println!("\n{}\n", card.question);
    if reveal {
        println!("Answer:\n{}\n", card.answer);
    }
    println!("recall answer {} remember|forgot", card.uuid);
    Ok(())
}

pub async fn answer(app: &App, uuid: Uuid, status: UserAnswerStatus) -> Result<()> {
    app.navigate(&Route::Main)?;
    if status.is_pending() {
        anyhow::bail!("answer must be `remember` or `forgot`");
    }

    let update = app.settle(app.client.update_user_answer(uuid, status).await?)?;
    println!("Recorded: {}", update.user_answer.status.label());

    let session = &update.test_session;
    if !session.is_active {
        println!("Test session {} is complete.", session.uuid);
        if let Some(advice) = &session.recommendations {
            println!("\n{advice}");
        }
    } else {
        println!("Next: recall next {}", session.uuid);
    }
    Ok(())
}

fn print_summary(detail: &TestSessionDetail) {
    let session = &detail.test_session;
    let (remembered, forgot, left) = detail.tally();
    println!(
        "Test session {} ({}{})",
        session.uuid,
        if session.is_active { "active" } else { "closed" },
        if session.is_shuffled { ", shuffled" } else { "" }
    );
    println!("Remembered: {remembered}  Forgot: {forgot}  Left: {left}");
    if let Some(advice) = &session.recommendations {
        println!("\nRecommendations:\n{advice}\n");
    }
}
