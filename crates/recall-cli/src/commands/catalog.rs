//! Read-only catalog commands: courses, modules, cards, leaderboard.

use anyhow::Result;
use comfy_table::{Cell, Table};

use recall_core::Route;

use super::App;

pub async fn courses(app: &App) -> Result<()> {
    app.navigate(&Route::Main)?;
    let courses = app.settle(app.client.get_all_courses().await?)?;

    if courses.is_empty() {
        println!("No courses yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Slug", "Name"]);
    for course in &courses {
        table.add_row(vec![Cell::new(&course.slug), Cell::new(&course.name)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn modules(app: &App, course: &str) -> Result<()> {
    app.navigate(&Route::Main)?;
    let modules = app.settle(app.client.get_modules_by_course_slug(course).await?)?;

    let mut table = Table::new();
    table.set_header(vec!["Id", "Module"]);
    for module in &modules {
        table.add_row(vec![Cell::new(module.id), Cell::new(&module.name)]);
    }
    println!("{table}");
    println!("{} module(s) in {course}", modules.len());
    Ok(())
}

pub async fn cards(app: &App) -> Result<()> {
    app.navigate(&Route::Main)?;
    let cards = app.settle(app.client.get_all_cards().await?)?;

    let active = cards.iter().filter(|c| c.is_active).count();
    for card in cards.iter().filter(|c| c.is_active) {
        println!("#{} [module {}] {}", card.uid, card.module_id, card.question);
    }
    println!("\n{active} active card(s), {} total", cards.len());
    Ok(())
}

pub async fn leaderboard(app: &App) -> Result<()> {
    app.navigate(&Route::Main)?;
    let entries = app.settle(app.client.get_leaderboard().await?)?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Name", "Remembered", "Forgot", "Answered", "Sessions"]);
    for (rank, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(entry.display_name()),
            Cell::new(entry.remember_count),
            Cell::new(entry.forgot_count),
            Cell::new(entry.answered_count),
            Cell::new(entry.started_sessions),
        ]);
    }
    println!("{table}");
    Ok(())
}
