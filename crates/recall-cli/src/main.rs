//! recall CLI: terminal front end for the flashcard service.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use uuid::Uuid;

use recall_core::model::UserAnswerStatus;

mod commands;

use commands::App;

#[derive(Parser)]
#[command(name = "recall", version, about = "Spaced-repetition flashcards in the terminal")]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a username and password
    Login {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,
    },

    /// Forget the stored token
    Logout,

    /// List courses
    Courses,

    /// List the modules of a course
    Modules {
        /// Course slug
        #[arg(long)]
        course: String,
    },

    /// List every card
    Cards,

    /// Start a new test session
    Start {
        /// Course slug
        #[arg(long)]
        course: String,

        /// Module ids (comma-separated, default: all modules)
        #[arg(long, value_delimiter = ',')]
        modules: Vec<i64>,

        /// Shuffle the cards
        #[arg(long)]
        shuffle: bool,
    },

    /// List test sessions with their statistics
    Sessions,

    /// Show one test session
    Session {
        uuid: Uuid,
    },

    /// Show the next unanswered card of a test session
    Next {
        /// Test session uuid
        uuid: Uuid,

        /// Reveal the answer as well
        #[arg(long)]
        reveal: bool,
    },

    /// Record an answer: remember or forgot
    Answer {
        /// User answer uuid (shown by `recall next`)
        uuid: Uuid,

        status: UserAnswerStatus,
    },

    /// Show the answer leaderboard
    Leaderboard,

    /// Probe the change feed
    Changes,

    /// Print live events until the stream closes
    Events {
        /// Stop after this many events
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Create a starter config
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("recall=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        command => match App::load(cli.config.as_deref()) {
            Ok(app) => {
                let result = run(&app, command).await;
                app.render_notifications();
                if app.report_expiry() && result.is_ok() {
                    process::exit(1);
                }
                result
            }
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(app: &App, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Login { username, password } => {
            commands::auth::login(app, &username, &password).await
        }
        Commands::Logout => commands::auth::logout(app),
        Commands::Courses => commands::catalog::courses(app).await,
        Commands::Modules { course } => commands::catalog::modules(app, &course).await,
        Commands::Cards => commands::catalog::cards(app).await,
        Commands::Leaderboard => commands::catalog::leaderboard(app).await,
        Commands::Start {
            course,
            modules,
            shuffle,
        } => commands::sessions::start(app, course, modules, shuffle).await,
        Commands::Sessions => commands::sessions::list(app).await,
        Commands::Session { uuid } => commands::sessions::show(app, uuid).await,
        Commands::Next { uuid, reveal } => commands::sessions::next(app, uuid, reveal).await,
        Commands::Answer { uuid, status } => commands::sessions::answer(app, uuid, status).await,
        Commands::Changes => commands::live::changes(app).await,
        Commands::Events { limit } => commands::live::events(app, limit).await,
        Commands::Init => commands::init::execute(),
    }
}
