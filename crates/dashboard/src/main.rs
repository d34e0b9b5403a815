use anyhow::{bail, Context};
use chess_core::{Classification, CursorStart};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use dashboard::review::{fetch_review, ClassificationBrowser, GameReview};
use dashboard::stats::{move_quality, top_openings, Summary};
use dashboard::{ApiClient, Dashboard, DashboardConfig, JobState};

/// Chess analysis dashboard
#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and request chess game analysis", long_about = None)]
struct Cli {
    /// Player to act for (defaults to DASHBOARD_USERNAME)
    #[arg(global = true, long = "user", short = 'u')]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show analyzed games and stats
    Load,

    /// Analyze more games and wait for them to land
    Analyze {
        /// Number of games to analyze
        #[arg(long = "count", short = 'n', default_value = "5")]
        count: u32,

        /// Only games against this opponent
        #[arg(long = "opponent")]
        opponent: Option<String>,
    },

    /// Review one game
    Game {
        #[arg(value_name = "GAME_ID")]
        id: i64,

        /// Cursor to display (defaults to the final position)
        #[arg(long = "at")]
        at: Option<usize>,
    },

    /// List moves with one classification
    Moves {
        #[arg(value_name = "CLASSIFICATION", value_parser = parse_classification)]
        classification: Classification,

        /// Open the game for the n-th listed move (0-based)
        #[arg(long = "open")]
        open: Option<usize>,
    },

    /// Narrative review of a single move
    Review {
        #[arg(value_name = "MOVE_ID")]
        move_id: i64,
    },
}

fn parse_classification(s: &str) -> Result<Classification, String> {
    Classification::from_label(s).ok_or_else(|| format!("unknown classification '{s}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = DashboardConfig::from_env();
    let client = ApiClient::new(&config.api_url, config.http_timeout)
        .with_context(|| format!("Invalid DASHBOARD_API_URL '{}'", config.api_url))?;

    let username = cli
        .user
        .clone()
        .unwrap_or_else(|| config.username.clone());

    match cli.command {
        Commands::Load => {
            require_user(&username)?;
            let mut page = Dashboard::new(client, &config);
            if !page.load(&username).await {
                bail!("Could not load data for {username}");
            }
            print_overview(&page);
        }
        Commands::Analyze { count, opponent } => {
            require_user(&username)?;
            let mut page = Dashboard::new(client, &config);
            page.load(&username).await;

            let abandon = page.abandon_token();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted, abandoning analysis");
                    abandon.cancel();
                }
            });

            let state = match opponent.as_deref() {
                Some(opponent) => page.start_opponent_analysis(count, opponent).await,
                None => page.start_analysis(count).await,
            };
            if let Some(alert) = page.take_alert() {
                eprintln!("{alert}");
            }
            print_overview(&page);
            if state != JobState::Succeeded {
                bail!("Analysis did not complete ({:?})", page.last_failure());
            }
        }
        Commands::Game { id, at } => {
            let mut review = GameReview::load(&client, id, CursorStart::End).await?;
            if let Some(at) = at {
                review.select_cursor(at);
            }
            let game = review.game();
            println!("{} vs {}", game.white_username, game.black_username);
            for row in review.move_list() {
                let marker = if row.active { ">" } else { " " };
                println!("{marker} {:<6} {:<8} {}", row.label, row.notation, row.classification);
            }
            println!("{}", review.counter());
            if let Some(score) = review.score() {
                println!("Score: {score}");
            }
            println!("{}", review.fen());
        }
        Commands::Moves { classification, open } => {
            require_user(&username)?;
            let mut browser = ClassificationBrowser::load(&client, &username, classification).await?;
            println!("{}", browser.title());
            for (i, mv) in browser.moves().iter().enumerate() {
                println!("{i:>3}  game {:<8} {:<6}", mv.game_id, mv.display_notation());
            }
            if let Some(index) = open {
                let fen = browser.open(&client, index).await?.fen();
                println!("{fen}");
                if let Some(hint) = browser.best_move_hint() {
                    println!("Best move: {hint}");
                }
            }
        }
        Commands::Review { move_id } => {
            println!("{}", fetch_review(&client, move_id).await);
        }
    }

    Ok(())
}

fn require_user(username: &str) -> anyhow::Result<()> {
    if username.trim().is_empty() {
        bail!("No user given; pass --user or set DASHBOARD_USERNAME");
    }
    Ok(())
}

fn print_overview(page: &Dashboard<ApiClient>) {
    println!("{} games for {}", page.games().len(), page.username());
    for card in page.game_cards() {
        println!(
            "  #{:<8} {}  {} | {}",
            card.id,
            card.title,
            card.time_control.as_deref().unwrap_or("-"),
            card.result.as_deref().unwrap_or("-")
        );
    }
    let Some(stats) = page.stats() else {
        return;
    };

    let summary = Summary::from(stats);
    println!(
        "Record {} | Win rate {:.1}% | Accuracy {:.1} | Style {}",
        summary.record, summary.win_rate, summary.avg_accuracy, summary.style
    );
    for (name, count) in top_openings(&stats.history, 10) {
        println!("  {count:>3}  {name}");
    }
    if let Some(bars) = move_quality(&stats.classifications) {
        for (class, n) in bars {
            println!("  {:<11}{n}", class.as_str());
        }
    }
    if let Some(insight) = stats.ai_insight.as_deref() {
        println!("{insight}");
    }
}
