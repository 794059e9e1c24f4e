use clap::{Parser, Subcommand};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocab_trainer::config::{AppConfig, DeckConfig};
use vocab_trainer::db::{self, DbPool, ItemStore, LogOnError};
use vocab_trainer::domain::Level;
use vocab_trainer::session::{Feedback, PracticeSession, SessionError};
use vocab_trainer::srs::Transition;

#[derive(Parser)]
#[command(name = "vocab_trainer", about = "Vocabulary drills with level-based mastery", version)]
struct Cli {
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
  Plain,
  Json,
}

#[derive(Debug, PartialEq, Subcommand)]
enum Command {
  /// Practice a deck (default when no command is given)
  Practice {
    /// Deck name (default: configured or last used deck)
    deck: Option<String>,
  },

  /// Add a word pair
  Add {
    prompt: String,
    answer: String,
    /// Deck name (default: configured or last used deck)
    deck: Option<String>,
  },

  /// List the words of a deck with their ids
  List {
    deck: Option<String>,
    #[arg(long, default_value = "plain")]
    format: OutputFormat,
  },

  /// Change the text of a word pair, keeping its progress
  Edit { id: i64, prompt: String, answer: String },

  /// Delete a word pair
  Delete { id: i64 },

  /// List decks
  Decks,

  /// Create a deck
  NewDeck { name: String },

  /// Delete a deck and its words
  DeleteDeck { name: String },

  /// Deck statistics and stars
  Report {
    /// Only this deck (default: all decks)
    deck: Option<String>,
    #[arg(long, default_value = "plain")]
    format: OutputFormat,
  },

  /// Study sessions of the last seven days
  History,

  /// Create the English starter deck
  SeedExample,
}

type CliResult = Result<(), Box<dyn Error>>;

fn main() -> ExitCode {
  let cli = Cli::parse();

  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "vocab_trainer=info".into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
    .init();

  let config = AppConfig::load();

  let command = cli.command.unwrap_or(Command::Practice { deck: None });
  let result = match db::init_db(&config.database_path) {
    Ok(pool) => run(&pool, &config, command),
    Err(e) => Err(e.into()),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("Error: {}", e);
      ExitCode::FAILURE
    }
  }
}

fn run(pool: &DbPool, config: &AppConfig, command: Command) -> CliResult {
  match command {
    Command::Practice { deck } => practice(pool, config, deck.as_deref()),
    Command::Add { prompt, answer, deck } => add(pool, config, &prompt, &answer, deck.as_deref()),
    Command::List { deck, format } => list_items(pool, config, deck.as_deref(), format),
    Command::Edit { id, prompt, answer } => edit_item(pool, id, &prompt, &answer),
    Command::Delete { id } => delete_item(pool, id),
    Command::Decks => list_decks(pool),
    Command::NewDeck { name } => new_deck(pool, &name),
    Command::DeleteDeck { name } => delete_deck(pool, &name),
    Command::Report { deck, format } => report(pool, deck.as_deref(), format),
    Command::History => history(pool),
    Command::SeedExample => {
      let added = db::seed_example_deck(&*db::try_lock(pool)?)?;
      println!("Added {} words to deck {}", added, db::EXAMPLE_DECK);
      Ok(())
    }
  }
}

fn resolve_deck(pool: &DbPool, config: &AppConfig, requested: Option<&str>) -> Result<DeckConfig, Box<dyn Error>> {
  let conn = db::try_lock(pool)?;
  DeckConfig::resolve(&conn, requested, config)?
    .ok_or_else(|| "no decks yet; create one with `new-deck <name>` or `seed-example`".into())
}

fn practice(pool: &DbPool, config: &AppConfig, requested: Option<&str>) -> CliResult {
  let deck = resolve_deck(pool, config, requested)?;
  let mut session = PracticeSession::start(pool.clone(), deck, rand::rng())?;

  println!("Practicing deck {} (empty line or :q to stop)", session.deck().name);

  let stdin = io::stdin();
  let mut lines = stdin.lock().lines();

  while let Some(question) = session.next_question() {
    print!("\n{}  > ", question.shown);
    io::stdout().flush()?;

    let input = match lines.next() {
      Some(line) => line?,
      None => break,
    };
    if input.trim().is_empty() || input.trim() == ":q" {
      break;
    }

    match session.answer(&input) {
      Ok(feedback) => print_feedback(&feedback),
      Err(e) => {
        // Progress stays queued in the session; the next answer and finish() retry it
        tracing::error!("Failed to save progress: {}", e);
      }
    }
    std::thread::sleep(config.feedback_delay);
  }

  if session.items().is_empty() {
    println!("Deck {} has no words yet; add some with `add <prompt> <answer>`", session.deck().name);
  }

  let summary = match session.finish() {
    Ok(summary) => summary,
    Err(SessionError::Unsaved(items)) => {
      for item in &items {
        eprintln!("Not saved: {} = {} (id {})", item.prompt, item.answer, item.id);
      }
      return Err(SessionError::Unsaved(items).into());
    }
    Err(e) => return Err(e.into()),
  };
  println!(
    "\nPracticed {} words: {} correct, {} wrong ({:.1} min)",
    summary.words_practiced, summary.correct_answers, summary.wrong_answers, summary.duration_minutes
  );
  Ok(())
}

fn print_feedback(feedback: &Feedback) {
  if feedback.correct {
    println!("Correct!");
  } else {
    println!("Wrong. The answer is: {}", feedback.expected);
  }

  match feedback.transition {
    Some(Transition::Promoted { to, .. }) if to == Level::Mastered => println!("Mastered!"),
    Some(Transition::Promoted { to, .. }) => println!("Level up: {}", to),
    Some(Transition::Demoted { to, .. }) => println!("Back to {}", to),
    Some(Transition::Boosted { .. }) | None => {}
  }
}

fn check_pair(prompt: &str, answer: &str) -> CliResult {
  if prompt.trim().is_empty() || answer.trim().is_empty() {
    return Err("prompt and answer must not be empty".into());
  }
  Ok(())
}

fn add(pool: &DbPool, config: &AppConfig, prompt: &str, answer: &str, requested: Option<&str>) -> CliResult {
  check_pair(prompt, answer)?;
  let deck = resolve_deck(pool, config, requested)?;
  let item = db::try_lock(pool)?.create_item(prompt, answer, &deck.name)?;
  println!("Added {} = {} to deck {} (id {})", item.prompt, item.answer, deck.name, item.id);
  Ok(())
}

fn list_items(pool: &DbPool, config: &AppConfig, requested: Option<&str>, format: OutputFormat) -> CliResult {
  let deck = resolve_deck(pool, config, requested)?;
  let items = db::try_lock(pool)?.load_all_items(&deck.name)?;

  if format == OutputFormat::Json {
    println!("{}", serde_json::to_string_pretty(&items)?);
    return Ok(());
  }

  println!("== {} ==", deck.name);
  for item in &items {
    println!("{:>5}  {:<20} {:<20} L{}", item.id, item.prompt, item.answer, item.level.as_u8());
  }
  Ok(())
}

fn edit_item(pool: &DbPool, id: i64, prompt: &str, answer: &str) -> CliResult {
  check_pair(prompt, answer)?;
  if db::update_item_text(&*db::try_lock(pool)?, id, prompt, answer)? {
    println!("Updated word {}", id);
    Ok(())
  } else {
    Err(format!("no word with id {}", id).into())
  }
}

fn delete_item(pool: &DbPool, id: i64) -> CliResult {
  if db::delete_item(&*db::try_lock(pool)?, id)? {
    println!("Deleted word {}", id);
    Ok(())
  } else {
    Err(format!("no word with id {}", id).into())
  }
}

fn list_decks(pool: &DbPool) -> CliResult {
  let conn = db::try_lock(pool)?;
  let active = db::get_active_deck(&conn).log_warn_default("Failed to read active deck");

  for deck in db::list_decks(&conn)? {
    let marker = if active.as_deref() == Some(deck.name.as_str()) { "*" } else { " " };
    println!("{} {} ({} words)", marker, deck.name, db::count_items(&conn, &deck.name)?);
  }
  Ok(())
}

fn new_deck(pool: &DbPool, name: &str) -> CliResult {
  let name = name.trim();
  if name.is_empty() {
    return Err("deck name must not be empty".into());
  }
  if db::create_deck(&*db::try_lock(pool)?, name)? {
    println!("Created deck {}", name);
  } else {
    println!("Deck {} already exists", name);
  }
  Ok(())
}

fn delete_deck(pool: &DbPool, name: &str) -> CliResult {
  if db::delete_deck(&*db::try_lock(pool)?, name)? {
    println!("Deleted deck {}", name);
    Ok(())
  } else {
    Err(format!("deck '{}' does not exist", name).into())
  }
}

fn report(pool: &DbPool, deck: Option<&str>, format: OutputFormat) -> CliResult {
  let conn = db::try_lock(pool)?;
  let stats = match deck {
    Some(name) if db::deck_exists(&conn, name)? => vec![db::get_deck_stats(&conn, name)?],
    Some(name) => return Err(format!("deck '{}' does not exist", name).into()),
    None => db::get_all_deck_stats(&conn)?,
  };

  if format == OutputFormat::Json {
    println!("{}", serde_json::to_string_pretty(&stats)?);
    return Ok(());
  }

  for deck in &stats {
    println!("== {} ==", deck.deck);
    println!(
      "{} words, {} mastered ({:.0}%), {} in progress",
      deck.total_items,
      deck.mastered_items,
      deck.mastered_percentage(),
      deck.in_progress_items
    );
    let levels: Vec<String> = Level::ALL
      .iter()
      .map(|&level| format!("L{}: {}", level.as_u8(), deck.level_count(level)))
      .collect();
    println!("{}", levels.join("  "));
    println!(
      "Stars: {} golden, {} red, {} unicorn",
      deck.stars.remaining_golden, deck.stars.remaining_red, deck.stars.unicorn_bonus
    );

    for item in &deck.items {
      println!(
        "  {:<20} {:<20} L{} {:>4} ok {:>4} wrong",
        item.prompt,
        item.answer,
        item.level.as_u8(),
        item.correct_answers,
        item.wrong_answers
      );
    }
    println!();
  }
  Ok(())
}

fn history(pool: &DbPool) -> CliResult {
  let conn = db::try_lock(pool)?;
  let sessions = db::get_weekly_sessions(&conn)?;
  if sessions.is_empty() {
    println!("No study sessions in the last seven days");
    return Ok(());
  }

  for log in &sessions {
    println!(
      "{}  {:<12} {:>3} words  {:>5.1}%  {:.1} min",
      log.started_at.format("%Y-%m-%d %H:%M"),
      log.deck,
      log.words_practiced,
      log.accuracy() * 100.0,
      log.duration_minutes
    );
  }
  Ok(())
}
