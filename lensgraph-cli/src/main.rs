use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lensgraph_store::config::Settings;
use lensgraph_store::docs::catalog;
use lensgraph_store::seed::{apply_app_actions, seed_graph};
use lensgraph_store::{Database, DocumentStore, SocialGraph, StoreError};
use lensgraph_types::RecencyWindow;

mod render;

/// Lensgraph command line
///
/// Seeds the photo-sharing graph, runs its read queries and the
/// document-collection tasks against a local SQLite file.
#[derive(Parser, Debug)]
#[command(name = "lensgraph")]
#[command(about = "Seed and query the lensgraph photo-sharing database", long_about = None)]
struct Args {
    /// Path to the SQLite database file (overrides database.path)
    #[arg(short, long, global = true)]
    database: Option<String>,

    /// Date treated as today, YYYY-MM-DD
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Wipe the graph and load the fixed data set
    Seed {
        /// Also play the scripted newcomer session
        #[arg(long)]
        with_actions: bool,
    },
    /// Seed, play the newcomer session and print every read query
    Demo,
    /// Notifications a user received recently
    Notifications {
        username: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Recent photos from the people a user follows
    Feed {
        username: String,
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Messages exchanged between two users
    Messages { user_a: String, user_b: String },
    /// Every photo a user made
    Photos { username: String },
    /// Every photo carrying a tag
    Tagged { tag: String },
    /// Movie catalog and course tasks
    Docs {
        #[command(subcommand)]
        task: DocsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DocsCommand {
    /// Load one JSON document per line into a collection
    Import { collection: String, file: PathBuf },
    /// Relabel "NOT RATED" movies as "Pending rating"
    RatePending,
    /// Add a short film to the catalog
    AddSample,
    /// Count movies in a genre
    GenreCount {
        #[arg(default_value = "Short")]
        genre: String,
    },
    /// Count pending-rating movies made in a country
    CountryPending {
        #[arg(default_value = "USA")]
        country: String,
    },
    /// Reset the course data and list courses with their instructors
    Courses,
}

#[derive(clap::Args, Debug, Clone, Copy, Default)]
struct WindowArgs {
    /// Days to look back (overrides feed.recent_days)
    #[arg(long)]
    days: Option<u32>,

    /// Also include the same week one year earlier
    #[arg(long)]
    year_ago: bool,
}

impl WindowArgs {
    fn resolve(&self, settings: &Settings) -> RecencyWindow {
        let configured = settings.recency_window();
        RecencyWindow::last_days(self.days.unwrap_or(configured.days))
            .with_year_ago(self.year_ago || configured.include_year_ago)
    }
}

fn open_database(args: &Args, settings: &Settings) -> Result<Database> {
    let path = args.database.as_deref().unwrap_or(&settings.database.path);
    tracing::debug!(path, "Opening database");
    Database::open(path).with_context(|| format!("Failed to open database {}", path))
}

fn require_user(graph: &SocialGraph, username: &str) -> Result<()> {
    if graph.users.get_by_username(username)?.is_none() {
        return Err(StoreError::NotFound {
            entity: "user",
            key: username.to_string(),
        }
        .into());
    }
    Ok(())
}

fn print_notifications(
    graph: &SocialGraph,
    username: &str,
    window: &RecencyWindow,
    today: NaiveDate,
) -> Result<()> {
    for notification in graph.notifications.recent_for(username, window, today)? {
        println!("{}", notification.content);
    }
    Ok(())
}

fn print_feed(
    graph: &SocialGraph,
    username: &str,
    window: &RecencyWindow,
    today: NaiveDate,
) -> Result<()> {
    for item in graph.posts.followed_feed(username, window, today)? {
        println!("{}", render::feed_line(&item));
    }
    Ok(())
}

fn print_messages(graph: &SocialGraph, user_a: &str, user_b: &str) -> Result<()> {
    for message in graph.messages.conversation(user_a, user_b)? {
        println!("{}", message.text);
    }
    Ok(())
}

fn print_photos_of(graph: &SocialGraph, username: &str) -> Result<()> {
    for post in graph.posts.by_author(username)? {
        println!("{}", render::photo_line(&post));
    }
    Ok(())
}

fn print_tagged(graph: &SocialGraph, tag: &str) -> Result<()> {
    for post in graph.tags.posts_tagged(tag)? {
        println!("{}", render::photo_line(&post));
    }
    Ok(())
}

fn run_demo(graph: &SocialGraph, window: &RecencyWindow, today: NaiveDate) -> Result<()> {
    seed_graph(graph, today)?;
    apply_app_actions(graph, today)?;

    println!("Notifications for madmax from the last week \n");
    print_notifications(graph, "madmax", window, today)?;

    println!("\nPhotos from last week for people followed by estolfo\n");
    print_feed(graph, "estolfo", window, today)?;

    println!("\nMessages between users madmax and theTruther\n");
    print_messages(graph, "madmax", "theTruther")?;

    println!("\nAll photos of a particular user (e.g madmax)\n");
    print_photos_of(graph, "madmax")?;

    println!("\nSee all photos with a particular tag (e.g portrait)\n");
    print_tagged(graph, "portrait")?;
    Ok(())
}

fn run_docs(store: &DocumentStore, task: &DocsCommand) -> Result<()> {
    let movies = store.collection(catalog::MOVIES);

    match task {
        DocsCommand::Import { collection, file } => {
            let reader = BufReader::new(
                File::open(file).with_context(|| format!("Failed to open {}", file.display()))?,
            );
            let inserted = catalog::import_json_lines(&store.collection(collection), reader)?;
            println!("Imported {} documents into {}", inserted, collection);
        }
        DocsCommand::RatePending => {
            let result = catalog::mark_unrated_pending(&movies)?;
            println!("Matched {}, modified {}", result.matched, result.modified);
        }
        DocsCommand::AddSample => {
            let id = movies.insert_one(catalog::sample_short_film())?;
            println!("Inserted {}", id);
        }
        DocsCommand::GenreCount { genre } => match catalog::genre_count(&movies, genre)? {
            Some(doc) => println!("{}", render::pretty(&doc)?),
            None => println!("No movies in genre {}", genre),
        },
        DocsCommand::CountryPending { country } => {
            match catalog::country_rating_count(&movies, country, catalog::PENDING_RATING)? {
                Some(doc) => println!("{}", render::pretty(&doc)?),
                None => println!("No pending-rating movies from {}", country),
            }
        }
        DocsCommand::Courses => {
            catalog::seed_courses(store)?;
            for course in catalog::courses_with_instructors(store)? {
                println!("{}", render::pretty(&course)?);
            }
        }
    }
    Ok(())
}

fn run(args: Args, settings: &Settings) -> Result<()> {
    let graph = SocialGraph::new(open_database(&args, settings)?);
    let today = args.today.unwrap_or_else(|| chrono::Local::now().date_naive());

    match &args.command {
        Command::Seed { with_actions } => {
            seed_graph(&graph, today)?;
            if *with_actions {
                apply_app_actions(&graph, today)?;
            }
            let counts = graph.node_counts()?;
            println!(
                "Seeded {} users, {} posts, {} tags, {} notifications",
                counts.users, counts.posts, counts.tags, counts.notifications
            );
        }
        Command::Demo => run_demo(&graph, &settings.recency_window(), today)?,
        Command::Notifications { username, window } => {
            require_user(&graph, username)?;
            print_notifications(&graph, username, &window.resolve(settings), today)?
        }
        Command::Feed { username, window } => {
            require_user(&graph, username)?;
            print_feed(&graph, username, &window.resolve(settings), today)?
        }
        Command::Messages { user_a, user_b } => {
            require_user(&graph, user_a)?;
            require_user(&graph, user_b)?;
            print_messages(&graph, user_a, user_b)?
        }
        Command::Photos { username } => {
            require_user(&graph, username)?;
            print_photos_of(&graph, username)?
        }
        Command::Tagged { tag } => print_tagged(&graph, tag)?,
        Command::Docs { task } => {
            run_docs(&DocumentStore::new(graph.database().pool.clone()), task)?
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Logs go to stderr so query output stays clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lensgraph=info,lensgraph_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let settings = Settings::new().context("Failed to load settings")?;

    run(args, &settings)
}
