use anyhow::{Context, Result};
use clap::Parser;

use lensgraph_store::docs::Filter;
use lensgraph_store::{Database, DocumentStore, SocialGraph};
use lensgraph_types::RelationKind;

/// Lensgraph Database Inspector
///
/// Reports node, relationship and document totals for a database file.
#[derive(Parser, Debug)]
#[command(name = "inspect-db")]
#[command(about = "Inspect a lensgraph database", long_about = None)]
struct Args {
    /// Path to the SQLite database file
    #[arg(short, long, default_value = "./lensgraph.db")]
    database: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Lensgraph Database Inspector");
    println!("============================");
    println!();
    println!("Database: {}", args.database);
    println!();

    if !std::path::Path::new(&args.database).exists() {
        println!("Database file not found: {}", args.database);
        return Ok(());
    }

    let db = Database::open(&args.database).context("Failed to open database")?;
    let graph = SocialGraph::new(db);

    let nodes = graph.node_counts()?;
    println!("Nodes");
    println!("-----");
    println!("  users:         {}", nodes.users);
    println!("  posts:         {}", nodes.posts);
    println!("  tags:          {}", nodes.tags);
    println!("  notifications: {}", nodes.notifications);
    println!();

    println!("Relationships");
    println!("-------------");
    for kind in RelationKind::ALL {
        println!(
            "  {:<10} {}->{}: {}",
            kind.as_str(),
            kind.source().as_str(),
            kind.target().as_str(),
            graph.relationship_count(kind)?
        );
    }
    println!();

    let store = DocumentStore::new(graph.database().pool.clone());
    let names = store.collection_names()?;
    println!("Collections");
    println!("-----------");
    if names.is_empty() {
        println!("  (none)");
    }
    for name in names {
        let count = store.collection(&name).count(&Filter::new())?;
        println!("  {}: {}", name, count);
    }

    Ok(())
}
