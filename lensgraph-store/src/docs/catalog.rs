//! Movie-catalog and course tasks run against the document collections.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::io::BufRead;

use super::collection::{Collection, DocumentStore, UpdateResult};
use super::filter::{Filter, Update};
use super::pipeline::Stage;

pub const MOVIES: &str = "movies";
pub const COURSES: &str = "courses";
pub const INSTRUCTORS: &str = "instructors";

pub const NOT_RATED: &str = "NOT RATED";
pub const PENDING_RATING: &str = "Pending rating";

/// Relabel every "NOT RATED" movie as "Pending rating" in one atomic update
pub fn mark_unrated_pending(movies: &Collection) -> Result<UpdateResult> {
    movies.update_many(
        &Filter::new().eq("rated", NOT_RATED),
        &Update::set("rated", PENDING_RATING),
    )
}

/// A short film to add to the catalog
pub fn sample_short_film() -> Value {
    json!({
        "title": "The Silent Child",
        "year": 2017,
        "countries": ["USA"],
        "genres": ["Short", "Drama"],
        "directors": ["Chris Overton"],
        "imdb": { "id": 6186970, "rating": 7.7, "votes": 1077 }
    })
}

/// `{_id: genre, count: n}`, or `None` when no movie has the genre
pub fn genre_count(movies: &Collection, genre: &str) -> Result<Option<Value>> {
    let out = movies.aggregate(&[
        Stage::Match(Filter::new().all("genres", [genre])),
        Stage::count("count"),
        Stage::project(json!({ "_id": genre, "count": "$count" })),
    ])?;
    Ok(out.into_iter().next())
}

/// `{_id: {country, rating}, count: n}` for movies made in `country` with `rating`
pub fn country_rating_count(
    movies: &Collection,
    country: &str,
    rating: &str,
) -> Result<Option<Value>> {
    let out = movies.aggregate(&[
        Stage::Match(Filter::new().all("countries", [country]).eq("rated", rating)),
        Stage::count("count"),
        Stage::project(json!({
            "_id": { "country": country, "rating": rating },
            "count": "$count"
        })),
    ])?;
    Ok(out.into_iter().next())
}

/// Reset the courses and instructors collections to their fixed contents
pub fn seed_courses(store: &DocumentStore) -> Result<()> {
    let courses = store.collection(COURSES);
    let instructors = store.collection(INSTRUCTORS);
    courses.clear()?;
    instructors.clear()?;

    courses.insert_one(json!({
        "title": "Data Structures",
        "department": "Computer Science",
        "credits": 3
    }))?;
    instructors.insert_many(vec![
        json!({ "name": "Paul Blaer", "course": "Data Structures", "semester": "Spring 2018" }),
        json!({ "name": "Daniel Bauer", "course": "Data Structures", "semester": "Fall 2017" }),
        json!({ "name": "Jae Woo Lee", "course": "Advanced Programming", "semester": "Spring 2018" }),
    ])?;

    tracing::info!("Seeded courses and instructors");
    Ok(())
}

/// Every course with its instructors embedded under `taught_by`
pub fn courses_with_instructors(store: &DocumentStore) -> Result<Vec<Value>> {
    store
        .collection(COURSES)
        .aggregate(&[Stage::lookup(INSTRUCTORS, "title", "course", "taught_by")])
}

/// Load one JSON document per line; blank lines are skipped
pub fn import_json_lines<R: BufRead>(collection: &Collection, reader: R) -> Result<usize> {
    let mut docs = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Value = serde_json::from_str(&line)
            .with_context(|| format!("Invalid JSON on line {}", i + 1))?;
        docs.push(doc);
    }

    let inserted = collection.insert_many(docs)?.len();
    tracing::info!(collection = collection.name(), inserted, "Imported documents");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn store() -> Result<DocumentStore> {
        let db = Database::in_memory()?;
        db.initialize()?;
        Ok(DocumentStore::new(db.pool.clone()))
    }

    #[test]
    fn test_import_json_lines() -> Result<()> {
        let store = store()?;
        let movies = store.collection(MOVIES);
        let input = "{\"title\": \"A\", \"genres\": [\"Short\"]}\n\n{\"title\": \"B\"}\n";

        assert_eq!(import_json_lines(&movies, input.as_bytes())?, 2);
        assert_eq!(genre_count(&movies, "Short")?, Some(json!({"_id": "Short", "count": 1})));
        Ok(())
    }

    #[test]
    fn test_import_reports_bad_line() -> Result<()> {
        let store = store()?;
        let movies = store.collection(MOVIES);
        let err = import_json_lines(&movies, "{\"ok\": 1}\nnot json\n".as_bytes()).unwrap_err();

        assert!(format!("{:#}", err).contains("line 2"));
        assert_eq!(movies.count(&Filter::new())?, 0);
        Ok(())
    }

    #[test]
    fn test_genre_count_without_matches() -> Result<()> {
        let store = store()?;
        let movies = store.collection(MOVIES);
        movies.insert_one(json!({"title": "A", "genres": ["Comedy"]}))?;
        assert_eq!(genre_count(&movies, "Short")?, None);
        Ok(())
    }

    #[test]
    fn test_seed_courses_is_repeatable() -> Result<()> {
        let store = store()?;
        seed_courses(&store)?;
        seed_courses(&store)?;

        let courses = courses_with_instructors(&store)?;
        assert_eq!(courses.len(), 1);
        Ok(())
    }
}
