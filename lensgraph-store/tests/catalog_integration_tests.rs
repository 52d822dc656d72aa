// Integration tests for the movie catalog and course tasks
// A small movie set is imported the same way the CLI loads a dataset

use anyhow::Result;
use serde_json::json;

use lensgraph_store::docs::catalog::{
    country_rating_count, courses_with_instructors, genre_count, import_json_lines,
    mark_unrated_pending, sample_short_film, seed_courses, MOVIES, PENDING_RATING,
};
use lensgraph_store::docs::Filter;
use lensgraph_store::{Database, DocumentStore};

const MOVIE_LINES: &str = r#"{"title": "Borrowed Time", "genres": ["Short", "Animation"], "countries": ["USA"], "rated": "NOT RATED"}
{"title": "Piper", "genres": ["Short", "Family"], "countries": ["USA"], "rated": "G"}
{"title": "Le Voyage", "genres": ["Drama"], "countries": ["France"], "rated": "NOT RATED"}
{"title": "Night Walk", "genres": ["Short"], "countries": ["USA", "Canada"], "rated": "NOT RATED"}
"#;

fn store_with_movies() -> Result<DocumentStore> {
    let db = Database::in_memory()?;
    db.initialize()?;
    let store = DocumentStore::new(db.pool.clone());
    import_json_lines(&store.collection(MOVIES), MOVIE_LINES.as_bytes())?;
    Ok(store)
}

#[test]
fn test_pending_rating_update_is_idempotent() -> Result<()> {
    let store = store_with_movies()?;
    let movies = store.collection(MOVIES);

    let first = mark_unrated_pending(&movies)?;
    assert_eq!(first.matched, 3);
    assert_eq!(first.modified, 3);

    let second = mark_unrated_pending(&movies)?;
    assert_eq!(second.matched, 0);
    assert_eq!(movies.count(&Filter::new().eq("rated", PENDING_RATING))?, 3);
    Ok(())
}

#[test]
fn test_short_genre_count() -> Result<()> {
    let store = store_with_movies()?;
    let movies = store.collection(MOVIES);

    assert_eq!(genre_count(&movies, "Short")?, Some(json!({"_id": "Short", "count": 3})));

    movies.insert_one(sample_short_film())?;
    assert_eq!(genre_count(&movies, "Short")?, Some(json!({"_id": "Short", "count": 4})));
    Ok(())
}

#[test]
fn test_country_rating_count_after_relabel() -> Result<()> {
    let store = store_with_movies()?;
    let movies = store.collection(MOVIES);
    mark_unrated_pending(&movies)?;

    let usa = country_rating_count(&movies, "USA", PENDING_RATING)?;
    assert_eq!(
        usa,
        Some(json!({"_id": {"country": "USA", "rating": "Pending rating"}, "count": 2}))
    );
    assert_eq!(country_rating_count(&movies, "Japan", PENDING_RATING)?, None);
    Ok(())
}

#[test]
fn test_courses_embed_their_instructors() -> Result<()> {
    let store = store_with_movies()?;
    seed_courses(&store)?;

    let courses = courses_with_instructors(&store)?;
    let data_structures = courses
        .iter()
        .find(|c| c["title"] == "Data Structures")
        .expect("course present");

    let taught_by = data_structures["taught_by"]
        .as_array()
        .expect("taught_by is an array");
    assert_eq!(taught_by.len(), 2);

    let mut names: Vec<&str> = taught_by.iter().filter_map(|i| i["name"].as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Daniel Bauer", "Paul Blaer"]);
    Ok(())
}
