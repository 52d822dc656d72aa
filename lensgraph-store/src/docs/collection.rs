use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use super::filter::{Filter, Update};
use super::pipeline::{run_pipeline, Stage};
use crate::db::DbPool;
use crate::error::{duplicate_or, StoreError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub matched: usize,
    pub modified: usize,
}

/// Named collections of JSON documents sharing the graph's database
#[derive(Clone)]
pub struct DocumentStore {
    pool: DbPool,
}

impl DocumentStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            pool: self.pool.clone(),
            name: name.to_string(),
        }
    }

    pub fn collection_names(&self) -> Result<Vec<String>> {
        let conn = self.pool.get()?;
        let mut stmt =
            conn.prepare("SELECT DISTINCT collection FROM documents ORDER BY collection")?;
        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

pub struct Collection {
    pool: DbPool,
    name: String,
}

/// Documents must be objects; a missing `_id` gets a fresh UUID
fn prepare_document(mut doc: Value) -> Result<(String, Value), StoreError> {
    let object = doc
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".to_string()))?;

    let id = object
        .entry("_id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    let doc_id = id.to_string();

    Ok((doc_id, doc))
}

fn load_documents(conn: &Connection, collection: &str) -> Result<Vec<(i64, Value)>> {
    let mut stmt =
        conn.prepare("SELECT seq, body FROM documents WHERE collection = ? ORDER BY seq")?;
    let rows = stmt
        .query_map([collection], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    rows.into_iter()
        .map(|(seq, body)| {
            let doc = serde_json::from_str(&body)
                .with_context(|| format!("Corrupt document {} in {}", seq, collection))?;
            Ok((seq, doc))
        })
        .collect()
}

fn insert_document(conn: &Connection, collection: &str, doc: Value) -> Result<String> {
    let (doc_id, doc) = prepare_document(doc)?;
    conn.execute(
        "INSERT INTO documents (collection, doc_id, body) VALUES (?, ?, ?)",
        (collection, &doc_id, serde_json::to_string(&doc)?),
    )
    .map_err(|e| duplicate_or(e, "document", &doc_id))
    .context("Failed to insert document")?;
    Ok(doc_id)
}

impl Collection {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert one document, returning its `_id` as JSON text
    pub fn insert_one(&self, doc: Value) -> Result<String> {
        let conn = self.pool.get()?;
        insert_document(&conn, &self.name, doc)
    }

    /// Insert all documents or none
    pub fn insert_many(&self, docs: Vec<Value>) -> Result<Vec<String>> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let ids = docs
            .into_iter()
            .map(|doc| insert_document(&tx, &self.name, doc))
            .collect::<Result<Vec<_>>>()?;
        tx.commit().context("Failed to commit inserts")?;

        tracing::debug!(collection = %self.name, inserted = ids.len(), "Inserted documents");
        Ok(ids)
    }

    pub fn find(&self, filter: &Filter) -> Result<Vec<Value>> {
        let conn = self.pool.get()?;
        let docs = load_documents(&conn, &self.name)?
            .into_iter()
            .map(|(_, doc)| doc)
            .filter(|doc| filter.matches(doc))
            .collect();
        Ok(docs)
    }

    pub fn count(&self, filter: &Filter) -> Result<usize> {
        Ok(self.find(filter)?.len())
    }

    /// Apply `update` to every matching document inside one transaction
    pub fn update_many(&self, filter: &Filter, update: &Update) -> Result<UpdateResult> {
        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;
        let mut result = UpdateResult::default();

        for (seq, mut doc) in load_documents(&tx, &self.name)? {
            if !filter.matches(&doc) {
                continue;
            }
            result.matched += 1;

            if update.apply(&mut doc)? {
                tx.execute(
                    "UPDATE documents SET body = ? WHERE seq = ?",
                    (serde_json::to_string(&doc)?, seq),
                )
                .context("Failed to update document")?;
                result.modified += 1;
            }
        }

        tx.commit().context("Failed to commit update")?;
        tracing::info!(
            collection = %self.name,
            matched = result.matched,
            modified = result.modified,
            "update_many"
        );
        Ok(result)
    }

    pub fn aggregate(&self, stages: &[Stage]) -> Result<Vec<Value>> {
        let conn = self.pool.get()?;
        let docs = load_documents(&conn, &self.name)?
            .into_iter()
            .map(|(_, doc)| doc)
            .collect();

        let mut load = |from: &str| -> Result<Vec<Value>> {
            Ok(load_documents(&conn, from)?
                .into_iter()
                .map(|(_, doc)| doc)
                .collect())
        };
        run_pipeline(docs, stages, &mut load)
    }

    /// Delete every document in the collection
    pub fn clear(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        let removed = conn
            .execute("DELETE FROM documents WHERE collection = ?", [&self.name])
            .context("Failed to clear collection")?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use serde_json::json;

    fn store() -> Result<DocumentStore> {
        let db = Database::in_memory()?;
        db.initialize()?;
        Ok(DocumentStore::new(db.pool.clone()))
    }

    #[test]
    fn test_insert_assigns_ids() -> Result<()> {
        let store = store()?;
        let movies = store.collection("movies");

        let generated = movies.insert_one(json!({"title": "A"}))?;
        let given = movies.insert_one(json!({"_id": 7, "title": "B"}))?;
        assert_eq!(given, "7");
        assert_ne!(generated, given);

        let all = movies.find(&Filter::new())?;
        assert_eq!(all.len(), 2);
        assert!(all[0]["_id"].is_string());
        Ok(())
    }

    #[test]
    fn test_duplicate_id_rejected_per_collection() -> Result<()> {
        let store = store()?;
        store.collection("a").insert_one(json!({"_id": "x"}))?;
        store.collection("b").insert_one(json!({"_id": "x"}))?;

        let err = store.collection("a").insert_one(json!({"_id": "x"})).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::Duplicate { entity: "document", .. })
        ));
        assert_eq!(store.collection_names()?, vec!["a", "b"]);
        Ok(())
    }

    #[test]
    fn test_insert_many_is_all_or_nothing() -> Result<()> {
        let store = store()?;
        let coll = store.collection("instructors");

        let result = coll.insert_many(vec![
            json!({"_id": 1, "name": "Paul Blaer"}),
            json!({"_id": 1, "name": "Daniel Bauer"}),
        ]);
        assert!(result.is_err());
        assert_eq!(coll.count(&Filter::new())?, 0);
        Ok(())
    }

    #[test]
    fn test_non_object_rejected() -> Result<()> {
        let store = store()?;
        let err = store.collection("movies").insert_one(json!([1, 2])).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidDocument(_))
        ));
        Ok(())
    }

    #[test]
    fn test_update_many_counts() -> Result<()> {
        let store = store()?;
        let movies = store.collection("movies");
        movies.insert_many(vec![
            json!({"title": "A", "rated": "NOT RATED"}),
            json!({"title": "B", "rated": "NOT RATED"}),
            json!({"title": "C", "rated": "PG"}),
        ])?;

        let filter = Filter::new().eq("rated", "NOT RATED");
        let update = Update::set("rated", "Pending rating");

        let first = movies.update_many(&filter, &update)?;
        assert_eq!(first, UpdateResult { matched: 2, modified: 2 });

        let second = movies.update_many(&filter, &update)?;
        assert_eq!(second, UpdateResult { matched: 0, modified: 0 });

        assert_eq!(movies.count(&Filter::new().eq("rated", "Pending rating"))?, 2);
        Ok(())
    }

    #[test]
    fn test_update_matching_but_unchanged() -> Result<()> {
        let store = store()?;
        let movies = store.collection("movies");
        movies.insert_one(json!({"title": "A", "rated": "PG"}))?;

        let result = movies.update_many(&Filter::new(), &Update::set("rated", "PG"))?;
        assert_eq!(result, UpdateResult { matched: 1, modified: 0 });
        Ok(())
    }

    #[test]
    fn test_clear() -> Result<()> {
        let store = store()?;
        let movies = store.collection("movies");
        movies.insert_many(vec![json!({"a": 1}), json!({"a": 2})])?;
        store.collection("courses").insert_one(json!({"a": 3}))?;

        assert_eq!(movies.clear()?, 2);
        assert_eq!(movies.count(&Filter::new())?, 0);
        assert_eq!(store.collection("courses").count(&Filter::new())?, 1);
        Ok(())
    }
}
