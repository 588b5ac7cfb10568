use std::{str::FromStr, time::Duration};

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    migrate::MigrateError,
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous},
    SqlitePool,
};
use thiserror::Error;
use uuid::Uuid;

use estate_core::{NewProperty, Property, Review};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Top-level database handle that owns the SQLite connection pool.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Establishes a new SQLite connection pool for the provided connection string.
    ///
    /// The database file is created when it does not exist yet.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(StorageError::Connect)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(StorageError::Connect)?;

        Ok(Self { pool })
    }

    /// Applies migrations located under `migrations/`.
    pub async fn run_migrations(&self) -> Result<(), StorageError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(StorageError::Migration)?;
        Ok(())
    }

    /// Returns a handle to the property collection.
    pub fn properties(&self) -> PropertyRepository {
        PropertyRepository {
            pool: self.pool.clone(),
        }
    }

    /// Exposes the inner pool when lower level access is required.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// General storage level errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to connect to sqlite: {0}")]
    Connect(sqlx::Error),
    #[error("failed to run database migrations: {0}")]
    Migration(MigrateError),
}

/// Repository over the `properties` table.
///
/// Each row is one property document; its reviews live inside the row as a
/// JSON array, so removing the row removes the reviews with it.
#[derive(Clone)]
pub struct PropertyRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "id, title, description, image, contact, reviews_json";

impl PropertyRepository {
    /// Stores a new property with an empty review list and returns it with its generated id.
    pub async fn create(&self, new_property: NewProperty) -> Result<Property, PropertyError> {
        let now = to_rfc3339(Utc::now());
        let property = new_property.into_property(Uuid::new_v4().to_string());

        sqlx::query(
            "INSERT INTO properties \
             (id, title, description, image, contact, reviews_json, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, '[]', ?, ?)",
        )
        .bind(&property.id)
        .bind(&property.title)
        .bind(&property.description)
        .bind(&property.image)
        .bind(&property.contact)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(property)
    }

    /// Lists every stored property in creation order.
    pub async fn list_all(&self) -> Result<Vec<Property>, PropertyError> {
        let rows = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM properties ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PropertyRow::into_domain).collect()
    }

    /// Loads a single property.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<Property>, PropertyError> {
        let id = parse_id(id)?;
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM properties WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PropertyRow::into_domain).transpose()
    }

    /// Appends a review to the property and returns the updated document.
    pub async fn append_review(&self, id: &str, review: Review) -> Result<Property, PropertyError> {
        let id = parse_id(id)?.to_string();
        let now = to_rfc3339(Utc::now());
        let mut tx = self.pool.begin().await?;

        // Writing first takes the database write lock, so concurrent appends
        // to the same property queue up instead of reading a stale list.
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "UPDATE properties SET updated_at = ? WHERE id = ? RETURNING {SELECT_COLUMNS}"
        ))
        .bind(&now)
        .bind(&id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Err(PropertyError::NotFound);
        };

        let mut property = row.into_domain()?;
        property.push_review(review);
        let reviews_json = serde_json::to_string(&property.reviews)?;

        sqlx::query("UPDATE properties SET reviews_json = ? WHERE id = ?")
            .bind(reviews_json)
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(property)
    }

    /// Deletes the property, returning the document as it was before removal.
    pub async fn delete_by_id(&self, id: &str) -> Result<Option<Property>, PropertyError> {
        let id = parse_id(id)?;
        let row = sqlx::query_as::<_, PropertyRow>(&format!(
            "DELETE FROM properties WHERE id = ? RETURNING {SELECT_COLUMNS}"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(PropertyRow::into_domain).transpose()
    }
}

fn parse_id(raw: &str) -> Result<Uuid, PropertyError> {
    Uuid::parse_str(raw).map_err(|_| PropertyError::InvalidId(raw.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
struct PropertyRow {
    id: String,
    title: String,
    description: String,
    image: String,
    contact: String,
    reviews_json: String,
}

impl PropertyRow {
    fn into_domain(self) -> Result<Property, PropertyError> {
        let reviews: Vec<Review> = serde_json::from_str(&self.reviews_json)?;
        Ok(Property {
            id: self.id,
            title: self.title,
            description: self.description,
            image: self.image,
            contact: self.contact,
            reviews,
        })
    }
}

/// Errors that can occur while reading or writing properties.
#[derive(Debug, Error)]
pub enum PropertyError {
    #[error("Property not found")]
    NotFound,
    #[error("invalid property id: {0}")]
    InvalidId(String),
    #[error("failed to encode or decode reviews json: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn to_rfc3339(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Number;
    use tempfile::TempDir;

    async fn setup_db() -> (Database, TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("listings.db").display()
        );
        let db = Database::connect(&url).await.expect("connect");
        db.run_migrations().await.expect("migrations");
        (db, dir)
    }

    fn listing(title: &str) -> NewProperty {
        NewProperty {
            title: title.to_string(),
            description: "Cozy".to_string(),
            image: "img.jpg".to_string(),
            contact: "a@b.com".to_string(),
        }
    }

    fn review(user: &str, rating: i64) -> Review {
        Review {
            user: Some(user.to_string()),
            rating: Some(Number::from(rating)),
            comment: Some("Great".to_string()),
        }
    }

    #[tokio::test]
    async fn connect_reports_unreachable_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("missing").join("listings.db").display()
        );

        let err = Database::connect(&url)
            .await
            .err()
            .expect("parent directory does not exist");
        assert!(matches!(err, StorageError::Connect(_)));
        assert!(err.to_string().starts_with("failed to connect to sqlite"));
    }

    #[tokio::test]
    async fn migrations_apply() {
        let (db, _dir) = setup_db().await;

        let tables: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'properties'",
        )
        .fetch_one(db.pool())
        .await
        .expect("fetch tables");
        assert_eq!(tables.0, 1, "expected properties table to be created");
    }

    #[tokio::test]
    async fn create_assigns_id_and_round_trips() {
        let (db, _dir) = setup_db().await;
        let repo = db.properties();

        let created = repo.create(listing("Cabin")).await.expect("create");
        assert!(Uuid::parse_str(&created.id).is_ok());
        assert!(created.reviews.is_empty());

        let loaded = repo
            .find_by_id(&created.id)
            .await
            .expect("find")
            .expect("property exists");
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn list_all_returns_properties_in_creation_order() {
        let (db, _dir) = setup_db().await;
        let repo = db.properties();

        let first = repo.create(listing("Cabin")).await.expect("create first");
        let second = repo.create(listing("Loft")).await.expect("create second");

        let all = repo.list_all().await.expect("list");
        let ids: Vec<_> = all.iter().map(|property| property.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (db, _dir) = setup_db().await;
        let found = db
            .properties()
            .find_by_id(&Uuid::new_v4().to_string())
            .await
            .expect("lookup succeeds");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn find_by_id_rejects_malformed_id() {
        let (db, _dir) = setup_db().await;
        let err = db.properties().find_by_id("not-an-id").await.unwrap_err();
        assert!(matches!(err, PropertyError::InvalidId(value) if value == "not-an-id"));
    }

    #[tokio::test]
    async fn append_review_keeps_previous_reviews_in_order() {
        let (db, _dir) = setup_db().await;
        let repo = db.properties();
        let created = repo.create(listing("Cabin")).await.expect("create");

        repo.append_review(&created.id, review("Al", 5))
            .await
            .expect("first review");
        let updated = repo
            .append_review(&created.id, review("Bo", 3))
            .await
            .expect("second review");

        assert_eq!(updated.reviews, vec![review("Al", 5), review("Bo", 3)]);

        let stored = repo
            .find_by_id(&created.id)
            .await
            .expect("find")
            .expect("property exists");
        assert_eq!(stored.reviews, updated.reviews);
    }

    #[tokio::test]
    async fn append_review_accepts_empty_review() {
        let (db, _dir) = setup_db().await;
        let repo = db.properties();
        let created = repo.create(listing("Cabin")).await.expect("create");

        let updated = repo
            .append_review(&created.id, Review::default())
            .await
            .expect("empty review is stored");
        assert_eq!(updated.reviews, vec![Review::default()]);
    }

    #[tokio::test]
    async fn append_review_errors_for_missing_property() {
        let (db, _dir) = setup_db().await;
        let err = db
            .properties()
            .append_review(&Uuid::new_v4().to_string(), review("Al", 5))
            .await
            .unwrap_err();
        assert!(matches!(err, PropertyError::NotFound));
    }

    #[tokio::test]
    async fn delete_by_id_removes_document_with_reviews() {
        let (db, _dir) = setup_db().await;
        let repo = db.properties();
        let created = repo.create(listing("Cabin")).await.expect("create");
        repo.append_review(&created.id, review("Al", 5))
            .await
            .expect("review");

        let deleted = repo
            .delete_by_id(&created.id)
            .await
            .expect("delete")
            .expect("property existed");
        assert_eq!(deleted.id, created.id);
        assert_eq!(deleted.reviews.len(), 1);

        assert!(repo.list_all().await.expect("list").is_empty());
        assert!(repo
            .delete_by_id(&created.id)
            .await
            .expect("second delete")
            .is_none());
    }
}
