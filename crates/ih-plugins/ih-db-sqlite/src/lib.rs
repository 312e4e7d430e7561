//! # ih-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `ih-core` domain models.
//!
//! Lifecycle rules live in the schema: comments and tag links hang off an
//! image with `ON DELETE CASCADE`, while tag rows themselves carry no link
//! back to images and survive every deletion. Tag and user names are
//! `UNIQUE`, and violations surface as `AppError::Conflict` so callers can
//! run their reload-and-reuse path.

use async_trait::async_trait;
use ih_core::error::{AppError, Result};
use ih_core::models::{Comment, Image, Tag, User};
use ih_core::traits::{ImageRepo, UserRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use uuid::Uuid;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS tags (
        id BLOB PRIMARY KEY,
        name TEXT NOT NULL UNIQUE
    )",
    "CREATE TABLE IF NOT EXISTS images (
        id BLOB PRIMARY KEY,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        date TEXT NOT NULL,
        owner_id BLOB NOT NULL REFERENCES users(id)
    )",
    "CREATE TABLE IF NOT EXISTS image_tags (
        image_id BLOB NOT NULL REFERENCES images(id) ON DELETE CASCADE,
        tag_id BLOB NOT NULL REFERENCES tags(id),
        position INTEGER NOT NULL,
        PRIMARY KEY (image_id, position)
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id BLOB PRIMARY KEY,
        text TEXT NOT NULL,
        created_date TEXT NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id),
        image_id BLOB NOT NULL REFERENCES images(id) ON DELETE CASCADE
    )",
];

pub struct SqliteImageRepo {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn internal(err: sqlx::Error) -> AppError {
    AppError::Internal(err.to_string())
}

/// UNIQUE violations become `Conflict`; everything else is `Internal`.
fn map_insert_err(err: sqlx::Error, what: &str) -> AppError {
    if let sqlx::Error::Database(db) = &err {
        if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) {
            return AppError::Conflict(format!("{what} already exists"));
        }
    }
    internal(err)
}

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: blob_to_uuid(row.get::<Vec<u8>, _>("user_id").as_slice()),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get("user_created_at"),
    }
}

impl SqliteImageRepo {
    /// Connects and bootstraps the schema. In-memory URLs get a single
    /// connection so every query sees the same database.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        log::info!("sqlite schema ready at {database_url}");
        Ok(Self { pool })
    }

    async fn load_tags(&self, image_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name FROM image_tags it
             JOIN tags t ON t.id = it.tag_id
             WHERE it.image_id = ? ORDER BY it.position ASC",
        )
        .bind(uuid_to_blob(image_id))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(rows
            .into_iter()
            .map(|row| Tag {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                name: row.get("name"),
            })
            .collect())
    }

    async fn image_from_row(&self, row: sqlx::sqlite::SqliteRow) -> Result<Image> {
        let id = blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice());
        let tags = self.load_tags(id).await?;
        Ok(Image {
            id,
            title: row.get("title"),
            content: row.get("content"),
            date: row.get("date"),
            owner: user_from_row(&row),
            tags,
        })
    }
}

const IMAGE_SELECT: &str = "SELECT i.id, i.title, i.content, i.date,
    u.id AS user_id, u.username, u.password_hash, u.created_at AS user_created_at
    FROM images i JOIN users u ON u.id = i.owner_id";

#[async_trait]
impl ImageRepo for SqliteImageRepo {
    async fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        Ok(row.map(|row| Tag {
            id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
            name: row.get("name"),
        }))
    }

    async fn insert_tag(&self, name: &str) -> Result<Tag> {
        let tag = Tag {
            id: Uuid::now_v7(),
            name: name.to_string(),
        };
        sqlx::query("INSERT INTO tags (id, name) VALUES (?, ?)")
            .bind(uuid_to_blob(tag.id))
            .bind(&tag.name)
            .execute(&self.pool)
            .await
            .map_err(|err| map_insert_err(err, "tag"))?;
        Ok(tag)
    }

    async fn list_images(&self) -> Result<Vec<Image>> {
        let rows = sqlx::query(&format!("{IMAGE_SELECT} ORDER BY i.date DESC"))
            .fetch_all(&self.pool)
            .await
            .map_err(internal)?;

        let mut images = Vec::with_capacity(rows.len());
        for row in rows {
            images.push(self.image_from_row(row).await?);
        }
        Ok(images)
    }

    async fn find_image_by_id(&self, id: Uuid) -> Result<Option<Image>> {
        let row = sqlx::query(&format!("{IMAGE_SELECT} WHERE i.id = ?"))
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        match row {
            Some(row) => Ok(Some(self.image_from_row(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_image_by_id_and_title(&self, id: Uuid, title: &str) -> Result<Option<Image>> {
        let row = sqlx::query(&format!("{IMAGE_SELECT} WHERE i.id = ? AND i.title = ?"))
            .bind(uuid_to_blob(id))
            .bind(title)
            .fetch_optional(&self.pool)
            .await
            .map_err(internal)?;

        match row {
            Some(row) => Ok(Some(self.image_from_row(row).await?)),
            None => Ok(None),
        }
    }

    /// The image row and its tag links land in one transaction. Tag rows
    /// themselves are already persisted by the resolver at this point.
    async fn insert_image(&self, image: Image) -> Result<Image> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query("INSERT INTO images (id, title, content, date, owner_id) VALUES (?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(image.id))
            .bind(&image.title)
            .bind(&image.content)
            .bind(image.date)
            .bind(uuid_to_blob(image.owner.id))
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        for (position, tag) in image.tags.iter().enumerate() {
            sqlx::query("INSERT INTO image_tags (image_id, tag_id, position) VALUES (?, ?, ?)")
                .bind(uuid_to_blob(image.id))
                .bind(uuid_to_blob(tag.id))
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
        }

        tx.commit().await.map_err(internal)?;
        Ok(image)
    }

    async fn replace_image(&self, image: Image) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(internal)?;

        sqlx::query("UPDATE images SET title = ?, content = ?, date = ?, owner_id = ? WHERE id = ?")
            .bind(&image.title)
            .bind(&image.content)
            .bind(image.date)
            .bind(uuid_to_blob(image.owner.id))
            .bind(uuid_to_blob(image.id))
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        // Tag links are replaced wholesale, mirroring the edit semantics.
        sqlx::query("DELETE FROM image_tags WHERE image_id = ?")
            .bind(uuid_to_blob(image.id))
            .execute(&mut *tx)
            .await
            .map_err(internal)?;

        for (position, tag) in image.tags.iter().enumerate() {
            sqlx::query("INSERT INTO image_tags (image_id, tag_id, position) VALUES (?, ?, ?)")
                .bind(uuid_to_blob(image.id))
                .bind(uuid_to_blob(tag.id))
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .map_err(internal)?;
        }

        tx.commit().await.map_err(internal)?;
        Ok(())
    }

    async fn delete_image(&self, id: Uuid) -> Result<()> {
        // Comments and tag links cascade; tag rows stay behind.
        sqlx::query("DELETE FROM images WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn insert_comment(&self, comment: Comment) -> Result<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, text, created_date, user_id, image_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(comment.id))
        .bind(&comment.text)
        .bind(comment.created_date)
        .bind(uuid_to_blob(comment.user.id))
        .bind(uuid_to_blob(comment.image_id))
        .execute(&self.pool)
        .await
        .map_err(internal)?;
        Ok(comment)
    }

    async fn list_comments(&self, image_id: Uuid) -> Result<Vec<Comment>> {
        // UUIDv7 ids are time-ordered, which keeps same-day comments in
        // posting order.
        let rows = sqlx::query(
            "SELECT c.id, c.text, c.created_date, c.image_id,
                u.id AS user_id, u.username, u.password_hash, u.created_at AS user_created_at
             FROM comments c JOIN users u ON u.id = c.user_id
             WHERE c.image_id = ? ORDER BY c.created_date ASC, c.id ASC",
        )
        .bind(uuid_to_blob(image_id))
        .fetch_all(&self.pool)
        .await
        .map_err(internal)?;

        Ok(rows
            .into_iter()
            .map(|row| Comment {
                id: blob_to_uuid(row.get::<Vec<u8>, _>("id").as_slice()),
                text: row.get("text"),
                created_date: row.get("created_date"),
                user: user_from_row(&row),
                image_id: blob_to_uuid(row.get::<Vec<u8>, _>("image_id").as_slice()),
            })
            .collect())
    }
}

#[async_trait]
impl UserRepo for SqliteImageRepo {
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id AS user_id, username, password_hash, created_at AS user_created_at
             FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(internal)?;

        Ok(row.map(|row| user_from_row(&row)))
    }

    async fn insert_user(&self, user: User) -> Result<User> {
        sqlx::query("INSERT INTO users (id, username, password_hash, created_at) VALUES (?, ?, ?, ?)")
            .bind(uuid_to_blob(user.id))
            .bind(&user.username)
            .bind(&user.password_hash)
            .bind(user.created_at)
            .execute(&self.pool)
            .await
            .map_err(|err| map_insert_err(err, "user"))?;
        Ok(user)
    }
}
