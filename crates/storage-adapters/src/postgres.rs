//! # PostgreSQL store
//!
//! Maps the relational schema in `migrations/` onto the domain models.
//! Multi-row units of work run inside a transaction; everything else is a
//! single statement.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, error, info};
use uuid::Uuid;

use domains::{
    Category, CategoryRepository, DomainError, DomainResult, FeedQuery, NewNotice, NewPost,
    NewUser, Notice, NoticeRepository, Post, PostDraft, PostRepository, Reaction, ReactionChange,
    ReactionRepository, Role, SortOrder, User, UserRepository,
};

const POST_COLUMNS: &str =
    "id, title, content, category, created_at, view_count, user_id, username";
const USER_COLUMNS: &str = "id, username, email, password_hash, roles, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies pending migrations. Idempotent.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("database migrations applied");
        Ok(())
    }
}

/// Unique violations become `Conflict`; everything else is infrastructure.
fn db_err(e: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::Conflict(match db.constraint() {
                Some("users_username_key") => "Username is already taken".to_string(),
                Some("users_email_key") => "Email is already registered".to_string(),
                Some("categories_name_key") => "Category already exists".to_string(),
                _ => "Record already exists".to_string(),
            });
        }
    }
    error!(error = %e, "database error");
    DomainError::Persistence(e.to_string())
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Title => "title COLLATE \"C\" ASC, id ASC",
        SortOrder::MostViewed => "view_count DESC, id ASC",
        SortOrder::Recent => "created_at DESC, id DESC",
    }
}

fn post_from_row(row: &PgRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        category: row.try_get("category")?,
        created_at: row.try_get("created_at")?,
        view_count: row.try_get("view_count")?,
        user_id: row.try_get("user_id")?,
        username: row.try_get("username")?,
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    let roles: Vec<String> = row.try_get("roles")?;
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        // Unknown role names are ignored rather than failing the login.
        roles: roles.iter().filter_map(|r| r.parse().ok()).collect(),
        created_at: row.try_get("created_at")?,
    })
}

fn notice_from_row(row: &PgRow) -> Result<Notice, sqlx::Error> {
    Ok(Notice {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        message: row.try_get("message")?,
        created_at: row.try_get("created_at")?,
    })
}

fn category_from_row(row: &PgRow) -> Result<Category, sqlx::Error> {
    Ok(Category {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_rows<T>(
    rows: Vec<PgRow>,
    f: impl Fn(&PgRow) -> Result<T, sqlx::Error>,
) -> DomainResult<Vec<T>> {
    rows.iter().map(|r| f(r).map_err(db_err)).collect()
}

#[async_trait]
impl PostRepository for PgStore {
    async fn create(&self, post: NewPost) -> DomainResult<Post> {
        let sql = format!(
            "INSERT INTO posts (title, content, category, created_at, view_count, user_id, username) \
             VALUES ($1, $2, $3, $4, 0, $5, $6) RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.category)
            .bind(post.created_at)
            .bind(post.user_id)
            .bind(&post.username)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        post_from_row(&row).map_err(db_err)
    }

    async fn find(&self, id: i64) -> DomainResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(post_from_row).transpose().map_err(db_err)
    }

    async fn list(&self, query: &FeedQuery) -> DomainResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts \
             WHERE ($1::TEXT IS NULL OR LOWER(category) = LOWER($1)) \
             ORDER BY {}",
            order_clause(query.sort)
        );
        let rows = sqlx::query(&sql)
            .bind(query.category_filter())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        map_rows(rows, post_from_row)
    }

    async fn list_by_user(&self, user_id: Uuid) -> DomainResult<Vec<Post>> {
        let sql = format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE user_id = $1 ORDER BY {}",
            order_clause(SortOrder::Recent)
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        map_rows(rows, post_from_row)
    }

    async fn update(&self, id: i64, draft: &PostDraft) -> DomainResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET title = $2, content = $3, category = $4 \
             WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(&draft.title)
            .bind(&draft.content)
            .bind(&draft.category)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(post_from_row).transpose().map_err(db_err)
    }

    async fn increment_views(&self, id: i64) -> DomainResult<Option<Post>> {
        let sql = format!(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = $1 RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(post_from_row).transpose().map_err(db_err)
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        // Reactions go with the post through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReactionRepository for PgStore {
    async fn find(&self, post_id: i64, user_id: Uuid) -> DomainResult<Option<Reaction>> {
        let row = sqlx::query(
            "SELECT id, post_id, user_id, created_at FROM reactions \
             WHERE post_id = $1 AND user_id = $2 ORDER BY id LIMIT 1",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(|row| {
            Ok::<_, sqlx::Error>(Reaction {
                id: row.try_get("id")?,
                post_id: row.try_get("post_id")?,
                user_id: row.try_get("user_id")?,
                created_at: row.try_get("created_at")?,
            })
        })
        .transpose()
        .map_err(db_err)
    }

    async fn count_by_post(&self) -> DomainResult<HashMap<i64, i64>> {
        let rows = sqlx::query("SELECT post_id, COUNT(*) AS likes FROM reactions GROUP BY post_id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in &rows {
            let post_id: i64 = row.try_get("post_id").map_err(db_err)?;
            let likes: i64 = row.try_get("likes").map_err(db_err)?;
            counts.insert(post_id, likes);
        }
        Ok(counts)
    }

    async fn count_for_post(&self, post_id: i64) -> DomainResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM reactions WHERE post_id = $1")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)
    }

    async fn apply(&self, change: ReactionChange) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        match change {
            ReactionChange::Add { reaction, notice } => {
                let inserted = sqlx::query(
                    "INSERT INTO reactions (post_id, user_id, created_at) VALUES ($1, $2, $3)",
                )
                .bind(reaction.post_id)
                .bind(reaction.user_id)
                .bind(reaction.created_at)
                .execute(&mut *tx)
                .await;

                if let Err(e) = inserted {
                    // The post vanished between the check and the insert.
                    if let sqlx::Error::Database(db) = &e {
                        if db.is_foreign_key_violation() {
                            return Err(DomainError::not_found("Post", reaction.post_id));
                        }
                    }
                    return Err(db_err(e));
                }

                if let Some(notice) = notice {
                    sqlx::query(
                        "INSERT INTO notices (user_id, message, created_at) VALUES ($1, $2, $3)",
                    )
                    .bind(notice.user_id)
                    .bind(&notice.message)
                    .bind(notice.created_at)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
                }
            }
            ReactionChange::Remove { reaction_id } => {
                sqlx::query("DELETE FROM reactions WHERE id = $1")
                    .bind(reaction_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(db_err)?;
            }
        }

        tx.commit().await.map_err(db_err)
    }
}

#[async_trait]
impl NoticeRepository for PgStore {
    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Notice>> {
        let rows = sqlx::query(
            "SELECT id, user_id, message, created_at FROM notices \
             WHERE user_id = $1 ORDER BY id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        map_rows(rows, notice_from_row)
    }

    async fn clear_for_user(&self, user_id: Uuid) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM notices WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected())
    }

    async fn replace_global(&self, notice: NewNotice) -> DomainResult<Notice> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let removed = sqlx::query("DELETE FROM notices WHERE user_id IS NULL")
            .execute(&mut *tx)
            .await
            .map_err(db_err)?
            .rows_affected();

        let row = sqlx::query(
            "INSERT INTO notices (user_id, message, created_at) VALUES (NULL, $1, $2) \
             RETURNING id, user_id, message, created_at",
        )
        .bind(&notice.message)
        .bind(notice.created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        debug!(removed, "global notice replaced");
        notice_from_row(&row).map_err(db_err)
    }

    async fn current_global(&self) -> DomainResult<Option<Notice>> {
        let row = sqlx::query(
            "SELECT id, user_id, message, created_at FROM notices \
             WHERE user_id IS NULL ORDER BY id DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(notice_from_row).transpose().map_err(db_err)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let roles: Vec<String> = user.roles.iter().map(Role::to_string).collect();
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, roles, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&roles)
            .bind(user.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(db_err)?;
        user_from_row(&row).map_err(db_err)
    }

    async fn find(&self, id: Uuid) -> DomainResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn find_by_login(&self, login: &str) -> DomainResult<Option<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($1) LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(login)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(user_from_row).transpose().map_err(db_err)
    }

    async fn list(&self) -> DomainResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY username");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        map_rows(rows, user_from_row)
    }

    async fn grant_role(&self, id: Uuid, role: Role) -> DomainResult<()> {
        let result = sqlx::query(
            "UPDATE users SET roles = CASE WHEN $2 = ANY(roles) THEN roles \
             ELSE array_append(roles, $2) END WHERE id = $1",
        )
        .bind(id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found("User", id));
        }
        Ok(())
    }

    async fn delete_cascade(&self, id: Uuid) -> DomainResult<bool> {
        // Posts, reactions and notices follow through ON DELETE CASCADE,
        // so one statement is already a single unit of work.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CategoryRepository for PgStore {
    async fn list(&self) -> DomainResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM categories ORDER BY LOWER(name)")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        map_rows(rows, category_from_row)
    }

    async fn find(&self, id: i64) -> DomainResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, created_at FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(category_from_row).transpose().map_err(db_err)
    }

    async fn create(&self, name: &str) -> DomainResult<Category> {
        let row = sqlx::query(
            "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;
        category_from_row(&row).map_err(db_err)
    }

    async fn rename(&self, id: i64, name: &str) -> DomainResult<Option<Category>> {
        let row = sqlx::query(
            "UPDATE categories SET name = $2 WHERE id = $1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(category_from_row).transpose().map_err(db_err)
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}
