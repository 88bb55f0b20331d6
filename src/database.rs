use anyhow::Result;
use libsql::{Builder, Connection};
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    name           TEXT    UNIQUE NOT NULL,
    password_hash  TEXT    NOT NULL
);
"#;

const CREATE_AUTH_TOKENS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS auth_tokens (
    token       TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    created_at  INTEGER NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    TEXT    NOT NULL,
    name       TEXT    NOT NULL,
    type       TEXT    NOT NULL CHECK (type IN ('EXPENSE', 'INCOME')),
    parent_id  INTEGER NULL REFERENCES categories(id)
);
"#;

const CREATE_CATEGORIES_OWNER_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_categories_owner_parent ON categories(user_id, parent_id);
"#;

const CREATE_CATEGORIES_NAME_INDEX: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_owner_type_name
    ON categories(user_id, type, name COLLATE NOCASE);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens (or creates) `categories.db` under `data_dir` and applies the schema.
pub async fn init_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join("categories.db");
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_AUTH_TOKENS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_OWNER_INDEX, ()).await?;
    conn.execute(CREATE_CATEGORIES_NAME_INDEX, ()).await?;

    tracing::debug!(data_dir, "database schema ready");
    Ok(Arc::new(RwLock::new(conn)))
}
