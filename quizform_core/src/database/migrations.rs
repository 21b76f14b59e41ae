use sqlx::{Row, SqlitePool};
use tracing::{error, info};

use crate::error::{AppError, Result};

pub struct MigrationManager {
    pool: SqlitePool,
}

impl MigrationManager {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        info!("Starting database migrations");

        self.create_migrations_table().await?;

        let current_version = self.get_current_version().await?;
        info!("Current migration version: {}", current_version);

        let mut applied_count = 0;

        for migration in migrations() {
            if migration.version > current_version {
                info!("Applying migration {}: {}", migration.version, migration.name);
                self.apply_migration(&migration).await?;
                applied_count += 1;
            }
        }

        if applied_count > 0 {
            info!("Applied {} migrations successfully", applied_count);
        } else {
            info!("No new migrations to apply");
        }

        Ok(())
    }

    async fn create_migrations_table(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn get_current_version(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COALESCE(MAX(version), 0) as version FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(row.try_get("version")?)
    }

    async fn apply_migration(&self, migration: &Migration) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        for statement in migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    error!("Failed to execute migration statement: {}", e);
                    AppError::from(e)
                })?;
        }

        sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.name)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }

    pub async fn applied_versions(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query("SELECT version FROM _migrations ORDER BY version")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows.iter()
            .map(|row| row.try_get("version").map_err(AppError::from))
            .collect()
    }
}

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "create_users_table",
            statements: &[
                r#"
                CREATE TABLE users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'user',
                    created_at TEXT NOT NULL,
                    last_login TEXT,
                    is_active BOOLEAN NOT NULL DEFAULT 1
                )
                "#,
                "CREATE INDEX idx_users_email ON users(email)",
            ],
        },
        Migration {
            version: 2,
            name: "create_templates_table",
            statements: &[
                r#"
                CREATE TABLE templates (
                    id TEXT PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT,
                    topic TEXT NOT NULL,
                    tags TEXT NOT NULL DEFAULT '[]',
                    questions TEXT NOT NULL DEFAULT '[]',
                    is_public BOOLEAN NOT NULL DEFAULT 1,
                    status TEXT NOT NULL DEFAULT 'pending',
                    user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                )
                "#,
                "CREATE INDEX idx_templates_user_id ON templates(user_id)",
                "CREATE INDEX idx_templates_status ON templates(status, is_public)",
                "CREATE INDEX idx_templates_created_at ON templates(created_at)",
            ],
        },
        Migration {
            version: 3,
            name: "create_responses_table",
            statements: &[
                r#"
                CREATE TABLE responses (
                    id TEXT PRIMARY KEY,
                    template_id TEXT NOT NULL,
                    user_id INTEGER,
                    answers TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (template_id) REFERENCES templates(id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE SET NULL
                )
                "#,
                "CREATE INDEX idx_responses_template_id ON responses(template_id)",
                "CREATE INDEX idx_responses_user_id ON responses(user_id)",
            ],
        },
        Migration {
            version: 4,
            name: "create_interaction_tables",
            statements: &[
                r#"
                CREATE TABLE likes (
                    template_id TEXT NOT NULL,
                    user_id INTEGER NOT NULL,
                    created_at TEXT NOT NULL,
                    PRIMARY KEY (template_id, user_id),
                    FOREIGN KEY (template_id) REFERENCES templates(id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                )
                "#,
                r#"
                CREATE TABLE comments (
                    id TEXT PRIMARY KEY,
                    template_id TEXT NOT NULL,
                    user_id INTEGER NOT NULL,
                    content TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    FOREIGN KEY (template_id) REFERENCES templates(id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
                )
                "#,
                "CREATE INDEX idx_comments_template_id ON comments(template_id)",
            ],
        },
    ]
}

pub async fn run_migrations(pool: SqlitePool) -> Result<()> {
    let migration_manager = MigrationManager::new(pool);
    migration_manager.run_migrations().await
}
