//! Application state for the e-Sevai API

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use crate::config::Config;

pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self> {
        tracing::info!("Connecting to database: {}", config.database_url);

        // In-memory databases live and die with their single connection
        let in_memory = config.database_url.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory { 1 } else { 5 });
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }

        let pool = options.connect(&config.database_url).await?;

        Self::with_pool(pool, config).await
    }

    /// Wrap an existing pool, running migrations first
    pub async fn with_pool(pool: SqlitePool, config: Config) -> Result<Self> {
        run_migrations(&pool).await?;
        Ok(Self { db: pool, config })
    }
}

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS service_categories (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        icon TEXT NOT NULL DEFAULT ''
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS services (
        code TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        category_id TEXT NOT NULL REFERENCES service_categories(id),
        price INTEGER NOT NULL,
        required_documents_json TEXT NOT NULL DEFAULT '[]',
        processing_days INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        phone TEXT,
        role TEXT NOT NULL DEFAULT 'customer',
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_requests (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES users(id),
        service_code TEXT NOT NULL REFERENCES services(code),
        status TEXT NOT NULL,
        documents_json TEXT NOT NULL DEFAULT '[]',
        output_document_json TEXT,
        notes TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS payments (
        id TEXT PRIMARY KEY,
        request_id TEXT NOT NULL REFERENCES service_requests(id),
        user_id TEXT NOT NULL REFERENCES users(id),
        amount INTEGER NOT NULL,
        currency TEXT NOT NULL DEFAULT 'INR',
        status TEXT NOT NULL,
        gateway_order_id TEXT,
        gateway_payment_id TEXT,
        gateway_signature TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS messages (
        id TEXT PRIMARY KEY,
        request_id TEXT NOT NULL REFERENCES service_requests(id),
        sender_id TEXT NOT NULL,
        body TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_services_category ON services(category_id)",
    "CREATE INDEX IF NOT EXISTS idx_requests_user ON service_requests(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_payments_request ON payments(request_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_request ON messages(request_id)",
];

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    tracing::info!("Running database migrations...");
    for statement in MIGRATIONS {
        sqlx::query(*statement).execute(pool).await?;
    }
    tracing::info!("Migrations complete");
    Ok(())
}
