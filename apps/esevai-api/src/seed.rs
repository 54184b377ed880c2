//! Idempotent catalog seeding: upsert-by-key over the two static tables

use esevai_types::catalog::{default_categories, default_services};
use esevai_types::{Service, ServiceCategory};
use serde::Serialize;
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub categories: usize,
    pub services: usize,
}

/// Seed the built-in catalog
pub async fn seed_catalog(pool: &SqlitePool) -> Result<SeedReport, sqlx::Error> {
    upsert_catalog(pool, &default_categories(), &default_services()).await
}

/// Insert or update every row by primary key in one transaction
pub async fn upsert_catalog(
    pool: &SqlitePool,
    categories: &[ServiceCategory],
    services: &[Service],
) -> Result<SeedReport, sqlx::Error> {
    let mut tx = pool.begin().await?;

    for category in categories {
        sqlx::query(
            r#"
            INSERT INTO service_categories (id, name, description, icon)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                icon = excluded.icon
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(&category.icon)
        .execute(&mut *tx)
        .await?;
    }

    for service in services {
        let required = serde_json::to_string(&service.required_documents)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        sqlx::query(
            r#"
            INSERT INTO services (code, name, description, category_id, price, required_documents_json, processing_days)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(code) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                category_id = excluded.category_id,
                price = excluded.price,
                required_documents_json = excluded.required_documents_json,
                processing_days = excluded.processing_days
            "#,
        )
        .bind(&service.code)
        .bind(&service.name)
        .bind(&service.description)
        .bind(&service.category_id)
        .bind(service.price)
        .bind(required)
        .bind(service.processing_days as i64)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    tracing::info!(
        "Seeded catalog: {} categories, {} services",
        categories.len(),
        services.len()
    );

    Ok(SeedReport {
        categories: categories.len(),
        services: services.len(),
    })
}
