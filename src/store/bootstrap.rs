//! Database bootstrap: create the database, schema and entity tables when missing.
//! Tables are created with IF NOT EXISTS only; existing tables are never altered.

use crate::error::AppError;
use crate::schema::{Registry, ResolvedEntity};
use crate::sql::{qualified_table, quoted};
use sqlx::{ConnectOptions, PgPool};
use std::str::FromStr;

/// Connect to the `postgres` maintenance database and create the target database if it does not exist.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url);
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quoted(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> (String, String) {
    let Some(slash) = url.rfind('/') else {
        return (url.to_string(), String::new());
    };
    let path_start = slash + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    (format!("{}postgres", base), db_name.to_string())
}

/// Create the schema, one table per entity and an index per foreign-key column.
pub async fn ensure_tables(pool: &PgPool, schema: &str, registry: &Registry) -> Result<(), AppError> {
    sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema)))
        .execute(pool)
        .await?;
    for entity in &registry.entities {
        let ddl = create_table_sql(entity, schema);
        tracing::debug!(sql = %ddl, "ensure table");
        sqlx::query(&ddl).execute(pool).await?;
        for ddl in foreign_key_index_sql(entity, schema) {
            tracing::debug!(sql = %ddl, "ensure index");
            sqlx::query(&ddl).execute(pool).await?;
        }
    }
    Ok(())
}

/// CREATE TABLE for one entity. Foreign-key columns are plain integers with no REFERENCES
/// constraint: deleting a parent leaves its children's ids dangling, and writes accept ids
/// of rows that do not exist.
fn create_table_sql(entity: &ResolvedEntity, schema: &str) -> String {
    let mut defs = Vec::new();
    for c in &entity.columns {
        let mut def = if c.name == entity.pk_column {
            format!("{} SERIAL PRIMARY KEY", quoted(&c.name))
        } else {
            format!("{} {}", quoted(&c.name), c.ty.pg_type())
        };
        if c.name == "date_created" {
            def.push_str(" DEFAULT NOW()");
        }
        if c.unique {
            def.push_str(" UNIQUE");
        }
        defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualified_table(schema, &entity.table_name),
        defs.join(", ")
    )
}

/// Foreign-key columns are looked up with IN queries when relations are projected.
fn foreign_key_index_sql(entity: &ResolvedEntity, schema: &str) -> Vec<String> {
    entity
        .columns
        .iter()
        .filter(|c| c.references.is_some())
        .map(|c| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quoted(&format!("{}_{}_idx", entity.table_name, c.name)),
                qualified_table(schema, &entity.table_name),
                quoted(&c.name)
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{resolve, CATALOGUE};

    #[test]
    fn db_name_is_split_from_url() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/naviwatch?sslmode=disable");
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "naviwatch");
    }

    #[test]
    fn foreign_keys_are_plain_indexed_integers() {
        let reg = resolve(CATALOGUE).unwrap();
        let food = reg.entity_by_path("food").unwrap();
        let ddl = create_table_sql(food, "nw");
        assert!(ddl.starts_with(r#"CREATE TABLE IF NOT EXISTS "nw"."food" ("xid" SERIAL PRIMARY KEY, "date_created" timestamptz DEFAULT NOW()"#));
        assert!(ddl.contains(r#""pet_xid" integer, "person_xid" integer)"#));
        assert!(!ddl.contains("REFERENCES"));

        let indexes = foreign_key_index_sql(food, "nw");
        assert_eq!(
            indexes,
            vec![
                r#"CREATE INDEX IF NOT EXISTS "food_pet_xid_idx" ON "nw"."food" ("pet_xid")"#.to_string(),
                r#"CREATE INDEX IF NOT EXISTS "food_person_xid_idx" ON "nw"."food" ("person_xid")"#.to_string(),
            ]
        );
        assert!(foreign_key_index_sql(reg.entity_by_path("pet").unwrap(), "nw").is_empty());
    }

    #[test]
    fn natural_key_is_unique() {
        let reg = resolve(CATALOGUE).unwrap();
        let pet = reg.entity_by_path("pet").unwrap();
        let ddl = create_table_sql(pet, "nw");
        assert!(ddl.contains(r#""name" varchar(255) UNIQUE"#));
    }
}
