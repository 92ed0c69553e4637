use sea_orm::sea_query::TableCreateStatement;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr, Schema,
    Statement,
};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::entity::{
    approval_attachment, approval_form, approval_log, department, form_schema, user,
};

/// Initialize database connection and auto-migrate tables
pub async fn init_database(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let database_url = config.connection_url();

    info!("Connecting to database: {}:{}/{}", config.host, config.port, config.name);

    let mut opt = ConnectOptions::new(&database_url);
    opt.max_connections(config.max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(true)
        .sqlx_logging_level(tracing::log::LevelFilter::Debug)
        .set_schema_search_path("public");

    let db = Database::connect(opt).await?;
    db.ping().await?;
    info!("Database connection established");

    auto_migrate(&db).await?;

    Ok(db)
}

/// Create any missing tables
async fn auto_migrate(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    info!("Running auto-migration for all entities...");

    create_table_if_not_exists(db, backend, schema.create_table_from_entity(department::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(user::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(form_schema::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(approval_form::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(approval_log::Entity)).await?;
    create_table_if_not_exists(db, backend, schema.create_table_from_entity(approval_attachment::Entity)).await?;

    info!("Auto-migration completed successfully");
    Ok(())
}

/// Create a table if it doesn't exist
async fn create_table_if_not_exists(
    db: &DatabaseConnection,
    backend: DbBackend,
    mut stmt: TableCreateStatement,
) -> Result<(), DbErr> {
    stmt.if_not_exists();

    let sql = backend.build(&stmt);

    db.execute(Statement::from_string(backend, sql.to_string())).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_statements_are_idempotent() {
        let backend = DbBackend::Postgres;
        let schema = Schema::new(backend);

        let mut stmt = schema.create_table_from_entity(approval_form::Entity);
        stmt.if_not_exists();
        let sql = backend.build(&stmt).to_string();

        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "approval_forms""#));
        assert!(sql.contains(r#""current_approver_id" bigint"#));
    }
}
