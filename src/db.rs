use std::time::Duration;

use anyhow::Result;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
};

use crate::entity::{Carts, Orders, Products, ResetTokens, Users};

/// Open a pooled SeaORM connection.
///
/// The pool is shared by every request for the lifetime of the process and is
/// closed explicitly on shutdown.
pub async fn create_orm_conn(database_url: &str, max_connections: u32) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(max_connections)
        .min_connections(0)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(10))
        .sqlx_logging(false);
    let conn = Database::connect(options).await?;
    Ok(conn)
}

/// Tables held by the relational store: credentials and reset tokens.
pub async fn create_relational_schema(conn: &DatabaseConnection) -> Result<()> {
    create_table(conn, Users).await?;
    create_table(conn, ResetTokens).await?;
    Ok(())
}

/// Collections held by the document store: products, carts and orders.
pub async fn create_document_schema(conn: &DatabaseConnection) -> Result<()> {
    create_table(conn, Products).await?;
    create_table(conn, Carts).await?;
    create_table(conn, Orders).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(conn: &DatabaseConnection, entity: E) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    conn.execute(backend.build(&statement)).await?;
    Ok(())
}
