use storefront_api::{
    config::AppConfig,
    db::{create_document_schema, create_orm_conn, create_relational_schema},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    create_relational_schema(&orm).await?;
    println!("Relational schema ready (users, reset_tokens)");

    let documents = create_orm_conn(&config.document_database_url, config.db_max_connections).await?;
    create_document_schema(&documents).await?;
    println!("Document schema ready (products, carts, orders)");

    orm.close().await?;
    documents.close().await?;
    Ok(())
}
