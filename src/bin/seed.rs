use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use storefront_api::{
    config::AppConfig,
    db::{create_document_schema, create_orm_conn, create_relational_schema},
    dto::products::CreateProductRequest,
    entity::users::{ActiveModel as UserActive, Column as UserCol, Entity as Users},
    models::Role,
    repository::{CatalogRepository, DocumentStore, ProductFilter},
    services::password::hash_password,
};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url, config.db_max_connections).await?;
    create_relational_schema(&orm).await?;
    let documents_conn =
        create_orm_conn(&config.document_database_url, config.db_max_connections).await?;
    create_document_schema(&documents_conn).await?;

    let supplier_id = ensure_user(&orm, "Shop Supplier", "supplier@example.com", "supplier123", Role::Supplier).await?;
    let customer_id = ensure_user(&orm, "Shop Customer", "customer@example.com", "customer123", Role::Customer).await?;
    seed_products(&DocumentStore::new(documents_conn.clone())).await?;

    println!("Seed completed. Supplier ID: {supplier_id}, Customer ID: {customer_id}");
    orm.close().await?;
    documents_conn.close().await?;
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    name: &str,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let now = Utc::now().into();
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        name: Set(name.to_string()),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={})", role.as_str());
    Ok(user.id)
}

async fn seed_products(catalog: &DocumentStore) -> anyhow::Result<()> {
    let (_, existing) = catalog
        .list(&ProductFilter {
            limit: 1,
            ..ProductFilter::default()
        })
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    if existing > 0 {
        println!("Catalog already has {existing} products, skipping");
        return Ok(());
    }

    let products = [
        ("Wireless Headphones", "Over-ear, 30 hours of battery", 129_900, 25, "Electronics"),
        ("Ceramic Mug", "Dishwasher safe, 350 ml", 8_900, 120, "Kitchen"),
        ("Running Shoes", "Lightweight trainers for daily runs", 74_900, 40, "Sports"),
        ("Desk Lamp", "LED lamp with three brightness levels", 24_900, 60, "Home"),
    ];

    for (name, description, price, stock, category) in products {
        catalog
            .create(&CreateProductRequest {
                name: name.to_string(),
                description: description.to_string(),
                price: Some(price),
                stock: Some(stock),
                category: Some(category.to_string()),
                ..CreateProductRequest::default()
            })
            .await
            .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    }

    println!("Seeded products");
    Ok(())
}
