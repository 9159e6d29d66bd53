use crate::{
    db_types::{Category, NewProduct, NewUser, Price, Product, User},
    CatalogManagement,
    SqliteDatabase,
};

pub async fn seed_user(db: &SqliteDatabase, username: &str) -> User {
    let user = NewUser::new(username.to_string(), format!("{username}@example.com"));
    db.register_user(user).await.expect("Error registering user")
}

pub async fn seed_category(db: &SqliteDatabase, name: &str) -> Category {
    db.create_category(name).await.expect("Error creating category")
}

/// Lists a product straight through the backend, skipping the API's validation.
pub async fn seed_product(
    db: &SqliteDatabase,
    seller_id: i64,
    category_id: i64,
    title: &str,
    price: i64,
    max_sales: i64,
) -> Product {
    let product = NewProduct::new(title, Price::from(price), category_id).with_max_sales(max_sales);
    db.insert_product(seller_id, product).await.expect("Error inserting product")
}
