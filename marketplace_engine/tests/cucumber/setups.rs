use cucumber::{gherkin::Step, given};
use marketplace_engine::{
    db_types::{NewProduct, Price},
    test_utils::seed::{seed_category, seed_user},
    MarketplaceConfig,
};

use crate::cucumber::{world::MarketSystem, MarketWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut MarketWorld) {
    let system = MarketSystem::new(&MarketplaceConfig::default()).await;
    world.system = Some(system);
}

#[given("a fresh install where confirmed orders cannot be cancelled")]
async fn strict_database(world: &mut MarketWorld) {
    let config = MarketplaceConfig { release_on_cancel: false, ..Default::default() };
    world.system = Some(MarketSystem::new(&config).await);
}

#[given(expr = "the users {word}, {word} and {word}")]
async fn three_users(world: &mut MarketWorld, a: String, b: String, c: String) {
    for name in [a, b, c] {
        let user = seed_user(&world.system().db, &name).await;
        world.users.insert(name, user.id);
    }
}

#[given(expr = "the user {word}")]
async fn one_user(world: &mut MarketWorld, name: String) {
    let user = seed_user(&world.system().db, &name).await;
    world.users.insert(name, user.id);
}

//             Given Sam sells "Game key" for 1500 cents with a stock of 2
#[given(expr = "{word} sells {string} for {int} cents with a stock of {int}")]
async fn seller_lists_product(world: &mut MarketWorld, seller: String, title: String, price: i64, stock: i64) {
    let seller_id = world.user(&seller);
    let category = seed_category(&world.system().db, &format!("{title} category")).await;
    let product = NewProduct::new(title.as_str(), Price::from(price), category.id).with_max_sales(stock);
    let product = world.system().catalog.create_product(seller_id, product).await.expect("Error listing product");
    world.products.insert(title, product.id);
}

#[given(expr = "{word} stocks {string} with the keys:")]
async fn seller_stocks_keys(world: &mut MarketWorld, step: &Step, seller: String, title: String) {
    let (seller_id, product_id) = (world.user(&seller), world.product(&title));
    let keys = step
        .table
        .as_ref()
        .expect("A table of keys is required")
        .rows
        .iter()
        .map(|row| row[0].clone())
        .collect::<Vec<_>>();
    let items =
        world.system().catalog.add_product_items(product_id, seller_id, keys).await.expect("Error stocking keys");
    for item in items {
        world.items.insert(item.data.clone(), item.id);
    }
}
