use std::time::Duration;

use cucumber::{gherkin::Step, then, when};
use marketplace_engine::{db_types::OrderStatusType, ErrorKind};

use crate::cucumber::MarketWorld;

//--------------------------------------        Orders         ---------------------------------------------------------

//             When Ann orders "Game key" as order A
#[when(expr = "{word} orders {string} as order {word}")]
async fn place_order(world: &mut MarketWorld, customer: String, title: String, label: String) {
    let (customer_id, product_id) = (world.user(&customer), world.product(&title));
    let result = world.system().orders.create_order(customer_id, product_id).await;
    if let Some(order) = world.record(result) {
        world.orders.insert(label, order.id);
    }
}

//             When Ann orders the key "AAAA-1111" as order A
#[when(expr = "{word} orders the key {string} as order {word}")]
async fn order_item(world: &mut MarketWorld, customer: String, key: String, label: String) {
    let (customer_id, item_id) = (world.user(&customer), world.item(&key));
    let result = world.system().orders.create_order_for_item(customer_id, item_id).await;
    if let Some(order) = world.record(result) {
        world.orders.insert(label, order.id);
    }
}

#[when(expr = "order {word} is processed")]
async fn process_order(world: &mut MarketWorld, label: String) {
    let order_id = world.order(&label);
    let result = world.system().orders.process_order(order_id).await;
    world.record(result);
}

#[when(expr = "{word} confirms order {word}")]
async fn confirm_order(world: &mut MarketWorld, customer: String, label: String) {
    let (customer_id, order_id) = (world.user(&customer), world.order(&label));
    let result = world.system().orders.confirm_order(order_id, customer_id).await;
    world.record(result);
}

#[when(expr = "{word} cancels order {word}")]
async fn cancel_order(world: &mut MarketWorld, customer: String, label: String) {
    let (customer_id, order_id) = (world.user(&customer), world.order(&label));
    let result = world.system().orders.cancel_order(order_id, customer_id).await;
    world.record(result);
}

#[when(expr = "an admin marks order {word} as {word}")]
async fn admin_sets_status(world: &mut MarketWorld, label: String, status: String) {
    let status = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order_id = world.order(&label);
    let result = world.system().orders.modify_status_for_order(order_id, status).await;
    world.record(result);
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut MarketWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "order {word} is {word}")]
async fn check_order_status(world: &mut MarketWorld, label: String, status: String) {
    let expected = status.parse::<OrderStatusType>().expect("Not a valid order status");
    let order = world.system().orders.fetch_order(world.order(&label)).await.expect("Error fetching order");
    assert_eq!(order.status, expected, "Order {label} has the wrong status");
}

#[then(expr = "{string} has sold {int} unit(s)")]
async fn check_sold_count(world: &mut MarketWorld, title: String, sold: i64) {
    let product = world.system().catalog.get_product(world.product(&title)).await.expect("Error fetching product");
    assert_eq!(product.sold_count, sold, "Wrong sold count for {title}");
}

#[then(expr = "{string} has {int} key(s) left")]
async fn check_keys_left(world: &mut MarketWorld, title: String, left: usize) {
    let available =
        world.system().catalog.available_item_count(world.product(&title)).await.expect("Error counting keys");
    assert_eq!(available, left, "Wrong number of keys left for {title}");
}

#[then(expr = "{string} is sold out")]
async fn check_sold_out(world: &mut MarketWorld, title: String) {
    let available = world.system().catalog.is_available(world.product(&title)).await.expect("Error fetching product");
    assert!(!available, "{title} is still available");
}

//--------------------------------------     Conversations     ---------------------------------------------------------

//             When Ann opens a conversation with Sam as chat
#[when(expr = "{word} opens a conversation with {word} as {word}")]
async fn open_conversation(world: &mut MarketWorld, a: String, b: String, label: String) {
    let members = [world.user(&a), world.user(&b)];
    let result = world.system().conversations.create_conversation(members, None).await;
    if let Some(conversation) = world.record(result) {
        world.conversations.insert(label, conversation.id);
    }
}

#[when(expr = "{word} says {string} in {word}")]
async fn say(world: &mut MarketWorld, user: String, text: String, label: String) {
    let (user_id, conversation_id) = (world.user(&user), world.conversation(&label));
    let result = world.system().conversations.send_message(conversation_id, user_id, &text).await;
    world.record(result);
}

#[when(expr = "{word} is added to {word}")]
async fn add_participant(world: &mut MarketWorld, user: String, label: String) {
    let (user_id, conversation_id) = (world.user(&user), world.conversation(&label));
    let result = world.system().conversations.add_participant(conversation_id, user_id).await;
    world.record(result);
}

#[when(expr = "{word} leaves {word}")]
async fn leave(world: &mut MarketWorld, user: String, label: String) {
    let (user_id, conversation_id) = (world.user(&user), world.conversation(&label));
    let result = world.system().conversations.remove_participant(conversation_id, user_id).await;
    world.record(result);
}

#[when(expr = "{word} reads {word}")]
async fn read(world: &mut MarketWorld, user: String, label: String) {
    let (user_id, conversation_id) = (world.user(&user), world.conversation(&label));
    let result = world.system().conversations.conversation_with_messages(conversation_id, user_id).await;
    world.record(result);
}

#[then(expr = "{word} has {int} participants")]
async fn check_participants(world: &mut MarketWorld, label: String, count: usize) {
    let participants =
        world.system().conversations.participants(world.conversation(&label)).await.expect("Error fetching members");
    assert_eq!(participants.len(), count);
}

#[then(expr = "{word} sees the messages in {word}:")]
async fn check_messages(world: &mut MarketWorld, step: &Step, user: String, label: String) {
    let (user_id, conversation_id) = (world.user(&user), world.conversation(&label));
    let view = world
        .system()
        .conversations
        .conversation_with_messages(conversation_id, user_id)
        .await
        .expect("Error fetching conversation");
    let expected = step
        .table
        .as_ref()
        .expect("A table of messages is required")
        .rows
        .iter()
        .map(|row| row[0].clone())
        .collect::<Vec<_>>();
    let actual = view.messages.into_iter().map(|m| m.text).collect::<Vec<_>>();
    assert_eq!(actual, expected);
}

//             Then Ann and Sam share a conversation about "Game key" that mentions order A
#[then(expr = "{word} and {word} share a conversation about {string} that mentions order {word}")]
async fn check_order_conversation(world: &mut MarketWorld, a: String, b: String, title: String, label: String) {
    let (a, b, product_id, order_id) = (world.user(&a), world.user(&b), world.product(&title), world.order(&label));
    let api = &world.system().conversations;
    let notices = api.messages_for_order(order_id).await.expect("Error fetching messages");
    assert_eq!(notices.len(), 1, "Expected exactly one notice for the order");
    let conversation = api.fetch_conversation(notices[0].conversation_id).await.expect("Error fetching conversation");
    assert_eq!(conversation.product_id, Some(product_id));
    let members = api.participants(conversation.id).await.expect("Error fetching members");
    let mut ids = members.into_iter().map(|p| p.user_id).collect::<Vec<_>>();
    ids.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(ids, expected);
}

#[then(expr = "{word} has no conversations")]
async fn check_no_conversations(world: &mut MarketWorld, user: String) {
    let inbox = world.system().conversations.conversations_for_user(world.user(&user)).await.expect("Error");
    assert!(inbox.is_empty(), "{user} has {} conversations", inbox.len());
}

//--------------------------------------       Outcomes        ---------------------------------------------------------

#[then("the request succeeds")]
async fn request_succeeds(world: &mut MarketWorld) {
    if let Some(e) = &world.last_error {
        panic!("Expected the last request to succeed, but it failed with: {e}");
    }
}

//             Then the request fails with a conflict error
#[then(expr = "the request fails with a(n) {word} error")]
async fn request_fails(world: &mut MarketWorld, kind: String) {
    let expected = match kind.as_str() {
        "validation" => ErrorKind::Validation,
        "not-found" => ErrorKind::NotFound,
        "authorization" => ErrorKind::Authorization,
        "conflict" => ErrorKind::Conflict,
        "internal" => ErrorKind::Internal,
        _ => panic!("Unknown error kind: {kind}"),
    };
    let err = world.last_error.as_ref().expect("Expected the last request to fail, but it succeeded");
    assert_eq!(err.kind(), expected, "Unexpected error: {err}");
}

#[then(expr = "the error message is {string}")]
async fn check_error_message(world: &mut MarketWorld, message: String) {
    let err = world.last_error.as_ref().expect("The last request did not fail");
    assert_eq!(err.to_string(), message);
}
