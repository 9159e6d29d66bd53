use super::mocks::{item, order, product, MockBackend};
use crate::{
    config::MarketplaceConfig,
    db_types::{Order, OrderStatusType, OrderStatusType::*},
    traits::ErrorKind,
    MarketplaceError,
    OrderFlowApi,
};

fn backend_with_order(status: OrderStatusType) -> MockBackend {
    let mut db = MockBackend::new();
    db.expect_fetch_order().returning(move |id| Ok((id == 1).then(|| order(1, 10, 5, status))));
    db
}

fn moved(order: &Order, status: OrderStatusType) -> Order {
    Order { status, ..order.clone() }
}

#[tokio::test]
async fn create_order_checks_customer_then_product() {
    let mut db = MockBackend::new().with_users(&[10, 20]);
    db.expect_fetch_product().returning(|id| Ok((id == 5).then(|| product(5, 20, 0, 0))));
    db.expect_insert_order().times(1).returning(|o| Ok(order(1, o.customer_id.unwrap(), o.product_id.unwrap(), Pending)));
    let api = OrderFlowApi::new(db);

    let err = api.create_order(99, 5).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::CustomerNotFound(99)));
    let err = api.create_order(10, 6).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProductNotFound(6)));
    let err = api.create_order(20, 5).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::SelfPurchase(20, 5)));
    let created = api.create_order(10, 5).await.unwrap();
    assert_eq!(created.status, Pending);
    assert_eq!(created.customer_id, Some(10));
}

#[tokio::test]
async fn only_the_customer_may_confirm_or_cancel() {
    let mut db = backend_with_order(Pending);
    db.expect_confirm_order().never();
    db.expect_update_order_status().never();
    let api = OrderFlowApi::new(db);

    let err = api.confirm_order(1, 11).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    let err = api.cancel_order(1, 11).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
    let err = api.confirm_order(2, 10).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderNotFound(2)));
}

#[tokio::test]
async fn confirmed_orders_are_cancelled_with_a_release() {
    let mut db = backend_with_order(Confirmed);
    db.expect_update_order_status()
        .withf(|o, status, release| o.status == Confirmed && *status == Cancelled && *release)
        .times(1)
        .returning(|o, status, _| Ok(moved(o, status)));
    let api = OrderFlowApi::new(db);
    let cancelled = api.cancel_order(1, 10).await.unwrap();
    assert_eq!(cancelled.status, Cancelled);
}

#[tokio::test]
async fn confirmed_orders_stay_put_without_release_on_cancel() {
    let mut db = backend_with_order(Confirmed);
    db.expect_update_order_status().never();
    let config = MarketplaceConfig { release_on_cancel: false, ..Default::default() };
    let api = OrderFlowApi::from_config(db, &config);
    let err = api.cancel_order(1, 10).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(err.to_string(), "Order #1 cannot be cancelled while it is confirmed");
}

#[tokio::test]
async fn finished_orders_cannot_be_cancelled() {
    for status in [Completed, Cancelled, Refunded] {
        let mut db = backend_with_order(status);
        db.expect_update_order_status().never();
        let api = OrderFlowApi::new(db);
        let err = api.cancel_order(1, 10).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict, "cancelling a {status} order");
    }
}

#[tokio::test]
async fn only_pending_orders_are_processed_or_confirmed() {
    let mut db = backend_with_order(Completed);
    db.expect_process_order().never();
    db.expect_confirm_order().never();
    let api = OrderFlowApi::new(db);
    let err = api.process_order(1).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderStatusConflict { status: Completed, .. }));
    let err = api.confirm_order(1, 10).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderStatusConflict { status: Completed, .. }));
}

#[tokio::test]
async fn processing_posts_the_configured_notice() {
    let mut db = backend_with_order(Pending);
    db.expect_process_order().withf(|o, notice| o.id == 1 && notice == "Ship it").times(1).returning(|o, _| {
        Ok(crate::order_objects::ProcessedOrder {
            order: moved(o, Completed),
            item: None,
            conversation: None,
            notice: None,
        })
    });
    let api = OrderFlowApi::new(db).with_order_processed_notice("Ship it");
    let processed = api.process_order(1).await.unwrap();
    assert_eq!(processed.order.status, Completed);
}

#[tokio::test]
async fn admin_transitions() {
    // Same status
    let api = OrderFlowApi::new(backend_with_order(Confirmed));
    let err = api.modify_status_for_order(1, Confirmed).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::OrderModificationNoOp(1, Confirmed)));

    // Reservations only happen through confirm and process
    for target in [Confirmed, Completed, Refunded] {
        let mut db = backend_with_order(Pending);
        db.expect_update_order_status().never();
        let api = OrderFlowApi::new(db);
        let err = api.modify_status_for_order(1, target).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict, "pending -> {target}");
    }

    // Nothing leaves a terminal state
    let api = OrderFlowApi::new(backend_with_order(Refunded));
    assert!(api.modify_status_for_order(1, Completed).await.is_err());

    let mut db = backend_with_order(Confirmed);
    db.expect_update_order_status()
        .withf(|_, status, release| *status == Refunded && *release)
        .times(1)
        .returning(|o, status, _| Ok(moved(o, status)));
    let api = OrderFlowApi::new(db);
    let changed = api.modify_status_for_order(1, Refunded).await.unwrap();
    assert_eq!(changed.old_order.status, Confirmed);
    assert_eq!(changed.new_order.status, Refunded);

    let mut db = backend_with_order(Completed);
    db.expect_update_order_status()
        .withf(|o, status, _| o.status == Completed && *status == Refunded)
        .times(1)
        .returning(|o, status, _| Ok(moved(o, status)));
    let api = OrderFlowApi::new(db);
    let changed = api.modify_status_for_order(1, Refunded).await.unwrap();
    assert_eq!(changed.new_order.status, Refunded);
}

#[tokio::test]
async fn admin_moves_are_the_legal_edges_that_take_no_stock() {
    const ALL: [OrderStatusType; 5] = [Pending, Confirmed, Completed, Cancelled, Refunded];
    let allowed = [(Pending, Cancelled), (Confirmed, Completed), (Confirmed, Cancelled), (Confirmed, Refunded), (
        Completed, Refunded,
    )];
    for from in ALL {
        for to in ALL.into_iter().filter(|to| *to != from) {
            let expected = allowed.contains(&(from, to));
            let mut db = backend_with_order(from);
            db.expect_update_order_status().times(usize::from(expected)).returning(|o, status, _| Ok(moved(o, status)));
            let api = OrderFlowApi::new(db);
            let result = api.modify_status_for_order(1, to).await;
            assert_eq!(result.is_ok(), expected, "{from} -> {to}");
            if let Err(e) = result {
                assert!(matches!(e, MarketplaceError::OrderStatusConflict { order_id: 1, .. }), "{from} -> {to}: {e}");
            }
        }
    }
}

#[tokio::test]
async fn item_orders_need_an_unused_item_of_someone_elses_product() {
    let mut db = MockBackend::new().with_users(&[10, 20]);
    db.expect_fetch_product().returning(|id| Ok((id == 5).then(|| product(5, 20, 0, 0))));
    db.expect_fetch_product_item().returning(|id| match id {
        7 => Ok(Some(item(7, 5, false))),
        8 => Ok(Some(item(8, 5, true))),
        _ => Ok(None),
    });
    db.expect_insert_order()
        .withf(|o| o.product_item_id == Some(7) && o.product_id == Some(5))
        .times(1)
        .returning(|o| Ok(Order { product_item_id: o.product_item_id, ..order(1, 10, 5, Pending) }));
    let api = OrderFlowApi::new(db);

    assert!(matches!(api.create_order_for_item(99, 7).await, Err(MarketplaceError::CustomerNotFound(99))));
    assert!(matches!(api.create_order_for_item(10, 9).await, Err(MarketplaceError::ProductItemNotFound(9))));
    let err = api.create_order_for_item(10, 8).await.unwrap_err();
    assert!(matches!(err, MarketplaceError::ProductItemUnavailable(8)));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(matches!(api.create_order_for_item(20, 7).await, Err(MarketplaceError::SelfPurchase(20, 5))));

    let created = api.create_order_for_item(10, 7).await.unwrap();
    assert_eq!(created.product_item_id, Some(7));
    assert_eq!(created.product_id, Some(5));
    assert_eq!(created.status, Pending);
}
