//! Integration tests for cancellation and stock restoration.

use rust_decimal::Decimal;

use matchday_core::{OrderId, OrderStatus};
use matchday_integration_tests::{CapturingObserver, PipelineContext, cart_with, test_user};
use matchday_orders::{EventKind, OrderError, PlacementOptions};

// =============================================================================
// Cancellation Gate
// =============================================================================

#[tokio::test]
async fn test_confirmed_order_cancels_and_restores_stock() {
    let ctx = PipelineContext::new();
    let observer = CapturingObserver::new();
    ctx.events.attach(EventKind::OrderCancelled, observer.clone());

    let user = test_user(1);
    // Scenario C: one line, qty 4, order sitting in CONFIRMED
    let jersey = ctx
        .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 9)])
        .await;
    let order_id = ctx
        .service
        .place_order(
            &cart_with(&user, jersey, "M", 4),
            &user,
            PlacementOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(ctx.count(1, "M").await, 5);
    assert!(ctx.service.update_status(order_id, OrderStatus::Confirmed).await.unwrap());

    assert!(ctx.service.cancel_order(order_id).await.unwrap());

    let order = ctx.service.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
    assert_eq!(ctx.count(1, "M").await, 9);

    assert_eq!(observer.count_of(EventKind::OrderCancelled), 1);
    let history = ctx.events.history(Some(EventKind::OrderCancelled), 10);
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_place_then_cancel_roundtrip_restores_exact_count() {
    let ctx = PipelineContext::new();
    let user = test_user(1);
    let jersey = ctx
        .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 7)])
        .await;

    let order_id = ctx
        .service
        .place_order(
            &cart_with(&user, jersey, "M", 3),
            &user,
            PlacementOptions::default(),
        )
        .await
        .unwrap();
    assert_eq!(ctx.count(1, "M").await, 4);

    assert!(ctx.service.cancel_order(order_id).await.unwrap());
    assert_eq!(ctx.count(1, "M").await, 7);
}

#[tokio::test]
async fn test_cancellable_from_pending_confirmed_and_in_process() {
    for prepare in [Vec::new(), vec![OrderStatus::Confirmed], vec![
        OrderStatus::Confirmed,
        OrderStatus::InProcess,
    ]] {
        let ctx = PipelineContext::new();
        let user = test_user(1);
        let jersey = ctx
            .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 5)])
            .await;
        let order_id = ctx
            .service
            .place_order(
                &cart_with(&user, jersey, "M", 2),
                &user,
                PlacementOptions::default(),
            )
            .await
            .unwrap();
        for status in prepare {
            assert!(ctx.service.update_status(order_id, status).await.unwrap());
        }

        assert!(ctx.service.cancel_order(order_id).await.unwrap());
        assert_eq!(ctx.count(1, "M").await, 5);
    }
}

#[tokio::test]
async fn test_not_cancellable_once_shipped_or_done() {
    let shipped = [OrderStatus::Confirmed, OrderStatus::InProcess, OrderStatus::Shipped];
    let delivered = [
        OrderStatus::Confirmed,
        OrderStatus::InProcess,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ];

    for (walk, expected) in [
        (&shipped[..], OrderStatus::Shipped),
        (&delivered[..], OrderStatus::Delivered),
    ] {
        let ctx = PipelineContext::new();
        let observer = CapturingObserver::new();
        ctx.events.attach(EventKind::OrderCancelled, observer.clone());

        let user = test_user(1);
        let jersey = ctx
            .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 5)])
            .await;
        let order_id = ctx
            .service
            .place_order(
                &cart_with(&user, jersey, "M", 2),
                &user,
                PlacementOptions::default(),
            )
            .await
            .unwrap();
        for status in walk {
            assert!(ctx.service.update_status(order_id, *status).await.unwrap());
        }

        // rejected: status, inventory, and history all untouched
        assert!(!ctx.service.cancel_order(order_id).await.unwrap());
        let order = ctx.service.get_order(order_id).await.unwrap().unwrap();
        assert_eq!(order.status, expected);
        assert_eq!(ctx.count(1, "M").await, 3);
        assert_eq!(observer.count_of(EventKind::OrderCancelled), 0);
    }
}

#[tokio::test]
async fn test_cancelling_twice_rejects_the_second_attempt() {
    let ctx = PipelineContext::new();
    let user = test_user(1);
    let jersey = ctx
        .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 5)])
        .await;
    let order_id = ctx
        .service
        .place_order(
            &cart_with(&user, jersey, "M", 2),
            &user,
            PlacementOptions::default(),
        )
        .await
        .unwrap();

    assert!(ctx.service.cancel_order(order_id).await.unwrap());
    assert!(!ctx.service.cancel_order(order_id).await.unwrap());
    // restoration must not run twice
    assert_eq!(ctx.count(1, "M").await, 5);
}

#[tokio::test]
async fn test_cancel_unknown_order_is_not_found() {
    let ctx = PipelineContext::new();
    let err = ctx.service.cancel_order(OrderId::new(404)).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound(id) if id == OrderId::new(404)));
}
