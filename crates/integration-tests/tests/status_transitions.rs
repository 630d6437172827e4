//! Integration tests for lifecycle transitions through the service.

use rust_decimal::Decimal;

use matchday_core::types::status::ALL_STATUSES;
use matchday_core::{OrderId, OrderStatus};
use matchday_integration_tests::{CapturingObserver, PipelineContext, cart_with, test_user};
use matchday_orders::{EventKind, OrderError, PlacementOptions};

async fn placed_order(ctx: &PipelineContext) -> OrderId {
    let user = test_user(1);
    let jersey = ctx
        .seed_product(1, "Home Jersey", Decimal::new(2000, 2), &[("M", 50)])
        .await;
    ctx.service
        .place_order(
            &cart_with(&user, jersey, "M", 1),
            &user,
            PlacementOptions::default(),
        )
        .await
        .expect("placement should succeed")
}

#[tokio::test]
async fn test_happy_path_walks_to_delivered() {
    let ctx = PipelineContext::new();
    let observer = CapturingObserver::new();
    ctx.events.attach(EventKind::OrderUpdated, observer.clone());

    let order_id = placed_order(&ctx).await;
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::InProcess,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        assert!(ctx.service.update_status(order_id, status).await.unwrap());
    }

    let order = ctx.service.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert!(order.is_completed());
    assert_eq!(observer.count_of(EventKind::OrderUpdated), 4);

    let last = observer.seen().last().cloned().expect("events captured");
    assert_eq!(last.1["previous_status"].as_str(), Some("SHIPPED"));
    assert_eq!(last.1["new_status"].as_str(), Some("DELIVERED"));
}

#[tokio::test]
async fn test_illegal_transition_is_rejected_without_side_effects() {
    let ctx = PipelineContext::new();
    let observer = CapturingObserver::new();
    ctx.events.attach(EventKind::OrderUpdated, observer.clone());

    let order_id = placed_order(&ctx).await;

    // PENDING -> SHIPPED skips two states
    assert!(!ctx.service.update_status(order_id, OrderStatus::Shipped).await.unwrap());

    let order = ctx.service.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(observer.count_of(EventKind::OrderUpdated), 0);
    assert!(ctx.events.history(Some(EventKind::OrderUpdated), 10).is_empty());
}

#[tokio::test]
async fn test_every_pair_outside_the_table_is_rejected() {
    // Drive each order into `from`, then attempt every target; the service
    // must agree with the table exactly.
    let reach: &[(OrderStatus, &[OrderStatus])] = &[
        (OrderStatus::Pending, &[]),
        (OrderStatus::Confirmed, &[OrderStatus::Confirmed]),
        (
            OrderStatus::InProcess,
            &[OrderStatus::Confirmed, OrderStatus::InProcess],
        ),
        (
            OrderStatus::Shipped,
            &[
                OrderStatus::Confirmed,
                OrderStatus::InProcess,
                OrderStatus::Shipped,
            ],
        ),
        (
            OrderStatus::Delivered,
            &[
                OrderStatus::Confirmed,
                OrderStatus::InProcess,
                OrderStatus::Shipped,
                OrderStatus::Delivered,
            ],
        ),
        (OrderStatus::Cancelled, &[OrderStatus::Cancelled]),
    ];

    for (from, walk) in reach {
        for target in ALL_STATUSES {
            let ctx = PipelineContext::new();
            let order_id = placed_order(&ctx).await;
            for step in *walk {
                assert!(ctx.service.update_status(order_id, *step).await.unwrap());
            }

            let expected = from.can_transition_to(target);
            let moved = ctx.service.update_status(order_id, target).await.unwrap();
            assert_eq!(moved, expected, "{from} -> {target}");

            let order = ctx.service.get_order(order_id).await.unwrap().unwrap();
            let expected_status = if expected { target } else { *from };
            assert_eq!(order.status, expected_status, "{from} -> {target}");
        }
    }
}

#[tokio::test]
async fn test_update_unknown_order_is_not_found() {
    let ctx = PipelineContext::new();
    let err = ctx
        .service
        .update_status(OrderId::new(404), OrderStatus::Confirmed)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::NotFound(_)));
}
