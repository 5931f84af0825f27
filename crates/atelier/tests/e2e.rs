// SPDX-FileCopyrightText: 2026 Atelier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: inbound events flow through the dispatcher, the intake
//! service, storage and the notification worker, as under `atelier serve`.
//!
//! Each test creates an isolated TestHarness with temp SQLite and a mock
//! gateway. Tests are independent and order-insensitive.

use std::time::Duration;

use atelier_core::OrderRepository;
use atelier_core::types::{OrderStatus, Step};
use atelier_intake::prompts::buttons;
use atelier_test_utils::{MockGateway, TestHarness, callback, command, contact};

const ADMIN: i64 = 77;

async fn script(gateway: &MockGateway, user: i64, lines: &[&str]) {
    for line in lines {
        gateway.inject_text(user, line).await;
    }
}

// ---- Full order through the dispatcher ----

#[tokio::test]
async fn order_is_placed_and_admin_notified() {
    let mut h = TestHarness::builder()
        .with_admin(ADMIN)
        .build()
        .await
        .unwrap();
    let user = 501;

    h.gateway.inject_event(command(user, "start", &[])).await;
    script(
        &h.gateway,
        user,
        &[
            buttons::CONTINUE,
            buttons::PLACE_ORDER,
            "Искусственная кожа",
            "80 20",
            buttons::TOMORROW,
            buttons::CONFIRM_DATE,
            buttons::ENTER_MANUALLY,
            "+7 916 123-45-67",
        ],
    )
    .await;
    h.gateway.close();
    h.dispatcher().run(h.cancel_token()).await.unwrap();

    let orders = h.orders().await;
    assert_eq!(orders.len(), 1);
    let order = &orders[0];
    assert_eq!(order.status, OrderStatus::New);
    assert_eq!((order.width_cm, order.height_cm), (80, 20));
    assert_eq!(order.texture_name, "Искусственная кожа");
    // 16 dm² * (15.50 + 31.25) * 2.5
    assert!((order.breakdown.final_price - 1870.0).abs() < 1e-9);
    assert!(order.delivery_date.is_some());
    assert!(h.state(user).await.is_empty());

    assert!(h.gateway.wait_for_documents(1, Duration::from_secs(5)).await);
    h.shutdown().await;
    let docs = h.gateway.documents().await;
    assert_eq!(docs[0].caption, format!("📊 Детали заказа #{}", order.id));
    let csv = std::fs::read_to_string(&docs[0].path).unwrap();
    assert!(csv.contains("Искусственная кожа"));
}

#[tokio::test]
async fn concurrent_users_each_get_their_own_order() {
    let h = TestHarness::builder().build().await.unwrap();
    let users = [601, 602, 603, 604];

    // Interleave the users' events to exercise per-user ordering.
    let steps = [
        buttons::CONTINUE,
        buttons::PLACE_ORDER,
        "Замша",
        "10 10",
        buttons::TODAY,
        buttons::CONFIRM_DATE,
    ];
    for user in users {
        h.gateway.inject_event(command(user, "start", &[])).await;
    }
    for step in steps {
        for user in users {
            h.gateway.inject_text(user, step).await;
        }
    }
    for user in users {
        h.gateway
            .inject_event(contact(user, &format!("+7916000{user:04}")))
            .await;
    }
    h.gateway.close();
    h.dispatcher().run(h.cancel_token()).await.unwrap();

    let orders = h.orders().await;
    assert_eq!(orders.len(), users.len());
    for user in users {
        assert_eq!(
            orders.iter().filter(|o| o.user_id.0 == user).count(),
            1,
            "user {user}"
        );
        assert!(h.state(user).await.is_empty());
    }
}

#[tokio::test]
async fn admin_moves_order_through_statuses() {
    let h = TestHarness::builder()
        .with_admin(ADMIN)
        .build()
        .await
        .unwrap();
    let user = 700;

    h.gateway.inject_event(command(user, "start", &[])).await;
    script(
        &h.gateway,
        user,
        &[
            buttons::CONTINUE,
            buttons::PLACE_ORDER,
            "Натуральная кожа",
            "20 20",
            buttons::TODAY,
            buttons::CONFIRM_DATE,
        ],
    )
    .await;
    h.gateway.inject_event(contact(user, "89161234567")).await;
    h.gateway.close();
    h.dispatcher().run(h.cancel_token()).await.unwrap();
    let id = h.orders().await[0].id;

    // Admin actions arrive after the order exists.
    h.send(callback(ADMIN, &format!("status:{id}:processing"), None))
        .await;
    h.send(command(ADMIN, "status", &[&id.to_string(), "completed"]))
        .await;
    h.send(command(ADMIN, "status", &[&id.to_string(), "shipped"]))
        .await;

    let order = h.storage.get_order_by_id(id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Completed);
    assert!(
        h.gateway
            .sent_to(ADMIN)
            .await
            .iter()
            .any(|m| m.text.starts_with("Недопустимый статус"))
    );
}

#[tokio::test]
async fn cancel_mid_flow_then_restart() {
    let h = TestHarness::builder().build().await.unwrap();
    let user = 800;

    h.gateway.inject_event(command(user, "start", &[])).await;
    script(
        &h.gateway,
        user,
        &[
            buttons::CONTINUE,
            buttons::PLACE_ORDER,
            "Замша",
            "10 10",
            buttons::TODAY,
            buttons::CONFIRM_DATE,
            buttons::CANCEL,
        ],
    )
    .await;
    h.gateway.inject_event(command(user, "new_order", &[])).await;
    h.gateway.close();
    h.dispatcher().run(h.cancel_token()).await.unwrap();

    assert!(h.orders().await.is_empty());
    let state = h.state(user).await;
    assert_eq!(state.step, Some(Step::ServiceType));
    assert!(state.width_cm.is_none());
}

#[tokio::test]
async fn expired_session_restarts_cleanly() {
    let h = TestHarness::builder()
        .with_memory_sessions()
        .with_session_ttl(Duration::from_millis(300))
        .build()
        .await
        .unwrap();
    let user = 900;

    h.send(command(user, "start", &[])).await;
    h.send_text(user, buttons::CONTINUE).await;
    assert_eq!(h.state(user).await.step, Some(Step::ServiceSelection));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(h.state(user).await.is_empty());

    h.send_text(user, buttons::PLACE_ORDER).await;
    assert!(h.state(user).await.is_empty());
    assert_eq!(
        h.last_reply(user).await,
        atelier_intake::prompts::UNKNOWN
    );
}

#[tokio::test]
async fn cancellation_stops_dispatcher_with_open_gateway() {
    let h = TestHarness::builder().build().await.unwrap();
    let cancel = h.cancel_token();
    let dispatcher = tokio::spawn(h.dispatcher().run(cancel.clone()));

    h.gateway.inject_event(command(1, "start", &[])).await;
    assert!(
        h.gateway
            .wait_for_messages_to(1, 1, Duration::from_secs(5))
            .await
    );
    cancel.cancel();

    tokio::time::timeout(Duration::from_secs(5), dispatcher)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
