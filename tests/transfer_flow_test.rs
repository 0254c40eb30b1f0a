mod common;

use assert_matches::assert_matches;
use uuid::Uuid;

use stockroom_api::errors::ServiceError;
use stockroom_api::models::{TransferItem, TransferStatus};

use common::test_services;

fn item(product_id: Uuid, quantity: i64) -> TransferItem {
    TransferItem {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn confirm_moves_stock_between_locations() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    assert_eq!(transfer.status, TransferStatus::Pending);
    // Creation is a proposal; no stock moves yet.
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 10);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 0);

    let concluded = services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");
    assert_eq!(concluded.status, TransferStatus::Concluded);
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 6);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 4);
}

#[tokio::test]
async fn cancel_concluded_transfer_restores_both_sides() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");

    let result = services
        .transfers
        .cancel_transfer(transfer.id)
        .await
        .expect("cancel");
    assert!(!result.already_cancelled);
    assert_eq!(result.transfer.status, TransferStatus::Cancelled);
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 10);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 0);
}

#[tokio::test]
async fn cancel_pending_transfer_touches_no_stock() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    let result = services
        .transfers
        .cancel_transfer(transfer.id)
        .await
        .expect("cancel");

    assert!(!result.already_cancelled);
    assert_eq!(result.transfer.status, TransferStatus::Cancelled);
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 10);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 0);
}

#[tokio::test]
async fn double_cancel_reverses_exactly_once() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");

    let first = services
        .transfers
        .cancel_transfer(transfer.id)
        .await
        .expect("first cancel");
    assert!(!first.already_cancelled);

    let second = services
        .transfers
        .cancel_transfer(transfer.id)
        .await
        .expect("second cancel");
    assert!(second.already_cancelled);
    assert_eq!(second.transfer.status, TransferStatus::Cancelled);

    // Reversal applied once, not twice.
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 10);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 0);
}

#[tokio::test]
async fn confirm_is_legal_only_from_pending() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");

    let err = services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::InvalidTransfer(_));
    // Movement was not applied a second time.
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 6);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 4);
}

#[tokio::test]
async fn confirm_with_insufficient_stock_leaves_order_pending() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");

    // Stock drains between creation and confirmation.
    store.adjust_stock(product, origin, -7).await.expect("drain");

    let err = services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        ServiceError::InsufficientStock {
            available: 3,
            required: 4,
            ..
        }
    );

    let unchanged = services
        .transfers
        .get_transfer(transfer.id)
        .await
        .expect("get");
    assert_eq!(unchanged.status, TransferStatus::Pending);
    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 3);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 0);
}

#[tokio::test]
async fn create_rejects_malformed_transfers() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let same_endpoints = services
        .transfers
        .create_transfer(origin, origin, vec![item(product, 1)])
        .await
        .unwrap_err();
    assert_matches!(same_endpoints, ServiceError::InvalidTransfer(_));

    let empty = services
        .transfers
        .create_transfer(origin, destination, vec![])
        .await
        .unwrap_err();
    assert_matches!(empty, ServiceError::InvalidTransfer(_));

    let non_positive = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 0)])
        .await
        .unwrap_err();
    assert_matches!(non_positive, ServiceError::InvalidTransfer(_));

    let over_stock = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 11)])
        .await
        .unwrap_err();
    assert_matches!(over_stock, ServiceError::InsufficientStock { .. });
}

#[tokio::test]
async fn get_unknown_transfer_is_not_found() {
    let (services, _store) = test_services();
    let err = services
        .transfers
        .get_transfer(Uuid::new_v4())
        .await
        .unwrap_err();
    assert_matches!(err, ServiceError::RecordNotFound(_));
}

#[tokio::test]
async fn reversal_stops_partway_when_destination_is_depleted() {
    let (services, store) = test_services();
    let product = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(product, origin, 10).await.expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(product, 4)])
        .await
        .expect("create");
    services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");

    // The destination sells 3 of the 4 transferred units; the reversal's
    // destination-side debit can no longer clear.
    store
        .adjust_stock(product, destination, -3)
        .await
        .expect("resale");

    let err = services
        .transfers
        .cancel_transfer(transfer.id)
        .await
        .unwrap_err();
    match err {
        ServiceError::PartialApplication(report) => {
            assert_eq!(report.operation, "transfer_cancel");
            assert_eq!(report.order_id, transfer.id);
            assert_eq!(report.failed_product_id, product);
            // The origin-side credit had already applied and stays applied.
            assert_eq!(report.applied.len(), 1);
            assert_eq!(report.applied[0].location_id, origin);
            assert_eq!(report.applied[0].delta, 4);
        }
        other => panic!("expected PartialApplication, got {other:?}"),
    }

    assert_eq!(store.get_stock_level(product, origin).await.unwrap(), 10);
    assert_eq!(store.get_stock_level(product, destination).await.unwrap(), 1);

    // The order never reached cancelled.
    let stuck = services
        .transfers
        .get_transfer(transfer.id)
        .await
        .expect("get");
    assert_eq!(stuck.status, TransferStatus::Concluded);
}

#[tokio::test]
async fn multi_item_transfer_conserves_per_product_totals() {
    let (services, store) = test_services();
    let shirts = Uuid::new_v4();
    let shoes = Uuid::new_v4();
    let origin = Uuid::new_v4();
    let destination = Uuid::new_v4();
    store.adjust_stock(shirts, origin, 8).await.expect("seed");
    store.adjust_stock(shoes, origin, 5).await.expect("seed");
    store
        .adjust_stock(shoes, destination, 2)
        .await
        .expect("seed");

    let transfer = services
        .transfers
        .create_transfer(origin, destination, vec![item(shirts, 3), item(shoes, 5)])
        .await
        .expect("create");
    services
        .transfers
        .confirm_transfer(transfer.id)
        .await
        .expect("confirm");

    let shirts_total = store.get_stock_level(shirts, origin).await.unwrap()
        + store.get_stock_level(shirts, destination).await.unwrap();
    let shoes_total = store.get_stock_level(shoes, origin).await.unwrap()
        + store.get_stock_level(shoes, destination).await.unwrap();
    assert_eq!(shirts_total, 8);
    assert_eq!(shoes_total, 7);

    assert_eq!(store.get_stock_level(shirts, origin).await.unwrap(), 5);
    assert_eq!(store.get_stock_level(shirts, destination).await.unwrap(), 3);
    assert_eq!(store.get_stock_level(shoes, origin).await.unwrap(), 0);
    assert_eq!(store.get_stock_level(shoes, destination).await.unwrap(), 7);
}
