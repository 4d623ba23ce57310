use super::*;
use crate::{
    notifications::NotificationLevel,
    orchestrator::OrchestratorConfig,
    test_support::{complete_draft, listing, signed_in_stores, Call, ScriptedGateway},
    wizard::WizardStage,
};
use shared::domain::Session;

fn controller(gateway: &Arc<ScriptedGateway>, stores: &AppStores) -> MyListingsController {
    let orchestrator = Arc::new(SubmissionOrchestrator::new(
        gateway.clone(),
        stores,
        OrchestratorConfig::default(),
    ));
    MyListingsController::new(gateway.clone(), orchestrator, stores)
}

#[test]
fn header_offers_login_when_anonymous() {
    let stores = AppStores::new();
    let header = HeaderControl::new(&stores);

    assert_eq!(header.view(), HeaderView::Anonymous);
    assert_eq!(header.view().labels(), &["Login / Register"]);

    header.request_login();
    assert!(stores.login_gate.is_visible());
}

#[test]
fn header_offers_my_listings_and_logout_when_signed_in() {
    let stores = signed_in_stores();
    let header = HeaderControl::new(&stores);

    assert_eq!(
        header.view(),
        HeaderView::Authenticated { user_id: UserId(1) }
    );
    assert_eq!(header.view().labels(), &["My Listings", "Logout"]);

    header.logout();
    assert!(stores.session.current().is_none());
    assert_eq!(header.view(), HeaderView::Anonymous);
}

#[tokio::test]
async fn anonymous_visitor_is_asked_to_log_in() {
    let gateway = Arc::new(ScriptedGateway::default());
    let stores = AppStores::new();
    let controller = controller(&gateway, &stores);

    assert_eq!(
        controller.view().await.expect("view"),
        MyListingsView::LoginRequired
    );
    assert!(gateway.calls().await.is_empty());
}

#[tokio::test]
async fn no_listings_renders_empty_state() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway.reply_listings(Ok(Vec::new())).await;
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);

    assert_eq!(controller.view().await.expect("view"), MyListingsView::Empty);
}

#[tokio::test]
async fn one_card_per_listing_with_edit_and_delete() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .reply_listings(Ok(vec![
            listing(1, &complete_draft()),
            listing(2, &complete_draft()),
        ]))
        .await;
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);

    let MyListingsView::Listings(cards) = controller.view().await.expect("view") else {
        panic!("expected cards");
    };
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[1].listing.id, ListingId(2));
    assert_eq!(cards[0].actions(), [CardAction::Edit, CardAction::Delete]);
}

#[tokio::test]
async fn cached_listings_are_reused_until_the_user_changes() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .reply_listings(Ok(vec![listing(1, &complete_draft())]))
        .await;
    gateway.reply_listings(Ok(Vec::new())).await;
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);

    controller.view().await.expect("first");
    controller.view().await.expect("cached");
    assert_eq!(gateway.calls().await, vec![Call::ListMine]);

    stores
        .session
        .set_session(Session::new("other-token", UserId(2)));
    assert_eq!(controller.view().await.expect("refetch"), MyListingsView::Empty);
    assert_eq!(gateway.calls().await, vec![Call::ListMine, Call::ListMine]);
}

#[tokio::test]
async fn delete_refetches_the_collection() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .reply_listings(Ok(vec![listing(1, &complete_draft())]))
        .await;
    gateway.reply_listings(Ok(Vec::new())).await;
    let stores = signed_in_stores();
    let mut notifications = stores.notifications.subscribe();
    let controller = controller(&gateway, &stores);

    controller.view().await.expect("view");
    let view = controller.delete(ListingId(1)).await.expect("delete");
    assert_eq!(view, MyListingsView::Empty);
    assert_eq!(
        gateway.calls().await,
        vec![Call::ListMine, Call::Delete(ListingId(1)), Call::ListMine]
    );
    assert_eq!(
        notifications.recv().await.expect("notification"),
        Notification::ListingDeleted {
            listing_id: ListingId(1)
        }
    );
}

#[tokio::test]
async fn delete_failure_is_surfaced_to_the_user() {
    let gateway = Arc::new(ScriptedGateway::default());
    gateway
        .reply_delete(Err(GatewayError::Network("timeout".to_string())))
        .await;
    let stores = signed_in_stores();
    let mut notifications = stores.notifications.subscribe();
    let controller = controller(&gateway, &stores);

    let err = controller
        .delete(ListingId(3))
        .await
        .expect_err("delete fails");
    assert!(matches!(err, GatewayError::Network(_)));
    assert_eq!(gateway.calls().await, vec![Call::Delete(ListingId(3))]);

    let notification = notifications.recv().await.expect("notification");
    assert_eq!(notification.level(), NotificationLevel::Error);
    assert!(matches!(
        notification,
        Notification::DeleteFailed {
            listing_id: ListingId(3),
            ..
        }
    ));
}

#[tokio::test]
async fn edit_from_card_hydrates_without_refetching() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut draft = complete_draft();
    draft.price = 123_000;
    gateway.reply_listings(Ok(vec![listing(5, &draft)])).await;
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);

    controller.view().await.expect("view");
    controller.edit(ListingId(5)).await.expect("edit");

    let WizardStage::DetailForm(form) = stores.wizard.stage() else {
        panic!("expected detail form");
    };
    assert_eq!(form.listing_id, Some(ListingId(5)));
    assert_eq!(form.draft.price, 123_000);
    assert_eq!(gateway.calls().await, vec![Call::ListMine]);
}

#[tokio::test]
async fn edit_after_user_switch_fetches_instead_of_reusing_cache() {
    let gateway = Arc::new(ScriptedGateway::default());
    let mut cached_draft = complete_draft();
    cached_draft.price = 111_000;
    gateway
        .reply_listings(Ok(vec![listing(5, &cached_draft)]))
        .await;
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);
    controller.view().await.expect("view");

    stores.session.clear_session();
    stores
        .session
        .set_session(Session::new("other-token", UserId(2)));
    let mut fresh_draft = complete_draft();
    fresh_draft.price = 222_000;
    gateway.store(listing(5, &fresh_draft)).await;

    controller.edit(ListingId(5)).await.expect("edit");

    assert_eq!(
        gateway.calls().await,
        vec![Call::ListMine, Call::Fetch(ListingId(5))]
    );
    let form = stores.wizard.detail_form().expect("form");
    assert_eq!(form.draft.price, 222_000);
}

#[tokio::test]
async fn anonymous_delete_raises_login_gate_without_reaching_backend() {
    let gateway = Arc::new(ScriptedGateway::default());
    let stores = AppStores::new();
    let mut notifications = stores.notifications.subscribe();
    let controller = controller(&gateway, &stores);

    let view = controller.delete(ListingId(4)).await.expect("delete");

    assert_eq!(view, MyListingsView::LoginRequired);
    assert!(stores.login_gate.is_visible());
    assert!(gateway.calls().await.is_empty());
    assert!(notifications.try_recv().is_err());
}

#[tokio::test]
async fn empty_state_create_affordance_opens_the_wizard() {
    let gateway = Arc::new(ScriptedGateway::default());
    let stores = signed_in_stores();
    let controller = controller(&gateway, &stores);

    controller.create_listing("KA01AA0001").expect("open");
    assert_eq!(
        stores
            .wizard
            .detail_form()
            .expect("form")
            .registration_number
            .as_deref(),
        Some("KA01AA0001")
    );
}
