//! End-to-end sales → checkout scenarios.
//!
//! Drives the orchestrator with a `ScriptedReasoner` and an in-memory store,
//! one scripted decision per user turn.

use std::sync::Arc;

use order_relay_core::{
    ActionCall, ActionKind, ConversationId, ConversationState, ConversationStore, Decision, MemoryConversationStore,
    Orchestrator, OrderRecord, Role, ScriptedReasoner, Speaker,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn orchestrator(decisions: Vec<Decision>) -> (Orchestrator, Arc<MemoryConversationStore>) {
    let store = Arc::new(MemoryConversationStore::new());
    let orchestrator = Orchestrator::new(Arc::new(ScriptedReasoner::new(decisions)), store.clone());
    (orchestrator, store)
}

fn act(calls: Vec<ActionCall>) -> Decision {
    Decision::actions(calls)
}

#[tokio::test]
async fn test_scenario_a_add_latte() {
    let (orch, _) = orchestrator(vec![act(vec![ActionCall::add_item("Latte", 2, dec!(4.50))])]);
    let id = ConversationId::from("scenario-a");

    let outcome = orch.handle_turn(&id, "two lattes please").await.unwrap();

    assert_eq!(outcome.order.items.len(), 1);
    let item = &outcome.order.items[0];
    assert_eq!(item.name, "Latte");
    assert_eq!(item.quantity, 2);
    assert_eq!(item.unit_price, dec!(4.50));
    assert_eq!(item.line_total, dec!(9.00));
    assert_eq!(outcome.order.total, dec!(9.00));
}

#[tokio::test]
async fn test_scenario_b_remove_latte() {
    let (orch, _) = orchestrator(vec![
        act(vec![ActionCall::add_item("Latte", 2, dec!(4.50))]),
        act(vec![ActionCall::remove_item("Latte")]),
    ]);
    let id = ConversationId::from("scenario-b");

    orch.handle_turn(&id, "two lattes please").await.unwrap();
    let outcome = orch.handle_turn(&id, "actually, no lattes").await.unwrap();

    assert!(outcome.order.items.is_empty());
    assert_eq!(outcome.order.total, dec!(0.00));
}

#[tokio::test]
async fn test_scenario_c_and_d_finalize_needs_customer_name() {
    let (orch, _) = orchestrator(vec![
        act(vec![ActionCall::add_item("Muffin", 1, dec!(3.00))]),
        act(vec![ActionCall::TransferToCheckout]),
        act(vec![ActionCall::FinalizeOrder]),
        act(vec![
            ActionCall::update_customer_info(Some("Ada"), None),
            ActionCall::FinalizeOrder,
        ]),
    ]);
    let id = ConversationId::from("scenario-cd");

    orch.handle_turn(&id, "one muffin").await.unwrap();
    let handoff = orch.handle_turn(&id, "that's all").await.unwrap();
    assert_eq!(handoff.handled_by, Role::Sales);
    assert_eq!(handoff.active_role, Role::Checkout);

    // Scenario C: rejected, order unchanged.
    let rejected = orch.handle_turn(&id, "place it").await.unwrap();
    assert_eq!(rejected.handled_by, Role::Checkout);
    assert!(rejected.confirmations.is_empty());
    assert_eq!(rejected.order.items.len(), 1);
    assert_eq!(rejected.order.items[0].name, "Muffin");
    assert_eq!(rejected.order.total, dec!(3.00));
    assert_eq!(rejected.messages.len(), 1);
    assert_eq!(
        rejected.messages[0].speaker,
        Speaker::Action(ActionKind::FinalizeOrder)
    );
    assert!(rejected.messages[0]
        .content
        .contains("customer name is required"));

    // Scenario D: name recorded, order placed and reset.
    let placed = orch.handle_turn(&id, "I'm Ada").await.unwrap();
    assert_eq!(placed.confirmations.len(), 1);
    let confirmation = &placed.confirmations[0];
    assert_eq!(confirmation.total, dec!(3.00));
    assert_eq!(confirmation.customer_name, "Ada");
    let summary = &placed.messages.last().unwrap().content;
    assert!(summary.contains("$3.00"));
    assert!(summary.contains("Ada"));

    assert_eq!(placed.order, OrderRecord::default());
    // Finalize does not move the role pointer.
    assert_eq!(placed.active_role, Role::Checkout);
}

#[tokio::test]
async fn test_scenario_e_fresh_conversation_starts_in_sales() {
    let state = ConversationState::new(ConversationId::from("scenario-e"));
    assert_eq!(state.active_role, Role::Sales);

    let (orch, _) = orchestrator(vec![Decision::reply("Hi! What can I get you?")]);
    let outcome = orch
        .handle_turn(&ConversationId::from("scenario-e"), "hello")
        .await
        .unwrap();
    assert_eq!(outcome.handled_by, Role::Sales);
}

#[tokio::test]
async fn test_finalize_round_trip_clears_customer_fields() {
    let (orch, store) = orchestrator(vec![
        act(vec![
            ActionCall::add_item("Bagel", 2, dec!(2.25)),
            ActionCall::update_customer_info(Some("Grace"), Some("grace@example.com")),
            ActionCall::TransferToCheckout,
        ]),
        act(vec![ActionCall::FinalizeOrder]),
    ]);
    let id = ConversationId::from("round-trip");

    orch.handle_turn(&id, "two bagels for Grace").await.unwrap();
    let outcome = orch.handle_turn(&id, "confirm").await.unwrap();
    assert_eq!(outcome.confirmations[0].total, dec!(4.50));
    assert_eq!(
        outcome.confirmations[0].customer_email.as_deref(),
        Some("grace@example.com")
    );

    let stored = stored(&store, &id).await;
    assert!(stored.order.items.is_empty());
    assert_eq!(stored.order.total, Decimal::ZERO);
    assert_eq!(stored.order.customer_name(), "");
    assert_eq!(stored.order.customer_email(), "");
}

#[tokio::test]
async fn test_handoff_symmetry_leaves_order_untouched() {
    let (orch, _) = orchestrator(vec![
        act(vec![ActionCall::add_item("Tea", 1, dec!(2.00))]),
        act(vec![ActionCall::TransferToCheckout]),
        act(vec![ActionCall::TransferToSales]),
    ]);
    let id = ConversationId::from("symmetry");

    let start = orch.handle_turn(&id, "a tea").await.unwrap();
    let there = orch.handle_turn(&id, "checkout").await.unwrap();
    let back = orch.handle_turn(&id, "wait, go back").await.unwrap();

    assert_eq!(start.active_role, Role::Sales);
    assert_eq!(there.active_role, Role::Checkout);
    assert_eq!(back.active_role, Role::Sales);
    assert_eq!(start.order, there.order);
    assert_eq!(there.order, back.order);
}

#[tokio::test]
async fn test_removing_unknown_item_leaves_order_bit_for_bit() {
    let (orch, _) = orchestrator(vec![
        act(vec![ActionCall::add_item("Scone", 3, dec!(2.10))]),
        act(vec![ActionCall::remove_item("Croissant")]),
    ]);
    let id = ConversationId::from("idempotent-remove");

    let before = orch.handle_turn(&id, "three scones").await.unwrap();
    let after = orch.handle_turn(&id, "no croissant").await.unwrap();

    assert_eq!(
        serde_json::to_vec(&before.order).unwrap(),
        serde_json::to_vec(&after.order).unwrap()
    );
    assert_eq!(after.messages.len(), 1);
}

#[tokio::test]
async fn test_add_then_handoff_in_one_turn_applies_both_in_order() {
    let (orch, _) = orchestrator(vec![
        act(vec![
            ActionCall::add_item("Latte", 1, dec!(4.50)),
            ActionCall::TransferToCheckout,
        ])
        .with_reply("Added, sending you to checkout"),
    ]);
    let id = ConversationId::from("mixed-turn");

    let outcome = orch.handle_turn(&id, "one latte and I'm done").await.unwrap();
    assert_eq!(outcome.order.total, dec!(4.50));
    assert_eq!(outcome.active_role, Role::Checkout);

    let speakers: Vec<Speaker> = outcome.messages.iter().map(|m| m.speaker).collect();
    assert_eq!(
        speakers,
        vec![
            Speaker::Agent(Role::Sales),
            Speaker::Action(ActionKind::AddItem),
            Speaker::Action(ActionKind::TransferToCheckout),
        ]
    );
}

#[tokio::test]
async fn test_conversations_are_isolated_by_id() {
    let (orch, _) = orchestrator(vec![
        act(vec![ActionCall::add_item("Latte", 1, dec!(4.50))]),
        act(vec![ActionCall::TransferToCheckout]),
        act(vec![ActionCall::add_item("Mocha", 1, dec!(5.00))]),
    ]);
    let alice = ConversationId::from("alice");
    let bob = ConversationId::from("bob");

    orch.handle_turn(&alice, "a latte").await.unwrap();
    orch.handle_turn(&alice, "checkout").await.unwrap();
    let bob_outcome = orch.handle_turn(&bob, "a mocha").await.unwrap();

    assert_eq!(bob_outcome.handled_by, Role::Sales);
    assert_eq!(bob_outcome.order.items.len(), 1);
    assert_eq!(bob_outcome.order.items[0].name, "Mocha");

    let alice_state = orch.conversation(&alice).await.unwrap().unwrap();
    assert_eq!(alice_state.active_role, Role::Checkout);
    assert_eq!(alice_state.order.items[0].name, "Latte");
}

async fn stored(store: &MemoryConversationStore, id: &ConversationId) -> ConversationState {
    store.load(id).await.unwrap().unwrap()
}
