// Network commission distribution tests
// Full five-level chains, short chains, cycles, idempotent event ids and
// the commission table edge cases.

mod common;

use common::{seed_chain, test_state};
use miky_backend_core::{
    models::SubscriptionPlan,
    services::{CommissionTable, DistributionRequest},
};

fn request(payer: uuid::Uuid, plan: &str, event_id: Option<&str>) -> DistributionRequest {
    DistributionRequest {
        paying_account_id: payer,
        plan: plan.to_string(),
        is_new_subscription: true,
        event_id: event_id.map(str::to_string),
    }
}

#[tokio::test]
async fn plus_plan_credits_five_levels_in_order() {
    let (state, ledger) = test_state();
    let (payer, ancestors) = seed_chain(&ledger, 5).await;

    let result = state
        .commission_service
        .distribute(request(payer.id, "plus", None))
        .await
        .unwrap();

    assert_eq!(result.applied.len(), 5);
    assert_eq!(result.total_cents, 500);

    let expected = [200, 150, 80, 50, 20];
    for (idx, commission) in result.applied.iter().enumerate() {
        assert_eq!(commission.level, (idx + 1) as u8);
        assert_eq!(commission.amount_cents, expected[idx]);
        assert_eq!(commission.beneficiary_id, ancestors[idx].id);
    }

    for (idx, ancestor) in ancestors.iter().enumerate() {
        let stored = ledger.account(ancestor.id).await.unwrap();
        assert_eq!(stored.total_referral_earnings_cents, expected[idx]);
        assert_eq!(stored.pending_payout_cents, expected[idx]);
    }
}

#[tokio::test]
async fn pro_plan_with_two_ancestors_stops_at_chain_end() {
    let (state, ledger) = test_state();
    let (payer, ancestors) = seed_chain(&ledger, 2).await;

    let result = state
        .commission_service
        .distribute(request(payer.id, "pro", None))
        .await
        .unwrap();

    assert_eq!(result.applied.len(), 2);
    assert_eq!(result.total_cents, 1000);
    assert_eq!(result.applied[0].amount_cents, 600);
    assert_eq!(result.applied[1].amount_cents, 400);

    // Exactly two payout rows, nothing else written
    assert_eq!(ledger.payouts().await.len(), 2);

    let payer_after = ledger.account(payer.id).await.unwrap();
    assert_eq!(payer_after.total_referral_earnings_cents, 0);
    assert_eq!(payer_after.pending_payout_cents, 0);

    assert_eq!(
        ledger
            .account(ancestors[0].id)
            .await
            .unwrap()
            .total_referral_earnings_cents,
        600
    );
    assert_eq!(
        ledger
            .account(ancestors[1].id)
            .await
            .unwrap()
            .total_referral_earnings_cents,
        400
    );
}

#[tokio::test]
async fn chain_longer_than_five_levels_caps_at_five() {
    let (state, ledger) = test_state();
    let (payer, _ancestors) = seed_chain(&ledger, 7).await;

    let result = state
        .commission_service
        .distribute(request(payer.id, "pro", None))
        .await
        .unwrap();

    assert_eq!(result.applied.len(), 5);
    assert_eq!(result.total_cents, 1460);
    assert_eq!(ledger.payouts().await.len(), 5);
}

#[tokio::test]
async fn two_node_cycle_terminates_without_double_credit() {
    let (state, ledger) = test_state();

    // A and B refer each other; B's row exists before A points at it
    let b = ledger
        .seed_account("b@example.com", "Account B", "BBBB2222", Some("AAAA2222"))
        .await;
    let a = ledger
        .seed_account("a@example.com", "Account A", "AAAA2222", Some("BBBB2222"))
        .await;

    let result = state
        .commission_service
        .distribute(request(a.id, "plus", None))
        .await
        .unwrap();

    // B is credited once; the walk stops when it loops back to A
    assert_eq!(result.applied.len(), 1);
    assert_eq!(result.applied[0].beneficiary_id, b.id);
    assert_eq!(result.applied[0].amount_cents, 200);

    let a_after = ledger.account(a.id).await.unwrap();
    assert_eq!(a_after.total_referral_earnings_cents, 0);

    let b_after = ledger.account(b.id).await.unwrap();
    assert_eq!(b_after.total_referral_earnings_cents, 200);
    assert_eq!(ledger.payouts().await.len(), 1);
}

#[tokio::test]
async fn three_node_cycle_credits_each_account_once() {
    let (state, ledger) = test_state();

    let z = ledger
        .seed_account("z@example.com", "Account Z", "ZZZZ2222", Some("XXXX2222"))
        .await;
    let y = ledger
        .seed_account("y@example.com", "Account Y", "YYYY2222", Some("ZZZZ2222"))
        .await;
    let x = ledger
        .seed_account("x@example.com", "Account X", "XXXX2222", Some("YYYY2222"))
        .await;

    let result = state
        .commission_service
        .distribute(request(x.id, "plus", None))
        .await
        .unwrap();

    assert_eq!(result.applied.len(), 2);
    assert_eq!(result.applied[0].beneficiary_id, y.id);
    assert_eq!(result.applied[1].beneficiary_id, z.id);

    let x_after = ledger.account(x.id).await.unwrap();
    assert_eq!(x_after.total_referral_earnings_cents, 0);
}

#[tokio::test]
async fn repeated_event_id_is_a_noop() {
    let (state, ledger) = test_state();
    let (payer, ancestors) = seed_chain(&ledger, 3).await;

    let first = state
        .commission_service
        .distribute(request(payer.id, "pro", Some("evt_123")))
        .await
        .unwrap();
    assert!(!first.already_processed);
    assert_eq!(first.applied.len(), 3);

    let second = state
        .commission_service
        .distribute(request(payer.id, "pro", Some("evt_123")))
        .await
        .unwrap();
    assert!(second.already_processed);
    assert!(second.applied.is_empty());

    // Balances unchanged by the replay
    let direct = ledger.account(ancestors[0].id).await.unwrap();
    assert_eq!(direct.total_referral_earnings_cents, 600);
    assert_eq!(ledger.payouts().await.len(), 3);
}

#[tokio::test]
async fn free_plan_skips_distribution() {
    let (state, ledger) = test_state();
    let (payer, ancestors) = seed_chain(&ledger, 3).await;

    let result = state
        .commission_service
        .distribute(request(payer.id, "free", None))
        .await
        .unwrap();

    assert!(result.applied.is_empty());
    assert_eq!(result.skipped_reason.as_deref(), Some("plan_without_schedule"));
    assert!(ledger.payouts().await.is_empty());

    let direct = ledger.account(ancestors[0].id).await.unwrap();
    assert_eq!(direct.total_referral_earnings_cents, 0);
}

#[tokio::test]
async fn unknown_plan_skips_distribution_and_records_event() {
    let (state, ledger) = test_state();
    let (payer, _ancestors) = seed_chain(&ledger, 3).await;

    let result = state
        .commission_service
        .distribute(request(payer.id, "platinum", None))
        .await
        .unwrap();

    assert!(result.applied.is_empty());
    assert_eq!(result.skipped_reason.as_deref(), Some("unknown_plan"));

    let events = ledger.events().await;
    assert!(events
        .iter()
        .any(|e| e.event_type == "distribution_skipped"));
}

#[tokio::test]
async fn distribution_without_chain_succeeds_empty() {
    let (state, ledger) = test_state();
    let loner = ledger
        .seed_account("loner@example.com", "No Referrer", "LONER222", None)
        .await;

    let result = state
        .commission_service
        .distribute(request(loner.id, "plus", Some("evt_solo")))
        .await
        .unwrap();

    assert!(result.applied.is_empty());
    assert_eq!(result.total_cents, 0);
    assert!(result.skipped_reason.is_none());

    // The event id is still consumed so a replay no-ops
    let replay = state
        .commission_service
        .distribute(request(loner.id, "plus", Some("evt_solo")))
        .await
        .unwrap();
    assert!(replay.already_processed);
}

#[tokio::test]
async fn preview_reports_schedule_and_reachable_levels() {
    let (state, ledger) = test_state();
    let (payer, _ancestors) = seed_chain(&ledger, 2).await;

    let preview = state
        .commission_service
        .preview(SubscriptionPlan::Pro, Some(payer.id))
        .await
        .unwrap();

    assert_eq!(preview.levels.len(), 5);
    assert_eq!(preview.total_cents, 1460);
    assert_eq!(preview.reachable_levels, Some(2));
    assert!(preview.levels[0].beneficiary_name.is_some());
    assert!(preview.levels[2].beneficiary_name.is_none());

    // Nothing was written by the preview
    assert!(ledger.payouts().await.is_empty());
}

#[test]
fn commission_table_edges() {
    assert_eq!(
        CommissionTable::commission_for_level(SubscriptionPlan::Free, 1),
        None
    );
    assert_eq!(
        CommissionTable::commission_for_level(SubscriptionPlan::Plus, 6),
        None
    );
    assert_eq!(
        CommissionTable::commission_for_level(SubscriptionPlan::Plus, 1),
        Some(200)
    );
    assert_eq!(
        CommissionTable::commission_for_level(SubscriptionPlan::Pro, 5),
        Some(100)
    );
}
