//! End-to-end reconciliation behaviour over in-memory seams

mod common;

use common::{catalog, gift, ids, rule, Harness};
use giftpool_daemon::ClaimOutcome;
use giftpool_ledger::LedgerError;
use giftpool_types::{GiftId, PersonId};

#[tokio::test]
async fn test_last_unit_withdraws_competing_offer() {
    let pool = Harness::new(catalog(vec![gift("razor", 1, 1)], vec![])).await;
    let alice = pool.enrol("alice", "Alice").await;
    let bob = pool.enrol("bob", "Bob").await;
    let razor = GiftId::new("razor");

    let report = pool.tick().await;
    assert_eq!(report.created, 2);
    assert!(pool.handle("alice", "razor").await.unwrap().is_active());
    assert!(pool.handle("bob", "razor").await.unwrap().is_active());

    let outcome = pool.claims.claim(&alice, &razor).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Claimed { count: 1 });
    let fulfilled = pool.handle("alice", "razor").await.unwrap();
    assert!(fulfilled.is_fulfilled());

    let report = pool.tick().await;
    assert_eq!(report.deleted, 1);
    assert!(pool.handle("bob", "razor").await.is_none());
    assert!(pool.channel.messages_for(&bob).await.is_empty());

    // Alice keeps her claimed message exactly as it was.
    assert_eq!(pool.handle("alice", "razor").await.unwrap(), fulfilled);
    assert_eq!(pool.channel.messages_for(&alice).await.len(), 1);

    let err = pool.ctx.ledger.record(&bob, &razor).await.unwrap_err();
    assert!(matches!(err, LedgerError::CapacityExceeded { .. }));
    assert_eq!(
        pool.claims.claim(&bob, &razor).await.unwrap(),
        ClaimOutcome::Unavailable
    );
}

#[tokio::test]
async fn test_settled_state_is_quiet() {
    let pool = Harness::new(catalog(vec![gift("razor", 1, 1), gift("mug", 3, 1)], vec![])).await;
    pool.enrol("alice", "Alice").await;

    assert_eq!(pool.tick().await.created, 2);
    let report = pool.tick().await;
    assert!(report.is_quiet());
    assert_eq!(report.persons, 1);
    assert_eq!(pool.channel.len().await, 2);
}

#[tokio::test]
async fn test_failed_deletes_heal_on_later_pass() {
    let pool = Harness::new(catalog(vec![gift("razor", 1, 1)], vec![])).await;
    let alice = pool.enrol("alice", "Alice").await;
    pool.enrol("bob", "Bob").await;
    pool.tick().await;

    pool.claims.claim(&alice, &GiftId::new("razor")).await.unwrap();

    pool.channel.fail_deletes(true);
    for _ in 0..3 {
        let report = pool.tick().await;
        assert_eq!(report.failed, 1);
        assert!(pool.handle("bob", "razor").await.unwrap().is_active());
    }

    pool.channel.fail_deletes(false);
    let report = pool.tick().await;
    assert_eq!(report.deleted, 1);
    assert!(pool.handle("bob", "razor").await.is_none());
    assert!(pool.shown("bob").await.is_empty());
}

#[tokio::test]
async fn test_failed_creates_heal_on_later_pass() {
    let pool = Harness::new(catalog(vec![gift("mug", 2, 1)], vec![])).await;
    pool.enrol("alice", "Alice").await;

    pool.channel.fail_creates(true);
    let report = pool.tick().await;
    assert_eq!(report.failed, 1);
    assert!(pool.handle("alice", "mug").await.is_none());

    pool.channel.fail_creates(false);
    assert_eq!(pool.tick().await.created, 1);
    assert_eq!(pool.shown("alice").await, ids(&["mug"]));
}

#[tokio::test]
async fn test_message_gone_from_channel_is_still_retracted() {
    let pool = Harness::new(catalog(vec![gift("razor", 1, 1)], vec![])).await;
    let alice = pool.enrol("alice", "Alice").await;
    pool.enrol("bob", "Bob").await;
    pool.tick().await;

    let bob_offer = pool.handle("bob", "razor").await.unwrap();
    assert!(pool.channel.forget(&bob_offer.channel_ref).await);

    pool.claims.claim(&alice, &GiftId::new("razor")).await.unwrap();

    let report = pool.tick().await;
    assert_eq!(report.failed, 0);
    assert!(pool.handle("bob", "razor").await.is_none());
}

#[tokio::test]
async fn test_offers_only_shrink_as_claims_land() {
    let gifts = vec![gift("razor", 2, 1), gift("mug", 1, 1), gift("scarf", 5, 2)];
    let pool = Harness::new(catalog(gifts, vec![])).await;
    let names = ["alice", "bob", "carol"];
    for name in names {
        pool.enrol(name, name).await;
    }
    pool.tick().await;

    let claims = [("alice", "razor"), ("bob", "razor"), ("carol", "mug"), ("carol", "scarf")];
    let mut previous: Vec<_> = Vec::new();
    for name in names {
        previous.push(pool.shown(name).await);
    }

    for (person, gift) in claims {
        pool.claims
            .claim(&PersonId::new(person), &GiftId::new(gift))
            .await
            .unwrap();
        pool.tick().await;

        for (index, name) in names.iter().enumerate() {
            let shown = pool.shown(name).await;
            assert!(
                shown.is_subset(&previous[index]),
                "{name} gained an offer after claiming {gift}"
            );
            previous[index] = shown;
        }
    }

    // razor and mug are exhausted; carol may still take a second scarf.
    assert!(pool.shown("alice").await.is_subset(&ids(&["scarf"])));
    assert!(pool.shown("bob").await.is_subset(&ids(&["scarf"])));
    assert!(pool.handle("carol", "scarf").await.unwrap().is_fulfilled());
}

#[tokio::test]
async fn test_rule_change_withdraws_offer() {
    let gifts = vec![gift("razor", 3, 1), gift("lipstick", 3, 1)];
    let pool = Harness::new(catalog(gifts.clone(), vec![])).await;
    pool.enrol("ivan", "Ivan Petrov").await;
    pool.tick().await;
    assert_eq!(pool.shown("ivan").await, ids(&["lipstick", "razor"]));

    pool.store
        .set_catalog(catalog(gifts, vec![rule("Ivan", &["razor"])]))
        .await;
    pool.ctx.reload_catalog().await.unwrap();

    let report = pool.tick().await;
    assert_eq!(report.deleted, 1);
    assert_eq!(pool.shown("ivan").await, ids(&["razor"]));
    assert!(pool.handle("ivan", "lipstick").await.is_none());
}

#[tokio::test]
async fn test_first_matching_rule_decides() {
    let gifts = vec![gift("razor", 3, 1), gift("lipstick", 3, 1), gift("book", 3, 1)];
    let rules = vec![rule("Ivan", &["razor"]), rule("Ivan Petrov", &["book"])];
    let pool = Harness::new(catalog(gifts, rules)).await;
    pool.enrol("ivan", "Ivan Petrov").await;
    pool.enrol("anna", "Anna").await;
    pool.tick().await;

    assert_eq!(pool.shown("ivan").await, ids(&["razor"]));
    assert_eq!(pool.shown("anna").await, ids(&["book", "lipstick", "razor"]));
}

#[tokio::test]
async fn test_onboarding_is_idempotent() {
    let pool = Harness::new(catalog(vec![gift("mug", 2, 1)], vec![])).await;

    let first = pool
        .reconciler
        .onboard(PersonId::new("alice"), "Alice")
        .await
        .unwrap();
    assert_eq!(first.created, 1);

    let second = pool
        .reconciler
        .onboard(PersonId::new("alice"), "Alice")
        .await
        .unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(pool.channel.len().await, 1);
}

#[tokio::test]
async fn test_persons_not_onboarded_receive_nothing() {
    let pool = Harness::new(catalog(vec![gift("mug", 2, 1)], vec![])).await;
    pool.ctx
        .ledger
        .register(PersonId::new("dave"), "Dave")
        .await
        .unwrap();

    let report = pool.tick().await;
    assert_eq!(report.persons, 0);
    assert!(pool.channel.is_empty().await);
}

#[tokio::test]
async fn test_concurrent_claims_respect_global_capacity() {
    let pool = Harness::new(catalog(vec![gift("razor", 1, 1)], vec![])).await;
    let names = ["alice", "bob", "carol", "dave"];
    for name in names {
        pool.enrol(name, name).await;
    }
    pool.tick().await;

    let claims = std::sync::Arc::new(pool.claims);
    let tasks: Vec<_> = names
        .iter()
        .map(|name| {
            let claims = std::sync::Arc::clone(&claims);
            let person = PersonId::new(*name);
            tokio::spawn(async move { claims.claim(&person, &GiftId::new("razor")).await })
        })
        .collect();

    let mut claimed = 0;
    for task in tasks {
        if let ClaimOutcome::Claimed { .. } = task.await.unwrap().unwrap() {
            claimed += 1;
        }
    }
    assert_eq!(claimed, 1);
    assert_eq!(pool.ctx.ledger.global_count(&GiftId::new("razor")).await, 1);
}

#[tokio::test]
async fn test_claim_before_onboarding_never_yields_active_handle() {
    let pool = Harness::new(catalog(vec![gift("mug", 5, 2), gift("vase", 5, 1)], vec![])).await;
    let alice = PersonId::new("alice");
    let mug = GiftId::new("mug");

    pool.ctx.ledger.register(alice.clone(), "Alice").await.unwrap();
    let outcome = pool.claims.claim(&alice, &mug).await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Claimed { count: 1 });

    let report = pool.reconciler.onboard(alice.clone(), "Alice").await.unwrap();
    assert_eq!(report.created, 1);

    for _ in 0..2 {
        let report = pool.tick().await;
        assert_eq!(report.created, 0);
        assert_eq!(report.repaired, 0);

        for (gift, handle) in pool.ctx.registry.entries_for(&alice).await {
            let claimed = pool.ctx.ledger.view_for(&alice).await.claimed(&gift);
            assert!(
                claimed == 0 || handle.is_fulfilled(),
                "{gift} has an active handle after a claim"
            );
        }
    }

    assert!(pool.handle("alice", "mug").await.is_none());
    assert_eq!(pool.shown("alice").await, ids(&["vase"]));
}
