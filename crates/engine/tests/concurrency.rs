//! Contention scenarios: concurrent claims, shared referrers and
//! parallel code generation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::disallowed_methods)]

mod common;

use std::sync::Arc;
use std::thread;

use common::ledger;
use referral_ledger_types::{AccountId, RedeemOutcome};

const REFERRER: AccountId = AccountId::new(100);

#[test]
fn concurrent_redemptions_by_one_account_claim_exactly_once() {
    let ledger = Arc::new(ledger());
    let code = ledger.ensure_own_code(REFERRER, "referrer").expect("code");
    let redeemer = AccountId::new(200);

    let threads = 8;
    let outcomes: Vec<RedeemOutcome> = {
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let code = code.clone();
                thread::spawn(move || {
                    ledger.redeem(redeemer, "redeemer", code.as_str()).expect("redeem")
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("thread join")).collect()
    };

    let successes =
        outcomes.iter().filter(|o| matches!(o, RedeemOutcome::Success { .. })).count();
    let rejected =
        outcomes.iter().filter(|o| **o == RedeemOutcome::AlreadyRedeemed).count();
    assert_eq!(successes, 1, "exactly one attempt may claim");
    assert_eq!(rejected, threads - 1);

    // The referrer was credited for one redemption, not N.
    assert_eq!(ledger.usage_count(REFERRER).expect("count"), Some(1));
    assert_eq!(ledger.balance(REFERRER).expect("balance"), 100);
    assert_eq!(ledger.balance(redeemer).expect("balance"), 100);
}

#[test]
fn concurrent_redemptions_naming_one_referrer_lose_no_increments() {
    let ledger = Arc::new(ledger());
    let code = ledger.ensure_own_code(REFERRER, "referrer").expect("code");

    let threads = 8u64;
    let handles: Vec<_> = (0..threads)
        .map(|n| {
            let ledger = Arc::clone(&ledger);
            let code = code.clone();
            thread::spawn(move || {
                let id = AccountId::new(300 + n);
                ledger.redeem(id, &format!("redeemer{n}"), code.as_str()).expect("redeem")
            })
        })
        .collect();

    for handle in handles {
        let outcome = handle.join().expect("thread join");
        assert!(matches!(outcome, RedeemOutcome::Success { .. }));
    }

    assert_eq!(ledger.usage_count(REFERRER).expect("count"), Some(threads));
    // Thresholds at 5 fired exactly once among the 8 redemptions.
    assert_eq!(ledger.balance(REFERRER).expect("balance"), 100 * threads as i64 + 1000);
}

#[test]
fn parallel_code_generation_yields_one_stable_code() {
    let ledger = Arc::new(ledger());
    let id = AccountId::new(500);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || ledger.ensure_own_code(id, "generator").expect("code"))
        })
        .collect();

    let codes: Vec<_> = handles.into_iter().map(|h| h.join().expect("thread join")).collect();
    let first = &codes[0];
    assert!(codes.iter().all(|c| c == first), "every caller must observe the same code");
    assert_eq!(ledger.own_code(id).expect("stored"), Some(first.clone()));
}

#[test]
fn independent_accounts_proceed_concurrently() {
    let ledger = Arc::new(ledger());

    // One referrer per redeemer; no shared rows beyond the table itself.
    let codes: Vec<_> = (0..4u64)
        .map(|n| {
            ledger
                .ensure_own_code(AccountId::new(1000 + n), &format!("referrer{n}"))
                .expect("code")
        })
        .collect();

    let handles: Vec<_> = codes
        .into_iter()
        .enumerate()
        .map(|(n, code)| {
            let ledger = Arc::clone(&ledger);
            thread::spawn(move || {
                let id = AccountId::new(2000 + n as u64);
                ledger.redeem(id, &format!("redeemer{n}"), code.as_str()).expect("redeem")
            })
        })
        .collect();

    for handle in handles {
        assert!(matches!(
            handle.join().expect("thread join"),
            RedeemOutcome::Success { .. }
        ));
    }

    for n in 0..4u64 {
        assert_eq!(ledger.usage_count(AccountId::new(1000 + n)).expect("count"), Some(1));
    }
}
