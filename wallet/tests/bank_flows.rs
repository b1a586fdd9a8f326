mod common;

use common::*;
use primitive_types::U256;
use std::time::Duration;
use tokenbank_wallet::{
    error::BankError,
    pipeline::{PipelineError, StepStatus},
    signer::NodeAccountSigner,
};

#[tokio::test(start_paused = true)]
async fn test_deposit_approves_then_deposits() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;
    ledger.state.lock().await.inclusion_polls = 2;

    let bank = token_bank();
    let run = bank
        .deposit(&ledger, &NodeAccountSigner::new(ALICE), tokens(40))
        .await
        .unwrap();

    assert_eq!(run.len(), 2);
    assert!(run.is_complete());
    assert_eq!(run.step(0).unwrap().method.name, "approve");
    assert_eq!(run.step(1).unwrap().method.name, "deposit");

    // The deposit is observable through the regular read methods
    assert_eq!(bank.bank_balance(&ledger, &ALICE).await.unwrap(), tokens(40));
    assert_eq!(bank.wallet_balance(&ledger, &ALICE).await.unwrap(), tokens(60));
    assert_eq!(bank.allowance(&ledger, &ALICE).await.unwrap(), U256::zero());
}

#[tokio::test(start_paused = true)]
async fn test_deposit_skips_approve_when_allowance_suffices() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;
    ledger.set_allowance(ALICE, BANK, tokens(50)).await;

    let bank = token_bank();
    let run = bank
        .deposit(&ledger, &NodeAccountSigner::new(ALICE), tokens(50))
        .await
        .unwrap();

    assert_eq!(run.len(), 1);
    assert!(run.is_complete());
    assert_eq!(ledger.sent().await.len(), 1);
    assert_eq!(ledger.sent().await[0].to, BANK);
    assert_eq!(bank.bank_balance(&ledger, &ALICE).await.unwrap(), tokens(50));
}

#[tokio::test(start_paused = true)]
async fn test_failed_approve_never_submits_deposit() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;
    ledger.state.lock().await.revert_approvals = true;

    let bank = token_bank();
    let run = bank
        .deposit(&ledger, &NodeAccountSigner::new(ALICE), tokens(10))
        .await
        .unwrap();

    assert!(matches!(
        run.failure(),
        Some((0, PipelineError::ExecutionReverted { reason: Some(reason), .. })) if reason == "approvals paused"
    ));
    assert_eq!(run.status(1), Some(&StepStatus::Pending));
    assert_eq!(ledger.sent().await.len(), 1);
    assert_eq!(bank.bank_balance(&ledger, &ALICE).await.unwrap(), U256::zero());
}

#[tokio::test(start_paused = true)]
async fn test_declined_signature_reaches_nothing() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;

    let run = token_bank()
        .deposit(&ledger, &DecliningSigner(ALICE), tokens(10))
        .await
        .unwrap();

    assert!(matches!(
        run.status(0),
        Some(StepStatus::Failed(PipelineError::SignerRejected(_)))
    ));
    assert_eq!(run.status(1), Some(&StepStatus::Pending));
    assert!(ledger.sent().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_confirmation_timeout_keeps_submitted_effects() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;
    ledger.state.lock().await.hold_receipts = true;

    let bank = token_bank();
    let run = bank
        .deposit(&ledger, &NodeAccountSigner::new(ALICE), tokens(10))
        .await
        .unwrap();

    let (index, error) = run.failure().unwrap();
    assert_eq!(index, 0);
    assert!(matches!(
        error,
        PipelineError::ConfirmationTimeout { elapsed, .. } if *elapsed == Duration::from_secs(60)
    ));
    assert_eq!(run.status(1), Some(&StepStatus::Pending));

    // The approval reached the ledger and is not undone by the timeout
    assert_eq!(bank.allowance(&ledger, &ALICE).await.unwrap(), tokens(10));
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_is_a_single_step() {
    let ledger = InMemoryLedger::new();
    ledger.fund(ALICE, tokens(100)).await;

    let bank = token_bank();
    let signer = NodeAccountSigner::new(ALICE);
    assert!(bank.deposit(&ledger, &signer, tokens(30)).await.unwrap().is_complete());

    let run = bank.withdraw(&ledger, &signer, tokens(10)).await.unwrap();
    assert_eq!(run.len(), 1);
    assert!(run.is_complete());
    assert_eq!(bank.bank_balance(&ledger, &ALICE).await.unwrap(), tokens(20));
    assert_eq!(bank.wallet_balance(&ledger, &ALICE).await.unwrap(), tokens(80));
}

#[tokio::test(start_paused = true)]
async fn test_withdraw_over_balance_reverts() {
    let ledger = InMemoryLedger::new();
    let run = token_bank()
        .withdraw(&ledger, &NodeAccountSigner::new(ALICE), tokens(1))
        .await
        .unwrap();

    let (_, error) = run.failure().unwrap();
    assert_eq!(error.to_string().rsplit(": ").next(), Some("insufficient bank balance"));
}

#[tokio::test]
async fn test_zero_amount_is_rejected() {
    let ledger = InMemoryLedger::new();
    let bank = token_bank();
    let signer = NodeAccountSigner::new(ALICE);

    assert!(matches!(
        bank.deposit(&ledger, &signer, U256::zero()).await,
        Err(BankError::InvalidAmount)
    ));
    assert!(matches!(
        bank.withdraw(&ledger, &signer, U256::zero()).await,
        Err(BankError::InvalidAmount)
    ));
    assert!(ledger.sent().await.is_empty());
}
