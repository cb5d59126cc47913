//! Action loop and startup preparation against a scripted gateway.

use std::sync::Arc;

use counter_watch::config::ActionConfig;
use counter_watch::reconcile::record::{is_undetermined, unix_secs};
use counter_watch::reconcile::ReconcileTable;
use counter_watch::rpc::types::TransactionStatus;
use counter_watch::rpc::wallet::data_account_address;
use counter_watch::workflow::{prepare, ActionLoop, PrepareError};
use counter_watch::Shutdown;

mod common;

fn fast_action_config() -> ActionConfig {
    let mut config = ActionConfig::default();
    config.poll_interval_ms = 10;
    config.confirm_timeout_secs = 2;
    config.provider = "p1".to_string();
    config
}

#[tokio::test]
async fn iteration_records_confirmed_transaction() {
    let payer = Arc::new(common::wallet(1));
    let program = Arc::new(common::wallet(2));
    let data_account = data_account_address(&payer.pubkey(), &program.pubkey());

    let now_secs = unix_secs(std::time::SystemTime::now());
    let gateway = Arc::new(common::MockGateway::accepting().with_statuses(vec![
        TransactionStatus::NotFound,
        TransactionStatus::Pending,
        TransactionStatus::Confirmed {
            block_time: Some(now_secs + 1),
        },
    ]));

    let table = ReconcileTable::new();
    let action = ActionLoop::new(
        gateway.clone(),
        payer,
        program,
        fast_action_config(),
        table.clone(),
    );

    let record = action.run_iteration(&data_account).await.unwrap().unwrap();
    assert!(record.started_at.is_some());
    assert!(record.txn_id.is_some());
    assert!(record.finished_at.map(|t| !is_undetermined(t)).unwrap_or(false));
    assert!(record.block_time.is_some());
    assert_eq!(record.provider, "p1");
    assert_eq!(gateway.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn failed_submission_yields_no_record() {
    let payer = Arc::new(common::wallet(1));
    let program = Arc::new(common::wallet(2));
    let data_account = data_account_address(&payer.pubkey(), &program.pubkey());

    let mut gateway = common::MockGateway::accepting();
    gateway.accept_submissions = false;
    let gateway = Arc::new(gateway);

    let table = ReconcileTable::new();
    let action = ActionLoop::new(
        gateway,
        payer,
        program,
        fast_action_config(),
        table.clone(),
    );

    let outcome = action.run_iteration(&data_account).await.unwrap();
    assert!(outcome.is_none());
    assert!(table.is_empty());
}

#[tokio::test(start_paused = true)]
async fn exhausted_poll_deadline_records_undetermined() {
    let payer = Arc::new(common::wallet(1));
    let program = Arc::new(common::wallet(2));
    let data_account = data_account_address(&payer.pubkey(), &program.pubkey());

    // No scripted statuses: every poll answers NotFound until the deadline.
    let gateway = Arc::new(common::MockGateway::accepting());

    let table = ReconcileTable::new();
    let action = ActionLoop::new(
        gateway,
        payer,
        program,
        fast_action_config(),
        table.clone(),
    );

    let record = action.run_iteration(&data_account).await.unwrap().unwrap();
    assert!(record.finished_at.map(is_undetermined).unwrap_or(false));
    assert!(record.block_time.map(is_undetermined).unwrap_or(false));
    // The submission itself is still on the record.
    assert!(record.txn_id.is_some());
}

#[tokio::test(start_paused = true)]
async fn action_loop_exits_on_shutdown_signal() {
    let payer = Arc::new(common::wallet(1));
    let program = Arc::new(common::wallet(2));

    let gateway = Arc::new(common::MockGateway::accepting().with_statuses(vec![
        TransactionStatus::Confirmed { block_time: Some(1) },
    ]));

    let mut config = fast_action_config();
    config.iterations = 5;
    config.sleep_secs = 3_600;

    let table = ReconcileTable::new();
    let action = ActionLoop::new(gateway, payer, program, config, table);

    let shutdown = Shutdown::new();
    let handle = tokio::spawn(action.run(shutdown.subscribe()));

    // Let the first iteration land, then signal while the loop sleeps.
    tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    shutdown.trigger();

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("action loop should stop on shutdown")
        .unwrap();
}

#[tokio::test]
async fn prepare_rejects_missing_program() {
    let payer = common::wallet(1);
    let program = common::wallet(2);
    let gateway = common::MockGateway::accepting();

    let err = prepare(&gateway, &payer, &program, &ActionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PrepareError::ProgramMissing(_)));
}

#[tokio::test]
async fn prepare_rejects_non_executable_program() {
    let payer = common::wallet(1);
    let program = common::wallet(2);
    let gateway = common::MockGateway::accepting()
        .with_account(&program.pubkey(), common::data_envelope(Vec::new()));

    let err = prepare(&gateway, &payer, &program, &ActionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PrepareError::ProgramNotExecutable(_)));
}

#[tokio::test]
async fn prepare_requests_funding_when_balance_short() {
    let payer = common::wallet(1);
    let program = common::wallet(2);
    let data_account = data_account_address(&payer.pubkey(), &program.pubkey());

    let mut gateway = common::MockGateway::accepting()
        .with_account(&program.pubkey(), common::program_envelope())
        .with_account(
            &data_account,
            common::data_envelope(common::counter_account_bytes(0, 0, 0)),
        );
    gateway.balance = 100;

    prepare(&gateway, &payer, &program, &ActionConfig::default())
        .await
        .unwrap();

    let requests = gateway.funding_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, payer.pubkey().to_string());
    assert_eq!(
        requests[0].1,
        gateway.rent_exemption + gateway.fee_per_signature
    );
}

#[tokio::test]
async fn prepare_creates_missing_data_account() {
    let payer = common::wallet(1);
    let program = common::wallet(2);
    let data_account = data_account_address(&payer.pubkey(), &program.pubkey());

    let mut gateway =
        common::MockGateway::accepting().with_account(&program.pubkey(), common::program_envelope());
    gateway.create_on_submit = Some((
        data_account.to_string(),
        common::data_envelope(common::counter_account_bytes(0, 0, 0)),
    ));

    let mut config = ActionConfig::default();
    config.poll_interval_ms = 10;

    let returned = prepare(&gateway, &payer, &program, &config).await.unwrap();
    assert_eq!(returned, data_account);
    assert_eq!(gateway.submissions.lock().unwrap().len(), 1);
    assert!(gateway
        .accounts
        .lock()
        .unwrap()
        .contains_key(&data_account.to_string()));
}
