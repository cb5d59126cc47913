//! Startup preparation: verify the program, top up funding, and make sure
//! the counter data account exists before the loops start.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{interval, timeout};

use crate::codec::{decode_counter_account, CodecError, COUNTER_ACCOUNT_LEN};
use crate::config::ActionConfig;
use crate::rpc::gateway::Gateway;
use crate::rpc::transaction::{create_data_account_transaction, TxError};
use crate::rpc::types::{Pubkey, RpcError};
use crate::rpc::wallet::{self, Wallet};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Tx(#[from] TxError),

    #[error("program account {0} does not exist")]
    ProgramMissing(Pubkey),

    #[error("account {0} is not an executable program")]
    ProgramNotExecutable(Pubkey),

    #[error("data account {0} did not appear within the deadline")]
    DataAccountTimeout(Pubkey),
}

/// Verify the deployment and return the derived data account address.
///
/// When the payer balance cannot cover rent exemption plus one signature
/// fee, a funding request is sent and preparation proceeds optimistically
/// without re-checking the balance.
pub async fn prepare<G: Gateway>(
    gateway: &G,
    payer: &Wallet,
    program: &Wallet,
    config: &ActionConfig,
) -> Result<Pubkey, PrepareError> {
    let program_key = program.pubkey();
    let program_env = gateway
        .get_account_snapshot(&program_key)
        .await?
        .ok_or(PrepareError::ProgramMissing(program_key))?;
    if !program_env.executable {
        return Err(PrepareError::ProgramNotExecutable(program_key));
    }

    let recent = gateway.get_recent_blockhash().await?;
    let rent_exemption = gateway.get_rent_exemption(COUNTER_ACCOUNT_LEN).await?;
    let balance = gateway.get_balance(&payer.pubkey()).await?;

    // Balance must cover rent for the data account plus one transaction fee.
    let required = rent_exemption + recent.fee_per_signature;
    if balance < required {
        let ack = gateway.request_funding(&payer.pubkey(), required).await?;
        tracing::info!(
            balance,
            required,
            ack = %ack,
            "Balance below requirement, funding requested"
        );
    }

    let data_account = wallet::data_account_address(&payer.pubkey(), &program_key);
    match gateway.get_account_snapshot(&data_account).await? {
        Some(env) => {
            env.require_data_account()?;
            let snapshot = decode_counter_account(&env.data)?;
            tracing::info!(
                account = %data_account,
                counter = snapshot.counter,
                block_timestamp = snapshot.block_timestamp,
                "Counter data account ready"
            );
        }
        None if config.create_data_account => {
            tracing::info!(account = %data_account, "Data account missing, creating");
            let tx = create_data_account_transaction(
                payer,
                &program_key,
                &data_account,
                rent_exemption,
                COUNTER_ACCOUNT_LEN as u64,
                recent.blockhash,
            )?;
            let txn_id = gateway.submit_transaction(&tx).await?;
            tracing::info!(txn_id = %txn_id, "Data account creation submitted");
            wait_for_account(gateway, &data_account, config).await?;
        }
        None => {
            tracing::warn!(
                account = %data_account,
                "Data account missing and creation is disabled"
            );
        }
    }

    Ok(data_account)
}

async fn wait_for_account<G: Gateway>(
    gateway: &G,
    address: &Pubkey,
    config: &ActionConfig,
) -> Result<(), PrepareError> {
    let deadline = Duration::from_secs(config.confirm_timeout_secs);
    timeout(deadline, async {
        let mut ticker = interval(Duration::from_millis(config.poll_interval_ms));
        loop {
            ticker.tick().await;
            match gateway.get_account_snapshot(address).await {
                Ok(Some(_)) => return,
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "Account poll failed, retrying"),
            }
        }
    })
    .await
    .map_err(|_| PrepareError::DataAccountTimeout(*address))
}
