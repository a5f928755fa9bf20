//! Scripted walkthrough of the simulated vault: connect, refresh, deposit,
//! withdraw, export the journal.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use omniyield_client::sim::{SimBackend, SimWalletProvider};
use omniyield_client::store::MemoryStore;
use omniyield_client::{Config, StatusPoller, VaultLedger, WalletSession};
use omniyield_core::constants::MOTES_PER_CSPR;
use omniyield_core::display::format_motes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "omniyield_client=info,demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let store = Arc::new(MemoryStore::new());
    let provider = Arc::new(SimWalletProvider::new());
    let backend = Arc::new(SimBackend::new());
    let (events, _) = broadcast::channel(64);

    let session = WalletSession::new(
        provider,
        store.clone(),
        events.clone(),
        config.network,
        config.balance_refresh_interval,
    );
    let ledger = VaultLedger::new(
        session.clone(),
        backend.clone(),
        store,
        events,
        config.clone(),
    );

    let account = session.connect().await?;
    info!(public_key = %account.public_key, balance = %format_motes(session.balance()), "connected");

    let refresh_guard = ledger.spawn_auto_refresh();
    let poll_guard = StatusPoller::new(ledger.clone(), backend, &config).spawn();

    ledger.refresh().await?;
    let pool = ledger.pool();
    info!(
        total_assets = %format_motes(pool.total_assets),
        total_shares = %format_motes(pool.total_shares),
        "pool loaded"
    );

    let deposit = ledger.deposit(500 * MOTES_PER_CSPR).await?;
    info!(shares = deposit.shares, status = ?deposit.record.status, "deposited 500 CSPR");

    let withdraw = ledger.withdraw(deposit.shares / 2).await?;
    info!(amount = %format_motes(withdraw.amount), "withdrew half the position");

    let event = ledger.accrue_yield().await?;
    info!(amount = %format_motes(event.amount), source = %event.source, "yield accrued");

    println!("{}", ledger.export_journal_csv());

    poll_guard.cancel();
    refresh_guard.cancel();
    session.disconnect();
    Ok(())
}
