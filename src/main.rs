// src/main.rs
use dotenvy::dotenv;
use std::sync::Arc;
use the_sentinel::config::{Secrets, Settings, WalletSource};
use the_sentinel::connectors::clock::SystemClock;
use the_sentinel::connectors::coinmarketcap::CoinMarketCapClient;
use the_sentinel::connectors::rpc::{RpcBalanceProvider, StaticBalanceProvider};
use the_sentinel::connectors::telegram::TelegramNotifier;
use the_sentinel::connectors::traits::BalanceProvider;
use the_sentinel::core::monitor::Monitor;
use the_sentinel::core::scheduler::Scheduler;
use the_sentinel::logging;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let _log_guards = logging::init_logging();

    // 1. Load Configuration (fatal on any error, exit code 1)
    let settings = Settings::load().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    let secrets = Secrets::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;
    let settings = Arc::new(settings);

    println!("========================================");
    println!("       THE SENTINEL - v0.1.0");
    println!("========================================");
    println!(
        "Tracking: {}",
        settings
            .assets
            .iter()
            .map(|a| a.symbol.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Quote:    {}", settings.quote_currency);
    println!(
        "Wallet:   {}",
        match &settings.wallet {
            WalletSource::Rpc { .. } => "🔗 ON-CHAIN",
            WalletSource::Static(_) => "📝 STATIC BALANCES",
        }
    );
    println!("========================================");

    // 2. Initialize Components
    let timeout = settings.request_timeout;
    let prices = Arc::new(CoinMarketCapClient::new(secrets.price_feed_api_key, timeout)?);
    let notifier = Arc::new(TelegramNotifier::new(
        secrets.bot_token,
        settings.chat_id.clone(),
        timeout,
    )?);
    let balances: Arc<dyn BalanceProvider> = match &settings.wallet {
        WalletSource::Rpc { url, address } => Arc::new(RpcBalanceProvider::new(
            url.clone(),
            address.clone(),
            timeout,
        )?),
        WalletSource::Static(map) => Arc::new(StaticBalanceProvider::new(map.clone())),
    };
    let clock = Arc::new(SystemClock::new(settings.trading_window.timezone()));

    let monitor = Monitor::new(settings.clone(), clock, prices, balances, notifier);
    let mut scheduler = Scheduler::from_settings(&settings);

    // 3. Shutdown on Ctrl+C
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, stopping after the current tick");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive so the scheduler keeps running.
                error!("Unable to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
                drop(shutdown_tx);
            }
        }
    });

    // 4. Run
    info!("✅ Crypto Alert Bot Started");
    scheduler.run(&monitor, shutdown_rx).await;

    Ok(())
}
