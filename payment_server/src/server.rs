use std::sync::Arc;

use gateway_tools::{request_validator, GatewayApi};
use log::*;
use payout_engine::{
    ingest::{PaymentIngestor, PaymentOutcome, PaymentRequestMessage, PaymentResultMessage},
    tracker::PayoutSubscriber,
    PayoutFlowApi,
    SqliteDatabase,
};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};

use crate::{config::ServerConfig, errors::ServerError, expiry_worker::start_expiry_worker};

pub type Subscriber = PayoutSubscriber<SqliteDatabase, GatewayApi, SqliteDatabase>;
pub type PayoutApi = PayoutFlowApi<GatewayApi, SqliteDatabase, GatewayApi, SqliteDatabase>;

/// Everything the server runs, wired together.
pub struct PayoutServer {
    db: SqliteDatabase,
    payouts: PayoutApi,
    requests: mpsc::Sender<PaymentRequestMessage>,
    results: Option<mpsc::Receiver<PaymentResultMessage>>,
    shutdown: watch::Sender<bool>,
    sweeper: JoinHandle<()>,
    ingestor: JoinHandle<()>,
}

impl PayoutServer {
    /// Opens the database, resumes tracking of payouts left behind by a previous run and starts the background
    /// workers.
    pub async fn start(config: ServerConfig) -> Result<Self, ServerError> {
        let validator = Arc::new(request_validator(config.currencies.clone())?);
        let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
            .await
            .map_err(|e| ServerError::InitializeError(e.to_string()))?
            .with_ttl(config.tracker.ttl);
        db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
        let gateway =
            GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;

        let subscriber = PayoutSubscriber::new(db.clone(), gateway.clone(), db.clone(), config.tracker);
        let report = subscriber.resume_orphans().await?;
        if !report.resumed.is_empty() {
            info!("🚀️ Resumed tracking of {}", report.resumed.join(", "));
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let sweeper = start_expiry_worker(db.clone(), config.sweep_interval, shutdown_rx);

        let (requests, requests_rx) = mpsc::channel(config.ingest_queue_size);
        let (results_tx, results) = mpsc::channel(config.ingest_queue_size);
        let ingest = PaymentIngestor::new(gateway.clone(), db.clone(), Arc::clone(&validator));
        let ingestor = tokio::spawn(ingest.run(requests_rx, results_tx));

        let payouts = PayoutFlowApi::new(gateway, db.clone(), validator, subscriber);
        info!("🚀️ Payout server started");
        Ok(Self { db, payouts, requests, results: Some(results), shutdown, sweeper, ingestor })
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.db
    }

    pub fn payouts(&self) -> &PayoutApi {
        &self.payouts
    }

    pub fn subscriber(&self) -> &Subscriber {
        self.payouts.subscriber()
    }

    /// A sender for payment requests. The ingestion worker keeps running as long as any sender is alive.
    pub fn payment_requests(&self) -> mpsc::Sender<PaymentRequestMessage> {
        self.requests.clone()
    }

    /// Hands out the receiving end of the payment result channel. Only the first call gets it.
    pub fn take_payment_results(&mut self) -> Option<mpsc::Receiver<PaymentResultMessage>> {
        self.results.take()
    }

    /// Stops the workers and every reconciliation loop. Records of payouts still in flight stay in the database.
    ///
    /// The ingestion worker drains its queue first, so any sender handed out by [`Self::payment_requests`] must be
    /// dropped for this to return.
    pub async fn shutdown(self) {
        info!("🚀️ Shutting down the payout server");
        self.shutdown.send_replace(true);
        drop(self.requests);
        drop(self.results);
        self.payouts.subscriber().shutdown().await;
        if let Err(e) = self.sweeper.await {
            warn!("🚀️ The expired record sweeper did not stop cleanly. {e}");
        }
        if let Err(e) = self.ingestor.await {
            warn!("🚀️ The ingestion worker did not stop cleanly. {e}");
        }
        self.db.close().await;
    }
}

/// Runs the server until Ctrl-C is pressed.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let mut server = PayoutServer::start(config).await?;
    if let Some(results) = server.take_payment_results() {
        tokio::spawn(log_payment_results(results));
    }
    tokio::signal::ctrl_c().await?;
    server.shutdown().await;
    Ok(())
}

/// Without a message broker attached, payment results only go to the log.
async fn log_payment_results(mut results: mpsc::Receiver<PaymentResultMessage>) {
    while let Some(result) = results.recv().await {
        match &result.outcome {
            PaymentOutcome::Created { payment } => {
                info!("📨️ [{}] Payment {} is {}", result.correlation_key, payment.id, payment.status)
            },
            PaymentOutcome::Rejected { reason } => {
                warn!("📨️ [{}] Payment request rejected. {reason}", result.correlation_key)
            },
        }
    }
}
