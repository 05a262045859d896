use std::sync::Arc;

use log::*;
use reqwest::{header::HeaderValue, Client, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::GatewayConfig,
    data_objects::{NewPayment, NewPayout, Payment, Payout},
    GatewayError,
};

/// Header the gateway uses to deduplicate create requests.
pub const IDEMPOTENCE_KEY_HEADER: &str = "Idempotence-Key";

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    pub async fn rest_query<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        idempotence_key: Option<&str>,
        body: Option<B>,
    ) -> Result<T, GatewayError> {
        let url = self.url(path);
        trace!("Sending REST query: {method} {url}");
        let mut req = self
            .client
            .request(method, url)
            .basic_auth(&self.config.shop_id, Some(self.config.secret_key.reveal()));
        if let Some(key) = idempotence_key {
            let val = HeaderValue::from_str(key).map_err(|e| GatewayError::Initialization(e.to_string()))?;
            req = req.header(IDEMPOTENCE_KEY_HEADER, val);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let response = req.send().await?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await?;
            Err(GatewayError::QueryError { status, message })
        }
    }

    pub async fn get_payout(&self, payout_id: &str) -> Result<Payout, GatewayError> {
        let path = format!("/payouts/{}", path_segment(payout_id));
        trace!("Fetching payout {payout_id}");
        let payout = self.rest_query::<Payout, ()>(Method::GET, &path, None, None).await?;
        debug!("Payout {payout_id} is {}", payout.status);
        Ok(payout)
    }

    /// Creates a payout. Repeating the call with the same `idempotence_key` returns the original payout.
    pub async fn create_payout(&self, idempotence_key: &str, payout: &NewPayout) -> Result<Payout, GatewayError> {
        debug!("Creating payout of {} {}", payout.amount.value, payout.amount.currency);
        let result = self.rest_query::<Payout, _>(Method::POST, "/payouts", Some(idempotence_key), Some(payout)).await?;
        info!("Created payout {} ({})", result.id, result.status);
        Ok(result)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Payment, GatewayError> {
        let path = format!("/payments/{}", path_segment(payment_id));
        trace!("Fetching payment {payment_id}");
        self.rest_query::<Payment, ()>(Method::GET, &path, None, None).await
    }

    /// Creates a payment. Repeating the call with the same `idempotence_key` returns the original payment.
    pub async fn create_payment(&self, idempotence_key: &str, payment: &NewPayment) -> Result<Payment, GatewayError> {
        debug!("Creating payment of {} {}", payment.amount.value, payment.amount.currency);
        let result =
            self.rest_query::<Payment, _>(Method::POST, "/payments", Some(idempotence_key), Some(payment)).await?;
        info!("Created payment {} ({})", result.id, result.status);
        Ok(result)
    }
}

/// Percent-encodes everything outside the unreserved URI characters, so that an id always stays one path segment.
fn path_segment(id: &str) -> String {
    id.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => char::from(b).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
