//! Esplora API client
//!
//! Wraps the public block explorer HTTP API. Every fetch goes through a
//! bounded retry loop: rate-limit responses back off exponentially (or as the
//! server directs) without spending the attempt budget, while transport and
//! status failures back off linearly and do. A request that exhausts its
//! budget yields `None` instead of an error so a missing page degrades to a
//! logged skip.

use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Result;

// High timeout to handle large transaction lists
const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Block summary as returned by `GET /blocks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockSummary {
    pub id: String,
    pub height: i64,
    pub timestamp: i64,
    pub tx_count: i64,
    pub size: i64,
    pub weight: i64,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub merkle_root: Option<String>,
    #[serde(default)]
    pub difficulty: Option<f64>,
    #[serde(default, rename = "previousblockhash")]
    pub previous_block_hash: Option<String>,
}

/// Transaction as returned by `GET /block/{id}/txs/{offset}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tx {
    pub txid: String,
    #[serde(default)]
    pub version: Option<i64>,
    #[serde(default)]
    pub locktime: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub fee: Option<i64>,
    #[serde(default)]
    pub status: TxStatus,
    #[serde(default)]
    pub vin: Vec<Vin>,
    #[serde(default)]
    pub vout: Vec<Vout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxStatus {
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub block_height: Option<i64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub block_time: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vin {
    #[serde(default)]
    pub is_coinbase: bool,
    #[serde(default)]
    pub txid: Option<String>,
    #[serde(default)]
    pub vout: Option<i64>,
    #[serde(default)]
    pub scriptsig: Option<String>,
    #[serde(default)]
    pub scriptsig_asm: Option<String>,
    #[serde(default)]
    pub sequence: Option<i64>,
    #[serde(default)]
    pub witness: Vec<String>,
    #[serde(default)]
    pub prevout: Option<Prevout>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Prevout {
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Vout {
    #[serde(default)]
    pub value: Option<i64>,
    #[serde(default)]
    pub scriptpubkey_address: Option<String>,
    #[serde(default)]
    pub scriptpubkey_type: Option<String>,
}

/// Backoff after a transport or HTTP-status failure. `attempt` is the
/// zero-based index of the attempt that just failed.
fn transient_delay(attempt: u32) -> Duration {
    Duration::from_secs((attempt as u64 + 1) * 3)
}

/// Backoff after a rate-limit response: the server-provided delay when
/// present, otherwise 5 * 2^n seconds for the n-th consecutive throttle.
fn rate_limit_delay(throttled: u32, retry_after: Option<u64>) -> Duration {
    match retry_after {
        Some(secs) => Duration::from_secs(secs),
        None => Duration::from_secs(5 * (1 << throttled.min(6))),
    }
}

fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

pub struct EsploraClient {
    http: reqwest::Client,
    base_url: String,
    max_retries: u32,
}

impl EsploraClient {
    pub fn new(base_url: &str, max_retries: u32) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: max_retries.max(1),
        })
    }

    /// The most recent blocks, newest first.
    pub async fn recent_blocks(&self) -> Option<Vec<BlockSummary>> {
        self.get_json(&format!("{}/blocks", self.base_url)).await
    }

    /// One page of a block's transactions, starting at `offset`.
    pub async fn block_txs(&self, block_id: &str, offset: i64) -> Option<Vec<Tx>> {
        self.get_json(&format!("{}/block/{}/txs/{}", self.base_url, block_id, offset))
            .await
    }

    /// Fetch JSON with built-in retries and backoff. Returns `None` once the
    /// attempt budget is spent; transport faults never escape to the caller.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let mut attempt: u32 = 0;
        let mut throttled: u32 = 0;

        loop {
            match self.http.get(url).send().await {
                Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                    // Throttling is not a hard failure: it has its own
                    // counter so it cannot eat the transient-error budget,
                    // but it is still bounded.
                    if throttled >= self.max_retries {
                        warn!("GET {} rate limited {} times, giving up", url, throttled);
                        return None;
                    }
                    let delay = rate_limit_delay(throttled, retry_after_secs(&response));
                    throttled += 1;
                    warn!("GET {} rate limited, retrying in {:?}", url, delay);
                    sleep(delay).await;
                }
                Ok(response) => match response.error_for_status() {
                    Ok(response) => match response.json::<T>().await {
                        Ok(body) => return Some(body),
                        Err(err) => {
                            debug!("GET {} returned unparseable body: {}", url, err);
                            if !self.next_attempt(url, &mut attempt).await {
                                return None;
                            }
                        }
                    },
                    Err(err) => {
                        debug!("GET {} failed: {}", url, err);
                        if !self.next_attempt(url, &mut attempt).await {
                            return None;
                        }
                    }
                },
                Err(err) => {
                    debug!("GET {} transport error: {}", url, err);
                    if !self.next_attempt(url, &mut attempt).await {
                        return None;
                    }
                }
            }
        }
    }

    /// Charge one attempt against the budget, sleeping the linear backoff if
    /// any budget remains. Returns false when the budget is spent.
    async fn next_attempt(&self, url: &str, attempt: &mut u32) -> bool {
        let delay = transient_delay(*attempt);
        *attempt += 1;
        if *attempt >= self.max_retries {
            warn!("GET {} failed after {} attempts, no data", url, *attempt);
            return false;
        }
        sleep(delay).await;
        true
    }
}
