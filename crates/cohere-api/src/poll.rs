//! Waiting on server-side jobs (dataset validation, embed jobs, batches,
//! fine-tuning).

use std::time::Duration;

use cohere_types::{ApiError, Endpoint, Pollable};
use tokio::time::Instant;

use crate::client::ApiClient;

/// How often to poll and when to give up.
#[derive(Debug, Clone)]
pub struct WaitConfig {
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            timeout: Duration::from_secs(600),
        }
    }
}

impl ApiClient {
    /// Repeat a read-only request until its response reports a settled
    /// status. Gives up with [`ApiError::Timeout`] once `config.timeout`
    /// has passed.
    pub async fn wait<E>(&self, request: &E, config: &WaitConfig) -> Result<E::Response, ApiError>
    where
        E: Endpoint,
        E::Response: Pollable,
    {
        let deadline = Instant::now() + config.timeout;
        let mut polls = 0u32;

        loop {
            let response = self.send(request).await?;
            polls += 1;
            if response.is_settled() {
                tracing::debug!(
                    "{} settled as {} after {polls} polls",
                    request.operation(),
                    response.status_label()
                );
                return Ok(response);
            }

            tracing::debug!(
                "{} still {}; polling again in {:?}",
                request.operation(),
                response.status_label(),
                config.poll_interval
            );
            if Instant::now() + config.poll_interval > deadline {
                return Err(ApiError::Timeout);
            }
            tokio::time::sleep(config.poll_interval).await;
        }
    }
}
