use crate::dispatch::WalkDispatcher;
use crate::error::{NsError, NsResult, PotentialError};
use nestforge_protocol::protocol::{ErrorBody, SubmitBatchRequest, SubmitBatchResponse};
use nestforge_protocol::{BatchId, RunSpec, WalkJob, WalkResult};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::time::Duration;

/// Client of a remote dispatcher service.
///
/// Each batch is one synchronous RPC; the service shards jobs across its
/// registered workers and answers with results in input order. The walker
/// configured locally is ignored in this mode: every worker owns its own,
/// built from the run spec this pool embeds in each request.
#[derive(Debug)]
pub struct RemotePool {
    client: Client,
    endpoint: String,
    spec: RunSpec,
    retry_max: u32,
    timeout: Duration,
}

impl RemotePool {
    pub fn new(
        endpoint: impl Into<String>,
        spec: RunSpec,
        retry_max: u32,
        timeout: Duration,
    ) -> NsResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| NsError::Config(format!("failed to build http client: {}", e)))?;

        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(NsError::Config("dispatcher endpoint is empty".into()));
        }

        Ok(Self {
            client,
            endpoint,
            spec,
            retry_max,
            timeout,
        })
    }

    fn submit_once(&self, request: &SubmitBatchRequest) -> NsResult<Vec<WalkResult>> {
        let url = format!("{}/batches", self.endpoint);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    NsError::Timeout(self.timeout)
                } else {
                    NsError::Transport(format!("dispatcher unreachable: {}", e))
                }
            })?;

        let status = response.status();
        if status.is_success() {
            let body: SubmitBatchResponse = response
                .json()
                .map_err(|e| NsError::Transport(format!("malformed batch response: {}", e)))?;
            if body.results.len() != request.jobs.len() {
                return Err(NsError::Transport(format!(
                    "dispatcher returned {} results for {} jobs",
                    body.results.len(),
                    request.jobs.len()
                )));
            }
            return Ok(body.results);
        }

        // The body's `kind` is authoritative; the status only stands in
        // when the body is unreadable (e.g. a proxy answered for us).
        let fallback_kind = match status {
            StatusCode::GATEWAY_TIMEOUT => "timeout",
            StatusCode::UNPROCESSABLE_ENTITY => "walk",
            StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::NOT_FOUND => {
                "validation"
            }
            _ => "transport",
        };
        let body = response.json::<ErrorBody>().unwrap_or_else(|_| ErrorBody {
            error: format!("dispatcher answered {}", status),
            kind: fallback_kind.to_string(),
            x: Vec::new(),
        });

        match body.kind.as_str() {
            "timeout" => Err(NsError::Timeout(self.timeout)),
            // A failed walk on a worker is a walker fault, not a transport
            // fault; it must not be retried. The offending configuration
            // came over the wire with it.
            "walk" => Err(PotentialError::new(body.error, &body.x).into()),
            // Rejected requests are deterministic; retrying cannot change
            // the answer.
            "validation" | "conflict" | "not_found" => Err(NsError::Config(body.error)),
            _ => Err(NsError::Transport(body.error)),
        }
    }
}

impl WalkDispatcher for RemotePool {
    fn run_batch(&self, jobs: &[WalkJob]) -> NsResult<Vec<WalkResult>> {
        let request = SubmitBatchRequest {
            batch_id: BatchId::from_parts(&self.spec, jobs).hash,
            spec: self.spec.clone(),
            jobs: jobs.to_vec(),
        };

        let mut last_err = None;
        for _ in 0..=self.retry_max {
            match self.submit_once(&request) {
                Ok(results) => return Ok(results),
                // Only transport faults are retried; everything else is
                // fatal on first sight.
                Err(NsError::Transport(msg)) => last_err = Some(NsError::Transport(msg)),
                Err(other) => return Err(other),
            }
        }
        Err(last_err.unwrap_or_else(|| NsError::Transport("no attempt was made".into())))
    }
}
