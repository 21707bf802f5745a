use nestforge_core::walker::Walker;
use nestforge_core::NsError;
use nestforge_protocol::protocol::{
    HeartbeatRequest, NextShardResponse, RegisterWorkerRequest, RegisterWorkerResponse, Shard,
    ShardOutcome, ShardResultRequest, WalkFault,
};
use nestforge_protocol::RunSpec;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const HEARTBEAT_EVERY: Duration = Duration::from_secs(5);

/// Registers with the hive and processes walk shards until killed.
///
/// The worker owns its walker and potential: both are built from the
/// declarative run spec carried by each batch, never received as code.
pub async fn run_worker(hive_url: String, session: String) {
    let client = Client::builder()
        // Longer than the hive's 20s long-poll window.
        .timeout(Duration::from_secs(40))
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new());

    info!("🤖 {} connecting to {}...", session, hive_url);

    let worker_id = register(&client, &hive_url, &session).await;
    info!("✅ registered as {}", worker_id);

    // Heartbeats keep us out of the reaper's sweep while a long walk is
    // running in the blocking pool.
    let hb_client = client.clone();
    let hb_url = hive_url.clone();
    let hb_id = worker_id.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(HEARTBEAT_EVERY).await;
            let req = HeartbeatRequest {
                worker_id: hb_id.clone(),
            };
            match hb_client
                .post(format!("{}/workers/heartbeat", hb_url))
                .json(&req)
                .send()
                .await
            {
                Ok(resp) if !resp.status().is_success() => {
                    warn!("heartbeat refused ({}); hive may have reaped us", resp.status());
                }
                Ok(_) => {}
                Err(e) => warn!("heartbeat failed: {}", e),
            }
        }
    });

    let mut cached_walker: Option<Arc<Walker>> = None;
    let mut cached_spec_sig = String::new();

    loop {
        let shard = match next_shard(&client, &hive_url, &worker_id).await {
            Ok(Some(shard)) => shard,
            Ok(None) => continue,
            Err(e) => {
                warn!("hive unreachable: {}. retrying...", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
                continue;
            }
        };

        let walker = walker_for(&shard.spec, &mut cached_walker, &mut cached_spec_sig);

        let job = shard.job.clone();
        let walk_walker = walker.clone();
        let outcome = match tokio::task::spawn_blocking(move || walk_walker.walk(&job)).await {
            Ok(Ok(result)) => ShardOutcome::Ok { result },
            // A potential fault keeps its offending coordinates across
            // the wire; everything else degrades to a plain message.
            Ok(Err(NsError::Potential(p))) => ShardOutcome::Err {
                fault: WalkFault {
                    message: p.message,
                    x: p.x,
                },
            },
            Ok(Err(e)) => ShardOutcome::Err {
                fault: WalkFault {
                    message: e.to_string(),
                    x: Vec::new(),
                },
            },
            Err(e) => ShardOutcome::Err {
                fault: WalkFault {
                    message: format!("walk task panicked: {}", e),
                    x: Vec::new(),
                },
            },
        };

        let submit = ShardResultRequest {
            worker_id: worker_id.clone(),
            batch_id: shard.batch_id.clone(),
            index: shard.index,
            outcome,
        };
        if let Err(e) = client
            .post(format!("{}/shards/result", hive_url))
            .json(&submit)
            .send()
            .await
        {
            error!("❌ failed to submit shard result: {}", e);
        }
    }
}

/// Registration with backoff; the hive may simply not be up yet.
async fn register(client: &Client, hive_url: &str, session: &str) -> String {
    let req = RegisterWorkerRequest {
        addr: session.to_string(),
        cores: std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1),
    };

    loop {
        match client
            .post(format!("{}/workers/register", hive_url))
            .json(&req)
            .send()
            .await
        {
            Ok(resp) => match resp.json::<RegisterWorkerResponse>().await {
                Ok(r) => return r.worker_id,
                Err(e) => warn!("malformed registration response: {}", e),
            },
            Err(e) => warn!("registration failed: {}. retrying...", e),
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

async fn next_shard(
    client: &Client,
    hive_url: &str,
    worker_id: &str,
) -> Result<Option<Shard>, String> {
    let resp = client
        .get(format!("{}/shards/next", hive_url))
        .query(&[("worker_id", worker_id)])
        .send()
        .await
        .map_err(|e| e.to_string())?;
    let body: NextShardResponse = resp.json().await.map_err(|e| e.to_string())?;
    Ok(body.shard)
}

/// Reuses the cached walker while batches keep the same run spec; a new
/// spec means a fresh walker and potential instance.
fn walker_for(
    spec: &RunSpec,
    cached: &mut Option<Arc<Walker>>,
    cached_sig: &mut String,
) -> Arc<Walker> {
    let sig = serde_json::to_string(spec).unwrap_or_default();
    if cached.is_none() || *cached_sig != sig {
        info!("🔧 building walker ({} trial moves per walk)", spec.mciter);
        *cached = Some(Arc::new(Walker::from_spec(spec)));
        *cached_sig = sig;
    }
    cached.as_ref().expect("walker cached above").clone()
}
