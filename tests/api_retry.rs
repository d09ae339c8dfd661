//! Retry behavior of the API client against a local stub server that
//! always answers 429.

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use ir2dis::iracing::{
    client::{IracingClient, RetryPolicy},
    error::ApiError,
};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Minimal HTTP server: read the request head, answer 429, count it.
async fn spawn_rate_limited_server(hits: Arc<AtomicUsize>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("couldn't bind the stub server");
    let addr = listener.local_addr().expect("no local addr");

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            hits.fetch_add(1, Ordering::SeqCst);

            let mut buf = [0u8; 4096];
            let mut head = Vec::new();
            loop {
                match stream.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => {
                        head.extend_from_slice(&buf[..n]);
                        if head.windows(4).any(|w| w == b"\r\n\r\n") {
                            break;
                        }
                    }
                }
            }

            let _ = stream
                .write_all(
                    b"HTTP/1.1 429 Too Many Requests\r\n\
                      content-length: 0\r\n\
                      connection: close\r\n\r\n",
                )
                .await;
            let _ = stream.shutdown().await;
        }
    });

    format!("http://{addr}")
}

#[tokio::test]
async fn gives_up_after_max_attempts_on_rate_limit() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = spawn_rate_limited_server(hits.clone()).await;

    let client = IracingClient::new("user@example.com", "hunter2", false, 4)
        .with_base_url(&base_url)
        .with_retry_policy(RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        });

    let result = client
        .fetch_json("results/get", &[("subsession_id", "1".to_owned())])
        .await;

    assert!(matches!(result, Err(ApiError::RateLimited)));
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn login_surfaces_rate_limit_without_retry() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base_url = spawn_rate_limited_server(hits.clone()).await;

    let client = IracingClient::new("user@example.com", "hunter2", false, 4)
        .with_base_url(&base_url);

    assert!(matches!(client.login().await, Err(ApiError::RateLimited)));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}
