//! Concurrent load through both response branches.

use std::time::{Duration, Instant};

use common::{start_default_gateway, start_origin, MockResponse};

mod common;

#[tokio::test(flavor = "multi_thread")]
async fn test_load_performance() {
    let page = format!(
        "<html><head><title>load</title></head><body>{}</body></html>",
        (0..200).map(|i| format!("<a href=\"/p/{i}\">{i}</a>")).collect::<String>()
    );
    let origin = start_origin(move |req| {
        if req.path.ends_with(".bin") {
            MockResponse::new(200, vec![7u8; 64 * 1024]).header("Content-Type", "application/octet-stream")
        } else {
            MockResponse::html(&page)
        }
    })
    .await;
    let gateway = start_default_gateway().await;

    let concurrency = 20;
    let requests_per_task = 25;
    let total_requests = concurrency * requests_per_task;

    let client = reqwest::Client::new();
    let start = Instant::now();

    let mut tasks = Vec::new();
    for task in 0..concurrency {
        let client = client.clone();
        let url = gateway.url("/proxy");
        let target = if task % 2 == 0 { origin.url("/page") } else { origin.url("/blob.bin") };
        tasks.push(tokio::spawn(async move {
            let mut latencies = Vec::new();
            for _ in 0..requests_per_task {
                let req_start = Instant::now();
                let Ok(res) = client.get(&url).query(&[("url", &target)]).send().await else {
                    continue;
                };
                if res.status().is_success() && res.bytes().await.is_ok() {
                    latencies.push(req_start.elapsed());
                }
            }
            latencies
        }));
    }

    let mut all_latencies: Vec<Duration> = Vec::new();
    for task in tasks {
        all_latencies.extend(task.await.unwrap());
    }

    let duration = start.elapsed();
    let rps = total_requests as f64 / duration.as_secs_f64();

    assert_eq!(all_latencies.len(), total_requests, "every request should succeed");

    all_latencies.sort();
    let p50 = all_latencies[all_latencies.len() / 2];
    let p99 = all_latencies[(all_latencies.len() as f64 * 0.99) as usize];

    println!("\n--- Load Test Results ---");
    println!("Total Requests: {}", total_requests);
    println!("Concurrency:    {}", concurrency);
    println!("Total Duration: {:?}", duration);
    println!("Requests/sec:   {:.2}", rps);
    println!("P50 Latency:    {:?}", p50);
    println!("P99 Latency:    {:?}", p99);
    println!("-------------------------\n");
}
