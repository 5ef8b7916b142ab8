//! End-to-end test of the LLM capabilities against a local stub of an
//! OpenAI-compatible endpoint (no external network).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use coordination::{AgentError, Producer, WorkflowController, WorkflowStatus};
use research_agents::{build_panel, build_producer, AgentsConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Read one HTTP request and return its body.
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                return String::from_utf8_lossy(&buf[header_end + 4..]).to_string();
            }
        }
    }
    String::new()
}

async fn respond(stream: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

fn completion(content: &str) -> String {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
    .to_string()
}

/// Serve `handler(request_body) -> (status, body)` until the test ends.
async fn serve<F>(handler: F) -> String
where
    F: Fn(&str) -> (String, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handler = Arc::new(handler);
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let body = read_request(&mut stream).await;
                let (status, reply) = handler(&body);
                respond(&mut stream, &status, &reply).await;
            });
        }
    });
    format!("http://{}/v1", addr)
}

fn config(api_base: String) -> AgentsConfig {
    AgentsConfig {
        api_base,
        request_timeout_secs: 10,
        ..AgentsConfig::default()
    }
}

#[tokio::test]
async fn test_producer_returns_completion() {
    let base = serve(|body| {
        assert!(body.contains("senior research analyst"));
        ("200 OK".to_string(), completion("## Executive Summary\nFindings"))
    })
    .await;

    let producer = build_producer(&config(base), "sk-test").unwrap();
    let report = producer.produce("Sleep and memory").await.unwrap();
    assert_eq!(report, "## Executive Summary\nFindings");
}

#[tokio::test]
async fn test_http_error_maps_to_request_failed() {
    let base = serve(|_| {
        (
            "503 Service Unavailable".to_string(),
            r#"{"error":"overloaded"}"#.to_string(),
        )
    })
    .await;

    let producer = build_producer(&config(base), "sk-test").unwrap();
    let err = producer.produce("anything").await.unwrap_err();
    match err {
        AgentError::RequestFailed(msg) => assert!(msg.contains("503")),
        other => panic!("expected RequestFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_council_run_over_http() {
    let reviews = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reviews);
    let base = serve(move |body| {
        let content = if body.contains("senior research analyst") {
            "## Executive Summary\nA report.".to_string()
        } else {
            counter.fetch_add(1, Ordering::SeqCst);
            let score = if body.contains("Dr. Emily Thompson") { 2.0 } else { 4.0 };
            format!(
                "### Overall Score: {score} / 5\n### Areas for Improvement:\n- more\n### Recommendation: ACCEPT"
            )
        };
        ("200 OK".to_string(), completion(&content))
    })
    .await;

    let config = config(base);
    let producer = build_producer(&config, "sk-test").unwrap();
    let panel = build_panel(&config, "sk-test").unwrap();
    let controller = WorkflowController::new(producer, panel, config.workflow.clone()).unwrap();

    let result = controller.execute("Sleep and memory").await.unwrap();

    assert_eq!(result.status, WorkflowStatus::Accepted);
    assert_eq!(result.final_scores, vec![4.0, 4.0, 2.0]);
    assert_eq!(result.artifact, "## Executive Summary\nA report.");
    assert_eq!(reviews.load(Ordering::SeqCst), 3);
}
