use std::sync::Arc;

use octofhir_sample_client::{
    BatchPlan, BatchRunner, CachingMode, ResourceSearch, ResponseTimeInterceptor, SampleError,
    SearchClient,
};
use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn patient_bundle(family: &str) -> serde_json::Value {
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": 2,
        "entry": [
            {
                "resource": {
                    "resourceType": "Patient",
                    "id": "2",
                    "name": [{ "family": family, "given": ["Bob"] }]
                }
            },
            {
                "resource": {
                    "resourceType": "Patient",
                    "id": "1",
                    "name": [{ "family": family, "given": ["Alice"] }],
                    "birthDate": "1985-07-14"
                }
            }
        ]
    })
}

fn client_with_stats(server: &MockServer) -> (SearchClient, Arc<ResponseTimeInterceptor>) {
    let stats = Arc::new(ResponseTimeInterceptor::new());
    let client = SearchClient::builder(server.uri())
        .interceptor(stats.clone())
        .build()
        .expect("client");
    (client, stats)
}

#[tokio::test]
async fn search_sends_family_filter_and_parses_bundle() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .and(query_param("family", "Smith"))
        .and(header("accept", "application/fhir+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_bundle("Smith")))
        .expect(1)
        .mount(&server)
        .await;

    let (client, stats) = client_with_stats(&server);
    let bundle = client.search("Patient", "family", "Smith").await.unwrap();

    assert_eq!(bundle.total, Some(2));
    let patient = bundle.entry[1].expect_patient().unwrap();
    assert_eq!(patient.first_name(), "Alice");
    assert_eq!(patient.last_name(), "Smith");
    assert_eq!(stats.requests(), 1);
}

#[tokio::test]
async fn empty_search_value_is_rejected_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_bundle("Smith")))
        .expect(0)
        .mount(&server)
        .await;

    let (client, stats) = client_with_stats(&server);
    for resource_type in ["Patient", "Practitioner", "Observation"] {
        let err = client.search(resource_type, "family", "").await.unwrap_err();
        assert!(matches!(err, SampleError::InvalidArgument(_)));
    }

    assert_eq!(stats.requests(), 0);
    server.verify().await;
}

#[tokio::test]
async fn disabled_caching_adds_no_cache_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_bundle("Doe")))
        .expect(2)
        .mount(&server)
        .await;

    let (client, _) = client_with_stats(&server);
    client.search("Patient", "family", "Doe").await.unwrap();
    client.disable_caching();
    assert_eq!(client.caching(), CachingMode::Disabled);
    client.search("Patient", "family", "Doe").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);

    assert!(requests[0].headers.get("cache-control").is_none());
    assert!(requests[0].headers.get("pragma").is_none());

    let headers = &requests[1].headers;
    assert_eq!(
        headers.get("cache-control").unwrap(),
        "no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers.get("pragma").unwrap(), "no-cache");
    assert_eq!(headers.get("expires").unwrap(), "0");
}

#[tokio::test]
async fn rate_limited_response_propagates_after_being_timed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "resourceType": "OperationOutcome",
            "issue": [{ "severity": "error", "code": "throttled", "diagnostics": "Rate limit exceeded" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (client, stats) = client_with_stats(&server);
    let err = client.search("Patient", "family", "Smith").await.unwrap_err();

    match &err {
        SampleError::ServerResponse { status, message } => {
            assert_eq!(*status, 429);
            assert_eq!(message, "Rate limit exceeded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.is_transport_failure());
    assert_eq!(stats.requests(), 1);
}

#[tokio::test]
async fn truncated_body_is_still_timed() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 4096];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\n\
                  Content-Type: application/fhir+json\r\n\
                  Content-Length: 100\r\n\r\n\
                  {\"resourceType\"",
            )
            .await
            .unwrap();
        let _ = socket.shutdown().await;
    });

    let stats = Arc::new(ResponseTimeInterceptor::new());
    let client = SearchClient::builder(format!("http://{addr}"))
        .interceptor(stats.clone())
        .build()
        .unwrap();
    let err = client.search("Patient", "family", "Smith").await.unwrap_err();

    assert!(matches!(err, SampleError::Transport(_)));
    assert_eq!(stats.requests(), 1);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_failure() {
    let client = SearchClient::builder("http://127.0.0.1:1").build().unwrap();
    let err = client.search("Patient", "family", "Smith").await.unwrap_err();
    assert!(matches!(err, SampleError::Transport(_)));
}

#[tokio::test]
async fn batch_runs_every_name_each_pass_and_disables_caching_last() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/Patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 0
        })))
        .expect(9)
        .mount(&server)
        .await;

    let (client, stats) = client_with_stats(&server);
    let names = vec!["Smith".to_string(), "Johnson".to_string(), "Doe".to_string()];
    let runner = BatchRunner::new(Arc::new(client), stats, names.clone(), BatchPlan::default());

    let mut lines = Vec::new();
    let reports = runner
        .run(|r| lines.push(octofhir_sample_client::output::format_pass_report(r)))
        .await
        .unwrap();

    assert_eq!(reports.len(), 3);
    assert!(reports.iter().all(|r| r.requests == 3));
    assert_eq!(reports[2].caching, CachingMode::Disabled);
    assert!(lines[2].starts_with("Average Response Time for loop 3 (No Caching): "));

    let requests = server.received_requests().await.unwrap();
    let families: Vec<String> = requests
        .iter()
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "family")
                .map(|(_, v)| v.into_owned())
                .unwrap()
        })
        .collect();
    let expected: Vec<String> = names.iter().cycle().take(9).cloned().collect();
    assert_eq!(families, expected);

    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.headers.get("pragma").is_some(), i >= 6);
    }
}
