// Probe Runner against live mock endpoints: matches, misses, and every way
// a single knock can go wrong.

use std::time::{Duration, Instant};

use tokio::sync::watch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use wmn_engine::{Config, ProbeError, Prober, Site};

mod common;

fn prober() -> Prober {
    Prober::with_client(reqwest::Client::new(), Duration::from_secs(10))
}

fn site(template: String, code: u16, fragment: &str) -> Site {
    Site {
        name: "Example".to_string(),
        url_template: template,
        exists_code: code,
        exists_string: fragment.to_string(),
        ..Site::default()
    }
}

async fn serve(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_matching_response_is_a_match() {
    let server = MockServer::start().await;
    let response = ResponseTemplate::new(200).set_body_string("user profile here");
    serve(&server, "/users/bob", response).await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    assert!(prober().probe(&site, "bob", &mut shutdown).await.unwrap());
}

#[tokio::test]
async fn test_body_without_fragment_is_not_a_match() {
    let server = MockServer::start().await;
    let response = ResponseTemplate::new(200).set_body_string("not found");
    serve(&server, "/users/bob", response).await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    assert!(!prober().probe(&site, "bob", &mut shutdown).await.unwrap());
}

#[tokio::test]
async fn test_wrong_status_is_not_a_match() {
    let server = MockServer::start().await;
    let response = ResponseTemplate::new(404).set_body_string("profile");
    serve(&server, "/users/bob", response).await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    assert!(!prober().probe(&site, "bob", &mut shutdown).await.unwrap());
}

#[tokio::test]
async fn test_slow_site_times_out() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/users/bob",
        ResponseTemplate::new(200)
            .set_body_string("profile")
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let started = Instant::now();
    let err = prober()
        .probe_with_timeout(&site, "bob", Duration::from_millis(200), &mut shutdown)
        .await
        .unwrap_err();

    assert!(matches!(err, ProbeError::Timeout { .. }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_shutdown_cancels_an_in_flight_probe() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/users/bob",
        ResponseTemplate::new(200)
            .set_body_string("profile")
            .set_delay(Duration::from_secs(5)),
    )
    .await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (tx, mut shutdown) = watch::channel(false);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = tx.send(true);
    });

    let started = Instant::now();
    let result = prober().probe(&site, "bob", &mut shutdown).await;

    let err = result.unwrap_err();
    assert!(err.is_cancelled(), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_already_cancelled_run_never_matches() {
    let server = MockServer::start().await;
    let response = ResponseTemplate::new(200).set_body_string("profile");
    serve(&server, "/users/bob", response).await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(true);

    let err = prober().probe(&site, "bob", &mut shutdown).await.unwrap_err();
    assert!(err.is_cancelled());
}

#[tokio::test]
async fn test_dropped_shutdown_sender_does_not_cancel() {
    let server = MockServer::start().await;
    let response = ResponseTemplate::new(200).set_body_string("profile");
    serve(&server, "/users/bob", response).await;

    let site = site(format!("{}/users/{{account}}", server.uri()), 200, "profile");
    let (tx, mut shutdown) = watch::channel(false);
    drop(tx);

    assert!(prober().probe(&site, "bob", &mut shutdown).await.unwrap());
}

#[tokio::test]
async fn test_malformed_template_fails_request_construction() {
    let site = site("not a url/{account}".to_string(), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let err = prober().probe(&site, "bob", &mut shutdown).await.unwrap_err();
    assert!(matches!(err, ProbeError::InvalidUrl { .. }), "got {err:?}");
    assert_eq!(err.url(), "not a url/bob");
}

#[tokio::test]
async fn test_refused_connection_is_a_transport_error() {
    let addr = common::closed_port();

    let site = site(format!("http://{addr}/users/{{account}}"), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let err = prober().probe(&site, "bob", &mut shutdown).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_response_cut_short_is_a_body_error() {
    let addr = common::truncated_body_server("profile of bo").await;

    let site = site(format!("http://{addr}/users/{{account}}"), 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let err = prober().probe(&site, "bob", &mut shutdown).await.unwrap_err();
    assert!(matches!(err, ProbeError::Body { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_self_signed_certificate_still_gets_matched() {
    let addr = common::self_signed_https_server("user profile here").await;
    let template = format!("https://127.0.0.1:{}/users/{{account}}", addr.port());
    let site = site(template, 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let prober = Prober::new(&Config {
        probe_timeout: Duration::from_secs(10),
        ..Config::default()
    })
    .unwrap();
    assert!(prober.probe(&site, "bob", &mut shutdown).await.unwrap());
}

#[tokio::test]
async fn test_verifying_client_rejects_the_same_certificate() {
    // Same endpoint, default client: the certificate is the only difference.
    let addr = common::self_signed_https_server("user profile here").await;
    let template = format!("https://127.0.0.1:{}/users/{{account}}", addr.port());
    let site = site(template, 200, "profile");
    let (_tx, mut shutdown) = watch::channel(false);

    let err = prober().probe(&site, "bob", &mut shutdown).await.unwrap_err();
    assert!(matches!(err, ProbeError::Transport { .. }), "got {err:?}");
}
