//! Integration tests for the session-gated portal: login, one-shot
//! re-authentication, exam table parsing and result documents.

#![allow(clippy::unwrap_used)]

mod support;

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use examwatch_core::document::{DocumentError, TextExtractor, non_empty};
use examwatch_core::pipeline::{PipelineError, collect_results};
use examwatch_core::session::SESSION_LIFETIME;
use examwatch_core::store::{JsonResultCache, ResultCache};
use examwatch_core::{
    AuthError, AuthenticatedFetcher, Credentials, FetchError, HttpClient, PortalClient,
    PortalConfig, PortalError, SessionStore,
};
use support::socket_guard::start_mock_server_or_skip;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const IDENTITY: &str = "chat-7";

const EXAM_TABLE: &str = r#"
<html><body>
<table>
  <tr><th>Kode Ujian</th><th>Periode</th><th>Kota</th><th>Hasil</th><th>Status</th><th>Aksi</th></tr>
  <tr>
    <td>A20-2025-III</td><td>Periode III 2025</td><td>Jakarta</td>
    <td><a href="/peserta/hasil/881">Lihat Hasil</a></td><td>Selesai</td>
    <td><a href="/peserta/detail/881">Detail</a> <a href="/peserta/sertifikat/881">Sertifikat</a></td>
  </tr>
  <tr>
    <td>A30-2025-III</td><td>Periode III 2025</td><td>Bandung</td>
    <td>-</td><td>Terdaftar</td><td></td>
  </tr>
</table>
</body></html>
"#;

/// Reads the served bytes as UTF-8 so tests can serve plain-text "documents".
struct Utf8Extractor;

impl TextExtractor for Utf8Extractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, DocumentError> {
        non_empty(String::from_utf8_lossy(bytes).into_owned())
    }
}

fn credentials() -> Credentials {
    Credentials::new("budi", "rahasia")
}

fn fetcher_for(base: &str, sessions: Arc<SessionStore>) -> AuthenticatedFetcher {
    let config = PortalConfig::new(Url::parse(base).unwrap());
    AuthenticatedFetcher::new(HttpClient::new(), config, sessions).unwrap()
}

async fn mount_login(server: &MockServer, token: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("Location", "/peserta")
                .insert_header("Set-Cookie", format!("ci_session={token}; path=/; HttpOnly").as_str()),
        )
        .expect(times)
        .mount(server)
        .await;
}

async fn mount_login_page(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<form>Masuk</form>"))
        .mount(server)
        .await;
}

fn redirect_to_login() -> ResponseTemplate {
    ResponseTemplate::new(302).insert_header("Location", "/login")
}

#[tokio::test]
async fn test_login_then_exam_table_is_parsed() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok-1", 1).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .and(header("cookie", "ci_session=tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::clone(&sessions)));
    let records = portal.exam_records(IDENTITY, &credentials()).await.unwrap();

    assert_eq!(records.len(), 2);
    let first = &records[0];
    assert_eq!(first.code, "A20-2025-III");
    assert_eq!(first.city, "Jakarta");
    assert_eq!(first.status, "Selesai");
    assert_eq!(first.result.text, "Lihat Hasil");
    assert_eq!(
        first.result.link.as_deref(),
        Some(format!("{}/peserta/hasil/881", server.uri()).as_str())
    );
    let actions: Vec<_> = first.actions.iter().map(|a| a.text.as_str()).collect();
    assert_eq!(actions, ["Sertifikat"]);
    assert_eq!(records[1].result.link, None);

    assert_eq!(sessions.get(IDENTITY).as_deref(), Some("tok-1"));
}

#[tokio::test]
async fn test_valid_cached_session_skips_login() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "unused", 0).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .and(header("cookie", "ci_session=cached"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .expect(2)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    sessions.put(IDENTITY, "cached", SystemTime::now() + SESSION_LIFETIME);
    let portal = PortalClient::new(fetcher_for(&server.uri(), sessions));

    portal.exam_records(IDENTITY, &credentials()).await.unwrap();
    portal.exam_records(IDENTITY, &credentials()).await.unwrap();
}

#[tokio::test]
async fn test_rejected_login_is_auth_error_and_skips_resource() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Username atau password salah"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .expect(0)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::clone(&sessions)));
    let error = portal
        .exam_records(IDENTITY, &credentials())
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        PortalError::Auth(AuthError::Rejected { status: 200, .. })
    ));
    assert!(error.is_rejected_login());
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_unreachable_portal_is_login_transport_error() {
    let portal = PortalClient::new(fetcher_for(
        "http://127.0.0.1:1",
        Arc::new(SessionStore::new()),
    ));
    let error = portal
        .exam_records(IDENTITY, &credentials())
        .await
        .unwrap_err();

    assert!(matches!(error, PortalError::Auth(AuthError::Transport(_))));
    assert!(!error.is_rejected_login());
}

#[tokio::test]
async fn test_stale_session_triggers_exactly_one_relogin() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "new", 1).await;
    mount_login_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .and(header("cookie", "ci_session=new"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .respond_with(redirect_to_login())
        .expect(1)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    sessions.put(IDENTITY, "old", SystemTime::now() + SESSION_LIFETIME);
    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::clone(&sessions)));

    let records = portal.exam_records(IDENTITY, &credentials()).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(sessions.get(IDENTITY).as_deref(), Some("new"));
}

#[tokio::test]
async fn test_expired_session_renews_before_request() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "renewed", 1).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .and(header("cookie", "ci_session=renewed"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .expect(1)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    // Inside the validity margin, so already unusable.
    sessions.put(IDENTITY, "old", SystemTime::now() + Duration::from_secs(60));
    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::clone(&sessions)));

    portal.exam_records(IDENTITY, &credentials()).await.unwrap();
    assert_eq!(sessions.get(IDENTITY).as_deref(), Some("renewed"));
}

#[tokio::test]
async fn test_persistent_login_redirect_gives_session_expired_after_one_retry() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok", 2).await;
    mount_login_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .respond_with(redirect_to_login())
        .expect(2)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::clone(&sessions)));
    let error = portal
        .exam_records(IDENTITY, &credentials())
        .await
        .unwrap_err();

    match error {
        PortalError::SessionExpired { url } => {
            assert_eq!(url, format!("{}/peserta/ujian", server.uri()));
        }
        other => panic!("expected SessionExpired, got {other:?}"),
    }
    assert!(sessions.is_empty());
}

#[tokio::test]
async fn test_resource_failure_is_transport_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::new(SessionStore::new())));
    let error = portal
        .exam_records(IDENTITY, &credentials())
        .await
        .unwrap_err();
    assert!(matches!(
        error,
        PortalError::Transport(FetchError::HttpStatus { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_collect_results_extracts_then_serves_from_cache() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/peserta/ujian"))
        .respond_with(ResponseTemplate::new(200).set_body_string(EXAM_TABLE))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/peserta/hasil/881"))
        .and(header("cookie", "ci_session=tok"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "Hasil Ujian\nMatematika Dasar (MTK01) = 82,5\nPeriode III Tahun 2025",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let state = TempDir::new().unwrap();
    let cache = JsonResultCache::in_dir(state.path());
    let portal = PortalClient::with_extractor(
        fetcher_for(&server.uri(), Arc::new(SessionStore::new())),
        Arc::new(Utf8Extractor),
    );
    let records = portal.exam_records(IDENTITY, &credentials()).await.unwrap();

    let first = collect_results(&portal, IDENTITY, &credentials(), &records, &cache)
        .await
        .unwrap();
    assert_eq!(first.len(), 1);
    assert!(!first[0].cached);
    let result = first[0].result.as_ref().unwrap();
    assert_eq!(result.subject.as_deref(), Some("Matematika Dasar"));
    assert_eq!(result.subject_code.as_deref(), Some("MTK01"));
    assert_eq!(result.score, Some(82.5));
    assert_eq!(result.passed, Some(true));
    assert_eq!(result.period.as_deref(), Some("Periode III 2025"));

    let second = collect_results(&portal, IDENTITY, &credentials(), &records, &cache)
        .await
        .unwrap();
    assert!(second[0].cached);
    assert_eq!(second[0].result.as_ref().unwrap(), result);
    assert!(cache.get("A20-2025-III").await.unwrap().is_some());
}

#[tokio::test]
async fn test_non_pdf_document_is_document_error() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok", 1).await;
    Mock::given(method("GET"))
        .and(path("/peserta/hasil/881"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>bukan pdf</html>"))
        .mount(&server)
        .await;

    let portal = PortalClient::new(fetcher_for(&server.uri(), Arc::new(SessionStore::new())));
    let link = format!("{}/peserta/hasil/881", server.uri());
    let error = portal
        .exam_result(IDENTITY, &credentials(), &link)
        .await
        .unwrap_err();

    match error {
        PortalError::Document { url, source } => {
            assert_eq!(url, link);
            assert!(matches!(source, DocumentError::Unreadable { .. }));
        }
        other => panic!("expected Document error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_collect_results_aborts_on_rejected_login() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let records = examwatch_core::parse_exam_table(
        EXAM_TABLE,
        &Url::parse(&format!("{}/peserta/ujian", server.uri())).unwrap(),
    );
    let state = TempDir::new().unwrap();
    let portal = PortalClient::with_extractor(
        fetcher_for(&server.uri(), Arc::new(SessionStore::new())),
        Arc::new(Utf8Extractor),
    );

    let result = collect_results(
        &portal,
        IDENTITY,
        &credentials(),
        &records,
        &JsonResultCache::in_dir(state.path()),
    )
    .await;
    assert!(matches!(result, Err(PipelineError::Portal(_))));
}

#[tokio::test]
async fn test_stale_session_on_document_triggers_exactly_one_relogin() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "new", 1).await;
    mount_login_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/peserta/hasil/881"))
        .and(header("cookie", "ci_session=new"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("Statistika (ST1) = 64,5\nPeriode II Tahun 2025"),
        )
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/peserta/hasil/881"))
        .respond_with(redirect_to_login())
        .expect(1)
        .mount(&server)
        .await;

    let sessions = Arc::new(SessionStore::new());
    sessions.put(IDENTITY, "old", SystemTime::now() + SESSION_LIFETIME);
    let portal = PortalClient::with_extractor(
        fetcher_for(&server.uri(), Arc::clone(&sessions)),
        Arc::new(Utf8Extractor),
    );

    let link = format!("{}/peserta/hasil/881", server.uri());
    let result = portal
        .exam_result(IDENTITY, &credentials(), &link)
        .await
        .unwrap();
    assert_eq!(result.subject_code.as_deref(), Some("ST1"));
    assert_eq!(result.passed, Some(false));
    assert_eq!(sessions.get(IDENTITY).as_deref(), Some("new"));
}

#[tokio::test]
async fn test_document_persistent_login_redirect_gives_session_expired() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_login(&server, "tok", 2).await;
    mount_login_page(&server).await;
    Mock::given(method("GET"))
        .and(path("/peserta/hasil/881"))
        .respond_with(redirect_to_login())
        .expect(2)
        .mount(&server)
        .await;

    let portal = PortalClient::with_extractor(
        fetcher_for(&server.uri(), Arc::new(SessionStore::new())),
        Arc::new(Utf8Extractor),
    );
    let link = format!("{}/peserta/hasil/881", server.uri());
    let error = portal
        .exam_result(IDENTITY, &credentials(), &link)
        .await
        .unwrap_err();

    match error {
        PortalError::SessionExpired { url } => assert_eq!(url, link),
        other => panic!("expected SessionExpired, got {other:?}"),
    }
}
