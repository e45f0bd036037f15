//! Header viewer gate and polling behaviour.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use header_reflector::config::ServiceConfig;
use header_reflector::reflector::HeadersPayload;
use header_reflector::viewer::{
    Challenge, ChallengeError, FetchError, Fetcher, GateState, HeaderViewer, HttpFetcher, Pane,
    PaneView, PromptChallenge, TurnstileChallenge, DEFAULT_POLL_INTERVAL,
};
use reqwest::Url;

mod common;

/// Counts calls; optionally delays and fails on chosen call numbers.
#[derive(Clone, Default)]
struct ScriptedFetcher {
    calls: Arc<AtomicUsize>,
    delay: Duration,
    fail_calls: Vec<usize>,
}

impl ScriptedFetcher {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetcher for ScriptedFetcher {
    fn fetch(&self) -> impl Future<Output = Result<HeadersPayload, FetchError>> + Send {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;
        let fail = self.fail_calls.contains(&call);
        async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if fail {
                return Err(FetchError::Status {
                    status: 503,
                    body: "Service Unavailable".into(),
                });
            }
            let mut payload = HeadersPayload::default();
            payload
                .request_headers
                .insert("x-call".into(), call.to_string());
            Ok(payload)
        }
    }
}

struct FixedChallenge(Result<(), &'static str>);

impl Challenge for FixedChallenge {
    fn verify(&mut self) -> impl Future<Output = Result<(), ChallengeError>> {
        let result = self.0.map_err(|reason| ChallengeError::Rejected(reason.into()));
        async move { result }
    }
}

#[tokio::test(start_paused = true)]
async fn unverified_viewer_never_fetches() {
    let fetcher = ScriptedFetcher::default();
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fetcher.calls(), 0);

    let err = viewer
        .verify(&mut FixedChallenge(Err("expired")))
        .await
        .unwrap_err();
    assert!(matches!(err, ChallengeError::Rejected(_)));
    assert_eq!(viewer.gate(), GateState::Unverified);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(fetcher.calls(), 0);
    assert!(viewer.snapshot().is_loading());
}

#[tokio::test(start_paused = true)]
async fn verified_viewer_fetches_immediately_then_every_interval() {
    let fetcher = ScriptedFetcher::default();
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);

    viewer.verify(&mut FixedChallenge(Ok(()))).await.unwrap();
    assert_eq!(viewer.gate(), GateState::Verified);

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fetcher.calls(), 1);

    tokio::time::sleep(Duration::from_millis(4_900)).await;
    assert_eq!(fetcher.calls(), 1);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(fetcher.calls(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fetcher.calls(), 4);

    // A second verification does not start another timer.
    viewer.verify(&mut FixedChallenge(Ok(()))).await.unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fetcher.calls(), 5);
}

#[tokio::test(start_paused = true)]
async fn ticks_do_not_wait_for_slow_fetches() {
    let fetcher = ScriptedFetcher {
        delay: Duration::from_secs(12),
        ..Default::default()
    };
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);
    viewer.on_verified();

    tokio::time::sleep(Duration::from_millis(10_001)).await;
    assert_eq!(fetcher.calls(), 3);
    assert!(viewer.snapshot().is_loading());

    tokio::time::sleep(Duration::from_secs(2)).await;
    let state = viewer.snapshot();
    assert_eq!(
        state.data.unwrap().request_headers["x-call"],
        "1",
        "first fetch resolved first"
    );
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_is_shown_and_next_tick_recovers() {
    let fetcher = ScriptedFetcher {
        fail_calls: vec![1],
        ..Default::default()
    };
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);
    viewer.on_verified();

    tokio::time::sleep(Duration::from_millis(1)).await;
    let state = viewer.snapshot();
    assert_eq!(
        Pane::RequestHeaders.view(&state),
        PaneView::Failed {
            message: "Failed to load headers",
            detail: "503: Service Unavailable".into(),
        }
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    let state = viewer.snapshot();
    assert!(state.error.is_none());
    assert_eq!(
        Pane::RequestHeaders.view(&state),
        PaneView::Rows(vec![("x-call".into(), "2".into())])
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_the_viewer_stops_polling() {
    let fetcher = ScriptedFetcher::default();
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);
    viewer.on_verified();

    tokio::time::sleep(Duration::from_millis(1)).await;
    assert_eq!(fetcher.calls(), 1);

    drop(viewer);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn http_fetcher_reads_live_reflector() {
    let server = common::start_server(ServiceConfig::default()).await;
    let endpoint = Url::parse(&server.url("/api/headers")).unwrap();
    let mut viewer = HeaderViewer::new(HttpFetcher::new(endpoint), DEFAULT_POLL_INTERVAL);
    let mut updates = viewer.subscribe();

    viewer.verify(&mut FixedChallenge(Ok(()))).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), updates.changed())
        .await
        .expect("no fetch resolved")
        .unwrap();

    let state = updates.borrow().clone();
    assert!(state.error.is_none(), "fetch failed: {:?}", state.error);

    let PaneView::Rows(rows) = Pane::DeviceInfo.view(&state) else {
        panic!("expected device rows");
    };
    assert_eq!(rows[0], ("IP Address".to_string(), "127.0.0.1".to_string()));
    assert!(matches!(Pane::ResponseHeaders.view(&state), PaneView::Rows(_)));
}

#[tokio::test]
async fn http_fetcher_reports_unreachable_endpoint() {
    let fetcher = HttpFetcher::new(Url::parse("http://127.0.0.1:9/api/headers").unwrap());
    let err = fetcher.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
}

#[tokio::test]
async fn turnstile_success_opens_the_gate() {
    let (siteverify, submissions) = common::start_siteverify(common::always_pass()).await;
    let mut challenge = TurnstileChallenge::new(
        Url::parse(&siteverify).unwrap(),
        "1x0000000000000000000000000000000AA",
        "widget-token",
    )
    .remote_ip("198.51.100.3");

    let mut viewer = HeaderViewer::new(ScriptedFetcher::default(), DEFAULT_POLL_INTERVAL);
    viewer.verify(&mut challenge).await.unwrap();
    assert_eq!(viewer.gate(), GateState::Verified);

    let submitted = submissions.lock().unwrap()[0].clone();
    assert!(submitted.contains(&("response".into(), "widget-token".into())));
    assert!(submitted.contains(&("remoteip".into(), "198.51.100.3".into())));
}

#[tokio::test]
async fn turnstile_rejection_keeps_the_gate_closed() {
    let (siteverify, _) = common::start_siteverify(serde_json::json!({
        "success": false,
        "error-codes": ["invalid-input-response"]
    }))
    .await;
    let mut challenge =
        TurnstileChallenge::new(Url::parse(&siteverify).unwrap(), "secret", "stale-token");

    let fetcher = ScriptedFetcher::default();
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);
    let err = viewer.verify(&mut challenge).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "verification rejected: invalid-input-response"
    );
    assert_eq!(viewer.gate(), GateState::Unverified);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn rejected_token_falls_back_to_terminal_check() {
    let (siteverify, _) = common::start_siteverify(serde_json::json!({
        "success": false,
        "error-codes": ["timeout-or-duplicate"]
    }))
    .await;
    let mut turnstile =
        TurnstileChallenge::new(Url::parse(&siteverify).unwrap(), "secret", "reused-token");

    let fetcher = ScriptedFetcher::default();
    let mut viewer = HeaderViewer::new(fetcher.clone(), DEFAULT_POLL_INTERVAL);
    assert!(viewer.verify(&mut turnstile).await.is_err());
    assert_eq!(viewer.gate(), GateState::Unverified);

    let mut prompt = PromptChallenge::with_operands(&b"12\n"[..], Vec::new(), 5, 7);
    viewer.verify(&mut prompt).await.unwrap();
    assert_eq!(viewer.gate(), GateState::Verified);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(fetcher.calls(), 1);
}
