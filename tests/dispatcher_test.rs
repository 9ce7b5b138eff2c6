use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use augur::consts::{
    BACKEND_ERROR, EMPTY_PROMPT_ALERT, ERROR_CATEGORIZATION, ERROR_SUMMARY, PROCESSING,
};
use augur::dispatcher::{PromptBody, RequestDispatcher};
use augur::error::DispatchError;
use augur::interrupt::until_interrupted;
use augur::surface::mock::{Record, RecordingSurface};

fn dispatcher_for(server: &MockServer) -> RequestDispatcher {
    RequestDispatcher::new(&format!("{}/analyze", server.uri())).unwrap()
}

#[tokio::test]
async fn success_renders_full_result_and_techniques() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"prompt": "email me new leads"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"summary": "ok", "techniques": ["A", "B"]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("email me new leads");
    let result = dispatcher_for(&server).dispatch(&surface).await.unwrap();

    assert_eq!(result.techniques(), json!(["A", "B"]));
    assert_eq!(
        surface.summary(),
        "{\n  \"summary\": \"ok\",\n  \"techniques\": [\n    \"A\",\n    \"B\"\n  ]\n}"
    );
    assert_eq!(surface.categorization(), "[\n  \"A\",\n  \"B\"\n]");
    assert!(surface.alerts().is_empty());
}

#[tokio::test]
async fn placeholders_are_written_before_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "ok"})))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("sync sheets to crm");
    dispatcher_for(&server).dispatch(&surface).await.unwrap();

    let writes = surface.writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[0], Record::Summary(PROCESSING.to_string()));
    assert_eq!(writes[1], Record::Categorization(PROCESSING.to_string()));
    assert_eq!(writes[3], Record::Categorization("[]".to_string()));
}

#[tokio::test]
async fn missing_techniques_render_as_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "ok"})))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("anything");
    dispatcher_for(&server).dispatch(&surface).await.unwrap();

    assert_eq!(surface.categorization(), "[]");
}

#[tokio::test]
async fn empty_prompt_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    for prompt in ["", "   ", "\n\t"] {
        let surface = RecordingSurface::with_regions(prompt, "last summary", "last categories");
        let err = dispatcher_for(&server).dispatch(&surface).await.unwrap_err();

        assert!(matches!(err, DispatchError::Validation(_)));
        assert_eq!(surface.alerts(), vec![EMPTY_PROMPT_ALERT]);
        assert_eq!(surface.summary(), "last summary");
        assert_eq!(surface.categorization(), "last categories");
    }
}

#[tokio::test]
async fn server_error_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "bad prompt"})))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("???");
    let err = dispatcher_for(&server).dispatch(&surface).await.unwrap_err();

    assert!(matches!(err, DispatchError::Server { status: 400, .. }));
    assert_eq!(surface.summary(), ERROR_SUMMARY);
    assert_eq!(surface.categorization(), ERROR_CATEGORIZATION);
    assert_eq!(surface.alerts(), vec!["bad prompt"]);
}

#[tokio::test]
async fn server_error_without_detail_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("hello");
    dispatcher_for(&server).dispatch(&surface).await.unwrap_err();

    assert_eq!(surface.alerts(), vec![BACKEND_ERROR]);
    assert_eq!(surface.summary(), ERROR_SUMMARY);
}

#[tokio::test]
async fn server_error_with_non_json_body_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("hello");
    dispatcher_for(&server).dispatch(&surface).await.unwrap_err();

    assert_eq!(surface.alerts(), vec![BACKEND_ERROR]);
}

#[tokio::test]
async fn malformed_success_body_goes_through_error_handler() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("hello");
    let err = dispatcher_for(&server).dispatch(&surface).await.unwrap_err();

    assert!(matches!(err, DispatchError::MalformedResponse(_)));
    assert_eq!(surface.summary(), ERROR_SUMMARY);
    assert_eq!(surface.categorization(), ERROR_CATEGORIZATION);
    assert_eq!(surface.alerts(), vec![err.to_string()]);
}

#[tokio::test]
async fn transport_failure_alerts_underlying_message() {
    // Bind then release a port so nothing is listening on it
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let dispatcher = RequestDispatcher::new(&format!("http://127.0.0.1:{port}/analyze")).unwrap();

    let surface = RecordingSurface::new("hello");
    let err = dispatcher.dispatch(&surface).await.unwrap_err();

    assert!(matches!(err, DispatchError::Transport(_)));
    assert_eq!(surface.summary(), ERROR_SUMMARY);
    assert_eq!(surface.categorization(), ERROR_CATEGORIZATION);
    let alerts = surface.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(!alerts[0].is_empty());
    assert_eq!(alerts[0], err.to_string());
}

#[tokio::test]
async fn trimmed_prompt_is_sent_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"prompt": "every monday at 9"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("  every monday at 9\n");
    dispatcher_for(&server).dispatch(&surface).await.unwrap();
}

#[tokio::test]
async fn raw_prompt_mode_sends_text_as_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"prompt": "  every monday at 9\n"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).with_prompt_body(PromptBody::Raw);
    let surface = RecordingSurface::new("  every monday at 9\n");
    dispatcher.dispatch(&surface).await.unwrap();
}

#[tokio::test]
async fn overlapping_triggers_both_proceed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"techniques": ["scheduling"]}))
                .set_delay(Duration::from_millis(50)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    let surface = RecordingSurface::new("run nightly backup");

    let (first, second) =
        futures::join!(dispatcher.dispatch(&surface), dispatcher.dispatch(&surface));

    assert!(first.is_ok());
    assert!(second.is_ok());
    // Two placeholder pairs and two result pairs, interleaved
    assert_eq!(surface.writes().len(), 8);
    assert_eq!(surface.categorization(), "[\n  \"scheduling\"\n]");
}

#[tokio::test]
async fn submit_has_no_display_side_effects() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_json(json!({"prompt": "  kept as is  "})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"techniques": []})))
        .mount(&server)
        .await;

    let result = dispatcher_for(&server).submit("  kept as is  ").await.unwrap();
    assert_eq!(result.categorization_text(), "[]");
}

#[tokio::test]
async fn interrupt_leaves_processing_placeholders() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"techniques": ["never shown"]}))
                .set_delay(Duration::from_secs(30)),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server);
    let surface = RecordingSurface::new("watch the inbox");

    let outcome = until_interrupted(
        dispatcher.dispatch(&surface),
        tokio::time::sleep(Duration::from_millis(100)),
    )
    .await;

    assert!(outcome.is_none());
    assert_eq!(surface.summary(), PROCESSING);
    assert_eq!(surface.categorization(), PROCESSING);
    assert!(surface.alerts().is_empty());
}

#[tokio::test]
async fn null_success_body_renders_literally() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    let surface = RecordingSurface::new("anything");
    dispatcher_for(&server).dispatch(&surface).await.unwrap();

    assert_eq!(surface.summary(), "null");
    assert_eq!(surface.categorization(), "[]");
}
