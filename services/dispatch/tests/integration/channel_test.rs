use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courier_dispatch::domain::repository::ChannelGateway;
use courier_dispatch::domain::types::ChannelError;
use courier_dispatch::infra::channel::{ChannelSettings, HttpChannelGateway};
use courier_dispatch::infra::retry::{RetryPolicy, Sleeper};

const TOKEN: &str = "test-access-token";

#[derive(Clone, Default)]
struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        self.slept.lock().unwrap().push(duration);
        std::future::ready(())
    }
}

fn settings(api_base: &str, token: Option<&str>) -> ChannelSettings {
    ChannelSettings {
        api_base: api_base.to_owned(),
        access_token: token.map(str::to_owned),
        push_target: Some("Uoperator".into()),
        timeout: Duration::from_secs(5),
    }
}

fn gateway(server: &MockServer, sleeper: &RecordingSleeper) -> HttpChannelGateway<RecordingSleeper> {
    HttpChannelGateway::new(settings(&server.uri(), Some(TOKEN)), RetryPolicy::default())
        .unwrap()
        .with_sleeper(sleeper.clone())
}

// ── HttpChannelGateway ───────────────────────────────────────────────────────

#[tokio::test]
async fn should_push_text_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/push"))
        .and(header("authorization", "Bearer test-access-token"))
        .and(body_json(json!({
            "to": "Uoperator",
            "messages": [{"type": "text", "text": "Sale\n\n50% off"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::default();

    gateway(&server, &sleeper)
        .push_message("Sale", "50% off", &CancellationToken::new())
        .await
        .unwrap();

    assert!(sleeper.slept.lock().unwrap().is_empty());
}

#[tokio::test]
async fn should_retry_with_doubling_backoff_until_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .respond_with(ResponseTemplate::new(500).set_body_string("try later"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/reply"))
        .and(body_json(json!({
            "replyToken": "rt-1",
            "messages": [{"type": "text", "text": "welcome"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::default();

    gateway(&server, &sleeper)
        .reply("rt-1", "welcome", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        *sleeper.slept.lock().unwrap(),
        vec![Duration::from_secs(1), Duration::from_secs(2)]
    );
}

#[tokio::test]
async fn should_surface_provider_error_after_last_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/broadcast"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(3)
        .mount(&server)
        .await;
    let sleeper = RecordingSleeper::default();

    let result = gateway(&server, &sleeper)
        .broadcast("hello all", &CancellationToken::new())
        .await;

    assert_eq!(
        result,
        Err(ChannelError::Provider {
            status: 503,
            body: "unavailable".into(),
        })
    );
    assert_eq!(sleeper.slept.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn should_send_multicast_targets() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/bot/message/multicast"))
        .and(body_json(json!({
            "to": ["U1", "U2"],
            "messages": [{"type": "text", "text": "hi"}]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    gateway(&server, &RecordingSleeper::default())
        .multicast(&["U1".into(), "U2".into()], "hi", &CancellationToken::new())
        .await
        .unwrap();
}

#[tokio::test]
async fn should_skip_calls_without_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let gateway = HttpChannelGateway::new(settings(&server.uri(), None), RetryPolicy::default())
        .unwrap();
    let cancel = CancellationToken::new();

    gateway.push_text("hi", &cancel).await.unwrap();
    gateway.reply("rt", "hi", &cancel).await.unwrap();
    gateway.broadcast("hi", &cancel).await.unwrap();
    gateway.multicast(&["U1".into()], "hi", &cancel).await.unwrap();
}

#[tokio::test]
async fn should_return_cancelled_when_token_fires_mid_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let result = gateway(&server, &RecordingSleeper::default())
        .push_text("slow", &cancel)
        .await;

    assert_eq!(result, Err(ChannelError::Cancelled));
}
