//! Drives a full session over the JSON-lines protocol.

use serde_json::{json, Value};
use session_lib::{
    adapters::{CannedAssistant, TokioScheduler},
    app::{run, Session},
    config::Config,
    error::SessionResult,
};
use std::sync::Arc;
use tokio::{
    io::{duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines},
    task::JoinHandle,
};

struct Harness {
    input: DuplexStream,
    output: Lines<BufReader<DuplexStream>>,
    driver: JoinHandle<SessionResult<()>>,
}

impl Harness {
    fn start() -> Self {
        Self::with_config(Config::default())
    }

    fn with_config(config: Config) -> Self {
        let session = Session::new(
            Arc::new(config),
            Arc::new(TokioScheduler::new()),
            Arc::new(CannedAssistant::new()),
        );
        let (input, driver_input) = duplex(64 * 1024);
        let (driver_output, output) = duplex(1024 * 1024);
        let driver = tokio::spawn(run(session, driver_input, driver_output));
        Self {
            input,
            output: BufReader::new(output).lines(),
            driver,
        }
    }

    /// Sends one raw line and collects events up to and including the snapshot.
    async fn send_raw(&mut self, line: &str) -> Vec<Value> {
        self.input.write_all(line.as_bytes()).await.unwrap();
        self.input.write_all(b"\n").await.unwrap();
        let mut events = Vec::new();
        while let Some(line) = self.output.next_line().await.unwrap() {
            let event: Value = serde_json::from_str(&line).unwrap();
            let done = event["type"] == "snapshot";
            events.push(event);
            if done {
                break;
            }
        }
        events
    }

    async fn send(&mut self, command: Value) -> Vec<Value> {
        self.send_raw(&command.to_string()).await
    }

    async fn snapshot(&mut self) -> Value {
        self.send(json!({"type": "snapshot"})).await.pop().unwrap()
    }

    async fn finish(self) {
        drop(self.input);
        self.driver.await.unwrap().unwrap();
    }
}

fn of_type<'a>(events: &'a [Value], kind: &str) -> Vec<&'a Value> {
    events.iter().filter(|e| e["type"] == kind).collect()
}

#[tokio::test(start_paused = true)]
async fn creating_a_profile_end_to_end() {
    let mut host = Harness::start();

    let seeded = host.snapshot().await;
    assert_eq!(seeded["profiles"].as_array().unwrap().len(), 1);
    assert_eq!(seeded["profiles"][0]["is_primary"], true);
    assert_eq!(seeded["messages"].as_array().unwrap().len(), 1);

    host.send(json!({"type": "add_profile"})).await;
    let rejected = host.send(json!({"type": "submit_profile"})).await;
    let form = &rejected.last().unwrap()["form"];
    assert_eq!(form["error"]["field"], "name");
    assert_eq!(form["in_flight"], false);

    let fixed = host
        .send(json!({"type": "edit_draft_field", "field": "name", "value": "Jane Roe"}))
        .await;
    assert!(fixed.last().unwrap()["form"]["error"].is_null());

    for (field, value) in [
        ("name", "Jane Roe"),
        ("gender", "female"),
        ("date_of_birth", "1992-03-04"),
        ("time_of_birth", "08:15"),
        ("place_of_birth", "Boston"),
    ] {
        host.send(json!({"type": "edit_draft_field", "field": field, "value": value}))
            .await;
    }
    let pending = host.send(json!({"type": "submit_profile"})).await;
    assert_eq!(pending.last().unwrap()["form"]["in_flight"], true);

    host.send(json!({"type": "wait", "millis": 1100})).await;
    let done = host.snapshot().await;
    let profiles = done["profiles"].as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[1]["name"], "Jane Roe");
    assert_eq!(profiles[1]["is_primary"], false);
    assert_eq!(done["form"]["is_open"], false);
    assert_eq!(done["notifications"][0]["title"], "Profile Created!");

    host.send(json!({"type": "wait", "millis": 5000})).await;
    let expired = host.snapshot().await;
    assert!(expired["notifications"].as_array().unwrap().is_empty());

    host.finish().await;
}

#[tokio::test(start_paused = true)]
async fn primary_profile_is_protected_and_errors_keep_the_session_alive() {
    let mut host = Harness::start();
    let primary = host.snapshot().await["profiles"][0]["id"].clone();

    let events = host
        .send(json!({"type": "delete_profile", "id": primary}))
        .await;
    assert_eq!(of_type(&events, "error").len(), 1);
    let snapshot = events.last().unwrap();
    assert_eq!(snapshot["profiles"].as_array().unwrap().len(), 1);
    assert_eq!(snapshot["notifications"][0]["title"], "Cannot Delete");
    assert_eq!(snapshot["notifications"][0]["severity"], "destructive");

    let toast = snapshot["notifications"][0]["id"].clone();
    host.send(json!({"type": "dismiss", "id": toast})).await;
    let events = host.send(json!({"type": "dismiss", "id": toast})).await;
    assert!(of_type(&events, "error").is_empty());
    assert!(events.last().unwrap()["notifications"]
        .as_array()
        .unwrap()
        .is_empty());

    let events = host.send_raw("{not json").await;
    assert_eq!(of_type(&events, "error").len(), 1);
    assert_eq!(of_type(&events, "snapshot").len(), 1);

    host.finish().await;
}

#[tokio::test(start_paused = true)]
async fn chat_reply_and_sign_out_navigation() {
    let mut host = Harness::start();

    host.send(json!({"type": "send_message", "content": "Tell me about Mercury"}))
        .await;
    let ignored = host.send(json!({"type": "send_message", "content": "hello?"})).await;
    assert_eq!(ignored.last().unwrap()["awaiting_reply"], true);

    host.send(json!({"type": "wait", "millis": 2100})).await;
    let snapshot = host.snapshot().await;
    let messages = snapshot["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1]["content"], "Tell me about Mercury");
    assert_eq!(messages[2]["is_from_user"], false);
    assert!(messages[0]["date_separator"].is_string());
    assert_eq!(snapshot["awaiting_reply"], false);

    host.send(json!({"type": "select_system", "system": "vedic"})).await;
    let toggled = host
        .send(json!({"type": "set_planetary_alerts", "enabled": true}))
        .await;
    assert_eq!(
        toggled.last().unwrap()["preferences"]["planetary_alerts"],
        true
    );
    let signing_out = host.send(json!({"type": "sign_out"})).await;
    assert_eq!(signing_out.last().unwrap()["is_signing_out"], true);
    assert_eq!(
        signing_out.last().unwrap()["preferences"]["astrology_system"],
        "vedic"
    );

    let events = host.send(json!({"type": "wait", "millis": 2000})).await;
    let navigate = of_type(&events, "navigate");
    assert_eq!(navigate.len(), 1);
    assert_eq!(navigate[0]["route"], "landing");
    assert_eq!(events.last().unwrap()["notifications"][0]["title"], "Signed Out");

    host.finish().await;
}

#[tokio::test(start_paused = true)]
async fn onboarding_flow_navigates_to_chat() {
    let mut host = Harness::with_config(Config {
        seed_demo_data: false,
        ..Config::default()
    });

    let events = host.send(json!({"type": "confirm_system"})).await;
    assert!(of_type(&events, "error").is_empty());
    assert_eq!(events.last().unwrap()["onboarding"]["is_saving_system"], false);

    host.send(json!({"type": "choose_system", "system": "vedic"})).await;
    let saving = host.send(json!({"type": "confirm_system"})).await;
    let onboarding = &saving.last().unwrap()["onboarding"];
    assert_eq!(onboarding["selected_system"], "vedic");
    assert_eq!(onboarding["is_saving_system"], true);

    let events = host.send(json!({"type": "wait", "millis": 1600})).await;
    let navigate = of_type(&events, "navigate");
    assert_eq!(navigate.len(), 1);
    assert_eq!(navigate[0]["route"], "profile_creation");
    assert_eq!(
        events.last().unwrap()["preferences"]["astrology_system"],
        "vedic"
    );

    let rejected = host.send(json!({"type": "submit_onboarding_profile"})).await;
    assert_eq!(
        rejected.last().unwrap()["onboarding"]["form"]["error"]["field"],
        "name"
    );

    for (field, value) in [
        ("name", "Priya"),
        ("gender", "female"),
        ("date_of_birth", "1995-08-20"),
        ("time_of_birth", "05:10"),
        ("place_of_birth", "Pune"),
    ] {
        host.send(json!({"type": "edit_onboarding_field", "field": field, "value": value}))
            .await;
    }
    host.send(json!({"type": "submit_onboarding_profile"})).await;

    let events = host.send(json!({"type": "wait", "millis": 2100})).await;
    let navigate = of_type(&events, "navigate");
    assert_eq!(navigate.len(), 1);
    assert_eq!(navigate[0]["route"], "chat");

    let own = &events.last().unwrap()["profiles"][0];
    assert_eq!(own["name"], "Priya");
    assert_eq!(own["is_primary"], true);
    assert_eq!(own["astrology_system"], "vedic");
    assert_eq!(own["birth_summary"], "August 20, 1995 at 05:10");

    host.finish().await;
}
