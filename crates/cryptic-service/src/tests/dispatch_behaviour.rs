//! Behavioural tests for envelope dispatch and call correlation.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use cryptic_wire::{Frame, Payload, Tag};

use crate::dispatch::Dispatcher;
use crate::handle::{CallError, ServiceHandle};
use crate::pending::PendingCalls;
use crate::registry::{RegistryBuilder, ValueKind};

const CALL_TIMEOUT: Duration = Duration::from_secs(30);
const USER: &str = "0f7c1a2b-3c4d-4e5f-8a9b-0c1d2e3f4a5b";

struct OutboundCall {
    service: String,
    tag: Tag,
    task: Option<JoinHandle<Result<Payload, CallError>>>,
    outcome: Option<Result<Payload, CallError>>,
}

struct DispatchWorld {
    runtime: Runtime,
    builder: RegistryBuilder,
    dispatcher: Option<Dispatcher>,
    pending: Arc<PendingCalls>,
    handle: ServiceHandle,
    outbound: mpsc::Receiver<Frame>,
    request_tag: Option<Tag>,
    reply: Option<Frame>,
    calls: Vec<OutboundCall>,
}

impl DispatchWorld {
    fn new() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .start_paused(true)
            .build()
            .expect("build paused runtime");
        let (sender, outbound) = mpsc::channel(16);
        let pending = Arc::new(PendingCalls::new());
        let handle = ServiceHandle::new(sender, Arc::clone(&pending), CALL_TIMEOUT);
        Self {
            runtime,
            builder: RegistryBuilder::new(),
            dispatcher: None,
            pending,
            handle,
            outbound,
            request_tag: None,
            reply: None,
            calls: Vec::new(),
        }
    }

    /// Freezes the registry on first use.
    fn dispatcher(&mut self) -> Dispatcher {
        if let Some(dispatcher) = &self.dispatcher {
            return dispatcher.clone();
        }
        let builder = std::mem::take(&mut self.builder);
        let dispatcher = Dispatcher::new(
            Arc::new(builder.build()),
            Arc::clone(&self.pending),
            self.handle.clone(),
        );
        self.dispatcher = Some(dispatcher.clone());
        dispatcher
    }

    fn deliver(&mut self, bytes: &[u8]) -> Option<Frame> {
        let dispatcher = self.dispatcher();
        self.runtime.block_on(dispatcher.dispatch(bytes))
    }

    fn reply_data(&self) -> &Payload {
        self.reply
            .as_ref()
            .and_then(Frame::data)
            .expect("reply with data")
    }
}

#[fixture]
fn world() -> RefCell<DispatchWorld> {
    RefCell::new(DispatchWorld::new())
}

#[given("a service with a user endpoint \"{endpoint}\" answering \"{key}\"")]
fn given_user_endpoint(world: &RefCell<DispatchWorld>, endpoint: String, key: String) {
    world
        .borrow_mut()
        .builder
        .register_user_endpoint(vec![endpoint], &[], &[], move |_invocation| {
            let key = key.clone();
            async move { Ok(Payload::from_iter([(key, Value::Bool(true))])) }
        })
        .expect("register user endpoint");
}

#[given("the service requires key \"{key}\" as a string on \"{endpoint}\"")]
fn given_required_key(world: &RefCell<DispatchWorld>, key: String, endpoint: String) {
    world
        .borrow_mut()
        .builder
        .register_user_endpoint(
            vec![endpoint],
            &[key.as_str()],
            &[ValueKind::String],
            |invocation| async move { Ok(invocation.into_parts().0) },
        )
        .expect("register guarded endpoint");
}

#[when("the hub delivers a user request for \"{endpoint}\"")]
fn when_user_request(world: &RefCell<DispatchWorld>, endpoint: String) {
    let mut world = world.borrow_mut();
    let tag = Tag::fresh();
    let raw = json!({
        "tag": tag.to_string(),
        "user": USER,
        "data": {},
        "endpoint": [endpoint],
    })
    .to_string();
    let reply = world.deliver(raw.as_bytes());
    world.request_tag = Some(tag);
    world.reply = reply;
}

#[when("the hub delivers the bytes \"{bytes}\"")]
fn when_raw_bytes(world: &RefCell<DispatchWorld>, bytes: String) {
    let mut world = world.borrow_mut();
    let reply = world.deliver(bytes.as_bytes());
    world.reply = reply;
}

#[when("the service calls \"{service}\" at \"{endpoint}\"")]
fn when_service_calls(world: &RefCell<DispatchWorld>, service: String, endpoint: String) {
    let world = &mut *world.borrow_mut();
    let handle = world.handle.clone();
    let task = world.runtime.spawn({
        let service = service.clone();
        async move {
            handle
                .call_microservice(&service, vec![endpoint], Payload::new())
                .await
        }
    });
    let frame = world
        .runtime
        .block_on(world.outbound.recv())
        .expect("call frame");
    let tag = frame.tag().expect("call frame carries a tag");
    world.calls.push(OutboundCall {
        service,
        tag,
        task: Some(task),
        outcome: None,
    });
}

#[when("{seconds} seconds elapse")]
fn when_time_passes(world: &RefCell<DispatchWorld>, seconds: u64) {
    world.borrow().runtime.block_on(async {
        tokio::time::advance(Duration::from_secs(seconds)).await;
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
    });
}

#[when("the hub answers the calls in reverse order")]
fn when_hub_answers_in_reverse(world: &RefCell<DispatchWorld>) {
    let world = &mut *world.borrow_mut();
    let answers: Vec<String> = world
        .calls
        .iter()
        .rev()
        .map(|call| {
            json!({"tag": call.tag.to_string(), "data": {"answer": call.service}}).to_string()
        })
        .collect();
    for answer in answers {
        assert!(
            world.deliver(answer.as_bytes()).is_none(),
            "responses are never answered"
        );
    }
    for call in &mut world.calls {
        let task = call.task.take().expect("call task");
        call.outcome = Some(world.runtime.block_on(task).expect("join call"));
    }
}

#[then("the reply carries the request tag")]
fn then_reply_tagged(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    let reply = world.reply.as_ref().expect("reply frame");
    assert_eq!(reply.tag(), world.request_tag);
}

#[then("the reply data has \"{key}\" set to true")]
fn then_reply_flag(world: &RefCell<DispatchWorld>, key: String) {
    assert_eq!(world.borrow().reply_data().get(&key), Some(&Value::Bool(true)));
}

#[then("the reply data is the error \"{code}\"")]
fn then_reply_error(world: &RefCell<DispatchWorld>, code: String) {
    assert_eq!(
        Value::Object(world.borrow().reply_data().clone()),
        json!({"error": code})
    );
}

#[then("a tagless notice \"{code}\" is sent")]
fn then_tagless_notice(world: &RefCell<DispatchWorld>, code: String) {
    let world = world.borrow();
    let reply = world.reply.as_ref().expect("notice frame");
    assert_eq!(
        serde_json::to_value(reply).expect("encode notice"),
        json!({"error": code})
    );
}

#[then("the call is still pending")]
fn then_call_pending(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    let call = world.calls.first().expect("issued call");
    let task = call.task.as_ref().expect("call task");
    assert!(!task.is_finished(), "call resolved early");
    assert!(world.pending.contains(&call.tag));
}

#[then("the call reports no response")]
fn then_call_times_out(world: &RefCell<DispatchWorld>) {
    let world = &mut *world.borrow_mut();
    let call = world.calls.first_mut().expect("issued call");
    let task = call.task.take().expect("call task");
    let outcome = world.runtime.block_on(task).expect("join call");
    match outcome {
        Err(CallError::NoResponse { tag, waited }) => {
            assert_eq!(tag, call.tag);
            assert_eq!(waited, CALL_TIMEOUT);
        }
        other => panic!("expected no response, got {other:?}"),
    }
    assert_eq!(world.pending.len(), 0);
}

#[then("a late response for the call is discarded")]
fn then_late_response_discarded(world: &RefCell<DispatchWorld>) {
    let mut world = world.borrow_mut();
    let tag = world.calls.first().expect("issued call").tag;
    let late = json!({"tag": tag.to_string(), "data": {"late": true}}).to_string();
    assert!(world.deliver(late.as_bytes()).is_none());
    assert_eq!(world.pending.len(), 0);
}

#[then("each call receives its own response")]
fn then_calls_matched(world: &RefCell<DispatchWorld>) {
    let world = world.borrow();
    assert_eq!(world.calls.len(), 2);
    for call in &world.calls {
        let outcome = call.outcome.as_ref().expect("call outcome");
        let data = outcome.as_ref().expect("call answered");
        assert_eq!(data.get("answer"), Some(&json!(call.service)));
    }
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "A user request is answered with the handler result"
)]
fn user_request_answered(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "A request for an unregistered path is an unknown service"
)]
fn unregistered_path(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "A request without its required keys is rejected"
)]
fn missing_keys(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "Bytes that are not a JSON object get a notice"
)]
fn unsupported_bytes(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "An outbound call without a response times out"
)]
fn call_times_out(world: RefCell<DispatchWorld>) {
    drop(world);
}

#[scenario(
    path = "tests/features/envelope_dispatch.feature",
    name = "Concurrent calls resolve independently of arrival order"
)]
fn calls_resolve_out_of_order(world: RefCell<DispatchWorld>) {
    drop(world);
}
