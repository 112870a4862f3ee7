// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use analytics_guard::{
	auth::{OperationName, SessionId},
	client::{ApiClientBuilder, ReqwestApiClient},
	config::{GateConfig, GateSettings},
	error::Error,
	gate::{AllowedProjects, Capability, CommandArguments, SafetyMode, ToolArguments},
	invoke::{
		AuditStatus, InvocationResult, Invoker, MemoryAuditSink, Operation, OperationRegistry, Outcome,
	},
	ratelimit::{RateLimiter, RateLimiterConfig},
	retry::RetryPolicy,
	url::Url,
};

const API_KEY: &str = "agent-key-7781";

fn client(server: &MockServer) -> Arc<ReqwestApiClient> {
	let limiter = RateLimiter::shared(RateLimiterConfig::concurrency_only(2))
		.expect("Concurrency-only limiter config should be valid.");
	let client = ApiClientBuilder::new(
		Url::parse(&server.base_url()).expect("Mock server URL should parse."),
	)
	.credential(API_KEY)
	.retry(RetryPolicy::disabled())
	.limiter(limiter)
	.build()
	.expect("Client should build against the mock server.");

	Arc::new(client)
}

fn name(raw: &str) -> OperationName {
	OperationName::new(raw).expect("Operation name fixture should be valid.")
}

fn registry(client: Arc<ReqwestApiClient>) -> OperationRegistry<ToolArguments> {
	let lister = client.clone();
	let list_spaces = Operation::new(
		name("list_spaces"),
		Capability::ReadOnly,
		move |args: ToolArguments| {
			let client = lister.clone();

			async move {
				let project = args.require_str("projectUuid")?.to_owned();
				let spaces: Vec<Value> =
					client.get_all(&format!("projects/{project}/spaces"), &[], None).await?;

				Ok::<_, Error>(json!(spaces))
			}
		},
	)
	.with_description("List spaces in a project.");
	let deleter = client;
	let delete_space = Operation::new(
		name("delete_space"),
		Capability::WriteDestructive,
		move |args: ToolArguments| {
			let client = deleter.clone();

			async move {
				let space = args.require_str("spaceUuid")?.to_owned();
				let _: Value = client.delete(&format!("spaces/{space}")).await?;

				Ok::<_, Error>(Value::String(format!("Deleted space {space}.")))
			}
		},
	);

	OperationRegistry::new()
		.with(list_spaces)
		.and_then(|registry| registry.with(delete_space))
		.expect("Registry fixture should build.")
}

fn args(value: Value) -> ToolArguments {
	ToolArguments::from_value(value).expect("Argument fixture should be an object.")
}

fn invoker(config: GateConfig) -> (Invoker, MemoryAuditSink) {
	let sink = MemoryAuditSink::default();
	let invoker = Invoker::new(config, Arc::new(sink.clone()));

	(invoker, sink)
}

#[tokio::test]
async fn read_only_session_blocks_delete_before_network() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/spaces/s1");
			then.status(200).body(json!({ "status": "ok", "results": null }).to_string());
		})
		.await;
	let registry = registry(client(&server));
	let (invoker, sink) = invoker(GateConfig::new().with_safety_mode(SafetyMode::ReadOnly));
	let result = registry
		.invoke(&invoker, "delete_space", args(json!({ "spaceUuid": "s1" })), None)
		.await;

	assert_eq!(result.outcome, Outcome::Blocked);
	assert!(result.is_error);

	mock.assert_calls_async(0).await;

	let entries = sink.entries();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].status, AuditStatus::Blocked);
	assert_eq!(entries[0].duration_ms, 0);
}

#[tokio::test]
async fn allow_list_blocks_foreign_project_and_names_it() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/projects/p2/spaces");
			then.status(200).body(json!({ "status": "ok", "results": { "data": [] } }).to_string());
		})
		.await;
	let registry = registry(client(&server));
	let config = GateConfig::new()
		.with_safety_mode(SafetyMode::WriteDestructive)
		.with_allowed_projects("p1".parse::<AllowedProjects>().expect("Allow-list should parse."));
	let (invoker, _) = invoker(config);
	let result = registry
		.invoke(&invoker, "list_spaces", args(json!({ "projectUuid": "p2" })), None)
		.await;

	assert_eq!(result.outcome, Outcome::Blocked);
	assert!(result.content.contains("p2"));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn allowed_read_runs_through_pipeline_and_is_audited() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/v1/projects/p1/spaces")
				.query_param("page", "1")
				.header("authorization", format!("ApiKey {API_KEY}"));
			then.status(200).body(
				json!({
					"status": "ok",
					"results": { "data": [{ "uuid": "s1", "name": "Sales" }] },
				})
				.to_string(),
			);
		})
		.await;
	let registry = registry(client(&server));
	let session = SessionId::new("session-it").expect("Session fixture should be valid.");
	let config = GateConfig::new()
		.with_allowed_projects("p1,p3".parse::<AllowedProjects>().expect("Allow-list should parse."))
		.with_session_id(session.clone());
	let (invoker, sink) = invoker(config);
	let result = registry
		.invoke(&invoker, "list_spaces", args(json!({ "projectUuid": "p1" })), None)
		.await;

	assert_eq!(result.outcome, Outcome::Success);
	assert!(result.content.contains("Sales"));

	mock.assert_calls_async(1).await;

	let entries = sink.entries();

	assert_eq!(entries.len(), 1);
	assert_eq!(entries[0].session_id, session);
	assert_eq!(entries[0].operation.as_ref(), "list_spaces");
	assert_eq!(entries[0].project_ids, vec!["p1"]);
	assert_eq!(entries[0].status, AuditStatus::Success);
}

#[tokio::test]
async fn dry_run_never_reaches_the_api() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/spaces/s1");
			then.status(200).body(json!({ "status": "ok", "results": null }).to_string());
		})
		.await;
	let registry = registry(client(&server));
	let settings: GateSettings =
		serde_json::from_value(json!({ "safetyMode": "write-destructive", "dryRun": true }))
			.expect("Settings should deserialize.");
	let (invoker, sink) =
		invoker(GateConfig::from_settings(&settings).expect("Settings should resolve."));
	let result = registry
		.invoke(&invoker, "delete_space", args(json!({ "spaceUuid": "s1" })), None)
		.await;

	assert_eq!(result.outcome, Outcome::DryRun);
	assert!(result.content.contains("No changes were made"));

	mock.assert_calls_async(0).await;

	assert!(sink.is_empty());
	assert_eq!(invoker.metrics().dry_runs(), 1);
}

#[tokio::test]
async fn remote_failures_are_sanitized() {
	let server = MockServer::start_async().await;
	let _mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/spaces/s9");
			then.status(404).body(
				json!({
					"status": "error",
					"error": {
						"name": "NotFoundError",
						"statusCode": 404,
						"message": format!("Space s9 not found for key {API_KEY}\nretry never"),
					},
				})
				.to_string(),
			);
		})
		.await;
	let registry = registry(client(&server));
	let (invoker, sink) =
		invoker(GateConfig::new().with_safety_mode(SafetyMode::WriteDestructive));
	let invoker = invoker.with_redacted_secret(API_KEY);
	let result = registry
		.invoke(&invoker, "delete_space", args(json!({ "spaceUuid": "s9" })), None)
		.await;

	assert_eq!(result.outcome, Outcome::Error);
	assert!(result.is_error);
	assert!(!result.content.contains(API_KEY));
	assert!(!result.content.contains('\n'));
	assert!(result.content.starts_with("API error 404"));
	assert_eq!(sink.entries()[0].status, AuditStatus::Error);
}

#[tokio::test]
async fn bound_registry_hides_writes_and_unknown_names_error() {
	let server = MockServer::start_async().await;
	let registry = registry(client(&server)).bind(SafetyMode::ReadOnly);
	let listed = registry.exposed().map(|op| op.name().to_string()).collect::<Vec<_>>();

	assert_eq!(listed, vec!["list_spaces"]);
	assert!(registry.get("delete_space").is_none());

	let (invoker, sink) = invoker(GateConfig::new());
	let result = registry
		.invoke(&invoker, "delete_space", args(json!({ "spaceUuid": "s1" })), None)
		.await;

	assert_eq!(
		result,
		InvocationResult::error("Operation `delete_space` is not registered."),
	);
	assert!(sink.is_empty());
	assert_eq!(
		serde_json::to_value(&result).expect("Result should serialize."),
		json!({ "content": "Operation `delete_space` is not registered.", "isError": true }),
	);
}

#[tokio::test]
async fn command_surface_blocks_foreign_project_like_tool_surface() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/v1/spaces/s1");
			then.status(200).body(json!({ "status": "ok", "results": null }).to_string());
		})
		.await;
	let client = client(&server);
	let delete_space = Operation::new(
		name("delete_space"),
		Capability::WriteDestructive,
		move |args: CommandArguments| {
			let client = client.clone();

			async move {
				let space = args
					.positional(0)
					.ok_or_else(|| Error::invalid_arguments("space id is required"))?
					.to_owned();
				let _: Value = client.delete(&format!("spaces/{space}")).await?;

				Ok::<_, Error>(Value::String(format!("Deleted space {space}.")))
			}
		},
	);
	let registry = OperationRegistry::new().with(delete_space).expect("Registry fixture should build.");
	let config = GateConfig::new()
		.with_safety_mode(SafetyMode::WriteDestructive)
		.with_allowed_projects("p1".parse::<AllowedProjects>().expect("Allow-list should parse."));
	let (invoker, sink) = invoker(config);
	let blocked = registry
		.invoke(
			&invoker,
			"delete_space",
			CommandArguments(vec![json!("s1"), json!({ "projectUuid": "p2" })]),
			None,
		)
		.await;

	assert_eq!(blocked.outcome, Outcome::Blocked);
	assert!(blocked.content.contains("p2"));

	mock.assert_calls_async(0).await;

	let allowed = registry
		.invoke(
			&invoker,
			"delete_space",
			CommandArguments(vec![json!("s1"), json!({ "projectUuids": ["p1"] })]),
			None,
		)
		.await;

	assert_eq!(allowed, InvocationResult::success("Deleted space s1."));

	mock.assert_calls_async(1).await;

	let entries = sink.entries();

	assert_eq!(entries.len(), 2);
	assert_eq!(entries[0].status, AuditStatus::Blocked);
	assert_eq!(entries[0].project_ids, vec!["p2"]);
	assert_eq!(entries[1].status, AuditStatus::Success);
	assert_eq!(entries[1].project_ids, vec!["p1"]);
}
