//! Per-surface extraction of project identifiers from call arguments.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Argument key holding a single project identifier.
pub const PROJECT_KEY: &str = "projectUuid";
/// Argument key holding a list of project identifiers.
pub const PROJECTS_KEY: &str = "projectUuids";

/// Arguments that can name the projects a call touches.
pub trait ArgumentBag
where
	Self: Send,
{
	/// Project identifiers referenced by the arguments, deduplicated, in first-seen order.
	fn project_ids(&self) -> Vec<String>;
}
impl ArgumentBag for () {
	fn project_ids(&self) -> Vec<String> {
		Vec::new()
	}
}

/// Keyed arguments of the agent-tool surface.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ToolArguments(pub Map<String, Value>);
impl ToolArguments {
	/// Wraps a JSON value; anything but an object is rejected.
	pub fn from_value(value: Value) -> Result<Self> {
		match value {
			Value::Object(map) => Ok(Self(map)),
			Value::Null => Ok(Self::default()),
			other => Err(Error::invalid_arguments(format!(
				"expected an object of arguments, got {}",
				json_kind(&other)
			))),
		}
	}

	/// Raw value for `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// String value for `key`, if present and a string.
	pub fn str_arg(&self, key: &str) -> Option<&str> {
		self.0.get(key).and_then(Value::as_str)
	}

	/// String value for `key`, or an invalid-arguments error naming it.
	pub fn require_str(&self, key: &str) -> Result<&str> {
		self.str_arg(key).ok_or_else(|| Error::invalid_arguments(format!("`{key}` is required")))
	}
}
impl ArgumentBag for ToolArguments {
	fn project_ids(&self) -> Vec<String> {
		let mut ids = Vec::new();

		collect_keyed(&self.0, &mut ids);

		ids
	}
}

/// Arguments of the command surface: positional values followed by keyed option objects.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandArguments(pub Vec<Value>);
impl CommandArguments {
	/// Positional string argument at `index`.
	pub fn positional(&self, index: usize) -> Option<&str> {
		self.0.get(index).and_then(Value::as_str)
	}

	/// First keyed option named `key` across all option objects.
	pub fn option(&self, key: &str) -> Option<&Value> {
		self.0.iter().filter_map(Value::as_object).find_map(|options| options.get(key))
	}
}
impl ArgumentBag for CommandArguments {
	fn project_ids(&self) -> Vec<String> {
		let mut ids = Vec::new();

		for options in self.0.iter().filter_map(Value::as_object) {
			collect_keyed(options, &mut ids);
		}

		ids
	}
}

// Either key may hold a string or a list; any other non-null shape is kept as its JSON text
// so the allow-list still sees it.
fn collect_keyed(map: &Map<String, Value>, ids: &mut Vec<String>) {
	for key in [PROJECT_KEY, PROJECTS_KEY] {
		if let Some(value) = map.get(key) {
			collect_value(value, ids);
		}
	}
}

fn collect_value(value: &Value, ids: &mut Vec<String>) {
	let id = match value {
		Value::Null => return,
		Value::Array(items) => {
			for item in items {
				collect_value(item, ids);
			}

			return;
		},
		Value::String(id) => id.to_owned(),
		other => other.to_string(),
	};

	if !ids.contains(&id) {
		ids.push(id);
	}
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn tool_arguments_merge_single_and_list() {
		let args = ToolArguments::from_value(serde_json::json!({
			"projectUuid": "p1",
			"projectUuids": ["p2", "p1", "p3"],
			"name": "Sales",
		}))
		.expect("Object arguments should be accepted.");

		assert_eq!(args.project_ids(), vec!["p1", "p2", "p3"]);
		assert_eq!(args.require_str("name").expect("Name should be present."), "Sales");
		assert!(args.require_str("missing").is_err());
	}

	#[test]
	fn malformed_project_fields_are_still_extracted() {
		let ids = |value: Value| {
			ToolArguments::from_value(value).expect("Object arguments should be accepted.").project_ids()
		};

		assert_eq!(ids(serde_json::json!({ "projectUuids": "p2" })), vec!["p2"]);
		assert_eq!(ids(serde_json::json!({ "projectUuid": 42 })), vec!["42"]);
		assert_eq!(ids(serde_json::json!({ "projectUuid": ["p2"] })), vec!["p2"]);
		assert_eq!(ids(serde_json::json!({ "projectUuids": ["p1", 7, [true]] })), vec!["p1", "7", "true"]);
		assert_eq!(
			ids(serde_json::json!({ "projectUuid": { "id": "p3" } })),
			vec![r#"{"id":"p3"}"#],
		);
		assert!(ids(serde_json::json!({ "projectUuid": null, "projectUuids": [] })).is_empty());
	}

	#[test]
	fn tool_arguments_reject_non_objects() {
		assert!(ToolArguments::from_value(serde_json::json!(["p1"])).is_err());
		assert!(
			ToolArguments::from_value(Value::Null).expect("Null means no arguments.").project_ids().is_empty()
		);
	}

	#[test]
	fn command_arguments_scan_option_objects_only() {
		let args = CommandArguments(vec![
			serde_json::json!("p-positional"),
			serde_json::json!({ "projectUuid": "p9", "format": "json" }),
			serde_json::json!({ "projectUuids": ["p8", "p9"] }),
		]);

		assert_eq!(args.project_ids(), vec!["p9", "p8"]);
		assert_eq!(args.positional(0), Some("p-positional"));
		assert_eq!(args.option("format"), Some(&serde_json::json!("json")));
	}
}
