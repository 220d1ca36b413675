use std::collections::HashMap;

use serde_json::Map;
use serde_json::Value;

use crate::RemapError;
use crate::RemapResult;
use crate::RuleConfig;
use crate::rules::Rule;
use crate::rules::compile_rules;

/// Read-only context threaded through one traversal. A fresh value is built
/// per [`Engine::process`] call and derived (never mutated in place) as the
/// walker descends, so recursion carries no shared state.
#[derive(Debug, Clone, Copy)]
pub struct TraversalContext<'a> {
	/// The object whose fields are currently being walked. Lookup rules read
	/// sibling fields (`extra_info`, `type`, …) from here.
	pub current_object: Option<&'a Map<String, Value>>,
	/// Placeholder/path key → resolved value for this row.
	pub material_map: &'a HashMap<String, String>,
	/// The raw CSV row for this cycle.
	pub csv_row: &'a HashMap<String, String>,
}

impl<'a> TraversalContext<'a> {
	fn with_object(self, object: &'a Map<String, Value>) -> Self {
		Self {
			current_object: Some(object),
			..self
		}
	}
}

/// The rule-driven document transformation engine. Built once from a
/// [`RuleConfig`] (compiling both rule lists), then reused across rows — the
/// compiled state is read-only.
#[derive(Debug)]
pub struct Engine {
	path_rules: Vec<Rule>,
	text_rules: Vec<Rule>,
	ignored_path_substrings: Vec<String>,
	content_keys: Vec<String>,
}

impl Engine {
	/// Compile the configured rules into an engine. Rules that fail to
	/// compile are dropped here with a warning and never run.
	pub fn new(config: &RuleConfig) -> Self {
		let path_rules = compile_rules(&config.path_rules);
		let text_rules = compile_rules(&config.text_rules);
		tracing::info!(
			path_rules = path_rules.len(),
			text_rules = text_rules.len(),
			"engine initialized"
		);

		Self {
			path_rules,
			text_rules,
			ignored_path_substrings: config.ignored_path_substrings.clone(),
			content_keys: config.content_keys.clone(),
		}
	}

	/// Walk the whole document and return a new transformed tree. The input
	/// is never mutated. An `Err` here means an unexpected processing
	/// failure, not a rule miss — rule-level problems always degrade to the
	/// unchanged value.
	pub fn process(
		&self,
		document: &Value,
		material_map: &HashMap<String, String>,
		csv_row: &HashMap<String, String>,
	) -> RemapResult<Value> {
		if !document.is_object() && !document.is_array() {
			tracing::warn!("input document is not an object or array, returning it unchanged");
			return Ok(document.clone());
		}

		let ctx = TraversalContext {
			current_object: None,
			material_map,
			csv_row,
		};
		self.process_node(document, ctx)
	}

	fn process_node<'a>(&self, node: &'a Value, ctx: TraversalContext<'a>) -> RemapResult<Value> {
		match node {
			Value::Object(object) => {
				let ctx = ctx.with_object(object);
				let mut processed = Map::new();
				for (key, value) in object {
					let new_value = match value {
						Value::String(text) => {
							let routed = self.process_path_value(key, text, &ctx);
							Value::String(self.process_text_value(key, &routed, &ctx)?)
						}
						Value::Object(_) | Value::Array(_) => self.process_node(value, ctx)?,
						other => other.clone(),
					};
					processed.insert(key.clone(), new_value);
				}
				Ok(Value::Object(processed))
			}
			Value::Array(items) => {
				// Arrays have no keys; only descendant object fields are rule
				// targets.
				let mut processed = Vec::with_capacity(items.len());
				for item in items {
					processed.push(self.process_node(item, ctx)?);
				}
				Ok(Value::Array(processed))
			}
			other => Ok(other.clone()),
		}
	}

	/// Route a string field through the path rules. The first rule that
	/// changes the value wins; system paths are never touched.
	fn process_path_value(&self, key: &str, value: &str, ctx: &TraversalContext<'_>) -> String {
		if self.is_ignored_path(value) {
			tracing::trace!(key, "skipping system path");
			return value.to_string();
		}

		for rule in &self.path_rules {
			if !rule.applies_to_key(key) {
				continue;
			}
			let new_value = rule.apply(value, ctx);
			if new_value != value {
				tracing::debug!(rule = %rule.id, key, "path rule applied");
				return new_value;
			}
		}

		value.to_string()
	}

	/// Route a (possibly already path-replaced) string field through the
	/// text rules, applying every matching rule cumulatively. Content-key
	/// fields holding nested JSON are recursed into first.
	fn process_text_value(
		&self,
		key: &str,
		value: &str,
		ctx: &TraversalContext<'_>,
	) -> RemapResult<String> {
		let mut current = self.process_content_value(key, value, ctx)?;

		for rule in &self.text_rules {
			if !rule.applies_to_key(key) {
				continue;
			}
			let new_value = rule.apply(&current, ctx);
			if new_value != current {
				tracing::debug!(rule = %rule.id, key, "text rule applied");
				current = new_value;
			}
		}

		Ok(current)
	}

	/// When `key` is a configured content key and the value looks like a
	/// serialized document, parse it, walk it with a derived context, and
	/// re-serialize compactly (no extra whitespace, field order preserved).
	/// Parse failures fall back to plain-text handling.
	fn process_content_value(
		&self,
		key: &str,
		value: &str,
		ctx: &TraversalContext<'_>,
	) -> RemapResult<String> {
		if !self.content_keys.iter().any(|content_key| content_key == key) {
			return Ok(value.to_string());
		}
		let trimmed = value.trim_start();
		if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
			return Ok(value.to_string());
		}

		let nested: Value = match serde_json::from_str(value) {
			Ok(nested) => nested,
			Err(_) => {
				tracing::debug!(key, "content value looks like JSON but failed to parse");
				return Ok(value.to_string());
			}
		};

		let processed = self.process_node(&nested, *ctx)?;
		serde_json::to_string(&processed).map_err(|e| RemapError::Engine(e.to_string()))
	}

	fn is_ignored_path(&self, value: &str) -> bool {
		self.ignored_path_substrings
			.iter()
			.any(|substring| value.contains(substring))
	}
}
