use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::RemapError;
use crate::RemapResult;

/// Schema version this engine understands. A configuration document carrying
/// a different `version` still loads, with a warning.
pub const CONFIG_SCHEMA_VERSION: &str = "1.0";

/// Priority assigned to rules that do not declare one. Lower values run
/// first, so undeclared rules sort last.
pub const DEFAULT_RULE_PRIORITY: i64 = 999;

/// Field name treated as nested-JSON content when no `json_content_keys` are
/// configured.
pub const DEFAULT_CONTENT_KEY: &str = "content";

fn default_rule_id() -> String {
	"unknown_rule".to_string()
}

fn default_priority() -> i64 {
	DEFAULT_RULE_PRIORITY
}

fn default_enabled() -> bool {
	true
}

/// One key-derivation step of a `material_map_lookup` rule.
///
/// ```json
/// { "method": "extra_info", "pattern": "^([a-zA-Z0-9_.-]+)\\." }
/// { "method": "field_value", "field": "material_name" }
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LookupMethodSpec {
	pub method: String,
	#[serde(default)]
	pub pattern: Option<String>,
	#[serde(default)]
	pub field: Option<String>,
}

/// The declarative form of a single rule entry, as it appears in the
/// configuration document. Compilation into an executable [`Rule`] happens
/// separately so that a broken entry can be dropped without failing the
/// whole load.
///
/// [`Rule`]: crate::rules::Rule
#[derive(Debug, Clone, Deserialize)]
pub struct RuleSpec {
	#[serde(default = "default_rule_id")]
	pub id: String,
	#[serde(default)]
	pub description: String,
	/// One of `material_map_lookup`, `regex`, `regex_placeholder`.
	#[serde(rename = "type")]
	pub kind: String,
	/// Keys this rule applies to. Empty matches nothing; `"*"` matches every
	/// key.
	#[serde(default)]
	pub target_keys: Vec<String>,
	#[serde(default = "default_priority")]
	pub priority: i64,
	#[serde(default = "default_enabled")]
	pub enabled: bool,
	/// `material_map_lookup` only: ordered key-derivation methods.
	#[serde(default)]
	pub lookup_methods: Vec<LookupMethodSpec>,
	/// `regex` and `regex_placeholder`: the match pattern.
	#[serde(default)]
	pub pattern: Option<String>,
	/// `regex` only: replacement template, `\1`-style backreferences allowed.
	#[serde(default)]
	pub replacement: Option<String>,
	/// `regex_placeholder` only: `material_map` or `csv_row_data`.
	#[serde(default)]
	pub source: Option<String>,
}

/// The normalized rule configuration: enabled-only rule lists in priority
/// order, ignore substrings, and the content keys eligible for nested-JSON
/// detection. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct RuleConfig {
	/// Path rules, ascending priority, disabled entries removed.
	pub path_rules: Vec<RuleSpec>,
	/// Text rules, ascending priority, disabled entries removed.
	pub text_rules: Vec<RuleSpec>,
	/// A string value containing any of these substrings is never touched by
	/// path rules.
	pub ignored_path_substrings: Vec<String>,
	/// Field names whose string values may hold a serialized nested document.
	pub content_keys: Vec<String>,
}

impl RuleConfig {
	/// The no-config mode: no rules, no ignore patterns, default content
	/// keys. The engine becomes a pass-through (plus nested-JSON
	/// re-serialization).
	pub fn empty() -> Self {
		Self {
			path_rules: Vec::new(),
			text_rules: Vec::new(),
			ignored_path_substrings: Vec::new(),
			content_keys: vec![DEFAULT_CONTENT_KEY.to_string()],
		}
	}

	/// Load and normalize a rule configuration from a JSON document on disk.
	pub fn load(path: &Path) -> RemapResult<Self> {
		if !path.is_file() {
			return Err(RemapError::ConfigNotFound(path.display().to_string()));
		}

		let content = std::fs::read_to_string(path)?;
		let document: Value =
			serde_json::from_str(&content).map_err(|e| RemapError::ConfigParse(e.to_string()))?;

		tracing::debug!(path = %path.display(), "loaded rule configuration");
		Self::from_value(&document)
	}

	/// Normalize an already-parsed configuration document.
	pub fn from_value(document: &Value) -> RemapResult<Self> {
		if !document.is_object() {
			return Err(RemapError::ConfigParse(
				"top level must be an object".to_string(),
			));
		}

		check_schema_version(document);

		let path_rules = normalize_rules(rule_specs(document, "path_rules")?);
		let text_rules = normalize_rules(rule_specs(document, "text_rules")?);
		let ignored_path_substrings = string_list(document, "system_paths_to_ignore")?;
		let content_keys = match document.get("json_content_keys") {
			None => vec![DEFAULT_CONTENT_KEY.to_string()],
			Some(_) => string_list(document, "json_content_keys")?,
		};

		tracing::debug!(
			path_rules = path_rules.len(),
			text_rules = text_rules.len(),
			"rule configuration normalized"
		);

		Ok(Self {
			path_rules,
			text_rules,
			ignored_path_substrings,
			content_keys,
		})
	}
}

fn check_schema_version(document: &Value) {
	let version = document
		.get("version")
		.and_then(Value::as_str)
		.unwrap_or(CONFIG_SCHEMA_VERSION);
	if version != CONFIG_SCHEMA_VERSION {
		tracing::warn!(
			found = version,
			expected = CONFIG_SCHEMA_VERSION,
			"configuration schema version mismatch, proceeding anyway"
		);
	}
}

/// Extract a list of rule specs from a top-level field. A missing field is an
/// empty list; a present non-list field is a configuration error. Entries
/// that are not objects, or fail to deserialize, are dropped with a warning
/// rather than failing the load.
fn rule_specs(document: &Value, field: &str) -> RemapResult<Vec<RuleSpec>> {
	let Some(value) = document.get(field) else {
		return Ok(Vec::new());
	};
	let Some(entries) = value.as_array() else {
		return Err(RemapError::ConfigFieldType(field.to_string()));
	};

	let mut specs = Vec::with_capacity(entries.len());
	for entry in entries {
		if !entry.is_object() {
			tracing::warn!(field, "dropping non-object rule entry");
			continue;
		}
		match serde_json::from_value::<RuleSpec>(entry.clone()) {
			Ok(spec) => specs.push(spec),
			Err(e) => {
				let id = entry.get("id").and_then(Value::as_str).unwrap_or("unknown_rule");
				tracing::warn!(field, id, error = %e, "dropping malformed rule entry");
			}
		}
	}

	Ok(specs)
}

/// Keep enabled entries only and sort by ascending priority. The sort is
/// stable, so rules sharing a priority keep their configured order.
fn normalize_rules(mut specs: Vec<RuleSpec>) -> Vec<RuleSpec> {
	specs.retain(|spec| spec.enabled);
	specs.sort_by_key(|spec| spec.priority);
	specs
}

fn string_list(document: &Value, field: &str) -> RemapResult<Vec<String>> {
	let Some(value) = document.get(field) else {
		return Ok(Vec::new());
	};
	let Some(entries) = value.as_array() else {
		return Err(RemapError::ConfigFieldType(field.to_string()));
	};

	Ok(entries
		.iter()
		.filter_map(|entry| {
			let text = entry.as_str();
			if text.is_none() {
				tracing::warn!(field, "dropping non-string entry");
			}
			text.map(str::to_string)
		})
		.collect())
}
