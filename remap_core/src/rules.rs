use std::path::Path;

use regex::Captures;
use regex::Regex;
use serde_json::Value;

use crate::LookupMethodSpec;
use crate::RuleError;
use crate::RuleSpec;
use crate::engine::TraversalContext;

/// Default pattern deriving a placeholder key from an `extra_info` sibling:
/// the leading run of word-ish characters before a literal dot, so
/// `img_01.png` derives `img_01`.
pub const DEFAULT_EXTRA_INFO_PATTERN: &str = r"^([a-zA-Z0-9_.-]+)\.";

/// One key-derivation step of a material-lookup rule, in compiled form.
/// Methods are tried in configured order; the first one whose derived key is
/// present in the material map wins.
#[derive(Debug, Clone)]
pub enum LookupMethod {
	/// Match the sibling `extra_info` field against an anchored pattern and
	/// use the first capture group.
	ExtraInfo { pattern: Regex },
	/// Use the filename of the value itself, without its extension.
	PathStem,
	/// Read a named sibling field verbatim.
	FieldValue { field: String },
	/// Like [`LookupMethod::PathStem`], but only when the current object also
	/// carries a non-empty `type` field.
	TypeAndStem,
}

/// Which context map a placeholder rule reads its replacement values from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderSource {
	MaterialMap,
	CsvRow,
}

impl PlaceholderSource {
	fn parse(name: &str) -> Result<Self, RuleError> {
		match name {
			"material_map" => Ok(Self::MaterialMap),
			"csv_row_data" => Ok(Self::CsvRow),
			other => Err(RuleError::UnknownSource(other.to_string())),
		}
	}

	/// The configuration-document name of this source.
	pub fn name(self) -> &'static str {
		match self {
			Self::MaterialMap => "material_map",
			Self::CsvRow => "csv_row_data",
		}
	}
}

/// The closed set of substitution strategies. Invalid parameters surface as
/// [`RuleError`] at compile time, so every constructed value is runnable.
#[derive(Debug, Clone)]
pub enum RuleKind {
	/// Replace the whole value with a material-map hit found through an
	/// ordered list of key derivations.
	MaterialLookup { methods: Vec<LookupMethod> },
	/// Global regex substitution with `\1`-style backreferences.
	/// `max_group` is the highest group the replacement template references.
	RegexSubstitute {
		pattern: Regex,
		replacement: String,
		max_group: usize,
	},
	/// Expand placeholders like `##key##` from a named context map, leaving
	/// unmatched placeholders verbatim.
	PlaceholderExpand {
		pattern: Regex,
		source: PlaceholderSource,
	},
}

/// A compiled rule: identity, key scope, ordering, and the strategy itself.
#[derive(Debug, Clone)]
pub struct Rule {
	pub id: String,
	pub target_keys: Vec<String>,
	pub priority: i64,
	pub kind: RuleKind,
}

impl Rule {
	/// Compile a declarative spec into a runnable rule. A spec with an
	/// unknown type, an unparsable pattern, or a missing required parameter
	/// fails here and is dropped by [`compile_rules`] — it never reaches the
	/// active lists.
	pub fn compile(spec: &RuleSpec) -> Result<Self, RuleError> {
		let kind = match spec.kind.as_str() {
			"material_map_lookup" => compile_lookup(spec)?,
			"regex" => compile_regex(spec)?,
			"regex_placeholder" => compile_placeholder(spec)?,
			other => return Err(RuleError::UnknownType(other.to_string())),
		};

		if spec.target_keys.is_empty() {
			tracing::warn!(id = %spec.id, "rule has no target keys and will never match");
		}

		Ok(Self {
			id: spec.id.clone(),
			target_keys: spec.target_keys.clone(),
			priority: spec.priority,
			kind,
		})
	}

	/// Whether this rule should run for a field with the given key.
	pub fn applies_to_key(&self, key: &str) -> bool {
		self.target_keys
			.iter()
			.any(|target| target == "*" || target == key)
	}

	/// Apply the rule to a string value. Total: a miss, an undefined group
	/// reference, or an absent context field all degrade to the input value.
	pub fn apply(&self, value: &str, ctx: &TraversalContext<'_>) -> String {
		match &self.kind {
			RuleKind::MaterialLookup { methods } => self.apply_lookup(methods, value, ctx),
			RuleKind::RegexSubstitute {
				pattern,
				replacement,
				max_group,
			} => self.apply_substitute(pattern, replacement, *max_group, value),
			RuleKind::PlaceholderExpand { pattern, source } => {
				self.apply_placeholder(pattern, *source, value, ctx)
			}
		}
	}

	fn apply_lookup(&self, methods: &[LookupMethod], value: &str, ctx: &TraversalContext<'_>) -> String {
		if value.is_empty() {
			return value.to_string();
		}
		if ctx.material_map.is_empty() {
			tracing::trace!(rule = %self.id, "material map is empty, skipping lookup");
			return value.to_string();
		}

		for method in methods {
			let Some(candidate) = derive_key(method, value, ctx) else {
				continue;
			};
			if let Some(found) = ctx.material_map.get(&candidate) {
				tracing::debug!(rule = %self.id, key = %candidate, "material map hit");
				return found.clone();
			}
			tracing::trace!(rule = %self.id, key = %candidate, "material map miss");
		}

		// The common outcome: this material has no override.
		value.to_string()
	}

	fn apply_substitute(
		&self,
		pattern: &Regex,
		replacement: &str,
		max_group: usize,
		value: &str,
	) -> String {
		// captures_len counts the implicit whole-match group 0.
		if max_group >= pattern.captures_len() {
			tracing::warn!(
				rule = %self.id,
				max_group,
				"replacement references an undefined capture group, leaving matches unchanged"
			);
			return value.to_string();
		}

		pattern.replace_all(value, replacement).into_owned()
	}

	fn apply_placeholder(
		&self,
		pattern: &Regex,
		source: PlaceholderSource,
		value: &str,
		ctx: &TraversalContext<'_>,
	) -> String {
		let source_map = match source {
			PlaceholderSource::MaterialMap => ctx.material_map,
			PlaceholderSource::CsvRow => ctx.csv_row,
		};

		pattern
			.replace_all(value, |caps: &Captures<'_>| {
				let whole = caps.get(0).map_or("", |m| m.as_str());
				let Some(key) = caps.get(1).map(|m| m.as_str().trim()) else {
					return whole.to_string();
				};
				match source_map.get(key) {
					Some(replacement) => replacement.clone(),
					None => {
						tracing::debug!(
							rule = %self.id,
							key,
							source = source.name(),
							"placeholder key not found, keeping original text"
						);
						whole.to_string()
					}
				}
			})
			.into_owned()
	}
}

/// Compile every spec in order, dropping the ones that fail with a warning.
/// The input is already priority-sorted, so the output order is the
/// evaluation order.
pub fn compile_rules(specs: &[RuleSpec]) -> Vec<Rule> {
	let mut rules = Vec::with_capacity(specs.len());
	for spec in specs {
		match Rule::compile(spec) {
			Ok(rule) => rules.push(rule),
			Err(e) => {
				tracing::warn!(id = %spec.id, kind = %spec.kind, error = %e, "dropping rule");
			}
		}
	}
	rules
}

fn compile_lookup(spec: &RuleSpec) -> Result<RuleKind, RuleError> {
	if spec.lookup_methods.is_empty() {
		tracing::warn!(id = %spec.id, "no lookup methods configured, rule will never change a value");
	}

	let mut methods = Vec::with_capacity(spec.lookup_methods.len());
	for method in &spec.lookup_methods {
		match compile_lookup_method(spec, method)? {
			Some(compiled) => methods.push(compiled),
			None => continue,
		}
	}

	Ok(RuleKind::MaterialLookup { methods })
}

fn compile_lookup_method(
	spec: &RuleSpec,
	method: &LookupMethodSpec,
) -> Result<Option<LookupMethod>, RuleError> {
	match method.method.as_str() {
		"extra_info" => {
			let pattern_str = method
				.pattern
				.as_deref()
				.filter(|p| !p.is_empty())
				.unwrap_or(DEFAULT_EXTRA_INFO_PATTERN);
			let pattern = Regex::new(pattern_str).map_err(|e| {
				RuleError::InvalidPattern {
					pattern: pattern_str.to_string(),
					reason: e.to_string(),
				}
			})?;
			Ok(Some(LookupMethod::ExtraInfo { pattern }))
		}
		"path_stem" => Ok(Some(LookupMethod::PathStem)),
		"field_value" => {
			let Some(field) = method.field.clone().filter(|f| !f.is_empty()) else {
				tracing::warn!(id = %spec.id, "`field` not specified for field_value method, skipping");
				return Ok(None);
			};
			Ok(Some(LookupMethod::FieldValue { field }))
		}
		"type_and_stem" => Ok(Some(LookupMethod::TypeAndStem)),
		other => {
			tracing::warn!(id = %spec.id, method = other, "unknown lookup method, skipping");
			Ok(None)
		}
	}
}

fn compile_regex(spec: &RuleSpec) -> Result<RuleKind, RuleError> {
	let pattern_str = spec
		.pattern
		.as_deref()
		.filter(|p| !p.is_empty())
		.ok_or(RuleError::MissingPattern)?;
	let pattern = Regex::new(pattern_str).map_err(|e| {
		RuleError::InvalidPattern {
			pattern: pattern_str.to_string(),
			reason: e.to_string(),
		}
	})?;

	let template = spec.replacement.as_deref().unwrap_or_default();
	let (replacement, max_group) = translate_backreferences(template);

	Ok(RuleKind::RegexSubstitute {
		pattern,
		replacement,
		max_group,
	})
}

fn compile_placeholder(spec: &RuleSpec) -> Result<RuleKind, RuleError> {
	let pattern_str = spec
		.pattern
		.as_deref()
		.filter(|p| !p.is_empty())
		.ok_or(RuleError::MissingPattern)?;
	let pattern = Regex::new(pattern_str).map_err(|e| {
		RuleError::InvalidPattern {
			pattern: pattern_str.to_string(),
			reason: e.to_string(),
		}
	})?;
	// Group 0 is the whole match; the placeholder key must come from an
	// explicit capture group.
	if pattern.captures_len() < 2 {
		return Err(RuleError::MissingCaptureGroup);
	}

	let source_name = spec
		.source
		.as_deref()
		.filter(|s| !s.is_empty())
		.ok_or(RuleError::MissingSource)?;
	let source = PlaceholderSource::parse(source_name)?;

	Ok(RuleKind::PlaceholderExpand { pattern, source })
}

/// Translate a `\1`-style replacement template into the regex crate's
/// `${1}` expansion syntax, escaping any literal `$`. Returns the translated
/// template and the highest group number it references.
fn translate_backreferences(template: &str) -> (String, usize) {
	let mut out = String::with_capacity(template.len());
	let mut max_group = 0;
	let mut chars = template.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'\\' => {
				let mut digits = String::new();
				while let Some(d) = chars.peek().copied() {
					if d.is_ascii_digit() {
						digits.push(d);
						chars.next();
					} else {
						break;
					}
				}
				if digits.is_empty() {
					// `\\` collapses to a literal backslash; any other escape
					// passes through unchanged.
					if chars.peek() == Some(&'\\') {
						chars.next();
					}
					out.push('\\');
				} else {
					max_group = max_group.max(digits.parse::<usize>().unwrap_or(0));
					out.push_str("${");
					out.push_str(&digits);
					out.push('}');
				}
			}
			'$' => out.push_str("$$"),
			_ => out.push(c),
		}
	}

	(out, max_group)
}

/// Run one derivation method against the value and its surrounding object.
fn derive_key(method: &LookupMethod, value: &str, ctx: &TraversalContext<'_>) -> Option<String> {
	match method {
		LookupMethod::ExtraInfo { pattern } => {
			let extra_info = ctx.current_object?.get("extra_info")?.as_str()?;
			let caps = pattern.captures(extra_info)?;
			// Anchored like the original's match-at-start semantics.
			if caps.get(0)?.start() != 0 {
				return None;
			}
			Some(caps.get(1)?.as_str().to_string())
		}
		LookupMethod::PathStem => path_stem(value),
		LookupMethod::FieldValue { field } => {
			let field_value = ctx.current_object?.get(field)?.as_str()?;
			(!field_value.is_empty()).then(|| field_value.to_string())
		}
		LookupMethod::TypeAndStem => {
			let has_type = ctx
				.current_object?
				.get("type")
				.and_then(Value::as_str)
				.is_some_and(|t| !t.is_empty());
			if !has_type {
				return None;
			}
			path_stem(value)
		}
	}
}

fn path_stem(value: &str) -> Option<String> {
	let stem = Path::new(value).file_stem()?.to_str()?;
	(!stem.is_empty()).then(|| stem.to_string())
}
