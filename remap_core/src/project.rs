use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

use serde_json::Value;

use crate::Engine;
use crate::MaterialResolver;
use crate::RemapError;
use crate::RemapResult;
use crate::resolver::DeclaredMaterial;
use crate::resolver::sanitize_project_name;

/// Metadata document of a draft project: name, declared materials, original
/// folder path.
pub const META_INFO_FILE: &str = "draft_meta_info.json";

/// Timeline document of a draft project.
pub const DRAFT_INFO_FILE: &str = "draft_info.json";

const UNKNOWN_TEMPLATE: &str = "UnknownTemplate";

/// A generated draft project directory holding the two documents the engine
/// rewrites. Both are loaded eagerly; [`DraftProject::save`] writes them
/// back.
#[derive(Debug)]
pub struct DraftProject {
	root: PathBuf,
	/// The parsed metadata document.
	pub meta: Value,
	/// The parsed timeline document.
	pub draft: Value,
	template_name: String,
}

impl DraftProject {
	/// Open a project directory, failing when the directory or either
	/// document is missing or not valid JSON.
	pub fn open(root: &Path) -> RemapResult<Self> {
		if !root.is_dir() {
			return Err(RemapError::ProjectNotFound(root.display().to_string()));
		}

		let meta = read_document(root, META_INFO_FILE)?;
		let draft = read_document(root, DRAFT_INFO_FILE)?;
		let template_name = extract_template_name(&meta);
		tracing::debug!(root = %root.display(), template = %template_name, "opened draft project");

		Ok(Self {
			root: root.to_path_buf(),
			meta,
			draft,
			template_name,
		})
	}

	/// Directory name of the project itself.
	pub fn name(&self) -> String {
		self.root
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_default()
	}

	/// Name of the template project this draft was generated from, extracted
	/// from the meta document's `draft_fold_path`.
	pub fn template_name(&self) -> &str {
		&self.template_name
	}

	/// Rewrite the draft's display name in the meta document. Returns false
	/// (logged) when the document carries no `draft_name` field.
	pub fn set_project_name(&mut self, name: &str) -> bool {
		match self.meta.get_mut("draft_name") {
			Some(slot) => {
				*slot = Value::String(name.to_string());
				true
			}
			None => {
				tracing::warn!("cannot rename project, `draft_name` not found in meta document");
				false
			}
		}
	}

	/// Extract the materials declared by the meta document's type-0
	/// `draft_materials` groups. Entries carrying neither a placeholder nor
	/// an original path are skipped.
	pub fn declared_materials(&self) -> Vec<DeclaredMaterial> {
		let mut materials = Vec::new();
		let Some(groups) = self.meta.get("draft_materials").and_then(Value::as_array) else {
			return materials;
		};

		for group in groups {
			if group.get("type").and_then(Value::as_i64) != Some(0) {
				continue;
			}
			let Some(entries) = group.get("value").and_then(Value::as_array) else {
				continue;
			};
			for entry in entries {
				let material = DeclaredMaterial {
					path: string_field(entry, "file_Path"),
					extra_info: string_field(entry, "extra_info"),
					material_type: string_field(entry, "type"),
				};
				if material.path.is_empty() && material.placeholder_key().is_none() {
					tracing::warn!(
						id = %string_field(entry, "id"),
						"skipping material with no placeholder and no original path"
					);
					continue;
				}
				materials.push(material);
			}
		}

		materials
	}

	/// Apply one CSV row: build the material map from the declared materials
	/// and rewrite both documents through the engine.
	pub fn apply_row(
		&mut self,
		engine: &Engine,
		resolver: &MaterialResolver,
		csv_row: &HashMap<String, String>,
	) -> RemapResult<()> {
		let materials = self.declared_materials();
		let fallback_name = self.name();
		let material_map = resolver.build_material_map(&materials, csv_row, &fallback_name);
		if material_map.is_empty() {
			tracing::warn!(project = %fallback_name, "material map is empty, no replacements possible");
		}

		self.meta = engine.process(&self.meta, &material_map, csv_row)?;
		self.draft = engine.process(&self.draft, &material_map, csv_row)?;
		Ok(())
	}

	/// Write both documents back to the project directory, pretty-printed.
	pub fn save(&self) -> RemapResult<()> {
		write_document(&self.root.join(META_INFO_FILE), &self.meta)?;
		write_document(&self.root.join(DRAFT_INFO_FILE), &self.draft)?;
		tracing::debug!(root = %self.root.display(), "saved draft project");
		Ok(())
	}
}

/// Copy a template project directory to `<output_base>/<sanitized name>`,
/// replacing any existing target directory.
pub fn copy_template_project(
	template: &Path,
	output_base: &Path,
	project_name: &str,
) -> RemapResult<PathBuf> {
	if !template.is_dir() {
		return Err(RemapError::ProjectNotFound(template.display().to_string()));
	}

	let target = output_base.join(sanitize_project_name(project_name));
	std::fs::create_dir_all(output_base)?;
	if target.exists() {
		tracing::warn!(path = %target.display(), "output project directory exists, replacing");
		std::fs::remove_dir_all(&target)?;
	}
	copy_dir_recursive(template, &target)?;
	tracing::info!(path = %target.display(), "copied template project");

	Ok(target)
}

fn copy_dir_recursive(from: &Path, to: &Path) -> std::io::Result<()> {
	std::fs::create_dir_all(to)?;
	for entry in std::fs::read_dir(from)? {
		let entry = entry?;
		let target = to.join(entry.file_name());
		if entry.file_type()?.is_dir() {
			copy_dir_recursive(&entry.path(), &target)?;
		} else {
			std::fs::copy(entry.path(), &target)?;
		}
	}
	Ok(())
}

fn read_document(root: &Path, name: &str) -> RemapResult<Value> {
	let path = root.join(name);
	if !path.is_file() {
		return Err(RemapError::MissingDocument {
			name: name.to_string(),
			project: root.display().to_string(),
		});
	}

	let content = std::fs::read_to_string(&path)?;
	serde_json::from_str(&content).map_err(|e| {
		RemapError::DocumentParse {
			path: path.display().to_string(),
			reason: e.to_string(),
		}
	})
}

fn write_document(path: &Path, document: &Value) -> RemapResult<()> {
	let payload =
		serde_json::to_string_pretty(document).map_err(|e| RemapError::Engine(e.to_string()))?;
	std::fs::write(path, payload)?;
	Ok(())
}

/// The file name component of `draft_fold_path`, tolerating both separator
/// styles since the documents may come from another platform.
fn extract_template_name(meta: &Value) -> String {
	let folder = meta
		.get("draft_fold_path")
		.and_then(Value::as_str)
		.unwrap_or("");
	if folder.is_empty() {
		tracing::warn!("`draft_fold_path` missing or empty in meta document");
		return UNKNOWN_TEMPLATE.to_string();
	}

	let name = folder
		.trim_end_matches(['/', '\\'])
		.rsplit(['/', '\\'])
		.next()
		.unwrap_or("");
	if name.is_empty() {
		tracing::warn!("could not extract a template name from `draft_fold_path`");
		UNKNOWN_TEMPLATE.to_string()
	} else {
		name.to_string()
	}
}

fn string_field(entry: &Value, field: &str) -> String {
	entry
		.get(field)
		.and_then(Value::as_str)
		.unwrap_or_default()
		.to_string()
}
