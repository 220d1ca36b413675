use std::collections::HashMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

/// CSV column naming the output project for a row. Also the column excluded
/// from plain-text substitution entries.
pub const PROJECT_NAME_COLUMN: &str = "ProjectName";

/// Placeholder-key prefix → logical material type. Several prefixes map to
/// the same logical type (all the audio-ish ones).
pub const MATERIAL_TYPE_PREFIXES: [(&str, &str); 7] = [
	("img", "image"),
	("photo", "photo"),
	("video", "video"),
	("bgm", "audio"),
	("se", "audio"),
	("voice", "audio"),
	("music", "music"),
];

/// Recognized material subdirectory names inside a project tree. A declared
/// material type outside this list does not drive the template search.
pub const MATERIAL_SUBFOLDERS: [&str; 15] = [
	"video",
	"audio",
	"image",
	"text",
	"effect",
	"sticker",
	"filter",
	"transition",
	"font",
	"music",
	"photo",
	"img",
	"bgm",
	"se",
	"voice",
];

/// Logical types that can be recognized from an original path's parent
/// directory name.
const LOGICAL_TYPES: [&str; 3] = ["image", "video", "audio"];

/// Change-tree subdirectories addressable directly by a placeholder's first
/// `_`-separated segment.
const CHANGE_SUBDIRS: [&str; 5] = ["bgm", "img", "se", "video", "voice"];

/// One material declared by the meta document: an original file reference
/// plus the `extra_info` its placeholder key derives from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclaredMaterial {
	/// Original file reference as it appears in the document.
	pub path: String,
	/// Raw `extra_info` value, e.g. `img_01.png`.
	pub extra_info: String,
	/// Declared material type, when present (e.g. `photo`).
	pub material_type: String,
}

impl DeclaredMaterial {
	/// The placeholder key: everything before the first `.` of `extra_info`.
	pub fn placeholder_key(&self) -> Option<&str> {
		let key = self.extra_info.split('.').next().unwrap_or("");
		(!key.is_empty()).then_some(key)
	}
}

/// Decides, for each declared material, which concrete file replaces it:
/// change tree (CSV override) → template tree → the original reference.
/// Filesystem probes are the only I/O this type performs.
#[derive(Debug)]
pub struct MaterialResolver {
	template_project_dir: Option<PathBuf>,
	change_base: Option<PathBuf>,
}

impl MaterialResolver {
	/// `template_material_base` is the root of the default asset tree; when
	/// its own directory name already equals the template project name it is
	/// used directly instead of appending the name again.
	pub fn new(
		template_material_base: Option<&Path>,
		change_material_base: Option<&Path>,
		template_project_name: &str,
	) -> Self {
		let template_project_dir = template_material_base.map(|base| {
			if base
				.file_name()
				.is_some_and(|name| name == template_project_name)
			{
				base.to_path_buf()
			} else {
				base.join(template_project_name)
			}
		});
		if template_project_dir.is_none() {
			tracing::warn!("template material base not provided, template tree searches disabled");
		}

		Self {
			template_project_dir,
			change_base: change_material_base.map(Path::to_path_buf),
		}
	}

	/// Build the material map for one CSV row. Every declared material
	/// resolves through the fallback chain; unresolvable materials keep (or
	/// fall back to) their original reference and never abort the pass.
	/// Non-material CSV columns register as plain text substitutions.
	pub fn build_material_map(
		&self,
		materials: &[DeclaredMaterial],
		csv_row: &HashMap<String, String>,
		fallback_project_name: &str,
	) -> HashMap<String, String> {
		let project_name = csv_row
			.get(PROJECT_NAME_COLUMN)
			.map(String::as_str)
			.filter(|name| !name.is_empty())
			.unwrap_or(fallback_project_name);
		tracing::debug!(project = project_name, "building material map");

		let mut map = HashMap::new();
		let mut processed: HashSet<&str> = HashSet::new();

		for material in materials {
			let placeholder = material.placeholder_key();
			let register_key = placeholder.unwrap_or(material.path.as_str());
			if register_key.is_empty() {
				tracing::warn!("skipping material with no placeholder and no original path");
				continue;
			}
			if let Some(placeholder) = placeholder {
				if !processed.insert(placeholder) {
					tracing::debug!(placeholder, "placeholder already resolved, skipping duplicate");
					continue;
				}
			}

			let (final_value, source) = self.resolve(material, csv_row, project_name);
			if final_value.is_empty() {
				tracing::warn!(key = register_key, "material resolved to nothing, not registered");
				continue;
			}
			tracing::debug!(key = register_key, value = %final_value, source, "material resolved");

			map.insert(register_key.to_string(), final_value.clone());
			if !material.path.is_empty() && material.path != register_key {
				map.insert(material.path.clone(), final_value);
			}
		}

		for (key, value) in csv_row {
			if is_material_column(key)
				|| key.eq_ignore_ascii_case(PROJECT_NAME_COLUMN)
				|| value.is_empty()
			{
				continue;
			}
			if map.contains_key(key) {
				// A placeholder can coincide with a text column name; the
				// material entry wins.
				tracing::warn!(key, "text column shadowed by a material entry");
				continue;
			}
			map.insert(key.clone(), value.clone());
		}

		tracing::info!(entries = map.len(), "material map built");
		map
	}

	/// The ordered fallback chain for one material. Returns the final value
	/// and a label describing where it came from.
	fn resolve(
		&self,
		material: &DeclaredMaterial,
		csv_row: &HashMap<String, String>,
		project_name: &str,
	) -> (String, &'static str) {
		let placeholder = material.placeholder_key();
		let csv_override = placeholder
			.and_then(|key| csv_row.get(key))
			.map(String::as_str)
			.filter(|name| !name.is_empty());

		let logical_type = logical_type(material, placeholder);
		let change_subdir = placeholder.and_then(change_subdir);

		if logical_type.is_none() && change_subdir.is_none() {
			tracing::warn!(
				extra_info = %material.extra_info,
				path = %material.path,
				"could not determine a material type, keeping original path"
			);
			return (material.path.clone(), "original (type unknown)");
		}

		if let Some(csv_filename) = csv_override {
			if let Some(subdir) = change_subdir {
				if let Some(found) = self.find_change_material(csv_filename, project_name, subdir) {
					return (found.display().to_string(), "change material");
				}
				tracing::debug!(
					csv_filename,
					subdir,
					"override not found in change tree, falling back to template tree"
				);
			} else {
				tracing::debug!(
					csv_filename,
					"no change subdirectory derivable from placeholder, falling back to template tree"
				);
			}
			return self.resolve_from_template(material, logical_type, "template material (fallback)");
		}

		self.resolve_from_template(material, logical_type, "template material")
	}

	fn resolve_from_template(
		&self,
		material: &DeclaredMaterial,
		logical_type: Option<&'static str>,
		source: &'static str,
	) -> (String, &'static str) {
		let filename = Path::new(&material.path)
			.file_name()
			.and_then(|name| name.to_str())
			.filter(|name| !name.is_empty());

		if let (Some(logical_type), Some(filename)) = (logical_type, filename) {
			if let Some(found) = self.find_template_material(filename, logical_type) {
				return (found.display().to_string(), source);
			}
			tracing::debug!(filename, "not found in template tree, keeping original path");
		} else {
			tracing::warn!(
				path = %material.path,
				"cannot search template tree without a type and an original filename"
			);
		}

		(material.path.clone(), "original")
	}

	/// Probe `change_base/<project>/<subdir>/<filename>`.
	fn find_change_material(
		&self,
		csv_filename: &str,
		project_name: &str,
		subdir: &str,
	) -> Option<PathBuf> {
		let base = self.change_base.as_ref()?;
		if csv_filename.is_empty() || project_name.is_empty() {
			return None;
		}

		let candidate = base
			.join(sanitize_project_name(project_name))
			.join(subdir)
			.join(csv_filename);
		if candidate.is_file() {
			tracing::debug!(path = %candidate.display(), "found change material");
			Some(candidate)
		} else {
			None
		}
	}

	/// Probe the template project tree under every alias directory of the
	/// logical type; first exact filename hit wins.
	fn find_template_material(&self, filename: &str, logical_type: &str) -> Option<PathBuf> {
		let project_dir = self.template_project_dir.as_ref()?;
		if !project_dir.is_dir() {
			tracing::warn!(
				path = %project_dir.display(),
				"template project directory does not exist"
			);
			return None;
		}

		let fallback = [logical_type];
		let aliases: &[&str] = match logical_type {
			"image" => &["image", "photo", "img"],
			"video" => &["video"],
			"audio" => &["audio", "music", "bgm", "se", "voice"],
			_ => &fallback,
		};

		for alias in aliases {
			let candidate = project_dir.join(alias).join(filename);
			if candidate.is_file() {
				tracing::debug!(path = %candidate.display(), "found template material");
				return Some(candidate);
			}
		}

		None
	}
}

/// Determine a material's logical type: placeholder prefix table first, then
/// the declared type when it names a known subfolder, then the original
/// path's parent directory when it names a logical type.
fn logical_type(material: &DeclaredMaterial, placeholder: Option<&str>) -> Option<&'static str> {
	if let Some(placeholder) = placeholder {
		for (prefix, logical) in MATERIAL_TYPE_PREFIXES {
			if placeholder
				.strip_prefix(prefix)
				.is_some_and(|rest| rest.starts_with('_'))
			{
				return Some(logical);
			}
		}
	}

	if !material.material_type.is_empty() {
		if let Some(known) = MATERIAL_SUBFOLDERS
			.iter()
			.find(|subfolder| **subfolder == material.material_type)
		{
			return Some(*known);
		}
	}

	let parent = Path::new(&material.path)
		.parent()
		.and_then(Path::file_name)
		.and_then(|name| name.to_str());
	if let Some(parent) = parent {
		if let Some(known) = LOGICAL_TYPES.iter().find(|logical| **logical == parent) {
			return Some(*known);
		}
	}

	None
}

fn change_subdir(placeholder: &str) -> Option<&'static str> {
	let prefix = placeholder.split('_').next()?;
	CHANGE_SUBDIRS
		.iter()
		.find(|subdir| **subdir == prefix)
		.copied()
}

fn is_material_column(key: &str) -> bool {
	MATERIAL_TYPE_PREFIXES.iter().any(|(prefix, _)| {
		key.strip_prefix(prefix)
			.is_some_and(|rest| rest.starts_with('_'))
	})
}

/// Replace anything outside alphanumerics, `_` and `-` so the name is safe
/// as a directory component.
pub fn sanitize_project_name(name: &str) -> String {
	name.chars()
		.map(|c| {
			if c.is_alphanumeric() || c == '_' || c == '-' {
				c
			} else {
				'_'
			}
		})
		.collect()
}
