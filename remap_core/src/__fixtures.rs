use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use serde_json::json;

use crate::resolver::DeclaredMaterial;

/// Build a CSV-row-like map from literal pairs.
pub fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
	pairs
		.iter()
		.map(|(key, value)| ((*key).to_string(), (*value).to_string()))
		.collect()
}

/// Deserialize a rule spec from an inline configuration entry.
pub fn rule_spec(entry: Value) -> crate::RuleSpec {
	serde_json::from_value(entry).unwrap_or_else(|e| panic!("rule spec: {e}"))
}

/// Write `document` to `path` pretty-printed, creating parent directories.
pub fn write_json(path: &Path, document: &Value) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dirs: {e}"));
	}
	let payload =
		serde_json::to_string_pretty(document).unwrap_or_else(|e| panic!("serialize: {e}"));
	std::fs::write(path, payload).unwrap_or_else(|e| panic!("write: {e}"));
}

/// Create an empty file at `path`, creating parent directories.
pub fn touch(path: &Path) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dirs: {e}"));
	}
	std::fs::write(path, b"").unwrap_or_else(|e| panic!("touch: {e}"));
}

/// The image material declared by [`meta_document`].
pub fn beach_material() -> DeclaredMaterial {
	DeclaredMaterial {
		path: "C:/CapCut/Projects/SummerTemplate/image/beach.png".to_string(),
		extra_info: "img_01.png".to_string(),
		material_type: "photo".to_string(),
	}
}

/// The audio material declared by [`meta_document`].
pub fn theme_material() -> DeclaredMaterial {
	DeclaredMaterial {
		path: "C:/CapCut/Projects/SummerTemplate/audio/theme.mp3".to_string(),
		extra_info: "bgm_01.mp3".to_string(),
		material_type: "music".to_string(),
	}
}

/// A rule configuration exercising all three rule types: material lookup on
/// path-ish keys, and placeholder expansion from the CSV row everywhere.
pub fn full_config_document() -> Value {
	json!({
		"version": "1.0",
		"path_rules": [
			{
				"id": "material_paths",
				"description": "Replace material references through the material map",
				"type": "material_map_lookup",
				"target_keys": ["file_Path", "path"],
				"priority": 10,
				"lookup_methods": [
					{ "method": "extra_info" },
					{ "method": "path_stem" }
				]
			}
		],
		"text_rules": [
			{
				"id": "csv_placeholders",
				"description": "Expand ##key## placeholders from the CSV row",
				"type": "regex_placeholder",
				"target_keys": ["*"],
				"priority": 20,
				"pattern": "##([a-zA-Z0-9_]+)##",
				"source": "csv_row_data"
			}
		],
		"system_paths_to_ignore": ["/Applications/", "C:\\Windows\\"],
		"json_content_keys": ["content"]
	})
}

/// A metadata document declaring two type-0 materials (an image and a
/// background track) plus a non-material group that must be ignored.
pub fn meta_document() -> Value {
	json!({
		"draft_fold_path": "C:/CapCut/Projects/SummerTemplate",
		"draft_name": "SummerTemplate",
		"draft_materials": [
			{
				"type": 0,
				"value": [
					{
						"id": "m1",
						"file_Path": "C:/CapCut/Projects/SummerTemplate/image/beach.png",
						"extra_info": "img_01.png",
						"type": "photo"
					},
					{
						"id": "m2",
						"file_Path": "C:/CapCut/Projects/SummerTemplate/audio/theme.mp3",
						"extra_info": "bgm_01.mp3",
						"type": "music"
					}
				]
			},
			{
				"type": 1,
				"value": [
					{ "id": "x1", "file_Path": "C:/CapCut/cache/preview.bin" }
				]
			}
		]
	})
}

/// A timeline document referencing the same materials as [`meta_document`],
/// plus a text node whose `content` holds a serialized nested document.
pub fn draft_document() -> Value {
	json!({
		"materials": {
			"videos": [
				{
					"id": "v1",
					"path": "C:/CapCut/Projects/SummerTemplate/image/beach.png",
					"extra_info": "img_01.png",
					"type": "photo"
				}
			],
			"audios": [
				{
					"id": "a1",
					"path": "C:/CapCut/Projects/SummerTemplate/audio/theme.mp3",
					"extra_info": "bgm_01.mp3",
					"type": "music"
				}
			]
		},
		"texts": [
			{ "id": "t1", "content": "{\"text\":\"##title##\"}" }
		]
	})
}
