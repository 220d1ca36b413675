use std::path::Path;

use serde_json::Value;
use serde_json::json;

fn write_json(path: &Path, document: &Value) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dirs: {e}"));
	}
	let payload =
		serde_json::to_string_pretty(document).unwrap_or_else(|e| panic!("serialize: {e}"));
	std::fs::write(path, payload).unwrap_or_else(|e| panic!("write: {e}"));
}

fn touch(path: &Path) {
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dirs: {e}"));
	}
	std::fs::write(path, b"").unwrap_or_else(|e| panic!("touch: {e}"));
}

/// Lay out the batch fixture under `root`: a template draft project at
/// `Template/`, the default material tree at `TemplateMaterial/`, and a rule
/// configuration at `rules.json`.
pub fn setup_workspace(root: &Path) {
	write_json(
		&root.join("Template").join("draft_meta_info.json"),
		&json!({
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
						}
					]
				}
			]
		}),
	);
	write_json(
		&root.join("Template").join("draft_info.json"),
		&json!({
			"materials": {
				"videos": [
					{
						"id": "v1",
						"path": "C:/CapCut/Projects/SummerTemplate/image/beach.png",
						"extra_info": "img_01.png",
						"type": "photo"
					}
				]
			},
			"texts": [
				{ "id": "t1", "content": "{\"text\":\"##title##\"}" }
			]
		}),
	);
	touch(
		&root
			.join("TemplateMaterial")
			.join("SummerTemplate")
			.join("image")
			.join("beach.png"),
	);
	write_json(
		&root.join("rules.json"),
		&json!({
			"version": "1.0",
			"path_rules": [
				{
					"id": "material_paths",
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
					"type": "regex_placeholder",
					"target_keys": ["*"],
					"priority": 20,
					"pattern": "##([a-zA-Z0-9_]+)##",
					"source": "csv_row_data"
				}
			]
		}),
	);
}
