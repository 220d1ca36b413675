use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Generate batches of draft projects from one template and a CSV of substitution rows.",
	long_about = "remap copies a template draft project once per CSV row, rewrites the material \
	              references and text placeholders inside its documents according to a rule \
	              configuration, and saves each result as an independent project.\n\nEvery row \
	              resolves its materials through the override tree first (when the row names a \
	              replacement file), then the template material tree, and finally keeps the \
	              original reference. Failures are reported per row and never stop the batch."
)]
pub struct RemapCli {
	/// Template draft project directory (holds draft_meta_info.json and
	/// draft_info.json).
	pub template: PathBuf,

	/// CSV file with one row per project to generate. The `ProjectName`
	/// column names each output project.
	pub csv: PathBuf,

	/// Directory the generated projects are written into.
	pub output: PathBuf,

	/// Rule configuration document (JSON). Omit to run without rules: the
	/// documents pass through unchanged apart from nested-content
	/// normalization.
	#[arg(long, short)]
	pub rules: Option<PathBuf>,

	/// Root of the default template material tree, searched when a row has
	/// no override or the override cannot be found.
	#[arg(long)]
	pub template_materials: Option<PathBuf>,

	/// Root of the per-row override material tree, searched first when a
	/// row names a replacement file.
	#[arg(long)]
	pub change_materials: Option<PathBuf>,

	/// Process every row without writing any output.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Enable verbose output.
	#[arg(long, short, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, default_value_t = false)]
	pub no_color: bool,
}
