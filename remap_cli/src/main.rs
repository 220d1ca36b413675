use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use remap_cli::RemapCli;
use remap_core::AnyResult;
use remap_core::DraftProject;
use remap_core::Engine;
use remap_core::MaterialResolver;
use remap_core::PROJECT_NAME_COLUMN;
use remap_core::RuleConfig;
use remap_core::copy_template_project;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = RemapCli::parse();

	// Respect NO_COLOR, --no-color, and non-terminal output.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stdout).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	init_tracing(args.verbose);

	match run(&args) {
		Ok(0) => {}
		Ok(failed) => {
			eprintln!("{} {failed} row(s) failed", colored!("error:", red));
			process::exit(1);
		}
		Err(e) => {
			// Render through miette for rich diagnostics with help text and
			// error codes.
			match e.downcast::<remap_core::RemapError>() {
				Ok(remap_err) => {
					let report: miette::Report = (*remap_err).into();
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(2);
		}
	}
}

fn init_tracing(verbose: bool) {
	let default_filter = if verbose {
		"remap=debug,remap_core=debug"
	} else {
		"warn"
	};
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
		)
		.with_writer(std::io::stderr)
		.init();
}

/// Run the whole batch and return how many rows failed.
fn run(args: &RemapCli) -> AnyResult<usize> {
	let config = match &args.rules {
		Some(path) => RuleConfig::load(path)?,
		None => RuleConfig::empty(),
	};
	let engine = Engine::new(&config);

	let mut reader = csv::Reader::from_path(&args.csv)?;
	let headers = reader.headers()?.clone();

	let mut generated = 0usize;
	let mut failed = 0usize;

	for (index, record) in reader.records().enumerate() {
		let row_label = format!("row_{}", index + 1);
		let record = match record {
			Ok(record) => record,
			Err(e) => {
				eprintln!("{} {row_label}: {e}", colored!("error:", red));
				failed += 1;
				continue;
			}
		};

		let row: HashMap<String, String> = headers
			.iter()
			.map(str::to_string)
			.zip(record.iter().map(str::to_string))
			.collect();
		let project_name = row
			.get(PROJECT_NAME_COLUMN)
			.filter(|name| !name.is_empty())
			.cloned()
			.unwrap_or(row_label);

		match process_row(args, &engine, &row, &project_name) {
			Ok(Some(target)) => {
				generated += 1;
				println!(
					"{} {project_name} -> {}",
					colored!("ok:", green),
					target.display()
				);
			}
			Ok(None) => {
				generated += 1;
				println!("{} {project_name} (not written)", colored!("ok:", green));
			}
			Err(e) => {
				failed += 1;
				eprintln!("{} {project_name}: {e}", colored!("error:", red));
			}
		}
	}

	println!();
	if args.dry_run {
		println!(
			"{}",
			colored!(
				format!("Dry run: processed {generated} row(s), {failed} failed, nothing written."),
				bold
			)
		);
	} else {
		println!(
			"{}",
			colored!(
				format!(
					"Generated {generated} project(s) in {}, {failed} failed.",
					args.output.display()
				),
				bold
			)
		);
	}

	Ok(failed)
}

/// Run one CSV row through the resolve/transform/save cycle. Returns the
/// generated project directory, or `None` in dry-run mode.
fn process_row(
	args: &RemapCli,
	engine: &Engine,
	row: &HashMap<String, String>,
	project_name: &str,
) -> AnyResult<Option<PathBuf>> {
	if args.dry_run {
		let mut project = DraftProject::open(&args.template)?;
		let resolver = resolver_for(args, &project);
		project.apply_row(engine, &resolver, row)?;
		return Ok(None);
	}

	let target = copy_template_project(&args.template, &args.output, project_name)?;
	let mut project = DraftProject::open(&target)?;
	let resolver = resolver_for(args, &project);
	project.set_project_name(project_name);
	project.apply_row(engine, &resolver, row)?;
	project.save()?;

	Ok(Some(target))
}

fn resolver_for(args: &RemapCli, project: &DraftProject) -> MaterialResolver {
	MaterialResolver::new(
		args.template_materials.as_deref(),
		args.change_materials.as_deref(),
		project.template_name(),
	)
}
