use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use nanometa::loader::ObjectGraph;
use nanometa::lowering::context::TablesContext;
use nanometa::lowering::filter::{ExcludedTypes, IgnoredAttributeSet};
use nanometa::raw::assembly::Assembly;
use nanometa::raw::pe::PEFile;
use nanometa::Error;

/// Lowers a compiled managed assembly into a compact binary image for the nano runtime.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
	/// Path to the compiled assembly (.dll/.exe) to lower.
	input: PathBuf,

	/// Path to write the lowered binary image to.
	#[arg(short, long)]
	output: PathBuf,

	/// Write a textual dump of the lowered tables to this path.
	#[arg(long)]
	dump: Option<PathBuf>,

	/// File of `Namespace.Name` lines naming types to drop outright.
	#[arg(long)]
	exclude: Option<PathBuf>,

	/// File of `Namespace.Name` lines giving an explicit type ordering.
	#[arg(long)]
	order: Option<PathBuf>,

	/// Sort each owner's attributes by full name descending before emission.
	#[arg(long)]
	compress_attributes: bool,

	/// Emit one native stub header per retained `InternalCall` method into this directory.
	#[arg(long)]
	native_stubs: Option<PathBuf>,

	/// Increase log verbosity (-v, -vv, -vvv).
	#[arg(short, long, action = clap::ArgAction::Count)]
	verbose: u8,
}

fn lines_of(path: &Option<PathBuf>) -> nanometa::Result<Vec<String>> {
	match path {
		Some(path) => Ok(fs::read_to_string(path)?.lines().map(str::to_owned).collect()),
		None => Ok(Vec::new()),
	}
}

fn run(cli: Cli) -> nanometa::Result<()> {
	let bytes = fs::read(&cli.input)?;
	let pe = PEFile::read(&bytes)?;
	let assembly = Assembly::try_from(pe).map_err(Error::Io)?;
	let graph = ObjectGraph::new(&assembly);

	let excluded = ExcludedTypes::from_lines(lines_of(&cli.exclude)?);
	let ignored_attributes = IgnoredAttributeSet::new();
	let explicit_order = lines_of(&cli.order)?;

	tracing::info!(type_defs = graph.type_defs().len(), "read assembly metadata");

	let mut context = TablesContext::build(&graph, &excluded, &ignored_attributes, &explicit_order)?;
	tracing::debug!(types = context.ordered_types.len(), "built tables context");

	context.complete_minimization();

	let image = nanometa::emit::emit(&context, cli.compress_attributes)?;
	fs::write(&cli.output, &image)?;
	tracing::info!(bytes = image.len(), path = %cli.output.display(), "wrote lowered image");

	if let Some(dump_path) = &cli.dump {
		let rendered = nanometa::dump::dump(&graph, &context);
		fs::write(dump_path, rendered)?;
		tracing::info!(path = %dump_path.display(), "wrote textual dump");
	}

	if let Some(dir) = &cli.native_stubs {
		nanometa::native_stubs::generate(&graph, &context.ordered_types, dir)?;
		tracing::info!(dir = %dir.display(), "wrote native stub headers");
	}

	Ok(())
}

fn main() -> ExitCode {
	let cli = Cli::parse();

	let level = match cli.verbose {
		0 => tracing::Level::WARN,
		1 => tracing::Level::INFO,
		2 => tracing::Level::DEBUG,
		_ => tracing::Level::TRACE,
	};
	tracing_subscriber::fmt().with_max_level(level).init();

	match run(cli) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			tracing::error!("{err}");
			ExitCode::from(err.exit_code() as u8)
		},
	}
}
