use blockc::{compile, DriverError, DriverOptions};
use blocklang::ElabConfig;
use clap::{arg, command, value_parser, Arg, ArgAction};
use std::fs;
use std::io::{self, Write};

fn main() -> miette::Result<()> {
	env_logger::init();

	let matches = command!()
		.arg(Arg::new("source").required(true).help("JSON description of the block"))
		.arg(Arg::new("output").short('o').long("output"))
		.arg(arg!(--debug "Attach source lines and loop variables to statements").action(ArgAction::SetTrue))
		.arg(
			arg!(--"capture-locals" "Attach host locals to every assignment")
				.action(ArgAction::SetTrue),
		)
		.arg(
			arg!(--"max-iterations" <N> "Maximum number of iterations of a single loop")
				.value_parser(value_parser!(usize))
				.required(false),
		)
		.arg(arg!(--strict "Reject blocks without a decoration").action(ArgAction::SetTrue))
		.get_matches();

	let mut elab = ElabConfig {
		debug: matches.get_flag("debug"),
		require_decoration: matches.get_flag("strict"),
		..ElabConfig::default()
	};
	if let Some(limit) = matches.get_one::<usize>("max-iterations") {
		elab.max_loop_iterations = *limit;
	}

	let options = DriverOptions {
		elab,
		capture_locals: matches.get_flag("capture-locals"),
	};

	let mut output: Box<dyn Write> = match matches.get_one::<String>("output") {
		None => Box::new(io::stdout()),
		Some(path) => Box::new(fs::File::create(path).map_err(DriverError::from)?),
	};

	let source = match matches.get_one::<String>("source") {
		Some(path) => fs::read_to_string(path).map_err(DriverError::from)?,
		None => unreachable!(),
	};

	compile(&source, &mut output, &options)
}
