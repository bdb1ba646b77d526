use blockc::{compile, DriverOptions};
use blocklang::syntax::TreeBuilder;
use blocklang::ElabConfig;
use rstest::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn run_blockc(input_path: &Path, options: &DriverOptions) -> miette::Result<NamedTempFile> {
	let src = std::fs::read_to_string(input_path).expect("failed to read block description");
	let mut tmpfile = NamedTempFile::new().unwrap();
	compile(&src, &mut tmpfile, options)?;
	Ok(tmpfile)
}

fn read_output(file: &NamedTempFile) -> String {
	let mut text = String::new();
	file.reopen().unwrap().read_to_string(&mut text).unwrap();
	text
}

fn compile_str(src: &str, options: &DriverOptions) -> miette::Result<String> {
	let mut output = Vec::new();
	compile(src, &mut output, options)?;
	Ok(String::from_utf8(output).unwrap())
}

fn debug_options() -> DriverOptions {
	DriverOptions {
		elab: ElabConfig {
			debug: true,
			..ElabConfig::default()
		},
		capture_locals: false,
	}
}

/// Block description with the generator used by the hand-built trees below
fn describe(tree: &blocklang::SyntaxTree, function: blocklang::NodeId, extra: serde_json::Value) -> String {
	let mut desc = serde_json::json!({
		"file": "top.py",
		"line": 10,
		"generator": {
			"name": "top",
			"vars": [
				{"name": "s", "width": 2, "direction": "input"},
				{"name": "y", "width": 1, "direction": "input"},
				{"name": "x", "width": 4, "direction": "output"},
				{"name": "out", "width": 1, "direction": "output"}
			]
		},
		"tree": serde_json::to_value(tree).unwrap(),
		"function": function,
	});

	if let (Some(desc), Some(extra)) = (desc.as_object_mut(), extra.as_object()) {
		desc.extend(extra.clone());
	}
	desc.to_string()
}

#[rstest]
fn test_elab_success(#[files("tests/input/*.json")] path: PathBuf) {
	let output = run_blockc(path.as_path(), &DriverOptions::default()).unwrap();
	let expected = std::fs::read_to_string(path.with_extension("out")).expect("missing expected output");
	assert_eq!(read_output(&output), expected);
}

#[rstest]
fn test_elab_failure(#[files("tests/input_invalid/*.json")] path: PathBuf) {
	assert!(run_blockc(path.as_path(), &DriverOptions::default()).is_err());
}

#[rstest]
fn test_debug_output_is_deterministic(#[files("tests/input/*.json")] path: PathBuf) {
	let first = run_blockc(path.as_path(), &debug_options()).unwrap();
	let second = run_blockc(path.as_path(), &debug_options()).unwrap();
	assert_eq!(read_output(&first), read_output(&second));
}

#[test]
fn test_debug_metadata() {
	// def comb(self):
	//     for i in range(2):
	//         self.x[i] = self.y
	let mut b = TreeBuilder::new();
	b.at(2);
	let range = b.range(&[2]);
	b.at(3);
	let owner = b.name("self");
	let x = b.attr(owner, "x");
	let i = b.name("i");
	let target = b.subscript(x, i);
	let owner = b.name("self");
	let y = b.attr(owner, "y");
	let assign = b.assign(target, y);
	b.at(2);
	let stmt = b.for_("i", range, vec![assign]);
	let decorator = b.name("always_comb");
	let f = b.function("comb", &["self"], vec![decorator], vec![stmt]);
	let tree = b.finish();

	let src = describe(&tree, f, serde_json::json!({}));
	assert_eq!(
		compile_str(&src, &debug_options()).unwrap(),
		"Combinational block\nx[0] = y // top.py:12 i=0\nx[1] = y // top.py:12 i=1\n"
	);
	assert_eq!(
		compile_str(&src, &DriverOptions::default()).unwrap(),
		"Combinational block\nx[0] = y\nx[1] = y\n"
	);
}

#[test]
fn test_host_values_and_locals() {
	// def comb():
	//     if ENABLE:
	//         out = y
	let mut b = TreeBuilder::new();
	b.at(2);
	let enable = b.name("ENABLE");
	b.at(3);
	let (out, y) = (b.name("out"), b.name("y"));
	let assign = b.assign(out, y);
	b.at(2);
	let stmt = b.if_(enable, vec![assign], vec![]);
	let decorator = b.name("always_comb");
	let f = b.function("comb", &[], vec![decorator], vec![stmt]);
	let tree = b.finish();

	let src = describe(
		&tree,
		f,
		serde_json::json!({"env": {"ENABLE": true}, "locals": [["depth", 8]]}),
	);
	let options = DriverOptions {
		capture_locals: true,
		..debug_options()
	};
	assert_eq!(
		compile_str(&src, &options).unwrap(),
		"Combinational block\nout = y // top.py:12 depth=8\n"
	);

	let src = describe(&tree, f, serde_json::json!({"env": {"ENABLE": false}}));
	assert_eq!(compile_str(&src, &options).unwrap(), "Combinational block\n");
}

#[test]
fn test_function_block() {
	// def select(self, v):
	//     return v + self.x
	let mut b = TreeBuilder::new();
	b.at(2);
	let v = b.name("v");
	let owner = b.name("self");
	let x = b.attr(owner, "x");
	let sum = b.binop(blocklang::syntax::BinOpKind::Add, v, x);
	let ret = b.return_(sum);
	let f = b.function("select", &["self", "v"], vec![], vec![ret]);
	let tree = b.finish();

	let src = describe(
		&tree,
		f,
		serde_json::json!({"kind": "function", "arg_types": [[4, false]]}),
	);
	assert_eq!(
		compile_str(&src, &DriverOptions::default()).unwrap(),
		"function select(v)\nreturn (v + x)\n"
	);

	// Missing argument type
	let src = describe(&tree, f, serde_json::json!({"kind": "function"}));
	assert!(compile_str(&src, &DriverOptions::default()).is_err());
}

#[test]
fn test_loop_limit_option() {
	let mut b = TreeBuilder::new();
	b.at(2);
	let range = b.range(&[8]);
	b.at(3);
	let body = b.pass();
	b.at(2);
	let stmt = b.for_("i", range, vec![body]);
	let f = b.function("comb", &[], vec![], vec![stmt]);
	let tree = b.finish();

	let src = describe(&tree, f, serde_json::json!({}));
	assert!(compile_str(&src, &DriverOptions::default()).is_ok());

	let options = DriverOptions {
		elab: ElabConfig {
			max_loop_iterations: 4,
			..ElabConfig::default()
		},
		capture_locals: false,
	};
	assert!(compile_str(&src, &options).is_err());
}

#[test]
fn test_malformed_input() {
	assert!(compile_str("{\"file\": \"top.py\"}", &DriverOptions::default()).is_err());

	let mut file = NamedTempFile::new().unwrap();
	write!(file, "not json").unwrap();
	assert!(run_blockc(file.path(), &DriverOptions::default()).is_err());
}
