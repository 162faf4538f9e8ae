mod common;

use envsubst_core::AnyEmptyResult;

#[test]
fn render_uses_config_vars() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("envsubst.toml"),
		"[vars]\nNAME = \"world\"\nPORT = \"8080\"\n",
	)?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("${NAME}:$PORT")
		.assert()
		.success()
		.stdout("world:8080");

	Ok(())
}

#[test]
fn render_resolves_dot_envsubst_toml() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join(".envsubst.toml"), "[vars]\nNAME = \"dot\"\n")?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("$NAME")
		.assert()
		.success()
		.stdout("dot");

	Ok(())
}

#[test]
fn render_prefers_envsubst_toml_over_other_candidates() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join("envsubst.toml"), "[vars]\nNAME = \"root\"\n")?;
	std::fs::write(tmp.path().join(".envsubst.toml"), "[vars]\nNAME = \"dot\"\n")?;
	std::fs::write(
		tmp.path().join(".config/envsubst.toml"),
		"[vars]\nNAME = \"nested\"\n",
	)?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("$NAME")
		.assert()
		.success()
		.stdout("root");

	Ok(())
}

#[test]
fn render_merges_vars_files_then_inline_vars() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("base.yaml"),
		"HOST: base.example.com\nPORT: 80\n",
	)?;
	std::fs::write(tmp.path().join("override.json"), r#"{"PORT": 8443}"#)?;
	std::fs::write(
		tmp.path().join("envsubst.toml"),
		"vars_files = [\"base.yaml\", \"override.json\"]\n\n[vars]\nHOST = \"inline.example.com\"\n",
	)?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("$HOST:$PORT")
		.assert()
		.success()
		.stdout("inline.example.com:8443");

	Ok(())
}

#[test]
fn config_can_disable_environment_and_preserve() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("envsubst.toml"),
		"preserve_undefined = false\nenvironment = false\n",
	)?;

	common::envsubst_cmd()
		.env("ENVSUBST_CLI_GREETING", "hi")
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("[$ENVSUBST_CLI_GREETING]")
		.assert()
		.success()
		.stdout("[]");

	Ok(())
}

#[test]
fn config_strict_fails_render() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("envsubst.toml"),
		"strict = true\nenvironment = false\n",
	)?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("${MISSING}")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("unresolved variables: MISSING"));

	Ok(())
}

#[test]
fn invalid_config_reports_parse_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("envsubst.toml"), "[vars\nbroken")?;

	common::envsubst_cmd()
		.arg("render")
		.arg("--path")
		.arg(tmp.path())
		.write_stdin("$X")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("failed to parse config file"));

	Ok(())
}
