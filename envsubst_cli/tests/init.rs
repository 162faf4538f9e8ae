mod common;

use envsubst_core::AnyEmptyResult;
use envsubst_core::SubstConfig;

#[test]
fn can_init() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::envsubst_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("Created"))
		.stdout(predicates::str::contains("Next steps"));

	let config_path = tmp.path().join("envsubst.toml");
	assert!(config_path.exists());

	let content = std::fs::read_to_string(&config_path)?;
	assert!(content.contains("[vars]"));
	assert!(content.contains("preserve_undefined = true"));

	let config = SubstConfig::load(tmp.path())?;
	assert!(config.is_some_and(|config| !config.strict && config.environment));

	Ok(())
}

#[test]
fn init_does_not_overwrite() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config_path = tmp.path().join("envsubst.toml");
	std::fs::write(&config_path, "existing config")?;

	common::envsubst_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	let content = std::fs::read_to_string(&config_path)?;
	assert_eq!(content, "existing config");

	Ok(())
}

#[test]
fn init_respects_dot_config_candidate() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir_all(tmp.path().join(".config"))?;
	std::fs::write(tmp.path().join(".config/envsubst.toml"), "")?;

	common::envsubst_cmd()
		.arg("init")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("already exists"));

	assert!(!tmp.path().join("envsubst.toml").exists());

	Ok(())
}
