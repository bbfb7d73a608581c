//! End-to-end tests for the bundlespec binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn bundlespec() -> Command {
    Command::cargo_bin("bundlespec").unwrap()
}

const PACKAGE_CONFIG: &str = r#"
input = "src/index.js"
plugins = ["resolve", "commonjs"]
external = []

[[output]]
file = "dist/package.cjs"
format = "cjs"

[[output]]
file = "dist/package.mjs"
format = "es"
"#;

const SHARED_CONFIG: &str = r#"
input = "src/index.js"
plugins = ["resolve", "commonjs"]
external = ["react"]

[[output]]
file = "dist/shared.cjs"
format = "cjs"

[[output]]
file = "dist/shared.mjs"
format = "es"
"#;

fn write_package(root: &Path, name: &str, config: &str) {
    let pkg = root.join("packages").join(name);
    fs::create_dir_all(pkg.join("src")).unwrap();
    fs::write(pkg.join("bundle.toml"), config).unwrap();
    fs::write(pkg.join("src/index.js"), "export default {};\n").unwrap();
}

fn monorepo() -> TempDir {
    let temp = TempDir::new().unwrap();
    write_package(temp.path(), "package", PACKAGE_CONFIG);
    write_package(temp.path(), "shared", SHARED_CONFIG);
    temp
}

#[test]
fn help_lists_subcommands() {
    bundlespec()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("init"));
}

#[test]
fn check_valid_workspace() {
    let temp = monorepo();

    bundlespec()
        .arg("check")
        .arg("--workspace")
        .arg(temp.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("2 package(s) valid"));
}

#[test]
fn check_reports_offending_field() {
    let temp = monorepo();
    write_package(
        temp.path(),
        "broken",
        r#"
input = "src/index.js"

[[output]]
file = "dist/a.js"
format = "cjs"

[[output]]
file = "./dist/a.js"
format = "es"
"#,
    );

    bundlespec()
        .arg("check")
        .arg("--workspace")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("output[1].file"))
        .stderr(predicate::str::contains("1 of 3 package(s) failed"));
}

#[test]
fn check_single_package_directory() {
    let temp = monorepo();

    bundlespec()
        .arg("check")
        .arg(temp.path().join("packages/shared"))
        .assert()
        .success();
}

#[test]
fn plan_prints_json_to_stdout() {
    let temp = monorepo();

    let output = bundlespec()
        .arg("plan")
        .arg("--workspace")
        .arg(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let plans: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let plans = plans.as_array().unwrap();
    assert_eq!(plans.len(), 2);
    assert_eq!(plans[0]["package"], "package");
    assert_eq!(plans[0]["externals"], serde_json::json!([]));
    assert_eq!(plans[1]["package"], "shared");
    assert_eq!(plans[1]["externals"], serde_json::json!(["react"]));
    assert_eq!(plans[1]["outputs"][0]["file"], "dist/shared.cjs");
    assert_eq!(plans[1]["outputs"][1]["format"], "es");
}

#[test]
fn plan_writes_files() {
    let temp = monorepo();
    let out = temp.path().join("plans");

    bundlespec()
        .arg("plan")
        .arg("--workspace")
        .arg(temp.path())
        .arg("--out")
        .arg(&out)
        .arg("--pretty")
        .assert()
        .success();

    assert!(out.join("package.plan.json").is_file());
    let shared = fs::read_to_string(out.join("shared.plan.json")).unwrap();
    assert!(shared.contains("\"react\""));
}

#[test]
fn plan_refuses_colliding_package_names() {
    let temp = TempDir::new().unwrap();
    for dir in ["apps/ui", "libs/ui"] {
        let pkg = temp.path().join(dir);
        fs::create_dir_all(pkg.join("src")).unwrap();
        fs::write(pkg.join("bundle.toml"), SHARED_CONFIG).unwrap();
        fs::write(pkg.join("src/index.js"), "export default {};\n").unwrap();
    }
    let out = temp.path().join("plans");

    bundlespec()
        .arg("plan")
        .arg("--workspace")
        .arg(temp.path())
        .arg("--pattern")
        .arg("*/*")
        .arg("--out")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("would both write"))
        .stderr(predicate::str::contains("ui.plan.json"));

    assert!(!out.join("ui.plan.json").exists());
}

#[test]
fn plan_unknown_plugin_fails() {
    let temp = TempDir::new().unwrap();
    write_package(
        temp.path(),
        "pkg",
        r#"
input = "src/index.js"
plugins = ["terser"]
output = { file = "dist/pkg.js", format = "es" }
"#,
    );

    bundlespec()
        .arg("plan")
        .arg(temp.path().join("packages/pkg/bundle.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown plugin `terser`"));
}

#[test]
fn init_then_check() {
    let temp = TempDir::new().unwrap();
    let pkg = temp.path().join("widgets");

    bundlespec()
        .arg("init")
        .arg(&pkg)
        .arg("--external")
        .arg("react")
        .assert()
        .success();

    assert!(pkg.join("bundle.toml").is_file());

    bundlespec().arg("check").arg(&pkg).assert().success();

    bundlespec()
        .arg("init")
        .arg(&pkg)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}
