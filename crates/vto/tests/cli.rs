use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn vto() -> Command {
    Command::cargo_bin("vto").expect("vto binary")
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).expect("json on stdout")
}

#[test]
fn config_prints_builtin_tables() {
    let v = stdout_json(vto().arg("config"));
    assert_eq!(v["initial_model"], "wristDemo");
    assert!(v["modes"]["wrist"].is_object());
    assert!(v["modes"]["ring"].is_object());
    assert_eq!(v["models"]["ringDemo"]["mode"], "ring");
}

#[test]
fn config_out_round_trips_through_check() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vto.json");

    vto()
        .args(["config", "--out"])
        .arg(&path)
        .assert()
        .success();
    assert!(path.exists());

    vto()
        .args(["check", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 2 modes"));
}

#[test]
fn info_log_level_reports_on_stderr_only() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vto.json");

    vto()
        .args(["--log-level", "info", "config", "--out"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("INFO").and(predicate::str::contains("wrote")));

    let v = stdout_json(vto().args([
        "--log-level",
        "info",
        "sizing",
        "--width",
        "10",
        "--height",
        "20",
    ]));
    assert_eq!(v["width"], 10.0);
}

#[test]
fn check_rejects_dangling_model_mode() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("vto.json");
    vto()
        .args(["config", "--out"])
        .arg(&path)
        .assert()
        .success();

    let raw = std::fs::read_to_string(&path).expect("read");
    let mut v: Value = serde_json::from_str(&raw).expect("json");
    v["models"]["wristDemo"]["mode"] = Value::from("ankle");
    std::fs::write(&path, serde_json::to_string(&v).expect("json")).expect("write");

    vto()
        .args(["check", "--config"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown mode `ankle`"));
}

#[test]
fn pose_remaps_into_tracker_space() {
    let v = stdout_json(vto().args(["pose", "--model", "wristDemo"]));
    let t: Vec<f64> = v["translation"]
        .as_array()
        .expect("translation")
        .iter()
        .map(|x| x.as_f64().expect("number"))
        .collect();
    assert_eq!(t.len(), 3);
    assert!((t[0] - 0.076).abs() < 1e-5);
    assert!((t[1] + 0.504).abs() < 1e-5);
    assert!((t[2] - 0.916).abs() < 1e-5);
}

#[test]
fn pose_for_unknown_model_fails() {
    vto()
        .args(["pose", "--model", "necklace"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown model `necklace`"));
}

#[test]
fn sizing_centres_a_square_canvas() {
    let v = stdout_json(vto().args(["sizing", "--width", "1920", "--height", "1080"]));
    assert_eq!(v["width"], 1080.0);
    assert_eq!(v["height"], 1080.0);
    assert_eq!(v["top"], 0.0);
    assert_eq!(v["left"], 420.0);
}

#[test]
fn occluder_describes_soft_cylinder_and_mesh() {
    let wrist = stdout_json(vto().args(["occluder", "--mode", "wrist"]));
    assert_eq!(wrist["spec"]["type"], "SOFT_CYLINDER");
    assert_eq!(wrist["node"]["name"], "softOccluder");
    assert_eq!(wrist["node"]["metadata"]["is_soft_occluder"], true);
    assert_eq!(wrist["node"]["metadata"]["soft_occluder_radius"], 4.5);

    let ring = stdout_json(vto().args(["occluder", "--mode", "ring"]));
    assert_eq!(ring["spec"]["type"], "MODEL");
    assert_eq!(ring["spec"]["asset"], "assets/VTO/ringOccluder2.glb");
    assert!(ring["node"].is_null());
}
