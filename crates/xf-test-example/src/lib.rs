use std::path::PathBuf;

use walkdir::WalkDir;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn scenarios_root() -> PathBuf {
    workspace_root().join("scenarios")
}

pub fn scenario_dir(name: &str) -> PathBuf {
    scenarios_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    scenario_dir(name).join("testcase.json")
}

/// Names of the bundled scenario directories, sorted.
pub fn scenario_names() -> Vec<String> {
    let mut names = WalkDir::new(scenarios_root())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect::<Vec<_>>();
    names.sort();
    names
}
