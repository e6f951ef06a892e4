//! Stamps the binary with a git description for `effectiva --version`.

use std::path::{Path, PathBuf};
use std::process::Command;

fn describe(workspace: &Path) -> Option<String> {
    let out = Command::new("git")
        .current_dir(workspace)
        .args(["describe", "--always", "--dirty", "--abbrev=10"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8(out.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn main() {
    let workspace = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .and_then(|dir| dir.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(".."));

    // Packagers without a checkout can pin the value.
    println!("cargo:rerun-if-env-changed=EFFECTIVA_BUILD_SHA");
    let stamp = std::env::var("EFFECTIVA_BUILD_SHA")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| describe(&workspace))
        .unwrap_or_else(|| "unknown".into());
    println!("cargo:rustc-env=EFFECTIVA_BUILD_SHA={stamp}");

    for tracked in ["HEAD", "refs", "index"] {
        let path = workspace.join(".git").join(tracked);
        if path.exists() {
            println!("cargo:rerun-if-changed={}", path.display());
        }
    }
}
