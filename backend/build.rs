// Stamps the edge binary with its git revision and build time.
//
// Container and tarball builds have no `.git`; they can pass
// VIBE_EDGE_GIT_COMMIT / VIBE_EDGE_GIT_BRANCH instead. Anything still
// unknown is reported as "unknown".

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

const COMMIT_OVERRIDE: &str = "VIBE_EDGE_GIT_COMMIT";
const BRANCH_OVERRIDE: &str = "VIBE_EDGE_GIT_BRANCH";

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());

    let commit = override_or_git(COMMIT_OVERRIDE, &manifest_dir, &["rev-parse", "--short", "HEAD"]);
    let branch = override_or_git(BRANCH_OVERRIDE, &manifest_dir, &["rev-parse", "--abbrev-ref", "HEAD"]);
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");

    println!("cargo:rustc-env=EDGE_GIT_COMMIT={}", commit);
    println!("cargo:rustc-env=EDGE_GIT_BRANCH={}", branch);
    println!("cargo:rustc-env=EDGE_BUILT_AT={}", built_at);

    println!("cargo:rerun-if-env-changed={}", COMMIT_OVERRIDE);
    println!("cargo:rerun-if-env-changed={}", BRANCH_OVERRIDE);
    if let Some(git_dir) = manifest_dir.ancestors().map(|dir| dir.join(".git")).find(|dir| dir.exists()) {
        // HEAD moves on checkout, refs/heads on commit.
        for watched in [git_dir.join("HEAD"), git_dir.join("refs").join("heads")] {
            if watched.exists() {
                println!("cargo:rerun-if-changed={}", watched.display());
            }
        }
    }
}

fn override_or_git(var: &str, dir: &Path, args: &[&str]) -> String {
    env::var(var)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| git(dir, args))
        .unwrap_or_else(|| "unknown".to_string())
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new("git").arg("-C").arg(dir).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8(output.stdout).ok()?.trim().to_string();
    (!value.is_empty()).then_some(value)
}
