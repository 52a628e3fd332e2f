use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
}

fn main() {
    // Tagged releases report the bare package version; everything else gets
    // a "-dev.<hash>" suffix in the `/health` version.
    let is_release = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();
    let suffix = if is_release {
        String::new()
    } else {
        let hash = git(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
        format!("-dev.{}", hash)
    };
    println!("cargo:rustc-env=STREAMCHAT_VERSION_SUFFIX={}", suffix);

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads");
}
