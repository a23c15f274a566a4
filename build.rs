use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn cmd_out(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn or_unknown(s: String) -> String {
    if s.is_empty() {
        "unknown".to_string()
    } else {
        s
    }
}

fn main() {
    let git = std::env::var("CHAT_SERVICE_GIT_SHA")
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| cmd_out("git", &["rev-parse", "--short=12", "HEAD"]));
    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    let rustc_version = cmd_out(&rustc, &["--version"]);

    // Reproducible builds may pin the timestamp.
    let build_epoch = std::env::var("SOURCE_DATE_EPOCH").ok().unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string()
    });

    println!("cargo:rustc-env=CHAT_SERVICE_GIT_SHA={}", or_unknown(git));
    println!("cargo:rustc-env=CHAT_SERVICE_RUSTC={}", or_unknown(rustc_version));
    println!("cargo:rustc-env=CHAT_SERVICE_BUILD_EPOCH={}", build_epoch);
    println!(
        "cargo:rustc-env=CHAT_SERVICE_TARGET={}",
        std::env::var("TARGET").unwrap_or_default()
    );
    println!(
        "cargo:rustc-env=CHAT_SERVICE_PROFILE={}",
        std::env::var("PROFILE").unwrap_or_default()
    );
    println!("cargo:rerun-if-env-changed=CHAT_SERVICE_GIT_SHA");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");
}
