//! Build script for oiler-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Parses and validates machine.toml, then embeds it as postcard bytes

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use oiler_core::config::OilerConfig;

fn main() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    setup_linker(&out_dir);
    embed_config(&out_dir);
}

/// Set up linker search paths for memory.x
fn setup_linker(out_dir: &Path) {
    fs::write(out_dir.join("memory.x"), include_bytes!("memory.x"))
        .expect("failed to copy memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate machine.toml and write it to OUT_DIR/config.bin
fn embed_config(out_dir: &Path) {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");
    if !config_path.exists() {
        fail(
            "machine.toml not found!",
            "The firmware requires a machine.toml configuration file\n\
             in the oiler-firmware directory.",
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &e.to_string()),
    };

    let config: OilerConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => fail("Invalid machine.toml", &e.to_string()),
    };

    if let Err(e) = config.validate() {
        fail("machine.toml failed validation", &e.to_string());
    }

    let bytes = match postcard::to_allocvec(&config) {
        Ok(bytes) => bytes,
        Err(e) => fail("Failed to encode configuration", &e.to_string()),
    };
    fs::write(out_dir.join("config.bin"), bytes).expect("failed to write config.bin");

    println!(
        "cargo:warning=machine.toml validated successfully ({} motors, {:?})",
        config.motors.len(),
        config.mode
    );
}

/// Abort the build with a boxed error message
fn fail(title: &str, detail: &str) -> ! {
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        format_error_lines(detail)
    );
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > 64 {
                format!("{}...", line.chars().take(61).collect::<String>())
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
