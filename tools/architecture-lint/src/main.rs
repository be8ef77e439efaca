//! Command-line runner for the boundary lint.
//!
//! Usage: `architecture-lint [BACKEND_DIR]`. Without an argument the backend
//! crate is located next to the workspace manifest.

use std::env;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const BACKEND_CRATE_DIR: &str = "backend";

fn main() -> ExitCode {
    let Some(backend_dir) = env::args_os().nth(1).map(PathBuf::from).or_else(locate_backend)
    else {
        report(format_args!(
            "no `{BACKEND_CRATE_DIR}/src` found above the current directory; pass the backend crate path"
        ));
        return ExitCode::FAILURE;
    };

    match architecture_lint::lint_backend_sources(&backend_dir) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(format_args!("{err}"));
            ExitCode::FAILURE
        }
    }
}

fn report(message: std::fmt::Arguments<'_>) {
    let _ = writeln!(io::stderr().lock(), "architecture-lint: {message}");
}

fn locate_backend() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    env::current_dir()
        .ok()
        .and_then(|cwd| backend_above(&cwd))
        .or_else(|| backend_above(&manifest_dir))
}

fn backend_above(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(BACKEND_CRATE_DIR))
        .find(|candidate| candidate.join("src").is_dir())
}
