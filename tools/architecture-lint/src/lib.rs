//! Boundary lint for the loyalty dashboard backend.
//!
//! `domain` holds entities, services and ports; `outbound` holds the reqwest
//! adapters; `settings` and `main` wire them together. The lint parses every
//! file under `backend/src/domain` and `backend/src/outbound` and rejects:
//!
//! - `domain` paths into `outbound` or `settings`, and any use of the HTTP
//!   stack (`reqwest`, `axum`, `hyper`, `url`) or process-level crates
//! - `outbound` paths into `settings`, and any use of process-level crates
//!   (`clap`, `color_eyre`, `ortho_config`, `tracing_subscriber`)
//!
//! Run it with `cargo run -p architecture-lint`.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use syn::visit::Visit;

const CRATE_NAME: &str = "loyalty_dashboard";

const PROCESS_CRATES: &[&str] = &["clap", "color_eyre", "ortho_config", "tracing_subscriber"];
const HTTP_CRATES: &[&str] = &["axum", "hyper", "reqwest", "url"];

/// A single boundary violation discovered by the linter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File path relative to `backend/src`.
    pub file: PathBuf,
    /// Human-readable description of the violated rule.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file.display(), self.message)
    }
}

/// Failure modes returned by the architecture lint.
#[derive(Debug)]
pub enum ArchitectureLintError {
    /// Walking or reading the source tree failed.
    Io(io::Error),
    /// A file could not be parsed or does not belong to a linted layer.
    Parse {
        /// File path relative to `backend/src`.
        file: PathBuf,
        /// Parser or classification failure.
        message: String,
    },
    /// One or more boundary violations were found.
    Violations(Vec<Violation>),
}

impl fmt::Display for ArchitectureLintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "cannot read backend sources: {err}"),
            Self::Parse { file, message } => write!(f, "{}: {message}", file.display()),
            Self::Violations(violations) => {
                writeln!(f, "{} boundary violation(s):", violations.len())?;
                violations
                    .iter()
                    .try_for_each(|violation| writeln!(f, "  {violation}"))
            }
        }
    }
}

impl std::error::Error for ArchitectureLintError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse { .. } | Self::Violations(_) => None,
        }
    }
}

impl From<io::Error> for ArchitectureLintError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// A Rust source file to be linted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintSource {
    /// Path relative to `backend/src`.
    pub file: PathBuf,
    /// File contents.
    pub contents: String,
}

/// Lint the backend crate sources on disk.
///
/// `backend_dir` is the crate directory containing `src/`.
pub fn lint_backend_sources(backend_dir: &Path) -> Result<(), ArchitectureLintError> {
    let src_dir = backend_dir.join("src");
    let mut sources = Vec::new();
    for layer in Layer::ALL {
        let root = src_dir.join(layer.dir());
        if root.is_dir() {
            read_sources(&src_dir, &root, &mut sources)?;
        }
    }
    sources.sort_by(|a, b| a.file.cmp(&b.file));
    lint_sources(&sources)
}

/// Lint in-memory sources; paths are relative to `backend/src`.
pub fn lint_sources(sources: &[LintSource]) -> Result<(), ArchitectureLintError> {
    let mut violations = Vec::new();
    for source in sources {
        let layer = Layer::of(&source.file).ok_or_else(|| ArchitectureLintError::Parse {
            file: source.file.clone(),
            message: "not under domain/ or outbound/".to_owned(),
        })?;
        let parsed =
            syn::parse_file(&source.contents).map_err(|err| ArchitectureLintError::Parse {
                file: source.file.clone(),
                message: err.to_string(),
            })?;

        let mut collector = DependencyCollector::default();
        collector.visit_file(&parsed);
        violations.extend(
            collector
                .found
                .into_iter()
                .filter(|dependency| !layer.allows(dependency))
                .map(|dependency| Violation {
                    file: source.file.clone(),
                    message: format!("{} module must not depend on {dependency}", layer.dir()),
                }),
        );
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(ArchitectureLintError::Violations(violations))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layer {
    Domain,
    Outbound,
}

impl Layer {
    const ALL: [Self; 2] = [Self::Domain, Self::Outbound];

    fn of(relative_path: &Path) -> Option<Self> {
        let first = relative_path.components().next()?.as_os_str();
        Self::ALL.into_iter().find(|layer| first == layer.dir())
    }

    const fn dir(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Outbound => "outbound",
        }
    }

    fn allows(self, dependency: &Dependency) -> bool {
        match (self, dependency) {
            (Self::Domain, Dependency::Module(module)) => {
                !matches!(module.as_str(), "outbound" | "settings")
            }
            (Self::Outbound, Dependency::Module(module)) => module != "settings",
            (Self::Domain, Dependency::Crate(name)) => {
                !PROCESS_CRATES.contains(&name.as_str()) && !HTTP_CRATES.contains(&name.as_str())
            }
            (Self::Outbound, Dependency::Crate(name)) => !PROCESS_CRATES.contains(&name.as_str()),
        }
    }
}

/// Where a path points: a top-level module of this crate or another crate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Dependency {
    Module(String),
    Crate(String),
}

impl Dependency {
    fn classify(segments: &[String]) -> Option<Self> {
        let (first, rest) = segments.split_first()?;
        match first.as_str() {
            // Sibling layers named without a prefix; a bare `settings` is
            // usually a local binding.
            "domain" | "outbound" => Some(Self::Module(first.clone())),
            "crate" | "self" | "super" => rest
                .iter()
                .find(|segment| !matches!(segment.as_str(), "self" | "super"))
                .map(|module| Self::Module(module.clone())),
            CRATE_NAME => rest.first().map(|module| Self::Module(module.clone())),
            _ => Some(Self::Crate(first.clone())),
        }
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module(module) => write!(f, "crate::{module}"),
            Self::Crate(name) => write!(f, "external crate `{name}`"),
        }
    }
}

#[derive(Default)]
struct DependencyCollector {
    found: BTreeSet<Dependency>,
}

impl DependencyCollector {
    fn record(&mut self, segments: &[String]) {
        if let Some(dependency) = Dependency::classify(segments) {
            self.found.insert(dependency);
        }
    }

    fn walk_use(&mut self, tree: &syn::UseTree, prefix: &mut Vec<String>) {
        match tree {
            syn::UseTree::Path(path) => {
                prefix.push(path.ident.to_string());
                self.walk_use(&path.tree, prefix);
                prefix.pop();
            }
            syn::UseTree::Name(syn::UseName { ident })
            | syn::UseTree::Rename(syn::UseRename { ident, .. }) => {
                prefix.push(ident.to_string());
                self.record(prefix);
                prefix.pop();
            }
            syn::UseTree::Glob(_) => self.record(prefix),
            syn::UseTree::Group(group) => {
                for item in &group.items {
                    self.walk_use(item, prefix);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for DependencyCollector {
    fn visit_path(&mut self, node: &'ast syn::Path) {
        // Single-segment paths are locals, types in scope or prelude items.
        if node.segments.len() > 1 {
            let segments: Vec<String> = node
                .segments
                .iter()
                .map(|segment| segment.ident.to_string())
                .collect();
            self.record(&segments);
        }
        syn::visit::visit_path(self, node);
    }

    fn visit_item_use(&mut self, node: &'ast syn::ItemUse) {
        self.walk_use(&node.tree, &mut Vec::new());
    }
}

fn read_sources(
    src_dir: &Path,
    root: &Path,
    sources: &mut Vec<LintSource>,
) -> Result<(), ArchitectureLintError> {
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") {
                let file = path
                    .strip_prefix(src_dir)
                    .map_err(|err| ArchitectureLintError::Parse {
                        file: path.clone(),
                        message: err.to_string(),
                    })?
                    .to_path_buf();
                let contents = fs::read_to_string(&path)?;
                sources.push(LintSource { file, contents });
            }
        }
    }
    Ok(())
}
