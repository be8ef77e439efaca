//! Behaviour tests for the architecture guardrails.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use architecture_lint::{ArchitectureLintError, LintSource, Violation};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

#[derive(Debug, Default)]
struct LintWorld {
    sources: Vec<LintSource>,
    result: Option<Result<(), ArchitectureLintError>>,
}

#[fixture]
fn world() -> Mutex<LintWorld> {
    Mutex::new(LintWorld::default())
}

fn add_source(world: &Mutex<LintWorld>, file: &str, contents: &str) {
    let mut world = world.lock().expect("world lock");
    world.sources.push(LintSource {
        file: PathBuf::from(file),
        contents: contents.to_owned(),
    })
}

#[given("a domain module that imports an outbound adapter")]
fn domain_imports_outbound(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "domain/portal.rs",
        "use loyalty_dashboard::outbound::http::HttpAccountGateway; fn wire() { let _ = HttpAccountGateway::new; }",
    );
}

#[given("a domain module that calls reqwest directly")]
fn domain_imports_reqwest(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "domain/aggregator.rs",
        "fn fetch() { let _ = reqwest::Client::new(); }",
    );
}

#[given("an outbound module that reads the settings module")]
fn outbound_imports_settings(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "outbound/http/bad_settings_access.rs",
        "use crate::settings::PortalSettings; fn build(s: &PortalSettings) { let _ = s; }",
    );
}

#[given("valid domain and outbound modules")]
fn valid_modules(world: &Mutex<LintWorld>) {
    add_valid_modules(world);
}

#[given("valid modules mixed with multiple boundary violations")]
fn valid_modules_with_multiple_violations(world: &Mutex<LintWorld>) {
    add_valid_modules(world);
    add_source(
        world,
        "domain/bad_wiring.rs",
        "use crate::outbound::push::HttpNotificationFeed; fn wire() { let _ = HttpNotificationFeed::new; }",
    );
    add_source(
        world,
        "outbound/push/bad_config.rs",
        "use ortho_config::OrthoConfig; fn load() {}",
    );
}

fn add_valid_modules(world: &Mutex<LintWorld>) {
    add_source(
        world,
        "domain/source.rs",
        "pub enum Source { Profile, Points } fn label(settings: u8) -> u8 { settings }",
    );
    add_source(
        world,
        "domain/ports/account_gateway.rs",
        "use crate::domain::source::Source; pub trait AccountGateway { fn fetch(&self, source: Source); }",
    );
    add_source(
        world,
        "outbound/http/gateway.rs",
        "use crate::domain::ports::account_gateway::AccountGateway; use reqwest::Client; pub struct G(Client);",
    );
}

#[when("the architecture lint runs")]
fn run_architecture_lint(world: &Mutex<LintWorld>) {
    let sources = {
        let world = world.lock().expect("world lock");
        world.sources.clone()
    };

    let temp_dir = TempDir::new().expect("tempdir");
    let backend_dir = temp_dir.path().join("backend");
    let src_dir = backend_dir.join("src");
    for source in &sources {
        let path = src_dir.join(&source.file);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, &source.contents).expect("write source file");
    }

    let result = architecture_lint::lint_backend_sources(&backend_dir);
    let mut world = world.lock().expect("world lock");
    world.result = Some(result);
}

#[then("the lint succeeds")]
fn lint_succeeds(world: &Mutex<LintWorld>) {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    assert!(outcome.is_ok(), "expected success, got: {outcome:?}");
}

fn assert_violation_in_file_contains(
    world: &Mutex<LintWorld>,
    expected_file: &str,
    expected_substring: &str,
) {
    let expected_file = PathBuf::from(expected_file);
    let violations = violations(world);
    assert!(
        violations.iter().any(|violation| {
            violation.file == expected_file && violation.message.contains(expected_substring)
        }),
        "expected violation in '{expected_file:?}' containing '{expected_substring}', got: {violations:?}"
    );
}

fn violations(world: &Mutex<LintWorld>) -> Vec<Violation> {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    extract_violations(outcome).expect("expected violations")
}

#[then("the lint fails due to outbound access from the domain")]
fn lint_fails_due_to_outbound_access(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(world, "domain/portal.rs", "crate::outbound");
}

#[then("the lint fails due to transport crate usage in the domain")]
fn lint_fails_due_to_transport_crate(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(world, "domain/aggregator.rs", "external crate `reqwest`");
}

#[then("the lint fails due to settings access from outbound")]
fn lint_fails_due_to_settings_access(world: &Mutex<LintWorld>) {
    assert_violation_in_file_contains(
        world,
        "outbound/http/bad_settings_access.rs",
        "crate::settings",
    );
}

#[then("the lint fails")]
fn lint_fails(world: &Mutex<LintWorld>) {
    let world = world.lock().expect("world lock");
    let outcome = world.result.as_ref().expect("lint must have run");
    assert!(outcome.is_err(), "expected failure, got: {outcome:?}");
}

#[then("all boundary violations are reported")]
fn all_boundary_violations_are_reported(world: &Mutex<LintWorld>) {
    let violations = violations(world);
    assert!(
        violations.len() >= 2,
        "expected at least 2 violations, got: {violations:?}"
    );
    assert_violation_in_file_contains(world, "domain/bad_wiring.rs", "crate::outbound");
    assert_violation_in_file_contains(
        world,
        "outbound/push/bad_config.rs",
        "external crate `ortho_config`",
    );
}

fn extract_violations(outcome: &Result<(), ArchitectureLintError>) -> Option<Vec<Violation>> {
    match outcome {
        Ok(()) => None,
        Err(ArchitectureLintError::Violations(violations)) => Some(violations.clone()),
        Err(other) => panic!("expected violations error, got: {other:?}"),
    }
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Domain modules may not reach outbound adapters"
)]
fn domain_modules_may_not_reach_outbound_adapters(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Domain modules may not use transport crates"
)]
fn domain_modules_may_not_use_transport_crates(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Outbound adapters may not read settings"
)]
fn outbound_adapters_may_not_read_settings(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Valid layering passes"
)]
fn valid_layering_passes(world: Mutex<LintWorld>) {
    let _ = world;
}

#[scenario(
    path = "tests/features/architecture_guardrails.feature",
    name = "Every violation is reported"
)]
fn every_violation_is_reported(world: Mutex<LintWorld>) {
    let _ = world;
}
