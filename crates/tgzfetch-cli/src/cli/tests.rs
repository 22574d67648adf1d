//! Tests for the CLI surface and specifier handling.

use clap::Parser;
use tgzfetch_core::registry::Registry;
use tgzfetch_core::resolve;

use super::run::{parse_specifiers, specifiers_without_manifest};
use super::Cli;

fn parse(args: &[&str]) -> Cli {
    Cli::parse_from(args)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn cli_parse_no_args_defaults_to_lockfile_mode() {
    let cli = parse(&["tgzfetch"]);
    assert!(cli.pkgs.is_empty());
    assert_eq!(cli.registry(), Registry::Npm);
    assert!(cli.token.is_none());
}

#[test]
fn cli_parse_registry_flags() {
    assert_eq!(parse(&["tgzfetch", "--cnpm"]).registry(), Registry::Cnpm);
    assert_eq!(parse(&["tgzfetch", "-y"]).registry(), Registry::Yarn);
    assert_eq!(parse(&["tgzfetch", "-t"]).registry(), Registry::Taobao);
    assert_eq!(parse(&["tgzfetch", "-n"]).registry(), Registry::Npm);
    // precedence when several are given: cnpm, yarn, taobao
    assert_eq!(parse(&["tgzfetch", "-y", "-t"]).registry(), Registry::Yarn);
}

#[test]
fn cli_parse_token() {
    let cli = parse(&["tgzfetch", "foo@1.0.0", "--token", "dXNlcjpwdw=="]);
    assert_eq!(cli.token.as_deref(), Some("dXNlcjpwdw=="));
    let cli = parse(&["tgzfetch", "-k", "abc"]);
    assert_eq!(cli.token.as_deref(), Some("abc"));
}

#[test]
fn cli_parse_positional_specifiers() {
    let cli = parse(&["tgzfetch", "foo@2.1.0", "@scope/bar@1.0.0"]);
    assert_eq!(cli.pkgs, strings(&["foo@2.1.0", "@scope/bar@1.0.0"]));
}

#[test]
fn specifier_parsing_handles_scoped_names() {
    let specs = parse_specifiers(&strings(&["foo@2.1.0", "@scope/bar@1.2.3"]));
    assert_eq!(specs.len(), 2);
    assert_eq!(specs[0].name, "foo");
    assert_eq!(specs[0].range, "2.1.0");
    assert_eq!(specs[1].name, "@scope/bar");
    assert_eq!(specs[1].range, "1.2.3");
}

#[test]
fn malformed_specifier_is_skipped_not_fatal() {
    let specs = parse_specifiers(&strings(&["no-version", "@scope/only-name", "ok@1.0.0"]));
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "ok");
}

#[test]
fn mixed_manifest_invocation_keeps_explicit_specifiers() {
    let specs = specifiers_without_manifest(&strings(&["package.json", "foo@1.0.0"]));
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].name, "foo");
    assert_eq!(specs[0].range, "1.0.0");
}

#[test]
fn explicit_specifier_yields_exactly_one_target() {
    let specs = parse_specifiers(&strings(&["foo@2.1.0"]));
    let set = resolve::resolve_from_specs(&specs, Registry::Npm);
    assert_eq!(
        set.into_urls(),
        vec!["https://registry.npmjs.org/foo/-/foo-2.1.0.tgz".to_string()]
    );
}
