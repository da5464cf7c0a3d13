// Unit tests for Registry
mod common;

use common::{Buffers, Journal, test_registry};
use std::io::{Cursor, Read};
use streamcast_core::pipeline::{Registry, Spec};
use streamcast_core::{Namespace, Source, StreamError};

#[test]
fn test_registry_new() {
    let registry = Registry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_registry_builtin_combinators() {
    let registry = Registry::with_builtin();

    assert!(registry.contains(Namespace::Source, "sequential-concat"));
    assert!(registry.contains(Namespace::Source, "cat"));
    assert!(registry.contains(Namespace::Sink, "fan-out"));
    assert!(registry.contains(Namespace::Sink, "tee"));
    assert!(!registry.contains(Namespace::Sink, "sequential-concat"));
    assert_eq!(registry.len(), 4);
}

#[test]
fn test_registry_register_and_open() {
    let mut registry = Registry::new();
    registry.register_source("fixed", |_, _| Ok(Box::new(Cursor::new(b"abc".to_vec()))));

    assert!(registry.contains(Namespace::Source, "fixed"));
    assert_eq!(registry.len(), 1);

    let mut source = registry.open_source(&Spec::new("fixed")).unwrap();
    let mut out = String::new();
    source.read_to_string(&mut out).unwrap();
    assert_eq!(out, "abc");
    source.close().unwrap();
}

#[test]
fn test_registry_duplicate_overrides() {
    let mut registry = Registry::new();
    let first = registry.register_source("fixed", |_, _| Ok(Box::new(Cursor::new(b"old".to_vec()))));
    let second = registry.register_source("fixed", |_, _| Ok(Box::new(Cursor::new(b"new".to_vec()))));

    assert!(!first);
    assert!(second);
    assert_eq!(registry.len(), 1);

    let mut source = registry.open_source(&Spec::new("fixed")).unwrap();
    let mut out = String::new();
    source.read_to_string(&mut out).unwrap();
    assert_eq!(out, "new");
}

#[test]
fn test_registry_namespaces_are_independent() {
    let mut registry = Registry::new();
    registry.register_source("same", |_, _| Ok(Box::new(std::io::empty())));
    registry.register_sink("same", |_, _| Ok(Box::new(std::io::sink())));

    assert_eq!(registry.len(), 2);
    assert!(!registry.contains(Namespace::Decoder, "same"));
    assert!(registry.resolve_encoder("same").is_err());
}

#[test]
fn test_registry_resolve_unknown_kind() {
    let registry = Registry::new();
    let err = registry.open_source(&Spec::new("nonexistent")).err().unwrap();

    match err {
        StreamError::UnknownKind { namespace, kind } => {
            assert_eq!(namespace, Namespace::Source);
            assert_eq!(kind, "nonexistent");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_registry_missing_kind_is_config_error() {
    let registry = Registry::with_builtin();
    let spec = Spec::default().with("path", "x");

    assert!(matches!(
        registry.open_sink(&spec).err().unwrap(),
        StreamError::Config(_)
    ));
}

#[test]
fn test_registry_names_in_registration_order() {
    let journal = Journal::new();
    let registry = test_registry(&journal, &Buffers::default());

    assert_eq!(
        registry.names(Namespace::Source),
        vec!["sequential-concat", "cat", "memory"]
    );
    assert_eq!(registry.names(Namespace::Decoder), vec!["traced", "broken"]);
}

#[test]
fn test_wrap_decoder_unknown_kind_returns_inner() {
    let journal = Journal::new();
    let registry = test_registry(&journal, &Buffers::default());
    let inner = registry
        .open_source(&Spec::new("memory").with("name", "raw").with("data", "xyz"))
        .unwrap();

    let failure = registry
        .wrap_decoder(&Spec::new("gzip"), inner)
        .err()
        .unwrap();
    let (err, mut inner) = failure.into_parts();

    assert!(matches!(err, StreamError::UnknownKind { .. }));
    let mut out = String::new();
    inner.read_to_string(&mut out).unwrap();
    assert_eq!(out, "xyz");
}

#[test]
fn test_composite_child_failure_closes_opened_children() {
    let journal = Journal::new();
    let registry = test_registry(&journal, &Buffers::default());
    let spec = Spec::new("sequential-concat").with_children(vec![
        Spec::new("memory").with("name", "a"),
        Spec::new("memory").with("name", "b"),
        Spec::new("missing"),
    ]);

    let err = registry.open_source(&spec).err().unwrap();

    assert!(matches!(err, StreamError::UnknownKind { .. }));
    assert_eq!(
        journal.matching("close"),
        vec!["close b".to_string(), "close a".to_string()]
    );
}

#[test]
fn test_composite_without_children_rejected() {
    let registry = Registry::with_builtin();
    let err = registry.open_sink(&Spec::new("fan-out")).err().unwrap();
    assert!(matches!(err, StreamError::Config(_)));
}
