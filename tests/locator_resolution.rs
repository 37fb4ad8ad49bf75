mod common;

use tmdm::{Locator, TopicMapError};

const BASE: &str = "http://a/b/c/d;p?q";

fn setup() -> Locator {
    common::init_tracing();
    Locator::new(BASE).unwrap()
}

fn check_all(base: &Locator, cases: &[(&str, &str)]) {
    for (reference, expected) in cases {
        let resolved = base.resolve(reference).unwrap();
        assert_eq!(resolved.reference(), *expected, "resolving {reference:?}");
    }
}

#[test]
fn normal_examples() {
    let base = setup();
    check_all(
        &base,
        &[
            ("g:h", "g:h"),
            ("g", "http://a/b/c/g"),
            ("./g", "http://a/b/c/g"),
            ("g/", "http://a/b/c/g/"),
            ("/g", "http://a/g"),
            ("//g", "http://g"),
            ("?y", "http://a/b/c/d;p?y"),
            ("g?y", "http://a/b/c/g?y"),
            ("#s", "http://a/b/c/d;p?q#s"),
            ("g#s", "http://a/b/c/g#s"),
            ("g?y#s", "http://a/b/c/g?y#s"),
            (";x", "http://a/b/c/;x"),
            ("g;x", "http://a/b/c/g;x"),
            ("g;x?y#s", "http://a/b/c/g;x?y#s"),
            ("", "http://a/b/c/d;p?q"),
            (".", "http://a/b/c/"),
            ("./", "http://a/b/c/"),
            ("..", "http://a/b/"),
            ("../", "http://a/b/"),
            ("../g", "http://a/b/g"),
            ("../..", "http://a/"),
            ("../../", "http://a/"),
            ("../../g", "http://a/g"),
        ],
    );
}

#[test]
fn abnormal_examples() {
    let base = setup();
    check_all(
        &base,
        &[
            ("../../../g", "http://a/g"),
            ("../../../../g", "http://a/g"),
            ("/./g", "http://a/g"),
            ("/../g", "http://a/g"),
            ("g.", "http://a/b/c/g."),
            (".g", "http://a/b/c/.g"),
            ("g..", "http://a/b/c/g.."),
            ("..g", "http://a/b/c/..g"),
            ("./../g", "http://a/b/g"),
            ("./g/.", "http://a/b/c/g/"),
            ("g/./h", "http://a/b/c/g/h"),
            ("g/../h", "http://a/b/c/h"),
            ("g;x=1/./y", "http://a/b/c/g;x=1/y"),
            ("g;x=1/../y", "http://a/b/c/y"),
            ("g?y/./x", "http://a/b/c/g?y/./x"),
            ("g?y/../x", "http://a/b/c/g?y/../x"),
            ("g#s/./x", "http://a/b/c/g#s/./x"),
            ("g#s/../x", "http://a/b/c/g#s/../x"),
            ("http:g", "http:g"),
        ],
    );
}

#[test]
fn empty_query_and_fragment_are_kept() {
    let base = setup();
    assert_eq!(base.resolve("?").unwrap().reference(), "http://a/b/c/d;p?");
    assert_eq!(base.resolve("#").unwrap().reference(), "http://a/b/c/d;p?q#");
    assert_eq!(base.resolve("g?#").unwrap().reference(), "http://a/b/c/g?#");
}

#[test]
fn locators_compare_by_reference() {
    let first = Locator::new("http://example.org/x").unwrap();
    let second: Locator = "http://example.org/x".parse().unwrap();
    assert_eq!(first, second);
    assert_ne!(first, Locator::new("http://example.org/X").unwrap());
    assert!(first.is_absolute());
    assert_eq!(first.to_string(), "http://example.org/x");
}

#[test]
fn malformed_input_is_refused() {
    for iri in ["", "#fragment", "1http://example.org/", "http://example.org/\u{7}"] {
        let error = Locator::new(iri).unwrap_err();
        assert!(matches!(error, TopicMapError::MalformedIri { .. }), "{iri:?} gave {error:?}");
    }
}

#[test]
fn external_form_escapes_outside_the_uri_character_set() {
    let locator = Locator::new("http://example.org/a b<c>").unwrap();
    assert_eq!(locator.external_form(), "http://example.org/a%20b%3Cc%3E");
    let plain = Locator::new("http://example.org/a?b=c#d").unwrap();
    assert_eq!(plain.external_form(), plain.reference());
}
