use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use namedcall::datatype::{Callable, Pattern, Value};
use namedcall::engine::Engine;
use namedcall::validation::{Test, rule};
use namedcall::{NamedCallError, named};

fn positional(source: &str) -> Value {
    Value::from(Callable::with_source(source, |_, args| Ok(Value::Array(args.to_vec()))))
}

fn longer_than(n: usize) -> Callable {
    Callable::predicate("longer than", move |v| v.as_str().is_some_and(|s| s.len() > n))
}

#[test]
fn required_rule_without_value_fails() {
    let engine = Engine::new();
    let f = positional("function f(foo, bar)");
    engine
        .add_validations(&f, &named! { "bar" => rule(Value::Null, true) })
        .expect("validations");
    let err = engine.invoke_named(&f, &Value::Null, &named! { "foo" => 1 }).unwrap_err();
    assert!(matches!(err, NamedCallError::RequiredValidation { ref parameter } if parameter == "bar"));
}

#[test]
fn failing_predicate_names_parameter_and_value() {
    let engine = Engine::new();
    let f = positional("function f(name)");
    engine
        .add_validations(&f, &named! { "name" => rule(longer_than(3), true) })
        .expect("validations");
    let err = engine.invoke_named(&f, &Value::Null, &named! { "name" => "Bo" }).unwrap_err();
    match err {
        NamedCallError::ValidationFailed { ref parameter, ref value } => {
            assert_eq!(parameter, "name");
            assert_eq!(value, &Value::from("Bo"));
        }
        other => panic!("unexpected error: {}", other),
    }
    let result = engine.invoke_named(&f, &Value::Null, &named! { "name" => "Bobby" }).expect("invoke");
    assert_eq!(result, Value::Array(vec!["Bobby".into()]));
}

#[test]
fn absent_value_never_triggers_an_optional_rule() {
    let engine = Engine::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let f = positional("function f(foo)");
    let never = Callable::predicate("never", move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
        false
    });
    engine
        .add_validations(&f, &named! { "foo" => rule(never, false) })
        .expect("validations");
    let result = engine.invoke_named(&f, &Value::Null, &named! {}).expect("invoke");
    assert_eq!(result, Value::Array(vec![Value::Null]));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn patterns_match_the_display_form() {
    let engine = Engine::new();
    let f = positional("function f(code, year)");
    engine
        .add_validations(&f, &named! {
            "code" => rule(Pattern::new(r"^[A-Z]{3}$").expect("pattern"), false),
            "year" => rule(Pattern::new(r"^\d{4}$").expect("pattern"), false),
        })
        .expect("validations");
    engine
        .invoke_named(&f, &Value::Null, &named! { "code" => "ABC", "year" => 2024 })
        .expect("invoke");
    let err = engine
        .invoke_named(&f, &Value::Null, &named! { "code" => "abc", "year" => 2024 })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::ValidationFailed { ref parameter, .. } if parameter == "code"));
    assert!(format!("{}", err).contains("abc"));
}

#[test]
fn validations_merge_instead_of_replacing() {
    let engine = Engine::new();
    let f = positional("function f(foo, bar)");
    engine
        .add_validations(&f, &named! { "foo" => rule(longer_than(1), true) })
        .expect("first");
    engine
        .add_validations(&f, &named! { "bar" => rule(longer_than(2), false) })
        .expect("second");
    let metadata = engine.metadata(&f).expect("metadata");
    let foo = metadata.validations().get("foo").expect("foo rule");
    let bar = metadata.validations().get("bar").expect("bar rule");
    assert!(foo.is_required());
    assert!(!bar.is_required());
    assert!(matches!(foo.test(), Some(Test::Predicate(_))));

    let err = engine.invoke_named(&f, &Value::Null, &named! { "bar" => "long" }).unwrap_err();
    assert!(matches!(err, NamedCallError::RequiredValidation { ref parameter } if parameter == "foo"));
    let err = engine
        .invoke_named(&f, &Value::Null, &named! { "foo" => "ok", "bar" => "no" })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::ValidationFailed { ref parameter, .. } if parameter == "bar"));
}

#[test]
fn re_adding_a_rule_replaces_only_that_rule() {
    let engine = Engine::new();
    let f = positional("function f(foo, bar)");
    engine
        .add_validations(&f, &named! {
            "foo" => rule(Value::Null, true),
            "bar" => rule(Value::Null, true),
        })
        .expect("first");
    engine
        .add_validations(&f, &named! { "foo" => rule(Value::Null, false) })
        .expect("second");
    let metadata = engine.metadata(&f).expect("metadata");
    assert!(!metadata.validations()["foo"].is_required());
    assert!(metadata.validations()["bar"].is_required());
}

#[test]
fn malformed_descriptors_are_rejected() {
    let engine = Engine::new();
    let f = positional("function f(foo)");
    let err = engine
        .add_validations(&f, &named! { "foo" => rule(5, false) })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(ref msg) if msg.contains("test")));
    let err = engine
        .add_validations(&f, &named! { "foo" => named! { "required" => "yes" } })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(ref msg) if msg.contains("required")));
    let err = engine
        .add_validations(&f, &named! { "foo" => "not a rule" })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(_)));
}

#[test]
fn one_malformed_descriptor_blocks_the_whole_batch() {
    let engine = Engine::new();
    let f = positional("function f(foo, bar)");
    let err = engine
        .add_validations(&f, &named! {
            "bar" => rule(Value::Null, true),
            "foo" => rule("not a test", false),
        })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(_)));
    assert!(engine.metadata(&f).expect("metadata").validations().is_empty());
}

#[test]
fn predicate_errors_propagate() {
    let engine = Engine::new();
    let f = positional("function f(foo)");
    let broken = Callable::new("broken", |_, _| Err(NamedCallError::Raised("boom".to_string())));
    engine
        .add_validations(&f, &named! { "foo" => rule(broken, false) })
        .expect("validations");
    let err = engine.invoke_named(&f, &Value::Null, &named! { "foo" => "x" }).unwrap_err();
    assert!(matches!(err, NamedCallError::Raised(ref msg) if msg == "boom"));
}

#[test]
fn validations_need_a_callable() {
    let engine = Engine::new();
    let err = engine
        .add_validations(&Value::from(true), &named! { "foo" => rule(Value::Null, true) })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::NotInvocable(_)));
}

#[test]
fn wrapper_registers_validations() {
    let engine = Engine::new();
    let f = positional("function f(foo)");
    let named = engine.named(&f).expect("wrap");
    named
        .add_validations(&named! { "foo" => rule(Value::Null, true) })
        .expect("validations");
    let err = named.apply_named(&Value::Null, &named! {}).unwrap_err();
    assert!(matches!(err, NamedCallError::RequiredValidation { .. }));
}

fn checked_quartet(engine: &Engine) -> Value {
    let f = positional("function testNameArgsValidation(foo, bar, baz, bat)");
    let below_fifty = Callable::predicate("below fifty", |v| v.as_f64().is_some_and(|n| n < 50.0));
    let falsy = Callable::predicate("falsy", |v| !v.is_truthy());
    engine
        .add_validations(&f, &named! {
            "foo" => rule(below_fifty, false),
            "bar" => rule(Pattern::new("^[a-z]+$").expect("pattern"), false),
            "baz" => rule(falsy, true),
            "bat" => rule(Pattern::new("^.*burg$").expect("pattern"), false),
        })
        .expect("validations");
    f
}

#[test]
fn required_rule_accepts_a_supplied_falsy_value() {
    let engine = Engine::new();
    let f = checked_quartet(&engine);
    let result = engine
        .invoke_named(&f, &Value::Null, &named! { "foo" => 49, "bar" => "hello", "baz" => 0 })
        .expect("invoke");
    // the callable still receives the collapsed value
    assert_eq!(
        result,
        Value::Array(vec![49.into(), "hello".into(), Value::Null, Value::Null])
    );
}

#[test]
fn every_rule_in_a_mixed_set_is_enforced() {
    let engine = Engine::new();
    let f = checked_quartet(&engine);
    engine
        .invoke_named(&f, &Value::Null, &named! {
            "foo" => 49, "bar" => "hello", "baz" => 0, "bat" => "battenburg"
        })
        .expect("all rules pass");
    let err = engine
        .invoke_named(&f, &Value::Null, &named! {
            "foo" => 51, "bar" => "hello", "baz" => 0, "bat" => "duckburg"
        })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::ValidationFailed { ref parameter, .. } if parameter == "foo"));
    engine
        .invoke_named(&f, &Value::Null, &named! { "bar" => "hello", "baz" => 0, "bat" => "hamburg" })
        .expect("optional foo may be left out");
    let err = engine
        .invoke_named(&f, &Value::Null, &named! { "foo" => 49, "bar" => "hello", "bat" => "iceburg" })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::RequiredValidation { ref parameter } if parameter == "baz"));
}

#[test]
fn explicit_null_still_fails_a_required_rule() {
    let engine = Engine::new();
    let f = checked_quartet(&engine);
    let err = engine
        .invoke_named(&f, &Value::Null, &named! { "bar" => "hello", "baz" => Value::Null })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::RequiredValidation { ref parameter } if parameter == "baz"));
}

#[test]
fn falsy_descriptor_fields_are_not_mistaken_for_absent_ones() {
    let engine = Engine::new();
    let f = positional("function f(foo)");
    let err = engine
        .add_validations(&f, &named! { "foo" => named! { "required" => 0 } })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(ref msg) if msg.contains("required")));
    let err = engine
        .add_validations(&f, &named! { "foo" => named! { "test" => "" } })
        .unwrap_err();
    assert!(matches!(err, NamedCallError::InvalidSpecification(ref msg) if msg.contains("test")));
    engine
        .add_validations(&f, &named! { "foo" => named! { "required" => false } })
        .expect("false is a boolean");
    assert!(!engine.metadata(&f).expect("metadata").validations()["foo"].is_required());
}
