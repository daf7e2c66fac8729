//! Single-argument dispatch and delegation through `next`.

#[macro_use]
mod common;

use std::any::TypeId;
use std::sync::Arc;
use std::thread;

use openmethods::{
    Class, ClassInfo, DispatchError, Method, NextTarget, RebuildOptions, RegistrationError,
    Registry, UnknownClassPolicy,
};
use pretty_assertions::assert_eq;

use common::{init_tracing, options};

class!(Animal);
class!(Dog: Animal);
class!(Bulldog: Dog);
class!(Cat: Animal);
class!(Fish);

type Kick = Method<dyn Class, (), String, 1>;

fn animals() -> Registry {
    let mut registry = Registry::new();
    registry
        .register_classes(&[
            ClassInfo::of::<Animal>(),
            ClassInfo::of::<Dog>(),
            ClassInfo::of::<Bulldog>(),
            ClassInfo::of::<Cat>(),
        ])
        .unwrap();
    registry
}

fn with_kick() -> (Registry, Kick) {
    let mut registry = animals();
    let kick = registry
        .declare::<dyn Class, (), String, 1>("kick", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&kick, [ClassInfo::of::<Dog>()], |_, _, ()| "bark".to_string())
        .unwrap();
    registry
        .define(&kick, [ClassInfo::of::<Bulldog>()], |next, animals, ()| {
            format!("{} and bite back", next.call(animals, ()).unwrap())
        })
        .unwrap();
    (registry, kick)
}

#[test]
fn test_most_specific_definition_runs() {
    let (registry, kick) = with_kick();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let bulldog: Box<dyn Class> = Box::new(Bulldog);
    let dog: Box<dyn Class> = Box::new(Dog);
    assert_eq!(kick.call(&dispatcher, [&*bulldog], ()).unwrap(), "bark and bite back");
    assert_eq!(kick.call(&dispatcher, [&*dog], ()).unwrap(), "bark");
}

#[test]
fn test_missing_definition_is_reported() {
    let (registry, kick) = with_kick();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(
        kick.call(&dispatcher, [&Cat], ()),
        Err(DispatchError::NoDefinition {
            method: "kick",
            classes: "Cat".to_string(),
        })
    );
    assert!(kick.call(&dispatcher, [&Animal], ()).is_err());
}

#[test]
fn test_resolve_and_next_of() {
    let (registry, kick) = with_kick();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let bulldog = kick.resolve(&dispatcher, [TypeId::of::<Bulldog>()]).unwrap();
    let dog = kick.resolve(&dispatcher, [TypeId::of::<Dog>()]).unwrap();
    assert_eq!(dispatcher.definition_name(bulldog), Some("kick(Bulldog)"));
    assert_eq!(dispatcher.definition_name(dog), Some("kick(Dog)"));

    assert_eq!(dispatcher.next_of(bulldog), Ok(NextTarget::Definition(dog)));
    assert_eq!(dispatcher.next_of(dog), Ok(NextTarget::Exhausted));
}

#[test]
fn test_exhausted_next_is_an_error() {
    let mut registry = animals();
    let greet = registry
        .declare::<dyn Class, (), Result<String, DispatchError>, 1>("greet", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&greet, [ClassInfo::of::<Dog>()], |next, animals, ()| {
            assert!(!next.exists());
            next.call(animals, ()).and_then(|greeting| greeting)
        })
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(
        greet.call(&dispatcher, [&Dog], ()).unwrap(),
        Err(DispatchError::NoNextDefinition {
            method: "greet",
            definition: "greet(Dog)".to_string(),
        })
    );
}

#[test]
fn test_ordinary_arguments_pass_through() {
    let mut registry = animals();
    let feed = registry
        .declare::<dyn Class, (u32,), u32, 1>("feed", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&feed, [ClassInfo::of::<Animal>()], |_, _, (grams,)| grams)
        .unwrap();
    registry
        .define(&feed, [ClassInfo::of::<Dog>()], |next, animals, (grams,)| {
            next.call(animals, (grams * 2,)).unwrap() + 1
        })
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(feed.call(&dispatcher, [&Cat], (10,)), Ok(10));
    assert_eq!(feed.call(&dispatcher, [&Bulldog], (10,)), Ok(21));
    assert_eq!(
        registry.method(feed.id()).unwrap().to_string(),
        "feed(virtual Animal, (u32,)) -> u32"
    );
}

#[test]
fn test_definitions_can_narrow_their_argument() {
    struct Named(&'static str);
    impl Class for Named {}

    let mut registry = Registry::new();
    registry.register_classes(&[ClassInfo::of::<Named>()]).unwrap();
    let name = registry
        .declare::<dyn Class, (), &'static str, 1>("name", [ClassInfo::of::<Named>()])
        .unwrap();
    registry
        .define(&name, [ClassInfo::of::<Named>()], |_, [object], ()| {
            object.downcast_ref::<Named>().map_or("?", |n| n.0)
        })
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(name.call(&dispatcher, [&Named("rex")], ()), Ok("rex"));
}

#[test]
fn test_user_trait_objects_dispatch() {
    trait Pet: Class {
        fn noise(&self) -> &'static str;
    }
    impl Pet for Dog {
        fn noise(&self) -> &'static str {
            "woof"
        }
    }
    impl Pet for Bulldog {
        fn noise(&self) -> &'static str {
            "grr"
        }
    }

    let mut registry = animals();
    let speak = registry
        .declare::<dyn Pet, (), String, 1>("speak", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&speak, [ClassInfo::of::<Dog>()], |_, [pet], ()| pet.noise().to_string())
        .unwrap();
    registry
        .define(&speak, [ClassInfo::of::<Bulldog>()], |next, [pet], ()| {
            format!("{}, {}", pet.noise(), next.call([pet], ()).unwrap())
        })
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let pets: Vec<Box<dyn Pet>> = vec![Box::new(Dog), Box::new(Bulldog)];
    let said: Vec<_> = pets
        .iter()
        .map(|pet| speak.call(&dispatcher, [&**pet], ()).unwrap())
        .collect();
    assert_eq!(said, vec!["woof", "grr, grr"]);
}

#[test]
fn test_unregistered_runtime_class_returns_error() {
    let (registry, kick) = with_kick();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let err = kick.call(&dispatcher, [&Fish], ()).unwrap_err();
    assert_eq!(
        err,
        DispatchError::UnregisteredClass {
            method: "kick",
            position: 0,
            class: "Fish".to_string(),
        }
    );
    assert_eq!(
        err.to_string(),
        "method `kick`: runtime class `Fish` of argument 0 was never registered"
    );

    // Without an object there is no name to report.
    let err = kick.resolve(&dispatcher, [TypeId::of::<Fish>()]).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::UnregisteredClass { method: "kick", position: 0, .. }
    ));
}

#[test]
#[should_panic(expected = "runtime class `Fish` of argument 0 was never registered")]
fn test_unregistered_runtime_class_aborts() {
    let (registry, kick) = with_kick();
    let options = RebuildOptions::default().with_unknown_class(UnknownClassPolicy::Abort);
    let dispatcher = registry.update_methods_with(&options).unwrap();

    let _ = kick.call(&dispatcher, [&Fish], ());
}

#[test]
fn test_rebuild_is_idempotent() {
    let (registry, _) = with_kick();
    let first = registry.update_methods_with(&options()).unwrap();
    let second = registry.update_methods_with(&options()).unwrap();

    assert_eq!(first.describe(), second.describe());
    assert_eq!(first.report(), second.report());
}

#[test]
fn test_rebuild_does_not_touch_existing_dispatcher() {
    let (mut registry, kick) = with_kick();
    let before = registry.update_methods_with(&options()).unwrap();

    registry
        .define(&kick, [ClassInfo::of::<Cat>()], |_, _, ()| "hiss".to_string())
        .unwrap();
    let after = registry.update_methods_with(&options()).unwrap();

    assert!(matches!(
        kick.call(&before, [&Cat], ()),
        Err(DispatchError::NoDefinition { .. })
    ));
    assert_eq!(kick.call(&after, [&Cat], ()), Ok("hiss".to_string()));
}

#[test]
fn test_dispatcher_is_shared_across_threads() {
    let (registry, kick) = with_kick();
    let dispatcher = Arc::new(registry.update_methods_with(&options()).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || kick.call(&dispatcher, [&Bulldog], ()).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "bark and bite back");
    }
}

#[test]
fn test_methods_are_keyed_by_name_and_signature() {
    let mut registry = animals();
    registry
        .declare::<dyn Class, (), String, 1>("kick", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .declare::<dyn Class, (u8,), String, 1>("kick", [ClassInfo::of::<Animal>()])
        .unwrap();

    let err = registry
        .declare::<dyn Class, (), String, 1>("kick", [ClassInfo::of::<Animal>()])
        .unwrap_err();
    assert_eq!(err, RegistrationError::DuplicateMethod { name: "kick" });
    assert_eq!(registry.methods().count(), 2);
}

#[test]
fn test_duplicate_definition_is_rejected() {
    let (mut registry, kick) = with_kick();
    let err = registry
        .define(&kick, [ClassInfo::of::<Dog>()], |_, _, ()| "woof".to_string())
        .unwrap_err();
    assert_eq!(
        err,
        RegistrationError::DuplicateDefinition {
            method: "kick",
            classes: "Dog".to_string(),
        }
    );
}

#[test]
fn test_handle_from_another_registry_is_unknown() {
    let (_, kick) = with_kick();
    let mut other = Registry::new();
    let err = other
        .define(&kick, [ClassInfo::of::<Dog>()], |_, _, ()| String::new())
        .unwrap_err();
    assert_eq!(err, RegistrationError::UnknownMethod { name: "kick" });
}

#[test]
fn test_handle_from_another_dispatcher_is_a_signature_mismatch() {
    let (_, kick) = with_kick();
    let mut other = animals();
    let weigh = other
        .declare::<dyn Class, (), u32, 1>("weigh", [ClassInfo::of::<Animal>()])
        .unwrap();
    other
        .define(&weigh, [ClassInfo::of::<Animal>()], |_, _, ()| 10)
        .unwrap();
    let dispatcher = other.update_methods_with(&options()).unwrap();

    // `kick` and `weigh` share the first method slot.
    assert_eq!(kick.id(), weigh.id());
    let mismatch = DispatchError::SignatureMismatch { method: "weigh" };
    assert_eq!(kick.resolve(&dispatcher, [TypeId::of::<Dog>()]), Err(mismatch.clone()));
    assert_eq!(kick.call(&dispatcher, [&Dog], ()), Err(mismatch));
    assert_eq!(weigh.call(&dispatcher, [&Dog], ()), Ok(10));
}

#[test]
fn test_named_definitions() {
    let mut registry = animals();
    let kick = registry
        .declare::<dyn Class, (), String, 1>("kick", [ClassInfo::of::<Animal>()])
        .unwrap();
    let handle = registry
        .define_named(&kick, "kick_any_animal", [ClassInfo::of::<Animal>()], |_, _, ()| {
            "ouch".to_string()
        })
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(dispatcher.definition_name(handle), Some("kick_any_animal"));
    assert_eq!(kick.call(&dispatcher, [&Bulldog], ()), Ok("ouch".to_string()));
}

#[test]
fn test_report_and_describe() {
    let (registry, _) = with_kick();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let report = dispatcher.report();
    assert!(report.is_clean());
    let stats = report.method("kick").unwrap();
    assert_eq!(stats.signature, "kick(virtual Animal) -> String");
    assert_eq!(stats.definitions, 2);
    assert_eq!(stats.groups, vec![3]);
    assert_eq!((stats.resolved, stats.no_match, stats.ambiguous), (2, 1, 0));

    let description = dispatcher.describe();
    assert!(description.contains("(Animal|Cat) -> no definition"));
    assert!(description.contains("(Bulldog) -> kick(Bulldog)"));
    assert!(description.contains("kick(Bulldog) next -> kick(Dog)"));
}

#[test]
fn test_trace_option_builds_the_same_tables() {
    init_tracing();
    let (registry, kick) = with_kick();
    let quiet = registry.update_methods_with(&options()).unwrap();
    let traced = registry.update_methods_with(&options().with_trace(true)).unwrap();

    assert_eq!(quiet.describe(), traced.describe());
    assert_eq!(kick.call(&traced, [&Bulldog], ()), Ok("bark and bite back".to_string()));
}
