//! Dispatch over a multiple-inheritance hierarchy, and the effect of
//! registering it in separate groups.

#[macro_use]
mod common;

use openmethods::{
    BuildError, Class, ClassInfo, DispatchError, HierarchyCheck, Method, MissingEdge, Registry,
};
use pretty_assertions::assert_eq;

use common::options;

class!(Animal);
class!(Herbivore: Animal);
class!(Carnivore: Animal);
class!(Omnivore: Herbivore, Carnivore);
class!(Human: Omnivore);
class!(Wolf: Omnivore);
class!(Sheep: Herbivore);

type Diet = Method<dyn Class, (), &'static str, 1>;

fn core_classes() -> Vec<ClassInfo> {
    vec![
        ClassInfo::of::<Animal>(),
        ClassInfo::of::<Herbivore>(),
        ClassInfo::of::<Carnivore>(),
        ClassInfo::of::<Omnivore>(),
    ]
}

fn declare_diet(registry: &mut Registry) -> Diet {
    let diet = registry
        .declare::<dyn Class, (), &'static str, 1>("diet", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&diet, [ClassInfo::of::<Herbivore>()], |_, _, ()| "plants")
        .unwrap();
    registry
        .define(&diet, [ClassInfo::of::<Carnivore>()], |_, _, ()| "meat")
        .unwrap();
    registry
        .define(&diet, [ClassInfo::of::<Omnivore>()], |_, _, ()| "anything")
        .unwrap();
    diet
}

#[test]
fn test_registered_together() {
    let mut registry = Registry::new();
    let mut group = core_classes();
    group.extend([
        ClassInfo::of::<Human>(),
        ClassInfo::of::<Wolf>(),
        ClassInfo::of::<Sheep>(),
    ]);
    registry.register_classes(&group).unwrap();
    let diet = declare_diet(&mut registry);
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(diet.call(&dispatcher, [&Human], ()), Ok("anything"));
    assert_eq!(diet.call(&dispatcher, [&Wolf], ()), Ok("anything"));
    assert_eq!(diet.call(&dispatcher, [&Sheep], ()), Ok("plants"));
    assert_eq!(diet.call(&dispatcher, [&Carnivore], ()), Ok("meat"));
    assert!(dispatcher.report().is_clean());

    let classes = registry.classes();
    let human = classes.class_id(std::any::TypeId::of::<Human>()).unwrap();
    let animal = classes.class_id(std::any::TypeId::of::<Animal>()).unwrap();
    assert!(classes.is_subclass(human, animal));
    // Animal is reachable through both Herbivore and Carnivore but listed once.
    assert_eq!(classes.ancestors(human).len(), 5);
}

#[test]
fn test_separate_groups_do_not_connect() {
    let mut registry = Registry::new();
    registry.register_classes(&core_classes()).unwrap();
    registry
        .register_classes(&[ClassInfo::of::<Human>(), ClassInfo::of::<Wolf>()])
        .unwrap();
    let diet = declare_diet(&mut registry);
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(diet.call(&dispatcher, [&Omnivore], ()), Ok("anything"));
    assert_eq!(
        diet.call(&dispatcher, [&Human], ()),
        Err(DispatchError::ClassOutsideHierarchy {
            method: "diet",
            position: 0,
            class: "Human",
        })
    );

    assert_eq!(
        dispatcher.report().missing_edges,
        vec![
            MissingEdge { derived: "Human", base: "Omnivore" },
            MissingEdge { derived: "Wolf", base: "Omnivore" },
        ]
    );
}

#[test]
fn test_later_group_repairs_the_edge() {
    let mut registry = Registry::new();
    registry.register_classes(&core_classes()).unwrap();
    registry.register_classes(&[ClassInfo::of::<Human>()]).unwrap();
    registry
        .register_classes(&[ClassInfo::of::<Omnivore>(), ClassInfo::of::<Human>()])
        .unwrap();
    let diet = declare_diet(&mut registry);
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    assert_eq!(diet.call(&dispatcher, [&Human], ()), Ok("anything"));
    assert!(registry.classes().missing_edges().is_empty());
}

#[test]
fn test_deny_rejects_incomplete_hierarchy() {
    let mut registry = Registry::new();
    registry.register_classes(&core_classes()).unwrap();
    registry.register_classes(&[ClassInfo::of::<Sheep>()]).unwrap();
    declare_diet(&mut registry);

    let err = registry
        .update_methods_with(&options().with_hierarchy_check(HierarchyCheck::Deny))
        .unwrap_err();
    assert_eq!(
        err,
        BuildError::IncompleteHierarchy {
            edges: vec![MissingEdge { derived: "Sheep", base: "Herbivore" }],
        }
    );

    let dispatcher = registry
        .update_methods_with(&options().with_hierarchy_check(HierarchyCheck::Ignore))
        .unwrap();
    assert!(dispatcher.report().missing_edges.is_empty());
}

#[test]
fn test_without_omnivore_definition_the_call_is_ambiguous() {
    let mut registry = Registry::new();
    let mut group = core_classes();
    group.push(ClassInfo::of::<Human>());
    registry.register_classes(&group).unwrap();

    let diet = registry
        .declare::<dyn Class, (), &'static str, 1>("diet", [ClassInfo::of::<Animal>()])
        .unwrap();
    registry
        .define(&diet, [ClassInfo::of::<Herbivore>()], |_, _, ()| "plants")
        .unwrap();
    registry
        .define(&diet, [ClassInfo::of::<Carnivore>()], |_, _, ()| "meat")
        .unwrap();
    let dispatcher = registry.update_methods_with(&options()).unwrap();

    let err = diet.call(&dispatcher, [&Human], ()).unwrap_err();
    assert_eq!(
        err,
        DispatchError::Ambiguous {
            method: "diet",
            classes: "Human".to_string(),
            candidates: vec!["diet(Herbivore)".to_string(), "diet(Carnivore)".to_string()],
        }
    );
    assert_eq!(
        dispatcher.report().ambiguities[0].to_string(),
        "diet(Omnivore|Human) matches diet(Herbivore) and diet(Carnivore)"
    );
}

#[test]
fn test_definition_on_unregistered_class_fails_the_build() {
    let mut registry = Registry::new();
    registry.register_classes(&core_classes()).unwrap();
    let diet = declare_diet(&mut registry);
    registry
        .define(&diet, [ClassInfo::of::<Sheep>()], |_, _, ()| "grass")
        .unwrap();

    assert_eq!(
        registry.update_methods_with(&options()).unwrap_err(),
        BuildError::UnregisteredClass {
            method: "diet",
            class: "Sheep",
        }
    );
}
