//! Bundled sample registries.

use std::any::TypeId;

use clap::ValueEnum;
use openmethods::{Class, ClassInfo, DispatchError, Dispatcher, Method, RegistrationResult, Registry};

macro_rules! classes {
    ($($name:ident $(: $($base:ident),+)?;)+) => {
        $(
            struct $name;
            impl Class for $name {
                fn direct_bases() -> Vec<TypeId> {
                    vec![$($(TypeId::of::<$base>()),+)?]
                }
            }
        )+
    };
}

classes! {
    Animal;
    Herbivore: Animal;
    Carnivore: Animal;
    Omnivore: Herbivore, Carnivore;
    Human: Omnivore;
    Wolf: Omnivore;
    Sheep: Herbivore;
    Dog: Carnivore;
    Bulldog: Dog;
    Cat: Carnivore;
}

/// A sample hierarchy and its methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Sample {
    /// `kick` and `diet` over the full animal hierarchy
    Animals,
    /// Two-argument `meet` with crossed definitions
    Meet,
    /// The animal hierarchy registered in two groups that never pair
    /// `Human` and `Wolf` with `Omnivore`
    Split,
}

/// One probe call: a label and its outcome.
pub type Probe = (String, Result<String, DispatchError>);

/// A registry ready to compile, plus calls exercising the result.
pub struct Built {
    pub registry: Registry,
    probes: Box<dyn Fn(&Dispatcher) -> Vec<Probe>>,
}

impl Built {
    pub fn probe(&self, dispatcher: &Dispatcher) -> Vec<Probe> {
        (self.probes)(dispatcher)
    }
}

impl Sample {
    pub fn build(self) -> RegistrationResult<Built> {
        match self {
            Sample::Animals => animals(),
            Sample::Meet => meet(),
            Sample::Split => split(),
        }
    }
}

fn hierarchy() -> Vec<ClassInfo> {
    vec![
        ClassInfo::of::<Animal>(),
        ClassInfo::of::<Herbivore>(),
        ClassInfo::of::<Carnivore>(),
        ClassInfo::of::<Omnivore>(),
        ClassInfo::of::<Human>(),
        ClassInfo::of::<Wolf>(),
        ClassInfo::of::<Sheep>(),
        ClassInfo::of::<Dog>(),
        ClassInfo::of::<Bulldog>(),
        ClassInfo::of::<Cat>(),
    ]
}

fn named<T: Class>(object: T) -> (&'static str, Box<dyn Class>) {
    (ClassInfo::of::<T>().name(), Box::new(object))
}

/// One instance of every concrete class.
fn zoo() -> Vec<(&'static str, Box<dyn Class>)> {
    vec![
        named(Animal),
        named(Human),
        named(Wolf),
        named(Sheep),
        named(Dog),
        named(Bulldog),
        named(Cat),
    ]
}

type Unary = Method<dyn Class, (), String, 1>;

fn declare_diet(registry: &mut Registry) -> RegistrationResult<Unary> {
    let diet: Unary = registry.declare("diet", [ClassInfo::of::<Animal>()])?;
    registry.define(&diet, [ClassInfo::of::<Herbivore>()], |_, _, ()| "plants".to_string())?;
    registry.define(&diet, [ClassInfo::of::<Carnivore>()], |_, _, ()| "meat".to_string())?;
    registry.define(&diet, [ClassInfo::of::<Omnivore>()], |next, animals, ()| {
        match next.call(animals, ()) {
            Ok(usual) => format!("{usual} and more"),
            Err(_) => "anything".to_string(),
        }
    })?;
    Ok(diet)
}

fn unary_probes(methods: Vec<Unary>) -> Box<dyn Fn(&Dispatcher) -> Vec<Probe>> {
    Box::new(move |dispatcher: &Dispatcher| {
        let mut probes = Vec::new();
        for method in &methods {
            for (name, animal) in zoo() {
                let outcome = method.call(dispatcher, [&*animal], ());
                probes.push((format!("{}({name})", method.name()), outcome));
            }
        }
        probes
    })
}

fn animals() -> RegistrationResult<Built> {
    let mut registry = Registry::new();
    registry.register_classes(&hierarchy())?;

    let kick: Unary = registry.declare("kick", [ClassInfo::of::<Animal>()])?;
    registry.define(&kick, [ClassInfo::of::<Dog>()], |_, _, ()| "bark".to_string())?;
    registry.define(&kick, [ClassInfo::of::<Bulldog>()], |next, animals, ()| {
        match next.call(animals, ()) {
            Ok(bark) => format!("{bark} and bite back"),
            Err(err) => err.to_string(),
        }
    })?;
    let diet = declare_diet(&mut registry)?;

    Ok(Built {
        registry,
        probes: unary_probes(vec![kick, diet]),
    })
}

fn split() -> RegistrationResult<Built> {
    let mut registry = Registry::new();
    let classes = hierarchy();
    registry.register_classes(&classes[..4])?;
    registry.register_classes(&classes[4..6])?;
    registry.register_classes(&[classes[0].clone(), classes[1].clone(), classes[6].clone()])?;
    registry.register_classes(&[classes[2].clone(), classes[7].clone(), classes[8].clone(), classes[9].clone()])?;

    let diet = declare_diet(&mut registry)?;
    Ok(Built {
        registry,
        probes: unary_probes(vec![diet]),
    })
}

fn meet() -> RegistrationResult<Built> {
    let mut registry = Registry::new();
    registry.register_classes(&hierarchy())?;

    let animal = ClassInfo::of::<Animal>;
    let meet: Method<dyn Class, (), String, 2> = registry.declare("meet", [animal(), animal()])?;
    registry.define(&meet, [animal(), animal()], |_, _, ()| "ignore".to_string())?;
    registry.define(&meet, [ClassInfo::of::<Carnivore>(), ClassInfo::of::<Herbivore>()], |_, _, ()| {
        "hunt".to_string()
    })?;
    registry.define(&meet, [ClassInfo::of::<Herbivore>(), ClassInfo::of::<Carnivore>()], |_, _, ()| {
        "flee".to_string()
    })?;
    registry.define(&meet, [ClassInfo::of::<Dog>(), ClassInfo::of::<Cat>()], |next, animals, ()| {
        match next.call(animals, ()) {
            Ok(_) => "chase".to_string(),
            Err(err) => err.to_string(),
        }
    })?;

    let probes = Box::new(move |dispatcher: &Dispatcher| {
        let mut probes = Vec::new();
        for (left, first) in zoo() {
            for (right, second) in zoo() {
                let outcome = meet.call(dispatcher, [&*first, &*second], ());
                probes.push((format!("meet({left}, {right})"), outcome));
            }
        }
        probes
    });

    Ok(Built { registry, probes })
}
