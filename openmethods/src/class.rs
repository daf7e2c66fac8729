//! Classes taking part in dispatch.
//!
//! A class is any `'static` Rust type implementing [`Class`]. The trait
//! carries the two facts the engine needs: the type's declared direct
//! bases, used to infer inheritance edges at registration time, and the
//! runtime identity of an object seen through a trait object.

use std::any::{type_name, Any, TypeId};
use std::fmt;

/// A type that can appear as a polymorphic argument.
///
/// ```ignore
/// struct Animal;
/// struct Dog;
///
/// impl Class for Animal {}
/// impl Class for Dog {
///     fn direct_bases() -> Vec<TypeId> {
///         vec![TypeId::of::<Animal>()]
///     }
/// }
/// ```
pub trait Class: Any {
    /// The direct base classes of this type.
    fn direct_bases() -> Vec<TypeId>
    where
        Self: Sized,
    {
        Vec::new()
    }

    /// The runtime class of `self`.
    ///
    /// Called through `&dyn Class` (or any trait object whose trait has
    /// `Class` as a supertrait), this yields the concrete type's id.
    fn dynamic_class(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    /// Display name of the runtime class of `self`, for diagnostics about
    /// classes the dispatcher has never seen.
    fn class_name(&self) -> &'static str {
        short_type_name(type_name::<Self>())
    }
}

impl dyn Class {
    /// Check whether the object's runtime class is exactly `T`.
    pub fn is<T: Class>(&self) -> bool {
        self.dynamic_class() == TypeId::of::<T>()
    }

    /// Narrow to the concrete type `T`.
    pub fn downcast_ref<T: Class>(&self) -> Option<&T> {
        let any: &dyn Any = self;
        any.downcast_ref::<T>()
    }
}

/// Registration record for one class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassInfo {
    type_id: TypeId,
    name: &'static str,
    direct_bases: Vec<TypeId>,
}

impl ClassInfo {
    /// Describe the class `T`.
    pub fn of<T: Class>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            name: short_type_name(type_name::<T>()),
            direct_bases: T::direct_bases(),
        }
    }

    /// Describe a class by hand.
    ///
    /// Useful when the base list is only known at runtime.
    pub fn new(type_id: TypeId, name: &'static str, direct_bases: Vec<TypeId>) -> Self {
        Self {
            type_id,
            name,
            direct_bases,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn direct_bases(&self) -> &[TypeId] {
        &self.direct_bases
    }

    /// Check whether `base` is declared as a direct base of this class.
    pub fn derives_directly_from(&self, base: &ClassInfo) -> bool {
        self.direct_bases.contains(&base.type_id)
    }
}

impl fmt::Display for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Strip the module path from a type name, keeping generic arguments.
fn short_type_name(full: &'static str) -> &'static str {
    let head = full.split('<').next().unwrap_or(full);
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

/// Strip module paths from every path segment of a type name:
/// `(alloc::string::String, u32)` becomes `(String, u32)`.
pub(crate) fn display_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    let mut chars = full.chars().peekable();
    while let Some(c) = chars.next() {
        if c == ':' && chars.peek() == Some(&':') {
            chars.next();
            out.truncate(segment_start);
        } else {
            out.push(c);
            if !(c.is_alphanumeric() || c == '_') {
                segment_start = out.len();
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shape;
    struct Circle;
    struct Tagged<const I: usize>;

    impl Class for Shape {}
    impl Class for Circle {
        fn direct_bases() -> Vec<TypeId> {
            vec![TypeId::of::<Shape>()]
        }
    }
    impl<const I: usize> Class for Tagged<I> {}

    #[test]
    fn test_class_info_of() {
        let circle = ClassInfo::of::<Circle>();
        assert_eq!(circle.name(), "Circle");
        assert_eq!(circle.type_id(), TypeId::of::<Circle>());
        assert!(circle.derives_directly_from(&ClassInfo::of::<Shape>()));
        assert!(!ClassInfo::of::<Shape>().derives_directly_from(&circle));
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::Circle"), "Circle");
        assert_eq!(short_type_name("Circle"), "Circle");
        assert_eq!(short_type_name("a::Tagged<3>"), "Tagged<3>");
        assert_eq!(short_type_name("Wrap<a::b::C>"), "Wrap<a::b::C>");
        assert_eq!(ClassInfo::of::<Tagged<3>>().name(), "Tagged<3>");
    }

    #[test]
    fn test_display_type_name() {
        assert_eq!(display_type_name("alloc::string::String"), "String");
        assert_eq!(display_type_name("(alloc::string::String, u32)"), "(String, u32)");
        assert_eq!(display_type_name("alloc::vec::Vec<core::option::Option<i8>>"), "Vec<Option<i8>>");
        assert_eq!(display_type_name("&str"), "&str");
    }

    #[test]
    fn test_dynamic_class_through_trait_object() {
        let circle: Box<dyn Class> = Box::new(Circle);
        assert_eq!(circle.dynamic_class(), TypeId::of::<Circle>());
        assert!(circle.is::<Circle>());
        assert!(!circle.is::<Shape>());
        assert!(circle.downcast_ref::<Circle>().is_some());
        assert!(circle.downcast_ref::<Shape>().is_none());
        assert_eq!(circle.class_name(), "Circle");

        let tagged: &dyn Class = &Tagged::<3>;
        assert_eq!(tagged.class_name(), ClassInfo::of::<Tagged<3>>().name());
    }
}
