//! Resolved source-language types as reported by the semantic model.

use itertools::Itertools;
use std::fmt::{Display, Formatter};

common_enum! {
    #[derive(Copy, Eq, Hash)]
    pub enum BasicKind {
        Bool,
        Int,
        Int8,
        Int16,
        Int32,
        Int64,
        Uint,
        Uint8,
        Uint16,
        Uint32,
        Uint64,
        Uintptr,
        Float32,
        Float64,
        Complex64,
        Complex128,
        String,
        UnsafePointer,
        UntypedBool,
        UntypedInt,
        UntypedRune,
        UntypedFloat,
        UntypedString,
        UntypedNil,
    }
}

impl BasicKind {
    pub fn name(&self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_unsigned(&self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, BasicKind::Complex64 | BasicKind::Complex128)
    }

    /// Bit width of integer kinds narrower than the target's 53-bit safe range.
    pub fn narrow_bits(&self) -> Option<u32> {
        match self {
            BasicKind::Int8 | BasicKind::Uint8 => Some(8),
            BasicKind::Int16 | BasicKind::Uint16 => Some(16),
            BasicKind::Int32 | BasicKind::Uint32 => Some(32),
            _ => None,
        }
    }
}

common_struct! {
    pub struct Field {
        pub name: String,
        pub ty: Type,
    }
}

common_struct! {
    pub struct TypeStruct {
        pub fields: Vec<Field>,
    }
}

common_struct! {
    pub struct TypeArray {
        pub elem: Box<Type>,
        pub len: u64,
    }
}

common_struct! {
    pub struct TypeMap {
        pub key: Box<Type>,
        pub elem: Box<Type>,
    }
}

common_struct! {
    pub struct TypeInterface {
        pub methods: Vec<String>,
    }
}

common_struct! {
    pub struct TypeNamed {
        pub name: String,
        pub underlying: Type,
    }
}

common_struct! {
    pub struct Signature {
        pub params: Vec<Type>,
        pub results: Vec<Type>,
        #[serde(default)]
        pub variadic: bool,
    }
}

impl Signature {
    pub fn new(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    pub fn with_variadic(mut self, variadic: bool) -> Self {
        self.variadic = variadic;
        self
    }
}

common_enum! {
    pub enum Type {
        Basic(BasicKind),
        Named(Box<TypeNamed>),
        Struct(TypeStruct),
        Array(TypeArray),
        Slice(Box<Type>),
        Map(TypeMap),
        Pointer(Box<Type>),
        Chan(Box<Type>),
        Interface(TypeInterface),
        Signature(Box<Signature>),
        Tuple(Vec<Type>),
    }
}

impl Type {
    pub fn int() -> Type {
        Type::Basic(BasicKind::Int)
    }
    pub fn bool() -> Type {
        Type::Basic(BasicKind::Bool)
    }
    pub fn string() -> Type {
        Type::Basic(BasicKind::String)
    }
    pub fn untyped_nil() -> Type {
        Type::Basic(BasicKind::UntypedNil)
    }
    pub fn named(name: impl Into<String>, underlying: Type) -> Type {
        Type::Named(Box::new(TypeNamed {
            name: name.into(),
            underlying,
        }))
    }
    pub fn structure(fields: Vec<(&str, Type)>) -> Type {
        Type::Struct(TypeStruct {
            fields: fields
                .into_iter()
                .map(|(name, ty)| Field {
                    name: name.to_string(),
                    ty,
                })
                .collect(),
        })
    }
    pub fn array(elem: Type, len: u64) -> Type {
        Type::Array(TypeArray {
            elem: Box::new(elem),
            len,
        })
    }
    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }
    pub fn map(key: Type, elem: Type) -> Type {
        Type::Map(TypeMap {
            key: Box::new(key),
            elem: Box::new(elem),
        })
    }
    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }
    pub fn chan(elem: Type) -> Type {
        Type::Chan(Box::new(elem))
    }
    pub fn empty_interface() -> Type {
        Type::Interface(TypeInterface {
            methods: Vec::new(),
        })
    }
    pub fn signature(params: Vec<Type>, results: Vec<Type>) -> Type {
        Type::Signature(Box::new(Signature::new(params, results)))
    }

    /// Strips any chain of named types.
    pub fn underlying(&self) -> &Type {
        let mut ty = self;
        while let Type::Named(named) = ty {
            ty = &named.underlying;
        }
        ty
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.underlying(), Type::Interface(_))
    }

    pub fn is_untyped_nil(&self) -> bool {
        matches!(self, Type::Basic(BasicKind::UntypedNil))
    }

    pub fn basic(&self) -> Option<&BasicKind> {
        match self.underlying() {
            Type::Basic(kind) => Some(kind),
            _ => None,
        }
    }

    /// Element type of arrays, slices, maps, channels and pointers to arrays.
    pub fn elem(&self) -> Option<&Type> {
        match self.underlying() {
            Type::Array(array) => Some(&array.elem),
            Type::Slice(elem) | Type::Chan(elem) => Some(elem),
            Type::Map(map) => Some(&map.elem),
            Type::Pointer(inner) => match inner.underlying() {
                Type::Array(array) => Some(&array.elem),
                _ => None,
            },
            _ => None,
        }
    }

    /// Whether values of this type, used as map keys, must be routed through
    /// the runtime key derivation so structurally equal keys share a slot.
    pub fn needs_key_normalization(&self) -> bool {
        match self.underlying() {
            Type::Basic(kind) => kind.is_complex(),
            Type::Struct(_)
            | Type::Array(_)
            | Type::Pointer(_)
            | Type::Interface(_)
            | Type::Chan(_) => true,
            _ => false,
        }
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Named(named) => write!(f, "{}", named.name),
            Type::Struct(st) => write!(
                f,
                "struct {{ {} }}",
                st.fields
                    .iter()
                    .map(|field| format!("{} {}", field.name, field.ty))
                    .join("; ")
            ),
            Type::Array(array) => write!(f, "[{}]{}", array.len, array.elem),
            Type::Slice(elem) => write!(f, "[]{}", elem),
            Type::Map(map) => write!(f, "map[{}]{}", map.key, map.elem),
            Type::Pointer(elem) => write!(f, "*{}", elem),
            Type::Chan(elem) => write!(f, "chan {}", elem),
            Type::Interface(iface) if iface.methods.is_empty() => write!(f, "interface{{}}"),
            Type::Interface(iface) => write!(f, "interface {{ {} }}", iface.methods.join("; ")),
            Type::Signature(sig) => write!(
                f,
                "func({}) ({})",
                sig.params.iter().join(", "),
                sig.results.iter().join(", ")
            ),
            Type::Tuple(items) => write!(f, "({})", items.iter().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underlying_strips_named_chains() {
        let inner = Type::named("Inner", Type::structure(vec![("x", Type::int())]));
        let outer = Type::named("Outer", inner);
        assert!(matches!(outer.underlying(), Type::Struct(_)));
        assert_eq!(outer.to_string(), "Outer");
    }

    #[test]
    fn element_of_pointer_to_array() {
        let ty = Type::pointer(Type::array(Type::Basic(BasicKind::Uint8), 4));
        assert_eq!(ty.elem(), Some(&Type::Basic(BasicKind::Uint8)));
        assert_eq!(Type::pointer(Type::int()).elem(), None);
    }

    #[test]
    fn key_normalization_for_non_primitive_keys() {
        assert!(!Type::string().needs_key_normalization());
        assert!(!Type::int().needs_key_normalization());
        assert!(Type::Basic(BasicKind::Complex128).needs_key_normalization());
        assert!(Type::named("Point", Type::structure(vec![("x", Type::int())]))
            .needs_key_normalization());
        assert!(Type::empty_interface().needs_key_normalization());
    }

    #[test]
    fn displays_go_syntax() {
        let ty = Type::map(Type::string(), Type::slice(Type::int()));
        assert_eq!(ty.to_string(), "map[string][]int");
        assert_eq!(Type::empty_interface().to_string(), "interface{}");
    }
}
