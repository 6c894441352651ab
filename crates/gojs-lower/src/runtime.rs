//! Names of the runtime support helpers emitted code calls into.

use gojs_core::types::Type;

pub const DEFERRED: &str = "Go$deferred";
pub const RECOVER: &str = "Go$recover";
pub const TUPLE: &str = "Go$tuple";
pub const KEYS: &str = "Go$keys";
pub const DECODE_RUNE: &str = "Go$decodeRune";
pub const PANIC: &str = "Go$Panic";
pub const THROW_RUNTIME_ERROR: &str = "Go$throwRuntimeError";
pub const MAP_NIL: &str = "Go$Map.Go$nil";
pub const KEY: &str = "Go$key";
pub const SET: &str = "Go$set";
pub const GET: &str = "Go$get";
pub const VAL: &str = "Go$val";
pub const CLONE: &str = "Go$clone";
pub const POINTER: &str = "Go$Pointer";
pub const SLICE: &str = "Go$Slice";
pub const SLICE_NIL: &str = "Go$Slice.Go$nil";
pub const APPEND: &str = "Go$append";
pub const APPEND_SLICE: &str = "Go$appendSlice";
pub const ASSERT_TYPE: &str = "Go$assertType";
pub const MAKE_ARRAY: &str = "Go$makeArray";

/// Slot under which a map stores the entry for `key`.
pub fn map_key(key: &str, ty: &Type) -> String {
    if ty.needs_key_normalization() {
        format!("({} || {}).{}()", key, MAP_NIL, KEY)
    } else {
        key.to_string()
    }
}

pub fn panic_stub(message: &str) -> String {
    format!("throw new {}(\"{}\");", PANIC, message)
}

/// Stub standing in for a statement kind that is recognized but not lowered.
pub fn unsupported_stmt(kind: &str) -> String {
    panic_stub(&format!("Statement not supported: {}", kind))
}

pub fn index_check(index: &str, slice: &str) -> String {
    format!(
        "if ({index} < 0 || {index} >= {slice}.length) {{ {}(\"index out of range\"); }}",
        THROW_RUNTIME_ERROR
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use gojs_core::types::BasicKind;

    #[test]
    fn primitive_keys_are_used_as_is() {
        assert_eq!(map_key("_key", &Type::string()), "_key");
        assert_eq!(map_key("_key", &Type::Basic(BasicKind::Uint8)), "_key");
    }

    #[test]
    fn composite_keys_are_normalized() {
        let point = Type::named("Point", Type::structure(vec![("x", Type::int())]));
        assert_eq!(map_key("_key", &point), "(_key || Go$Map.Go$nil).Go$key()");
    }

    #[test]
    fn stubs_name_the_construct() {
        assert_eq!(
            unsupported_stmt("select"),
            r#"throw new Go$Panic("Statement not supported: select");"#
        );
    }
}
