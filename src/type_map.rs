//! Maps JSON Schema primitive type names to Go type expressions, and
//! property names to exported Go field identifiers.
//!
//! # Default Type Mapping Table
//!
//! | Schema type | Go type | Notes |
//! |-------------|---------|-------|
//! | `boolean` | `bool` | |
//! | `number` | `int64` | Protocol numbers are wire integers, not floats |
//! | `integer` | `int` | |
//! | `string` | `string` | |
//! | `null` | `interface{/*nil*/}` | |
//! | `array` | `[]interface{}` | Untyped arrays only; `items` resolves per element |
//! | `object` | `map[string]interface{}` | Objects with `properties` become structs instead |
//!
//! Every entry can be overridden through [`TypeMap::set`] (or `--map-type`
//! on the command line); union-typed nodes always fall back to [`UNTYPED`].

use std::collections::BTreeMap;

/// The Go catch-all type emitted for union-typed nodes.
pub const UNTYPED: &str = "interface{}";

/// Caller-overridable mapping from schema primitive names to Go types.
#[derive(Debug, Clone)]
pub struct TypeMap {
    entries: BTreeMap<String, String>,
}

impl Default for TypeMap {
    fn default() -> Self {
        let mut entries = BTreeMap::new();
        for (name, go_type) in [
            ("boolean", "bool"),
            ("number", "int64"),
            ("integer", "int"),
            ("string", "string"),
            ("null", "interface{/*nil*/}"),
            ("array", "[]interface{}"),
            ("object", "map[string]interface{}"),
        ] {
            entries.insert(name.to_string(), go_type.to_string());
        }
        Self { entries }
    }
}

impl TypeMap {
    /// Look up the Go type for a schema primitive name.
    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.entries.get(type_name).map(String::as_str)
    }

    /// Add or override a mapping.
    pub fn set(&mut self, type_name: impl Into<String>, go_type: impl Into<String>) {
        self.entries.insert(type_name.into(), go_type.into());
    }

    /// The Go type used for object-typed nodes without properties or an
    /// `additionalProperties` value type.
    pub fn object_type(&self) -> &str {
        self.get("object").unwrap_or("map[string]interface{}")
    }
}

/// Compute the exported Go field identifier for a schema property name.
///
/// Leading underscores are moved to the end one at a time (`_foo` → `foo_`,
/// `__restart` → `restart__`), then the first letter is title-cased. If the
/// result equals the enclosing struct's embedded base type name, a trailing
/// underscore disambiguates:
///
/// - `"foo"` → `"Foo"`
/// - `"_foo"` → `"Foo_"`
/// - `"event"` inside a struct embedding `Event` → `"Event_"`
pub fn field_name(prop_name: &str, embedded_base: &str) -> String {
    let mut name = prop_name;
    let mut shifted = 0;
    while let Some(rest) = name.strip_prefix('_') {
        name = rest;
        shifted += 1;
    }
    let mut chars = name.chars();
    let mut field = match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    };
    field.push_str(&"_".repeat(shifted));
    if !embedded_base.is_empty() && field == embedded_base {
        field.push('_');
    }
    field
}
