//! Go source generation from a flattened schema document.
//!
//! [`generate`] walks the definitions once and emits, in order: the header
//! comment, the `package` clause, fixed imports (only when decode dispatch
//! is requested), one declaration per definition (struct or type alias, each
//! preceded by its rendered description, structs followed by their
//! `propagateFieldsToBase` method when any helper generation is on), then
//! the optional constructor, decode-dispatch, and handling-scaffold
//! sections.
//!
//! The output is deterministic: identical input always produces
//! byte-identical output, with definitions, fields, and dispatch tables
//! sorted by name.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::error::{Error, Result};
use crate::helpers;
use crate::schema::{Definition, SchemaDocument, ref_target};
use crate::type_map::{TypeMap, UNTYPED, field_name};

/// Attribution line closing the generated header comment.
const PACKAGE_DOC_SUFFIX: &str = "Package codegen'd via jsonschema-go-gen";

/// Everything [`generate`] needs beyond the schema document itself.
#[derive(Debug, Clone)]
pub struct Options {
    /// Go package name for the generated source's `package` clause.
    pub package_name: String,

    /// Final line of the generated header comment.
    pub package_doc_suffix: String,

    /// Schema-primitive → Go type table used during type resolution.
    pub type_map: TypeMap,

    /// Base types to emit downcast accessors and variant constructors for.
    pub ctor_base_types: Vec<String>,

    /// Base type → discriminator property: emits one `TryUnmarshal<Base>`
    /// decode-dispatch function per entry.
    pub decode_helpers: BTreeMap<String, String>,

    /// Input base → output base: emits `On<Variant>` callback slots and one
    /// `Handle<InputBase>` dispatcher per entry.
    pub handling_scaffolds: BTreeMap<String, String>,
}

impl Options {
    /// Options for `package_name` with the default type map, the default
    /// attribution line, and no helper generation.
    pub fn new(package_name: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            package_doc_suffix: PACKAGE_DOC_SUFFIX.to_string(),
            type_map: TypeMap::default(),
            ctor_base_types: Vec::new(),
            decode_helpers: BTreeMap::new(),
            handling_scaffolds: BTreeMap::new(),
        }
    }
}

/// Generate the complete Go source text for a schema document.
///
/// The document must already be flattened (see [`crate::schema::parse`]);
/// this pass only reads it, so repeated calls over the same document are
/// byte-identical.
pub fn generate(schema: &SchemaDocument, opts: &Options) -> Result<String> {
    let mut out = String::new();

    let header = format!(
        "{}\n\n{}\n\n{}",
        schema.title, schema.description, opts.package_doc_suffix
    );
    write_desc(&mut out, 0, &header);
    writeln!(out, "package {}", opts.package_name).unwrap();
    if !opts.decode_helpers.is_empty() {
        writeln!(out, "import \"encoding/json\"").unwrap();
        writeln!(out, "import \"errors\"").unwrap();
        writeln!(out, "import \"strings\"").unwrap();
    }

    // Struct declarations carry a propagation method whenever any helper
    // family is requested: constructors and the generated decode/scaffold
    // bodies all call it, on every type of a chain.
    let with_propagation = !opts.ctor_base_types.is_empty()
        || !opts.decode_helpers.is_empty()
        || !opts.handling_scaffolds.is_empty();

    for (name, def) in &schema.definitions {
        emit_declaration(&mut out, name, def, schema, opts, with_propagation)?;
    }

    let candidates = helpers::ctor_candidates(schema, opts)?;
    helpers::emit_ctors(&mut out, schema, opts, &candidates);
    for (base, prop) in &opts.decode_helpers {
        helpers::emit_decode_helper(&mut out, schema, opts, base, prop)?;
    }
    for (in_base, out_base) in &opts.handling_scaffolds {
        helpers::emit_handling_scaffold(&mut out, schema, in_base, out_base, &candidates);
    }

    Ok(out)
}

// ── Declaration emission ───────────────────────────────────────────────

/// Emit one top-level declaration: a struct for object definitions with
/// properties, a type alias for everything else.
fn emit_declaration(
    out: &mut String,
    name: &str,
    def: &Definition,
    schema: &SchemaDocument,
    opts: &Options,
    with_propagation: bool,
) -> Result<()> {
    out.push_str("\n\n");
    write_desc(out, 0, &annotated_desc(def, &opts.type_map));

    let is_object = def.types.first().is_some_and(|t| t == "object");
    if is_object && !def.properties.is_empty() {
        writeln!(out, "type {name} struct {{").unwrap();
        if !def.base.is_empty() {
            if let Some(bdef) = schema.definitions.get(&def.base) {
                write_desc(out, 1, &annotated_desc(bdef, &opts.type_map));
            }
            writeln!(out, "\t{}", def.base).unwrap();
        }
        out.push_str(&emit_struct_fields(def, 1, name, opts)?);
        writeln!(out, "\n}} // struct {name}\n").unwrap();
        if with_propagation {
            emit_propagation_fn(out, name, def, schema)?;
        }
    } else if is_object {
        let alias = match &def.map_value {
            Some(value) => format!(
                "map[string]{}",
                type_expr(value, 0, &format!("{name}.additionalProperties"), opts)?
            ),
            None => opts.type_map.object_type().to_string(),
        };
        writeln!(out, "type {name} {alias}").unwrap();
    } else {
        writeln!(out, "type {name} {}", type_expr(def, 0, name, opts)?).unwrap();
    }
    Ok(())
}

/// Emit the field lines of a struct body at the given indentation depth.
///
/// Fields are sorted by property name. Each gets a blank separator line, its
/// rendered description, and a `json:` tag carrying `omitempty` unless the
/// property is required.
fn emit_struct_fields(
    def: &Definition,
    depth: usize,
    ctx: &str,
    opts: &Options,
) -> Result<String> {
    let mut out = String::new();
    let tabs = "\t".repeat(depth);
    for (pname, pdef) in &def.properties {
        if !pdef.all_of.is_empty() {
            return Err(Error::Schema(format!(
                "property '{ctx}.{pname}': allOf composition is only supported on top-level definitions"
            )));
        }
        let fexpr = type_expr(pdef, depth, &format!("{ctx}.{pname}"), opts)?;
        let fname = field_name(pname, &def.base);
        let omit = if def.required.contains(pname) {
            ""
        } else {
            ",omitempty"
        };
        out.push('\n');
        write_desc(&mut out, depth, &annotated_desc(pdef, &opts.type_map));
        writeln!(out, "{tabs}{fname} {fexpr} `json:\"{pname}{omit}\"`").unwrap();
    }
    Ok(out)
}

/// Emit the `propagateFieldsToBase` method for one struct declaration.
///
/// Copies every field whose property name is declared anywhere up the base
/// chain into the embedded base (promoted selectors carry the value to the
/// declaring level), then recurses into the base's own propagation method.
/// The method is emitted with an empty body for chain roots so generated
/// recursive calls always resolve.
fn emit_propagation_fn(
    out: &mut String,
    name: &str,
    def: &Definition,
    schema: &SchemaDocument,
) -> Result<()> {
    writeln!(out, "func (this *{name}) propagateFieldsToBase() {{").unwrap();
    if schema.definitions.contains_key(&def.base) {
        for pname in def.properties.keys() {
            if let Some(decl) = find_prop_in_chain(schema, &def.base, pname)? {
                writeln!(
                    out,
                    "\tthis.{}.{} = this.{}",
                    def.base,
                    field_name(pname, &decl.base),
                    field_name(pname, &def.base)
                )
                .unwrap();
            }
        }
        writeln!(out, "\tthis.{}.propagateFieldsToBase()", def.base).unwrap();
    }
    writeln!(out, "}}").unwrap();
    Ok(())
}

// ── Type resolution ────────────────────────────────────────────────────

/// Compute the Go type expression for a definition node.
///
/// `depth` is the indentation level inline anonymous structs close at;
/// `ctx` names the node in errors (e.g. `Request.arguments`). Total over
/// the supported dialect: every valid node yields exactly one expression
/// and every invalid one an error, never a silent default.
fn type_expr(def: &Definition, depth: usize, ctx: &str, opts: &Options) -> Result<String> {
    if !def.reference.is_empty() {
        let Some(target) = ref_target(&def.reference) else {
            return Err(Error::BadRef {
                context: ctx.to_string(),
                reference: def.reference.clone(),
            });
        };
        return Ok(target.to_string());
    }
    if def.types.len() > 1 {
        return Ok(UNTYPED.to_string());
    }
    match def.types.first().map(String::as_str) {
        Some("object") => {
            if let Some(value) = &def.map_value {
                Ok(format!(
                    "map[string]{}",
                    type_expr(value, depth, &format!("{ctx}.additionalProperties"), opts)?
                ))
            } else if !def.properties.is_empty() {
                let fields = emit_struct_fields(def, depth + 1, ctx, opts)?;
                Ok(format!("struct {{\n{fields}\n{}}}", "\t".repeat(depth)))
            } else {
                Ok(opts.type_map.object_type().to_string())
            }
        }
        Some("array") => match &def.array_item {
            Some(item) => Ok(format!(
                "[]{}",
                type_expr(item, depth, &format!("{ctx}.items"), opts)?
            )),
            None => Err(Error::Unresolvable {
                context: ctx.to_string(),
            }),
        },
        Some(other) => match opts.type_map.get(other) {
            Some(go_type) => Ok(go_type.to_string()),
            None => Err(Error::UnmappedType {
                context: ctx.to_string(),
                type_name: other.to_string(),
            }),
        },
        None => Err(Error::Unresolvable {
            context: ctx.to_string(),
        }),
    }
}

// ── Description rendering ──────────────────────────────────────────────

/// Render a node's description with its enum/union annotations appended.
///
/// Pure: the model is never written back to, so emitting the same node
/// twice (a base's description reappears above its embed line in every
/// derived struct) annotates identically each time.
fn annotated_desc(def: &Definition, type_map: &TypeMap) -> String {
    let mut desc = def.description.clone();
    if def.types.len() > 1 {
        desc.push_str("\n\nPOSSIBLE TYPES:");
        for type_name in &def.types {
            let go_type = type_map.get(type_name).unwrap_or_default();
            write!(desc, "\n- `{go_type}` (for JSON `{type_name}`s)").unwrap();
        }
    }
    if def.types.first().is_some_and(|t| t == "string") {
        let values = if def.enum_values_alt.is_empty() {
            &def.enum_values
        } else {
            &def.enum_values_alt
        };
        if !values.is_empty() {
            write!(desc, "\n\nPOSSIBLE VALUES: `{}`", values.join("`, `")).unwrap();
        }
    }
    desc
}

/// Write a description as `// ` comment lines at the given depth.
fn write_desc(out: &mut String, depth: usize, desc: &str) {
    let trimmed = desc.trim();
    if trimmed.is_empty() {
        return;
    }
    let tabs = "\t".repeat(depth);
    for line in trimmed.lines() {
        writeln!(out, "{tabs}// {line}").unwrap();
    }
}

// ── Inheritance chain lookup ───────────────────────────────────────────

/// Find the nearest definition in the base chain starting at `start` that
/// declares property `prop`. Fails on inheritance cycles.
pub(crate) fn find_prop_in_chain<'a>(
    schema: &'a SchemaDocument,
    start: &str,
    prop: &str,
) -> Result<Option<&'a Definition>> {
    let mut visited = BTreeSet::new();
    let mut current = start;
    while !current.is_empty() {
        if !visited.insert(current.to_string()) {
            return Err(Error::Schema(format!(
                "inheritance cycle detected at definition '{current}'"
            )));
        }
        let Some(def) = schema.definitions.get(current) else {
            return Ok(None);
        };
        if def.properties.contains_key(prop) {
            return Ok(Some(def));
        }
        current = &def.base;
    }
    Ok(None)
}
