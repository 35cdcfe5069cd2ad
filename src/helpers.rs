//! Emitters for the optional helper sections of the generated Go source.
//!
//! Three families, appended after the type declarations in this order:
//! downcast accessors and variant constructors ([`emit_ctors`]),
//! discriminator-driven decode dispatch ([`emit_decode_helper`]), and
//! request/response handling scaffolds ([`emit_handling_scaffold`]).
//! All tables driving them are collected into sorted maps first, so the
//! emitted text is stable across runs.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;

use crate::codegen::{Options, find_prop_in_chain};
use crate::error::{Error, Result};
use crate::schema::{Definition, SchemaDocument};
use crate::type_map::field_name;

/// One pre-settable constructor field of a variant: the Go field selector
/// the property resolves to, and the single enum literal to assign.
#[derive(Debug, Clone)]
pub(crate) struct CtorField {
    pub field: String,
    pub literal: String,
}

// ── Constructor candidates ─────────────────────────────────────────────

/// Collect the constructor candidates of every struct variant of the
/// requested constructor base types.
///
/// A candidate is any property, declared at the variant's own level or
/// anywhere up its base chain, that is typed as a single-valued string
/// enum. Candidates are deduplicated by property name with the nearest
/// level winning, which also fixes the literal each one assigns. Variants
/// without candidates get no entry. A literal carrying a quote mark
/// cannot sit inside a Go string literal and is rejected.
pub(crate) fn ctor_candidates(
    schema: &SchemaDocument,
    opts: &Options,
) -> Result<BTreeMap<String, Vec<CtorField>>> {
    let mut candidates = BTreeMap::new();
    for base in &opts.ctor_base_types {
        for (vname, _) in struct_variants_of(schema, base) {
            let mut fields: Vec<CtorField> = Vec::new();
            let mut claimed = BTreeSet::new();
            let mut visited = BTreeSet::new();
            let mut current = vname.as_str();
            while !current.is_empty() {
                if !visited.insert(current.to_string()) {
                    return Err(Error::Schema(format!(
                        "inheritance cycle detected at definition '{current}'"
                    )));
                }
                let Some(level) = schema.definitions.get(current) else {
                    break;
                };
                for (pname, pdef) in &level.properties {
                    if is_single_string_enum(pdef) && claimed.insert(pname.clone()) {
                        let literal = &pdef.enum_values[0];
                        if literal.contains('"') {
                            return Err(Error::Schema(format!(
                                "constructor for variant '{vname}': property '{pname}' carries a quote mark inside literal '{literal}'"
                            )));
                        }
                        // The selector must name the field where Go resolves
                        // it: the nearest level in the chain declaring the
                        // property, not necessarily the enum-carrying one.
                        let decl = find_prop_in_chain(schema, vname, pname)?
                            .unwrap_or(level);
                        fields.push(CtorField {
                            field: field_name(pname, &decl.base),
                            literal: literal.clone(),
                        });
                    }
                }
                current = &level.base;
            }
            if !fields.is_empty() {
                candidates.insert(vname.clone(), fields);
            }
        }
    }
    Ok(candidates)
}

fn is_single_string_enum(def: &Definition) -> bool {
    def.types.len() == 1 && def.types[0] == "string" && def.enum_values.len() == 1
}

// ── Accessor and constructor emission ──────────────────────────────────

/// Emit, per requested base type in caller order (duplicates skipped), a
/// downcast accessor over its struct variants, then a `New<Variant>`
/// constructor for every variant holding constructor candidates.
///
/// Bases without struct variants are skipped entirely so the generated
/// source never contains an empty type switch.
pub(crate) fn emit_ctors(
    out: &mut String,
    schema: &SchemaDocument,
    opts: &Options,
    candidates: &BTreeMap<String, Vec<CtorField>>,
) {
    let mut seen = BTreeSet::new();
    for base in &opts.ctor_base_types {
        if !seen.insert(base.as_str()) {
            continue;
        }
        let variants = struct_variants_of(schema, base);
        if variants.is_empty() {
            continue;
        }
        writeln!(
            out,
            "\n// Base{base} returns the embedded `{base}` of `val` if it is a pointer to any of the `{base}`-based `struct` types, else `nil`."
        )
        .unwrap();
        writeln!(out, "func Base{base} (val interface{{}}) (base{base} *{base}) {{").unwrap();
        writeln!(out, "\tswitch v := val.(type) {{").unwrap();
        for (vname, _) in &variants {
            writeln!(out, "\tcase *{vname}: base{base} = &v.{base}").unwrap();
        }
        writeln!(out, "\t}}").unwrap();
        writeln!(out, "\treturn").unwrap();
        writeln!(out, "}}").unwrap();
        for (vname, _) in &variants {
            let Some(fields) = candidates.get(vname.as_str()) else {
                continue;
            };
            writeln!(
                out,
                "\n// New{vname} returns a new `{vname}` with all its known-value fields pre-set and propagated to its embedded base `struct` values."
            )
            .unwrap();
            writeln!(out, "func New{vname} () (this *{vname}) {{").unwrap();
            writeln!(out, "\tthis = &{vname}{{}}").unwrap();
            for field in fields {
                writeln!(out, "\tthis.{} = \"{}\"", field.field, field.literal).unwrap();
            }
            writeln!(out, "\tthis.propagateFieldsToBase()").unwrap();
            writeln!(out, "\treturn").unwrap();
            writeln!(out, "}}").unwrap();
        }
    }
}

// ── Discriminated decode dispatch ──────────────────────────────────────

/// Emit the `TryUnmarshal<Base>` decode-dispatch function for one
/// (base type, discriminator property) pair.
///
/// The generated function locates the discriminator value by literal text
/// scanning, not JSON parsing: it finds the first occurrence of the raw
/// `"<prop>":"` text and takes everything up to the next quote. The scan
/// misfires when that key text first appears inside a nested object or an
/// escaped string, which callers accept in exchange for dispatching without
/// a parse; non-object-looking input yields `(nil, nil)`, never an error.
pub(crate) fn emit_decode_helper(
    out: &mut String,
    schema: &SchemaDocument,
    opts: &Options,
    base: &str,
    prop: &str,
) -> Result<()> {
    let table = decode_table(schema, base, prop)?;

    writeln!(
        out,
        "\n\n// TryUnmarshal{base} attempts to unmarshal JSON string `js` (if it starts with a `{{` and ends with a `}}`) into a `struct` based on `{base}` as follows:"
    )
    .unwrap();
    writeln!(out, "// ").unwrap();
    for (literal, vname) in &table {
        if opts.decode_helpers.contains_key(vname.as_str()) {
            writeln!(
                out,
                "// If `js` contains `\"{prop}\":\"{literal}\"`, attempts to unmarshal via `TryUnmarshal{vname}`"
            )
            .unwrap();
        } else {
            writeln!(
                out,
                "// If `js` contains `\"{prop}\":\"{literal}\"`, attempts to unmarshal into a new `{vname}`."
            )
            .unwrap();
        }
    }
    let badjfielderrmsg = format!("{base}: encountered unknown JSON value for {prop}: ");
    writeln!(
        out,
        "// Otherwise, `err`'s message will be: `{badjfielderrmsg}` followed by the `{prop}` value encountered."
    )
    .unwrap();
    writeln!(out, "// ").unwrap();
    writeln!(
        out,
        "// In general: the `err` returned may be either `nil`, the above message, or an `encoding/json.Unmarshal()` return value."
    )
    .unwrap();
    writeln!(
        out,
        "// `ptr` will be a pointer to the unmarshaled `struct` value if that succeeded, else `nil`."
    )
    .unwrap();
    writeln!(
        out,
        "// Both `err` and `ptr` will be `nil` if `js` doesn't: start with `{{` and end with `}}` and contain `\"{prop}\":\"` followed by a subsequent `\"`."
    )
    .unwrap();
    writeln!(out, "func TryUnmarshal{base} (js string) (ptr interface{{}}, err error) {{").unwrap();
    writeln!(out, "\tif len(js)==0 || js[0]!='{{' || js[len(js)-1]!='}}' {{ return }}").unwrap();
    writeln!(
        out,
        "\ti1 := strings.Index(js, \"\\\"{prop}\\\":\\\"\")  ;  if i1<1 {{ return }}"
    )
    .unwrap();
    writeln!(out, "\tsubjs := js[i1+4+{}:]", prop.len()).unwrap();
    writeln!(out, "\ti2 := strings.Index(subjs, \"\\\"\")  ;  if i2<1 {{ return }}").unwrap();
    let pvalvar = format!("{prop}_of_{base}");
    writeln!(out, "\t{pvalvar} := subjs[:i2]  ;  switch {pvalvar} {{").unwrap();
    for (literal, vname) in &table {
        if opts.decode_helpers.contains_key(vname.as_str()) {
            writeln!(out, "\tcase \"{literal}\":  ptr,err = TryUnmarshal{vname}(js)").unwrap();
        } else {
            writeln!(
                out,
                "\tcase \"{literal}\":  var val {vname}  ;  if err = json.Unmarshal([]byte(js), &val); err==nil {{ val.propagateFieldsToBase()  ;  ptr = &val }}"
            )
            .unwrap();
        }
    }
    writeln!(out, "\tdefault: err = errors.New(\"{badjfielderrmsg}\" + {pvalvar})").unwrap();
    writeln!(out, "\t}}").unwrap();
    writeln!(out, "\treturn").unwrap();
    writeln!(out, "}}").unwrap();
    Ok(())
}

/// Build the literal → variant dispatch table for one decode helper,
/// validating every variant's discriminator declaration.
fn decode_table(
    schema: &SchemaDocument,
    base: &str,
    prop: &str,
) -> Result<BTreeMap<String, String>> {
    let fail = |detail: String| Error::Discriminator {
        base: base.to_string(),
        property: prop.to_string(),
        detail,
    };
    let mut table: BTreeMap<String, String> = BTreeMap::new();
    for (vname, vdef) in &schema.definitions {
        if vdef.base != base {
            continue;
        }
        let Some(pdef) = vdef.properties.get(prop) else {
            return Err(fail(format!("variant '{vname}' does not declare the property")));
        };
        if pdef.types.len() != 1 {
            return Err(fail(format!(
                "variant '{vname}' declares {} types for it, expected exactly one",
                pdef.types.len()
            )));
        }
        if pdef.types[0] != "string" {
            return Err(fail(format!(
                "variant '{vname}' declares it as '{}', expected 'string'",
                pdef.types[0]
            )));
        }
        if pdef.enum_values.len() != 1 {
            return Err(fail(format!(
                "variant '{vname}' has {} enum values for it, expected exactly one",
                pdef.enum_values.len()
            )));
        }
        let literal = &pdef.enum_values[0];
        if literal.contains('"') {
            return Err(fail(format!(
                "variant '{vname}' carries a quote mark inside literal '{literal}'"
            )));
        }
        if let Some(prev) = table.get(literal.as_str()) {
            return Err(fail(format!(
                "literal '{literal}' is claimed by both '{prev}' and '{vname}'"
            )));
        }
        table.insert(literal.clone(), vname.clone());
    }
    Ok(table)
}

// ── Handling scaffolds ─────────────────────────────────────────────────

/// Emit the handling scaffold for one (input base, output base) pair: a
/// settable `On<InVariant>` callback slot per associated variant pair, and
/// the `Handle<InBase>` dispatcher that constructs, initializes, and hands
/// out the matching output variant.
///
/// An input variant is associated with each struct variant of the output
/// base whose name, with the output-base suffix swapped for the input-base
/// suffix, names an existing definition. Pairs without associations emit
/// nothing.
pub(crate) fn emit_handling_scaffold(
    out: &mut String,
    schema: &SchemaDocument,
    in_base: &str,
    out_base: &str,
    candidates: &BTreeMap<String, Vec<CtorField>>,
) {
    let mut assoc: BTreeMap<String, String> = BTreeMap::new();
    for (oname, _) in struct_variants_of(schema, out_base) {
        if let Some(stem) = oname.strip_suffix(out_base) {
            let iname = format!("{stem}{in_base}");
            if schema.definitions.contains_key(&iname) {
                assoc.insert(iname, oname.clone());
            }
        }
    }
    if assoc.is_empty() {
        return;
    }

    for (iname, oname) in &assoc {
        writeln!(
            out,
            "\n// Called by `Handle{in_base}` when it is passed a `*{iname}`, to further populate the `{oname}` it then returns a pointer to."
        )
        .unwrap();
        writeln!(out, "var On{iname} func(*{iname}, *{oname})error").unwrap();
    }
    writeln!(
        out,
        "\n// If a type-switch on `in{in_base}` succeeds, `out{out_base}` points to a newly constructed `{out_base}`-based `struct` value, initialized by the specified `initNew{out_base}` (if not `nil`) and further populated by the `OnFoo{in_base}` handler corresponding to the concrete type of `in{in_base}` (if any). The only `err` returned, if any, is that returned by the specialized `OnFoo{in_base}` handler."
    )
    .unwrap();
    writeln!(
        out,
        "func Handle{in_base} (in{in_base} interface{{}}, initNew{out_base} func(interface{{}}, interface{{}})) (out{out_base} interface{{}}, base{out_base} *{out_base}, err error) {{"
    )
    .unwrap();
    writeln!(out, "\tswitch input := in{in_base}.(type) {{").unwrap();
    for (iname, oname) in &assoc {
        let construct = if candidates.contains_key(oname.as_str()) {
            format!("New{oname}()")
        } else {
            format!("&{oname}{{}}")
        };
        writeln!(
            out,
            "\tcase *{iname}: output := {construct}; base{out_base} = &output.{out_base}; if initNew{out_base}!=nil {{ initNew{out_base}(input, output); output.propagateFieldsToBase() }}; if On{iname}!=nil {{ err = On{iname}(input, output); output.propagateFieldsToBase() }}; out{out_base} = output"
        )
        .unwrap();
    }
    writeln!(out, "\t}}").unwrap();
    writeln!(out, "\treturn").unwrap();
    writeln!(out, "}}").unwrap();
}

// ── Variant lookup ─────────────────────────────────────────────────────

/// All definitions emitted as structs whose recorded base is `base`,
/// in name order.
fn struct_variants_of<'a>(
    schema: &'a SchemaDocument,
    base: &str,
) -> Vec<(&'a String, &'a Definition)> {
    schema
        .definitions
        .iter()
        .filter(|(_, def)| {
            def.base == base
                && def.types.first().is_some_and(|t| t == "object")
                && !def.properties.is_empty()
        })
        .collect()
}
