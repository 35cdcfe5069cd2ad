//! JSON Schema data model, loading, and downloading.
//!
//! Only the narrow dialect used by machine-readable protocol definitions
//! (such as the VS Code debug-adapter protocol) is understood: `definitions`,
//! `properties`, `type`, `$ref`, two-element `allOf`, `items`,
//! `additionalProperties`, `required`, and `enum`/`_enum`. Anything else in
//! the document is ignored rather than rejected.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Prefix of every supported `$ref` schema pointer.
const REF_PREFIX: &str = "#/definitions/";

/// The singular-`type` key/value prefix rewritten by [`parse`].
const TYPE_NEEDLE: &str = "\"type\": \"";

/// A parsed, flattened schema document.
///
/// Obtained through [`parse`] or [`load_schema`]; by the time a value of this
/// type exists, every singular `type` has been coerced to list form and every
/// two-element `allOf` has been flattened into its body with
/// [`Definition::base`] recording the inherited type.
#[derive(Debug, Deserialize)]
pub struct SchemaDocument {
    /// Schema-dialect URI (e.g. `"http://json-schema.org/draft-04/schema#"`).
    /// Informational only.
    #[serde(rename = "$schema", default)]
    pub schema_uri: String,

    /// Document title, emitted into the generated header comment.
    #[serde(default)]
    pub title: String,

    /// Document description, emitted into the generated header comment.
    #[serde(default)]
    pub description: String,

    /// Declared root type. Assumed to be `object`; never consulted.
    #[serde(rename = "type", default)]
    pub root_type: Vec<String>,

    /// All named top-level definitions. Sorted by `BTreeMap`, which is what
    /// makes generated output deterministic for equivalent documents.
    #[serde(default)]
    pub definitions: BTreeMap<String, Definition>,
}

/// One schema node: a named top-level type, a property, an anonymous nested
/// record, or an array/map element type.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Definition {
    /// Name of the base type this definition inherits from, recorded when a
    /// two-element `allOf` composition is flattened. Never present in the
    /// raw document.
    #[serde(skip)]
    pub base: String,

    /// Free-text description. Enum-value and union-type notes are appended
    /// to the rendered form at emission time, never stored back here.
    #[serde(default)]
    pub description: String,

    /// Raw `allOf` members. Non-empty only between decode and flattening.
    #[serde(rename = "allOf", default)]
    pub all_of: Vec<Definition>,

    /// Child definitions keyed by property name. Sorted by `BTreeMap`.
    #[serde(default)]
    pub properties: BTreeMap<String, Definition>,

    /// JSON Schema type names, always in list form after [`parse`]. More
    /// than one name signals a union, mapped to Go's `interface{}`.
    #[serde(rename = "type", default)]
    pub types: Vec<String>,

    /// Property names that must not carry the `omitempty` tag.
    #[serde(default)]
    pub required: BTreeSet<String>,

    /// Literal string enumeration from the schema's own `enum` keyword.
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,

    /// Alternate enumeration (`_enum`), a tooling overlay on values the raw
    /// schema left open. Takes precedence over [`enum_values`] in rendered
    /// descriptions, but never drives constructors or decode dispatch.
    ///
    /// [`enum_values`]: Definition::enum_values
    #[serde(rename = "_enum", default)]
    pub enum_values_alt: Vec<String>,

    /// Value type when this node is an `additionalProperties` string map.
    #[serde(rename = "additionalProperties", default)]
    pub map_value: Option<Box<Definition>>,

    /// Element type when this node is an `items` array.
    #[serde(rename = "items", default)]
    pub array_item: Option<Box<Definition>>,

    /// Raw `$ref` schema pointer (e.g. `"#/definitions/Request"`).
    #[serde(rename = "$ref", default)]
    pub reference: String,
}

impl Definition {
    /// Add properties (name → primitive type name) this definition is known
    /// to need but the raw schema omitted, before generating code from it.
    ///
    /// Fails if the definition has no properties of its own (injecting into
    /// an alias-shaped definition is almost certainly a mistake) or if a name
    /// is already declared by the schema.
    pub fn ensure_props(&mut self, props: &BTreeMap<String, String>) -> Result<()> {
        if self.properties.is_empty() {
            return Err(Error::Schema(
                "ensure_props: definition has no properties and likely isn't supposed to have any"
                    .into(),
            ));
        }
        for (pname, ptype) in props {
            if self.properties.contains_key(pname) {
                return Err(Error::Schema(format!(
                    "ensure_props: property '{pname}' already exists in the schema, remove it from this call"
                )));
            }
            self.properties.insert(
                pname.clone(),
                Definition {
                    description: pname.clone(),
                    types: vec![ptype.clone()],
                    ..Default::default()
                },
            );
        }
        Ok(())
    }
}

/// Strip the `#/definitions/` prefix off a schema pointer, yielding the
/// referenced definition name. `None` if the pointer has any other shape.
pub fn ref_target(reference: &str) -> Option<&str> {
    reference.strip_prefix(REF_PREFIX)
}

/// Parse raw schema source text into a flattened [`SchemaDocument`].
///
/// Normalization first rewrites every singular `"type": "X"` occurrence to
/// the list form `"type": ["X"]` so the rest of the pipeline only ever sees
/// type lists. This is a textual pass over the raw source and assumes the
/// document's own `": "` key separator formatting; it is not a union-type
/// feature. The rewritten text is then decoded with serde and every
/// definition's `allOf` composition is flattened.
pub fn parse(source: &str) -> Result<SchemaDocument> {
    let normalized = normalize_type_lists(source);
    let mut doc: SchemaDocument = serde_json::from_str(&normalized)?;
    doc.definitions = flatten_definitions(std::mem::take(&mut doc.definitions))?;
    Ok(doc)
}

/// Load and parse a schema document from disk.
pub fn load_schema(path: &Path) -> Result<SchemaDocument> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse(&content)
}

/// Rewrite each singular `"type": "X"` into `"type": ["X"]`.
fn normalize_type_lists(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + 64);
    let mut rest = source;
    while let Some(i) = rest.find(TYPE_NEEDLE) {
        let after = &rest[i + TYPE_NEEDLE.len()..];
        let Some(j) = after.find('"') else {
            // Unterminated value; the decode step will report the malformed
            // JSON with more context than we could here.
            break;
        };
        out.push_str(&rest[..i]);
        out.push_str("\"type\": [\"");
        out.push_str(&after[..j]);
        out.push_str("\"]");
        rest = &after[j + 1..];
    }
    out.push_str(rest);
    out
}

/// Flatten `allOf` compositions and validate top-level type arity.
///
/// A definition without `allOf` is kept as is. A two-element
/// `allOf = [{$ref base}, {body}]` is replaced by `body` with the
/// unreferenced base name recorded; any other arity is an error. Every
/// resulting top-level definition must carry exactly one type name, and
/// every recorded base must itself be a top-level definition.
fn flatten_definitions(
    defs: BTreeMap<String, Definition>,
) -> Result<BTreeMap<String, Definition>> {
    let mut out = BTreeMap::new();
    for (name, mut def) in defs {
        if !def.all_of.is_empty() {
            let members = std::mem::take(&mut def.all_of);
            match <[Definition; 2]>::try_from(members) {
                Ok([head, mut body]) => {
                    let Some(base) = ref_target(&head.reference) else {
                        return Err(Error::BadRef {
                            context: name,
                            reference: head.reference,
                        });
                    };
                    body.base = base.to_string();
                    def = body;
                }
                Err(members) => {
                    return Err(Error::AllOfArity {
                        name,
                        arity: members.len(),
                    });
                }
            }
        }
        if def.types.len() != 1 {
            return Err(Error::TypeArity {
                name,
                count: def.types.len(),
            });
        }
        out.insert(name, def);
    }
    for (name, def) in &out {
        if !def.base.is_empty() && !out.contains_key(&def.base) {
            return Err(Error::Schema(format!(
                "definition '{name}': base type '{}' is not defined",
                def.base
            )));
        }
    }
    Ok(out)
}

/// Download a schema document and save it to disk.
///
/// Validates that the response body parses via [`parse`] before writing the
/// raw text.
#[cfg(feature = "download")]
pub async fn download_schema(url: &str, output_path: &Path) -> Result<()> {
    eprintln!("Downloading JSON Schema from {url}");

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::Download(format!(
            "GET {url} returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::Download(format!("reading response body: {e}")))?;

    // Validate before writing.
    let schema = parse(&body)
        .map_err(|e| Error::Schema(format!("downloaded text is not a loadable schema: {e}")))?;

    if let Some(parent) = output_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    std::fs::write(output_path, &body).map_err(|e| Error::Write {
        path: output_path.to_path_buf(),
        source: e,
    })?;

    eprintln!(
        "Saved schema '{}' ({} definitions) to {}",
        schema.title,
        schema.definitions.len(),
        output_path.display()
    );
    Ok(())
}
