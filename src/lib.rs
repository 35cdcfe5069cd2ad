//! Generate Go type declarations from JSON Schema protocol definitions.
//!
//! `jsonschema-go-gen` reads a JSON Schema document of the narrow dialect
//! used by protocol definitions such as the VS Code debug-adapter protocol
//! (`definitions`, `properties`, `type`, `$ref`, two-member `allOf`,
//! `items`, `additionalProperties`, `required`, `enum`) and emits a single
//! Go source file of `struct` (et al) type definitions, ready to
//! `json.Unmarshal` matching payloads into.
//!
//! # Features
//!
//! - Flattens two-member `allOf` compositions into embedded-base `struct`s
//! - Maps objects, arrays, maps, refs, unions, and enums onto Go type
//!   expressions, with a caller-overridable primitive mapping table
//! - Generates `propagateFieldsToBase` methods that copy shared-named
//!   fields up an inheritance chain
//! - Generates downcast accessors and enum-pre-populated constructors for
//!   selected base types
//! - Generates `TryUnmarshal*` decode dispatch keyed on discriminator
//!   properties, and `Handle*` request/response scaffolding
//! - Deterministic output: byte-identical across runs
//!
//! # Usage
//!
//! ```no_run
//! use std::path::Path;
//!
//! let schema = jsonschema_go_gen::schema::load_schema(Path::new("protocol.json"))?;
//! let mut opts = jsonschema_go_gen::codegen::Options::new("proto");
//! opts.ctor_base_types = vec!["Request".to_string(), "Event".to_string()];
//! opts.decode_helpers.insert("ProtocolMessage".to_string(), "type".to_string());
//! let source = jsonschema_go_gen::codegen::generate(&schema, &opts)?;
//! eprintln!("Generated {} bytes of Go from '{}'", source.len(), schema.title);
//! # Ok::<(), jsonschema_go_gen::error::Error>(())
//! ```

pub mod codegen;
pub mod error;
mod helpers;
pub mod schema;
pub mod type_map;
