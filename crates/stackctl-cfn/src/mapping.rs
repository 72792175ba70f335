//! The declarative field-mapping engine.
//!
//! One [`KindMapping`] table per resource kind describes how its spec
//! renders to template properties; [`build_template`] is the single
//! interpreter. The table replaces hand-written per-kind mapping code,
//! so a new kind is a table plus its typed spec, nothing else.
//!
//! Omission rule: a spec field at its zero value (null, empty string,
//! empty list, empty object) never appears in the generated document.
//! Presence of booleans and numbers is decided by the data model
//! (`Option<T>`); an absent optional never reaches the engine at all.

use std::collections::BTreeMap;

use serde_json::Value;

use stackctl_core::meta::ResourceMeta;

use crate::error::TemplateError;
use crate::intrinsics;
use crate::template::{Export, Output, ResourceBody, Template};

/// Resolves cross-object references during generation.
///
/// Implementations typically consult the platform's object store; tests
/// use a fixed map.
pub trait ObjectResolver {
    /// A concrete value (e.g. an ARN) for the referenced identity, if
    /// the resolver already knows one.
    fn resolve(&self, namespace: &str, name: &str) -> Option<String>;
}

/// Resolver that never resolves; references fall back to Arn imports.
pub struct EmptyResolver;

impl ObjectResolver for EmptyResolver {
    fn resolve(&self, _namespace: &str, _name: &str) -> Option<String> {
        None
    }
}

/// Lookup handle required for template generation.
pub struct TemplateContext<'a> {
    pub resolver: &'a dyn ObjectResolver,
}

/// Declarative description of how one resource kind renders to a
/// template.
pub struct KindMapping {
    /// Remote service group, e.g. "iam".
    pub service: &'static str,
    /// Resource kind, e.g. "User". Also the logical name in the
    /// template.
    pub kind: &'static str,
    /// Remote provider type, e.g. "AWS::IAM::User".
    pub resource_type: &'static str,
    /// Field rules applied to the serialized spec.
    pub rules: &'static [FieldRule],
    /// Spec fields surfaced as stack parameters.
    pub parameters: &'static [&'static str],
    /// Whether the kind has a meaningful Arn attribute to export.
    pub arn_output: bool,
}

/// One spec field to template property translation.
pub struct FieldRule {
    /// Source field in the serialized spec (serde name).
    pub source: &'static str,
    /// Target property in the template resource.
    pub target: &'static str,
    pub translate: Translate,
}

pub enum Translate {
    /// Copy the value, omitting zero values.
    Value,
    /// Copy the value, defaulting to the resource name when absent.
    DefaultFromName,
    /// Nested struct mapped by its own rules; attached only when the
    /// mapped object is non-empty.
    Object(&'static [FieldRule]),
    /// Repeated nested structs mapped element-wise into a fresh
    /// sequence; attached only when the sequence is non-empty, never as
    /// an empty list.
    Items(&'static [FieldRule]),
    /// Serialized JSON text parsed into structured data before
    /// embedding. A parse failure aborts the whole generation.
    EmbeddedJson,
    /// Object references. An unset namespace defaults to the
    /// referencing resource's namespace before emission; each reference
    /// is emitted as the resolver's concrete value when available, else
    /// as an import of the referenced Arn export.
    ObjectRefs,
}

/// Render the template for one resource instance.
///
/// Deterministic: the same spec value yields a byte-identical document.
pub fn build_template(
    mapping: &KindMapping,
    meta: &ResourceMeta,
    spec: &Value,
    ctx: Option<&TemplateContext<'_>>,
) -> Result<Template, TemplateError> {
    let ctx = ctx.ok_or(TemplateError::ContextUnavailable)?;

    let mut template = Template::new(format!(
        "stackctl - {}.{} ({})",
        mapping.service, mapping.kind, meta.name
    ));

    let properties = apply_rules(mapping.rules, spec, meta, ctx)?;
    template.resources.insert(
        mapping.kind.to_string(),
        ResourceBody {
            resource_type: mapping.resource_type.to_string(),
            properties,
        },
    );

    template.outputs.insert(
        "ResourceRef".to_string(),
        Output {
            value: intrinsics::reference(mapping.kind),
            export: Export {
                name: export_name(&meta.namespace, &meta.name, "Ref"),
            },
        },
    );
    if mapping.arn_output {
        template.outputs.insert(
            "Arn".to_string(),
            Output {
                value: intrinsics::get_att(mapping.kind, "Arn"),
                export: Export {
                    name: export_name(&meta.namespace, &meta.name, "Arn"),
                },
            },
        );
    }

    Ok(template)
}

/// Export name for a resource identity, unique across namespaces.
pub fn export_name(namespace: &str, name: &str, suffix: &str) -> String {
    format!("{namespace}-{name}-{suffix}")
}

fn apply_rules(
    rules: &[FieldRule],
    source: &Value,
    meta: &ResourceMeta,
    ctx: &TemplateContext<'_>,
) -> Result<BTreeMap<String, Value>, TemplateError> {
    let mut out = BTreeMap::new();
    for rule in rules {
        let field = source.get(rule.source);
        match &rule.translate {
            Translate::Value => {
                if let Some(value) = field {
                    if !is_zero(value) {
                        out.insert(rule.target.to_string(), value.clone());
                    }
                }
            }
            Translate::DefaultFromName => match field {
                Some(value) if !is_zero(value) => {
                    out.insert(rule.target.to_string(), value.clone());
                }
                _ => {
                    out.insert(rule.target.to_string(), Value::String(meta.name.clone()));
                }
            },
            Translate::Object(nested) => {
                if let Some(value) = field {
                    if !is_zero(value) {
                        let mapped = apply_rules(nested, value, meta, ctx)?;
                        if !mapped.is_empty() {
                            out.insert(rule.target.to_string(), object_value(mapped));
                        }
                    }
                }
            }
            Translate::Items(nested) => {
                let Some(value) = field else { continue };
                if is_zero(value) {
                    continue;
                }
                let items = value.as_array().ok_or_else(|| TemplateError::UnexpectedShape {
                    field: rule.source.to_string(),
                    rule: "Items",
                })?;
                let mut mapped_items = Vec::new();
                for item in items {
                    let mapped = apply_rules(nested, item, meta, ctx)?;
                    if !mapped.is_empty() {
                        mapped_items.push(object_value(mapped));
                    }
                }
                if !mapped_items.is_empty() {
                    out.insert(rule.target.to_string(), Value::Array(mapped_items));
                }
            }
            Translate::EmbeddedJson => {
                let Some(value) = field else { continue };
                if is_zero(value) {
                    continue;
                }
                let text = value.as_str().ok_or_else(|| TemplateError::UnexpectedShape {
                    field: rule.source.to_string(),
                    rule: "EmbeddedJson",
                })?;
                let parsed: Value = serde_json::from_str(text).map_err(|source| {
                    TemplateError::MalformedEmbeddedDocument {
                        field: rule.source.to_string(),
                        source,
                    }
                })?;
                out.insert(rule.target.to_string(), parsed);
            }
            Translate::ObjectRefs => {
                let Some(value) = field else { continue };
                if is_zero(value) {
                    continue;
                }
                let refs = value.as_array().ok_or_else(|| TemplateError::UnexpectedShape {
                    field: rule.source.to_string(),
                    rule: "ObjectRefs",
                })?;
                let mut resolved = Vec::new();
                for entry in refs {
                    if entry.is_null() {
                        continue;
                    }
                    let Some(name) = entry.get("name").and_then(Value::as_str) else {
                        continue;
                    };
                    if name.is_empty() {
                        continue;
                    }
                    let namespace = entry
                        .get("namespace")
                        .and_then(Value::as_str)
                        .filter(|ns| !ns.is_empty())
                        .unwrap_or(meta.namespace.as_str());
                    let emitted = match ctx.resolver.resolve(namespace, name) {
                        Some(concrete) => Value::String(concrete),
                        None => intrinsics::import_value(&export_name(namespace, name, "Arn")),
                    };
                    resolved.push(emitted);
                }
                if !resolved.is_empty() {
                    out.insert(rule.target.to_string(), Value::Array(resolved));
                }
            }
        }
    }
    Ok(out)
}

fn object_value(map: BTreeMap<String, Value>) -> Value {
    Value::Object(map.into_iter().collect())
}

/// Zero values mean explicit non-presence and are omitted, avoiding
/// spurious diffs on the remote side.
fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
