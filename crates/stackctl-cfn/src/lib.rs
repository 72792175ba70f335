//! stackctl-cfn
//!
//! CloudFormation template document model and the declarative mapping
//! engine that turns a serialized resource spec into a deployable
//! template. Generation is pure and deterministic: the same spec always
//! renders the same bytes.

pub mod error;
pub mod intrinsics;
pub mod mapping;
pub mod params;
pub mod template;

pub use crate::error::TemplateError;
pub use crate::mapping::{
    build_template, EmptyResolver, FieldRule, KindMapping, ObjectResolver, TemplateContext,
    Translate,
};
pub use crate::template::{Export, Output, ResourceBody, Template};
