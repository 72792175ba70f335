//! The uniform contract a resource kind implements to be reconciled.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stackctl_cfn::mapping::{self, KindMapping, TemplateContext};
use stackctl_cfn::params;
use stackctl_cfn::template::Template;
use stackctl_cfn::TemplateError;
use stackctl_core::error::CoreError;
use stackctl_core::fingerprint;
use stackctl_core::lifecycle::LifecycleError;
use stackctl_core::meta::{CloudFormationMeta, ResourceMeta};
use stackctl_core::naming;
use stackctl_core::status::{ConditionStatus, StackStatus, StatusMeta};

/// Identity of a resource instance across the system.
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub service: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}/{}/{}",
            self.service, self.kind, self.namespace, self.name
        )
    }
}

/// Accessors a resource kind provides so the blanket [`StackObject`]
/// implementation can drive it. Implementations are thin: metadata and
/// status access plus the kind's declarative mapping table.
pub trait StackResource: Send + Sync {
    fn mapping(&self) -> &'static KindMapping;
    fn meta(&self) -> &ResourceMeta;
    fn meta_mut(&mut self) -> &mut ResourceMeta;
    fn cfn_meta(&self) -> &CloudFormationMeta;
    fn stack_status(&self) -> &StackStatus;
    fn stack_status_mut(&mut self) -> &mut StackStatus;

    /// The spec serialized for the mapping engine and the fingerprint.
    fn spec_value(&self) -> Result<Value, serde_json::Error>;
}

/// The uniform reconciliation protocol. Blanket-implemented for every
/// [`StackResource`]; the reconciler only ever sees this trait.
pub trait StackObject: Send + Sync + fmt::Debug {
    fn identity(&self) -> ResourceIdentity;
    fn generation(&self) -> i64;
    fn labels(&self) -> BTreeMap<String, String>;

    /// Render the template document. Requires the lookup context.
    fn template(&self, ctx: Option<&TemplateContext<'_>>) -> Result<Template, TemplateError>;

    /// Explicit spec override if set, else the derived deterministic
    /// name.
    fn stack_name(&self) -> String;

    /// Spec fields surfaced to the provider's parameter-passing
    /// mechanism, stringified with fingerprint canonicalization.
    fn parameters(&self) -> Result<BTreeMap<String, String>, TemplateError>;

    /// Notification targets with null slots skipped.
    fn notification_targets(&self) -> Vec<String>;

    fn fingerprint(&self) -> Result<String, CoreError>;
    fn fingerprint_label(&self) -> Option<String>;
    fn refresh_fingerprint_label(&mut self) -> Result<(), CoreError>;
    fn fingerprint_changed(&self) -> Result<bool, CoreError>;

    fn stack_id(&self) -> String;
    fn set_stack_id(&mut self, id: String) -> Result<(), LifecycleError>;
    fn clear_stack_id(&mut self);
    fn status(&self) -> StackStatus;
    fn set_status(&mut self, status: ConditionStatus, meta: StatusMeta)
        -> Result<(), LifecycleError>;
}

impl<T: StackResource + fmt::Debug> StackObject for T {
    fn identity(&self) -> ResourceIdentity {
        let mapping = self.mapping();
        let meta = self.meta();
        ResourceIdentity {
            service: mapping.service.to_string(),
            kind: mapping.kind.to_string(),
            namespace: meta.namespace.clone(),
            name: meta.name.clone(),
        }
    }

    fn generation(&self) -> i64 {
        self.meta().generation
    }

    fn labels(&self) -> BTreeMap<String, String> {
        self.meta().labels.clone()
    }

    fn template(&self, ctx: Option<&TemplateContext<'_>>) -> Result<Template, TemplateError> {
        let spec = self.spec_value().map_err(TemplateError::Serialization)?;
        mapping::build_template(self.mapping(), self.meta(), &spec, ctx)
    }

    fn stack_name(&self) -> String {
        if let Some(name) = self.cfn_meta().stack_name.as_deref() {
            if !name.is_empty() {
                return name.to_string();
            }
        }
        naming::stack_name(self.mapping().service, self.mapping().kind, self.meta())
    }

    fn parameters(&self) -> Result<BTreeMap<String, String>, TemplateError> {
        let spec = self.spec_value().map_err(TemplateError::Serialization)?;
        Ok(params::parameters(self.mapping(), &spec))
    }

    fn notification_targets(&self) -> Vec<String> {
        self.cfn_meta()
            .notification_arns
            .iter()
            .flatten()
            .filter(|arn| !arn.is_empty())
            .cloned()
            .collect()
    }

    fn fingerprint(&self) -> Result<String, CoreError> {
        let spec = self.spec_value().map_err(CoreError::from)?;
        fingerprint::fingerprint(&spec)
    }

    fn fingerprint_label(&self) -> Option<String> {
        fingerprint::stored_label(&self.meta().labels).map(str::to_string)
    }

    fn refresh_fingerprint_label(&mut self) -> Result<(), CoreError> {
        let spec = self.spec_value().map_err(CoreError::from)?;
        fingerprint::refresh_label(&mut self.meta_mut().labels, &spec)
    }

    fn fingerprint_changed(&self) -> Result<bool, CoreError> {
        let spec = self.spec_value().map_err(CoreError::from)?;
        fingerprint::has_changed(fingerprint::stored_label(&self.meta().labels), &spec)
    }

    fn stack_id(&self) -> String {
        self.stack_status().stack_id.clone()
    }

    fn set_stack_id(&mut self, id: String) -> Result<(), LifecycleError> {
        self.stack_status_mut().set_stack_id(id)
    }

    fn clear_stack_id(&mut self) {
        self.stack_status_mut().clear_stack_id();
    }

    fn status(&self) -> StackStatus {
        self.stack_status().clone()
    }

    fn set_status(
        &mut self,
        status: ConditionStatus,
        meta: StatusMeta,
    ) -> Result<(), LifecycleError> {
        self.stack_status_mut().set_status(status, meta)
    }
}
