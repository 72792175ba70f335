//! certificatemanager.Certificate

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stackctl_cfn::mapping::{FieldRule, KindMapping, Translate};
use stackctl_core::meta::{CloudFormationMeta, ResourceMeta};
use stackctl_core::status::StackStatus;

use crate::stack_object::StackResource;

/// Desired state for an ACM certificate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSpec {
    #[serde(flatten)]
    pub cloud_formation_meta: CloudFormationMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject_alternative_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domain_validation_options: Vec<DomainValidationOption>,
    /// "DNS" or "EMAIL".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainValidationOption {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_domain: Option<String>,
}

/// A Certificate resource instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Certificate {
    #[serde(default)]
    pub meta: ResourceMeta,
    #[serde(default)]
    pub spec: CertificateSpec,
    #[serde(default)]
    pub status: StackStatus,
}

/// Spec fields to AWS::CertificateManager::Certificate properties.
pub static CERTIFICATE_MAPPING: KindMapping = KindMapping {
    service: "certificatemanager",
    kind: "Certificate",
    resource_type: "AWS::CertificateManager::Certificate",
    rules: &[
        FieldRule {
            source: "domainName",
            target: "DomainName",
            translate: Translate::Value,
        },
        FieldRule {
            source: "subjectAlternativeNames",
            target: "SubjectAlternativeNames",
            translate: Translate::Value,
        },
        FieldRule {
            source: "domainValidationOptions",
            target: "DomainValidationOptions",
            translate: Translate::Items(&[
                FieldRule {
                    source: "domainName",
                    target: "DomainName",
                    translate: Translate::Value,
                },
                FieldRule {
                    source: "validationDomain",
                    target: "ValidationDomain",
                    translate: Translate::Value,
                },
            ]),
        },
        FieldRule {
            source: "validationMethod",
            target: "ValidationMethod",
            translate: Translate::Value,
        },
    ],
    parameters: &["domainName", "validationMethod"],
    arn_output: false,
};

impl StackResource for Certificate {
    fn mapping(&self) -> &'static KindMapping {
        &CERTIFICATE_MAPPING
    }

    fn meta(&self) -> &ResourceMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut ResourceMeta {
        &mut self.meta
    }

    fn cfn_meta(&self) -> &CloudFormationMeta {
        &self.spec.cloud_formation_meta
    }

    fn stack_status(&self) -> &StackStatus {
        &self.status
    }

    fn stack_status_mut(&mut self) -> &mut StackStatus {
        &mut self.status
    }

    fn spec_value(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&self.spec)
    }
}
