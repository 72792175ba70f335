//! iam.User

use serde::{Deserialize, Serialize};
use serde_json::Value;

use stackctl_cfn::mapping::{FieldRule, KindMapping, Translate};
use stackctl_core::meta::{CloudFormationMeta, ObjectRef, ResourceMeta};
use stackctl_core::status::StackStatus;

use crate::stack_object::StackResource;

/// Desired state for an IAM user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    #[serde(flatten)]
    pub cloud_formation_meta: CloudFormationMeta,
    /// Defaults to the resource name when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions_boundary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_profile: Option<LoginProfile>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<UserPolicy>,
    /// References to managed policy resources; an unset namespace means
    /// the user's own namespace.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub managed_policy_refs: Vec<ObjectRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_required: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPolicy {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_name: Option<String>,
    /// Inline policy document as serialized JSON text; parsed to
    /// structured data at generation time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_document: Option<String>,
}

/// A User resource instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub meta: ResourceMeta,
    #[serde(default)]
    pub spec: UserSpec,
    #[serde(default)]
    pub status: StackStatus,
}

/// Spec fields to AWS::IAM::User properties.
pub static USER_MAPPING: KindMapping = KindMapping {
    service: "iam",
    kind: "User",
    resource_type: "AWS::IAM::User",
    rules: &[
        FieldRule {
            source: "userName",
            target: "UserName",
            translate: Translate::DefaultFromName,
        },
        FieldRule {
            source: "path",
            target: "Path",
            translate: Translate::Value,
        },
        FieldRule {
            source: "permissionsBoundary",
            target: "PermissionsBoundary",
            translate: Translate::Value,
        },
        FieldRule {
            source: "groups",
            target: "Groups",
            translate: Translate::Value,
        },
        FieldRule {
            source: "loginProfile",
            target: "LoginProfile",
            translate: Translate::Object(&[
                FieldRule {
                    source: "password",
                    target: "Password",
                    translate: Translate::Value,
                },
                FieldRule {
                    source: "passwordResetRequired",
                    target: "PasswordResetRequired",
                    translate: Translate::Value,
                },
            ]),
        },
        FieldRule {
            source: "policies",
            target: "Policies",
            translate: Translate::Items(&[
                FieldRule {
                    source: "policyName",
                    target: "PolicyName",
                    translate: Translate::Value,
                },
                FieldRule {
                    source: "policyDocument",
                    target: "PolicyDocument",
                    translate: Translate::EmbeddedJson,
                },
            ]),
        },
        FieldRule {
            source: "managedPolicyRefs",
            target: "ManagedPolicyArns",
            translate: Translate::ObjectRefs,
        },
    ],
    parameters: &["userName", "path"],
    arn_output: true,
};

impl StackResource for User {
    fn mapping(&self) -> &'static KindMapping {
        &USER_MAPPING
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
