use std::collections::BTreeMap;

use aws_sdk_cloudformation::types::{Capability, OnFailure, Parameter};
use aws_sdk_cloudformation::Client;

use stackctl_operator::client::{BoxFuture, ClientError, RemoteStackStatus, StackClient};

use crate::error::format_err_chain;

/// Stack client backed by AWS CloudFormation.
pub struct CloudFormationClient {
    client: Client,
}

impl CloudFormationClient {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Build from the ambient AWS environment (profile, region, role).
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(&config)
    }
}

fn to_parameters(parameters: &BTreeMap<String, String>) -> Vec<Parameter> {
    parameters
        .iter()
        .map(|(key, value)| {
            Parameter::builder()
                .parameter_key(key)
                .parameter_value(value)
                .build()
        })
        .collect()
}

fn is_not_found(message: &str) -> bool {
    message.contains("does not exist")
}

impl StackClient for CloudFormationClient {
    fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        parameters: &BTreeMap<String, String>,
        notification_arns: &[String],
    ) -> BoxFuture<'_, Result<String, ClientError>> {
        let name = name.to_string();
        let body = template_body.to_string();
        let params = to_parameters(parameters);
        let arns = notification_arns.to_vec();
        Box::pin(async move {
            let mut request = self
                .client
                .create_stack()
                .stack_name(&name)
                .template_body(body)
                .set_parameters(Some(params))
                .capabilities(Capability::CapabilityNamedIam)
                .on_failure(OnFailure::Delete);
            for arn in arns {
                request = request.notification_arns(arn);
            }
            let resp = request.send().await.map_err(|err| {
                ClientError::Remote(format!(
                    "cloudformation:CreateStack failed: {}",
                    format_err_chain(&err)
                ))
            })?;
            tracing::info!(stack_name = %name, "create stack accepted");
            Ok(resp.stack_id().unwrap_or_default().to_string())
        })
    }

    fn update_stack(
        &self,
        stack_id: &str,
        template_body: &str,
        parameters: &BTreeMap<String, String>,
    ) -> BoxFuture<'_, Result<(), ClientError>> {
        let stack_id = stack_id.to_string();
        let body = template_body.to_string();
        let params = to_parameters(parameters);
        Box::pin(async move {
            let result = self
                .client
                .update_stack()
                .stack_name(&stack_id)
                .template_body(body)
                .set_parameters(Some(params))
                .capabilities(Capability::CapabilityNamedIam)
                .send()
                .await;
            match result {
                Ok(_) => {
                    tracing::info!(stack_id = %stack_id, "update stack accepted");
                    Ok(())
                }
                Err(err) => {
                    let msg = format_err_chain(&err);
                    // CloudFormation rejects no-op updates; that is
                    // in-sync, not a failure.
                    if msg.contains("No updates are to be performed") {
                        tracing::debug!(stack_id = %stack_id, "no remote changes");
                        Ok(())
                    } else if is_not_found(&msg) {
                        Err(ClientError::NotFound(stack_id.clone()))
                    } else {
                        Err(ClientError::Remote(format!(
                            "cloudformation:UpdateStack failed: {msg}"
                        )))
                    }
                }
            }
        })
    }

    fn describe_stack(
        &self,
        stack_id: &str,
    ) -> BoxFuture<'_, Result<RemoteStackStatus, ClientError>> {
        let stack_id = stack_id.to_string();
        Box::pin(async move {
            let resp = self
                .client
                .describe_stacks()
                .stack_name(&stack_id)
                .send()
                .await
                .map_err(|err| {
                    let msg = format_err_chain(&err);
                    if is_not_found(&msg) {
                        ClientError::NotFound(stack_id.clone())
                    } else {
                        ClientError::Remote(format!("cloudformation:DescribeStacks failed: {msg}"))
                    }
                })?;
            let stack = resp
                .stacks()
                .first()
                .ok_or_else(|| ClientError::NotFound(stack_id.clone()))?;
            let status = stack
                .stack_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default();
            Ok(RemoteStackStatus {
                status,
                reason: stack.stack_status_reason().map(str::to_string),
            })
        })
    }

    fn delete_stack(&self, stack_id: &str) -> BoxFuture<'_, Result<(), ClientError>> {
        let stack_id = stack_id.to_string();
        Box::pin(async move {
            self.client
                .delete_stack()
                .stack_name(&stack_id)
                .send()
                .await
                .map_err(|err| {
                    let msg = format_err_chain(&err);
                    if is_not_found(&msg) {
                        ClientError::NotFound(stack_id.clone())
                    } else {
                        ClientError::Remote(format!("cloudformation:DeleteStack failed: {msg}"))
                    }
                })?;
            tracing::info!(stack_id = %stack_id, "delete stack accepted");
            Ok(())
        })
    }
}
