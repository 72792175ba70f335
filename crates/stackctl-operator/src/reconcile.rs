//! The reconcile driver.
//!
//! Consumes the StackObject contract: detects staleness via the spec
//! fingerprint, renders a template and parameters snapshot, hands it to
//! the stack client, and records the outcome on the resource status.
//!
//! The in-memory computation completes before the remote boundary is
//! crossed; no locks are held across a remote call. At most one
//! reconciliation may be in flight per resource identity; the platform
//! supplies that exclusivity, the driver assumes and documents it.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use jiff::Timestamp;
use uuid::Uuid;

use stackctl_cfn::mapping::TemplateContext;
use stackctl_cfn::TemplateError;
use stackctl_core::lifecycle::StackPhase;
use stackctl_core::status::{ConditionKind, ConditionStatus, StackCondition, StatusMeta};

use crate::client::{ClientError, StackClient};
use crate::config::ReconcileConfig;
use crate::error::OperatorError;
use crate::sink::StatusSink;
use crate::stack_object::StackObject;

/// What a reconciliation pass did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Spec unchanged and the recorded state already matches the remote
    /// stack.
    InSync,
    /// Spec unchanged; the remote status was refreshed onto the
    /// resource.
    StatusRefreshed,
    /// A new stack was created.
    Created { stack_id: String },
    /// An update of the existing stack was accepted.
    Updated,
    /// Stack deletion was issued (or nothing was left to delete).
    Deleted,
}

/// Template and parameter snapshot handed across the remote boundary.
struct Snapshot {
    stack_name: String,
    body: String,
    parameters: BTreeMap<String, String>,
    notification_arns: Vec<String>,
}

pub struct Reconciler {
    client: Arc<dyn StackClient>,
    sink: Arc<dyn StatusSink>,
    config: ReconcileConfig,
}

impl Reconciler {
    pub fn new(
        client: Arc<dyn StackClient>,
        sink: Arc<dyn StatusSink>,
        config: ReconcileConfig,
    ) -> Self {
        Self {
            client,
            sink,
            config,
        }
    }

    /// Drive one resource toward its desired state.
    pub async fn reconcile(
        &self,
        obj: &mut dyn StackObject,
        ctx: Option<&TemplateContext<'_>>,
    ) -> Result<Outcome, OperatorError> {
        let identity = obj.identity();
        let pass = Uuid::new_v4();
        tracing::debug!(resource = %identity, pass = %pass, "reconcile pass");

        if obj.stack_id().is_empty() {
            return self.create(obj, ctx).await;
        }

        let changed = obj.fingerprint_changed()?;
        let phase = obj.status().status.phase;
        let in_flight = matches!(
            phase,
            StackPhase::Creating | StackPhase::Updating | StackPhase::Deleting
        );
        if !changed || in_flight {
            // Nothing to deploy, or a remote operation is still settling;
            // a stale fingerprint survives until the next trigger.
            return self.refresh_status(obj).await;
        }

        self.update(obj, ctx).await
    }

    /// Tear the remote stack down when the owning resource is deleted.
    pub async fn teardown(&self, obj: &mut dyn StackObject) -> Result<Outcome, OperatorError> {
        let identity = obj.identity();
        let stack_id = obj.stack_id();
        if stack_id.is_empty() {
            return Ok(Outcome::Deleted);
        }

        tracing::info!(resource = %identity, stack_id = %stack_id, "deleting stack");
        match self
            .remote("delete_stack", self.client.delete_stack(&stack_id))
            .await?
        {
            Ok(()) => {}
            Err(ClientError::NotFound(_)) => {}
            Err(err) => return Err(err.into()),
        }

        let phase = obj.status().status.phase;
        if phase.can_transition(StackPhase::Deleting) {
            self.record(obj, StackPhase::Deleting, "stack delete accepted")?;
        }
        self.flush(obj).await?;
        Ok(Outcome::Deleted)
    }

    async fn create(
        &self,
        obj: &mut dyn StackObject,
        ctx: Option<&TemplateContext<'_>>,
    ) -> Result<Outcome, OperatorError> {
        let snapshot = self.snapshot(obj, ctx).await?;
        let identity = obj.identity();

        tracing::info!(resource = %identity, stack_name = %snapshot.stack_name, "creating stack");
        let stack_id = self
            .remote(
                "create_stack",
                self.client.create_stack(
                    &snapshot.stack_name,
                    &snapshot.body,
                    &snapshot.parameters,
                    &snapshot.notification_arns,
                ),
            )
            .await??;

        obj.set_stack_id(stack_id.clone())?;
        obj.refresh_fingerprint_label()?;
        self.record(obj, StackPhase::Creating, "stack create accepted")?;
        self.flush(obj).await?;
        Ok(Outcome::Created { stack_id })
    }

    async fn update(
        &self,
        obj: &mut dyn StackObject,
        ctx: Option<&TemplateContext<'_>>,
    ) -> Result<Outcome, OperatorError> {
        let snapshot = self.snapshot(obj, ctx).await?;
        let identity = obj.identity();
        let stack_id = obj.stack_id();

        tracing::info!(resource = %identity, stack_id = %stack_id, "updating stack");
        self.remote(
            "update_stack",
            self.client
                .update_stack(&stack_id, &snapshot.body, &snapshot.parameters),
        )
        .await??;

        // A failed stack re-enters the machine through a fresh create.
        let next = if obj.status().status.phase == StackPhase::Ready {
            StackPhase::Updating
        } else {
            StackPhase::Creating
        };
        obj.refresh_fingerprint_label()?;
        self.record(obj, next, "stack update accepted")?;
        self.flush(obj).await?;
        Ok(Outcome::Updated)
    }

    async fn refresh_status(&self, obj: &mut dyn StackObject) -> Result<Outcome, OperatorError> {
        let stack_id = obj.stack_id();
        let remote = match self
            .remote("describe_stack", self.client.describe_stack(&stack_id))
            .await?
        {
            Ok(remote) => remote,
            Err(ClientError::NotFound(_)) => return self.vanished(obj).await,
            Err(err) => return Err(err.into()),
        };

        let current = obj.status().status.phase;
        let Some(phase) = remote.phase() else {
            tracing::debug!(stack_id = %stack_id, status = %remote.status, "unrecognized remote status");
            return Ok(Outcome::InSync);
        };
        if phase == current {
            return Ok(Outcome::InSync);
        }
        // Terminal phases only leave through a fresh create.
        if current.is_terminal() && phase != StackPhase::Creating {
            return Ok(Outcome::InSync);
        }

        let reason = remote
            .reason
            .clone()
            .unwrap_or_else(|| format!("remote status {}", remote.status));
        self.record(obj, phase, &reason)?;
        if phase == StackPhase::Deleted {
            obj.clear_stack_id();
        }
        self.flush(obj).await?;
        Ok(Outcome::StatusRefreshed)
    }

    /// The remote stack disappeared underneath us: walk the status to
    /// Deleted and forget the id so the next stale pass recreates.
    async fn vanished(&self, obj: &mut dyn StackObject) -> Result<Outcome, OperatorError> {
        let identity = obj.identity();
        tracing::warn!(resource = %identity, "remote stack no longer exists");

        let current = obj.status().status.phase;
        if !current.is_terminal() {
            if current != StackPhase::Deleting {
                self.record(obj, StackPhase::Deleting, "remote stack missing")?;
            }
            self.record(obj, StackPhase::Deleted, "remote stack missing")?;
        }
        obj.clear_stack_id();
        self.flush(obj).await?;
        Ok(Outcome::StatusRefreshed)
    }

    /// Render the template and parameters before any remote call. An
    /// unfixable generation failure lands on the status as Failed; the
    /// transient kinds propagate retryable without touching status.
    async fn snapshot(
        &self,
        obj: &mut dyn StackObject,
        ctx: Option<&TemplateContext<'_>>,
    ) -> Result<Snapshot, OperatorError> {
        let template = match obj.template(ctx) {
            Ok(template) => template,
            Err(err) => {
                if matches!(err, TemplateError::MalformedEmbeddedDocument { .. })
                    && obj.status().status.phase != StackPhase::Failed
                {
                    self.record(obj, StackPhase::Failed, &err.to_string())?;
                    self.flush(obj).await?;
                }
                return Err(err.into());
            }
        };
        Ok(Snapshot {
            stack_name: obj.stack_name(),
            body: template.to_json()?,
            parameters: obj.parameters()?,
            notification_arns: obj.notification_targets(),
        })
    }

    /// Overwrite the status pair for a phase transition. In-memory only;
    /// the caller flushes.
    fn record(
        &self,
        obj: &mut dyn StackObject,
        phase: StackPhase,
        reason: &str,
    ) -> Result<(), OperatorError> {
        let now = Timestamp::now();
        let condition = ConditionStatus {
            phase,
            conditions: vec![StackCondition {
                kind: ConditionKind::for_phase(phase),
                reason: reason.to_string(),
                message: String::new(),
                last_transition_time: Some(now),
            }],
        };
        let meta = StatusMeta {
            observed_generation: obj.generation(),
            last_transition_time: Some(now),
            reason: reason.to_string(),
        };
        obj.set_status(condition, meta)?;
        Ok(())
    }

    async fn flush(&self, obj: &dyn StackObject) -> Result<(), OperatorError> {
        let identity = obj.identity();
        let labels = obj.labels();
        let status = obj.status();
        let flush = self.sink.flush(&identity, &labels, &status);
        match tokio::time::timeout(self.config.flush_timeout, flush).await {
            Ok(result) => result.map_err(|err| OperatorError::StatusFlush(err.to_string())),
            Err(_) => Err(OperatorError::Timeout {
                operation: "status_flush",
                timeout: self.config.flush_timeout,
            }),
        }
    }

    /// Wrap a remote call with the configured timeout. A timeout is
    /// surfaced as a retryable error, never discarded.
    async fn remote<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = Result<T, ClientError>>,
    ) -> Result<Result<T, ClientError>, OperatorError> {
        match tokio::time::timeout(self.config.remote_timeout, call).await {
            Ok(result) => Ok(result),
            Err(_) => Err(OperatorError::Timeout {
                operation,
                timeout: self.config.remote_timeout,
            }),
        }
    }
}
