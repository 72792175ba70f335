use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stackctl_cfn::mapping::{EmptyResolver, TemplateContext};
use stackctl_core::lifecycle::StackPhase;
use stackctl_core::status::StackStatus;
use stackctl_operator::apis::certificatemanager::Certificate;
use stackctl_operator::apis::iam::{User, UserPolicy};
use stackctl_operator::client::{BoxFuture, ClientError, RemoteStackStatus, StackClient};
use stackctl_operator::error::OperatorError;
use stackctl_operator::reconcile::{Outcome, Reconciler};
use stackctl_operator::sink::{InMemorySink, SinkError, StatusSink};
use stackctl_operator::stack_object::{ResourceIdentity, StackObject};
use stackctl_operator::ReconcileConfig;

/// Scripted stack client: records calls and plays back a remote status.
#[derive(Default)]
struct MockClient {
    remote_status: Mutex<Option<String>>,
    calls: Mutex<Vec<String>>,
    hang: bool,
}

impl MockClient {
    fn set_remote_status(&self, status: Option<&str>) {
        *self.remote_status.lock().unwrap() = status.map(str::to_string);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl StackClient for MockClient {
    fn create_stack(
        &self,
        name: &str,
        template_body: &str,
        _parameters: &BTreeMap<String, String>,
        _notification_arns: &[String],
    ) -> BoxFuture<'_, Result<String, ClientError>> {
        if self.hang {
            return Box::pin(std::future::pending());
        }
        let name = name.to_string();
        let body = template_body.to_string();
        Box::pin(async move {
            assert!(!body.is_empty());
            self.calls.lock().unwrap().push(format!("create {name}"));
            self.set_remote_status(Some("CREATE_IN_PROGRESS"));
            Ok(format!(
                "arn:aws:cloudformation:us-east-1:123456789012:stack/{name}/1"
            ))
        })
    }

    fn update_stack(
        &self,
        stack_id: &str,
        _template_body: &str,
        _parameters: &BTreeMap<String, String>,
    ) -> BoxFuture<'_, Result<(), ClientError>> {
        let stack_id = stack_id.to_string();
        Box::pin(async move {
            self.calls.lock().unwrap().push(format!("update {stack_id}"));
            self.set_remote_status(Some("UPDATE_IN_PROGRESS"));
            Ok(())
        })
    }

    fn describe_stack(
        &self,
        stack_id: &str,
    ) -> BoxFuture<'_, Result<RemoteStackStatus, ClientError>> {
        if self.hang {
            return Box::pin(std::future::pending());
        }
        let stack_id = stack_id.to_string();
        Box::pin(async move {
            self.calls
                .lock()
                .unwrap()
                .push(format!("describe {stack_id}"));
            match self.remote_status.lock().unwrap().clone() {
                Some(status) => Ok(RemoteStackStatus {
                    status,
                    reason: None,
                }),
                None => Err(ClientError::NotFound(stack_id)),
            }
        })
    }

    fn delete_stack(&self, stack_id: &str) -> BoxFuture<'_, Result<(), ClientError>> {
        let stack_id = stack_id.to_string();
        Box::pin(async move {
            self.calls.lock().unwrap().push(format!("delete {stack_id}"));
            self.set_remote_status(Some("DELETE_IN_PROGRESS"));
            Ok(())
        })
    }
}

/// Sink that refuses every flush.
struct FailingSink;

impl StatusSink for FailingSink {
    fn flush(
        &self,
        _identity: &ResourceIdentity,
        _labels: &BTreeMap<String, String>,
        _status: &StackStatus,
    ) -> BoxFuture<'_, Result<(), SinkError>> {
        Box::pin(async { Err(SinkError("backing store unavailable".to_string())) })
    }
}

fn certificate() -> Certificate {
    let mut cert = Certificate::default();
    cert.meta.name = "site-cert".to_string();
    cert.meta.namespace = "prod".to_string();
    cert.spec.domain_name = Some("example.com".to_string());
    cert
}

fn harness() -> (Arc<MockClient>, Arc<InMemorySink>, Reconciler) {
    let client = Arc::new(MockClient::default());
    let sink = Arc::new(InMemorySink::new());
    let reconciler = Reconciler::new(client.clone(), sink.clone(), ReconcileConfig::default());
    (client, sink, reconciler)
}

#[tokio::test]
async fn first_pass_creates_the_stack() {
    let (client, sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    let Outcome::Created { stack_id } = outcome else {
        panic!("expected create, got {outcome:?}");
    };
    assert!(!stack_id.is_empty());
    assert_eq!(cert.stack_id(), stack_id);
    assert_eq!(cert.status.status.phase, StackPhase::Creating);
    assert!(!cert.fingerprint_changed().unwrap());
    assert_eq!(
        client.calls(),
        vec!["create certificatemanager-certificate-site-cert-prod".to_string()]
    );

    let (labels, persisted) = sink.get(&cert.identity()).unwrap();
    assert_eq!(persisted.status.phase, StackPhase::Creating);
    assert!(labels.contains_key("cloudformation.stackctl.io/spec-fingerprint"));
}

#[tokio::test]
async fn unchanged_spec_only_refreshes_status() {
    let (client, _sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    client.set_remote_status(Some("CREATE_COMPLETE"));

    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::StatusRefreshed);
    assert_eq!(cert.status.status.phase, StackPhase::Ready);

    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::InSync);
}

#[tokio::test]
async fn spec_change_triggers_update() {
    let (client, _sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    client.set_remote_status(Some("CREATE_COMPLETE"));
    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();

    cert.spec.subject_alternative_names = vec!["www.example.com".to_string()];
    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::Updated);
    assert_eq!(cert.status.status.phase, StackPhase::Updating);
    assert!(!cert.fingerprint_changed().unwrap());
    assert!(client
        .calls()
        .iter()
        .any(|call| call.starts_with("update ")));
}

#[tokio::test]
async fn in_flight_stack_defers_new_changes() {
    let (client, _sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();

    // Spec changes while the create is still settling: no update call,
    // the stale fingerprint survives to the next trigger.
    cert.spec.subject_alternative_names = vec!["www.example.com".to_string()];
    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::InSync);
    assert!(cert.fingerprint_changed().unwrap());
    assert!(!client.calls().iter().any(|call| call.starts_with("update ")));
}

#[tokio::test]
async fn malformed_policy_marks_failed() {
    let (client, sink, reconciler) = harness();
    let mut user = User::default();
    user.meta.name = "alice".to_string();
    user.meta.namespace = "team-a".to_string();
    user.spec.policies = vec![UserPolicy {
        policy_name: Some("broken".to_string()),
        policy_document: Some("{\"Version\": ".to_string()),
    }];
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    let err = reconciler.reconcile(&mut user, Some(&ctx)).await.unwrap_err();
    assert!(!err.retryable());
    assert_eq!(user.status.status.phase, StackPhase::Failed);
    assert!(user.status.status_meta.reason.contains("malformed embedded document"));
    assert!(client.calls().is_empty());

    let (_labels, persisted) = sink.get(&user.identity()).unwrap();
    assert_eq!(persisted.status.phase, StackPhase::Failed);
}

#[tokio::test]
async fn missing_context_does_not_poison_status() {
    let (_client, _sink, reconciler) = harness();
    let mut cert = certificate();

    let err = reconciler.reconcile(&mut cert, None).await.unwrap_err();
    assert!(err.retryable());
    assert_eq!(cert.status.status.phase, StackPhase::Unset);
}

#[tokio::test]
async fn remote_timeout_is_retryable() {
    let client = Arc::new(MockClient {
        hang: true,
        ..Default::default()
    });
    let sink = Arc::new(InMemorySink::new());
    let config = ReconcileConfig {
        remote_timeout: Duration::from_millis(50),
        flush_timeout: Duration::from_millis(50),
    };
    let reconciler = Reconciler::new(client, sink, config);
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    let err = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap_err();
    assert!(matches!(err, OperatorError::Timeout { .. }));
    assert!(err.retryable());
    assert!(cert.stack_id().is_empty());
}

#[tokio::test]
async fn failed_flush_surfaces_as_retryable() {
    let client = Arc::new(MockClient::default());
    let sink = Arc::new(FailingSink);
    let reconciler = Reconciler::new(client, sink, ReconcileConfig::default());
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    let err = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap_err();
    assert!(matches!(err, OperatorError::StatusFlush(_)));
    assert!(err.retryable());
}

#[tokio::test]
async fn teardown_walks_the_stack_to_deleted() {
    let (client, _sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    client.set_remote_status(Some("CREATE_COMPLETE"));
    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();

    let outcome = reconciler.teardown(&mut cert).await.unwrap();
    assert_eq!(outcome, Outcome::Deleted);
    assert_eq!(cert.status.status.phase, StackPhase::Deleting);
    assert!(client.calls().iter().any(|call| call.starts_with("delete ")));

    client.set_remote_status(Some("DELETE_COMPLETE"));
    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::StatusRefreshed);
    assert_eq!(cert.status.status.phase, StackPhase::Deleted);
    assert!(cert.stack_id().is_empty());
}

#[tokio::test]
async fn vanished_stack_resets_for_recreate() {
    let (client, _sink, reconciler) = harness();
    let mut cert = certificate();
    let resolver = EmptyResolver;
    let ctx = TemplateContext {
        resolver: &resolver,
    };

    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    client.set_remote_status(Some("CREATE_COMPLETE"));
    reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();

    // Someone deleted the stack out from under the controller.
    client.set_remote_status(None);
    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert_eq!(outcome, Outcome::StatusRefreshed);
    assert_eq!(cert.status.status.phase, StackPhase::Deleted);
    assert!(cert.stack_id().is_empty());

    let outcome = reconciler.reconcile(&mut cert, Some(&ctx)).await.unwrap();
    assert!(matches!(outcome, Outcome::Created { .. }));
    assert_eq!(cert.status.status.phase, StackPhase::Creating);
}
