//! Explicit kind registry.
//!
//! Maps a (service, kind) pair to a constructor turning the raw JSON
//! representation of a resource into its StackObject. Built at startup
//! and passed by reference; no process-wide registration, so tests run
//! against isolated registries.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde_json::Value;

use stackctl_core::error::CoreError;

use crate::error::OperatorError;
use crate::stack_object::{StackObject, StackResource};

type Constructor = Box<dyn Fn(Value) -> Result<Box<dyn StackObject>, OperatorError> + Send + Sync>;

#[derive(Default)]
pub struct Registry {
    kinds: BTreeMap<(String, String), Constructor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resource kind under its service/kind pair.
    pub fn register<R>(&mut self, service: &str, kind: &str)
    where
        R: StackResource + DeserializeOwned + std::fmt::Debug + 'static,
    {
        self.kinds.insert(
            (service.to_string(), kind.to_string()),
            Box::new(|raw| {
                let resource: R = serde_json::from_value(raw).map_err(CoreError::from)?;
                Ok(Box::new(resource) as Box<dyn StackObject>)
            }),
        );
    }

    /// Instantiate the StackObject for a raw resource of the given kind.
    pub fn resolve(
        &self,
        service: &str,
        kind: &str,
        raw: Value,
    ) -> Result<Box<dyn StackObject>, OperatorError> {
        let key = (service.to_string(), kind.to_string());
        match self.kinds.get(&key) {
            Some(constructor) => constructor(raw),
            None => Err(OperatorError::UnknownKind {
                service: service.to_string(),
                kind: kind.to_string(),
            }),
        }
    }

    pub fn contains(&self, service: &str, kind: &str) -> bool {
        self.kinds
            .contains_key(&(service.to_string(), kind.to_string()))
    }

    /// Registered (service, kind) pairs, in stable order.
    pub fn kinds(&self) -> impl Iterator<Item = &(String, String)> {
        self.kinds.keys()
    }
}
