//! Shared in-memory collaborators for tests: a registry and host that never
//! touch the OS, plus a scripted unit for controller-side wait-loop tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::UnitConfig;
use crate::control::{AcceptMask, Command, ServiceState, UnitStatus};
use crate::error::ServiceError;
use crate::registry::{Registry, RegistryError, UnitHandle};
use crate::service::{Host, ServiceCore, ServiceIdentity, ServiceManager};

/// Registry for tests that never reach the registry seam.
pub(crate) struct NullRegistry;

#[async_trait]
impl Registry for NullRegistry {
    async fn install(
        &self,
        _identity: &ServiceIdentity,
        _binary: &Path,
        _config: &UnitConfig,
    ) -> Result<(), RegistryError> {
        Err(RegistryError::Connect { reason: "no registry in this test".into() })
    }

    async fn open(&self, _name: &str) -> Result<Box<dyn UnitHandle>, RegistryError> {
        Err(RegistryError::Connect { reason: "no registry in this test".into() })
    }
}

/// Host reporting an ordinary (non-service) process.
pub(crate) struct NullHost;

#[async_trait]
impl Host for NullHost {
    fn in_service(&self) -> Result<bool, ServiceError> {
        Ok(false)
    }

    async fn run(&self, _name: &str, _core: Arc<ServiceCore>) -> Result<(), ServiceError> {
        Ok(())
    }
}

/// A manager over null collaborators.
pub(crate) fn test_manager() -> Arc<ServiceManager> {
    ServiceManager::new(
        ServiceIdentity::new("demo", "Demo Service", "in-memory test unit"),
        Arc::new(NullRegistry),
        Arc::new(NullHost),
    )
}

/// Scripted state of one registered unit: canned replies plus a log of
/// everything the controller did to it.
pub(crate) struct ScriptedUnit {
    control_reply: Mutex<UnitStatus>,
    query_plan: Mutex<VecDeque<UnitStatus>>,
    query_fallback: Mutex<UnitStatus>,
    pub controls: Mutex<Vec<Command>>,
    pub started_args: Mutex<Option<Vec<String>>>,
    pub deleted: AtomicBool,
    pub binary_path: String,
}

impl ScriptedUnit {
    /// A unit replying `control_reply` to control codes and
    /// `query_fallback` to every query not covered by
    /// [`ScriptedUnit::plan_queries`].
    pub fn replying(control_reply: UnitStatus, query_fallback: UnitStatus) -> Arc<Self> {
        Arc::new(Self {
            control_reply: Mutex::new(control_reply),
            query_plan: Mutex::new(VecDeque::new()),
            query_fallback: Mutex::new(query_fallback),
            controls: Mutex::new(Vec::new()),
            started_args: Mutex::new(None),
            deleted: AtomicBool::new(false),
            binary_path: "/opt/demo/bin/demo".to_string(),
        })
    }

    /// A unit that immediately reports `state` everywhere.
    pub fn settled(state: ServiceState) -> Arc<Self> {
        let status = UnitStatus::new(state, AcceptMask::NONE);
        Self::replying(status, status)
    }

    /// Queues statuses returned by successive queries before the fallback
    /// applies.
    pub fn plan_queries(&self, statuses: impl IntoIterator<Item = UnitStatus>) {
        self.query_plan.lock().unwrap().extend(statuses);
    }
}

/// In-memory registry over at most one scripted unit.
pub(crate) struct ScriptedRegistry {
    pub unit: Option<Arc<ScriptedUnit>>,
    pub installs: Mutex<Vec<(String, String)>>,
}

impl ScriptedRegistry {
    pub fn with_unit(unit: Arc<ScriptedUnit>) -> Arc<Self> {
        Arc::new(Self { unit: Some(unit), installs: Mutex::new(Vec::new()) })
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self { unit: None, installs: Mutex::new(Vec::new()) })
    }
}

#[async_trait]
impl Registry for ScriptedRegistry {
    async fn install(
        &self,
        identity: &ServiceIdentity,
        binary: &Path,
        _config: &UnitConfig,
    ) -> Result<(), RegistryError> {
        if self.unit.is_some() {
            return Err(RegistryError::AlreadyExists { name: identity.name().to_string() });
        }
        self.installs
            .lock()
            .unwrap()
            .push((identity.name().to_string(), binary.display().to_string()));
        Ok(())
    }

    async fn open(&self, name: &str) -> Result<Box<dyn UnitHandle>, RegistryError> {
        match &self.unit {
            Some(unit) => Ok(Box::new(ScriptedConnection { unit: unit.clone() })),
            None => Err(RegistryError::NotFound { name: name.to_string() }),
        }
    }
}

struct ScriptedConnection {
    unit: Arc<ScriptedUnit>,
}

#[async_trait]
impl UnitHandle for ScriptedConnection {
    async fn start(&mut self, args: &[String]) -> Result<(), RegistryError> {
        *self.unit.started_args.lock().unwrap() = Some(args.to_vec());
        Ok(())
    }

    async fn control(&mut self, command: Command) -> Result<UnitStatus, RegistryError> {
        self.unit.controls.lock().unwrap().push(command);
        Ok(*self.unit.control_reply.lock().unwrap())
    }

    async fn query(&mut self) -> Result<UnitStatus, RegistryError> {
        let planned = self.unit.query_plan.lock().unwrap().pop_front();
        Ok(planned.unwrap_or(*self.unit.query_fallback.lock().unwrap()))
    }

    async fn binary_path(&mut self) -> Result<String, RegistryError> {
        Ok(self.unit.binary_path.clone())
    }

    async fn delete(&mut self) -> Result<(), RegistryError> {
        self.unit.deleted.store(true, Ordering::SeqCst);
        Ok(())
    }
}
