//! Scripted in-memory lifecycle backend for tests

use async_trait::async_trait;
use jobcheck_client::{ClientError, LifecycleClient, Result};
use jobcheck_core::domain::workload::{
    PodPhase, PodRef, WorkloadDescriptor, WorkloadIdentity, WorkloadStatus,
};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// A call received by [`ScriptedClient`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    List(String),
    FetchLog(String),
    Delete(String),
    Status(String),
}

type ErrorFactory = fn() -> ClientError;

#[derive(Default)]
struct State {
    jobs: HashSet<WorkloadIdentity>,
    pods: VecDeque<Result<Vec<PodRef>>>,
    default_pods: Vec<PodRef>,
    logs: VecDeque<Result<String>>,
    default_log: String,
    statuses: VecDeque<Result<WorkloadStatus>>,
    create_error: Option<ErrorFactory>,
    delete_error: Option<ErrorFactory>,
    calls: Vec<Call>,
}

/// Backend whose responses are consumed from per-operation scripts
///
/// Jobs are tracked for real: creating an existing identity conflicts and
/// deleting a missing one is not found. Once a script runs dry the
/// corresponding default answer is returned.
#[derive(Default)]
pub struct ScriptedClient {
    state: Mutex<State>,
}

pub fn pod(name: &str) -> PodRef {
    PodRef {
        name: name.to_string(),
        namespace: "default".to_string(),
        phase: PodPhase::Running,
        created_at: None,
    }
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_existing(self, identity: WorkloadIdentity) -> Self {
        self.state.lock().unwrap().jobs.insert(identity);
        self
    }

    /// Every list call returns this pod once the pod script is empty
    pub fn with_pod(self, name: &str) -> Self {
        self.state.lock().unwrap().default_pods = vec![pod(name)];
        self
    }

    pub fn script_pods(self, responses: Vec<Result<Vec<PodRef>>>) -> Self {
        self.state.lock().unwrap().pods.extend(responses);
        self
    }

    pub fn script_logs(self, responses: Vec<Result<String>>) -> Self {
        self.state.lock().unwrap().logs.extend(responses);
        self
    }

    pub fn with_default_log(self, log: &str) -> Self {
        self.state.lock().unwrap().default_log = log.to_string();
        self
    }

    pub fn script_statuses(self, responses: Vec<Result<WorkloadStatus>>) -> Self {
        self.state.lock().unwrap().statuses.extend(responses);
        self
    }

    pub fn failing_creates(self, error: ErrorFactory) -> Self {
        self.state.lock().unwrap().create_error = Some(error);
        self
    }

    pub fn failing_deletes(self, error: ErrorFactory) -> Self {
        self.state.lock().unwrap().delete_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn exists(&self, identity: &WorkloadIdentity) -> bool {
        self.state.lock().unwrap().jobs.contains(identity)
    }

    pub fn delete_count(&self, identity: &WorkloadIdentity) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == Call::Delete(identity.name.clone()))
            .count()
    }

    pub fn log_fetches(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::FetchLog(_)))
            .count()
    }
}

#[async_trait]
impl LifecycleClient for ScriptedClient {
    async fn create(&self, descriptor: &WorkloadDescriptor) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let identity = &descriptor.identity;
        state.calls.push(Call::Create(identity.name.clone()));

        if let Some(error) = state.create_error {
            return Err(error());
        }
        if !state.jobs.insert(identity.clone()) {
            return Err(ClientError::Conflict(identity.to_string()));
        }
        Ok(())
    }

    async fn list_by_label(&self, _namespace: &str, label_selector: &str) -> Result<Vec<PodRef>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::List(label_selector.to_string()));

        match state.pods.pop_front() {
            Some(response) => response,
            None => Ok(state.default_pods.clone()),
        }
    }

    async fn fetch_log_tail(&self, pod: &PodRef, _max_lines: u32) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::FetchLog(pod.name.clone()));

        match state.logs.pop_front() {
            Some(response) => response,
            None => Ok(state.default_log.clone()),
        }
    }

    async fn delete(&self, identity: &WorkloadIdentity) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Delete(identity.name.clone()));

        if let Some(error) = state.delete_error {
            return Err(error());
        }
        if !state.jobs.remove(identity) {
            return Err(ClientError::NotFound(identity.to_string()));
        }
        Ok(())
    }

    async fn workload_status(&self, identity: &WorkloadIdentity) -> Result<WorkloadStatus> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Status(identity.name.clone()));

        match state.statuses.pop_front() {
            Some(response) => response,
            None => Ok(WorkloadStatus::default()),
        }
    }
}
