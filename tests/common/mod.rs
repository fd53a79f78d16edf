//! Common test utilities
//!
//! In-memory stand-ins for the status provider and the ClusterOperator
//! store. The store records every call so tests can assert on exactly
//! which writes a sync pass performed.

#![allow(dead_code, reason = "each test crate uses a different subset")]

use async_trait::async_trait;
use cluster_operator_status_controller::prelude::*;
use futures::channel::mpsc;
use futures::stream::{BoxStream, StreamExt};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub const NAMESPACE: &str = "";
pub const NAME: &str = "kube-apiserver";

#[derive(Debug, Clone)]
enum ProviderState {
    Status(Option<OperatorStatus>),
    NotFound,
    Failing(String),
    Panicking(String),
}

/// Status provider whose answer tests can change between passes
#[derive(Debug)]
pub struct FakeProvider {
    state: Mutex<ProviderState>,
    sender: mpsc::UnboundedSender<ResourceEvent>,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<ResourceEvent>>>,
    reads: Mutex<usize>,
}

impl FakeProvider {
    pub fn with_status(status: OperatorStatus) -> Arc<Self> {
        Self::with_state(ProviderState::Status(Some(status)))
    }

    /// Source exists but has not reported any status
    pub fn without_status() -> Arc<Self> {
        Self::with_state(ProviderState::Status(None))
    }

    pub fn not_found() -> Arc<Self> {
        Self::with_state(ProviderState::NotFound)
    }

    fn with_state(state: ProviderState) -> Arc<Self> {
        let (sender, receiver) = mpsc::unbounded();
        Arc::new(Self {
            state: Mutex::new(state),
            sender,
            receiver: Mutex::new(Some(receiver)),
            reads: Mutex::new(0),
        })
    }

    pub fn set_status(&self, status: OperatorStatus) {
        *self.state.lock().unwrap() = ProviderState::Status(Some(status));
    }

    pub fn set_failing(&self, message: &str) {
        *self.state.lock().unwrap() = ProviderState::Failing(message.to_string());
    }

    pub fn set_panicking(&self, message: &str) {
        *self.state.lock().unwrap() = ProviderState::Panicking(message.to_string());
    }

    /// Push a change notification to whoever subscribed
    pub fn emit(&self, event: ResourceEvent) {
        self.sender.unbounded_send(event).unwrap();
    }

    /// Number of `current_status` calls so far
    pub fn reads(&self) -> usize {
        *self.reads.lock().unwrap()
    }
}

#[async_trait]
impl OperatorStatusProvider for FakeProvider {
    async fn current_status(&self) -> Result<Option<OperatorStatus>, ProviderError> {
        *self.reads.lock().unwrap() += 1;
        let state = self.state.lock().unwrap().clone();
        match state {
            ProviderState::Status(status) => Ok(status),
            ProviderState::NotFound => Err(ProviderError::NotFound("KubeAPIServer/cluster".into())),
            ProviderState::Failing(message) => Err(ProviderError::Other(anyhow::anyhow!(message))),
            ProviderState::Panicking(message) => panic!("{message}"),
        }
    }

    fn subscribe(&self) -> BoxStream<'static, ResourceEvent> {
        match self.receiver.lock().unwrap().take() {
            Some(receiver) => receiver.boxed(),
            None => futures::stream::empty().boxed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreCall {
    Get,
    Create,
    UpdateStatus,
    Delete,
}

#[derive(Debug, Default)]
struct StoreState {
    object: Option<ClusterOperator>,
    api_registered: bool,
    calls: Vec<StoreCall>,
    failures: HashMap<StoreCall, VecDeque<StoreError>>,
    created: Vec<ClusterOperator>,
    status_writes: Vec<ClusterOperator>,
    next_version: u64,
}

/// ClusterOperator store that behaves like the API server for the calls
/// the reconciler makes: create ignores `status`, status updates touch
/// only `status`, and every write bumps the resource version.
#[derive(Debug)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(StoreState {
                api_registered: true,
                next_version: 1,
                ..StoreState::default()
            }),
        })
    }

    pub fn with_object(object: ClusterOperator) -> Arc<Self> {
        let store = Self::empty();
        store.state.lock().unwrap().object = Some(object);
        store
    }

    /// Make `create` fail with NotFound as if the CRD were missing
    pub fn unregister_api(&self) {
        self.state.lock().unwrap().api_registered = false;
    }

    pub fn register_api(&self) {
        self.state.lock().unwrap().api_registered = true;
    }

    /// Fail the next call of `call` with `error`
    pub fn fail_next(&self, call: StoreCall, error: StoreError) {
        self.state
            .lock()
            .unwrap()
            .failures
            .entry(call)
            .or_default()
            .push_back(error);
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls other than `get`
    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls()
            .into_iter()
            .filter(|call| *call != StoreCall::Get)
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn object(&self) -> Option<ClusterOperator> {
        self.state.lock().unwrap().object.clone()
    }

    /// Objects passed to `create`, in call order
    pub fn created(&self) -> Vec<ClusterOperator> {
        self.state.lock().unwrap().created.clone()
    }

    /// Objects passed to `update_status`, in call order
    pub fn status_writes(&self) -> Vec<ClusterOperator> {
        self.state.lock().unwrap().status_writes.clone()
    }

    fn begin(&self, call: StoreCall) -> Result<std::sync::MutexGuard<'_, StoreState>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.failures.get_mut(&call).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

fn bump_version(state: &mut StoreState, object: &mut ClusterOperator) {
    object.metadata.resource_version = Some(state.next_version.to_string());
    state.next_version += 1;
}

#[async_trait]
impl ClusterOperatorStore for FakeStore {
    async fn get(&self) -> Result<ClusterOperator, StoreError> {
        let state = self.begin(StoreCall::Get)?;
        state
            .object
            .clone()
            .ok_or_else(|| StoreError::NotFound(NAME.to_string()))
    }

    async fn create(&self, operator: &ClusterOperator) -> Result<ClusterOperator, StoreError> {
        let mut state = self.begin(StoreCall::Create)?;
        state.created.push(operator.clone());
        if !state.api_registered {
            return Err(StoreError::NotFound("clusteroperators".to_string()));
        }
        if state.object.is_some() {
            return Err(StoreError::AlreadyExists(NAME.to_string()));
        }
        let mut object = operator.clone();
        object.status = None;
        object.metadata.uid = Some("uid-1".to_string());
        bump_version(&mut state, &mut object);
        state.object = Some(object.clone());
        Ok(object)
    }

    async fn update_status(
        &self,
        operator: &ClusterOperator,
    ) -> Result<ClusterOperator, StoreError> {
        let mut state = self.begin(StoreCall::UpdateStatus)?;
        state.status_writes.push(operator.clone());
        let Some(mut object) = state.object.clone() else {
            return Err(StoreError::NotFound(NAME.to_string()));
        };
        object.status.clone_from(&operator.status);
        bump_version(&mut state, &mut object);
        state.object = Some(object.clone());
        Ok(object)
    }

    async fn delete(&self) -> Result<(), StoreError> {
        let mut state = self.begin(StoreCall::Delete)?;
        state.object = None;
        Ok(())
    }
}

pub fn reconciler(provider: &Arc<FakeProvider>, store: &Arc<FakeStore>) -> Reconciler {
    Reconciler::new(
        NAMESPACE,
        NAME,
        Arc::clone(provider) as Arc<dyn OperatorStatusProvider>,
        Arc::clone(store) as Arc<dyn ClusterOperatorStore>,
    )
}

pub fn condition(condition_type: &str, status: ConditionStatus) -> OperatorCondition {
    OperatorCondition::new(condition_type, status)
}

/// A healthy operator: available, not failing, not progressing
pub fn healthy_status() -> OperatorStatus {
    OperatorStatus::new(vec![
        condition("Available", ConditionStatus::True),
        condition("Progressing", ConditionStatus::False),
        condition("InstallerFailing", ConditionStatus::False),
    ])
}
