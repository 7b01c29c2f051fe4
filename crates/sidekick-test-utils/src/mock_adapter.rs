// SPDX-FileCopyrightText: 2026 Sidekick Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock site adapter for deterministic testing.
//!
//! `MockAdapter` implements `SiteAdapter` with scripted results and a shared
//! call log. Clones share the log, so a test keeps one clone for assertions
//! and hands the other to the registry.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use sidekick_core::{
    AdapterStatus, CapabilitySet, ElementHandle, FileAttachment, PluginContext, Screenshot,
    SidekickError, SiteAdapter,
};

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Initialize,
    Activate,
    Deactivate,
    Cleanup,
    IsSupported,
    InsertText(String),
    SubmitForm,
    AttachFile(String),
    CaptureScreenshot,
    SelectElement(String),
    NavigateToUrl(String),
    ExecuteScript(String),
}

/// A call together with the (tokio) time it completed.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub call: MockCall,
    pub at: Instant,
}

/// Scripted outcome for a capability method.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Succeed,
    ReturnFalse,
    Fail(String),
    Panic,
}

#[derive(Debug, Clone)]
struct Script {
    initialize: MockOutcome,
    activate: MockOutcome,
    deactivate: MockOutcome,
    cleanup: MockOutcome,
    insert: MockOutcome,
    submit: MockOutcome,
    attach: MockOutcome,
    supported: bool,
    activation_delay: Option<Duration>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            initialize: MockOutcome::Succeed,
            activate: MockOutcome::Succeed,
            deactivate: MockOutcome::Succeed,
            cleanup: MockOutcome::Succeed,
            insert: MockOutcome::Succeed,
            submit: MockOutcome::Succeed,
            attach: MockOutcome::Succeed,
            supported: true,
            activation_delay: None,
        }
    }
}

#[derive(Debug)]
struct Shared {
    calls: Vec<RecordedCall>,
    status: AdapterStatus,
    context: Option<PluginContext>,
}

/// A mock site adapter for testing.
#[derive(Debug, Clone)]
pub struct MockAdapter {
    name: Arc<str>,
    capabilities: CapabilitySet,
    script: Script,
    shared: Arc<Mutex<Shared>>,
}

impl MockAdapter {
    /// Create a mock declaring `capabilities`, succeeding at everything.
    pub fn new(name: &str, capabilities: impl Into<CapabilitySet>) -> Self {
        Self {
            name: Arc::from(name),
            capabilities: capabilities.into(),
            script: Script::default(),
            shared: Arc::new(Mutex::new(Shared {
                calls: Vec::new(),
                status: AdapterStatus::Uninitialized,
                context: None,
            })),
        }
    }

    pub fn with_initialize(mut self, outcome: MockOutcome) -> Self {
        self.script.initialize = outcome;
        self
    }

    pub fn with_activate(mut self, outcome: MockOutcome) -> Self {
        self.script.activate = outcome;
        self
    }

    pub fn with_deactivate(mut self, outcome: MockOutcome) -> Self {
        self.script.deactivate = outcome;
        self
    }

    pub fn with_cleanup(mut self, outcome: MockOutcome) -> Self {
        self.script.cleanup = outcome;
        self
    }

    pub fn with_insert(mut self, outcome: MockOutcome) -> Self {
        self.script.insert = outcome;
        self
    }

    pub fn with_submit(mut self, outcome: MockOutcome) -> Self {
        self.script.submit = outcome;
        self
    }

    pub fn with_attach(mut self, outcome: MockOutcome) -> Self {
        self.script.attach = outcome;
        self
    }

    /// `is_supported` returns false.
    pub fn unsupported(mut self) -> Self {
        self.script.supported = false;
        self
    }

    /// `activate` sleeps this long before completing.
    pub fn with_activation_delay(mut self, delay: Duration) -> Self {
        self.script.activation_delay = Some(delay);
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: MockCall) {
        self.lock().calls.push(RecordedCall {
            call,
            at: Instant::now(),
        });
    }

    /// Every recorded call, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls without timestamps.
    pub fn call_names(&self) -> Vec<MockCall> {
        self.lock().calls.iter().map(|c| c.call.clone()).collect()
    }

    /// How many recorded calls satisfy `predicate`.
    pub fn count(&self, predicate: impl Fn(&MockCall) -> bool) -> usize {
        self.lock().calls.iter().filter(|c| predicate(&c.call)).count()
    }

    /// First recorded call satisfying `predicate`.
    pub fn first(&self, predicate: impl Fn(&MockCall) -> bool) -> Option<RecordedCall> {
        self.lock().calls.iter().find(|c| predicate(&c.call)).cloned()
    }

    /// The context received by the most recent `initialize`.
    pub fn context(&self) -> Option<PluginContext> {
        self.lock().context.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn set_status(&self, status: AdapterStatus) {
        self.lock().status = status;
    }

    fn lifecycle(&self, outcome: &MockOutcome, step: &str) -> Result<(), SidekickError> {
        match outcome {
            MockOutcome::Succeed | MockOutcome::ReturnFalse => Ok(()),
            MockOutcome::Fail(message) => Err(SidekickError::adapter(format!("{step}: {message}"))),
            MockOutcome::Panic => panic!("mock adapter {} panicked in {step}", self.name),
        }
    }

    fn capability(&self, outcome: &MockOutcome, step: &str) -> Result<bool, SidekickError> {
        match outcome {
            MockOutcome::Succeed => Ok(true),
            MockOutcome::ReturnFalse => Ok(false),
            MockOutcome::Fail(message) => Err(SidekickError::adapter(format!("{step}: {message}"))),
            MockOutcome::Panic => panic!("mock adapter {} panicked in {step}", self.name),
        }
    }
}

#[async_trait]
impl SiteAdapter for MockAdapter {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    async fn initialize(&self, context: PluginContext) -> Result<(), SidekickError> {
        self.lock().context = Some(context);
        self.record(MockCall::Initialize);
        self.lifecycle(&self.script.initialize, "initialize")?;
        self.set_status(AdapterStatus::Ready);
        Ok(())
    }

    async fn activate(&self) -> Result<(), SidekickError> {
        if let Some(delay) = self.script.activation_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(MockCall::Activate);
        self.lifecycle(&self.script.activate, "activate")?;
        self.set_status(AdapterStatus::Active);
        Ok(())
    }

    async fn deactivate(&self) -> Result<(), SidekickError> {
        self.record(MockCall::Deactivate);
        self.set_status(AdapterStatus::Ready);
        self.lifecycle(&self.script.deactivate, "deactivate")
    }

    async fn cleanup(&self) -> Result<(), SidekickError> {
        self.record(MockCall::Cleanup);
        self.set_status(AdapterStatus::Uninitialized);
        self.lifecycle(&self.script.cleanup, "cleanup")
    }

    async fn is_supported(&self) -> bool {
        self.record(MockCall::IsSupported);
        self.script.supported
    }

    fn status(&self) -> AdapterStatus {
        self.lock().status.clone()
    }

    async fn insert_text(&self, text: &str) -> Result<bool, SidekickError> {
        self.record(MockCall::InsertText(text.to_string()));
        self.capability(&self.script.insert, "insert_text")
    }

    async fn submit_form(&self) -> Result<bool, SidekickError> {
        self.record(MockCall::SubmitForm);
        self.capability(&self.script.submit, "submit_form")
    }

    async fn attach_file(&self, file: &FileAttachment) -> Result<bool, SidekickError> {
        self.record(MockCall::AttachFile(file.name.clone()));
        self.capability(&self.script.attach, "attach_file")
    }

    async fn capture_screenshot(&self) -> Result<Option<Screenshot>, SidekickError> {
        self.record(MockCall::CaptureScreenshot);
        Ok(Some(Screenshot {
            mime_type: "image/png".to_string(),
            data: vec![0x89, b'P', b'N', b'G'],
        }))
    }

    async fn select_element(&self, selector: &str) -> Result<Option<ElementHandle>, SidekickError> {
        self.record(MockCall::SelectElement(selector.to_string()));
        Ok(Some(ElementHandle {
            selector: selector.to_string(),
            description: "mock element".to_string(),
        }))
    }

    async fn navigate_to_url(&self, url: &str) -> Result<bool, SidekickError> {
        self.record(MockCall::NavigateToUrl(url.to_string()));
        Ok(true)
    }

    async fn execute_script(&self, script: &str) -> Result<bool, SidekickError> {
        self.record(MockCall::ExecuteScript(script.to_string()));
        Ok(true)
    }
}
