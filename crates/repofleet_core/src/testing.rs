//! Scripted `gh` stand-in for unit tests.

use std::sync::Mutex;

use anyhow::Result;

use crate::error::FleetError;
use crate::gh::{GhApi, GhOutput, Invocation};

type Responder = Box<dyn Fn(&Invocation) -> Result<GhOutput> + Send + Sync>;

pub struct ScriptedGh {
    responder: Responder,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedGh {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Invocation) -> Result<GhOutput> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

impl GhApi for ScriptedGh {
    fn run(&self, invocation: &Invocation) -> Result<GhOutput> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(invocation.clone());
        (self.responder)(invocation)
    }

    fn check_auth(&self) -> Result<(), FleetError> {
        Ok(())
    }
}

impl GhOutput {
    pub fn ok(stdout: &str) -> Self {
        Self {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    pub fn failed(stderr: &str) -> Self {
        Self {
            code: 1,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }
}

/// Endpoint of an API invocation, or the command line for anything else.
pub fn endpoint_of(invocation: &Invocation) -> String {
    match invocation {
        Invocation::Api(request) => request.endpoint.clone(),
        other => other.command_line(),
    }
}
