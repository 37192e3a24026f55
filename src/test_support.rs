//! Scripted `ContainerDriver` mock shared by the unit tests.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

use crate::compose::{ContainerDriver, ExecOutput};
use crate::errors::Result;

/// Records every driver call and serves scripted responses.
///
/// `exec` pops from `exec_responses`, defaulting to a successful empty
/// output; `port_open` answers true for ports in `open_ports`.
#[derive(Default)]
pub struct MockDriver {
    pub calls: Mutex<Vec<String>>,
    pub open_ports: Mutex<HashSet<u16>>,
    pub exec_responses: Mutex<VecDeque<ExecOutput>>,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_port(&self, port: u16) {
        self.open_ports.lock().unwrap().insert(port);
    }

    pub fn push_exec(&self, output: ExecOutput) {
        self.exec_responses.lock().unwrap().push_back(output);
    }

    pub fn push_exec_stdout(&self, stdout: &str) {
        self.push_exec(ExecOutput {
            success: true,
            stdout: stdout.to_string(),
            stderr: String::new(),
        });
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Index of the first recorded call containing `needle`, if any.
    pub fn first_call_containing(&self, needle: &str) -> Option<usize> {
        self.recorded().iter().position(|c| c.contains(needle))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl ContainerDriver for MockDriver {
    async fn up(&self, services: &[&str]) -> Result<()> {
        self.record(format!("up {}", services.join(" ")));
        Ok(())
    }

    async fn exec(&self, service: &str, command: &[&str]) -> ExecOutput {
        self.record(format!("exec {} {}", service, command.join(" ")));
        self.exec_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(ExecOutput {
                success: true,
                stdout: String::new(),
                stderr: String::new(),
            })
    }

    async fn stop_all(&self) -> Result<()> {
        self.record("stop_all".to_string());
        Ok(())
    }

    async fn down(&self, remove_orphans: bool) -> Result<()> {
        self.record(format!("down remove_orphans={}", remove_orphans));
        Ok(())
    }

    async fn remove_image(&self, tag: &str) -> Result<()> {
        self.record(format!("remove_image {}", tag));
        Ok(())
    }

    async fn prune(&self) -> Result<()> {
        self.record("prune".to_string());
        Ok(())
    }

    async fn port_open(&self, port: u16) -> bool {
        self.record(format!("port_open {}", port));
        self.open_ports.lock().unwrap().contains(&port)
    }
}
