// Copyright 2024-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use parking_lot::{Condvar, Mutex};

/// Cooperative blocking protocol between context-publishing threads and
/// the snapshot reader.
///
/// While paused, every thread attempting to publish a new active context
/// blocks in [PauseGate::wait_until_active] until the gate is resumed;
/// resuming wakes all waiters. The snapshot reader is the only caller of
/// [PauseGate::pause], and the returned guard resumes on drop so an early
/// return or panic during the snapshot read still releases writers.
#[derive(Default)]
pub struct PauseGate {
    paused: Mutex<bool>,
    condvar: Condvar,
}

impl PauseGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pauses publishers until the returned guard is dropped.
    pub fn pause(&self) -> PauseGuard<'_> {
        *self.paused.lock() = true;
        PauseGuard { gate: self }
    }

    /// Blocks while the gate is paused. Publishers call this immediately
    /// before writing to the active context table.
    pub fn wait_until_active(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.condvar.wait(&mut paused);
        }
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }

    fn resume(&self) {
        let mut paused = self.paused.lock();
        *paused = false;
        self.condvar.notify_all();
    }
}

/// Resumes the gate when dropped.
pub struct PauseGuard<'a> {
    gate: &'a PauseGate,
}

impl Drop for PauseGuard<'_> {
    fn drop(&mut self) {
        self.gate.resume();
    }
}
