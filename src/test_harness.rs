//! Scripted collaborators for dashboard tests: a fake bus and a fake terminal.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use parking_lot::Mutex;

use crate::bus::{ControlBus, UnitObject};
use crate::core::errors::{Result, SvcError};
use crate::core::units::UnitSnapshot;
use crate::dashboard::terminal::TerminalSurface;
use crate::dashboard::viewport::Cell;

const FAKE_OBJECT_PREFIX: &str = "/fake/unit/";

/// Ordered record of bus and terminal calls shared by both fakes.
pub type Journal = Arc<Mutex<Vec<String>>>;

#[must_use]
pub fn snapshot(load: &str, active: &str, sub: &str, file: &str) -> UnitSnapshot {
    UnitSnapshot {
        load_state: load.to_string(),
        active_state: active.to_string(),
        sub_state: sub.to_string(),
        unit_file_state: file.to_string(),
    }
}

// ──────────────────── fake bus ────────────────────

/// Failure injected into property reads of one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeFailure {
    Timeout,
    Malformed,
}

/// In-memory control bus keyed by full unit name.
#[derive(Default)]
pub struct FakeBus {
    units: Mutex<HashMap<String, UnitSnapshot>>,
    failures: Mutex<HashMap<String, FakeFailure>>,
    calls: Mutex<Vec<String>>,
    property_reads: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    delay: Duration,
    journal: Option<Journal>,
}

impl FakeBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_unit(self, query_name: &str, snap: UnitSnapshot) -> Self {
        self.set_unit(query_name, snap);
        self
    }

    #[must_use]
    pub fn with_failure(self, query_name: &str, failure: FakeFailure) -> Self {
        self.failures.lock().insert(query_name.to_string(), failure);
        self
    }

    /// Sleep this long inside every resolve call.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(Arc::clone(journal));
        self
    }

    pub fn set_unit(&self, query_name: &str, snap: UnitSnapshot) {
        self.units.lock().insert(query_name.to_string(), snap);
    }

    pub fn clear_failure(&self, query_name: &str) {
        self.failures.lock().remove(query_name);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn resolve_count(&self, query_name: &str) -> usize {
        let needle = format!("resolve {query_name}");
        self.calls.lock().iter().filter(|c| **c == needle).count()
    }

    /// Units resolved so far, in call order.
    pub fn resolved_units(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.strip_prefix("resolve "))
            .map(str::to_string)
            .collect()
    }

    pub fn property_reads(&self) -> usize {
        self.property_reads.load(Ordering::SeqCst)
    }

    /// Most resolve calls that were ever running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl ControlBus for FakeBus {
    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn resolve_unit(&self, unit_name: &str) -> Result<UnitObject> {
        self.calls.lock().push(format!("resolve {unit_name}"));
        if let Some(journal) = &self.journal {
            journal.lock().push(format!("resolve {unit_name}"));
        }
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.units.lock().contains_key(unit_name) {
            Ok(UnitObject::new(format!("{FAKE_OBJECT_PREFIX}{unit_name}")))
        } else {
            Err(SvcError::Bus {
                target: unit_name.to_string(),
                details: format!("Unit {unit_name} not loaded."),
            })
        }
    }

    fn get_property(
        &self,
        object: &UnitObject,
        interface: &str,
        property: &str,
    ) -> Result<String> {
        self.calls
            .lock()
            .push(format!("get {object} {interface} {property}"));
        self.property_reads.fetch_add(1, Ordering::SeqCst);

        let name = object
            .as_str()
            .strip_prefix(FAKE_OBJECT_PREFIX)
            .unwrap_or_default();
        let target = format!("{object} {property}");

        match self.failures.lock().get(name) {
            Some(FakeFailure::Timeout) => {
                return Err(SvcError::BusTimeout {
                    target,
                    timeout_ms: 2_000,
                });
            }
            Some(FakeFailure::Malformed) => {
                return Err(SvcError::BusMalformed {
                    target,
                    details: "unsupported signature \"u\"".to_string(),
                });
            }
            None => {}
        }

        let units = self.units.lock();
        let snap = units.get(name).ok_or_else(|| SvcError::Bus {
            target: target.clone(),
            details: "unknown object".to_string(),
        })?;
        let value = match property {
            "LoadState" => &snap.load_state,
            "ActiveState" => &snap.active_state,
            "SubState" => &snap.sub_state,
            "UnitFileState" => &snap.unit_file_state,
            _ => {
                return Err(SvcError::Bus {
                    target,
                    details: "unknown property".to_string(),
                });
            }
        };
        Ok(value.clone())
    }
}

// ──────────────────── fake terminal ────────────────────

/// Terminal surface with a settable size, scripted keys and recorded frames.
pub struct FakeSurface {
    size: (u16, u16),
    keys: VecDeque<Option<KeyEvent>>,
    frames: Vec<Vec<Vec<Cell>>>,
    /// Number of `read_key` calls made so far.
    pub key_reads: usize,
    /// Called on every `read_key`, before a scripted key is popped.
    pub on_read: Option<Box<dyn FnMut(usize) + Send>>,
    journal: Option<Journal>,
}

impl FakeSurface {
    #[must_use]
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            size: (cols, rows),
            keys: VecDeque::new(),
            frames: Vec::new(),
            key_reads: 0,
            on_read: None,
            journal: None,
        }
    }

    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = Some(Arc::clone(journal));
        self
    }

    pub fn set_size(&mut self, cols: u16, rows: u16) {
        self.size = (cols, rows);
    }

    /// Queue a key press for a future `read_key`.
    pub fn push_key(&mut self, code: KeyCode) {
        self.keys
            .push_back(Some(KeyEvent::new(code, KeyModifiers::NONE)));
    }

    pub fn push_key_event(&mut self, key: KeyEvent) {
        self.keys.push_back(Some(key));
    }

    /// Queue an empty read (timeout with no key).
    pub fn push_idle(&mut self) {
        self.keys.push_back(None);
    }

    pub fn frames(&self) -> &[Vec<Vec<Cell>>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&Vec<Vec<Cell>>> {
        self.frames.last()
    }

    /// Text of one row of the last presented frame, trailing spaces trimmed.
    pub fn last_frame_line(&self, row: usize) -> String {
        self.frame_line(self.frames.len().saturating_sub(1), row)
    }

    /// Text of one row of the `frame`-th presented frame, trailing spaces trimmed.
    pub fn frame_line(&self, frame: usize, row: usize) -> String {
        self.frames
            .get(frame)
            .and_then(|window| window.get(row))
            .map(|cells| cells.iter().map(|c| c.ch).collect::<String>())
            .unwrap_or_default()
            .trim_end()
            .to_string()
    }
}

impl TerminalSurface for FakeSurface {
    fn size(&self) -> Result<(u16, u16)> {
        Ok(self.size)
    }

    fn present(&mut self, window: &[Vec<Cell>]) -> Result<()> {
        if let Some(journal) = &self.journal {
            let cols = window.first().map_or(0, Vec::len);
            journal
                .lock()
                .push(format!("present {}x{cols}", window.len()));
        }
        self.frames.push(window.to_vec());
        Ok(())
    }

    fn read_key(&mut self, _timeout: Duration) -> Result<Option<KeyEvent>> {
        let read_index = self.key_reads;
        self.key_reads += 1;
        if let Some(hook) = self.on_read.as_mut() {
            hook(read_index);
        }
        // An exhausted script quits so a drill can never spin forever.
        Ok(self
            .keys
            .pop_front()
            .unwrap_or_else(|| Some(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE))))
    }
}
