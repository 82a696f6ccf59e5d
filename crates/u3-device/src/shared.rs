//! A device and its state behind one lock.

use parking_lot::Mutex;
use u3_protocol::{CommandId, DeviceState, ProtocolResult};

use crate::device::Device;
use crate::transport::Connector;

/// [`Device`] plus [`DeviceState`] shared between threads.
///
/// Callers that prepare state (from form input, say) and then issue a write
/// use [`SharedDevice::with`] so no other transaction runs in between.
pub struct SharedDevice<C> {
    inner: Mutex<(Device<C>, DeviceState)>,
}

impl<C: Connector> SharedDevice<C> {
    /// Wrap `connector` with a fresh state.
    pub fn new(connector: C) -> Self {
        Self {
            inner: Mutex::new((Device::new(connector), DeviceState::new())),
        }
    }

    /// Run one transaction against the shared state.
    pub fn execute(&self, command: CommandId, param: u8) -> ProtocolResult<()> {
        let mut guard = self.inner.lock();
        let (device, state) = &mut *guard;
        device.execute(state, command, param)
    }

    /// Hold the lock for the whole of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut Device<C>, &mut DeviceState) -> R) -> R {
        let mut guard = self.inner.lock();
        let (device, state) = &mut *guard;
        f(device, state)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> DeviceState {
        self.inner.lock().1.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::SimulatedU3;
    use std::sync::Arc;
    use std::thread;
    use u3_protocol::{Bank, IoMode, BANK_SELECT_ALL, STATUS_NO_ERROR};

    #[test]
    fn test_concurrent_callers_serialize() {
        let sim = SimulatedU3::default();
        let shared = Arc::new(SharedDevice::new(sim.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    for _ in 0..10 {
                        shared.execute(CommandId::PortStateRead, 0).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(sim.requests(), 40);
        assert_eq!(shared.snapshot().status, STATUS_NO_ERROR);
    }

    #[test]
    fn test_prepare_and_write_under_one_lock() {
        let sim = SimulatedU3::default();
        let shared = SharedDevice::new(sim.clone());

        shared
            .with(|device, state| {
                state.cio[1].io_mode = IoMode::Output;
                device.execute(state, CommandId::PortDirWrite, BANK_SELECT_ALL)
            })
            .unwrap();

        assert_eq!(sim.directions(Bank::Cio), 0x02);
    }
}
