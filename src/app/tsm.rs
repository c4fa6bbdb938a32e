//! Transaction State Machine
//!
//! Tracks confirmed-request invoke-IDs on the client side: which destination
//! and NPCI a request was sent with, a copy of the APDU for retransmission,
//! and a countdown timer. Grounded in the reference stack's
//! `tsm_set_confirmed_unsegmented_transaction` / `tsm_timer_milliseconds` /
//! `tsm_free_invoke_id` trio (`bacnet/basic/tsm/tsm.h`) — this module is the
//! idiomatic-Rust equivalent of that fixed-size transaction table, minus the
//! `#ifdef MAX_TSM_TRANSACTIONS` compile-time sizing (a `Vec` here, bounded
//! by the same invoke-ID pool of 256).

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::network::{Npdu, NetworkAddress};

/// Result type for TSM operations.
#[cfg(feature = "std")]
pub type Result<T> = std::result::Result<T, TsmError>;

#[cfg(not(feature = "std"))]
pub type Result<T> = core::result::Result<T, TsmError>;

/// Errors raised by the transaction state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsmError {
    /// No invoke IDs are free; the caller must wait or drop the request.
    PoolExhausted,
    /// The invoke ID given does not correspond to a live transaction.
    UnknownInvokeId(u8),
    /// The stored APDU exceeds what this TSM instance was configured to hold.
    ApduTooLarge,
}

impl fmt::Display for TsmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsmError::PoolExhausted => write!(f, "no free invoke IDs"),
            TsmError::UnknownInvokeId(id) => write!(f, "unknown invoke ID {}", id),
            TsmError::ApduTooLarge => write!(f, "APDU too large to store for retransmission"),
        }
    }
}

#[cfg(feature = "std")]
impl Error for TsmError {}

/// Transaction state, mirroring `BACNET_TSM_STATE` in the reference stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsmState {
    Idle,
    AwaitConfirmation,
    AwaitResponse,
    SegmentedRequest,
    SegmentedConfirmation,
}

/// One live confirmed-request transaction.
#[derive(Debug, Clone)]
pub struct TsmEntry {
    pub invoke_id: u8,
    pub state: TsmState,
    pub destination: NetworkAddress,
    pub npdu_data: Npdu,
    pub retry_count: u8,
    pub request_timer_ms: i64,
    pub apdu: Vec<u8>,
}

/// Emitted by [`Tsm::tick`] so the caller can act on retransmission or final
/// timeout without the TSM itself owning a datalink handle.
#[derive(Debug, Clone)]
pub enum TsmTimeoutEvent {
    /// The request timer expired and a retry budget remains: resend
    /// `apdu` to `destination` using `npdu_data` and reload the timer.
    Retransmit {
        invoke_id: u8,
        destination: NetworkAddress,
        npdu_data: Npdu,
        apdu: Vec<u8>,
    },
    /// Retries are exhausted; the transaction is freed and the caller
    /// should notify whatever issued the original request.
    Failed { invoke_id: u8 },
}

/// Transaction state machine: owns the invoke-ID pool and the table of live
/// confirmed-request transactions.
#[derive(Debug, Clone)]
pub struct Tsm {
    entries: Vec<TsmEntry>,
    last_invoke_id: u8,
    apdu_timeout_ms: u32,
    apdu_retries: u8,
    max_apdu_len: usize,
}

impl Tsm {
    /// Create a TSM using the given reload timeout (ms), retry cap, and
    /// maximum APDU size it will hold for retransmission.
    pub fn new(apdu_timeout_ms: u32, apdu_retries: u8, max_apdu_len: usize) -> Self {
        Self {
            entries: Vec::new(),
            last_invoke_id: 0,
            apdu_timeout_ms,
            apdu_retries,
            max_apdu_len,
        }
    }

    /// Number of live transactions.
    pub fn transaction_count(&self) -> usize {
        self.entries.len()
    }

    /// True if at least one invoke ID is available.
    pub fn transaction_available(&self) -> bool {
        self.entries.len() < 255
    }

    /// Allocate the next free invoke ID, drawn monotonically mod 256 from a
    /// single process-wide pool, skipping IDs currently in use. Returns 0
    /// (never a valid client-chosen invoke ID under this allocator) if the
    /// pool is exhausted, matching the "0 if the pool is exhausted" contract.
    pub fn next_free_invoke_id(&mut self) -> u8 {
        if !self.transaction_available() {
            return 0;
        }
        let mut candidate = self.last_invoke_id.wrapping_add(1);
        for _ in 0..256 {
            if candidate != 0 && !self.entries.iter().any(|e| e.invoke_id == candidate) {
                self.last_invoke_id = candidate;
                return candidate;
            }
            candidate = candidate.wrapping_add(1);
        }
        0
    }

    /// Free a transaction's invoke ID, discarding its stored APDU.
    /// Freeing an unknown invoke ID is a silent no-op (idempotent, per the
    /// spec's drop-unknown-invoke-id contract).
    pub fn free_invoke_id(&mut self, invoke_id: u8) {
        self.entries.retain(|e| e.invoke_id != invoke_id);
    }

    /// True if `invoke_id` names no live transaction (i.e. it is safe to
    /// reuse / has already completed).
    pub fn invoke_id_free(&self, invoke_id: u8) -> bool {
        !self.entries.iter().any(|e| e.invoke_id == invoke_id)
    }

    /// Store a confirmed, unsegmented request for potential retransmission
    /// and move it into `AwaitConfirmation`.
    pub fn set_confirmed_unsegmented_transaction(
        &mut self,
        invoke_id: u8,
        destination: NetworkAddress,
        npdu_data: Npdu,
        apdu: &[u8],
    ) -> Result<()> {
        if apdu.len() > self.max_apdu_len {
            return Err(TsmError::ApduTooLarge);
        }
        self.entries.retain(|e| e.invoke_id != invoke_id);
        self.entries.push(TsmEntry {
            invoke_id,
            state: TsmState::AwaitConfirmation,
            destination,
            npdu_data,
            retry_count: 0,
            request_timer_ms: self.apdu_timeout_ms as i64,
            apdu: apdu.to_vec(),
        });
        Ok(())
    }

    /// Fetch the stored PDU for a live transaction (for manual resend or
    /// inspection), matching `tsm_get_transaction_pdu`.
    pub fn get_transaction_pdu(&self, invoke_id: u8) -> Option<&TsmEntry> {
        self.entries.iter().find(|e| e.invoke_id == invoke_id)
    }

    /// Advance every live transaction's timer by `elapsed_ms` and return the
    /// retransmit/failure events that fall out. The caller is responsible
    /// for actually sending retransmit APDUs and for removing transactions
    /// that Ack/Error/Reject/Abort resolved out of band via
    /// [`Tsm::free_invoke_id`].
    pub fn tick(&mut self, elapsed_ms: u32) -> Vec<TsmTimeoutEvent> {
        let mut events = Vec::new();
        let mut failed = Vec::new();

        for entry in self.entries.iter_mut() {
            entry.request_timer_ms -= elapsed_ms as i64;
            if entry.request_timer_ms > 0 {
                continue;
            }
            if entry.retry_count < self.apdu_retries {
                entry.retry_count += 1;
                entry.request_timer_ms = self.apdu_timeout_ms as i64;
                events.push(TsmTimeoutEvent::Retransmit {
                    invoke_id: entry.invoke_id,
                    destination: entry.destination.clone(),
                    npdu_data: entry.npdu_data.clone(),
                    apdu: entry.apdu.clone(),
                });
            } else {
                failed.push(entry.invoke_id);
            }
        }

        for invoke_id in failed {
            self.entries.retain(|e| e.invoke_id != invoke_id);
            events.push(TsmTimeoutEvent::Failed { invoke_id });
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::NpduControl;

    fn npdu() -> Npdu {
        Npdu {
            version: 1,
            control: NpduControl::default(),
            destination: None,
            source: None,
            hop_count: None,
        }
    }

    fn addr() -> NetworkAddress {
        NetworkAddress::new(0, vec![192, 168, 1, 10])
    }

    #[test]
    fn invoke_ids_are_unique_while_live() {
        let mut tsm = Tsm::new(1000, 3, 1476);
        let mut seen = Vec::new();
        for _ in 0..5 {
            let id = tsm.next_free_invoke_id();
            assert!(id != 0);
            assert!(!seen.contains(&id));
            tsm.set_confirmed_unsegmented_transaction(id, addr(), npdu(), &[1, 2, 3])
                .unwrap();
            seen.push(id);
        }
        assert_eq!(tsm.transaction_count(), 5);
    }

    #[test]
    fn tick_retransmits_then_fails() {
        let mut tsm = Tsm::new(100, 2, 1476);
        let id = tsm.next_free_invoke_id();
        tsm.set_confirmed_unsegmented_transaction(id, addr(), npdu(), &[9, 9]).unwrap();

        let ev1 = tsm.tick(100);
        assert!(matches!(ev1.as_slice(), [TsmTimeoutEvent::Retransmit { .. }]));

        let ev2 = tsm.tick(100);
        assert!(matches!(ev2.as_slice(), [TsmTimeoutEvent::Retransmit { .. }]));

        let ev3 = tsm.tick(100);
        assert!(matches!(ev3.as_slice(), [TsmTimeoutEvent::Failed { invoke_id } ] if *invoke_id == id));
        assert_eq!(tsm.transaction_count(), 0);
    }

    #[test]
    fn freeing_unknown_invoke_id_is_a_no_op() {
        let mut tsm = Tsm::new(1000, 3, 1476);
        tsm.free_invoke_id(42);
        assert_eq!(tsm.transaction_count(), 0);
    }
}
