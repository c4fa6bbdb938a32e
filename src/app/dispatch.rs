//! Service dispatcher
//!
//! Grounded in the reference stack's `apdu_set_confirmed_handler` /
//! `apdu_set_unconfirmed_handler` jump table (`include/handlers.h`,
//! `apdu.c`): service-choice octet in, handler function out. This module is
//! that table expressed as boxed closures keyed by service-choice byte,
//! replacing the C side's fixed `MAX_APDU_SERVICES_SUPPORTED`-sized arrays
//! with a small `Vec` built at startup and never mutated afterward.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::app::Apdu;
use crate::network::NetworkAddress;
use crate::service::{AbortReason, RejectReason, ServiceError};

/// Confirmed-service handlers receive the raw service-choice data, the
/// source address (for handlers that need it, e.g. I-Am binding), and the
/// invoke ID the reply must echo. They return the data to place in a
/// SimpleAck or ComplexAck, or a [`ServiceError`] which the dispatcher turns
/// into an Error/Reject/Abort APDU.
pub type ConfirmedHandler = Box<
    dyn Fn(&[u8], &NetworkAddress) -> Result<ConfirmedReply, ServiceError> + Send + Sync,
>;

/// Unconfirmed-service handlers are fire-and-forget: the protocol defines no
/// reply, so the handler only gets to observe the request and act (update a
/// cache, log a notification) or report a [`ServiceError`] for diagnostics.
pub type UnconfirmedHandler = Box<dyn Fn(&[u8], &NetworkAddress) -> Result<(), ServiceError> + Send + Sync>;

/// What a confirmed-service handler produced.
#[derive(Debug, Clone)]
pub enum ConfirmedReply {
    /// No data to return: reply with a SimpleAck.
    Simple,
    /// Service-specific ack data: reply with a ComplexAck carrying it.
    Complex(Vec<u8>),
}

/// What the dispatcher decided to do with one incoming APDU.
#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    /// Send this APDU back to the requester.
    Reply(Apdu),
    /// Nothing to send (successful unconfirmed service, or a reply frame
    /// that carries no response by protocol definition).
    NoReply,
}

/// Confirmed/unconfirmed service jump tables, keyed by service-choice octet.
pub struct ServiceDispatcher {
    confirmed: Vec<(u8, ConfirmedHandler)>,
    unconfirmed: Vec<(u8, UnconfirmedHandler)>,
}

impl Default for ServiceDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDispatcher {
    pub fn new() -> Self {
        Self {
            confirmed: Vec::new(),
            unconfirmed: Vec::new(),
        }
    }

    /// Register (or replace) the handler for a confirmed service choice.
    pub fn set_confirmed_handler(&mut self, service_choice: u8, handler: ConfirmedHandler) {
        self.confirmed.retain(|(c, _)| *c != service_choice);
        self.confirmed.push((service_choice, handler));
    }

    /// Register (or replace) the handler for an unconfirmed service choice.
    pub fn set_unconfirmed_handler(&mut self, service_choice: u8, handler: UnconfirmedHandler) {
        self.unconfirmed.retain(|(c, _)| *c != service_choice);
        self.unconfirmed.push((service_choice, handler));
    }

    /// Dispatch one incoming APDU to the matching handler, translating the
    /// result into the Ack/Error/Reject/Abort the caller should send back.
    /// Non-request APDUs (Ack/Error/Reject/Abort/SegmentAck) are not this
    /// dispatcher's concern and are passed through as `NoReply`; callers
    /// route those to the TSM instead.
    pub fn dispatch(&self, apdu: &Apdu, src: &NetworkAddress) -> DispatchOutcome {
        match apdu {
            Apdu::ConfirmedRequest {
                invoke_id,
                service_choice,
                service_data,
                ..
            } => self.dispatch_confirmed(*invoke_id, *service_choice, service_data, src),
            Apdu::UnconfirmedRequest {
                service_choice,
                service_data,
            } => {
                self.dispatch_unconfirmed(*service_choice, service_data, src);
                DispatchOutcome::NoReply
            }
            _ => DispatchOutcome::NoReply,
        }
    }

    fn dispatch_confirmed(
        &self,
        invoke_id: u8,
        service_choice: u8,
        service_data: &[u8],
        src: &NetworkAddress,
    ) -> DispatchOutcome {
        let handler = match self.confirmed.iter().find(|(c, _)| *c == service_choice) {
            Some((_, h)) => h,
            None => {
                return DispatchOutcome::Reply(Apdu::Reject {
                    invoke_id,
                    reject_reason: RejectReason::UnrecognizedService as u8,
                });
            }
        };

        match handler(service_data, src) {
            Ok(ConfirmedReply::Simple) => DispatchOutcome::Reply(Apdu::SimpleAck {
                invoke_id,
                service_choice,
            }),
            Ok(ConfirmedReply::Complex(data)) => DispatchOutcome::Reply(Apdu::ComplexAck {
                segmented: false,
                more_follows: false,
                invoke_id,
                sequence_number: None,
                proposed_window_size: None,
                service_choice,
                service_data: data,
            }),
            Err(ServiceError::Rejected(reason)) => DispatchOutcome::Reply(Apdu::Reject {
                invoke_id,
                reject_reason: reason as u8,
            }),
            Err(ServiceError::Aborted(reason)) => DispatchOutcome::Reply(Apdu::Abort {
                server: true,
                invoke_id,
                abort_reason: reason as u8,
            }),
            Err(ServiceError::InvalidParameters(_)) | Err(ServiceError::EncodingError(_)) => {
                DispatchOutcome::Reply(Apdu::Reject {
                    invoke_id,
                    reject_reason: RejectReason::InvalidParameterDataType as u8,
                })
            }
            Err(_) => DispatchOutcome::Reply(Apdu::Abort {
                server: true,
                invoke_id,
                abort_reason: AbortReason::Other as u8,
            }),
        }
    }

    fn dispatch_unconfirmed(&self, service_choice: u8, service_data: &[u8], src: &NetworkAddress) {
        if let Some((_, handler)) = self.unconfirmed.iter().find(|(c, _)| *c == service_choice) {
            let _ = handler(service_data, src);
        }
        // Unrecognized unconfirmed services are silently dropped; the
        // protocol defines no reply and no error path for them.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    fn addr() -> NetworkAddress {
        NetworkAddress::new(0, vec![10, 0, 0, 1])
    }

    #[test]
    fn unrecognized_confirmed_service_is_rejected() {
        let dispatcher = ServiceDispatcher::new();
        let apdu = Apdu::ConfirmedRequest {
            segmented: false,
            more_follows: false,
            segmented_response_accepted: true,
            max_segments: crate::app::MaxSegments::Unspecified,
            max_response_size: crate::app::MaxApduSize::Up1476,
            invoke_id: 7,
            sequence_number: None,
            proposed_window_size: None,
            service_choice: 200,
            service_data: vec![],
        };
        match dispatcher.dispatch(&apdu, &addr()) {
            DispatchOutcome::Reply(Apdu::Reject { invoke_id, reject_reason }) => {
                assert_eq!(invoke_id, 7);
                assert_eq!(reject_reason, RejectReason::UnrecognizedService as u8);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn registered_confirmed_handler_gets_simple_ack() {
        let mut dispatcher = ServiceDispatcher::new();
        dispatcher.set_confirmed_handler(15, Box::new(|_data, _src| Ok(ConfirmedReply::Simple)));
        let apdu = Apdu::ConfirmedRequest {
            segmented: false,
            more_follows: false,
            segmented_response_accepted: true,
            max_segments: crate::app::MaxSegments::Unspecified,
            max_response_size: crate::app::MaxApduSize::Up1476,
            invoke_id: 3,
            sequence_number: None,
            proposed_window_size: None,
            service_choice: 15,
            service_data: vec![],
        };
        match dispatcher.dispatch(&apdu, &addr()) {
            DispatchOutcome::Reply(Apdu::SimpleAck { invoke_id, service_choice }) => {
                assert_eq!(invoke_id, 3);
                assert_eq!(service_choice, 15);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn unconfirmed_handler_runs_and_produces_no_reply() {
        let mut dispatcher = ServiceDispatcher::new();
        let called = Arc::new(AtomicBool::new(false));
        let called_clone = called.clone();
        dispatcher.set_unconfirmed_handler(
            8,
            Box::new(move |_data, _src| {
                called_clone.store(true, Ordering::SeqCst);
                Ok(())
            }),
        );
        let apdu = Apdu::UnconfirmedRequest {
            service_choice: 8,
            service_data: vec![],
        };
        assert!(matches!(dispatcher.dispatch(&apdu, &addr()), DispatchOutcome::NoReply));
        assert!(called.load(Ordering::SeqCst));
    }
}
