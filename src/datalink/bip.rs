//! BACnet/IP Data Link Implementation
//!
//! This module implements the BACnet/IP data link layer as defined in ASHRAE 135 Annex J.
//! BACnet/IP uses UDP as the transport protocol on port 47808 (0xBAC0).
//!
//! # Overview
//!
//! BACnet/IP provides:
//! - UDP-based communication over IP networks
//! - BVLC (BACnet Virtual Link Control) for broadcast management
//! - Support for broadcast distribution tables (BDT)
//! - Foreign device registration
//!
//! # BVLC Functions
//!
//! - Original-Unicast-NPDU
//! - Original-Broadcast-NPDU
//! - Forwarded-NPDU
//! - Register-Foreign-Device
//! - Read-Broadcast-Distribution-Table
//! - Read-Foreign-Device-Table
//! - And more...

#[cfg(feature = "std")]
use std::{
    io::ErrorKind,
    net::{SocketAddr, UdpSocket, ToSocketAddrs},
    time::{Duration, Instant},
};

#[cfg(not(feature = "std"))]
use alloc::{vec::Vec, string::String};

use crate::datalink::{DataLink, DataLinkAddress, DataLinkError, DataLinkType, Result};

/// BACnet/IP well-known port number (0xBAC0)
pub const BACNET_IP_PORT: u16 = 47808;

/// BVLC (BACnet Virtual Link Control) message types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BvlcFunction {
    /// BVLC-Result: acknowledges or NAKs a preceding BBMD-management function.
    Result = 0x00,
    /// Write-Broadcast-Distribution-Table
    WriteBroadcastDistributionTable = 0x01,
    /// Read-Broadcast-Distribution-Table
    ReadBroadcastDistributionTable = 0x02,
    /// Read-Broadcast-Distribution-Table-Ack
    ReadBroadcastDistributionTableAck = 0x03,
    /// Forwarded-NPDU
    ForwardedNpdu = 0x04,
    /// Register-Foreign-Device
    RegisterForeignDevice = 0x05,
    /// Read-Foreign-Device-Table
    ReadForeignDeviceTable = 0x06,
    /// Read-Foreign-Device-Table-Ack
    ReadForeignDeviceTableAck = 0x07,
    /// Delete-Foreign-Device-Table-Entry
    DeleteForeignDeviceTableEntry = 0x08,
    /// Distribute-Broadcast-To-Network
    DistributeBroadcastToNetwork = 0x09,
    /// Original-Unicast-NPDU
    OriginalUnicastNpdu = 0x0A,
    /// Original-Broadcast-NPDU
    OriginalBroadcastNpdu = 0x0B,
}

/// BVLC header structure
#[derive(Debug, Clone)]
pub struct BvlcHeader {
    /// BVLC type (always 0x81 for BACnet/IP)
    pub bvlc_type: u8,
    /// BVLC function
    pub function: BvlcFunction,
    /// Total message length including BVLC header
    pub length: u16,
}

impl BvlcHeader {
    /// Create a new BVLC header
    pub fn new(function: BvlcFunction, length: u16) -> Self {
        Self {
            bvlc_type: 0x81, // BACnet/IP
            function,
            length,
        }
    }

    /// Encode BVLC header to bytes
    pub fn encode(&self) -> Vec<u8> {
        vec![
            self.bvlc_type,
            self.function as u8,
            (self.length >> 8) as u8,
            (self.length & 0xFF) as u8,
        ]
    }

    /// Decode BVLC header from bytes
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < 4 {
            return Err(DataLinkError::InvalidFrame);
        }

        let bvlc_type = data[0];
        if bvlc_type != 0x81 {
            return Err(DataLinkError::InvalidFrame);
        }

        let function = match data[1] {
            0x00 => BvlcFunction::Result,
            0x01 => BvlcFunction::WriteBroadcastDistributionTable,
            0x02 => BvlcFunction::ReadBroadcastDistributionTable,
            0x03 => BvlcFunction::ReadBroadcastDistributionTableAck,
            0x04 => BvlcFunction::ForwardedNpdu,
            0x05 => BvlcFunction::RegisterForeignDevice,
            0x06 => BvlcFunction::ReadForeignDeviceTable,
            0x07 => BvlcFunction::ReadForeignDeviceTableAck,
            0x08 => BvlcFunction::DeleteForeignDeviceTableEntry,
            0x09 => BvlcFunction::DistributeBroadcastToNetwork,
            0x0A => BvlcFunction::OriginalUnicastNpdu,
            0x0B => BvlcFunction::OriginalBroadcastNpdu,
            _ => return Err(DataLinkError::InvalidFrame),
        };

        let length = ((data[2] as u16) << 8) | (data[3] as u16);

        Ok(BvlcHeader {
            bvlc_type,
            function,
            length,
        })
    }
}

/// Broadcast Distribution Table entry
#[derive(Debug, Clone)]
#[cfg(feature = "std")]
pub struct BdtEntry {
    /// IP address and port
    pub address: SocketAddr,
    /// Broadcast distribution mask
    pub mask: [u8; 4],
}

/// Foreign Device Table entry
#[derive(Debug, Clone)]
#[cfg(feature = "std")]
pub struct FdtEntry {
    /// IP address and port
    pub address: SocketAddr,
    /// Time-to-live in seconds
    pub ttl: u16,
    /// Registration time
    pub registration_time: Instant,
}

/// BACnet/IP data link implementation
#[cfg(feature = "std")]
pub struct BacnetIpDataLink {
    /// UDP socket for communication
    socket: UdpSocket,
    /// Local address
    local_addr: SocketAddr,
    /// Broadcast Distribution Table
    bdt: Vec<BdtEntry>,
    /// Foreign Device Table
    fdt: Vec<FdtEntry>,
    /// Broadcast address
    broadcast_addr: SocketAddr,
}

#[cfg(feature = "std")]
impl BacnetIpDataLink {
    /// Create a new BACnet/IP data link
    pub fn new<A: ToSocketAddrs>(bind_addr: A) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .map_err(DataLinkError::IoError)?;
        
        let local_addr = socket.local_addr()
            .map_err(DataLinkError::IoError)?;

        // Enable broadcast
        socket.set_broadcast(true)
            .map_err(DataLinkError::IoError)?;

        // Set receive timeout
        socket.set_read_timeout(Some(Duration::from_millis(100)))
            .map_err(DataLinkError::IoError)?;

        // Calculate broadcast address based on local address
        let broadcast_addr = match local_addr {
            SocketAddr::V4(addr) => {
                let ip = addr.ip().octets();
                // Simple broadcast calculation - in production, use proper subnet mask
                let broadcast_ip = std::net::Ipv4Addr::new(ip[0], ip[1], ip[2], 255);
                SocketAddr::new(broadcast_ip.into(), BACNET_IP_PORT)
            }
            SocketAddr::V6(_) => {
                // IPv6 uses multicast instead of broadcast
                return Err(DataLinkError::UnsupportedType);
            }
        };

        Ok(Self {
            socket,
            local_addr,
            bdt: Vec::new(),
            fdt: Vec::new(),
            broadcast_addr,
        })
    }

    /// Send a unicast NPDU
    pub fn send_unicast_npdu(&mut self, npdu: &[u8], dest: SocketAddr) -> Result<()> {
        let header = BvlcHeader::new(
            BvlcFunction::OriginalUnicastNpdu,
            4 + npdu.len() as u16,
        );

        let mut frame = header.encode();
        frame.extend_from_slice(npdu);

        self.socket.send_to(&frame, dest)
            .map_err(DataLinkError::IoError)?;

        Ok(())
    }

    /// Send a broadcast NPDU
    pub fn send_broadcast_npdu(&mut self, npdu: &[u8]) -> Result<()> {
        let header = BvlcHeader::new(
            BvlcFunction::OriginalBroadcastNpdu,
            4 + npdu.len() as u16,
        );

        let mut frame = header.encode();
        frame.extend_from_slice(npdu);

        // Send to local broadcast address
        self.socket.send_to(&frame, self.broadcast_addr)
            .map_err(DataLinkError::IoError)?;

        // Send to all BDT entries
        for entry in &self.bdt {
            let _ = self.socket.send_to(&frame, entry.address);
        }

        Ok(())
    }

    /// Register as a foreign device
    pub fn register_foreign_device(&mut self, bbmd_addr: SocketAddr, ttl: u16) -> Result<()> {
        let header = BvlcHeader::new(BvlcFunction::RegisterForeignDevice, 6);
        let mut frame = header.encode();
        frame.extend_from_slice(&ttl.to_be_bytes());

        self.socket.send_to(&frame, bbmd_addr)
            .map_err(DataLinkError::IoError)?;

        Ok(())
    }

    /// Add entry to Broadcast Distribution Table
    pub fn add_bdt_entry(&mut self, address: SocketAddr, mask: [u8; 4]) {
        self.bdt.push(BdtEntry { address, mask });
    }

    /// Clean up expired foreign device entries
    pub fn cleanup_fdt(&mut self) {
        let now = Instant::now();
        self.fdt.retain(|entry| {
            now.duration_since(entry.registration_time).as_secs() < entry.ttl as u64
        });
    }

    /// Process received BVLC message
    fn process_bvlc_message(&mut self, data: &[u8], source: SocketAddr) -> Result<Option<Vec<u8>>> {
        let header = BvlcHeader::decode(data)?;

        if data.len() != header.length as usize {
            return Err(DataLinkError::InvalidFrame);
        }

        match header.function {
            BvlcFunction::OriginalUnicastNpdu | BvlcFunction::OriginalBroadcastNpdu => {
                // Return the NPDU portion (skip 4-byte BVLC header)
                if data.len() > 4 {
                    Ok(Some(data[4..].to_vec()))
                } else {
                    Err(DataLinkError::InvalidFrame)
                }
            }
            BvlcFunction::ForwardedNpdu => {
                // Forwarded NPDU has original source address after header
                if data.len() > 10 {
                    Ok(Some(data[10..].to_vec()))
                } else {
                    Err(DataLinkError::InvalidFrame)
                }
            }
            BvlcFunction::RegisterForeignDevice => {
                // Handle foreign device registration
                if data.len() == 6 {
                    let ttl = u16::from_be_bytes([data[4], data[5]]);
                    self.fdt.push(FdtEntry {
                        address: source,
                        ttl,
                        registration_time: Instant::now(),
                    });
                }
                Ok(None)
            }
            BvlcFunction::Result => Ok(None),
            BvlcFunction::WriteBroadcastDistributionTable
            | BvlcFunction::ReadBroadcastDistributionTable
            | BvlcFunction::ReadBroadcastDistributionTableAck
            | BvlcFunction::ReadForeignDeviceTable
            | BvlcFunction::ReadForeignDeviceTableAck
            | BvlcFunction::DeleteForeignDeviceTableEntry
            | BvlcFunction::DistributeBroadcastToNetwork => {
                // BBMD-only functions: a plain (non-BBMD) node NAKs them
                // rather than silently dropping them, per Annex J.2.
                let nak = encode_bvlc_nak(header.function, BvlcResultCode::nak_for(header.function));
                let _ = self.socket.send_to(&nak, source);
                Ok(None)
            }
        }
    }
}

/// BVLC-Result codes (Annex J.2, Table J-1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BvlcResultCode {
    Successful = 0x0000,
    WriteBroadcastDistributionTableNak = 0x0010,
    ReadBroadcastDistributionTableNak = 0x0020,
    RegisterForeignDeviceNak = 0x0030,
    ReadForeignDeviceTableNak = 0x0040,
    DeleteForeignDeviceTableEntryNak = 0x0050,
    DistributeBroadcastToNetworkNak = 0x0060,
}

impl BvlcResultCode {
    /// The NAK code a non-BBMD (or a BBMD rejecting a malformed request)
    /// returns for a given BBMD-management function.
    pub fn nak_for(function: BvlcFunction) -> Self {
        match function {
            BvlcFunction::WriteBroadcastDistributionTable => Self::WriteBroadcastDistributionTableNak,
            BvlcFunction::ReadBroadcastDistributionTable
            | BvlcFunction::ReadBroadcastDistributionTableAck => Self::ReadBroadcastDistributionTableNak,
            BvlcFunction::RegisterForeignDevice => Self::RegisterForeignDeviceNak,
            BvlcFunction::ReadForeignDeviceTable | BvlcFunction::ReadForeignDeviceTableAck => {
                Self::ReadForeignDeviceTableNak
            }
            BvlcFunction::DeleteForeignDeviceTableEntry => Self::DeleteForeignDeviceTableEntryNak,
            BvlcFunction::DistributeBroadcastToNetwork => Self::DistributeBroadcastToNetworkNak,
            _ => Self::Successful,
        }
    }
}

/// Encode a BVLC-Result frame carrying `code` in response to `function`.
pub fn encode_bvlc_nak(_function: BvlcFunction, code: BvlcResultCode) -> Vec<u8> {
    let header = BvlcHeader::new(BvlcFunction::Result, 6);
    let mut frame = header.encode();
    frame.extend_from_slice(&(code as u16).to_be_bytes());
    frame
}

/// Outcome of handling one BVLC message at a BBMD.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub enum BbmdAction {
    /// Nothing further to do.
    None,
    /// Send this raw frame back to the originator.
    Reply(Vec<u8>, SocketAddr),
    /// Forward this raw frame (already BVLC-wrapped) to each address.
    Forward(Vec<u8>, Vec<SocketAddr>),
    /// Hand a decoded NPDU up to the network layer, as if received from
    /// `source`.
    DeliverNpdu(Vec<u8>, SocketAddr),
}

/// Broadcast Distribution Master: owns the Broadcast Distribution Table and
/// Foreign Device Table and implements the function-code dispatch of
/// Annex J.4/J.5 — local broadcasts get redistributed to every BDT entry
/// and every registered foreign device, remote unicasts get NAK'd or
/// actioned depending on function code.
#[cfg(feature = "std")]
#[derive(Debug, Default)]
pub struct Bbmd {
    pub bdt: Vec<BdtEntry>,
    pub fdt: Vec<FdtEntry>,
}

#[cfg(feature = "std")]
impl Bbmd {
    pub fn new() -> Self {
        Self {
            bdt: Vec::new(),
            fdt: Vec::new(),
        }
    }

    /// Drop foreign-device registrations whose TTL (plus the standard
    /// 30-second grace period, Annex J.5.2.3) has elapsed.
    pub fn purge_expired_foreign_devices(&mut self) {
        let now = Instant::now();
        self.fdt.retain(|entry| {
            now.duration_since(entry.registration_time).as_secs() < entry.ttl as u64 + 30
        });
    }

    /// Handle one decoded BVLC message addressed to this BBMD.
    pub fn handle_bvlc(&mut self, header: &BvlcHeader, payload: &[u8], from: SocketAddr) -> BbmdAction {
        match header.function {
            BvlcFunction::RegisterForeignDevice => {
                if payload.len() < 2 {
                    return BbmdAction::Reply(
                        encode_bvlc_nak(header.function, BvlcResultCode::RegisterForeignDeviceNak),
                        from,
                    );
                }
                let ttl = u16::from_be_bytes([payload[0], payload[1]]);
                self.fdt.retain(|e| e.address != from);
                self.fdt.push(FdtEntry {
                    address: from,
                    ttl,
                    registration_time: Instant::now(),
                });
                BbmdAction::Reply(encode_bvlc_nak(header.function, BvlcResultCode::Successful), from)
            }
            BvlcFunction::DeleteForeignDeviceTableEntry => {
                self.fdt.retain(|e| e.address != from);
                BbmdAction::Reply(encode_bvlc_nak(header.function, BvlcResultCode::Successful), from)
            }
            BvlcFunction::ReadForeignDeviceTable => {
                BbmdAction::Reply(self.encode_fdt_ack(), from)
            }
            BvlcFunction::ReadBroadcastDistributionTable => {
                BbmdAction::Reply(self.encode_bdt_ack(), from)
            }
            BvlcFunction::WriteBroadcastDistributionTable => {
                // Payload is a sequence of 10-byte entries (4-byte IP, 2-byte
                // port, 4-byte broadcast distribution mask).
                if payload.len() % 10 != 0 {
                    return BbmdAction::Reply(
                        encode_bvlc_nak(header.function, BvlcResultCode::WriteBroadcastDistributionTableNak),
                        from,
                    );
                }
                self.bdt.clear();
                for chunk in payload.chunks(10) {
                    let ip = std::net::Ipv4Addr::new(chunk[0], chunk[1], chunk[2], chunk[3]);
                    let port = u16::from_be_bytes([chunk[4], chunk[5]]);
                    let mask = [chunk[6], chunk[7], chunk[8], chunk[9]];
                    self.bdt.push(BdtEntry {
                        address: SocketAddr::new(ip.into(), port),
                        mask,
                    });
                }
                BbmdAction::Reply(encode_bvlc_nak(header.function, BvlcResultCode::Successful), from)
            }
            BvlcFunction::ForwardedNpdu => BbmdAction::DeliverNpdu(payload.to_vec(), from),
            BvlcFunction::OriginalUnicastNpdu => BbmdAction::DeliverNpdu(payload.to_vec(), from),
            BvlcFunction::OriginalBroadcastNpdu | BvlcFunction::DistributeBroadcastToNetwork => {
                // Redistribute to every other BDT entry (as Forwarded-NPDU)
                // and to every registered foreign device, per Annex J.4.3/4.
                let mut forwarded = BvlcHeader::new(BvlcFunction::ForwardedNpdu, 10 + payload.len() as u16).encode();
                if let SocketAddr::V4(addr) = from {
                    forwarded.extend_from_slice(&addr.ip().octets());
                    forwarded.extend_from_slice(&addr.port().to_be_bytes());
                } else {
                    forwarded.extend_from_slice(&[0u8; 6]);
                }
                forwarded.extend_from_slice(payload);

                let targets: Vec<SocketAddr> = self
                    .bdt
                    .iter()
                    .map(|e| e.address)
                    .chain(self.fdt.iter().map(|e| e.address))
                    .filter(|addr| *addr != from)
                    .collect();
                BbmdAction::Forward(forwarded, targets)
            }
            BvlcFunction::Result | BvlcFunction::ReadBroadcastDistributionTableAck | BvlcFunction::ReadForeignDeviceTableAck => {
                BbmdAction::None
            }
        }
    }

    fn encode_bdt_ack(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.bdt.len() * 10);
        for entry in &self.bdt {
            if let SocketAddr::V4(addr) = entry.address {
                payload.extend_from_slice(&addr.ip().octets());
                payload.extend_from_slice(&addr.port().to_be_bytes());
                payload.extend_from_slice(&entry.mask);
            }
        }
        let header = BvlcHeader::new(BvlcFunction::ReadBroadcastDistributionTableAck, 4 + payload.len() as u16);
        let mut frame = header.encode();
        frame.extend_from_slice(&payload);
        frame
    }

    fn encode_fdt_ack(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(self.fdt.len() * 10);
        for entry in &self.fdt {
            if let SocketAddr::V4(addr) = entry.address {
                payload.extend_from_slice(&addr.ip().octets());
                payload.extend_from_slice(&addr.port().to_be_bytes());
                payload.extend_from_slice(&entry.ttl.to_be_bytes());
                let remaining = entry
                    .registration_time
                    .elapsed()
                    .as_secs()
                    .min(entry.ttl as u64) as u16;
                payload.extend_from_slice(&(entry.ttl.saturating_sub(remaining)).to_be_bytes());
            }
        }
        let header = BvlcHeader::new(BvlcFunction::ReadForeignDeviceTableAck, 4 + payload.len() as u16);
        let mut frame = header.encode();
        frame.extend_from_slice(&payload);
        frame
    }
}

#[cfg(feature = "std")]
impl DataLink for BacnetIpDataLink {
    fn send_frame(&mut self, frame: &[u8], dest: &DataLinkAddress) -> Result<()> {
        match dest {
            DataLinkAddress::Ip(addr) => {
                self.send_unicast_npdu(frame, *addr)
            }
            DataLinkAddress::Broadcast => {
                self.send_broadcast_npdu(frame)
            }
            _ => Err(DataLinkError::UnsupportedType),
        }
    }

    fn receive_frame(&mut self) -> Result<(Vec<u8>, DataLinkAddress)> {
        let mut buffer = [0u8; 1500]; // MTU size
        
        match self.socket.recv_from(&mut buffer) {
            Ok((len, source)) => {
                let data = &buffer[..len];
                
                if let Some(npdu) = self.process_bvlc_message(data, source)? {
                    Ok((npdu, DataLinkAddress::Ip(source)))
                } else {
                    // No NPDU to return, try again
                    Err(DataLinkError::InvalidFrame)
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                Err(DataLinkError::IoError(e))
            }
            Err(e) => Err(DataLinkError::IoError(e)),
        }
    }

    fn link_type(&self) -> DataLinkType {
        DataLinkType::BacnetIp
    }

    fn local_address(&self) -> DataLinkAddress {
        DataLinkAddress::Ip(self.local_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bvlc_header_encode_decode() {
        let header = BvlcHeader::new(BvlcFunction::OriginalUnicastNpdu, 1024);
        let encoded = header.encode();
        
        assert_eq!(encoded.len(), 4);
        assert_eq!(encoded[0], 0x81);
        assert_eq!(encoded[1], 0x0A);
        assert_eq!(encoded[2], 0x04);
        assert_eq!(encoded[3], 0x00);

        let decoded = BvlcHeader::decode(&encoded).unwrap();
        assert_eq!(decoded.bvlc_type, 0x81);
        assert_eq!(decoded.function, BvlcFunction::OriginalUnicastNpdu);
        assert_eq!(decoded.length, 1024);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_bacnet_ip_creation() {
        let result = BacnetIpDataLink::new("127.0.0.1:0");
        assert!(result.is_ok());
        
        let datalink = result.unwrap();
        assert_eq!(datalink.link_type(), DataLinkType::BacnetIp);
    }

    #[test]
    fn bbmd_registers_foreign_device() {
        let mut bbmd = Bbmd::new();
        let from: SocketAddr = "192.168.1.50:47808".parse().unwrap();
        let header = BvlcHeader::new(BvlcFunction::RegisterForeignDevice, 6);
        let payload = 60u16.to_be_bytes();

        match bbmd.handle_bvlc(&header, &payload, from) {
            BbmdAction::Reply(frame, dest) => {
                assert_eq!(dest, from);
                assert_eq!(frame[1], BvlcFunction::Result as u8);
            }
            other => panic!("unexpected action: {:?}", other),
        }
        assert_eq!(bbmd.fdt.len(), 1);
        assert_eq!(bbmd.fdt[0].address, from);
    }

    #[test]
    fn bbmd_naks_malformed_register() {
        let mut bbmd = Bbmd::new();
        let from: SocketAddr = "192.168.1.50:47808".parse().unwrap();
        let header = BvlcHeader::new(BvlcFunction::RegisterForeignDevice, 4);

        match bbmd.handle_bvlc(&header, &[], from) {
            BbmdAction::Reply(frame, _) => {
                let code = u16::from_be_bytes([frame[4], frame[5]]);
                assert_eq!(code, BvlcResultCode::RegisterForeignDeviceNak as u16);
            }
            other => panic!("unexpected action: {:?}", other),
        }
        assert!(bbmd.fdt.is_empty());
    }

    #[test]
    fn bbmd_forwards_broadcast_to_bdt_and_fdt() {
        let mut bbmd = Bbmd::new();
        let bdt_peer: SocketAddr = "192.168.1.2:47808".parse().unwrap();
        bbmd.bdt.push(BdtEntry {
            address: bdt_peer,
            mask: [255, 255, 255, 0],
        });

        let from: SocketAddr = "192.168.1.9:47808".parse().unwrap();
        let header = BvlcHeader::new(BvlcFunction::OriginalBroadcastNpdu, 8);
        match bbmd.handle_bvlc(&header, &[0x01, 0x00], from) {
            BbmdAction::Forward(frame, targets) => {
                assert_eq!(frame[1], BvlcFunction::ForwardedNpdu as u8);
                assert_eq!(targets, vec![bdt_peer]);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[test]
    fn non_bbmd_function_nak_encodes_result_header() {
        let nak = encode_bvlc_nak(
            BvlcFunction::ReadBroadcastDistributionTable,
            BvlcResultCode::nak_for(BvlcFunction::ReadBroadcastDistributionTable),
        );
        assert_eq!(nak[1], BvlcFunction::Result as u8);
        assert_eq!(
            u16::from_be_bytes([nak[4], nak[5]]),
            BvlcResultCode::ReadBroadcastDistributionTableNak as u16
        );
    }
}