//! Device-id to address binding cache
//!
//! Grounded in `bacnet/basic/binding/address.h`'s fixed-size address table:
//! `address_add`/`address_get_by_device`/`address_remove_device` and the
//! static-vs-dynamic TTL handling of `address_set_device_TTL`. This is the
//! Rust equivalent of that table, sized by a capacity rather than a
//! compile-time array, and using `Option`/`Result` in place of boolean
//! "found" out-parameters.

#[cfg(feature = "std")]
use std::error::Error;

#[cfg(feature = "std")]
use std::fmt;

#[cfg(not(feature = "std"))]
use core::fmt;

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::network::NetworkAddress;
use crate::MAX_ADDRESS_CACHE;

/// Errors raised by the address cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressCacheError {
    /// The cache is at capacity and holds no evictable (expired, dynamic)
    /// entry to make room for a new binding.
    CacheFull,
    /// No entry exists for the requested device instance.
    NotFound(u32),
}

impl fmt::Display for AddressCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressCacheError::CacheFull => write!(f, "address cache is full"),
            AddressCacheError::NotFound(id) => write!(f, "no address bound for device {}", id),
        }
    }
}

#[cfg(feature = "std")]
impl Error for AddressCacheError {}

/// Whether a binding lookup found a usable address, found the device already
/// in progress of being bound (a Who-Is was already sent and is awaiting
/// I-Am), or needs a fresh Who-Is to be issued by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressBindingStatus {
    /// `device_id` is bound to this address; safe to send to directly.
    Bound(NetworkAddress),
    /// A Who-Is has already been issued for this device and not yet timed
    /// out; the caller should not issue another one.
    InProgress,
    /// Nothing is known about this device; the caller should emit a Who-Is
    /// and call [`AddressCache::bind_request`] again once the timeout tick
    /// expires or an I-Am is seen.
    Unbound,
}

/// One entry in the cache, mirroring `BACNET_ADDRESS_CACHE_ENTRY`: a device
/// id, its resolved address, a maximum APDU length (0 if unknown), and a TTL
/// in seconds (0 for statically pinned entries that never expire).
#[derive(Debug, Clone)]
pub struct AddressCacheEntry {
    pub device_id: u32,
    pub address: NetworkAddress,
    pub max_apdu: u32,
    pub is_static: bool,
    ttl_seconds: u32,
    /// Set while a Who-Is is outstanding and no address is known yet.
    binding_in_progress: bool,
}

/// Fixed-capacity device-id/address binding cache.
#[derive(Debug, Clone)]
pub struct AddressCache {
    entries: Vec<AddressCacheEntry>,
    capacity: usize,
    default_ttl_seconds: u32,
}

impl Default for AddressCache {
    fn default() -> Self {
        Self::new(MAX_ADDRESS_CACHE, 60 * 60)
    }
}

impl AddressCache {
    /// Create a cache holding at most `capacity` entries, with dynamic
    /// entries expiring after `default_ttl_seconds` of inactivity.
    pub fn new(capacity: usize, default_ttl_seconds: u32) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            default_ttl_seconds,
        }
    }

    /// Number of live entries (bound or in-progress).
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// Bind `device_id` to `address`, replacing any existing entry. A
    /// `max_apdu` of 0 means unknown. `is_static` entries never expire and
    /// are never evicted to make room for new dynamic bindings.
    pub fn add_binding(
        &mut self,
        device_id: u32,
        address: NetworkAddress,
        max_apdu: u32,
        is_static: bool,
    ) -> Result<(), AddressCacheError> {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.device_id == device_id) {
            existing.address = address;
            existing.max_apdu = max_apdu;
            existing.is_static = is_static;
            existing.ttl_seconds = if is_static { 0 } else { self.default_ttl_seconds };
            existing.binding_in_progress = false;
            return Ok(());
        }

        if self.entries.len() >= self.capacity {
            self.evict_one()?;
        }

        self.entries.push(AddressCacheEntry {
            device_id,
            address,
            max_apdu,
            is_static,
            ttl_seconds: if is_static { 0 } else { self.default_ttl_seconds },
            binding_in_progress: false,
        });
        Ok(())
    }

    /// Evict the first expired, non-static, non-in-progress entry. Used to
    /// make room for a new binding when the cache is at capacity.
    fn evict_one(&mut self) -> Result<(), AddressCacheError> {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|e| !e.is_static && e.ttl_seconds == 0 && !e.binding_in_progress)
        {
            self.entries.remove(idx);
            return Ok(());
        }
        Err(AddressCacheError::CacheFull)
    }

    /// Look up a bound address by device instance.
    pub fn get_by_device(&self, device_id: u32) -> Option<&NetworkAddress> {
        self.entries
            .iter()
            .find(|e| e.device_id == device_id && !e.binding_in_progress)
            .map(|e| &e.address)
    }

    /// Reverse lookup: find the device instance bound to `address`, if any.
    pub fn get_device_id(&self, address: &NetworkAddress) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| &e.address == address && !e.binding_in_progress)
            .map(|e| e.device_id)
    }

    /// Remove any binding (bound or in-progress) for `device_id`.
    pub fn remove_device(&mut self, device_id: u32) {
        self.entries.retain(|e| e.device_id != device_id);
    }

    /// Resolve `device_id` to an address, driving the Who-Is binding
    /// protocol described in the spec: unbound devices are marked
    /// in-progress and the caller is told to issue a Who-Is; devices already
    /// in progress return `InProgress` without re-triggering a Who-Is.
    pub fn bind_request(&mut self, device_id: u32) -> AddressBindingStatus {
        if let Some(entry) = self.entries.iter().find(|e| e.device_id == device_id) {
            if entry.binding_in_progress {
                return AddressBindingStatus::InProgress;
            }
            return AddressBindingStatus::Bound(entry.address.clone());
        }

        if self.entries.len() >= self.capacity && self.evict_one().is_err() {
            return AddressBindingStatus::Unbound;
        }

        self.entries.push(AddressCacheEntry {
            device_id,
            address: NetworkAddress::new(0, Vec::new()),
            max_apdu: 0,
            is_static: false,
            ttl_seconds: self.default_ttl_seconds,
            binding_in_progress: true,
        });
        AddressBindingStatus::Unbound
    }

    /// Override an entry's TTL, matching `address_set_device_TTL`. Passing
    /// `is_static = true` pins the entry so it is never evicted or expired.
    pub fn set_device_ttl(&mut self, device_id: u32, ttl_seconds: u32, is_static: bool) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.device_id == device_id) {
            entry.ttl_seconds = if is_static { 0 } else { ttl_seconds };
            entry.is_static = is_static;
        }
    }

    /// Advance every dynamic entry's TTL by `elapsed_seconds`, dropping those
    /// that expire. Mirrors `address_cache_timer`.
    pub fn tick(&mut self, elapsed_seconds: u32) {
        for entry in self.entries.iter_mut() {
            if entry.is_static || entry.binding_in_progress {
                continue;
            }
            entry.ttl_seconds = entry.ttl_seconds.saturating_sub(elapsed_seconds);
        }
        self.entries
            .retain(|e| e.is_static || e.binding_in_progress || e.ttl_seconds > 0);
    }

    /// Iterate all entries (for diagnostics / Who-Is-list style responses).
    pub fn iter(&self) -> impl Iterator<Item = &AddressCacheEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> NetworkAddress {
        NetworkAddress::new(0, vec![192, 168, 1, n])
    }

    #[test]
    fn bind_then_lookup() {
        let mut cache = AddressCache::new(4, 60);
        cache.add_binding(100, addr(1), 1476, false).unwrap();
        assert_eq!(cache.get_by_device(100), Some(&addr(1)));
        assert_eq!(cache.get_device_id(&addr(1)), Some(100));
    }

    #[test]
    fn bind_request_triggers_who_is_once() {
        let mut cache = AddressCache::new(4, 60);
        assert_eq!(cache.bind_request(200), AddressBindingStatus::Unbound);
        assert_eq!(cache.bind_request(200), AddressBindingStatus::InProgress);
        cache.add_binding(200, addr(2), 0, false).unwrap();
        assert_eq!(cache.bind_request(200), AddressBindingStatus::Bound(addr(2)));
    }

    #[test]
    fn dynamic_entries_expire_but_static_do_not() {
        let mut cache = AddressCache::new(4, 10);
        cache.add_binding(1, addr(1), 0, false).unwrap();
        cache.add_binding(2, addr(2), 0, true).unwrap();
        cache.tick(10);
        assert!(cache.get_by_device(1).is_none());
        assert!(cache.get_by_device(2).is_some());
    }

    #[test]
    fn full_cache_evicts_expired_before_failing() {
        let mut cache = AddressCache::new(1, 0);
        cache.add_binding(1, addr(1), 0, false).unwrap();
        cache.tick(1);
        cache.add_binding(2, addr(2), 0, false).unwrap();
        assert_eq!(cache.get_by_device(2), Some(&addr(2)));
    }
}
