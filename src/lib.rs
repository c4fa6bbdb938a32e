#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

pub mod app;
pub mod config;
pub mod datalink;
pub mod encoding;
pub mod network;
pub mod object;
pub mod property;
pub mod service;
pub mod transport;
pub mod util;

// Re-export main types without glob imports to avoid conflicts
pub use config::BacnetConfig;
pub use datalink::{DataLink, DataLinkAddress, DataLinkType};
pub use encoding::{ApplicationTag, EncodingError};
pub use object::{BacnetObject, ObjectType, PropertyIdentifier};
pub use service::{ConfirmedServiceChoice, ServiceError, UnconfirmedServiceChoice};

#[cfg(feature = "std")]
extern crate std;

#[cfg(not(feature = "std"))]
extern crate alloc;

pub const BACNET_PROTOCOL_VERSION: u8 = 1;
pub const BACNET_MAX_APDU: usize = 1476;
pub const BACNET_MAX_MPDU: usize = 1497;

/// Maximum instance number for an object identifier (2^22 - 1); also the
/// device-instance wildcard used by Who-Is/I-Am range queries.
pub const BACNET_MAX_INSTANCE: u32 = 0x3F_FFFF;

/// Maximum concurrent address-cache entries (mirrors the C stack's
/// `MAX_ADDRESS_CACHE`).
pub const MAX_ADDRESS_CACHE: usize = 255;

/// Broadcast MS/TP station address; never a valid `this_station` value.
pub const MSTP_BROADCAST_ADDRESS: u8 = 255;

/// Unified, crate-wide error type.
///
/// Each subsystem keeps its own focused error enum (`EncodingError`,
/// `datalink::DataLinkError`, `network::NetworkError`,
/// `app::ApplicationError`, `service::ServiceError`, `object::ObjectError`,
/// `app::tsm::TsmError`, `app::address_cache::AddressCacheError`); this
/// enum exists for callers who want to propagate any of them with a single
/// `?` through one return type, the way a consolidated top-level error type
/// is added once a crate's module count grows past a handful.
#[derive(Debug)]
pub enum BacnetError {
    Encoding(encoding::EncodingError),
    DataLink(datalink::DataLinkError),
    Network(network::NetworkError),
    Application(app::ApplicationError),
    Service(service::ServiceError),
    Object(object::ObjectError),
    Tsm(app::tsm::TsmError),
    AddressCache(app::address_cache::AddressCacheError),
    Config(config::ConfigError),
}

#[cfg(feature = "std")]
impl fmt::Display for BacnetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BacnetError::Encoding(e) => write!(f, "{}", e),
            BacnetError::DataLink(e) => write!(f, "{}", e),
            BacnetError::Network(e) => write!(f, "{}", e),
            BacnetError::Application(e) => write!(f, "{}", e),
            BacnetError::Service(e) => write!(f, "{}", e),
            BacnetError::Object(e) => write!(f, "{}", e),
            BacnetError::Tsm(e) => write!(f, "{}", e),
            BacnetError::AddressCache(e) => write!(f, "{}", e),
            BacnetError::Config(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(feature = "std")]
use std::fmt;

#[cfg(feature = "std")]
impl std::error::Error for BacnetError {}

macro_rules! impl_bacnet_error_from {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for BacnetError {
            fn from(e: $ty) -> Self {
                BacnetError::$variant(e)
            }
        }
    };
}

impl_bacnet_error_from!(Encoding, encoding::EncodingError);
impl_bacnet_error_from!(DataLink, datalink::DataLinkError);
impl_bacnet_error_from!(Network, network::NetworkError);
impl_bacnet_error_from!(Application, app::ApplicationError);
impl_bacnet_error_from!(Service, service::ServiceError);
impl_bacnet_error_from!(Object, object::ObjectError);
impl_bacnet_error_from!(Tsm, app::tsm::TsmError);
impl_bacnet_error_from!(AddressCache, app::address_cache::AddressCacheError);
impl_bacnet_error_from!(Config, config::ConfigError);

#[cfg(test)]
mod tests {
    use crate::object::ObjectIdentifier;
    use crate::util::{crc16_mstp, decode_object_id, encode_object_id};
    use crate::{ApplicationTag, EncodingError, ObjectType};

    #[cfg(not(feature = "std"))]
    use alloc::format;

    #[test]
    fn test_no_std_types() {
        // Test that our types work in both std and no-std environments
        let tag = ApplicationTag::Boolean;
        assert_eq!(tag as u8, 1);

        let obj_type = ObjectType::AnalogInput;
        assert_eq!(obj_type as u16, 0);

        let obj_id = ObjectIdentifier::new(ObjectType::Device, 123);
        assert_eq!(obj_id.instance, 123);
        assert!(obj_id.is_valid());
    }

    #[test]
    fn test_encoding_error() {
        let err = EncodingError::BufferOverflow;
        // In no-std, we can still format errors
        let _ = format!("{:?}", err);
    }

    #[test]
    fn test_util_functions() {
        // Test CRC calculation
        let data = b"test";
        let crc = crc16_mstp(data);
        assert_ne!(crc, 0);

        // Test object ID encoding/decoding
        let encoded = encode_object_id(8, 123).unwrap();
        let (obj_type, instance) = decode_object_id(encoded);
        assert_eq!(obj_type, 8);
        assert_eq!(instance, 123);
    }
}
