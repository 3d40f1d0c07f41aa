//! Codec trait and implementations for serializing stored records.
//!
//! The session store keeps each user's permission list as an encoded
//! column, and the demo portal loads its users from a seed file. Neither
//! cares HOW the bytes look; they only need something that implements
//! [`Codec`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because the codec lives inside the shared
/// store, which Tokio may touch from any worker thread.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// A permission column encoded with this codec looks like
/// `["/vehicles","/fueling"]`, which is what an operator would expect to
/// see when inspecting the users table by hand.
///
/// ## Example
///
/// ```rust
/// use fleetgate_protocol::{Codec, JsonCodec, PermissionSet};
///
/// let codec = JsonCodec;
/// let perms: PermissionSet = ["/Vehicles", "/fueling"].into_iter().collect();
///
/// let bytes = codec.encode(&perms).unwrap();
/// let decoded: PermissionSet = codec.decode(&bytes).unwrap();
/// assert!(decoded.contains("/VEHICLES"));
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
