//! Names, Interests and Data.
//!
//! This module provides the structured values the forwarder operates on.
//! Wire encoding and signing are handled elsewhere; here a packet is just its
//! fields. Packets are never modified by the forwarder: per-hop metadata such
//! as the incoming face travels next to the packet in an [`Incoming`]
//! envelope.

use crate::error::Error;
use crate::types::FaceId;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::time::Duration;

/// Lifetime applied to Interests that do not carry one.
pub const DEFAULT_INTEREST_LIFETIME: Duration = Duration::from_millis(4000);

/// One opaque component of a [`Name`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NameComponent(pub Bytes);

impl NameComponent {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &Bytes {
        &self.0
    }

    fn from_escaped(segment: &str) -> Result<Self, Error> {
        let raw = segment.as_bytes();
        let mut out = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'%' {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| {
                        Error::InvalidName(format!("bad percent-escape in component {:?}", segment))
                    })?;
                out.push(hex);
                i += 3;
            } else {
                out.push(raw[i]);
                i += 1;
            }
        }
        Ok(Self(Bytes::from(out)))
    }
}

impl fmt::Display for NameComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in self.0.iter() {
            if b.is_ascii_graphic() && b != b'/' && b != b'%' {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

/// Hierarchical NDN name.
///
/// Names order component-wise, so every name sorts directly before all of
/// its extensions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Name {
    components: Vec<NameComponent>,
}

impl Name {
    /// The empty name, `/`.
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    /// Parses an NDN URI such as `/a/b%2Fc` or `ndn:/localhost`.
    ///
    /// Empty segments are skipped and `%XX` escapes are decoded.
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        let path = uri.strip_prefix("ndn:").unwrap_or(uri);
        let components = path
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(NameComponent::from_escaped)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { components })
    }

    /// Lenient [`Name::from_uri`]: a segment with a malformed escape is
    /// taken literally instead of failing.
    pub fn from_string(s: &str) -> Self {
        let path = s.strip_prefix("ndn:").unwrap_or(s);
        let components = path
            .split('/')
            .filter(|comp| !comp.is_empty())
            .map(|comp| {
                NameComponent::from_escaped(comp)
                    .unwrap_or_else(|_| NameComponent::new(comp.as_bytes().to_vec()))
            })
            .collect();

        Self { components }
    }

    pub fn push(&mut self, component: NameComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Returns a copy of this name with one more component.
    pub fn append(&self, component: impl Into<Bytes>) -> Self {
        let mut name = self.clone();
        name.components.push(NameComponent::new(component));
        name
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns the name components.
    pub fn components(&self) -> &[NameComponent] {
        &self.components
    }

    pub fn get(&self, index: usize) -> Option<&NameComponent> {
        self.components.get(index)
    }

    /// True when `other` starts with this name, including `other == self`.
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.len() <= other.len() && other.components.starts_with(&self.components)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return write!(f, "/");
        }

        for component in &self.components {
            write!(f, "/{}", component)?;
        }

        Ok(())
    }
}

impl Default for Name {
    fn default() -> Self {
        Self::new()
    }
}

// Hash must agree with the slice hash so `Borrow<[NameComponent]>` lookups work.
impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.components.as_slice().hash(state);
    }
}

impl Borrow<[NameComponent]> for Name {
    fn borrow(&self) -> &[NameComponent] {
        &self.components
    }
}

impl From<&[NameComponent]> for Name {
    fn from(components: &[NameComponent]) -> Self {
        Self {
            components: components.to_vec(),
        }
    }
}

impl std::str::FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uri(s)
    }
}

/// Request for Data under a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,

    /// Random value distinguishing forwarding attempts.
    pub nonce: u32,

    /// Interest lifetime. When absent the forwarder applies its configured
    /// default.
    pub lifetime: Option<Duration>,

    /// Whether Data under a longer name can satisfy this Interest.
    pub can_be_prefix: bool,

    /// Whether stale cached Data must be skipped.
    pub must_be_fresh: bool,

    /// Validation request: consults the content store even when an equal
    /// Interest is already pending.
    pub validation: bool,

    /// Location registration: sent straight to the best next hop, bypassing
    /// the PIT and the content store.
    pub location_registration: bool,

    /// Faces this validation request arrived on, one per hop, oldest first.
    pub path: Vec<FaceId>,
}

impl Interest {
    /// Creates a new Interest packet with nonce 0 and default lifetime.
    pub fn new(name: Name) -> Self {
        Self {
            name,
            nonce: 0,
            lifetime: None,
            can_be_prefix: false,
            must_be_fresh: false,
            validation: false,
            location_registration: false,
            path: Vec::new(),
        }
    }

    /// Returns the name of this Interest.
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn with_nonce(mut self, nonce: u32) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn with_can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Marks this Interest as a validation request.
    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Marks this Interest as a location registration.
    pub fn with_location_registration(mut self, location_registration: bool) -> Self {
        self.location_registration = location_registration;
        self
    }

    /// Checks whether `data` satisfies this Interest's name selector.
    pub fn matches_data(&self, data: &Data) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }
}

/// Named, signed content answering an Interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,

    /// Payload
    pub content: Bytes,

    /// How long the Data stays fresh once cached; absent means forever.
    pub freshness_period: Option<Duration>,

    /// Signature bytes, opaque to the forwarder.
    pub signature: Bytes,

    /// Answers, or is pushed for, a validation request. Such Data is only
    /// cached when `eligibility` or `publishment` says so.
    pub validation: bool,

    /// Pushed by a producer along `path_back` instead of through the PIT.
    pub publishment: bool,

    /// With `publishment`: remove the name from every cache on the way.
    pub expiration: bool,

    /// This hop may cache the Data and announce itself upstream.
    pub eligibility: bool,

    /// Remaining hops of a pushed Data; the last entry is the next face.
    pub path_back: Vec<FaceId>,
}

impl Data {
    /// Unsigned Data that never goes stale.
    pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
        Self {
            name,
            content: content.into(),
            freshness_period: None,
            signature: Bytes::new(),
            validation: false,
            publishment: false,
            expiration: false,
            eligibility: false,
            path_back: Vec::new(),
        }
    }

    /// Returns the name of this Data.
    pub fn name(&self) -> &Name {
        &self.name
    }

    /// Sets the freshness period.
    pub fn with_freshness_period(mut self, freshness_period: Duration) -> Self {
        self.freshness_period = Some(freshness_period);
        self
    }

    /// Sets the signature bytes.
    pub fn with_signature(mut self, signature: impl Into<Bytes>) -> Self {
        self.signature = signature.into();
        self
    }

    pub fn with_validation(mut self, validation: bool) -> Self {
        self.validation = validation;
        self
    }

    /// Turns this into pushed Data retracing `path_back`, usually the `path`
    /// of the validation request it answers.
    pub fn with_publishment(mut self, path_back: Vec<FaceId>) -> Self {
        self.publishment = true;
        self.path_back = path_back;
        self
    }

    pub fn with_expiration(mut self, expiration: bool) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_eligibility(mut self, eligibility: bool) -> Self {
        self.eligibility = eligibility;
        self
    }
}

/// A packet together with the face it arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming<P> {
    /// Face the packet arrived on, or [`FaceId::CONTENT_STORE`] for cache hits.
    pub incoming_face: FaceId,

    /// The packet itself.
    pub packet: P,
}

impl<P> Incoming<P> {
    /// Wraps a packet received on `incoming_face`.
    pub fn new(incoming_face: FaceId, packet: P) -> Self {
        Self {
            incoming_face,
            packet,
        }
    }

    /// Unwraps the packet.
    pub fn into_inner(self) -> P {
        self.packet
    }
}

impl<P> Deref for Incoming<P> {
    type Target = P;

    fn deref(&self) -> &P {
        &self.packet
    }
}

/// Either kind of network-layer packet, as carried between a face and the
/// forwarder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NdnPacket {
    /// An Interest packet
    Interest(Interest),

    /// A Data packet
    Data(Data),
}

impl NdnPacket {
    pub fn name(&self) -> &Name {
        match self {
            NdnPacket::Interest(interest) => interest.name(),
            NdnPacket::Data(data) => data.name(),
        }
    }

    /// `"Interest"` or `"Data"`, for logs.
    pub fn packet_type(&self) -> &'static str {
        match self {
            NdnPacket::Interest(_) => "Interest",
            NdnPacket::Data(_) => "Data",
        }
    }
}

#[cfg(test)]
mod tests;
