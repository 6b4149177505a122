//! Faces and the face table.
//!
//! A face is whatever moves packets between the forwarder and the outside:
//! a network link, a local application, a test harness. The forwarder only
//! needs the few operations of the [`Face`] trait.

use log::{debug, info};
use ndnfw_common::{Data, Error, FaceId, Interest, NdnPacket, Result};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// Transport endpoint the forwarder sends packets to.
pub trait Face: Send {
    fn id(&self) -> FaceId;

    /// Called by the face table when the face is registered.
    fn set_id(&mut self, id: FaceId);

    /// Local faces connect applications on this node.
    fn is_local(&self) -> bool;

    fn send_interest(&self, interest: &Interest);

    fn send_data(&self, data: &Data);
}

/// A face that hands outgoing packets to a tokio channel.
#[derive(Debug)]
pub struct ChannelFace {
    id: FaceId,
    local: bool,
    tx: mpsc::UnboundedSender<NdnPacket>,
}

impl ChannelFace {
    /// Creates the face and the receiver its outgoing packets arrive on.
    pub fn new(local: bool) -> (Self, mpsc::UnboundedReceiver<NdnPacket>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let face = Self {
            id: FaceId::INVALID,
            local,
            tx,
        };
        (face, rx)
    }

    fn send(&self, packet: NdnPacket) {
        let name = packet.name().clone();
        if self.tx.send(packet).is_err() {
            debug!("[Face {}] receiver gone, dropping packet for {}", self.id, name);
        }
    }
}

impl Face for ChannelFace {
    fn id(&self) -> FaceId {
        self.id
    }

    fn set_id(&mut self, id: FaceId) {
        self.id = id;
    }

    fn is_local(&self) -> bool {
        self.local
    }

    fn send_interest(&self, interest: &Interest) {
        self.send(NdnPacket::Interest(interest.clone()));
    }

    fn send_data(&self, data: &Data) {
        self.send(NdnPacket::Data(data.clone()));
    }
}

/// First id handed out to dynamically added faces.
const FIRST_DYNAMIC_ID: u32 = FaceId::RESERVED_MAX.0 + 1;

/// Registered faces by id.
pub struct FaceTable {
    faces: BTreeMap<FaceId, Box<dyn Face>>,
    next_id: u32,
}

impl FaceTable {
    pub fn new() -> Self {
        Self {
            faces: BTreeMap::new(),
            next_id: FIRST_DYNAMIC_ID,
        }
    }

    /// Registers `face` under the next free dynamic id.
    pub fn add(&mut self, mut face: Box<dyn Face>) -> FaceId {
        let id = FaceId(self.next_id);
        self.next_id += 1;
        face.set_id(id);
        info!("Added face {} (local={})", id, face.is_local());
        self.faces.insert(id, face);
        id
    }

    /// Registers `face` under a reserved id.
    pub fn add_reserved(&mut self, id: FaceId, mut face: Box<dyn Face>) -> Result<()> {
        if !id.is_reserved() || !id.is_valid() {
            return Err(Error::Face(id, "not a reserved face id".into()));
        }
        if self.faces.contains_key(&id) {
            return Err(Error::Face(id, "already registered".into()));
        }
        face.set_id(id);
        info!("Added reserved face {}", id);
        self.faces.insert(id, face);
        Ok(())
    }

    pub fn remove(&mut self, id: FaceId) -> Option<Box<dyn Face>> {
        let face = self.faces.remove(&id);
        if face.is_some() {
            info!("Removed face {}", id);
        }
        face
    }

    pub fn get(&self, id: FaceId) -> Option<&dyn Face> {
        self.faces.get(&id).map(|face| face.as_ref())
    }

    pub fn contains(&self, id: FaceId) -> bool {
        self.faces.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.faces.keys().copied()
    }
}

impl Default for FaceTable {
    fn default() -> Self {
        Self::new()
    }
}
