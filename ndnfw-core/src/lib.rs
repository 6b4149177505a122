//! NDN forwarding pipeline.
//!
//! This crate implements the forwarding plane of an NDN node: the tables a
//! forwarder consults (FIB, PIT, content store, Dead Nonce List) and the
//! [`Forwarder`] state machine that sequences them for every Interest and
//! Data packet. Faces, forwarding strategies and the timer source are
//! collaborators described by traits; [`ForwarderService`] wires them to a
//! tokio task.
//!
//! The forwarder is strictly single-threaded: every pipeline step, timer
//! expiry and strategy callback runs to completion before the next one
//! starts, so none of the tables need locking.

pub mod config;
pub mod cs;
pub mod dead_nonce_list;
pub mod face;
pub mod fib;
pub mod forwarder;
pub mod name_tree;
pub mod pit;
pub mod scheduler;
pub mod scope;
pub mod service;
pub mod strategy;

pub use config::{ForwarderConfig, RouteConfig};
pub use cs::ContentStore;
pub use dead_nonce_list::DeadNonceList;
pub use face::{ChannelFace, Face, FaceTable};
pub use fib::{Fib, FibEntry, NextHop};
pub use forwarder::Forwarder;
pub use name_tree::NameIndex;
pub use pit::{DuplicateNonce, InRecord, OutRecord, Pit, PitEntry, PitHandle};
pub use scheduler::{Scheduler, TimerEvent, TimerId, TimerQueue};
pub use service::{FaceEvent, ForwarderService};
pub use strategy::{BestRoute, ForwarderObserver, Strategy};
