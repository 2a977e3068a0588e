//! A minimal per-flow TCP sequencer: orders segments by sequence number
//! and feeds contiguous byte runs to a [`dofus_protocol::StreamWorker`]'s
//! inbound channel.
//!
//! This is intentionally not a full TCP state machine: no retransmission
//! timers, no window tracking. It buffers out-of-order segments and
//! releases them as gaps are filled, which is enough to feed a
//! byte-oriented frame parser from a capture that mostly sees packets in
//! order.

use std::collections::{BTreeMap, HashMap};
use std::net::Ipv4Addr;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use log::{debug, info, warn};

use dofus_protocol::{Dispatcher, MessageCatalog, StreamWorker, TypeCatalog};

use crate::capture::TcpSegment;

/// Identifies one direction of one TCP connection, normalised so both
/// directions of the same connection share a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct FlowKey {
    a_addr: Ipv4Addr,
    a_port: u16,
    b_addr: Ipv4Addr,
    b_port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    AToB,
    BToA,
}

impl FlowKey {
    fn normalize(src: Ipv4Addr, src_port: u16, dst: Ipv4Addr, dst_port: u16) -> (Self, Direction) {
        if (src, src_port) <= (dst, dst_port) {
            (
                FlowKey {
                    a_addr: src,
                    a_port: src_port,
                    b_addr: dst,
                    b_port: dst_port,
                },
                Direction::AToB,
            )
        } else {
            (
                FlowKey {
                    a_addr: dst,
                    a_port: dst_port,
                    b_addr: src,
                    b_port: src_port,
                },
                Direction::BToA,
            )
        }
    }
}

struct HalfStream {
    next_seq: Option<u32>,
    pending: BTreeMap<u32, Vec<u8>>,
    inbound: SyncSender<Vec<u8>>,
}

struct Flow {
    a_to_b: HalfStream,
    b_to_a: HalfStream,
}

/// Feeds captured TCP segments to per-flow, per-direction [`StreamWorker`]
/// threads.
pub struct Reassembler {
    flows: Mutex<HashMap<FlowKey, Flow>>,
    messages: Arc<MessageCatalog>,
    types: Arc<TypeCatalog>,
    dispatcher: Arc<Dispatcher>,
}

impl Reassembler {
    pub fn new(messages: Arc<MessageCatalog>, types: Arc<TypeCatalog>, dispatcher: Arc<Dispatcher>) -> Self {
        Reassembler {
            flows: Mutex::new(HashMap::new()),
            messages,
            types,
            dispatcher,
        }
    }

    /// Routes one captured segment into its flow's half-stream, spawning a
    /// new [`StreamWorker`] thread the first time a direction is seen.
    pub fn handle_segment(&self, segment: TcpSegment) {
        let (key, direction) = FlowKey::normalize(
            segment.src_addr,
            segment.src_port,
            segment.dst_addr,
            segment.dst_port,
        );

        let mut flows = self.flows.lock().unwrap();
        let flow = flows.entry(key).or_insert_with(|| self.spawn_flow(key));

        let half = match direction {
            Direction::AToB => &mut flow.a_to_b,
            Direction::BToA => &mut flow.b_to_a,
        };

        self.feed_half_stream(half, &segment);

        if segment.rst || segment.fin {
            debug!("{key:?} {direction:?} closed (RST/FIN)");
        }
    }

    fn spawn_flow(&self, key: FlowKey) -> Flow {
        info!(
            "new flow {}:{} <-> {}:{}",
            key.a_addr, key.a_port, key.b_addr, key.b_port
        );
        Flow {
            a_to_b: self.spawn_half_stream(format!(
                "{}:{} -> {}:{}",
                key.a_addr, key.a_port, key.b_addr, key.b_port
            )),
            b_to_a: self.spawn_half_stream(format!(
                "{}:{} -> {}:{}",
                key.b_addr, key.b_port, key.a_addr, key.a_port
            )),
        }
    }

    fn spawn_half_stream(&self, label: String) -> HalfStream {
        let (tx, rx) = sync_channel(64);
        let messages = Arc::clone(&self.messages);
        let types = Arc::clone(&self.types);
        let dispatcher = Arc::clone(&self.dispatcher);

        thread::spawn(move || {
            let mut worker = StreamWorker::new(label, messages, types, dispatcher);
            worker.run(rx);
        });

        HalfStream {
            next_seq: None,
            pending: BTreeMap::new(),
            inbound: tx,
        }
    }

    fn feed_half_stream(&self, half: &mut HalfStream, segment: &TcpSegment) {
        if segment.syn {
            // The sequence number of a SYN names the first byte of the
            // stream; payload (if any, e.g. a SYN+data packet) starts
            // there too.
            half.next_seq = Some(segment.sequence_number);
        }

        if segment.payload.is_empty() {
            return;
        }

        let next_seq = match half.next_seq {
            Some(seq) => seq,
            None => {
                // No SYN observed (capture started mid-stream): accept the
                // first segment's sequence number as the baseline.
                segment.sequence_number
            }
        };

        if segment.sequence_number == next_seq {
            half.next_seq = Some(next_seq.wrapping_add(segment.payload.len() as u32));
            if half.inbound.send(segment.payload.clone()).is_err() {
                warn!("half-stream worker gone, dropping segment");
                return;
            }
            self.drain_pending(half);
        } else if segment.sequence_number.wrapping_sub(next_seq) < u32::MAX / 2 {
            // Ahead of what we can deliver yet: buffer for later release.
            half.pending
                .insert(segment.sequence_number, segment.payload.clone());
        }
        // Segments strictly behind `next_seq` (retransmits of already
        // delivered bytes) are dropped; no window tracking is kept.
    }

    fn drain_pending(&self, half: &mut HalfStream) {
        while let Some(seq) = half.next_seq {
            match half.pending.remove(&seq) {
                Some(payload) => {
                    half.next_seq = Some(seq.wrapping_add(payload.len() as u32));
                    if half.inbound.send(payload).is_err() {
                        return;
                    }
                }
                None => break,
            }
        }
    }
}
