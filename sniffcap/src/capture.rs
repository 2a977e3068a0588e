//! Packet acquisition: opens a live interface or an offline capture file
//! via `pcap`, then strips Ethernet/IP/TCP headers with `etherparse` down
//! to a TCP segment, discarding everything that is not port-5555 traffic.

use std::net::Ipv4Addr;

use etherparse::{IpHeader, PacketHeaders, TransportHeader};
use log::debug;
use pcap::{Active, Capture, Device, Offline};

/// One parsed TCP segment bound for reassembly.
#[derive(Debug, Clone)]
pub struct TcpSegment {
    pub src_addr: Ipv4Addr,
    pub src_port: u16,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
    pub sequence_number: u32,
    pub syn: bool,
    pub fin: bool,
    pub rst: bool,
    pub payload: Vec<u8>,
}

/// Either a live interface capture or an offline file replay, behind one
/// iterator-like interface.
pub enum Source {
    Live(Capture<Active>),
    Offline(Capture<Offline>),
}

impl Source {
    pub fn open_live(interface: &str, snaplen: i32, filter: Option<&str>) -> anyhow::Result<Self> {
        let device = Device::list()?
            .into_iter()
            .find(|d| d.name == interface)
            .ok_or_else(|| anyhow::anyhow!("no such capture device: {interface}"))?;

        let mut capture = Capture::from_device(device)?
            .promisc(true)
            .snaplen(snaplen)
            .timeout(1000)
            .open()?;

        if let Some(program) = filter {
            capture.filter(program, true)?;
        }

        Ok(Source::Live(capture))
    }

    pub fn open_offline(path: &str, filter: Option<&str>) -> anyhow::Result<Self> {
        let mut capture = Capture::from_file(path)?;
        if let Some(program) = filter {
            capture.filter(program, true)?;
        }
        Ok(Source::Offline(capture))
    }

    /// Blocks for the next packet, parses it down to a TCP segment, and
    /// returns `None` once the source is exhausted (offline files only;
    /// live captures loop until an I/O error).
    pub fn next_segment(&mut self) -> anyhow::Result<Option<TcpSegment>> {
        loop {
            let packet = match self {
                Source::Live(cap) => cap.next_packet(),
                Source::Offline(cap) => cap.next_packet(),
            };

            let packet = match packet {
                Ok(packet) => packet,
                Err(pcap::Error::NoMorePackets) => return Ok(None),
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(err) => return Err(err.into()),
            };

            match parse_tcp_segment(packet.data) {
                Some(segment) => return Ok(Some(segment)),
                None => continue,
            }
        }
    }
}

/// Lists capture device names for `--list-interfaces`.
pub fn list_interfaces() -> anyhow::Result<Vec<String>> {
    Ok(Device::list()?.into_iter().map(|d| d.name).collect())
}

fn parse_tcp_segment(data: &[u8]) -> Option<TcpSegment> {
    let headers = match PacketHeaders::from_ethernet_slice(data) {
        Ok(headers) => headers,
        Err(err) => {
            debug!("discarding unparsable packet: {err}");
            return None;
        }
    };

    let (src_addr, dst_addr) = match headers.ip? {
        IpHeader::Version4(ipv4, _) => (
            Ipv4Addr::from(ipv4.source),
            Ipv4Addr::from(ipv4.destination),
        ),
        IpHeader::Version6(_, _) => {
            debug!("discarding IPv6 packet: only IPv4 is supported");
            return None;
        }
    };

    let tcp = match headers.transport? {
        TransportHeader::Tcp(tcp) => tcp,
        _ => return None,
    };

    if tcp.source_port != dofus_protocol::DEFAULT_PORT && tcp.destination_port != dofus_protocol::DEFAULT_PORT
    {
        return None;
    }

    if headers.payload.is_empty() && !(tcp.syn || tcp.fin || tcp.rst) {
        return None;
    }

    Some(TcpSegment {
        src_addr,
        src_port: tcp.source_port,
        dst_addr,
        dst_port: tcp.destination_port,
        sequence_number: tcp.sequence_number,
        syn: tcp.syn,
        fin: tcp.fin,
        rst: tcp.rst,
        payload: headers.payload.to_vec(),
    })
}
