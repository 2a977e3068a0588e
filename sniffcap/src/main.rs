//! Captures traffic on TCP port 5555 (live or from a capture file),
//! reassembles each direction's byte stream, and dumps every decoded
//! message to stdout.
//!
//! To use it against a live interface:
//!
//!     $ sniffcap --interface eth0 --schema dofus.json
//!
//! Or replay a capture file:
//!
//!     $ sniffcap --pcap-file session.pcapng --schema dofus.json

mod capture;
mod dump;
mod reassembly;

use std::sync::mpsc::sync_channel;
use std::sync::Arc;
use std::thread;

use clap::Parser;
use dofus_protocol::Dispatcher;

use capture::Source;
use reassembly::Reassembler;

/// A passive sniffer for the game protocol carried over TCP port 5555.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Live capture device name.
    #[arg(long, value_name = "IFACE", conflicts_with = "pcap_file")]
    interface: Option<String>,

    /// Replay an existing `.pcap`/`.pcapng` file instead of a live interface.
    #[arg(long, value_name = "PATH", conflicts_with = "interface")]
    pcap_file: Option<String>,

    /// Maximum bytes captured per packet on a live interface.
    #[arg(long, default_value_t = 65535)]
    snaplen: i32,

    /// Optional BPF filter program, applied in addition to the built-in
    /// port-5555 restriction.
    #[arg(long, value_name = "EXPR")]
    filter: Option<String>,

    /// Path to the JSON protocol description to load.
    #[arg(long, value_name = "PATH")]
    schema: Option<String>,

    /// List available capture interfaces and exit.
    #[arg(long)]
    list_interfaces: bool,

    /// Increase log verbosity; repeatable (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logger(args.verbose);

    if args.list_interfaces {
        for name in capture::list_interfaces()? {
            println!("{name}");
        }
        return Ok(());
    }

    let schema_path = args
        .schema
        .ok_or_else(|| anyhow::anyhow!("--schema is required unless --list-interfaces is given"))?;

    let (messages, types) = dofus_protocol::load_from_path(&schema_path)?;
    let messages = Arc::new(messages);
    let types = Arc::new(types);

    let (dump_tx, dump_rx) = sync_channel(256);
    let mut dispatcher = Dispatcher::new();
    for schema in messages.iter() {
        dispatcher.attach(schema.name.clone(), dump_tx.clone());
    }
    let dispatcher = Arc::new(dispatcher);
    let dump_handle = thread::spawn(move || dump::run(dump_rx));
    drop(dump_tx);

    let reassembler = Reassembler::new(messages, types, Arc::clone(&dispatcher));

    let mut source = match (&args.interface, &args.pcap_file) {
        (Some(iface), None) => Source::open_live(iface, args.snaplen, args.filter.as_deref())?,
        (None, Some(path)) => Source::open_offline(path, args.filter.as_deref())?,
        _ => anyhow::bail!("exactly one of --interface or --pcap-file must be given"),
    };

    while let Some(segment) = source.next_segment()? {
        reassembler.handle_segment(segment);
    }

    // Dropping the reassembler closes every half-stream's inbound channel,
    // which lets its worker thread finish and release its `Dispatcher`
    // handle; once every handle is gone the dump sink's channel closes too.
    drop(reassembler);
    drop(dispatcher);
    let _ = dump_handle.join();

    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}
