//! Pretty-prints decoded messages to stdout: a timestamped, coloured
//! header line followed by the value tree, mirroring the teacher's
//! `patrace` dump format.

use std::sync::mpsc::Receiver;

use chrono::Utc;
use console::{measure_text_width, style};

use dofus_protocol::Decoded;

/// Runs on its own thread, printing every decoded message received until
/// the channel closes.
pub fn run(rx: Receiver<Decoded>) {
    for decoded in rx {
        let header = format!(
            "{} {}",
            style(Utc::now().to_rfc3339()).dim(),
            style(&decoded.name).bold().cyan(),
        );

        println!(
            "{}\n{}\n{}",
            header,
            "-".repeat(measure_text_width(&header)),
            style(format!("{:#?}", decoded.value)).dim(),
        );

        if decoded.trailing_bytes != 0 {
            println!(
                "{}",
                style(format!(
                    "  ({} trailing bytes not consumed by the schema)",
                    decoded.trailing_bytes
                ))
                .yellow()
            );
        }
    }
}
