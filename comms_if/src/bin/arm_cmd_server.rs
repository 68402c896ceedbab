//! Ground-side angle command server
//!
//! Listens for the arm to connect, then sends one angle command for every line typed on stdin.
//! Each line must contain one integer angle per joint, e.g. `120 200`.

use std::{
    io::{self, BufRead},
    net::TcpListener,
};

use comms_if::{
    eqpt::arm::AngleCommand,
    net::{write_command, WireFormat},
};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "arm_cmd_server", about = "Send angle commands to the arm")]
struct Opts {
    /// Port to listen on
    #[structopt(short, long, default_value = "3000")]
    port: u16,

    /// Wire format to send commands in (raw or json)
    #[structopt(short, long, default_value = "raw")]
    format: WireFormat,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let opts = Opts::from_args();

    let listener = TcpListener::bind(("0.0.0.0", opts.port))?;

    println!("Server running on port {}, sending {:?} frames", opts.port, opts.format);

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        println!("Waiting for the arm to connect...");
        let (mut stream, addr) = listener.accept()?;
        stream.set_nodelay(true)?;
        println!("Connection established from {}", addr);

        loop {
            let line = match lines.next() {
                Some(l) => l?,
                None => {
                    println!("End of input, exiting");
                    return Ok(());
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            let cmd: AngleCommand = match line.parse() {
                Ok(c) => c,
                Err(e) => {
                    println!("Ignoring \"{}\": {}", line.trim(), e);
                    continue;
                }
            };

            match write_command(&mut stream, opts.format, &cmd) {
                Ok(_) => println!("[Sent] {}", cmd),
                Err(e) => {
                    println!("Arm disconnected ({}), command not sent", e);
                    break;
                }
            }
        }
    }
}
