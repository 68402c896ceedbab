//! # Command Source
//!
//! TCP client which receives [`AngleCommand`]s from the command server and publishes them into
//! the arm's mailbox.
//!
//! The source never gives up: if the server can't be reached, or the connection drops, it waits
//! for the reconnect delay and tries again. Malformed frames are dropped and never published.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::arm::AngleCommand,
    net::{FrameReader, ReadError, WireFormat},
};
use log::{debug, info, warn};
use std::{
    io::{self, Read},
    net::TcpStream,
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{mailbox::Publisher, params::ArmExecParams};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Name of the command source thread.
pub const THREAD_NAME: &str = "cmd_source";

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Network producer of angle commands.
pub struct TcpCmdSource {
    address: String,

    format: WireFormat,

    reconnect_delay: Duration,

    publisher: Publisher<AngleCommand>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum CmdSourceError {
    #[error("Could not connect to the command server at {0}: {1}")]
    ConnectError(String, io::Error),

    #[error("Could not spawn the command source thread: {0}")]
    SpawnError(io::Error),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl TcpCmdSource {
    /// Create a new command source publishing into `publisher`.
    ///
    /// No connection is made until the source is run.
    pub fn new(params: &ArmExecParams, publisher: Publisher<AngleCommand>) -> Self {
        Self {
            address: params.cmd_server_address.clone(),
            format: params.wire_format,
            reconnect_delay: Duration::from_millis(params.reconnect_ms),
            publisher,
        }
    }

    /// Run the source in its own thread.
    pub fn spawn(self) -> Result<JoinHandle<()>, CmdSourceError> {
        thread::Builder::new()
            .name(THREAD_NAME.into())
            .spawn(move || self.run())
            .map_err(CmdSourceError::SpawnError)
    }

    /// Connect, receive and reconnect forever.
    pub fn run(&self) -> ! {
        loop {
            match self.connect() {
                Ok(stream) => {
                    info!("Connected to the command server at {}", self.address);

                    match self.serve(stream) {
                        ReadError::Closed => info!("Command server closed the connection"),
                        e => warn!("Lost connection to the command server: {}", e),
                    }
                }
                Err(e) => debug!("{}", e),
            }

            thread::sleep(self.reconnect_delay);
        }
    }

    /// Open a connection to the command server.
    pub fn connect(&self) -> Result<TcpStream, CmdSourceError> {
        let stream = TcpStream::connect(&self.address)
            .map_err(|e| CmdSourceError::ConnectError(self.address.clone(), e))?;

        // Frames are tiny, don't hold them back
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Could not disable Nagle's algorithm on the command stream: {}", e);
        }

        Ok(stream)
    }

    /// Publish every valid command read from `stream` until the stream fails.
    ///
    /// Returns the error which ended the stream.
    pub fn serve<R: Read>(&self, stream: R) -> ReadError {
        let mut reader = FrameReader::new(stream, self.format);

        loop {
            match reader.read_command() {
                Ok(cmd) => {
                    debug!("Received {}", cmd);

                    if let Some(stale) = self.publisher.publish(cmd) {
                        debug!("Superseded unconsumed command {}", stale);
                    }
                }
                Err(e) if e.is_fatal() => return e,
                Err(e) => warn!("Dropping frame: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mailbox::mailbox, params::DriverKind};
    use comms_if::net::write_command;
    use std::{io::Cursor, net::TcpListener};

    fn params(address: String, format: WireFormat) -> ArmExecParams {
        ArmExecParams {
            cmd_server_address: address,
            wire_format: format,
            reconnect_ms: 10,
            take_timeout_ms: 10,
            idle_report_cycles: 0,
            driver: DriverKind::Sim,
            pca9685_address: 0x40,
            log_writes: false,
        }
    }

    #[test]
    fn serve_publishes_only_latest() {
        let (tx, mut rx) = mailbox();
        let source = TcpCmdSource::new(&params(String::new(), WireFormat::Raw), tx);

        let mut bytes = Vec::new();
        write_command(&mut bytes, WireFormat::Raw, &AngleCommand::new([1, 2])).unwrap();
        write_command(&mut bytes, WireFormat::Raw, &AngleCommand::new([3, 4])).unwrap();

        assert!(matches!(source.serve(Cursor::new(bytes)), ReadError::Closed));
        assert_eq!(rx.try_take(), Some(AngleCommand::new([3, 4])));
        assert_eq!(rx.try_take(), None);
    }

    #[test]
    fn serve_drops_malformed_frames() {
        let (tx, mut rx) = mailbox();
        let source = TcpCmdSource::new(&params(String::new(), WireFormat::Json), tx);

        let text = "{\"axe_0\": 10, \"axe_1\": 20}\n{\"axe_0\": 99}\n";
        assert!(matches!(source.serve(Cursor::new(text)), ReadError::Closed));

        // The incomplete second frame never reached the mailbox
        assert_eq!(rx.try_take(), Some(AngleCommand::new([10, 20])));
        assert_eq!(rx.try_take(), None);
    }

    #[test]
    fn connect_error_when_no_server() {
        // Bind then drop to get a port nobody is listening on
        let address = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().to_string()
        };

        let (tx, _rx) = mailbox();
        let source = TcpCmdSource::new(&params(address, WireFormat::Raw), tx);
        assert!(matches!(
            source.connect(),
            Err(CmdSourceError::ConnectError(_, _))
        ));
    }

    #[test]
    fn connect_disables_nagle() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let (tx, _rx) = mailbox();
        let source = TcpCmdSource::new(&params(address, WireFormat::Raw), tx);

        let stream = source.connect().unwrap();
        assert!(stream.nodelay().unwrap());
    }

    #[test]
    fn receives_over_tcp_and_reconnects() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let (tx, mut rx) = mailbox();
        TcpCmdSource::new(&params(address, WireFormat::Raw), tx)
            .spawn()
            .unwrap();

        // First connection
        let (mut stream, _) = listener.accept().unwrap();
        write_command(&mut stream, WireFormat::Raw, &AngleCommand::new([120, 200])).unwrap();
        assert_eq!(
            rx.take_wait(Duration::from_secs(5)),
            Some(AngleCommand::new([120, 200]))
        );
        drop(stream);

        // The source reconnects after the server drops it
        let (mut stream, _) = listener.accept().unwrap();
        write_command(&mut stream, WireFormat::Raw, &AngleCommand::new([5, 90])).unwrap();
        assert_eq!(
            rx.take_wait(Duration::from_secs(5)),
            Some(AngleCommand::new([5, 90]))
        );
    }
}
