//! Contract for the external subprocess facility hosting a peer.
//!
//! The core consumes this interface but never implements it: spawn and
//! wait plumbing belongs to the host. The only assumption made here is
//! that the child's standard pipes are byte-oriented and, as a pair,
//! bidirectional.

use std::io::{Read, Write};

use crate::channel::{Channel, ChannelConfig};
use crate::error::Result;

use xen_transport::Stream;

/// A facility able to spawn peer processes with piped standard streams.
pub trait SubprocessPort {
    /// Handle to a spawned child process.
    type Child: ChildProcess;

    /// Spawn `program` with `args`, stdin writable and stdout/stderr
    /// readable from this process.
    fn spawn(&mut self, program: &str, args: &[String]) -> std::io::Result<Self::Child>;
}

/// A spawned peer process and its three standard pipes.
pub trait ChildProcess {
    /// Operating-system process id.
    fn pid(&self) -> u32;

    /// Take ownership of the standard pipes, once.
    ///
    /// Returns `None` if they were already taken.
    fn take_pipes(&mut self) -> Option<ChildPipes>;

    /// Deliver a signal to the child.
    fn signal(&mut self, signal: i32) -> std::io::Result<()>;

    /// Non-blocking wait; `Some(code)` once the child has exited.
    fn try_wait(&mut self) -> std::io::Result<Option<i32>>;

    /// Force-kill the child.
    fn kill(&mut self) -> std::io::Result<()>;
}

/// The writable stdin and readable stdout/stderr of a child.
pub struct ChildPipes {
    pub stdin: Box<dyn Write + Send>,
    pub stdout: Box<dyn Read + Send>,
    pub stderr: Box<dyn Read + Send>,
}

/// Build a channel over a child's stdin/stdout pipe pair.
///
/// stderr stays with the caller for diagnostics. Returns `None` when the
/// pipes were already taken.
pub fn channel_for<C: ChildProcess>(
    child: &mut C,
    config: ChannelConfig,
) -> Result<Option<(Channel, Box<dyn Read + Send>)>> {
    let Some(pipes) = child.take_pipes() else {
        return Ok(None);
    };
    let stream = Stream::from_pipes(pipes.stdout, pipes.stdin);
    let channel = Channel::with_config(stream, config)?;
    Ok(Some((channel, pipes.stderr)))
}
