//! Owned handles to supervised processes.

use std::io;

use async_trait::async_trait;
use tokio::process::Child;

use crate::types::Pid;

/// A live process the registry can terminate.
///
/// The registry owns the handle for the whole time a service is tracked.
/// Because the child is never reaped before it is killed, its pid stays
/// reserved by the kernel and cannot be handed to an unrelated process.
#[async_trait]
pub trait ServiceHandle: Send + 'static {
    /// OS pid, if the process is still known to the OS.
    fn pid(&self) -> Option<Pid>;

    /// Force the process to exit (SIGKILL on Unix) and reap it.
    ///
    /// Returns `Ok` when the process is confirmed gone, including when it
    /// had already exited on its own.
    async fn terminate(&mut self) -> io::Result<()>;
}

#[async_trait]
impl ServiceHandle for Child {
    fn pid(&self) -> Option<Pid> {
        self.id()
    }

    async fn terminate(&mut self) -> io::Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }
        self.start_kill()?;
        self.wait().await?;
        Ok(())
    }
}
