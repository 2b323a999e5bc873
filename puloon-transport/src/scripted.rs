//! In-memory link replaying scripted device replies
//!
//! Every call to [`Link::read`] consumes the next queued reply, truncated to
//! the requested length. An exhausted script behaves like a silent device:
//! the read returns nothing. Bytes queued with [`ScriptedLink::push_stale`]
//! are already waiting in the input buffer: reads see them first, and
//! [`Link::clear_input`] drops them.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use parking_lot::Mutex;

use crate::{Link, error::*};

#[derive(Debug, Default)]
struct State {
    open: bool,
    reads: VecDeque<Vec<u8>>,
    stale: Vec<u8>,
    clears: usize,
    writes: Vec<Vec<u8>>,
    read_requests: Vec<(usize, Duration)>,
}

/// Scripted link for tests and simulators
///
/// Clones share the same script, so a test can keep a handle after moving
/// the link into an engine.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLink {
    state: Arc<Mutex<State>>,
}

impl ScriptedLink {
    /// Create an open link with an empty script
    pub fn new() -> Self {
        let link = Self::default();
        link.state.lock().open = true;
        link
    }

    /// Queue the reply to the next read
    pub fn push_read(&self, bytes: impl AsRef<[u8]>) -> &Self {
        self.state.lock().reads.push_back(bytes.as_ref().to_vec());
        self
    }

    /// Queue a read that times out with nothing received
    pub fn push_silence(&self) -> &Self {
        self.push_read([0u8; 0])
    }

    /// Leave bytes in the input buffer ahead of any scripted reply
    pub fn push_stale(&self, bytes: impl AsRef<[u8]>) -> &Self {
        self.state.lock().stale.extend_from_slice(bytes.as_ref());
        self
    }

    /// Number of times the input buffer was cleared
    pub fn clears(&self) -> usize {
        self.state.lock().clears
    }

    /// Everything written so far, one entry per write
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// Length and timeout of every read so far
    pub fn read_requests(&self) -> Vec<(usize, Duration)> {
        self.state.lock().read_requests.clone()
    }

    /// Replies not consumed yet
    pub fn pending_reads(&self) -> usize {
        self.state.lock().reads.len()
    }
}

#[async_trait]
impl Link for ScriptedLink {
    async fn open(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.open {
            return Err(Error::AlreadyOpen);
        }
        state.open = true;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.state.lock().open = false;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::NotOpen);
        }
        state.writes.push(data.to_vec());
        Ok(())
    }

    async fn read(&mut self, n: usize, timeout: Duration) -> Result<BytesMut> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::NotOpen);
        }
        state.read_requests.push((n, timeout));

        if !state.stale.is_empty() {
            let take = n.min(state.stale.len());
            let stale: Vec<u8> = state.stale.drain(..take).collect();
            return Ok(BytesMut::from(&stale[..]));
        }

        let mut reply = state.reads.pop_front().unwrap_or_default();
        reply.truncate(n);
        Ok(BytesMut::from(&reply[..]))
    }

    async fn clear_input(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if !state.open {
            return Err(Error::NotOpen);
        }
        state.stale.clear();
        state.clears += 1;
        Ok(())
    }

    fn name(&self) -> String {
        "scripted".to_string()
    }
}
