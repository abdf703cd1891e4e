use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use spoticheck_core::protocol::{GatewayMessage, OutboundMessage};
use spoticheck_core::GatewayError;

use crate::connection::Connection;

type Inbound = Result<Option<GatewayMessage>, GatewayError>;

/// Scripted connection. Receiving past the end of the script closes it.
#[derive(Default)]
pub(crate) struct FakeConnection {
    inbound: Mutex<VecDeque<Inbound>>,
    sent: Mutex<Vec<OutboundMessage>>,
    closed: AtomicBool,
    failing_sends: AtomicUsize,
}

impl FakeConnection {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&self, item: Inbound) {
        self.inbound.lock().push_back(item);
    }

    pub(crate) fn push_message(&self, message: GatewayMessage) {
        self.push(Ok(Some(message)));
    }

    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().clone()
    }

    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Make the next `n` sends fail without closing.
    pub(crate) fn fail_sends(&self, n: usize) {
        self.failing_sends.store(n, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn receive(&self) -> Result<Option<GatewayMessage>, GatewayError> {
        match self.inbound.lock().pop_front() {
            Some(item) => item,
            None => {
                self.close();
                Err(GatewayError::Closed)
            }
        }
    }

    async fn send(&self, message: &OutboundMessage) -> Result<(), GatewayError> {
        if !self.is_open() {
            return Err(GatewayError::Closed);
        }
        let failing = self.failing_sends.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_sends.store(failing - 1, Ordering::SeqCst);
            return Err(GatewayError::Connection("write failed".into()));
        }
        self.sent.lock().push(message.clone());
        Ok(())
    }

    fn is_open(&self) -> bool {
        !self.closed.load(Ordering::SeqCst)
    }
}
