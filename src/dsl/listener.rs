//! Best-effort token fan-out to external observers.
//!
//! Delivery is lossy: a token offered to a full or disconnected sink is
//! dropped, so a slow observer never stalls parsing.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};

use super::token::Token;

/// A sink that is offered every token the parser observes.
#[derive(Debug, Clone)]
pub struct TokenListener {
    sender: Sender<Token>,
}

impl TokenListener {
    /// A listener buffering up to `capacity` tokens, and its receiving end.
    pub fn bounded(capacity: usize) -> (Self, Receiver<Token>) {
        let (sender, receiver) = bounded(capacity);
        (Self { sender }, receiver)
    }

    /// Wrap an existing sender, bounded or not.
    pub fn from_sender(sender: Sender<Token>) -> Self {
        Self { sender }
    }

    /// Offer a token without blocking. Returns false when it was dropped.
    pub fn offer(&self, token: &Token) -> bool {
        match self.sender.try_send(token.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                tracing::debug!("Listener full, dropping token: {}", dropped);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}
