//! Tokenizer running on its own thread, feeding a bounded queue.

use crossbeam_channel::{Receiver, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::lexer::Tokenizer;
use super::token::Token;

/// Receiving end of a tokenizer thread.
///
/// The producer blocks while the queue is full. Dropping the stream raises
/// the stop signal and disconnects the queue, so the producer exits on its
/// own even when nobody drains it.
pub struct TokenStream {
    receiver: Receiver<Token>,
    stop: Arc<AtomicBool>,
}

impl TokenStream {
    pub fn spawn(input: &str, capacity: usize) -> Self {
        let (tx, rx) = bounded::<Token>(capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let tokenizer = Tokenizer::new(input).with_stop_signal(Arc::clone(&stop));

        std::thread::spawn(move || {
            for token in tokenizer {
                if tx.send(token).is_err() {
                    tracing::trace!("Tokenizer: receiver gone, stopping");
                    break;
                }
            }
        });

        Self { receiver: rx, stop }
    }

    /// Ask the producer to stop at its next state transition.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Iterator for TokenStream {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        self.receiver.recv().ok()
    }
}

impl Drop for TokenStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::lexer::tokenize;
    use crate::dsl::token::TokenKind;

    #[test]
    fn test_threaded_matches_inline() {
        let input = "(test == 1 || test > 5) && test >= 19";
        let threaded: Vec<Token> = TokenStream::spawn(input, 10).collect();
        let inline: Vec<Token> = tokenize(input).collect();
        assert_eq!(threaded, inline);
    }

    #[test]
    fn test_small_queue_preserves_order() {
        let input = "a == 1 && b == 2 && c == 3 && d == 4 && e == 5";
        let threaded: Vec<Token> = TokenStream::spawn(input, 1).collect();
        assert_eq!(threaded, tokenize(input).collect::<Vec<_>>());
    }

    #[test]
    fn test_abandoned_stream_does_not_block() {
        let input = "a == 1 && ".repeat(200) + "z == 1";
        let mut stream = TokenStream::spawn(&input, 2);
        assert_eq!(stream.next().unwrap().kind, TokenKind::Entry);
        stream.stop();
        drop(stream);
    }
}
