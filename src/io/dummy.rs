use std::sync::mpsc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};

/// An in-memory I/O implementation whose state is driven by messages
/// sent from the test that owns it.
pub trait DummyIO {
    type MessageType;
    type Config;

    fn create(config: &Self::Config) -> (Self, Sender<Self::MessageType>) where Self: Sized {
        let (sender, receiver) = mpsc::channel();
        let dummy_obj = Self::new(receiver, config);
        (dummy_obj, sender)
    }

    fn new(receiver: Receiver<Self::MessageType>, config: &Self::Config) -> Self;
}

pub fn read_all<T, F>(receiver: &Receiver<T>, mut on_value: F)
    where F: FnMut(T) {
    loop {
        match receiver.try_recv() {
            Ok(x) => on_value(x),
            // The sender going away just means no more changes.
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
}
