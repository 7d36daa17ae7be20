//! Message ports

use std::sync::mpsc::Sender;

use crate::pdu::Pdu;

/// Outbound message port
///
/// A `MessageSink` accepts each [`Pdu`] that an upstream
/// stage publishes. There is no backpressure: `publish()`
/// cannot refuse a message, and the caller is responsible
/// for flow control.
pub trait MessageSink {
    /// Publish one message
    fn publish(&mut self, pdu: Pdu);
}

/// Inbound message port
///
/// A `MessageHandler` is invoked once per inbound message.
/// It may publish any number of messages to `out` before
/// it returns. Handlers take `&self`: they keep no state
/// between invocations.
pub trait MessageHandler {
    /// Handle one inbound message
    fn handle(&self, pdu: Pdu, out: &mut dyn MessageSink);
}

impl MessageSink for Vec<Pdu> {
    fn publish(&mut self, pdu: Pdu) {
        self.push(pdu);
    }
}

// a hung-up receiver has nobody to deliver to
impl MessageSink for Sender<Pdu> {
    fn publish(&mut self, pdu: Pdu) {
        let _ = self.send(pdu);
    }
}

impl<S> MessageSink for &mut S
where
    S: MessageSink + ?Sized,
{
    fn publish(&mut self, pdu: Pdu) {
        (**self).publish(pdu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::mpsc::channel;

    use crate::pdu::Metadata;

    #[test]
    fn test_channel_sink() {
        let (mut tx, rx) = channel();
        tx.publish(Pdu::new(Metadata::new(), vec![1]));
        assert_eq!(rx.recv().unwrap().payload(), &[1]);

        // no receiver: silently discarded
        drop(rx);
        tx.publish(Pdu::new(Metadata::new(), vec![2]));
    }

    #[test]
    fn test_borrowed_sink() {
        fn publish_to<S: MessageSink>(mut sink: S) {
            sink.publish(Pdu::new(Metadata::new(), vec![3]));
        }

        let mut out: Vec<Pdu> = Vec::new();
        publish_to(&mut out);
        publish_to(&mut out);
        assert_eq!(out.len(), 2);
    }
}
