use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

/// Bounded, fire-and-forget progress stream. Updates are dropped when the
/// buffer is full or the receiver is gone; publishing never blocks.
#[derive(Debug, Clone)]
pub struct ProgressChannel {
    sender: SyncSender<f64>,
}

impl ProgressChannel {
    pub fn bounded(capacity: usize) -> (Self, Receiver<f64>) {
        let (sender, receiver) = sync_channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn publish(&self, fraction: f64) {
        let _ = self.sender.try_send(fraction.clamp(0.0, 1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::ProgressChannel;

    #[test]
    fn full_buffer_drops_instead_of_blocking() {
        let (channel, receiver) = ProgressChannel::bounded(2);
        for i in 0..10 {
            channel.publish(i as f64 / 10.0);
        }
        let received: Vec<f64> = receiver.try_iter().collect();
        assert_eq!(received, vec![0.0, 0.1]);
    }

    #[test]
    fn publishing_after_receiver_drop_is_harmless() {
        let (channel, receiver) = ProgressChannel::bounded(1);
        drop(receiver);
        channel.publish(0.5);
    }
}
