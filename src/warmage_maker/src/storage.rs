use crate::event::Event;

/// Append-only log of CBOR-encoded events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventLog {
    entries: Vec<Vec<u8>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: &Event) {
        self.entries.push(encode_event(event));
    }

    pub fn len(&self) -> u64 {
        self.entries.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decodes `length` events starting at index `start`.
    pub fn events(&self, start: u64, length: u64) -> Vec<Event> {
        self.entries
            .iter()
            .skip(start as usize)
            .take(length as usize)
            .map(|bytes| decode_event(bytes))
            .collect()
    }

    pub fn all_events(&self) -> Vec<Event> {
        self.events(0, self.len())
    }
}

fn encode_event(event: &Event) -> Vec<u8> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(event, &mut buf).expect("bug: failed to encode a maker event");
    buf
}

fn decode_event(buf: &[u8]) -> Event {
    ciborium::de::from_reader(buf).expect("bug: failed to decode a maker event")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numeric::{Coin, Ratio};
    use candid::Principal;
    use rust_decimal_macros::dec;

    #[test]
    fn should_decode_recorded_events_in_order() {
        let mut log = EventLog::new();
        let sender = Principal::from_slice(&[7]);
        let mint = Event::MintBySwap {
            sender,
            receiver: sender,
            coin_in: vec![Coin::new("uusdc", 50), Coin::new("amage", 25)],
            coin_out: Coin::new("uusw", 100),
            fee: Coin::zero("uusw"),
        };
        let adjust = Event::AdjustBackingRatio {
            backing_ratio: Ratio::new(dec!(0.85)),
            block_height: 12,
        };
        log.record(&mint);
        log.record(&adjust);

        assert_eq!(log.len(), 2);
        assert_eq!(log.all_events(), vec![mint, adjust.clone()]);
        assert_eq!(log.events(1, 10), vec![adjust]);
    }
}
