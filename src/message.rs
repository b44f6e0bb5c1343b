// Copyright 2020 Joyent, Inc.

//! Received messages, topic filters and how messages are printed.

use bytes::{Bytes, BytesMut};
use chrono::{DateTime, Local};
use zeromq::ZmqMessage;

/// Format used for the arrival time of timestamped lines.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Prefix matched against the topic (first frame) of published messages.
/// The empty filter matches everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicFilter(String);

impl TopicFilter {
    pub fn new<S: Into<String>>(prefix: S) -> TopicFilter {
        TopicFilter(prefix.into())
    }

    pub fn everything() -> TopicFilter {
        TopicFilter::default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, topic: &[u8]) -> bool {
        topic.starts_with(self.0.as_bytes())
    }
}

/// A message as it came off the wire, plus the local time it arrived.
#[derive(Clone, Debug)]
pub struct Message {
    frames: Vec<Bytes>,
    received_at: DateTime<Local>,
}

impl Message {
    pub fn new(frames: Vec<Bytes>, received_at: DateTime<Local>) -> Message {
        Message {
            frames,
            received_at,
        }
    }

    /// Wrap a transport message, stamping it with the current local time.
    pub fn received(msg: ZmqMessage) -> Message {
        Message::new(msg.into_vec(), Local::now())
    }

    /// The frame filters are matched against.
    pub fn topic(&self) -> &[u8] {
        self.frames.first().map(|f| f.as_ref()).unwrap_or(&[])
    }

    /// All frames joined into one payload.
    pub fn payload(&self) -> Bytes {
        if self.frames.len() == 1 {
            return self.frames[0].clone();
        }
        let len = self.frames.iter().map(Bytes::len).sum();
        let mut buf = BytesMut::with_capacity(len);
        for frame in &self.frames {
            buf.extend_from_slice(frame);
        }
        buf.freeze()
    }

    pub fn received_at(&self) -> &DateTime<Local> {
        &self.received_at
    }
}

/// How the subscriber prints each message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineFormat {
    /// `<payload>`
    Plain,
    /// `<timestamp>: <payload>`
    Timestamped,
}

impl LineFormat {
    /// Render one output line, newline included.
    pub fn render(self, msg: &Message) -> String {
        let payload = msg.payload();
        let text = String::from_utf8_lossy(&payload);
        match self {
            LineFormat::Plain => format!("{}\n", text),
            LineFormat::Timestamped => format!(
                "{}: {}\n",
                msg.received_at().format(TIMESTAMP_FORMAT),
                text
            ),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use chrono::TimeZone;
    use quickcheck::quickcheck;

    fn at_noon(frames: Vec<&'static str>) -> Message {
        let when = Local.with_ymd_and_hms(2017, 9, 14, 12, 30, 5).unwrap();
        let frames = frames
            .into_iter()
            .map(|f| Bytes::from_static(f.as_bytes()))
            .collect();
        Message::new(frames, when)
    }

    #[test]
    fn plain_line() {
        let msg = at_noon(vec!["hello world"]);
        assert_eq!(LineFormat::Plain.render(&msg), "hello world\n");
    }

    #[test]
    fn timestamped_line() {
        let msg = at_noon(vec!["hello"]);
        assert_eq!(
            LineFormat::Timestamped.render(&msg),
            "2017-09-14 12:30:05: hello\n"
        );
    }

    #[test]
    fn frames_are_joined_and_first_is_topic() {
        let msg = at_noon(vec!["weather ", "sunny"]);
        assert_eq!(msg.topic(), b"weather ");
        assert_eq!(msg.payload(), Bytes::from_static(b"weather sunny"));
    }

    #[test]
    fn filter_is_a_prefix_match() {
        let filter = TopicFilter::new("weather");
        assert!(filter.matches(b"weather 72F"));
        assert!(filter.matches(b"weather"));
        assert!(!filter.matches(b"news weather"));
        assert!(!filter.matches(b"weath"));
    }

    quickcheck! {
        fn empty_filter_matches_everything(topic: Vec<u8>) -> bool {
            TopicFilter::everything().matches(&topic)
        }

        fn filter_matches_its_own_extensions(prefix: String, rest: String) -> bool {
            let topic = format!("{}{}", prefix, rest);
            TopicFilter::new(prefix).matches(topic.as_bytes())
        }
    }
}
