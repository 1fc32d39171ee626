// tests/property/classifier_test.rs

//! Push classification and publish decoding over arbitrary frames.

use bytes::Bytes;
use proptest::prelude::*;
use spinel_pubsub::Publish;
use spinel_pubsub::core::protocol::RespFrame;
use spinel_pubsub::core::pubsub::{decode_publish, is_push};

/// Arbitrary frames, biased toward arrays that start with a push tag.
pub fn arb_frame() -> impl Strategy<Value = RespFrame> {
    let leaf = prop_oneof![
        "[a-zA-Z0-9 ]{0,16}".prop_map(RespFrame::SimpleString),
        "[a-zA-Z0-9 ]{0,16}".prop_map(RespFrame::Error),
        any::<i64>().prop_map(RespFrame::Integer),
        prop::collection::vec(any::<u8>(), 0..32)
            .prop_map(|b| RespFrame::BulkString(Bytes::from(b))),
        prop_oneof![Just("message"), Just("pmessage"), Just("subscribe")]
            .prop_map(|tag: &'static str| RespFrame::bulk(tag)),
        Just(RespFrame::Null),
        Just(RespFrame::NullArray),
    ];
    leaf.prop_recursive(3, 32, 5, |inner| {
        prop::collection::vec(inner, 0..5).prop_map(RespFrame::Array)
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_is_push_matches_tag_and_length(frame in arb_frame()) {
        let expected = match &frame {
            RespFrame::Array(items) if items.len() >= 3 => {
                matches!(items[0].as_str(), Some("message") | Some("pmessage"))
            }
            _ => false,
        };
        prop_assert_eq!(is_push(&frame), expected);
    }

    #[test]
    fn test_decoded_publish_is_always_a_push(frame in arb_frame()) {
        if decode_publish(&frame).is_some() {
            prop_assert!(is_push(&frame));
        }
    }

    #[test]
    fn test_decode_recovers_channel_and_payload(
        channel in "[a-z0-9.:_-]{1,24}",
        message in ".{0,64}",
        pattern in prop::option::of("[a-z*?.]{1,12}"),
    ) {
        let mut items = vec![];
        match &pattern {
            Some(p) => {
                items.push(RespFrame::bulk("pmessage"));
                items.push(RespFrame::bulk(p.clone()));
            }
            None => items.push(RespFrame::bulk("message")),
        }
        items.push(RespFrame::bulk(channel.clone()));
        items.push(RespFrame::bulk(message.clone()));

        prop_assert_eq!(
            decode_publish(&RespFrame::Array(items)),
            Some(Publish::new(channel, message))
        );
    }
}
