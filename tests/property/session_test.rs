// tests/property/session_test.rs

//! Subscribe calls over a scripted broker: whatever the number of names and
//! wherever a publish lands among the replies, the call returns the count
//! carried by the last reply frame.

use crate::test_helpers::{TestContext, next_publish, publish};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24, // Each case opens a real socket
        max_shrink_iters: 100,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_subscribe_returns_last_count(
        names in prop::collection::vec("[a-z]{1,8}", 1..=8),
        base in 0i64..1000,
        publish_at in any::<prop::sample::Index>(),
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let TestContext { mut client, mut broker } = TestContext::new().await;
            let mut publishes = client.take_publishes().unwrap();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let at = publish_at.index(names.len() + 1);

            let mut expected = vec!["SUBSCRIBE"];
            expected.extend(refs.iter().copied());

            let (count, _) = tokio::join!(client.subscribe(&refs), async {
                broker.expect_command(&expected).await;
                for (i, name) in refs.iter().enumerate() {
                    if i == at {
                        broker.publish("side", "band").await;
                    }
                    broker.send_subscription_replies("subscribe", &[(name, base + i as i64 + 1)]).await;
                }
                if at == refs.len() {
                    broker.publish("side", "band").await;
                }
            });

            assert_eq!(count.unwrap(), base + names.len() as i64);
            assert_eq!(next_publish(&mut publishes).await, publish("side", "band"));
            client.close().await.unwrap();
        });
    }
}
