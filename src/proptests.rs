//! Property tests for the topic lifecycle invariants

use proptest::prelude::*;
use serde_json::json;

use crate::state::{ActiveTopicState, TopicState};
use crate::testing::CountingTopic;
use crate::topic::{SubTopicRegistry, Topic, TopicCore};

const KEYS: [&str; 3] = ["alpha", "beta", "gamma"];

/// One lifecycle operation against a topic core.
#[derive(Debug, Clone)]
enum Op {
    Set(usize),
    SetUnknown,
    Read,
    Clear,
    Roundtrip,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..KEYS.len()).prop_map(Op::Set),
        Just(Op::SetUnknown),
        Just(Op::Read),
        Just(Op::Clear),
        Just(Op::Roundtrip),
    ]
}

fn registry() -> SubTopicRegistry {
    let mut reg = SubTopicRegistry::new();
    for key in KEYS {
        reg = reg.with(key, || Box::new(CountingTopic::new()) as Box<dyn Topic>);
    }
    reg
}

proptest! {
    /// `has_active_topic` tracks the slot exactly, no matter what sequence
    /// of operations runs; the slot key always names a registered factory.
    #[test]
    fn slot_invariants_hold_under_arbitrary_ops(ops in proptest::collection::vec(op_strategy(), 0..40)) {
        let mut core: TopicCore<TopicState, ()> =
            TopicCore::with_sub_topics(TopicState::new(), registry());

        for op in ops {
            match op {
                Op::Set(i) => {
                    core.set_active_topic(KEYS[i])?;
                }
                Op::SetUnknown => {
                    prop_assert!(core.set_active_topic("unregistered").is_err());
                }
                Op::Read => {
                    // Reads never fail while the slot key is registered.
                    let _ = core.active_topic()?;
                }
                Op::Clear => {
                    core.clear_active_topic();
                }
                Op::Roundtrip => {
                    let snapshot = core.dehydrate()?;
                    core.rehydrate(snapshot)?;
                }
            }

            prop_assert_eq!(
                core.has_active_topic(),
                core.state().active_topic.is_some()
            );
            if let Some(slot) = core.state().active_topic.as_ref() {
                prop_assert!(core.sub_topics().contains(&slot.key));
            }
        }
    }

    /// Dehydrate then rehydrate is state-preserving.
    #[test]
    fn dehydrate_rehydrate_preserves_state(set_first in any::<bool>(), count in 0u32..1000) {
        let mut core: TopicCore<TopicState, ()> =
            TopicCore::with_sub_topics(TopicState::new(), registry());

        if set_first {
            core.state_mut().active_topic = Some(ActiveTopicState {
                key: "alpha".to_string(),
                state: json!({ "count": count }),
            });
        }
        let before = core.state().clone();

        let snapshot = core.dehydrate()?;
        core.rehydrate(snapshot)?;

        prop_assert_eq!(core.state(), &before);
    }

    /// Clearing twice is the same as clearing once, from any starting slot.
    #[test]
    fn clear_is_idempotent_from_any_state(start in proptest::option::of(0..KEYS.len())) {
        let mut core: TopicCore<TopicState, ()> =
            TopicCore::with_sub_topics(TopicState::new(), registry());

        if let Some(i) = start {
            core.set_active_topic(KEYS[i])?;
        }

        core.clear_active_topic();
        let after_once = core.state().clone();
        core.clear_active_topic();

        prop_assert_eq!(core.state(), &after_once);
        prop_assert!(!core.has_active_topic());
    }
}
