//! Property-based tests for the playback controller
//!
//! Random command sequences must never leave the queue cursor and the
//! bound track out of step, including when lookups fail.

mod common;

use common::*;
use proptest::prelude::*;
use tunelane::player::events::OutputEvent;
use tunelane::player::volume::Volume;

const IDS: [&str; 5] = ["a", "b", "c", "d", "e"];
/// Only these resolve; the rest fail their lookup.
const KNOWN: &[&str] = &["a", "b", "c"];

#[derive(Debug, Clone)]
enum Op {
    Play(usize),
    PlayList(Vec<usize>, usize),
    Next,
    Previous,
    Queue(usize),
    PlayNext(usize),
    Remove(usize),
    Clear,
    PlayAt(usize),
    Ended,
    Pause,
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..IDS.len()).prop_map(Op::Play),
        (prop::collection::vec(0..IDS.len(), 0..6), 0usize..6)
            .prop_map(|(ids, start)| Op::PlayList(ids, start)),
        Just(Op::Next),
        Just(Op::Previous),
        (0..IDS.len()).prop_map(Op::Queue),
        (0..IDS.len()).prop_map(Op::PlayNext),
        (0usize..8).prop_map(Op::Remove),
        Just(Op::Clear),
        (0usize..8).prop_map(Op::PlayAt),
        Just(Op::Ended),
        Just(Op::Pause),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    /// Property: the cursor stays in range and points at the bound track
    #[test]
    fn queue_cursor_tracks_current_song(ops in prop::collection::vec(arbitrary_op(), 1..40)) {
        runtime().block_on(async move {
            let h = Harness::new(StaticLookup::with(KNOWN));
            let c = &h.controller;

            for op in ops {
                let before = c.snapshot();
                let result = match op.clone() {
                    Op::Play(i) => c.play(track(IDS[i])).await,
                    Op::PlayList(ids, start) => {
                        let list = ids.iter().map(|&i| track(IDS[i])).collect();
                        c.play_list_from(list, start).await
                    }
                    Op::Next => c.play_next_song().await,
                    Op::Previous => c.play_previous_song().await,
                    Op::Queue(i) => c.queue_track(track(IDS[i])).await,
                    Op::PlayNext(i) => c.play_track_next(track(IDS[i])).await,
                    Op::Remove(i) => c.remove_from_queue(i).await,
                    Op::Clear => c.clear_queue().await,
                    Op::PlayAt(i) => c.play_at_index(i).await,
                    Op::Ended => c.handle_output_event(OutputEvent::Ended).await,
                    Op::Pause => c.pause().await,
                };

                let state = c.snapshot();
                if result.is_err() {
                    prop_assert_eq!(&state.queue, &before.queue, "failed {:?} edited the queue", op);
                    prop_assert_eq!(state.queue_index, before.queue_index, "failed {:?} moved the cursor", op);
                    prop_assert_eq!(state.current_id(), before.current_id(), "failed {:?} rebound", op);
                }
                if state.queue.is_empty() {
                    prop_assert_eq!(state.queue_index, 0, "cursor moved on empty queue after {:?}", op);
                } else {
                    prop_assert!(
                        state.queue_index < state.queue.len(),
                        "cursor {} out of range {} after {:?}",
                        state.queue_index,
                        state.queue.len(),
                        op
                    );
                }
                if let Some(current) = &state.current_track {
                    let under_cursor = state.queue.get(state.queue_index).map(|t| t.id.as_str());
                    prop_assert_eq!(
                        under_cursor,
                        Some(current.id.as_str()),
                        "cursor left the bound track after {:?}",
                        op
                    );
                    prop_assert!(!state.is_loading());
                }
            }
            Ok(())
        })?;
    }

    /// Property: volume never leaves [0, 1] and muting never changes the level
    #[test]
    fn volume_stays_in_range(
        levels in prop::collection::vec(-2.0f32..3.0, 1..20),
        mutes in prop::collection::vec(any::<bool>(), 1..20)
    ) {
        let mut volume = Volume::default();
        for (level, mute) in levels.into_iter().zip(mutes) {
            volume.set_level(level);
            prop_assert!((0.0..=1.0).contains(&volume.level()));
            prop_assert!(!volume.is_muted());

            let before = volume.level();
            volume.set_muted(mute);
            prop_assert_eq!(volume.level(), before);
            prop_assert_eq!(volume.gain() == 0.0, mute || before == 0.0);
        }
    }
}
