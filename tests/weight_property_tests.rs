// Property-Based Testing for Weight Capture Invariants
// Exercises the keypad arithmetic and confirm gates under all conditions

use proptest::prelude::*;

use fieldshield::{Asset, CaptureError, CaptureEvent, CaptureSession, Weight, WeightStep};

fn step_strategy() -> impl Strategy<Value = WeightStep> {
    prop_oneof![
        Just(WeightStep::PlusTen),
        Just(WeightStep::PlusOne),
        Just(WeightStep::PlusTenth),
        Just(WeightStep::MinusTen),
        Just(WeightStep::MinusOne),
        Just(WeightStep::MinusTenth),
    ]
}

/// Drive the active weight to an exact number of tenths with keypad steps.
fn dial(session: &mut CaptureSession, mut tenths: u32) {
    session.handle_event(CaptureEvent::ClearWeight).unwrap();
    while tenths >= 100 {
        session
            .handle_event(CaptureEvent::Adjust {
                step: WeightStep::PlusTen,
            })
            .unwrap();
        tenths -= 100;
    }
    while tenths >= 10 {
        session
            .handle_event(CaptureEvent::Adjust {
                step: WeightStep::PlusOne,
            })
            .unwrap();
        tenths -= 10;
    }
    while tenths > 0 {
        session
            .handle_event(CaptureEvent::Adjust {
                step: WeightStep::PlusTenth,
            })
            .unwrap();
        tenths -= 1;
    }
}

fn session_at_start_weight() -> CaptureSession {
    let mut session = CaptureSession::new();
    session
        .handle_event(CaptureEvent::AssetResolved {
            asset: Asset::placeholder(),
        })
        .unwrap();
    session
}

proptest! {
    /// The displayed weight never goes negative, no matter how many
    /// decrements are issued; it tracks a clamped-at-zero model exactly.
    #[test]
    fn prop_weight_clamps_at_zero(steps in proptest::collection::vec(step_strategy(), 0..64)) {
        let mut weight = Weight::ZERO;
        let mut model: i64 = 0;

        for step in steps {
            weight = weight.apply(step);
            model = (model + i64::from(step.delta_tenths())).max(0);

            prop_assert_eq!(i64::from(weight.tenths()), model);
            prop_assert!(weight.as_lbs() >= 0.0);
        }
    }

    /// For every confirmable pair, the frozen delta equals the weight
    /// difference at one fractional digit and is never negative.
    #[test]
    fn prop_confirmed_delta_matches_difference(
        (start_tenths, end_tenths) in (1u32..=2000).prop_flat_map(|s| (Just(s), 0..=s))
    ) {
        let mut session = session_at_start_weight();

        dial(&mut session, start_tenths);
        session.handle_event(CaptureEvent::ConfirmWeight).unwrap();

        dial(&mut session, end_tenths);
        session.handle_event(CaptureEvent::ConfirmWeight).unwrap();

        let delta = session.delta().unwrap();
        prop_assert_eq!(delta, Weight::from_tenths(start_tenths - end_tenths));
        prop_assert!(delta.as_lbs() >= 0.0);
    }

    /// An ending weight above the starting weight is always rejected and
    /// the session holds its phase.
    #[test]
    fn prop_end_above_start_always_rejected(
        start_tenths in 1u32..=500,
        excess_tenths in 1u32..=100,
    ) {
        let mut session = session_at_start_weight();

        dial(&mut session, start_tenths);
        session.handle_event(CaptureEvent::ConfirmWeight).unwrap();

        dial(&mut session, start_tenths + excess_tenths);
        let result = session.handle_event(CaptureEvent::ConfirmWeight);

        let is_invalid_weight = matches!(result, Err(CaptureError::InvalidWeight { .. }));
        prop_assert!(is_invalid_weight);
        prop_assert_eq!(session.phase().name(), "EndWeight");
    }
}
