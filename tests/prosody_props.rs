use proptest::prelude::*;
use tts_studio::prosody::{self, Prosody};

proptest! {
    #[test]
    fn neural_rate_keeps_value_and_sign(v in -50i32..=50) {
        let rate = prosody::neural(&Prosody::new(v, 0, 0)).rate;
        let expected_sign = if v >= 0 { '+' } else { '-' };
        prop_assert!(rate.starts_with(expected_sign));
        prop_assert!(rate.ends_with('%'));
        let number: i32 = rate.trim_end_matches('%').parse().unwrap();
        prop_assert_eq!(number, v);
    }

    #[test]
    fn neural_volume_and_pitch_keep_value(v in -50i32..=50, p in -12i32..=12) {
        let mapped = prosody::neural(&Prosody::new(0, p, v));
        prop_assert_eq!(mapped.volume.trim_end_matches('%').parse::<i32>().unwrap(), v);
        prop_assert_eq!(mapped.pitch.trim_end_matches("Hz").parse::<i32>().unwrap(), p);
    }

    #[test]
    fn espeak_rate_is_clamped_linear(v in -50i32..=50) {
        let expected = (200 + 4 * v).clamp(50, 400) as u32;
        prop_assert_eq!(prosody::espeak_rate(v), expected);
    }

    #[test]
    fn espeak_volume_is_unit_interval(v in -50i32..=50) {
        let volume = prosody::espeak_volume(v);
        let expected = ((v + 50) as f32 / 100.0).clamp(0.0, 1.0);
        prop_assert!((volume - expected).abs() < f32::EPSILON);
        prop_assert!((0.0..=1.0).contains(&volume));
    }

    #[test]
    fn espeak_ignores_pitch(
        rate in -50i32..=50,
        volume in -50i32..=50,
        a in -12i32..=12,
        b in -12i32..=12
    ) {
        prop_assert_eq!(
            prosody::espeak(&Prosody::new(rate, a, volume)),
            prosody::espeak(&Prosody::new(rate, b, volume))
        );
    }
}
