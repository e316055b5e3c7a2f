//! Tests for noise-index interpolation across the tuning tables

use mcsc_tuning::cac::{CacCrtThr, CacMapThr};
use mcsc_tuning::interp::{find_bracket, resolve, Bracket, Lerp, NI_MULTIPLIER};
use mcsc_tuning::tdnr::{TdnrNiFactors, TdnrTuneset};
use mcsc_tuning::{
    select_mode, CacFactors, CacTuner, CacTuneset, ModeInputs, TdnrMode, TdnrTuner, TdnrTuning,
};

fn cac_entry(ni: u32, thr: u32) -> CacFactors {
    CacFactors {
        noise_index: ni,
        map_thr: CacMapThr {
            spot_thr_l: thr,
            spot_thr_h: thr,
            spot_thr: thr,
            spot_nr_strength: thr,
        },
        crt_thr: CacCrtThr {
            crt_color_thr_l_dot: thr,
            crt_color_thr_l_line: thr,
            crt_color_thr_h: thr,
        },
    }
}

#[test]
fn test_values_stay_between_endpoints() {
    let table = vec![cac_entry(5, 40), cac_entry(15, 10), cac_entry(60, 90)];

    for ni in (0..800).step_by(7) {
        let cfg = resolve(&table, ni).unwrap();
        let v = cfg.map_thr.spot_thr_l;
        assert!((10..=90).contains(&v), "ni {} gave {}", ni, v);

        if let Some(Bracket { bottom, top }) = find_bracket(&[5, 15, 60], ni) {
            let a = table[bottom].map_thr.spot_thr_l;
            let b = table[top].map_thr.spot_thr_l;
            assert!(v >= a.min(b) && v <= a.max(b), "ni {} gave {} outside {}..{}", ni, v, a, b);
        }
    }
}

#[test]
fn test_reference_points_are_exact() {
    let table = vec![cac_entry(5, 40), cac_entry(15, 10), cac_entry(60, 90)];
    for entry in &table {
        let cfg = resolve(&table, entry.noise_index * NI_MULTIPLIER).unwrap();
        assert_eq!(cfg.map_thr.spot_thr, entry.map_thr.spot_thr);
    }
}

#[test]
fn test_out_of_range_clamps_flat() {
    let table = vec![cac_entry(5, 40), cac_entry(60, 90)];
    assert_eq!(resolve(&table, 0).unwrap().crt_thr.crt_color_thr_h, 40);
    assert_eq!(resolve(&table, u32::MAX).unwrap().crt_thr.crt_color_thr_h, 90);
}

#[test]
fn test_signed_interpolation_rounds_toward_floor() {
    let lerp = Lerp::new(0, 10, 33);
    // -10 + 20 * 0.33 = -3.4
    assert_eq!(lerp.value(-10, 10), -4);
    assert_eq!(lerp.value(10, -10), 3);
}

#[test]
fn test_cac_cache_skips_repeat_ni() {
    let tuneset = CacTuneset {
        cac_enable: true,
        ni_dep_factors: vec![cac_entry(5, 40), cac_entry(60, 90)],
    };
    let mut tuner = CacTuner::new();
    assert!(tuner.tune(&tuneset, 300).is_some());
    assert!(tuner.tune(&tuneset, 300).is_none());
    tuner.invalidate();
    assert!(tuner.tune(&tuneset, 300).is_some());
}

#[test]
fn test_tdnr_stream_mode_sequence() {
    let mut prev = TdnrMode::Bypass;
    let mut modes = Vec::new();
    for shot in 0..4u32 {
        let mode = select_mode(&ModeInputs {
            tuning_enabled: true,
            prev_mode: prev,
            first_shot: shot == 0,
            input_changed: shot == 2,
            ..Default::default()
        });
        modes.push(mode);
        prev = mode;
    }
    assert_eq!(
        modes,
        vec![
            TdnrMode::TwoFrame,
            TdnrMode::ThreeFrame,
            TdnrMode::TwoFrame,
            TdnrMode::ThreeFrame
        ]
    );
}

#[test]
fn test_tdnr_tuner_follows_noise() {
    let low = TdnrNiFactors {
        noise_index: 10,
        temporal_weight_luma_power_base: 0,
        ..Default::default()
    };
    let high = TdnrNiFactors {
        noise_index: 50,
        temporal_weight_luma_power_base: 256,
        ..Default::default()
    };
    let tuneset = TdnrTuneset {
        ni_dep_factors: vec![low, high],
        ..Default::default()
    };

    let mut tuner = TdnrTuner::new();
    let TdnrTuning::Apply { config: a, .. } = tuner.tune(Some(&tuneset), 100, true) else {
        panic!("expected apply");
    };
    let TdnrTuning::Apply { config: b, .. } = tuner.tune(Some(&tuneset), 300, false) else {
        panic!("expected apply");
    };
    assert_eq!(a.temporal_dep.coeff_y1, 16);
    assert_eq!(b.temporal_dep.coeff_y1, 8);
    assert_eq!(tuner.tune(Some(&tuneset), 500, false), TdnrTuning::Bypass);
}
