//! Tests for two-stage scaling decisions across outputs

use mcsc_core::{OutputId, Rect};
use mcsc_scaler::djag::DjagLimits;
use mcsc_scaler::{plan_djag, plan_poly, plan_post, ScaleLimits, RATIO_ONE};

#[test]
fn test_identity_sizes_bypass_post_chain() {
    let limits = ScaleLimits::default();
    for (w, h) in [(16, 16), (640, 480), (1920, 1080), (4032, 3024), (8192, 8192)] {
        for out in OutputId::all() {
            let poly = plan_poly(out, Rect::full(w, h), w, h, &limits, false).unwrap();
            assert!(!poly.post_en, "{} {}x{}", out, w, h);
            assert_eq!(poly.h_ratio, RATIO_ONE);
            assert_eq!(poly.v_ratio, RATIO_ONE);

            let post = plan_post(poly.dst_width, poly.dst_height, w, h).unwrap();
            assert!(!post.enable);
        }
    }
}

#[test]
fn test_capture_with_preview_thumbnail() {
    let limits = ScaleLimits::default();
    let crop = Rect::new(16, 12, 4000, 3000);

    let full = plan_poly(OutputId::new(0), crop, 4000, 3000, &limits, false).unwrap();
    assert!(!full.post_en);
    assert_eq!(full.h_ratio, RATIO_ONE);

    let thumb = plan_poly(OutputId::new(1), crop, 640, 480, &limits, false).unwrap();
    assert!(thumb.post_en);
    assert!(!thumb.unsupported);
    assert_eq!((thumb.dst_width, thumb.dst_height), (1000, 750));
    assert_eq!(thumb.src, crop);

    let post = plan_post(thumb.dst_width, thumb.dst_height, 640, 480).unwrap();
    assert!(post.enable);
    assert_eq!(post.h_ratio, ((1000u64 << 20) / 640) as u32);
    assert_eq!(post.v_ratio, ((750u64 << 20) / 480) as u32);
}

#[test]
fn test_planning_is_idempotent() {
    let limits = ScaleLimits::default();
    let crop = Rect::new(0, 0, 3968, 2976);
    for (w, h) in [(1920, 1080), (600, 450), (320, 240), (4000, 3000)] {
        let a = plan_poly(OutputId::new(2), crop, w, h, &limits, true).unwrap();
        let b = plan_poly(OutputId::new(2), crop, w, h, &limits, true).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            plan_post(a.dst_width, a.dst_height, w, h).unwrap(),
            plan_post(b.dst_width, b.dst_height, w, h).unwrap()
        );
    }
}

#[test]
fn test_djag_feeds_poly_source() {
    let djag = plan_djag(1920, 1080, 3840, 2160, &DjagLimits::default());
    assert!(djag.enabled);
    assert_eq!((djag.output_width, djag.output_height), (3840, 2160));

    let crop = djag.remap_crop(Rect::new(0, 0, 1920, 1080));
    assert_eq!(crop, Rect::full(3840, 2160));

    let poly = plan_poly(OutputId::new(0), crop, 3840, 2160, &ScaleLimits::default(), false).unwrap();
    assert!(!poly.post_en);
}
