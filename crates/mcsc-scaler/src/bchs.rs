//! YUV range conversion through the BCHS block

use mcsc_core::param::YuvRange;
use mcsc_tuning::{BchsClamp, McscSetfile, YuvRangeBase};

/// Register values of one output's BCHS block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BchsSettings {
    pub base: YuvRangeBase,
    pub clamp: BchsClamp,
}

fn default_base(range: YuvRange) -> YuvRangeBase {
    match range {
        // Y [0:255], U/V [0:255]
        YuvRange::Full => YuvRangeBase {
            y_offset: 0,
            y_gain: 256,
            c_gain00: 256,
            c_gain01: 0,
            c_gain10: 0,
            c_gain11: 256,
        },
        // Y [16:235], U/V [16:240]
        YuvRange::Narrow => YuvRangeBase {
            y_offset: 16,
            y_gain: 220,
            c_gain00: 224,
            c_gain01: 0,
            c_gain10: 0,
            c_gain11: 224,
        },
    }
}

fn default_clamp(range: YuvRange) -> BchsClamp {
    match range {
        YuvRange::Full => BchsClamp {
            y_max: 255,
            y_min: 0,
            c_max: 255,
            c_min: 0,
        },
        YuvRange::Narrow => BchsClamp {
            y_max: 235,
            y_min: 16,
            c_max: 240,
            c_min: 16,
        },
    }
}

/// Settings for `range`, taken from the tuning table when one is loaded
pub fn range_settings(range: YuvRange, setfile: Option<&McscSetfile>) -> BchsSettings {
    let idx = range.index();
    BchsSettings {
        base: setfile.map_or_else(|| default_base(range), |s| s.sc_base[idx]),
        clamp: setfile
            .and_then(|s| s.sc_bchs.as_ref())
            .map_or_else(|| default_clamp(range), |c| c[idx]),
    }
}
