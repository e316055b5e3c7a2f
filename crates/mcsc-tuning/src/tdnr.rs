//! Temporal/spatial denoise (TDNR) tuning
//!
//! Mode selection, ping-pong reference buffer bookkeeping and the
//! noise-index dependent tuneset. Everything here is pure; the hardware
//! crate writes the resulting [`TdnrConfig`] to registers.

use serde::{Deserialize, Serialize};

use crate::interp::{self, find_bracket, restore, Lerp, NiCache, NoiseFactors, INTERPOLATE_SHIFT};

/// Denoise operating mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum TdnrMode {
    #[default]
    Bypass = 0,
    /// Spatial only, establishes a reference frame
    TwoFrame = 1,
    /// Temporal blending against the previous output
    ThreeFrame = 2,
}

/// Refine filter mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum RefineMode {
    #[default]
    Max = 0,
    Average = 1,
    Min = 2,
}

/// Spatial weight mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u32)]
pub enum WeightMode {
    #[default]
    Min = 0,
    Max = 1,
    Average = 2,
}

/// Inputs of the per-shot mode decision
#[derive(Debug, Clone, Copy, Default)]
pub struct ModeInputs {
    /// Bypass requested by the downstream parameters
    pub bypass_requested: bool,
    /// Request synthesized by the driver
    pub internal: bool,
    /// Tuneset enables the block
    pub tuning_enabled: bool,
    pub prev_mode: TdnrMode,
    /// First shot of the group
    pub first_shot: bool,
    /// Scaler input geometry changed with this shot
    pub input_changed: bool,
}

/// Decide the operating mode of a shot
pub fn select_mode(inputs: &ModeInputs) -> TdnrMode {
    if inputs.bypass_requested || inputs.internal || !inputs.tuning_enabled {
        return TdnrMode::Bypass;
    }

    if inputs.prev_mode == TdnrMode::Bypass || inputs.first_shot || inputs.input_changed {
        TdnrMode::TwoFrame
    } else {
        TdnrMode::ThreeFrame
    }
}

/// Ping-pong reference buffers carved from one base address
pub fn buffer_pair(base: u32, width: u32, height: u32) -> [u32; 2] {
    let size = align_up(width.saturating_mul(height).saturating_mul(2), 16);
    [base, base.wrapping_add(size)]
}

/// Image buffer the denoise output goes to this shot
pub fn next_image_buffer(mode: TdnrMode, prev_wdma: u32, buffers: [u32; 2]) -> Option<u32> {
    match mode {
        TdnrMode::Bypass => None,
        TdnrMode::TwoFrame => Some(buffers[0]),
        TdnrMode::ThreeFrame => {
            if prev_wdma == buffers[0] {
                Some(buffers[1])
            } else {
                Some(buffers[0])
            }
        }
    }
}

/// Reference image size with or without YIC compression
pub fn reference_size(yic: bool, width: u32, height: u32) -> (u32, u32) {
    if yic {
        ((((width * 2 + 31) / 32) + width / 2) * 2, height / 2)
    } else {
        (width, height)
    }
}

fn align_up(value: u32, align: u32) -> u32 {
    value.div_ceil(align) * align
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralCfg {
    pub use_average_current: bool,
    pub auto_coeff_3d: bool,
    pub blending_threshold: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineCfg {
    pub is_refine_on: bool,
    pub refine_mode: RefineMode,
    pub refine_threshold: u32,
    pub refine_coeff_update: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YuvTables {
    pub x_grid_y: [i32; 3],
    pub x_grid_u: [i32; 3],
    pub x_grid_v: [i32; 3],
    pub y_std_offset: i32,
    pub u_std_offset: i32,
    pub v_std_offset: i32,
    pub y_std_slope: [i32; 4],
    pub u_std_slope: [i32; 4],
    pub v_std_slope: [i32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalDepCfg {
    pub coeff_y1: u32,
    pub coeff_y2: u32,
    pub coeff_uv1: u32,
    pub coeff_uv2: u32,
    pub auto_lut_gains_y: [u32; 3],
    pub y_offset: u32,
    pub auto_lut_gains_uv: [u32; 3],
    pub uv_offset: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalIndepCfg {
    pub prev_gridx: [u32; 3],
    pub prev_gridx_lut: [u32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalDepCfg {
    pub is_region_diff_on: bool,
    pub region_gain: u32,
    pub other_channels_check: bool,
    pub other_channel_gain: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionalIndepCfg {
    pub dont_use_region_sign: bool,
    pub diff_condition_are_all_components_similar: bool,
    pub line_condition: bool,
    pub is_motiondetect_luma_mode_mean: bool,
    pub region_offset: u32,
    pub is_motiondetect_chroma_mode_mean: bool,
    pub other_channel_offset: u32,
    pub coefficient_offset: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialDepCfg {
    pub weight_mode: WeightMode,
    pub spatial_gain: u32,
    pub spatial_separate_weights: bool,
    pub spatial_luma_gain: [u32; 4],
    pub spatial_uv_gain: [u32; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialIndepCfg {
    pub spatial_refine_threshold: u32,
    pub spatial_luma_offset: [u32; 4],
    pub spatial_uv_offset: [u32; 4],
}

/// Register-ready denoise configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdnrConfig {
    pub general: GeneralCfg,
    pub constant_lut_coeffs: [u32; 3],
    pub refine: RefineCfg,
    pub yuv_tables: YuvTables,
    pub temporal_dep: TemporalDepCfg,
    pub temporal_indep: TemporalIndepCfg,
    pub regional_dep: RegionalDepCfg,
    pub regional_indep: RegionalIndepCfg,
    pub spatial_dep: SpatialDepCfg,
    pub spatial_indep: SpatialIndepCfg,
}

impl Default for TdnrConfig {
    fn default() -> Self {
        Self {
            general: GeneralCfg {
                use_average_current: true,
                auto_coeff_3d: true,
                blending_threshold: 6,
            },
            constant_lut_coeffs: [0, 0, 0],
            refine: RefineCfg {
                is_refine_on: true,
                refine_mode: RefineMode::Max,
                refine_threshold: 12,
                refine_coeff_update: 4,
            },
            yuv_tables: YuvTables {
                x_grid_y: [57, 89, 126],
                x_grid_u: [57, 89, 126],
                x_grid_v: [57, 89, 126],
                y_std_offset: 27,
                u_std_offset: 4,
                v_std_offset: 4,
                y_std_slope: [-22, -6, -33, 31],
                u_std_slope: [36, 2, -24, 1],
                v_std_slope: [36, 3, -13, -25],
            },
            temporal_dep: TemporalDepCfg {
                coeff_y1: 6,
                coeff_y2: 12,
                coeff_uv1: 6,
                coeff_uv2: 12,
                auto_lut_gains_y: [3, 9, 15],
                y_offset: 0,
                auto_lut_gains_uv: [3, 9, 15],
                uv_offset: 0,
            },
            temporal_indep: TemporalIndepCfg {
                prev_gridx: [4, 8, 12],
                prev_gridx_lut: [2, 6, 10, 14],
            },
            regional_dep: RegionalDepCfg {
                is_region_diff_on: false,
                region_gain: 15,
                other_channels_check: false,
                other_channel_gain: 10,
            },
            regional_indep: RegionalIndepCfg {
                dont_use_region_sign: true,
                diff_condition_are_all_components_similar: false,
                line_condition: true,
                is_motiondetect_luma_mode_mean: true,
                region_offset: 0,
                is_motiondetect_chroma_mode_mean: true,
                other_channel_offset: 0,
                coefficient_offset: 16,
            },
            spatial_dep: SpatialDepCfg {
                weight_mode: WeightMode::Min,
                spatial_gain: 4,
                spatial_separate_weights: false,
                spatial_luma_gain: [34, 47, 60, 73],
                spatial_uv_gain: [34, 47, 60, 73],
            },
            spatial_indep: SpatialIndepCfg::default(),
        }
    }
}

/// Noise-index dependent factors of one reference point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TdnrNiFactors {
    pub noise_index: u32,
    pub temporal_motion_detection_luma_low: i32,
    pub temporal_motion_detection_luma_contrast: i32,
    pub temporal_motion_detection_luma_high: i32,
    pub temporal_motion_detection_luma_off: bool,
    pub temporal_motion_detection_chroma_low: i32,
    pub temporal_motion_detection_chroma_contrast: i32,
    pub temporal_motion_detection_chroma_high: i32,
    pub temporal_motion_detection_chroma_off: bool,
    pub temporal_weight_luma_power_base: i32,
    pub temporal_weight_luma_power_gamma: i32,
    pub temporal_weight_chroma_power_base: i32,
    pub temporal_weight_chroma_power_gamma: i32,
    pub temporal_weight_hot_region: bool,
    pub temporal_weight_hot_region_power: i32,
    pub temporal_weight_chroma_threshold: bool,
    pub temporal_weight_chroma_power: i32,
    pub spatial_power: i32,
    pub spatial_weight_mode: WeightMode,
    pub spatial_separate_weighting: bool,
    pub spatial_pd_luma_slope: i32,
    pub spatial_pd_luma_offset: i32,
    pub spatial_pd_chroma_slope: i32,
    pub spatial_pd_chroma_offset: i32,
    pub yuv_tables: YuvTables,
}

/// Interpolated factors, numeric fields in fixed point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShiftedTdnrFactors {
    pub luma_low: i64,
    pub luma_contrast: i64,
    pub luma_high: i64,
    pub luma_off: bool,
    pub chroma_low: i64,
    pub chroma_contrast: i64,
    pub chroma_high: i64,
    pub chroma_off: bool,
    pub luma_power_base: i64,
    pub luma_power_gamma: i64,
    pub chroma_power_base: i64,
    pub chroma_power_gamma: i64,
    pub hot_region: bool,
    pub hot_region_power: i64,
    pub chroma_threshold: bool,
    pub chroma_power: i64,
    pub spatial_power: i64,
    pub spatial_weight_mode: WeightMode,
    pub spatial_separate_weighting: bool,
    pub luma_slope: i64,
    pub luma_offset: i64,
    pub chroma_slope: i64,
    pub chroma_offset: i64,
    pub x_grid_y: [i64; 3],
    pub x_grid_u: [i64; 3],
    pub x_grid_v: [i64; 3],
    pub y_std_offset: i64,
    pub u_std_offset: i64,
    pub v_std_offset: i64,
    pub y_std_slope: [i64; 4],
    pub u_std_slope: [i64; 4],
    pub v_std_slope: [i64; 4],
}

impl NoiseFactors for TdnrNiFactors {
    type Output = ShiftedTdnrFactors;

    fn noise_index(&self) -> u32 {
        self.noise_index
    }

    fn interpolate(b: &Self, t: &Self, lerp: &Lerp) -> ShiftedTdnrFactors {
        let arr3 = |x: &[i32; 3], y: &[i32; 3]| -> [i64; 3] {
            std::array::from_fn(|i| lerp.shifted(x[i], y[i]))
        };
        let arr4 = |x: &[i32; 4], y: &[i32; 4]| -> [i64; 4] {
            std::array::from_fn(|i| lerp.shifted(x[i], y[i]))
        };
        let (by, ty) = (&b.yuv_tables, &t.yuv_tables);

        ShiftedTdnrFactors {
            luma_low: lerp.shifted(
                b.temporal_motion_detection_luma_low,
                t.temporal_motion_detection_luma_low,
            ),
            luma_contrast: lerp.shifted(
                b.temporal_motion_detection_luma_contrast,
                t.temporal_motion_detection_luma_contrast,
            ),
            luma_high: lerp.shifted(
                b.temporal_motion_detection_luma_high,
                t.temporal_motion_detection_luma_high,
            ),
            luma_off: lerp.pick(
                b.temporal_motion_detection_luma_off,
                t.temporal_motion_detection_luma_off,
            ),
            chroma_low: lerp.shifted(
                b.temporal_motion_detection_chroma_low,
                t.temporal_motion_detection_chroma_low,
            ),
            chroma_contrast: lerp.shifted(
                b.temporal_motion_detection_chroma_contrast,
                t.temporal_motion_detection_chroma_contrast,
            ),
            chroma_high: lerp.shifted(
                b.temporal_motion_detection_chroma_high,
                t.temporal_motion_detection_chroma_high,
            ),
            chroma_off: lerp.pick(
                b.temporal_motion_detection_chroma_off,
                t.temporal_motion_detection_chroma_off,
            ),
            luma_power_base: lerp.shifted(
                b.temporal_weight_luma_power_base,
                t.temporal_weight_luma_power_base,
            ),
            luma_power_gamma: lerp.shifted(
                b.temporal_weight_luma_power_gamma,
                t.temporal_weight_luma_power_gamma,
            ),
            chroma_power_base: lerp.shifted(
                b.temporal_weight_chroma_power_base,
                t.temporal_weight_chroma_power_base,
            ),
            chroma_power_gamma: lerp.shifted(
                b.temporal_weight_chroma_power_gamma,
                t.temporal_weight_chroma_power_gamma,
            ),
            hot_region: lerp.pick(b.temporal_weight_hot_region, t.temporal_weight_hot_region),
            hot_region_power: lerp.shifted(
                b.temporal_weight_hot_region_power,
                t.temporal_weight_hot_region_power,
            ),
            chroma_threshold: lerp.pick(
                b.temporal_weight_chroma_threshold,
                t.temporal_weight_chroma_threshold,
            ),
            chroma_power: lerp.shifted(
                b.temporal_weight_chroma_power,
                t.temporal_weight_chroma_power,
            ),
            spatial_power: lerp.shifted(b.spatial_power, t.spatial_power),
            spatial_weight_mode: lerp.pick(b.spatial_weight_mode, t.spatial_weight_mode),
            spatial_separate_weighting: lerp
                .pick(b.spatial_separate_weighting, t.spatial_separate_weighting),
            luma_slope: lerp.shifted(b.spatial_pd_luma_slope, t.spatial_pd_luma_slope),
            luma_offset: lerp.shifted(b.spatial_pd_luma_offset, t.spatial_pd_luma_offset),
            chroma_slope: lerp.shifted(b.spatial_pd_chroma_slope, t.spatial_pd_chroma_slope),
            chroma_offset: lerp.shifted(b.spatial_pd_chroma_offset, t.spatial_pd_chroma_offset),
            x_grid_y: arr3(&by.x_grid_y, &ty.x_grid_y),
            x_grid_u: arr3(&by.x_grid_u, &ty.x_grid_u),
            x_grid_v: arr3(&by.x_grid_v, &ty.x_grid_v),
            y_std_offset: lerp.shifted(by.y_std_offset, ty.y_std_offset),
            u_std_offset: lerp.shifted(by.u_std_offset, ty.u_std_offset),
            v_std_offset: lerp.shifted(by.v_std_offset, ty.v_std_offset),
            y_std_slope: arr4(&by.y_std_slope, &ty.y_std_slope),
            u_std_slope: arr4(&by.u_std_slope, &ty.u_std_slope),
            v_std_slope: arr4(&by.v_std_slope, &ty.v_std_slope),
        }
    }
}

// 16 * (1 - v / 256) with v in fixed point
fn power_coeff(shifted: i64) -> u32 {
    (((1i64 << (8 + INTERPOLATE_SHIFT)) - shifted).max(0) >> (4 + INTERPOLATE_SHIFT)) as u32
}

// 16 * (1 - (a / 256) * (b / 256))
fn power_gamma_coeff(base: i64, gamma: i64) -> u32 {
    (((1i64 << 16) - restore(base) * restore(gamma)).max(0) >> 12) as u32
}

fn restore_u32(value: i64) -> u32 {
    restore(value).max(0) as u32
}

impl ShiftedTdnrFactors {
    /// Fill the noise-dependent parts of `cfg`
    pub fn translate_into(&self, cfg: &mut TdnrConfig) {
        cfg.temporal_dep = TemporalDepCfg {
            coeff_y1: power_coeff(self.luma_power_base),
            coeff_y2: power_gamma_coeff(self.luma_power_base, self.luma_power_gamma),
            coeff_uv1: power_coeff(self.chroma_power_base),
            coeff_uv2: power_gamma_coeff(self.chroma_power_base, self.chroma_power_gamma),
            auto_lut_gains_y: [
                restore_u32(self.luma_low),
                restore_u32(self.luma_contrast),
                restore_u32(self.luma_high),
            ],
            y_offset: if self.luma_off { 255 } else { 0 },
            auto_lut_gains_uv: [
                restore_u32(self.chroma_low),
                restore_u32(self.chroma_contrast),
                restore_u32(self.chroma_high),
            ],
            uv_offset: if self.chroma_off { 255 } else { 0 },
        };

        cfg.regional_dep = RegionalDepCfg {
            is_region_diff_on: self.hot_region,
            region_gain: restore_u32(self.hot_region_power),
            other_channels_check: self.chroma_threshold,
            other_channel_gain: restore_u32(self.chroma_power),
        };

        cfg.spatial_dep = SpatialDepCfg {
            weight_mode: self.spatial_weight_mode,
            spatial_gain: power_coeff(self.spatial_power),
            spatial_separate_weights: self.spatial_separate_weighting,
            spatial_luma_gain: std::array::from_fn(|k| {
                restore_u32((k as i64 + 1) * self.luma_slope + self.luma_offset)
            }),
            spatial_uv_gain: std::array::from_fn(|k| {
                restore_u32((k as i64 + 1) * self.chroma_slope + self.chroma_offset)
            }),
        };

        let r3 = |v: &[i64; 3]| -> [i32; 3] { std::array::from_fn(|i| restore(v[i]) as i32) };
        let r4 = |v: &[i64; 4]| -> [i32; 4] { std::array::from_fn(|i| restore(v[i]) as i32) };
        cfg.yuv_tables = YuvTables {
            x_grid_y: r3(&self.x_grid_y),
            x_grid_u: r3(&self.x_grid_u),
            x_grid_v: r3(&self.x_grid_v),
            y_std_offset: restore(self.y_std_offset) as i32,
            u_std_offset: restore(self.u_std_offset) as i32,
            v_std_offset: restore(self.v_std_offset) as i32,
            y_std_slope: r4(&self.y_std_slope),
            u_std_slope: r4(&self.u_std_slope),
            v_std_slope: r4(&self.v_std_slope),
        };
    }
}

/// Denoise section of a setfile table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TdnrTuneset {
    pub tdnr_enable: bool,
    pub general: GeneralCfg,
    pub constant_lut_coeffs: [u32; 3],
    pub refine: RefineCfg,
    pub temporal_indep: TemporalIndepCfg,
    pub regional_indep: RegionalIndepCfg,
    pub spatial_indep: SpatialIndepCfg,
    /// Reference points, sorted by noise index
    pub ni_dep_factors: Vec<TdnrNiFactors>,
}

impl Default for TdnrTuneset {
    fn default() -> Self {
        let cfg = TdnrConfig::default();
        Self {
            tdnr_enable: true,
            general: cfg.general,
            constant_lut_coeffs: cfg.constant_lut_coeffs,
            refine: cfg.refine,
            temporal_indep: cfg.temporal_indep,
            regional_indep: cfg.regional_indep,
            spatial_indep: cfg.spatial_indep,
            ni_dep_factors: Vec::new(),
        }
    }
}

/// Outcome of a tuning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TdnrTuning {
    /// Noise index above the table, run the shot in bypass
    Bypass,
    /// Noise index unchanged, registers already hold the values
    Unchanged,
    /// Write the configuration; `with_static` adds the noise-independent groups
    Apply { config: TdnrConfig, with_static: bool },
}

/// Per-engine denoise tuning state
#[derive(Debug, Clone, Default)]
pub struct TdnrTuner {
    cache: NiCache,
    config: TdnrConfig,
}

impl TdnrTuner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the applied noise index and return to the built-in configuration
    pub fn reset(&mut self) {
        self.cache.invalidate();
        self.config = TdnrConfig::default();
    }

    pub fn config(&self) -> &TdnrConfig {
        &self.config
    }

    pub fn applied_ni(&self) -> Option<u32> {
        self.cache.applied()
    }

    /// Recompute the configuration for a frame noise index.
    ///
    /// `start` marks the leading shot of a stream, which always rewrites
    /// every register group.
    pub fn tune(&mut self, tuneset: Option<&TdnrTuneset>, ni: u32, start: bool) -> TdnrTuning {
        let outcome = self.tune_inner(tuneset, ni, start);
        self.cache.commit(ni);
        outcome
    }

    fn tune_inner(&mut self, tuneset: Option<&TdnrTuneset>, ni: u32, start: bool) -> TdnrTuning {
        let Some(tuneset) = tuneset.filter(|t| !t.ni_dep_factors.is_empty()) else {
            return if start {
                TdnrTuning::Apply {
                    config: self.config,
                    with_static: true,
                }
            } else {
                TdnrTuning::Unchanged
            };
        };

        self.config.general = tuneset.general;
        self.config.constant_lut_coeffs = tuneset.constant_lut_coeffs;
        self.config.refine = tuneset.refine;
        self.config.temporal_indep = tuneset.temporal_indep;
        self.config.regional_indep = tuneset.regional_indep;
        self.config.spatial_indep = tuneset.spatial_indep;

        if !start && !self.cache.is_stale(ni) {
            return TdnrTuning::Unchanged;
        }

        let table = &tuneset.ni_dep_factors;
        let max_ref = table.last().map(|f| interp::multiplied_ni(f.noise_index));
        if max_ref.is_some_and(|max| ni >= max) {
            tracing::debug!("TDNR: NI {} above max reference {:?}, bypass", ni, max_ref);
            return TdnrTuning::Bypass;
        }

        let indexes: Vec<u32> = table.iter().map(|f| f.noise_index).collect();
        let Some(bracket) = find_bracket(&indexes, ni) else {
            return TdnrTuning::Unchanged;
        };
        let bottom = &table[bracket.bottom];
        let top = &table[bracket.top];
        let lerp = Lerp::new(bottom.noise_index, top.noise_index, ni);
        TdnrNiFactors::interpolate(bottom, top, &lerp).translate_into(&mut self.config);

        TdnrTuning::Apply {
            config: self.config,
            with_static: start,
        }
    }
}
