//! Sub-block programming: denoise, CAC, UVSP, DS/VRA and YSUM

use mcsc_core::regs::{CacField, DsField, Field, OutputField, TdnrBuf, TdnrField, UvspField, WdmaField, YsumField};
use mcsc_core::{
    DmaPath, FormatError, Frame, McsParam, McscError, OutputId, ParamChange, Rect, RegisterAccess, Result,
};
use mcsc_tuning::tdnr::{buffer_pair, next_image_buffer, reference_size};
use mcsc_tuning::uvsp::UvspTuneset;
use mcsc_tuning::{cac, select_mode, ModeInputs, TdnrConfig, TdnrMode, TdnrTuning, UvspTuning};

use crate::engine::{EngineCtx, McscEngine};
use crate::state::HwState;

/// Fixed-point shift of the DS ratio
const DS_RATIO_SHIFT: u32 = 20;

/// Write the denoise tuning registers.
///
/// The general, constant-LUT and refine groups only change with the
/// setfile and are written when `with_static` is set.
fn write_tdnr_config(regs: &dyn RegisterAccess, cfg: &TdnrConfig, with_static: bool) {
    let f = Field::Tdnr;

    if with_static {
        regs.set_flag(f(TdnrField::UseAverageCurrent), cfg.general.use_average_current);
        regs.set_flag(f(TdnrField::AutoCoeff3d), cfg.general.auto_coeff_3d);
        regs.set_field(f(TdnrField::BlendingThreshold), cfg.general.blending_threshold);
        for (i, v) in cfg.constant_lut_coeffs.iter().enumerate() {
            regs.set_field(f(TdnrField::ConstLutCoeff(i as u8)), *v);
        }
        regs.set_flag(f(TdnrField::RefineOn), cfg.refine.is_refine_on);
        regs.set_field(f(TdnrField::RefineMode), cfg.refine.refine_mode as u32);
        regs.set_field(f(TdnrField::RefineThreshold), cfg.refine.refine_threshold);
        regs.set_field(f(TdnrField::RefineCoeffUpdate), cfg.refine.refine_coeff_update);
    }

    let yuv = &cfg.yuv_tables;
    for i in 0..3 {
        regs.set_signed(f(TdnrField::XGridY(i as u8)), yuv.x_grid_y[i]);
        regs.set_signed(f(TdnrField::XGridU(i as u8)), yuv.x_grid_u[i]);
        regs.set_signed(f(TdnrField::XGridV(i as u8)), yuv.x_grid_v[i]);
    }
    regs.set_signed(f(TdnrField::YStdOffset), yuv.y_std_offset);
    regs.set_signed(f(TdnrField::UStdOffset), yuv.u_std_offset);
    regs.set_signed(f(TdnrField::VStdOffset), yuv.v_std_offset);
    for i in 0..4 {
        regs.set_signed(f(TdnrField::YStdSlope(i as u8)), yuv.y_std_slope[i]);
        regs.set_signed(f(TdnrField::UStdSlope(i as u8)), yuv.u_std_slope[i]);
        regs.set_signed(f(TdnrField::VStdSlope(i as u8)), yuv.v_std_slope[i]);
    }

    let temporal = &cfg.temporal_dep;
    regs.set_field(f(TdnrField::CoeffY1), temporal.coeff_y1);
    regs.set_field(f(TdnrField::CoeffY2), temporal.coeff_y2);
    regs.set_field(f(TdnrField::CoeffUv1), temporal.coeff_uv1);
    regs.set_field(f(TdnrField::CoeffUv2), temporal.coeff_uv2);
    for i in 0..3 {
        regs.set_field(f(TdnrField::AutoLutGainY(i as u8)), temporal.auto_lut_gains_y[i]);
        regs.set_field(f(TdnrField::AutoLutGainUv(i as u8)), temporal.auto_lut_gains_uv[i]);
        regs.set_field(f(TdnrField::PrevGridx(i as u8)), cfg.temporal_indep.prev_gridx[i]);
    }
    regs.set_field(f(TdnrField::YOffset), temporal.y_offset);
    regs.set_field(f(TdnrField::UvOffset), temporal.uv_offset);
    for (i, v) in cfg.temporal_indep.prev_gridx_lut.iter().enumerate() {
        regs.set_field(f(TdnrField::PrevGridxLut(i as u8)), *v);
    }

    let region = &cfg.regional_dep;
    let region_indep = &cfg.regional_indep;
    regs.set_flag(f(TdnrField::RegionDiffOn), region.is_region_diff_on);
    regs.set_field(f(TdnrField::RegionGain), region.region_gain);
    regs.set_flag(f(TdnrField::OtherChannelsCheck), region.other_channels_check);
    regs.set_field(f(TdnrField::OtherChannelGain), region.other_channel_gain);
    regs.set_flag(f(TdnrField::DontUseRegionSign), region_indep.dont_use_region_sign);
    regs.set_flag(
        f(TdnrField::DiffConditionAllSimilar),
        region_indep.diff_condition_are_all_components_similar,
    );
    regs.set_flag(f(TdnrField::LineCondition), region_indep.line_condition);
    regs.set_flag(f(TdnrField::MotionLumaMean), region_indep.is_motiondetect_luma_mode_mean);
    regs.set_field(f(TdnrField::RegionOffset), region_indep.region_offset);
    regs.set_flag(f(TdnrField::MotionChromaMean), region_indep.is_motiondetect_chroma_mode_mean);
    regs.set_field(f(TdnrField::OtherChannelOffset), region_indep.other_channel_offset);
    regs.set_field(f(TdnrField::CoefficientOffset), region_indep.coefficient_offset);

    let spatial = &cfg.spatial_dep;
    regs.set_field(f(TdnrField::SpatialWeightMode), spatial.weight_mode as u32);
    regs.set_field(f(TdnrField::SpatialGain), spatial.spatial_gain);
    regs.set_flag(f(TdnrField::SpatialSeparateWeights), spatial.spatial_separate_weights);
    regs.set_field(
        f(TdnrField::SpatialRefineThreshold),
        cfg.spatial_indep.spatial_refine_threshold,
    );
    for i in 0..4 {
        regs.set_field(f(TdnrField::SpatialLumaGain(i as u8)), spatial.spatial_luma_gain[i]);
        regs.set_field(f(TdnrField::SpatialUvGain(i as u8)), spatial.spatial_uv_gain[i]);
        regs.set_field(f(TdnrField::SpatialLumaOffset(i as u8)), cfg.spatial_indep.spatial_luma_offset[i]);
        regs.set_field(f(TdnrField::SpatialUvOffset(i as u8)), cfg.spatial_indep.spatial_uv_offset[i]);
    }
}

impl McscEngine {
    /// Reset denoise state and carve the reference buffers
    pub(crate) fn tdnr_init(&self, ctx: &mut EngineCtx, instance: u32) {
        if !self.shared.cap().tdnr {
            return;
        }
        ctx.tdnr.mode = TdnrMode::Bypass;
        ctx.tdnr.yic = true;
        ctx.tdnr.tuner.reset();

        let base = ctx.param(instance).map_or(0, |p| p.control.buffer_address);
        if base != 0 {
            let tdnr = &self.shared.config.tdnr;
            ctx.tdnr.buffers = buffer_pair(base, tdnr.buffer_width, tdnr.buffer_height);
            tracing::debug!("{}: TDNR buffers {:x?}", self.id, ctx.tdnr.buffers);
        }

        let regs = self.regs();
        regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Image)), 0);
        regs.set_field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image)), 0);
    }

    pub(crate) fn tdnr_deinit(&self, ctx: &mut EngineCtx) {
        if !self.shared.cap().tdnr {
            return;
        }
        let regs = self.regs();
        regs.set_field(Field::Tdnr(TdnrField::ModeSelect), TdnrMode::Bypass as u32);
        regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Image)), 0);
        regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Weight)), 0);
        regs.set_flag(Field::Tdnr(TdnrField::WdmaEnable(TdnrBuf::Weight)), false);
        regs.set_field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Weight)), 0);
        ctx.tdnr.mode = TdnrMode::Bypass;
    }

    /// Select the denoise mode of a shot and program buffers and tuning.
    ///
    /// Any failure downgrades the shot to bypass; nothing is returned.
    pub(crate) fn update_tdnr(&self, ctx: &mut EngineCtx, frame: &Frame, param: &McsParam, start: bool) {
        if !self.shared.cap().tdnr {
            return;
        }
        let regs = self.regs();

        let tuneset = ctx.cur_setfile.get(&frame.instance).map(|s| &s.tdnr);
        let inputs = ModeInputs {
            bypass_requested: param.tdnr_bypass,
            internal: frame.is_internal(),
            tuning_enabled: tuneset.map_or(true, |t| t.tdnr_enable),
            prev_mode: ctx.tdnr.mode,
            first_shot: frame.group.shot_count == 0,
            input_changed: frame.changed.contains(ParamChange::INPUT),
        };
        let mut mode = select_mode(&inputs);

        ctx.tdnr.yic = !frame.group.otf_input;
        regs.set_flag(Field::Tdnr(TdnrField::YicEnable), ctx.tdnr.yic);
        regs.set_field(Field::Tdnr(TdnrField::ImageWidth), param.input.width);
        regs.set_field(Field::Tdnr(TdnrField::ImageHeight), param.input.height);

        if mode != TdnrMode::Bypass {
            let configured = self
                .tdnr_rdma_cfg(ctx, frame, mode)
                .and_then(|_| self.tdnr_wdma_cfg(ctx, frame, param, mode));
            match configured {
                Ok(()) => {
                    let tuneset = ctx.cur_setfile.get(&frame.instance).map(|s| &s.tdnr);
                    match ctx.tdnr.tuner.tune(tuneset, frame.noise_index, start) {
                        TdnrTuning::Bypass => mode = TdnrMode::Bypass,
                        TdnrTuning::Unchanged => {}
                        TdnrTuning::Apply { config, with_static } => {
                            tracing::debug!(
                                "{}: [F:{}] TDNR tuning for NI {} (static {})",
                                self.id,
                                frame.fcount,
                                frame.noise_index,
                                with_static
                            );
                            write_tdnr_config(regs, &config, with_static);
                        }
                    }
                }
                Err(e) => {
                    tracing::error!("{}: [F:{}] TDNR config failed ({}), bypass", self.id, frame.fcount, e);
                    mode = TdnrMode::Bypass;
                }
            }

            // The RDMA fetch of a late shadow update would run against a stale reference
            if frame.group.otf_input && !self.vvalid.is_valid() && mode == TdnrMode::ThreeFrame {
                tracing::warn!(
                    "{}: TDNR mode {:?} -> {:?}, register update not finished",
                    self.id,
                    ctx.tdnr.mode,
                    TdnrMode::TwoFrame
                );
                mode = TdnrMode::TwoFrame;
            }
        }

        regs.set_field(Field::Tdnr(TdnrField::ModeSelect), mode as u32);
        ctx.tdnr.mode = mode;
    }

    /// Reference read: the previous shot's image output
    fn tdnr_rdma_cfg(&self, ctx: &EngineCtx, frame: &Frame, mode: TdnrMode) -> Result<()> {
        if frame.is_internal() {
            return Err(McscError::InvalidState {
                engine: self.id,
                state: "internal shot",
            });
        }
        let regs = self.regs();
        if mode == TdnrMode::TwoFrame {
            regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Image)), 0);
            regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Weight)), 0);
            return Ok(());
        }

        let prev = regs.get_field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image)));
        regs.set_field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Image)), prev);
        if ctx.tdnr.mode == TdnrMode::ThreeFrame {
            return Ok(());
        }

        let width = regs.get_field(Field::Tdnr(TdnrField::WdmaWidth));
        let height = regs.get_field(Field::Tdnr(TdnrField::WdmaHeight));
        let stride = regs.get_field(Field::Tdnr(TdnrField::WdmaStrideY));
        if width == 0 || height == 0 || stride == 0 {
            tracing::warn!(
                "{}: TDNR previous image {}x{} stride {} is invalid",
                self.id,
                width,
                height,
                stride
            );
            return Err(FormatError::Size { width, height }.into());
        }
        regs.set_field(Field::Tdnr(TdnrField::RdmaWidth), width);
        regs.set_field(Field::Tdnr(TdnrField::RdmaHeight), height);
        regs.set_field(Field::Tdnr(TdnrField::RdmaStrideY), stride);
        regs.set_field(Field::Tdnr(TdnrField::RdmaStrideC), 0);
        Ok(())
    }

    /// Image output: alternate between the two reference buffers
    fn tdnr_wdma_cfg(&self, ctx: &EngineCtx, frame: &Frame, param: &McsParam, mode: TdnrMode) -> Result<()> {
        if frame.is_internal() {
            return Err(McscError::InvalidState {
                engine: self.id,
                state: "internal shot",
            });
        }
        let regs = self.regs();
        let prev = regs.get_field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image)));
        let addr = match next_image_buffer(mode, prev, ctx.tdnr.buffers) {
            Some(addr) if addr != 0 => addr,
            _ => {
                return Err(McscError::InvalidAddress {
                    path: DmaPath::TdnrWdma,
                    index: 0,
                })
            }
        };
        regs.set_field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image)), addr);

        if ctx.tdnr.mode == TdnrMode::ThreeFrame && mode == TdnrMode::ThreeFrame {
            return Ok(());
        }

        let (width, height) = reference_size(ctx.tdnr.yic, param.input.width, param.input.height);
        regs.set_field(Field::Tdnr(TdnrField::WdmaWidth), width);
        regs.set_field(Field::Tdnr(TdnrField::WdmaHeight), height);
        regs.set_field(Field::Tdnr(TdnrField::WdmaStrideY), width * 2);
        regs.set_field(Field::Tdnr(TdnrField::WdmaStrideC), 0);
        Ok(())
    }

    /// Put denoise back into bypass after a restore
    pub(crate) fn tdnr_recovery(&self, ctx: &mut EngineCtx, param: &McsParam, instance: u32) {
        if !self.shared.cap().tdnr {
            return;
        }
        self.tdnr_init(ctx, instance);
        let regs = self.regs();
        regs.set_field(Field::Tdnr(TdnrField::ImageWidth), param.input.width);
        regs.set_field(Field::Tdnr(TdnrField::ImageHeight), param.input.height);
        regs.set_field(Field::Tdnr(TdnrField::ModeSelect), TdnrMode::Bypass as u32);
    }

    pub(crate) fn update_cac(&self, ctx: &mut EngineCtx, frame: &Frame) {
        let cap = self.shared.cap();
        if !cap.cac {
            return;
        }
        let regs = self.regs();

        let mut input = cac::input_source(ctx.video_mode);
        let mut enable = true;
        if let Some(forced) = self.shared.config.debug.force_cac {
            input = forced.input;
            enable = forced.enable;
        }
        if input != ctx.cac_in {
            tracing::debug!("{}: CAC input {} -> {}", self.id, ctx.cac_in, input);
            ctx.cac_in = input;
        }
        regs.set_field(Field::Cac(CacField::InputSource), input.index() as u32);

        if input != self.id {
            return;
        }
        if !enable {
            regs.set_flag(Field::Cac(CacField::Enable), false);
            tracing::info!("{}: CAC forced off", self.id);
            return;
        }

        let Some(setfile) = ctx.cur_setfile.get(&frame.instance) else {
            return;
        };
        if !setfile.cac.cac_enable {
            regs.set_flag(Field::Cac(CacField::Enable), false);
            return;
        }

        let ni = self.shared.load_ni(self.id, frame.fcount);
        let Some(config) = ctx.cac.tune(&setfile.cac, ni) else {
            return;
        };
        tracing::debug!("{}: [F:{}] CAC NI {}", self.id, frame.fcount, ni);

        regs.set_field(Field::Cac(CacField::MapSpotThrLow), config.map_thr.spot_thr_l);
        regs.set_field(Field::Cac(CacField::MapSpotThrHigh), config.map_thr.spot_thr_h);
        regs.set_field(Field::Cac(CacField::MapSpotThr), config.map_thr.spot_thr);
        regs.set_field(Field::Cac(CacField::MapSpotNrStrength), config.map_thr.spot_nr_strength);
        regs.set_field(Field::Cac(CacField::CrtColorThrLowDot), config.crt_thr.crt_color_thr_l_dot);
        regs.set_field(Field::Cac(CacField::CrtColorThrLowLine), config.crt_thr.crt_color_thr_l_line);
        regs.set_field(Field::Cac(CacField::CrtColorThrHigh), config.crt_thr.crt_color_thr_h);
        regs.set_flag(Field::Cac(CacField::Enable), true);
    }

    pub(crate) fn update_uvsp(&self, ctx: &mut EngineCtx, frame: &Frame) {
        if !self.shared.cap().uvsp {
            return;
        }
        let regs = self.regs();

        if let Some(forced) = self.shared.config.debug.force_uvsp {
            if !forced.enable {
                regs.set_flag(Field::Uvsp(UvspField::Enable), false);
                tracing::info!("{}: UVSP forced off", self.id);
                return;
            }
        }

        let ni = self.shared.load_ni(self.id, frame.fcount);
        let default_tuneset = UvspTuneset::default();
        let tuneset = ctx
            .cur_setfile
            .get(&frame.instance)
            .map_or(&default_tuneset, |s| &s.uvsp);

        match ctx.uvsp.tune(tuneset, &ctx.calibration, frame.taa.as_ref(), ni) {
            UvspTuning::Unchanged => {}
            UvspTuning::Disable => regs.set_flag(Field::Uvsp(UvspField::Enable), false),
            UvspTuning::Apply { radial, config } => {
                tracing::debug!(
                    "{}: [F:{}] UVSP NI {} center ({}, {})",
                    self.id,
                    frame.fcount,
                    ni,
                    radial.radial_center_x,
                    radial.radial_center_y
                );
                let u = |field| Field::Uvsp(field);
                regs.set_field(u(UvspField::BinningX), radial.binning_x);
                regs.set_field(u(UvspField::BinningY), radial.binning_y);
                regs.set_field(u(UvspField::RadialCenterX), radial.radial_center_x);
                regs.set_field(u(UvspField::RadialCenterY), radial.radial_center_y);
                regs.set_field(u(UvspField::BiquadA), radial.biquad_a);
                regs.set_field(u(UvspField::BiquadB), radial.biquad_b);

                if let Some(c) = config {
                    regs.set_field(u(UvspField::BiquadShift), c.radial.biquad_shift);
                    regs.set_flag(u(UvspField::RandomEn), c.radial.random_en);
                    regs.set_field(u(UvspField::RandomPower), c.radial.random_power);
                    regs.set_flag(u(UvspField::RefineEn), c.radial.refine_en);
                    regs.set_field(u(UvspField::RefineLumaMin), c.radial.refine_luma_min);
                    regs.set_field(u(UvspField::RefineDenom), c.radial.refine_denom);
                    regs.set_flag(u(UvspField::AlphaGainAddEn), c.radial.alpha_gain_add_en);
                    regs.set_flag(u(UvspField::AlphaGreenEn), c.radial.alpha_green_en);
                    regs.set_field(u(UvspField::AlphaR), c.radial.alpha_r);
                    regs.set_field(u(UvspField::AlphaG), c.radial.alpha_g);
                    regs.set_field(u(UvspField::AlphaB), c.radial.alpha_b);

                    regs.set_signed(u(UvspField::PedestalR), c.pedestal.r);
                    regs.set_signed(u(UvspField::PedestalG), c.pedestal.g);
                    regs.set_signed(u(UvspField::PedestalB), c.pedestal.b);
                    regs.set_signed(u(UvspField::OffsetR), c.offset.r);
                    regs.set_signed(u(UvspField::OffsetG), c.offset.g);
                    regs.set_signed(u(UvspField::OffsetB), c.offset.b);

                    regs.set_flag(u(UvspField::DesatCtrlEn), c.desat.ctrl_en);
                    regs.set_flag(u(UvspField::DesatSingleSide), c.desat.ctrl_single_side);
                    regs.set_field(u(UvspField::DesatLumaOffset), c.desat.ctrl_luma_offset);
                    regs.set_field(u(UvspField::DesatGainOffset), c.desat.ctrl_gain_offset);
                    regs.set_field(u(UvspField::DesatYShift), c.desat.y_shift);
                    regs.set_field(u(UvspField::DesatYLumaMax), c.desat.y_luma_max);
                    regs.set_signed(u(UvspField::DesatULow), c.desat.u_low);
                    regs.set_signed(u(UvspField::DesatUHigh), c.desat.u_high);
                    regs.set_signed(u(UvspField::DesatVLow), c.desat.v_low);
                    regs.set_signed(u(UvspField::DesatVHigh), c.desat.v_high);

                    for (i, coef) in c.r2y.coef.iter().enumerate() {
                        regs.set_signed(u(UvspField::R2yCoef(i as u8)), *coef);
                    }
                    regs.set_field(u(UvspField::R2yShift), c.r2y.shift);
                }
                regs.set_flag(u(UvspField::Enable), true);
            }
        }
    }

    /// Downscale a port's image into the DS output for the detection engine
    pub(crate) fn update_dsvra(&self, ctx: &mut EngineCtx, frame: &Frame, param: &McsParam) -> Result<()> {
        if !self.shared.cap().ds_vra {
            return Ok(());
        }
        let Some(port) = frame.ports.ds else {
            return Ok(());
        };
        if port.is_ds() {
            return Err(McscError::InvalidPort(format!("DS fed from {}", port)));
        }
        if !self.shared.ownership.lock().held_by(OutputId::DS, self.id) {
            tracing::debug!("{}: [F:{}] DS not armed on this engine", self.id, frame.fcount);
            return Ok(());
        }

        let ds_out = param.output(OutputId::DS);
        if ds_out.width == 0 || ds_out.height == 0 {
            return Err(FormatError::Size {
                width: ds_out.width,
                height: ds_out.height,
            }
            .into());
        }

        let source = param.output(port);
        let (img_w, img_h) = (source.width, source.height);

        let crop = if frame.ds_crop.is_empty() { ds_out.crop } else { frame.ds_crop };
        let mut src = if crop.is_empty() { Rect::full(img_w, img_h) } else { crop };
        if src.x + src.width > img_w {
            tracing::warn!("{}: DS crop x {}+{} exceeds {}, using full width", self.id, src.x, src.width, img_w);
            src.x = 0;
            src.width = img_w;
        }
        if src.y + src.height > img_h {
            tracing::warn!("{}: DS crop y {}+{} exceeds {}, using full height", self.id, src.y, src.height, img_h);
            src.y = 0;
            src.height = img_h;
        }

        let h_ratio = ((src.width as u64) << DS_RATIO_SHIFT) / ds_out.width as u64;
        let v_ratio = ((src.height as u64) << DS_RATIO_SHIFT) / ds_out.height as u64;
        tracing::debug!(
            "{}: [F:{}] DS from {} {:?} -> {}x{}",
            self.id,
            frame.fcount,
            port,
            src,
            ds_out.width,
            ds_out.height
        );

        let regs = self.regs();
        regs.set_field(Field::Ds(DsField::ImgWidth), img_w);
        regs.set_field(Field::Ds(DsField::ImgHeight), img_h);
        regs.set_field(Field::Ds(DsField::SrcX), src.x);
        regs.set_field(Field::Ds(DsField::SrcY), src.y);
        regs.set_field(Field::Ds(DsField::SrcWidth), src.width);
        regs.set_field(Field::Ds(DsField::SrcHeight), src.height);
        regs.set_field(Field::Ds(DsField::DstWidth), ds_out.width);
        regs.set_field(Field::Ds(DsField::DstHeight), ds_out.height);
        regs.set_field(Field::Ds(DsField::HRatio), h_ratio as u32);
        regs.set_field(Field::Ds(DsField::VRatio), v_ratio as u32);
        regs.set_field(Field::Ds(DsField::HPhase), 0);
        regs.set_field(Field::Ds(DsField::VPhase), 0);
        regs.set_flag(Field::Ds(DsField::GammaEnable), true);

        self.dma_output(ctx, ds_out, OutputId::DS)?;
        regs.set_field(Field::Output(OutputId::DS, OutputField::OtfPath), port.index() as u32);
        regs.set_flag(Field::Ds(DsField::Enable), true);
        regs.set_flag(Field::Wdma(OutputId::DS, WdmaField::Enable), true);

        if !frame.group.otf_input {
            self.hw_state().set(HwState::DS_CFG);
        }
        Ok(())
    }

    /// Measure luminance on a port whose write DMA is running
    pub(crate) fn update_ysum(&self, frame: &Frame, param: &McsParam) -> Result<()> {
        if !self.shared.cap().ysum {
            return Ok(());
        }
        let Some(port) = frame.ports.ysum else {
            return Ok(());
        };
        let regs = self.regs();
        if regs.get_field(Field::Wdma(port, WdmaField::Enable)) == 0 {
            return Err(McscError::InvalidPort(format!("YSUM on {} without DMA output", port)));
        }
        if port.is_ds() {
            return Ok(());
        }

        let output = param.output(port);
        regs.set_field(Field::Ysum(YsumField::Width), output.width);
        regs.set_field(Field::Ysum(YsumField::Height), output.height);
        regs.set_field(Field::Ysum(YsumField::StartX), 0);
        regs.set_field(Field::Ysum(YsumField::StartY), 0);
        regs.set_field(Field::Ysum(YsumField::InputSource), port.index() as u32);
        regs.set_flag(Field::Ysum(YsumField::Enable), true);
        tracing::debug!("{}: [F:{}] YSUM on {} {}x{}", self.id, frame.fcount, port, output.width, output.height);

        if !frame.group.otf_input {
            self.hw_state().set(HwState::YSUM_CFG);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcsc_core::{RegWrite, RegisterFile};

    #[test]
    fn test_static_groups_only_on_start() {
        let regs = RegisterFile::new("tdnr");
        let cfg = TdnrConfig::default();

        write_tdnr_config(&regs, &cfg, false);
        let writes = regs.take_writes();
        assert!(!writes
            .iter()
            .any(|w| matches!(w, RegWrite::Field(Field::Tdnr(TdnrField::RefineOn), _))));
        assert!(writes
            .iter()
            .any(|w| matches!(w, RegWrite::Field(Field::Tdnr(TdnrField::CoeffY1), _))));

        write_tdnr_config(&regs, &cfg, true);
        let writes = regs.take_writes();
        assert!(writes
            .iter()
            .any(|w| matches!(w, RegWrite::Field(Field::Tdnr(TdnrField::RefineOn), _))));
    }

    #[test]
    fn test_signed_fields_round_trip_bits() {
        let regs = RegisterFile::new("tdnr");
        let mut cfg = TdnrConfig::default();
        cfg.yuv_tables.y_std_offset = -3;
        write_tdnr_config(&regs, &cfg, false);
        assert_eq!(regs.field(Field::Tdnr(TdnrField::YStdOffset)) as i32, -3);
    }
}
