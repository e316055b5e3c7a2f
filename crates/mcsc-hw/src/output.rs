//! Input, per-output and DJAG parameter programming

use mcsc_core::param::{InputParam, OutputParam};
use mcsc_core::regs::{
    BchsField, CtrlField, DjagField, Field, HwfcField, InputField, OutputField, RdmaField,
    ScaleField, WdmaField, INPUT_SOURCE_DMA, INPUT_SOURCE_OTF,
};
use mcsc_core::{McsParam, McscError, OutputId, OutputMask, Result};
use mcsc_scaler::djag::{djag_input, plan_djag, DjagLimits, DjagPlan};
use mcsc_scaler::format::{bit_type_10, check_post_size, input_img_format, output_img_format, stride_2bit};
use mcsc_scaler::{check_format, plan_poly, plan_post, range_settings, IoType, ScaleLimits};

use crate::engine::{EngineCtx, McscEngine};
use crate::state::HwState;

/// Planes of the 8+2 bit layout
const PLANE_8P2: u32 = 4;

/// HWFC buffer ids reserved per output
const HWFC_IDS_PER_OUTPUT: u32 = 3;

/// Rear-camera coefficient tables apply to this sensor position
const REAR_SENSOR_POSITION: u32 = 0;

fn keep_first(acc: &mut Option<McscError>, result: Result<()>) {
    if let Err(e) = result {
        acc.get_or_insert(e);
    }
}

impl McscEngine {
    /// Program input, DJAG and every output from the instance parameters.
    ///
    /// Every stage is attempted; the first failure is returned after a size
    /// dump.
    pub(crate) fn update_param(&self, ctx: &mut EngineCtx, instance: u32) -> Result<()> {
        let Some(param) = ctx.param(instance).cloned() else {
            return Err(McscError::NotInitialized {
                engine: self.id,
                instance,
            });
        };
        if ctx.cur_instance != instance {
            tracing::debug!("{}: update_param: instance {} -> {}", self.id, ctx.cur_instance, instance);
            ctx.cur_instance = instance;
        }

        let cap = self.shared.cap();
        let mut first_err = None;

        keep_first(&mut first_err, self.otf_input(&param.input));
        keep_first(&mut first_err, self.dma_input(ctx, &param.input));

        self.update_djag(ctx, &param, instance);

        let mut hwfc_ids = OutputMask::empty();
        let mut dma_ids = OutputMask::empty();
        for out in cap.outputs() {
            let output = param.output(out);
            if !out.is_ds() {
                keep_first(&mut first_err, self.update_output(ctx, &param, out, instance));
            }
            self.regs()
                .set_field(Field::Wdma(out, WdmaField::Priority), output.plane);

            if output.hwfc {
                hwfc_ids.insert_output(out);
            }
            if output.dma_cmd {
                dma_ids.insert_output(out);
            }
        }

        self.hwfc_mode(ctx, instance, hwfc_ids, dma_ids);
        ctx.prev_hwfc = hwfc_ids;

        match first_err {
            Some(e) => {
                self.dump_sizes();
                Err(e)
            }
            None => Ok(()),
        }
    }

    fn update_output(&self, ctx: &mut EngineCtx, param: &McsParam, out: OutputId, instance: u32) -> Result<()> {
        if !ctx.out_en.has(out) {
            return Ok(());
        }
        let output = param.output(out);
        tracing::debug!(
            "{}: {} crop {:?} size {}x{} cmd(O:{},D:{})",
            self.id,
            out,
            output.crop,
            output.width,
            output.height,
            output.otf_cmd,
            output.dma_cmd
        );

        let mut first_err = None;
        keep_first(&mut first_err, self.poly_phase(ctx, &param.input, output, out, instance));
        keep_first(&mut first_err, self.post_chain(output, out));
        self.flip(output, out);
        keep_first(&mut first_err, self.otf_output(output, out));
        keep_first(&mut first_err, self.dma_output(ctx, output, out));
        self.output_yuvrange(ctx, output, out, instance);
        self.hwfc_output(output, out);

        first_err.map_or(Ok(()), Err)
    }

    /// Engine currently selected as the source of `out`
    fn is_path_owner(&self, out: OutputId) -> bool {
        self.regs().get_field(Field::Output(out, OutputField::ScalerPath)) == self.id.index() as u32
    }

    /// Whether a stage of a disabled output may be switched off by this engine
    fn may_disable(&self, out: OutputId) -> bool {
        if !self.shared.cap().enable_shared_output {
            return true;
        }
        self.is_path_owner(out) && self.shared.ownership.lock().is_idle(out)
    }

    fn otf_input(&self, input: &InputParam) -> Result<()> {
        if !self.shared.cap().in_otf || !input.otf_cmd {
            return Ok(());
        }
        let limits = ScaleLimits::from(&self.shared.config.scaler);
        check_format(
            IoType::OtfInput(input.otf_format),
            input.otf_bitwidth,
            input.width,
            input.height,
            &limits,
        )?;

        let regs = self.regs();
        regs.set_field(Field::Input(InputField::Source), INPUT_SOURCE_OTF);
        regs.set_field(Field::Input(InputField::Width), input.width);
        regs.set_field(Field::Input(InputField::Height), input.height);
        regs.set_field(Field::Input(InputField::Dither), 0);
        regs.set_field(Field::Rdma(RdmaField::Format), input.otf_format as u32);
        Ok(())
    }

    fn dma_input(&self, ctx: &mut EngineCtx, input: &InputParam) -> Result<()> {
        if !self.shared.cap().in_dma || !input.dma_cmd {
            return Ok(());
        }
        let (width, height) = (input.dma_crop.width, input.dma_crop.height);
        let limits = ScaleLimits::from(&self.shared.config.scaler);
        check_format(IoType::DmaInput(input.dma_format), input.dma_bitwidth, width, height, &limits)?;

        let regs = self.regs();
        regs.set_field(Field::Input(InputField::Source), INPUT_SOURCE_DMA);
        regs.set_field(Field::Input(InputField::Width), width);
        regs.set_field(Field::Input(InputField::Height), height);
        regs.set_field(Field::Input(InputField::Dither), 0);
        regs.set_field(Field::Rdma(RdmaField::StrideY), input.dma_stride_y);
        regs.set_field(Field::Rdma(RdmaField::StrideC), input.dma_stride_c);

        let img_format = match input_img_format(input.dma_format, input.plane, input.dma_order) {
            Ok(f) => {
                ctx.in_img_format = f;
                f
            }
            Err(e) => {
                tracing::warn!(
                    "{}: invalid rdma image format ({}), keeping {:?}",
                    self.id,
                    e,
                    ctx.in_img_format
                );
                ctx.in_img_format
            }
        };
        regs.set_field(Field::Rdma(RdmaField::Width), width);
        regs.set_field(Field::Rdma(RdmaField::Height), height);
        regs.set_field(Field::Rdma(RdmaField::Format), img_format as u32);
        regs.set_field(
            Field::Rdma(RdmaField::BitType10),
            bit_type_10(input.dma_bitwidth, input.plane),
        );

        if input.plane == PLANE_8P2 {
            let stride = stride_2bit(width);
            regs.set_field(Field::Rdma(RdmaField::StrideY2bit), stride);
            regs.set_field(Field::Rdma(RdmaField::StrideC2bit), stride);
        }
        Ok(())
    }

    fn poly_phase(
        &self,
        ctx: &EngineCtx,
        input: &InputParam,
        output: &OutputParam,
        out: OutputId,
        instance: u32,
    ) -> Result<()> {
        let regs = self.regs();
        if !output.is_enabled() {
            if self.may_disable(out) {
                regs.set_flag(Field::Poly(out, ScaleField::Enable), false);
            }
            return Ok(());
        }

        regs.set_flag(Field::Poly(out, ScaleField::Enable), true);
        regs.set_field(Field::Output(out, OutputField::ScalerPath), self.id.index() as u32);

        let (in_w, in_h) = input.scaler_input_size();
        let djag = ctx.djag.unwrap_or_else(|| DjagPlan::disabled(in_w, in_h));
        let src = djag.remap_crop(output.crop);

        let limits = ScaleLimits::from(&self.shared.config.scaler);
        let rear_tuned = ctx
            .instances
            .get(&instance)
            .is_some_and(|i| i.sensor_position == REAR_SENSOR_POSITION);
        let plan = plan_poly(out, src, output.width, output.height, &limits, rear_tuned)?;

        regs.set_field(Field::Poly(out, ScaleField::SrcX), plan.src.x);
        regs.set_field(Field::Poly(out, ScaleField::SrcY), plan.src.y);
        regs.set_field(Field::Poly(out, ScaleField::SrcWidth), plan.src.width);
        regs.set_field(Field::Poly(out, ScaleField::SrcHeight), plan.src.height);
        regs.set_field(Field::Poly(out, ScaleField::DstWidth), plan.dst_width);
        regs.set_field(Field::Poly(out, ScaleField::DstHeight), plan.dst_height);
        regs.set_field(Field::Poly(out, ScaleField::HRatio), plan.h_ratio);
        regs.set_field(Field::Poly(out, ScaleField::VRatio), plan.v_ratio);
        regs.set_field(Field::Poly(out, ScaleField::HCoef), plan.h_coef as u32);
        regs.set_field(Field::Poly(out, ScaleField::VCoef), plan.v_coef as u32);
        regs.set_field(Field::Poly(out, ScaleField::HPhaseOffset), plan.h_phase);
        regs.set_field(Field::Poly(out, ScaleField::VPhaseOffset), plan.v_phase);
        regs.set_flag(Field::Poly(out, ScaleField::RoundMode), true);
        Ok(())
    }

    fn post_chain(&self, output: &OutputParam, out: OutputId) -> Result<()> {
        if !out.supports_post_chain() {
            return Ok(());
        }
        let regs = self.regs();
        if !output.is_enabled() {
            if self.may_disable(out) {
                regs.set_flag(Field::Post(out, ScaleField::Enable), false);
            }
            return Ok(());
        }

        let img_w = regs.get_field(Field::Poly(out, ScaleField::DstWidth));
        let img_h = regs.get_field(Field::Poly(out, ScaleField::DstHeight));
        let plan = plan_post(img_w, img_h, output.width, output.height)?;

        regs.set_flag(Field::Post(out, ScaleField::Enable), plan.enable);
        regs.set_field(Field::Post(out, ScaleField::SrcWidth), plan.img_width);
        regs.set_field(Field::Post(out, ScaleField::SrcHeight), plan.img_height);
        regs.set_field(Field::Post(out, ScaleField::DstWidth), plan.dst_width);
        regs.set_field(Field::Post(out, ScaleField::DstHeight), plan.dst_height);
        regs.set_field(Field::Post(out, ScaleField::HRatio), plan.h_ratio);
        regs.set_field(Field::Post(out, ScaleField::VRatio), plan.v_ratio);
        regs.set_field(Field::Post(out, ScaleField::HCoef), plan.h_coef as u32);
        regs.set_field(Field::Post(out, ScaleField::VCoef), plan.v_coef as u32);
        regs.set_field(Field::Post(out, ScaleField::HPhaseOffset), plan.h_phase);
        regs.set_field(Field::Post(out, ScaleField::VPhaseOffset), plan.v_phase);
        regs.set_flag(Field::Post(out, ScaleField::RoundMode), true);
        Ok(())
    }

    fn flip(&self, output: &OutputParam, out: OutputId) {
        if output.dma_cmd {
            self.regs()
                .set_field(Field::Output(out, OutputField::Flip), output.flip as u32);
        }
    }

    fn otf_output(&self, output: &OutputParam, out: OutputId) -> Result<()> {
        if !self.shared.cap().has_out_otf(out) {
            return Ok(());
        }
        let regs = self.regs();
        if !output.otf_cmd {
            if self.may_disable(out) {
                regs.set_flag(Field::Output(out, OutputField::OtfEnable), false);
            }
            return Ok(());
        }

        let limits = ScaleLimits::from(&self.shared.config.scaler);
        check_format(
            IoType::OtfOutput(output.otf_format),
            output.otf_bitwidth,
            output.width,
            output.height,
            &limits,
        )?;
        regs.set_flag(Field::Output(out, OutputField::OtfEnable), true);
        regs.set_field(Field::Output(out, OutputField::OtfPath), out.index() as u32);
        Ok(())
    }

    /// Program the write DMA of `out` for the sizes the scaler stages
    /// committed. Also used for the DS port.
    pub(crate) fn dma_output(&self, ctx: &mut EngineCtx, output: &OutputParam, out: OutputId) -> Result<()> {
        if !self.shared.cap().has_out_dma(out) {
            return Ok(());
        }
        let regs = self.regs();
        if !output.dma_cmd {
            if self.may_disable(out) {
                regs.set_flag(Field::Wdma(out, WdmaField::Enable), false);
            }
            return Ok(());
        }

        let (width, height) = (output.width, output.height);
        let limits = ScaleLimits::from(&self.shared.config.scaler);
        check_format(IoType::DmaOutput(output.dma_format), output.dma_bitwidth, width, height, &limits)?;

        let (img_format, conv420) = match output_img_format(output.dma_format, output.plane, output.dma_order) {
            Ok(v) => {
                ctx.out_img_format[out.index()] = v;
                v
            }
            Err(e) => {
                tracing::warn!("{}: {} invalid wdma image format ({})", self.id, out, e);
                ctx.out_img_format[out.index()]
            }
        };
        regs.set_field(Field::Wdma(out, WdmaField::Format), img_format as u32);
        regs.set_flag(Field::Wdma(out, WdmaField::Conv420), conv420);

        if out.supports_post_chain() && !out.is_ds() {
            let post_w = regs.get_field(Field::Post(out, ScaleField::DstWidth));
            let post_h = regs.get_field(Field::Post(out, ScaleField::DstHeight));
            if let Err(e) = check_post_size(post_w, post_h, width, height) {
                tracing::debug!("{}: {} invalid scaled size: {}", self.id, out, e);
                return Err(e.into());
            }
        }

        regs.set_field(Field::Wdma(out, WdmaField::Width), width);
        regs.set_field(Field::Wdma(out, WdmaField::Height), height);
        regs.set_field(Field::Wdma(out, WdmaField::StrideY), output.dma_stride_y);
        regs.set_field(Field::Wdma(out, WdmaField::StrideC), output.dma_stride_c);
        regs.set_field(
            Field::Wdma(out, WdmaField::BitType10),
            bit_type_10(output.dma_bitwidth, output.plane),
        );

        if output.plane == PLANE_8P2 {
            let stride = stride_2bit(width);
            regs.set_field(Field::Wdma(out, WdmaField::StrideY2bit), stride);
            regs.set_field(Field::Wdma(out, WdmaField::StrideC2bit), stride);
        }
        Ok(())
    }

    fn output_yuvrange(&self, ctx: &EngineCtx, output: &OutputParam, out: OutputId, instance: u32) {
        let regs = self.regs();
        if !output.dma_cmd {
            if self.may_disable(out) {
                regs.set_flag(Field::Bchs(out, BchsField::Enable), false);
            }
            return;
        }

        let setfile = if self.hw_state().test(HwState::TUNESET) {
            ctx.setfile(instance)
        } else {
            None
        };
        let bchs = range_settings(output.yuv_range, setfile);
        tracing::debug!("{}: {} yuv range {:?} (setfile {})", self.id, out, output.yuv_range, setfile.is_some());

        regs.set_flag(Field::Bchs(out, BchsField::Enable), true);
        regs.set_field(Field::Bchs(out, BchsField::YOffset), bchs.base.y_offset);
        regs.set_field(Field::Bchs(out, BchsField::YGain), bchs.base.y_gain);
        regs.set_field(Field::Bchs(out, BchsField::CGain00), bchs.base.c_gain00);
        regs.set_field(Field::Bchs(out, BchsField::CGain01), bchs.base.c_gain01);
        regs.set_field(Field::Bchs(out, BchsField::CGain10), bchs.base.c_gain10);
        regs.set_field(Field::Bchs(out, BchsField::CGain11), bchs.base.c_gain11);
        regs.set_field(Field::Bchs(out, BchsField::ClampYMax), bchs.clamp.y_max);
        regs.set_field(Field::Bchs(out, BchsField::ClampYMin), bchs.clamp.y_min);
        regs.set_field(Field::Bchs(out, BchsField::ClampCMax), bchs.clamp.c_max);
        regs.set_field(Field::Bchs(out, BchsField::ClampCMin), bchs.clamp.c_min);
    }

    fn hwfc_output(&self, output: &OutputParam, out: OutputId) {
        if !self.shared.cap().has_out_hwfc(out) || !output.hwfc {
            return;
        }
        tracing::debug!(
            "{}: {} hwfc config {}x{} {:?} plane {}",
            self.id,
            out,
            output.width,
            output.height,
            output.dma_format,
            output.plane
        );
        let regs = self.regs();
        regs.set_field(Field::Hwfc(out, HwfcField::Format), output.dma_format as u32);
        regs.set_field(Field::Hwfc(out, HwfcField::Plane), output.plane);
        regs.set_field(Field::Hwfc(out, HwfcField::IdOffset), out.index() as u32 * HWFC_IDS_PER_OUTPUT);
        regs.set_field(Field::Hwfc(out, HwfcField::Width), output.width);
        regs.set_field(Field::Hwfc(out, HwfcField::Height), output.height);
    }

    /// Select the outputs the HWFC handshake runs on.
    ///
    /// A preview shot leaves the mode alone unless it reuses a port the
    /// previous reprocessing shot ran HWFC on, in which case the mode is
    /// rewritten so the handshake stops.
    fn hwfc_mode(&self, ctx: &EngineCtx, instance: u32, hwfc_ids: OutputMask, dma_ids: OutputMask) {
        let cap = self.shared.cap();
        if !cap.hwfc {
            return;
        }
        if cap.enable_shared_output && hwfc_ids.is_empty() {
            return;
        }
        let reprocessing = ctx.instances.get(&instance).is_some_and(|i| i.reprocessing);
        if !reprocessing && (ctx.prev_hwfc & dma_ids).is_empty() {
            return;
        }

        let regs = self.regs();
        for out in cap.outputs() {
            let config = self.is_path_owner(out);
            let dma_on = regs.get_field(Field::Wdma(out, WdmaField::Enable)) != 0;
            if (config && hwfc_ids.has(out)) || dma_on {
                tracing::debug!("{}: hwfc mode {:?}", self.id, hwfc_ids);
                regs.set_field(Field::Ctrl(CtrlField::HwfcMode), hwfc_ids.bits() as u32);
                break;
            }
        }
    }

    /// Configure the DJAG pre-filter for the largest requested output
    fn update_djag(&self, ctx: &mut EngineCtx, param: &McsParam, instance: u32) {
        let cap = self.shared.cap();
        let (in_w, in_h) = param.input.scaler_input_size();
        let regs = self.regs();

        if !cap.djag || djag_input(ctx.video_mode) != self.id {
            ctx.djag = Some(DjagPlan::disabled(in_w, in_h));
            if cap.djag {
                regs.set_flag(Field::Djag(DjagField::Enable), false);
            }
            return;
        }

        let (req_w, req_h) = cap
            .outputs()
            .filter(|out| !out.is_ds() && ctx.out_en.has(*out))
            .map(|out| param.output(out))
            .filter(|o| o.is_enabled())
            .fold((0, 0), |(w, h), o| (w.max(o.width), h.max(o.height)));

        let limits = DjagLimits::from(&self.shared.config.scaler);
        let plan = plan_djag(in_w, in_h, req_w, req_h, &limits);
        ctx.djag = Some(plan);

        regs.set_flag(Field::Djag(DjagField::Enable), plan.enabled);
        if !plan.enabled {
            return;
        }
        tracing::debug!(
            "{}: DJAG {}x{} -> {}x{} (bucket {})",
            self.id,
            plan.input_width,
            plan.input_height,
            plan.output_width,
            plan.output_height,
            plan.bucket
        );

        regs.set_field(Field::Djag(DjagField::InputSel), self.id.index() as u32);
        regs.set_field(Field::Djag(DjagField::SrcWidth), plan.input_width);
        regs.set_field(Field::Djag(DjagField::SrcHeight), plan.input_height);
        regs.set_field(Field::Djag(DjagField::DstWidth), plan.output_width);
        regs.set_field(Field::Djag(DjagField::DstHeight), plan.output_height);
        regs.set_field(Field::Djag(DjagField::HRatio), plan.h_ratio);
        regs.set_field(Field::Djag(DjagField::VRatio), plan.v_ratio);
        regs.set_field(Field::Djag(DjagField::HPhase), 0);
        regs.set_field(Field::Djag(DjagField::VPhase), 0);
        regs.set_flag(Field::Djag(DjagField::RoundMode), true);

        let Some(setfile) = ctx.setfile(instance) else {
            return;
        };
        let t = setfile.djag[plan.bucket.min(setfile.djag.len() - 1)];
        regs.set_field(Field::Djag(DjagField::DejagWeight0), t.dejagging_weight0);
        regs.set_field(Field::Djag(DjagField::DejagWeight1), t.dejagging_weight1);
        regs.set_field(Field::Djag(DjagField::HfBoostWeight), t.hf_boost_weight);
        regs.set_field(Field::Djag(DjagField::CenterHfBoostWeight), t.center_hf_boost_weight);
        regs.set_field(Field::Djag(DjagField::DiagonalHfBoostWeight), t.diagonal_hf_boost_weight);
        regs.set_field(Field::Djag(DjagField::CenterWeightedMeanWeight), t.center_weighted_mean_weight);
        regs.set_field(Field::Djag(DjagField::Thres1x5MatchingSad), t.thres_1x5_matching_sad);
        regs.set_field(Field::Djag(DjagField::Thres1x5Abshf), t.thres_1x5_abshf);
        regs.set_field(Field::Djag(DjagField::ThresShootingLlcrr), t.thres_shooting_llcrr);
        regs.set_field(Field::Djag(DjagField::ThresShootingLcr), t.thres_shooting_lcr);
        regs.set_field(Field::Djag(DjagField::ThresShootingNeighbor), t.thres_shooting_neighbor);
        regs.set_field(Field::Djag(DjagField::ThresShootingUucdd), t.thres_shooting_uucdd);
        regs.set_field(Field::Djag(DjagField::ThresShootingUcd), t.thres_shooting_ucd);
        regs.set_field(Field::Djag(DjagField::MinMaxWeight), t.min_max_weight);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mcsc_core::config::Config;
    use mcsc_core::param::{DmaFormat, DmaOrder};
    use mcsc_core::{EngineId, Rect, RegisterFile};
    use mcsc_scaler::RATIO_ONE;

    use crate::ops::{HwIp, InitRequest};
    use crate::pair::McscPair;

    const OUT0: OutputId = OutputId::new(0);
    const OUT1: OutputId = OutputId::new(1);
    const OUT2: OutputId = OutputId::new(2);

    fn dma_out(crop: Rect, width: u32, height: u32) -> OutputParam {
        OutputParam {
            dma_cmd: true,
            dma_format: DmaFormat::Yuv420,
            dma_bitwidth: 8,
            dma_order: DmaOrder::CbCr,
            plane: 2,
            crop,
            width,
            height,
            dma_stride_y: width,
            dma_stride_c: width,
            ..Default::default()
        }
    }

    fn capture_param() -> McsParam {
        let mut param = McsParam::default();
        param.input = InputParam {
            dma_cmd: true,
            dma_format: DmaFormat::Yuv422,
            dma_bitwidth: 8,
            dma_order: DmaOrder::YCbYCr,
            plane: 1,
            width: 4032,
            height: 3024,
            dma_crop: Rect::new(16, 12, 4000, 3000),
            dma_stride_y: 4032 * 2,
            ..Default::default()
        };
        *param.output_mut(OUT0) = dma_out(Rect::full(4000, 3000), 4000, 3000);
        *param.output_mut(OUT1) = dma_out(Rect::full(4000, 3000), 640, 480);
        param
    }

    fn setup(param: &McsParam, outputs: OutputMask) -> (McscPair, Arc<RegisterFile>) {
        let regs0 = Arc::new(RegisterFile::new("mcsc0"));
        let regs1 = Arc::new(RegisterFile::new("mcsc1"));
        let (pair, _events) = McscPair::new(Config::default(), regs0.clone(), regs1);
        let engine = pair.engine(EngineId::Mcsc0);
        engine.open(0).unwrap();
        engine
            .init(
                0,
                &InitRequest {
                    outputs,
                    ..Default::default()
                },
            )
            .unwrap();
        engine.set_param(0, param).unwrap();
        (pair, regs0)
    }

    #[test]
    fn test_post_chain_only_where_needed() {
        let (pair, regs) = setup(&capture_param(), OutputMask::OUT0 | OutputMask::OUT1);
        let engine = pair.engine(EngineId::Mcsc0);
        engine.update_param(&mut engine.ctx.lock(), 0).unwrap();

        assert_eq!(regs.field(Field::Input(InputField::Width)), 4000);
        assert_eq!(regs.field(Field::Poly(OUT0, ScaleField::HRatio)), RATIO_ONE);
        assert_eq!(regs.field(Field::Poly(OUT0, ScaleField::VRatio)), RATIO_ONE);
        assert_eq!(regs.field(Field::Post(OUT0, ScaleField::Enable)), 0);

        let poly_w = regs.field(Field::Poly(OUT1, ScaleField::DstWidth));
        assert!(poly_w > 640 && poly_w < 4000);
        assert_eq!(regs.field(Field::Post(OUT1, ScaleField::Enable)), 1);
        assert_eq!(regs.field(Field::Post(OUT1, ScaleField::DstWidth)), 640);
        assert_eq!(regs.field(Field::Wdma(OUT1, WdmaField::Width)), 640);
    }

    #[test]
    fn test_disabled_output_of_sibling_left_alone() {
        let (pair, regs) = setup(&capture_param(), OutputMask::all());
        let engine = pair.engine(EngineId::Mcsc0);

        regs.poke(Field::Poly(OUT2, ScaleField::Enable), 1);
        regs.poke(Field::Output(OUT2, OutputField::ScalerPath), EngineId::Mcsc1.index() as u32);
        pair.shared().ownership.lock().claim(OUT2, EngineId::Mcsc1);
        engine.update_param(&mut engine.ctx.lock(), 0).unwrap();
        assert_eq!(regs.field(Field::Poly(OUT2, ScaleField::Enable)), 1);

        pair.shared().ownership.lock().release(OUT2);
        regs.poke(Field::Output(OUT2, OutputField::ScalerPath), EngineId::Mcsc0.index() as u32);
        engine.update_param(&mut engine.ctx.lock(), 0).unwrap();
        assert_eq!(regs.field(Field::Poly(OUT2, ScaleField::Enable)), 0);
    }

    #[test]
    fn test_bad_output_format_reported_other_ports_programmed() {
        let mut param = capture_param();
        param.output_mut(OUT0).dma_bitwidth = 12;
        let (pair, regs) = setup(&param, OutputMask::OUT0 | OutputMask::OUT1);
        let engine = pair.engine(EngineId::Mcsc0);

        assert!(engine.update_param(&mut engine.ctx.lock(), 0).is_err());
        assert_eq!(regs.field(Field::Post(OUT1, ScaleField::Enable)), 1);
        assert_eq!(regs.field(Field::Wdma(OUT1, WdmaField::Width)), 640);
    }
}
