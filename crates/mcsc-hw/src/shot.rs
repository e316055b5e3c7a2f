//! Per-request configuration

use std::sync::atomic::Ordering;

use mcsc_core::regs::{CtrlField, Field, RdmaField, ShadowCtrl, TdnrField, YsumField};
use mcsc_core::{Frame, McscError, Reg, Result};

use crate::engine::McscEngine;
use crate::state::HwState;

/// Frame-rate optimisation is not used; the engine runs one shot per request
const LFRO_MODE_OFF: u32 = 0;

impl McscEngine {
    /// Configure one request and arm the engine.
    ///
    /// A memory-fed shot, or the first shot of a streamed session, asserts
    /// the start bit. Later streamed shots only latch shadow registers.
    pub(crate) fn shot_impl(&self, mut frame: Frame) -> Result<()> {
        let instance = frame.instance;
        self.require(HwState::INIT, instance)?;
        let state = self.hw_state().engine_state();
        if !self.hw_state().test(HwState::RUN) || self.hw_state().test(HwState::ERROR) {
            tracing::warn!("{}: [F:{}] shot refused in state {}", self.id, frame.fcount, state.name());
            return Err(McscError::InvalidState {
                engine: self.id,
                state: state.name(),
            });
        }

        let _pair = self.shared.config_lock.lock();
        let mut ctx = self.ctx.lock();
        let cap = self.shared.cap();
        let regs = self.regs();

        let otf = frame.group.otf_input;
        ctx.otf_input = otf;
        ctx.video_mode = frame.group.video_mode;
        let start = !otf || (!self.hw_state().test(HwState::CONFIG) && !frame.group.streaming);
        self.counters.fcount.store(frame.fcount, Ordering::Release);

        tracing::debug!(
            "{}: [F:{}] shot {:?} buffers {} (start {}, otf {})",
            self.id,
            frame.fcount,
            frame.kind,
            frame.num_buffers,
            start,
            otf
        );

        if !frame.is_internal() {
            ctx.back_param = ctx.param(instance).cloned();
            if let Err(e) = self.update_param(&mut ctx, instance) {
                tracing::warn!("{}: [F:{}] parameter update: {}", self.id, frame.fcount, e);
            }
        }
        let param = ctx
            .param(instance)
            .cloned()
            .ok_or(McscError::NotInitialized {
                engine: self.id,
                instance,
            })?;

        ctx.cur_s_int = 0;
        ctx.cur_e_int = 0;
        ctx.num_buffers = frame.num_buffers.max(1);
        frame.cur_buf_index = 0;
        ctx.mframe = if ctx.num_buffers > 1 {
            Some(frame.clone())
        } else {
            None
        };

        self.rdma_cfg(&frame, &param.input)?;
        self.wdma_cfg(&ctx, &frame, &param);
        regs.set_field(Field::Ctrl(CtrlField::LfroMode), LFRO_MODE_OFF);

        if let Err(e) = self.update_dsvra(&mut ctx, &frame, &param) {
            tracing::warn!("{}: [F:{}] DS config: {}", self.id, frame.fcount, e);
        }
        self.update_tdnr(&mut ctx, &frame, &param, start);
        self.update_cac(&mut ctx, &frame);
        self.update_uvsp(&mut ctx, &frame);
        if let Err(e) = self.update_ysum(&frame, &param) {
            tracing::warn!("{}: [F:{}] YSUM config: {}", self.id, frame.fcount, e);
            regs.set_flag(Field::Ysum(YsumField::Enable), false);
        }

        if otf && !start {
            regs.set_register(Reg::ShadowCtrl, ShadowCtrl::WriteFinish as u32);
        }

        if start {
            regs.set_flag(Field::Ctrl(CtrlField::ScalerEnable), true);
            regs.set_field(Field::Tdnr(TdnrField::RdmaStart), ctx.tdnr.mode as u32);
            if param.input.dma_cmd && cap.in_dma {
                regs.set_flag(Field::Rdma(RdmaField::Start), true);
            }
        }

        self.shared.ownership.lock().set_reset_check(false);
        self.hw_state().set(HwState::CONFIG);
        ctx.wait_done.push_back(frame);
        Ok(())
    }
}
