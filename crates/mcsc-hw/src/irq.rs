//! Interrupt handling and frame completion

use std::sync::atomic::Ordering;

use mcsc_core::regs::{CtrlField, DsField, Field, InputField, IntrStatus, ShadowCtrl, WdmaField, YsumField};
use mcsc_core::{DoneType, Frame, FrameEvent, McscError, OutputId, OutputMask, Reg};

use crate::engine::{EngineCtx, McscEngine};
use crate::state::HwState;

/// Error bits and their log names
const ERROR_BITS: [(IntrStatus, &str); 6] = [
    (IntrStatus::OVERFLOW, "overflow"),
    (IntrStatus::OUTSTALL, "output stall"),
    (IntrStatus::INPUT_VERTICAL_UNF, "input vertical underflow"),
    (IntrStatus::INPUT_VERTICAL_OVF, "input vertical overflow"),
    (IntrStatus::INPUT_HORIZONTAL_UNF, "input horizontal underflow"),
    (IntrStatus::INPUT_HORIZONTAL_OVF, "input horizontal overflow"),
];

impl McscEngine {
    /// Interrupt entry point. Never fails; problems are logged and folded
    /// into the frame outcome.
    pub(crate) fn irq(&self) {
        let regs = self.regs();
        if !self.hw_state().test(HwState::OPEN) {
            tracing::warn!("{}: invalid interrupt", self.id);
            return;
        }

        let h_lines = regs.get_field(Field::Input(InputField::StatusHLines));
        let v_lines = regs.get_field(Field::Input(InputField::StatusVLines));
        let raw = regs.get_register(Reg::IntrStatus) & !regs.get_register(Reg::IntrMask);
        regs.set_register(Reg::IntrClear, raw);
        let status = IntrStatus::from_bits_truncate(raw);

        if !self.hw_state().test(HwState::RUN) {
            tracing::info!(
                "{}: interrupt 0x{:x} while stopped ({} x {} lines)",
                self.id,
                raw,
                h_lines,
                v_lines
            );
            return;
        }

        let fcount = self.counters.fcount.load(Ordering::Acquire);
        let errors = status & IntrStatus::ERRORS;
        for (bit, name) in ERROR_BITS {
            if errors.contains(bit) {
                tracing::error!("{}: [F:{}] {} ({} x {} lines)", self.id, fcount, name, h_lines, v_lines);
            }
        }
        if status.contains(IntrStatus::WDMA_FINISH) {
            tracing::error!("{}: [F:{}] unexpected WDMA finish interrupt", self.id, fcount);
        }

        {
            let mut ctx = self.ctx.lock();
            if !errors.is_empty() {
                ctx.frame_error = true;
            }
            if status.contains(IntrStatus::FRAME_START) {
                self.frame_start(&mut ctx);
            }
            if status.contains(IntrStatus::FRAME_END) {
                self.frame_end(&mut ctx);
            }
        }

        if !errors.is_empty() {
            tracing::info!("{}: [F:{}] interrupt errors {:?}", self.id, fcount, errors);
            if self.shared.config.debug.dump_on_error {
                self.dump_regs();
            }
            self.dump_sizes();
        }
    }

    fn frame_start(&self, ctx: &mut EngineCtx) {
        let regs = self.regs();
        let buffers = ctx.num_buffers;
        self.counters.fs.fetch_add(buffers, Ordering::AcqRel);
        ctx.cur_s_int += 1;

        if ctx.cur_s_int == 1 {
            let head = ctx.mframe.as_ref().or(ctx.wait_done.front());
            if let Some(frame) = head {
                tracing::trace!("{}: [F:{}] frame start", self.id, frame.fcount);
                self.events.send(FrameEvent::Start {
                    engine: self.id,
                    instance: frame.instance,
                    fcount: frame.fcount,
                    frame: frame.id,
                });
            }
            if ctx.otf_input {
                self.hw_state().clear(HwState::CONFIG);
            }
            self.vvalid.set_valid();
        }

        if ctx.otf_input {
            regs.set_register(Reg::ShadowCtrl, ShadowCtrl::WriteStart as u32);
        }

        if ctx.cur_s_int < buffers {
            // Program sub-frame K+1 while the hardware runs sub-frame K
            let Some(mut mframe) = ctx.mframe.take() else {
                tracing::error!("{}: burst of {} without a frame", self.id, buffers);
                return;
            };
            mframe.cur_buf_index = ctx.cur_s_int;
            if let Some(param) = ctx.param(mframe.instance).cloned() {
                self.wdma_cfg(ctx, &mframe, &param);
                if let Err(e) = self.rdma_cfg(&mframe, &param.input) {
                    tracing::error!(
                        "{}: [F:{}] burst buffer {}: {}",
                        self.id,
                        mframe.fcount,
                        mframe.cur_buf_index,
                        e
                    );
                }
            }
            tracing::debug!(
                "{}: [F:{}] burst buffer {}/{}",
                self.id,
                mframe.fcount,
                mframe.cur_buf_index,
                buffers
            );
            ctx.mframe = Some(mframe);
        } else if !ctx.otf_input {
            regs.set_flag(Field::Ctrl(CtrlField::ScalerEnable), false);
        }
    }

    fn frame_end(&self, ctx: &mut EngineCtx) {
        let buffers = ctx.num_buffers;
        self.counters.fe.fetch_add(buffers, Ordering::AcqRel);
        ctx.cur_e_int += 1;
        if ctx.cur_e_int < buffers {
            return;
        }

        let result = if std::mem::take(&mut ctx.frame_error) {
            DoneType::Overflow
        } else {
            DoneType::Success
        };
        self.frame_done(ctx, None, result);
        self.vvalid.set_blank();

        let fs = self.counters.fs.load(Ordering::Acquire);
        let fe = self.counters.fe.load(Ordering::Acquire);
        if fs < fe {
            let err = McscError::FrameAccountingAnomaly {
                engine: self.id,
                start: fs,
                end: fe,
            };
            tracing::error!("{}", err);
            self.dump_regs();
        }
        ctx.mframe = None;
    }

    /// Report the outputs of a request and release the ports it drained.
    ///
    /// `frame` is `None` for a hardware completion, which takes the oldest
    /// armed request.
    fn frame_done(&self, ctx: &mut EngineCtx, frame: Option<Frame>, result: DoneType) {
        let regs = self.regs();
        if self.hw_state().test_and_clear(HwState::DS_CFG) {
            regs.set_flag(Field::Wdma(OutputId::DS, WdmaField::Enable), false);
            regs.set_flag(Field::Ds(DsField::Enable), false);
        }
        if self.hw_state().test_and_clear(HwState::YSUM_CFG) {
            regs.set_flag(Field::Ysum(YsumField::Enable), false);
        }

        let frame = match frame {
            Some(frame) => frame,
            None => match ctx.wait_done.pop_front() {
                Some(frame) => frame,
                None => {
                    tracing::error!("{}: frame done without an armed request", self.id);
                    return;
                }
            },
        };

        let mut reported = OutputMask::empty();
        for out in frame.out_flag.outputs() {
            self.events.send(FrameEvent::Done {
                engine: self.id,
                instance: frame.instance,
                fcount: frame.fcount,
                frame: frame.id,
                outputs: OutputMask::from_output(out),
                result,
            });
            reported.insert_output(out);
        }

        {
            let mut own = self.shared.ownership.lock();
            for out in frame.out_flag.outputs() {
                if own.held_by(out, self.id) {
                    own.release(out);
                }
            }
        }

        if reported.is_empty() {
            self.events.send(FrameEvent::CoreEnd {
                engine: self.id,
                instance: frame.instance,
                fcount: frame.fcount,
                result,
            });
        } else {
            self.counters.dma.fetch_add(1, Ordering::AcqRel);
        }
        tracing::debug!(
            "{}: [F:{}] done {:?} outputs {:?}",
            self.id,
            frame.fcount,
            result,
            reported
        );
    }

    pub(crate) fn frame_ndone_impl(&self, frame: &Frame, result: DoneType) {
        let mut ctx = self.ctx.lock();
        ctx.wait_done.retain(|f| f.id != frame.id);
        if ctx.mframe.as_ref().is_some_and(|m| m.id == frame.id) {
            ctx.mframe = None;
        }
        self.frame_done(&mut ctx, Some(frame.clone()), result);
    }
}
