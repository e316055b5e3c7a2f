//! Diagnostic dumps
//!
//! Both dumps read registers only. They run from the interrupt path while
//! the engine context is locked, so they must not take it.

use mcsc_core::regs::{CtrlField, Field, InputField, RdmaField, ScaleField, TdnrField, WdmaField};
use mcsc_core::Reg;

use crate::engine::McscEngine;

impl McscEngine {
    /// Log the committed input, RDMA and per-output geometry
    pub fn dump_sizes(&self) {
        let regs = self.regs();
        let cap = self.shared.cap();

        tracing::info!(
            "{}: input source {} size {}x{}",
            self.id,
            regs.get_field(Field::Input(InputField::Source)),
            regs.get_field(Field::Input(InputField::Width)),
            regs.get_field(Field::Input(InputField::Height))
        );
        tracing::info!(
            "{}: rdma size {}x{} stride y {} c {}",
            self.id,
            regs.get_field(Field::Rdma(RdmaField::Width)),
            regs.get_field(Field::Rdma(RdmaField::Height)),
            regs.get_field(Field::Rdma(RdmaField::StrideY)),
            regs.get_field(Field::Rdma(RdmaField::StrideC))
        );

        for out in cap.outputs() {
            let poly = |f| regs.get_field(Field::Poly(out, f));
            let post = |f| regs.get_field(Field::Post(out, f));
            let wdma = |f| regs.get_field(Field::Wdma(out, f));
            tracing::info!(
                "{}: {} poly {}x{} -> {}x{}, post {}x{} -> {}x{}, wdma en {} {}x{} stride y {} c {}",
                self.id,
                out,
                poly(ScaleField::SrcWidth),
                poly(ScaleField::SrcHeight),
                poly(ScaleField::DstWidth),
                poly(ScaleField::DstHeight),
                post(ScaleField::SrcWidth),
                post(ScaleField::SrcHeight),
                post(ScaleField::DstWidth),
                post(ScaleField::DstHeight),
                wdma(WdmaField::Enable),
                wdma(WdmaField::Width),
                wdma(WdmaField::Height),
                wdma(WdmaField::StrideY),
                wdma(WdmaField::StrideC)
            );
        }
    }

    /// Log control and status registers
    pub fn dump_regs(&self) {
        let regs = self.regs();
        tracing::info!(
            "{}: version 0x{:08x} status 0x{:08x} mask 0x{:08x} shadow {}",
            self.id,
            regs.get_register(Reg::Version),
            regs.get_register(Reg::IntrStatus),
            regs.get_register(Reg::IntrMask),
            regs.get_register(Reg::ShadowCtrl)
        );
        tracing::info!(
            "{}: enable {} hwfc mode 0x{:x} lfro {} tdnr mode {}",
            self.id,
            regs.get_field(Field::Ctrl(CtrlField::ScalerEnable)),
            regs.get_field(Field::Ctrl(CtrlField::HwfcMode)),
            regs.get_field(Field::Ctrl(CtrlField::LfroMode)),
            regs.get_field(Field::Tdnr(TdnrField::ModeSelect))
        );
        tracing::info!(
            "{}: lines {} x {}, ownership 0x{:x}",
            self.id,
            regs.get_field(Field::Input(InputField::StatusHLines)),
            regs.get_field(Field::Input(InputField::StatusVLines)),
            self.shared.ownership_bits()
        );
    }
}
