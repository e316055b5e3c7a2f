//! Read and write DMA address programming

use mcsc_core::param::InputParam;
use mcsc_core::regs::{DsField, Field, RdmaField, WdmaField};
use mcsc_core::{DmaPath, Frame, McsParam, McscError, OutputId, Result};

use crate::engine::{EngineCtx, McscEngine, WDMA_BUF_SLOTS};

/// Planes of the 8+2 bit layout
const PLANE_8P2: u32 = 4;

/// Register planes for a set of frame addresses.
///
/// The 8+2 layout carries the two 2-bit planes in address slots 2 and 3;
/// they land in register planes 3 and 4 and plane 2 stays unused.
fn plane_layout(planes: u32, addrs: [u32; 4]) -> [(u8, u32); 5] {
    if planes == PLANE_8P2 {
        [(0, addrs[0]), (1, addrs[1]), (2, 0), (3, addrs[2]), (4, addrs[3])]
    } else {
        [(0, addrs[0]), (1, addrs[1]), (2, addrs[2]), (3, 0), (4, 0)]
    }
}

impl McscEngine {
    /// Point the read DMA at the current buffer slot of `frame`
    pub(crate) fn rdma_cfg(&self, frame: &Frame, input: &InputParam) -> Result<()> {
        if !self.shared.cap().in_dma || !input.dma_cmd {
            return Ok(());
        }

        let planes = input.plane.min(4);
        let mut addrs = [0u32; 4];
        for (i, addr) in addrs.iter_mut().enumerate().take(planes as usize) {
            *addr = frame.input_addr(planes, frame.cur_buf_index, i as u32);
        }
        tracing::debug!(
            "{}: [F:{}] rdma_cfg addr 0x{:x} (buf {})",
            self.id,
            frame.fcount,
            addrs[0],
            frame.cur_buf_index
        );

        if addrs[0] == 0 {
            tracing::error!("{}: [F:{}] wrong rdma address", self.id, frame.fcount);
            self.clear_rdma_addr();
            return Err(McscError::InvalidAddress {
                path: DmaPath::Rdma,
                index: frame.cur_buf_index,
            });
        }

        let regs = self.regs();
        regs.set_field(Field::Rdma(RdmaField::FrameSeq), 1);
        for (plane, addr) in plane_layout(planes, addrs) {
            if plane < 3 || planes == PLANE_8P2 {
                regs.set_field(Field::Rdma(RdmaField::Addr(plane)), addr);
            }
        }
        Ok(())
    }

    /// Arm every bound output that has a destination this shot, and tear
    /// down the ones that do not.
    pub(crate) fn wdma_cfg(&self, ctx: &EngineCtx, frame: &Frame, param: &McsParam) {
        let cap = self.shared.cap();
        let regs = self.regs();

        for out in cap.outputs() {
            if !cap.has_out_dma(out) || !ctx.out_en.has(out) {
                continue;
            }
            let output = param.output(out);
            let base = frame.output_addrs[out.index()].first().copied().unwrap_or(0);
            tracing::debug!(
                "{}: [F:{}] wdma_cfg [T:{:?}] {} addr 0x{:x}",
                self.id,
                frame.fcount,
                frame.kind,
                out,
                base
            );

            if !output.dma_cmd || base == 0 || frame.is_internal() {
                self.wdma_clear(out);
                continue;
            }

            {
                let mut own = self.shared.ownership.lock();
                if cap.enable_shared_output && own.busy_elsewhere(out, self.id) && !frame.is_multi() {
                    tracing::warn!(
                        "{}: {} DMA output in use by {:?} [F:{}]",
                        self.id,
                        out,
                        own.owner(out),
                        frame.fcount
                    );
                    continue;
                }
                own.claim(out, self.id);
            }

            if !out.is_ds() {
                regs.set_flag(Field::Wdma(out, WdmaField::Enable), true);
            }
            let slot = frame.cur_buf_index % WDMA_BUF_SLOTS as u32;
            regs.set_field(Field::Wdma(out, WdmaField::FrameSeq), 1u32.checked_shl(slot).unwrap_or(1));

            // Slots are armed up front and reused as a ring past the last one
            let planes = output.plane.min(4);
            let bufs = if frame.cur_buf_index == 0 {
                0..frame.num_buffers.min(WDMA_BUF_SLOTS as u32)
            } else if frame.cur_buf_index >= WDMA_BUF_SLOTS as u32 {
                frame.cur_buf_index..frame.cur_buf_index + 1
            } else {
                0..0
            };
            for buf in bufs {
                let mut addrs = [0u32; 4];
                for (i, addr) in addrs.iter_mut().enumerate().take(planes as usize) {
                    // Fewer buffers than the leader: reuse the first slot
                    *addr = match frame.output_addr(out, planes, buf, i as u32) {
                        0 => frame.output_addr(out, planes, 0, i as u32),
                        a => a,
                    };
                }
                let slot = (buf % WDMA_BUF_SLOTS as u32) as u8;
                for (plane, addr) in plane_layout(planes, addrs) {
                    if plane < 3 || planes == PLANE_8P2 {
                        regs.set_field(Field::Wdma(out, WdmaField::Addr { buf: slot, plane }), addr);
                    }
                }
            }
        }
    }

    /// Disable a write DMA unless the sibling is still draining through it
    pub(crate) fn wdma_clear(&self, out: OutputId) {
        let regs = self.regs();
        let enabled = regs.get_field(Field::Wdma(out, WdmaField::Enable)) != 0;
        if !enabled || self.shared.shared_out_busy(out, self.id) {
            return;
        }

        regs.set_flag(Field::Wdma(out, WdmaField::Enable), false);
        self.clear_wdma_addr(out);
        tracing::debug!("{}: {} dma out disabled", self.id, out);

        if out.is_ds() {
            regs.set_flag(Field::Ds(DsField::Enable), false);
            tracing::debug!("{}: DS off", self.id);
        }
    }

    pub(crate) fn clear_wdma_addr(&self, out: OutputId) {
        let regs = self.regs();
        for buf in 0..WDMA_BUF_SLOTS {
            for plane in 0..5 {
                regs.set_field(Field::Wdma(out, WdmaField::Addr { buf, plane }), 0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_layout_8p2() {
        let layout = plane_layout(4, [0x10, 0x20, 0x30, 0x40]);
        assert_eq!(layout[2], (2, 0));
        assert_eq!(layout[3], (3, 0x30));
        assert_eq!(layout[4], (4, 0x40));
    }

    #[test]
    fn test_plane_layout_3p() {
        let layout = plane_layout(3, [0x10, 0x20, 0x30, 0]);
        assert_eq!(layout[2], (2, 0x30));
        assert_eq!(layout[3], (3, 0));
    }
}
