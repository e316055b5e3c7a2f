//! Tests for the shot/interrupt pipeline of an engine pair

use std::sync::Arc;

use mcsc_core::config::Config;
use mcsc_core::param::{DmaFormat, DmaOrder, InputParam, OutputParam};
use mcsc_core::regs::{
    CacField, CtrlField, DsField, Field, IntrStatus, RdmaField, TdnrBuf, TdnrField, UvspField, WdmaField,
    YsumField,
};
use mcsc_core::{
    DmaPath, DoneType, EngineId, Frame, FrameEvent, FrameEventReceiver, FrameId, McsParam, McscError, OutputId,
    OutputMask, Rect, RegWrite, RegisterFile, ShotKind, TaaGeometry,
};
use mcsc_hw::{EngineState, HwIp, InitRequest, McscPair};
use mcsc_tuning::cac::{CacCrtThr, CacMapThr};
use mcsc_tuning::{CacFactors, CacTuneset, McscSetfile, SetfileBlob, TdnrMode, UvspCalibration, MCSC_SETFILE_VERSION};

const OUT0: OutputId = OutputId::new(0);
const OUT1: OutputId = OutputId::new(1);
const TDNR_BASE: u32 = 0x8000_0000;

struct Rig {
    pair: McscPair,
    events: FrameEventReceiver,
    regs: [Arc<RegisterFile>; 2],
}

impl Rig {
    fn new(config: Config) -> Self {
        let regs = [Arc::new(RegisterFile::new("mcsc0")), Arc::new(RegisterFile::new("mcsc1"))];
        let (pair, events) = McscPair::new(config, regs[0].clone(), regs[1].clone());
        Self { pair, events, regs }
    }

    fn engine(&self, id: EngineId) -> &dyn HwIp {
        self.pair.engine(id)
    }

    fn regs(&self, id: EngineId) -> &RegisterFile {
        &self.regs[id.index()]
    }

    fn bring_up(&self, id: EngineId, outputs: OutputMask, param: &McsParam) {
        let engine = self.engine(id);
        engine.open(0).unwrap();
        engine
            .init(
                0,
                &InitRequest {
                    reprocessing: false,
                    outputs,
                    sensor_position: 0,
                },
            )
            .unwrap();
        engine.set_param(0, param).unwrap();
        engine.enable(0).unwrap();
    }

    fn fire(&self, id: EngineId, status: IntrStatus) {
        self.regs(id).raise(status.bits());
        self.engine(id).handle_interrupt();
    }

    /// Run every sub-frame of a burst through the interrupt handler
    fn complete(&self, id: EngineId, buffers: u32) {
        for _ in 0..buffers {
            self.fire(id, IntrStatus::FRAME_START);
            self.fire(id, IntrStatus::FRAME_END);
        }
    }
}

fn output(width: u32, height: u32) -> OutputParam {
    OutputParam {
        dma_cmd: true,
        dma_format: DmaFormat::Yuv420,
        dma_bitwidth: 8,
        dma_order: DmaOrder::CbCr,
        plane: 2,
        crop: Rect::full(1920, 1080),
        width,
        height,
        dma_stride_y: width,
        dma_stride_c: width,
        ..Default::default()
    }
}

fn m2m_param(outputs: &[OutputId]) -> McsParam {
    let mut param = McsParam::default();
    param.control.buffer_address = TDNR_BASE;
    param.input = InputParam {
        dma_cmd: true,
        dma_format: DmaFormat::Yuv422,
        dma_bitwidth: 8,
        dma_order: DmaOrder::YCbYCr,
        plane: 1,
        width: 1920,
        height: 1080,
        dma_crop: Rect::full(1920, 1080),
        dma_stride_y: 1920 * 2,
        ..Default::default()
    };
    for out in outputs {
        *param.output_mut(*out) = output(1920, 1080);
    }
    param
}

fn m2m_frame(fcount: u32, buffers: u32, outputs: &[OutputId]) -> Frame {
    let mut frame = Frame::new(FrameId(fcount), 0, fcount);
    frame.num_buffers = buffers;
    frame.group.shot_count = fcount - 1;
    frame.input_addrs = (0..buffers).map(|b| 0x1000_0000 + b * 0x10_0000).collect();
    for out in outputs {
        frame.out_flag.insert_output(*out);
        let base = 0x2000_0000 + out.index() as u32 * 0x0100_0000;
        frame.output_addrs[out.index()] = (0..buffers)
            .flat_map(|b| [base + b * 0x10_0000, base + b * 0x10_0000 + 0x8_0000])
            .collect();
    }
    frame
}

fn done_events(events: &[FrameEvent]) -> Vec<(u32, OutputMask, DoneType)> {
    events
        .iter()
        .filter_map(|e| match e {
            FrameEvent::Done {
                fcount, outputs, result, ..
            } => Some((*fcount, *outputs, *result)),
            _ => None,
        })
        .collect()
}

fn writes_to(writes: &[RegWrite], pred: impl Fn(&Field) -> bool) -> usize {
    writes
        .iter()
        .filter(|w| matches!(w, RegWrite::Field(f, _) if pred(f)))
        .count()
}

#[test]
fn test_single_shot_round_trip() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));
    assert_eq!(rig.engine(id).engine_state(), EngineState::Running);

    rig.engine(id).shot(m2m_frame(1, 1, &[OUT0])).unwrap();
    let regs = rig.regs(id);
    assert_eq!(regs.field(Field::Ctrl(CtrlField::ScalerEnable)), 1);
    assert_eq!(regs.field(Field::Rdma(RdmaField::Start)), 1);
    assert_eq!(regs.field(Field::Rdma(RdmaField::Addr(0))), 0x1000_0000);
    assert_eq!(regs.field(Field::Wdma(OUT0, WdmaField::Enable)), 1);
    assert_eq!(regs.field(Field::Wdma(OUT0, WdmaField::Addr { buf: 0, plane: 1 })), 0x2008_0000);
    assert_eq!(rig.pair.shared().ownership_bits() & 0x7F, 0x3E);

    rig.fire(id, IntrStatus::FRAME_START);
    assert_eq!(regs.field(Field::Ctrl(CtrlField::ScalerEnable)), 0);
    rig.fire(id, IntrStatus::FRAME_END);

    let events = rig.events.drain();
    assert!(matches!(events[0], FrameEvent::Start { fcount: 1, .. }));
    assert_eq!(done_events(&events), vec![(1, OutputMask::OUT0, DoneType::Success)]);

    let counters = rig.pair.engine(id).counters();
    assert_eq!((counters.fs, counters.fe, counters.dma), (1, 1, 1));
    assert_eq!(rig.pair.engine(id).pending_frames(), 0);
    assert_eq!(rig.pair.shared().ownership_bits() & 0x3F, 0x3F);
}

#[test]
fn test_burst_cycles_buffers_in_order() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));
    let regs = rig.regs(id);

    let frame = m2m_frame(1, 3, &[OUT0]);
    let inputs = frame.input_addrs.clone();
    rig.engine(id).shot(frame).unwrap();
    assert_eq!(regs.field(Field::Rdma(RdmaField::Addr(0))), inputs[0]);
    assert_eq!(regs.field(Field::Wdma(OUT0, WdmaField::FrameSeq)), 1);

    for k in 1..3u32 {
        rig.fire(id, IntrStatus::FRAME_START);
        assert_eq!(regs.field(Field::Rdma(RdmaField::Addr(0))), inputs[k as usize]);
        assert_eq!(regs.field(Field::Wdma(OUT0, WdmaField::FrameSeq)), 1 << k);
        assert_eq!(regs.field(Field::Ctrl(CtrlField::ScalerEnable)), 1);

        rig.fire(id, IntrStatus::FRAME_END);
        assert!(done_events(&rig.events.drain()).is_empty());
    }

    rig.fire(id, IntrStatus::FRAME_START);
    assert_eq!(regs.field(Field::Ctrl(CtrlField::ScalerEnable)), 0);
    rig.fire(id, IntrStatus::FRAME_END);

    let done = done_events(&rig.events.drain());
    assert_eq!(done, vec![(1, OutputMask::OUT0, DoneType::Success)]);
    let counters = rig.pair.engine(id).counters();
    assert_eq!(counters.fs, counters.fe);
    assert_eq!(counters.dma, 1);
}

fn assert_sub_frame(regs: &RegisterFile, frame: &Frame, k: u32) {
    let slot = k % 8;
    let base = 0x2000_0000 + k * 0x10_0000;
    assert_eq!(regs.field(Field::Rdma(RdmaField::Addr(0))), frame.input_addrs[k as usize]);
    assert_eq!(regs.field(Field::Wdma(OUT0, WdmaField::FrameSeq)), 1 << slot);
    let addr = |plane| Field::Wdma(OUT0, WdmaField::Addr { buf: slot as u8, plane });
    assert_eq!(regs.field(addr(0)), base, "sub-frame {}", k);
    assert_eq!(regs.field(addr(1)), base + 0x8_0000, "sub-frame {}", k);
}

fn run_long_burst(buffers: u32) {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));
    let regs = rig.regs(id);

    let frame = m2m_frame(1, buffers, &[OUT0]);
    rig.engine(id).shot(frame.clone()).unwrap();
    assert_sub_frame(regs, &frame, 0);

    for k in 1..buffers {
        rig.fire(id, IntrStatus::FRAME_START);
        assert_sub_frame(regs, &frame, k);
        rig.fire(id, IntrStatus::FRAME_END);
        assert!(done_events(&rig.events.drain()).is_empty());
    }

    rig.fire(id, IntrStatus::FRAME_START);
    assert_eq!(regs.field(Field::Ctrl(CtrlField::ScalerEnable)), 0);
    rig.fire(id, IntrStatus::FRAME_END);

    let done = done_events(&rig.events.drain());
    assert_eq!(done, vec![(1, OutputMask::OUT0, DoneType::Success)]);
    let counters = rig.pair.engine(id).counters();
    assert_eq!(counters.fs, counters.fe);
    assert_eq!(counters.dma, 1);
    assert_eq!(rig.pair.engine(id).pending_frames(), 0);
}

#[test]
fn test_burst_fills_every_wdma_slot() {
    run_long_burst(8);
}

#[test]
fn test_burst_one_past_wdma_slots_reuses_first() {
    run_long_burst(9);
}

#[test]
fn test_burst_longer_than_frame_seq_width() {
    run_long_burst(40);
}

#[test]
fn test_tdnr_mode_sequence() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    let mut param = m2m_param(&[OUT0]);
    rig.bring_up(id, OutputMask::OUT0, &param);
    let regs = rig.regs(id);
    let engine = rig.pair.engine(id);
    let buffers = mcsc_tuning::tdnr::buffer_pair(TDNR_BASE, 4032, 3024);

    rig.engine(id).shot(m2m_frame(1, 1, &[OUT0])).unwrap();
    assert_eq!(engine.tdnr_mode(), TdnrMode::TwoFrame);
    assert_eq!(regs.field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image))), buffers[0]);
    rig.complete(id, 1);

    rig.engine(id).shot(m2m_frame(2, 1, &[OUT0])).unwrap();
    assert_eq!(engine.tdnr_mode(), TdnrMode::ThreeFrame);
    assert_eq!(regs.field(Field::Tdnr(TdnrField::RdmaAddr(TdnrBuf::Image))), buffers[0]);
    assert_eq!(regs.field(Field::Tdnr(TdnrField::WdmaAddr(TdnrBuf::Image))), buffers[1]);
    assert_eq!(
        regs.field(Field::Tdnr(TdnrField::ModeSelect)),
        TdnrMode::ThreeFrame as u32
    );
    rig.complete(id, 1);

    param.tdnr_bypass = true;
    rig.engine(id).set_param(0, &param).unwrap();
    rig.engine(id).shot(m2m_frame(3, 1, &[OUT0])).unwrap();
    assert_eq!(engine.tdnr_mode(), TdnrMode::Bypass);
    rig.complete(id, 1);

    param.tdnr_bypass = false;
    rig.engine(id).set_param(0, &param).unwrap();
    rig.engine(id).shot(m2m_frame(4, 1, &[OUT0])).unwrap();
    assert_eq!(engine.tdnr_mode(), TdnrMode::TwoFrame);
}

#[test]
fn test_disable_keeps_output_of_running_sibling() {
    let rig = Rig::new(Config::default());
    let outputs = OutputMask::OUT0 | OutputMask::OUT1;
    rig.bring_up(EngineId::Mcsc0, outputs, &m2m_param(&[OUT0]));
    rig.bring_up(EngineId::Mcsc1, outputs, &m2m_param(&[OUT1]));

    rig.engine(EngineId::Mcsc1).shot(m2m_frame(1, 1, &[OUT1])).unwrap();
    rig.fire(EngineId::Mcsc1, IntrStatus::FRAME_START);

    let addr = Field::Wdma(OUT1, WdmaField::Addr { buf: 0, plane: 0 });
    let sibling = rig.regs(EngineId::Mcsc1);
    assert_ne!(sibling.field(addr), 0);
    assert_eq!(rig.pair.shared().ownership_bits() & OutputMask::OUT1.bits() as u32, 0);

    rig.engine(EngineId::Mcsc0).disable(0).unwrap();
    assert_eq!(rig.engine(EngineId::Mcsc0).engine_state(), EngineState::Initialized);
    assert_ne!(sibling.field(addr), 0);
    assert_eq!(sibling.field(Field::Ctrl(CtrlField::ScalerEnable)), 1);
    assert_eq!(rig.pair.shared().ownership_bits() & OutputMask::OUT1.bits() as u32, 0);

    rig.fire(EngineId::Mcsc1, IntrStatus::FRAME_END);
    assert_eq!(
        done_events(&rig.events.drain()),
        vec![(1, OutputMask::OUT1, DoneType::Success)]
    );

    rig.engine(EngineId::Mcsc1).disable(0).unwrap();
    assert_eq!(sibling.field(addr), 0);
    assert_eq!(rig.pair.shared().ownership_bits() & 0x3F, 0x3F);
}

#[test]
fn test_disable_times_out_on_stuck_frame() {
    let mut config = Config::default();
    config.pipeline.stop_timeout_ms = 10;
    let rig = Rig::new(config);
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));

    rig.engine(id).shot(m2m_frame(1, 1, &[OUT0])).unwrap();
    rig.fire(id, IntrStatus::FRAME_START);

    assert!(rig.engine(id).disable(0).is_ok());
    assert_eq!(rig.engine(id).engine_state(), EngineState::Initialized);
    assert_eq!(rig.regs(id).field(Field::Ctrl(CtrlField::ScalerEnable)), 0);
}

#[test]
fn test_reset_failure_enters_error_recovery() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    let engine = rig.engine(id);
    let param = m2m_param(&[OUT0]);
    engine.open(0).unwrap();
    engine
        .init(
            0,
            &InitRequest {
                outputs: OutputMask::OUT0,
                ..Default::default()
            },
        )
        .unwrap();
    engine.set_param(0, &param).unwrap();

    rig.regs(id).set_reset_stuck(true);
    assert!(matches!(engine.enable(0), Err(McscError::ResetFailed(EngineId::Mcsc0))));
    assert_eq!(engine.engine_state(), EngineState::ErrorRecovery);
    assert!(matches!(
        engine.shot(m2m_frame(1, 1, &[OUT0])),
        Err(McscError::InvalidState { .. })
    ));

    rig.regs(id).set_reset_stuck(false);
    engine.restore(0).unwrap();
    assert_eq!(engine.engine_state(), EngineState::Running);
    assert_eq!(
        rig.regs(id).field(Field::Tdnr(TdnrField::ModeSelect)),
        TdnrMode::Bypass as u32
    );
    engine.shot(m2m_frame(1, 1, &[OUT0])).unwrap();
}

#[test]
fn test_shot_requires_init_and_enable() {
    let rig = Rig::new(Config::default());
    let engine = rig.engine(EngineId::Mcsc1);
    assert!(matches!(
        engine.shot(m2m_frame(1, 1, &[OUT0])),
        Err(McscError::NotInitialized { .. })
    ));

    engine.open(0).unwrap();
    engine.init(0, &InitRequest::default()).unwrap();
    assert_eq!(engine.engine_state(), EngineState::Initialized);
    assert!(matches!(
        engine.shot(m2m_frame(1, 1, &[OUT0])),
        Err(McscError::InvalidState { .. })
    ));
}

#[test]
fn test_missing_input_address_rejects_shot() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));

    let mut frame = m2m_frame(1, 1, &[OUT0]);
    frame.input_addrs.clear();
    assert!(matches!(
        rig.engine(id).shot(frame),
        Err(McscError::InvalidAddress {
            path: DmaPath::Rdma,
            index: 0
        })
    ));
    assert_eq!(rig.pair.engine(id).pending_frames(), 0);
}

#[test]
fn test_error_interrupt_degrades_frame_only() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));

    rig.engine(id).shot(m2m_frame(1, 1, &[OUT0])).unwrap();
    rig.fire(id, IntrStatus::FRAME_START | IntrStatus::OVERFLOW);
    rig.fire(id, IntrStatus::FRAME_END);

    rig.engine(id).shot(m2m_frame(2, 1, &[OUT0])).unwrap();
    rig.complete(id, 1);

    assert_eq!(
        done_events(&rig.events.drain()),
        vec![
            (1, OutputMask::OUT0, DoneType::Overflow),
            (2, OutputMask::OUT0, DoneType::Success),
        ]
    );
    assert_eq!(rig.engine(id).engine_state(), EngineState::Running);
}

#[test]
fn test_interrupt_ignored_before_open() {
    let rig = Rig::new(Config::default());
    rig.fire(EngineId::Mcsc0, IntrStatus::FRAME_START | IntrStatus::FRAME_END);
    assert!(rig.events.drain().is_empty());
    assert_eq!(rig.pair.engine(EngineId::Mcsc0).counters().fs, 0);
}

#[test]
fn test_frame_ndone() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));

    let frame = m2m_frame(1, 1, &[OUT0]);
    rig.engine(id).shot(frame.clone()).unwrap();
    rig.engine(id).frame_ndone(&frame, DoneType::LateFrame).unwrap();
    assert_eq!(rig.pair.engine(id).pending_frames(), 0);

    let mut internal = Frame::new(FrameId(2), 0, 2);
    internal.kind = ShotKind::Internal;
    rig.engine(id).frame_ndone(&internal, DoneType::Unprocessed).unwrap();

    let events = rig.events.drain();
    assert_eq!(done_events(&events), vec![(1, OutputMask::OUT0, DoneType::LateFrame)]);
    assert!(events.contains(&FrameEvent::CoreEnd {
        engine: id,
        instance: 0,
        fcount: 2,
        result: DoneType::Unprocessed,
    }));
    assert_eq!(rig.pair.shared().ownership_bits() & 0x3F, 0x3F);
}

#[test]
fn test_ds_and_ysum_torn_down_at_frame_end() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    let mut param = m2m_param(&[OUT0]);
    *param.output_mut(OutputId::DS) = output(320, 240);
    param.output_mut(OutputId::DS).crop = Rect::default();
    rig.bring_up(id, OutputMask::OUT0 | OutputMask::OUT5, &param);

    let mut frame = m2m_frame(1, 1, &[OUT0, OutputId::DS]);
    frame.ports.ds = Some(OUT0);
    frame.ports.ysum = Some(OUT0);
    rig.engine(id).shot(frame).unwrap();

    let regs = rig.regs(id);
    assert_eq!(regs.field(Field::Ds(DsField::Enable)), 1);
    assert_eq!(regs.field(Field::Ds(DsField::HRatio)), (1920 << 20) / 320);
    assert_eq!(regs.field(Field::Ds(DsField::SrcWidth)), 1920);
    assert_eq!(regs.field(Field::Wdma(OutputId::DS, WdmaField::Width)), 320);
    assert_eq!(regs.field(Field::Ysum(YsumField::Enable)), 1);
    assert_eq!(regs.field(Field::Ysum(YsumField::Width)), 1920);

    rig.complete(id, 1);
    assert_eq!(regs.field(Field::Ds(DsField::Enable)), 0);
    assert_eq!(regs.field(Field::Wdma(OutputId::DS, WdmaField::Enable)), 0);
    assert_eq!(regs.field(Field::Ysum(YsumField::Enable)), 0);

    regs.poke(Field::Ysum(YsumField::ResultHigher), 1);
    regs.poke(Field::Ysum(YsumField::ResultLower), 5);
    let meta = rig.engine(id).get_meta().unwrap();
    assert_eq!(meta.sum(), (1 << 32) | 5);
}

#[test]
fn test_unchanged_noise_index_skips_uvsp_writes() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));
    let regs = rig.regs(id);
    let taa = TaaGeometry {
        binning_x: 1,
        binning_y: 1,
        crop: Rect::full(1920, 1080),
        bds_width: 1920,
        bds_height: 1080,
    };

    for fcount in 1..=3 {
        rig.engine(id).set_ni(fcount, if fcount < 3 { 40 } else { 80 });
        let mut frame = m2m_frame(fcount, 1, &[OUT0]);
        frame.taa = Some(taa);
        regs.take_writes();
        rig.engine(id).shot(frame).unwrap();

        let uvsp = writes_to(&regs.take_writes(), |f| matches!(f, Field::Uvsp(_)));
        match fcount {
            2 => assert_eq!(uvsp, 0),
            _ => assert!(uvsp > 0),
        }
        assert_eq!(regs.field(Field::Uvsp(UvspField::Enable)), 1);
        rig.complete(id, 1);
    }
}

#[test]
fn test_cac_runs_on_capture_engine_only() {
    let rig = Rig::new(Config::default());
    let param = m2m_param(&[OUT0]);
    rig.bring_up(EngineId::Mcsc0, OutputMask::OUT0, &param);
    rig.bring_up(EngineId::Mcsc1, OutputMask::OUT0, &param);

    let entry = |ni: u32, v: u32| CacFactors {
        noise_index: ni,
        map_thr: CacMapThr {
            spot_thr_l: v,
            spot_thr_h: v,
            spot_thr: v,
            spot_nr_strength: v,
        },
        crt_thr: CacCrtThr {
            crt_color_thr_l_dot: v,
            crt_color_thr_l_line: v,
            crt_color_thr_h: v,
        },
    };
    let table = McscSetfile {
        setfile_version: MCSC_SETFILE_VERSION,
        cac: CacTuneset {
            cac_enable: true,
            ni_dep_factors: vec![entry(1, 100), entry(10, 200)],
        },
        ..Default::default()
    };
    let blob = SetfileBlob {
        index: vec![0],
        using_count: 1,
        tables: vec![table],
        ..Default::default()
    };

    for id in EngineId::ALL {
        let engine = rig.engine(id);
        engine.load_setfile(0, blob.clone(), UvspCalibration::default()).unwrap();
        engine.apply_setfile(0, 0).unwrap();
        engine.set_ni(1, 55);
        engine.shot(m2m_frame(1, 1, &[OUT0])).unwrap();
    }

    let capture = rig.regs(EngineId::Mcsc1);
    assert_eq!(capture.field(Field::Cac(CacField::Enable)), 1);
    assert_eq!(capture.field(Field::Cac(CacField::MapSpotThr)), 150);
    assert_eq!(capture.field(Field::Cac(CacField::InputSource)), 1);

    let video = rig.regs(EngineId::Mcsc0);
    assert_eq!(video.field(Field::Cac(CacField::Enable)), 0);
    assert_eq!(video.field(Field::Cac(CacField::InputSource)), 1);
}

#[test]
fn test_setfile_version_mismatch_rejected() {
    let rig = Rig::new(Config::default());
    let id = EngineId::Mcsc0;
    rig.bring_up(id, OutputMask::OUT0, &m2m_param(&[OUT0]));

    let blob = SetfileBlob {
        index: vec![0],
        using_count: 1,
        tables: vec![McscSetfile {
            setfile_version: MCSC_SETFILE_VERSION + 1,
            ..Default::default()
        }],
        ..Default::default()
    };
    let engine = rig.engine(id);
    assert!(matches!(
        engine.load_setfile(0, blob, UvspCalibration::default()),
        Err(McscError::SetfileVersionMismatch { .. })
    ));
    // Nothing loaded, so applying is a no-op
    engine.apply_setfile(0, 0).unwrap();
    engine.delete_setfile(0).unwrap();
}
