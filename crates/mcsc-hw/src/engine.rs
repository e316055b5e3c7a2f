//! One scaler engine of the pair

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mcsc_core::regs::{CtrlField, Field, RdmaField, ShadowCtrl, MCSC_INTR_MASK};
use mcsc_core::{
    DoneType, EngineId, Frame, FrameEventSender, McsParam, McscError, OutputId, OutputMask, Reg,
    RegisterAccess, Result, MCSC_OUTPUT_MAX,
};
use mcsc_scaler::djag::DjagPlan;
use mcsc_scaler::format::ImgFormat;
use mcsc_tuning::{
    CacTuner, McscSetfile, SetfileBlob, TdnrMode, TdnrTuner, UvspCalibration,
    UvspTuner, MCSC_SETFILE_VERSION,
};

use crate::ops::{HwIp, InitRequest, YsumMeta};
use crate::shared::PairShared;
use crate::state::{EngineState, HwState, StateCell, Vvalid};

/// Write DMA buffer slots per output
pub const WDMA_BUF_SLOTS: u8 = 8;

/// SRAM bank size of one output
pub(crate) const SRAM_BANK_SIZE: u32 = 0x100;
pub(crate) const SSB_SRAM_BASE: u32 = MCSC_OUTPUT_MAX as u32 * SRAM_BANK_SIZE;
pub(crate) const TDNR_WEIGHT_SRAM_BASE: u32 = SSB_SRAM_BASE + SRAM_BANK_SIZE;
pub(crate) const WDMA_AXI_PRIORITY: u32 = 1;

/// Per-instance state
#[derive(Debug, Clone, Default)]
pub(crate) struct InstanceCtx {
    pub param: McsParam,
    pub reprocessing: bool,
    pub sensor_position: u32,
}

/// Denoise state
#[derive(Debug, Clone, Default)]
pub(crate) struct TdnrState {
    pub tuner: TdnrTuner,
    pub mode: TdnrMode,
    pub buffers: [u32; 2],
    pub yic: bool,
}

/// Mutable engine context, guarded by the engine lock
pub(crate) struct EngineCtx {
    pub instances: HashMap<u32, InstanceCtx>,
    pub cur_instance: u32,
    /// Outputs bound by any instance
    pub out_en: OutputMask,
    /// Armed requests in submission order
    pub wait_done: VecDeque<Frame>,
    /// Request of the burst in flight
    pub mframe: Option<Frame>,
    pub cur_s_int: u32,
    pub cur_e_int: u32,
    pub num_buffers: u32,
    /// An error interrupt arrived during the current request
    pub frame_error: bool,
    pub video_mode: bool,
    pub otf_input: bool,
    pub tdnr: TdnrState,
    pub cac: CacTuner,
    pub cac_in: EngineId,
    pub uvsp: UvspTuner,
    pub calibration: UvspCalibration,
    /// Loaded setfiles by sensor position
    pub setfiles: HashMap<u32, SetfileBlob>,
    /// Selected table by instance
    pub cur_setfile: HashMap<u32, McscSetfile>,
    /// Parameters of the last normal shot, replayed by restore
    pub back_param: Option<McsParam>,
    pub prev_hwfc: OutputMask,
    pub in_img_format: ImgFormat,
    pub out_img_format: [(ImgFormat, bool); MCSC_OUTPUT_MAX],
    pub djag: Option<DjagPlan>,
}

impl EngineCtx {
    fn new(id: EngineId) -> Self {
        Self {
            instances: HashMap::new(),
            cur_instance: 0,
            out_en: OutputMask::empty(),
            wait_done: VecDeque::new(),
            mframe: None,
            cur_s_int: 0,
            cur_e_int: 0,
            num_buffers: 1,
            frame_error: false,
            video_mode: false,
            otf_input: false,
            tdnr: TdnrState::default(),
            cac: CacTuner::new(),
            cac_in: id,
            uvsp: UvspTuner::new(),
            calibration: UvspCalibration::default(),
            setfiles: HashMap::new(),
            cur_setfile: HashMap::new(),
            back_param: None,
            prev_hwfc: OutputMask::empty(),
            in_img_format: ImgFormat::default(),
            out_img_format: [(ImgFormat::default(), false); MCSC_OUTPUT_MAX],
            djag: None,
        }
    }

    pub fn param(&self, instance: u32) -> Option<&McsParam> {
        self.instances.get(&instance).map(|i| &i.param)
    }

    pub fn setfile(&self, instance: u32) -> Option<&McscSetfile> {
        self.cur_setfile.get(&instance)
    }
}

/// Interrupt and completion counters
#[derive(Debug, Default)]
pub struct FrameCounters {
    pub fcount: AtomicU32,
    /// Frame-start sub-frames seen
    pub fs: AtomicU32,
    /// Frame-end sub-frames seen
    pub fe: AtomicU32,
    /// Requests completed with at least one output
    pub dma: AtomicU32,
}

/// Snapshot of [`FrameCounters`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub fcount: u32,
    pub fs: u32,
    pub fe: u32,
    pub dma: u32,
}

/// A scaler engine
pub struct McscEngine {
    pub(crate) id: EngineId,
    pub(crate) shared: Arc<PairShared>,
    pub(crate) vvalid: Vvalid,
    pub(crate) counters: FrameCounters,
    pub(crate) events: FrameEventSender,
    pub(crate) ctx: Mutex<EngineCtx>,
}

impl McscEngine {
    pub(crate) fn new(id: EngineId, shared: Arc<PairShared>, events: FrameEventSender) -> Self {
        Self {
            id,
            shared,
            vvalid: Vvalid::new(),
            counters: FrameCounters::default(),
            events,
            ctx: Mutex::new(EngineCtx::new(id)),
        }
    }

    pub(crate) fn regs(&self) -> &dyn RegisterAccess {
        self.shared.regs(self.id).as_ref()
    }

    pub(crate) fn hw_state(&self) -> &StateCell {
        self.shared.state(self.id)
    }

    pub fn counters(&self) -> CounterSnapshot {
        CounterSnapshot {
            fcount: self.counters.fcount.load(Ordering::Acquire),
            fs: self.counters.fs.load(Ordering::Acquire),
            fe: self.counters.fe.load(Ordering::Acquire),
            dma: self.counters.dma.load(Ordering::Acquire),
        }
    }

    pub fn tdnr_mode(&self) -> TdnrMode {
        self.ctx.lock().tdnr.mode
    }

    /// Requests armed and not yet completed
    pub fn pending_frames(&self) -> usize {
        self.ctx.lock().wait_done.len()
    }

    pub(crate) fn require(&self, flag: HwState, instance: u32) -> Result<()> {
        if !self.hw_state().test(flag) {
            tracing::error!("{}: instance {} not ready ({:?})", self.id, instance, flag);
            return Err(McscError::NotInitialized {
                engine: self.id,
                instance,
            });
        }
        Ok(())
    }

    fn open_impl(&self, instance: u32) -> Result<()> {
        if self.hw_state().test(HwState::OPEN) {
            return Ok(());
        }

        self.shared.cap().log_summary(&self.id.to_string());

        let mut ctx = self.ctx.lock();
        ctx.mframe = None;
        ctx.cur_setfile.clear();
        self.vvalid.set_blank();
        self.hw_state().set(HwState::OPEN);
        drop(ctx);

        if self.shared.core_running().is_none() {
            self.shared.ownership.lock().release_all();
        }

        tracing::info!(
            "{}: open done for instance {} (ownership 0x{:x})",
            self.id,
            instance,
            self.shared.ownership_bits()
        );
        Ok(())
    }

    fn init_impl(&self, instance: u32, request: &InitRequest) -> Result<()> {
        let mut ctx = self.ctx.lock();
        let entry = ctx.instances.entry(instance).or_default();
        entry.reprocessing = request.reprocessing;
        entry.sensor_position = request.sensor_position;
        ctx.out_en |= request.outputs;
        self.hw_state().set(HwState::INIT);

        tracing::info!(
            "{}: init instance {} outputs {:?} (rep {})",
            self.id,
            instance,
            ctx.out_en,
            request.reprocessing
        );
        Ok(())
    }

    fn close_impl(&self, instance: u32) -> Result<()> {
        let state = self.hw_state();
        if !state.test(HwState::OPEN) {
            return Ok(());
        }
        state.clear(HwState::OPEN | HwState::YSUM_CFG | HwState::DS_CFG);
        tracing::info!("{}: close instance {}", self.id, instance);
        Ok(())
    }

    fn enable_impl(&self, instance: u32) -> Result<()> {
        self.require(HwState::INIT, instance)?;
        if self.hw_state().test(HwState::RUN) {
            return Ok(());
        }

        let _pair = self.shared.config_lock.lock();
        let mut ctx = self.ctx.lock();

        if let Err(e) = self.reset() {
            self.hw_state().set(HwState::ERROR);
            tracing::error!("{}: enable failed: {}", self.id, e);
            return Err(e);
        }
        self.clear_interrupt();
        self.tdnr_init(&mut ctx, instance);

        self.hw_state().clear(HwState::ERROR);
        self.hw_state().set(HwState::RUN);
        tracing::info!("{}: enabled (ownership 0x{:x})", self.id, self.shared.ownership_bits());
        Ok(())
    }

    fn disable_impl(&self, instance: u32) -> Result<()> {
        let cap = self.shared.cap();

        if self.hw_state().test(HwState::RUN) {
            let timeout_ms = self.shared.config.pipeline.stop_timeout_ms;
            if !self.vvalid.wait_blank(Duration::from_millis(timeout_ms)) {
                let err = McscError::HardwareTimeout {
                    engine: self.id,
                    what: "frame end",
                    timeout_ms,
                };
                tracing::error!("{}: disable: {}, forcing stop", self.id, err);
            }
            self.clear_interrupt();
            self.hw_state().clear(HwState::RUN | HwState::CONFIG);
        }

        let mut ctx = self.ctx.lock();
        ctx.mframe = None;

        if let Some(running) = self.shared.core_running() {
            tracing::info!("{}: disable: {} still running, keep shared state", self.id, running);
            return Ok(());
        }

        for engine in EngineId::ALL {
            self.shared
                .regs(engine)
                .set_flag(Field::Ctrl(CtrlField::ScalerEnable), false);
        }

        if cap.in_dma {
            self.clear_rdma_addr();
        }

        let teardown: Vec<OutputId> = {
            let own = self.shared.ownership.lock();
            cap.outputs()
                .filter(|out| !cap.enable_shared_output || own.is_idle(*out))
                .collect()
        };
        for out in cap.outputs() {
            if teardown.contains(&out) {
                self.clear_wdma_addr(out);
            } else {
                tracing::warn!("{}: disable: {} still draining, addresses kept", self.id, out);
            }
        }

        self.regs().set_register(Reg::ShadowCtrl, ShadowCtrl::Clear as u32);
        self.tdnr_deinit(&mut ctx);
        self.shared.ownership.lock().release_all();

        tracing::info!(
            "{}: disable done for instance {} (ownership 0x{:x})",
            self.id,
            instance,
            self.shared.ownership_bits()
        );
        Ok(())
    }

    /// Full reset of both engines.
    ///
    /// Skipped while a pair engine is running. Idle ports are quiesced on this
    /// engine; ports still draining keep their configuration.
    pub(crate) fn reset(&self) -> Result<()> {
        if let Some(running) = self.shared.core_running() {
            tracing::debug!("{}: reset skipped, {} running", self.id, running);
            return Ok(());
        }

        let cap = self.shared.cap();
        for engine in [self.id, self.id.sibling()] {
            let regs = self.shared.regs(engine);
            tracing::info!("{}: sw reset", engine);
            if !regs.sw_reset() {
                tracing::error!("{}: sw reset failed", engine);
                return Err(McscError::ResetFailed(engine));
            }
            regs.set_register(Reg::ShadowCtrl, ShadowCtrl::Clear as u32);
        }

        let quiesce: Vec<OutputId> = {
            let own = self.shared.ownership.lock();
            cap.outputs()
                .filter(|out| !cap.enable_shared_output || own.is_idle(*out))
                .collect()
        };

        let regs = self.regs();
        for out in &quiesce {
            use mcsc_core::regs::{OutputField, ScaleField, WdmaField};
            tracing::debug!("{}: {} cleared", self.id, out);
            regs.set_flag(Field::Poly(*out, ScaleField::Enable), false);
            regs.set_flag(Field::Post(*out, ScaleField::Enable), false);
            regs.set_flag(Field::Output(*out, OutputField::OtfEnable), false);
            regs.set_flag(Field::Wdma(*out, WdmaField::Enable), false);
            regs.set_field(Field::Wdma(*out, WdmaField::Priority), 0);
            regs.set_field(Field::Ctrl(CtrlField::AxiPriority), WDMA_AXI_PRIORITY);
            regs.set_field(Field::Wdma(*out, WdmaField::SramBase), out.index() as u32 * SRAM_BANK_SIZE);
        }
        regs.set_field(Field::Ctrl(CtrlField::SsbSramBase), SSB_SRAM_BASE);
        if cap.tdnr {
            regs.set_field(Field::Ctrl(CtrlField::TdnrWeightSramBase), TDNR_WEIGHT_SRAM_BASE);
        }

        {
            let mut own = self.shared.ownership.lock();
            for out in &quiesce {
                own.release(*out);
            }
            own.set_reset_check(true);
        }

        if cap.in_otf {
            for engine in [self.id, self.id.sibling()] {
                self.shared
                    .regs(engine)
                    .set_flag(Field::Ctrl(CtrlField::StopReqPostEn), false);
            }
        }
        Ok(())
    }

    pub(crate) fn clear_interrupt(&self) {
        let regs = self.regs();
        regs.set_register(Reg::IntrClear, u32::MAX);
        regs.set_register(Reg::IntrMask, MCSC_INTR_MASK);
    }

    pub(crate) fn clear_rdma_addr(&self) {
        for plane in 0..5 {
            self.regs().set_field(Field::Rdma(RdmaField::Addr(plane)), 0);
        }
    }

    fn set_param_impl(&self, instance: u32, param: &McsParam) -> Result<()> {
        self.require(HwState::INIT, instance)?;
        let mut ctx = self.ctx.lock();
        ctx.instances.entry(instance).or_default().param = param.clone();
        if ctx.cur_instance != instance {
            tracing::debug!("{}: instance {} -> {}", self.id, ctx.cur_instance, instance);
            ctx.cur_instance = instance;
        }
        Ok(())
    }

    fn load_setfile_impl(
        &self,
        instance: u32,
        blob: SetfileBlob,
        calibration: UvspCalibration,
    ) -> Result<()> {
        self.require(HwState::INIT, instance)?;

        blob.validate(MCSC_SETFILE_VERSION)?;

        let mut ctx = self.ctx.lock();
        let position = ctx.instances.get(&instance).map_or(0, |i| i.sensor_position);
        ctx.calibration = calibration;
        tracing::info!(
            "{}: setfile {:?} loaded for position {} ({} tables)",
            self.id,
            blob.format,
            position,
            blob.tables.len()
        );
        ctx.setfiles.insert(position, blob);
        self.hw_state().set(HwState::TUNESET);
        Ok(())
    }

    fn apply_setfile_impl(&self, instance: u32, scenario: u32) -> Result<()> {
        let mut ctx = self.ctx.lock();
        let position = ctx.instances.get(&instance).map_or(0, |i| i.sensor_position);
        let Some(blob) = ctx.setfiles.get(&position) else {
            tracing::warn!("{}: no setfile for position {}", self.id, position);
            return Ok(());
        };

        let table = blob.table_for(scenario)?.clone();
        tracing::info!("{}: apply setfile scenario {} for instance {}", self.id, scenario, instance);
        ctx.cur_setfile.insert(instance, table);
        ctx.cac.invalidate();
        ctx.uvsp.invalidate();
        ctx.tdnr.tuner.reset();
        Ok(())
    }

    fn delete_setfile_impl(&self, instance: u32) -> Result<()> {
        if !self.hw_state().test_and_clear(HwState::TUNESET) {
            tracing::debug!("{}: no setfile to delete", self.id);
            return Ok(());
        }
        let mut ctx = self.ctx.lock();
        ctx.setfiles.clear();
        ctx.cur_setfile.remove(&instance);
        tracing::info!("{}: setfile deleted for instance {}", self.id, instance);
        Ok(())
    }

    fn restore_impl(&self, instance: u32) -> Result<()> {
        self.require(HwState::INIT, instance)?;

        let _pair = self.shared.config_lock.lock();
        let mut ctx = self.ctx.lock();

        if let Err(e) = self.reset() {
            self.hw_state().set(HwState::ERROR);
            tracing::error!("{}: restore failed: {}", self.id, e);
            return Err(e);
        }

        let mut param = ctx
            .back_param
            .clone()
            .or_else(|| ctx.param(instance).cloned())
            .unwrap_or_default();
        param.tdnr_bypass = true;
        if let Some(inst) = ctx.instances.get_mut(&instance) {
            inst.param = param.clone();
        }
        if let Err(e) = self.update_param(&mut ctx, instance) {
            tracing::warn!("{}: restore: parameter re-apply reported {}", self.id, e);
        }

        self.tdnr_recovery(&mut ctx, &param, instance);
        self.clear_interrupt();
        self.regs().set_flag(Field::Ctrl(CtrlField::ScalerEnable), true);

        self.hw_state().clear(HwState::ERROR);
        self.hw_state().set(HwState::RUN);
        tracing::info!("{}: restored instance {}", self.id, instance);
        Ok(())
    }

    fn get_meta_impl(&self) -> Option<YsumMeta> {
        if !self.shared.cap().ysum {
            return None;
        }
        use mcsc_core::regs::YsumField;
        Some(YsumMeta {
            higher: self.regs().get_field(Field::Ysum(YsumField::ResultHigher)),
            lower: self.regs().get_field(Field::Ysum(YsumField::ResultLower)),
        })
    }
}

impl HwIp for McscEngine {
    fn id(&self) -> EngineId {
        self.id
    }

    fn engine_state(&self) -> EngineState {
        self.hw_state().engine_state()
    }

    fn open(&self, instance: u32) -> Result<()> {
        self.open_impl(instance)
    }

    fn init(&self, instance: u32, request: &InitRequest) -> Result<()> {
        self.init_impl(instance, request)
    }

    fn close(&self, instance: u32) -> Result<()> {
        self.close_impl(instance)
    }

    fn enable(&self, instance: u32) -> Result<()> {
        self.enable_impl(instance)
    }

    fn disable(&self, instance: u32) -> Result<()> {
        self.disable_impl(instance)
    }

    fn set_param(&self, instance: u32, param: &McsParam) -> Result<()> {
        self.set_param_impl(instance, param)
    }

    fn shot(&self, frame: Frame) -> Result<()> {
        self.shot_impl(frame)
    }

    fn frame_ndone(&self, frame: &Frame, result: DoneType) -> Result<()> {
        self.frame_ndone_impl(frame, result);
        Ok(())
    }

    fn load_setfile(&self, instance: u32, blob: SetfileBlob, calibration: UvspCalibration) -> Result<()> {
        self.load_setfile_impl(instance, blob, calibration)
    }

    fn apply_setfile(&self, instance: u32, scenario: u32) -> Result<()> {
        self.apply_setfile_impl(instance, scenario)
    }

    fn delete_setfile(&self, instance: u32) -> Result<()> {
        self.delete_setfile_impl(instance)
    }

    fn restore(&self, instance: u32) -> Result<()> {
        self.restore_impl(instance)
    }

    fn size_dump(&self) {
        self.dump_sizes();
    }

    fn get_meta(&self) -> Option<YsumMeta> {
        self.get_meta_impl()
    }

    fn set_ni(&self, fcount: u32, noise_index: u32) {
        self.shared.store_ni(self.id, fcount, noise_index);
    }

    fn handle_interrupt(&self) {
        self.irq();
    }
}
