//! Register-access capability
//!
//! The control core never encodes bit positions. Every hardware value is
//! addressed through a symbolic [`Field`] or [`Reg`] descriptor and handed
//! to a [`RegisterAccess`] implementation, which owns the address tables.

use bitflags::bitflags;

use crate::types::OutputId;

/// Access to one engine's register bank
pub trait RegisterAccess: Send + Sync {
    /// Write a register field
    fn set_field(&self, field: Field, value: u32);

    /// Read a register field
    fn get_field(&self, field: Field) -> u32;

    /// Write a whole register
    fn set_register(&self, reg: Reg, value: u32);

    /// Read a whole register
    fn get_register(&self, reg: Reg) -> u32;

    /// Issue a software reset and wait for completion.
    ///
    /// Returns `false` if the block never reported reset completion.
    fn sw_reset(&self) -> bool;

    /// Convenience for boolean fields
    fn set_flag(&self, field: Field, on: bool) {
        self.set_field(field, on as u32);
    }

    /// Write a signed field in two's complement
    fn set_signed(&self, field: Field, value: i32) {
        self.set_field(field, value as u32);
    }
}

/// Whole registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reg {
    Version,
    IntrStatus,
    IntrClear,
    IntrMask,
    ShadowCtrl,
}

bitflags! {
    /// Interrupt status bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IntrStatus: u32 {
        const FRAME_START          = 1 << 0;
        const FRAME_END            = 1 << 1;
        const WDMA_FINISH          = 1 << 2;
        const OVERFLOW             = 1 << 3;
        const OUTSTALL             = 1 << 4;
        const INPUT_VERTICAL_UNF   = 1 << 5;
        const INPUT_VERTICAL_OVF   = 1 << 6;
        const INPUT_HORIZONTAL_UNF = 1 << 7;
        const INPUT_HORIZONTAL_OVF = 1 << 8;

        /// Any bit that marks the frame as degraded
        const ERRORS = Self::OVERFLOW.bits()
            | Self::OUTSTALL.bits()
            | Self::INPUT_VERTICAL_UNF.bits()
            | Self::INPUT_VERTICAL_OVF.bits()
            | Self::INPUT_HORIZONTAL_UNF.bits()
            | Self::INPUT_HORIZONTAL_OVF.bits();
    }
}

/// Interrupts masked while running
pub const MCSC_INTR_MASK: u32 = IntrStatus::WDMA_FINISH.bits();

/// Shadow register control values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ShadowCtrl {
    Clear = 0,
    WriteStart = 1,
    WriteFinish = 2,
}

/// Scaler input source values
pub const INPUT_SOURCE_OTF: u32 = 0;
pub const INPUT_SOURCE_DMA: u32 = 1;

/// Symbolic field descriptors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Ctrl(CtrlField),
    Input(InputField),
    Rdma(RdmaField),
    Poly(OutputId, ScaleField),
    Post(OutputId, ScaleField),
    Output(OutputId, OutputField),
    Wdma(OutputId, WdmaField),
    Bchs(OutputId, BchsField),
    Hwfc(OutputId, HwfcField),
    Ds(DsField),
    Ysum(YsumField),
    Djag(DjagField),
    Tdnr(TdnrField),
    Cac(CacField),
    Uvsp(UvspField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CtrlField {
    ScalerEnable,
    StopReqPostEn,
    AxiPriority,
    SsbSramBase,
    TdnrWeightSramBase,
    HwfcMode,
    LfroMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    Source,
    Width,
    Height,
    Dither,
    StatusHLines,
    StatusVLines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RdmaField {
    Start,
    Format,
    Width,
    Height,
    StrideY,
    StrideC,
    StrideY2bit,
    StrideC2bit,
    BitType10,
    FrameSeq,
    /// Planes 0..=2 are Y/Cb/Cr, 3 and 4 the 2-bit Y/C planes
    Addr(u8),
}

/// Fields shared by the poly-phase and post-chain stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScaleField {
    Enable,
    SrcX,
    SrcY,
    SrcWidth,
    SrcHeight,
    DstWidth,
    DstHeight,
    HRatio,
    VRatio,
    HCoef,
    VCoef,
    HPhaseOffset,
    VPhaseOffset,
    RoundMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputField {
    /// Engine currently wired to this output
    ScalerPath,
    OtfEnable,
    OtfPath,
    Flip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WdmaField {
    Enable,
    Format,
    Conv420,
    Width,
    Height,
    StrideY,
    StrideC,
    StrideY2bit,
    StrideC2bit,
    BitType10,
    FrameSeq,
    Priority,
    SramBase,
    /// Address of `plane` in buffer slot `buf`; planes 3 and 4 are the 2-bit planes
    Addr { buf: u8, plane: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BchsField {
    Enable,
    YOffset,
    YGain,
    CGain00,
    CGain01,
    CGain10,
    CGain11,
    ClampYMax,
    ClampYMin,
    ClampCMax,
    ClampCMin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HwfcField {
    Format,
    Plane,
    IdOffset,
    Width,
    Height,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DsField {
    Enable,
    ImgWidth,
    ImgHeight,
    SrcX,
    SrcY,
    SrcWidth,
    SrcHeight,
    DstWidth,
    DstHeight,
    HRatio,
    VRatio,
    HPhase,
    VPhase,
    GammaEnable,
    OtfPath,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YsumField {
    Enable,
    InputSource,
    Width,
    Height,
    StartX,
    StartY,
    ResultHigher,
    ResultLower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DjagField {
    Enable,
    InputSel,
    SrcWidth,
    SrcHeight,
    DstWidth,
    DstHeight,
    HRatio,
    VRatio,
    HPhase,
    VPhase,
    RoundMode,
    DejagWeight0,
    DejagWeight1,
    HfBoostWeight,
    CenterHfBoostWeight,
    DiagonalHfBoostWeight,
    CenterWeightedMeanWeight,
    Thres1x5MatchingSad,
    Thres1x5Abshf,
    ThresShootingLlcrr,
    ThresShootingLcr,
    ThresShootingNeighbor,
    ThresShootingUucdd,
    ThresShootingUcd,
    MinMaxWeight,
}

/// TDNR DMA buffer kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdnrBuf {
    Image,
    Weight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TdnrField {
    ModeSelect,
    YicEnable,
    ImageWidth,
    ImageHeight,
    RdmaStart,
    RdmaAddr(TdnrBuf),
    RdmaWidth,
    RdmaHeight,
    RdmaStrideY,
    RdmaStrideC,
    WdmaEnable(TdnrBuf),
    WdmaAddr(TdnrBuf),
    WdmaWidth,
    WdmaHeight,
    WdmaStrideY,
    WdmaStrideC,

    UseAverageCurrent,
    AutoCoeff3d,
    BlendingThreshold,
    ConstLutCoeff(u8),
    RefineOn,
    RefineMode,
    RefineThreshold,
    RefineCoeffUpdate,

    XGridY(u8),
    XGridU(u8),
    XGridV(u8),
    YStdOffset,
    UStdOffset,
    VStdOffset,
    YStdSlope(u8),
    UStdSlope(u8),
    VStdSlope(u8),

    CoeffY1,
    CoeffY2,
    CoeffUv1,
    CoeffUv2,
    AutoLutGainY(u8),
    YOffset,
    AutoLutGainUv(u8),
    UvOffset,
    PrevGridx(u8),
    PrevGridxLut(u8),

    RegionDiffOn,
    RegionGain,
    OtherChannelsCheck,
    OtherChannelGain,
    DontUseRegionSign,
    DiffConditionAllSimilar,
    LineCondition,
    MotionLumaMean,
    RegionOffset,
    MotionChromaMean,
    OtherChannelOffset,
    CoefficientOffset,

    SpatialWeightMode,
    SpatialGain,
    SpatialSeparateWeights,
    SpatialLumaGain(u8),
    SpatialUvGain(u8),
    SpatialRefineThreshold,
    SpatialLumaOffset(u8),
    SpatialUvOffset(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacField {
    Enable,
    InputSource,
    MapSpotThrLow,
    MapSpotThrHigh,
    MapSpotThr,
    MapSpotNrStrength,
    CrtColorThrLowDot,
    CrtColorThrLowLine,
    CrtColorThrHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UvspField {
    Enable,
    BinningX,
    BinningY,
    RadialCenterX,
    RadialCenterY,
    BiquadA,
    BiquadB,
    BiquadShift,
    RandomEn,
    RandomPower,
    RefineEn,
    RefineLumaMin,
    RefineDenom,
    AlphaGainAddEn,
    AlphaGreenEn,
    AlphaR,
    AlphaG,
    AlphaB,
    PedestalR,
    PedestalG,
    PedestalB,
    OffsetR,
    OffsetG,
    OffsetB,
    DesatCtrlEn,
    DesatSingleSide,
    DesatLumaOffset,
    DesatGainOffset,
    DesatYShift,
    DesatYLumaMax,
    DesatULow,
    DesatUHigh,
    DesatVLow,
    DesatVHigh,
    /// Row-major 3x3 RGB to YUV coefficient
    R2yCoef(u8),
    R2yShift,
}
