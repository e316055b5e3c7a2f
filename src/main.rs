//! MCSC simulator
//!
//! Drives an engine pair over in-memory register banks and prints the
//! frame events the pipeline reports.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mcsc_core::config::Config;
use mcsc_core::param::{DmaFormat, DmaOrder, InputParam, OutputParam};
use mcsc_core::regs::IntrStatus;
use mcsc_core::{EngineId, Frame, FrameId, McsParam, OutputId, OutputMask, Rect, RegisterFile};
use mcsc_hw::{HwIp, InitRequest, McscPair};
use mcsc_tuning::uvsp::identity_geometry;
use mcsc_tuning::{SetfileBlob, UvspCalibration};

#[derive(Parser, Debug)]
#[command(name = "mcsc-sim")]
#[command(about = "Run capture requests through a simulated multi-channel scaler pair")]
struct Args {
    /// Configuration file; the per-user default is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit memory-to-memory requests and complete them through interrupts
    Run {
        /// Engine to drive (0 or 1)
        #[arg(short, long, default_value_t = 0)]
        engine: u32,

        /// Requests to submit
        #[arg(short, long, default_value_t = 4)]
        frames: u32,

        /// Sub-frames per request
        #[arg(short, long, default_value_t = 1)]
        buffers: u32,

        /// Input size, WxH
        #[arg(long, default_value = "4032x3024")]
        input: String,

        /// Output 0 size, WxH
        #[arg(long, default_value = "1920x1080")]
        output: String,

        /// Noise index reported for every frame
        #[arg(long, default_value_t = 0)]
        ni: u32,

        /// Setfile in JSON form
        #[arg(long)]
        setfile: Option<PathBuf>,

        /// Raise an overflow with the first frame start
        #[arg(long)]
        inject_error: bool,
    },
    /// Print the effective configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::from_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => Config::load().unwrap_or_else(|e| {
            eprintln!("using default configuration: {e}");
            Config::default()
        }),
    };
    mcsc_core::logging::init(config.general.log_level);
    tracing::debug!("configuration: {:?}", config);

    match args.command {
        Command::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Run {
            engine,
            frames,
            buffers,
            input,
            output,
            ni,
            setfile,
            inject_error,
        } => {
            let engine = match engine {
                0 => EngineId::Mcsc0,
                1 => EngineId::Mcsc1,
                n => anyhow::bail!("no engine {}", n),
            };
            let scenario = Scenario {
                engine,
                frames,
                buffers: buffers.max(1),
                input: parse_size(&input)?,
                output: parse_size(&output)?,
                ni,
                setfile: setfile.map(load_setfile).transpose()?,
                inject_error,
            };
            run(config, &scenario)
        }
    }
}

struct Scenario {
    engine: EngineId,
    frames: u32,
    buffers: u32,
    input: (u32, u32),
    output: (u32, u32),
    ni: u32,
    setfile: Option<SetfileBlob>,
    inject_error: bool,
}

fn run(config: Config, scenario: &Scenario) -> Result<()> {
    let banks = [Arc::new(RegisterFile::new("mcsc0")), Arc::new(RegisterFile::new("mcsc1"))];
    let (pair, events) = McscPair::new(config.clone(), banks[0].clone(), banks[1].clone());
    let id = scenario.engine;
    let engine = pair.engine(id);
    let regs = &banks[id.index()];

    let param = m2m_param(&config, scenario.input, scenario.output);
    engine.open(0)?;
    engine.init(
        0,
        &InitRequest {
            outputs: OutputMask::OUT0,
            ..Default::default()
        },
    )?;
    engine.set_param(0, &param)?;
    if let Some(blob) = &scenario.setfile {
        engine.load_setfile(0, blob.clone(), UvspCalibration::default())?;
        engine.apply_setfile(0, 0)?;
    }
    engine.enable(0)?;

    for fcount in 1..=scenario.frames {
        engine.set_ni(fcount, scenario.ni);
        let frame = m2m_frame(fcount, scenario.buffers, scenario.input);
        engine.shot(frame).with_context(|| format!("shot {}", fcount))?;
        println!(
            "[F:{}] armed, {} register writes, TDNR {:?}",
            fcount,
            regs.take_writes().len(),
            engine.tdnr_mode()
        );

        for sub in 0..scenario.buffers {
            let mut start = IntrStatus::FRAME_START;
            if scenario.inject_error && fcount == 1 && sub == 0 {
                start |= IntrStatus::OVERFLOW;
            }
            regs.raise(start.bits());
            engine.handle_interrupt();
            regs.raise(IntrStatus::FRAME_END.bits());
            engine.handle_interrupt();
        }

        for event in events.drain() {
            println!("  {:?}", event);
        }
    }

    engine.disable(0)?;
    engine.close(0)?;

    let counters = engine.counters();
    println!(
        "{}: fs {} fe {} completed {} (ownership 0x{:x})",
        id,
        counters.fs,
        counters.fe,
        counters.dma,
        pair.shared().ownership_bits()
    );
    if events.dropped_count() > 0 {
        println!("{} events dropped", events.dropped_count());
    }
    Ok(())
}

fn m2m_param(config: &Config, (in_w, in_h): (u32, u32), (out_w, out_h): (u32, u32)) -> McsParam {
    let mut param = McsParam::default();
    param.control.buffer_address = 0x8000_0000;
    param.input = InputParam {
        dma_cmd: true,
        dma_format: DmaFormat::Yuv422,
        dma_bitwidth: 8,
        dma_order: DmaOrder::YCbYCr,
        plane: 1,
        width: in_w,
        height: in_h,
        dma_crop: Rect::full(in_w, in_h),
        dma_stride_y: in_w * 2,
        ..Default::default()
    };
    *param.output_mut(OutputId::new(0)) = OutputParam {
        dma_cmd: true,
        dma_format: DmaFormat::Yuv420,
        dma_bitwidth: 8,
        dma_order: DmaOrder::CbCr,
        plane: 2,
        crop: Rect::full(in_w, in_h),
        width: out_w,
        height: out_h,
        dma_stride_y: out_w,
        dma_stride_c: out_w,
        ..Default::default()
    };
    if in_w > config.tdnr.buffer_width || in_h > config.tdnr.buffer_height {
        param.tdnr_bypass = true;
    }
    param
}

fn m2m_frame(fcount: u32, buffers: u32, (width, height): (u32, u32)) -> Frame {
    let mut frame = Frame::new(FrameId(fcount), 0, fcount);
    frame.num_buffers = buffers;
    frame.group.shot_count = fcount - 1;
    frame.out_flag = OutputMask::OUT0;
    frame.taa = Some(identity_geometry(width, height));

    let in_size = width * height * 2;
    frame.input_addrs = (0..buffers).map(|b| 0x1000_0000 + b * in_size).collect();
    frame.output_addrs[0] = (0..buffers)
        .flat_map(|b| {
            let base = 0x4000_0000 + b * in_size;
            [base, base + width * height]
        })
        .collect();
    frame
}

fn parse_size(size: &str) -> Result<(u32, u32)> {
    let (w, h) = size
        .split_once('x')
        .with_context(|| format!("size '{}' is not WxH", size))?;
    Ok((w.trim().parse()?, h.trim().parse()?))
}

fn load_setfile(path: PathBuf) -> Result<SetfileBlob> {
    let data = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    Ok(SetfileBlob::from_json(&data)?)
}
