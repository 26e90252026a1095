use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use common::{find_nal_unit, NalUnitType};
use log::{debug, info};
use postprocess::{
    AccessUnit, AnnexBFile, EncoderSession, FrameType, Packet, ParameterSets,
    PostProcessError, PostProcessor, Priority, SessionError, SharedDevice, StreamError,
};

/// Marks disposable slices in a raw HEVC Annex-B stream.
#[derive(Parser, Debug)]
struct Args {
    /// Raw HEVC elementary stream (Annex-B byte stream)
    file_path: String,

    /// Where to write the marked stream, defaults to `<stem>.marked.<ext>`
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write the VPS/SPS/PPS blob to this file
    #[arg(long)]
    headers: Option<PathBuf>,

    /// Print one line per access unit
    #[arg(short, long)]
    list: bool,

    /// Mark every slice disposable regardless of its type
    #[arg(long)]
    all_disposable: bool,
}

/// Stands in for an encoder session: the parameter sets are the first VPS, SPS and PPS
/// found in the stream.
struct StreamSession {
    vps: Vec<u8>,
    sps: Vec<u8>,
    pps: Vec<u8>,
}

fn first_unit(data: &[u8], nal_unit_type: NalUnitType) -> Result<Vec<u8>, SessionError> {
    find_nal_unit(data, nal_unit_type)
        .map(|nal| nal.bytes().to_vec())
        .ok_or_else(|| SessionError::Open(format!("stream has no {}", nal_unit_type.name())))
}

impl EncoderSession for StreamSession {
    type Params = PathBuf;

    fn open(params: &PathBuf) -> Result<Self, SessionError> {
        let stream = AnnexBFile::from_file_path(params)
            .map_err(|err| SessionError::Open(format!("{}: {err}", params.display())))?;
        let data = stream.bytes();

        Ok(Self {
            vps: first_unit(data, NalUnitType::VPS)?,
            sps: first_unit(data, NalUnitType::SPS)?,
            pps: first_unit(data, NalUnitType::PPS)?,
        })
    }

    fn reconfigure(&mut self, params: &PathBuf) -> Result<(), SessionError> {
        *self = Self::open(params)
            .map_err(|err| SessionError::Reconfigure(err.to_string()))?;
        Ok(())
    }

    fn parameter_sets(&self) -> Result<ParameterSets<'_>, SessionError> {
        Ok(ParameterSets::new(&self.vps, &self.sps, &self.pps))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    access_units: usize,
    packets: usize,
    keyframes: usize,
    by_priority: [usize; 4],
}

impl Summary {
    fn record(&mut self, packet: &Packet) {
        self.packets += 1;
        self.keyframes += usize::from(packet.keyframe);
        self.by_priority[usize::from(u8::from(packet.priority))] += 1;
    }
}

fn mark_stream(args: &Args, output: &Path) -> Result<Summary, PostProcessError> {
    let input = PathBuf::from(&args.file_path);
    let processor = PostProcessor::<StreamSession>::open(SharedDevice::new(), &input)?;

    if let Some(headers) = &args.headers {
        fs::write(headers, processor.extra_data()).map_err(StreamError::from)?;
        debug!("wrote {} header bytes to {}", processor.extra_data().len(), headers.display());
    }

    let stream = AnnexBFile::from_file_path(&input)?;
    let mut marked = Vec::with_capacity(stream.bytes().len());
    let mut summary = Summary::default();

    for (index, data) in stream.access_units().enumerate() {
        summary.access_units += 1;

        let frame_type = match args.all_disposable {
            true => FrameType::empty(),
            false => FrameType::from_nal_types(data),
        };

        match processor.process(AccessUnit::new(data.to_vec(), index as i64, frame_type)) {
            Some(packet) => {
                if args.list {
                    println!(
                        "{index:>6} {:>9} bytes  {:<10} {}",
                        packet.data.len(),
                        packet.priority.name(),
                        if packet.keyframe { "keyframe" } else { "" }
                    );
                }
                marked.extend_from_slice(&packet.data);
                summary.record(&packet);
            }
            None => {
                debug!("access unit {index} carries no slice data, copied as is");
                marked.extend_from_slice(data);
            }
        }
    }

    fs::write(output, &marked).map_err(StreamError::from)?;
    processor.close()?;

    Ok(summary)
}

fn marked_file_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplitn(2, '.').collect::<Vec<&str>>().as_slice() {
        [ext, stem] if !stem.is_empty() => format!("{stem}.marked.{ext}"),
        _ => format!("{file_name}.marked"),
    }
}

/// Whether `output` names the existing file at `input`, however either path is spelled.
fn same_file(input: &Path, output: &Path) -> bool {
    match (fs::canonicalize(input), fs::canonicalize(output)) {
        (Ok(input), Ok(output)) => input == output,
        _ => false,
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(marked_file_path(&args.file_path)));

    if same_file(Path::new(&args.file_path), &output) {
        anyhow::bail!("refusing to overwrite the input stream {}", output.display());
    }

    let summary = mark_stream(&args, &output)?;
    info!("{} access units, {} packets", summary.access_units, summary.packets);

    println!("Marked stream written to: {}", output.display());
    println!("  keyframes: {}", summary.keyframes);
    for priority in [
        Priority::Highest,
        Priority::High,
        Priority::Low,
        Priority::Disposable,
    ] {
        println!(
            "  {:<10} {}",
            priority.name(),
            summary.by_priority[usize::from(u8::from(priority))]
        );
    }

    Ok(())
}
