use std::collections::HashMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use lidarcam::{
    io::{load_config, load_image, read_lidar_ply, save_image, write_color_ply},
    Error, FusionPipeline,
};
use log::{error, info, warn};
use rayon::prelude::*;

#[derive(Parser)]
#[clap(about = "Colors lidar clouds from camera images and draws the lidar depth on them")]
struct Args {
    /// JSON configuration with the parameters and the calibration matrices
    config: PathBuf,
    /// Directory receiving `<stem>_overlay.png` and `<stem>_color.ply`
    output_dir: PathBuf,
    /// A single lidar cloud (PLY)
    #[clap(long, requires = "image", conflicts_with = "clouds")]
    cloud: Option<PathBuf>,
    /// The image paired with `--cloud`
    #[clap(long)]
    image: Option<PathBuf>,
    /// Glob of lidar clouds (PLY); each is paired with the image of the same file stem
    #[clap(long, requires = "images")]
    clouds: Option<String>,
    /// Directory holding the images for `--clouds`
    #[clap(long)]
    images: Option<PathBuf>,
}

/// Lidar cloud, camera image and the stem used to name the outputs.
struct Frame {
    stem: String,
    cloud: PathBuf,
    image: PathBuf,
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}

fn collect_frames(pattern: &str, image_dir: &Path) -> Result<Vec<Frame>, Error> {
    let mut images = HashMap::new();
    for entry in std::fs::read_dir(image_dir)? {
        let path = entry?.path();
        if let Some(stem) = file_stem(&path) {
            images.insert(stem, path);
        }
    }

    let paths = glob::glob(pattern).map_err(|err| Error::invalid_parameter(err.to_string()))?;
    let mut frames = Vec::new();
    for path in paths {
        let cloud = match path {
            Ok(cloud) => cloud,
            Err(err) => {
                warn!("skipping unreadable path: {err}");
                continue;
            }
        };
        let Some(stem) = file_stem(&cloud) else {
            continue;
        };
        match images.get(&stem) {
            Some(image) => frames.push(Frame {
                stem,
                cloud,
                image: image.clone(),
            }),
            None => warn!("no image for {}", cloud.display()),
        }
    }
    frames.sort_by(|a, b| a.stem.cmp(&b.stem));
    Ok(frames)
}

fn run_frame(pipeline: &FusionPipeline, frame: &Frame, output_dir: &Path) -> Result<(), Error> {
    let cloud = read_lidar_ply(&frame.cloud)?;
    let image = load_image(&frame.image)?;
    let output = pipeline.process(&cloud, &image)?;

    save_image(
        output_dir.join(format!("{}_overlay.png", frame.stem)),
        &output.image,
    )?;
    write_color_ply(
        output_dir.join(format!("{}_color.ply", frame.stem)),
        &output.cloud,
    )?;
    info!(
        "{}: {} colored points from {} lidar points",
        frame.stem,
        output.cloud.len(),
        cloud.len()
    );
    Ok(())
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let args = Args::parse();

    let (params, calibration) = load_config(&args.config)?;
    let pipeline = FusionPipeline::new(params, &calibration)?;
    std::fs::create_dir_all(&args.output_dir)?;

    let frames = match (args.cloud, args.image, args.clouds, args.images) {
        (Some(cloud), Some(image), _, _) => vec![Frame {
            stem: file_stem(&cloud).unwrap_or_else(|| "frame".to_string()),
            cloud,
            image,
        }],
        (_, _, Some(pattern), Some(image_dir)) => collect_frames(&pattern, &image_dir)?,
        _ => {
            return Err(Error::invalid_parameter(
                "give either --cloud and --image, or --clouds and --images",
            ))
        }
    };

    let done = frames
        .par_iter()
        .filter(|frame| match run_frame(&pipeline, frame, &args.output_dir) {
            Ok(()) => true,
            Err(err) => {
                error!("{}: {err}", frame.stem);
                false
            }
        })
        .count();
    info!("processed {done} of {} frames", frames.len());

    Ok(())
}
