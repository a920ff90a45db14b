use clap::Parser;
use std::path::PathBuf;

/// Default ImageMagick entry point, resolved from `PATH`.
pub const DEFAULT_MASK_TOOL: &str = "magick";

/// Default RealityScan install location on the capture workstations.
pub const DEFAULT_RECONSTRUCTION_TOOL: &str =
    r"C:\Program Files\Epic Games\RealityScan_2.0\RealityScan.exe";

/// Arguments for the `create-masks` command.
#[derive(Parser, Debug, Clone)]
#[command(name = "create-masks", version, about = "Create subject masks for every capture image under a directory", long_about = None)]
pub struct MaskArgs {
    /// Directory containing capture images (searched recursively)
    pub input_dir: PathBuf,

    /// Write masks under this directory, mirroring the input layout, instead
    /// of alongside the source images
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum number of concurrent masking processes (default: derived from
    /// the CPU count)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Thread limit passed to each masking process (default: derived from
    /// the CPU count)
    #[arg(long)]
    pub threads_per_worker: Option<usize>,

    /// Regenerate masks that already exist instead of skipping them
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Image-processing executable to invoke
    #[arg(long, default_value = DEFAULT_MASK_TOOL)]
    pub tool: PathBuf,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

/// Arguments for the `create-models` command.
#[derive(Parser, Debug, Clone)]
#[command(name = "create-models", version, about = "Reconstruct a textured 3D model from a directory of capture images", long_about = None)]
pub struct ModelArgs {
    /// Directory containing capture images for one project
    pub input_dir: PathBuf,

    /// Output directory for the model and project files (default:
    /// `<input>/models`)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rebuild even if the project file already exists
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Reconstruction executable to invoke
    #[arg(long, default_value = DEFAULT_RECONSTRUCTION_TOOL)]
    pub tool: PathBuf,

    /// Enable debug logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}
