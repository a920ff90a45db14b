use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::cancel::CancelToken;
use crate::config::ModelArgs;
use crate::errors::{Result, ScanOpsError};
use crate::mask_batch::is_capture_image;
use crate::tool::{ToolInvocation, ToolRunner};

/// A single reconstruction job, derived deterministically from the input
/// directory's base name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelJob {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub model_file: PathBuf,
    pub project_file: PathBuf,
}

/// How a build invocation ended. All three are successful exits; skips keep
/// re-runs cheap and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOutcome {
    Built,
    SkippedExisting,
    NoImages,
}

/// Resolve the input directory and derive the output paths. The project name
/// is the final path component of the (absolute) input directory; artifacts
/// land in `<input>/models` unless an output directory is given.
pub fn plan_job(input_dir: &Path, output_dir: Option<&Path>) -> Result<ModelJob> {
    if !input_dir.is_dir() {
        return Err(ScanOpsError::InputNotFound {
            path: input_dir.to_path_buf(),
        });
    }
    let input_dir = input_dir
        .canonicalize()
        .map_err(|source| ScanOpsError::FileSystem {
            path: input_dir.to_path_buf(),
            operation: "resolve input directory".to_string(),
            source,
        })?;

    let project_name = input_dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ScanOpsError::Configuration {
            message: format!(
                "cannot derive a project name from {}",
                input_dir.display()
            ),
        })?;

    let output_dir = output_dir.map_or_else(|| input_dir.join("models"), Path::to_path_buf);
    let model_file = output_dir.join(format!("{project_name}.glb"));
    let project_file = output_dir.join(format!("{project_name}.rsproj"));

    Ok(ModelJob {
        input_dir,
        output_dir,
        model_file,
        project_file,
    })
}

/// The fixed reconstruction sequence: headless session, align, auto region,
/// texture settings, high-detail model, unwrap, texture, export the first
/// model component, save the project, quit.
pub fn reconstruction_invocation(tool: &Path, job: &ModelJob) -> ToolInvocation {
    ToolInvocation::new(tool)
        .arg("-headless")
        .arg("-addFolder")
        .arg(&job.input_dir)
        .arg("-align")
        .arg("-setReconstructionRegionAuto")
        .arg("-set")
        .arg("UnwrapMaxTextureSize=4096")
        .arg("-set")
        .arg("UnwrapMaxChartsCount=0")
        .arg("-set")
        .arg("TextureMaxSize=4096")
        .arg("-set")
        .arg("TextureFileType=png")
        .arg("-set")
        .arg("TextureIsPowerOf2=1")
        .arg("-set")
        .arg("TextureIsSquare=1")
        .arg("-set")
        .arg("TextureImageFill=1")
        .arg("-set")
        .arg("TextureNormalSpace=tangent")
        .arg("-set")
        .arg("TextureNormalStyle=DirectX")
        .arg("-calculateHighModel")
        .arg("-unwrap")
        .arg("-calculateTexture")
        .arg("-exportModel")
        .arg("Model 1")
        .arg(&job.model_file)
        .arg("-save")
        .arg(&job.project_file)
        .arg("-quit")
}

/// One synchronous external reconstruction run per invocation. The external
/// tool owns all photogrammetry computation and may not be idempotent
/// mid-run, so a failed run is surfaced with its exit code and never retried.
pub struct ModelBuilder<R> {
    args: ModelArgs,
    runner: R,
}

impl<R: ToolRunner> ModelBuilder<R> {
    pub const fn new(args: ModelArgs, runner: R) -> Self {
        Self { args, runner }
    }

    pub fn run(&self, cancel: &CancelToken) -> Result<ModelOutcome> {
        let job = plan_job(&self.args.input_dir, self.args.output.as_deref())?;

        let images = count_capture_images(&job.input_dir)?;
        if images == 0 {
            warn!("no capture images in {}", job.input_dir.display());
            return Ok(ModelOutcome::NoImages);
        }

        fs::create_dir_all(&job.output_dir).map_err(|source| ScanOpsError::FileSystem {
            path: job.output_dir.clone(),
            operation: "create output directory".to_string(),
            source,
        })?;

        if job.project_file.exists() && !self.args.overwrite {
            info!(
                "project already exists, skipping: {}",
                job.project_file.display()
            );
            return Ok(ModelOutcome::SkippedExisting);
        }

        info!(
            images,
            "reconstructing {} -> {}",
            job.input_dir.display(),
            job.model_file.display()
        );
        let invocation = reconstruction_invocation(&self.args.tool, &job);
        self.runner.run(&invocation, cancel)?;

        info!("saved {}", job.project_file.display());
        Ok(ModelOutcome::Built)
    }
}

/// Count capture images directly in the input directory. Reconstruction
/// ingests a flat folder, so this check is deliberately non-recursive.
fn count_capture_images(dir: &Path) -> Result<usize> {
    let entries = fs::read_dir(dir).map_err(|source| ScanOpsError::FileSystem {
        path: dir.to_path_buf(),
        operation: "read input directory".to_string(),
        source,
    })?;

    let mut count = 0;
    for entry in entries {
        let entry = entry.map_err(|source| ScanOpsError::FileSystem {
            path: dir.to_path_buf(),
            operation: "read input directory".to_string(),
            source,
        })?;
        let path = entry.path();
        if path.is_file() && is_capture_image(&path) {
            count += 1;
        }
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn invocation_matches_the_fixed_sequence() {
        let job = ModelJob {
            input_dir: PathBuf::from("/captures/ProjectX"),
            output_dir: PathBuf::from("/captures/ProjectX/models"),
            model_file: PathBuf::from("/captures/ProjectX/models/ProjectX.glb"),
            project_file: PathBuf::from("/captures/ProjectX/models/ProjectX.rsproj"),
        };
        let invocation = reconstruction_invocation(Path::new("RealityScan.exe"), &job);

        let expected: Vec<OsString> = [
            "-headless",
            "-addFolder",
            "/captures/ProjectX",
            "-align",
            "-setReconstructionRegionAuto",
            "-set",
            "UnwrapMaxTextureSize=4096",
            "-set",
            "UnwrapMaxChartsCount=0",
            "-set",
            "TextureMaxSize=4096",
            "-set",
            "TextureFileType=png",
            "-set",
            "TextureIsPowerOf2=1",
            "-set",
            "TextureIsSquare=1",
            "-set",
            "TextureImageFill=1",
            "-set",
            "TextureNormalSpace=tangent",
            "-set",
            "TextureNormalStyle=DirectX",
            "-calculateHighModel",
            "-unwrap",
            "-calculateTexture",
            "-exportModel",
            "Model 1",
            "/captures/ProjectX/models/ProjectX.glb",
            "-save",
            "/captures/ProjectX/models/ProjectX.rsproj",
            "-quit",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(invocation.args, expected);
    }

    #[test]
    fn planning_requires_an_existing_directory() {
        let err = plan_job(Path::new("/definitely/not/here"), None).unwrap_err();
        assert!(matches!(err, ScanOpsError::InputNotFound { .. }));
    }

    #[test]
    fn job_paths_derive_from_the_directory_name() -> std::io::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let input = temp.path().join("ProjectX");
        fs::create_dir_all(&input)?;

        let job = plan_job(&input, None).unwrap();
        assert!(job.output_dir.ends_with("ProjectX/models"));
        assert!(job.model_file.ends_with("ProjectX/models/ProjectX.glb"));
        assert!(job.project_file.ends_with("ProjectX/models/ProjectX.rsproj"));
        Ok(())
    }

    #[test]
    fn explicit_output_directory_wins() -> std::io::Result<()> {
        let temp = tempfile::TempDir::new()?;
        let input = temp.path().join("ProjectX");
        fs::create_dir_all(&input)?;

        let out = temp.path().join("artifacts");
        let job = plan_job(&input, Some(&out)).unwrap();
        assert_eq!(job.output_dir, out);
        assert_eq!(job.model_file, out.join("ProjectX.glb"));
        assert_eq!(job.project_file, out.join("ProjectX.rsproj"));
        Ok(())
    }
}
