/// Viewer configuration: a JSON file plus command-line overrides.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use offscope_core::{CameraSettings, MeshError, WeightMode};
use serde::Deserialize;
use thiserror::Error;

pub const USAGE: &str = "\
Usage: offscope-terminal [MESH.off] [--config FILE.json] [--normals uniform|area|angle]

Without a mesh the built-in cube is shown.

Controls:
  W/S/A/D     move          R/F     up/down
  arrows      rotate        mouse   drag to rotate, wheel to zoom
  +/-         zoom          O       orbit around the origin
  space       freeze/restore camera orientation
  1/2/3       uniform/area/angle normals
  I           invert pitch  P       perspective/orthographic
  T           spin models   Q/Esc   quit";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Normals(#[from] MeshError),
}

/// Everything the viewer can be configured with. Missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewerConfig {
    /// OFF file to show; the built-in cube when absent.
    pub mesh: Option<PathBuf>,
    pub normals: WeightMode,
    pub camera: CameraSettings,
    pub target_fps: u32,
    /// Copies of the mesh drawn side by side, all sharing one `Mesh`.
    pub instances: usize,
    pub light: [f32; 3],
    /// Start with the models spinning.
    pub spin: bool,
    /// `env_logger` filter; falls back to `RUST_LOG`, then `warn`.
    pub log_filter: Option<String>,
    /// Log destination. The terminal is taken by the viewer, so without a
    /// file logs go to stderr and may garble the picture.
    pub log_file: Option<PathBuf>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            mesh: None,
            normals: WeightMode::Uniform,
            camera: CameraSettings::default(),
            target_fps: 30,
            instances: 2,
            light: [2.0, 3.0, 4.0],
            spin: false,
            log_filter: None,
            log_file: None,
        }
    }
}

impl ViewerConfig {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Build the configuration from command-line arguments (without the
    /// program name). Values given on the command line win over the file.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config_path = None;
        let mut normals = None;
        let mut mesh = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => config_path = Some(PathBuf::from(value_of(&arg, args.next())?)),
                "--normals" | "-n" => normals = Some(value_of(&arg, args.next())?.parse::<WeightMode>()?),
                flag if flag.starts_with('-') => {
                    return Err(ConfigError::Usage(format!("unknown option `{}`", flag)));
                }
                _ if mesh.is_some() => {
                    return Err(ConfigError::Usage(format!("unexpected argument `{}`", arg)));
                }
                _ => mesh = Some(PathBuf::from(&arg)),
            }
        }

        let mut config = match config_path {
            Some(path) => Self::load(&path)?,
            None => Self::default(),
        };
        if let Some(mesh) = mesh {
            config.mesh = Some(mesh);
        }
        if let Some(normals) = normals {
            config.normals = normals;
        }
        Ok(config)
    }
}

fn value_of(flag: &str, value: Option<String>) -> Result<String, ConfigError> {
    value.ok_or_else(|| ConfigError::Usage(format!("`{}` needs a value", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_json_gives_defaults() {
        assert_eq!(ViewerConfig::from_json("{}").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = ViewerConfig::from_json(
            r#"{
                "mesh": "models/hand.off",
                "normals": "angle",
                "camera": { "sensitivity": 0.25 },
                "instances": 1
            }"#,
        )
        .unwrap();

        assert_eq!(config.mesh, Some(PathBuf::from("models/hand.off")));
        assert_eq!(config.normals, WeightMode::Angle);
        assert_eq!(config.camera.sensitivity, 0.25);
        assert_eq!(config.camera.orbit_radius, CameraSettings::default().orbit_radius);
        assert_eq!(config.instances, 1);
        assert_eq!(config.target_fps, 30);
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        assert!(ViewerConfig::from_json(r#"{ "mesh_path": "x.off" }"#).is_err());
        assert!(ViewerConfig::from_json(r#"{ "normals": "smooth" }"#).is_err());
    }

    #[test]
    fn test_args_without_config() {
        let config = ViewerConfig::from_args(args(&["bunny.off", "--normals", "area"])).unwrap();
        assert_eq!(config.mesh, Some(PathBuf::from("bunny.off")));
        assert_eq!(config.normals, WeightMode::Area);

        let config = ViewerConfig::from_args(Vec::new()).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_args_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "mesh": "from-file.off", "normals": "angle", "target_fps": 60 }}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = ViewerConfig::from_args(args(&["--config", &path])).unwrap();
        assert_eq!(config.mesh, Some(PathBuf::from("from-file.off")));
        assert_eq!(config.normals, WeightMode::Angle);
        assert_eq!(config.target_fps, 60);

        let config = ViewerConfig::from_args(args(&["cli.off", "-c", &path, "-n", "uniform"])).unwrap();
        assert_eq!(config.mesh, Some(PathBuf::from("cli.off")));
        assert_eq!(config.normals, WeightMode::Uniform);
        assert_eq!(config.target_fps, 60);
    }

    #[test]
    fn test_bad_args() {
        assert!(matches!(
            ViewerConfig::from_args(args(&["--normals"])),
            Err(ConfigError::Usage(_))
        ));
        assert!(matches!(
            ViewerConfig::from_args(args(&["--normals", "smooth"])),
            Err(ConfigError::Normals(MeshError::InvalidWeightMode(_)))
        ));
        assert!(matches!(
            ViewerConfig::from_args(args(&["--verbose"])),
            Err(ConfigError::Usage(_))
        ));
        assert!(matches!(
            ViewerConfig::from_args(args(&["a.off", "b.off"])),
            Err(ConfigError::Usage(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let result = ViewerConfig::from_args(args(&["--config", &path.to_string_lossy()]));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_malformed_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            ViewerConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
