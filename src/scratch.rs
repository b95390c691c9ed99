//! Tracking of the intermediate artifacts produced during one blend.
//!
//! A [`ScratchSpace`] lives exactly as long as one pipeline run. Every
//! intermediate gets an identifier; when a dump directory is configured the
//! raster-like ones are also written there as GeoTIFFs. Dropping the space
//! releases everything it tracked, whichever way the run ended.

use crate::error::Result;
use crate::geometry::{AreaSet, PointSet};
use crate::io;
use crate::raster::Raster;
use log::{debug, info, warn};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ScratchConfig {
    /// Directory receiving intermediate GeoTIFFs. `None` keeps them in memory only.
    pub dir: Option<PathBuf>,
    /// Leave written intermediates on disk after the run.
    pub keep: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId(String);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Raster,
    Area,
    Points,
}

#[derive(Debug)]
struct Artifact {
    id: ArtifactId,
    kind: ArtifactKind,
    file: Option<PathBuf>,
}

#[derive(Debug)]
pub struct ScratchSpace {
    config: ScratchConfig,
    prefix: String,
    next_index: usize,
    artifacts: Vec<Artifact>,
}

impl ScratchSpace {
    pub fn new(config: ScratchConfig) -> Result<Self> {
        if let Some(dir) = &config.dir {
            std::fs::create_dir_all(dir)?;
            info!("Writing intermediates to {}", dir.display());
        }
        Ok(Self {
            config,
            prefix: format!("blend_{}", std::process::id()),
            next_index: 0,
            artifacts: Vec::new(),
        })
    }

    /// A space that tracks identifiers but never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            config: ScratchConfig::default(),
            prefix: format!("blend_{}", std::process::id()),
            next_index: 0,
            artifacts: Vec::new(),
        }
    }

    fn register(&mut self, label: &str, kind: ArtifactKind) -> ArtifactId {
        let id = ArtifactId(format!("{}_{}_{}", self.prefix, self.next_index, label));
        self.next_index += 1;
        self.artifacts.push(Artifact {
            id: id.clone(),
            kind,
            file: None,
        });
        debug!("Tracking {:?} artifact {}", kind, id);
        id
    }

    fn dump(&mut self, id: &ArtifactId, raster: &Raster) -> Result<()> {
        let Some(dir) = self.config.dir.as_deref() else {
            return Ok(());
        };
        let path = dir.join(format!("{}.tif", id));
        // Record the path first so a half-written file is released too.
        if let Some(artifact) = self.artifacts.iter_mut().find(|a| &a.id == id) {
            artifact.file = Some(path.clone());
        }
        io::write_raster(&path, raster, &[])
    }

    pub fn track_raster(&mut self, label: &str, raster: &Raster) -> Result<ArtifactId> {
        let id = self.register(label, ArtifactKind::Raster);
        self.dump(&id, raster)?;
        Ok(id)
    }

    /// Track an area; dumped as a 1/no-data mask.
    pub fn track_area(&mut self, label: &str, area: &AreaSet) -> Result<ArtifactId> {
        let id = self.register(label, ArtifactKind::Area);
        if self.config.dir.is_some() {
            let data = area.cells().mapv(|inside| if inside { 1.0 } else { f64::NAN });
            let mask = Raster::new(area.region().clone(), data)?;
            self.dump(&id, &mask)?;
        }
        Ok(id)
    }

    pub fn track_points(&mut self, label: &str, points: &PointSet) -> ArtifactId {
        debug!("{} holds {} points", label, points.len());
        self.register(label, ArtifactKind::Points)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.artifacts.iter().filter_map(|a| a.file.as_deref())
    }

    fn release(&mut self) {
        if self.is_empty() {
            return;
        }
        debug!(
            "Releasing {} intermediates: {:?}",
            self.len(),
            self.artifacts
                .iter()
                .map(|a| format!("{:?} {}", a.kind, a.id))
                .collect::<Vec<_>>()
        );

        for artifact in self.artifacts.drain(..) {
            let Some(path) = artifact.file else { continue };
            if self.config.keep {
                info!("Keeping {}", path.display());
                continue;
            }
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!("Could not remove {}: {}", path.display(), e);
                }
            }
        }
    }
}

impl Drop for ScratchSpace {
    fn drop(&mut self) {
        self.release();
    }
}
