//! Live rebuilds driven by the reader's continuous streams.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::mpsc;

use super::Pipeline;
use crate::input::Outline;
use crate::ir::PartialTranslation;
use crate::reader::{
    FragmentUpdate,
    ReaderStreams,
};

/// Counters describing a finished session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionReport {
    /// Rebuilds attempted.
    pub builds: usize,
    /// Rebuilds that failed.
    pub failed_builds: usize,
    /// Errors drained from the error stream.
    pub source_errors: usize,
}

/// Keeps the latest outline and partial translations and rebuilds on change.
#[derive(Debug)]
pub struct Session {
    /// Renders and writes each rebuild.
    pipeline: Pipeline,
    /// Latest outline; rebuilds wait for the first one.
    outline: Option<Outline>,
    /// Latest partial translation per source path.
    fragments: BTreeMap<PathBuf, PartialTranslation>,
    /// Counters returned when the session ends.
    report: SessionReport,
}

impl Session {
    /// Creates a session with no sources yet.
    #[must_use]
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            outline: None,
            fragments: BTreeMap::new(),
            report: SessionReport::default(),
        }
    }

    /// Consumes the streams until all of them close.
    ///
    /// Updates that are already queued are applied together before a rebuild.
    pub async fn run(mut self, streams: ReaderStreams) -> SessionReport {
        let ReaderStreams { mut outlines, mut fragments, mut errors } = streams;
        loop {
            tokio::select! {
                Some(outline) = outlines.recv() => {
                    self.outline = Some(outline);
                    self.absorb_queued(&mut outlines, &mut fragments);
                    self.rebuild().await;
                }
                Some(update) = fragments.recv() => {
                    self.apply(update);
                    self.absorb_queued(&mut outlines, &mut fragments);
                    self.rebuild().await;
                }
                Some(error) = errors.recv() => {
                    self.report.source_errors += 1;
                    tracing::error!(%error, "Source error");
                }
                else => break,
            }
        }
        tracing::info!(builds = self.report.builds, "Session ended");
        self.report
    }

    /// Applies every update already waiting on the streams.
    fn absorb_queued(
        &mut self,
        outlines: &mut mpsc::Receiver<Outline>,
        fragments: &mut mpsc::Receiver<FragmentUpdate>,
    ) {
        while let Ok(outline) = outlines.try_recv() {
            self.outline = Some(outline);
        }
        while let Ok(update) = fragments.try_recv() {
            self.apply(update);
        }
    }

    /// Records one fragment update.
    fn apply(&mut self, update: FragmentUpdate) {
        match update {
            FragmentUpdate::Loaded(translation) => {
                self.fragments.insert(translation.path().to_path_buf(), translation);
            }
            FragmentUpdate::Removed(path) => {
                if self.fragments.remove(&path).is_none() {
                    tracing::debug!(path = %path.display(), "Removed fragment was never loaded");
                }
            }
        }
    }

    /// Builds everything from the current sources, once an outline is known.
    async fn rebuild(&mut self) {
        let Some(outline) = &self.outline else {
            tracing::debug!(fragments = self.fragments.len(), "Waiting for an outline");
            return;
        };
        self.report.builds += 1;
        if let Err(error) = self.pipeline.build(outline, self.fragments.values()).await {
            self.report.failed_builds += 1;
            tracing::error!(%error, "Build failed");
        }
    }
}
