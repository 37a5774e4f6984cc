//! Loads the outline and fragments of a source directory.
//!
//! [`Reader::read`] is the one-shot, all-or-nothing load used by batch
//! builds. [`Reader::publish_all`] and [`Reader::watch`] feed the continuous
//! streams handed out by [`Reader::new`], isolating each file's failure on the
//! error stream.

/// Source directory listing
mod discovery;
/// Bounded error stream
mod error_sink;
/// Reader types
mod types;

use std::collections::HashMap;
use std::future::Future;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::{
    Semaphore,
    mpsc,
};
use tokio::task::{
    JoinHandle,
    JoinSet,
};

pub use discovery::{
    Sources,
    discover,
};
pub use error_sink::ErrorSink;
pub use types::{
    FragmentUpdate,
    ReaderError,
};

use crate::config::{
    BuildSettings,
    FileMatcher,
    SourceKind,
};
use crate::input::fragment::load_fragment;
use crate::input::outline::load_outline;
use crate::input::{
    Outline,
    SourceError,
};
use crate::ir::PartialTranslation;
use crate::watcher::{
    Debouncer,
    SourceChange,
    watch_directory,
};

/// Buffer of the outline and fragment streams.
const STREAM_BUFFER: usize = 64;

/// Consumer ends of the continuous streams.
#[derive(Debug)]
pub struct ReaderStreams {
    /// Every successfully parsed outline.
    pub outlines: mpsc::Receiver<Outline>,
    /// Loaded and removed fragments.
    pub fragments: mpsc::Receiver<FragmentUpdate>,
    /// Per-file failures; bounded, overflow is dropped.
    pub errors: mpsc::Receiver<ReaderError>,
}

/// Producer ends of the continuous streams, shared by reparse tasks.
#[derive(Debug, Clone)]
struct Publisher {
    /// Decides which of several outline candidates is active.
    matcher: Arc<FileMatcher>,
    /// Outline stream.
    outlines: mpsc::Sender<Outline>,
    /// Fragment stream.
    fragments: mpsc::Sender<FragmentUpdate>,
    /// Error stream.
    errors: ErrorSink,
}

impl Publisher {
    /// Reparses the changed file and publishes the result.
    async fn reload(&self, change: SourceChange) {
        match change.kind {
            SourceKind::Outline => self.reload_outline_change(&change.path).await,
            SourceKind::Fragment => self.reload_fragment(&change.path).await,
        }
    }

    /// Handles a change to a file matching the outline name.
    ///
    /// Only the candidate discovery picks is loaded. Edits to the others are
    /// ignored; deleting one re-resolves the active outline.
    async fn reload_outline_change(&self, path: &Path) {
        let active = match discover(&self.matcher) {
            Ok(sources) => sources.outline,
            Err(error) => {
                self.errors.push(error);
                return;
            }
        };
        let Some(active) = active else {
            self.errors.push(outline_missing(&self.matcher));
            return;
        };
        if active != path && tokio::fs::try_exists(path).await.unwrap_or(false) {
            tracing::debug!(
                path = %path.display(),
                used = %active.display(),
                "Ignoring change to an unused outline file"
            );
            return;
        }
        self.reload_outline(&active).await;
    }

    /// Parses and publishes the outline at `path`.
    async fn reload_outline(&self, path: &Path) {
        match load_outline(path).await {
            Ok(outline) => {
                if self.outlines.send(outline).await.is_err() {
                    tracing::debug!("Outline stream closed");
                }
            }
            Err(error) => self.errors.push(error.into()),
        }
    }

    /// Parses and publishes the fragment at `path`, or its removal.
    async fn reload_fragment(&self, path: &Path) {
        let update = match load_fragment(path).await {
            Ok(translation) => FragmentUpdate::Loaded(translation),
            Err(SourceError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Fragment removed");
                FragmentUpdate::Removed(path.to_path_buf())
            }
            Err(error) => {
                self.errors.push(error.into());
                return;
            }
        };
        if self.fragments.send(update).await.is_err() {
            tracing::debug!("Fragment stream closed");
        }
    }
}

/// Result of one batch loader task.
enum Loaded {
    /// The outline task finished.
    Outline(Outline),
    /// A fragment task finished.
    Fragment(PartialTranslation),
}

/// Reads one source directory.
#[derive(Debug)]
pub struct Reader {
    /// Classifies directory entries.
    matcher: Arc<FileMatcher>,
    /// Continuous stream producers.
    publisher: Publisher,
    /// Debounce window of watch mode.
    window: Duration,
    /// Loader tasks allowed to run at once.
    num_tasks: usize,
}

impl Reader {
    /// Creates a reader for `source_dir` and the streams it publishes to.
    ///
    /// # Errors
    /// - The directory cannot be resolved
    /// - The file pattern is invalid
    pub fn new(
        source_dir: &Path,
        settings: &BuildSettings,
    ) -> Result<(Self, ReaderStreams), ReaderError> {
        let dir = std::fs::canonicalize(source_dir)
            .map_err(|source| ReaderError::Discovery { dir: source_dir.to_path_buf(), source })?;
        let matcher = Arc::new(FileMatcher::new(dir, settings)?);

        let (outlines_tx, outlines) = mpsc::channel(STREAM_BUFFER);
        let (fragments_tx, fragments) = mpsc::channel(STREAM_BUFFER);
        let (errors_tx, errors) = ErrorSink::channel(settings.error_capacity);

        let reader = Self {
            publisher: Publisher {
                matcher: Arc::clone(&matcher),
                outlines: outlines_tx,
                fragments: fragments_tx,
                errors: errors_tx,
            },
            matcher,
            window: settings.debounce_window(),
            num_tasks: settings.concurrency.effective_tasks(),
        };
        Ok((reader, ReaderStreams { outlines, fragments, errors }))
    }

    /// Canonical source directory.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        self.matcher.source_dir()
    }

    /// Producer side of the error stream, for its drop counter.
    #[must_use]
    pub const fn error_sink(&self) -> &ErrorSink {
        &self.publisher.errors
    }

    /// Loads the outline and every fragment concurrently.
    ///
    /// Fails with the first error encountered; remaining loads are aborted and
    /// no partial result is returned. Fragments are sorted by path.
    pub async fn read(&self) -> Result<(Outline, Vec<PartialTranslation>), ReaderError> {
        let sources = discover(&self.matcher)?;
        let outline_path = sources.outline.ok_or_else(|| outline_missing(&self.matcher))?;

        let semaphore = Arc::new(Semaphore::new(self.num_tasks));
        let mut tasks = JoinSet::new();
        tasks.spawn(async move { load_outline(&outline_path).await.map(Loaded::Outline) });
        let total = sources.fragments.len();
        for path in sources.fragments {
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await;
                load_fragment(&path).await.map(Loaded::Fragment)
            });
        }

        let mut outline = None;
        let mut fragments = Vec::with_capacity(total);
        // Returning early drops the set, which aborts the loads still running.
        while let Some(joined) = tasks.join_next().await {
            match joined?? {
                Loaded::Outline(loaded) => outline = Some(loaded),
                Loaded::Fragment(fragment) => fragments.push(fragment),
            }
        }

        let Some(outline) = outline else {
            return Err(outline_missing(&self.matcher));
        };
        fragments.sort_by(|a, b| a.path().cmp(b.path()));
        tracing::info!(fragments = fragments.len(), "Read source directory");
        Ok((outline, fragments))
    }

    /// Loads everything once onto the continuous streams.
    ///
    /// Each failure goes to the error stream without affecting other files.
    pub async fn publish_all(&self) {
        let sources = match discover(&self.matcher) {
            Ok(sources) => sources,
            Err(error) => {
                self.publisher.errors.push(error);
                return;
            }
        };

        let outline = async {
            match &sources.outline {
                Some(path) => self.publisher.reload_outline(path).await,
                None => self.publisher.errors.push(outline_missing(&self.matcher)),
            }
        };
        // Boxed as `dyn Future + Send` so `watch` stays spawnable: rustc's
        // higher-ranked lifetime inference cannot prove `Send` for the bare
        // `for_each_concurrent` future.
        let fragments: std::pin::Pin<Box<dyn Future<Output = ()> + Send + '_>> = Box::pin(
            futures::stream::iter(&sources.fragments)
                .for_each_concurrent(self.num_tasks, |path| self.publisher.reload_fragment(path)),
        );
        futures::future::join(outline, fragments).await;

        tracing::info!(fragments = sources.fragments.len(), "Published source directory");
    }

    /// Publishes everything, then republishes each changed file until
    /// `shutdown` completes.
    ///
    /// Bursts of changes to one path collapse into a single reparse per
    /// debounce window. Reparse failures go to the error stream. Shutdown is
    /// honored during the initial publish too. On shutdown every change
    /// already admitted is still reparsed and published; the streams close
    /// when this returns.
    ///
    /// # Errors
    /// - The filesystem watcher cannot be started
    pub async fn watch<F>(self, shutdown: F) -> Result<(), ReaderError>
    where
        F: Future<Output = ()>,
    {
        let (fs_watcher, mut changes) = watch_directory(Arc::clone(&self.matcher))?;
        let (mut debouncer, mut coalesced) = Debouncer::new(self.window);
        let mut in_flight = HashMap::new();
        let initial = self.publish_all();
        tokio::pin!(shutdown, initial);
        let mut publishing = true;
        tracing::info!(dir = %self.source_dir().display(), "Watching for changes");

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                () = &mut initial, if publishing => publishing = false,
                Some(change) = changes.recv() => self.admit(&mut debouncer, change),
                Some(change) = coalesced.recv() => self.dispatch(&mut in_flight, change),
            }
        }

        if publishing {
            tracing::info!("Stopping before the initial publish finished");
        }
        tracing::info!("Stopping watch");
        drop(fs_watcher);
        while let Ok(change) = changes.try_recv() {
            self.admit(&mut debouncer, change);
        }
        tracing::debug!(paths = debouncer.len(), "Flushing pending changes");
        debouncer.close().await;
        while let Some(change) = coalesced.recv().await {
            self.dispatch(&mut in_flight, change);
        }
        for (path, handle) in in_flight {
            if let Err(error) = handle.await {
                tracing::warn!(path = %path.display(), %error, "Reparse task failed");
            }
        }
        Ok(())
    }

    /// Hands a raw change to the debouncer, or a watch error to the error stream.
    fn admit(
        &self,
        debouncer: &mut Debouncer<PathBuf, SourceChange>,
        change: notify::Result<SourceChange>,
    ) {
        match change {
            Ok(change) => debouncer.push(change.path.clone(), change),
            Err(error) => self.publisher.errors.push(error.into()),
        }
    }

    /// Spawns the reparse of `change`, chained after any earlier reparse of
    /// the same path so publications per path stay in order.
    fn dispatch(&self, in_flight: &mut HashMap<PathBuf, JoinHandle<()>>, change: SourceChange) {
        in_flight.retain(|_, handle| !handle.is_finished());
        let previous = in_flight.remove(&change.path);
        let path = change.path.clone();
        let publisher = self.publisher.clone();

        tracing::debug!(path = %path.display(), kind = ?change.kind, "Reparsing");
        let handle = tokio::spawn(async move {
            if let Some(previous) = previous
                && let Err(error) = previous.await
            {
                tracing::debug!(%error, "Previous reparse ended abnormally");
            }
            publisher.reload(change).await;
        });
        in_flight.insert(path, handle);
    }
}

/// Error for a directory without an outline file.
fn outline_missing(matcher: &FileMatcher) -> ReaderError {
    ReaderError::OutlineMissing {
        dir: matcher.source_dir().to_path_buf(),
        name: matcher.outline_name().to_string(),
    }
}
