use std::sync::Arc;

use anyhow::Result;
use kuchikikiki::NodeRef;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;

use crate::app_config::Config;
use crate::errors::{ProxyError, ReaderError};
use crate::playback::{Activation, HIGHLIGHT_CLASS, Playback, TimerNotify};
use crate::proxy::{ProxiedPage, Proxy};
use crate::segmenter;
use crate::selector::{self, RegionHook};
use crate::shell::{self, PresentationShell};

// @module: Reader event loop and control surface

/// Optional user-supplied mutation applied to the mounted document before
/// region selection. A failure is caught, logged, and treated as if the
/// hook were absent.
pub type TransformHook = Box<dyn Fn(&str, &NodeRef) -> Result<()>>;

/// User-supplied hooks, applied once per load
#[derive(Default)]
pub struct ReaderHooks {
    /// Selector scopes to segment for a given URL
    pub regions: Option<RegionHook>,

    /// Post-load document mutation (e.g. stripping ads)
    pub transform: Option<TransformHook>,
}

/// Outbound signals emitted by the reader
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderEvent {
    /// A sentence became the current unit; emitted only when a
    /// notification name is configured
    SentenceActivated {
        /// Configured notification name
        notification: String,
        /// Decoded plain text of the sentence
        text: String,
    },

    /// A page was mounted and segmented; reading has started
    ReaderOpened {
        original_url: String,
        sentence_count: usize,
    },

    /// The fetch failed; the reader stayed idle
    LoadFailed { url: String },

    /// Segmentation produced zero sentence units
    NothingToRead { url: String },

    /// The reading session ended (exhausted or stopped)
    ReaderClosed,
}

/// Messages processed by the reader loop, one at a time
enum ReaderMsg {
    Load(String),
    Next(usize),
    Previous(usize),
    Pause,
    Resume,
    Stop,
    Shutdown,
    FetchDone {
        generation: u64,
        url: String,
        result: Result<ProxiedPage, ProxyError>,
    },
    TimerFired {
        generation: u64,
        epoch: u64,
    },
}

/// Cloneable command surface for a running reader
#[derive(Clone)]
pub struct ReaderHandle {
    tx: mpsc::UnboundedSender<ReaderMsg>,
}

impl ReaderHandle {
    fn send(&self, msg: ReaderMsg) -> Result<(), ReaderError> {
        self.tx.send(msg).map_err(|_| ReaderError::Closed)
    }

    /// Fetch, segment and start reading a page.
    pub fn load(&self, url: impl Into<String>) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Load(url.into()))
    }

    /// Move to the next sentence.
    pub fn next(&self) -> Result<(), ReaderError> {
        self.next_by(1)
    }

    /// Skip forward by `step` sentences.
    pub fn next_by(&self, step: usize) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Next(step))
    }

    /// Move to the previous sentence.
    pub fn previous(&self) -> Result<(), ReaderError> {
        self.previous_by(1)
    }

    /// Skip backward by `step` sentences, clamped at the first one.
    pub fn previous_by(&self, step: usize) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Previous(step))
    }

    pub fn pause(&self) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Pause)
    }

    pub fn resume(&self) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Resume)
    }

    /// Close the current reading session.
    pub fn stop(&self) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Stop)
    }

    /// End the reader loop itself.
    pub fn shutdown(&self) -> Result<(), ReaderError> {
        self.send(ReaderMsg::Shutdown)
    }
}

/// One active reading session: the mounted document and its playback state
struct Session {
    generation: u64,
    original_url: String,
    // Keeps the mounted tree alive for the lifetime of the session; the
    // playback units reference nodes inside it.
    #[allow(dead_code)]
    document: NodeRef,
    playback: Playback,
}

/// The reader: owns the document, the sentence sequence and all state
/// transitions. All transitions run to completion on one cooperative task;
/// the only suspension points are the spawned fetch and the advance timer,
/// both of which report back through the same message channel.
pub struct PageReader {
    config: Config,
    hooks: ReaderHooks,
    proxy: Arc<dyn Proxy>,
    shell: Box<dyn PresentationShell>,
    rx: mpsc::UnboundedReceiver<ReaderMsg>,
    tx: mpsc::UnboundedSender<ReaderMsg>,
    events: mpsc::UnboundedSender<ReaderEvent>,
    session: Option<Session>,
    generation: u64,
}

impl PageReader {
    /// Create a reader with its command handle and event stream.
    pub fn new(
        config: Config,
        hooks: ReaderHooks,
        proxy: Arc<dyn Proxy>,
        shell: Box<dyn PresentationShell>,
    ) -> (Self, ReaderHandle, mpsc::UnboundedReceiver<ReaderEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let reader = PageReader {
            config,
            hooks,
            proxy,
            shell,
            rx,
            tx: tx.clone(),
            events: events_tx,
            session: None,
            generation: 0,
        };
        (reader, ReaderHandle { tx }, events_rx)
    }

    /// Drive the reader until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                ReaderMsg::Load(url) => self.start_load(url),
                ReaderMsg::FetchDone {
                    generation,
                    url,
                    result,
                } => self.finish_load(generation, url, result).await,
                ReaderMsg::Next(step) => self.on_advance(step),
                ReaderMsg::Previous(step) => self.on_retreat(step),
                ReaderMsg::Pause => self.on_pause(),
                ReaderMsg::Resume => self.on_resume(),
                ReaderMsg::Stop => self.close_session(true),
                ReaderMsg::TimerFired { generation, epoch } => self.on_timer(generation, epoch),
                ReaderMsg::Shutdown => break,
            }
        }
        // Silent teardown: cancel any pending timer before the loop ends.
        self.close_session(false);
    }

    /// Begin a load: tear down any active session, bump the generation and
    /// spawn the fetch. The generation ties the completion to this request
    /// so a late result for a superseded load is discarded.
    fn start_load(&mut self, url: String) {
        if self.session.is_some() {
            self.close_session(true);
        }
        self.generation += 1;
        let generation = self.generation;

        self.shell.show_dialog(&format!("Loading {}", url));
        info!("Loading {}", url);

        let proxy = self.proxy.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = proxy.request(&url).await;
            let _ = tx.send(ReaderMsg::FetchDone {
                generation,
                url,
                result,
            });
        });
    }

    async fn finish_load(
        &mut self,
        generation: u64,
        url: String,
        result: Result<ProxiedPage, ProxyError>,
    ) {
        if generation != self.generation {
            debug!("Discarding stale proxy result for {} (generation {})", url, generation);
            return;
        }

        let page = match result {
            Ok(page) => page,
            Err(e) => {
                error!("{}", e);
                self.shell.hide_dialog();
                self.emit(ReaderEvent::LoadFailed { url });
                return;
            }
        };

        if let Err(e) = self.open_page(generation, page).await {
            error!("Failed to open {}: {}", url, e);
            self.shell.hide_dialog();
            self.emit(ReaderEvent::LoadFailed { url });
        }
    }

    /// Mount, transform, select, segment and start playback for a fetched
    /// page.
    async fn open_page(&mut self, generation: u64, page: ProxiedPage) -> Result<()> {
        let document = self.shell.mount(&page).await?;

        // Style rule applied to highlighted sentences.
        let rule = format!("span.{} {{{}}}", HIGHLIGHT_CLASS, self.config.highlight);
        self.shell.inject_style_rule(&document, &rule)?;

        if let Some(transform) = &self.hooks.transform {
            self.shell.show_dialog("Applying HTML transformation");
            if let Err(e) = transform(&page.original_url, &document) {
                warn!("Transform failed: {}", e);
            }
        }

        self.shell.show_dialog("Parsing sentences");
        let groups = selector::select_regions(
            &document,
            &self.config.html.tags,
            &page.original_url,
            self.hooks.regions.as_ref(),
        );
        segmenter::segment(&groups);
        let units = segmenter::collect_units(&document);

        if units.is_empty() {
            self.shell.show_dialog("Found no sentences to read!");
            warn!("Found no sentences to read in {}", page.original_url);
            self.shell.hide_dialog();
            self.emit(ReaderEvent::NothingToRead {
                url: page.original_url,
            });
            return Ok(());
        }

        let tx = self.tx.clone();
        let notify: TimerNotify = Arc::new(move |epoch| {
            let _ = tx.send(ReaderMsg::TimerFired { generation, epoch });
        });
        let mut playback = Playback::new(units, self.config.timeout_ms, notify);

        self.shell.show_reader(&self.config.geometry);
        self.emit(ReaderEvent::ReaderOpened {
            original_url: page.original_url.clone(),
            sentence_count: playback.len(),
        });

        let activation = playback.start();
        self.session = Some(Session {
            generation,
            original_url: page.original_url,
            document,
            playback,
        });
        self.shell.hide_dialog();
        self.handle_activation(activation);
        Ok(())
    }

    fn on_advance(&mut self, step: usize) {
        let activation = match &mut self.session {
            Some(session) => session.playback.advance(step),
            None => return,
        };
        self.handle_activation(activation);
    }

    fn on_retreat(&mut self, step: usize) {
        let activation = match &mut self.session {
            Some(session) => session.playback.retreat(step),
            None => return,
        };
        self.handle_activation(activation);
    }

    fn on_pause(&mut self) {
        if let Some(session) = &mut self.session {
            session.playback.pause();
        }
    }

    fn on_resume(&mut self) {
        let activation = match &mut self.session {
            Some(session) => session.playback.resume(),
            None => return,
        };
        if let Some(activation) = activation {
            self.handle_activation(activation);
        }
    }

    fn on_timer(&mut self, generation: u64, epoch: u64) {
        let activation = match &mut self.session {
            Some(session) => {
                if session.generation != generation || session.playback.timer_epoch() != epoch {
                    debug!("Discarding stale timer tick (generation {}, epoch {})", generation, epoch);
                    return;
                }
                session.playback.advance(1)
            }
            None => return,
        };
        self.handle_activation(activation);
    }

    /// Apply the per-activation effects: scroll the owning element into
    /// view and emit the sentence text to the configured listener.
    fn handle_activation(&mut self, activation: Activation) {
        match activation {
            Activation::Activated { index, text, node } => {
                debug!("Activated sentence {}", index);
                let (x, y) = shell::page_offset(self.shell.as_ref(), &node);
                self.shell.scroll_to(x, y);
                if let Some(notification) = &self.config.notification {
                    self.emit(ReaderEvent::SentenceActivated {
                        notification: notification.clone(),
                        text,
                    });
                }
            }
            Activation::Exhausted => self.close_session(true),
            Activation::Ignored => {}
        }
    }

    /// Tear down the active session: cancel its timer, drop the sequence
    /// and hide the reader.
    fn close_session(&mut self, emit: bool) {
        if let Some(mut session) = self.session.take() {
            session.playback.close();
            self.shell.hide_reader();
            self.shell.hide_dialog();
            info!("Reader closed for {}", session.original_url);
            if emit {
                self.emit(ReaderEvent::ReaderClosed);
            }
        }
    }

    fn emit(&self, event: ReaderEvent) {
        let _ = self.events.send(event);
    }
}
