//! Per-element truncation controller.
//!
//! An [`EllipsisController`] owns one render target, its configuration and
//! bound text, an [`UpdateScheduler`], and every subscription registered on
//! the element's behalf. Triggers only enqueue work; [`EllipsisController::poll`]
//! runs whatever is due.

use std::time::Instant;

use crate::config::EllipsisConfig;
use crate::engine::{DisplayContent, TruncationEngine};
use crate::error::EllipsisError;
use crate::scheduler::{QueueId, UpdateScheduler};
use crate::source::TextSource;
use crate::subscription::Subscription;
use crate::target::{InlineStyle, LayoutConstraint, RenderTarget};
use crate::viewport::{ResizeFilter, ViewportSize};

/// Work a controller schedules for itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControllerTask {
    /// Full truncation pass.
    Rebuild,
    /// Rebuild only if the viewport size really changed.
    CheckViewport,
}

/// Click on the append affordance, forwarded to the host handler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppendClick {
    pub x: i32,
    pub y: i32,
}

/// Outcome of the latest pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EllipsisState {
    pub is_truncated: bool,
    /// Byte length of the kept prefix, when cut.
    pub cut: Option<usize>,
    /// Probe calls made by the latest pass.
    pub measurements: usize,
    /// Whether the fallback font size is applied.
    pub font_fallback: bool,
    /// Passes run so far, including skipped ones.
    pub passes: usize,
}

type ClickHandler = Box<dyn FnMut(&AppendClick)>;

/// Truncation lifecycle of one element.
pub struct EllipsisController<T: RenderTarget> {
    target: T,
    config: EllipsisConfig,
    engine: TruncationEngine,
    scheduler: UpdateScheduler<ControllerTask>,
    source: Option<TextSource>,
    shown: bool,
    visible: bool,
    resize: ResizeFilter,
    pending_size: Option<ViewportSize>,
    on_click: Option<ClickHandler>,
    subscriptions: Vec<Subscription>,
    state: EllipsisState,
    torn_down: bool,
}

impl<T: RenderTarget> EllipsisController<T> {
    /// Validate `config` and arm the first pass on the immediate queue.
    pub fn attach(target: T, config: EllipsisConfig, now: Instant) -> Result<Self, EllipsisError> {
        config.validate()?;
        let mut scheduler = UpdateScheduler::new(config.scheduler);
        scheduler.enqueue(QueueId::Immediate, ControllerTask::Rebuild, now);
        Ok(Self {
            target,
            config,
            engine: TruncationEngine::new(),
            scheduler,
            source: None,
            shown: true,
            visible: true,
            resize: ResizeFilter::default(),
            pending_size: None,
            on_click: None,
            subscriptions: Vec::new(),
            state: EllipsisState::default(),
            torn_down: false,
        })
    }

    /// Size the viewport had when the element was attached.
    pub fn with_viewport(mut self, size: ViewportSize) -> Self {
        self.resize = ResizeFilter::new(size);
        self
    }

    /// Use `engine` for every pass instead of the config's strategy.
    pub fn with_engine(mut self, engine: TruncationEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Bind new text. Schedules an immediate pass when it changed.
    pub fn set_source(&mut self, source: Option<TextSource>, now: Instant) {
        if self.ignored("set_source") || self.source == source {
            return;
        }
        self.source = source;
        self.schedule(QueueId::Immediate, ControllerTask::Rebuild, now);
    }

    /// Show-flag change. Schedules an immediate pass when it changed.
    pub fn set_shown(&mut self, shown: bool, now: Instant) {
        if self.ignored("set_shown") || self.shown == shown {
            return;
        }
        self.shown = shown;
        self.schedule(QueueId::Immediate, ControllerTask::Rebuild, now);
    }

    /// Element became visible or hidden. Schedules a debounced pass.
    pub fn set_visibility(&mut self, visible: bool, now: Instant) {
        if self.ignored("set_visibility") || self.visible == visible {
            return;
        }
        self.visible = visible;
        self.schedule(QueueId::Debounced, ControllerTask::Rebuild, now);
    }

    /// Replace the append affordance and rebuild right away.
    pub fn set_append(&mut self, append: Option<String>) {
        if self.ignored("set_append") {
            return;
        }
        self.config.append = append.filter(|append| !append.is_empty());
        self.rebuild();
    }

    /// Viewport resize notification. The check runs on the debounced queue
    /// and only rebuilds if the size differs from the last one observed.
    pub fn on_viewport_resize(&mut self, size: ViewportSize, now: Instant) {
        if self.ignored("on_viewport_resize") {
            return;
        }
        self.pending_size = Some(size);
        self.schedule(QueueId::Debounced, ControllerTask::CheckViewport, now);
    }

    /// External refresh signal.
    pub fn refresh(&mut self, now: Instant) {
        if self.ignored("refresh") {
            return;
        }
        self.schedule(QueueId::Immediate, ControllerTask::Rebuild, now);
    }

    /// Run every task due at `now`. Returns how many ran.
    pub fn poll(&mut self, now: Instant) -> usize {
        if self.torn_down {
            return 0;
        }
        let batch = self.scheduler.take_due(now);
        for &(queue, task) in &batch {
            log::trace!("running {:?} from {:?} queue", task, queue);
            match task {
                ControllerTask::Rebuild => self.rebuild(),
                ControllerTask::CheckViewport => self.check_viewport(),
            }
        }
        batch.len()
    }

    /// Earliest time [`poll`](Self::poll) has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        self.scheduler.next_deadline()
    }

    /// Register the handler invoked when the append affordance is clicked.
    pub fn on_append_click<F>(&mut self, handler: F)
    where
        F: FnMut(&AppendClick) + 'static,
    {
        if self.ignored("on_append_click") {
            return;
        }
        self.on_click = Some(Box::new(handler));
    }

    /// Forward a click on the append affordance.
    ///
    /// Returns whether a handler ran: only when the text is truncated and an
    /// append affordance is displayed.
    pub fn activate_append(&mut self, click: &AppendClick) -> bool {
        if self.torn_down || !self.state.is_truncated || self.config.append_markup().is_none() {
            return false;
        }
        match self.on_click.as_mut() {
            Some(handler) => {
                handler(click);
                true
            }
            None => false,
        }
    }

    /// Take ownership of a subscription released at teardown.
    pub fn adopt(&mut self, mut subscription: Subscription) {
        if self.torn_down {
            log::warn!(
                "subscription {:?} adopted after teardown; disposing it",
                subscription.label()
            );
            subscription.dispose();
            return;
        }
        self.subscriptions.push(subscription);
    }

    /// Cancel pending work and release every subscription.
    ///
    /// Idempotent; also runs on drop.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.scheduler.clear();
        self.pending_size = None;
        self.on_click = None;
        let released = self.subscriptions.len();
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        log::debug!("ellipsis controller torn down; {} subscription(s) released", released);
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn state(&self) -> EllipsisState {
        self.state
    }

    pub fn config(&self) -> &EllipsisConfig {
        &self.config
    }

    pub fn source(&self) -> Option<&TextSource> {
        self.source.as_ref()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn scheduler(&self) -> &UpdateScheduler<ControllerTask> {
        &self.scheduler
    }

    fn ignored(&self, trigger: &str) -> bool {
        if self.torn_down {
            log::warn!("{} ignored: controller is torn down", trigger);
        }
        self.torn_down
    }

    fn schedule(&mut self, queue: QueueId, task: ControllerTask, now: Instant) {
        self.scheduler.enqueue(queue, task, now);
    }

    fn check_viewport(&mut self) {
        let Some(size) = self.pending_size.take() else {
            return;
        };
        if self.resize.observe(size) {
            log::debug!("viewport changed to {}x{}", size.width, size.height);
            self.rebuild();
        }
    }

    /// One truncation pass over the bound text.
    fn rebuild(&mut self) {
        self.state.passes += 1;
        let source = match self.source.as_ref() {
            Some(source) if !source.is_empty() => source.clone(),
            _ => {
                log::trace!("no bound text; pass skipped");
                return;
            }
        };

        if self.state.font_fallback {
            self.target.set_style(InlineStyle::FontSize(None));
            self.state.font_fallback = false;
        }

        let mut constraint = self.derive_constraint();
        let full = if source.is_markup() {
            DisplayContent::markup(source.effective())
        } else {
            DisplayContent::plain(source.effective())
        };
        self.target.render(&full);

        if let Some(size) = self.config.fallback_font_size.clone() {
            if constraint.is_overflowed_by(self.target.metrics()) {
                log::debug!("text overflows; applying fallback font size {}", size);
                self.target.set_style(InlineStyle::FontSize(Some(size)));
                self.state.font_fallback = true;
                constraint = self.derive_constraint();
                self.target.render(&full);
            }
        }

        let target = &mut self.target;
        let mut probe = |content: &DisplayContent| {
            target.render(content);
            constraint.is_overflowed_by(target.metrics())
        };
        let result = self.engine.truncate(&source, &self.config, &mut probe);

        self.target.render(&result.content);
        self.target.set_overflowed(result.is_truncated);
        self.state.is_truncated = result.is_truncated;
        self.state.cut = result.cut;
        self.state.measurements = result.measurements;
    }

    fn derive_constraint(&mut self) -> LayoutConstraint {
        let constraint = LayoutConstraint::derive(&mut self.target, &self.config);
        if constraint.from_lines {
            self.target
                .set_style(InlineStyle::MaxHeight(Some(constraint.max_height)));
        }
        constraint
    }
}

impl<T: RenderTarget> Drop for EllipsisController<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}
