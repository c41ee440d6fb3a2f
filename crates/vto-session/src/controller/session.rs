use log::{debug, error, info, warn};
use std::time::Instant;
use vto_core::{
    compute_pose, AssetRef, ModeDescriptor, ModelDescriptor, NeuralNetRef, ViewportManager,
    WindowSize,
};
use vto_occlusion::{build_occluder, AssetLoader};

#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{LifecyclePhase, SessionError, SessionState, TrackerHandle};
use crate::binder::{FrameState, SceneBinder};
use crate::config::{VtoConfig, CUSTOM_MODEL_KEY};
use crate::tracker::{
    CanvasHandle, FacingMode, RenderCamera, RequestId, Tracker, TrackerError, TrackerEvent,
    TrackerInitConfig, TrackerUpdate, VideoSettings,
};

/// Window events the controller listens to once the tracker is ready.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewportEvent {
    Resize(WindowSize),
    OrientationChange(WindowSize),
}

impl ViewportEvent {
    fn window(self) -> WindowSize {
        match self {
            Self::Resize(w) | Self::OrientationChange(w) => w,
        }
    }
}

/// The one outstanding asynchronous tracker request, if any.
#[derive(Debug)]
enum Pending {
    Init {
        request: RequestId,
    },
    Mode {
        request: RequestId,
        mode_key: String,
        mode: ModeDescriptor,
        /// Model to make current together with the mode.
        model: Option<(String, ModelDescriptor)>,
    },
    Flip {
        request: RequestId,
        facing: FacingMode,
    },
}

impl Pending {
    fn request(&self) -> RequestId {
        match self {
            Self::Init { request } | Self::Mode { request, .. } | Self::Flip { request, .. } => {
                *request
            }
        }
    }
}

/// Owns the tracker, the anchor subtree and the session state.
pub struct SessionController<'c, T: Tracker, L: AssetLoader> {
    config: &'c VtoConfig,
    tracker: T,
    loader: L,
    state: SessionState,
    handle: Option<TrackerHandle>,
    viewport: ViewportManager,
    binder: SceneBinder,
    generation: u64,
    pending: Option<Pending>,
    listening: bool,
    custom_model: Option<ModelDescriptor>,
}

impl<'c, T: Tracker, L: AssetLoader> SessionController<'c, T, L> {
    /// Create an uninitialized session.
    ///
    /// `route` optionally names the starting model; unknown names are a
    /// configuration error.
    pub fn new(
        config: &'c VtoConfig,
        tracker: T,
        loader: L,
        route: Option<&str>,
        window: WindowSize,
    ) -> Result<Self, SessionError> {
        let (model_key, model) = config.resolve_initial(route)?;
        let mode = config.mode(&model.mode)?;
        let viewport = ViewportManager::new(window);

        let state = SessionState {
            model_key: model_key.to_string(),
            pose: compute_pose(model),
            model: model.clone(),
            mode_key: model.mode.clone(),
            mode: mode.clone(),
            previous_mode: None,
            mirrored: false,
            facing: FacingMode::Environment,
            viewport: viewport.geometry(),
            phase: LifecyclePhase::Uninitialized,
        };

        Ok(Self {
            config,
            tracker,
            loader,
            state,
            handle: None,
            viewport,
            binder: SceneBinder::new(),
            generation: 0,
            pending: None,
            listening: false,
            custom_model: None,
        })
    }

    #[inline]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[inline]
    pub fn phase(&self) -> LifecyclePhase {
        self.state.phase
    }

    #[inline]
    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    #[inline]
    pub fn loader(&self) -> &L {
        &self.loader
    }

    #[inline]
    pub fn binder(&self) -> &SceneBinder {
        &self.binder
    }

    #[inline]
    pub fn tracker_handle(&self) -> Option<&TrackerHandle> {
        self.handle.as_ref()
    }

    /// Whether resize/orientation events are currently observed.
    #[inline]
    pub fn is_listening(&self) -> bool {
        self.listening
    }

    #[inline]
    pub fn custom_model(&self) -> Option<&ModelDescriptor> {
        self.custom_model.as_ref()
    }

    fn next_request(&mut self) -> RequestId {
        self.generation += 1;
        RequestId(self.generation)
    }

    fn set_phase(&mut self, phase: LifecyclePhase) {
        if self.state.phase != phase {
            debug!("phase {} -> {}", self.state.phase, phase);
            self.state.phase = phase;
        }
    }

    fn reject(&self, operation: &'static str) -> SessionError {
        warn!("rejected: cannot {operation} while {}", self.state.phase);
        SessionError::InvalidPhase {
            operation,
            phase: self.state.phase,
        }
    }

    /// Start the tracker on `canvas`. Only valid once, from `Uninitialized`.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn initialize(&mut self, canvas: CanvasHandle) -> Result<(), SessionError> {
        if self.state.phase != LifecyclePhase::Uninitialized {
            return Err(self.reject("initialize"));
        }

        let request = self.next_request();
        let init = TrackerInitConfig::new(&self.state.mode, &self.config.tracker, canvas);
        info!(
            "starting tracker in mode `{}` ({} landmarks, threshold {})",
            self.state.mode_key,
            init.landmark_labels.len(),
            init.threshold
        );
        debug!(
            "nets: {}",
            init.nets
                .iter()
                .map(NeuralNetRef::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
        self.pending = Some(Pending::Init { request });
        self.set_phase(LifecyclePhase::Initializing);
        self.tracker.init(request, init);
        Ok(())
    }

    /// Deliver the completion of an asynchronous tracker call.
    ///
    /// Completions of superseded requests are dropped without effect.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn handle_tracker_event(&mut self, event: TrackerEvent) -> Result<(), SessionError> {
        let request = event.request();
        let pending = match self.pending.take() {
            Some(p) if p.request() == request => p,
            other => {
                debug!("discarding stale tracker completion {request:?}");
                self.pending = other;
                return Ok(());
            }
        };

        match (pending, event) {
            (Pending::Init { .. }, TrackerEvent::Initialized { result, .. }) => {
                self.finish_init(request, result)
            }
            (
                Pending::Mode {
                    mode_key,
                    mode,
                    model,
                    ..
                },
                TrackerEvent::Reconfigured { result, .. },
            ) => self.finish_mode_switch(mode_key, mode, model, result),
            (Pending::Flip { facing, .. }, TrackerEvent::VideoSettingsApplied { result, .. }) => {
                self.finish_flip(facing, result)
            }
            (pending, event) => {
                warn!("tracker completion {event:?} does not match pending request {pending:?}");
                self.pending = Some(pending);
                Ok(())
            }
        }
    }

    fn finish_init(
        &mut self,
        request: RequestId,
        result: Result<(), TrackerError>,
    ) -> Result<(), SessionError> {
        if let Err(e) = result {
            error!("tracker startup failed: {e}");
            self.set_phase(LifecyclePhase::Failed);
            return Err(SessionError::TrackerStartup(e));
        }

        self.handle = Some(TrackerHandle::new(request));
        self.listening = true;
        self.set_phase(LifecyclePhase::Ready);
        info!("tracker ready");
        self.rebuild_anchor()
    }

    fn finish_mode_switch(
        &mut self,
        mode_key: String,
        mode: ModeDescriptor,
        model: Option<(String, ModelDescriptor)>,
        result: Result<(), TrackerError>,
    ) -> Result<(), SessionError> {
        self.set_phase(LifecyclePhase::Ready);
        match result {
            Ok(()) => {
                info!("mode `{}` -> `{mode_key}`", self.state.mode_key);
                let previous = std::mem::replace(&mut self.state.mode_key, mode_key);
                self.state.previous_mode = Some(previous);
                self.state.mode = mode;
                if let Some((key, descriptor)) = model {
                    self.set_model(key, descriptor);
                }
                self.rebuild_anchor()
            }
            Err(e) => {
                warn!(
                    "switching to mode `{mode_key}` failed ({e}); staying in `{}`",
                    self.state.mode_key
                );
                if let Err(rebuild) = self.rebuild_anchor() {
                    warn!("restoring anchor after failed mode switch: {rebuild}");
                }
                Err(SessionError::Reconfigure(e))
            }
        }
    }

    fn finish_flip(
        &mut self,
        facing: FacingMode,
        result: Result<(), TrackerError>,
    ) -> Result<(), SessionError> {
        self.set_phase(LifecyclePhase::Ready);
        match result {
            Ok(()) => {
                self.state.mirrored = !self.state.mirrored;
                self.state.facing = facing;
                info!("camera facing {facing:?}, mirrored={}", self.state.mirrored);
                Ok(())
            }
            Err(e) => {
                warn!("cannot flip camera: {e}");
                Err(SessionError::CameraFlip(e))
            }
        }
    }

    /// Switch tracking mode, keeping the current model.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn switch_mode(&mut self, mode_key: &str) -> Result<(), SessionError> {
        self.request_mode(mode_key, None)
    }

    fn request_mode(
        &mut self,
        mode_key: &str,
        model: Option<(String, ModelDescriptor)>,
    ) -> Result<(), SessionError> {
        match self.state.phase {
            LifecyclePhase::Ready | LifecyclePhase::ModeSwitching => {}
            _ => return Err(self.reject("switch mode")),
        }
        let mode = self.config.mode(mode_key)?.clone();

        if self.state.phase == LifecyclePhase::Ready && mode_key == self.state.mode_key {
            debug!("mode `{mode_key}` already current");
            if let Some((key, descriptor)) = model {
                return self.swap_model(key, descriptor);
            }
            return Ok(());
        }

        self.tracker.clear_tracked_objects(false);
        self.binder.detach();

        let request = self.next_request();
        info!("reconfiguring tracker for mode `{mode_key}` ({request:?})");
        let update = TrackerUpdate::for_mode(&mode);
        if let Some(Pending::Mode { request: old, .. }) = self.pending.as_ref() {
            debug!("superseding mode request {old:?}");
        }
        self.pending = Some(Pending::Mode {
            request,
            mode_key: mode_key.to_string(),
            mode,
            model,
        });
        self.set_phase(LifecyclePhase::ModeSwitching);
        self.tracker.update(request, update);
        Ok(())
    }

    /// Make `model_key` the displayed model, switching mode first if needed.
    ///
    /// `"custom"` resolves to the uploaded model when there is one.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn switch_model(&mut self, model_key: &str) -> Result<(), SessionError> {
        let descriptor = match (&self.custom_model, model_key) {
            (Some(custom), CUSTOM_MODEL_KEY) => custom.clone(),
            _ => self.config.model(model_key)?.clone(),
        };
        // Validate the target mode up front so a bad descriptor is a config error.
        self.config.mode(&descriptor.mode)?;

        match self.state.phase {
            LifecyclePhase::Ready | LifecyclePhase::ModeSwitching => {}
            _ => return Err(self.reject("switch model")),
        }

        let target_mode = self.effective_mode_key().to_string();
        if descriptor.mode != target_mode {
            let mode_key = descriptor.mode.clone();
            return self.request_mode(&mode_key, Some((model_key.to_string(), descriptor)));
        }

        if let Some(Pending::Mode { model, .. }) = self.pending.as_mut() {
            // The outstanding switch already targets this mode; ride along.
            *model = Some((model_key.to_string(), descriptor));
            return Ok(());
        }

        self.swap_model(model_key.to_string(), descriptor)
    }

    /// Mode the session is in, or is switching to.
    fn effective_mode_key(&self) -> &str {
        match self.pending.as_ref() {
            Some(Pending::Mode { mode_key, .. }) => mode_key,
            _ => &self.state.mode_key,
        }
    }

    fn swap_model(&mut self, key: String, descriptor: ModelDescriptor) -> Result<(), SessionError> {
        info!("model `{}` -> `{key}`", self.state.model_key);
        self.set_model(key, descriptor);
        self.tracker.clear_tracked_objects(false);
        self.rebuild_anchor()
    }

    fn set_model(&mut self, key: String, descriptor: ModelDescriptor) {
        self.state.pose = compute_pose(&descriptor);
        self.state.model = descriptor;
        self.state.model_key = key;
    }

    /// Register an uploaded asset as the custom model.
    pub fn load_custom_model(&mut self, asset: AssetRef) {
        info!("custom model uploaded: {asset}");
        self.custom_model = Some(self.config.custom_upload.descriptor(asset));
    }

    /// Display the uploaded model.
    pub fn use_custom_model(&mut self) -> Result<(), SessionError> {
        if self.custom_model.is_none() {
            return Err(SessionError::NoCustomModel);
        }
        self.switch_model(CUSTOM_MODEL_KEY)
    }

    /// Toggle between front and rear camera.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn flip_camera(&mut self) -> Result<(), SessionError> {
        if self.state.phase != LifecyclePhase::Ready {
            return Err(self.reject("flip the camera"));
        }
        let facing = if self.state.mirrored {
            FacingMode::Environment
        } else {
            FacingMode::User
        };
        let request = self.next_request();
        self.pending = Some(Pending::Flip { request, facing });
        self.set_phase(LifecyclePhase::CameraFlipping);
        self.tracker
            .update_video_settings(request, VideoSettings { facing_mode: facing });
        Ok(())
    }

    /// Tear the session down. Safe to call in any phase, any number of times.
    #[cfg_attr(feature = "tracing", instrument(level = "info", skip(self)))]
    pub fn destroy(&mut self) {
        let phase = self.state.phase;
        if phase.is_terminal() {
            debug!("destroy on destroyed session ignored");
            return;
        }

        self.set_phase(LifecyclePhase::Destroying);
        self.listening = false;
        self.viewport.cancel();
        self.pending = None;
        self.binder.detach();

        let had_handle = self.handle.take().is_some();
        if had_handle || phase == LifecyclePhase::Initializing {
            self.tracker.destroy();
        }
        self.set_phase(LifecyclePhase::Destroyed);
        info!("session destroyed");
    }

    /// Feed a window resize/orientation event.
    pub fn on_viewport_event(&mut self, now: Instant, event: ViewportEvent) {
        if !self.listening {
            debug!("ignoring {event:?}: not listening");
            return;
        }
        self.viewport.notify(now, event.window());
    }

    /// Advance timers; applies debounced sizing once its quiet period elapsed.
    pub fn tick(&mut self, now: Instant) {
        let Some(geometry) = self.viewport.poll(now) else {
            return;
        };
        debug!(
            "viewport {}x{} at left={}",
            geometry.width, geometry.height, geometry.left
        );
        self.state.viewport = geometry;
        if self.handle.is_some() && self.state.phase.has_tracker() {
            self.tracker.resize();
        }
    }

    /// Per-frame hook: let the tracker fit the camera, then place the anchor.
    pub fn render_frame(&mut self, camera: &mut RenderCamera) -> FrameState {
        if self.handle.is_none() {
            return self.binder.apply_frame(None);
        }
        self.tracker.update_camera(&self.state.viewport, camera);
        let tracked = self.tracker.anchor_pose();
        self.binder.apply_frame(tracked)
    }

    /// Build the anchor subtree for the current model and mode and attach it.
    ///
    /// Asset failures still attach an anchor (placeholder model and/or no
    /// occluder); the first failure is returned.
    fn rebuild_anchor(&mut self) -> Result<(), SessionError> {
        let mut failure = None;

        let asset = &self.state.model.asset;
        let model_node = match self.loader.load(asset) {
            Ok(scene) => match scene.first_child() {
                Some(child) => Some(child.clone_with_ids(self.binder.ids_mut())),
                None => {
                    failure = Some(SessionError::EmptyModel(asset.clone()));
                    None
                }
            },
            Err(source) => {
                failure = Some(SessionError::ModelLoad {
                    asset: asset.clone(),
                    source,
                });
                None
            }
        };

        let occluder =
            match build_occluder(&self.state.mode.occluder, &mut self.loader, self.binder.ids_mut())
            {
                Ok(occluder) => occluder,
                Err(e) => {
                    if failure.is_none() {
                        failure = Some(SessionError::Occluder(e));
                    }
                    None
                }
            };

        let placeholder = model_node.is_none();
        let model_node = match model_node {
            Some(node) => node,
            None => self.binder.placeholder_model(),
        };
        let subtree = self
            .binder
            .build_subtree(model_node, &self.state.pose, occluder, placeholder);
        let (parent, child) = self.binder.attach(subtree);
        self.tracker.set_anchor_follower(parent, child);

        match failure {
            Some(e) => {
                warn!("anchor built with fallbacks: {e}");
                Err(e)
            }
            None => Ok(()),
        }
    }
}

impl<T: Tracker, L: AssetLoader> Drop for SessionController<'_, T, L> {
    fn drop(&mut self) {
        self.destroy();
    }
}
