use anyhow::{Result, bail};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use webrtc::track::track_local::TrackLocal;

/// Audio processing switches requested from the capture device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioProcessing {
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    pub auto_gain_control: bool,
}

impl Default for AudioProcessing {
    fn default() -> Self {
        Self {
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain_control: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaConstraints {
    pub video: bool,
    /// `None` captures no audio at all.
    pub audio: Option<AudioProcessing>,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: Some(AudioProcessing::default()),
        }
    }
}

/// Where the local participant's media comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamSource {
    Camera(MediaConstraints),
    Display,
}

/// Local tracks attached to every endpoint this participant opens.
#[derive(Clone, Default)]
pub struct LocalStream {
    tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>,
}

impl LocalStream {
    pub fn new(tracks: Vec<Arc<dyn TrackLocal + Send + Sync>>) -> Self {
        Self { tracks }
    }

    /// A passive, receive-only participant.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn tracks(&self) -> &[Arc<dyn TrackLocal + Send + Sync>] {
        &self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

impl fmt::Debug for LocalStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalStream")
            .field("tracks", &self.tracks.len())
            .finish()
    }
}

/// Capture devices, owned by the embedding application.
#[async_trait]
pub trait MediaCapture: Send + Sync {
    async fn acquire_local_stream(&self, constraints: &MediaConstraints) -> Result<LocalStream>;

    async fn acquire_display_stream(&self) -> Result<LocalStream>;
}

/// Hands out streams the application built up front, e.g. sample tracks fed
/// from a file or an encoder.
#[derive(Debug, Clone, Default)]
pub struct StaticMedia {
    camera: Option<LocalStream>,
    display: Option<LocalStream>,
}

impl StaticMedia {
    pub fn new(camera: Option<LocalStream>, display: Option<LocalStream>) -> Self {
        Self { camera, display }
    }
}

#[async_trait]
impl MediaCapture for StaticMedia {
    async fn acquire_local_stream(&self, constraints: &MediaConstraints) -> Result<LocalStream> {
        if !constraints.video && constraints.audio.is_none() {
            return Ok(LocalStream::empty());
        }
        match &self.camera {
            Some(stream) => Ok(stream.clone()),
            None => bail!("no camera or microphone available"),
        }
    }

    async fn acquire_display_stream(&self) -> Result<LocalStream> {
        match &self.display {
            Some(stream) => Ok(stream.clone()),
            None => bail!("screen capture is not available"),
        }
    }
}
