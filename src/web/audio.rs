//! Microphone capture through the Web Audio analyser.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AnalyserNode, AudioContext, DomException, MediaStream, MediaStreamAudioSourceNode,
    MediaStreamConstraints, MediaStreamTrack, window,
};

use super::js_error;
use crate::app::{MicAccess, MicError};
use crate::sampler::{NoiseSource, mean_amplitude};

/// 256-point FFT -> 128 frequency bins.
const FFT_SIZE: u32 = 256;

pub struct Microphone {
    ctx: AudioContext,
    analyser: AnalyserNode,
    _source: MediaStreamAudioSourceNode, // keeps the graph connected
    stream: MediaStream,
    bins: Vec<u8>,
}

impl Microphone {
    fn from_stream(stream: MediaStream) -> Result<Self, JsValue> {
        let ctx = AudioContext::new()?;
        let analyser = ctx.create_analyser()?;
        analyser.set_fft_size(FFT_SIZE);
        let source = ctx.create_media_stream_source(&stream)?;
        source.connect_with_audio_node(&analyser)?;
        let bins = vec![0u8; analyser.frequency_bin_count() as usize];
        Ok(Self {
            ctx,
            analyser,
            _source: source,
            stream,
            bins,
        })
    }

    /// Stop the input tracks and close the audio context.
    pub fn release(&self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        if let Err(err) = self.ctx.close() {
            log::warn!("audio context close failed: {err:?}");
        }
        log::info!("microphone released");
    }
}

impl NoiseSource for Microphone {
    fn amplitude(&mut self) -> f64 {
        self.analyser.get_byte_frequency_data(&mut self.bins);
        mean_amplitude(&self.bins)
    }
}

/// Ask for the microphone. Suspends until the user answers the permission
/// prompt; never retries on its own.
pub async fn acquire() -> MicAccess<Microphone> {
    log::info!("requesting microphone");
    let Some(win) = window() else {
        return MicAccess::Unavailable;
    };
    let devices = match win.navigator().media_devices() {
        Ok(d) => d,
        Err(err) => {
            log::error!("mediaDevices unavailable: {err:?}");
            return MicAccess::Unavailable;
        }
    };
    let constraints = MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = match devices.get_user_media_with_constraints(&constraints) {
        Ok(p) => p,
        Err(err) => return refusal(&err),
    };
    let stream: MediaStream = match JsFuture::from(promise).await {
        Ok(v) => v.unchecked_into(),
        Err(err) => return refusal(&err),
    };
    match Microphone::from_stream(stream) {
        Ok(mic) => {
            log::info!("audio started");
            MicAccess::Granted(mic)
        }
        Err(err) => {
            log::error!("could not build analyser graph: {err:?}");
            MicAccess::Unavailable
        }
    }
}

fn refusal(err: &JsValue) -> MicAccess<Microphone> {
    let name = err.dyn_ref::<DomException>().map(|e| e.name());
    log::error!("mic denied: {name:?}");
    match name.as_deref() {
        Some("NotAllowedError") | Some("SecurityError") => MicAccess::Denied,
        _ => MicAccess::Unavailable,
    }
}

/// Bare microphone meter for pages that run their own game loop (rocket).
#[wasm_bindgen]
pub struct NoiseMeter {
    mic: Microphone,
}

#[wasm_bindgen]
impl NoiseMeter {
    pub async fn acquire() -> Result<NoiseMeter, JsValue> {
        match acquire().await {
            MicAccess::Granted(mic) => Ok(NoiseMeter { mic }),
            MicAccess::Denied => Err(js_error(MicError::Denied)),
            MicAccess::Unavailable => Err(js_error(MicError::Unavailable)),
        }
    }

    pub fn amplitude(&mut self) -> f64 {
        self.mic.amplitude()
    }

    pub fn release(&self) {
        self.mic.release();
    }
}
