//! # Audio Capture Module
//!
//! Live input capture via CPAL, chunked into fixed-size analysis blocks.
//! The kernel itself never touches the audio device; it only sees the
//! sample blocks delivered through the channel, so file playback or a
//! separated stem can feed the same pipeline by sending blocks on the
//! same kind of channel.
//!
//! Devices that only expose multi-channel input are downmixed to mono
//! in the stream callback; the analysis pipeline is strictly
//! single-channel.

use anyhow::{anyhow, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedStreamConfigRange};
use crossbeam_channel::Sender;

/// Default number of samples per analysis block.
///
/// 2048 samples is ~46 ms at 44.1 kHz: enough periods of a low guitar
/// string for the autocorrelation to resolve, short enough to keep the
/// display responsive.
pub const BLOCK_SIZE: usize = 2048;

/// Sample rate requested from the device when its range allows it.
const TARGET_SAMPLE_RATE: u32 = 44100;

/// Starts capture from the default input device.
///
/// Picks the f32 input configuration with the fewest channels (mono when
/// available), clamps the session sample rate into that configuration's
/// supported range, and sends one `block_size`-sample mono block at a
/// time through `sender`. Multi-channel input is averaged down to mono
/// frame by frame. Blocks are sent with `try_send` so a slow consumer
/// drops frames instead of stalling the audio callback.
///
/// # Arguments
/// * `sender` - Channel the analysis blocks are delivered on
/// * `block_size` - Samples per block; must match the analysis session
///
/// # Returns
/// * `Ok((stream, sample_rate))` - Keep the stream alive for as long as
///   capture should run; drop or pause it to stop. The returned rate is
///   the one actually negotiated with the device.
/// * `Err(e)` - No usable input device or stream setup failure.
pub fn start_capture(sender: Sender<Vec<f32>>, block_size: usize) -> Result<(cpal::Stream, u32)> {
    if block_size == 0 {
        return Err(anyhow!("block size must be > 0"));
    }

    let host = cpal::default_host();
    let device = host
        .default_input_device()
        .ok_or_else(|| anyhow!("No input device available"))?;

    eprintln!("[AUDIO] Using input device: {}", device.name()?);

    let configs = device.supported_input_configs()?.collect::<Vec<_>>();
    let supported_config = pick_input_config(configs, TARGET_SAMPLE_RATE)
        .ok_or_else(|| anyhow!("No f32 input format found"))?;

    let channels = supported_config.channels() as usize;
    let sample_rate = clamp_rate(&supported_config, TARGET_SAMPLE_RATE);
    let config: cpal::StreamConfig = supported_config
        .with_sample_rate(cpal::SampleRate(sample_rate))
        .into();

    eprintln!(
        "[AUDIO] Selected {} Hz, {} channel(s)",
        sample_rate, channels
    );

    let err_fn = |err| eprintln!("[AUDIO] Stream error: {}", err);

    // Accumulates mono samples until a full analysis block is ready.
    let mut pending: Vec<f32> = Vec::with_capacity(block_size * 2);

    let stream = device.build_input_stream(
        &config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if channels == 1 {
                pending.extend_from_slice(data);
            } else {
                downmix_into(&mut pending, data, channels);
            }
            while pending.len() >= block_size {
                let block = pending[..block_size].to_vec();
                // Dropping a block when the consumer lags is fine; the
                // next block carries fresher audio anyway.
                let _ = sender.try_send(block);
                pending.drain(..block_size);
            }
        },
        err_fn,
        None,
    )?;

    stream.play()?;

    Ok((stream, sample_rate))
}

/// Picks the input configuration the capture session will use.
///
/// Only f32 formats are considered. Fewer channels win (mono needs no
/// downmix); among equals, the configuration whose supported range sits
/// closest to the target rate wins.
fn pick_input_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.sample_format() == SampleFormat::F32)
        .min_by_key(|c| {
            let achievable = clamp_rate(c, target_rate);
            let rate_distance = achievable.abs_diff(target_rate);
            (c.channels(), rate_distance)
        })
}

/// Clamps the target rate into a configuration's supported range.
///
/// `SupportedStreamConfigRange::with_sample_rate` panics on a rate
/// outside the range, so the session rate is always clamped first; a
/// device that cannot do 44.1 kHz runs at the nearest rate it can.
fn clamp_rate(config: &SupportedStreamConfigRange, target_rate: u32) -> u32 {
    target_rate.clamp(config.min_sample_rate().0, config.max_sample_rate().0)
}

/// Averages interleaved multi-channel frames into mono samples.
///
/// A trailing partial frame (fewer samples than `channels`) is dropped;
/// it can only occur if the device delivers torn frames.
fn downmix_into(pending: &mut Vec<f32>, data: &[f32], channels: usize) {
    for frame in data.chunks_exact(channels) {
        pending.push(frame.iter().sum::<f32>() / channels as f32);
    }
}
